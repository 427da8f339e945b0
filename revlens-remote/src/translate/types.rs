//! Wire types for the LibreTranslate-style translation API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct TranslateRequest {
    pub q: String,
    pub source: String,
    pub target: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslateResponse {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: String,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = TranslateRequest {
            q: "great product".to_string(),
            source: "en".to_string(),
            target: "zh".to_string(),
            format: "text".to_string(),
            api_key: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["q"], "great product");
        assert_eq!(json["target"], "zh");
        assert!(json.get("api_key").is_none());
    }

    #[test]
    fn test_response_deserialization() {
        let json = r#"{"translatedText": "很棒的产品"}"#;
        let response: TranslateResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.translated_text, "很棒的产品");
    }

    #[test]
    fn test_error_deserialization() {
        let json = r#"{"error": "Invalid API key"}"#;
        let error: ApiErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(error.error, "Invalid API key");
    }
}
