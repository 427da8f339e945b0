//! Remote enrichment operations for the REVLENS pipeline.
//!
//! Two operation families exist: machine translation of review text and
//! AI labeling through an OpenAI-compatible chat endpoint. Both hide
//! behind the [`RemoteOperation`] trait so the batch engine never knows
//! which backend it is driving, and both share the retry policy in
//! [`retry`] and the text normalization helpers in [`normalize`].

pub mod annotate;
pub mod chunk;
pub mod mock;
pub mod normalize;
pub mod operation;
pub mod retry;
pub mod translate;

pub use annotate::{AnnotateOperation, ChatClient, OpenAiChatClient};
pub use operation::RemoteOperation;
pub use retry::{retry, RetryPolicy};
pub use translate::{HttpTranslateClient, TranslateClient, TranslateOperation};
