//! Boundary to the hosted text-completion service.

use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::prompts::InsightRequest;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("API key is not configured (run `runway auth paste-api-key` or set OPENROUTER_API_KEY)")]
    MissingCredential,
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl CompletionError {
    /// Worth another attempt (gateway hiccups, dropped connections)
    pub fn is_transient(&self) -> bool {
        match self {
            CompletionError::Status { status, .. } => matches!(*status, 502..=504),
            CompletionError::Transport(_) | CompletionError::Timeout(_) => true,
            CompletionError::MissingCredential | CompletionError::Malformed(_) => false,
        }
    }
}

/// Text completion: prompt in, generated text or a typed failure out.
/// Implementations block until they have an answer or give up.
pub trait CompletionService {
    fn complete(&self, request: &InsightRequest) -> Result<String, CompletionError>;
}

impl<S: CompletionService + ?Sized> CompletionService for &S {
    fn complete(&self, request: &InsightRequest) -> Result<String, CompletionError> {
        (**self).complete(request)
    }
}

impl<S: CompletionService + ?Sized> CompletionService for Box<S> {
    fn complete(&self, request: &InsightRequest) -> Result<String, CompletionError> {
        (**self).complete(request)
    }
}

/// Run the request and always hand back displayable text: the completion,
/// or a "⚠️" advisory describing the failure.
pub fn advise<S: CompletionService + ?Sized>(service: &S, request: &InsightRequest) -> String {
    match service.complete(request) {
        Ok(text) => text,
        Err(CompletionError::MissingCredential) => {
            format!("⚠️ {}", CompletionError::MissingCredential)
        }
        Err(e) => {
            warn!(error = %e, "completion failed");
            format!("⚠️ AI error: {e}")
        }
    }
}
