//! Structured-completion collaborator interface.

use std::future::Future;

use crate::errors::SourceError;

/// A non-streaming text-completion backend.
///
/// Implementations hold their own model/temperature configuration; the core
/// only supplies the system instruction and the user prompt.
pub trait TextCompletion {
    /// Runs one completion and returns the raw model output.
    fn complete(
        &self,
        system_instruction: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String, SourceError>> + Send;
}
