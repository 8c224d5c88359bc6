// Language-model backends
pub mod gemini;

use crate::error::SynthesisError;

pub use gemini::GeminiClient;

/// Single-shot text completion: one prompt in, one text out
///
/// No conversation history, no streaming, no retries.
pub trait LanguageModel {
    fn complete(&self, prompt: &str) -> Result<String, SynthesisError>;

    /// Model identifier, for logging
    fn name(&self) -> &str;
}

impl<M: LanguageModel + ?Sized> LanguageModel for &M {
    fn complete(&self, prompt: &str) -> Result<String, SynthesisError> {
        (**self).complete(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<M: LanguageModel + ?Sized> LanguageModel for Box<M> {
    fn complete(&self, prompt: &str) -> Result<String, SynthesisError> {
        (**self).complete(prompt)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
