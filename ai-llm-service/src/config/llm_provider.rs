/// Represents the provider (backend) used for text generation and embeddings.
///
/// Only Google's hosted Gemini API is wired today. Adding another hosted
/// provider means extending this enum and routing it in
/// [`crate::service_profiles::LlmServiceProfiles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Gemini (`generativelanguage.googleapis.com`).
    Gemini,
}
