pub mod api_client;
pub mod base;
pub mod errors;
pub mod formats;
pub mod openai;

pub use base::Provider;
pub use errors::ProviderError;
pub use openai::OpenAiProvider;
