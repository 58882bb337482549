//! Generation provider adapter: provider resolution, HTTP client, response decoding and
//! the hashtag / caption capabilities built on top.

pub mod caption;
pub mod hashtags;
pub mod models;
pub mod provider;
pub mod response;

pub use caption::generate_caption;
pub use hashtags::{generate_hashtags, normalize_hashtags, MAX_HASHTAGS};
pub use models::{ModelDescriptor, ModelProvider};
pub use provider::{
    resolve_provider, AiGateway, GenerationProvider, GenerationRequest, OpenAiCompatibleProvider,
    ProviderError, ResolvedProvider,
};
pub use response::GenerationResponse;
