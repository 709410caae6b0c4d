pub mod endpoint;
pub mod http;
pub mod models;
pub mod normalize;
pub mod reference;
pub mod resolver;
pub mod traits;

pub use endpoint::ResolverEndpoint;
pub use http::HttpExtractor;
pub use models::{Author, QualityTag, QualityVariant, SourceTag, Statistics, VideoRecord};
pub use reference::{VideoReference, DEFAULT_ACCEPTED_HOSTS};
pub use resolver::Resolver;
pub use traits::{Extractor, RawPayload};
