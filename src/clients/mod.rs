//! Client modules.

pub mod pinecone;
pub mod vgg;

pub use pinecone::PineconeClient;
pub use vgg::{VggExtractor, VggModelConfig};
