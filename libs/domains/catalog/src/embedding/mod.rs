mod gateway;
mod openai;
pub mod prompt;

#[cfg(test)]
pub use gateway::MockEmbeddingGateway;
pub use gateway::EmbeddingGateway;
pub use openai::{ApiFlavor, OpenAiConfig, OpenAiGateway};
pub use prompt::parse_image_description;
