pub mod backend;
pub mod config;
pub mod document;
pub mod error;
pub mod http;
pub mod llm;
pub mod normalize;
pub mod orchestrator;
pub mod request;

pub use orchestrator::{NO_BACKEND_MESSAGE, Orchestrator};
pub use request::PromptRequest;
