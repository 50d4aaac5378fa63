mod client;
mod wire;

pub use client::{OpenAIAssistantClient, OpenAIAssistantClientBuilder};
