pub mod client;
pub mod interface;
pub mod probe;

pub use client::BackendClient;
pub use interface::AgentBackend;
