pub mod ai_client;
pub mod analysis;
pub mod server;
pub mod settings;
