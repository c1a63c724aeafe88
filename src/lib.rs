pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod paths;

pub use chat::{ChatItem, ChatItemStatus};
pub use client::{ChatClient, Pacing};
pub use config::ChatConfig;
