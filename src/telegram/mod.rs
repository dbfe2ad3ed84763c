pub mod client;
pub mod dispatcher;
pub mod types;

pub use client::TelegramClient;
pub use dispatcher::Dispatcher;
