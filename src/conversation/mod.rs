pub mod engine;
pub mod replies;
pub mod session;

pub use engine::ConversationEngine;
