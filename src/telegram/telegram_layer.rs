// Telegram layer - update payloads and dispatch.

#[path = "update.rs"]
pub mod update;

#[path = "dispatcher.rs"]
pub mod dispatcher;

pub use dispatcher::Dispatcher;
