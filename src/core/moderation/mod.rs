// Core moderation module - domain types and the persisted moderation state.

pub mod moderation_models;
pub mod moderation_state;

pub use moderation_models::*;
pub use moderation_state::*;
