// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "reputation/lols_client.rs"]
pub mod reputation;

#[path = "admin/members_roster.rs"]
pub mod admin;

#[path = "telegram/bot_api_client.rs"]
pub mod telegram;

#[path = "state/json_state_store.rs"]
pub mod state;
