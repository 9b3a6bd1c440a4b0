// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "actions/mod.rs"]
pub mod actions;

#[path = "admin/admin_cache.rs"]
pub mod admin;

#[path = "reputation/reputation_cache.rs"]
pub mod reputation;

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "filters/mod.rs"]
pub mod filters;

#[path = "commands/command_service.rs"]
pub mod commands;

#[path = "locale/locale.rs"]
pub mod locale;
