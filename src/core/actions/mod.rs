// Platform actions and their deferred execution.

pub mod action_scheduler;
pub mod audit_log;
pub mod moderation_actions;

pub use action_scheduler::{ActionScheduler, TokioScheduler};
pub use moderation_actions::{ActionError, ModerationActions, RetryingActions};
