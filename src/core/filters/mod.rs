// Spam filters and the chain that runs them.

pub mod content_filter;
pub mod filter_chain;
pub mod forward_filter;
pub mod join_check;
pub mod reputation_filter;

pub use content_filter::{ClassifierConfig, ContentFilter};
pub use filter_chain::{FilterChain, SpamFilter};
pub use forward_filter::ForwardFilter;
pub use join_check::JoinGuard;
pub use reputation_filter::ReputationFilter;
