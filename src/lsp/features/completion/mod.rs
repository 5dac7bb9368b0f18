//! Trigger-character completion
//!
//! This module provides:
//! - Subsequence fuzzy scoring of symbol names ([`fuzzy`])
//! - Global ranking and LSP presentation of candidates ([`ranking`])
//! - One engine per trigger character ([`trigger`])
//! - First-match-wins routing across engines ([`routing`])

pub mod fuzzy;
pub mod ranking;
pub mod routing;
pub mod trigger;

pub use fuzzy::Pattern;
pub use ranking::{rank_candidates, sort_text, to_completion_items};
pub use routing::CompletionRouter;
pub use trigger::TriggerCompletion;
