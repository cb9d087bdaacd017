//! Transparency module for the Investigation Agent.
//!
//! Tracks what the agent collected, saved, shared and uploaded so a user
//! can audit its activity.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, ActivityLog, ActivityStats,
    SharedActivityLog,
};
