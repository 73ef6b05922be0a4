//! Git Integration Module
//!
//! - **ops**: plumbing commands (status, write-tree, commit-tree, stash store)
//! - **checkpoint**: named save points in the stash list that leave the
//!   index and working tree untouched

pub mod checkpoint;
pub mod ops;

pub use checkpoint::{
    checkpoint_message, create_checkpoint, Checkpoint, CheckpointOutcome, CHECKPOINT_PREFIX,
};
pub use ops::{FileStatus, GitOps, GitStatus};
