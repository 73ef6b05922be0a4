//! Checkpoint System
//!
//! Records the full working tree as a named entry in the stash list without
//! touching the index or the working tree.
//!
//! Procedure:
//! 1. Nothing pending → nothing to checkpoint
//! 2. Write the real index as a tree (the staged selection)
//! 3. Copy the index, `add -A` into the copy, write that as a tree
//! 4. Build a stash-shaped commit pair and `git stash store` it
//! 5. Verify the real index still writes the same tree (mismatch is an error)

use super::ops::GitOps;
use chrono::{DateTime, SecondsFormat, Utc};
use forgehook_foundation::{Error, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Prefix of every checkpoint entry in the stash list
pub const CHECKPOINT_PREFIX: &str = "forgehook checkpoint";

// ============================================================================
// Checkpoint Types
// ============================================================================

/// A recorded checkpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Label given by the caller
    pub label: String,

    /// Stash commit holding the full snapshot
    pub commit: String,

    /// Tree of the staged selection at creation time
    pub staged_tree: String,

    /// Stash list message
    pub message: String,

    /// When the checkpoint was created
    pub created_at: DateTime<Utc>,
}

/// Result of a checkpoint attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointOutcome {
    /// Working tree and index are clean
    NothingToCheckpoint,
    /// Snapshot recorded
    Created(Checkpoint),
}

/// Stash list message for a checkpoint
pub fn checkpoint_message(label: &str, at: DateTime<Utc>) -> String {
    format!(
        "{}: {} @ {}",
        CHECKPOINT_PREFIX,
        label,
        at.to_rfc3339_opts(SecondsFormat::Secs, true)
    )
}

// ============================================================================
// Checkpoint creation
// ============================================================================

/// Create a checkpoint of all pending modifications
pub async fn create_checkpoint(git: &GitOps, label: &str) -> Result<CheckpointOutcome> {
    let status = git.status().await?;
    if !status.has_pending() {
        debug!("Working tree clean, nothing to checkpoint");
        return Ok(CheckpointOutcome::NothingToCheckpoint);
    }

    // Staged selection
    let staged_tree = git.write_tree().await?;
    let head = git.head().await;

    // Full snapshot through a private copy of the index
    let scratch = ScratchIndex::create(git).await?;
    let snapshot = git.snapshot_tree(&scratch.path).await;
    drop(scratch);
    let worktree_tree = snapshot?;

    let created_at = Utc::now();
    let message = checkpoint_message(label, created_at);

    let mut parents: Vec<&str> = head.iter().map(String::as_str).collect();
    let index_commit = git
        .commit_tree(&staged_tree, &parents, &format!("index on {}", label))
        .await?;
    parents.push(&index_commit);
    let commit = git.commit_tree(&worktree_tree, &parents, &message).await?;

    git.stash_store(&commit, &message).await?;

    verify_staging(git, &staged_tree).await?;

    info!(label, commit = %commit, "Created checkpoint");

    Ok(CheckpointOutcome::Created(Checkpoint {
        label: label.to_string(),
        commit,
        staged_tree,
        message,
        created_at,
    }))
}

/// The staged selection must be identical after the checkpoint
///
/// A mismatch is reported, never repaired.
async fn verify_staging(git: &GitOps, expected_tree: &str) -> Result<()> {
    let actual = git.write_tree().await?;
    if actual == expected_tree {
        return Ok(());
    }

    warn!(
        expected = expected_tree,
        actual = %actual,
        "Staged selection changed during checkpoint"
    );
    Err(Error::Git(format!(
        "Staged selection changed during checkpoint: expected tree {}, found {}",
        expected_tree, actual
    )))
}

// ============================================================================
// Scratch index
// ============================================================================

/// Temporary copy of the index, removed on drop
struct ScratchIndex {
    path: PathBuf,
}

impl ScratchIndex {
    async fn create(git: &GitOps) -> Result<Self> {
        let git_dir = git.git_dir().await?;
        let path = git_dir.join(format!("forgehook-index-{}", uuid::Uuid::new_v4()));

        let real_index = git_dir.join("index");
        if real_index.exists() {
            std::fs::copy(&real_index, &path).map_err(|e| {
                Error::Git(format!(
                    "Failed to copy index to {}: {}",
                    path.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path })
    }
}

impl Drop for ScratchIndex {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), error = %e, "Failed to remove scratch index");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
