//! Git Operations
//!
//! Plumbing-level git commands run through the Process Executor.

use crate::exec::{ExecSpec, ProcessExecutor};
use forgehook_foundation::{Error, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Timeout for a single git command
const GIT_TIMEOUT: Duration = Duration::from_secs(30);

/// Identity used for checkpoint commits
const IDENT_NAME: &str = "forgehook";
const IDENT_EMAIL: &str = "forgehook@localhost";

// ============================================================================
// Git Status Types
// ============================================================================

/// Status of a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    /// Added to the index
    New,
    /// Modified
    Modified,
    /// Deleted
    Deleted,
    /// Renamed or copied
    Renamed,
    /// Untracked
    Untracked,
}

/// Overall git repository status
#[derive(Debug, Clone, Default)]
pub struct GitStatus {
    /// Files with their status
    pub files: Vec<(PathBuf, FileStatus)>,

    /// Whether there are staged changes
    pub has_staged: bool,

    /// Whether there are unstaged changes
    pub has_unstaged: bool,

    /// Whether there are untracked files
    pub has_untracked: bool,
}

impl GitStatus {
    /// Parse `git status --porcelain=v1` output
    pub fn parse(porcelain: &str) -> Self {
        let mut status = GitStatus::default();

        for line in porcelain.lines() {
            let mut chars = line.chars();
            let (Some(index_status), Some(worktree_status)) = (chars.next(), chars.next()) else {
                continue;
            };
            let Some(file_path) = line.get(3..) else {
                continue;
            };

            let file_status = match (index_status, worktree_status) {
                ('?', '?') => {
                    status.has_untracked = true;
                    FileStatus::Untracked
                }
                (index, worktree) => {
                    if index != ' ' {
                        status.has_staged = true;
                    }
                    if worktree != ' ' {
                        status.has_unstaged = true;
                    }
                    match (index, worktree) {
                        ('A', _) => FileStatus::New,
                        ('D', _) | (_, 'D') => FileStatus::Deleted,
                        ('R', _) | ('C', _) => FileStatus::Renamed,
                        _ => FileStatus::Modified,
                    }
                }
            };

            status.files.push((PathBuf::from(file_path), file_status));
        }

        status
    }

    /// Check if working tree is clean
    pub fn is_clean(&self) -> bool {
        !self.has_staged && !self.has_unstaged && !self.has_untracked
    }

    /// Check if there is anything a checkpoint would capture
    pub fn has_pending(&self) -> bool {
        !self.is_clean()
    }
}

// ============================================================================
// Git Operations
// ============================================================================

/// Git operations handler
#[derive(Debug, Clone)]
pub struct GitOps {
    /// Repository root directory
    root: PathBuf,

    executor: ProcessExecutor,
}

impl GitOps {
    /// Create GitOps for the repository containing `path`
    pub fn discover(path: impl AsRef<Path>, executor: ProcessExecutor) -> Result<Self> {
        let path = path.as_ref();
        let root = Self::find_git_root(path)
            .ok_or_else(|| Error::Git(format!("Not a git repository: {}", path.display())))?;
        Ok(Self { root, executor })
    }

    /// Find the git repository root
    fn find_git_root(path: &Path) -> Option<PathBuf> {
        let start = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };
        start
            .ancestors()
            .find(|dir| dir.join(".git").exists())
            .map(Path::to_path_buf)
    }

    /// Check if directory is inside a git repository
    pub fn is_repo(path: impl AsRef<Path>) -> bool {
        Self::find_git_root(path.as_ref()).is_some()
    }

    /// Get repository root
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn command<S: AsRef<str>>(&self, args: &[S]) -> ExecSpec {
        ExecSpec::new("git")
            .args(args.iter().map(|a| a.as_ref().to_string()))
            .current_dir(&self.root)
            .env("GIT_AUTHOR_NAME", IDENT_NAME)
            .env("GIT_AUTHOR_EMAIL", IDENT_EMAIL)
            .env("GIT_COMMITTER_NAME", IDENT_NAME)
            .env("GIT_COMMITTER_EMAIL", IDENT_EMAIL)
            .env("GIT_TERMINAL_PROMPT", "0")
            .timeout(GIT_TIMEOUT)
    }

    /// Run a git command and return stdout without the trailing newline
    async fn run(&self, spec: ExecSpec) -> Result<String> {
        let outcome = self.executor.run(&spec).await?;

        // Leading whitespace is significant in porcelain status lines
        if outcome.success() {
            Ok(outcome.stdout.trim_end().to_string())
        } else if outcome.timed_out() {
            Err(Error::Git(format!(
                "`{}` timed out after {:?}",
                spec.display(),
                GIT_TIMEOUT
            )))
        } else {
            Err(Error::Git(format!(
                "`{}` failed: {}",
                spec.display(),
                outcome.stderr.trim()
            )))
        }
    }

    async fn run_git<S: AsRef<str>>(&self, args: &[S]) -> Result<String> {
        self.run(self.command(args)).await
    }

    /// Run a git command against an alternate index file
    async fn run_with_index<S: AsRef<str>>(&self, index: &Path, args: &[S]) -> Result<String> {
        let spec = self
            .command(args)
            .env("GIT_INDEX_FILE", index.to_string_lossy());
        self.run(spec).await
    }

    /// Get repository status
    pub async fn status(&self) -> Result<GitStatus> {
        let output = self
            .run_git(&["status", "--porcelain=v1", "--untracked-files=all"])
            .await?;
        Ok(GitStatus::parse(&output))
    }

    /// Absolute path of the `.git` directory
    pub async fn git_dir(&self) -> Result<PathBuf> {
        let dir = self.run_git(&["rev-parse", "--absolute-git-dir"]).await?;
        Ok(PathBuf::from(dir))
    }

    /// Current HEAD commit (None before the first commit)
    pub async fn head(&self) -> Option<String> {
        self.run_git(&["rev-parse", "--verify", "--quiet", "HEAD"])
            .await
            .ok()
            .filter(|h| !h.is_empty())
    }

    /// Write the real index as a tree object
    pub async fn write_tree(&self) -> Result<String> {
        self.run_git(&["write-tree"]).await
    }

    /// Stage everything into an alternate index and write it as a tree
    pub async fn snapshot_tree(&self, index: &Path) -> Result<String> {
        self.run_with_index(index, &["add", "-A"]).await?;
        self.run_with_index(index, &["write-tree"]).await
    }

    /// Create a commit object without touching any ref
    pub async fn commit_tree(&self, tree: &str, parents: &[&str], message: &str) -> Result<String> {
        let mut args = vec!["commit-tree".to_string(), tree.to_string()];
        for parent in parents {
            args.push("-p".to_string());
            args.push(parent.to_string());
        }
        args.push("-m".to_string());
        args.push(message.to_string());
        self.run_git(args.as_slice()).await
    }

    /// Record a commit in the stash list
    pub async fn stash_store(&self, commit: &str, message: &str) -> Result<()> {
        self.run_git(&["stash", "store", "-m", message, commit])
            .await?;
        debug!(commit, "Stored stash entry");
        Ok(())
    }

    /// Stash list subjects
    pub async fn stash_list(&self) -> Result<Vec<String>> {
        let output = self.run_git(&["stash", "list", "--format=%gs"]).await?;
        Ok(output.lines().map(str::to_string).collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_porcelain() {
        let status = GitStatus::parse("M  staged.rs\n M unstaged.rs\n?? new.txt\nA  added.rs\n");
        assert!(status.has_staged);
        assert!(status.has_unstaged);
        assert!(status.has_untracked);
        assert_eq!(status.files.len(), 4);
        assert_eq!(status.files[0], (PathBuf::from("staged.rs"), FileStatus::Modified));
        assert_eq!(status.files[3].1, FileStatus::New);
    }

    #[test]
    fn test_git_status_is_clean() {
        let status = GitStatus::parse("");
        assert!(status.is_clean());
        assert!(!status.has_pending());
    }

    #[test]
    fn test_is_repo() {
        assert!(!GitOps::is_repo("/nonexistent/path/that/does/not/exist"));

        let dir = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        assert!(GitOps::is_repo(dir.path().join("a/b")));
    }
}
