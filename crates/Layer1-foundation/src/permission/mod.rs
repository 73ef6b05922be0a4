//! Sensitive path protection
//!
//! - `rules`: ignore 파일 병합 (IgnoreRuleSet)
//! - `guard`: 경로 판정 (PathGuard)
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use forgehook_foundation::permission::PathGuard;
//!
//! let guard = PathGuard::load("/work/app");
//! let verdict = guard.check(".env");
//! if verdict.protected {
//!     // 차단
//! }
//! ```

mod guard;
mod rules;

pub use guard::{GuardVerdict, PathGuard};
pub use rules::{IgnoreRule, IgnoreRuleSet, RuleSource, DEFAULT_RULES, IGNORE_FILE_NAMES};
