//! # forgehook-foundation
//!
//! Foundation layer for forgehook:
//! - Error: 에러 분류 + 종료 코드
//! - Config: behavior 설정 (HookSettings, ConfigLoader)
//! - Permission: 민감 경로 가드 (IgnoreRuleSet, PathGuard)
//! - Storage: JsonStore (원자적 교체), SessionStore (세션 억제 상태)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  forgehook-core (Dispatcher, Behaviors)      │
//! │        │                │                    │
//! │        ▼                ▼                    │
//! │  SessionStore       PathGuard                │
//! │  (억제 상태)         (ignore 규칙)             │
//! │        │                                     │
//! │        ▼                                     │
//! │  JsonStore (tmp + rename)                    │
//! └──────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod permission;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Config (설정)
// ============================================================================
pub use config::{
    resolve_project_root, BehaviorSettings, ConfigLoader, EnvOverrides, HookSettings, SubContext,
    CONFIG_DIR_NAME,
};

// ============================================================================
// Permission (민감 경로)
// ============================================================================
pub use permission::{GuardVerdict, IgnoreRule, IgnoreRuleSet, PathGuard, RuleSource};

// ============================================================================
// Storage (저장소)
// ============================================================================
pub use storage::{
    extract_session_id, validate_session_id, JsonStore, PolicyChange, SessionRecord, SessionStore,
};
