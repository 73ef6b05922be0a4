//! forgehook-core: Hook Runtime Kernel
//!
//! Layer2 - 이벤트 처리 레이어
//!
//! # 주요 모듈
//!
//! - `payload`: 호스트 이벤트 페이로드 + 멈추지 않는 stdin 리더
//! - `exec`: 외부 프로그램 실행 (타임아웃, 취소, TERM→KILL)
//! - `git`: 작업 트리 저장점 (checkpoint)
//! - `hook`: Behavior trait, 레지스트리, Dispatcher
//! - `behaviors`: 내장 behavior (guard, checkpoint, lint, typecheck, test)
//!
//! # 사용 예시
//!
//! ```ignore
//! use forgehook_core::{builtin_registry, BehaviorSelector, Dispatcher, PayloadReader};
//!
//! let payload = PayloadReader::new().read_stdin().await;
//! let dispatcher = Dispatcher::new(builtin_registry(), settings, sessions, project_root);
//! let response = dispatcher.dispatch(payload, &BehaviorSelector::parse("guard")).await;
//!
//! if let Some(json) = &response.stdout {
//!     println!("{}", json);
//! }
//! ```

pub mod behaviors;
pub mod exec;
pub mod git;
pub mod hook;
pub mod payload;

// Re-exports: Behaviors
pub use behaviors::{
    all_behaviors, builtin_registry, CheckpointBehavior, GuardBehavior, ToolCheckBehavior,
};

// Re-exports: Exec
pub use exec::{quote_arg, ExecOutcome, ExecSpec, ExitKind, ProcessExecutor};

// Re-exports: Git
pub use git::{create_checkpoint, Checkpoint, CheckpointOutcome, GitOps, GitStatus};

// Re-exports: Hook
pub use hook::{
    Behavior, BehaviorRegistry, BehaviorSelector, Decision, DispatchResponse, Dispatcher,
    HookEventType, HookInvocationContext, HookResult, HookStatus, SkipReason,
    StructuredDecision, ToolMatcher, EXIT_BLOCK, EXIT_ERROR, EXIT_SUCCESS,
};

// Re-exports: Payload
pub use payload::{EventPayload, PayloadReader};
