//! # Hook System
//!
//! 호스트 이벤트 하나를 받아 묶인 behavior 를 실행하고 응답 하나로 접는다.
//!
//! ## 구성
//!
//! - `types`: 이벤트 타입, tool 매처, HookResult
//! - `behavior`: Behavior trait, BehaviorRegistry, BehaviorSelector
//! - `context`: behavior 에 넘기는 HookInvocationContext
//! - `dispatcher`: 정책 적용 + 순차 실행 + 응답 접기
//!
//! ## 정책 우선순위
//!
//! ```text
//! 설정 비활성 (호출 안 함)
//!   > 세션 억제 (건너뜀)
//!   > 하위 컨텍스트 비활성 (건너뜀)
//!   > 정상 실행
//! ```
//!
//! ## 예시
//!
//! ```ignore
//! let registry = builtin_registry();
//! let dispatcher = Dispatcher::new(registry, settings, sessions, project_root);
//! let response = dispatcher.dispatch(payload, &BehaviorSelector::All).await;
//! std::process::exit(response.exit_code);
//! ```

mod behavior;
mod context;
mod dispatcher;
mod types;

pub use behavior::{Behavior, BehaviorRegistry, BehaviorSelector};
pub use context::HookInvocationContext;
pub use dispatcher::{
    DispatchResponse, Dispatcher, SkipReason, EXIT_BLOCK, EXIT_ERROR, EXIT_SUCCESS,
};
pub use types::{Decision, HookEventType, HookResult, HookStatus, StructuredDecision, ToolMatcher};
