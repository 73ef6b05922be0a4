//! Builtin Behaviors - 내장 behavior
//!
//! ## behavior 목록
//!
//! ### 버전 관리
//! - `checkpoint` - 파일 수정 전 작업 트리를 stash 목록에 저장
//!
//! ### 접근 제어
//! - `guard` - 민감 경로 접근을 allow/deny 로 판정
//!
//! ### 도구 실행
//! - `lint` - 수정된 파일에 린터 실행
//! - `typecheck` - 수정된 파일에 타입 체커 실행
//! - `test` - 턴 종료 시 테스트 실행
//!
//! 도구 실행 behavior 의 명령줄은 전부 설정(`options.command`)에서 온다.

pub mod checkpoint;
pub mod guard;
pub mod tool_check;

pub use checkpoint::CheckpointBehavior;
pub use guard::GuardBehavior;
pub use tool_check::ToolCheckBehavior;

use crate::hook::{Behavior, BehaviorRegistry};
use std::sync::Arc;

/// 모든 builtin behavior 인스턴스 생성 (실행 순서)
pub fn all_behaviors() -> Vec<Arc<dyn Behavior>> {
    vec![
        // 접근 제어가 먼저
        Arc::new(GuardBehavior::new()) as Arc<dyn Behavior>,
        Arc::new(CheckpointBehavior::new()),
        Arc::new(ToolCheckBehavior::lint()),
        Arc::new(ToolCheckBehavior::typecheck()),
        Arc::new(ToolCheckBehavior::test()),
    ]
}

/// builtin behavior 가 등록된 레지스트리
pub fn builtin_registry() -> BehaviorRegistry {
    let mut registry = BehaviorRegistry::new();
    for behavior in all_behaviors() {
        registry.register(behavior);
    }
    registry
}
