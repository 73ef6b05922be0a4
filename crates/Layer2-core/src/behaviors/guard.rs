//! Guard Behavior - 민감 경로 접근 판정
//!
//! 프로젝트 루트의 ignore 파일(없으면 내장 기본 규칙)로 tool 입력의
//! 경로를 검사해 allow/deny 를 돌려준다. 상대 경로는 작업 디렉토리 기준으로 푼다.

use crate::hook::{Behavior, HookEventType, HookInvocationContext, HookResult, ToolMatcher};
use async_trait::async_trait;
use forgehook_foundation::PathGuard;
use tracing::debug;

/// 파일 접근 tool
const GUARDED_TOOLS: &str = "Read|Edit|MultiEdit|Write|NotebookEdit|Grep|Glob";

/// 민감 경로 가드
#[derive(Debug, Default)]
pub struct GuardBehavior;

impl GuardBehavior {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Behavior for GuardBehavior {
    fn name(&self) -> &str {
        "guard"
    }

    fn description(&self) -> &str {
        "Deny access to sensitive paths (env files, keys, credentials)"
    }

    fn events(&self) -> Vec<HookEventType> {
        vec![HookEventType::PreToolUse]
    }

    fn tool_matcher(&self) -> Option<ToolMatcher> {
        Some(ToolMatcher::new(GUARDED_TOOLS))
    }

    async fn execute(&self, ctx: &HookInvocationContext) -> HookResult {
        let Some(path) = ctx.target_file() else {
            return HookResult::allow("no path to check");
        };

        // 규칙은 호출마다 다시 읽는다
        let guard = PathGuard::load(&ctx.project_root);
        let verdict = guard.check(&path);
        debug!(path = %path.display(), protected = verdict.protected, "Guard verdict");

        if verdict.protected {
            HookResult::deny(verdict.reason)
        } else {
            HookResult::allow(verdict.reason)
        }
    }
}
