//! Checkpoint Behavior - 파일 수정 전 저장점
//!
//! 수정 tool 이 실행되기 직전에 작업 트리 전체를 stash 목록에 기록한다.
//! 인덱스(스테이징 선택)와 작업 트리는 건드리지 않는다.

use crate::git::{create_checkpoint, CheckpointOutcome, GitOps};
use crate::hook::{Behavior, HookEventType, HookInvocationContext, HookResult, ToolMatcher};
use async_trait::async_trait;
use tracing::{debug, info};

/// 파일을 수정하는 tool
const EDITING_TOOLS: &str = "Edit|MultiEdit|Write|NotebookEdit";

/// Checkpoint behavior
#[derive(Debug, Default)]
pub struct CheckpointBehavior;

impl CheckpointBehavior {
    pub fn new() -> Self {
        Self
    }

    /// 저장점 이름: 설정 > "<tool> <file>" > 이벤트 이름
    fn label(ctx: &HookInvocationContext) -> String {
        if let Some(label) = ctx.settings.option_str("label") {
            return label.to_string();
        }
        match (ctx.payload.tool_name(), ctx.payload.file_path()) {
            (Some(tool), Some(file)) => format!("{} {}", tool, file),
            (Some(tool), None) => tool.to_string(),
            _ => ctx.payload.event_type().to_string(),
        }
    }
}

#[async_trait]
impl Behavior for CheckpointBehavior {
    fn name(&self) -> &str {
        "checkpoint"
    }

    fn description(&self) -> &str {
        "Record the working tree in the stash list before files are edited"
    }

    fn events(&self) -> Vec<HookEventType> {
        vec![HookEventType::PreToolUse]
    }

    fn tool_matcher(&self) -> Option<ToolMatcher> {
        Some(ToolMatcher::new(EDITING_TOOLS))
    }

    async fn execute(&self, ctx: &HookInvocationContext) -> HookResult {
        if !GitOps::is_repo(&ctx.project_root) {
            debug!(root = %ctx.project_root.display(), "Not a git repository, skipping checkpoint");
            return HookResult::success_with("not a git repository");
        }

        let git = match GitOps::discover(&ctx.project_root, ctx.executor.clone()) {
            Ok(git) => git,
            Err(e) => return e.into(),
        };

        let label = Self::label(ctx);
        match create_checkpoint(&git, &label).await {
            Ok(CheckpointOutcome::NothingToCheckpoint) => {
                HookResult::success_with("nothing to checkpoint")
            }
            Ok(CheckpointOutcome::Created(checkpoint)) => {
                info!(commit = %checkpoint.commit, "Checkpoint recorded");
                HookResult::success_with(checkpoint.message)
            }
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::EventPayload;
    use forgehook_foundation::BehaviorSettings;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_label_from_payload() {
        let payload =
            EventPayload::parse(r#"{"tool":"Edit","toolInput":{"file_path":"src/app.ts"}}"#);
        let ctx = HookInvocationContext::new(payload, "/work");
        assert_eq!(CheckpointBehavior::label(&ctx), "Edit src/app.ts");
    }

    #[test]
    fn test_label_from_settings() {
        let mut settings = BehaviorSettings::default();
        settings.options.insert("label".into(), json!("before refactor"));
        let ctx = HookInvocationContext::new(EventPayload::default(), "/work")
            .with_settings(settings);
        assert_eq!(CheckpointBehavior::label(&ctx), "before refactor");
    }

    #[tokio::test]
    async fn test_outside_repository_succeeds() {
        let dir = TempDir::new().unwrap();
        let payload = EventPayload::parse(r#"{"event":"PreToolUse","tool":"Write"}"#);
        let ctx = HookInvocationContext::new(payload, dir.path());

        let result = CheckpointBehavior::new().execute(&ctx).await;
        assert_eq!(result, HookResult::success_with("not a git repository"));
    }
}
