//! Dispatcher 통합 테스트 - builtin behavior 와 실제 파일시스템 사용

use forgehook_core::{
    builtin_registry, BehaviorSelector, DispatchResponse, Dispatcher, EventPayload, SkipReason,
    EXIT_BLOCK, EXIT_SUCCESS,
};
use forgehook_foundation::{BehaviorSettings, HookSettings, SessionStore};
use serde_json::json;
use tempfile::TempDir;

const TRANSCRIPT: &str =
    "/home/dev/.claude/projects/app/0f8fad5b-d9cb-469f-a165-70867728950e.jsonl";
const SESSION: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

struct Fixture {
    project: TempDir,
    state: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            project: TempDir::new().unwrap(),
            state: TempDir::new().unwrap(),
        }
    }

    fn sessions(&self) -> SessionStore {
        SessionStore::new(self.state.path())
    }

    fn dispatcher(&self, settings: HookSettings) -> Dispatcher {
        Dispatcher::new(
            builtin_registry(),
            settings,
            self.sessions(),
            self.project.path(),
        )
    }

    async fn dispatch(&self, settings: HookSettings, raw: &str, selector: &str) -> DispatchResponse {
        self.dispatcher(settings)
            .dispatch(EventPayload::parse(raw), &BehaviorSelector::parse(selector))
            .await
    }
}

#[tokio::test]
async fn test_env_file_denied_source_allowed() {
    let fx = Fixture::new();

    let denied = fx
        .dispatch(
            HookSettings::new(),
            r#"{"event":"PreToolUse","tool":"Read","toolInput":{"path":".env"}}"#,
            "guard",
        )
        .await;
    assert_eq!(denied.exit_code, EXIT_SUCCESS);
    assert_eq!(denied.decision().as_deref(), Some("deny"));

    let allowed = fx
        .dispatch(
            HookSettings::new(),
            r#"{"event":"PreToolUse","tool":"Read","toolInput":{"path":"src/app.ts"}}"#,
            "guard",
        )
        .await;
    assert_eq!(allowed.exit_code, EXIT_SUCCESS);
    assert_eq!(allowed.decision().as_deref(), Some("allow"));
}

#[tokio::test]
async fn test_env_file_denied_with_mixed_or_mistyped_keys() {
    let fx = Fixture::new();

    let payloads = [
        r#"{"event":"PreToolUse","hook_event_name":"PreToolUse","tool":"Read","tool_name":"Read","tool_input":{"file_path":".env"}}"#,
        r#"{"event":"PreToolUse","tool":"Read","toolInput":{"path":".env"},"agent_id":42,"turnActive":null}"#,
    ];
    for raw in payloads {
        let response = fx.dispatch(HookSettings::new(), raw, "guard").await;
        assert_eq!(response.exit_code, EXIT_SUCCESS, "{}", raw);
        assert_eq!(response.decision().as_deref(), Some("deny"), "{}", raw);
    }
}

#[tokio::test]
async fn test_deny_reason_names_rule_source() {
    let fx = Fixture::new();
    std::fs::write(
        fx.project.path().join(".claudeignore"),
        "secrets/\n!secrets/readme.md\n",
    )
    .unwrap();

    let response = fx
        .dispatch(
            HookSettings::new(),
            r#"{"hook_event_name":"PreToolUse","tool_name":"Edit","tool_input":{"file_path":"secrets/key.pem"}}"#,
            "all",
        )
        .await;

    let value: serde_json::Value = serde_json::from_str(response.stdout.as_deref().unwrap()).unwrap();
    assert_eq!(value["hookSpecificOutput"]["permissionDecision"], "deny");
    let reason = value["hookSpecificOutput"]["permissionDecisionReason"]
        .as_str()
        .unwrap();
    assert!(reason.contains(".claudeignore"), "{}", reason);
}

#[tokio::test]
async fn test_session_suppression_skips_guard() {
    let fx = Fixture::new();
    fx.sessions()
        .suppress(SESSION, "guard", fx.project.path())
        .unwrap();

    let raw = json!({
        "event": "PreToolUse",
        "tool": "Read",
        "toolInput": { "path": ".env" },
        "transcriptPath": TRANSCRIPT,
    })
    .to_string();

    let response = fx.dispatch(HookSettings::new(), &raw, "guard").await;
    assert_eq!(response.exit_code, EXIT_SUCCESS);
    assert!(response.stdout.is_none());
    assert_eq!(
        response.skipped,
        vec![("guard".to_string(), SkipReason::SessionSuppressed)]
    );

    // 복원 후에는 다시 실행
    fx.sessions().restore(SESSION, "guard").unwrap();
    let response = fx.dispatch(HookSettings::new(), &raw, "guard").await;
    assert_eq!(response.decision().as_deref(), Some("deny"));
}

#[tokio::test]
async fn test_permanent_disable_beats_session_restore() {
    let fx = Fixture::new();
    fx.sessions().restore(SESSION, "guard").unwrap();

    let settings = HookSettings::new().with_behavior("guard", BehaviorSettings::disabled());
    let raw = json!({
        "event": "PreToolUse",
        "tool": "Read",
        "toolInput": { "path": ".env" },
        "transcriptPath": TRANSCRIPT,
    })
    .to_string();

    let response = fx.dispatch(settings, &raw, "guard").await;
    assert!(response.stdout.is_none());
    assert_eq!(
        response.skipped,
        vec![("guard".to_string(), SkipReason::Disabled)]
    );
}

#[tokio::test]
async fn test_loop_prevention() {
    let fx = Fixture::new();
    let settings = HookSettings::new().with_behavior(
        "test",
        BehaviorSettings {
            options: [("command".to_string(), json!("false"))].into_iter().collect(),
            ..Default::default()
        },
    );

    let response = fx
        .dispatch(settings, r#"{"hook_event_name":"Stop","stop_hook_active":true}"#, "all")
        .await;
    assert_eq!(response.exit_code, EXIT_SUCCESS);
    assert!(response.ran.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_tool_failure_and_timeout_are_distinct() {
    let fx = Fixture::new();

    let failing = HookSettings::new().with_behavior(
        "test",
        BehaviorSettings {
            options: [("command".to_string(), json!("sh -c 'echo broken >&2; exit 1'"))]
                .into_iter()
                .collect(),
            ..Default::default()
        },
    );
    let response = fx.dispatch(failing, r#"{"event":"Stop"}"#, "test").await;
    assert_eq!(response.exit_code, EXIT_BLOCK);
    assert!(response.diagnostics().contains("exit code 1"));
    assert!(response.diagnostics().contains("broken"));

    let hanging = HookSettings::new().with_behavior(
        "test",
        BehaviorSettings {
            timeout_ms: Some(200),
            options: [("command".to_string(), json!("sleep 5"))]
                .into_iter()
                .collect(),
            ..Default::default()
        },
    );
    let response = fx.dispatch(hanging, r#"{"event":"Stop"}"#, "test").await;
    assert_eq!(response.exit_code, EXIT_BLOCK);
    assert!(response.diagnostics().contains("timed out after 200ms"));
}
