//! Dispatcher - 이벤트 하나에 대한 behavior 실행
//!
//! 처리 순서:
//! 1. 이번 턴에서 이미 hook 이 실행 중이면 즉시 성공 (루프 방지)
//! 2. 세션 ID 를 한 번 해석
//! 3. 이벤트/tool 에 묶인 behavior 후보 선정
//! 4. 정책 적용: 설정 비활성 > 세션 억제 > 하위 컨텍스트 비활성
//! 5. 남은 behavior 를 등록 순서대로 순차 실행
//! 6. 결과를 호스트 응답 하나로 접기

use super::behavior::{Behavior, BehaviorRegistry, BehaviorSelector};
use super::context::HookInvocationContext;
use super::types::{Decision, HookEventType, HookResult, HookStatus, StructuredDecision};
use crate::exec::ProcessExecutor;
use crate::payload::EventPayload;
use forgehook_foundation::{HookSettings, SessionStore};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 호스트 종료 코드: 성공/건너뜀
pub const EXIT_SUCCESS: i32 = 0;
/// 호스트 종료 코드: 실행 오류
pub const EXIT_ERROR: i32 = 1;
/// 호스트 종료 코드: 차단
pub const EXIT_BLOCK: i32 = 2;

// ============================================================================
// DispatchResponse
// ============================================================================

/// 정책 때문에 건너뛴 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// 설정에서 영구 비활성
    Disabled,
    /// 이 세션에서 억제
    SessionSuppressed,
    /// 현재 하위 컨텍스트에서 비활성
    SubContextDisabled,
}

/// 호스트에 돌려줄 응답
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    /// 종료 코드 (0/1/2)
    pub exit_code: i32,

    /// stdout 에 쓸 JSON (접근 제어 판정이 있을 때만)
    pub stdout: Option<String>,

    /// stderr 에 쓸 진단
    pub stderr: Vec<String>,

    /// 실행된 behavior
    pub ran: Vec<String>,

    /// 건너뛴 behavior
    pub skipped: Vec<(String, SkipReason)>,
}

impl DispatchResponse {
    fn empty() -> Self {
        Self {
            exit_code: EXIT_SUCCESS,
            stdout: None,
            stderr: Vec::new(),
            ran: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == EXIT_SUCCESS
    }

    pub fn is_block(&self) -> bool {
        self.exit_code == EXIT_BLOCK
    }

    /// stderr 진단을 한 덩어리로
    pub fn diagnostics(&self) -> String {
        self.stderr.join("\n")
    }

    /// stdout JSON 에서 판정 추출 ("allow"/"deny")
    pub fn decision(&self) -> Option<String> {
        let raw = self.stdout.as_deref()?;
        let value: serde_json::Value = serde_json::from_str(raw).ok()?;
        value["hookSpecificOutput"]["permissionDecision"]
            .as_str()
            .map(str::to_string)
    }
}

// ============================================================================
// Dispatcher
// ============================================================================

/// Hook dispatcher
pub struct Dispatcher {
    registry: BehaviorRegistry,
    settings: HookSettings,
    sessions: SessionStore,
    executor: ProcessExecutor,
    working_dir: PathBuf,
    project_root: PathBuf,
}

impl Dispatcher {
    /// 새 dispatcher 생성
    pub fn new(
        registry: BehaviorRegistry,
        settings: HookSettings,
        sessions: SessionStore,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        let project_root = project_root.into();
        Self {
            registry,
            settings,
            sessions,
            executor: ProcessExecutor::new(),
            working_dir: project_root.clone(),
            project_root,
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_executor(mut self, executor: ProcessExecutor) -> Self {
        self.executor = executor;
        self
    }

    pub fn registry(&self) -> &BehaviorRegistry {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// 이벤트 하나 처리
    pub async fn dispatch(
        &self,
        payload: EventPayload,
        selector: &BehaviorSelector,
    ) -> DispatchResponse {
        let event = payload.event_type();

        if payload.turn_active {
            debug!(event = %event, "Hook already active for this turn, skipping");
            return DispatchResponse::empty();
        }

        if let BehaviorSelector::Named(names) = selector {
            for name in names.iter().filter(|n| !self.registry.contains(n)) {
                warn!(behavior = %name, "Unknown behavior in selector");
            }
        }

        let session_id = payload.resolve_session_id();
        let sub_context = payload.sub_context();
        let tool_name = payload.tool_name().map(str::to_string);

        let candidates: Vec<Arc<dyn Behavior>> = self
            .registry
            .all()
            .iter()
            .filter(|b| selector.includes(b.name()))
            .filter(|b| b.binds(&event, tool_name.as_deref()))
            .cloned()
            .collect();

        debug!(
            event = %event,
            tool = tool_name.as_deref().unwrap_or(""),
            session_id = session_id.as_deref().unwrap_or(""),
            candidates = candidates.len(),
            "Dispatching hook event"
        );

        let mut response = DispatchResponse::empty();
        let mut results: Vec<(String, HookResult)> = Vec::new();

        for behavior in candidates {
            let name = behavior.name().to_string();
            let settings = self.settings.behavior(&name);

            let skip = if !settings.is_enabled() {
                Some(SkipReason::Disabled)
            } else if session_id
                .as_deref()
                .is_some_and(|id| self.sessions.is_suppressed(id, &name))
            {
                Some(SkipReason::SessionSuppressed)
            } else if settings.is_disabled_in(sub_context) {
                Some(SkipReason::SubContextDisabled)
            } else {
                None
            };

            if let Some(reason) = skip {
                debug!(behavior = %name, reason = ?reason, "Skipping behavior");
                response.skipped.push((name, reason));
                continue;
            }

            let ctx = HookInvocationContext {
                payload: payload.clone(),
                working_dir: self.working_dir.clone(),
                project_root: self.project_root.clone(),
                settings,
                session_id: session_id.clone(),
                sub_context,
                executor: self.executor.clone(),
            };

            let result = behavior.execute(&ctx).await;
            debug!(behavior = %name, status = ?result.status, "Behavior finished");
            response.ran.push(name.clone());

            if result.fatal {
                warn!(behavior = %name, "Fatal behavior result, stopping invocation");
                results.push((name, result));
                break;
            }
            results.push((name, result));
        }

        fold_results(&event, results, response)
    }
}

// ============================================================================
// 결과 접기
// ============================================================================

/// 우선순위: 치명 > 차단 > 구조화된 판정 (deny 우선) > 실행 오류 > 성공
fn fold_results(
    event: &HookEventType,
    results: Vec<(String, HookResult)>,
    mut response: DispatchResponse,
) -> DispatchResponse {
    if let Some((name, result)) = results.iter().find(|(_, r)| r.fatal) {
        response.exit_code = EXIT_ERROR;
        response.stderr.push(format!("{}: {}", name, result.text));
        return response;
    }

    let blocks: Vec<String> = results
        .iter()
        .filter(|(_, r)| r.is_block())
        .map(|(_, r)| r.text.clone())
        .collect();
    if !blocks.is_empty() {
        info!(event = %event, count = blocks.len(), "Blocking response");
        response.exit_code = EXIT_BLOCK;
        response.stderr = blocks;
        return response;
    }

    let decisions: Vec<&StructuredDecision> =
        results.iter().filter_map(|(_, r)| r.decision.as_ref()).collect();
    if !decisions.is_empty() {
        response.exit_code = EXIT_SUCCESS;
        response.stdout = Some(decision_json(event, &decisions));
        return response;
    }

    let errors: Vec<String> = results
        .iter()
        .filter(|(_, r)| r.status == HookStatus::Error)
        .map(|(name, r)| format!("{}: {}", name, r.text))
        .collect();
    if !errors.is_empty() {
        response.exit_code = EXIT_ERROR;
        response.stderr = errors;
        return response;
    }

    response
}

/// 판정 여러 개를 호스트 JSON 하나로
fn decision_json(event: &HookEventType, decisions: &[&StructuredDecision]) -> String {
    let denied: Vec<&&StructuredDecision> = decisions
        .iter()
        .filter(|d| d.decision == Decision::Deny)
        .collect();

    let (decision, reasons): (Decision, Vec<&str>) = if denied.is_empty() {
        (
            Decision::Allow,
            decisions.iter().filter_map(|d| d.reason.as_deref()).collect(),
        )
    } else {
        (
            Decision::Deny,
            denied.iter().filter_map(|d| d.reason.as_deref()).collect(),
        )
    };

    let mut output = json!({
        "hookEventName": event.as_str(),
        "permissionDecision": decision.to_string(),
    });
    if !reasons.is_empty() {
        output["permissionDecisionReason"] = json!(reasons.join("; "));
    }

    json!({ "hookSpecificOutput": output }).to_string()
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forgehook_foundation::{BehaviorSettings, SubContext};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const SESSION: &str = "0f8fad5b-d9cb-469f-a165-70867728950e";

    struct Fixed {
        name: &'static str,
        result: HookResult,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str, result: HookResult) -> Arc<Self> {
            Arc::new(Self {
                name,
                result,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Behavior for Fixed {
        fn name(&self) -> &str {
            self.name
        }

        fn events(&self) -> Vec<HookEventType> {
            vec![HookEventType::PreToolUse, HookEventType::SubagentStop]
        }

        async fn execute(&self, _ctx: &HookInvocationContext) -> HookResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn payload(extra: &str) -> EventPayload {
        EventPayload::parse(&format!(
            r#"{{"event":"PreToolUse","tool":"Read","session_id":"{}"{}}}"#,
            SESSION, extra
        ))
    }

    fn dispatcher(dir: &TempDir, behaviors: Vec<Arc<Fixed>>, settings: HookSettings) -> Dispatcher {
        let mut registry = BehaviorRegistry::new();
        for b in behaviors {
            registry.register(b);
        }
        Dispatcher::new(
            registry,
            settings,
            SessionStore::new(dir.path().join("sessions")),
            dir.path(),
        )
    }

    #[tokio::test]
    async fn test_turn_active_short_circuits() {
        let dir = TempDir::new().unwrap();
        let behavior = Fixed::new("a", HookResult::block("no"));
        let d = dispatcher(&dir, vec![behavior.clone()], HookSettings::new());

        let response = d
            .dispatch(payload(r#","turnActive":true"#), &BehaviorSelector::All)
            .await;
        assert!(response.is_success());
        assert_eq!(behavior.calls(), 0);
    }

    #[tokio::test]
    async fn test_block_wins_over_decision() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(
            &dir,
            vec![
                Fixed::new("guard", HookResult::allow("fine")),
                Fixed::new("lint", HookResult::block("lint failed")),
                Fixed::new("broken", HookResult::error("oops")),
            ],
            HookSettings::new(),
        );

        let response = d.dispatch(payload(""), &BehaviorSelector::All).await;
        assert_eq!(response.exit_code, EXIT_BLOCK);
        assert_eq!(response.stderr, vec!["lint failed".to_string()]);
        assert!(response.stdout.is_none());
    }

    #[tokio::test]
    async fn test_deny_wins_over_allow() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(
            &dir,
            vec![
                Fixed::new("a", HookResult::allow("ok")),
                Fixed::new("b", HookResult::deny("secret")),
            ],
            HookSettings::new(),
        );

        let response = d.dispatch(payload(""), &BehaviorSelector::All).await;
        assert_eq!(response.exit_code, EXIT_SUCCESS);
        assert_eq!(response.decision().as_deref(), Some("deny"));

        let value: serde_json::Value =
            serde_json::from_str(response.stdout.as_deref().unwrap()).unwrap();
        assert_eq!(value["hookSpecificOutput"]["hookEventName"], "PreToolUse");
        assert_eq!(
            value["hookSpecificOutput"]["permissionDecisionReason"],
            "secret"
        );
    }

    #[tokio::test]
    async fn test_error_maps_to_exit_one() {
        let dir = TempDir::new().unwrap();
        let d = dispatcher(
            &dir,
            vec![
                Fixed::new("ok", HookResult::success()),
                Fixed::new("broken", HookResult::error("oops")),
            ],
            HookSettings::new(),
        );

        let response = d.dispatch(payload(""), &BehaviorSelector::All).await;
        assert_eq!(response.exit_code, EXIT_ERROR);
        assert_eq!(response.diagnostics(), "broken: oops");
    }

    #[tokio::test]
    async fn test_fatal_stops_invocation() {
        let dir = TempDir::new().unwrap();
        let mut fatal = HookResult::error("could not start");
        fatal.fatal = true;
        let first = Fixed::new("first", fatal);
        let second = Fixed::new("second", HookResult::block("never"));
        let d = dispatcher(&dir, vec![first, second.clone()], HookSettings::new());

        let response = d.dispatch(payload(""), &BehaviorSelector::All).await;
        assert_eq!(response.exit_code, EXIT_ERROR);
        assert_eq!(second.calls(), 0);
        assert_eq!(response.ran, vec!["first".to_string()]);
    }

    #[tokio::test]
    async fn test_policy_precedence() {
        let dir = TempDir::new().unwrap();
        let disabled = Fixed::new("disabled", HookResult::block("x"));
        let suppressed = Fixed::new("suppressed", HookResult::block("x"));
        let subagent_only = Fixed::new("main-only", HookResult::block("x"));
        let runs = Fixed::new("runs", HookResult::success());

        let settings = HookSettings::new()
            .with_behavior("disabled", BehaviorSettings::disabled())
            .with_behavior(
                "main-only",
                BehaviorSettings {
                    disabled_in: vec![SubContext::Subagent],
                    ..Default::default()
                },
            );
        let d = dispatcher(
            &dir,
            vec![
                disabled.clone(),
                suppressed.clone(),
                subagent_only.clone(),
                runs.clone(),
            ],
            settings,
        );

        // 영구 비활성은 세션 복원보다 우선
        d.sessions()
            .suppress(SESSION, "disabled", dir.path())
            .unwrap();
        d.sessions().restore(SESSION, "disabled").unwrap();
        d.sessions()
            .suppress(SESSION, "suppressed", dir.path())
            .unwrap();

        let response = d
            .dispatch(payload(r#","agent_id":"sub-1""#), &BehaviorSelector::All)
            .await;

        assert!(response.is_success());
        assert_eq!(
            response.skipped,
            vec![
                ("disabled".to_string(), SkipReason::Disabled),
                ("suppressed".to_string(), SkipReason::SessionSuppressed),
                ("main-only".to_string(), SkipReason::SubContextDisabled),
            ]
        );
        assert_eq!(response.ran, vec!["runs".to_string()]);
        assert_eq!(disabled.calls() + suppressed.calls() + subagent_only.calls(), 0);
        assert_eq!(runs.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_session_fails_open() {
        let dir = TempDir::new().unwrap();
        let behavior = Fixed::new("a", HookResult::success());
        let d = dispatcher(&dir, vec![behavior.clone()], HookSettings::new());

        let payload = EventPayload::parse(r#"{"event":"PreToolUse","tool":"Read"}"#);
        let response = d.dispatch(payload, &BehaviorSelector::All).await;
        assert!(response.is_success());
        assert_eq!(behavior.calls(), 1);
    }

    #[tokio::test]
    async fn test_selector_filters_behaviors() {
        let dir = TempDir::new().unwrap();
        let a = Fixed::new("a", HookResult::success());
        let b = Fixed::new("b", HookResult::success());
        let d = dispatcher(&dir, vec![a.clone(), b.clone()], HookSettings::new());

        let response = d
            .dispatch(payload(""), &BehaviorSelector::parse("b,nonexistent"))
            .await;
        assert_eq!(response.ran, vec!["b".to_string()]);
        assert_eq!(a.calls(), 0);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_unbound_event_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let a = Fixed::new("a", HookResult::block("x"));
        let d = dispatcher(&dir, vec![a.clone()], HookSettings::new());

        let payload = EventPayload::parse(r#"{"event":"Notification"}"#);
        let response = d.dispatch(payload, &BehaviorSelector::All).await;
        assert!(response.is_success());
        assert!(response.ran.is_empty());
    }
}
