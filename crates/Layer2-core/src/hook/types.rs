//! Hook 타입 정의
//!
//! 호스트 호환 이벤트 타입과 behavior 실행 결과

use super::dispatcher::EXIT_BLOCK;
use forgehook_foundation::Error;
use serde::{Deserialize, Serialize};

// ============================================================================
// HookEventType - 이벤트 타입
// ============================================================================

/// Hook 이벤트 타입 (호스트 이름 그대로)
///
/// 알 수 없는 이름은 `Other` 로 보존한다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum HookEventType {
    /// Tool 실행 전 (블로킹 가능)
    PreToolUse,
    /// Tool 실행 후
    PostToolUse,
    /// 프롬프트 제출
    UserPromptSubmit,
    /// 알림
    Notification,
    /// 응답 종료
    Stop,
    /// 서브에이전트 종료
    SubagentStop,
    /// 세션 시작
    SessionStart,
    /// 세션 종료
    SessionEnd,
    /// 컨텍스트 압축 전
    PreCompact,
    /// 그 외
    Other(String),
}

impl HookEventType {
    pub fn parse(name: &str) -> Self {
        match name {
            "PreToolUse" => Self::PreToolUse,
            "PostToolUse" => Self::PostToolUse,
            "UserPromptSubmit" => Self::UserPromptSubmit,
            "Notification" => Self::Notification,
            "Stop" => Self::Stop,
            "SubagentStop" => Self::SubagentStop,
            "SessionStart" => Self::SessionStart,
            "SessionEnd" => Self::SessionEnd,
            "PreCompact" => Self::PreCompact,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::Notification => "Notification",
            Self::Stop => "Stop",
            Self::SubagentStop => "SubagentStop",
            Self::SessionStart => "SessionStart",
            Self::SessionEnd => "SessionEnd",
            Self::PreCompact => "PreCompact",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for HookEventType {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<HookEventType> for String {
    fn from(event: HookEventType) -> Self {
        event.as_str().to_string()
    }
}

impl std::fmt::Display for HookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ToolMatcher - Tool 이름 매칭
// ============================================================================

/// Tool 매처
///
/// - `*`: 모든 tool
/// - `Edit|Write`: 대안 중 하나
/// - `mcp__*` / `*_file`: 접두사 / 접미사
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolMatcher(String);

impl ToolMatcher {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn any() -> Self {
        Self("*".to_string())
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    /// tool 이름과 매칭되는지 확인
    ///
    /// tool 이 없는 이벤트는 `*` 만 매칭된다.
    pub fn matches(&self, tool_name: Option<&str>) -> bool {
        if self.0 == "*" {
            return true;
        }

        let Some(tool_name) = tool_name else {
            return false;
        };

        self.0
            .split('|')
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .any(|alt| Self::matches_one(alt, tool_name))
    }

    fn matches_one(pattern: &str, tool_name: &str) -> bool {
        if pattern == "*" || pattern == tool_name {
            return true;
        }

        match (pattern.strip_prefix('*'), pattern.strip_suffix('*')) {
            (Some(suffix), _) if !suffix.contains('*') => tool_name.ends_with(suffix),
            (_, Some(prefix)) if !prefix.contains('*') => tool_name.starts_with(prefix),
            _ => false,
        }
    }
}

// ============================================================================
// HookResult - 실행 결과
// ============================================================================

/// behavior 종료 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// 성공 (또는 할 일 없음)
    Success,
    /// 정책 위반으로 차단
    Block,
    /// 실행 오류
    Error,
}

/// 접근 제어 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Allow => write!(f, "allow"),
            Decision::Deny => write!(f, "deny"),
        }
    }
}

/// 구조화된 판정 (접근 제어 behavior 전용)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredDecision {
    pub decision: Decision,
    pub reason: Option<String>,
}

/// Hook 실행 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookResult {
    /// 종료 상태
    pub status: HookStatus,

    /// 접근 제어 판정
    pub decision: Option<StructuredDecision>,

    /// 출력 텍스트 (차단/오류 시 진단)
    pub text: String,

    /// 자식 프로세스를 시작조차 못한 경우 (호출 중단)
    pub fatal: bool,
}

impl HookResult {
    /// 성공 결과 생성
    pub fn success() -> Self {
        Self {
            status: HookStatus::Success,
            decision: None,
            text: String::new(),
            fatal: false,
        }
    }

    /// 메시지가 있는 성공 결과
    pub fn success_with(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::success()
        }
    }

    /// 블로킹 결과 생성
    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            status: HookStatus::Block,
            decision: None,
            text: reason.into(),
            fatal: false,
        }
    }

    /// 실행 오류 결과 생성
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: HookStatus::Error,
            decision: None,
            text: message.into(),
            fatal: false,
        }
    }

    /// 허용 판정
    pub fn allow(reason: impl Into<String>) -> Self {
        Self {
            decision: Some(StructuredDecision {
                decision: Decision::Allow,
                reason: Some(reason.into()),
            }),
            ..Self::success()
        }
    }

    /// 거부 판정
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            decision: Some(StructuredDecision {
                decision: Decision::Deny,
                reason: Some(reason.into()),
            }),
            ..Self::success()
        }
    }

    pub fn is_block(&self) -> bool {
        self.status == HookStatus::Block
    }
}

impl From<Error> for HookResult {
    fn from(err: Error) -> Self {
        let fatal = err.is_fatal();
        let mut result = match err.exit_code() {
            EXIT_BLOCK => HookResult::block(err.to_string()),
            _ => HookResult::error(err.to_string()),
        };
        result.fatal = fatal;
        result
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hook_event_type_round_trip_names() {
        assert_eq!(HookEventType::parse("PreToolUse"), HookEventType::PreToolUse);
        assert_eq!(HookEventType::SubagentStop.to_string(), "SubagentStop");

        let custom = HookEventType::parse("FileChanged");
        assert_eq!(custom, HookEventType::Other("FileChanged".to_string()));
        assert_eq!(custom.as_str(), "FileChanged");

        let parsed: HookEventType = serde_json::from_str("\"Stop\"").unwrap();
        assert_eq!(parsed, HookEventType::Stop);
    }

    #[test]
    fn test_tool_matcher() {
        let matcher = ToolMatcher::new("Edit|Write|MultiEdit");
        assert!(matcher.matches(Some("Write")));
        assert!(!matcher.matches(Some("Read")));
        assert!(!matcher.matches(None));

        assert!(ToolMatcher::any().matches(None));
        assert!(ToolMatcher::new("mcp__*").matches(Some("mcp__github__search")));
        assert!(ToolMatcher::new("*Edit").matches(Some("NotebookEdit")));
        assert!(!ToolMatcher::new("*Edit").matches(Some("Editor")));
    }

    #[test]
    fn test_result_from_error() {
        let result = HookResult::from(Error::ToolTimeout {
            tool: "tsc".to_string(),
            timeout_ms: 250,
        });
        assert_eq!(result.status, HookStatus::Block);
        assert!(result.text.contains("250ms"));
        assert!(!result.fatal);

        let result = HookResult::from(Error::spawn("eslint", "No such file or directory"));
        assert_eq!(result.status, HookStatus::Error);
        assert!(result.fatal);

        let result = HookResult::from(Error::PathEscape("../secrets".into()));
        assert_eq!(result.status, HookStatus::Block);
        assert!(result.text.contains("outside the project root"));

        let result = HookResult::from(Error::Config("bad value".to_string()));
        assert_eq!(result.status, HookStatus::Error);
    }

    #[test]
    fn test_decision_constructors() {
        let deny = HookResult::deny(".env is protected");
        assert_eq!(deny.status, HookStatus::Success);
        let decision = deny.decision.unwrap();
        assert_eq!(decision.decision, Decision::Deny);
        assert_eq!(decision.reason.as_deref(), Some(".env is protected"));
    }
}
