//! EventPayload - 호스트 이벤트 데이터
//!
//! 짧은 키(`event`, `tool`, `toolInput`, ...)와 호스트 원래 키
//! (`hook_event_name`, `tool_name`, `tool_input`, ...)를 모두 받는다.
//!
//! 필드는 하나씩 느슨하게 꺼낸다. 두 형태의 키가 함께 오면 앞의 키가 이기고,
//! 타입이 틀린 필드는 그 필드만 버린다.

use crate::hook::HookEventType;
use forgehook_foundation::{extract_session_id, validate_session_id, SubContext};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::{debug, warn};

/// 파일 경로를 담는 toolInput 키 (우선순위 순)
const PATH_KEYS: &[&str] = &["file_path", "path", "notebook_path", "filePath"];

// 필드별 키 (우선순위 순)
const EVENT_KEYS: &[&str] = &["event", "hook_event_name", "hookEventName"];
const TOOL_KEYS: &[&str] = &["tool", "tool_name", "toolName"];
const TOOL_INPUT_KEYS: &[&str] = &["toolInput", "tool_input"];
const TRANSCRIPT_KEYS: &[&str] = &["transcriptPath", "transcript_path"];
const TURN_ACTIVE_KEYS: &[&str] = &["turnActive", "stop_hook_active", "stopHookActive"];
const SESSION_ID_KEYS: &[&str] = &["sessionId", "session_id"];
const CWD_KEYS: &[&str] = &["cwd"];
const AGENT_ID_KEYS: &[&str] = &["agentId", "agent_id"];

/// 호스트 이벤트 페이로드
///
/// 잘못되었거나 비어 있는 입력은 빈 페이로드가 된다.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// 이벤트 이름
    pub event: Option<HookEventType>,

    /// Tool 이름
    pub tool: Option<String>,

    /// Tool 입력 (키-값 맵, 내용은 해석하지 않음)
    pub tool_input: Value,

    /// 세션 transcript 경로
    pub transcript_path: Option<String>,

    /// 이번 턴에 이미 hook 처리 중 (루프 방지)
    pub turn_active: bool,

    /// 명시적 세션 ID
    pub session_id: Option<String>,

    /// 호스트 작업 디렉토리
    pub cwd: Option<PathBuf>,

    /// 서브에이전트 ID
    pub agent_id: Option<String>,
}

impl EventPayload {
    /// 원시 입력 파싱 (실패 시 빈 페이로드)
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            debug!("Empty payload");
            return Self::default();
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self::from_map(&map),
            Ok(_) => {
                warn!("Payload is not a JSON object, using empty payload");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "Malformed payload, using empty payload");
                Self::default()
            }
        }
    }

    /// JSON 객체에서 필드별로 꺼내기
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let string = |keys: &[&str]| field(map, keys, Value::as_str).map(str::to_string);

        Self {
            event: string(EVENT_KEYS).map(HookEventType::from),
            tool: string(TOOL_KEYS),
            tool_input: field(map, TOOL_INPUT_KEYS, |v| v.as_object().map(|_| v.clone()))
                .unwrap_or(Value::Null),
            transcript_path: string(TRANSCRIPT_KEYS),
            turn_active: field(map, TURN_ACTIVE_KEYS, Value::as_bool).unwrap_or(false),
            session_id: string(SESSION_ID_KEYS),
            cwd: string(CWD_KEYS).map(PathBuf::from),
            agent_id: string(AGENT_ID_KEYS),
        }
    }

    /// 이벤트 타입 (없으면 빈 이름의 `Other`)
    pub fn event_type(&self) -> HookEventType {
        self.event
            .clone()
            .unwrap_or_else(|| HookEventType::Other(String::new()))
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool.as_deref()
    }

    /// toolInput 문자열 필드
    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.tool_input
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// toolInput 이 가리키는 파일 경로
    pub fn file_path(&self) -> Option<&str> {
        PATH_KEYS.iter().find_map(|key| self.input_str(key))
    }

    /// 세션 ID 결정
    ///
    /// transcript 경로에서 추출한 값이 우선이고, 없으면 명시적 `session_id`.
    pub fn resolve_session_id(&self) -> Option<String> {
        if let Some(id) = self.transcript_path.as_deref().and_then(extract_session_id) {
            return Some(id);
        }
        self.session_id
            .as_deref()
            .filter(|id| validate_session_id(id).is_ok())
            .map(str::to_string)
    }

    /// 실행 하위 컨텍스트
    pub fn sub_context(&self) -> SubContext {
        if self.event == Some(HookEventType::SubagentStop) || self.agent_id.is_some() {
            SubContext::Subagent
        } else {
            SubContext::Main
        }
    }
}

/// 키 목록에서 값이 있고 타입이 맞는 첫 항목
///
/// `null` 이나 타입이 틀린 값은 건너뛴다.
fn field<'a, T>(
    map: &'a Map<String, Value>,
    keys: &[&str],
    convert: impl Fn(&'a Value) -> Option<T>,
) -> Option<T> {
    for key in keys {
        match map.get(*key) {
            None | Some(Value::Null) => continue,
            Some(value) => match convert(value) {
                Some(converted) => return Some(converted),
                None => debug!(key, "Ignoring payload field with unexpected type"),
            },
        }
    }
    None
}
