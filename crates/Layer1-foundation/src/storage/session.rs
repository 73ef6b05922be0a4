//! Session Policy Store - 세션 단위 Hook 억제 상태
//!
//! 세션 ID 마다 JSON 레코드 하나를 `<state_dir>/<session_id>.json` 에 저장한다.
//! 레코드는 첫 억제 시 생성되고, enable/disable 마다 갱신되며, 자동 삭제되지 않는다.
//!
//! 손상되었거나 읽을 수 없는 레코드는 "억제 없음" 으로 취급한다.

use crate::storage::JsonStore;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info, warn};

// ============================================================================
// SessionRecord
// ============================================================================

/// 세션 하나의 억제 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// 세션 ID
    pub session_id: String,

    /// 이 세션에서만 억제된 behavior 이름들 (중복 없음)
    #[serde(default)]
    pub suppressed: BTreeSet<String>,

    /// 마지막 갱신 시각
    pub last_updated: DateTime<Utc>,

    /// 레코드를 만든 작업 디렉토리
    pub origin_dir: PathBuf,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, origin_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_id: session_id.into(),
            suppressed: BTreeSet::new(),
            last_updated: Utc::now(),
            origin_dir: origin_dir.into(),
        }
    }
}

/// suppress / restore 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyChange {
    /// 새로 억제됨
    Suppressed,
    /// 이미 억제된 상태
    AlreadySuppressed,
    /// 억제 해제됨
    Restored,
    /// 이미 활성 상태
    AlreadyActive,
}

impl PolicyChange {
    /// 상태가 실제로 바뀌었는지
    pub fn changed(&self) -> bool {
        matches!(self, PolicyChange::Suppressed | PolicyChange::Restored)
    }
}

impl std::fmt::Display for PolicyChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suppressed => write!(f, "suppressed"),
            Self::AlreadySuppressed => write!(f, "already suppressed"),
            Self::Restored => write!(f, "restored"),
            Self::AlreadyActive => write!(f, "already active"),
        }
    }
}

// ============================================================================
// Session ID
// ============================================================================

static SESSION_ID_RE: OnceLock<Option<Regex>> = OnceLock::new();

fn session_id_re() -> Option<&'static Regex> {
    SESSION_ID_RE
        .get_or_init(|| {
            Regex::new(
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
            )
            .ok()
        })
        .as_ref()
}

/// 호스트가 넘겨준 transcript 경로에서 세션 ID 추출
///
/// 경로의 마지막 UUID 를 세션 ID 로 본다 (`.../<uuid>.jsonl`).
pub fn extract_session_id(transcript_path: &str) -> Option<String> {
    session_id_re()?
        .find_iter(transcript_path)
        .last()
        .map(|m| m.as_str().to_ascii_lowercase())
}

/// 명시적으로 주어진 세션 ID 검증 (파일명으로 안전한지)
pub fn validate_session_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= 128
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "Invalid session id: {:?}",
            session_id
        )))
    }
}

// ============================================================================
// SessionStore
// ============================================================================

/// 세션 정책 저장소
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: JsonStore,
}

impl SessionStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: JsonStore::new(state_dir),
        }
    }

    /// 기본 위치 (~/.forgehook/sessions)
    pub fn global() -> Result<Self> {
        let base = JsonStore::global()?;
        Ok(Self::new(base.base_dir().join("sessions")))
    }

    pub fn state_dir(&self) -> &Path {
        self.store.base_dir()
    }

    fn filename(session_id: &str) -> String {
        format!("{}.json", session_id)
    }

    /// 레코드 로드 (없거나 손상되면 None)
    pub fn record(&self, session_id: &str) -> Option<SessionRecord> {
        if validate_session_id(session_id).is_err() {
            return None;
        }
        match self.store.load_optional::<SessionRecord>(&Self::filename(session_id)) {
            Ok(record) => record,
            Err(e) => {
                warn!(session_id, error = %e, "Ignoring unreadable session record");
                None
            }
        }
    }

    /// 억제된 behavior 목록
    pub fn suppressed(&self, session_id: &str) -> BTreeSet<String> {
        self.record(session_id)
            .map(|r| r.suppressed)
            .unwrap_or_default()
    }

    /// behavior 가 이 세션에서 억제되었는지
    pub fn is_suppressed(&self, session_id: &str, behavior: &str) -> bool {
        self.record(session_id)
            .map(|r| r.suppressed.contains(behavior))
            .unwrap_or(false)
    }

    /// 세션에서 behavior 억제
    pub fn suppress(
        &self,
        session_id: &str,
        behavior: &str,
        origin_dir: &Path,
    ) -> Result<PolicyChange> {
        validate_session_id(session_id)?;

        let mut record = self
            .record(session_id)
            .unwrap_or_else(|| SessionRecord::new(session_id, origin_dir));

        if !record.suppressed.insert(behavior.to_string()) {
            debug!(session_id, behavior, "Behavior already suppressed");
            return Ok(PolicyChange::AlreadySuppressed);
        }

        record.last_updated = Utc::now();
        self.store.save(&Self::filename(session_id), &record)?;
        info!(session_id, behavior, "Suppressed behavior for session");
        Ok(PolicyChange::Suppressed)
    }

    /// 세션에서 behavior 억제 해제
    pub fn restore(&self, session_id: &str, behavior: &str) -> Result<PolicyChange> {
        validate_session_id(session_id)?;

        let Some(mut record) = self.record(session_id) else {
            return Ok(PolicyChange::AlreadyActive);
        };

        if !record.suppressed.remove(behavior) {
            debug!(session_id, behavior, "Behavior already active");
            return Ok(PolicyChange::AlreadyActive);
        }

        record.last_updated = Utc::now();
        self.store.save(&Self::filename(session_id), &record)?;
        info!(session_id, behavior, "Restored behavior for session");
        Ok(PolicyChange::Restored)
    }
}
