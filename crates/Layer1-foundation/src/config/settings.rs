//! Hook Settings - behavior 별 설정
//!
//! ```json
//! {
//!   "behaviors": {
//!     "lint": {
//!       "enabled": true,
//!       "disabledIn": ["subagent"],
//!       "timeoutMs": 30000,
//!       "options": { "command": "npx eslint {file}" }
//!     }
//!   },
//!   "stateDir": "/tmp/forgehook-sessions"
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 실행 하위 컨텍스트
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubContext {
    /// 메인 대화
    Main,
    /// 서브에이전트
    Subagent,
}

impl std::fmt::Display for SubContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubContext::Main => write!(f, "main"),
            SubContext::Subagent => write!(f, "subagent"),
        }
    }
}

// ============================================================================
// BehaviorSettings
// ============================================================================

/// behavior 하나의 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorSettings {
    /// false 면 영구 비활성 (세션 복원으로도 켤 수 없음)
    ///
    /// 이 계층에서 지정하지 않으면 None (병합 시 앞 계층 값 유지)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// 이 하위 컨텍스트에서는 건너뜀
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub disabled_in: Vec<SubContext>,

    /// 외부 도구 타임아웃
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// behavior 전용 옵션
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            enabled: None,
            disabled_in: Vec::new(),
            timeout_ms: None,
            options: BTreeMap::new(),
        }
    }
}

impl BehaviorSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            ..Default::default()
        }
    }

    /// 영구 활성 여부 (지정 안 됨 = 활성)
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// 하위 컨텍스트에서 비활성인지
    pub fn is_disabled_in(&self, context: SubContext) -> bool {
        self.disabled_in.contains(&context)
    }

    /// 문자열 옵션
    pub fn option_str(&self, key: &str) -> Option<&str> {
        self.options.get(key).and_then(Value::as_str)
    }

    /// 문자열 목록 옵션 (`"a,b"` 또는 `["a","b"]`)
    pub fn option_list(&self, key: &str) -> Vec<String> {
        match self.options.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// 숫자 옵션
    pub fn option_u64(&self, key: &str) -> Option<u64> {
        self.options.get(key).and_then(Value::as_u64)
    }

    /// later 가 earlier 를 오버라이드 (옵션은 키 단위)
    pub fn merge(&mut self, later: BehaviorSettings) {
        if later.enabled.is_some() {
            self.enabled = later.enabled;
        }
        if !later.disabled_in.is_empty() {
            self.disabled_in = later.disabled_in;
        }
        if later.timeout_ms.is_some() {
            self.timeout_ms = later.timeout_ms;
        }
        self.options.extend(later.options);
    }
}

// ============================================================================
// HookSettings
// ============================================================================

/// 전체 설정
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HookSettings {
    /// behavior 이름 → 설정
    #[serde(default)]
    pub behaviors: BTreeMap<String, BehaviorSettings>,

    /// 세션 레코드 디렉토리
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,

    /// 프로젝트 루트 고정
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
}

impl HookSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// behavior 설정 (없으면 기본값: 활성)
    pub fn behavior(&self, name: &str) -> BehaviorSettings {
        self.behaviors.get(name).cloned().unwrap_or_default()
    }

    /// 영구 활성 여부
    pub fn is_enabled(&self, name: &str) -> bool {
        self.behaviors
            .get(name)
            .map(BehaviorSettings::is_enabled)
            .unwrap_or(true)
    }

    pub fn with_behavior(mut self, name: impl Into<String>, settings: BehaviorSettings) -> Self {
        self.behaviors.insert(name.into(), settings);
        self
    }

    /// 다른 설정과 병합 (other 가 우선)
    pub fn merge(&mut self, other: HookSettings) {
        for (name, later) in other.behaviors {
            self.behaviors.entry(name).or_default().merge(later);
        }
        if other.state_dir.is_some() {
            self.state_dir = other.state_dir;
        }
        if other.project_root.is_some() {
            self.project_root = other.project_root;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_defaults() {
        let settings: HookSettings = serde_json::from_value(json!({
            "behaviors": {
                "lint": { "options": { "command": "eslint {file}" } },
                "checkpoint": { "enabled": false },
                "typecheck": { "disabledIn": ["subagent"], "timeoutMs": 500 }
            }
        }))
        .unwrap();

        assert!(settings.is_enabled("lint"));
        assert!(!settings.is_enabled("checkpoint"));
        assert!(settings.is_enabled("unknown"));

        let typecheck = settings.behavior("typecheck");
        assert!(typecheck.is_disabled_in(SubContext::Subagent));
        assert!(!typecheck.is_disabled_in(SubContext::Main));
        assert_eq!(typecheck.timeout_ms, Some(500));

        assert_eq!(
            settings.behavior("lint").option_str("command"),
            Some("eslint {file}")
        );
    }

    #[test]
    fn test_option_list_accepts_string_or_array() {
        let mut b = BehaviorSettings::default();
        b.options.insert("extensions".into(), json!(".ts, .tsx"));
        assert_eq!(b.option_list("extensions"), vec![".ts", ".tsx"]);

        b.options.insert("extensions".into(), json!([".rs"]));
        assert_eq!(b.option_list("extensions"), vec![".rs"]);

        assert!(b.option_list("missing").is_empty());
    }

    #[test]
    fn test_merge_per_behavior_and_option() {
        let mut base = HookSettings::new().with_behavior("lint", {
            let mut b = BehaviorSettings::default();
            b.options.insert("command".into(), json!("eslint {file}"));
            b.options.insert("extensions".into(), json!(".js"));
            b.timeout_ms = Some(1000);
            b
        });

        let mut later_lint = BehaviorSettings::default();
        later_lint.options.insert("extensions".into(), json!(".ts"));
        let later = HookSettings::new()
            .with_behavior("lint", later_lint)
            .with_behavior("checkpoint", BehaviorSettings::disabled());

        base.merge(later);

        let lint = base.behavior("lint");
        assert_eq!(lint.option_str("command"), Some("eslint {file}"));
        assert_eq!(lint.option_str("extensions"), Some(".ts"));
        assert_eq!(lint.timeout_ms, Some(1000));
        assert!(!base.is_enabled("checkpoint"));
    }

    #[test]
    fn test_later_layer_without_enabled_keeps_disable() {
        let mut base = HookSettings::new().with_behavior("checkpoint", BehaviorSettings::disabled());
        let later: HookSettings = serde_json::from_value(json!({
            "behaviors": { "checkpoint": { "options": { "label": "x" } } }
        }))
        .unwrap();

        base.merge(later);

        assert!(!base.is_enabled("checkpoint"));
        assert_eq!(base.behavior("checkpoint").option_str("label"), Some("x"));

        // 명시적으로 켜면 다시 활성
        let explicit: HookSettings = serde_json::from_value(json!({
            "behaviors": { "checkpoint": { "enabled": true } }
        }))
        .unwrap();
        base.merge(explicit);
        assert!(base.is_enabled("checkpoint"));
    }
}
