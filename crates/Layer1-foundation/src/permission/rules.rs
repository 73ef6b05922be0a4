//! Ignore Rules - 민감 경로 규칙 병합
//!
//! 고정된 순서의 ignore 파일들을 읽어 규칙을 이어 붙인다.
//! - 파일 순서대로 연결
//! - 완전히 같은 규칙은 처음 나온 것만 유지
//! - 규칙 파일이 하나도 없을 때만 내장 기본값 사용

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 인식하는 ignore 파일 (우선순위 순)
pub const IGNORE_FILE_NAMES: &[&str] = &[
    ".forgehookignore",
    ".claudeignore",
    ".aiignore",
    ".cursorignore",
];

/// 규칙 파일이 없을 때 쓰는 내장 기본 규칙
pub const DEFAULT_RULES: &[&str] = &[
    // 환경 변수 / 시크릿
    ".env",
    ".env.*",
    "!.env.example",
    "*.secret",
    "secrets.*",
    // 개인 키
    "*.pem",
    "*.key",
    "*.p12",
    "id_rsa*",
    "id_dsa*",
    "id_ecdsa*",
    "id_ed25519*",
    // 클라우드 자격 증명
    ".aws/",
    ".azure/",
    ".config/gcloud/",
    "credentials.json",
    ".npmrc",
    ".pypirc",
    ".netrc",
    // SSH / GPG
    ".ssh/",
    ".gnupg/",
];

// ============================================================================
// IgnoreRule
// ============================================================================

/// 규칙 출처
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleSource {
    /// ignore 파일
    File(PathBuf),
    /// 내장 기본값
    BuiltIn,
}

impl RuleSource {
    /// 출처 파일 경로 (내장 규칙은 None)
    pub fn path(&self) -> Option<&Path> {
        match self {
            RuleSource::File(path) => Some(path),
            RuleSource::BuiltIn => None,
        }
    }
}

impl std::fmt::Display for RuleSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleSource::File(path) => write!(f, "{}", path.display()),
            RuleSource::BuiltIn => write!(f, "built-in defaults"),
        }
    }
}

/// 규칙 하나
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// `!` 를 뗀 glob 패턴
    pub pattern: String,
    /// 부정 규칙 여부 (`!pattern`)
    pub negated: bool,
    /// 출처
    pub source: RuleSource,
}

impl IgnoreRule {
    /// ignore 파일 한 줄 파싱
    ///
    /// 빈 줄과 `#` 주석은 None. `\#`, `\!` 는 리터럴로 취급.
    pub fn parse(line: &str, source: RuleSource) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let (negated, pattern) = if let Some(rest) = line.strip_prefix('!') {
            (true, rest)
        } else if let Some(rest) = line.strip_prefix('\\') {
            // \! 또는 \# 로 시작하는 리터럴 패턴
            if rest.starts_with('!') || rest.starts_with('#') {
                (false, rest)
            } else {
                (false, line)
            }
        } else {
            (false, line)
        };

        if pattern.is_empty() {
            return None;
        }

        Some(Self {
            pattern: pattern.to_string(),
            negated,
            source,
        })
    }

    /// 원래 형태 (`!` 포함)
    pub fn display_pattern(&self) -> String {
        if self.negated {
            format!("!{}", self.pattern)
        } else {
            self.pattern.clone()
        }
    }
}

// ============================================================================
// IgnoreRuleSet
// ============================================================================

/// 병합된 규칙 집합 (호출마다 새로 만들고 저장하지 않음)
#[derive(Debug, Clone, Default)]
pub struct IgnoreRuleSet {
    rules: Vec<IgnoreRule>,
    sources: Vec<PathBuf>,
    seen: HashSet<(bool, String)>,
}

impl IgnoreRuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 프로젝트 루트에서 규칙 파일들을 읽어 병합
    pub fn load(project_root: &Path) -> Self {
        let mut set = Self::new();

        for name in IGNORE_FILE_NAMES {
            let path = project_root.join(name);
            if !path.is_file() {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    debug!(path = %path.display(), "Loaded ignore rules");
                    set.add_source(RuleSource::File(path), &content);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to read ignore file");
                }
            }
        }

        if set.sources.is_empty() {
            debug!("No ignore files found, using built-in defaults");
            return Self::builtin();
        }

        set
    }

    /// 내장 기본 규칙
    pub fn builtin() -> Self {
        let mut set = Self::new();
        for line in DEFAULT_RULES {
            set.push(IgnoreRule::parse(line, RuleSource::BuiltIn));
        }
        set
    }

    /// 출처 하나의 내용을 뒤에 이어 붙임
    pub fn add_source(&mut self, source: RuleSource, content: &str) {
        if let RuleSource::File(path) = &source {
            self.sources.push(path.clone());
        }
        for line in content.lines() {
            self.push(IgnoreRule::parse(line, source.clone()));
        }
    }

    fn push(&mut self, rule: Option<IgnoreRule>) {
        let Some(rule) = rule else {
            return;
        };
        // 완전히 같은 규칙은 처음 것만 유지
        if self.seen.insert((rule.negated, rule.pattern.clone())) {
            self.rules.push(rule);
        }
    }

    /// 전체 규칙 (입력 순서)
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// 긍정 규칙
    pub fn positive(&self) -> impl Iterator<Item = &IgnoreRule> {
        self.rules.iter().filter(|r| !r.negated)
    }

    /// 부정 규칙
    pub fn negated(&self) -> impl Iterator<Item = &IgnoreRule> {
        self.rules.iter().filter(|r| r.negated)
    }

    /// 읽어 들인 규칙 파일들
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// 내장 기본값을 쓰고 있는지
    pub fn is_builtin(&self) -> bool {
        self.sources.is_empty() && !self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_line() {
        let rule = IgnoreRule::parse("secrets/", RuleSource::BuiltIn).unwrap();
        assert_eq!(rule.pattern, "secrets/");
        assert!(!rule.negated);

        let rule = IgnoreRule::parse("!secrets/readme.md  ", RuleSource::BuiltIn).unwrap();
        assert_eq!(rule.pattern, "secrets/readme.md");
        assert!(rule.negated);
        assert_eq!(rule.display_pattern(), "!secrets/readme.md");

        assert!(IgnoreRule::parse("# comment", RuleSource::BuiltIn).is_none());
        assert!(IgnoreRule::parse("   ", RuleSource::BuiltIn).is_none());
        assert!(IgnoreRule::parse("!", RuleSource::BuiltIn).is_none());

        let literal = IgnoreRule::parse("\\!important", RuleSource::BuiltIn).unwrap();
        assert_eq!(literal.pattern, "!important");
        assert!(!literal.negated);
    }

    #[test]
    fn test_builtin_fallback_when_no_files() {
        let dir = TempDir::new().unwrap();
        let set = IgnoreRuleSet::load(dir.path());

        assert!(set.is_builtin());
        assert!(set.positive().any(|r| r.pattern == ".env"));
        assert!(set.sources().is_empty());
    }

    #[test]
    fn test_merge_in_file_order_with_dedup() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".claudeignore"), "b.txt\na.txt\n").unwrap();
        std::fs::write(
            dir.path().join(".forgehookignore"),
            "a.txt\n# note\n!a.txt\n",
        )
        .unwrap();

        let set = IgnoreRuleSet::load(dir.path());
        let patterns: Vec<String> = set.rules().iter().map(|r| r.display_pattern()).collect();

        // .forgehookignore 가 먼저, 중복된 a.txt 는 첫 번째만 유지
        assert_eq!(patterns, vec!["a.txt", "!a.txt", "b.txt"]);
        assert_eq!(set.sources().len(), 2);
        assert!(!set.is_builtin());

        let a = &set.rules()[0];
        assert_eq!(
            a.source,
            RuleSource::File(dir.path().join(".forgehookignore"))
        );
    }

    #[test]
    fn test_empty_rule_file_disables_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(".aiignore"), "# nothing here\n").unwrap();

        let set = IgnoreRuleSet::load(dir.path());
        assert!(set.is_empty());
        assert!(!set.is_builtin());
    }
}
