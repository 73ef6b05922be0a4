//! Path Guard - 민감 경로 접근 판정
//!
//! 판정 순서:
//! 1. `..` 로 프로젝트 루트를 벗어나는 경로는 규칙과 무관하게 항상 보호
//! 2. 심볼릭 링크는 링크 경로와 실제 대상 모두 검사 (하나라도 보호면 보호)
//! 3. 긍정 규칙이 하나 이상 매칭되고, 부정 규칙이 하나도 매칭되지 않으면 보호
//!
//! 매칭은 gitignore 문법을 따른다 (`ignore` crate).

use super::rules::{IgnoreRule, IgnoreRuleSet};
use crate::error::{Error, Result};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

// ============================================================================
// GuardVerdict
// ============================================================================

/// 판정 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardVerdict {
    /// 보호 대상 여부
    pub protected: bool,
    /// 사람이 읽을 수 있는 사유
    pub reason: String,
}

impl GuardVerdict {
    fn protected(reason: impl Into<String>) -> Self {
        Self {
            protected: true,
            reason: reason.into(),
        }
    }

    fn accessible(reason: impl Into<String>) -> Self {
        Self {
            protected: false,
            reason: reason.into(),
        }
    }
}

/// 규칙 매칭 결과 (한 경로에 대해)
enum RuleMatch {
    /// 매칭 없음
    None,
    /// 긍정 규칙 매칭, 부정 규칙 없음
    Protected { rule: String, source: String },
    /// 긍정 규칙 매칭 후 부정 규칙으로 허용
    Excepted { rule: String, source: String },
}

// ============================================================================
// PathGuard
// ============================================================================

/// 민감 경로 가드
pub struct PathGuard {
    /// 선언된 프로젝트 루트
    root: PathBuf,
    /// 심볼릭 링크를 푼 프로젝트 루트
    canonical_root: PathBuf,
    /// 긍정 규칙
    positive: Gitignore,
    /// 부정 규칙 (`!` 제거)
    negated: Gitignore,
}

impl PathGuard {
    /// 규칙 집합으로 가드 생성
    pub fn new(project_root: impl Into<PathBuf>, rules: &IgnoreRuleSet) -> Self {
        let root = lexical_normalize(&project_root.into());
        let canonical_root = std::fs::canonicalize(&root).unwrap_or_else(|_| root.clone());

        let positive = build_matcher(&root, rules.positive());
        let negated = build_matcher(&root, rules.negated());

        Self {
            root,
            canonical_root,
            positive,
            negated,
        }
    }

    /// 프로젝트 루트의 ignore 파일들로 가드 생성
    pub fn load(project_root: impl Into<PathBuf>) -> Self {
        let root = project_root.into();
        let rules = IgnoreRuleSet::load(&root);
        Self::new(root, &rules)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 루트 기준 절대 경로로 정규화
    ///
    /// `..` 로 루트를 벗어나면 `Error::PathEscape`.
    pub fn contain(&self, candidate: impl AsRef<Path>) -> Result<PathBuf> {
        let candidate = candidate.as_ref();
        let absolute = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        };
        let normalized = lexical_normalize(&absolute);

        let traverses = candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if traverses && !self.is_inside_root(&normalized) {
            return Err(Error::PathEscape(candidate.to_path_buf()));
        }
        Ok(normalized)
    }

    /// 경로 판정
    pub fn check(&self, candidate: impl AsRef<Path>) -> GuardVerdict {
        let candidate = candidate.as_ref();

        // 1. 상위 디렉토리 탈출
        let link_path = match self.contain(candidate) {
            Ok(path) => path,
            Err(e) => {
                debug!(path = %candidate.display(), "Path escapes project root");
                return GuardVerdict::protected(format!("{} {}", e, self.root.display()));
            }
        };

        // 2. 링크 경로와 실제 대상
        let link_match = self.match_rules(&link_path);
        if let RuleMatch::Protected { rule, source } = &link_match {
            return GuardVerdict::protected(format!(
                "{} is protected by rule '{}' from {}",
                candidate.display(),
                rule,
                source
            ));
        }

        let resolved = resolve_symlinks(&link_path);
        if resolved != link_path {
            let target_match = self.match_rules(&resolved);
            if let RuleMatch::Protected { rule, source } = target_match {
                return GuardVerdict::protected(format!(
                    "{} links to {} which is protected by rule '{}' from {}",
                    candidate.display(),
                    resolved.display(),
                    rule,
                    source
                ));
            }
        }

        match link_match {
            RuleMatch::Excepted { rule, source } => GuardVerdict::accessible(format!(
                "{} is allowed by exception '!{}' from {}",
                candidate.display(),
                rule,
                source
            )),
            _ => GuardVerdict::accessible(format!(
                "{} matches no protection rule",
                candidate.display()
            )),
        }
    }

    /// 보호 대상인지만 확인
    pub fn is_protected(&self, candidate: impl AsRef<Path>) -> bool {
        self.check(candidate).protected
    }

    fn is_inside_root(&self, path: &Path) -> bool {
        path.starts_with(&self.root) || path.starts_with(&self.canonical_root)
    }

    /// 규칙 매칭용 상대 경로
    ///
    /// 루트 밖의 절대 경로는 앵커 없는 규칙만 매칭되도록 루트 성분을 떼어낸다.
    fn rule_path(&self, path: &Path) -> PathBuf {
        let relative = path
            .strip_prefix(&self.root)
            .or_else(|_| path.strip_prefix(&self.canonical_root))
            .unwrap_or(path);

        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect()
    }

    fn match_rules(&self, path: &Path) -> RuleMatch {
        let relative = self.rule_path(path);
        if relative.as_os_str().is_empty() {
            return RuleMatch::None;
        }
        let is_dir = path.is_dir();

        let positive = self.positive.matched_path_or_any_parents(&relative, is_dir);
        let Some(glob) = positive.inner().filter(|_| positive.is_ignore()) else {
            return RuleMatch::None;
        };
        let rule = glob.original().to_string();
        let source = describe_source(glob.from());

        // 부정 규칙은 항상 긍정 규칙 다음에 적용
        let negated = self.negated.matched_path_or_any_parents(&relative, is_dir);
        if let Some(exception) = negated.inner().filter(|_| negated.is_ignore()) {
            return RuleMatch::Excepted {
                rule: exception.original().to_string(),
                source: describe_source(exception.from()),
            };
        }

        RuleMatch::Protected { rule, source }
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn build_matcher<'a>(root: &Path, rules: impl Iterator<Item = &'a IgnoreRule>) -> Gitignore {
    let mut builder = GitignoreBuilder::new(root);

    for rule in rules {
        // `!`/`#` 로 시작하는 리터럴은 다시 이스케이프
        let line = if rule.pattern.starts_with('!') || rule.pattern.starts_with('#') {
            format!("\\{}", rule.pattern)
        } else {
            rule.pattern.clone()
        };
        if let Err(e) = builder.add_line(rule.source.path().map(Path::to_path_buf), &line) {
            warn!(pattern = %rule.pattern, source = %rule.source, error = %e, "Skipping invalid rule");
        }
    }

    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to compile ignore rules");
        Gitignore::empty()
    })
}

fn describe_source(from: Option<&Path>) -> String {
    match from {
        Some(path) => path.display().to_string(),
        None => "built-in defaults".to_string(),
    }
}

/// 파일시스템 접근 없이 `.` / `..` 정리
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// 심볼릭 링크 해석
///
/// 아직 없는 파일은 존재하는 가장 가까운 조상을 해석하고 나머지를 붙인다.
fn resolve_symlinks(path: &Path) -> PathBuf {
    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }

    let mut missing = Vec::new();
    let mut current = path.to_path_buf();
    while let Some(name) = current.file_name().map(|n| n.to_os_string()) {
        missing.push(name);
        if !current.pop() {
            break;
        }
        if let Ok(mut resolved) = std::fs::canonicalize(&current) {
            for part in missing.iter().rev() {
                resolved.push(part);
            }
            return resolved;
        }
    }

    path.to_path_buf()
}
