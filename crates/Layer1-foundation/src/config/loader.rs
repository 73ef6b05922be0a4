//! Configuration Loader
//!
//! ## 검색 우선순위
//!
//! 1. User-level: `~/.forgehook/settings.json`
//! 2. Project-level: `.forgehook/settings.json`
//! 3. Local (gitignored): `.forgehook/settings.local.json`
//!
//! 각 레벨의 설정이 이전 레벨을 오버라이드한다.
//! 읽을 수 없는 파일은 경고만 남기고 건너뛴다.

use super::settings::HookSettings;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 설정 폴더 이름
pub const CONFIG_DIR_NAME: &str = ".forgehook";

/// 세션 레코드 디렉토리 오버라이드
pub const ENV_STATE_DIR: &str = "FORGEHOOK_STATE_DIR";

/// 프로젝트 루트 오버라이드
pub const ENV_PROJECT_ROOT: &str = "FORGEHOOK_PROJECT_ROOT";

/// 호스트가 넘겨주는 프로젝트 루트
pub const ENV_HOST_PROJECT_DIR: &str = "CLAUDE_PROJECT_DIR";

// ============================================================================
// ConfigLoader
// ============================================================================

/// 설정 로더
pub struct ConfigLoader {
    /// 검색 경로
    search_paths: Vec<ConfigPath>,
}

/// 설정 파일 경로 정보
#[derive(Debug, Clone)]
struct ConfigPath {
    path: PathBuf,
    /// 높을수록 우선
    priority: u8,
    description: &'static str,
}

impl ConfigLoader {
    /// 기본 검색 경로로 생성
    pub fn new(project_root: &Path) -> Self {
        let mut paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            paths.push(ConfigPath {
                path: home.join(CONFIG_DIR_NAME).join("settings.json"),
                priority: 10,
                description: "User settings",
            });
        }

        paths.push(ConfigPath {
            path: project_root.join(CONFIG_DIR_NAME).join("settings.json"),
            priority: 20,
            description: "Project settings",
        });

        paths.push(ConfigPath {
            path: project_root.join(CONFIG_DIR_NAME).join("settings.local.json"),
            priority: 30,
            description: "Local settings",
        });

        paths.sort_by_key(|p| p.priority);

        Self { search_paths: paths }
    }

    /// 커스텀 검색 경로로 생성 (뒤에 올수록 우선)
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        let search_paths = paths
            .into_iter()
            .enumerate()
            .map(|(i, path)| ConfigPath {
                path,
                priority: i.min(u8::MAX as usize) as u8,
                description: "Custom",
            })
            .collect();

        Self { search_paths }
    }

    /// 모든 경로에서 로드하여 병합
    pub fn load_all(&self) -> HookSettings {
        let mut merged = HookSettings::new();

        for config_path in &self.search_paths {
            if !config_path.path.exists() {
                continue;
            }
            match load_settings_from_file(&config_path.path) {
                Ok(settings) => {
                    info!(
                        "Loaded {} from: {}",
                        config_path.description,
                        config_path.path.display()
                    );
                    merged.merge(settings);
                }
                Err(e) => {
                    warn!(
                        "Failed to load settings from {}: {}",
                        config_path.path.display(),
                        e
                    );
                }
            }
        }

        merged
    }

    /// 존재하는 설정 파일 목록
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.search_paths
            .iter()
            .filter(|p| p.path.exists())
            .map(|p| p.path.clone())
            .collect()
    }
}

// ============================================================================
// 환경 변수
// ============================================================================

/// 설정에 영향을 주는 환경 변수 스냅샷
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub state_dir: Option<PathBuf>,
    pub project_root: Option<PathBuf>,
    pub host_project_dir: Option<PathBuf>,
}

impl EnvOverrides {
    /// 현재 프로세스 환경에서 읽기
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var_os(key)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        Self {
            state_dir: read(ENV_STATE_DIR),
            project_root: read(ENV_PROJECT_ROOT),
            host_project_dir: read(ENV_HOST_PROJECT_DIR),
        }
    }

    /// 환경 변수를 설정에 반영 (환경 변수가 우선)
    pub fn apply(&self, settings: &mut HookSettings) {
        if let Some(dir) = &self.state_dir {
            settings.state_dir = Some(dir.clone());
        }
        if let Some(root) = &self.project_root {
            settings.project_root = Some(root.clone());
        }
    }
}

/// 프로젝트 루트 결정
///
/// 명시적 오버라이드 → 호스트 프로젝트 디렉토리 → `.git` 을 가진 가장 가까운 조상 → 작업 디렉토리
pub fn resolve_project_root(
    explicit: Option<&Path>,
    host_project_dir: Option<&Path>,
    working_dir: &Path,
) -> PathBuf {
    let absolutize = |p: &Path| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            working_dir.join(p)
        }
    };

    if let Some(root) = explicit {
        return absolutize(root);
    }
    if let Some(root) = host_project_dir {
        return absolutize(root);
    }

    let found = working_dir
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf);
    match found {
        Some(root) => {
            debug!(root = %root.display(), "Found repository root");
            root
        }
        None => working_dir.to_path_buf(),
    }
}

// ============================================================================
// 유틸리티 함수
// ============================================================================

/// 파일에서 설정 로드
pub fn load_settings_from_file(path: &Path) -> Result<HookSettings> {
    let content = std::fs::read_to_string(path)?;
    let content = strip_json_comments(&content);

    let settings: HookSettings = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Invalid settings at {}: {}", path.display(), e))
    })?;

    debug!(
        "Loaded settings from {}: {} behaviors",
        path.display(),
        settings.behaviors.len()
    );

    Ok(settings)
}

/// JSON 주석 제거 (`//` 및 `/* */`)
pub fn strip_json_comments(input: &str) -> String {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            output.push(c);
            if c == '\\' {
                if let Some(escaped) = chars.next() {
                    output.push(escaped);
                }
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                output.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        output.push(c);
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => output.push(c),
        }
    }

    output
}
