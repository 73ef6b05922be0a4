//! 실행 환경 해석 - 작업 디렉토리, 프로젝트 루트, 설정, 세션 저장소

use anyhow::Context;
use forgehook_core::EventPayload;
use forgehook_foundation::{
    resolve_project_root, ConfigLoader, EnvOverrides, HookSettings, SessionStore,
};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 한 번의 호출에 필요한 환경
pub struct Environment {
    pub working_dir: PathBuf,
    pub project_root: PathBuf,
    pub settings: HookSettings,
    pub sessions: SessionStore,
}

impl Environment {
    /// 페이로드의 `cwd` > 현재 디렉토리 순으로 작업 디렉토리를 정하고 나머지를 해석
    pub fn resolve(payload: &EventPayload) -> anyhow::Result<Self> {
        let working_dir = match &payload.cwd {
            Some(cwd) if cwd.is_dir() => cwd.clone(),
            _ => std::env::current_dir().context("Cannot determine working directory")?,
        };

        let overrides = EnvOverrides::from_env();
        let discovered = resolve_project_root(
            overrides.project_root.as_deref(),
            overrides.host_project_dir.as_deref(),
            &working_dir,
        );

        let mut settings = ConfigLoader::new(&discovered).load_all();
        overrides.apply(&mut settings);

        // 설정 파일의 projectRoot 는 탐색 결과보다 우선
        let project_root = match &settings.project_root {
            Some(root) => resolve_project_root(Some(root.as_path()), None, &working_dir),
            None => discovered,
        };

        let sessions = open_sessions(settings.state_dir.as_deref(), SessionStore::global);

        debug!(
            working_dir = %working_dir.display(),
            project_root = %project_root.display(),
            state_dir = %sessions.state_dir().display(),
            "Resolved environment"
        );

        Ok(Self {
            working_dir,
            project_root,
            settings,
            sessions,
        })
    }
}

/// 세션 저장소 선택: 설정값 > 기본 위치 > 임시 디렉토리
///
/// 기본 위치를 찾지 못해도 호출은 계속된다.
fn open_sessions(
    configured: Option<&Path>,
    global: impl FnOnce() -> forgehook_foundation::Result<SessionStore>,
) -> SessionStore {
    if let Some(dir) = configured {
        return SessionStore::new(dir);
    }
    match global() {
        Ok(store) => store,
        Err(e) => {
            let fallback = fallback_state_dir();
            warn!(
                error = %e,
                state_dir = %fallback.display(),
                "Cannot locate session state directory, using temporary location"
            );
            SessionStore::new(fallback)
        }
    }
}

fn fallback_state_dir() -> PathBuf {
    std::env::temp_dir().join("forgehook").join("sessions")
}
