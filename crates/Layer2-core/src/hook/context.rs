//! HookInvocationContext - 호출 하나의 실행 컨텍스트

use crate::exec::ProcessExecutor;
use crate::payload::EventPayload;
use forgehook_foundation::{BehaviorSettings, SubContext};
use std::path::{Path, PathBuf};

/// behavior 에 넘겨주는 실행 컨텍스트
///
/// Dispatcher 가 behavior 마다 만들어 넘긴다.
pub struct HookInvocationContext {
    /// 이벤트 페이로드
    pub payload: EventPayload,

    /// 작업 디렉토리
    pub working_dir: PathBuf,

    /// 프로젝트 루트
    pub project_root: PathBuf,

    /// 이 behavior 의 설정
    pub settings: BehaviorSettings,

    /// 세션 ID (추출 실패 시 None)
    pub session_id: Option<String>,

    /// 하위 컨텍스트
    pub sub_context: SubContext,

    /// 외부 프로그램 실행기
    pub executor: ProcessExecutor,
}

impl HookInvocationContext {
    /// 새 컨텍스트 생성
    pub fn new(payload: EventPayload, project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let session_id = payload.resolve_session_id();
        let sub_context = payload.sub_context();
        Self {
            payload,
            working_dir: project_root.clone(),
            project_root,
            settings: BehaviorSettings::default(),
            session_id,
            sub_context,
            executor: ProcessExecutor::new(),
        }
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_settings(mut self, settings: BehaviorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_executor(mut self, executor: ProcessExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// 페이로드가 가리키는 파일 (상대 경로는 작업 디렉토리 기준)
    pub fn target_file(&self) -> Option<PathBuf> {
        let path = Path::new(self.payload.file_path()?);
        Some(if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.working_dir.join(path)
        })
    }

    /// behavior 타임아웃 (설정 > 기본값)
    pub fn timeout_ms(&self, default_ms: u64) -> u64 {
        self.settings
            .option_u64("timeout_ms")
            .or(self.settings.timeout_ms)
            .unwrap_or(default_ms)
    }
}
