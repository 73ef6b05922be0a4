//! Error types for forgehook
//!
//! 모든 에러를 중앙에서 관리

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// forgehook 에러 타입
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // 입력 / 설정
    // ========================================================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // 외부 도구 실행
    // ========================================================================
    #[error("{tool} failed with exit code {code}")]
    ToolFailed { tool: String, code: i32 },

    #[error("{tool} timed out after {timeout_ms}ms")]
    ToolTimeout { tool: String, timeout_ms: u64 },

    #[error("Failed to start {program}: {message}")]
    Spawn { program: String, message: String },

    #[error("Git error: {0}")]
    Git(String),

    // ========================================================================
    // 정책 / 경로
    // ========================================================================
    #[error("Session record corrupt at {path}: {message}")]
    PolicyStoreCorrupt { path: PathBuf, message: String },

    #[error("{} resolves outside the project root", .0.display())]
    PathEscape(PathBuf),

    // ========================================================================
    // 저장소
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // 외부 에러 변환
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 호출을 중단해야 하는 에러인지 확인
    ///
    /// 자식 프로세스를 아예 시작하지 못한 경우만 치명적이다.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Spawn { .. })
    }

    /// 호스트에 전달할 종료 코드
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ToolFailed { .. } | Error::ToolTimeout { .. } | Error::PathEscape(_) => 2,
            _ => 1,
        }
    }

    /// Spawn 에러 생성 헬퍼
    pub fn spawn(program: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Spawn {
            program: program.into(),
            message: message.into(),
        }
    }

    /// 손상된 세션 레코드 에러 생성 헬퍼
    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::PolicyStoreCorrupt {
            path: path.into(),
            message: message.into(),
        }
    }
}
