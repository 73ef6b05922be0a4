//! Payload Reader - 무한 대기 없는 입력 읽기
//!
//! - 입력이 터미널이면 즉시 빈 문자열 반환
//! - 그 외에는 EOF 또는 유휴 타임아웃(청크마다 리셋)까지 누적
//! - 읽기 오류는 빈 문자열로 처리

use super::EventPayload;
use std::io::IsTerminal;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, warn};

/// 기본 유휴 타임아웃
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(100);

const CHUNK_SIZE: usize = 8 * 1024;

/// Payload Reader
#[derive(Debug, Clone)]
pub struct PayloadReader {
    idle_timeout: Duration,
}

impl Default for PayloadReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadReader {
    pub fn new() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// 표준 입력에서 페이로드 읽기
    pub async fn read_stdin(&self) -> EventPayload {
        let interactive = std::io::stdin().is_terminal();
        let raw = self.read_input(tokio::io::stdin(), interactive).await;
        EventPayload::parse(&raw)
    }

    /// 입력 읽기
    ///
    /// `interactive` 이면 읽지 않고 바로 반환한다.
    pub async fn read_input<R>(&self, reader: R, interactive: bool) -> String
    where
        R: AsyncRead + Unpin,
    {
        if interactive {
            debug!("Interactive input, skipping payload read");
            return String::new();
        }
        self.read_from(reader).await
    }

    /// EOF 또는 유휴 타임아웃까지 읽기
    pub async fn read_from<R>(&self, mut reader: R) -> String
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = Vec::new();
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            match tokio::time::timeout(self.idle_timeout, reader.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => buffer.extend_from_slice(&chunk[..n]),
                Ok(Err(e)) => {
                    warn!(error = %e, "Failed to read payload");
                    return String::new();
                }
                Err(_) => {
                    debug!(
                        bytes = buffer.len(),
                        "Payload idle timeout after {:?}", self.idle_timeout
                    );
                    break;
                }
            }
        }

        String::from_utf8_lossy(&buffer).into_owned()
    }
}
