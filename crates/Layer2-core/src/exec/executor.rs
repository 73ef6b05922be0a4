//! Process Executor - 외부 프로그램 실행
//!
//! Features:
//! - 인자 벡터로 직접 실행 (셸 문자열 보간 없음)
//! - stdout/stderr 동시 수집
//! - 타임아웃: SIGTERM → 유예 시간 → SIGKILL (프로세스 그룹 단위)
//! - CancellationToken 으로 명시적 취소 (시그널 종료로 보고)

use super::command::{ExecOutcome, ExecSpec, ExitKind};
use forgehook_foundation::{Error, Result};
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// 프로세스 종료 후 파이프 수집을 기다리는 최대 시간
const PIPE_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

#[cfg(unix)]
const SIGTERM: i32 = libc::SIGTERM;
#[cfg(not(unix))]
const SIGTERM: i32 = 15;

/// 대기 종료 사유
enum Stop {
    Exited(ExitStatus),
    TimedOut,
    Cancelled,
}

/// Process Executor
///
/// 상태 없음. 취소 토큰만 공유한다.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    cancel: CancellationToken,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// 외부 취소 토큰 연결
    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// 실행
    ///
    /// 프로세스를 시작하지 못하면 `Error::Spawn`. 그 외에는 항상 `ExecOutcome`.
    pub async fn run(&self, spec: &ExecSpec) -> Result<ExecOutcome> {
        let mut cmd = Command::new(spec.program());
        cmd.args(spec.get_args())
            .env_clear()
            .envs(spec.get_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = spec.working_dir() {
            cmd.current_dir(dir);
        }
        #[cfg(unix)]
        cmd.process_group(0);

        debug!(command = %spec.display(), timeout = ?spec.get_timeout(), "Spawning process");

        let start = Instant::now();
        let mut child = cmd
            .spawn()
            .map_err(|e| Error::spawn(spec.program(), e.to_string()))?;

        let stdout_task = collect(child.stdout.take());
        let stderr_task = collect(child.stderr.take());

        let deadline = async {
            match spec.get_timeout() {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        let stop = tokio::select! {
            status = child.wait() => Stop::Exited(status?),
            _ = deadline => Stop::TimedOut,
            _ = self.cancel.cancelled() => Stop::Cancelled,
        };

        let exit = match stop {
            Stop::Exited(status) => exit_kind(status),
            Stop::TimedOut => {
                warn!(
                    command = %spec.display(),
                    "Process timed out after {:?}, terminating",
                    spec.get_timeout().unwrap_or_default()
                );
                terminate(&mut child, spec.get_grace_period()).await;
                ExitKind::TimedOut
            }
            Stop::Cancelled => {
                debug!(command = %spec.display(), "Process cancelled, terminating");
                let signal = terminate(&mut child, spec.get_grace_period())
                    .await
                    .and_then(signal_of)
                    .unwrap_or(SIGTERM);
                ExitKind::Signaled(signal)
            }
        };

        let stdout = drain(stdout_task).await;
        let stderr = drain(stderr_task).await;
        let duration = start.elapsed();

        debug!(command = %spec.display(), exit = ?exit, ?duration, "Process finished");

        Ok(ExecOutcome {
            stdout,
            stderr,
            exit,
            duration,
        })
    }
}

// ============================================================================
// 종료 처리
// ============================================================================

/// SIGTERM 후 유예 시간 안에 끝나지 않으면 SIGKILL
async fn terminate(child: &mut Child, grace: Duration) -> Option<ExitStatus> {
    signal_group(child, SIGTERM);

    if let Ok(Ok(status)) = tokio::time::timeout(grace, child.wait()).await {
        return Some(status);
    }

    debug!("Grace period expired, killing process");
    #[cfg(unix)]
    signal_group(child, libc::SIGKILL);
    let _ = child.start_kill();
    child.wait().await.ok()
}

/// 프로세스 그룹 전체에 시그널 전송
#[cfg(unix)]
fn signal_group(child: &Child, signal: i32) {
    if let Some(pid) = child.id() {
        // process_group(0) 으로 시작했으므로 pgid == pid
        let rc = unsafe { libc::kill(-(pid as i32), signal) };
        if rc != 0 {
            debug!(pid, signal, "Failed to signal process group");
        }
    }
}

#[cfg(not(unix))]
fn signal_group(_child: &Child, _signal: i32) {}

fn exit_kind(status: ExitStatus) -> ExitKind {
    if let Some(code) = status.code() {
        return ExitKind::Exited(code);
    }
    match signal_of(status) {
        Some(signal) => ExitKind::Signaled(signal),
        None => ExitKind::Exited(-1),
    }
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: ExitStatus) -> Option<i32> {
    None
}

// ============================================================================
// 파이프 수집
// ============================================================================

fn collect<R>(pipe: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return String::new();
        };
        let mut buf = Vec::new();
        if let Err(e) = pipe.read_to_end(&mut buf).await {
            debug!(error = %e, "Pipe read ended with error");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// 손자 프로세스가 파이프를 잡고 있어도 무한 대기하지 않음
async fn drain(mut task: JoinHandle<String>) -> String {
    match tokio::time::timeout(PIPE_DRAIN_TIMEOUT, &mut task).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            warn!(error = %e, "Output collector failed");
            String::new()
        }
        Err(_) => {
            task.abort();
            warn!("Output pipe still open after process exit, discarding");
            String::new()
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_arguments_pass_through_unaltered() {
        let tricky = ["a b", "it's", "$(echo pwned)", "; ls", "\"quoted\""];
        let spec = ExecSpec::new("printf").arg("%s\\n").args(tricky);

        let outcome = ProcessExecutor::new().run(&spec).await.unwrap();
        assert!(outcome.success());
        let lines: Vec<&str> = outcome.stdout.lines().collect();
        assert_eq!(lines, tricky);
    }

    #[tokio::test]
    async fn test_shell_mode_escapes_arguments() {
        let spec = ExecSpec::shell("printf '%s\\n'", ["it's", "$HOME"]);

        let outcome = ProcessExecutor::new().run(&spec).await.unwrap();
        assert_eq!(outcome.stdout, "it's\n$HOME\n");
    }

    #[tokio::test]
    async fn test_no_ambient_environment() {
        std::env::set_var("FORGEHOOK_EXEC_TEST_LEAK", "leaked");
        let spec = ExecSpec::script("printf '%s' \"${FORGEHOOK_EXEC_TEST_LEAK:-clean}\"")
            .env("EXPLICIT", "yes");

        let outcome = ProcessExecutor::new().run(&spec).await.unwrap();
        assert_eq!(outcome.stdout, "clean");
    }

    #[tokio::test]
    async fn test_captures_stderr_and_exit_code() {
        let spec = ExecSpec::script("echo boom >&2; exit 3");

        let outcome = ProcessExecutor::new().run(&spec).await.unwrap();
        assert_eq!(outcome.exit, ExitKind::Exited(3));
        assert_eq!(outcome.stderr.trim(), "boom");
        assert!(!outcome.timed_out());
    }

    #[tokio::test]
    async fn test_timeout_is_distinct_from_failure() {
        let hung = ExecSpec::new("sleep").arg("5").timeout_ms(200);
        let outcome = ProcessExecutor::new().run(&hung).await.unwrap();
        assert!(outcome.timed_out());
        assert_eq!(outcome.status_code(), None);
        assert!(outcome.duration < Duration::from_secs(3));

        let failed = ExecSpec::script("exit 1").timeout_ms(5_000);
        let outcome = ProcessExecutor::new().run(&failed).await.unwrap();
        assert!(!outcome.timed_out());
        assert_eq!(outcome.status_code(), Some(1));
    }

    #[tokio::test]
    async fn test_escalates_to_kill_when_term_ignored() {
        let stubborn = ExecSpec::script("trap '' TERM; sleep 5")
            .timeout_ms(100)
            .grace_period(Duration::from_millis(200));

        let outcome = ProcessExecutor::new().run(&stubborn).await.unwrap();
        assert!(outcome.timed_out());
        assert!(outcome.duration < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_cancellation_reported_as_signal() {
        let token = CancellationToken::new();
        let executor = ProcessExecutor::with_cancellation(token.clone());
        let spec = ExecSpec::new("sleep").arg("5").timeout_ms(10_000);

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            token.cancel();
        });

        let outcome = executor.run(&spec).await.unwrap();
        canceller.await.unwrap();

        assert!(!outcome.timed_out());
        assert_eq!(outcome.signal(), Some(libc::SIGTERM));
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let spec = ExecSpec::new("forgehook-definitely-missing-binary");
        let err = ProcessExecutor::new().run(&spec).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let spec = ExecSpec::new("pwd").current_dir(dir.path());

        let outcome = ProcessExecutor::new().run(&spec).await.unwrap();
        let reported = std::fs::canonicalize(outcome.stdout.trim()).unwrap();
        assert_eq!(reported, std::fs::canonicalize(dir.path()).unwrap());
    }
}
