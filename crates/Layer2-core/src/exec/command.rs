//! ExecSpec / ExecOutcome

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 자식 프로세스에 넘겨주는 환경 변수 (나머지는 상속하지 않음)
pub const PASSTHROUGH_ENV: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LOGNAME",
    "LANG",
    "LC_ALL",
    "TMPDIR",
    "SYSTEMROOT",
];

/// 기본 유예 시간 (SIGTERM → SIGKILL)
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(1);

// ============================================================================
// ExecSpec
// ============================================================================

/// 실행 명세 (생성 후 변경 불가, 빌더는 값을 소비한다)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSpec {
    program: String,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: BTreeMap<String, String>,
    timeout: Option<Duration>,
    grace_period: Duration,
}

impl ExecSpec {
    /// 인자 벡터로 직접 실행 (셸 없음)
    pub fn new(program: impl Into<String>) -> Self {
        let env = PASSTHROUGH_ENV
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|v| (key.to_string(), v)))
            .collect();

        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
            env,
            timeout: None,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// 셸 의미론이 필요한 경우 (`sh -c`)
    ///
    /// `command` 는 그대로 쓰이고, 각 인자는 작은따옴표로 감싸
    /// 셸이 해석하지 않도록 한다 (`'` 는 `'\''` 로 바꾼다).
    pub fn shell<I, S>(command: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut script = command.to_string();
        for arg in args {
            script.push(' ');
            script.push_str(&quote_arg(arg.as_ref()));
        }
        Self::new("sh").arg("-c").arg(script)
    }

    /// 인자 없는 셸 스크립트
    pub fn script(command: &str) -> Self {
        Self::shell(command, std::iter::empty::<&str>())
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// 전달 환경 변수까지 모두 비움
    pub fn env_clear(mut self) -> Self {
        self.env.clear();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout_ms(self, timeout_ms: u64) -> Self {
        self.timeout(Duration::from_millis(timeout_ms))
    }

    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace_period = grace;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn get_timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn get_grace_period(&self) -> Duration {
        self.grace_period
    }

    /// 로그용 명령줄
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// POSIX 작은따옴표 이스케이프
pub fn quote_arg(arg: &str) -> String {
    format!("'{}'", arg.replace('\'', r"'\''"))
}

// ============================================================================
// ExecOutcome
// ============================================================================

/// 종료 방식 (정확히 하나)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    /// 정상 종료 (종료 코드)
    Exited(i32),
    /// 시그널로 종료 (취소 포함)
    Signaled(i32),
    /// 타임아웃으로 종료
    TimedOut,
}

/// 실행 결과 (spawn 당 정확히 한 번 생성)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit: ExitKind,
    pub duration: Duration,
}

impl ExecOutcome {
    /// 정상 종료 코드 (시그널/타임아웃이면 None)
    pub fn status_code(&self) -> Option<i32> {
        match self.exit {
            ExitKind::Exited(code) => Some(code),
            _ => None,
        }
    }

    pub fn signal(&self) -> Option<i32> {
        match self.exit {
            ExitKind::Signaled(sig) => Some(sig),
            _ => None,
        }
    }

    pub fn timed_out(&self) -> bool {
        self.exit == ExitKind::TimedOut
    }

    pub fn success(&self) -> bool {
        self.exit == ExitKind::Exited(0)
    }

    /// stdout + stderr (비어 있지 않은 것만)
    pub fn combined_output(&self) -> String {
        [self.stdout.trim_end(), self.stderr.trim_end()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_arg() {
        assert_eq!(quote_arg("plain"), "'plain'");
        assert_eq!(quote_arg("a b"), "'a b'");
        assert_eq!(quote_arg("it's"), r"'it'\''s'");
        assert_eq!(quote_arg("$(rm -rf /)"), "'$(rm -rf /)'");
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn test_shell_spec() {
        let spec = ExecSpec::shell("printf '%s\\n'", ["a b", "c;d"]);
        assert_eq!(spec.program(), "sh");
        assert_eq!(
            spec.get_args(),
            &["-c".to_string(), "printf '%s\\n' 'a b' 'c;d'".to_string()]
        );
    }

    #[test]
    fn test_env_is_explicit() {
        let spec = ExecSpec::new("env").env_clear().env("ONLY", "1");
        assert_eq!(spec.get_env().len(), 1);
        assert!(PASSTHROUGH_ENV
            .iter()
            .all(|key| !spec.get_env().contains_key(*key)));
    }

    #[test]
    fn test_outcome_accessors() {
        let outcome = ExecOutcome {
            stdout: "out\n".into(),
            stderr: String::new(),
            exit: ExitKind::TimedOut,
            duration: Duration::from_millis(5),
        };
        assert!(outcome.timed_out());
        assert_eq!(outcome.status_code(), None);
        assert_eq!(outcome.signal(), None);
        assert_eq!(outcome.combined_output(), "out");
    }
}
