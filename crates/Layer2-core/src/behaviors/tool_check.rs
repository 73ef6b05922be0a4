//! Tool Check Behaviors - 린터/타입 체커/테스트 실행기
//!
//! 명령줄은 설정에서만 온다:
//!
//! ```json
//! {
//!   "behaviors": {
//!     "lint": {
//!       "options": { "command": "eslint --max-warnings 0 {file}", "extensions": "ts,tsx" },
//!       "timeoutMs": 30000
//!     }
//!   }
//! }
//! ```
//!
//! `{file}` 은 수정된 파일 경로로 치환되고, 명령 문자열은 셸을 거치지 않고
//! 인자 벡터로 나뉜다.

use crate::exec::{ExecSpec, ExitKind};
use crate::hook::{Behavior, HookEventType, HookInvocationContext, HookResult, ToolMatcher};
use async_trait::async_trait;
use forgehook_foundation::Error;
use std::path::Path;
use tracing::debug;

/// 기본 타임아웃 (60초)
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// 파일 경로 자리표시자
const FILE_PLACEHOLDER: &str = "{file}";

/// 파일을 수정하는 tool
const EDITING_TOOLS: &str = "Edit|MultiEdit|Write|NotebookEdit";

/// 설정된 외부 도구를 실행하는 behavior
#[derive(Debug, Clone)]
pub struct ToolCheckBehavior {
    name: String,
    description: String,
    events: Vec<HookEventType>,
    matcher: Option<ToolMatcher>,
}

impl ToolCheckBehavior {
    /// 새 tool check behavior
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        events: Vec<HookEventType>,
        matcher: Option<ToolMatcher>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            events,
            matcher,
        }
    }

    /// 수정된 파일에 린터 실행
    pub fn lint() -> Self {
        Self::new(
            "lint",
            "Run the configured linter on edited files",
            vec![HookEventType::PostToolUse],
            Some(ToolMatcher::new(EDITING_TOOLS)),
        )
    }

    /// 수정된 파일에 타입 체커 실행
    pub fn typecheck() -> Self {
        Self::new(
            "typecheck",
            "Run the configured type checker on edited files",
            vec![HookEventType::PostToolUse],
            Some(ToolMatcher::new(EDITING_TOOLS)),
        )
    }

    /// 턴 종료 시 테스트 실행
    pub fn test() -> Self {
        Self::new(
            "test",
            "Run the configured test command when the turn stops",
            vec![HookEventType::Stop],
            None,
        )
    }

    /// 확장자 필터 통과 여부 (필터 없으면 통과)
    fn extension_allowed(extensions: &[String], file: &str) -> bool {
        if extensions.is_empty() {
            return true;
        }
        let Some(ext) = Path::new(file).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }

    /// 명령 문자열을 인자 벡터로 (`{file}` 치환)
    fn build_argv(command: &str, file: Option<&str>) -> Result<Vec<String>, String> {
        let argv = shlex::split(command)
            .ok_or_else(|| format!("cannot parse command line: {}", command))?;
        if argv.is_empty() {
            return Err("command line is empty".to_string());
        }

        Ok(argv
            .into_iter()
            .map(|arg| match file {
                Some(file) => arg.replace(FILE_PLACEHOLDER, file),
                None => arg,
            })
            .collect())
    }
}

#[async_trait]
impl Behavior for ToolCheckBehavior {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn events(&self) -> Vec<HookEventType> {
        self.events.clone()
    }

    fn tool_matcher(&self) -> Option<ToolMatcher> {
        self.matcher.clone()
    }

    async fn execute(&self, ctx: &HookInvocationContext) -> HookResult {
        let Some(command) = ctx.settings.option_str("command") else {
            debug!(behavior = %self.name, "No command configured");
            return HookResult::success();
        };

        let file = ctx.payload.file_path();
        if command.contains(FILE_PLACEHOLDER) && file.is_none() {
            debug!(behavior = %self.name, "Command needs a file but payload has none");
            return HookResult::success();
        }
        if let Some(file) = file {
            if !Self::extension_allowed(&ctx.settings.option_list("extensions"), file) {
                debug!(behavior = %self.name, file, "Extension not checked");
                return HookResult::success();
            }
        }

        let argv = match Self::build_argv(command, file) {
            Ok(argv) => argv,
            Err(message) => {
                return Error::Config(format!("{}: {}", self.name, message)).into();
            }
        };

        let timeout_ms = ctx.timeout_ms(DEFAULT_TIMEOUT_MS);
        let spec = ExecSpec::new(&argv[0])
            .args(argv[1..].iter().cloned())
            .current_dir(&ctx.project_root)
            .timeout_ms(timeout_ms);

        debug!(behavior = %self.name, command = %spec.display(), "Running tool check");

        let outcome = match ctx.executor.run(&spec).await {
            Ok(outcome) => outcome,
            Err(e) => return e.into(),
        };

        match outcome.exit {
            ExitKind::Exited(0) => HookResult::success(),
            ExitKind::Exited(code) => {
                let output = strip_ansi_escapes::strip_str(outcome.combined_output());
                let err = Error::ToolFailed {
                    tool: self.name.clone(),
                    code,
                };
                HookResult::block(format!("{}:\n{}", err, output.trim_end()))
            }
            ExitKind::TimedOut => Error::ToolTimeout {
                tool: self.name.clone(),
                timeout_ms,
            }
            .into(),
            ExitKind::Signaled(signal) => {
                HookResult::error(format!("{} terminated by signal {}", self.name, signal))
            }
        }
    }
}
