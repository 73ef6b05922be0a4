//! # Exec
//!
//! 외부 프로그램을 안전하게 실행하는 기반 계층.
//! 모든 behavior 의 외부 도구 호출은 여기를 거친다.

mod command;
mod executor;

pub use command::{
    quote_arg, ExecOutcome, ExecSpec, ExitKind, DEFAULT_GRACE_PERIOD, PASSTHROUGH_ENV,
};
pub use executor::ProcessExecutor;
