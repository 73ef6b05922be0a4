//! 서브커맨드 구현

use crate::environment::Environment;
use forgehook_core::{builtin_registry, BehaviorSelector, Dispatcher, PayloadReader, EXIT_ERROR};
use forgehook_foundation::validate_session_id;
use tracing::warn;

/// `forgehook run <selector>`
pub async fn run(selector: &str) -> anyhow::Result<i32> {
    let payload = PayloadReader::new().read_stdin().await;
    let env = Environment::resolve(&payload)?;

    let registry = builtin_registry();
    let dispatcher = Dispatcher::new(registry, env.settings, env.sessions, env.project_root)
        .with_working_dir(env.working_dir);

    let response = dispatcher
        .dispatch(payload, &BehaviorSelector::parse(selector))
        .await;

    if let Some(json) = &response.stdout {
        println!("{}", json);
    }
    for line in &response.stderr {
        eprintln!("{}", line);
    }

    Ok(response.exit_code)
}

/// 세션 정책 조작
#[derive(Debug, Clone, Copy)]
pub enum SessionOp {
    Disable,
    Enable,
    Status,
}

/// `forgehook session disable|enable|status <behavior>`
pub async fn session(op: SessionOp, behavior: &str, session: Option<String>) -> anyhow::Result<i32> {
    let payload = match session {
        Some(_) => Default::default(),
        None => PayloadReader::new().read_stdin().await,
    };

    let Some(session_id) = session.or_else(|| payload.resolve_session_id()) else {
        eprintln!("No session id: pass --session or provide a payload with a transcript path");
        return Ok(EXIT_ERROR);
    };
    validate_session_id(&session_id)?;

    if !builtin_registry().contains(behavior) {
        warn!(behavior, "Not a built-in behavior");
    }

    let env = Environment::resolve(&payload)?;
    let store = env.sessions;

    let message = match op {
        SessionOp::Disable => store
            .suppress(&session_id, behavior, &env.working_dir)?
            .to_string(),
        SessionOp::Enable => store.restore(&session_id, behavior)?.to_string(),
        SessionOp::Status => {
            let state = if !env.settings.is_enabled(behavior) {
                "disabled by configuration"
            } else if store.is_suppressed(&session_id, behavior) {
                "suppressed"
            } else {
                "active"
            };
            state.to_string()
        }
    };

    println!("{}: {}", behavior, message);
    Ok(0)
}

/// `forgehook list`
pub fn list() -> i32 {
    let registry = builtin_registry();
    for (name, description) in registry.list() {
        println!("{:<12} {}", name, description);
    }
    0
}
