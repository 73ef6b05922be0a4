//! forgehook CLI - Main entry point
//!
//! 호스트가 이벤트마다 한 번씩 실행한다. stdout 은 판정 JSON 전용,
//! 로그와 진단은 전부 stderr 로 간다.

mod commands;
mod environment;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 로그 필터 환경 변수
const ENV_LOG: &str = "FORGEHOOK_LOG";

/// forgehook - event-triggered hooks for AI coding assistants
#[derive(Parser, Debug)]
#[command(name = "forgehook")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Handle one host event read from stdin
    Run {
        /// Behaviors to run: "all" or a comma-separated list of names
        #[arg(default_value = "all")]
        selector: String,
    },
    /// Suppress or restore a behavior for the current session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// List the built-in behaviors
    List,
}

#[derive(Subcommand, Debug)]
enum SessionAction {
    /// Suppress a behavior for this session
    Disable {
        behavior: String,
        /// Session id (read from the payload on stdin when omitted)
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Restore a suppressed behavior for this session
    Enable {
        behavior: String,
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Show whether a behavior is suppressed for this session
    Status {
        behavior: String,
        #[arg(short, long)]
        session: Option<String>,
    },
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = std::env::var(ENV_LOG)
        .ok()
        .filter(|_| !debug)
        .and_then(|spec| tracing_subscriber::EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let code = match args.command {
        Command::Run { selector } => commands::run(&selector).await?,
        Command::Session { action } => match action {
            SessionAction::Disable { behavior, session } => {
                commands::session(commands::SessionOp::Disable, &behavior, session).await?
            }
            SessionAction::Enable { behavior, session } => {
                commands::session(commands::SessionOp::Enable, &behavior, session).await?
            }
            SessionAction::Status { behavior, session } => {
                commands::session(commands::SessionOp::Status, &behavior, session).await?
            }
        },
        Command::List => commands::list(),
    };

    // stdin 리더의 blocking 읽기가 런타임 종료를 붙잡지 않도록 바로 종료
    std::process::exit(code);
}
