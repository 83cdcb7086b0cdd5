use clap::Parser;

mod app;
mod commands;

use commands::cli::{Args, Commands, JvmFault, TargetCommand};
use faultd_core::api::{self as core_api, AgentContext, AgentError};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{e}");
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<(), AgentError> {
    let args = Args::parse();

    let cfg = core_api::load_default().map_err(AgentError::Internal)?;
    init_tracing(&cfg.logging).map_err(AgentError::Validation)?;

    // Explicit registry assembly: a duplicate (target, fault) pair is a
    // programming error and aborts startup here.
    let registry = faultd_injectors::builtin_registry()?;
    let ctx = AgentContext::new(cfg);

    dispatch(args, &ctx, &registry).await
}

async fn dispatch(
    args: Args,
    ctx: &AgentContext,
    registry: &core_api::InjectorRegistry,
) -> Result<(), AgentError> {
    match args.command {
        Commands::Inject(inject) => {
            let (target, fault, fault_args) = match inject.target {
                TargetCommand::Jvm { fault } => match fault {
                    JvmFault::Methodexception(flags) => (
                        "jvm",
                        "methodexception",
                        serde_json::json!({
                            "pid": flags.pid,
                            "key": flags.key,
                            "method": flags.method,
                        }),
                    ),
                },
            };
            app::run_inject(
                ctx,
                registry,
                app::InjectRequest {
                    target,
                    fault,
                    common: inject.common,
                    args: fault_args,
                },
                args.format,
            )
            .await
        }
        Commands::Recover(recover) => app::run_recover(ctx, registry, &recover.uid).await,
        Commands::Query(query) => app::run_query(ctx, query.uid.as_deref(), args.format),
    }
}

fn init_tracing(logging: &core_api::LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => std::env::temp_dir().join("faultd"),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("faultd.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
