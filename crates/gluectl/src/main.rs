use anyhow::Result;
use clap_complete::{generate, shells};
use gluectl_core::Config;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod connection;
mod error;
mod output;

use cli::{Cli, Commands, Invocation};
use connection::ConnectionManager;
use error::GlueCtlError;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level
    init_tracing(cli.global.verbose);

    let mut conn_mgr = match load_connection_manager(cli.global.config_file.as_deref()) {
        Ok(conn_mgr) => conn_mgr,
        Err(e) => {
            e.print_diagnostic();
            std::process::exit(e.exit_code());
        }
    };

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    if let Err(e) = execute_command(&cli, &mut conn_mgr, &cancel).await {
        e.print_diagnostic();
        std::process::exit(e.exit_code());
    }

    Ok(())
}

/// Load configuration from the explicit path or the default location
fn load_connection_manager(config_file: Option<&str>) -> Result<ConnectionManager, GlueCtlError> {
    let (config, config_path) = if let Some(config_file) = config_file {
        let path = std::path::PathBuf::from(config_file);
        debug!("Loading config from explicit path: {:?}", path);
        let config = Config::load_from_path(&path)?;
        (config, Some(path))
    } else {
        debug!("Loading config from default location");
        (Config::load()?, None)
    };
    debug!(
        "Creating ConnectionManager with config_path: {:?}",
        config_path
    );
    Ok(ConnectionManager::with_config_path(config, config_path))
}

/// The first Ctrl-C stops the invocation before its next remote call; a
/// second one exits immediately.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        warn!("Interrupt received, stopping before the next request");
        eprintln!("Interrupted; finishing the current request (Ctrl-C again to abort)");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

fn init_tracing(verbose: u8) {
    // Check for RUST_LOG env var first, then fall back to verbosity flag
    let filter = if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "gluectl=warn,gluectl_core=warn",
            1 => "gluectl=info,gluectl_core=info",
            2 => "gluectl=debug,gluectl_core=debug",
            _ => "gluectl=trace,gluectl_core=trace",
        };
        tracing_subscriber::EnvFilter::new(level)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .compact(),
        )
        .init();

    debug!("Tracing initialized with verbosity level: {}", verbose);
}

async fn execute_command(
    cli: &Cli,
    conn_mgr: &mut ConnectionManager,
    cancel: &CancellationToken,
) -> Result<(), GlueCtlError> {
    trace!("Executing command: {:?}", cli.invocation);
    info!("Command: {}", format_command(&cli.invocation));

    let start = std::time::Instant::now();
    let result = match &cli.invocation {
        Invocation::Builtin(Commands::Version) => {
            debug!("Showing version information");
            match cli.global.output {
                cli::OutputFormat::Json | cli::OutputFormat::Yaml => {
                    let output_data = serde_json::json!({
                        "version": env!("CARGO_PKG_VERSION"),
                        "name": env!("CARGO_PKG_NAME"),
                    });
                    output::print_output(&output_data, cli.global.output.into(), None)?;
                }
                _ => {
                    println!("gluectl {}", env!("CARGO_PKG_VERSION"));
                }
            }
            Ok(())
        }
        Invocation::Builtin(Commands::Completions { shell }) => {
            debug!("Generating completions for {:?}", shell);
            generate_completions(*shell);
            Ok(())
        }
        Invocation::Builtin(Commands::Operations(ops_cmd)) => {
            commands::operations::handle_operations_command(
                ops_cmd,
                cli.global.output,
                cli.global.query.as_deref(),
            )
        }
        Invocation::Builtin(Commands::Profile(profile_cmd)) => {
            debug!("Executing profile command");
            commands::profile::handle_profile_command(profile_cmd, conn_mgr, &cli.global)
        }
        Invocation::Operation { operation, matches } => {
            commands::invoke::handle_operation(*operation, matches, &cli.global, conn_mgr, cancel)
                .await
        }
    };

    let duration = start.elapsed();
    match &result {
        Ok(_) => info!("Command completed successfully in {:?}", duration),
        Err(e) => error!("Command failed after {:?}: {}", duration, e),
    }

    result
}

/// Generate shell completions
fn generate_completions(shell: cli::Shell) {
    let mut cmd = cli::build_command();
    let name = cmd.get_name().to_string();

    match shell {
        cli::Shell::Bash => generate(shells::Bash, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::Fish => generate(shells::Fish, &mut cmd, name, &mut std::io::stdout()),
        cli::Shell::PowerShell => {
            generate(shells::PowerShell, &mut cmd, name, &mut std::io::stdout())
        }
        cli::Shell::Elvish => generate(shells::Elvish, &mut cmd, name, &mut std::io::stdout()),
    }
}

/// Format command for human-readable logging (header values are left out)
fn format_command(invocation: &Invocation) -> String {
    match invocation {
        Invocation::Builtin(Commands::Version) => "version".to_string(),
        Invocation::Builtin(Commands::Completions { shell }) => format!("completions {:?}", shell),
        Invocation::Builtin(Commands::Operations(cmd)) => {
            use cli::OperationsCommands::*;
            match cmd {
                List { filter } => format!("operations list {:?}", filter),
                Describe { name } => format!("operations describe {}", name),
            }
        }
        Invocation::Builtin(Commands::Profile(cmd)) => {
            use cli::ProfileCommands::*;
            match cmd {
                List => "profile list".to_string(),
                Path => "profile path".to_string(),
                Show { name } => format!("profile show {}", name),
                Set { name, headers, .. } => {
                    format!("profile set {} [{} header(s) redacted]", name, headers.len())
                }
                Remove { name } => format!("profile remove {}", name),
                Default { name } => format!("profile default {}", name),
            }
        }
        Invocation::Operation { operation, matches } => {
            let flags: Vec<&str> = operation
                .fields
                .iter()
                .filter(|field| matches.contains_id(field.local))
                .map(|field| field.local)
                .collect();
            format!("{} [{}]", operation.command, flags.join(", "))
        }
    }
}
