//! tmux-sessionizer - fuzzy-pick a project and jump into its tmux session
//!
//! Run with `tmux-sessionizer` or `tmux-sessionizer --help` for usage.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tmux_sessionizer::{
    APP_NAME, Config, EnterAction, Error, SessionHandler, SystemRunner, VERSION,
    config::{ProjectScanner, project_roots},
    error::{ProcessError, SessionError},
    process::ProcessRunner,
};

#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(version = VERSION)]
#[command(about = "Fuzzy-pick a project directory and attach to its tmux session")]
#[command(long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pick a project directory and create or attach to its session (default)
    New,

    /// Pick a running session and attach or switch to it
    List,

    /// Pick a running session and kill it
    Kill,

    /// Create a new project directory under a root and open a session there
    Create {
        /// Directory name for the new project
        name: String,
    },

    /// Show configuration
    Config {
        /// Initialize config file with defaults
        #[arg(long)]
        init: bool,
    },
}

fn setup_logging(debug: bool, log_file: Option<&Path>) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        // Stay quiet unless something goes wrong; stdout belongs to tmux
        EnvFilter::new("warn")
            .add_directive("ignore=warn".parse()?)
            .add_directive("tokio=warn".parse()?)
    };

    if let Some(path) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .wrap_err_with(|| format!("Failed to open log file {}", path.display()))?;

        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(file).with_target(false))
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .with(filter)
            .init();
    }

    Ok(())
}

/// Cancel `token` on the first Ctrl-C
fn spawn_interrupt_handler(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Interrupt received, canceling");
            token.cancel();
        }
    });
}

/// Exit code for errors that mean "the user backed out"
fn quiet_exit(err: &Error) -> Option<ExitCode> {
    match err {
        Error::Session(SessionError::NoSelection) => Some(ExitCode::from(1)),
        Error::Process(ProcessError::Canceled { .. }) => Some(ExitCode::from(130)),
        // fzf exits 130 when dismissed with Esc or Ctrl-C
        Error::Process(ProcessError::Failed {
            code: Some(130), ..
        }) => Some(ExitCode::from(130)),
        _ => None,
    }
}

async fn run_flow(
    command: Commands,
    config: &Config,
    runner: Arc<dyn ProcessRunner>,
    cancel: CancellationToken,
) -> std::result::Result<Option<EnterAction>, Error> {
    let mut handler = SessionHandler::from_config(config, runner, cancel).await?;

    match command {
        Commands::New => {
            let roots = project_roots(config)?;
            let projects = ProjectScanner::from_config(config).scan(&roots);
            info!("Offering {} project directories", projects.len());

            handler = handler.with_projects(projects);
            handler.create_or_attach_from_project_list().await.map(Some)
        }
        Commands::List => handler.attach_to_existing_session().await.map(Some),
        Commands::Kill => handler.delete_session().await.map(|()| None),
        Commands::Create { name } => {
            handler = handler.with_roots(project_roots(config)?);
            handler.create_project_session(&name).await.map(Some)
        }
        Commands::Config { .. } => Ok(None),
    }
}

fn show_config(config: &Config, path: Option<&Path>, init: bool) -> Result<()> {
    if init {
        let written = config.save(path)?;
        println!("Configuration initialized at {:?}", written);
        return Ok(());
    }

    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => Config::config_file_path()?,
    };

    println!("Configuration:");
    println!("{}", toml::to_string_pretty(config)?);
    println!("\nConfig file: {:?}", config_path);
    println!("Project file: {:?}", config.project_file);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Install color-eyre error hooks
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref()).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config, using defaults: {}", e);
        Config::default()
    });

    setup_logging(cli.debug || config.debug, config.log_file.as_deref())?;
    debug!("Starting {} v{}", APP_NAME, VERSION);

    let command = cli.command.unwrap_or(Commands::New);
    if let Commands::Config { init } = command {
        show_config(&config, cli.config.as_deref(), init)?;
        return Ok(ExitCode::SUCCESS);
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner::new());

    match run_flow(command, &config, runner, cancel).await {
        Ok(Some(action)) => {
            info!("Done: {}", action);
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => Ok(ExitCode::SUCCESS),
        Err(e) => match quiet_exit(&e) {
            Some(code) => {
                debug!("Exiting quietly: {}", e);
                Ok(code)
            }
            None => Err(e).wrap_err("tmux-sessionizer failed"),
        },
    }
}
