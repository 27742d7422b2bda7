mod config;
mod console;
mod demo_commands;
mod launcher;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{error, info};

use cmdbot_commands::{CommandEngine, CommandManifest, CommandRegistry, StaticPermissions};
use cmdbot_core::{ChatClient, ExitSignal, RecordingClient, UserId};

use config::Config;
use console::{ConsoleClient, EventFactory};

#[derive(Parser)]
#[command(name = "cmdbot")]
#[command(about = "cmdbot: chat command engine with a console front-end")]
#[command(version)]
struct Cli {
    /// TOML config file (default: ~/.cmdbot/cmdbot.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve commands typed on stdin until EOF
    Run(RunArgs),
    /// Load and validate the command manifest, then list the commands
    Check {
        /// Command manifest to validate instead of the bundled one
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Run the bot in a child process and restart it when asked to
    Launch {
        /// Arguments passed through to `cmdbot run`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Command prefix; pass an empty string for unprefixed commands
    #[arg(long)]
    prefix: Option<String>,
    /// Bot owner user id
    #[arg(long)]
    owner: Option<u64>,
    /// User id the console speaks as
    #[arg(long)]
    author: Option<u64>,
    /// Display name the console speaks as
    #[arg(long)]
    name: Option<String>,
    /// Simulate a guild with this id instead of direct messages
    #[arg(long)]
    guild: Option<u64>,
    /// Command manifest to load instead of the bundled one
    #[arg(long)]
    manifest: Option<PathBuf>,
    /// Directory for NDJSON log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Print outgoing actions as JSON lines
    #[arg(long)]
    json: bool,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(prefix) = self.prefix {
            config.prefix = prefix;
        }
        if let Some(owner) = self.owner {
            config.owner_id = Some(owner);
        }
        if let Some(author) = self.author {
            config.author_id = author;
        }
        if let Some(name) = self.name {
            config.author_name = name;
        }
        if let Some(guild) = self.guild {
            config.guild_id = Some(guild);
        }
        if let Some(manifest) = self.manifest {
            config.manifest = Some(manifest);
        }
        if let Some(log_dir) = self.log_dir {
            config.log_dir = Some(log_dir);
        }
        config.json |= self.json;
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let code = match execute(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!(error = %format!("{err:#}"), "cmdbot failed");
            eprintln!("cmdbot: {err:#}");
            ExitSignal::AbnormalClose.to_exit_code()
        }
    };
    // Exit without dropping the runtime: a pending stdin read would block
    // its shutdown.
    std::process::exit(code);
}

async fn execute(cli: Cli) -> Result<i32> {
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => {
            args.apply(&mut config);
            cmdbot_logging::init_logger(config.log_dir.as_deref(), &config.log_level)?;
            let signal = run_bot(&config).await?;
            info!(signal = %signal, "Bot stopped");
            Ok(signal.to_exit_code())
        }
        Commands::Check { manifest } => {
            if manifest.is_some() {
                config.manifest = manifest;
            }
            cmdbot_logging::init_logger(None, &config.log_level)?;
            check(&config).await?;
            Ok(0)
        }
        Commands::Launch { args } => {
            cmdbot_logging::init_logger(config.log_dir.as_deref(), &config.log_level)?;
            let mut child_args = Vec::new();
            if let Some(path) = &cli.config {
                child_args.push("--config".to_string());
                child_args.push(path.display().to_string());
            }
            child_args.extend(args);
            let signal = launcher::supervise(&child_args).await?;
            Ok(signal.to_exit_code())
        }
    }
}

async fn load_registry(config: &Config, control: mpsc::Sender<ExitSignal>) -> Result<CommandRegistry> {
    let manifest = match &config.manifest {
        Some(path) => CommandManifest::load(path).await?,
        None => CommandManifest::parse(demo_commands::BUNDLED_MANIFEST),
    };
    CommandRegistry::from_manifest(&manifest, &demo_commands::catalog(control), config.case_insensitive)
        .context("Failed to build command registry")
}

fn build_engine(
    config: &Config,
    client: Arc<dyn ChatClient>,
    registry: Arc<CommandRegistry>,
) -> Result<CommandEngine> {
    let mut permissions = StaticPermissions::new();
    for permission in &config.permissions {
        permissions = permissions.grant(UserId(config.author_id), permission.clone());
    }
    CommandEngine::builder(client, registry)
        .options(config.engine_options())
        .permissions(Arc::new(permissions))
        .build()
        .context("Invalid command configuration")
}

/// Serve stdin until EOF or until a command requests an exit.
async fn run_bot(config: &Config) -> Result<ExitSignal> {
    let (control_tx, mut control_rx) = mpsc::channel(1);
    let registry = Arc::new(load_registry(config, control_tx).await?);
    let client = Arc::new(ConsoleClient::new(UserId(config.bot_id), config.json));
    let engine = Arc::new(build_engine(config, client, registry)?);

    let (events_tx, events_rx) = mpsc::channel(64);
    let engine_task = tokio::spawn(Arc::clone(&engine).run(events_rx));
    let mut reader = tokio::spawn(console::read_stdin(EventFactory::new(config), events_tx));

    let signal = tokio::select! {
        Some(signal) = control_rx.recv() => {
            reader.abort();
            signal
        }
        finished = &mut reader => match finished {
            Ok(Ok(())) => ExitSignal::CompleteClose,
            Ok(Err(err)) => {
                error!(error = %format!("{err:#}"), "Console input failed");
                ExitSignal::AbnormalClose
            }
            Err(err) => {
                error!(error = %err, "Console reader stopped unexpectedly");
                ExitSignal::AbnormalClose
            }
        },
    };

    // Let in-flight dispatches finish before exiting.
    match engine_task.await {
        Ok(result) => result?,
        Err(err) => {
            error!(error = %err, "Command loop panicked");
            return Ok(ExitSignal::AbnormalClose);
        }
    }
    Ok(signal)
}

async fn check(config: &Config) -> Result<()> {
    let (control_tx, _control_rx) = mpsc::channel(1);
    let registry = Arc::new(load_registry(config, control_tx).await?);
    let engine = build_engine(config, Arc::new(RecordingClient::new()), registry)?;

    println!("{} command(s) OK", engine.registry().len());
    for command in engine.registry().all() {
        let aliases = if command.aliases.is_empty() {
            String::new()
        } else {
            format!(" ({})", command.aliases.join(", "))
        };
        println!(
            "  {}{} [{} variant(s)] {}",
            command.name,
            aliases,
            command.responders.len(),
            command.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        let args = RunArgs {
            prefix: Some("?".into()),
            owner: Some(3),
            guild: Some(9),
            json: true,
            ..Default::default()
        };
        args.apply(&mut config);
        assert_eq!(config.prefix, "?");
        assert_eq!(config.owner_id, Some(3));
        assert_eq!(config.guild_id, Some(9));
        assert!(config.json);
        assert_eq!(config.author_id, 1);
    }

    #[test]
    fn test_cli_parses_launch_passthrough() {
        let cli = Cli::parse_from(["cmdbot", "launch", "--", "--json", "--owner", "3"]);
        match cli.command {
            Commands::Launch { args } => assert_eq!(args, vec!["--json", "--owner", "3"]),
            _ => panic!("expected launch"),
        }
    }

    #[tokio::test]
    async fn test_bundled_registry_validates() {
        let (tx, _rx) = mpsc::channel(1);
        let config = Config::default();
        let registry = Arc::new(load_registry(&config, tx).await.unwrap());
        let engine = build_engine(&config, Arc::new(RecordingClient::new()), registry).unwrap();
        assert!(engine.registry().lookup("help").is_some());
        assert!(engine.registry().lookup("say").is_some());
    }
}
