//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use darkmatter_core::group_builders;
use darkmatter_markdown::{Pipeline, parse_file, resolve_options};
use darkmatter_shared::{AppConfig, Lifecycle, init_config, load_config, load_config_from};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Darkmatter — markdown through a staged builder pipeline.
#[derive(Parser)]
#[command(
    name = "dm",
    version,
    about = "Run markdown documents through the darkmatter builder pipeline.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Parse a markdown file and print the resulting pipeline as JSON.
    Parse {
        /// Markdown file to parse.
        file: PathBuf,

        /// Route for the document (defaults to the file path).
        #[arg(short, long)]
        route: Option<String>,

        /// Config file to use instead of ~/.darkmatter/darkmatter.toml.
        #[arg(short, long, env = "DARKMATTER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// List registered builders in execution order.
    Builders {
        /// Only show this stage.
        #[arg(short, long)]
        stage: Option<Lifecycle>,

        /// Config file to use instead of ~/.darkmatter/darkmatter.toml.
        #[arg(short, long, env = "DARKMATTER_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Create a default config file.
    Init,
    /// Show the current configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Filter directives for the library crates and this binary (`dm`).
fn default_directives(verbose: u8) -> &'static str {
    match verbose {
        0 => "darkmatter=info,dm=info",
        1 => "darkmatter=debug,dm=debug",
        _ => "darkmatter=trace,dm=trace",
    }
}

/// Initialize tracing subscriber based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(cli.verbose)));

    // Logs go to stderr so `dm parse` output stays pipeable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Parse {
            file,
            route,
            config,
        } => cmd_parse(&file, route.as_deref(), config.as_deref()).await,
        Command::Builders { stage, config } => cmd_builders(stage, config.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_parse(file: &Path, route: Option<&str>, config: Option<&Path>) -> Result<()> {
    let config = resolve_config(config)?;
    let options = resolve_options(&config)?;

    info!(file = %file.display(), builders = options.builders.len(), "parsing");
    let pipeline: Pipeline = parse_file(file, route, &options).await?;

    let json = serde_json::to_string_pretty(&pipeline)?;
    println!("{json}");
    Ok(())
}

fn cmd_builders(stage: Option<Lifecycle>, config: Option<&Path>) -> Result<()> {
    let config = resolve_config(config)?;
    let options = resolve_options(&config)?;
    let mut grouped = group_builders(&options);

    let stages: Vec<Lifecycle> = match stage {
        Some(stage) => vec![stage],
        None => Lifecycle::ALL.to_vec(),
    };

    for stage in stages {
        let builders = grouped.remove(&stage).unwrap_or_default();
        println!("{stage}:");
        if builders.is_empty() {
            println!("  (none)");
            continue;
        }
        for (i, builder) in builders.iter().enumerate() {
            if builder.options.is_empty() {
                println!("  {}. {}", i + 1, builder.display_name());
            } else {
                let options = serde_json::Value::Object(builder.options.clone());
                println!("  {}. {} {options}", i + 1, builder.display_name());
            }
        }
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let toml_str = toml::to_string_pretty(&config)
        .map_err(|e| eyre!("cannot render config as TOML: {e}"))?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_stage_names() {
        let cli = Cli::try_parse_from(["dm", "builders", "--stage", "Render"]).expect("parse");
        match cli.command {
            Command::Builders { stage, .. } => assert_eq!(stage, Some(Lifecycle::Render)),
            _ => panic!("expected builders command"),
        }
    }

    #[test]
    fn default_directives_cover_the_binary() {
        let bin = module_path!().split("::").next().unwrap_or_default();
        for verbose in 0..3 {
            let directives = default_directives(verbose);
            assert!(directives.split(',').any(|d| d.starts_with(&format!("{bin}="))));
            assert!(directives.split(',').any(|d| d.starts_with("darkmatter=")));
        }
    }

    #[test]
    fn rejects_unknown_stage() {
        assert!(Cli::try_parse_from(["dm", "builders", "--stage", "compile"]).is_err());
    }

    #[test]
    fn parse_accepts_route_and_global_flags() {
        let cli = Cli::try_parse_from(["dm", "-vv", "parse", "doc.md", "--route", "/doc", "--log-format", "json"])
            .expect("parse");
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        match cli.command {
            Command::Parse { file, route, .. } => {
                assert_eq!(file, PathBuf::from("doc.md"));
                assert_eq!(route.as_deref(), Some("/doc"));
            }
            _ => panic!("expected parse command"),
        }
    }
}
