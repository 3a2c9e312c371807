//! `rcpt config`: inspect and edit the JSON settings file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use tracing::debug;

use rcpt_core::models::config::RcptConfig;
use rcpt_core::ReceiptParser;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective settings as JSON
    Show,

    /// Write a settings file populated with defaults
    Init(InitArgs),

    /// Print one setting by dotted key
    Get {
        /// Dotted key, e.g. "extraction.price_strategy"
        key: String,
    },

    /// Change one setting by dotted key
    Set {
        /// Dotted key, e.g. "extraction.details_len"
        key: String,
        /// JSON value, or a bare string
        value: String,
    },

    /// Print where the settings file lives
    Path,
}

#[derive(Args)]
struct InitArgs {
    /// Write here instead of the active config path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    match args.command {
        ConfigCommand::Show => show_config(&config_path),
        ConfigCommand::Init(init_args) => init_config(init_args, &config_path),
        ConfigCommand::Get { key } => get_config(&config_path, &key),
        ConfigCommand::Set { key, value } => set_config(&config_path, &key, &value),
        ConfigCommand::Path => show_path(&config_path),
    }
}

/// Load the config from an explicit path, else the default location,
/// else built-in defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<RcptConfig> {
    if let Some(path) = config_path {
        return Ok(RcptConfig::from_file(Path::new(path))?);
    }

    let default_path = default_config_path();
    if default_path.exists() {
        debug!("Loading config from {}", default_path.display());
        return Ok(RcptConfig::from_file(&default_path)?);
    }

    Ok(RcptConfig::default())
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rcpt")
        .join("config.json")
}

fn read_or_default(config_path: &Path) -> anyhow::Result<RcptConfig> {
    if config_path.exists() {
        Ok(RcptConfig::from_file(config_path)?)
    } else {
        Ok(RcptConfig::default())
    }
}

fn show_config(config_path: &Path) -> anyhow::Result<()> {
    if !config_path.exists() {
        eprintln!(
            "{} {} does not exist yet; printing built-in defaults",
            style("ℹ").blue(),
            config_path.display()
        );
    }

    let config = read_or_default(config_path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

fn init_config(args: InitArgs, config_path: &Path) -> anyhow::Result<()> {
    let target = args.output.as_deref().unwrap_or(config_path);

    if target.exists() && !args.force {
        anyhow::bail!("{} already exists (pass --force to replace it)", target.display());
    }
    ensure_parent(target)?;

    RcptConfig::default().save(target)?;
    println!("{} Wrote default config to {}", style("✓").green(), target.display());
    Ok(())
}

fn get_config(config_path: &Path, key: &str) -> anyhow::Result<()> {
    let tree = serde_json::to_value(read_or_default(config_path)?)?;
    let value = key
        .split('.')
        .try_fold(&tree, |node, segment| node.get(segment))
        .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;

    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn set_config(config_path: &Path, key: &str, raw: &str) -> anyhow::Result<()> {
    // Bare words that are not valid JSON are stored as strings
    let value = serde_json::from_str::<serde_json::Value>(raw)
        .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));

    let mut tree = serde_json::to_value(read_or_default(config_path)?)?;
    let (parent_key, field) = key.rsplit_once('.').unwrap_or(("", key));

    let parent = if parent_key.is_empty() {
        Some(&mut tree)
    } else {
        parent_key
            .split('.')
            .try_fold(&mut tree, |node, segment| node.get_mut(segment))
    };
    let slot = parent
        .and_then(|node| node.as_object_mut())
        .and_then(|map| map.get_mut(field))
        .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;
    *slot = value.clone();

    let config: RcptConfig = serde_json::from_value(tree)
        .map_err(|e| anyhow::anyhow!("Bad value for {}: {}", key, e))?;
    config.validate()?;
    ReceiptParser::from_config(&config.extraction)
        .map_err(|e| anyhow::anyhow!("Refusing to save invalid config: {}", e))?;

    ensure_parent(config_path)?;
    config.save(config_path)?;

    println!("{} {} = {}", style("✓").green(), key, value);
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(fs::create_dir_all(parent)?),
        _ => Ok(()),
    }
}

fn show_path(config_path: &Path) -> anyhow::Result<()> {
    let status = if config_path.exists() {
        style("present").green()
    } else {
        style("missing, run `rcpt config init`").yellow()
    };

    println!("{} ({})", config_path.display(), status);
    Ok(())
}
