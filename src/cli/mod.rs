//! Command-line interface.
//!
//! Without a subcommand the binary runs the web server. Subcommands:
//! - `config check` - Validate configuration
//! - `hash-password <password>` - Print an argon2 hash for `admin_password_hash`
//! - `seed` - Insert starter content into an empty store
//! - `export <file>` - Write the current store as a JSON store file

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::db::{self, JsonStore};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "vetmission")]
#[command(author, version, about = "Content API and site server for a veterinary mission", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "VETMISSION_CONFIG", default_value = "vetmission.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Subcommand to run (if none, starts the server)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print an argon2 hash of a password for `auth.admin_password_hash`
    HashPassword {
        password: String,
    },

    /// Insert starter content if the store is empty
    Seed,

    /// Export all content to a JSON store file
    Export {
        /// Destination file; must not already exist
        file: PathBuf,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

/// Run a CLI command
pub async fn run_command(cli: &Cli) -> Result<()> {
    match &cli.command {
        Some(Commands::Config(ConfigCommands::Check)) => cmd_config_check(cli),
        Some(Commands::HashPassword { password }) => cmd_hash_password(password),
        Some(Commands::Seed) => cmd_seed(cli).await,
        Some(Commands::Export { file }) => cmd_export(cli, file).await,
        None => {
            // No subcommand means start the server - this is handled in main.rs
            Ok(())
        }
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "Enabled"
    } else {
        "Disabled"
    }
}

/// Validate configuration file
fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!("Defaults and environment variables will be used.");
        println!();
    }

    let config = Config::load(config_path)?;

    println!("=== Configuration Summary ===");
    println!();
    println!("Server:");
    println!("  Address:      {}:{}", config.server.host, config.server.port);
    println!("  Static Dir:   {}", config.server.static_dir.display());
    println!("  Upload Dir:   {}", config.server.upload_dir.display());
    println!("  Max Upload:   {} bytes", config.server.max_upload_bytes);
    println!();
    println!("Storage:");
    println!("  Backend:      {:?}", config.storage.backend);
    println!(
        "  Database:     {}",
        if config.storage.database_url.is_some() {
            "Configured"
        } else {
            "Not configured"
        }
    );
    println!("  JSON File:    {}", config.storage.json_path.display());
    println!();
    println!("Security:");
    println!("  Rate Limiting: {}", enabled(config.rate_limit.enabled));
    println!(
        "  Password:     {}",
        if config.auth.admin_password_hash.is_some() {
            "argon2 hash"
        } else if config.auth.admin_password.is_some() {
            "plain text"
        } else {
            "not set"
        }
    );
    println!("  Token TTL:    {} hours", config.auth.token_ttl_hours);
    println!();
    println!("Features:");
    println!("  Contact Mail: {}", enabled(config.email.is_configured()));
    println!();

    let problems = config.validate();
    if problems.is_empty() {
        println!("[OK] Configuration is valid!");
        return Ok(());
    }

    for problem in &problems {
        println!("[!!] {}", problem);
    }
    println!();
    anyhow::bail!("Configuration has {} problem(s)", problems.len())
}

fn cmd_hash_password(password: &str) -> Result<()> {
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }

    let hash = crate::api::auth::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;

    println!("{}", hash);
    Ok(())
}

async fn cmd_seed(cli: &Cli) -> Result<()> {
    let config = Config::load(&cli.config)?;
    let store = db::open(&config.storage).await?;

    if db::seed_defaults(&store).await? {
        println!("[OK] Starter content added ({} store)", store.backend());
    } else {
        println!("Store already has content, nothing to do.");
    }
    Ok(())
}

async fn cmd_export(cli: &Cli, file: &Path) -> Result<()> {
    if file.exists() {
        anyhow::bail!("Refusing to overwrite existing file: {}", file.display());
    }

    let config = Config::load(&cli.config)?;
    let store = db::open(&config.storage).await?;
    let snapshot = store.export().await.context("Failed to read content")?;

    let counts: Vec<String> = snapshot
        .collections
        .iter()
        .map(|(name, records)| format!("{} {}", records.len(), name))
        .collect();

    let target = JsonStore::open(file)
        .await
        .with_context(|| format!("Failed to create {}", file.display()))?;
    target
        .import(snapshot)
        .await
        .context("Failed to write export")?;

    println!("[OK] Exported {} to {}", counts.join(", "), file.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["vetmission", "export", "backup.json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Export { ref file }) if file == Path::new("backup.json")));

        let cli = Cli::try_parse_from(["vetmission", "config", "check"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Config(ConfigCommands::Check))));

        let cli = Cli::try_parse_from(["vetmission", "--log-level", "debug"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_hash_password_rejects_empty() {
        assert!(cmd_hash_password("").is_err());
    }
}
