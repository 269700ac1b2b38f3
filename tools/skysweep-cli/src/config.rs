//! Config command - show or write the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use skysweep_core::config::{self, Config};

/// Arguments for the config command
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write the configuration back, filling in every default
    #[arg(long)]
    pub write: bool,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let (config, path) = match &args.config {
        Some(path) => (
            config::load_from(path).with_context(|| format!("Failed to load {}", path.display()))?,
            Some(path.clone()),
        ),
        None => (config::load(), config::config_path()),
    };

    match &path {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no configuration directory on this platform"),
    }
    println!("{}", render(&config)?);

    if args.write {
        let written = match &args.config {
            Some(path) => {
                config::save_to(&config, path)?;
                Some(path.clone())
            }
            None => config::save(&config)?,
        };
        match written {
            Some(path) => println!("Configuration written to {}", path.display()),
            None => anyhow::bail!("No configuration directory available"),
        }
    }
    Ok(())
}

fn render(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to serialize configuration")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_round_trips() {
        let text = render(&Config::default()).unwrap();
        assert!(text.contains("[survey]"));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_write_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "renderer = \"voice\"\n").unwrap();

        execute(ConfigArgs {
            config: Some(path.clone()),
            write: true,
        })
        .unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("[voice]"));
        assert_eq!(config::load_from(&path).unwrap().renderer, config::RendererKind::Voice);
    }
}
