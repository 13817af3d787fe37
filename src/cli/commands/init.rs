//! Project initialization: writes the default config file.

use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

const CONFIG_DIR: &str = ".compass";
const CONFIG_FILE: &str = ".compass/config.yaml";

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub config_path: String,
    pub message: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    if Path::new(CONFIG_FILE).exists() && !args.force {
        let result = InitOutput {
            success: false,
            config_path: CONFIG_FILE.to_string(),
            message: format!("{CONFIG_FILE} already exists. Use --force to overwrite."),
        };
        output(&result, json_mode);
        return Ok(());
    }

    std::fs::create_dir_all(CONFIG_DIR).context("Failed to create .compass directory")?;
    let yaml =
        serde_yaml::to_string(&Config::default()).context("Failed to serialize default config")?;
    std::fs::write(CONFIG_FILE, yaml).context("Failed to write config file")?;

    let result = InitOutput {
        success: true,
        config_path: CONFIG_FILE.to_string(),
        message: format!("Created {CONFIG_FILE} with defaults. Edit it, then run 'compass chat'."),
    };
    output(&result, json_mode);
    Ok(())
}
