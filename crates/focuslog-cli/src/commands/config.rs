use clap::Subcommand;

use super::Context;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "storage.backup_enabled", "tracking.recovery_minutes")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
}

pub fn run(ctx: Context, action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ctx.config;
    match action {
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            println!("ok");
        }
        ConfigAction::List => {
            for (key, value) in config.entries() {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}
