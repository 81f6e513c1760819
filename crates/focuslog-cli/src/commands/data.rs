use chrono::NaiveDate;
use clap::Subcommand;
use std::path::PathBuf;

use super::Context;

#[derive(Subcommand)]
pub enum DataAction {
    /// List dates with stored sessions
    Days,
    /// Export every stored day to one JSON file
    Export { path: PathBuf },
    /// Import days from an export file
    Import {
        path: PathBuf,
        /// Replace days that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Write a full backup archive
    Backup { path: PathBuf },
    /// Merge two sessions of a day
    Merge {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        a: usize,
        b: usize,
    },
    /// Delete a session of a day
    Delete {
        /// Date (YYYY-MM-DD)
        date: NaiveDate,
        index: usize,
    },
}

pub fn run(ctx: &Context, action: DataAction) -> Result<(), Box<dyn std::error::Error>> {
    let storage = ctx.storage()?;

    match action {
        DataAction::Days => {
            for date in storage.available_days()? {
                println!("{date}");
            }
        }
        DataAction::Export { path } => {
            let count = storage.export_to(&path)?;
            println!("Exported {count} day(s) to {}", path.display());
        }
        DataAction::Import { path, overwrite } => {
            let summary = storage.import_from(&path, overwrite)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        DataAction::Backup { path } => {
            let count = storage.create_backup_archive(&path)?;
            println!("Backed up {count} day(s) to {}", path.display());
        }
        DataAction::Merge { date, a, b } => {
            let merged = storage.merge_sessions(date, a, b)?;
            println!("Merged sessions {a} and {b} into {}", merged.id);
        }
        DataAction::Delete { date, index } => {
            let removed = storage.delete_session(date, index)?;
            println!("Deleted session {index} ({})", removed.id);
        }
    }
    Ok(())
}
