use clap::Subcommand;
use serde_json::json;

use super::Context;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Work and interruption totals
    Summary {
        /// day, week, month, quarter, year or all
        #[arg(default_value = "day")]
        range: String,
    },
    /// Interruption statistics per tag
    Tags {
        #[arg(default_value = "day")]
        range: String,
    },
    /// Productivity analytics
    Detailed {
        #[arg(default_value = "week")]
        range: String,
    },
}

pub fn run(ctx: &Context, action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let storage = ctx.storage()?;
    let recovery = storage.recovery();

    match action {
        StatsAction::Summary { range } => {
            let dates = storage.date_range(&range)?;
            let totals = storage.totals(&range)?;
            let out = json!({
                "range": range,
                "start": dates.start,
                "end": dates.end,
                "work_seconds": totals.work.num_seconds(),
                "interruption_seconds": totals.interruption.num_seconds(),
                "interruptions": totals.interruptions,
                "recovery_seconds": totals.recovery(recovery).num_seconds(),
                "impact_seconds": totals.impact(recovery).num_seconds(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        StatsAction::Tags { range } => {
            let stats = storage.tag_stats(&range)?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        StatsAction::Detailed { range } => {
            let stats = storage.detailed_stats(&range)?;
            let out = json!({
                "stats": &stats,
                "most_productive_hour": stats.most_productive_hour().map(|(hour, _)| hour),
                "productivity_trend": stats.productivity_trend(),
                "interruption_breakdown": stats.interruption_breakdown(recovery),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
    }
    Ok(())
}
