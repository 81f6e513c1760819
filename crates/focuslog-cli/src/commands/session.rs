use chrono::Local;
use clap::Subcommand;
use focuslog_core::accounting::session_totals;
use focuslog_core::duration::{format_clock, format_human};
use focuslog_core::{InterruptionTag, Session, Tracker};

use super::Context;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a new work session
    Start {
        /// What you are working on
        description: Option<String>,
    },
    /// Record an interruption of the active session
    Interrupt {
        /// Interruption tag (call, meeting, spouse, other or a configured custom tag)
        #[arg(long, short, default_value = "other")]
        tag: String,
        /// Optional note
        description: Option<String>,
    },
    /// Return from the current interruption
    Back,
    /// End the active session
    End,
    /// Resume a completed session by index
    Resume { index: usize },
    /// Change the description of the active session
    Rename { description: String },
    /// Delete a session by index
    Delete { index: usize },
    /// List today's sessions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(ctx: &Context, action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut tracker = Tracker::open(ctx.storage()?)?;
    let now = Local::now();

    match action {
        SessionAction::Start { description } => {
            let index = tracker.start(description, now)?;
            println!("Session {index} started at {}", now.format("%H:%M:%S"));
        }
        SessionAction::Interrupt { tag, description } => {
            let tag = parse_tag(ctx, &tag)?;
            tracker.interrupt(tag.clone(), description, now)?;
            println!("Interrupted ({tag}) at {}", now.format("%H:%M:%S"));
        }
        SessionAction::Back => {
            tracker.return_from_interruption(now)?;
            println!("Back at {}", now.format("%H:%M:%S"));
        }
        SessionAction::End => {
            tracker.end(now)?;
            let totals = tracker.totals(now);
            println!("Session ended. Worked today: {}", format_human(totals.work));
        }
        SessionAction::Resume { index } => {
            tracker.resume(index, now)?;
            println!("Session {index} resumed");
        }
        SessionAction::Rename { description } => {
            tracker.rename(Some(description))?;
            println!("ok");
        }
        SessionAction::Delete { index } => {
            let removed = tracker.delete(index)?;
            println!("Deleted session {index} ({})", removed.id);
        }
        SessionAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(tracker.day())?);
            } else {
                print_day(&tracker);
            }
        }
    }
    Ok(())
}

fn parse_tag(ctx: &Context, raw: &str) -> Result<InterruptionTag, Box<dyn std::error::Error>> {
    let known = InterruptionTag::known(&ctx.config.tracking.custom_interruption_tags);
    match known.iter().find(|tag| tag.as_str().eq_ignore_ascii_case(raw.trim())) {
        Some(tag) => Ok(tag.clone()),
        None => {
            let names: Vec<&str> = known.iter().map(InterruptionTag::as_str).collect();
            Err(format!("unknown tag '{raw}' (known: {})", names.join(", ")).into())
        }
    }
}

fn print_day(tracker: &Tracker) {
    let now = Local::now();
    let day = tracker.day();
    let recovery = tracker.storage().recovery();

    if day.is_empty() {
        println!("No sessions on {}", day.date);
        return;
    }

    for (index, session) in day.display_order() {
        let totals = session_totals(session, now);
        let mut line = format!(
            "[{index}] {} {} {:>8} {} interruption(s)",
            session.start.timestamp.format("%H:%M"),
            status(session, now, recovery.per_interruption()),
            format_clock(totals.work),
            totals.interruptions,
        );
        if let Some(description) = session.description() {
            line.push_str(&format!("  {description}"));
        }
        if session.continued_from_before(day.date) {
            line.push_str("  (continued)");
        }
        println!("{line}");
    }

    let totals = tracker.totals(now);
    println!(
        "Total: worked {}, interrupted {} ({}), recovery {}",
        format_human(totals.work),
        format_human(totals.interruption),
        totals.interruptions,
        format_human(totals.recovery(recovery)),
    );
}

fn status(session: &Session, now: chrono::DateTime<Local>, recovery: chrono::Duration) -> &'static str {
    if !session.is_active() {
        "done       "
    } else if session.is_interrupted() {
        "interrupted"
    } else if session.in_recovery(now, recovery) {
        "recovering "
    } else {
        "active     "
    }
}
