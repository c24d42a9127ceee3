use clap::Subcommand;
use tomoro_core::{Config, Database, TimerEngine, TimerKind};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Show the active timer with its countdown
    Status,
    /// Start a timer; the kind is resolved from the cycle when omitted
    Start {
        /// work, short_break or long_break
        #[arg(long)]
        kind: Option<TimerKind>,
    },
    /// Interrupt the active timer
    Stop,
    /// Complete the active timer naturally
    Complete,
    /// Show cycle position and the upcoming timer kind
    Sequence,
    /// Reset the pomodoro counter to zero (history is preserved)
    ResetCounter {
        /// Required; the reset is irreversible
        #[arg(long)]
        confirm: bool,
    },
}

pub fn run(user_id: i64, action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let engine = TimerEngine::new(&db, config.stats);

    match action {
        TimerAction::Status => match engine.active(user_id)? {
            Some(active) => println!("{}", serde_json::to_string_pretty(&active)?),
            None => println!("{}", serde_json::json!({ "message": "no active timer" })),
        },
        TimerAction::Start { kind } => {
            let started = engine.start(user_id, kind)?;
            println!("{}", serde_json::to_string_pretty(&started)?);
        }
        TimerAction::Stop => {
            let stopped = engine.stop(user_id)?;
            println!("{}", serde_json::to_string_pretty(&stopped)?);
        }
        TimerAction::Complete => {
            let completed = engine.complete(user_id)?;
            println!("{}", serde_json::to_string_pretty(&completed)?);
        }
        TimerAction::Sequence => {
            let info = engine.sequence_info(user_id)?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
        TimerAction::ResetCounter { confirm } => {
            if !confirm {
                return Err("refusing to reset the pomodoro counter without --confirm".into());
            }
            let count = engine.reset_counter(user_id)?;
            println!("{}", serde_json::json!({ "pomodoro_count": count }));
        }
    }

    Ok(())
}
