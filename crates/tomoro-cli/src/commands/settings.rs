use clap::Subcommand;
use tomoro_core::{Config, Database, SettingsStore, SettingsUpdate};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Current settings and pomodoro counter
    Show,
    /// Update settings; omitted fields keep their value
    Set {
        /// Work duration in minutes (1-90)
        #[arg(long)]
        work: Option<u32>,
        /// Short break duration in minutes (1-30)
        #[arg(long)]
        short_break: Option<u32>,
        /// Long break duration in minutes (1-60)
        #[arg(long)]
        long_break: Option<u32>,
    },
}

pub fn run(user_id: i64, action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let store = SettingsStore::new(&db, config.timer);

    match action {
        SettingsAction::Show => {
            let settings = store.get(user_id)?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Set {
            work,
            short_break,
            long_break,
        } => {
            let settings = store.update(
                user_id,
                &SettingsUpdate {
                    work_minutes: work,
                    break_minutes: short_break,
                    long_break_minutes: long_break,
                },
            )?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}
