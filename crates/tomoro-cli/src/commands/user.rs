use clap::Subcommand;
use tomoro_core::{Config, Database, SettingsStore};

#[derive(Subcommand)]
pub enum UserAction {
    /// Register a new user seeded with the configured default durations
    Add {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
    },
}

pub fn run(action: UserAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let db = Database::open()?;
    let store = SettingsStore::new(&db, config.timer);

    match action {
        UserAction::Add { email, name } => {
            let user_id = store.register_user(&email, &name)?;
            println!("{}", serde_json::json!({ "user_id": user_id }));
        }
    }

    Ok(())
}
