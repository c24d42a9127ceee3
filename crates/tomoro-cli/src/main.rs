use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tomoro-cli", version, about = "Tomoro pomodoro backend CLI")]
struct Cli {
    /// Acting user id. In a deployed setup this comes from the auth layer;
    /// the CLI trusts it opaquely.
    #[arg(long, global = true, default_value_t = 1)]
    user: i64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Per-user timer settings
    Settings {
        #[command(subcommand)]
        action: commands::settings::SettingsAction,
    },
    /// Focus statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// User management
    User {
        #[command(subcommand)]
        action: commands::user::UserAction,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(cli.user, action),
        Commands::Settings { action } => commands::settings::run(cli.user, action),
        Commands::Stats { action } => commands::stats::run(cli.user, action),
        Commands::User { action } => commands::user::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
