use activity_roster::{AppConfig, SignupPolicy, load_activities, load_credentials};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "activity-roster")]
#[command(about = "Extracurricular activity catalog with teacher-gated rosters")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the roster HTTP API
    Serve {
        /// Bind address, e.g. 0.0.0.0:8000
        #[arg(long, env = "ROSTER_BIND", default_value = "127.0.0.1:8000")]
        bind: String,
        /// Activity seed file (defaults to activities.json or the built-in catalog)
        #[arg(long, env = "ROSTER_ACTIVITIES")]
        activities: Option<PathBuf>,
        /// Teacher credentials file (defaults to teachers.json)
        #[arg(long, env = "ROSTER_TEACHERS")]
        teachers: Option<PathBuf>,
        /// Who may sign students up: `open` or `teacher`
        #[arg(long, env = "ROSTER_SIGNUP_POLICY", default_value = "open")]
        signup_policy: SignupPolicy,
    },
    /// Print the activity catalog that `serve` would start with
    ListActivities {
        #[arg(long, env = "ROSTER_ACTIVITIES")]
        activities: Option<PathBuf>,
    },
    /// Validate the teachers file and list its usernames
    CheckTeachers {
        #[arg(long, env = "ROSTER_TEACHERS")]
        teachers: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("activity_roster=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .with_max_level(Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            activities,
            teachers,
            signup_policy,
        } => {
            info!("Starting activity roster on {}", bind);

            let config = AppConfig {
                activities_path: activities,
                teachers_path: teachers,
                signup_policy,
            };

            activity_roster::run(config, &bind).await?;
        }
        Commands::ListActivities { activities } => {
            let list = load_activities(activities.as_deref())?;

            if list.is_empty() {
                println!("No activities configured.");
                return Ok(());
            }

            println!("{:<22} {:<8} {:<45}", "ACTIVITY", "ENROLLED", "SCHEDULE");
            println!("{}", "-".repeat(80));

            for (name, activity) in list.iter() {
                println!(
                    "{:<22} {:<8} {:<45}",
                    name.as_str(),
                    format!("{}/{}", activity.participants.len(), activity.max_participants),
                    activity.schedule
                );
            }
        }
        Commands::CheckTeachers { teachers } => {
            let store = load_credentials(teachers.as_deref())?;

            if store.is_empty() {
                println!("No teacher accounts configured.");
                return Ok(());
            }

            println!("{} teacher account(s):", store.len());
            for username in store.usernames() {
                println!("  {}", username);
            }
        }
    }

    Ok(())
}
