mod commands;
mod db;

use clap::{Parser, Subcommand};
use onboard_core::model::{EmployeeId, QuizType, UserId};
use services::{Clock, OnboardingServices};

#[derive(Parser)]
#[command(
    name = "onboard",
    about = "Track new-hire onboarding through eight steps",
    version,
    propagate_version = true
)]
struct Cli {
    /// Database location: a sqlite URL or a file path
    #[arg(long, global = true, env = "ONBOARD_DB_URL", default_value = db::DEFAULT_DB_URL)]
    db: String,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start onboarding for a user (no-op if already started)
    Start {
        #[arg(value_parser = parse_user)]
        user: UserId,
        name: String,
    },

    /// Show the user's current step
    Step {
        #[arg(value_parser = parse_user)]
        user: UserId,
    },

    /// Show the user's per-step progress
    Progress {
        #[arg(value_parser = parse_user)]
        user: UserId,
    },

    /// Mark a checkbox step done
    Complete {
        #[arg(value_parser = parse_user)]
        user: UserId,
        step: u8,
    },

    /// Record a raw step fact
    Record {
        #[arg(value_parser = parse_user)]
        user: UserId,
        step: u8,
        /// Record the step as not done
        #[arg(long)]
        not_done: bool,
        /// Quiz score for steps 3 and 4
        #[arg(long)]
        score: Option<u32>,
    },

    /// Answer one quiz question
    Answer {
        #[arg(value_parser = parse_user)]
        user: UserId,
        quiz: QuizType,
        question: usize,
        option: usize,
    },

    /// Submit a full quiz answer sheet
    Submit {
        #[arg(value_parser = parse_user)]
        user: UserId,
        quiz: QuizType,
        #[arg(required = true)]
        answers: Vec<usize>,
    },

    /// Team onboarding dashboard
    Dashboard,

    /// Aggregate onboarding analytics
    Analytics,

    /// One employee's record and quiz attempts
    Employee { employee_id: String },

    /// Manage demo employees
    Demo {
        #[command(subcommand)]
        subcommand: DemoSubcommand,
    },
}

#[derive(Subcommand)]
enum DemoSubcommand {
    /// Create the demo employees
    Seed,
    /// Delete the demo employees
    Clear,
}

fn parse_user(raw: &str) -> Result<UserId, String> {
    UserId::from_mention(raw).ok_or_else(|| "user id must not be empty".to_owned())
}

/// Log filter used when `RUST_LOG` is unset or invalid.
fn default_directive(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "info" }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db_url = db::normalize_sqlite_url(&cli.db);
    db::prepare_sqlite_file(&db_url)?;
    let services = OnboardingServices::sqlite(&db_url, Clock::system()).await?;
    let json = cli.json;

    match cli.command {
        Commands::Start { user, name } => commands::start(&services, &user, &name, json).await,
        Commands::Step { user } => commands::step(&services, &user, json).await,
        Commands::Progress { user } => commands::progress(&services, &user, json).await,
        Commands::Complete { user, step } => commands::complete(&services, &user, step, json).await,
        Commands::Record {
            user,
            step,
            not_done,
            score,
        } => commands::record(&services, &user, step, !not_done, score, json).await,
        Commands::Answer {
            user,
            quiz,
            question,
            option,
        } => commands::answer(&services, &user, quiz, question, option, json).await,
        Commands::Submit {
            user,
            quiz,
            answers,
        } => commands::submit(&services, &user, quiz, &answers, json).await,
        Commands::Dashboard => commands::dashboard(&services, json).await,
        Commands::Analytics => commands::analytics(&services, json).await,
        Commands::Employee { employee_id } => {
            commands::employee(&services, &EmployeeId::new(employee_id), json).await
        }
        Commands::Demo { subcommand } => match subcommand {
            DemoSubcommand::Seed => commands::demo_seed(&services, json).await,
            DemoSubcommand::Clear => commands::demo_clear(&services, json).await,
        },
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive(cli.verbose))),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli).await {
        tracing::error!(error = %err, "command failed");
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
}
