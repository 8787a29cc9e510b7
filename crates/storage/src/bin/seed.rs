use std::fmt;

use quiz_core::model::LearnerId;
use storage::fallback::demo_questions;
use storage::repository::{LearnerRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    learner_id: LearnerId,
    learner_name: String,
    with_demo_questions: bool,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidLearnerId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidLearnerId { raw } => write!(f, "invalid --learner value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("QUIZ_DB_URL").unwrap_or_else(|_| "sqlite:quiz.sqlite3?mode=rwc".into());
        let mut learner_id = std::env::var("QUIZ_LEARNER_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| LearnerId::new(1), LearnerId::new);
        let mut learner_name =
            std::env::var("QUIZ_LEARNER_NAME").unwrap_or_else(|_| "Learner".into());
        let mut with_demo_questions = true;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--learner" => {
                    let value = require_value(&mut args, "--learner")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLearnerId { raw: value.clone() })?;
                    learner_id = LearnerId::new(parsed);
                }
                "--name" => {
                    learner_name = require_value(&mut args, "--name")?;
                }
                "--no-questions" => with_demo_questions = false,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            learner_id,
            learner_name,
            with_demo_questions,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:quiz.sqlite3?mode=rwc)");
    eprintln!("  --learner <id>            Learner id to upsert (default: 1)");
    eprintln!("  --name <name>             Learner display name (default: Learner)");
    eprintln!("  --no-questions            Skip loading the demonstration questions");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  QUIZ_DB_URL, QUIZ_LEARNER_ID, QUIZ_LEARNER_NAME");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;

    let learner = match storage.learners.get_learner(args.learner_id).await? {
        Some(mut existing) => {
            existing.name = args.learner_name.clone();
            existing
        }
        None => LearnerRecord::new(args.learner_id, args.learner_name.clone()),
    };
    storage.learners.upsert_learner(&learner).await?;

    let mut seeded = 0_usize;
    if args.with_demo_questions {
        for question in demo_questions()? {
            storage.questions.upsert_question(&question).await?;
            seeded += 1;
        }
    }

    println!(
        "Seeded learner {} ({}) and {} questions into {}",
        learner.id, learner.name, seeded, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
