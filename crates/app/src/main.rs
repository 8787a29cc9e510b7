use std::fmt;

use quiz_core::model::{LearnerId, Question, QuestionDraft, QuestionId};
use services::{AppServices, Clock};
use tracing_subscriber::{EnvFilter, fmt as log_fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    InvalidLearnerId { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}> argument"),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Themes,
    Learners,
    Questions,
    Upload,
    Delete,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "themes" => Some(Self::Themes),
            "learners" => Some(Self::Learners),
            "questions" => Some(Self::Questions),
            "upload" => Some(Self::Upload),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    learner_id: LearnerId,
    theme: Option<String>,
    questions_url: Option<String>,
    /// Positional operand of `upload` (file path) and `delete` (question id).
    operand: Option<String>,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [play]   [options]           # timed quiz in the terminal");
    eprintln!("  cargo run -p app -- themes   [options]           # list themes of the bank");
    eprintln!("  cargo run -p app -- learners [options]           # instructor report");
    eprintln!("  cargo run -p app -- questions [options]          # stored questions with their ids");
    eprintln!("  cargo run -p app -- upload <questions.json> [options]");
    eprintln!("  cargo run -p app -- delete <question-id> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite://quiz.sqlite3)");
    eprintln!("  --learner <id>            Learner id (default: 1)");
    eprintln!("  --theme <theme>           Theme to play, or \"all\" (play asks when omitted)");
    eprintln!("  --questions-url <url>     Fetch the question bank over HTTP instead of the database");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_LEARNER_ID, QUIZ_QUESTIONS_URL, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("quiz.sqlite3".into()), normalize_sqlite_url);
        let mut learner_id = std::env::var("QUIZ_LEARNER_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| LearnerId::new(1), LearnerId::new);
        let mut questions_url = std::env::var("QUIZ_QUESTIONS_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());
        let mut theme = None;
        let mut operand = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--learner" => {
                    let value = require_value(args, "--learner")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLearnerId { raw: value.clone() })?;
                    learner_id = LearnerId::new(parsed);
                }
                "--theme" => theme = Some(require_value(args, "--theme")?),
                "--questions-url" => questions_url = Some(require_value(args, "--questions-url")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if !arg.starts_with("--") && operand.is_none() => operand = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            learner_id,
            theme,
            questions_url,
            operand,
        })
    }

    fn require_operand(&self, name: &'static str) -> Result<&str, ArgsError> {
        self.operand
            .as_deref()
            .ok_or(ArgsError::MissingArgument { name })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// One row of the `questions` listing: id, theme and prompt.
fn question_line(question: &Question) -> String {
    format!(
        "{:<12} {:<16} {}",
        question.id().as_str(),
        question.theme(),
        question.prompt()
    )
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Quiz output owns stdout.
    let stderr_layer = log_fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        Clock::default(),
        parsed.learner_id,
        parsed.questions_url.as_deref(),
    )
    .await?;

    match cmd {
        Command::Play => play::run(&services, parsed.theme.as_deref()).await,
        Command::Themes => {
            for theme in services.quiz_loop().themes().await? {
                println!("{theme}");
            }
            Ok(())
        }
        Command::Learners => {
            for entry in services.instructor().learner_report().await? {
                let next = entry.progress.next.as_ref().map_or_else(
                    || "top rank".to_string(),
                    |next| format!("{} to {}", entry.progress.points_to_next, next.label),
                );
                println!(
                    "{:>4}  {:<20} {:>4}  {} ({next})",
                    entry.id.value(),
                    entry.name,
                    entry.score,
                    entry.progress.current.label
                );
            }
            Ok(())
        }
        Command::Questions => {
            for question in services.instructor().list_questions().await? {
                println!("{}", question_line(&question));
            }
            Ok(())
        }
        Command::Upload => {
            let path = parsed.require_operand("questions.json")?;
            let raw = std::fs::read_to_string(path)?;
            let drafts: Vec<QuestionDraft> = serde_json::from_str(&raw)?;
            let stored = services.instructor().upload_question_set(drafts).await?;
            println!("Uploaded {} questions from {path}", stored.len());
            Ok(())
        }
        Command::Delete => {
            let id = QuestionId::new(parsed.require_operand("question-id")?)?;
            services.instructor().delete_question(&id).await?;
            println!("Deleted question {id}");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_logging();
    if let Err(err) = run().await {
        tracing::error!(error = %err, "quiz app failed");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Feedback;

    #[test]
    fn question_line_shows_id_theme_and_prompt() {
        let question = QuestionDraft {
            id: "q7".into(),
            theme: "capoeira".into(),
            prompt: "Who leads the roda?".into(),
            options: vec!["Mestre".into(), "Aluno".into()],
            correct_option_index: 0,
            feedback: Feedback::default(),
        }
        .validate()
        .unwrap();

        let line = question_line(&question);
        assert!(line.starts_with("q7 "));
        assert!(line.contains("capoeira"));
        assert!(line.ends_with("Who leads the roda?"));
    }

    #[test]
    fn questions_is_a_known_subcommand() {
        assert_eq!(Command::from_arg("questions"), Some(Command::Questions));
    }
}
