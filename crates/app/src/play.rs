//! Interactive timed quiz on the terminal.

use std::error::Error;
use std::time::Duration;

use quiz_core::TimerToken;
use quiz_core::model::{AttemptSummary, LearnerId, RankTable, RevealedFeedback};
use services::{
    Advance, AppServices, Phase, QuizError, QuizLoopService, QuizServiceError, QuizSession,
    THEME_ALL, TickEvent,
};
use storage::repository::distinct_themes;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

type Input = Lines<BufReader<Stdin>>;

const TICK: Duration = Duration::from_secs(1);
const OPTION_LETTERS: &[u8] = b"ABCDEFGHIJ";

enum Flow {
    Menu,
    Quit,
}

pub async fn run(services: &AppServices, theme: Option<&str>) -> Result<(), Box<dyn Error>> {
    let quiz = services.quiz_loop();
    let learner = services.learner_id();
    let mut session = quiz.open_session(learner).await?;
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut preset = theme.map(str::to_string);

    print_standing(&session);

    loop {
        let theme = match preset.take() {
            Some(theme) => theme,
            None => {
                let themes = distinct_themes(session.bank());
                println!();
                println!("Themes: {THEME_ALL}, {}", themes.join(", "));
                println!("Choose a theme (Enter for {THEME_ALL}, q to quit):");
                let Some(line) = input.next_line().await? else {
                    return Ok(());
                };
                match line.trim() {
                    "q" => return Ok(()),
                    "" => THEME_ALL.to_string(),
                    other => other.to_string(),
                }
            }
        };

        let token = match session.start_attempt(Some(&theme)) {
            Ok(token) => token,
            Err(QuizError::EmptySelection { .. }) => {
                println!("No questions for theme \"{theme}\". Pick another one.");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        let flow = play_attempt(&quiz, learner, &mut session, &mut input, token).await?;
        if matches!(flow, Flow::Quit) {
            return Ok(());
        }
        quiz.refresh_bank(&mut session).await?;
    }
}

async fn play_attempt(
    quiz: &QuizLoopService,
    learner: LearnerId,
    session: &mut QuizSession,
    input: &mut Input,
    mut token: TimerToken,
) -> Result<Flow, Box<dyn Error>> {
    let mut ticker = ticker();
    print_question(session);

    loop {
        match session.phase() {
            Phase::AnswerPending => {
                tokio::select! {
                    _ = ticker.tick() => match session.tick(token) {
                        TickEvent::Counting { remaining } => {
                            if remaining <= 5 || remaining % 5 == 0 {
                                println!("  {remaining}s left");
                            }
                        }
                        TickEvent::Expired(revealed) => {
                            println!("Time is up!");
                            print_feedback(&revealed, session.score());
                        }
                        TickEvent::Ignored => {}
                    },
                    line = input.next_line() => {
                        let Some(line) = line? else {
                            session.leave();
                            return Ok(Flow::Quit);
                        };
                        if line.trim() == "q" {
                            session.leave();
                            return Ok(Flow::Menu);
                        }
                        handle_answer_input(session, line.trim());
                    }
                }
            }
            Phase::Revealed => {
                println!("Press Enter to continue (q to leave)");
                let Some(line) = input.next_line().await? else {
                    session.leave();
                    return Ok(Flow::Quit);
                };
                if line.trim() == "q" {
                    session.leave();
                    return Ok(Flow::Menu);
                }

                match quiz.advance(learner, session).await {
                    Ok(step) => match step.advance {
                        Advance::Next { token: next, .. } => {
                            token = next;
                            ticker.reset();
                            print_question(session);
                        }
                        Advance::Completed(summary) => {
                            print_summary(&summary, session.config().rank_table());
                            return Ok(Flow::Menu);
                        }
                    },
                    Err(QuizServiceError::Storage(err)) => {
                        tracing::warn!(error = %err, "could not save the final score");
                        if let Some(summary) = session.summary() {
                            print_summary(summary, session.config().rank_table());
                        }
                        return Ok(Flow::Menu);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Phase::Idle | Phase::Completed => return Ok(Flow::Menu),
        }
    }
}

fn ticker() -> Interval {
    let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn handle_answer_input(session: &mut QuizSession, line: &str) {
    if line.is_empty() {
        match session.submit() {
            Ok(revealed) => {
                let revealed = revealed.clone();
                print_feedback(&revealed, session.score());
            }
            Err(QuizError::NoOptionSelected) => println!("Pick an option first."),
            Err(err) => tracing::warn!(error = %err, "submit rejected"),
        }
        return;
    }

    let Some(index) = parse_option(line) else {
        println!("Type an option letter or number, then Enter to confirm.");
        return;
    };
    match session.choose(index) {
        Ok(()) => println!(
            "Selected {}. Press Enter to confirm.",
            option_label(index)
        ),
        Err(QuizError::OutOfRangeOption { len, .. }) => {
            println!("Pick one of {}.", option_labels(len));
        }
        Err(err) => tracing::warn!(error = %err, "choice rejected"),
    }
}

/// Accepts `B`, `b` or `2` for the second option.
fn parse_option(line: &str) -> Option<usize> {
    if let Ok(number) = line.parse::<usize>() {
        return number.checked_sub(1);
    }
    let mut chars = line.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return None;
    };
    let upper = letter.to_ascii_uppercase();
    OPTION_LETTERS.iter().position(|&l| char::from(l) == upper)
}

fn option_label(index: usize) -> String {
    OPTION_LETTERS
        .get(index)
        .map_or_else(|| (index + 1).to_string(), |&l| char::from(l).to_string())
}

fn option_labels(len: usize) -> String {
    (0..len).map(option_label).collect::<Vec<_>>().join(", ")
}

fn print_standing(session: &QuizSession) {
    let score = session.score();
    let ranks = session.config().rank_table();
    println!("Score: {score}  Rank: {}", ranks.rank_for(score).label);
    for line in ladder_lines(ranks, score) {
        println!("{line}");
    }
}

/// The whole ladder, marking the ranks already reached.
fn ladder_lines(ranks: &RankTable, score: u32) -> Vec<String> {
    ranks
        .entries()
        .iter()
        .map(|entry| {
            let mark = if entry.is_reached(score) { "x" } else { " " };
            format!("  [{mark}] {:>3}  {}", entry.threshold_score, entry.label)
        })
        .collect()
}

fn print_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    println!();
    println!(
        "[{}/{}] {}  ({}s)",
        session.position() + 1,
        session.total_questions(),
        question.prompt(),
        session.remaining_seconds()
    );
    for (index, option) in question.options().iter().enumerate() {
        println!("  {}) {option}", option_label(index));
    }
}

fn print_feedback(revealed: &RevealedFeedback, score: u32) {
    println!();
    println!("{}", revealed.title);
    println!("{}", revealed.text);
    if let Some(illustration) = &revealed.illustration_ref {
        println!("(illustration: {illustration})");
    }
    println!("Score: {score}");
}

fn print_summary(summary: &AttemptSummary, ranks: &RankTable) {
    let progress = ranks.progress(summary.final_score());
    println!();
    println!(
        "Attempt complete: {}/{} correct. Score {} -> {}.",
        summary.correct(),
        summary.total_questions(),
        summary.starting_score(),
        summary.final_score()
    );
    println!("Rank: {}", summary.rank().label);
    match &progress.next {
        Some(next) => println!(
            "{} more to reach {} ({}% of the way).",
            progress.points_to_next, next.label, progress.percent
        ),
        None => println!("Top of the ladder."),
    }
}
