//! Operator CLI: import word lists, inspect levels and results, try a quiz

use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use kelime_core::{
    extract_file, ingest, logging, start_session_with, Direction, Level, OutcomeKind, ResultFilter, ResultWindow,
    Settings, SqliteStore, VocabularyStore,
};

#[derive(Parser)]
#[command(name = "kelime", about = "Turkish-Uzbek vocabulary store and quiz engine")]
struct Cli {
    /// Database file
    #[arg(long, global = true, env = "KELIME_DB_PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import word-list files (.txt, .docx, .xlsx, .csv) into a level
    Import {
        #[arg(long)]
        level: Level,
        #[arg(long)]
        topic: Option<String>,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Word counts per level
    Levels,
    /// Run a quiz in the terminal (`:skip`, `:pass`)
    Quiz {
        #[arg(long)]
        level: Level,
        #[arg(long, default_value = "tr_to_uz")]
        direction: Direction,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Stored quiz results
    Results {
        #[arg(long)]
        level: Option<Level>,
        #[arg(long, default_value = "all")]
        window: ResultWindow,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> kelime_core::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;
    logging::init_tracing(&settings.log_level);

    let store = SqliteStore::open(cli.db.clone().unwrap_or_else(|| settings.db_path.clone()))?;

    match cli.command {
        Command::Import { level, topic, files } => {
            for path in files {
                let lines = extract_file(&path)?;
                let report = ingest(&store, lines, level, topic.as_deref())?;
                println!(
                    "{}: {} accepted, {} merged, {} duplicate, {} rejected",
                    path.display(),
                    report.accepted,
                    report.merged,
                    report.duplicates,
                    report.rejected.len()
                );
                for rejection in &report.rejected {
                    println!("  {}", rejection);
                }
            }
        }
        Command::Levels => {
            for count in store.level_counts()? {
                println!("{}\t{}", count.level, count.word_count);
            }
        }
        Command::Quiz { level, direction, limit } => {
            let mut options = settings.session_options();
            if limit.is_some() {
                options.limit = limit;
            }
            run_quiz(&store, level, direction, options)?;
        }
        Command::Results { level, window } => {
            let filter = ResultFilter {
                level,
                window,
                ..ResultFilter::default()
            };
            for result in store.list_results(&filter)? {
                println!(
                    "{}\tlearner {}\t{} {}\t{}/{} ({}%)",
                    result.finished_at.format("%Y-%m-%d %H:%M"),
                    result.learner_id,
                    result.level,
                    result.direction,
                    result.score,
                    result.total,
                    result.percent()
                );
            }
        }
    }
    Ok(())
}

fn run_quiz<S: VocabularyStore>(
    store: &S,
    level: Level,
    direction: Direction,
    options: kelime_core::SessionOptions,
) -> kelime_core::Result<()> {
    let mut session = start_session_with(store, level, direction, options)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();

    while let Some(prompt) = session.current_prompt() {
        let progress = session.current_state();
        print!("#{}/{} {}: ", progress.cursor + 1, progress.total, prompt);
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            println!();
            return Ok(());
        }

        let outcome = match line.trim() {
            ":skip" => session.skip()?,
            ":pass" => session.no_answer()?,
            answer => session.submit_answer(answer)?,
        };
        match outcome.kind {
            OutcomeKind::Correct => println!("  correct"),
            OutcomeKind::Incorrect => match &outcome.near_miss {
                Some(near) => println!("  almost: {} ({} characters off)", near.expected, near.distance),
                None => println!("  wrong: {}", outcome.expected.join(" / ")),
            },
            OutcomeKind::Skipped | OutcomeKind::NoAnswer => println!("  answer: {}", outcome.expected.join(" / ")),
        }
    }

    let summary = session.finish_summary()?;
    println!(
        "score {} / {} ({}%), wrong {}, skipped {}, no answer {}",
        summary.score,
        summary.total,
        summary.percent(),
        summary.wrong,
        summary.skipped,
        summary.no_answer
    );
    Ok(())
}
