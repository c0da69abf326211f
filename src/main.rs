use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::json;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use lecture_qa::analytics::{
    self, Snapshot, lecture_performance, question_overview, recommendations, student_progress,
};
use lecture_qa::config::DEFAULT_CONFIG_FILE;
use lecture_qa::db::init_db;
use lecture_qa::db::lecture::{NewLecture, delete_lecture, get_lecture};
use lecture_qa::db::question::{
    QuestionFilter, QuestionUpdate, delete_question, get_question, list_questions, update_question,
};
use lecture_qa::difficulty::{suggest_adjustments, target_distribution, validate_balance};
use lecture_qa::models::DifficultyDistribution;
use lecture_qa::pipeline::register_upload;
use lecture_qa::ui::{ViewerAction, ViewerState, draw_viewer};
use lecture_qa::{
    Config, DifficultyTier, JsonSlideSource, OpenRouterClient, QaError, QuestionGenerator,
    QuestionType, SlideContentSource, Submission, logger, spawn_processing, submit_answer,
};

#[derive(Parser)]
#[command(name = "lecture-qa", version, about = "Question generation and answer analytics for lecture slides")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register extracted slides as a lecture and generate its questions
    Ingest {
        slides: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        author: Option<String>,
        #[arg(long)]
        subject: Option<String>,
    },
    /// List stored questions
    Questions {
        #[arg(long)]
        lecture: Option<i64>,
        #[arg(long)]
        difficulty: Option<DifficultyTier>,
        #[arg(long = "type")]
        question_type: Option<QuestionType>,
        /// Print bank statistics instead of the questions
        #[arg(long)]
        stats: bool,
    },
    /// Grade and record a student's answer
    Answer {
        question_id: i64,
        #[arg(long)]
        student: String,
        #[arg(long)]
        response: String,
        /// Seconds taken
        #[arg(long)]
        time: Option<u32>,
        /// 1 to 5
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        confidence: Option<u8>,
    },
    /// Edit a stored question; omitted fields keep their current value
    EditQuestion {
        id: i64,
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        answer: Option<String>,
        #[arg(long)]
        explanation: Option<String>,
        /// Expected answer time in seconds
        #[arg(long)]
        estimated_time: Option<u32>,
    },
    DeleteQuestion {
        id: i64,
    },
    /// Delete a lecture with its questions and responses
    DeleteLecture {
        id: i64,
    },
    Dashboard,
    Lecture {
        id: i64,
    },
    Student {
        id: String,
    },
    Recommend {
        #[arg(long)]
        lecture: Option<i64>,
        #[arg(long)]
        student: Option<String>,
    },
    /// Compare a lecture's difficulty mix with the configured ratio
    Balance {
        #[arg(long)]
        lecture: i64,
    },
    /// Interactive dashboard
    View,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_db(config: &Config) -> Result<Connection> {
    let path = config.database_path();
    init_db(&path).with_context(|| format!("Failed to open database at {}", path.display()))
}

fn load_snapshot(conn: &Connection) -> Result<Snapshot> {
    Snapshot::load(conn).context("Failed to load analytics data")
}

async fn ingest(config: &Config, slides_path: &Path, lecture: NewLecture) -> Result<()> {
    let source = JsonSlideSource::new(slides_path);
    // Fail before registering anything if the file is unusable.
    source
        .slides(0)
        .with_context(|| format!("Failed to read slides from {}", slides_path.display()))?;

    let conn = open_db(config)?;
    let lecture_id = register_upload(&conn, &lecture)?;
    println!("Registered lecture {} ({})", lecture_id, lecture.title);

    let client = OpenRouterClient::new(config.model_config())
        .context("Failed to create OpenRouter client")?;
    let generator = QuestionGenerator::new(Arc::new(client))
        .with_choice_enforcement(config.enforce_choice_match);

    let handle = spawn_processing(
        Arc::new(Mutex::new(conn)),
        lecture_id,
        Arc::new(source),
        generator,
        config.pipeline_settings(),
    );
    let summary = handle
        .await
        .context("Processing task panicked")?
        .with_context(|| format!("Processing lecture {} failed", lecture_id))?;
    print_json(&summary)
}

fn balance(conn: &Connection, config: &Config, lecture_id: i64) -> Result<()> {
    get_lecture(conn, lecture_id)?.ok_or_else(|| QaError::not_found("lecture", lecture_id))?;
    let filter = QuestionFilter {
        lecture_id: Some(lecture_id),
        ..QuestionFilter::default()
    };
    let questions = list_questions(conn, &filter)?;
    let report = validate_balance(questions.iter().map(|q| &q.question));

    let count = |tier| report.difficulty_counts.get(&tier).copied().unwrap_or(0);
    let current = DifficultyDistribution::new(
        count(DifficultyTier::Easy),
        count(DifficultyTier::Medium),
        count(DifficultyTier::Hard),
    );
    let target = target_distribution(report.total_questions, &config.difficulty_ratio);

    print_json(&json!({
        "lecture_id": lecture_id,
        "balance": report,
        "target": target,
        "suggestions": suggest_adjustments(&current, &target),
    }))
}

fn edit_question(
    conn: &Connection,
    id: i64,
    text: Option<String>,
    answer: Option<String>,
    explanation: Option<String>,
    estimated_time: Option<u32>,
) -> Result<()> {
    let current = get_question(conn, id)?.ok_or_else(|| QaError::not_found("question", id))?;
    let update = QuestionUpdate {
        question_text: text.unwrap_or(current.question.question),
        correct_answer: answer.unwrap_or(current.question.correct_answer),
        explanation,
        estimated_time,
    };
    if update.question_text.trim().is_empty() {
        bail!("Question text must not be empty");
    }
    update_question(conn, id, &update)?;

    let updated = get_question(conn, id)?.ok_or_else(|| QaError::not_found("question", id))?;
    print_json(&updated)
}

fn run_viewer(conn: &Connection) -> Result<()> {
    let mut state = ViewerState::new(load_snapshot(conn)?, Utc::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|f| draw_viewer(f, &state))?;

            if let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                match state.handle_key(key.code) {
                    ViewerAction::Quit => return Ok(()),
                    ViewerAction::Reload => state.reload(load_snapshot(conn)?, Utc::now()),
                    ViewerAction::Continue => {}
                }
            }
        }
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    logger::init(&config.log_path).context("Failed to open log file")?;

    match cli.command {
        Command::Ingest {
            slides,
            title,
            description,
            author,
            subject,
        } => {
            let file_size = std::fs::metadata(&slides).map(|m| m.len()).unwrap_or(0);
            let original_filename = slides
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let lecture = NewLecture {
                title,
                description,
                original_filename,
                file_size,
                author,
                subject,
            };
            ingest(&config, &slides, lecture).await
        }
        Command::Questions {
            lecture,
            difficulty,
            question_type,
            stats,
        } => {
            let conn = open_db(&config)?;
            if stats {
                return print_json(&question_overview(&load_snapshot(&conn)?));
            }
            let filter = QuestionFilter {
                lecture_id: lecture,
                difficulty,
                question_type,
            };
            print_json(&list_questions(&conn, &filter)?)
        }
        Command::Answer {
            question_id,
            student,
            response,
            time,
            confidence,
        } => {
            if response.trim().is_empty() {
                bail!("Response text must not be empty");
            }
            let conn = open_db(&config)?;
            let submission = Submission {
                student_id: student,
                response_text: response,
                response_time: time,
                confidence_level: confidence,
            };
            let result = submit_answer(&conn, question_id, &submission, Utc::now())
                .with_context(|| format!("Failed to submit answer to question {}", question_id))?;
            print_json(&result)
        }
        Command::EditQuestion {
            id,
            text,
            answer,
            explanation,
            estimated_time,
        } => {
            let conn = open_db(&config)?;
            edit_question(&conn, id, text, answer, explanation, estimated_time)
        }
        Command::DeleteQuestion { id } => {
            let conn = open_db(&config)?;
            if !delete_question(&conn, id)? {
                return Err(QaError::not_found("question", id).into());
            }
            println!("Deleted question {}", id);
            Ok(())
        }
        Command::DeleteLecture { id } => {
            let conn = open_db(&config)?;
            if !delete_lecture(&conn, id)? {
                return Err(QaError::not_found("lecture", id).into());
            }
            println!("Deleted lecture {} and its questions", id);
            Ok(())
        }
        Command::Dashboard => {
            let conn = open_db(&config)?;
            print_json(&analytics::dashboard(&load_snapshot(&conn)?, Utc::now()))
        }
        Command::Lecture { id } => {
            let conn = open_db(&config)?;
            print_json(&lecture_performance(&load_snapshot(&conn)?, id)?)
        }
        Command::Student { id } => {
            let conn = open_db(&config)?;
            print_json(&student_progress(&load_snapshot(&conn)?, &id))
        }
        Command::Recommend { lecture, student } => {
            let conn = open_db(&config)?;
            let snap = load_snapshot(&conn)?;
            print_json(&json!({
                "recommendations": recommendations(&snap, lecture, student.as_deref()),
            }))
        }
        Command::Balance { lecture } => {
            let conn = open_db(&config)?;
            balance(&conn, &config, lecture)
        }
        Command::View => {
            let conn = open_db(&config)?;
            run_viewer(&conn)
        }
    }
}
