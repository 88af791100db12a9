// src/bin/exam_cli.rs
//
// Terminal front-end: take an exam against a running server or browse results.

use std::{process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use exam_portal::{
    client::{ExamBackend, HttpBackend},
    error::AppError,
    models::exam_result::SubmitResultRequest,
    session::{ExamController, PackageSize, Submission, timer::format_clock},
    store::view::{ResultsQuery, build_page, filter_exam_names},
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[clap(about = "Take exams and browse results from the terminal")]
struct CliArgs {
    /// Base URL of the exam server
    #[clap(short, long, env = "EXAM_SERVER", default_value = "http://localhost:80")]
    server: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List available exams
    List {
        /// Only show exams whose name contains this text
        #[clap(short, long)]
        search: Option<String>,
    },
    /// Take an exam
    Take {
        /// Exam name, as shown by `list`
        exam: String,

        /// Candidate name (prompted for when omitted)
        #[clap(short, long)]
        name: Option<String>,

        /// Package size: small (10), mid (25) or large (50 questions)
        #[clap(short, long, default_value = "small")]
        package: PackageSize,
    },
    /// Browse recorded results, newest first
    Results {
        /// Search by exam ID, candidate or exam name
        #[clap(short, long)]
        search: Option<String>,

        #[clap(short, long, default_value_t = 1)]
        page: usize,
    },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let backend: Arc<dyn ExamBackend> = Arc::new(HttpBackend::new(&args.server));

    let outcome = match args.command {
        Command::List { search } => list(backend.as_ref(), search.as_deref()).await,
        Command::Results { search, page } => {
            results(backend.as_ref(), ResultsQuery { q: search, page: Some(page) }).await
        }
        Command::Take {
            exam,
            name,
            package,
        } => take(backend, &exam, name, package).await,
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn list(backend: &dyn ExamBackend, search: Option<&str>) -> Result<(), AppError> {
    let exams = backend.list_exams().await?;
    let shown = filter_exam_names(&exams, search.unwrap_or(""));

    println!("Showing {} of {} exams", shown.len(), exams.len());
    if shown.is_empty() {
        println!("No exams found. Try adjusting your search terms.");
    }
    for exam in shown {
        println!("  {}", exam.to_uppercase());
    }
    Ok(())
}

async fn results(backend: &dyn ExamBackend, query: ResultsQuery) -> Result<(), AppError> {
    let records = backend.list_results().await?;
    if records.is_empty() {
        println!("No exam results have been recorded yet.");
        return Ok(());
    }

    let page = build_page(records, &query);
    println!(
        "Showing {} of {} results (Page {} of {})",
        page.results.len(),
        page.total_filtered,
        page.page,
        page.total_pages
    );
    for record in &page.results {
        let r = &record.attempt;
        println!();
        println!(
            "{} [{}]",
            r.exam_name.to_uppercase(),
            if r.passed { "PASSED" } else { "FAILED" }
        );
        println!("  Exam ID:   {}", r.exam_identifier);
        println!("  Candidate: {}", r.candidate);
        println!(
            "  Score:     {}/{} ({}%)",
            r.score, r.total_questions, r.percentage
        );
        println!("  Duration:  {} minutes", r.duration);
        println!("  Date:      {}", record.timestamp.format("%Y-%m-%d %H:%M"));
    }
    if page.total_filtered == 0 {
        println!("No matching results found.");
    }
    Ok(())
}

async fn prompt(input: &mut Input, message: &str) -> Result<Option<String>, AppError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(message.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}

async fn take(
    backend: Arc<dyn ExamBackend>,
    exam: &str,
    name: Option<String>,
    package: PackageSize,
) -> Result<(), AppError> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let candidate = match name {
        Some(name) => name,
        None => prompt(&mut input, "Your name: ").await?.unwrap_or_default(),
    };

    let mut controller = ExamController::new(backend);
    controller.select_exam(exam).await?;
    if let Err(e) = controller.start_exam(&candidate, package).await {
        eprintln!("Failed to load exam questions. Please try again.");
        return Err(e);
    }

    {
        let session = controller.session();
        let session = session.lock().await;
        println!();
        println!("{} Exam", exam.to_uppercase());
        println!("Exam ID: {}", session.exam_identifier());
        println!(
            "{} questions, {} allowed. Commands: 1-9 answer, n next, p previous, s submit, q quit",
            session.question_count(),
            format_clock(session.time_budget().as_secs())
        );
    }

    loop {
        render_question(&controller).await;

        let line = tokio::select! {
            submission = controller.expired() => {
                println!();
                println!("Time is up! Your exam has been submitted automatically.");
                print_summary(&submission);
                return Ok(());
            }
            line = prompt(&mut input, "> ") => line?,
        };

        let Some(command) = line else {
            // stdin closed: submit what we have
            if let Some(submission) = controller.submit().await {
                print_summary(&submission);
            }
            return Ok(());
        };

        let session = controller.session();
        match command.trim() {
            "n" => {
                if !session.lock().await.next() {
                    println!("This is the last question. Use 's' to submit.");
                }
            }
            "p" => {
                session.lock().await.previous();
            }
            "s" => {
                if let Some(submission) = controller.submit().await {
                    print_summary(&submission);
                }
                return Ok(());
            }
            "q" => {
                controller.leave().await;
                println!("Exam abandoned. Nothing was recorded.");
                return Ok(());
            }
            other => {
                let mut session = session.lock().await;
                let choice = other
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| session.current_question().and_then(|q| q.options.get(i)))
                    .cloned();
                match choice {
                    Some(option) => session.answer_current(&option),
                    None => println!("Unknown command '{}'", other),
                }
            }
        }
    }
}

async fn render_question(controller: &ExamController) {
    let session = controller.session();
    let session = session.lock().await;
    let Some(question) = session.current_question() else {
        return;
    };

    let remaining = controller.remaining_seconds();
    let warning = if remaining < 300 { "  (hurry up!)" } else { "" };

    println!();
    println!(
        "Question {}/{}    Time remaining: {}{}",
        session.current_index() + 1,
        session.question_count(),
        format_clock(remaining),
        warning
    );
    println!("{}", question.question);
    if let Some(url) = question.image_url() {
        println!("[reference image: {}]", url);
    }
    for (i, option) in question.options.iter().enumerate() {
        let marker = if session.selected_answer() == Some(option.as_str()) {
            "*"
        } else {
            " "
        };
        println!(" {}{}. {}", marker, i + 1, option);
    }
    if session.is_last() {
        println!("(last question: 's' to submit)");
    }
}

fn print_summary(submission: &Submission) {
    let r: &SubmitResultRequest = &submission.attempt;

    println!();
    println!("Score: {}/{}", r.score, r.total_questions);
    println!("Exam ID: {}", r.exam_identifier);
    println!("Percentage: {}%", r.percentage);
    println!("Time taken: {} minutes", r.duration);
    println!("Status: {}", if r.passed { "PASSED" } else { "FAILED" });
    println!(
        "Note: Please save your Exam ID ({}) for future reference to retrieve your results.",
        r.exam_identifier
    );

    println!();
    println!("Question Review");
    for (i, answer) in r.answers.iter().enumerate() {
        println!();
        println!(
            "Question {} [{}]",
            i + 1,
            if answer.is_correct { "correct" } else { "incorrect" }
        );
        println!("  Q: {}", answer.question);
        println!(
            "  Your Answer: {}",
            answer.selected_answer.as_deref().unwrap_or("Not answered")
        );
        if !answer.is_correct {
            println!("  Correct Answer: {}", answer.correct_answer);
        }
        if let Some(explanation) = &answer.explanation {
            println!("  Explanation: {}", explanation);
        }
    }

    if let Err(e) = &submission.persisted {
        eprintln!();
        eprintln!("Warning: your result could not be saved on the server: {}", e);
    }
}
