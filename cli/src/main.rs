#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    process,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::{
    prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use ::meti::{
    catalog::{COMMITTEES, EXAMPLE_QUESTIONS, TEST_QUERIES},
    Config, PromptKind, Query, QueryResult, Rag, Session, DEFAULT_K, MAX_K, MIN_K,
};

const PREVIEW_CHARS: usize = 300;
const RULE: &str = "====================================================================================================";

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask questions about the 2025 METI committee meetings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Answer a single question.
    Ask {
        question: String,
        #[arg(short, long, default_value_t = PromptKind::Comprehensive)]
        prompt: PromptKind,
        #[arg(short, default_value_t = DEFAULT_K)]
        k: usize,
    },
    /// Run a list of questions, one per line, or the built-in test suite.
    Batch {
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long, default_value_t = PromptKind::Comprehensive)]
        prompt: PromptKind,
        #[arg(short, default_value_t = DEFAULT_K)]
        k: usize,
    },
    /// Ask questions in a loop.
    Interactive,
    /// List the committees covered by the index.
    Committees,
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "cli=info,meti=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Ask { question, prompt, k } => {
            let query = Query::new(&question, prompt, k)?;
            let result = connect().await?.execute_query(&query).await?;

            print_result(&query, &result);
        }
        Commands::Batch { file, prompt, k } => {
            let questions = match file {
                Some(path) => read_questions(
                    &fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => TEST_QUERIES.iter().map(ToString::to_string).collect(),
            };

            batch(&connect().await?, &questions, prompt, k).await;
        }
        Commands::Interactive => interactive(&connect().await?).await?,
        Commands::Committees => print_committees(),
    }

    Ok(())
}

async fn connect() -> Result<Rag> {
    let config = Config::from_env()?;

    Ok(Rag::from_config(&config).await?)
}

async fn batch(rag: &Rag, questions: &[String], prompt: PromptKind, k: usize) {
    println!("\nRunning batch test with {prompt} prompt");
    let mut failed = 0;

    for (i, question) in questions.iter().enumerate() {
        println!("\nTest Query {}/{}", i + 1, questions.len());

        let outcome = match Query::new(question, prompt, k) {
            Ok(query) => rag
                .execute_query(&query)
                .await
                .map(|result| print_result(&query, &result)),
            Err(e) => Err(e),
        };

        if let Err(e) = outcome {
            failed += 1;
            eprintln!("Error querying the system: {e:#}");
        }

        println!("\n{RULE}");
    }

    println!(
        "\nBatch testing completed: {} succeeded, {failed} failed",
        questions.len() - failed
    );
}

async fn interactive(rag: &Rag) -> Result<()> {
    let mut session = Session::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("METI Committee Information Assistant");
    println!("{}", &RULE[..50]);
    println!("Ask in English or Japanese (日本語), the answer follows your language.");
    for kind in PromptKind::ALL {
        println!("  {:<14} {}", kind.as_str(), kind.description());
    }
    println!("Commands: ':history', ':clear', 'quit'");
    println!("Examples:");
    for question in EXAMPLE_QUESTIONS {
        println!("  - {question}");
    }

    loop {
        let Some(line) = prompt_line(&mut lines, "\nEnter your question: ").await? else {
            break;
        };

        let question = match parse_input(&line) {
            Input::Quit => break,
            Input::Blank => {
                println!("Please enter a question.");
                continue;
            }
            Input::History => {
                print_history(&session);
                continue;
            }
            Input::Clear => {
                session.clear();
                println!("History cleared.");
                continue;
            }
            Input::Question(question) => question,
        };

        let prompt = prompt_line(&mut lines, "Prompt type (comprehensive/simple) [default: comprehensive]: ")
            .await?
            .map(|choice| parse_prompt_choice(&choice))
            .unwrap_or_default();
        let k = prompt_line(&mut lines, &format!("Number of documents to retrieve [default: {DEFAULT_K}]: "))
            .await?
            .map_or(DEFAULT_K, |choice| parse_k_choice(&choice));

        let query = match Query::new(question, prompt, k) {
            Ok(query) => query,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match rag.execute_query(&query).await {
            Ok(result) => {
                print_result(&query, &result);
                session.record(&query, result);
                println!("\n{RULE}");
            }
            Err(e) => {
                debug!("Query failed: {e:?}");
                println!("Query failed: {e}. Please try again.");
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn prompt_line<R>(lines: &mut tokio::io::Lines<R>, message: &str) -> Result<Option<String>>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    print!("{message}");
    io::stdout().flush()?;

    Ok(lines.next_line().await?.map(|line| line.trim().to_string()))
}

#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Blank,
    History,
    Clear,
    Question(&'a str),
}

/// Session commands are prefixed with `:` so that one-word questions stay askable.
fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();

    match line.to_lowercase().as_str() {
        "quit" | "exit" | "q" | ":quit" => Input::Quit,
        "" => Input::Blank,
        ":history" => Input::History,
        ":clear" => Input::Clear,
        _ => Input::Question(line),
    }
}

fn parse_prompt_choice(choice: &str) -> PromptKind {
    choice.parse().unwrap_or_default()
}

fn parse_k_choice(choice: &str) -> usize {
    choice
        .trim()
        .parse()
        .ok()
        .filter(|k| (MIN_K..=MAX_K).contains(k))
        .unwrap_or(DEFAULT_K)
}

fn read_questions(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

fn print_result(query: &Query, result: &QueryResult) {
    println!("\nQuery: {}", query.question());
    println!("Prompt Type: {}", query.prompt_kind());
    println!("Documents Retrieved: {}", result.sources.len());
    println!("\nAnswer:\n{}", result.answer);

    if result.sources.is_empty() {
        return;
    }

    println!("\nSource Documents:");
    for (i, doc) in result.sources.iter().enumerate() {
        println!("\n--- Document {} (score {:.3}) ---", i + 1, doc.score);
        println!("Content Preview: {}", doc.preview(PREVIEW_CHARS));

        if !doc.metadata.is_empty() {
            println!(
                "Metadata: {}",
                serde_json::to_string(&doc.metadata).unwrap_or_default()
            );
        }
    }
}

fn print_history(session: &Session) {
    if session.is_empty() {
        println!("No queries yet.");
        return;
    }

    println!("Total Queries: {}", session.len());
    for (i, entry) in session.history().iter().enumerate() {
        println!(
            "\nQuery {} [{}] ({}, k={})",
            i + 1,
            entry.formatted_timestamp(),
            entry.prompt_kind,
            entry.k
        );
        println!("Question: {}", entry.question);
        println!("Answer: {}", entry.answer);
    }
}

fn print_committees() {
    println!("Committee Coverage");
    for committee in &COMMITTEES {
        println!("\n{}", committee.name_en);
        println!("  {}", committee.name_jp);
        println!("  {}", committee.meetings);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_defaults_on_bad_choices() {
        assert_eq!(parse_prompt_choice("simple"), PromptKind::Simple);
        assert_eq!(parse_prompt_choice("SIMPLE"), PromptKind::Simple);
        assert_eq!(parse_prompt_choice(""), PromptKind::Comprehensive);
        assert_eq!(parse_prompt_choice("detailed"), PromptKind::Comprehensive);

        assert_eq!(parse_k_choice("3"), 3);
        assert_eq!(parse_k_choice(""), DEFAULT_K);
        assert_eq!(parse_k_choice("five"), DEFAULT_K);
        assert_eq!(parse_k_choice("11"), DEFAULT_K);
    }

    #[test]
    fn only_prefixed_words_are_commands() {
        assert_eq!(parse_input(":history"), Input::History);
        assert_eq!(parse_input(" :CLEAR "), Input::Clear);
        assert_eq!(parse_input("Exit"), Input::Quit);
        assert_eq!(parse_input("   "), Input::Blank);

        assert_eq!(parse_input("History"), Input::Question("History"));
        assert_eq!(parse_input("clear"), Input::Question("clear"));
        assert_eq!(parse_input("日本の再生可能エネルギーの現状は？"), Input::Question("日本の再生可能エネルギーの現状は？"));
    }

    #[test]
    fn reads_one_question_per_line() {
        let questions = read_questions("# smoke tests\nWhat is X?\n\n  電力市場の改革について教えてください  \n");

        assert_eq!(questions, ["What is X?", "電力市場の改革について教えてください"]);
    }

    #[test]
    fn parses_commands() {
        let cli = Cli::try_parse_from(["cli", "ask", "What is X?", "--prompt", "simple", "-k", "3"]).unwrap();

        let Commands::Ask { question, prompt, k } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(question, "What is X?");
        assert_eq!(prompt, PromptKind::Simple);
        assert_eq!(k, 3);
    }
}
