//! Lexi application binary: terminal front end for the assistant session.
//!
//! 1. Parse CLI args and load configuration from TOML
//! 2. Initialize tracing (stderr)
//! 3. Build the session around the answer backend
//! 4. Run the read-submit-render loop until `:quit` or end of input

mod cli;
mod render;

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use lexi_chat::{
    AnswerResolver, AssistantSession, BrowserOpener, Citation, LinkOpener, LoggingOpener,
    RejectReason, StubResolver, Submission,
};
use lexi_core::LexiConfig;

use cli::CliArgs;

/// A line of user input, interpreted.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Ask(String),
    Cite(usize),
    Open(usize),
    Close,
    Cancel,
    Export,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Command::Ask(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let index = parts.next().and_then(|n| n.parse::<usize>().ok());

    match (name, index) {
        ("cite", Some(n)) => Command::Cite(n),
        ("open", Some(n)) => Command::Open(n),
        ("close", _) => Command::Close,
        ("cancel", _) => Command::Cancel,
        ("export", _) => Command::Export,
        ("help", _) => Command::Help,
        ("quit" | "q" | "exit", _) => Command::Quit,
        _ => Command::Unknown(trimmed.to_string()),
    }
}

enum Event {
    Line(std::io::Result<Option<String>>),
    Answered(Option<String>),
}

fn init_tracing(level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Citation `n` (1-based) of the latest answer.
fn latest_citation(session: &AssistantSession, n: usize) -> Option<Citation> {
    n.checked_sub(1)
        .and_then(|i| session.latest_citations().get(i))
        .cloned()
}

/// Handle one input line. Returns `false` when the session should end.
fn handle_line(session: &mut AssistantSession, opener: &dyn LinkOpener, line: &str) -> bool {
    match parse_command(line) {
        Command::Ask(text) => {
            session.set_input(text);
            match session.submit_input() {
                Submission::Accepted(_) => {
                    if let Some(turn) = session.transcript().last() {
                        println!("{}", render::turn(turn));
                    }
                    println!("[L] {}", render::LOADING_INDICATOR);
                }
                Submission::Rejected(RejectReason::InFlight) => {
                    println!(
                        "Still answering \"{}\". Wait for the answer or type :cancel.",
                        session.pending_question().unwrap_or_default()
                    );
                }
                Submission::Rejected(RejectReason::Empty) => {}
            }
        }
        Command::Cite(n) => match latest_citation(session, n) {
            Some(citation) => {
                session.select(&citation);
                println!("{}", render::citation_detail(&session.citation_detail(&citation)));
            }
            None => println!("No citation {} in the latest answer.", n),
        },
        Command::Open(n) => match latest_citation(session, n) {
            Some(citation) => {
                match session.open_citation(&citation, opener) {
                    Ok(url) => println!("Opening {}", url),
                    Err(err) => println!("Could not open the document: {}", err),
                }
            }
            None => println!("No citation {} in the latest answer.", n),
        },
        Command::Close => session.clear_selection(),
        Command::Cancel => {
            if session.cancel() {
                println!("Question cancelled.");
            } else {
                println!("Nothing to cancel.");
            }
        }
        Command::Export => match session.export_json() {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "Transcript export failed"),
        },
        Command::Help => println!("{}", render::help()),
        Command::Quit => return false,
        Command::Unknown(cmd) => println!("Unknown command {}. Type :help.", cmd),
    }
    true
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config_path = args.resolve_config_path();
    let (mut config, load_error) = match LexiConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (LexiConfig::default(), Some(e)),
    };
    args.apply_overrides(&mut config);

    init_tracing(&config.general.log_level);
    tracing::info!("Starting Lexi v{}", env!("CARGO_PKG_VERSION"));
    match load_error {
        Some(e) if config_path.exists() => tracing::warn!(
            path = %config_path.display(),
            error = %e,
            "Failed to load config, using defaults"
        ),
        Some(_) => tracing::debug!(path = %config_path.display(), "No config file, using defaults"),
        None => tracing::info!(path = %config_path.display(), "Configuration loaded"),
    }

    let resolver: Arc<dyn AnswerResolver> = Arc::new(StubResolver::new(config.stub.delay()));
    let opener: Box<dyn LinkOpener> = if config.links.open_in_browser {
        Box::new(BrowserOpener)
    } else {
        Box::new(LoggingOpener)
    };
    let mut session = AssistantSession::new(resolver, &config);
    tracing::debug!(session_id = %session.id(), policy = ?config.links.policy, "Session ready");

    println!("{}", render::welcome());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let event = if session.is_in_flight() {
            tokio::select! {
                line = lines.next_line() => Event::Line(line),
                turn = session.wait_for_answer() => Event::Answered(turn.map(render::turn)),
            }
        } else {
            Event::Line(lines.next_line().await)
        };

        match event {
            Event::Answered(rendered) => {
                println!();
                if let Some(rendered) = rendered {
                    println!("{}", rendered);
                }
            }
            Event::Line(Ok(Some(line))) => {
                if !handle_line(&mut session, opener.as_ref(), &line) {
                    break;
                }
            }
            Event::Line(Ok(None)) => {
                if let Some(turn) = session.wait_for_answer().await {
                    println!("\n{}", render::turn(turn));
                }
                break;
            }
            Event::Line(Err(e)) => {
                tracing::error!(error = %e, "Failed to read input");
                break;
            }
        }
    }

    tracing::info!(turns = session.transcript().len(), "Session ended");
}
