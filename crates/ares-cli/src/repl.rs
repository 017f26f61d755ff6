use std::borrow::Cow::{self, Borrowed, Owned};
use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};

use ares_application::ChatManager;
use ares_core::AresError;
use ares_core::session::MessageRole;

const COMMANDS: &[&str] = &["/reset", "/history", "/stats", "/status", "/help"];

/// Completion, highlighting and hints for slash commands.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|cmd| cmd.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Runs an interview against one session until the user quits.
///
/// The session is deleted on exit; nothing outlives the process anyway.
pub async fn run(manager: Arc<ChatManager>, pathology: Option<&str>) -> Result<()> {
    let session = manager.create(pathology).await?;
    let session_id = session.id.clone();

    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== ARES patient interview ===".bright_magenta().bold());
    println!(
        "{}",
        "Ask the patient questions and work out the diagnosis. Type '/help' for commands or 'quit' to exit."
            .bright_black()
    );
    if manager.engine_status().degraded {
        println!(
            "{}",
            "The configured model is unavailable; replies come from the offline mock.".yellow()
        );
    }
    println!();
    print_patient(&manager.opening_message(&session_id).await?);

    loop {
        let line = match rl.readline(">> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {err:?}").red());
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed == "quit" || trimmed == "exit" {
            println!("{}", "Goodbye!".bright_green());
            break;
        }
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        if trimmed.starts_with('/') {
            if let Err(e) = handle_command(&manager, &session_id, trimmed).await {
                eprintln!("{}", format!("Error: {e}").red());
            }
            continue;
        }

        match manager.send_detailed(&session_id, trimmed, None).await {
            Ok(turn) => {
                print_patient(&turn.reply);
                if let Some(warning) = turn.length_warning {
                    println!("{}", warning.yellow());
                }
            }
            Err(e) => report_turn_error(&e),
        }
    }

    manager.delete(&session_id).await?;
    Ok(())
}

async fn handle_command(manager: &ChatManager, session_id: &str, command: &str) -> Result<()> {
    match command {
        "/reset" => {
            manager.reset(session_id).await?;
            println!("{}", "Conversation reset. The patient is the same.".bright_green());
            print_patient(&manager.opening_message(session_id).await?);
        }
        "/history" => {
            let session = manager.get(session_id).await?;
            for message in session.messages() {
                match message.role {
                    MessageRole::System => {}
                    MessageRole::User => println!("{}", format!("> {}", message.content).green()),
                    MessageRole::Assistant => println!("{}", message.content.bright_blue()),
                }
            }
        }
        "/stats" => {
            let stats = manager.statistics(session_id).await?;
            println!(
                "{} {} ({} questions, {} replies)",
                "Messages:".bright_black(),
                stats.total_messages,
                stats.user_messages,
                stats.assistant_messages
            );
            println!(
                "{} {:.0} / {:.0} chars",
                "Average length (question / reply):".bright_black(),
                stats.avg_user_length,
                stats.avg_assistant_length
            );
            println!("{} {:.1} min", "Duration:".bright_black(), stats.duration_minutes);
            if stats.is_at_limit {
                println!("{}", "History is at its message limit.".yellow());
            }
        }
        "/status" => {
            let status = manager.status().await;
            crate::print_engine_status(&status.engine, &status.engine_name);
            println!(
                "{} {}  {} {}s",
                "Sessions:".bright_black(),
                status.session_count,
                "Uptime:".bright_black(),
                status.uptime_secs
            );
        }
        "/help" => {
            println!("{}", "/reset    start the interview over".bright_black());
            println!("{}", "/history  show the conversation so far".bright_black());
            println!("{}", "/stats    conversation statistics".bright_black());
            println!("{}", "/status   generation engine status".bright_black());
            println!("{}", "quit      leave".bright_black());
        }
        _ => println!("{}", "Unknown command".bright_black()),
    }
    Ok(())
}

fn print_patient(text: &str) {
    println!("{}", "[Patient]".bright_magenta());
    for line in text.lines() {
        println!("{}", line.bright_blue());
    }
    println!();
}

fn report_turn_error(error: &AresError) {
    let message = if error.is_client_error() {
        format!("{error}")
    } else if let AresError::RateLimited {
        retry_after_secs: Some(secs),
        ..
    } = error
    {
        format!("{error} (try again in {secs}s)")
    } else {
        format!("{error}. Your question was not recorded; try again.")
    };
    eprintln!("{}", message.red());
}
