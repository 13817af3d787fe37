//! Interactive assessment chat.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use crate::cli::bootstrap::{self, Engine};
use crate::domain::models::{Config, Message, MessageKind, MessageStatus};
use crate::services::{AssessmentState, StartOutcome, TurnOutcome};

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Identity the session belongs to
    #[arg(long, env = "COMPASS_OWNER", default_value = "default")]
    pub owner: String,

    /// Resume a specific past session by id instead of the active one
    #[arg(long)]
    pub session: Option<String>,
}

pub async fn execute(args: ChatArgs, config: &Config) -> Result<()> {
    let engine = bootstrap::build(config).await?;

    let outcome = match &args.session {
        Some(raw) => {
            let id = Uuid::parse_str(raw).context("Invalid session id")?;
            engine.orchestrator.resume(id, &args.owner).await?
        }
        None => engine.orchestrator.start(&args.owner).await?,
    };

    print_banner(&outcome);
    for message in &outcome.messages {
        print_message(message);
    }
    mark_rendered_seen(&engine, &outcome.messages).await;
    print_state(&engine).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", style(">").cyan().bold());
        use std::io::Write;
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if matches!(input, "exit" | "quit") {
            break;
        }

        let spinner = thinking_spinner();
        let turn = engine.orchestrator.submit_answer(input).await;
        spinner.finish_and_clear();

        match turn {
            Ok(TurnOutcome::NextQuestion(message) | TurnOutcome::Reply(message)) => {
                print_message(&message);
                mark_rendered_seen(&engine, std::slice::from_ref(&message)).await;
                print_state(&engine).await;
            }
            Ok(TurnOutcome::Completed {
                recommendation, ..
            }) => {
                print_message(&recommendation);
                mark_rendered_seen(&engine, std::slice::from_ref(&recommendation)).await;
                println!(
                    "{}",
                    style("Assessment complete! Ask about any recommendation, or say \"start a new assessment\".")
                        .green()
                );
            }
            Ok(TurnOutcome::Guidance(message)) => {
                print_message(&message);
                mark_rendered_seen(&engine, std::slice::from_ref(&message)).await;
            }
            Ok(TurnOutcome::NewSession(outcome)) => {
                print_banner(&outcome);
                for message in &outcome.messages {
                    print_message(message);
                }
                mark_rendered_seen(&engine, &outcome.messages).await;
            }
            Err(err) => println!("{}", style(format!("! {err}")).red()),
        }
    }

    Ok(())
}

fn print_banner(outcome: &StartOutcome) {
    let headline = if outcome.created {
        "Starting a new assessment."
    } else {
        "Resuming your assessment."
    };
    println!("{}", style(headline).bold());
    println!(
        "Session {} · progress {}%",
        style(outcome.session.id).dim(),
        outcome.session.metadata.overall_progress
    );
    if !outcome.advisor_ready {
        println!(
            "{}",
            style("Advisor unreachable; falling back to built-in questions.").yellow()
        );
    }
}

fn print_message(message: &Message) {
    let label = match message.kind {
        MessageKind::User => style("you".to_string()).cyan(),
        MessageKind::System => style("compass".to_string()).dim(),
        MessageKind::Bot => style("compass".to_string()).green(),
        MessageKind::Recommendation => style("recommendation".to_string()).magenta().bold(),
        MessageKind::SessionEnd => style("compass".to_string()).dim(),
    };
    println!("{label}: {}", message.content);

    if message.status == MessageStatus::Failed {
        println!(
            "  {}",
            style(format!(
                "not saved ({}); it will be retried",
                message.delivery.error.as_deref().unwrap_or("unknown error")
            ))
            .red()
        );
    }
    if !message.metadata.suggestions.is_empty() {
        println!(
            "  {}",
            style(message.metadata.suggestions.join(" | ")).dim()
        );
    }
}

/// A rendered bot turn has been seen. Bookkeeping only; a failure here must
/// not interrupt the chat.
async fn mark_rendered_seen(engine: &Engine, messages: &[Message]) {
    for message in messages {
        if message.kind != MessageKind::User && message.status == MessageStatus::Sent {
            engine
                .store
                .mark_seen(message.session_id, message.id)
                .await
                .ok();
        }
    }
}

async fn print_state(engine: &Engine) {
    if let AssessmentState::Active { cursor, progress } = engine.orchestrator.state().await {
        println!("  {}", style(format!("[{cursor} · {progress}%]")).dim());
    }
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
