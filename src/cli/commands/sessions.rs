//! Session management commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};
use uuid::Uuid;

use crate::cli::bootstrap;
use crate::cli::output::{output, truncate, CommandOutput};
use crate::domain::models::{Config, Message, Session};

#[derive(Args, Debug)]
pub struct SessionsArgs {
    /// Identity whose sessions to manage
    #[arg(long, env = "COMPASS_OWNER", default_value = "default")]
    pub owner: String,

    #[command(subcommand)]
    pub command: SessionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum SessionsCommands {
    /// List past and active sessions
    List,
    /// Show a session with its conversation log
    Show {
        /// Session id
        id: String,
    },
    /// Set a session's title
    Rename {
        /// Session id
        id: String,
        /// New title
        title: String,
    },
    /// Delete a session and all of its messages
    Delete {
        /// Session id
        id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct SessionOutput {
    pub id: String,
    pub title: Option<String>,
    pub status: String,
    pub progress: u8,
    pub total_messages: u32,
    pub updated_at: String,
}

impl From<&Session> for SessionOutput {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            title: session.metadata.title.clone(),
            status: session.status.as_str().to_string(),
            progress: session.metadata.overall_progress,
            total_messages: session.total_messages,
            updated_at: session.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SessionListOutput {
    pub sessions: Vec<SessionOutput>,
    pub total: usize,
}

impl CommandOutput for SessionListOutput {
    fn to_human(&self) -> String {
        if self.sessions.is_empty() {
            return "No sessions found.".to_string();
        }

        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_BORDERS_ONLY)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("ID").add_attribute(Attribute::Bold),
                Cell::new("Title").add_attribute(Attribute::Bold),
                Cell::new("Status").add_attribute(Attribute::Bold),
                Cell::new("Progress").add_attribute(Attribute::Bold),
                Cell::new("Messages").add_attribute(Attribute::Bold),
                Cell::new("Updated").add_attribute(Attribute::Bold),
            ]);

        for session in &self.sessions {
            table.add_row(vec![
                Cell::new(&session.id[..8]),
                Cell::new(session.title.as_deref().unwrap_or("-")),
                Cell::new(&session.status),
                Cell::new(format!("{}%", session.progress)),
                Cell::new(session.total_messages),
                Cell::new(&session.updated_at),
            ]);
        }

        format!("{table}")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SessionDetailOutput {
    pub session: SessionOutput,
    pub progress_by_category: Vec<(String, u8)>,
    pub messages: Vec<MessageOutput>,
}

#[derive(Debug, serde::Serialize)]
pub struct MessageOutput {
    pub index: u32,
    pub kind: String,
    pub status: String,
    pub content: String,
}

impl From<&Message> for MessageOutput {
    fn from(message: &Message) -> Self {
        Self {
            index: message.index,
            kind: message.kind.as_str().to_string(),
            status: message.status.as_str().to_string(),
            content: message.content.clone(),
        }
    }
}

impl CommandOutput for SessionDetailOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Session: {}", self.session.id),
            format!(
                "Title: {}",
                self.session.title.as_deref().unwrap_or("(untitled)")
            ),
            format!("Status: {}", self.session.status),
            format!("Progress: {}%", self.session.progress),
        ];
        for (category, percent) in &self.progress_by_category {
            lines.push(format!("  {category}: {percent}%"));
        }
        lines.push(String::new());
        for message in &self.messages {
            lines.push(format!(
                "[{:>3}] {:<14} {}",
                message.index,
                message.kind,
                truncate(&message.content, 80)
            ));
        }
        lines.join("\n")
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[derive(Debug, serde::Serialize)]
pub struct SessionActionOutput {
    pub success: bool,
    pub message: String,
}

impl CommandOutput for SessionActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub async fn execute(args: SessionsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let engine = bootstrap::build(config).await?;

    match args.command {
        SessionsCommands::List => {
            let sessions = engine.sessions.list_past(&args.owner).await?;
            let result = SessionListOutput {
                sessions: sessions.iter().map(SessionOutput::from).collect(),
                total: sessions.len(),
            };
            output(&result, json_mode);
        }
        SessionsCommands::Show { id } => {
            let id = parse_id(&id)?;
            let (session, messages) = engine.sessions.resume(id, &args.owner).await?;

            let mut progress_by_category: Vec<(String, u8)> = session
                .progress_data
                .iter()
                .map(|(category, percent)| (category.to_string(), *percent))
                .collect();
            progress_by_category.sort();

            let result = SessionDetailOutput {
                session: SessionOutput::from(&session),
                progress_by_category,
                messages: messages.iter().map(MessageOutput::from).collect(),
            };
            output(&result, json_mode);
        }
        SessionsCommands::Rename { id, title } => {
            let id = parse_id(&id)?;
            let session = engine.sessions.rename(id, &args.owner, &title).await?;
            let result = SessionActionOutput {
                success: true,
                message: format!("Renamed session {} to \"{title}\"", session.id),
            };
            output(&result, json_mode);
        }
        SessionsCommands::Delete { id } => {
            let id = parse_id(&id)?;
            engine.sessions.delete(id, &args.owner).await?;
            let result = SessionActionOutput {
                success: true,
                message: format!("Deleted session {id} and its messages"),
            };
            output(&result, json_mode);
        }
    }

    Ok(())
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).context("Invalid session id")
}
