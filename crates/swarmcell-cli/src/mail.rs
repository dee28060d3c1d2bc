use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use crate::context::Ctx;

#[derive(Subcommand)]
pub enum MailCommands {
    /// Register this agent name with the project
    Register { name: String },

    /// List registered agents
    Agents,

    /// Send a message to one or more agents
    Send {
        from: String,
        #[arg(long, value_delimiter = ',')]
        to: Vec<String>,
        subject: String,
        body: String,
        #[arg(long)]
        thread: Option<String>,
        #[arg(long, default_value = "normal")]
        importance: String,
        #[arg(long)]
        ack_required: bool,
    },

    /// Show an agent's inbox
    Inbox { agent: String },

    /// Show every message in a thread
    Thread { thread_id: String },

    /// Mark a message read
    MarkRead { message_id: i64, agent: String },

    /// Acknowledge a message
    Ack { message_id: i64, agent: String },

    /// Reserve one or more path globs
    Reserve {
        agent: String,
        #[arg(value_delimiter = ',')]
        paths: Vec<String>,
        #[arg(long, default_value_t = true)]
        exclusive: bool,
        #[arg(long, default_value_t = 3600)]
        ttl_secs: i64,
    },

    /// Release reservations by id
    Release {
        #[arg(value_delimiter = ',')]
        reservation_ids: Vec<i64>,
    },

    /// List currently active (non-expired) reservations
    Reservations,

    /// Check whether a pattern would conflict with existing reservations
    Conflicts { pattern: String, agent: String, #[arg(long, default_value_t = true)] exclusive: bool },
}

pub fn run(cmd: MailCommands, project: Option<String>, db: Option<PathBuf>) -> Result<()> {
    let ctx = Ctx::connect(project, db)?;
    let result = match cmd {
        MailCommands::Register { name } => ctx.client.call("mail.agent.register", json!({"name": name}))?,
        MailCommands::Agents => ctx.client.call("mail.agent.list", json!({}))?,
        MailCommands::Send { from, to, subject, body, thread, importance, ack_required } => ctx.client.call(
            "mail.send",
            json!({"from_agent": from, "to": to, "subject": subject, "body": body, "thread_id": thread, "importance": importance, "ack_required": ack_required}),
        )?,
        MailCommands::Inbox { agent } => ctx.client.call("mail.inbox", json!({"agent": agent}))?,
        MailCommands::Thread { thread_id } => ctx.client.call("mail.thread", json!({"thread_id": thread_id}))?,
        MailCommands::MarkRead { message_id, agent } => {
            ctx.client.call("mail.mark_read", json!({"message_id": message_id, "agent": agent}))?
        }
        MailCommands::Ack { message_id, agent } => ctx.client.call("mail.ack", json!({"message_id": message_id, "agent": agent}))?,
        MailCommands::Reserve { agent, paths, exclusive, ttl_secs } => {
            ctx.client.call("mail.reserve", json!({"agent": agent, "paths": paths, "exclusive": exclusive, "ttl_secs": ttl_secs}))?
        }
        MailCommands::Release { reservation_ids } => {
            ctx.client.call("mail.release", json!({"reservation_ids": reservation_ids}))?
        }
        MailCommands::Reservations => ctx.client.call("mail.reservations", json!({}))?,
        MailCommands::Conflicts { pattern, agent, exclusive } => {
            ctx.client.call("mail.conflicts", json!({"pattern": pattern, "agent": agent, "exclusive": exclusive}))?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
