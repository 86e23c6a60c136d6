//! Command-line argument parsing for ReplyBuddy
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::email::EmailMessage;

/// ReplyBuddy - grounded suggested replies for inbound email
#[derive(Parser, Debug)]
#[command(name = "replybuddy")]
#[command(version)]
#[command(about = "Draft email replies grounded in your product knowledge base", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (debug), -vv (trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Draft a suggested reply for an email
    Suggest(SuggestArgs),

    /// Show the knowledge snippets retrieved for a query
    Retrieve {
        /// Query text
        #[arg(value_name = "QUERY")]
        query: String,

        /// Number of snippets to retrieve
        #[arg(short = 'k', long, default_value_t = 3)]
        top_k: usize,
    },

    /// Check connectivity and knowledge base status
    Check,

    /// Display current configuration
    Config,
}

/// Where the email to answer comes from
#[derive(ClapArgs, Debug, Default)]
pub struct SuggestArgs {
    /// Read the full email text from a file ("-" for stdin)
    #[arg(short, long, conflicts_with_all = ["subject", "from", "date", "body"])]
    pub file: Option<PathBuf>,

    /// Email subject
    #[arg(long)]
    pub subject: Option<String>,

    /// Sender address
    #[arg(long)]
    pub from: Option<String>,

    /// Date header
    #[arg(long)]
    pub date: Option<String>,

    /// Email body
    #[arg(long)]
    pub body: Option<String>,

    /// Identifier echoed back in JSON output
    #[arg(long, default_value = "cli")]
    pub email_id: String,

    /// Print the JSON response instead of formatted text
    #[arg(long)]
    pub json: bool,
}

impl SuggestArgs {
    /// Email assembled from header flags, if any was given
    pub fn email_from_flags(&self) -> Option<EmailMessage> {
        if self.subject.is_none() && self.from.is_none() && self.date.is_none() && self.body.is_none() {
            return None;
        }

        Some(EmailMessage {
            subject: self.subject.clone().unwrap_or_default(),
            from: self.from.clone().unwrap_or_default(),
            date: self.date.clone().unwrap_or_default(),
            body: self.body.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_suggest_flags() {
        let args = Args::try_parse_from([
            "replybuddy",
            "suggest",
            "--subject",
            "Pricing",
            "--from",
            "john@example.com",
            "--body",
            "How much is it?",
        ])
        .unwrap();

        match args.command {
            Commands::Suggest(suggest) => {
                let email = suggest.email_from_flags().unwrap();
                assert_eq!(email.subject, "Pricing");
                assert_eq!(email.date, "");
                assert!(!suggest.json);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_file_conflicts_with_flags() {
        let result = Args::try_parse_from([
            "replybuddy",
            "suggest",
            "--file",
            "email.txt",
            "--subject",
            "x",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_no_flags_means_no_email() {
        assert!(SuggestArgs::default().email_from_flags().is_none());
    }

    #[test]
    fn test_retrieve_top_k() {
        let args = Args::try_parse_from(["replybuddy", "-vv", "retrieve", "pricing", "-k", "5"]).unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Commands::Retrieve { query, top_k } => {
                assert_eq!(query, "pricing");
                assert_eq!(top_k, 5);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let args = Args::try_parse_from(["replybuddy", "check", "--config", "/tmp/c.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.toml")));
    }
}
