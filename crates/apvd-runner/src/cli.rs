//! Command line arguments

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use apvd_api::WorkflowAction;

#[derive(Debug, Parser)]
#[command(name = "apvd-runner", version, about = "Runs approval workflow actions against the platform")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Overrides applied on top of the configuration file and environment
#[derive(Debug, Default, Clone, Args)]
pub struct GlobalArgs {
    /// Platform base URL
    #[arg(long, global = true)]
    pub server: Option<String>,

    #[arg(long, global = true)]
    pub username: Option<String>,

    #[arg(long, global = true, env = "APVD_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Configuration file, skipped when missing
    #[arg(short = 'c', long = "config", global = true, default_value = "conf/application.yml")]
    pub config: PathBuf,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Execute a workflow action over a JSON array of approval items
    Approve {
        /// complete, incomplete, submit, revoke or duplicate
        #[arg(long)]
        action: WorkflowAction,

        #[arg(long)]
        items: PathBuf,

        /// Where the execution report is written
        #[arg(long, default_value = "approval-stats.json")]
        stats_file: PathBuf,
    },

    /// Print the differences between a dataset and its approval copy
    Diff {
        #[arg(long)]
        data_set: String,

        #[arg(long)]
        org_unit: String,

        #[arg(long)]
        period: String,

        #[arg(long)]
        children: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_approve() {
        let cli = Cli::try_parse_from([
            "apvd-runner",
            "--server",
            "https://play.example.org",
            "approve",
            "--action",
            "duplicate",
            "--items",
            "items.json",
            "--stats-file",
            "out.json",
        ])
        .unwrap();

        assert_eq!(cli.global.server.as_deref(), Some("https://play.example.org"));
        match cli.command {
            Command::Approve {
                action,
                items,
                stats_file,
            } => {
                assert_eq!(action, WorkflowAction::Duplicate);
                assert_eq!(items, PathBuf::from("items.json"));
                assert_eq!(stats_file, PathBuf::from("out.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_diff_with_trailing_globals() {
        let cli = Cli::try_parse_from([
            "apvd-runner",
            "diff",
            "--data-set",
            "ds1",
            "--org-unit",
            "ou1",
            "--period",
            "2023",
            "--children",
            "--username",
            "jane",
        ])
        .unwrap();

        assert_eq!(cli.global.username.as_deref(), Some("jane"));
        assert_eq!(cli.global.config, PathBuf::from("conf/application.yml"));
        assert!(matches!(cli.command, Command::Diff { children: true, .. }));
    }

    #[test]
    fn test_invalid_action_rejected() {
        let result = Cli::try_parse_from([
            "apvd-runner",
            "approve",
            "--action",
            "publish",
            "--items",
            "items.json",
        ]);
        assert!(result.is_err());
    }
}
