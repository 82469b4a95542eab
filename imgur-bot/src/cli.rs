use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "imgur-bot", version, about = "Imgur OAuth2 bot")]
pub struct Cli {
    /// Configuration file path
    #[arg(
        short,
        long,
        env = "BOT_CONFIG",
        default_value = "config.toml",
        global = true
    )]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

/// Application/user pair a command acts as.
#[derive(clap::Args, Debug, Clone)]
pub struct Account {
    /// Application name from the configuration file
    #[arg(short, long)]
    pub app: String,

    /// Account name the token belongs to
    #[arg(short, long)]
    pub user: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a job against the Imgur API
    Job {
        /// Job name (see `jobs`)
        name: String,

        #[command(flatten)]
        account: Account,

        /// Extra arguments passed to the job
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Authorize an application and store the resulting token
    Authorize {
        #[command(flatten)]
        account: Account,

        /// Paste the redirect URL instead of running a local listener
        #[arg(long)]
        manual: bool,
    },

    /// Exchange the stored refresh token for a new access token
    Refresh {
        #[command(flatten)]
        account: Account,
    },

    /// Delete the stored token of an account
    Logout {
        #[command(flatten)]
        account: Account,
    },

    /// List accounts holding a stored token for an application
    Users {
        /// Application name from the configuration file
        #[arg(short, long)]
        app: String,
    },

    /// List available jobs
    Jobs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_job_with_extra_args() {
        let cli = Cli::parse_from([
            "imgur-bot", "job", "me", "-a", "main", "-u", "someone", "x", "--flag",
        ]);
        match cli.command {
            Commands::Job { name, account, args } => {
                assert_eq!(name, "me");
                assert_eq!(account.app, "main");
                assert_eq!(account.user, "someone");
                assert_eq!(args, vec!["x", "--flag"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_authorize() {
        let cli = Cli::parse_from([
            "imgur-bot", "--config", "bots.toml", "authorize", "--app", "main", "--user", "u",
        ]);
        assert_eq!(cli.config, PathBuf::from("bots.toml"));
        assert!(matches!(
            cli.command,
            Commands::Authorize { manual: false, .. }
        ));
    }

    #[test]
    fn test_parse_token_commands() {
        let cli = Cli::parse_from(["imgur-bot", "logout", "-a", "main", "-u", "someone"]);
        match cli.command {
            Commands::Logout { account } => {
                assert_eq!(account.app, "main");
                assert_eq!(account.user, "someone");
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from(["imgur-bot", "users", "--app", "main"]);
        assert!(matches!(cli.command, Commands::Users { app } if app == "main"));
    }

    #[test]
    fn test_job_requires_app_and_user() {
        assert!(Cli::try_parse_from(["imgur-bot", "job", "me"]).is_err());
    }
}
