use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sheetbot")]
#[command(author, version, about = "Telegram bot for bus arrivals, a word game and friends", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (default)
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,

        /// Keep every sheet in memory instead of the SQLite file
        #[arg(long)]
        memory: bool,
    },

    /// Print the command tree with each command's usage
    Tree,

    /// Show or reset a user's stored continuation
    State {
        /// Telegram user id
        user_id: i64,

        /// Clear the continuation instead of printing it
        #[arg(long)]
        clear: bool,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand, defaulting to a polling run.
    pub fn command_or_default(self) -> Commands {
        self.command.unwrap_or(Commands::Run {
            webhook: false,
            memory: false,
        })
    }
}
