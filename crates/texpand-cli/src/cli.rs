use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    author = "Gokul <@bahdotsh>",
    version = env!("CARGO_PKG_VERSION"),
    about = "texpand - system-wide text expansion",
    long_about = "texpand watches what you type and replaces trigger keywords with \
                  snippet text, resolving {date}, {clipboard} and other variables."
)]
pub struct Texpand {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub commands: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new snippet
    Add {
        #[clap(long, short = 'k', help = "Trigger keyword (or pattern with --regex)")]
        keyword: String,

        #[clap(long, short = 'r', help = "Replacement template")]
        replacement: String,

        #[clap(long, help = "Treat the keyword as a regular expression")]
        regex: bool,

        #[clap(long, default_value_t = 0, help = "Higher wins between equal matches")]
        priority: i32,

        #[clap(long, short = 'g', help = "Group the snippet belongs to")]
        group: Option<String>,
    },
    /// Update the replacement of an existing snippet
    Update {
        #[clap(long, short = 'k', help = "Keyword of the snippet to update")]
        keyword: String,

        #[clap(long, short = 'r', help = "New replacement template")]
        replacement: String,
    },
    /// Delete a snippet by keyword
    Delete {
        #[clap(long, short = 'k', help = "Keyword of the snippet to delete")]
        keyword: String,
    },
    /// List snippets
    List {
        #[clap(long, short = 'g', help = "Only show snippets in this group")]
        group: Option<String>,
    },
    /// Enable every snippet in a group
    EnableGroup { name: String },
    /// Disable every snippet in a group
    DisableGroup { name: String },
    /// Merge snippets from another snippets.json file
    Import { path: PathBuf },
    /// Show what a template would expand to, without touching the clipboard
    Preview {
        /// Template text, or a snippet keyword with --snippet
        text: String,

        #[clap(long, short = 's', help = "Look the text up as a snippet keyword")]
        snippet: bool,
    },
    /// Expand a template now and print the result, prompting for {input:...}
    Expand {
        /// Template text, or a snippet keyword with --snippet
        text: String,

        #[clap(long, short = 's', help = "Look the text up as a snippet keyword")]
        snippet: bool,
    },
    /// Show or change engine settings
    Config {
        #[clap(long, value_name = "KEY=VALUE", help = "Change a setting")]
        set: Vec<String>,
    },
    /// Start the expansion daemon in the background
    Start,
    /// Stop the expansion daemon
    Stop,
    /// Check the status of the expansion daemon
    Status,
    /// Run the expansion engine in the foreground
    Run,
    // Hidden command used internally to run the daemon worker
    #[clap(hide = true)]
    DaemonWorker,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
