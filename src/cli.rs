use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Serve the topic registry HTTP API.
    Daemon {
        /// Address to bind, e.g. 0.0.0.0:8077. Overrides config.
        #[clap(long)]
        bind: Option<String>,
    },

    /// Send a digest email to every row of the recipient list.
    Notify {
        /// Render and log digests without opening an SMTP session.
        #[clap(long, default_value = "false")]
        dry_run: bool,

        /// Recipient csv (header: Name,email,topic). Overrides config.
        #[clap(long)]
        recipients: Option<String>,
    },

    /// Print every stored user/topic row as JSON.
    Dump {},
}
