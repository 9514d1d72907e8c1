use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

mod auth;
mod cli;
mod config;
mod digest;
mod errors;
mod lock;
mod mailer;
mod notify;
mod papers;
mod registry;
mod search;
#[cfg(test)]
mod tests;
mod web;

use config::Config;
use lock::FileLock;
use mailer::{MailSender, Mailer};
use notify::DryRunSender;
use papers::PaperIndex;
use registry::{RegistryCsv, UserRegistry};
use search::ArtifactSearch;

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();

    let args = cli::Args::parse();
    let config = Config::load()?;

    match args.command {
        cli::Command::Daemon { bind } => {
            let _lock = FileLock::try_acquire(config.base_path(), lock::DAEMON_LOCK)
                .context("another daemon is already serving this base directory")?;

            let registry = RegistryCsv::load(&config.users_csv_path())?;
            let papers = PaperIndex::new(config.search_outputs_dir())?;

            let state = Arc::new(web::SharedState {
                registry: Arc::new(registry),
                papers,
            });

            let bind_addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            web::start_daemon(state, &bind_addr);
            Ok(())
        }

        cli::Command::Notify {
            dry_run,
            recipients,
        } => {
            let _lock = FileLock::try_acquire(config.base_path(), lock::NOTIFY_LOCK)
                .context("another notify run is already in progress")?;

            let recipients_path = recipients.unwrap_or_else(|| config.recipients_csv_path());
            let recipients = notify::read_recipients(&recipients_path)?;
            log::info!(
                "notifying {} recipients from {recipients_path} (collection '{}')",
                recipients.len(),
                config.collection
            );

            let searcher = ArtifactSearch::new(PaperIndex::new(config.search_outputs_dir())?);

            let sender: Box<dyn MailSender> = if dry_run {
                Box::new(DryRunSender)
            } else {
                Box::new(Mailer::from_env(&config.smtp)?)
            };

            let report = notify::run(&recipients, &searcher, sender.as_ref(), config.top_k);
            log::info!(
                "batch done: {} sent, {} failed, {} skipped",
                report.sent,
                report.failed,
                report.skipped
            );

            if report.sent == 0 && (report.failed > 0 || report.skipped > 0) {
                anyhow::bail!("no digest was delivered");
            }
            Ok(())
        }

        cli::Command::Dump {} => {
            let registry = RegistryCsv::load(&config.users_csv_path())?;
            let rows = registry.dump()?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
            Ok(())
        }
    }
}
