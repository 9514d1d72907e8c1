//! The notification batch job: one pass over the recipient list, one
//! search and one email per row.
//!
//! Best-effort by design. A failed search or send is logged and counted,
//! never propagated; there is no checkpoint, no retry, and no run state.
//! Exclusivity against an overlapping run is the caller's flock.

use crate::{
    digest,
    mailer::MailSender,
    search::HybridSearch,
};
use anyhow::Context;
use serde::Deserialize;

/// One row of the recipient source. This is a separate per-send feed with a
/// display name, header `Name,email,topic`, not the registry table.
#[derive(Debug, Clone, Deserialize)]
pub struct Recipient {
    #[serde(rename = "Name")]
    pub name: String,
    pub email: String,
    pub topic: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub fn read_recipients(path: &str) -> anyhow::Result<Vec<Recipient>> {
    let mut csv_reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open recipient list {path}"))?;

    let mut recipients = vec![];
    for record in csv_reader.deserialize() {
        let recipient: Recipient = record?;
        recipients.push(recipient);
    }

    Ok(recipients)
}

/// Render-and-log stand-in for the real sender, used by `notify --dry-run`.
pub struct DryRunSender;

impl MailSender for DryRunSender {
    fn send_html(&self, recipient: &str, subject: &str, html_body: &str) -> bool {
        log::info!(
            "[dry-run] would send '{subject}' to {recipient} ({} bytes of html)",
            html_body.len()
        );
        true
    }
}

pub fn run(
    recipients: &[Recipient],
    searcher: &dyn HybridSearch,
    sender: &dyn MailSender,
    top_k: usize,
) -> NotifyReport {
    let today = chrono::Local::now().format("%Y-%m-%d");
    let mut report = NotifyReport::default();

    for recipient in recipients {
        let hits = match searcher.search(&recipient.topic, top_k) {
            Ok(hits) => hits,
            Err(err) => {
                log::error!(
                    "search failed for {} (topic '{}'): {err:?}",
                    recipient.email,
                    recipient.topic
                );
                report.skipped += 1;
                continue;
            }
        };

        let fragment = digest::results_fragment(&hits);
        let html_body = digest::digest_html(&recipient.name, &recipient.topic, &fragment);
        let subject = format!("New papers for '{}' ({today})", recipient.topic);

        if sender.send_html(&recipient.email, &subject, &html_body) {
            log::info!("digest sent to {} ({} hits)", recipient.email, hits.len());
            report.sent += 1;
        } else {
            // logged in detail by the sender; keep going with the next row
            report.failed += 1;
        }
    }

    report
}
