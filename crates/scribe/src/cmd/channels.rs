//! Channels command - List channels visible to the transport
//!
//! Prints one line per channel with the query forms accepted in `chats`.

use anyhow::{Context, Result};
use scribe_config::Config;
use scribe_protocol::Channel;
use scribe_transport::Transport;

use crate::cmd::export::build_transport;

/// Run the channels command
pub async fn run(config: Config) -> Result<()> {
    let transport = build_transport(&config.transport);
    let listed = transport.list().await.context("failed to list channels");
    if let Err(e) = transport.close().await {
        tracing::warn!(error = %e, "failed to close transport");
    }

    let mut channels = listed?;
    channels.sort_by(|a, b| a.display_name().cmp(&b.display_name()));

    let width = channels
        .iter()
        .map(|c| c.display_name().len())
        .max()
        .unwrap_or(0);
    for channel in &channels {
        println!("{}", format_line(channel, width));
    }
    tracing::info!(total = channels.len(), "listed channels");
    Ok(())
}

fn format_line(channel: &Channel, width: usize) -> String {
    let kind = channel.members_type.as_deref().unwrap_or("-");
    format!(
        "{:<width$}  {:<8}  $id${}",
        channel.display_name(),
        kind,
        channel.id,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line() {
        let mut channel = Channel::new("0000f0b5", "family").with_topic("general");
        channel.members_type = Some("team".into());
        assert_eq!(
            format_line(&channel, 16),
            "family#general    team      $id$0000f0b5"
        );

        let dm = Channel::new("abc", "alice,bob");
        assert_eq!(format_line(&dm, 9), "alice,bob  -         $id$abc");
    }
}
