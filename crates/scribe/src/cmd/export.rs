//! Export command - Backfill the configured chats, optionally keep watching
//!
//! Shutdown order: stop watchers, drain attachment downloads, close sinks,
//! close the transport. It runs whether the export succeeded or not.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use scribe_config::{Config, SinkConfig, TransportConfig, TransportKind};
use scribe_pipeline::{
    AttachmentFetcher, FanOutWriter, NormalizeOptions, Pipeline, PipelineOptions,
};
use scribe_sinks::{
    ElasticsearchConfig, ElasticsearchSink, JsonlConfig, JsonlSink, Sink, StdoutConfig,
    StdoutSink,
};
use scribe_transport::{KeybaseConfig, KeybaseTransport, Transport};
use tokio::signal;
use tracing::{info, warn};

/// Export command arguments
#[derive(Args, Debug, Default)]
pub struct ExportArgs {
    /// Keep watching for new messages after the backfill (overrides `[watcher] enabled`)
    #[arg(long)]
    pub watch: bool,

    /// Download attachments (overrides `[attachments] download`)
    #[arg(long)]
    pub download: bool,
}

/// Run the export command
pub async fn run(args: ExportArgs, config: Config) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        chats = config.chats.len(),
        sinks = ?config.enabled_sinks(),
        "scribe starting"
    );
    if config.chats.is_empty() {
        warn!("no chats configured, nothing to export");
    }

    let transport = Arc::new(build_transport(&config.transport));
    let writer = Arc::new(FanOutWriter::new(build_sinks(&config)?));
    writer.init().await.context("failed to initialize sinks")?;

    let fetcher = (args.download || config.attachments.download).then(|| {
        info!(directory = %config.attachments.directory, "attachment downloads enabled");
        AttachmentFetcher::start(Arc::clone(&transport), &config.attachments.directory)
    });

    let options = pipeline_options(&config, args.watch);
    let mut pipeline = Pipeline::new(
        Arc::clone(&transport),
        Arc::clone(&writer),
        fetcher.as_ref().map(AttachmentFetcher::queue),
        options,
    );

    let exported = export(&mut pipeline, &config.chats).await;

    // Shutdown runs regardless of the outcome; the first error wins
    let stopped = pipeline
        .shutdown()
        .await
        .context("live watcher failed during shutdown");
    let drained = match fetcher {
        Some(fetcher) => fetcher
            .drain()
            .await
            .map(|_| ())
            .context("attachment fetcher failed"),
        None => Ok(()),
    };
    let closed = writer.close().await.context("failed to close sinks");
    if let Err(e) = transport.close().await {
        warn!(error = %e, "failed to close transport");
    }

    exported.and(stopped).and(drained).and(closed)?;
    info!("export finished");
    Ok(())
}

async fn export<T: Transport>(pipeline: &mut Pipeline<T>, chats: &[String]) -> Result<()> {
    pipeline.run(chats).await.context("export failed")?;

    let watchers = pipeline.active_watchers();
    if watchers == 0 {
        return Ok(());
    }

    info!(watchers, "backfill done, watching for new messages (Ctrl+C to stop)");
    tokio::select! {
        signal = wait_for_shutdown() => {
            signal?;
            info!("shutdown signal received, stopping watchers...");
        }
        result = pipeline.wait_watchers() => {
            result.context("live watcher failed")?;
        }
    }
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() -> Result<()> {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("failed to install SIGTERM handler")?;
        tokio::select! {
            result = signal::ctrl_c() => result.context("failed to listen for Ctrl+C")?,
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    Ok(())
}

/// Build the configured transport
pub(crate) fn build_transport(config: &TransportConfig) -> KeybaseTransport {
    match config.kind {
        TransportKind::Keybase => KeybaseTransport::new(KeybaseConfig {
            binary: config.binary.clone(),
            home: config.home.as_ref().map(PathBuf::from),
            timeout: config.timeout,
        }),
    }
}

/// Build every enabled sink, in name order
fn build_sinks(config: &Config) -> Result<Vec<Box<dyn Sink>>> {
    config
        .sinks
        .enabled()
        .map(|(name, sink)| -> Result<Box<dyn Sink>> {
            Ok(match sink {
                SinkConfig::Jsonl(c) => Box::new(JsonlSink::new(
                    name.as_str(),
                    JsonlConfig {
                        path: PathBuf::from(&c.path),
                        eol: c.eol.clone(),
                        append: c.append,
                    },
                )),
                SinkConfig::Elasticsearch(c) => Box::new(
                    ElasticsearchSink::new(
                        name.as_str(),
                        ElasticsearchConfig {
                            url: c.url.clone(),
                            index_pattern: c.index_pattern.clone(),
                            username: c.username.clone(),
                            password: c.password.clone(),
                            timeout: c.timeout,
                        },
                    )
                    .with_context(|| format!("failed to create sink '{name}'"))?,
                ),
                SinkConfig::Stdout(c) => {
                    Box::new(StdoutSink::new(name.as_str(), StdoutConfig { color: c.color }))
                }
            })
        })
        .collect()
}

fn pipeline_options(config: &Config, watch: bool) -> PipelineOptions {
    let types = config.message_types;
    PipelineOptions {
        watch: watch || config.watcher.enabled,
        watch_timeout: config.watcher.timeout,
        normalize: NormalizeOptions {
            attachment_stub: config.attachments.stub,
            reactions: types.reactions,
            reaction_messages: types.reaction_messages,
            system_messages: types.system_messages,
            headline: types.headline,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::time::Duration;

    use super::*;

    fn config(toml: &str) -> Config {
        Config::from_str(toml).unwrap()
    }

    #[test]
    fn test_build_sinks_skips_disabled() {
        let config = config(
            r#"
[sinks.archive]
type = "jsonl"

[sinks.debug]
type = "stdout"
enabled = false

[sinks.search]
type = "elasticsearch"
"#,
        );
        let sinks = build_sinks(&config).unwrap();
        let names: Vec<(&str, &str)> = sinks.iter().map(|s| (s.name(), s.kind())).collect();
        assert_eq!(
            names,
            vec![("archive", "jsonl"), ("search", "elasticsearch")]
        );
    }

    #[test]
    fn test_pipeline_options_from_config() {
        let config = config(
            r#"
[watcher]
timeout = "5s"

[attachments]
stub = false

[message_types]
headline = false

[sinks.out]
type = "stdout"
"#,
        );

        let options = pipeline_options(&config, false);
        assert!(!options.watch);
        assert_eq!(options.watch_timeout, Duration::from_secs(5));
        assert!(!options.normalize.attachment_stub);
        assert!(!options.normalize.headline);
        assert!(options.normalize.reactions);

        assert!(pipeline_options(&config, true).watch);
    }

    #[test]
    fn test_build_transport_uses_config() {
        let transport = build_transport(&TransportConfig::default());
        assert_eq!(transport.name(), "keybase");
    }
}
