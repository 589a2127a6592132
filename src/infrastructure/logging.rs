//! Console log output shared by every command
//!
//! `serve` stacks an OpenTelemetry layer on top of these pieces, the
//! one-shot commands use them alone.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{LogFormat, LoggingConfig};

pub(crate) type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Level filter; `RUST_LOG` takes precedence over the configured level
pub(crate) fn env_filter(config: &LoggingConfig) -> EnvFilter {
    filter_from(config, std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref())
}

fn filter_from(config: &LoggingConfig, overridden: Option<&str>) -> EnvFilter {
    overridden
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(&config.level))
}

/// Formatter writing user-service events to stdout
pub(crate) fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    }
}

/// Install console logging without trace export
pub fn init_logging(config: &LoggingConfig) {
    let layers: Vec<BoxedLayer> = vec![env_filter(config).boxed(), console_layer(config)];

    tracing_subscriber::registry().with(layers).init();

    tracing::debug!(level = %config.level, "Logging initialized");
}
