//! Process-wide `tracing` setup shared by every service.
//!
//! - `LOG_FORMAT=json` writes one JSON object per event:
//!   `{timestamp, level, service, message, ...fields}`
//! - `LOG_FORMAT=text` uses the stock compact formatter
//! - `warn` and `error` go to stderr, everything else to stdout
//! - `debug` is always emitted in `development` and never outside it

use std::fmt;

use chrono::{SecondsFormat, Utc};
use common_config::{Config, LogFormat};
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::{MakeWriterExt, OrElse, WithMaxLevel};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

const RESERVED_KEYS: [&str; 4] = ["timestamp", "level", "service", "message"];

/// Install the global subscriber. Must be called once, before anything logs.
pub fn init(service: &str, config: &Config) {
    // RUST_LOG wins over LOG_LEVEL when set, like the rest of our services
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let writer = split_writer(std::io::stdout, std::io::stderr);

    subscriber(service, config, writer, directives.as_deref()).init();
}

/// Route `warn` and `error` to `err`, everything else to `out`.
pub fn split_writer<O, E>(out: O, err: E) -> OrElse<WithMaxLevel<E>, O>
where
    O: for<'writer> MakeWriter<'writer>,
    E: for<'writer> MakeWriter<'writer>,
{
    err.with_max_level(Level::WARN).or_else(out)
}

/// Build the subscriber without installing it, writing every line to `writer`.
///
/// `directives` are `RUST_LOG`-style filter directives that take precedence
/// over the configured level.
pub fn subscriber<W>(
    service: &str,
    config: &Config,
    writer: W,
    directives: Option<&str>,
) -> impl Subscriber + Send + Sync + 'static
where
    W: for<'writer> MakeWriter<'writer> + Send + Sync + 'static,
{
    let layer = match config.logging.format() {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .event_format(JsonLines::new(service))
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(writer)
            .boxed(),
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(default_level(config)).into())
        .parse_lossy(directives.unwrap_or_default());

    tracing_subscriber::registry()
        .with(verbosity_cap(config))
        .with(layer.with_filter(filter))
}

// Development always shows debug lines, whatever LOG_LEVEL says
fn default_level(config: &Config) -> Level {
    let level = config.logging.level();
    if config.is_development() {
        level.max(Level::DEBUG)
    } else {
        level
    }
}

fn verbosity_cap(config: &Config) -> LevelFilter {
    if config.is_development() {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    }
}

/// Event formatter producing a single JSON object per line.
pub struct JsonLines {
    service: String,
}

impl JsonLines {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_owned(),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonLines
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);

        let mut line = Map::new();
        line.insert(
            "timestamp".to_owned(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        line.insert(
            "level".to_owned(),
            Value::String(event.metadata().level().as_str().to_lowercase()),
        );
        line.insert("service".to_owned(), Value::String(self.service.clone()));
        line.insert(
            "message".to_owned(),
            Value::String(fields.message.unwrap_or_default()),
        );
        if let Some(span) = ctx.lookup_current() {
            line.insert("span".to_owned(), Value::String(span.name().to_owned()));
        }
        for (key, value) in fields.extra {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                line.insert(key, value);
            }
        }

        writeln!(writer, "{}", Value::Object(line))
    }
}

#[derive(Default)]
struct FieldCollector {
    message: Option<String>,
    extra: Map<String, Value>,
}

impl FieldCollector {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.extra.insert(field.name().to_owned(), value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::from(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, Value::from(format!("{value:?}")));
    }
}
