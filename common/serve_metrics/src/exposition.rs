use std::fmt::Write;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use health::ProcessClock;
use rand::Rng;

use crate::counter::RequestCounter;

pub const CONTENT_TYPE: &str = "text/plain; charset=utf-8";

#[derive(Clone, Copy, Debug)]
pub struct Series {
    pub name: &'static str,
    pub help: &'static str,
}

/// The two fixed series every service exports.
#[derive(Clone, Copy, Debug)]
pub struct MetricsSchema {
    pub requests: Series,
    pub uptime: Series,
    /// Upper bound of the random value served in placeholder mode.
    pub placeholder_ceiling: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterMode {
    /// Serve the real per-request counts.
    Live,
    /// Serve a single random `GET`/`200` sample, like the legacy exporter did.
    Placeholder,
}

/// Render the fixed series in the Prometheus text format, followed by whatever
/// the global recorder holds, trimmed of surrounding whitespace.
pub fn render(
    schema: &MetricsSchema,
    counter: &RequestCounter,
    mode: CounterMode,
    clock: &ProcessClock,
    recorder_output: Option<&str>,
) -> String {
    let mut out = String::new();

    write_header(&mut out, &schema.requests, "counter");
    match mode {
        CounterMode::Live => {
            for (labels, count) in counter.snapshot() {
                let _ = writeln!(
                    out,
                    "{}{{method=\"{}\",status=\"{}\"}} {}",
                    schema.requests.name,
                    escape_label(labels.method),
                    labels.status,
                    count
                );
            }
        }
        CounterMode::Placeholder => {
            let value = rand::thread_rng().gen_range(0..schema.placeholder_ceiling.max(1));
            let _ = writeln!(
                out,
                "{}{{method=\"GET\",status=\"200\"}} {}",
                schema.requests.name, value
            );
        }
    }
    out.push('\n');

    write_header(&mut out, &schema.uptime, "gauge");
    let _ = writeln!(out, "{} {}", schema.uptime.name, clock.uptime_seconds());

    if let Some(extra) = recorder_output {
        out.push('\n');
        out.push_str(extra);
    }

    out.trim().to_owned()
}

fn write_header(out: &mut String, series: &Series, kind: &str) {
    let _ = writeln!(out, "# HELP {} {}", series.name, series.help);
    let _ = writeln!(out, "# TYPE {} {}", series.name, kind);
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// An exposition body, served with the exact content type scrapers expect.
pub struct Exposition(pub String);

impl IntoResponse for Exposition {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, CONTENT_TYPE)], self.0).into_response()
    }
}
