//! Custom JSON layer for structured logging.
//!
//! Produces one JSON object per line with:
//! - timestamp (RFC 3339, microseconds)
//! - level, service, pid, target, message
//! - fields (structured key-value pairs, credentials redacted)
//! - span, file, line when available

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

use crate::redact::{is_sensitive_key, REDACTED};

/// One line of the JSONL log.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: &'static str,
    pub service: String,
    pub pid: u32,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

/// Collects event fields, pulling out `message` and masking credentials.
#[derive(Default)]
struct EventFields {
    message: Option<String>,
    fields: Map<String, Value>,
}

impl EventFields {
    fn record(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = Some(match value {
                Value::String(text) => text,
                other => other.to_string(),
            });
        } else if is_sensitive_key(name) {
            self.fields
                .insert(name.to_string(), Value::String(REDACTED.to_string()));
        } else {
            self.fields.insert(name.to_string(), value);
        }
    }
}

impl Visit for EventFields {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record(field, Value::String(format!("{:?}", value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        // NaN and infinities have no JSON number form
        let value = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.record(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.record(field, Value::String(value.to_string()));
    }
}

/// Layer writing each event as one JSON line.
pub struct JsonLayer<W> {
    service_name: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service_name: String, make_writer: W) -> Self {
        Self {
            service_name,
            pid: std::process::id(),
            make_writer,
        }
    }

    fn entry(&self, metadata: &Metadata<'_>, fields: EventFields, span: Option<String>) -> LogEntry {
        LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            level: metadata.level().as_str(),
            service: self.service_name.clone(),
            pid: self.pid,
            target: metadata.target().to_string(),
            message: fields.message.unwrap_or_default(),
            fields: fields.fields,
            span,
            file: metadata.file().map(str::to_string),
            line: metadata.line(),
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut fields = EventFields::default();
        event.record(&mut fields);
        let span = ctx.event_span(event).map(|span| span.name().to_string());

        let entry = self.entry(event.metadata(), fields, span);
        let Ok(line) = serde_json::to_string(&entry) else {
            return;
        };
        // a failed log write has nowhere to be reported
        let _ = writeln!(self.make_writer.make_writer(), "{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    #[derive(Clone, Default)]
    struct BufferWriter {
        buf: Arc<Mutex<Vec<u8>>>,
    }

    impl std::io::Write for BufferWriter {
        fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
            self.buf.lock().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for BufferWriter {
        type Writer = BufferWriter;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture<F: FnOnce()>(f: F) -> serde_json::Value {
        let writer = BufferWriter::default();
        let subscriber =
            tracing_subscriber::registry().with(JsonLayer::new("tests".into(), writer.clone()));
        tracing::subscriber::with_default(subscriber, f);

        let raw = String::from_utf8(writer.buf.lock().clone()).unwrap();
        let line = raw.lines().next().expect("one log line");
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_log_entry_serialization() {
        let entry = LogEntry {
            timestamp: "2024-01-15T10:30:00.000000Z".to_string(),
            level: "INFO",
            service: "cli".to_string(),
            pid: 12345,
            target: "meetup_api::client".to_string(),
            message: "request completed".to_string(),
            fields: Map::new(),
            span: None,
            file: Some("src/client.rs".to_string()),
            line: Some(42),
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"service\":\"cli\""));
        assert!(json.contains("\"pid\":12345"));
        assert!(!json.contains("\"fields\""));
    }

    #[test]
    fn test_layer_writes_message_and_fields() {
        let entry = capture(|| {
            tracing::info!(user_id = 7, path = "/accounts/profile/", "profile loaded");
        });

        assert_eq!(entry["message"], "profile loaded");
        assert_eq!(entry["level"], "INFO");
        assert_eq!(entry["service"], "tests");
        assert_eq!(entry["fields"]["user_id"], 7);
        assert_eq!(entry["fields"]["path"], "/accounts/profile/");
    }

    #[test]
    fn test_layer_redacts_credentials() {
        let entry = capture(|| {
            tracing::warn!(
                access_token = "eyJhbGciOi.secret.sig",
                refresh_token = %"opaque-refresh",
                username = "alice",
                "token stored"
            );
        });

        assert_eq!(entry["fields"]["access_token"], REDACTED);
        assert_eq!(entry["fields"]["refresh_token"], REDACTED);
        assert_eq!(entry["fields"]["username"], "alice");
    }
}
