//! Structured JSON logger
//!
//! One log line = one event, written synchronously with no buffering.
//! Keys are emitted in deterministic order (event and severity first, then
//! the remaining fields sorted by key) so log output is diffable across
//! runs. Non-fatal repairs performed during a restore are reported here at
//! WARN severity in addition to being returned to the caller.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations.
    Info = 0,
    /// Recoverable issues (repairs applied, decoding continued).
    Warn = 1,
    /// Operation failures.
    Error = 2,
    /// Unrecoverable; the restore aborts.
    Fatal = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Synchronous structured logger.
pub struct Logger;

impl Logger {
    /// Logs an event to stdout.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, String)]) {
        Self::write_event(severity, event, fields, &mut io::stdout());
    }

    /// Logs an event to stderr (warnings, errors, fatal messages).
    pub fn log_stderr(severity: Severity, event: &str, fields: &[(&str, String)]) {
        Self::write_event(severity, event, fields, &mut io::stderr());
    }

    fn write_event<W: Write>(
        severity: Severity,
        event: &str,
        fields: &[(&str, String)],
        writer: &mut W,
    ) {
        let mut line = String::with_capacity(128);
        line.push_str("{\"event\":\"");
        escape_into(&mut line, event);
        line.push_str("\",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(key, _)| *key);
        for (key, value) in sorted {
            line.push_str(",\"");
            escape_into(&mut line, key);
            line.push_str("\":\"");
            escape_into(&mut line, value);
            line.push('"');
        }
        line.push_str("}\n");

        // One write, one flush; a logging failure must never fail a restore.
        let _ = writer.write_all(line.as_bytes());
        let _ = writer.flush();
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(severity: Severity, event: &str, fields: &[(&str, String)]) -> String {
        let mut buf = Vec::new();
        Logger::write_event(severity, event, fields, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_event_and_severity_lead() {
        let line = render(Severity::Warn, "soil_moisture_clamped", &[]);
        assert!(line.starts_with("{\"event\":\"soil_moisture_clamped\",\"severity\":\"WARN\""));
        assert!(line.ends_with("}\n"));
    }

    #[test]
    fn test_fields_sorted_for_determinism() {
        let fields = [("tile", "2".to_string()), ("band", "0".to_string())];
        let line = render(Severity::Warn, "e", &fields);
        let band = line.find("\"band\"").unwrap();
        let tile = line.find("\"tile\"").unwrap();
        assert!(band < tile);
    }

    #[test]
    fn test_escaping() {
        let fields = [("msg", "a\"b\\c\nd".to_string())];
        let line = render(Severity::Info, "e", &fields);
        assert!(line.contains(r#"a\"b\\c\nd"#));
    }

    #[test]
    fn test_one_event_per_line() {
        let line = render(Severity::Info, "event", &[("k", "v".to_string())]);
        assert_eq!(line.matches('\n').count(), 1);
    }
}
