//! Output formatting for CLI commands.
//!
//! Command results are written either as a human-readable table or as
//! pretty-printed JSON, picked once by `--format`.

use std::io::Write;

use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Writes command results in the format selected on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormat(Format);

impl OutputFormat {
    /// Creates a writer for `format`.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self(format)
    }

    /// Writes `value`, followed by a newline in JSON mode.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.0 {
            Format::Json => writeln!(writer, "{}", pretty_json(value)?)?,
            Format::Table => value.write_table(writer)?,
        }
        Ok(())
    }

    /// Renders `value` to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

/// Human-readable rendering of a command result.
pub trait TableDisplay {
    /// Writes the value for a terminal.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Serializes `value` as two-space indented JSON.
///
/// # Errors
///
/// Returns an error if `value` can't be serialized.
pub fn pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))
}

/// One-line status reported by commands that change the saved settings.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// Text shown to the user.
    pub message: String,
    /// Set when something was changed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub success: bool,
}

impl Message {
    /// A change was made.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }

    /// Nothing was changed.
    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

impl TableDisplay for Message {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        let mark = if self.success { "✓ " } else { "" };
        writeln!(writer, "{mark}{}", self.message)?;
        Ok(())
    }
}

/// Shortens a secret for display, keeping a short prefix.
#[must_use]
pub fn mask(secret: &str) -> String {
    const VISIBLE: usize = 8;
    if secret.is_empty() {
        return String::new();
    }
    match secret.char_indices().nth(VISIBLE) {
        Some((idx, _)) => format!("{}...", &secret[..idx]),
        None => "*".repeat(secret.chars().count()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_table() {
        let output = OutputFormat::default()
            .to_string(&Message::success("Logged in"))
            .expect("should format");
        assert_eq!(output, "✓ Logged in\n");
    }

    #[test]
    fn message_info_has_no_mark() {
        let output = OutputFormat::new(Format::Table)
            .to_string(&Message::info("Nothing to do"))
            .expect("should format");
        assert_eq!(output, "Nothing to do\n");
    }

    #[test]
    fn message_json_omits_false_success() {
        let mut buf = Vec::new();
        OutputFormat::new(Format::Json)
            .write(&mut buf, &Message::info("hello"))
            .expect("should write");

        let parsed: serde_json::Value = serde_json::from_slice(&buf).expect("valid json");
        assert_eq!(parsed["message"], "hello");
        assert!(parsed.get("success").is_none());
        assert!(buf.ends_with(b"}\n"));
    }

    #[test]
    fn pretty_json_uses_two_spaces() {
        let text = pretty_json(&serde_json::json!({ "a": 1 })).expect("json");
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn mask_long_secret() {
        assert_eq!(mask("eyJhbGciOiJSUzI1NiJ9"), "eyJhbGci...");
    }

    #[test]
    fn mask_short_secret() {
        assert_eq!(mask("abc"), "***");
        assert_eq!(mask(""), "");
    }
}
