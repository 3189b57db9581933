use std::io::{self, IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use pipeframe_transport::{method_of, Message};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    /// One JSON envelope per message.
    Json,
    Table,
    /// Indented JSON.
    Pretty,
    /// The message itself as compact JSON, one per line.
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    index: usize,
    method: Option<&'a str>,
    payload_size: usize,
    message: &'a Message,
}

/// A decoded message plus where it sat in the stream.
pub struct Received<'a> {
    pub index: usize,
    pub payload_size: usize,
    pub message: &'a Message,
}

pub fn write_message<W: Write>(
    out: &mut W,
    received: &Received<'_>,
    format: OutputFormat,
) -> io::Result<()> {
    let method = method_of(received.message);
    match format {
        OutputFormat::Json => {
            let envelope = MessageOutput {
                index: received.index,
                method,
                payload_size: received.payload_size,
                message: received.message,
            };
            serde_json::to_writer(&mut *out, &envelope)?;
            writeln!(out)?;
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "METHOD", "SIZE", "MESSAGE"])
                .add_row(vec![
                    received.index.to_string(),
                    method.unwrap_or("-").to_string(),
                    received.payload_size.to_string(),
                    message_preview(received.message),
                ]);
            writeln!(out, "{table}")?;
        }
        OutputFormat::Pretty => {
            writeln!(
                out,
                "#{} method={} size={}",
                received.index,
                method.unwrap_or("-"),
                received.payload_size
            )?;
            serde_json::to_writer_pretty(&mut *out, received.message)?;
            writeln!(out)?;
        }
        OutputFormat::Raw => {
            serde_json::to_writer(&mut *out, received.message)?;
            writeln!(out)?;
        }
    }
    out.flush()
}

const PREVIEW_LIMIT: usize = 120;

fn message_preview(message: &Message) -> String {
    let text = message.to_string();
    if text.chars().count() <= PREVIEW_LIMIT {
        return text;
    }
    let mut cut: String = text.chars().take(PREVIEW_LIMIT).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn render(message: &Message, format: OutputFormat) -> String {
        let mut out: Vec<u8> = Vec::new();
        write_message(
            &mut out,
            &Received {
                index: 3,
                payload_size: 24,
                message,
            },
            format,
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn json_envelope_carries_method_and_size() {
        let line = render(&json!({"method": "ping", "id": 1}), OutputFormat::Json);
        let value: Message = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(value["index"], 3);
        assert_eq!(value["method"], "ping");
        assert_eq!(value["payload_size"], 24);
        assert_eq!(value["message"]["id"], 1);
    }

    #[test]
    fn raw_output_is_one_line_of_json() {
        let text = render(&json!({"id": 1, "method": "ping"}), OutputFormat::Raw);
        assert_eq!(text, "{\"id\":1,\"method\":\"ping\"}\n");
    }

    #[test]
    fn missing_method_renders_dash() {
        let text = render(&json!([1, 2]), OutputFormat::Pretty);
        assert!(text.starts_with("#3 method=- size=24\n"));
    }

    #[test]
    fn long_messages_are_cut_in_table() {
        let preview = message_preview(&json!("x".repeat(500)));
        assert_eq!(preview.chars().count(), PREVIEW_LIMIT + 1);
        assert!(preview.ends_with('…'));
    }
}
