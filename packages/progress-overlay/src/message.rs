use futures::{
    io::{AsyncBufRead, AsyncBufReadExt},
    stream::{self, Stream},
};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

/// The parameters of a "progress" instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ProgressRequest {
    /// How long the bar takes to fill, in milliseconds. Invalid or negative input reads as 0.
    #[serde(default, rename = "duration", deserialize_with = "lenient_duration")]
    pub duration_ms: u64,

    /// The caption shown above the track. Non-string input reads as empty.
    #[serde(default, deserialize_with = "lenient_label")]
    pub label: String,
}

impl ProgressRequest {
    /// Creates a request for a run of `duration_ms` milliseconds.
    pub fn new(duration_ms: u64, label: impl Into<String>) -> Self {
        Self {
            duration_ms,
            label: label.into(),
        }
    }
}

/// An instruction sent by the host.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum HostMessage {
    /// Start a new run, replacing whatever is shown.
    Progress(ProgressRequest),
    /// Interrupt the current run.
    Cancel,
}

impl HostMessage {
    /// Decodes a raw payload. Anything that isn't a recognized instruction yields `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        HostMessage::deserialize(value).ok()
    }
}

fn lenient_duration<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(ms), _) => ms,
            (None, Some(ms)) if ms.is_finite() && ms > 0.0 => ms.trunc() as u64,
            _ => 0,
        },
        Value::String(s) => parse_duration(&s),
        _ => 0,
    })
}

fn lenient_label<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

/// Reads the leading integer of `s`, the way a lenient `parseInt` does.
fn parse_duration(s: &str) -> u64 {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit);
    if negative {
        return 0;
    }
    digits.fold(0u64, |acc, d| {
        acc.saturating_mul(10).saturating_add(u64::from(d - b'0'))
    })
}

fn parse_line(line: &[u8]) -> Option<Value> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    serde_json::from_slice(line)
        .map_err(|err| debug!(%err, "skipping malformed host message"))
        .ok()
}

/// Turns a line-oriented reader of JSON documents into a stream of raw payloads.
///
/// Blank lines and lines that aren't JSON (including ones that aren't UTF-8) are skipped. The
/// stream ends at EOF or on the first read error.
pub fn json_lines<R>(reader: R) -> impl Stream<Item = Value>
where
    R: AsyncBufRead + Unpin,
{
    stream::unfold(reader, |mut reader| async move {
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) => return None,
                Ok(_) => {
                    if let Some(value) = parse_line(&line) {
                        return Some((value, reader));
                    }
                }
                Err(err) => {
                    debug!(%err, "stopped reading host messages");
                    return None;
                }
            }
        }
    })
}
