use anyhow::{bail, Context, Result};
use std::io::BufRead;

/// Largest accepted offset: 100 years of trace time.
pub const MAX_OFFSET_MS: u64 = 100 * 365 * 24 * 60 * 60 * 1000;

/// One request in a replay trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Milliseconds since the start of the trace.
    pub offset_ms: u64,
    pub key: String,
}

/// Parse a trace of `<offset_ms> <client_key>` lines.
///
/// Blank lines and `#` comments are skipped. Offsets must not go backwards.
pub fn parse_trace(reader: impl BufRead) -> Result<Vec<TraceEntry>> {
    let mut entries = Vec::new();
    let mut last_offset = 0;

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read trace line {line_no}"))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut parts = line.split_whitespace();
        let (Some(offset), Some(key), None) = (parts.next(), parts.next(), parts.next()) else {
            bail!("line {line_no}: expected `<offset_ms> <client_key>`, got {line:?}");
        };
        let offset_ms: u64 = offset
            .parse()
            .with_context(|| format!("line {line_no}: invalid offset {offset:?}"))?;
        if offset_ms > MAX_OFFSET_MS {
            bail!("line {line_no}: offset {offset_ms} exceeds maximum of {MAX_OFFSET_MS} ms");
        }
        if offset_ms < last_offset {
            bail!("line {line_no}: offset {offset_ms} is earlier than previous offset {last_offset}");
        }
        last_offset = offset_ms;

        entries.push(TraceEntry {
            offset_ms,
            key: key.to_string(),
        });
    }

    Ok(entries)
}
