use std::borrow::Cow;
use std::fmt;

use tracing::trace;

/// A normalized path reported by `git status`, relative to the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChangedPath(String);

impl ChangedPath {
    pub fn new(path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        let trimmed = path.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One raw line of porcelain status output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeLine<'a> {
    pub status: &'a str,
    pub path: Cow<'a, str>,
}

impl<'a> ChangeLine<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim_end_matches('\r');
        let (status, rest) = match split_status(line) {
            Some(parts) => parts,
            None => ("", line),
        };

        // Only renames and copies carry `old -> new`; the new path is what changed.
        let moved = status.contains(['R', 'C']);
        let (first, remainder) = take_field(rest.trim(), moved);
        let path = match remainder.strip_prefix(" -> ") {
            Some(destination) if moved => take_field(destination, false).0,
            _ => first,
        };

        Self { status, path }
    }
}

/// Reads one path field, unquoting git's C-style quoting when present.
fn take_field(input: &str, stop_at_arrow: bool) -> (Cow<'_, str>, &str) {
    if let Some(quoted) = input.strip_prefix('"') {
        if let Some((field, consumed)) = unquote(quoted) {
            return (Cow::Owned(field), &quoted[consumed..]);
        }
    }
    if stop_at_arrow {
        if let Some(index) = input.find(" -> ") {
            return (Cow::Borrowed(&input[..index]), &input[index..]);
        }
    }
    (Cow::Borrowed(input), "")
}

/// Decodes a quoted field up to its closing quote. Returns the text and the
/// number of bytes consumed, including the closing quote.
fn unquote(quoted: &str) -> Option<(String, usize)> {
    let bytes = quoted.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'"' => {
                let text = String::from_utf8_lossy(&decoded).into_owned();
                return Some((text, index + 1));
            }
            b'\\' => {
                let escaped = *bytes.get(index + 1)?;
                match escaped {
                    b'0'..=b'7' => {
                        let digits = bytes.get(index + 1..index + 4)?;
                        let octal = std::str::from_utf8(digits).ok()?;
                        decoded.push(u8::from_str_radix(octal, 8).ok()?);
                        index += 4;
                        continue;
                    }
                    b'n' => decoded.push(b'\n'),
                    b't' => decoded.push(b'\t'),
                    b'r' => decoded.push(b'\r'),
                    b'a' => decoded.push(0x07),
                    b'b' => decoded.push(0x08),
                    b'f' => decoded.push(0x0c),
                    b'v' => decoded.push(0x0b),
                    other => decoded.push(other),
                }
                index += 2;
            }
            other => {
                decoded.push(other);
                index += 1;
            }
        }
    }
    None
}

fn split_status(line: &str) -> Option<(&str, &str)> {
    let bytes = line.as_bytes();
    if bytes.len() < 3 || bytes[2] != b' ' {
        return None;
    }
    let is_status = |b: u8| {
        matches!(
            b,
            b' ' | b'M' | b'T' | b'A' | b'D' | b'R' | b'C' | b'U' | b'?' | b'!'
        )
    };
    if is_status(bytes[0]) && is_status(bytes[1]) {
        Some((&line[..2], &line[3..]))
    } else {
        None
    }
}

/// Strips status prefixes from `git status --porcelain` output and drops blank lines,
/// preserving emission order.
pub fn normalize_status_output(output: &str) -> Vec<ChangedPath> {
    output
        .split('\n')
        .filter_map(|raw| {
            let line = ChangeLine::parse(raw);
            if !line.status.is_empty() {
                trace!(status = line.status, path = %line.path, "status line");
            }
            ChangedPath::new(line.path)
        })
        .collect()
}
