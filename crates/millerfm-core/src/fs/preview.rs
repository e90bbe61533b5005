//! Text previews for the preview column.

use crate::error::{CoreError, CoreResult};
use crate::fs::gateway::FsGateway;

/// The number of bytes to inspect for binary (null-byte) detection.
const BINARY_CHECK_SIZE: usize = 8192;

/// A truncated text preview of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPreview {
    /// The preview lines (up to `max_lines`).
    pub lines: Vec<String>,
    /// Total number of lines in the file.
    pub total_lines: usize,
    /// `true` when the file has more lines than were kept.
    pub is_truncated: bool,
}

impl TextPreview {
    /// Builds a preview from raw file contents.
    ///
    /// Invalid UTF-8 is replaced lossily. Escape sequences and control
    /// characters other than tabs are removed from each line.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotPreviewable`] if the bytes look binary.
    pub fn from_bytes(bytes: &[u8], max_lines: usize) -> CoreResult<Self> {
        if is_binary(bytes) {
            return Err(CoreError::NotPreviewable("binary content".to_string()));
        }

        let text = String::from_utf8_lossy(bytes);
        let mut lines = Vec::with_capacity(max_lines.min(256));
        let mut total_lines = 0;
        for line in text.lines() {
            total_lines += 1;
            if lines.len() < max_lines {
                lines.push(strip_control(line));
            }
        }

        Ok(Self {
            lines,
            total_lines,
            is_truncated: total_lines > max_lines,
        })
    }
}

/// Reads `path` through the gateway and builds a [`TextPreview`].
pub async fn read_text_preview<G: FsGateway + ?Sized>(
    gateway: &G,
    path: &str,
    max_lines: usize,
) -> CoreResult<TextPreview> {
    let bytes = gateway.read(path).await?;
    TextPreview::from_bytes(&bytes, max_lines)
}

/// Returns `true` if a NUL byte appears in the first 8 KiB.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes[..bytes.len().min(BINARY_CHECK_SIZE)].contains(&0)
}

/// Strips ANSI escape sequences and stray control characters.
///
/// Handles CSI sequences (`\x1b[...`), OSC sequences (`\x1b]...\x07`) and
/// single-character escape codes.
fn strip_control(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            match chars.peek() {
                Some('[') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next.is_ascii_alphabetic() {
                            break;
                        }
                    }
                }
                Some(']') => {
                    chars.next();
                    while let Some(next) = chars.next() {
                        if next == '\x07' {
                            break;
                        }
                        if next == '\x1b' && chars.peek() == Some(&'\\') {
                            chars.next();
                            break;
                        }
                    }
                }
                Some(_) => {
                    chars.next();
                }
                None => {}
            }
        } else if c == '\t' || !c.is_control() {
            result.push(c);
        }
    }

    result
}
