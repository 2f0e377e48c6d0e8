//! # Frame Parser
//!
//! Grammar of one frame inside the concatenated carrier payload:
//!
//! ```text
//! <header> <frame char> <decimal length> <1 separator byte> <length payload bytes>
//! ```
//!
//! Frame characters are `\ / : * ? " < > |`. An empty header marks a text
//! message; a header that looks like a filename marks a file stub.
//!
//! Framing runs over an ASCII view of the buffer in which every byte
//! `>= 0x80` reads as `?`. Offsets in that view and in the raw buffer are
//! identical, so payload slices are taken from the raw bytes.
//!
//! Decoding is permissive: a declared length running past the end of the
//! buffer yields a short slice, and any malformed frame simply ends the
//! scan with whatever was decoded before it.

use super::record::{DecodedFrames, FileStub};
use regex::bytes::Regex;
use tracing::trace;

/// Reserved framing characters.
pub const FRAME_CHARS: [u8; 9] = [b'\\', b'/', b':', b'*', b'?', b'"', b'<', b'>', b'|'];

const FRAME_PATTERN: &str = r#"([\\/:*?"<>|])([0-9]+)"#;

/// Map a byte to its framing-view character.
#[inline]
fn ascii_view(byte: u8) -> u8 {
    if byte >= 0x80 {
        b'?'
    } else {
        byte
    }
}

/// A header names a file when it is longer than two characters and has a dot.
#[must_use]
pub fn is_file_name(header: &str) -> bool {
    header.len() > 2 && header.contains('.')
}

/// Compiled frame matcher.
#[derive(Debug, Clone)]
pub struct FrameParser {
    pattern: Regex,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Compile the frame pattern.
    #[must_use]
    pub fn new() -> Self {
        // The pattern is a literal; failure here is a programming error caught by tests.
        #[allow(clippy::expect_used)]
        let pattern = Regex::new(FRAME_PATTERN).expect("frame pattern compiles");
        Self { pattern }
    }

    /// Decode every frame in `bytes`.
    ///
    /// Returns `None` when no message and no file stub was found.
    #[must_use]
    pub fn parse(&self, bytes: &[u8]) -> Option<DecodedFrames> {
        let view: Vec<u8> = bytes.iter().copied().map(ascii_view).collect();
        let mut frames = DecodedFrames::default();
        let mut offset = 0usize;

        while offset < view.len() {
            let text = &view[offset..];
            let Some(caps) = self.pattern.captures(text) else {
                break;
            };
            let (Some(whole), Some(digits)) = (caps.get(0), caps.get(2)) else {
                break;
            };

            // Signed 32-bit, as declared lengths always have been
            let Some(declared) = std::str::from_utf8(digits.as_bytes())
                .ok()
                .and_then(|d| d.parse::<i32>().ok())
            else {
                trace!(offset, "Frame length overflow, stopping");
                break;
            };
            let declared = declared as usize;

            // A reserved char ahead of the matched frame means the header is garbage
            let first_reserved = text.iter().position(|b| FRAME_CHARS.contains(b));
            if first_reserved != Some(whole.start()) {
                trace!(offset, "Reserved character before frame, stopping");
                break;
            }

            let header_size = whole.end() + 1;
            let header = String::from_utf8_lossy(&text[..whole.start()]).into_owned();

            let start = (offset + header_size).min(bytes.len());
            let end = (offset + header_size).saturating_add(declared).min(bytes.len());
            let payload = &bytes[start..end];

            if is_file_name(&header) {
                frames.upsert_file(FileStub {
                    name: header,
                    declared_len: declared as u64,
                    available_len: payload.len() as u64,
                });
            } else if header.is_empty() && payload.len() > 1 {
                frames
                    .messages
                    .push(String::from_utf8_lossy(payload).into_owned());
            } else {
                trace!(offset, header = %header, "Unrecognised frame header, stopping");
                break;
            }

            let advance = header_size.saturating_add(declared);
            if advance > text.len() {
                break;
            }
            offset += advance;
        }

        if frames.is_empty() {
            None
        } else {
            Some(frames)
        }
    }
}
