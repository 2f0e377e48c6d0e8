//! # Content References
//!
//! Messages point at content-network objects with a marker
//! (`<<CONTENT:<hash>\<file name>>>`, or the older `<<IPFS:...>>` spelling)
//! or with a bare content id. The marker form wins when both appear.

use regex::Regex;

/// Marker form. Group 1 is the hash, group 2 the optional file name.
const MARKER_PATTERN: &str = r"<<(?:CONTENT|IPFS):([a-zA-Z0-9]+)(?:\\([^>]+))?>>";

/// Bare CIDv0 (`Qm...`) or CIDv1 (`baf...`) token.
const BARE_PATTERN: &str = r"\b(Qm[a-zA-Z0-9]{44,}|baf[a-zA-Z0-9]{50,})\b";

/// A `\<file name>>>` trailer anywhere in the text; names bare references.
const TRAILER_PATTERN: &str = r"\\([^>]+)>>";

/// A content reference found in a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentReference {
    /// Content id.
    pub hash: String,
    /// File name carried by the marker or a trailing `\name>>`, if any.
    pub file_name: Option<String>,
}

impl ContentReference {
    /// The marker's file name, else `<hash>.bin`.
    #[must_use]
    pub fn file_name_or_default(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("{}.bin", self.hash))
    }
}

/// Finds content references in message text.
#[derive(Debug, Clone)]
pub struct ReferenceExtractor {
    marker: Regex,
    bare: Regex,
    trailer: Regex,
}

impl Default for ReferenceExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReferenceExtractor {
    /// Compile the patterns.
    #[must_use]
    pub fn new() -> Self {
        #[allow(clippy::expect_used)]
        let marker = Regex::new(MARKER_PATTERN).expect("marker pattern compiles");
        #[allow(clippy::expect_used)]
        let bare = Regex::new(BARE_PATTERN).expect("bare hash pattern compiles");
        #[allow(clippy::expect_used)]
        let trailer = Regex::new(TRAILER_PATTERN).expect("trailer pattern compiles");
        Self {
            marker,
            bare,
            trailer,
        }
    }

    /// First reference in `text`, if any.
    #[must_use]
    pub fn extract(&self, text: &str) -> Option<ContentReference> {
        if let Some(caps) = self.marker.captures(text) {
            return Some(ContentReference {
                hash: caps[1].to_string(),
                file_name: caps.get(2).map(|m| m.as_str().to_string()),
            });
        }
        let hash = self.bare.find(text)?.as_str().to_string();
        let file_name = self
            .trailer
            .captures(text)
            .map(|caps| caps[1].to_string());
        Some(ContentReference { hash, file_name })
    }
}
