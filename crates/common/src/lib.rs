use std::fmt;
use std::path::{Path, MAIN_SEPARATOR};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Selects which facet a browse or media query walks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseType {
    #[default]
    File,
    AlbumArtist,
    Genre,
    Year,
    Modified,
}

impl BrowseType {
    pub const ALL: [BrowseType; 5] = [
        BrowseType::File,
        BrowseType::AlbumArtist,
        BrowseType::Genre,
        BrowseType::Year,
        BrowseType::Modified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BrowseType::File => "file",
            BrowseType::AlbumArtist => "albumartist",
            BrowseType::Genre => "genre",
            BrowseType::Year => "year",
            BrowseType::Modified => "modified",
        }
    }
}

impl fmt::Display for BrowseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseBrowseTypeError(pub String);

impl fmt::Display for ParseBrowseTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported browse type: {}", self.0)
    }
}

impl std::error::Error for ParseBrowseTypeError {}

impl FromStr for BrowseType {
    type Err = ParseBrowseTypeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" | "folder" => Ok(BrowseType::File),
            "albumartist" => Ok(BrowseType::AlbumArtist),
            "genre" => Ok(BrowseType::Genre),
            "year" => Ok(BrowseType::Year),
            "modified" => Ok(BrowseType::Modified),
            _ => Err(ParseBrowseTypeError(value.to_string())),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowseOptions {
    pub text_filter: String,
    pub browse_type: BrowseType,
}

impl BrowseOptions {
    pub fn new(browse_type: BrowseType, text_filter: impl Into<String>) -> Self {
        Self {
            text_filter: text_filter.into(),
            browse_type,
        }
    }
}

/// Shallow projection of one node, as handed to clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseItem {
    pub name: String,
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
    pub folder: bool,
}

/// Builds `scheme:///seg1/seg2/...` with every segment percent-escaped.
pub fn encode_custom_key<S: AsRef<str>>(scheme: &str, segments: &[S]) -> String {
    let mut out = String::with_capacity(scheme.len() + 3 + segments.len() * 16);
    out.push_str(scheme);
    out.push_str("://");
    for segment in segments {
        out.push('/');
        out.push_str(&urlencoding::encode(segment.as_ref()));
    }
    out
}

/// Turns a filesystem path into a `file://` locator. An empty path yields an
/// empty string.
pub fn encode_file_key(path: &Path) -> String {
    let raw = path_to_slash_string(path);
    if raw.is_empty() {
        return String::new();
    }

    let mut out = String::with_capacity(raw.len() + 8);
    out.push_str("file://");
    if !raw.starts_with('/') {
        out.push('/');
    }
    for (idx, part) in raw.split('/').enumerate() {
        if idx > 0 {
            out.push('/');
        }
        out.push_str(&urlencoding::encode(part));
    }
    out
}

fn path_to_slash_string(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if MAIN_SEPARATOR == '/' {
        raw.into_owned()
    } else {
        raw.replace(MAIN_SEPARATOR, "/")
    }
}
