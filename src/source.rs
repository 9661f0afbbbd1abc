// 🌐 Entry Source - The fetch collaborator's boundary
//
// Payloads use the upstream shape:
//   { "id": 1, "name": "bulbasaur",
//     "sprites": { "front_default": "<url>" },
//     "types": [ { "type": { "name": "grass" } } ] }
//
// Any read or decode problem is reported as NetworkFailure; the board then
// leaves its last good snapshot alone.

use crate::entry::{CategoryLabel, Entry};
use crate::error::NetworkFailure;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Completion signal of one fetch
pub type FetchOutcome = Result<Vec<Entry>, NetworkFailure>;

/// Anything that can produce the master list
pub trait EntrySource: Send + Sync {
    fn fetch(&self) -> FetchOutcome;
}

// ============================================================================
// UPSTREAM PAYLOAD
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawEntry {
    id: u32,
    name: String,
    #[serde(default)]
    sprites: RawSprites,
    #[serde(default)]
    types: Vec<RawTypeEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct RawSprites {
    // Upstream sends null for entries without artwork
    #[serde(default)]
    front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTypeEntry {
    #[serde(rename = "type")]
    kind: RawType,
}

#[derive(Debug, Deserialize)]
struct RawType {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Many(Vec<RawEntry>),
    One(RawEntry),
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        Entry::new(
            raw.id,
            raw.name,
            raw.sprites.front_default.unwrap_or_default(),
            raw.types
                .into_iter()
                .map(|entry| CategoryLabel::new(entry.kind.name)),
        )
    }
}

/// Decode a single payload object or an array of them
pub fn parse_entries(json: &str) -> FetchOutcome {
    let payload: RawPayload = serde_json::from_str(json)
        .map_err(|e| NetworkFailure::new(format!("malformed entry payload: {}", e)))?;

    let entries: Vec<Entry> = match payload {
        RawPayload::Many(raw) => raw.into_iter().map(Entry::from).collect(),
        RawPayload::One(raw) => vec![Entry::from(raw)],
    };
    debug!(count = entries.len(), "decoded entry payload");
    Ok(entries)
}

pub fn load_entries(path: &Path) -> FetchOutcome {
    let json = fs::read_to_string(path)
        .map_err(|e| NetworkFailure::new(format!("cannot read {}: {}", path.display(), e)))?;
    parse_entries(&json)
}

// ============================================================================
// FILE SOURCE
// ============================================================================

/// Reads the payload from a JSON file on every fetch
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntrySource for FileSource {
    fn fetch(&self) -> FetchOutcome {
        load_entries(&self.path)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BULBASAUR: &str = r#"{
        "id": 1,
        "name": "bulbasaur",
        "sprites": { "front_default": "https://img.example/1.png" },
        "types": [
            { "slot": 1, "type": { "name": "grass", "url": "x" } },
            { "slot": 2, "type": { "name": "poison", "url": "y" } }
        ],
        "height": 7
    }"#;

    #[test]
    fn test_parse_single_object() {
        let entries = parse_entries(BULBASAUR).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.rank, 1);
        assert_eq!(entry.name, "bulbasaur");
        assert_eq!(entry.thumbnail, "https://img.example/1.png");
        let cats: Vec<&str> = entry.categories.iter().map(|c| c.as_str()).collect();
        assert_eq!(cats, vec!["grass", "poison"]);
    }

    #[test]
    fn test_parse_array_and_null_sprite() {
        let json = format!(
            r#"[{}, {{ "id": 7, "name": "squirtle", "sprites": {{ "front_default": null }},
                "types": [ {{ "type": {{ "name": "water" }} }} ] }}]"#,
            BULBASAUR
        );
        let entries = parse_entries(&json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].thumbnail, "");
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_entries("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_payload_is_network_failure() {
        let err = parse_entries("{ not json").unwrap_err();
        assert!(err.reason.contains("malformed entry payload"));
    }

    #[test]
    fn test_file_source_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[{}]", BULBASAUR).unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.fetch().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_file_is_network_failure() {
        let source = FileSource::new("/nonexistent/entries.json");
        let err = source.fetch().unwrap_err();
        assert!(err.reason.contains("cannot read"));
    }
}
