// Leaderboard page wire format: decoding, trailing-comma repair, and record
// validation.
//
// Expected body:
//   { "_metadata": {"page": 1, "page_count": 3},
//     "records": [ {"rank": 1, "score": 900, "player_name": "..", "avatar_url": ".."} ] }

use std::borrow::Cow;

use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::error::LoadError;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Metadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub page: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub page_count: i64,
}

/// One record as sent by the server. Missing or null fields fall back to
/// their defaults, which makes the record invalid rather than the page.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Record {
    #[serde(default, deserialize_with = "null_as_default")]
    pub rank: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub score: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub player_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub avatar_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Page {
    #[serde(rename = "_metadata", default)]
    pub metadata: Option<Metadata>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub records: Vec<Record>,
}

/// A record that passed validation. Only these reach the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRecord {
    pub rank: u32,
    pub score: i64,
    pub player_name: String,
    pub avatar_url: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Record {
    /// `rank` in `1..=u32::MAX`, `score > 0`, and both strings non-empty.
    pub fn is_valid(&self) -> bool {
        self.rank > 0
            && self.rank <= i64::from(u32::MAX)
            && self.score > 0
            && !self.player_name.is_empty()
            && !self.avatar_url.is_empty()
    }

    pub fn validate(self) -> Option<RankedRecord> {
        if !self.is_valid() {
            return None;
        }
        let rank = u32::try_from(self.rank).ok()?;
        Some(RankedRecord {
            rank,
            score: self.score,
            player_name: self.player_name,
            avatar_url: self.avatar_url,
        })
    }
}

impl Page {
    /// Number of pages announced by the server; 1 when absent or nonsensical.
    pub fn page_count(&self) -> u32 {
        self.metadata
            .as_ref()
            .map(|m| m.page_count)
            .filter(|&count| count > 0)
            .and_then(|count| u32::try_from(count).ok())
            .unwrap_or(1)
    }

    /// Consume the page, keeping only valid records. Dropped records are
    /// logged, never reported as errors.
    pub fn into_valid_records(self, page_number: u32) -> Vec<RankedRecord> {
        let total = self.records.len();
        let mut valid = Vec::with_capacity(total);
        for record in self.records {
            if !record.is_valid() {
                debug!(page = page_number, record = ?record, "dropping invalid record");
                continue;
            }
            valid.extend(record.validate());
        }
        let dropped = total - valid.len();
        if dropped > 0 {
            warn!(page = page_number, dropped, total, "page contained invalid records");
        }
        valid
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decode a page body. Trailing commas before `}`/`]` are stripped first
/// (logged as a warning); anything still malformed is a `Decode` error.
pub fn decode_page(body: &[u8]) -> Result<Page, LoadError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| LoadError::Decode(format!("body is not UTF-8: {e}")))?;
    if text.trim().is_empty() {
        return Err(LoadError::Decode("body is empty".to_string()));
    }

    let repaired = repair_trailing_commas(text);
    if let Cow::Owned(ref fixed) = repaired {
        warn!(
            removed = text.len() - fixed.len(),
            "page JSON had trailing commas; repaired before parsing"
        );
    }

    serde_json::from_str(&repaired).map_err(|e| LoadError::Decode(e.to_string()))
}

/// Strip every comma that is followed (after optional whitespace) by `}` or
/// `]`. Commas inside string literals are left alone. Returns the input
/// unchanged (borrowed) when nothing needed fixing.
pub fn repair_trailing_commas(json: &str) -> Cow<'_, str> {
    let bytes = json.as_bytes();
    let mut repaired: Option<String> = None;
    let mut copied_up_to = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b',' if closes_next(&bytes[i + 1..]) => {
                let buf = repaired.get_or_insert_with(|| String::with_capacity(json.len()));
                buf.push_str(&json[copied_up_to..i]);
                copied_up_to = i + 1;
            }
            _ => {}
        }
    }

    match repaired {
        None => Cow::Borrowed(json),
        Some(mut buf) => {
            buf.push_str(&json[copied_up_to..]);
            Cow::Owned(buf)
        }
    }
}

fn closes_next(rest: &[u8]) -> bool {
    rest.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| matches!(b, b'}' | b']'))
}

/// URL of page `page` under `base`.
pub fn page_url(base: &str, page: u32) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}page={page}")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
