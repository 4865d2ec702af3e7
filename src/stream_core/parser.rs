//! Revision event parsing from raw SSE payload lines

use chrono::Utc;
use serde::Deserialize;

/// SSE payload marker. Stripped before decoding; comment/event/id control
/// lines never reach the parser (filtered by the controller).
pub const DATA_PREFIX: &str = "data: ";

/// An accepted revision event. Immutable once constructed; never built for
/// bot-authored edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub domain: String,
    pub page_title: String,
    pub user: String,
    pub user_edit_count: u64,
    /// Unix seconds, stamped from the local wall clock at parse time. The
    /// payload's own timestamps are ignored so window age is immune to
    /// upstream clock skew.
    pub observed_at: i64,
}

#[derive(Debug)]
pub enum Rejection {
    /// The payload was not valid JSON.
    Malformed(serde_json::Error),
    /// Structurally valid JSON missing a required field.
    MissingField(&'static str),
    /// A bot-authored edit. A deliberate filter, not an error.
    BotFiltered,
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rejection::Malformed(e) => write!(f, "malformed payload: {}", e),
            Rejection::MissingField(field) => write!(f, "missing field: {}", field),
            Rejection::BotFiltered => write!(f, "bot edit filtered"),
        }
    }
}

impl std::error::Error for Rejection {}

// Raw schema with optional fields so a missing key is distinguishable from
// malformed JSON.
#[derive(Debug, Deserialize)]
struct RawChange {
    meta: Option<RawMeta>,
    page_title: Option<String>,
    performer: Option<RawPerformer>,
}

#[derive(Debug, Deserialize)]
struct RawMeta {
    domain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPerformer {
    user_text: Option<String>,
    #[serde(default)]
    user_edit_count: u64,
    #[serde(default)]
    user_is_bot: bool,
}

/// Decode one payload line into an [`Event`].
///
/// Pure apart from the `observed_at` stamp; all diagnostics are left to the
/// caller.
pub fn parse(line: &str) -> Result<Event, Rejection> {
    let payload = line.strip_prefix(DATA_PREFIX).unwrap_or(line);

    let raw: RawChange = serde_json::from_str(payload).map_err(Rejection::Malformed)?;

    let domain = raw
        .meta
        .and_then(|m| m.domain)
        .ok_or(Rejection::MissingField("meta.domain"))?;
    let page_title = raw
        .page_title
        .ok_or(Rejection::MissingField("page_title"))?;
    let performer = raw
        .performer
        .ok_or(Rejection::MissingField("performer"))?;
    let user = performer
        .user_text
        .ok_or(Rejection::MissingField("performer.user_text"))?;

    if performer.user_is_bot {
        return Err(Rejection::BotFiltered);
    }

    Ok(Event {
        domain,
        page_title,
        user,
        user_edit_count: performer.user_edit_count,
        observed_at: Utc::now().timestamp(),
    })
}
