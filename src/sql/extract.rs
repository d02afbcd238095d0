//! Cleanup of raw model completions into a single SQL candidate.
//!
//! Models are told to answer with bare SQL but often wrap it in markdown
//! fences or put a sentence in front of a fenced block. Cleanup is purely
//! textual; whether the result is valid SQL is only known once it runs.

use crate::error::{AppError, AppResult};
use crate::models::SqlCandidate;

const FENCE: &str = "```";

/// Info strings that may follow an opening fence.
const LANGUAGE_TAGS: &[&str] = &["postgresql", "postgres", "pgsql", "mysql", "sql"];

/// Strip fences and surrounding whitespace from a completion.
///
/// When the completion contains a complete fenced block, only its contents
/// are kept, which drops any prose around it. The result never contains a
/// fence marker, so applying this twice gives the same text as applying it once.
pub fn clean_completion(raw: &str) -> String {
    let body = fenced_block(raw).unwrap_or(raw);
    let mut text = body.to_string();
    while let Some(pos) = text.find(FENCE) {
        let end = pos + FENCE.len();
        let tag_len = language_tag_len(&text[end..]);
        text.replace_range(pos..end + tag_len, "");
    }
    text.trim().to_string()
}

/// Turn a completion into a candidate statement.
///
/// Fails with an extraction error when nothing is left after cleanup.
pub fn extract_sql(raw: &str) -> AppResult<SqlCandidate> {
    SqlCandidate::new(clean_completion(raw))
        .ok_or_else(|| AppError::extraction("nothing left after removing code fences"))
}

/// Contents of the first complete fenced block with something in it, without
/// its language tag.
///
/// The closing fence of an empty block opens the next one when a language tag
/// follows it.
fn fenced_block(raw: &str) -> Option<&str> {
    let mut from = 0;
    loop {
        let open = raw[from..].find(FENCE)? + from + FENCE.len();
        let close = raw[open..].find(FENCE)? + open;
        let inner = &raw[open..close];
        let body = &inner[language_tag_len(inner)..];
        if !body.trim().is_empty() {
            return Some(body);
        }
        let after_close = close + FENCE.len();
        from = if language_tag_len(&raw[after_close..]) > 0 {
            close
        } else {
            after_close
        };
    }
}

/// Length of a language tag at the start of `after`, or 0 when there is none.
///
/// A tag ends at whitespace or at the end of the text.
fn language_tag_len(after: &str) -> usize {
    let word_len = after
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after.len());
    let word = &after[..word_len];
    let terminated = after[word_len..]
        .chars()
        .next()
        .is_none_or(char::is_whitespace);
    if terminated && LANGUAGE_TAGS.iter().any(|tag| word.eq_ignore_ascii_case(tag)) {
        word_len
    } else {
        0
    }
}
