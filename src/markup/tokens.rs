/*!
 * Canonical `{k}` token handling.
 *
 * Abstracted text carries structural markers as canonical tokens: an ASCII
 * opening brace, a decimal id without leading zeros, and an ASCII closing
 * brace. Anything else that looks like a brace group (padded, non-numeric,
 * unterminated, full-width) is reported as malformed so it can never be
 * mistaken for a real token.
 */

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

/// Token identifier, dense from 1 in document order
pub type TokenId = usize;

/// Loosened token-like pattern: a brace group of up to 32 characters on one
/// line, an unterminated opener with any digits after it (`{12`), or a stray
/// closing brace. Full-width braces count as braces.
static TOKEN_GROUP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[{｛][^{}｛｝\r\n]{0,32}[}｝]|[{｛](?:[0-9 ]*[0-9])?|[}｝]").expect("Invalid token group regex")
});

/// A slice of abstracted text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Piece<'a> {
    /// Plain text between tokens
    Text(&'a str),
    /// A canonical token
    Token {
        /// Parsed id
        id: TokenId,
        /// Exact token text
        text: &'a str,
    },
    /// A brace group that is not a canonical token
    Malformed(&'a str),
}

/// Render the canonical token for an id
pub fn token(id: TokenId) -> String {
    format!("{{{}}}", id)
}

fn parse_canonical(group: &str) -> Option<TokenId> {
    let inner = group.strip_prefix('{')?.strip_suffix('}')?;
    if inner.is_empty() || !inner.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let id: TokenId = inner.parse().ok()?;
    // `{01}` is not the canonical spelling of token 1
    (id.to_string() == inner).then_some(id)
}

/// Split text into plain runs, canonical tokens and malformed brace groups
pub fn scan(text: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for group in TOKEN_GROUP_REGEX.find_iter(text) {
        if last < group.start() {
            pieces.push(Piece::Text(&text[last..group.start()]));
        }
        let group_text = group.as_str();
        pieces.push(match parse_canonical(group_text) {
            Some(id) => Piece::Token { id, text: group_text },
            None => Piece::Malformed(group_text),
        });
        last = group.end();
    }

    if last < text.len() {
        pieces.push(Piece::Text(&text[last..]));
    }
    pieces
}

/// Canonical token ids in order of appearance
pub fn token_ids(text: &str) -> Vec<TokenId> {
    scan(text)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Token { id, .. } => Some(id),
            _ => None,
        })
        .collect()
}

/// Token multiset: count per id
pub fn token_counts(text: &str) -> BTreeMap<TokenId, usize> {
    let mut counts = BTreeMap::new();
    for id in token_ids(text) {
        *counts.entry(id).or_insert(0) += 1;
    }
    counts
}

/// Brace groups that look like tokens but are not canonical
pub fn malformed_tokens(text: &str) -> Vec<String> {
    scan(text)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Malformed(group) => Some(group.to_string()),
            _ => None,
        })
        .collect()
}

/// Remove every token and token-like group, keeping only the plain text
pub fn strip_tokens(text: &str) -> String {
    scan(text)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Text(run) => Some(run),
            _ => None,
        })
        .collect()
}

/// Whether the text carries anything besides tokens and whitespace
pub fn has_translatable_text(text: &str) -> bool {
    scan(text).into_iter().any(|piece| match piece {
        Piece::Text(run) => !run.trim().is_empty(),
        _ => false,
    })
}
