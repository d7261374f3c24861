/*!
 * Restoration of raw markup from a validated abstracted target.
 */

use crate::errors::TranslationError;
use crate::markup::abstraction::TokenMap;
use crate::markup::tokens::{self, Piece};
use crate::validation::QaDetails;

/// Substitute every canonical token with its original marker
///
/// The input is expected to have passed validation; a token id absent from
/// the map or a malformed brace group is reported instead of being copied
/// through.
pub fn restore(abstracted: &str, token_map: &TokenMap) -> Result<String, TranslationError> {
    let mut output = String::with_capacity(abstracted.len());
    let mut details = QaDetails::default();

    for piece in tokens::scan(abstracted) {
        match piece {
            Piece::Text(text) => output.push_str(text),
            Piece::Token { id, .. } => match token_map.get(id) {
                Some(marker) => output.push_str(&marker.raw),
                None => details.extra.push(id),
            },
            Piece::Malformed(group) => details.malformed.push(group.to_string()),
        }
    }

    if details.has_errors() {
        return Err(TranslationError::TokenMismatch(details));
    }
    Ok(output)
}
