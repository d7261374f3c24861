/*!
 * Ordering check for paired markers.
 *
 * Tokens may move freely, but a closing marker placed before its opening
 * marker restores to inverted markup. This is reported as a warning.
 */

use std::fmt;

use crate::markup::abstraction::TokenMap;
use crate::markup::tokens::{self, TokenId};

/// A closing token found ahead of its opening token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairingIssue {
    pub open: TokenId,
    pub close: TokenId,
}

impl fmt::Display for PairingIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "closing token {} appears before its opening token {}",
            tokens::token(self.close),
            tokens::token(self.open)
        )
    }
}

/// Paired marker validator
pub struct PairingValidator;

impl PairingValidator {
    /// Check every known pair whose tokens both occur in the target
    pub fn check(target: &str, token_map: &TokenMap) -> Vec<PairingIssue> {
        let order = tokens::token_ids(target);
        let position = |id: TokenId| order.iter().position(|t| *t == id);

        token_map
            .pairs()
            .into_iter()
            .filter_map(|(open, close)| match (position(open), position(close)) {
                (Some(o), Some(c)) if c < o => Some(PairingIssue { open, close }),
                _ => None,
            })
            .collect()
    }
}
