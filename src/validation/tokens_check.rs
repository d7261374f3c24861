/*!
 * Token multiset validation.
 *
 * Tokens are compared as multisets (count per id), not as sequences:
 * reordering is allowed, dropping or duplicating is not.
 */

use std::collections::BTreeMap;

use log::debug;

use crate::markup::tokens::{self, TokenId};

/// Result of comparing source and target token multisets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCheck {
    /// Required occurrences absent from the target, sorted
    pub missing: Vec<TokenId>,
    /// Occurrences beyond the required count, sorted
    pub extra: Vec<TokenId>,
    /// Non-canonical token-like groups in the target
    pub malformed: Vec<String>,
    /// Total tokens in the source
    pub required: usize,
    /// Total canonical tokens in the target
    pub present: usize,
}

impl TokenCheck {
    pub fn passed(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.malformed.is_empty()
    }
}

/// Token validator for abstracted text
pub struct TokenValidator;

impl TokenValidator {
    /// Compare the token multisets of source and target
    pub fn check(source: &str, target: &str) -> TokenCheck {
        let required = tokens::token_counts(source);
        let present = tokens::token_counts(target);

        let missing = multiset_difference(&required, &present);
        let extra = multiset_difference(&present, &required);
        let malformed = tokens::malformed_tokens(target);

        let check = TokenCheck {
            missing,
            extra,
            malformed,
            required: required.values().sum(),
            present: present.values().sum(),
        };

        debug!(
            "Token check: required={}, present={}, missing={:?}, extra={:?}, malformed={}",
            check.required,
            check.present,
            check.missing,
            check.extra,
            check.malformed.len()
        );

        check
    }
}

/// `left - right` as a sorted list with one entry per surplus occurrence
fn multiset_difference(
    left: &BTreeMap<TokenId, usize>,
    right: &BTreeMap<TokenId, usize>,
) -> Vec<TokenId> {
    let mut difference = Vec::new();
    for (id, count) in left {
        let other = right.get(id).copied().unwrap_or(0);
        for _ in other..*count {
            difference.push(*id);
        }
    }
    difference
}
