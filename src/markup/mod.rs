/*!
 * Inline markup handling.
 *
 * - `abstraction`: raw XLIFF inline content to `{k}` tokens plus a token map
 * - `tokens`: canonical token scanning and multiset helpers
 * - `restore`: token map substitution back into raw markup
 */

pub mod abstraction;
pub mod restore;
pub mod tokens;

pub use abstraction::{Abstraction, Marker, MarkerKind, PairRole, TokenMap, abstract_segment};
pub use restore::restore;
pub use tokens::TokenId;
