/*!
 * Chunk-isolated view of an abstracted segment.
 *
 * The text between tokens is cut into chunks that can be translated without
 * the model ever seeing or emitting a token. Reassembly interleaves the
 * translated chunks with the original tokens, so placement never depends on
 * model output.
 */

use serde::Serialize;

use crate::markup::TokenId;
use crate::markup::tokens::{self, Piece};

/// Text run between two token boundaries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the segment, 0-based
    pub index: usize,
    /// Original chunk text
    pub text: String,
    /// Token right before the chunk, if any
    pub before: Option<TokenId>,
    /// Token right after the chunk, if any
    pub after: Option<TokenId>,
}

impl Chunk {
    /// Whether the chunk needs a translation request
    pub fn is_translatable(&self) -> bool {
        tokens::has_translatable_text(&self.text)
    }
}

/// A segment split at its token boundaries
///
/// Always holds exactly one more chunk than tokens; leading, trailing and
/// adjacent tokens produce empty chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    chunks: Vec<Chunk>,
    tokens: Vec<String>,
}

impl ChunkPlan {
    /// Split an abstracted segment
    pub fn split(abstracted: &str) -> Self {
        let mut chunks = Vec::new();
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut before = None;

        for piece in tokens::scan(abstracted) {
            match piece {
                Piece::Token { id, text } => {
                    chunks.push(Chunk {
                        index: chunks.len(),
                        text: std::mem::take(&mut current),
                        before,
                        after: Some(id),
                    });
                    tokens.push(text.to_string());
                    before = Some(id);
                }
                Piece::Text(run) | Piece::Malformed(run) => current.push_str(run),
            }
        }
        chunks.push(Chunk {
            index: chunks.len(),
            text: current,
            before,
            after: None,
        });

        Self { chunks, tokens }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Token texts in their original order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Chunks that need a translation, in order
    pub fn translatable(&self) -> Vec<&Chunk> {
        self.chunks.iter().filter(|c| c.is_translatable()).collect()
    }

    /// Rebuild the segment from one translation per translatable chunk
    ///
    /// Token-like text emitted by the model is dropped and the original
    /// whitespace around each chunk is kept. Returns `None` when the number
    /// of translations does not match.
    pub fn reassemble(&self, translations: &[String]) -> Option<String> {
        if translations.len() != self.translatable().len() {
            return None;
        }

        let mut translations = translations.iter();
        let mut output = String::new();
        for (i, chunk) in self.chunks.iter().enumerate() {
            if chunk.is_translatable() {
                let translated = translations.next()?;
                output.push_str(&with_original_padding(&chunk.text, translated));
            } else {
                output.push_str(&chunk.text);
            }
            if let Some(token) = self.tokens.get(i) {
                output.push_str(token);
            }
        }
        Some(output)
    }
}

fn with_original_padding(original: &str, translated: &str) -> String {
    let stripped = tokens::strip_tokens(translated);
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    format!("{}{}{}", leading, stripped.trim(), trailing)
}
