/*!
 * Tag abstraction for XLIFF inline content.
 *
 * A raw segment is a fragment of mixed content: text runs interleaved with
 * inline elements (`<bpt>`, `<ept>`, `<ph>`, `<it>`, `<g>`, `<x/>`,
 * `<bx/>`, `<ex/>`, `<mrk>`). Each top-level inline element is replaced in
 * document order by a canonical `{k}` token and recorded verbatim in a
 * [`TokenMap`]. Brace groups already present in the text, comments, CDATA
 * sections and processing instructions are frozen the same way so the
 * abstracted text never contains a brace the model could confuse with a
 * token.
 */

use std::collections::HashMap;
use std::fmt;

use log::debug;
use once_cell::sync::Lazy;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::TranslationError;
use crate::markup::tokens::{self, Piece, TokenId};

/// Regex for namespace declarations carried on copied markers
static XMLNS_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\s+xmlns(?::[A-Za-z_][\w.-]*)?\s*=\s*(?:"[^"]*"|'[^']*')"#)
        .expect("Invalid xmlns regex")
});

/// Kind of a tokenized marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerKind {
    /// Begin paired tag
    Bpt,
    /// End paired tag
    Ept,
    /// Standalone placeholder
    Ph,
    /// Isolated tag
    It,
    /// Generic group container
    G,
    /// Generic placeholder
    X,
    /// Begin paired placeholder
    Bx,
    /// End paired placeholder
    Ex,
    /// Marked span container
    Mrk,
    /// Brace placeholder, comment, CDATA section or processing instruction frozen from the source
    Literal,
}

/// Whether a marker opens or closes a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairRole {
    Open,
    Close,
}

impl MarkerKind {
    /// Map a top-level inline element name to its kind
    pub fn from_element_name(name: &str) -> Option<Self> {
        match name {
            "bpt" => Some(Self::Bpt),
            "ept" => Some(Self::Ept),
            "ph" => Some(Self::Ph),
            "it" => Some(Self::It),
            "g" => Some(Self::G),
            "x" => Some(Self::X),
            "bx" => Some(Self::Bx),
            "ex" => Some(Self::Ex),
            "mrk" => Some(Self::Mrk),
            _ => None,
        }
    }

    /// Element name, or `literal` for frozen text placeholders
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bpt => "bpt",
            Self::Ept => "ept",
            Self::Ph => "ph",
            Self::It => "it",
            Self::G => "g",
            Self::X => "x",
            Self::Bx => "bx",
            Self::Ex => "ex",
            Self::Mrk => "mrk",
            Self::Literal => "literal",
        }
    }

    pub fn pair_role(&self) -> Option<PairRole> {
        match self {
            Self::Bpt | Self::Bx => Some(PairRole::Open),
            Self::Ept | Self::Ex => Some(PairRole::Close),
            _ => None,
        }
    }
}

impl fmt::Display for MarkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structural marker removed from the source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marker {
    /// Marker kind
    pub kind: MarkerKind,
    /// Identity attribute (`rid` when present, else `id`)
    pub id_attr: Option<String>,
    /// Verbatim serialized marker, namespace declarations stripped
    pub raw: String,
}

/// Ordered mapping from token id to marker
///
/// Ids are implicit: the marker at position `i` owns token `{i + 1}`, so the
/// mapping is dense by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenMap {
    markers: Vec<Marker>,
}

impl TokenMap {
    pub fn get(&self, id: TokenId) -> Option<&Marker> {
        id.checked_sub(1).and_then(|idx| self.markers.get(idx))
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Iterate `(id, marker)` pairs in token order
    pub fn iter(&self) -> impl Iterator<Item = (TokenId, &Marker)> {
        self.markers.iter().enumerate().map(|(idx, m)| (idx + 1, m))
    }

    /// Open/close token ids of paired markers sharing an identity
    pub fn pairs(&self) -> Vec<(TokenId, TokenId)> {
        let mut open: HashMap<&str, Vec<TokenId>> = HashMap::new();
        let mut pairs = Vec::new();
        for (id, marker) in self.iter() {
            let Some(key) = marker.id_attr.as_deref() else {
                continue;
            };
            match marker.kind.pair_role() {
                Some(PairRole::Open) => open.entry(key).or_default().push(id),
                Some(PairRole::Close) => {
                    if let Some(opener) = open.get_mut(key).and_then(Vec::pop) {
                        pairs.push((opener, id));
                    }
                }
                None => {}
            }
        }
        pairs
    }

    fn push(&mut self, marker: Marker) -> TokenId {
        self.markers.push(marker);
        self.markers.len()
    }
}

/// Result of abstracting a raw segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Abstraction {
    /// Text with every marker replaced by a `{k}` token
    pub abstracted: String,
    /// Markers by token id
    pub tokens: TokenMap,
}

fn malformed(message: impl Into<String>) -> TranslationError {
    TranslationError::MalformedMarkup(message.into())
}

/// Start offset of a markup event, whichever side of `<` the reader stopped on
fn markup_start(raw: &str, pos: usize) -> usize {
    let bytes = raw.as_bytes();
    if bytes.get(pos) == Some(&b'<') {
        pos
    } else if pos > 0 && bytes[pos - 1] == b'<' {
        pos - 1
    } else {
        pos
    }
}

fn element_kind(element: &BytesStart<'_>, top_level: bool) -> Result<MarkerKind, TranslationError> {
    let local = element.local_name();
    let name = std::str::from_utf8(local.as_ref())
        .map_err(|e| malformed(format!("invalid element name: {}", e)))?;
    match MarkerKind::from_element_name(name) {
        Some(kind) => Ok(kind),
        // `<sub>` only appears inside the native code of another marker
        None if name == "sub" && !top_level => Ok(MarkerKind::Ph),
        None => Err(malformed(format!("unrecognized inline element <{}>", name))),
    }
}

fn identity(element: &BytesStart<'_>) -> Result<Option<String>, TranslationError> {
    let mut id = None;
    let mut rid = None;
    for attr in element.attributes() {
        let attr = attr.map_err(|e| malformed(format!("invalid attribute: {}", e)))?;
        let value = String::from_utf8_lossy(&attr.value).into_owned();
        match attr.key.local_name().as_ref() {
            b"id" => id = Some(value),
            b"rid" => rid = Some(value),
            _ => {}
        }
    }
    Ok(rid.or(id))
}

struct Builder<'a> {
    raw: &'a str,
    abstracted: String,
    tokens: TokenMap,
    /// End of the last top-level item copied out of `raw`
    cursor: usize,
    open_pairs: HashMap<String, usize>,
}

impl<'a> Builder<'a> {
    fn new(raw: &'a str) -> Self {
        Self {
            raw,
            abstracted: String::with_capacity(raw.len()),
            tokens: TokenMap::default(),
            cursor: 0,
            open_pairs: HashMap::new(),
        }
    }

    /// Copy the text run up to `end`, freezing any brace groups in it
    fn flush_text(&mut self, end: usize) {
        let run = &self.raw[self.cursor..end];
        for piece in tokens::scan(run) {
            match piece {
                Piece::Text(text) => self.abstracted.push_str(text),
                Piece::Token { text, .. } | Piece::Malformed(text) => {
                    let id = self.tokens.push(Marker {
                        kind: MarkerKind::Literal,
                        id_attr: None,
                        raw: text.to_string(),
                    });
                    self.abstracted.push_str(&tokens::token(id));
                }
            }
        }
        self.cursor = end;
    }

    /// Freeze a comment, CDATA section or processing instruction as one literal token
    fn push_literal(&mut self, start: usize, end: usize) {
        self.flush_text(start);
        let id = self.tokens.push(Marker {
            kind: MarkerKind::Literal,
            id_attr: None,
            raw: self.raw[start..end].to_string(),
        });
        self.abstracted.push_str(&tokens::token(id));
        self.cursor = end;
    }

    fn push_marker(
        &mut self,
        kind: MarkerKind,
        id_attr: Option<String>,
        start: usize,
        end: usize,
    ) -> Result<(), TranslationError> {
        self.flush_text(start);
        self.track_pairing(kind, id_attr.as_deref())?;

        let raw = XMLNS_REGEX.replace_all(&self.raw[start..end], "").into_owned();
        let id = self.tokens.push(Marker { kind, id_attr, raw });
        self.abstracted.push_str(&tokens::token(id));
        self.cursor = end;
        Ok(())
    }

    fn track_pairing(&mut self, kind: MarkerKind, key: Option<&str>) -> Result<(), TranslationError> {
        let Some(role) = kind.pair_role() else {
            return Ok(());
        };
        let key = key.ok_or_else(|| malformed(format!("<{}> without id or rid", kind)))?;
        match role {
            PairRole::Open => *self.open_pairs.entry(key.to_string()).or_insert(0) += 1,
            PairRole::Close => match self.open_pairs.get_mut(key) {
                Some(count) if *count > 0 => *count -= 1,
                _ => {
                    return Err(malformed(format!(
                        "<{}> references \"{}\" with no open counterpart",
                        kind, key
                    )));
                }
            },
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Abstraction, TranslationError> {
        self.flush_text(self.raw.len());

        let mut unclosed: Vec<&String> = self
            .open_pairs
            .iter()
            .filter(|(_, count)| **count > 0)
            .map(|(key, _)| key)
            .collect();
        if !unclosed.is_empty() {
            unclosed.sort();
            return Err(malformed(format!("unclosed paired markers: {:?}", unclosed)));
        }

        Ok(Abstraction {
            abstracted: self.abstracted,
            tokens: self.tokens,
        })
    }
}

/// Abstract a raw segment into `{k}` tokens and a token map
///
/// Deterministic: the same input always yields the same numbering.
pub fn abstract_segment(raw: &str) -> Result<Abstraction, TranslationError> {
    let mut reader = Reader::from_str(raw);
    reader.config_mut().trim_text(false);

    let mut builder = Builder::new(raw);
    let mut depth = 0usize;
    let mut open: Option<(MarkerKind, Option<String>, usize)> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|e| {
            malformed(format!("{} at byte {}", e, reader.error_position()))
        })?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(element) => {
                let kind = element_kind(&element, depth == 0)?;
                if depth == 0 {
                    open = Some((kind, identity(&element)?, markup_start(raw, before)));
                }
                depth += 1;
            }
            Event::End(_) => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| malformed("closing tag without opening tag"))?;
                if depth == 0 {
                    let (kind, id_attr, start) =
                        open.take().ok_or_else(|| malformed("closing tag without opening tag"))?;
                    builder.push_marker(kind, id_attr, start, after)?;
                }
            }
            Event::Empty(element) => {
                let kind = element_kind(&element, depth == 0)?;
                if depth == 0 {
                    builder.push_marker(kind, identity(&element)?, markup_start(raw, before), after)?;
                }
            }
            Event::Comment(_) | Event::CData(_) | Event::PI(_) => {
                if depth == 0 {
                    builder.push_literal(markup_start(raw, before), after);
                }
            }
            // Text runs are copied lazily from the cursor when the next item starts
            Event::Text(_) => {}
            Event::Decl(_) | Event::DocType(_) => {
                return Err(malformed("declarations are not allowed in inline content"));
            }
            Event::Eof => break,
        }
    }

    if depth > 0 {
        return Err(malformed("unclosed inline element"));
    }

    let abstraction = builder.finish()?;
    debug!(
        "Abstracted segment into {} token(s): {}",
        abstraction.tokens.len(),
        abstraction.abstracted
    );
    Ok(abstraction)
}
