/*!
 * Tests for markup abstraction and restoration
 */

use tagguard::errors::TranslationError;
use tagguard::markup::tokens::{self, Piece};
use tagguard::markup::{MarkerKind, abstract_segment, restore};

/// Well-formed inputs covering every supported marker kind
const ROUND_TRIP_INPUTS: &[&str] = &[
    r#"Click <bpt id="1">&lt;b&gt;</bpt>Save<ept id="1">&lt;/b&gt;</ept> now"#,
    r#"Line one<ph id="3">&lt;br/&gt;</ph>line two"#,
    r#"<it id="1" pos="open">&lt;i&gt;</it>Continued text"#,
    r#"See <g id="1">the <x id="2"/> manual</g>."#,
    r#"<bx id="1" rid="7"/>a<x id="2"/>b<ex id="3" rid="7"/>"#,
    r#"The <mrk mtype="term">torque wrench</mrk> is required"#,
    r#"Hi {name}, <ph id="1"/>you have %1 items"#,
    "Tom &amp; Jerry &lt;3",
    r#"<ph id="1"/>x<!-- {1} -->"#,
    r#"Use <![CDATA[{name}]]> here<ph id="1"/>"#,
];

#[test]
fn test_restore_withWellFormedInputs_shouldRoundTripExactly() {
    for raw in ROUND_TRIP_INPUTS {
        let abstraction = abstract_segment(raw).unwrap();
        let restored = restore(&abstraction.abstracted, &abstraction.tokens).unwrap();
        assert_eq!(&restored, raw, "round trip changed {:?}", raw);
    }
}

#[test]
fn test_abstractSegment_withMixedMarkers_shouldNumberDensely() {
    let raw = r#"<bpt id="5">&lt;b&gt;</bpt>A<ept id="5">&lt;/b&gt;</ept> <ph id="9"/> <x id="2"/>"#;
    let abstraction = abstract_segment(raw).unwrap();
    assert_eq!(abstraction.abstracted, "{1}A{2} {3} {4}");
    let ids: Vec<_> = abstraction.tokens.iter().map(|(id, _)| id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);
    assert_eq!(abstraction.tokens.get(3).unwrap().kind, MarkerKind::Ph);
}

#[test]
fn test_abstractSegment_withMalformedXml_shouldReturnMalformedMarkup() {
    for raw in ["<ph id=\"1\">unterminated", "text</bpt>", "<font>x</font>"] {
        let result = abstract_segment(raw);
        assert!(
            matches!(result, Err(TranslationError::MalformedMarkup(_))),
            "expected failure for {:?}",
            raw
        );
    }
}

#[test]
fn test_restore_withReorderedTokens_shouldFollowTargetOrder() {
    let raw = r#"<ph id="1"/>first <ph id="2"/>second"#;
    let abstraction = abstract_segment(raw).unwrap();
    let restored = restore("zweite {2} erste {1}", &abstraction.tokens).unwrap();
    assert_eq!(restored, r#"zweite <ph id="2"/> erste <ph id="1"/>"#);
}

#[test]
fn test_restore_withUnknownToken_shouldFail() {
    let abstraction = abstract_segment(r#"A <ph id="1"/> B"#).unwrap();
    let err = restore("A {1} {7} B", &abstraction.tokens).unwrap_err();
    match err {
        TranslationError::TokenMismatch(details) => assert_eq!(details.extra, vec![7]),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[test]
fn test_scan_withFullWidthAndSpacedBraces_shouldReportMalformed() {
    let pieces = tokens::scan("a {1} ｛2｝ { 3 } {01}");
    let malformed: Vec<_> = pieces
        .iter()
        .filter_map(|p| match p {
            Piece::Malformed(text) => Some(*text),
            _ => None,
        })
        .collect();
    assert_eq!(malformed, vec!["｛2｝", "{ 3 }", "{01}"]);
    assert_eq!(tokens::token_ids("a {1} ｛2｝ { 3 } {01}"), vec![1]);
}

#[test]
fn test_tokenCounts_withDuplicates_shouldCountMultiplicity() {
    let counts = tokens::token_counts("{1} x {2} {1}");
    assert_eq!(counts.get(&1), Some(&2));
    assert_eq!(counts.get(&2), Some(&1));
}

#[test]
fn test_hasTranslatableText_withTokensOnly_shouldBeFalse() {
    assert!(!tokens::has_translatable_text("{1} {2}  "));
    assert!(tokens::has_translatable_text("{1} Save"));
}
