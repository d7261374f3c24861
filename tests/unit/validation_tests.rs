/*!
 * Tests for QA classification of candidate targets
 */

use tagguard::markup::abstract_segment;
use tagguard::validation::{QaStatus, ValidationConfig, ValidationService, validate};

#[test]
fn test_validate_withAllTokens_shouldBeOk() {
    let qa = validate("Hello {1}world{2}", "Bonjour {1}monde{2}");
    assert_eq!(qa.status, QaStatus::Ok);
    assert!(qa.details.is_empty());
    assert_eq!(qa.tag_stats, "TAG: 2/2");
}

#[test]
fn test_validate_withDuplicateToken_shouldCountItAsExtra() {
    let qa = validate("Hello {1}world{2}", "Bonjour {1}{1}monde{2}");
    assert_eq!(qa.status, QaStatus::Error);
    assert_eq!(qa.details.extra, vec![1]);
    assert!(qa.details.missing.is_empty());
}

#[test]
fn test_validate_withRepeatedSourceToken_shouldRequireEachOccurrence() {
    let qa = validate("{1}a{1}b{2}", "{1}x{2}");
    assert_eq!(qa.details.missing, vec![1]);
}

#[test]
fn test_validate_withNonCanonicalTokens_shouldReportMalformed() {
    let qa = validate("Hello {1}world", "Bonjour { 1 }monde");
    assert_eq!(qa.status, QaStatus::Error);
    assert_eq!(qa.details.malformed, vec!["{ 1 }".to_string()]);
    assert_eq!(qa.details.missing, vec![1]);
}

#[test]
fn test_validate_withZeroToken_shouldReportExtra() {
    let qa = validate("Hello {1}world", "Bonjour {1}monde {0}");
    assert_eq!(qa.details.extra, vec![0]);
}

#[test]
fn test_validate_withWhitespaceTarget_shouldFlagEmptyTarget() {
    let qa = validate("Hello world", "   ");
    assert_eq!(qa.status, QaStatus::Error);
    assert!(qa.details.empty_target);
}

#[test]
fn test_validate_withTextDroppedAroundTokens_shouldFlagEmptyTarget() {
    let qa = validate("Hello {1}world and much more text here{2}", "{1} {2}");
    assert_eq!(qa.status, QaStatus::Error);
    assert!(qa.details.empty_target);
    assert!(qa.details.warnings.is_empty());
}

#[test]
fn test_validate_withTokenOnlySource_shouldAcceptTokenOnlyTarget() {
    assert_eq!(validate("{1} {2}", "{1}{2}").status, QaStatus::Ok);
}

#[test]
fn test_validate_withCdataCopiedUnchanged_shouldBeOk() {
    let abstraction = abstract_segment(r#"Use <![CDATA[{name}]]> here<ph id="1"/>"#).unwrap();
    let qa = validate(&abstraction.abstracted, &abstraction.abstracted);
    assert_eq!(qa.status, QaStatus::Ok);
    assert!(qa.details.malformed.is_empty());
}

#[test]
fn test_validate_withEmptySourceAndTarget_shouldBeOk() {
    assert_eq!(validate("", "").status, QaStatus::Ok);
}

#[test]
fn test_validate_withExtremeLengthRatio_shouldOnlyWarn() {
    let qa = validate(
        "Please read the safety instructions {1}before{2} use.",
        "Lisez {1}ça{2}.",
    );
    assert_eq!(qa.status, QaStatus::Warning);
    assert!(qa.status.is_valid());
    assert_eq!(qa.details.warnings.len(), 1);
}

#[test]
fn test_validate_withShortSource_shouldSkipLengthCheck() {
    let qa = validate("OK {1}", "D'accord, c'est parfaitement entendu {1}");
    assert_eq!(qa.status, QaStatus::Ok);
}

#[test]
fn test_validate_withLengthCheckDisabled_shouldNotWarn() {
    let service = ValidationService::new(ValidationConfig {
        length_validation: false,
        ..ValidationConfig::default()
    });
    let qa = service.validate("Please read the safety instructions {1}before{2} use.", "Lisez {1}ça{2}.");
    assert_eq!(qa.status, QaStatus::Ok);
}

#[test]
fn test_validateWithMap_withInvertedPair_shouldWarn() {
    let abstraction =
        abstract_segment(r#"Click <bpt id="1">&lt;b&gt;</bpt>Save<ept id="1">&lt;/b&gt;</ept> now"#).unwrap();
    let qa = ValidationService::default().validate_with_map(
        &abstraction.abstracted,
        "Cliquez {2}Enregistrer{1} maintenant",
        Some(&abstraction.tokens),
    );
    assert_eq!(qa.status, QaStatus::Warning);
    assert!(qa.details.missing.is_empty() && qa.details.extra.is_empty());
}

#[test]
fn test_validate_runTwice_shouldBeIdempotent() {
    let cases = [
        ("Hello {1}world{2}", "Bonjour {1}monde{2}"),
        ("Hello {1}world{2}", "Bonjour monde"),
        ("Hello {1}world{2}", "Bonjour {1}{3}monde{2}"),
        ("Please read the safety instructions {1}before{2} use.", "Lisez {1}ça{2}."),
    ];
    let service = ValidationService::default();
    for (source, target) in cases {
        assert_eq!(service.validate(source, target), service.validate(source, target));
    }
}

#[test]
fn test_validationConfig_withInvertedBounds_shouldBeRejected() {
    let config = ValidationConfig {
        length_ratio_min: 2.0,
        length_ratio_max: 1.0,
        ..ValidationConfig::default()
    };
    assert!(config.validate().is_err());
}
