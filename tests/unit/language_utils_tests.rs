/*!
 * Tests for language utility functions
 */

use tagguard::language_utils::{
    LanguageCodeType, describe_language, get_language_name, language_codes_match, normalize_to_part2t,
    split_tag, validate_language_code,
};

/// Test validation of language codes
#[test]
fn test_validateLanguageCode_withValidCodes_shouldReturnCorrectType() {
    assert!(matches!(validate_language_code("en").unwrap(), LanguageCodeType::Part1));
    assert!(matches!(validate_language_code("deu").unwrap(), LanguageCodeType::Part2T));
    assert!(matches!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B));
    assert!(matches!(validate_language_code(" PT-br ").unwrap(), LanguageCodeType::Part1));

    assert!(validate_language_code("xyz").is_err());
    assert!(validate_language_code("e").is_err());
    assert!(validate_language_code("en-").is_ok());
    assert!(validate_language_code("en-toolongsubtag").is_err());
}

#[test]
fn test_normalizeToPart2t_withTags_shouldIgnoreRegion() {
    assert_eq!(normalize_to_part2t("fr-CA").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part2t("EN_us").unwrap(), "eng");
    assert!(normalize_to_part2t("zz").is_err());
}

#[test]
fn test_languageCodesMatch_withDifferentSpellings_shouldMatch() {
    assert!(language_codes_match("de-AT", "ger"));
    assert!(!language_codes_match("de", "fr"));
    assert!(!language_codes_match("de", "invalid"));
}

#[test]
fn test_splitTag_shouldSeparatePrimaryAndVariant() {
    assert_eq!(split_tag("pt_BR"), ("pt".to_string(), Some("BR".to_string())));
    assert_eq!(split_tag("ja"), ("ja".to_string(), None));
}

#[test]
fn test_describeLanguage_shouldIncludeNameAndTag() {
    assert_eq!(get_language_name("es-MX").unwrap(), "Spanish");
    assert_eq!(describe_language("es-MX"), "Spanish (es-MX)");
    assert_eq!(describe_language("klingon"), "klingon");
}
