use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for BCP-47 style language tags
///
/// XLIFF documents carry tags such as `en`, `fr-CA` or `zh_Hans_CN`. The
/// primary subtag is checked against ISO 639-1 or ISO 639-2 codes; the
/// remaining subtags (script, region, variant) are kept as a locale variant.
/// Language code type of the primary subtag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-2/T (3-letter) code
    Part2T,
    /// ISO 639-2/B (3-letter) code
    Part2B,
}

/// ISO 639-2/B codes that differ from their ISO 639-2/T counterpart
const PART2B_TO_PART2T: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

fn part2b_to_part2t(code: &str) -> Option<&'static str> {
    PART2B_TO_PART2T
        .iter()
        .find(|(b, _)| *b == code)
        .map(|(_, t)| *t)
}

/// Split a tag into its lowercase primary subtag and the remaining subtags
pub fn split_tag(code: &str) -> (String, Option<String>) {
    let normalized = code.trim().replace('_', "-");
    match normalized.split_once('-') {
        Some((primary, rest)) if !rest.is_empty() => (primary.to_lowercase(), Some(rest.to_string())),
        _ => (normalized.trim_end_matches('-').to_lowercase(), None),
    }
}

/// Validate a language tag
pub fn validate_language_code(code: &str) -> Result<LanguageCodeType> {
    let (primary, rest) = split_tag(code);

    if let Some(rest) = &rest {
        let well_formed = rest
            .split('-')
            .all(|s| (1..=8).contains(&s.len()) && s.chars().all(|c| c.is_ascii_alphanumeric()));
        if !well_formed {
            return Err(anyhow!("Invalid language tag subtags: {}", code));
        }
    }

    if primary.len() == 2 && Language::from_639_1(&primary).is_some() {
        return Ok(LanguageCodeType::Part1);
    }
    if primary.len() == 3 {
        if Language::from_639_3(&primary).is_some() {
            return Ok(LanguageCodeType::Part2T);
        }
        if part2b_to_part2t(&primary).is_some() {
            return Ok(LanguageCodeType::Part2B);
        }
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Normalize the primary subtag to ISO 639-2/T (3-letter) format
pub fn normalize_to_part2t(code: &str) -> Result<String> {
    let (primary, _) = split_tag(code);

    if primary.len() == 2 {
        if let Some(lang) = Language::from_639_1(&primary) {
            return Ok(lang.to_639_3().to_string());
        }
    } else if primary.len() == 3 {
        if Language::from_639_3(&primary).is_some() {
            return Ok(primary);
        }
        if let Some(part2t) = part2b_to_part2t(&primary) {
            return Ok(part2t.to_string());
        }
    }

    Err(anyhow!("Cannot normalize invalid language code: {}", code))
}

/// Check if two tags name the same language, ignoring region and script
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    match (normalize_to_part2t(code1), normalize_to_part2t(code2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Get the English language name for a tag's primary subtag
pub fn get_language_name(code: &str) -> Result<String> {
    let normalized = normalize_to_part2t(code)?;
    let lang = Language::from_639_3(&normalized)
        .ok_or_else(|| anyhow!("Failed to get language from code: {}", normalized))?;

    Ok(lang.to_name().to_string())
}

/// Human readable description used in prompts, e.g. `French (fr-CA)`
///
/// Unknown tags are passed through unchanged.
pub fn describe_language(code: &str) -> String {
    match get_language_name(code) {
        Ok(name) => format!("{} ({})", name, code.trim()),
        Err(_) => code.trim().to_string(),
    }
}
