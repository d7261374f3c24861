/*!
 * Style profiles feeding prompt construction.
 *
 * A profile is a plain configuration value. It is serialized inside the
 * application config and passed by value into the prompt builder.
 */

use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// How strictly terminology must be followed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermStrictness {
    /// Terms must be used exactly
    Strict,
    /// Terms are preferred but may be adapted
    #[default]
    Prefer,
    /// Terms are suggestions only
    Loose,
}

impl fmt::Display for TermStrictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Strict => "strict",
            Self::Prefer => "prefer",
            Self::Loose => "loose",
        };
        f.write_str(name)
    }
}

/// Terminology policy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TerminologyPolicy {
    #[serde(default)]
    pub strictness: TermStrictness,

    /// Terms kept in the source language
    #[serde(default)]
    pub do_not_translate: Vec<String>,

    /// Terms that must not appear in the translation
    #[serde(default)]
    pub forbidden_terms: Vec<String>,
}

/// Fixed set of stylistic constraints applied to every prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    /// Intended readers, e.g. "field technicians"
    #[serde(default)]
    pub target_audience: Option<String>,

    /// Tone of voice; "neutral" adds no constraint
    #[serde(default = "default_neutral")]
    pub tone: String,

    /// Register; "neutral" adds no constraint
    #[serde(default = "default_neutral")]
    pub formality: String,

    /// Locale variant such as "Canadian French"
    #[serde(default)]
    pub locale_variant: Option<String>,

    #[serde(default)]
    pub terminology: TerminologyPolicy,

    /// Free-form style guide notes
    #[serde(default)]
    pub style_guide_notes: Option<String>,

    /// Keep source numbers exactly as written
    #[serde(default = "default_true")]
    pub preserve_source_numbers: bool,
}

fn default_neutral() -> String {
    "neutral".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for StyleProfile {
    fn default() -> Self {
        Self {
            target_audience: None,
            tone: default_neutral(),
            formality: default_neutral(),
            locale_variant: None,
            terminology: TerminologyPolicy::default(),
            style_guide_notes: None,
            preserve_source_numbers: true,
        }
    }
}

/// Built-in profile templates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileTemplate {
    /// Technical manuals
    Manual,
    /// Warranty and legal text
    Warranty,
    /// Training material
    Training,
}

impl ProfileTemplate {
    pub fn all() -> [ProfileTemplate; 3] {
        [Self::Manual, Self::Warranty, Self::Training]
    }

    /// Build the profile for this template
    pub fn profile(&self) -> StyleProfile {
        match self {
            Self::Manual => StyleProfile {
                style_guide_notes: Some(
                    "Clear, concise, and instructive. Avoid jargon unless necessary.".to_string(),
                ),
                ..StyleProfile::default()
            },
            Self::Warranty => StyleProfile {
                tone: "authoritative".to_string(),
                formality: "formal".to_string(),
                terminology: TerminologyPolicy {
                    strictness: TermStrictness::Strict,
                    ..TerminologyPolicy::default()
                },
                style_guide_notes: Some(
                    "Use legal terminology. Ensure all liability disclaimers are precise.".to_string(),
                ),
                ..StyleProfile::default()
            },
            Self::Training => StyleProfile {
                tone: "friendly".to_string(),
                formality: "informal".to_string(),
                style_guide_notes: Some(
                    "Engaging and encouraging. Use direct address ('You').".to_string(),
                ),
                ..StyleProfile::default()
            },
        }
    }
}

impl FromStr for ProfileTemplate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(Self::Manual),
            "warranty" => Ok(Self::Warranty),
            "training" => Ok(Self::Training),
            _ => Err(anyhow!("Unknown profile template: {}", s)),
        }
    }
}

impl StyleProfile {
    /// Constraint lines contributed by this profile, without bullets
    pub fn constraints(&self) -> Vec<String> {
        let mut constraints = Vec::new();

        if !is_neutral(&self.tone) {
            constraints.push(format!("Tone: {}", self.tone.trim()));
        }
        if !is_neutral(&self.formality) {
            constraints.push(format!("Formality: {}", self.formality.trim()));
        }
        if let Some(variant) = non_blank(&self.locale_variant) {
            constraints.push(format!("Locale Variant: {}", variant));
        }
        if let Some(audience) = non_blank(&self.target_audience) {
            constraints.push(format!("Target Audience: {}", audience));
        }
        if self.preserve_source_numbers {
            constraints.push("Numbers: Preserve all source numbers exactly as written.".to_string());
        }
        if let Some(notes) = non_blank(&self.style_guide_notes) {
            constraints.push(format!("Style Guide: {}", notes));
        }

        let terminology = &self.terminology;
        constraints.push(format!("Terminology Strictness: {}", terminology.strictness));
        if !terminology.do_not_translate.is_empty() {
            constraints.push(format!(
                "DO NOT TRANSLATE (Keep Original): {}",
                quoted_list(&terminology.do_not_translate)
            ));
        }
        if !terminology.forbidden_terms.is_empty() {
            constraints.push(format!(
                "FORBIDDEN TERMS (Do Not Use): {}",
                quoted_list(&terminology.forbidden_terms)
            ));
        }

        constraints
    }
}

fn is_neutral(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("neutral")
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn quoted_list(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join(", ")
}
