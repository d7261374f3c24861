/*!
 * Prompt templates for token-safe translation and repair.
 *
 * The system prompts carry the role, the task, the profile constraints and
 * the token safety rules. User prompts are JSON so the model receives the
 * abstracted text without any surrounding prose it could confuse with
 * segment content.
 */

use std::collections::BTreeMap;

use serde_json::json;

use crate::language_utils::describe_language;
use crate::markup::TokenId;
use crate::markup::tokens;
use crate::translation::chunking::Chunk;
use crate::translation::prompts::profile::StyleProfile;
use crate::validation::QaDetails;

/// System prompt template with language placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// Whole-segment translation
    pub const SEGMENT_TRANSLATOR: &'static str = r#"You are a professional translator.
Translate the following XLIFF segment from {source_language} to {target_language}."#;

    /// Chunk translation, tokens are withheld from the model
    pub const CHUNK_TRANSLATOR: &'static str = r#"You are a professional translator.
Translate the following text fragments from {source_language} to {target_language}.
The fragments belong to one segment and are separated by formatting markers that are not shown to you."#;

    /// Instruction-driven revision of an existing translation
    pub const SEGMENT_REFINER: &'static str = r#"You are a professional translator.
Revise an existing {source_language} to {target_language} translation of an XLIFF segment as the user instructs."#;

    /// Token repair, the wording must not change
    pub const TOKEN_REPAIR: &'static str = r#"You fix placeholder tokens in a {source_language} to {target_language} translation.
Do NOT translate the text again - only adjust token positions."#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Render the template with the given languages.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

const SEGMENT_TOKEN_RULES: &[&str] = &[
    "SAFETY: The text contains placeholder tokens such as {1}. Keep every token exactly as written, exactly as often as it appears in the source.",
    "SAFETY: Never translate, renumber, merge, split or invent tokens. You may move a token when the target word order requires it.",
];

const SEGMENT_OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT:
You must output strictly valid JSON: {"translation": "<target text>"}
Do not include markdown formatting (```json). Return raw JSON only."#;

const CHUNK_RULES: &[&str] = &[
    "Translate each fragment independently but keep the meaning of the whole segment.",
    "Keep leading and trailing spaces out of your answer; they are restored automatically.",
    "Do not add placeholders, braces or markup of any kind.",
];

const CHUNK_OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT:
You must output strictly valid JSON: {"chunks": ["<fragment 0 translation>", "..."]}
Return exactly one string per input fragment, in the same order.
Do not include markdown formatting (```json). Return raw JSON only."#;

const REFINE_RULES: &[&str] = &[
    "Apply the instruction to the current translation and keep everything it does not ask to change.",
    "The source is for reference only; do not translate it again from scratch.",
];

const REPAIR_RULES: &[&str] = &[
    "Use the broken translation as is and only insert, remove or move tokens.",
    "The result must include ALL required tokens EXACTLY ONCE per required occurrence.",
    "Do not add tokens that are not required.",
    "Output ONLY the fixed translation.",
];

const REPAIR_OUTPUT_FORMAT: &str = r#"OUTPUT FORMAT:
You must output strictly valid JSON: {"translation": "<fixed target text>"}
Return raw JSON only."#;

/// Builder for translation and repair prompts
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    source_language: String,
    target_language: String,
    profile: StyleProfile,
}

impl PromptBuilder {
    /// Create a builder for a language pair
    pub fn new(source_language: &str, target_language: &str, profile: StyleProfile) -> Self {
        Self {
            source_language: describe_language(source_language),
            target_language: describe_language(target_language),
            profile,
        }
    }

    pub fn profile(&self) -> &StyleProfile {
        &self.profile
    }

    /// System prompt for the whole-segment attempt
    pub fn segment_system(&self) -> String {
        let mut constraints = self.profile.constraints();
        constraints.extend(SEGMENT_TOKEN_RULES.iter().map(|r| r.to_string()));
        self.assemble(PromptTemplate::SEGMENT_TRANSLATOR, &constraints, SEGMENT_OUTPUT_FORMAT)
    }

    /// User prompt for the whole-segment attempt
    pub fn segment_user(&self, abstracted: &str) -> String {
        json!({ "source": abstracted }).to_string()
    }

    /// System prompt for the chunk fallback
    pub fn chunk_system(&self) -> String {
        let mut constraints = self.profile.constraints();
        constraints.extend(CHUNK_RULES.iter().map(|r| r.to_string()));
        self.assemble(PromptTemplate::CHUNK_TRANSLATOR, &constraints, CHUNK_OUTPUT_FORMAT)
    }

    /// User prompt for the chunk fallback
    ///
    /// Anchors name the surrounding tokens for context only; the fragment
    /// text itself never contains a token.
    pub fn chunk_user(&self, chunks: &[&Chunk]) -> String {
        let fragments: Vec<_> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                json!({
                    "index": i,
                    "text": chunk.text.trim(),
                    "anchors": {
                        "before": chunk.before.map(tokens::token),
                        "after": chunk.after.map(tokens::token),
                    },
                })
            })
            .collect();
        json!({ "fragments": fragments }).to_string()
    }

    /// System prompt for an instruction-driven refinement
    pub fn refine_system(&self) -> String {
        let mut constraints = self.profile.constraints();
        constraints.extend(REFINE_RULES.iter().map(|r| r.to_string()));
        constraints.extend(SEGMENT_TOKEN_RULES.iter().map(|r| r.to_string()));
        self.assemble(PromptTemplate::SEGMENT_REFINER, &constraints, SEGMENT_OUTPUT_FORMAT)
    }

    /// User prompt for an instruction-driven refinement
    pub fn refine_user(&self, source: &str, current_target: &str, instruction: &str) -> String {
        json!({
            "source": source,
            "current_translation": current_target,
            "instruction": instruction,
        })
        .to_string()
    }

    /// System prompt for token repair
    pub fn repair_system(&self) -> String {
        let constraints: Vec<String> = REPAIR_RULES.iter().map(|r| r.to_string()).collect();
        self.assemble(PromptTemplate::TOKEN_REPAIR, &constraints, REPAIR_OUTPUT_FORMAT)
    }

    /// User prompt for token repair
    ///
    /// `latest` carries the diff of the previous failed attempt and turns
    /// the request into a refined one naming the offending tokens.
    pub fn repair_user(
        &self,
        source: &str,
        broken_target: &str,
        required: &BTreeMap<TokenId, usize>,
        latest: Option<&QaDetails>,
    ) -> String {
        let required_tokens: Vec<String> = required
            .iter()
            .flat_map(|(id, count)| std::iter::repeat_n(tokens::token(*id), *count))
            .collect();

        let mut payload = json!({
            "source": source,
            "broken_translation": broken_target,
            "required_tokens": required_tokens,
        });

        if let Some(details) = latest {
            let mut issues = Vec::new();
            if !details.missing.is_empty() {
                issues.push(format!("Your last answer was missing {}", join(&details.missing)));
            }
            if !details.extra.is_empty() {
                issues.push(format!("Your last answer had extra {}", join(&details.extra)));
            }
            if !details.malformed.is_empty() {
                issues.push(format!(
                    "Your last answer had malformed tokens {}",
                    details.malformed.join(" ")
                ));
            }
            if details.empty_target {
                issues.push("Your last answer was empty".to_string());
            }
            payload["previous_attempt_issues"] = json!(issues);
        }

        payload.to_string()
    }

    fn assemble(&self, template: &str, constraints: &[String], output_format: &str) -> String {
        let mut parts = vec![PromptTemplate::new(template).render(&self.source_language, &self.target_language)];
        if !constraints.is_empty() {
            parts.push("\nCONSTRAINTS:".to_string());
            parts.extend(constraints.iter().map(|c| format!("- {}", c)));
        }
        parts.push(format!("\n{}", output_format));
        parts.join("\n")
    }
}

fn join(ids: &[TokenId]) -> String {
    ids.iter().map(|id| tokens::token(*id)).collect::<Vec<_>>().join(" ")
}
