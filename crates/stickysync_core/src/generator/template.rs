//! Deterministic template-based response generator.

use crate::model::note::LlmModel;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

const PROMPT_EXCERPT_CHARS: usize = 30;
const PROMPT_PLACEHOLDER: &str = "{prompt}";

/// Response generation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// Model id has no registered template.
    UnknownModel(String),
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownModel(model_id) => write!(f, "unknown model: {model_id}"),
        }
    }
}

impl Error for GenerateError {}

/// Produces response text for a prompt addressed to one model.
pub trait ResponseGenerator {
    fn generate(&self, model_id: &str, prompt: &str) -> Result<String, GenerateError>;

    /// Returns whether `model_id` can be generated for.
    fn supports(&self, model_id: &str) -> bool;
}

/// Registry of model-id to response template.
///
/// Templates reference the prompt excerpt through `{prompt}`.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator {
    templates: BTreeMap<String, String>,
}

impl TemplateGenerator {
    /// Generator with no registered models.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Generator with templates for every `LlmModel`.
    pub fn builtin() -> Self {
        LlmModel::ALL
            .into_iter()
            .fold(Self::empty(), |generator, model| {
                generator.with_template(model.as_str(), builtin_template(model))
            })
    }

    /// Registers (or replaces) the template for `model_id`.
    pub fn with_template(mut self, model_id: &str, template: &str) -> Self {
        self.templates
            .insert(model_id.trim().to_string(), template.to_string());
        self
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }
}

impl ResponseGenerator for TemplateGenerator {
    fn generate(&self, model_id: &str, prompt: &str) -> Result<String, GenerateError> {
        let template = self
            .templates
            .get(model_id.trim())
            .ok_or_else(|| GenerateError::UnknownModel(model_id.to_string()))?;
        Ok(template.replace(PROMPT_PLACEHOLDER, &prompt_excerpt(prompt)))
    }

    fn supports(&self, model_id: &str) -> bool {
        self.templates.contains_key(model_id.trim())
    }
}

/// Whitespace-normalized first 30 characters of `prompt`, followed by `...`.
pub fn prompt_excerpt(prompt: &str) -> String {
    let normalized = WHITESPACE_RE.replace_all(prompt.trim(), " ");
    let mut excerpt = normalized
        .chars()
        .take(PROMPT_EXCERPT_CHARS)
        .collect::<String>();
    excerpt.push_str("...");
    excerpt
}

fn builtin_template(model: LlmModel) -> &'static str {
    match model {
        LlmModel::Gpt4 => {
            "I've analyzed your question: \"{prompt}\" and here's my response as GPT-4. \
             This answer is helpful and comprehensive, while maintaining a neutral tone. \
             I'll provide factual information and helpful suggestions based on your query."
        }
        LlmModel::Claude3Opus => {
            "Thank you for your prompt: \"{prompt}\" As Claude 3 Opus, I'll approach this \
             thoughtfully. My response aims to be nuanced and insightful, considering \
             multiple perspectives on your question. I'm designed to be particularly strong \
             with complex reasoning tasks."
        }
        LlmModel::Claude3Sonnet => {
            "I appreciate your question about \"{prompt}\" As Claude 3 Sonnet, I'll provide \
             a balanced and thoughtful response. I aim to be helpful while maintaining a \
             conversational tone, focusing on providing clear and accurate information."
        }
        LlmModel::Llama3 => {
            "Regarding \"{prompt}\" - As Llama 3, I'll give you a direct answer. My responses \
             tend to be concise but informative, with a focus on factual accuracy and \
             practical application. I'm designed to be efficient while still providing \
             valuable insights."
        }
        LlmModel::GeminiPro => {
            "I've processed your question: \"{prompt}\" As Gemini Pro, I'll provide a \
             response that emphasizes multimodal understanding. My answer combines factual \
             information with contextual awareness, delivering a comprehensive yet \
             accessible explanation."
        }
    }
}
