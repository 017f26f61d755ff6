//! Deterministic prompt construction.

use super::templates::{CONTEXT_TEMPLATE, FULL_TEMPLATE, MINIMAL_TEMPLATE, TEMPLATES};
use crate::config::PromptStyle;
use crate::error::Result;
use crate::pathology::PathologyProfile;
use crate::session::{ChatMessage, MessageRole};
use minijinja::context;
use serde::{Deserialize, Serialize};

/// A model-ready prompt: role-tagged turns, system turn first, the new user
/// message last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub turns: Vec<ChatMessage>,
}

impl Prompt {
    pub fn system(&self) -> Option<&str> {
        self.turns
            .first()
            .filter(|turn| turn.role == MessageRole::System)
            .map(|turn| turn.content.as_str())
    }

    /// Content of the final user turn.
    pub fn last_user_message(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.role == MessageRole::User)
            .map(|turn| turn.content.as_str())
    }

    /// Flattens the turns for text-completion backends.
    ///
    /// Each turn becomes `Role: content` on its own line and the transcript
    /// ends with an open `Assistant:` cue.
    pub fn to_transcript(&self) -> String {
        let mut lines: Vec<String> = self
            .turns
            .iter()
            .map(|turn| format!("{}: {}", role_label(turn.role), turn.content))
            .collect();
        lines.push("Assistant:".to_string());
        lines.join("\n")
    }

    /// Total characters across all turns.
    pub fn char_len(&self) -> usize {
        self.turns.iter().map(|turn| turn.content.chars().count()).sum()
    }
}

fn role_label(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "System",
        MessageRole::User => "User",
        MessageRole::Assistant => "Assistant",
    }
}

#[derive(Serialize)]
struct SymptomLine<'a> {
    label: String,
    answer: &'a str,
}

fn symptom_label(category: &str) -> String {
    match category {
        "pain" => "Pain Description".to_string(),
        "location" => "Location".to_string(),
        "duration" => "Duration".to_string(),
        "appearance" => "Appearance".to_string(),
        "history" => "Medical History".to_string(),
        "extra" => "Additional Information".to_string(),
        other => {
            let mut chars = other.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>().replace('_', " "),
                None => String::new(),
            }
        }
    }
}

/// Turns a profile plus conversation history into a [`Prompt`].
///
/// The builder holds no state besides the template style, so identical
/// inputs always render byte-identical prompts.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptBuilder {
    style: PromptStyle,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PromptStyle {
        self.style
    }

    /// Renders the system instructions for a profile.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if template rendering fails.
    pub fn system_prompt(&self, profile: &PathologyProfile) -> Result<String> {
        let template = match self.style {
            PromptStyle::Full => FULL_TEMPLATE,
            PromptStyle::Minimal => MINIMAL_TEMPLATE,
        };
        let symptoms: Vec<SymptomLine<'_>> = profile
            .symptoms
            .iter()
            .map(|fact| SymptomLine {
                label: symptom_label(&fact.category),
                answer: &fact.answer,
            })
            .collect();

        let rendered = TEMPLATES.get_template(template)?.render(context! {
            diagnosis => &profile.diagnosis,
            chief_complaint => &profile.chief_complaint,
            symptoms => symptoms,
        })?;
        Ok(rendered.trim().to_string())
    }

    /// Builds the prompt for the next turn.
    ///
    /// `history` is the persisted conversation, system message first; it is
    /// copied verbatim. When it is empty the system turn is rendered from
    /// `profile`. `new_user_message` is appended as the final user turn.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the system template fails to render.
    pub fn build(
        &self,
        profile: &PathologyProfile,
        history: &[ChatMessage],
        new_user_message: &str,
    ) -> Result<Prompt> {
        let mut turns = Vec::with_capacity(history.len() + 2);
        if history.is_empty() {
            turns.push(ChatMessage::system(self.system_prompt(profile)?));
        } else {
            turns.extend_from_slice(history);
        }
        turns.push(ChatMessage::user(new_user_message));
        Ok(Prompt { turns })
    }
}

/// A vague first line the patient can open with.
///
/// Uses only the first clause of the chief complaint so the opening does not
/// give away the full presentation.
pub fn opening_message(profile: &PathologyProfile) -> String {
    let complaint = profile.chief_complaint.to_lowercase();
    let clause = complaint
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('.');
    if clause.is_empty() {
        return "Hi doctor. I've been having some trouble with my teeth.".to_string();
    }
    format!("Hi doctor. I've been having some trouble with my teeth - {clause}.")
}

/// Reminder block for long conversations; empty when there is nothing to say.
///
/// # Errors
///
/// Returns `Internal` if template rendering fails.
pub fn context_injection(summary: Option<&str>, facts: &[String]) -> Result<String> {
    let summary = summary.map(str::trim).filter(|s| !s.is_empty());
    if summary.is_none() && facts.is_empty() {
        return Ok(String::new());
    }
    let rendered = TEMPLATES.get_template(CONTEXT_TEMPLATE)?.render(context! {
        summary => summary,
        facts => facts,
    })?;
    Ok(rendered)
}
