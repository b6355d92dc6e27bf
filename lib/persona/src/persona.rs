//! The persona record.

use serde::{Deserialize, Serialize};

/// A character profile.
///
/// Personas are immutable once the registry is built. The serialized form is
/// what `/api/characters` returns, so field names are part of the public API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    /// Unique key, e.g. `socrates`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-paragraph introduction.
    pub description: String,
    pub personality: String,
    pub speaking_style: String,
    /// Knowledge domain injected into prompts.
    pub knowledge: String,
    /// Declared skills, in display order.
    pub skills: Vec<String>,
    pub expertise: String,
    pub writing_style: String,
    /// Avatar path served by the front end.
    pub avatar: String,
    /// Voice profile id used for synthesis.
    pub voice: String,
    pub category: String,
}

impl Persona {
    /// Returns true if the persona declares `skill`.
    #[must_use]
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    /// Case-insensitive substring match over name, description, category
    /// and skill names. `needle` must already be lowercased.
    pub(crate) fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
            || self.category.to_lowercase().contains(needle)
            || self
                .skills
                .iter()
                .any(|skill| skill.to_lowercase().contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Persona {
        Persona {
            id: "ada".to_string(),
            name: "Ada Lovelace".to_string(),
            description: "Mathematician and first programmer".to_string(),
            personality: "curious".to_string(),
            speaking_style: "precise".to_string(),
            knowledge: "analytical engines".to_string(),
            skills: vec!["question_answering".to_string()],
            expertise: "mathematics".to_string(),
            writing_style: "lucid".to_string(),
            avatar: "/static/images/characters/ada.jpg".to_string(),
            voice: "xiaoyun".to_string(),
            category: "Scientist".to_string(),
        }
    }

    #[test]
    fn has_skill_is_exact() {
        let persona = sample();
        assert!(persona.has_skill("question_answering"));
        assert!(!persona.has_skill("question"));
    }

    #[test]
    fn matches_any_field() {
        let persona = sample();
        assert!(persona.matches("lovelace"));
        assert!(persona.matches("programmer"));
        assert!(persona.matches("scientist"));
        assert!(persona.matches("answering"));
        assert!(!persona.matches("opera"));
    }
}
