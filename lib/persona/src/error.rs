//! Error types for persona lookup and skill resolution.

use std::fmt;

/// Errors from persona lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonaError {
    /// No persona with this id exists in the catalog.
    NotFound { id: String },
}

impl fmt::Display for PersonaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { id } => write!(f, "persona not found: {id}"),
        }
    }
}

impl std::error::Error for PersonaError {}

/// Errors from resolving a skill invocation.
///
/// `Unsupported` and `NotImplemented` are kept apart: the first means the
/// persona never declared the skill, the second means it did but no
/// dispatch entry exists for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillError {
    /// The persona does not exist.
    PersonaNotFound { persona_id: String },
    /// The persona does not declare this skill.
    Unsupported { persona_id: String, skill: String },
    /// The skill is declared but has no dispatch entry.
    NotImplemented { skill: String },
}

impl fmt::Display for SkillError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersonaNotFound { persona_id } => {
                write!(f, "persona not found: {persona_id}")
            }
            Self::Unsupported { persona_id, skill } => {
                write!(f, "persona '{persona_id}' does not have skill '{skill}'")
            }
            Self::NotImplemented { skill } => {
                write!(f, "skill '{skill}' is not implemented yet")
            }
        }
    }
}

impl std::error::Error for SkillError {}

impl From<PersonaError> for SkillError {
    fn from(err: PersonaError) -> Self {
        match err {
            PersonaError::NotFound { id } => Self::PersonaNotFound { persona_id: id },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skill_error_display() {
        let err = SkillError::Unsupported {
            persona_id: "einstein".to_string(),
            skill: "magic_knowledge".to_string(),
        };
        assert!(err.to_string().contains("einstein"));
        assert!(err.to_string().contains("magic_knowledge"));
    }

    #[test]
    fn persona_error_converts_to_skill_error() {
        let err: SkillError = PersonaError::NotFound {
            id: "merlin".to_string(),
        }
        .into();
        assert_eq!(
            err,
            SkillError::PersonaNotFound {
                persona_id: "merlin".to_string()
            }
        );
    }
}
