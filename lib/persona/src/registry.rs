//! Read-only persona lookup.

use crate::catalog;
use crate::error::{PersonaError, SkillError};
use crate::persona::Persona;
use crate::skill::{self, SkillSpec};
use std::collections::{BTreeSet, HashMap};

/// Immutable catalog of personas with lookup by id.
///
/// Listing preserves catalog order.
#[derive(Debug, Clone)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
    by_id: HashMap<String, usize>,
}

impl PersonaRegistry {
    /// Builds a registry from a list of personas. Later duplicates of an
    /// id are dropped.
    #[must_use]
    pub fn new(personas: Vec<Persona>) -> Self {
        let mut unique = Vec::with_capacity(personas.len());
        let mut by_id = HashMap::with_capacity(personas.len());
        for persona in personas {
            if by_id.contains_key(&persona.id) {
                continue;
            }
            by_id.insert(persona.id.clone(), unique.len());
            unique.push(persona);
        }
        Self {
            personas: unique,
            by_id,
        }
    }

    /// Builds the registry from the built-in catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(catalog::builtin())
    }

    /// Returns every persona.
    #[must_use]
    pub fn list(&self) -> &[Persona] {
        &self.personas
    }

    /// Returns the persona with this id.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::NotFound` if no persona has this id.
    pub fn get(&self, id: &str) -> Result<&Persona, PersonaError> {
        self.by_id
            .get(id)
            .map(|&idx| &self.personas[idx])
            .ok_or_else(|| PersonaError::NotFound { id: id.to_string() })
    }

    /// Returns true if a persona with this id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Case-insensitive substring search over name, description, category
    /// and skill names. An empty query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Persona> {
        let needle = query.to_lowercase();
        self.personas.iter().filter(|p| p.matches(&needle)).collect()
    }

    /// Returns personas whose category equals `category` exactly.
    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<&Persona> {
        self.personas
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Returns the distinct categories.
    #[must_use]
    pub fn categories(&self) -> BTreeSet<&str> {
        self.personas.iter().map(|p| p.category.as_str()).collect()
    }

    /// Returns the declared skills of a persona.
    ///
    /// # Errors
    ///
    /// Returns `PersonaError::NotFound` if no persona has this id.
    pub fn skills(&self, id: &str) -> Result<&[String], PersonaError> {
        self.get(id).map(|p| p.skills.as_slice())
    }

    /// Validates a skill invocation and returns its dispatch entry.
    ///
    /// # Errors
    ///
    /// - `PersonaNotFound` if the persona does not exist
    /// - `Unsupported` if the persona does not declare the skill
    /// - `NotImplemented` if it does but the dispatch table has no entry
    pub fn resolve_skill(
        &self,
        persona_id: &str,
        skill_name: &str,
    ) -> Result<(&Persona, &'static SkillSpec), SkillError> {
        let persona = self.get(persona_id)?;
        if !persona.has_skill(skill_name) {
            return Err(SkillError::Unsupported {
                persona_id: persona_id.to_string(),
                skill: skill_name.to_string(),
            });
        }
        let spec = skill::lookup(skill_name).ok_or_else(|| SkillError::NotImplemented {
            skill: skill_name.to_string(),
        })?;
        Ok((persona, spec))
    }
}

impl Default for PersonaRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
