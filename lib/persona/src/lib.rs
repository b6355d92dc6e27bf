//! Persona catalog for TimeTalker.
//!
//! A persona is a character profile (a wizard, a philosopher, a painter...)
//! that drives prompt construction and decides which skills a user may
//! invoke. The catalog is built once at startup and only read afterwards,
//! so a [`PersonaRegistry`] can be shared behind an `Arc` without locking.

pub mod catalog;
pub mod error;
pub mod persona;
pub mod registry;
pub mod skill;

pub use error::{PersonaError, SkillError};
pub use persona::Persona;
pub use registry::PersonaRegistry;
pub use skill::{SkillMode, SkillSpec};
