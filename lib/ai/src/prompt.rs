//! Persona prompt construction.
//!
//! [`build_prompt`] is a pure function of (persona, kind, input): no clock,
//! no randomness, no I/O. Every prompt opens with the same persona header
//! so the model always receives the full character profile, and the kind
//! only decides what is appended after it.

use crate::backend::LlmRequest;
use timetalker_persona::{Persona, SkillMode, SkillSpec};

/// What the user is asking the persona to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionKind<'a> {
    /// Free conversation.
    Chat,
    /// A story on the given topic.
    Story,
    /// Advice on a problem.
    Advice,
    /// A knowledge question.
    Question,
    /// One of the persona's named skills.
    Skill(&'a SkillSpec),
}

/// A system prompt plus the user message to send with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaPrompt {
    pub system: String,
    pub user: String,
}

impl PersonaPrompt {
    /// Converts the prompt into a backend request.
    #[must_use]
    pub fn into_request(self) -> LlmRequest {
        LlmRequest::new(self.user).with_system(self.system)
    }
}

/// Builds the prompt for `persona` performing `kind` on `input`.
#[must_use]
pub fn build_prompt(persona: &Persona, kind: InteractionKind<'_>, input: &str) -> PersonaPrompt {
    let mut system = header(persona);
    let user = match kind {
        InteractionKind::Chat => {
            push_chat_guidelines(&mut system, persona);
            input.to_string()
        }
        InteractionKind::Story => story(&mut system, persona, input),
        InteractionKind::Advice => advice(&mut system, persona, input),
        InteractionKind::Question => question(&mut system, persona, input),
        InteractionKind::Skill(spec) => match spec.mode {
            SkillMode::Story => story(&mut system, persona, input),
            SkillMode::Advice => advice(&mut system, persona, input),
            SkillMode::Question => question(&mut system, persona, input),
            SkillMode::Directed(_) => {
                push_chat_guidelines(&mut system, persona);
                system.push_str("\n\nActive skill: ");
                system.push_str(spec.name);
                spec.mode.render(input)
            }
        },
    };
    PersonaPrompt { system, user }
}

fn header(persona: &Persona) -> String {
    format!(
        "You are {name}, {description}.\n\
         \n\
         Character profile:\n\
         - Personality: {personality}\n\
         - Speaking style: {speaking_style}\n\
         - Knowledge: {knowledge}\n\
         - Skills: {skills}",
        name = persona.name,
        description = persona.description,
        personality = persona.personality,
        speaking_style = persona.speaking_style,
        knowledge = persona.knowledge,
        skills = persona.skills.join(", "),
    )
}

fn push_chat_guidelines(system: &mut String, persona: &Persona) {
    system.push_str(&format!(
        "\n\n\
         Stay strictly in character and keep every reply consistent with this profile. Your replies should:\n\
         1. Match your personality and speaking style\n\
         2. Reflect your knowledge background\n\
         3. Keep the conversation natural and fluent\n\
         4. Draw on your skills where they fit\n\
         5. Be vivid and engaging\n\
         6. Use the terms and turns of phrase that belong to your character\n\
         \n\
         Remember: you are {name} yourself. Speak in the first person and bring the conversation to life!",
        name = persona.name,
    ));
}

fn story(system: &mut String, persona: &Persona, topic: &str) -> String {
    let writing_style = non_empty_or(&persona.writing_style, "vivid and engaging");
    system.push_str(&format!(
        "\n\n\
         You are now writing a story on the theme \"{topic}\", told from your own perspective. Let it show your:\n\
         - Personality: {personality}\n\
         - Knowledge: {knowledge}\n\
         - Writing style: {writing_style}\n\
         \n\
         Story requirements:\n\
         1. Moderate length (200-500 words)\n\
         2. A complete arc with a beginning, development, turn and resolution\n\
         3. Your distinctive point of view\n\
         4. Vivid, moving language",
        personality = persona.personality,
        knowledge = persona.knowledge,
    ));
    format!("Please write a story about {topic}")
}

fn advice(system: &mut String, persona: &Persona, problem: &str) -> String {
    let expertise = non_empty_or(&persona.expertise, "the wisdom of life");
    system.push_str(&format!(
        "\n\n\
         Someone has come to you for advice. Draw on your:\n\
         - Experience: {knowledge}\n\
         - Outlook: {personality}\n\
         - Expertise: {expertise}\n\
         \n\
         Give sincere, thoughtful advice that:\n\
         1. Reflects your own perspective and wisdom\n\
         2. Is practical and inspiring\n\
         3. Is warm and empathetic in tone\n\
         4. Offers concrete guidance grounded in your experience",
        knowledge = persona.knowledge,
        personality = persona.personality,
    ));
    format!("I'm facing this problem: {problem}. Please give me some advice.")
}

fn question(system: &mut String, persona: &Persona, question: &str) -> String {
    system.push_str(&format!(
        "\n\n\
         Someone is asking you a question. Answer from your expertise:\n\
         - Field of knowledge: {knowledge}\n\
         - Background: {expertise}\n\
         - Perspective: {personality}\n\
         \n\
         Give an accurate, insightful answer that:\n\
         1. Shows your command of the subject\n\
         2. Is clear and easy to follow\n\
         3. Includes concrete examples or explanations\n\
         4. Keeps your speaking style",
        knowledge = persona.knowledge,
        expertise = persona.expertise,
        personality = persona.personality,
    ));
    question.to_string()
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}
