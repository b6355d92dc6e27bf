//! Skill dispatch table.
//!
//! Each skill maps to the request parameter it reads, a default for that
//! parameter, and the kind of interaction the prompt builder should run.
//! Adding a skill means adding a row here; nothing else branches on names.

use serde_json::Value as JsonValue;

/// How a skill is turned into a model interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillMode {
    /// Story generation about the input topic.
    Story,
    /// Advice on the input problem.
    Advice,
    /// Knowledge question answered in character.
    Question,
    /// In-character chat driven by an instruction. `{input}` in the
    /// template is replaced with the extracted parameter.
    Directed(&'static str),
}

/// One row of the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillSpec {
    pub name: &'static str,
    /// Request parameter key the input is read from.
    pub param: &'static str,
    /// Value used when the parameter is absent.
    pub default_input: &'static str,
    pub mode: SkillMode,
}

const fn spec(
    name: &'static str,
    param: &'static str,
    default_input: &'static str,
    mode: SkillMode,
) -> SkillSpec {
    SkillSpec {
        name,
        param,
        default_input,
        mode,
    }
}

/// Every implemented skill.
pub const SKILLS: &[SkillSpec] = &[
    spec(
        "magic_knowledge",
        "question",
        "Please introduce the basics of the wizarding world",
        SkillMode::Directed("As an expert in magic, answer this: {input}"),
    ),
    spec("story_creation", "topic", "adventure", SkillMode::Story),
    spec("life_advice", "problem", "", SkillMode::Advice),
    spec("question_answering", "question", "", SkillMode::Question),
    spec("deep_questioning", "question", "", SkillMode::Question),
    spec("scientific_explanation", "question", "", SkillMode::Question),
    spec(
        "philosophical_dialogue",
        "topic",
        "",
        SkillMode::Directed("Engage in a philosophical inquiry into '{input}'"),
    ),
    spec(
        "innovative_thinking",
        "challenge",
        "",
        SkillMode::Directed("Facing this challenge: '{input}', propose an innovative solution"),
    ),
    spec(
        "emotional_analysis",
        "situation",
        "",
        SkillMode::Directed("Analyse this emotional situation: '{input}'"),
    ),
    spec(
        "literary_creation",
        "topic",
        "reflections on life",
        SkillMode::Directed("Compose a literary piece about '{input}'"),
    ),
    spec(
        "language_artistry",
        "text",
        "",
        SkillMode::Directed("Polish this passage with artful language: '{input}'"),
    ),
    spec(
        "life_insight",
        "experience",
        "",
        SkillMode::Directed("Drawing on this experience: '{input}', share your insight into life"),
    ),
    spec(
        "art_guidance",
        "art_type",
        "painting",
        SkillMode::Directed("Offer artistic guidance on '{input}'"),
    ),
    spec(
        "inventive_design",
        "design_challenge",
        "",
        SkillMode::Directed(
            "Propose an inventive solution to this design challenge: '{input}'",
        ),
    ),
    spec(
        "observational_analysis",
        "observation",
        "",
        SkillMode::Directed("Analyse this observation: '{input}'"),
    ),
    spec(
        "education_guidance",
        "subject",
        "science",
        SkillMode::Directed("Offer educational guidance on '{input}'"),
    ),
    spec(
        "philosophical_reflection",
        "philosophical_question",
        "",
        SkillMode::Directed("Reflect philosophically on this question: '{input}'"),
    ),
    spec(
        "logical_reasoning",
        "logical_problem",
        "",
        SkillMode::Directed("Solve this problem through logical reasoning: '{input}'"),
    ),
];

/// Looks up a skill by name.
#[must_use]
pub fn lookup(name: &str) -> Option<&'static SkillSpec> {
    SKILLS.iter().find(|spec| spec.name == name)
}

impl SkillSpec {
    /// Reads this skill's input from request parameters.
    ///
    /// Strings are used as-is, any other JSON value is rendered as JSON
    /// text, and a missing key (or non-object params) yields the default.
    #[must_use]
    pub fn extract_input(&self, params: &JsonValue) -> String {
        match params.get(self.param) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => self.default_input.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

impl SkillMode {
    /// Substitutes `input` into a directed template. Other modes return
    /// the input unchanged.
    #[must_use]
    pub fn render(&self, input: &str) -> String {
        match self {
            Self::Directed(template) => template.replace("{input}", input),
            Self::Story | Self::Advice | Self::Question => input.to_string(),
        }
    }
}
