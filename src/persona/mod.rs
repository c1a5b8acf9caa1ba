pub mod composer;
pub mod store;

use crate::request::InlineMedia;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use composer::{MAX_VIDEO_REFERENCES, MIN_DESCRIPTOR_CHARS, VideoContext};
pub use store::{FilePersonaStore, PersonaStore};

/// Most reference images a persona may carry. The video composer attaches at
/// most [`MAX_VIDEO_REFERENCES`] of them per request.
pub const MAX_REFERENCE_IMAGES: usize = 6;

/// A user-authored consistency profile: behavioral instructions, an optional
/// visual descriptor, ordered few-shot dialogue examples, and reference
/// images. Owned by the persona store; the generation core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    /// Behavioral system-instruction text used for chat turns.
    pub instructions: String,
    /// Visual consistency descriptor folded into image/video prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<String>,
    pub updated_at: DateTime<Utc>,
    // Table-valued fields last so TOML serialization stays valid.
    /// Ordered few-shot examples; order affects chat history assembly.
    #[serde(default)]
    pub examples: Vec<DialogueExample>,
    #[serde(default)]
    pub reference_images: Vec<InlineMedia>,
}

/// One (input, output) few-shot pair with a stable identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueExample {
    pub id: String,
    pub input: String,
    pub output: String,
}

impl DialogueExample {
    /// Mint a fresh example with a new unique id.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            input: input.into(),
            output: output.into(),
        }
    }
}

impl Persona {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            instructions: instructions.into(),
            descriptor: None,
            updated_at: Utc::now(),
            examples: Vec::new(),
            reference_images: Vec::new(),
        }
    }

    /// Whether the descriptor is substantial enough to shape a prompt.
    /// Placeholder or empty descriptors must not inject template text.
    #[must_use]
    pub fn has_meaningful_descriptor(&self) -> bool {
        self.descriptor
            .as_deref()
            .is_some_and(|d| d.trim().chars().count() >= MIN_DESCRIPTOR_CHARS)
    }
}
