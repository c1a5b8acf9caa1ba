//! Structured-output coordination.
//!
//! Planning and authoring calls ask the provider for JSON constrained by a
//! response schema, then validate what comes back. A misbehaving provider
//! never surfaces as an error here: parse or shape failures downgrade to a
//! deterministic fallback so downstream callers always hold renderable data.

use crate::persona::DialogueExample;
use serde::Deserialize;
use serde_json::{Value, json};

/// Generic storyboard substituted when the provider's plan is unusable.
pub const FALLBACK_SCENES: [&str; 4] = [
    "A wide establishing shot of the setting",
    "A medium shot introducing the main subject",
    "A close-up on the key action",
    "A closing shot as the scene resolves",
];

/// Response schema for storyboard planning: an ordered array of scene
/// description strings.
#[must_use]
pub fn storyboard_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": { "type": "STRING" }
    })
}

/// Response schema for persona authoring.
#[must_use]
pub fn persona_profile_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "instructions": { "type": "STRING" },
            "descriptor": { "type": "STRING" },
            "examples": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "input": { "type": "STRING" },
                        "output": { "type": "STRING" }
                    },
                    "required": ["input", "output"]
                }
            }
        },
        "required": ["instructions", "descriptor"]
    })
}

/// Profile assembled from a persona-authoring call. Example ids are minted
/// fresh at assembly time, never carried over from a prior profile.
#[derive(Debug, Clone)]
pub struct AuthoredPersona {
    pub instructions: String,
    pub descriptor: String,
    pub examples: Vec<DialogueExample>,
}

/// Deterministic persona profile used when authoring output is unusable.
#[must_use]
pub fn fallback_profile(name: &str) -> AuthoredPersona {
    AuthoredPersona {
        instructions: format!(
            "You are {name}. Stay in character, keep replies concise, and \
             speak in a warm, consistent voice."
        ),
        descriptor: format!("{name}, rendered with a consistent, recognizable appearance."),
        examples: vec![
            DialogueExample::new("Hello!", format!("Hi, I'm {name}. Good to meet you.")),
            DialogueExample::new(
                "What do you like to do?",
                "I'm happiest in the middle of a good story.",
            ),
        ],
    }
}

/// Parse a storyboard-planning response. Any failure (non-JSON, wrong shape,
/// empty plan, blank entries) yields the fixed fallback scenes.
#[must_use]
pub fn parse_storyboard(raw: &str) -> Vec<String> {
    let body = strip_code_fences(raw);
    match serde_json::from_str::<Vec<String>>(body) {
        Ok(scenes) => {
            let scenes: Vec<String> = scenes
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if scenes.is_empty() {
                tracing::warn!("storyboard plan was empty, substituting fallback scenes");
                fallback_scenes()
            } else {
                scenes
            }
        }
        Err(err) => {
            tracing::warn!("storyboard plan was not valid JSON ({err}), substituting fallback scenes");
            fallback_scenes()
        }
    }
}

fn fallback_scenes() -> Vec<String> {
    FALLBACK_SCENES.iter().map(|s| (*s).to_string()).collect()
}

#[derive(Debug, Deserialize)]
struct WireProfile {
    instructions: String,
    #[serde(default)]
    descriptor: String,
    #[serde(default)]
    examples: Vec<WireExample>,
}

#[derive(Debug, Deserialize)]
struct WireExample {
    input: String,
    output: String,
}

/// Parse a persona-authoring response; `name` seeds the fallback profile when
/// the output is unusable. Example identifiers are always newly minted.
#[must_use]
pub fn parse_persona_profile(raw: &str, name: &str) -> AuthoredPersona {
    let body = strip_code_fences(raw);
    match serde_json::from_str::<WireProfile>(body) {
        Ok(profile) if !profile.instructions.trim().is_empty() => AuthoredPersona {
            instructions: profile.instructions.trim().to_string(),
            descriptor: profile.descriptor.trim().to_string(),
            examples: profile
                .examples
                .into_iter()
                .filter(|e| !e.input.trim().is_empty() && !e.output.trim().is_empty())
                .map(|e| DialogueExample::new(e.input.trim(), e.output.trim()))
                .collect(),
        },
        Ok(_) => {
            tracing::warn!("persona profile had empty instructions, substituting fallback");
            fallback_profile(name)
        }
        Err(err) => {
            tracing::warn!("persona profile was not valid JSON ({err}), substituting fallback");
            fallback_profile(name)
        }
    }
}

/// Providers sometimes wrap JSON in markdown fences even under a schema
/// constraint; tolerate that before parsing.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}
