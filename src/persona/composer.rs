//! Consistency context composition.
//!
//! Pure request-shaping transforms that merge an optional [`Persona`] into a
//! caller's prompt without corrupting it. No provider I/O happens here; the
//! precedence rules are the subtle part and are pinned down by the tests.

use super::Persona;
use crate::request::InlineMedia;

/// Minimum descriptor length (in chars, trimmed) considered meaningful.
pub const MIN_DESCRIPTOR_CHARS: usize = 10;

/// Provider limit on identity-locking reference assets per video request.
pub const MAX_VIDEO_REFERENCES: usize = 3;

/// Composed video request material: the final prompt plus any reference
/// images to attach as identity-locking assets.
#[derive(Debug, Clone, Default)]
pub struct VideoContext {
    pub prompt: String,
    pub references: Vec<InlineMedia>,
}

/// Shape an image prompt. With no persona (or a placeholder descriptor) the
/// caller's text passes through untouched; otherwise the descriptor is framed
/// as an immutable character reference ahead of the scene text.
#[must_use]
pub fn compose_image_prompt(user_text: &str, persona: Option<&Persona>) -> String {
    let Some(persona) = persona else {
        return user_text.to_string();
    };
    if !persona.has_meaningful_descriptor() {
        return user_text.to_string();
    }
    let descriptor = persona
        .descriptor
        .as_deref()
        .unwrap_or_default()
        .trim();

    format!(
        "Character reference (immutable, visual details must match exactly):\n\
         {descriptor}\n\n\
         Scene/action:\n\
         {user_text}"
    )
}

/// Shape a video request. Precedence, highest first:
///
/// 1. A start frame wins outright: animating a fixed image must not be
///    overridden by an unrelated character description, so the persona is
///    ignored entirely.
/// 2. Persona reference images are attached directly (capped at
///    [`MAX_VIDEO_REFERENCES`]) and the descriptor is NOT also folded into
///    the prompt; doubling up sends the model conflicting signals.
/// 3. A descriptor without references is folded into the prompt with
///    cinematic framing.
/// 4. Otherwise the text passes through unchanged.
#[must_use]
pub fn compose_video_context(
    user_text: &str,
    persona: Option<&Persona>,
    start_frame: Option<&InlineMedia>,
) -> VideoContext {
    if start_frame.is_some() {
        return VideoContext {
            prompt: user_text.to_string(),
            references: Vec::new(),
        };
    }

    let Some(persona) = persona else {
        return VideoContext {
            prompt: user_text.to_string(),
            references: Vec::new(),
        };
    };

    if !persona.reference_images.is_empty() {
        return VideoContext {
            prompt: user_text.to_string(),
            references: persona
                .reference_images
                .iter()
                .take(MAX_VIDEO_REFERENCES)
                .cloned()
                .collect(),
        };
    }

    if persona.has_meaningful_descriptor() {
        let descriptor = persona.descriptor.as_deref().unwrap_or_default().trim();
        return VideoContext {
            prompt: format!(
                "Cinematic shot featuring this exact character:\n\
                 {descriptor}\n\n\
                 Action:\n\
                 {user_text}"
            ),
            references: Vec::new(),
        };
    }

    VideoContext {
        prompt: user_text.to_string(),
        references: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona_with(descriptor: Option<&str>, references: usize) -> Persona {
        let mut persona = Persona::new("Ann", "stay in character");
        persona.descriptor = descriptor.map(String::from);
        persona.reference_images = (0..references)
            .map(|i| InlineMedia::new("image/png", format!("ref{i}")))
            .collect();
        persona
    }

    #[test]
    fn image_prompt_passes_through_without_persona() {
        assert_eq!(compose_image_prompt("a red balloon", None), "a red balloon");
    }

    #[test]
    fn image_prompt_ignores_placeholder_descriptor() {
        let persona = persona_with(Some("tbd"), 0);
        assert_eq!(
            compose_image_prompt("a red balloon", Some(&persona)),
            "a red balloon"
        );
    }

    #[test]
    fn image_prompt_frames_descriptor_as_character_reference() {
        let persona = persona_with(Some("Silver hair, red coat, green eyes"), 0);
        let prompt = compose_image_prompt("walking through snow", Some(&persona));
        assert!(prompt.contains("Character reference"));
        assert!(prompt.contains("Silver hair, red coat, green eyes"));
        assert!(prompt.contains("walking through snow"));
        assert!(prompt.contains("match exactly"));
    }

    #[test]
    fn video_references_take_precedence_over_descriptor() {
        let persona = persona_with(Some("Silver hair, red coat, green eyes"), 2);
        let ctx = compose_video_context("waves at the camera", Some(&persona), None);
        assert_eq!(ctx.references.len(), 2);
        // Descriptor must NOT leak into the prompt when references are used.
        assert_eq!(ctx.prompt, "waves at the camera");
    }

    #[test]
    fn video_references_are_capped_at_three() {
        let persona = persona_with(None, 5);
        let ctx = compose_video_context("runs", Some(&persona), None);
        assert_eq!(ctx.references.len(), MAX_VIDEO_REFERENCES);
    }

    #[test]
    fn video_descriptor_without_references_is_folded_in() {
        let persona = persona_with(Some("Silver hair, red coat, green eyes"), 0);
        let ctx = compose_video_context("waves at the camera", Some(&persona), None);
        assert!(ctx.references.is_empty());
        assert!(ctx.prompt.contains("Cinematic shot"));
        assert!(ctx.prompt.contains("Silver hair"));
        assert!(ctx.prompt.contains("waves at the camera"));
    }

    #[test]
    fn start_frame_ignores_persona_entirely() {
        let persona = persona_with(Some("Silver hair, red coat, green eyes"), 3);
        let frame = InlineMedia::new("image/png", "frame");
        let ctx = compose_video_context("pan left", Some(&persona), Some(&frame));
        assert!(ctx.references.is_empty());
        assert_eq!(ctx.prompt, "pan left");
    }

    #[test]
    fn video_without_persona_passes_through() {
        let ctx = compose_video_context("a drone shot of cliffs", None, None);
        assert_eq!(ctx.prompt, "a drone shot of cliffs");
        assert!(ctx.references.is_empty());
    }
}
