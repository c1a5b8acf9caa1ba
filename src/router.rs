//! Capability-to-model routing.
//!
//! Pure decision logic: no I/O, evaluated fresh per request because the
//! selection depends on per-call inputs (quality flag, reference images,
//! start frame). Provider constraints that override caller settings are
//! enforced here, not at the wire layer.

use crate::request::{AspectRatio, CapabilityRequest, ImageQuality, Resolution};

pub mod models {
    pub const IMAGE_PRO: &str = "gemini-3-pro-image-preview";
    pub const IMAGE_FAST: &str = "gemini-2.5-flash-image";
    pub const VIDEO_CONSISTENCY: &str = "veo-3.1-generate-preview";
    pub const VIDEO_FAST: &str = "veo-3.1-fast-generate-preview";
    pub const TEXT: &str = "gemini-2.5-flash";
}

/// Prompt used when a start frame is supplied without any text.
pub const DEFAULT_ANIMATION_PROMPT: &str =
    "Animate this image with subtle, natural motion.";

/// Output size requested on the pro image tier.
pub const PRO_IMAGE_SIZE: &str = "2K";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub model: &'static str,
    pub config: CapabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityConfig {
    Image(ImageSelection),
    Video(VideoSelection),
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSelection {
    /// Always present for image capabilities; omission is a defect.
    pub aspect_ratio: AspectRatio,
    pub image_size: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSelection {
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    /// Substituted by the facade when the caller's prompt is empty and a
    /// start frame is present.
    pub fallback_prompt: Option<&'static str>,
}

/// Map a capability request to a concrete model and its configuration
/// envelope. Deterministic and side-effect-free.
#[must_use]
pub fn route(request: &CapabilityRequest) -> ModelSelection {
    match request {
        CapabilityRequest::ImageGenerate {
            quality,
            aspect_ratio,
            ..
        }
        | CapabilityRequest::ImageEdit {
            quality,
            aspect_ratio,
            ..
        } => image_selection(*quality, *aspect_ratio),

        CapabilityRequest::VideoGenerate {
            prompt,
            aspect_ratio,
            resolution,
            persona,
            start_frame,
        } => {
            // A start frame pins the fast model and sidelines the persona
            // (the composer applies the same precedence).
            if start_frame.is_some() {
                return ModelSelection {
                    model: models::VIDEO_FAST,
                    config: CapabilityConfig::Video(VideoSelection {
                        aspect_ratio: *aspect_ratio,
                        resolution: *resolution,
                        fallback_prompt: prompt
                            .trim()
                            .is_empty()
                            .then_some(DEFAULT_ANIMATION_PROMPT),
                    }),
                };
            }

            let has_references = persona
                .as_ref()
                .is_some_and(|p| !p.reference_images.is_empty());
            if has_references {
                // Provider constraint: reference assets only work at
                // 720p / 16:9, regardless of what the caller asked for.
                return ModelSelection {
                    model: models::VIDEO_CONSISTENCY,
                    config: CapabilityConfig::Video(VideoSelection {
                        aspect_ratio: AspectRatio::Landscape,
                        resolution: Resolution::P720,
                        fallback_prompt: None,
                    }),
                };
            }

            ModelSelection {
                model: models::VIDEO_FAST,
                config: CapabilityConfig::Video(VideoSelection {
                    aspect_ratio: *aspect_ratio,
                    resolution: *resolution,
                    fallback_prompt: None,
                }),
            }
        }

        CapabilityRequest::Analyze { .. }
        | CapabilityRequest::Chat { .. }
        | CapabilityRequest::OptimizeInstruction { .. }
        | CapabilityRequest::DerivePersonaFromReferences { .. }
        | CapabilityRequest::AutoAuthorPersona { .. } => ModelSelection {
            model: models::TEXT,
            config: CapabilityConfig::Text,
        },
    }
}

fn image_selection(quality: ImageQuality, aspect_ratio: AspectRatio) -> ModelSelection {
    match quality {
        ImageQuality::High => ModelSelection {
            model: models::IMAGE_PRO,
            config: CapabilityConfig::Image(ImageSelection {
                aspect_ratio,
                image_size: Some(PRO_IMAGE_SIZE),
            }),
        },
        ImageQuality::Normal => ModelSelection {
            model: models::IMAGE_FAST,
            config: CapabilityConfig::Image(ImageSelection {
                aspect_ratio,
                image_size: None,
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::Persona;
    use crate::request::InlineMedia;

    fn video_request(
        prompt: &str,
        aspect: AspectRatio,
        persona: Option<Persona>,
        start_frame: Option<InlineMedia>,
    ) -> CapabilityRequest {
        CapabilityRequest::VideoGenerate {
            prompt: prompt.to_string(),
            aspect_ratio: aspect,
            resolution: Resolution::P1080,
            persona,
            start_frame,
        }
    }

    fn persona_with_references(count: usize) -> Persona {
        let mut persona = Persona::new("Ann", "stay in character");
        persona.reference_images = (0..count)
            .map(|i| InlineMedia::new("image/png", format!("ref{i}")))
            .collect();
        persona
    }

    #[test]
    fn high_quality_image_routes_pro_with_2k() {
        let selection = route(&CapabilityRequest::ImageGenerate {
            prompt: "a lighthouse".into(),
            quality: ImageQuality::High,
            aspect_ratio: AspectRatio::Landscape,
            persona: None,
        });
        assert_eq!(selection.model, models::IMAGE_PRO);
        let CapabilityConfig::Image(image) = selection.config else {
            panic!("expected image config");
        };
        assert_eq!(image.image_size, Some("2K"));
        assert_eq!(image.aspect_ratio, AspectRatio::Landscape);
    }

    #[test]
    fn normal_quality_image_routes_fast_without_size() {
        let selection = route(&CapabilityRequest::ImageGenerate {
            prompt: "a lighthouse".into(),
            quality: ImageQuality::Normal,
            aspect_ratio: AspectRatio::Square,
            persona: None,
        });
        assert_eq!(selection.model, models::IMAGE_FAST);
        let CapabilityConfig::Image(image) = selection.config else {
            panic!("expected image config");
        };
        assert_eq!(image.image_size, None);
        // Aspect ratio must always be carried for image capabilities.
        assert_eq!(image.aspect_ratio, AspectRatio::Square);
    }

    #[test]
    fn image_edit_follows_same_quality_split() {
        let selection = route(&CapabilityRequest::ImageEdit {
            prompt: "make it night".into(),
            source: InlineMedia::new("image/png", "AAAA"),
            quality: ImageQuality::High,
            aspect_ratio: AspectRatio::Portrait,
            persona: None,
        });
        assert_eq!(selection.model, models::IMAGE_PRO);
    }

    #[test]
    fn reference_images_force_consistency_model_and_720p_landscape() {
        let request = video_request(
            "waves",
            AspectRatio::Portrait,
            Some(persona_with_references(2)),
            None,
        );
        let selection = route(&request);
        assert_eq!(selection.model, models::VIDEO_CONSISTENCY);
        let CapabilityConfig::Video(video) = selection.config else {
            panic!("expected video config");
        };
        // Caller asked for 9:16 / 1080p; the provider constraint wins.
        assert_eq!(video.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(video.resolution, Resolution::P720);
    }

    #[test]
    fn start_frame_routes_fast_even_with_persona_references() {
        let request = video_request(
            "pan left",
            AspectRatio::Landscape,
            Some(persona_with_references(3)),
            Some(InlineMedia::new("image/png", "frame")),
        );
        let selection = route(&request);
        assert_eq!(selection.model, models::VIDEO_FAST);
    }

    #[test]
    fn empty_prompt_with_start_frame_gets_default_prompt() {
        let request = video_request(
            "   ",
            AspectRatio::Landscape,
            None,
            Some(InlineMedia::new("image/png", "frame")),
        );
        let CapabilityConfig::Video(video) = route(&request).config else {
            panic!("expected video config");
        };
        assert_eq!(video.fallback_prompt, Some(DEFAULT_ANIMATION_PROMPT));
    }

    #[test]
    fn text_only_video_routes_fast_with_caller_settings() {
        let request = video_request("a drone shot", AspectRatio::Portrait, None, None);
        let selection = route(&request);
        assert_eq!(selection.model, models::VIDEO_FAST);
        let CapabilityConfig::Video(video) = selection.config else {
            panic!("expected video config");
        };
        assert_eq!(video.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(video.resolution, Resolution::P1080);
        assert_eq!(video.fallback_prompt, None);
    }

    #[test]
    fn text_capabilities_route_general_model() {
        for request in [
            CapabilityRequest::OptimizeInstruction { draft: "x".into() },
            CapabilityRequest::AutoAuthorPersona { brief: "pirate".into() },
            CapabilityRequest::Chat {
                message: "hi".into(),
                history: vec![],
                persona: None,
            },
        ] {
            assert_eq!(route(&request).model, models::TEXT);
        }
    }
}
