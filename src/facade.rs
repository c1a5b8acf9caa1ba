//! Public generation entry points.
//!
//! One method per capability. Each call routes to a model, composes persona
//! context when one is supplied, then goes to the provider through the retry
//! wrapper (and through the operation poller for video). Response shapes are
//! mapped into artifacts/text here; no other business logic lives in this
//! layer.

use crate::config::Config;
use crate::error::{MediaError, SmithError};
use crate::operations::OperationPoller;
use crate::persona::{Persona, composer};
use crate::provider::ProviderFactory;
use crate::provider::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, ImageConfig,
    Part, VideoGenerationRequest, VideoImage, VideoInstance, VideoParameters,
    VideoReferenceImage,
};
use crate::request::{
    AspectRatio, CapabilityRequest, ChatTurn, ImageQuality, InlineMedia, MediaArtifact,
    Resolution, TurnRole,
};
use crate::retry::{RetryClassifier, RetryPolicy, with_retry};
use crate::router::{self, CapabilityConfig};
use crate::structured::{
    AuthoredPersona, parse_persona_profile, parse_storyboard, persona_profile_schema,
    storyboard_schema,
};
use std::sync::Arc;

const OPTIMIZE_SYSTEM_PROMPT: &str = "You improve prompts for generative image and video \
     models. Rewrite the user's draft to be vivid, specific, and well structured. Reply \
     with the improved prompt only, no commentary.";

const DERIVE_DESCRIPTOR_PROMPT: &str = "Describe the character shown in these reference \
     images in precise, reusable visual detail: face, hair, build, clothing, palette, and \
     distinguishing marks. Write one paragraph usable as a character reference for \
     image generation.";

pub struct GenerationFacade {
    factory: Arc<dyn ProviderFactory>,
    policy: RetryPolicy,
    classifier: RetryClassifier,
    poller: OperationPoller,
}

impl GenerationFacade {
    #[must_use]
    pub fn new(factory: Arc<dyn ProviderFactory>, config: &Config) -> Self {
        Self {
            factory,
            policy: RetryPolicy::from_config(&config.reliability),
            classifier: RetryClassifier::from_config(&config.reliability),
            poller: OperationPoller::from_config(config),
        }
    }

    // ── Image ───────────────────────────────────────────────────────────

    pub async fn generate_image(
        &self,
        prompt: &str,
        quality: ImageQuality,
        aspect_ratio: AspectRatio,
        persona: Option<&Persona>,
    ) -> crate::error::Result<MediaArtifact> {
        let request = CapabilityRequest::ImageGenerate {
            prompt: prompt.to_string(),
            quality,
            aspect_ratio,
            persona: persona.cloned(),
        };
        self.run_image(&request, prompt, persona, None).await
    }

    pub async fn edit_image(
        &self,
        prompt: &str,
        source: InlineMedia,
        quality: ImageQuality,
        aspect_ratio: AspectRatio,
        persona: Option<&Persona>,
    ) -> crate::error::Result<MediaArtifact> {
        let request = CapabilityRequest::ImageEdit {
            prompt: prompt.to_string(),
            source: source.clone(),
            quality,
            aspect_ratio,
            persona: persona.cloned(),
        };
        self.run_image(&request, prompt, persona, Some(source)).await
    }

    async fn run_image(
        &self,
        request: &CapabilityRequest,
        prompt: &str,
        persona: Option<&Persona>,
        source: Option<InlineMedia>,
    ) -> crate::error::Result<MediaArtifact> {
        let selection = router::route(request);
        let CapabilityConfig::Image(image_cfg) = &selection.config else {
            return Err(SmithError::Other(anyhow::anyhow!(
                "router returned a non-image config for an image capability"
            )));
        };

        let shaped_prompt = composer::compose_image_prompt(prompt, persona);
        let mut parts = Vec::new();
        if let Some(source) = source {
            parts.push(Part::inline_data(source.mime_type, source.data));
        }
        parts.push(Part::text(shaped_prompt));

        let wire = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["IMAGE".to_string()]),
                image_config: Some(ImageConfig {
                    aspect_ratio: image_cfg.aspect_ratio.as_str().to_string(),
                    image_size: image_cfg.image_size.map(String::from),
                }),
                ..GenerationConfig::default()
            }),
        };

        let provider = self.factory.create().map_err(SmithError::Other)?;
        let response = with_retry(&self.policy, &self.classifier, "generate_image", || {
            provider.generate(selection.model, &wire)
        })
        .await
        .map_err(SmithError::Other)?;

        let image = response.first_inline_image().ok_or(MediaError::NoImage)?;
        let mime_type = if image.mime_type.is_empty() {
            "image/png".to_string()
        } else {
            image.mime_type.clone()
        };
        Ok(MediaArtifact::Image {
            data_uri: format!("data:{mime_type};base64,{}", image.data),
            mime_type,
        })
    }

    // ── Video ───────────────────────────────────────────────────────────

    pub async fn generate_video(
        &self,
        prompt: &str,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
        persona: Option<&Persona>,
        start_frame: Option<InlineMedia>,
    ) -> crate::error::Result<MediaArtifact> {
        let request = CapabilityRequest::VideoGenerate {
            prompt: prompt.to_string(),
            aspect_ratio,
            resolution,
            persona: persona.cloned(),
            start_frame: start_frame.clone(),
        };
        let selection = router::route(&request);
        let CapabilityConfig::Video(video_cfg) = &selection.config else {
            return Err(SmithError::Other(anyhow::anyhow!(
                "router returned a non-video config for the video capability"
            )));
        };

        let context = composer::compose_video_context(prompt, persona, start_frame.as_ref());
        let effective_prompt = match video_cfg.fallback_prompt {
            Some(fallback) if context.prompt.trim().is_empty() => fallback.to_string(),
            _ => context.prompt.clone(),
        };

        let wire = VideoGenerationRequest {
            instances: vec![VideoInstance {
                prompt: effective_prompt,
                image: start_frame.map(|frame| VideoImage {
                    bytes_base64_encoded: frame.data,
                    mime_type: frame.mime_type,
                }),
                reference_images: (!context.references.is_empty()).then(|| {
                    context
                        .references
                        .iter()
                        .map(|reference| {
                            VideoReferenceImage::asset(VideoImage {
                                bytes_base64_encoded: reference.data.clone(),
                                mime_type: reference.mime_type.clone(),
                            })
                        })
                        .collect()
                }),
            }],
            parameters: VideoParameters {
                number_of_videos: 1,
                aspect_ratio: video_cfg.aspect_ratio.as_str().to_string(),
                resolution: video_cfg.resolution.as_str().to_string(),
            },
        };

        let provider = self.factory.create().map_err(SmithError::Other)?;
        let handle = with_retry(&self.policy, &self.classifier, "start_video", || {
            provider.start_video(selection.model, &wire)
        })
        .await
        .map_err(SmithError::Other)?;

        let bytes = self.poller.run(provider.as_ref(), handle).await?;
        Ok(MediaArtifact::Video {
            mime_type: "video/mp4".to_string(),
            bytes,
        })
    }

    // ── Analysis / chat ─────────────────────────────────────────────────

    pub async fn analyze_media(
        &self,
        instruction: &str,
        media: InlineMedia,
    ) -> crate::error::Result<String> {
        let request = CapabilityRequest::Analyze {
            instruction: instruction.to_string(),
            media: media.clone(),
        };
        let selection = router::route(&request);
        let wire = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::inline_data(media.mime_type, media.data),
                Part::text(instruction),
            ])],
            system_instruction: None,
            generation_config: None,
        };
        self.text_call(selection.model, &wire, "analyze_media").await
    }

    pub async fn chat_turn(
        &self,
        message: &str,
        history: &[ChatTurn],
        persona: Option<&Persona>,
    ) -> crate::error::Result<String> {
        let request = CapabilityRequest::Chat {
            message: message.to_string(),
            history: history.to_vec(),
            persona: persona.cloned(),
        };
        let selection = router::route(&request);

        let mut contents = Vec::new();
        // Few-shot examples lead the conversation, in persona order.
        if let Some(persona) = persona {
            for example in &persona.examples {
                contents.push(Content::user(vec![Part::text(example.input.clone())]));
                contents.push(Content::model(vec![Part::text(example.output.clone())]));
            }
        }
        for turn in history {
            let parts = vec![Part::text(turn.text.clone())];
            contents.push(match turn.role {
                TurnRole::User => Content::user(parts),
                TurnRole::Model => Content::model(parts),
            });
        }
        contents.push(Content::user(vec![Part::text(message)]));

        let wire = GenerateContentRequest {
            contents,
            system_instruction: persona
                .filter(|p| !p.instructions.trim().is_empty())
                .map(|p| Content::system(p.instructions.clone())),
            generation_config: None,
        };
        self.text_call(selection.model, &wire, "chat_turn").await
    }

    pub async fn optimize_instruction(&self, draft: &str) -> crate::error::Result<String> {
        let request = CapabilityRequest::OptimizeInstruction {
            draft: draft.to_string(),
        };
        let selection = router::route(&request);
        let wire = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(draft)])],
            system_instruction: Some(Content::system(OPTIMIZE_SYSTEM_PROMPT)),
            generation_config: None,
        };
        self.text_call(selection.model, &wire, "optimize_instruction")
            .await
    }

    // ── Persona authoring ───────────────────────────────────────────────

    /// Distill a visual consistency descriptor from reference images.
    pub async fn derive_persona_from_references(
        &self,
        references: &[InlineMedia],
    ) -> crate::error::Result<String> {
        let request = CapabilityRequest::DerivePersonaFromReferences {
            references: references.to_vec(),
        };
        let selection = router::route(&request);
        let mut parts: Vec<Part> = references
            .iter()
            .map(|r| Part::inline_data(r.mime_type.clone(), r.data.clone()))
            .collect();
        parts.push(Part::text(DERIVE_DESCRIPTOR_PROMPT));
        let wire = GenerateContentRequest {
            contents: vec![Content::user(parts)],
            system_instruction: None,
            generation_config: None,
        };
        self.text_call(selection.model, &wire, "derive_persona").await
    }

    /// Author a full persona profile from a short brief. Malformed provider
    /// output degrades to the deterministic fallback profile, never an error.
    pub async fn auto_author_persona(
        &self,
        brief: &str,
    ) -> crate::error::Result<AuthoredPersona> {
        let request = CapabilityRequest::AutoAuthorPersona {
            brief: brief.to_string(),
        };
        let selection = router::route(&request);
        let wire = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(format!(
                "Create a character profile for: {brief}. Provide behavioral \
                 instructions, a visual consistency descriptor, and a few short \
                 example exchanges."
            ))])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(persona_profile_schema()),
                ..GenerationConfig::default()
            }),
        };
        let text = self.text_call(selection.model, &wire, "author_persona").await?;
        Ok(parse_persona_profile(&text, brief))
    }

    /// Turn a story prompt into an ordered scene plan. Malformed provider
    /// output degrades to the fixed fallback scenes.
    pub async fn plan_storyboard(
        &self,
        story_prompt: &str,
        scene_count: usize,
    ) -> crate::error::Result<Vec<String>> {
        let selection = router::route(&CapabilityRequest::OptimizeInstruction {
            draft: story_prompt.to_string(),
        });
        let wire = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(format!(
                "Break this story into {scene_count} ordered scene descriptions, \
                 one visual beat each: {story_prompt}"
            ))])],
            system_instruction: None,
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(storyboard_schema()),
                ..GenerationConfig::default()
            }),
        };
        let text = self.text_call(selection.model, &wire, "plan_storyboard").await?;
        Ok(parse_storyboard(&text))
    }

    // ── Shared plumbing ─────────────────────────────────────────────────

    async fn text_call(
        &self,
        model: &str,
        wire: &GenerateContentRequest,
        label: &str,
    ) -> crate::error::Result<String> {
        let provider = self.factory.create().map_err(SmithError::Other)?;
        let response = with_retry(&self.policy, &self.classifier, label, || {
            provider.generate(model, wire)
        })
        .await
        .map_err(SmithError::Other)?;
        require_text(&response).map_err(SmithError::Other)
    }
}

fn require_text(response: &GenerateContentResponse) -> anyhow::Result<String> {
    let text = response.text();
    if text.is_empty() {
        anyhow::bail!("no response from provider");
    }
    Ok(text)
}
