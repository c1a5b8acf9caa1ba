use crate::persona::Persona;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Output quality tier for image capabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ImageQuality {
    #[default]
    Normal,
    High,
}

/// Aspect ratios accepted by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum AspectRatio {
    #[default]
    #[strum(to_string = "1:1", serialize = "square")]
    Square,
    #[strum(to_string = "16:9", serialize = "landscape")]
    Landscape,
    #[strum(to_string = "9:16", serialize = "portrait")]
    Portrait,
    #[strum(to_string = "4:3")]
    FourThree,
    #[strum(to_string = "3:4")]
    ThreeFour,
}

impl AspectRatio {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Square => "1:1",
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
            Self::FourThree => "4:3",
            Self::ThreeFour => "3:4",
        }
    }
}

/// Video output resolutions accepted by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(ascii_case_insensitive)]
pub enum Resolution {
    #[default]
    #[strum(to_string = "720p")]
    P720,
    #[strum(to_string = "1080p")]
    P1080,
}

impl Resolution {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P720 => "720p",
            Self::P1080 => "1080p",
        }
    }
}

/// Inline binary media, carried base64-encoded the way the provider wire
/// format expects it. Callers hand us already-encoded payloads; the facade
/// round-trips bytes through [`InlineMedia::from_bytes`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineMedia {
    pub mime_type: String,
    pub data: String,
}

impl InlineMedia {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// Render as a browser-consumable data URI.
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// One turn of chat history, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: TurnRole,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Model,
}

/// One logical generation request. Built by a facade entry point for a
/// single call and discarded after resolution; the router and composer only
/// ever borrow it.
#[derive(Debug, Clone)]
pub enum CapabilityRequest {
    ImageGenerate {
        prompt: String,
        quality: ImageQuality,
        aspect_ratio: AspectRatio,
        persona: Option<Persona>,
    },
    ImageEdit {
        prompt: String,
        source: InlineMedia,
        quality: ImageQuality,
        aspect_ratio: AspectRatio,
        persona: Option<Persona>,
    },
    VideoGenerate {
        prompt: String,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
        persona: Option<Persona>,
        start_frame: Option<InlineMedia>,
    },
    Analyze {
        instruction: String,
        media: InlineMedia,
    },
    Chat {
        message: String,
        history: Vec<ChatTurn>,
        persona: Option<Persona>,
    },
    OptimizeInstruction {
        draft: String,
    },
    DerivePersonaFromReferences {
        references: Vec<InlineMedia>,
    },
    AutoAuthorPersona {
        brief: String,
    },
}

/// Terminal artifact handed back to facade callers.
#[derive(Debug, Clone)]
pub enum MediaArtifact {
    Image { mime_type: String, data_uri: String },
    Video { mime_type: String, bytes: Vec<u8> },
}
