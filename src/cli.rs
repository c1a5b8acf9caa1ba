use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scenesmith - persona-consistent AI media generation.
#[derive(Parser, Debug)]
#[command(name = "scenesmith")]
#[command(author = "theonlyhennygod")]
#[command(version = "0.1.0")]
#[command(about = "Generate images, video, and character profiles.", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check for a provider credential, prompting if none is set
    Onboard,

    /// Generate an image from a prompt
    Image {
        prompt: String,

        /// Quality tier: normal or high
        #[arg(short, long, default_value = "normal")]
        quality: String,

        /// Aspect ratio: square, landscape, portrait, 4:3, 3:4
        #[arg(short, long, default_value = "square")]
        aspect: String,

        /// Persona name or id to keep the subject consistent
        #[arg(short, long)]
        persona: Option<String>,

        /// Output file
        #[arg(short, long, default_value = "image.png")]
        out: PathBuf,
    },

    /// Edit an existing image with a prompt
    Edit {
        /// Source image file
        input: PathBuf,

        prompt: String,

        #[arg(short, long, default_value = "normal")]
        quality: String,

        #[arg(short, long, default_value = "square")]
        aspect: String,

        #[arg(short, long)]
        persona: Option<String>,

        #[arg(short, long, default_value = "edited.png")]
        out: PathBuf,
    },

    /// Generate a video (long-running; polls until complete)
    Video {
        /// Prompt text (may be empty when animating a start frame)
        #[arg(default_value = "")]
        prompt: String,

        #[arg(short, long, default_value = "landscape")]
        aspect: String,

        /// Resolution: 720p or 1080p
        #[arg(short, long, default_value = "720p")]
        resolution: String,

        #[arg(short, long)]
        persona: Option<String>,

        /// Image to animate as the first frame (persona is ignored if set)
        #[arg(long)]
        start_frame: Option<PathBuf>,

        #[arg(short, long, default_value = "video.mp4")]
        out: PathBuf,
    },

    /// Describe or answer questions about a media file
    Analyze {
        /// Media file (image or video)
        input: PathBuf,

        /// What to analyze
        #[arg(default_value = "Describe this media in detail.")]
        instruction: String,
    },

    /// One chat turn with an optional persona
    Chat {
        message: String,

        #[arg(short, long)]
        persona: Option<String>,
    },

    /// Rewrite a draft prompt for better generation results
    Optimize { draft: String },

    /// Plan a story as an ordered list of scene descriptions
    Storyboard {
        prompt: String,

        #[arg(short, long, default_value = "4")]
        scenes: usize,
    },

    /// Manage personas
    Persona {
        #[command(subcommand)]
        command: PersonaCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum PersonaCommands {
    /// List saved personas
    List,

    /// Author a persona from a short brief
    Author {
        /// e.g. "a weathered sea captain named Morrow"
        brief: String,
    },

    /// Derive a visual descriptor from reference images and save it
    Derive {
        /// Persona name or id to update
        name: String,

        /// Reference image files
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },

    /// Delete a persona by id
    Delete { id: String },
}
