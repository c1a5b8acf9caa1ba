use anyhow::{Context as _, Result};
use base64::Engine as _;
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use scenesmith::cli::{Cli, Commands, PersonaCommands};
use scenesmith::config::{self, Config};
use scenesmith::credentials::{CredentialBroker, InteractiveCredentialBroker};
use scenesmith::facade::GenerationFacade;
use scenesmith::persona::{FilePersonaStore, MAX_REFERENCE_IMAGES, Persona, PersonaStore};
use scenesmith::provider::GeminiFactory;
use scenesmith::request::{AspectRatio, ImageQuality, InlineMedia, MediaArtifact, Resolution};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default tracing subscriber")?;

    let cli = Cli::parse();
    let config = Config::load()?;
    dispatch(cli, config).await
}

async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let broker: Arc<dyn CredentialBroker> = Arc::new(InteractiveCredentialBroker::new(
        config.provider.api_key_env.clone(),
    ));
    let factory = Arc::new(GeminiFactory::new(config.provider.clone(), broker.clone()));
    let facade = GenerationFacade::new(factory, &config);

    match cli.command {
        Commands::Onboard => {
            if broker.has_selected_credential() {
                println!("Credential found in ${}.", config.provider.api_key_env);
            } else {
                broker.prompt_for_selection()?;
                println!("Credential stored for this session.");
            }
        }

        Commands::Image {
            prompt,
            quality,
            aspect,
            persona,
            out,
        } => {
            let persona = resolve_persona(persona.as_deref())?;
            let artifact = facade
                .generate_image(
                    &prompt,
                    parse_quality(&quality)?,
                    parse_aspect(&aspect)?,
                    persona.as_ref(),
                )
                .await?;
            write_artifact(&artifact, &out)?;
            println!("Wrote {}", out.display());
        }

        Commands::Edit {
            input,
            prompt,
            quality,
            aspect,
            persona,
            out,
        } => {
            let persona = resolve_persona(persona.as_deref())?;
            let source = load_inline(&input)?;
            let artifact = facade
                .edit_image(
                    &prompt,
                    source,
                    parse_quality(&quality)?,
                    parse_aspect(&aspect)?,
                    persona.as_ref(),
                )
                .await?;
            write_artifact(&artifact, &out)?;
            println!("Wrote {}", out.display());
        }

        Commands::Video {
            prompt,
            aspect,
            resolution,
            persona,
            start_frame,
            out,
        } => {
            let persona = resolve_persona(persona.as_deref())?;
            let start_frame = start_frame.as_deref().map(load_inline).transpose()?;
            let artifact = facade
                .generate_video(
                    &prompt,
                    parse_aspect(&aspect)?,
                    parse_resolution(&resolution)?,
                    persona.as_ref(),
                    start_frame,
                )
                .await?;
            write_artifact(&artifact, &out)?;
            println!("Wrote {}", out.display());
        }

        Commands::Analyze { input, instruction } => {
            let media = load_inline(&input)?;
            let analysis = facade.analyze_media(&instruction, media).await?;
            println!("{analysis}");
        }

        Commands::Chat { message, persona } => {
            let persona = resolve_persona(persona.as_deref())?;
            let reply = facade.chat_turn(&message, &[], persona.as_ref()).await?;
            println!("{reply}");
        }

        Commands::Optimize { draft } => {
            let improved = facade.optimize_instruction(&draft).await?;
            println!("{improved}");
        }

        Commands::Storyboard { prompt, scenes } => {
            for (i, scene) in facade.plan_storyboard(&prompt, scenes).await?.iter().enumerate() {
                println!("{}. {scene}", i + 1);
            }
        }

        Commands::Persona { command } => handle_persona(command, &facade).await?,
    }

    Ok(())
}

async fn handle_persona(command: PersonaCommands, facade: &GenerationFacade) -> Result<()> {
    let store = persona_store()?;
    match command {
        PersonaCommands::List => {
            for persona in store.list_all()? {
                let descriptor = persona.descriptor.as_deref().unwrap_or("-");
                println!("{}  {}  {}", persona.id, persona.name, descriptor);
            }
        }

        PersonaCommands::Author { brief } => {
            let profile = facade.auto_author_persona(&brief).await?;
            let mut persona = Persona::new(&brief, profile.instructions);
            if !profile.descriptor.is_empty() {
                persona.descriptor = Some(profile.descriptor);
            }
            persona.examples = profile.examples;
            store.save(&persona)?;
            println!("Saved persona {} ({})", persona.name, persona.id);
        }

        PersonaCommands::Derive { name, images } => {
            let mut persona = find_persona(&store, &name)?;
            let references: Vec<InlineMedia> = images
                .iter()
                .map(|p| load_inline(p))
                .collect::<Result<_>>()?;
            let descriptor = facade.derive_persona_from_references(&references).await?;
            persona.descriptor = Some(descriptor);
            persona.reference_images = references
                .into_iter()
                .take(MAX_REFERENCE_IMAGES)
                .collect();
            persona.updated_at = chrono::Utc::now();
            store.save(&persona)?;
            println!("Updated persona {}", persona.name);
        }

        PersonaCommands::Delete { id } => {
            store.delete_by_id(&id)?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn persona_store() -> Result<FilePersonaStore> {
    let path = config::personas_path()
        .context("could not resolve a config directory for the persona store")?;
    Ok(FilePersonaStore::new(path))
}

fn resolve_persona(name: Option<&str>) -> Result<Option<Persona>> {
    let Some(name) = name else {
        return Ok(None);
    };
    Ok(Some(find_persona(&persona_store()?, name)?))
}

fn find_persona(store: &FilePersonaStore, name: &str) -> Result<Persona> {
    store
        .list_all()?
        .into_iter()
        .find(|p| p.id == name || p.name.eq_ignore_ascii_case(name))
        .with_context(|| format!("no persona named '{name}'"))
}

fn parse_quality(raw: &str) -> Result<ImageQuality> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("unknown quality '{raw}' (expected normal or high)"))
}

fn parse_aspect(raw: &str) -> Result<AspectRatio> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("unknown aspect ratio '{raw}'"))
}

fn parse_resolution(raw: &str) -> Result<Resolution> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("unknown resolution '{raw}' (expected 720p or 1080p)"))
}

fn load_inline(path: &Path) -> Result<InlineMedia> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(InlineMedia::from_bytes(mime_from_path(path), &bytes))
}

fn mime_from_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        _ => "application/octet-stream",
    }
}

fn write_artifact(artifact: &MediaArtifact, out: &Path) -> Result<()> {
    match artifact {
        MediaArtifact::Image { data_uri, .. } => {
            let encoded = data_uri
                .split_once(',')
                .map(|(_, data)| data)
                .context("malformed data uri")?;
            let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;
            std::fs::write(out, bytes)?;
        }
        MediaArtifact::Video { bytes, .. } => {
            std::fs::write(out, bytes)?;
        }
    }
    Ok(())
}
