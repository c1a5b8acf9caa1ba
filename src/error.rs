use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Scenesmith.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum SmithError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Provider boundary ───────────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Media artifacts ─────────────────────────────────────────────────
    #[error("media: {0}")]
    Media(#[from] MediaError),

    // ── Persona store ───────────────────────────────────────────────────
    #[error("persona: {0}")]
    Persona(#[from] PersonaError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Provider errors ────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("request to {model} failed: {message}")]
    Request { model: String, message: String },

    #[error("credential missing: {0}")]
    CredentialMissing(String),

    #[error("operation {operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("operation {operation} exceeded poll ceiling of {ceiling_secs}s")]
    PollCeiling {
        operation: String,
        ceiling_secs: u64,
    },
}

// ─── Media errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("no image was generated")]
    NoImage,

    #[error("operation completed without a video uri")]
    NoVideoUri,

    #[error("artifact download failed: {0}")]
    Download(String),
}

// ─── Persona store errors ───────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersonaError {
    #[error("persona not found: {0}")]
    NotFound(String),

    #[error("store: {0}")]
    Store(String),
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, SmithError>;
