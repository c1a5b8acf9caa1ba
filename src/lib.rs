#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod facade;
pub mod operations;
pub mod persona;
pub mod provider;
pub mod request;
pub mod retry;
pub mod router;
pub mod structured;

pub use config::Config;
pub use error::{Result, SmithError};
pub use facade::GenerationFacade;
pub use persona::{Persona, PersonaStore};
pub use request::{
    AspectRatio, CapabilityRequest, ImageQuality, InlineMedia, MediaArtifact, Resolution,
};
