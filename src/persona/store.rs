//! Persona persistence boundary.
//!
//! The generation core only ever reads personas; storage semantics live
//! behind this trait so the facade never depends on them.

use super::Persona;
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub trait PersonaStore: Send + Sync {
    fn list_all(&self) -> anyhow::Result<Vec<Persona>>;
    fn save(&self, persona: &Persona) -> anyhow::Result<()>;
    fn delete_by_id(&self, id: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersonaFile {
    #[serde(default)]
    personas: Vec<Persona>,
}

/// TOML-file store under the platform config directory. Saves replace any
/// existing persona with the same id; order is preserved otherwise.
pub struct FilePersonaStore {
    path: PathBuf,
}

impl FilePersonaStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn read_file(&self) -> anyhow::Result<PersonaFile> {
        if !self.path.exists() {
            return Ok(PersonaFile::default());
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("reading {}", self.path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parsing {}", self.path.display()))
    }

    fn write_file(&self, file: &PersonaFile) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = toml::to_string_pretty(file)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("writing {}", self.path.display()))
    }
}

impl PersonaStore for FilePersonaStore {
    fn list_all(&self) -> anyhow::Result<Vec<Persona>> {
        Ok(self.read_file()?.personas)
    }

    fn save(&self, persona: &Persona) -> anyhow::Result<()> {
        let mut file = self.read_file()?;
        match file.personas.iter_mut().find(|p| p.id == persona.id) {
            Some(existing) => *existing = persona.clone(),
            None => file.personas.push(persona.clone()),
        }
        self.write_file(&file)
    }

    fn delete_by_id(&self, id: &str) -> anyhow::Result<()> {
        let mut file = self.read_file()?;
        file.personas.retain(|p| p.id != id);
        self.write_file(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> FilePersonaStore {
        FilePersonaStore::new(dir.path().join("personas.toml"))
    }

    #[test]
    fn list_on_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(store_in(&dir).list_all().unwrap().is_empty());
    }

    #[test]
    fn save_then_list_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut persona = Persona::new("Ann", "stay in character");
        persona.descriptor = Some("Silver hair, red coat".into());
        store.save(&persona).unwrap();

        let listed = store.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Ann");
        assert_eq!(listed[0].descriptor.as_deref(), Some("Silver hair, red coat"));
    }

    #[test]
    fn save_with_same_id_replaces() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let mut persona = Persona::new("Ann", "v1");
        store.save(&persona).unwrap();
        persona.instructions = "v2".into();
        store.save(&persona).unwrap();

        let listed = store.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].instructions, "v2");
    }

    #[test]
    fn delete_removes_by_id() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        let persona = Persona::new("Ann", "x");
        store.save(&persona).unwrap();
        store.delete_by_id(&persona.id).unwrap();
        assert!(store.list_all().unwrap().is_empty());
    }
}
