//! Credential boundary.
//!
//! The core treats the API key as read-only configuration fetched fresh per
//! call; key lifecycle (where it comes from, how it rotates) lives behind
//! [`CredentialBroker`].

use std::sync::Mutex;

pub trait CredentialBroker: Send + Sync {
    fn has_selected_credential(&self) -> bool;

    /// Current key value. Errors when nothing is selected.
    fn resolve(&self) -> anyhow::Result<String>;

    /// Ask the user to supply a credential. Non-interactive brokers report
    /// how to set one instead.
    fn prompt_for_selection(&self) -> anyhow::Result<()>;
}

/// Reads the key from a configured environment variable on every resolve, so
/// rotating the variable between calls takes effect immediately.
pub struct EnvCredentialBroker {
    var: String,
}

impl EnvCredentialBroker {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialBroker for EnvCredentialBroker {
    fn has_selected_credential(&self) -> bool {
        std::env::var(&self.var).is_ok_and(|v| !v.trim().is_empty())
    }

    fn resolve(&self) -> anyhow::Result<String> {
        let value = std::env::var(&self.var)
            .map_err(|_| anyhow::anyhow!("environment variable {} is not set", self.var))?;
        if value.trim().is_empty() {
            anyhow::bail!("environment variable {} is empty", self.var);
        }
        Ok(value)
    }

    fn prompt_for_selection(&self) -> anyhow::Result<()> {
        anyhow::bail!(
            "no credential selected. Set the {} environment variable \
             (get a key from https://aistudio.google.com/app/apikey) \
             or run `scenesmith onboard`",
            self.var
        )
    }
}

/// Interactive broker: falls back to a terminal password prompt when the
/// environment variable is absent. The entered key lives only in process
/// memory.
pub struct InteractiveCredentialBroker {
    env: EnvCredentialBroker,
    entered: Mutex<Option<String>>,
}

impl InteractiveCredentialBroker {
    pub fn new(var: impl Into<String>) -> Self {
        Self {
            env: EnvCredentialBroker::new(var),
            entered: Mutex::new(None),
        }
    }
}

impl CredentialBroker for InteractiveCredentialBroker {
    fn has_selected_credential(&self) -> bool {
        self.env.has_selected_credential()
            || self
                .entered
                .lock()
                .is_ok_and(|entered| entered.is_some())
    }

    fn resolve(&self) -> anyhow::Result<String> {
        if let Ok(value) = self.env.resolve() {
            return Ok(value);
        }
        if let Ok(entered) = self.entered.lock()
            && let Some(value) = entered.as_ref()
        {
            return Ok(value.clone());
        }
        self.env.prompt_for_selection()?;
        unreachable!("prompt_for_selection always errors on the env broker")
    }

    fn prompt_for_selection(&self) -> anyhow::Result<()> {
        let key: String = dialoguer::Password::new()
            .with_prompt("Provider API key")
            .interact()?;
        if key.trim().is_empty() {
            anyhow::bail!("empty API key entered");
        }
        if let Ok(mut entered) = self.entered.lock() {
            *entered = Some(key);
        }
        Ok(())
    }
}
