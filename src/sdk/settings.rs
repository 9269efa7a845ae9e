//! Persisted user preferences.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::Mutex;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    #[serde(rename = "backendURL")]
    pub backend_url: String,
    pub enable_mic: bool,
    pub selected_mic: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            enable_mic: true,
            selected_mic: None,
        }
    }
}

#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load(&self) -> Result<Settings>;
    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// Read-modify-write a settings store.
///
/// # Errors
/// Returns an error if loading or saving fails.
pub async fn update_settings<F>(store: &dyn SettingsStore, apply: F) -> Result<Settings>
where
    F: FnOnce(&mut Settings) + Send,
{
    let mut settings = store.load().await?;
    apply(&mut settings);
    store.save(&settings).await?;
    Ok(settings)
}

#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    inner: Mutex<Settings>,
}

impl MemorySettingsStore {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Mutex::new(settings),
        }
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> Result<Settings> {
        Ok(self.inner.lock().await.clone())
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        *self.inner.lock().await = settings.clone();
        Ok(())
    }
}

/// JSON file store. A missing file reads as defaults.
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub const fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn load(&self) -> Result<Settings> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec_pretty(settings)?;
        tokio::fs::write(&self.path, json).await?;
        tracing::debug!("saved settings to {}", self.path.display());
        Ok(())
    }
}
