use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tokio::fs;

/// Keys the course state is stored under.
pub mod keys {
    pub const VIDEOS: &str = "my_videos_text";
    pub const DURATION: &str = "my_segment_duration";
    pub const SOURCES: &str = "my_sources";
    pub const SEGMENTS: &str = "my_segments";
    pub const COMPLETED: &str = "my_segments_completed";
}

pub fn default_state_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("minishiur")
        .join("state.json")
}

/// Flat JSON object on disk, read whole and written whole.
pub struct KeyValueStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl KeyValueStore {
    /// Open the store at `path`; a missing file is an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!("Ignoring unreadable state file {}", path.display());
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", path.display()));
            }
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Value under `key`, or `None` when missing or of the wrong shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        match serde_json::from_value(value.clone()) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Ignoring stored {key}: {e}");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).with_context(|| format!("serializing {key}"))?;
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub async fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let pretty_json = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, pretty_json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
