use crate::model::{AppState, SCHEMA_VERSION};
use anyhow::{bail, Context};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Charge l'état depuis un support.
    fn load(&self) -> anyhow::Result<AppState>;
    /// Sauvegarde de manière atomique.
    fn save(&self, state: &AppState) -> anyhow::Result<()>;
}

pub struct JsonStorage {
    path: PathBuf,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
        })
    }
}

impl Storage for JsonStorage {
    /// Un fichier absent donne un état vierge ; un fichier illisible est une erreur.
    fn load(&self) -> anyhow::Result<AppState> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(AppState::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };
        let state: AppState = serde_json::from_slice(&data)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        if state.schema_version > SCHEMA_VERSION {
            bail!(
                "unsupported schema_version {} (max {SCHEMA_VERSION})",
                state.schema_version
            );
        }
        Ok(state)
    }

    fn save(&self, state: &AppState) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(state)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        #[cfg(feature = "logging")]
        tracing::debug!(path = %self.path.display(), "state saved");
        Ok(())
    }
}
