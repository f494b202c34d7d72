//! Directory-backed instance store: one pretty JSON file per instance.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use certlab_kernel::{Instance, InstanceId};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::{InstanceStore, PutOutcome, StoreError};

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Open an existing store directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let meta = fs::metadata(&root).map_err(|e| StoreError::io(&root, e))?;
        if !meta.is_dir() {
            return Err(StoreError::io(
                &root,
                std::io::Error::new(ErrorKind::InvalidInput, "store root is not a directory"),
            ));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File that holds (or would hold) the record for `id`.
    pub fn path_for(&self, id: &InstanceId) -> PathBuf {
        self.root.join(format!("{id}.{RECORD_EXTENSION}"))
    }

    fn write_new(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| StoreError::io(tmp.path(), e))?;
        // The temporary file is removed on every error path when `tmp` drops.
        tmp.persist_noclobber(path)
            .map_err(|e| StoreError::io(path, e.error))?;
        Ok(())
    }
}

impl InstanceStore for DirStore {
    fn put(&mut self, instance: &Instance) -> Result<PutOutcome, StoreError> {
        let encoded = instance.to_json_pretty().map_err(|source| StoreError::Encode {
            id: instance.id.to_string(),
            source,
        })?;
        let path = self.path_for(&instance.id);
        match fs::read(&path) {
            Ok(existing) if existing == encoded.as_bytes() => {
                debug!(id = %instance.id, "identical instance already stored");
                return Ok(PutOutcome::Unchanged);
            }
            Ok(_) => {
                warn!(id = %instance.id, path = %path.display(), "refusing to overwrite instance");
                return Err(StoreError::Conflict {
                    id: instance.id.to_string(),
                });
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io(&path, e)),
        }
        self.write_new(&path, encoded.as_bytes())?;
        debug!(id = %instance.id, path = %path.display(), "instance written");
        Ok(PutOutcome::Written)
    }

    fn get(&self, id: &InstanceId) -> Result<Instance, StoreError> {
        let path = self.path_for(id);
        let instance = match load_instance_file(&path) {
            Err(StoreError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound { id: id.to_string() })
            }
            other => other?,
        };
        if &instance.id != id {
            return Err(StoreError::Decode {
                location: path.display().to_string(),
                source: certlab_kernel::KernelError::CorruptInstance {
                    id: instance.id.to_string(),
                    reason: format!("record is stored under id '{id}'"),
                },
            });
        }
        Ok(instance)
    }

    fn contains(&self, id: &InstanceId) -> Result<bool, StoreError> {
        match fs::metadata(self.path_for(id)) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(self.path_for(id), e)),
        }
    }

    fn ids(&self) -> Result<Vec<InstanceId>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.root, e))?;
        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StoreError::io(&self.root, e))?;
            let path = entry.path();
            if !entry.file_type().map_err(|e| StoreError::io(&path, e))?.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            // Leftover temporary files and foreign names are not records.
            let Some(id) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| InstanceId::parse(stem).ok())
            else {
                continue;
            };
            ids.push(id);
        }
        ids.sort();
        Ok(ids)
    }
}

/// Read and integrity-check a single instance file anywhere on disk.
pub fn load_instance_file(path: &Path) -> Result<Instance, StoreError> {
    let text = fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
    Instance::from_json(&text).map_err(|source| StoreError::Decode {
        location: path.display().to_string(),
        source,
    })
}
