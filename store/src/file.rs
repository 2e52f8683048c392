//! One-file-per-referendum JSON backend.
//!
//! Layout: `<dir>/ref-<index>.json`. Writes go to a sibling `.tmp` file that
//! is renamed over the target, so a crash mid-write leaves the previous
//! record intact.

use crate::{ReferendumStore, StoreError};
use govproxy_types::ReferendumIndex;
use std::fs;
use std::path::{Path, PathBuf};

const PREFIX: &str = "ref-";
const SUFFIX: &str = ".json";

/// File-backed [`ReferendumStore`].
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), "opened referendum store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, index: ReferendumIndex) -> PathBuf {
        self.dir.join(format!("{PREFIX}{index}{SUFFIX}"))
    }

    fn parse_index(file_name: &str) -> Option<ReferendumIndex> {
        file_name
            .strip_prefix(PREFIX)?
            .strip_suffix(SUFFIX)?
            .parse()
            .ok()
    }
}

impl ReferendumStore for JsonFileStore {
    fn put_referendum(&self, index: ReferendumIndex, data: &[u8]) -> Result<(), StoreError> {
        let target = self.path_for(index);
        let tmp = target.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &target)?;
        Ok(())
    }

    fn get_referendum(&self, index: ReferendumIndex) -> Result<Vec<u8>, StoreError> {
        match fs::read(self.path_for(index)) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("referendum {index}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_referenda(&self) -> Result<Vec<ReferendumIndex>, StoreError> {
        let mut indices = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(index) = entry.file_name().to_str().and_then(Self::parse_index) {
                indices.push(index);
            }
        }
        indices.sort_unstable();
        Ok(indices)
    }
}
