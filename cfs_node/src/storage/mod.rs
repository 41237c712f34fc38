// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! A flat disk store for chunks: one file per chunk, named by its handle.
//!
//! The set of present handles is kept in memory and rebuilt from a directory
//! scan at startup. The set is guarded by a readers-writer lock; file writes
//! happen under the exclusive side so the set never claims a chunk the disk
//! does not hold.

use crate::{Error, Result};

use cfs_interface::types::ChunkHandle;

use bytes::Bytes;
use std::{
    collections::BTreeSet,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{
    fs::{read, remove_file, File},
    io::AsyncWriteExt,
    sync::RwLock,
};
use tracing::{debug, info, trace, warn};
use walkdir::WalkDir;

/// Operations on the chunks this node holds.
#[derive(Debug)]
pub struct ChunkStore {
    storage_dir: PathBuf,
    present: RwLock<BTreeSet<ChunkHandle>>,
}

impl ChunkStore {
    /// Opens (or creates) the store at `storage_dir` and scans it for chunks
    /// left behind by an earlier run. Files whose names are not valid
    /// handles are ignored.
    pub fn new<P: AsRef<Path>>(storage_dir: P) -> Result<Self> {
        let storage_dir = storage_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&storage_dir)?;

        let mut present = BTreeSet::new();
        for entry in WalkDir::new(&storage_dir).min_depth(1).max_depth(1) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry in chunk store: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.file_name().to_str().and_then(ChunkHandle::from_hex) {
                Some(handle) => {
                    let _ = present.insert(handle);
                }
                None => warn!(
                    "ignoring foreign file in chunk store: {}",
                    entry.path().display()
                ),
            }
        }

        info!(
            "chunk store at {} holding {} chunks",
            storage_dir.display(),
            present.len()
        );

        Ok(Self {
            storage_dir,
            present: RwLock::new(present),
        })
    }

    fn chunk_path(&self, handle: &ChunkHandle) -> PathBuf {
        self.storage_dir.join(handle.as_str())
    }

    /// Writes the chunk's bytes under its handle, overwriting on conflict,
    /// and records it as present.
    pub async fn write_chunk(&self, handle: ChunkHandle, data: Bytes) -> Result<()> {
        let mut present = self.present.write().await;

        let mut file = File::create(self.chunk_path(&handle)).await?;
        file.write_all(&data).await?;

        trace!("stored chunk {} ({} bytes)", handle, data.len());
        let _existed = present.insert(handle);
        Ok(())
    }

    /// Returns the stored bytes, or [`Error::ChunkNotFound`] when the
    /// present-set excludes the handle.
    pub async fn read_chunk(&self, handle: &ChunkHandle) -> Result<Bytes> {
        if !self.has_chunk(handle).await {
            return Err(Error::ChunkNotFound(handle.clone()));
        }

        debug!("reading chunk {}", handle);
        match read(self.chunk_path(handle)).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(Error::ChunkNotFound(handle.clone()))
            }
            Err(err) => Err(Error::Io(err)),
        }
    }

    /// Consults the in-memory set only.
    pub async fn has_chunk(&self, handle: &ChunkHandle) -> bool {
        self.present.read().await.contains(handle)
    }

    /// Snapshot of the in-memory set.
    pub async fn list_chunks(&self) -> BTreeSet<ChunkHandle> {
        self.present.read().await.clone()
    }

    /// Removes the chunk's file and set entry. Not on the critical path;
    /// kept as the hook garbage collection will need.
    pub async fn delete_chunk(&self, handle: &ChunkHandle) -> Result<()> {
        let mut present = self.present.write().await;
        remove_file(self.chunk_path(handle)).await?;
        let _was_present = present.remove(handle);
        trace!("removed chunk {}", handle);
        Ok(())
    }
}
