// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The authoritative metadata records and the store that guards them.
//!
//! One readers-writer lock covers all three maps, so every operation here is
//! atomic with respect to every other and no operation ever takes two locks.
//! The lock is never held across I/O; collection reads hand out snapshot
//! clones, never references into the guarded structure.

use cfs_interface::types::{ChunkHandle, LIVENESS_WINDOW};

use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    time::SystemTime,
};
use tokio::{sync::RwLock, time::Instant};

/// Chunk records start at this version. Reserved for future versioning, not
/// mutated anywhere yet.
const INITIAL_CHUNK_VERSION: u32 = 1;

/// A client file: its size and the ordered chunks it splits into.
#[derive(Clone, Debug)]
pub struct FileRecord {
    pub name: String,
    pub size: u64,
    pub chunk_count: u32,
    pub chunks: Vec<ChunkHandle>,
    pub created_at: SystemTime,
}

/// One chunk of a file and the data nodes known to hold it. Locations grow
/// as nodes report successful stores; nothing removes them.
#[derive(Clone, Debug)]
pub struct ChunkRecord {
    pub handle: ChunkHandle,
    pub file_name: String,
    pub chunk_index: u32,
    pub version: u32,
    pub locations: BTreeSet<String>,
}

/// What a data node last told us about itself. Never removed; stale entries
/// are filtered out at query time by the liveness predicate.
#[derive(Clone, Debug)]
pub struct NodeRegistration {
    pub address: String,
    pub last_heartbeat: Instant,
    pub inventory: BTreeSet<ChunkHandle>,
}

impl NodeRegistration {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.last_heartbeat) < LIVENESS_WINDOW
    }
}

#[derive(Debug, Default)]
struct Registry {
    files: BTreeMap<String, FileRecord>,
    chunks: BTreeMap<ChunkHandle, ChunkRecord>,
    nodes: BTreeMap<String, NodeRegistration>,
}

/// The coordinator's in-memory metadata store. Cheap to clone; clones share
/// the same records.
#[derive(Clone, Debug, Default)]
pub struct MetadataStore {
    registry: Arc<RwLock<Registry>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a file record with an empty chunk list, overwriting any prior
    /// entry of the same name. Last writer wins.
    pub async fn add_file(&self, name: &str, size: u64, chunk_count: u32) {
        let record = FileRecord {
            name: name.to_owned(),
            size,
            chunk_count,
            chunks: Vec::with_capacity(chunk_count as usize),
            created_at: SystemTime::now(),
        };
        let _prior = self.registry.write().await.files.insert(name.to_owned(), record);
    }

    /// Appends a handle to the named file's chunk list. No-op when the file
    /// is absent.
    pub async fn append_chunk_to_file(&self, name: &str, handle: ChunkHandle) {
        if let Some(file) = self.registry.write().await.files.get_mut(name) {
            file.chunks.push(handle);
        }
    }

    /// Inserts a chunk record with no locations yet.
    pub async fn add_chunk(&self, handle: ChunkHandle, file_name: &str, chunk_index: u32) {
        let record = ChunkRecord {
            handle: handle.clone(),
            file_name: file_name.to_owned(),
            chunk_index,
            version: INITIAL_CHUNK_VERSION,
            locations: BTreeSet::new(),
        };
        let _prior = self.registry.write().await.chunks.insert(handle, record);
    }

    /// Records that `address` holds the chunk. Idempotent. Returns whether
    /// the chunk was known at all; an unknown chunk leaves the store
    /// untouched.
    pub async fn add_chunk_location(&self, handle: &ChunkHandle, address: &str) -> bool {
        match self.registry.write().await.chunks.get_mut(handle) {
            Some(chunk) => {
                let _was_new = chunk.locations.insert(address.to_owned());
                true
            }
            None => false,
        }
    }

    pub async fn get_file(&self, name: &str) -> Option<FileRecord> {
        self.registry.read().await.files.get(name).cloned()
    }

    pub async fn get_chunk(&self, handle: &ChunkHandle) -> Option<ChunkRecord> {
        self.registry.read().await.chunks.get(handle).cloned()
    }

    /// Snapshot of every file record.
    pub async fn list_files(&self) -> Vec<FileRecord> {
        self.registry.read().await.files.values().cloned().collect()
    }

    /// Upserts the node's registration: stamps the heartbeat time and
    /// replaces the inventory wholesale.
    pub async fn register_node(&self, address: &str, inventory: BTreeSet<ChunkHandle>) {
        let registration = NodeRegistration {
            address: address.to_owned(),
            last_heartbeat: Instant::now(),
            inventory,
        };
        let _prior = self
            .registry
            .write()
            .await
            .nodes
            .insert(address.to_owned(), registration);
    }

    /// Up to `k` live node addresses, in address order. Returns what it has
    /// when fewer than `k` nodes are live; the caller decides whether that
    /// is worth a warning.
    pub async fn available_nodes(&self, k: usize) -> Vec<String> {
        let now = Instant::now();
        self.registry
            .read()
            .await
            .nodes
            .values()
            .filter(|node| node.is_live(now))
            .take(k)
            .map(|node| node.address.clone())
            .collect()
    }
}
