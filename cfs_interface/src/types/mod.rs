// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The types shared by all three roles.

mod chunk;

pub use chunk::{chunk_count_for_size, ChunkHandle};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The unit of placement and replication: files are split into slices of at
/// most this many bytes.
pub const CHUNK_SIZE: u64 = 64 * 1024 * 1024;

/// Target number of data nodes asked to hold any given chunk. This is an
/// allocation target, not a guarantee; placement reflects reality thereafter.
pub const REPLICATION_FACTOR: usize = 3;

/// How often a data node reports liveness and inventory to the coordinator.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// A node with no heartbeat within this window is treated as unavailable.
pub const LIVENESS_WINDOW: Duration = Duration::from_secs(30);

/// Deadline for bulk data transfers (client to coordinator or data node).
pub const TRANSFER_DEADLINE: Duration = Duration::from_secs(30);

/// Deadline for heartbeats and chunk reports.
pub const CONTROL_DEADLINE: Duration = Duration::from_secs(5);

/// Where clients and data nodes look for the coordinator by default.
pub const DEFAULT_COORDINATOR_ADDR: &str = "localhost:8000";

/// Tells a client where to write or read one chunk of a file.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChunkPlacement {
    /// The handle the chunk is stored and addressed under.
    pub chunk_handle: ChunkHandle,
    /// Addresses of the data nodes holding (or selected to hold) the chunk,
    /// in the order a client should attempt them.
    pub chunk_server_addresses: Vec<String>,
    /// 0-based position of the chunk within its file.
    pub chunk_index: u32,
}

/// A file as listed by the coordinator.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub filename: String,
    pub filesize: u64,
    pub num_chunks: u32,
}
