// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The client side of the chunked file store: asks the coordinator where
//! chunks live, then moves the bytes directly to and from the data nodes.
//!
//! A client is stateless across operations and opens one connection per
//! request. Files are streamed one chunk at a time in both directions; no
//! operation buffers a whole file.

mod errors;

pub use errors::{Error, Result};

use cfs_interface::{
    messaging::{self, Request, Response},
    types::{ChunkPlacement, FileInfo, CHUNK_SIZE, TRANSFER_DEADLINE},
};

use bytes::Bytes;
use std::path::Path;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncWriteExt},
};
use tracing::{debug, info, warn};

/// A handle on the store, addressed by its coordinator.
#[derive(Clone, Debug)]
pub struct Client {
    coordinator_addr: String,
}

impl Client {
    pub fn new(coordinator_addr: impl Into<String>) -> Self {
        Self {
            coordinator_addr: coordinator_addr.into(),
        }
    }

    /// Uploads the file at `local_path` under `remote_name`.
    ///
    /// Individual replica failures are warned about and skipped, but a chunk
    /// that ends up on no replica at all fails the upload: bytes nobody
    /// holds are bytes nobody can ever download.
    pub async fn upload(&self, local_path: &Path, remote_name: &str) -> Result<()> {
        let mut file = File::open(local_path).await?;
        let filesize = file.metadata().await?.len();

        let response = messaging::call(
            &self.coordinator_addr,
            &Request::UploadFile {
                filename: remote_name.to_owned(),
                filesize,
            },
            TRANSFER_DEADLINE,
        )
        .await?;
        let placements = match response {
            Response::UploadFile { chunk_locations } => chunk_locations,
            _ => return Err(Error::UnexpectedResponse),
        };

        info!(
            "uploading '{}' as '{}': {} bytes in {} chunks",
            local_path.display(),
            remote_name,
            filesize,
            placements.len()
        );

        // placements arrive in ascending index order, so the file can be
        // read through sequentially, one chunk in memory at a time
        for placement in placements {
            let chunk_len = chunk_len_at(filesize, placement.chunk_index);
            let mut chunk_bytes = vec![0u8; chunk_len as usize];
            file.read_exact(&mut chunk_bytes).await?;
            self.write_replicas(&placement, Bytes::from(chunk_bytes))
                .await?;
        }

        Ok(())
    }

    /// Writes one chunk to every selected replica, in the coordinator's
    /// order. Warn-and-continue per replica; error only when none took it.
    async fn write_replicas(&self, placement: &ChunkPlacement, chunk_bytes: Bytes) -> Result<()> {
        let mut stored = 0usize;
        for address in &placement.chunk_server_addresses {
            let request = Request::WriteChunk {
                chunk_handle: placement.chunk_handle.clone(),
                data: chunk_bytes.clone(),
                chunk_index: placement.chunk_index,
            };
            match messaging::call(address, &request, TRANSFER_DEADLINE).await {
                Ok(Response::WriteChunk { success: true }) => {
                    debug!(
                        "chunk {} stored on {}",
                        placement.chunk_handle, address
                    );
                    stored += 1;
                }
                Ok(other) => warn!(
                    "replica {} answered write of chunk {} with {:?}",
                    address, placement.chunk_index, other
                ),
                Err(err) => warn!(
                    "write of chunk {} to {} failed: {}",
                    placement.chunk_index, address, err
                ),
            }
        }

        if stored == 0 {
            return Err(Error::NoReplicaStored {
                chunk_index: placement.chunk_index,
            });
        }
        if stored < placement.chunk_server_addresses.len() {
            warn!(
                "chunk {} stored on {} of {} replicas",
                placement.chunk_index,
                stored,
                placement.chunk_server_addresses.len()
            );
        }
        Ok(())
    }

    /// Downloads `remote_name` into `local_path`, pulling every chunk from
    /// the first replica that answers.
    pub async fn download(&self, remote_name: &str, local_path: &Path) -> Result<()> {
        let response = messaging::call(
            &self.coordinator_addr,
            &Request::DownloadFile {
                filename: remote_name.to_owned(),
            },
            TRANSFER_DEADLINE,
        )
        .await?;
        let (filesize, placements) = match response {
            Response::DownloadFile {
                filesize,
                chunk_locations,
            } => (filesize, chunk_locations),
            _ => return Err(Error::UnexpectedResponse),
        };

        info!(
            "downloading '{}' to '{}': {} bytes in {} chunks",
            remote_name,
            local_path.display(),
            filesize,
            placements.len()
        );

        let mut output = File::create(local_path).await?;
        let mut written = 0u64;
        for placement in &placements {
            let data = self.read_first_replica(placement).await?;
            output.write_all(&data).await?;
            written += data.len() as u64;
        }
        output.flush().await?;

        if written != filesize {
            warn!(
                "reassembled {} bytes for '{}' but the coordinator recorded {}",
                written, remote_name, filesize
            );
        }
        Ok(())
    }

    /// Tries the chunk's replicas in the coordinator's order and returns the
    /// first answer. Exhausting them all is fatal for the download.
    async fn read_first_replica(&self, placement: &ChunkPlacement) -> Result<Bytes> {
        for address in &placement.chunk_server_addresses {
            let request = Request::ReadChunk {
                chunk_handle: placement.chunk_handle.clone(),
            };
            match messaging::call(address, &request, TRANSFER_DEADLINE).await {
                Ok(Response::ReadChunk { data }) => return Ok(data),
                Ok(other) => warn!(
                    "replica {} answered read of chunk {} with {:?}",
                    address, placement.chunk_index, other
                ),
                Err(err) => warn!(
                    "read of chunk {} from {} failed: {}",
                    placement.chunk_index, address, err
                ),
            }
        }
        Err(Error::ChunkUnreachable {
            chunk_index: placement.chunk_index,
        })
    }

    /// Every file the coordinator knows about.
    pub async fn list(&self) -> Result<Vec<FileInfo>> {
        let response =
            messaging::call(&self.coordinator_addr, &Request::ListFiles, TRANSFER_DEADLINE)
                .await?;
        match response {
            Response::ListFiles { files } => Ok(files),
            _ => Err(Error::UnexpectedResponse),
        }
    }
}

/// Length of chunk `chunk_index` in a file of `filesize` bytes: a full
/// [`CHUNK_SIZE`] for every chunk but the last.
fn chunk_len_at(filesize: u64, chunk_index: u32) -> u64 {
    let start = u64::from(chunk_index) * CHUNK_SIZE;
    CHUNK_SIZE.min(filesize.saturating_sub(start))
}
