// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The coordinator's request/response surface: five operations, each
//! dispatched on its own task by the accept loop.

use crate::metadata::MetadataStore;
use crate::Result;

use cfs_interface::{
    messaging::{self, Error, Request, Response},
    types::{chunk_count_for_size, ChunkHandle, ChunkPlacement, FileInfo, REPLICATION_FACTOR},
};

use std::collections::BTreeSet;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, trace, warn};

/// The coordinator service. Cheap to clone; clones share the metadata store.
#[derive(Clone, Debug, Default)]
pub struct Coordinator {
    metadata: MetadataStore,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying metadata store, shared with this coordinator.
    pub fn metadata(&self) -> MetadataStore {
        self.metadata.clone()
    }

    /// Accepts connections forever, one spawned task per connection.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let coordinator = self.clone();
            let _handle = tokio::spawn(async move {
                if let Err(err) = coordinator.serve_connection(stream).await {
                    debug!("connection from {} dropped: {}", peer_addr, err);
                }
            });
        }
    }

    /// One request, one response, then the connection is done.
    async fn serve_connection(&self, mut stream: TcpStream) -> cfs_interface::Result<()> {
        let request = messaging::recv_msg(&mut stream).await?;
        let response = self.handle_request(request).await;
        messaging::send_msg(&mut stream, &response).await
    }

    /// Dispatches one request. Never fails; anything that goes wrong becomes
    /// the error arm of the response.
    pub async fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::UploadFile { filename, filesize } => {
                match self.upload_file(filename, filesize).await {
                    Ok(chunk_locations) => Response::UploadFile { chunk_locations },
                    Err(err) => Response::Error(err),
                }
            }
            Request::DownloadFile { filename } => match self.download_file(&filename).await {
                Ok((filesize, chunk_locations)) => Response::DownloadFile {
                    filesize,
                    chunk_locations,
                },
                Err(err) => Response::Error(err),
            },
            Request::ListFiles => Response::ListFiles {
                files: self.list_files().await,
            },
            Request::Heartbeat {
                chunk_server_address,
                chunk_handles,
            } => {
                self.heartbeat(&chunk_server_address, chunk_handles).await;
                Response::Heartbeat { success: true }
            }
            Request::ReportChunk {
                chunk_handle,
                chunk_server_address,
            } => {
                self.report_chunk(&chunk_handle, &chunk_server_address).await;
                Response::ReportChunk { success: true }
            }
            Request::WriteChunk { .. } | Request::ReadChunk { .. } => Response::Error(
                Error::InvalidArgument("chunk i/o belongs on a data node".to_owned()),
            ),
        }
    }

    /// Creates the file and chunk records and selects targets for every
    /// chunk. Running out of live nodes is not an error here: the short
    /// placement is recorded and surfaced as an operational warning.
    async fn upload_file(
        &self,
        filename: String,
        filesize: u64,
    ) -> cfs_interface::Result<Vec<ChunkPlacement>> {
        if filename.is_empty() {
            return Err(Error::InvalidArgument("empty file name".to_owned()));
        }

        let chunk_count = chunk_count_for_size(filesize);
        info!(
            "allocating '{}': {} bytes in {} chunks",
            filename, filesize, chunk_count
        );
        self.metadata.add_file(&filename, filesize, chunk_count).await;

        let mut placements = Vec::with_capacity(chunk_count as usize);
        for chunk_index in 0..chunk_count {
            let handle = ChunkHandle::derive(&filename, chunk_index);
            self.metadata
                .add_chunk(handle.clone(), &filename, chunk_index)
                .await;
            self.metadata
                .append_chunk_to_file(&filename, handle.clone())
                .await;

            let addresses = self.metadata.available_nodes(REPLICATION_FACTOR).await;
            if addresses.len() < REPLICATION_FACTOR {
                warn!(
                    "chunk {} of '{}' allocated on {} of {} targets",
                    chunk_index,
                    filename,
                    addresses.len(),
                    REPLICATION_FACTOR
                );
            }

            placements.push(ChunkPlacement {
                chunk_handle: handle,
                chunk_server_addresses: addresses,
                chunk_index,
            });
        }

        Ok(placements)
    }

    /// Looks a file up and returns the currently known locations per chunk.
    /// Locations may still be empty right after an upload; chunk reports are
    /// asynchronous.
    async fn download_file(
        &self,
        filename: &str,
    ) -> cfs_interface::Result<(u64, Vec<ChunkPlacement>)> {
        let file = self
            .metadata
            .get_file(filename)
            .await
            .ok_or_else(|| Error::NotFound(format!("file '{filename}'")))?;

        let mut chunk_locations = Vec::with_capacity(file.chunks.len());
        for handle in &file.chunks {
            let chunk = self.metadata.get_chunk(handle).await.ok_or_else(|| {
                error!(
                    "file '{}' references chunk {} but no such record exists",
                    filename, handle
                );
                Error::Internal(format!("chunk record {handle} missing"))
            })?;
            chunk_locations.push(ChunkPlacement {
                chunk_handle: chunk.handle,
                chunk_server_addresses: chunk.locations.into_iter().collect(),
                chunk_index: chunk.chunk_index,
            });
        }

        Ok((file.size, chunk_locations))
    }

    async fn list_files(&self) -> Vec<FileInfo> {
        self.metadata
            .list_files()
            .await
            .into_iter()
            .map(|file| FileInfo {
                filename: file.name,
                filesize: file.size,
                num_chunks: file.chunk_count,
            })
            .collect()
    }

    async fn heartbeat(&self, address: &str, chunk_handles: Vec<ChunkHandle>) {
        trace!(
            "heartbeat from {} with {} chunks",
            address,
            chunk_handles.len()
        );
        let inventory: BTreeSet<ChunkHandle> = chunk_handles.into_iter().collect();
        self.metadata.register_node(address, inventory).await;
    }

    async fn report_chunk(&self, handle: &ChunkHandle, address: &str) {
        if self.metadata.add_chunk_location(handle, address).await {
            debug!("{} now holds chunk {}", address, handle);
        } else {
            warn!(
                "{} reported chunk {} which was never allocated",
                address, handle
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cfs_interface::types::CHUNK_SIZE;

    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use std::collections::BTreeSet as Set;

    async fn register_nodes(coordinator: &Coordinator, ports: &[u16]) {
        for port in ports {
            coordinator
                .metadata()
                .register_node(&format!("localhost:{port}"), Set::new())
                .await;
        }
    }

    #[tokio::test]
    async fn upload_with_empty_name_is_rejected() {
        let coordinator = Coordinator::new();
        let response = coordinator
            .handle_request(Request::UploadFile {
                filename: String::new(),
                filesize: 10,
            })
            .await;
        assert_matches!(response, Response::Error(Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn zero_byte_files_have_no_chunks() {
        let coordinator = Coordinator::new();
        let response = coordinator
            .handle_request(Request::UploadFile {
                filename: "empty.bin".to_owned(),
                filesize: 0,
            })
            .await;
        assert_matches!(response, Response::UploadFile { chunk_locations } => {
            assert!(chunk_locations.is_empty());
        });

        let files = coordinator.list_files().await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].num_chunks, 0);
    }

    #[tokio::test]
    async fn chunk_boundary_allocates_two_chunks() {
        let coordinator = Coordinator::new();
        register_nodes(&coordinator, &[9001, 9002, 9003]).await;

        let placements = coordinator
            .upload_file("big.bin".to_owned(), CHUNK_SIZE + 1)
            .await
            .expect("allocation");

        assert_eq!(placements.len(), 2);
        assert_eq!(placements[0].chunk_index, 0);
        assert_eq!(placements[1].chunk_index, 1);
        assert_eq!(
            placements[0].chunk_handle.as_str(),
            "724c99ac08a2ee3b4448970587dd9707"
        );
        assert_eq!(
            placements[1].chunk_handle.as_str(),
            "753f8df04d8c23a09277c9ed22d4fb4e"
        );
        for placement in &placements {
            assert_eq!(placement.chunk_server_addresses.len(), 3);
        }
    }

    #[tokio::test]
    async fn allocation_succeeds_under_replicated() {
        let coordinator = Coordinator::new();
        register_nodes(&coordinator, &[9001]).await;

        let placements = coordinator
            .upload_file("small.bin".to_owned(), 10)
            .await
            .expect("allocation");
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].chunk_server_addresses, vec!["localhost:9001"]);
    }

    #[tokio::test]
    async fn allocation_succeeds_with_no_nodes_at_all() {
        let coordinator = Coordinator::new();
        let placements = coordinator
            .upload_file("orphan.bin".to_owned(), 10)
            .await
            .expect("allocation");
        assert_eq!(placements.len(), 1);
        assert!(placements[0].chunk_server_addresses.is_empty());
    }

    #[tokio::test]
    async fn download_of_missing_file_is_not_found() {
        let coordinator = Coordinator::new();
        let response = coordinator
            .handle_request(Request::DownloadFile {
                filename: "nope".to_owned(),
            })
            .await;
        assert_matches!(response, Response::Error(Error::NotFound(_)));

        // the namespace itself is still healthy
        let response = coordinator.handle_request(Request::ListFiles).await;
        assert_matches!(response, Response::ListFiles { files } => assert!(files.is_empty()));
    }

    #[tokio::test]
    async fn reported_locations_show_up_in_downloads() {
        let coordinator = Coordinator::new();
        let _placements = coordinator
            .upload_file("h.txt".to_owned(), 480)
            .await
            .expect("allocation");
        let handle = ChunkHandle::derive("h.txt", 0);

        // reports are idempotent: three reports, one membership
        for _ in 0..3 {
            let response = coordinator
                .handle_request(Request::ReportChunk {
                    chunk_handle: handle.clone(),
                    chunk_server_address: "localhost:9001".to_owned(),
                })
                .await;
            assert_matches!(response, Response::ReportChunk { success: true });
        }

        let (filesize, placements) = coordinator.download_file("h.txt").await.expect("download");
        assert_eq!(filesize, 480);
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].chunk_server_addresses, vec!["localhost:9001"]);
    }

    #[tokio::test]
    async fn heartbeat_makes_a_node_placeable() {
        let coordinator = Coordinator::new();
        let response = coordinator
            .handle_request(Request::Heartbeat {
                chunk_server_address: "localhost:9001".to_owned(),
                chunk_handles: vec![],
            })
            .await;
        assert_matches!(response, Response::Heartbeat { success: true });

        let placements = coordinator
            .upload_file("after.bin".to_owned(), 1)
            .await
            .expect("allocation");
        assert_eq!(placements[0].chunk_server_addresses, vec!["localhost:9001"]);
    }

    #[tokio::test]
    async fn chunk_io_requests_are_rejected() {
        let coordinator = Coordinator::new();
        let response = coordinator
            .handle_request(Request::ReadChunk {
                chunk_handle: ChunkHandle::derive("a", 0),
            })
            .await;
        assert_matches!(response, Response::Error(Error::InvalidArgument(_)));
    }

    proptest! {
        // For any upload sequence: every file splits into ceil(size / CHUNK_SIZE)
        // chunks and handles never collide across distinct (name, index) pairs.
        #[test]
        fn allocation_invariants_hold(
            uploads in proptest::collection::vec(
                ("[a-z]{1,8}", 0u64..4 * CHUNK_SIZE),
                1..8,
            )
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("runtime");
            runtime.block_on(async move {
                let coordinator = Coordinator::new();
                for (name, size) in &uploads {
                    let _ = coordinator.upload_file(name.clone(), *size).await;
                }

                let mut handles = Set::new();
                let mut pairs = Set::new();
                for file in coordinator.metadata().list_files().await {
                    let expected = (file.size + CHUNK_SIZE - 1) / CHUNK_SIZE;
                    assert_eq!(file.chunks.len() as u64, expected);
                    assert_eq!(file.chunk_count as u64, expected);
                    for (index, handle) in file.chunks.iter().enumerate() {
                        let chunk = coordinator
                            .metadata()
                            .get_chunk(handle)
                            .await
                            .expect("chunk record");
                        assert_eq!(chunk.file_name, file.name);
                        assert_eq!(chunk.chunk_index as usize, index);
                        let _ = handles.insert(handle.clone());
                        let _ = pairs.insert((file.name.clone(), index));
                    }
                }
                // distinct (name, index) pairs never share a handle
                assert_eq!(handles.len(), pairs.len());
            });
        }
    }
}
