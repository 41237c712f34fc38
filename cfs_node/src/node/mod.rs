// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The data node service: chunk read/write RPCs for clients, plus the
//! heartbeat and chunk-report traffic towards the coordinator.
//!
//! Heartbeats and chunk reports are fire-and-forget with a short deadline.
//! Failures are logged and dropped; the next heartbeat tick repairs the
//! coordinator's view, so there are no retry loops here.

use crate::{storage::ChunkStore, Error as StorageError, Result};

use cfs_interface::{
    messaging::{self, Error, Request, Response},
    types::{ChunkHandle, CONTROL_DEADLINE, HEARTBEAT_INTERVAL},
};

use std::sync::Arc;
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use tracing::{debug, error, trace, warn};

/// One running data node. Cheap to clone; clones share the chunk store.
#[derive(Clone, Debug)]
pub struct Node {
    /// The address clients and the coordinator reach us under.
    address: String,
    coordinator_addr: String,
    store: Arc<ChunkStore>,
}

impl Node {
    pub fn new(
        address: impl Into<String>,
        coordinator_addr: impl Into<String>,
        store: ChunkStore,
    ) -> Self {
        Self {
            address: address.into(),
            coordinator_addr: coordinator_addr.into(),
            store: Arc::new(store),
        }
    }

    /// Accepts connections forever, one spawned task per connection.
    pub async fn run(self, listener: TcpListener) -> Result<()> {
        loop {
            let (stream, peer_addr) = listener.accept().await?;
            let node = self.clone();
            let _handle = tokio::spawn(async move {
                if let Err(err) = node.serve_connection(stream).await {
                    debug!("connection from {} dropped: {}", peer_addr, err);
                }
            });
        }
    }

    /// Reports liveness and inventory every [`HEARTBEAT_INTERVAL`]; the
    /// first tick fires immediately so the node registers at boot.
    pub fn spawn_heartbeat_loop(&self) -> JoinHandle<()> {
        let node = self.clone();
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(HEARTBEAT_INTERVAL);
            loop {
                let _instant = ticks.tick().await;
                node.send_heartbeat().await;
            }
        })
    }

    async fn serve_connection(&self, mut stream: TcpStream) -> cfs_interface::Result<()> {
        let request = messaging::recv_msg(&mut stream).await?;
        let response = self.handle_request(request).await;
        messaging::send_msg(&mut stream, &response).await
    }

    /// Dispatches one request. Never fails; anything that goes wrong becomes
    /// the error arm of the response.
    pub async fn handle_request(&self, request: Request) -> Response {
        match request {
            Request::WriteChunk {
                chunk_handle,
                data,
                chunk_index,
            } => {
                debug!(
                    "write of chunk {} (index {}, {} bytes)",
                    chunk_handle,
                    chunk_index,
                    data.len()
                );
                match self.store.write_chunk(chunk_handle.clone(), data).await {
                    Ok(()) => {
                        // ack before the report lands; the coordinator's view
                        // lags until the report arrives
                        let node = self.clone();
                        let _handle = tokio::spawn(async move {
                            node.report_chunk(chunk_handle).await;
                        });
                        Response::WriteChunk { success: true }
                    }
                    Err(err) => {
                        error!("failed to store chunk {}: {}", chunk_handle, err);
                        Response::Error(Error::Internal(format!("store chunk: {err}")))
                    }
                }
            }
            Request::ReadChunk { chunk_handle } => {
                match self.store.read_chunk(&chunk_handle).await {
                    Ok(data) => Response::ReadChunk { data },
                    Err(StorageError::ChunkNotFound(handle)) => {
                        Response::Error(Error::NotFound(format!("chunk {handle}")))
                    }
                    Err(err) => {
                        error!("failed to read chunk {}: {}", chunk_handle, err);
                        Response::Error(Error::Internal(format!("read chunk: {err}")))
                    }
                }
            }
            _ => Response::Error(Error::InvalidArgument(
                "not a data node operation".to_owned(),
            )),
        }
    }

    async fn send_heartbeat(&self) {
        let chunk_handles: Vec<ChunkHandle> =
            self.store.list_chunks().await.into_iter().collect();
        let request = Request::Heartbeat {
            chunk_server_address: self.address.clone(),
            chunk_handles,
        };
        match messaging::call(&self.coordinator_addr, &request, CONTROL_DEADLINE).await {
            Ok(Response::Heartbeat { success: true }) => {
                trace!("heartbeat acknowledged by {}", self.coordinator_addr)
            }
            Ok(other) => warn!("unexpected heartbeat response: {:?}", other),
            Err(err) => warn!(
                "heartbeat to {} failed: {}",
                self.coordinator_addr, err
            ),
        }
    }

    async fn report_chunk(&self, chunk_handle: ChunkHandle) {
        let request = Request::ReportChunk {
            chunk_handle: chunk_handle.clone(),
            chunk_server_address: self.address.clone(),
        };
        match messaging::call(&self.coordinator_addr, &request, CONTROL_DEADLINE).await {
            Ok(Response::ReportChunk { success: true }) => {
                trace!("chunk {} reported to {}", chunk_handle, self.coordinator_addr)
            }
            Ok(other) => warn!("unexpected chunk report response: {:?}", other),
            Err(err) => warn!(
                "chunk report for {} to {} failed: {}",
                chunk_handle, self.coordinator_addr, err
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_matches::assert_matches;
    use bytes::Bytes;
    use eyre::Result;
    use tempfile::tempdir;

    // coordinator that is never there; reports and heartbeats must be
    // swallowed, not surfaced
    const DEAD_COORDINATOR: &str = "127.0.0.1:1";

    fn test_node(storage_root: &std::path::Path, coordinator_addr: &str) -> Result<Node> {
        let store = ChunkStore::new(storage_root)?;
        Ok(Node::new("localhost:9001", coordinator_addr, store))
    }

    #[tokio::test]
    async fn write_then_read_round_trips() -> Result<()> {
        let root = tempdir()?;
        let node = test_node(root.path(), DEAD_COORDINATOR)?;

        let handle = ChunkHandle::derive("h.txt", 0);
        let data = Bytes::from_static(b"hello world\n");

        let response = node
            .handle_request(Request::WriteChunk {
                chunk_handle: handle.clone(),
                data: data.clone(),
                chunk_index: 0,
            })
            .await;
        assert_matches!(response, Response::WriteChunk { success: true });

        let response = node
            .handle_request(Request::ReadChunk {
                chunk_handle: handle,
            })
            .await;
        assert_matches!(response, Response::ReadChunk { data: read } => {
            assert_eq!(read, data);
        });
        Ok(())
    }

    #[tokio::test]
    async fn write_acks_even_when_the_coordinator_is_down() -> Result<()> {
        let root = tempdir()?;
        let node = test_node(root.path(), DEAD_COORDINATOR)?;

        // the chunk report is fire-and-forget; a dead coordinator must not
        // fail the write
        let response = node
            .handle_request(Request::WriteChunk {
                chunk_handle: ChunkHandle::derive("lonely.bin", 0),
                data: Bytes::from_static(b"0123456789"),
                chunk_index: 0,
            })
            .await;
        assert_matches!(response, Response::WriteChunk { success: true });
        Ok(())
    }

    #[tokio::test]
    async fn reading_a_missing_chunk_is_not_found() -> Result<()> {
        let root = tempdir()?;
        let node = test_node(root.path(), DEAD_COORDINATOR)?;

        let response = node
            .handle_request(Request::ReadChunk {
                chunk_handle: ChunkHandle::derive("missing.bin", 0),
            })
            .await;
        assert_matches!(response, Response::Error(Error::NotFound(_)));
        Ok(())
    }

    #[tokio::test]
    async fn coordinator_operations_are_rejected() -> Result<()> {
        let root = tempdir()?;
        let node = test_node(root.path(), DEAD_COORDINATOR)?;

        let response = node.handle_request(Request::ListFiles).await;
        assert_matches!(response, Response::Error(Error::InvalidArgument(_)));
        Ok(())
    }

    #[tokio::test]
    async fn heartbeat_carries_the_full_inventory() -> Result<()> {
        // stand-in coordinator: accept one connection, capture the request
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let coordinator_addr = listener.local_addr()?.to_string();
        let captured = tokio::spawn(async move {
            let (mut stream, _peer) = listener.accept().await?;
            let request: Request = messaging::recv_msg(&mut stream).await?;
            messaging::send_msg(&mut stream, &Response::Heartbeat { success: true }).await?;
            Ok::<Request, eyre::Report>(request)
        });

        let root = tempdir()?;
        let node = test_node(root.path(), &coordinator_addr)?;
        let handle = ChunkHandle::derive("inv.bin", 0);
        node.store
            .write_chunk(handle.clone(), Bytes::from_static(b"x"))
            .await?;

        node.send_heartbeat().await;

        let request = captured.await??;
        assert_matches!(request, Request::Heartbeat { chunk_server_address, chunk_handles } => {
            assert_eq!(chunk_server_address, "localhost:9001");
            assert_eq!(chunk_handles, vec![handle]);
        });
        Ok(())
    }
}
