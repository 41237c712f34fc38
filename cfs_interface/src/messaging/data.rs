// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::types::{ChunkHandle, ChunkPlacement, FileInfo};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The closed set of errors an RPC can answer with. Anything a peer reports
/// is one of these four; transport-level trouble on our own side maps to
/// [`Error::Unavailable`].
#[derive(Clone, Debug, Eq, PartialEq, Error, Serialize, Deserialize)]
pub enum Error {
    /// Malformed request, missing required fields.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// File or chunk absent on the coordinator, or chunk absent on a data
    /// node.
    #[error("not found: {0}")]
    NotFound(String),
    /// Peer unreachable or timed out.
    #[error("unavailable: {0}")]
    Unavailable(String),
    /// Invariant violation or local I/O failure on the peer.
    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All requests a peer can receive. Coordinator and data nodes each answer
/// their own subset and reject the rest as [`Error::InvalidArgument`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// Allocate placements for a new file.
    ///
    /// This should eventually lead to an [`UploadFile`] response.
    ///
    /// [`UploadFile`]: Response::UploadFile
    UploadFile { filename: String, filesize: u64 },
    /// Locate the chunks of an existing file.
    ///
    /// This should eventually lead to a [`DownloadFile`] response.
    ///
    /// [`DownloadFile`]: Response::DownloadFile
    DownloadFile { filename: String },
    /// Snapshot of every file the coordinator knows about.
    ///
    /// This should eventually lead to a [`ListFiles`] response.
    ///
    /// [`ListFiles`]: Response::ListFiles
    ListFiles,
    /// A data node reporting liveness and its full chunk inventory.
    Heartbeat {
        chunk_server_address: String,
        chunk_handles: Vec<ChunkHandle>,
    },
    /// A data node reporting one freshly stored chunk.
    ReportChunk {
        chunk_handle: ChunkHandle,
        chunk_server_address: String,
    },
    /// Store one chunk's bytes on a data node.
    WriteChunk {
        chunk_handle: ChunkHandle,
        data: Bytes,
        chunk_index: u32,
    },
    /// Fetch one chunk's bytes from a data node.
    ReadChunk { chunk_handle: ChunkHandle },
}

/// The answers to [`Request`], plus the error arm every operation shares.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Response {
    UploadFile { chunk_locations: Vec<ChunkPlacement> },
    DownloadFile {
        filesize: u64,
        chunk_locations: Vec<ChunkPlacement>,
    },
    ListFiles { files: Vec<FileInfo> },
    Heartbeat { success: bool },
    ReportChunk { success: bool },
    WriteChunk { success: bool },
    ReadChunk { data: Bytes },
    Error(Error),
}
