// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use cfs_interface::messaging;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The local file could not be read or written.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    /// An error a peer answered with, or transport trouble reaching it.
    #[error(transparent)]
    Rpc(#[from] messaging::Error),
    /// Every replica of the chunk failed to answer a read.
    #[error("chunk {chunk_index} has no reachable replica")]
    ChunkUnreachable { chunk_index: u32 },
    /// No replica at all accepted the chunk during an upload.
    #[error("no replica accepted chunk {chunk_index}")]
    NoReplicaStored { chunk_index: u32 },
    /// A peer answered with a message that does not fit the request.
    #[error("peer answered with an unexpected message")]
    UnexpectedResponse,
}
