// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! Shared contracts between the coordinator, the data nodes and the clients:
//! the wire messages and their framing, the chunk handle derivation, and the
//! constants every role agrees on.

pub mod messaging;
pub mod types;

pub use messaging::{Error, Request, Response, Result};
pub use types::{ChunkHandle, ChunkPlacement, FileInfo};
