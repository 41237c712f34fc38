// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! A data node: the on-disk chunk store, the read/write RPC surface clients
//! talk to, and the background reporting that keeps the coordinator's view
//! of this node fresh.

mod errors;
pub mod node;
pub mod storage;

pub use errors::{Error, Result};
pub use node::Node;
pub use storage::ChunkStore;
