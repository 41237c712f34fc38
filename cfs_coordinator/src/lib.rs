// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The metadata coordinator: the authoritative in-memory store of files,
//! chunks and data-node registrations, and the request/response surface
//! clients and data nodes talk to. The coordinator never touches chunk
//! bytes.

mod errors;
pub mod metadata;
pub mod server;

pub use errors::{Error, Result};
pub use metadata::MetadataStore;
pub use server::Coordinator;
