// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use super::CHUNK_SIZE;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt::{self, Display, Formatter};

/// Length of a hex-encoded handle: 16 bytes of digest, two chars per byte.
const HANDLE_HEX_LEN: usize = 32;

/// Identifier a chunk is stored and addressed under, opaque at the wire
/// level.
///
/// Derived from `(file name, chunk index)` alone, never from the chunk
/// contents, so two uploads under the same name collide. The namespace model
/// is "unique names, last writer wins".
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ChunkHandle(String);

impl ChunkHandle {
    /// Derives the handle for chunk `chunk_index` of `file_name`: the first
    /// 16 bytes of `SHA-256(file_name + "-" + decimal(chunk_index))`,
    /// hex-encoded.
    pub fn derive(file_name: &str, chunk_index: u32) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(file_name.as_bytes());
        hasher.update(b"-");
        hasher.update(chunk_index.to_string().as_bytes());
        let digest = hasher.finalize();
        Self(hex::encode(&digest[..HANDLE_HEX_LEN / 2]))
    }

    /// Parses a handle back from its hex form, e.g. a chunk file name found
    /// on disk. Returns `None` for anything that is not 32 lowercase hex
    /// chars.
    pub fn from_hex(hex_str: &str) -> Option<Self> {
        if hex_str.len() != HANDLE_HEX_LEN {
            return None;
        }
        if !hex_str
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return None;
        }
        Some(Self(hex_str.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for ChunkHandle {
    fn fmt(&self, formatter: &mut Formatter) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Number of chunks a file of `size` bytes splits into. A zero-byte file has
/// no chunks at all.
pub fn chunk_count_for_size(size: u64) -> u32 {
    ((size + CHUNK_SIZE - 1) / CHUNK_SIZE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn derivation_matches_known_vector() {
        // first 16 bytes of SHA-256("h.txt-0"), hex encoded
        let handle = ChunkHandle::derive("h.txt", 0);
        assert_eq!(handle.as_str(), "0bcc17403e59c64cbfc330d225411cc6");
    }

    #[test]
    fn consecutive_indices_get_distinct_handles() {
        assert_eq!(
            ChunkHandle::derive("big.bin", 0).as_str(),
            "724c99ac08a2ee3b4448970587dd9707"
        );
        assert_eq!(
            ChunkHandle::derive("big.bin", 1).as_str(),
            "753f8df04d8c23a09277c9ed22d4fb4e"
        );
    }

    #[test]
    fn from_hex_rejects_malformed_input() {
        assert_eq!(ChunkHandle::from_hex(""), None);
        assert_eq!(ChunkHandle::from_hex("0bcc17403e59c64cbfc330d225411cc"), None);
        assert_eq!(
            ChunkHandle::from_hex("0BCC17403E59C64CBFC330D225411CC6"),
            None
        );
        assert_eq!(
            ChunkHandle::from_hex("zbcc17403e59c64cbfc330d225411cc6"),
            None
        );
    }

    #[test]
    fn chunk_count_boundaries() {
        assert_eq!(chunk_count_for_size(0), 0);
        assert_eq!(chunk_count_for_size(1), 1);
        assert_eq!(chunk_count_for_size(CHUNK_SIZE - 1), 1);
        assert_eq!(chunk_count_for_size(CHUNK_SIZE), 1);
        assert_eq!(chunk_count_for_size(CHUNK_SIZE + 1), 2);
        assert_eq!(chunk_count_for_size(10 * CHUNK_SIZE), 10);
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(name in ".{0,64}", index in 0u32..10_000) {
            let first = ChunkHandle::derive(&name, index);
            let second = ChunkHandle::derive(&name, index);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.as_str().len(), 32);
            prop_assert!(first
                .as_str()
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
            prop_assert_eq!(ChunkHandle::from_hex(first.as_str()), Some(second));
        }

        #[test]
        fn distinct_pairs_yield_distinct_handles(
            name in "[a-z]{1,16}",
            index_a in 0u32..64,
            index_b in 0u32..64,
        ) {
            prop_assume!(index_a != index_b);
            prop_assert_ne!(
                ChunkHandle::derive(&name, index_a),
                ChunkHandle::derive(&name, index_b)
            );
        }
    }
}
