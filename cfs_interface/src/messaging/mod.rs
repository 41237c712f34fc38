// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

//! The wire protocol: request/response messages framed as a 4-byte
//! big-endian length followed by a bincode payload, one exchange per TCP
//! connection.

mod data;

pub use data::{Error, Request, Response, Result};

use crate::types::CHUNK_SIZE;

use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tracing::trace;

/// Inbound frames are capped a little above one chunk so a garbled length
/// prefix cannot ask us to allocate without bound.
const MAX_FRAME_SIZE: u64 = CHUNK_SIZE + 1024 * 1024;

/// Writes one length-prefixed message to `writer`.
pub async fn send_msg<W, T>(writer: &mut W, msg: &T) -> Result<()>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    let payload =
        bincode::serialize(msg).map_err(|err| Error::Internal(format!("serialize: {err}")))?;
    if payload.len() as u64 > MAX_FRAME_SIZE {
        return Err(Error::InvalidArgument(format!(
            "frame of {} bytes exceeds the {MAX_FRAME_SIZE} byte cap",
            payload.len()
        )));
    }
    writer
        .write_u32(payload.len() as u32)
        .await
        .map_err(|err| Error::Unavailable(format!("send: {err}")))?;
    writer
        .write_all(&payload)
        .await
        .map_err(|err| Error::Unavailable(format!("send: {err}")))?;
    writer
        .flush()
        .await
        .map_err(|err| Error::Unavailable(format!("send: {err}")))?;
    Ok(())
}

/// Reads one length-prefixed message from `reader`.
pub async fn recv_msg<R, T>(reader: &mut R) -> Result<T>
where
    R: AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    let len = reader
        .read_u32()
        .await
        .map_err(|err| Error::Unavailable(format!("recv: {err}")))?;
    if len as u64 > MAX_FRAME_SIZE {
        return Err(Error::InvalidArgument(format!(
            "frame of {len} bytes exceeds the {MAX_FRAME_SIZE} byte cap"
        )));
    }
    let mut payload = vec![0u8; len as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|err| Error::Unavailable(format!("recv: {err}")))?;
    bincode::deserialize(&payload).map_err(|err| Error::InvalidArgument(format!("decode: {err}")))
}

/// Performs one request/response exchange with the peer at `addr` under the
/// given deadline. A lapsed deadline or an unreachable peer surfaces as
/// [`Error::Unavailable`]; an error the peer answered with is returned
/// verbatim.
pub async fn call(addr: &str, request: &Request, deadline: Duration) -> Result<Response> {
    let exchange = async {
        let mut stream = TcpStream::connect(addr)
            .await
            .map_err(|err| Error::Unavailable(format!("connect to {addr}: {err}")))?;
        send_msg(&mut stream, request).await?;
        let response = recv_msg(&mut stream).await?;
        trace!("exchange with {addr} complete");
        Ok(response)
    };

    match tokio::time::timeout(deadline, exchange).await {
        Ok(Ok(Response::Error(err))) => Err(err),
        Ok(result) => result,
        Err(_elapsed) => Err(Error::Unavailable(format!(
            "no response from {addr} within {deadline:?}"
        ))),
    }
}
