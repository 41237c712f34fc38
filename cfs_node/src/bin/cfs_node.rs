// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use cfs_interface::types::DEFAULT_COORDINATOR_ADDR;
use cfs_node::{ChunkStore, Node};

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run a data node.
#[derive(Parser, Debug)]
#[clap(name = "cfs_node", version)]
struct CmdArgs {
    /// Port to listen on; the node advertises itself as localhost:<port>
    #[clap(long)]
    port: u16,
    /// Directory the chunk files live in (created if absent)
    #[clap(long)]
    storage: PathBuf,
    /// Address of the coordinator
    #[clap(long, env = "CFS_MASTER")]
    master: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = CmdArgs::parse();
    let address = format!("localhost:{}", args.port);
    let master = args
        .master
        .unwrap_or_else(|| DEFAULT_COORDINATOR_ADDR.to_owned());

    let store = ChunkStore::new(&args.storage)?;
    let node = Node::new(address.clone(), master, store);

    let listener = TcpListener::bind(&address).await?;
    info!("data node listening on {}", address);

    let _heartbeats = node.spawn_heartbeat_loop();
    node.run(listener).await?;
    Ok(())
}
