// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use cfs_coordinator::Coordinator;
use cfs_interface::types::DEFAULT_COORDINATOR_ADDR;

use clap::Parser;
use color_eyre::Result;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run the metadata coordinator.
///
/// All metadata lives in memory: a restart forgets every file and waits for
/// heartbeats to repopulate the node view.
#[derive(Parser, Debug)]
#[clap(name = "cfs_coordinator", version)]
struct CmdArgs {
    /// Address to listen on
    #[clap(long, env = "CFS_COORDINATOR_ADDR")]
    addr: Option<String>,
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
    let addr = args
        .addr
        .unwrap_or_else(|| DEFAULT_COORDINATOR_ADDR.to_owned());

    let listener = TcpListener::bind(&addr).await?;
    info!("coordinator listening on {}", addr);

    Coordinator::new().run(listener).await?;
    Ok(())
}
