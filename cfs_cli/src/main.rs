// Copyright 2022 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use cfs_client::Client;
use cfs_interface::types::DEFAULT_COORDINATOR_ADDR;

use clap::Parser;
use color_eyre::Result;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Interact with the chunked file store
#[derive(Parser, Debug)]
#[clap(name = "cfs", version)]
struct CmdArgs {
    /// subcommands
    #[clap(subcommand)]
    cmd: SubCommands,
    /// Address of the coordinator
    #[clap(long, global(true), env = "CFS_MASTER")]
    master: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommands {
    /// Upload a local file under a remote name
    Upload {
        /// Local file to upload
        #[clap(long)]
        file: PathBuf,
        /// Name to store it under
        #[clap(long)]
        name: String,
    },
    /// Download a remote file
    Download {
        /// Name of the remote file
        #[clap(long)]
        name: String,
        /// Local path to write it to
        #[clap(long)]
        output: PathBuf,
    },
    /// List every stored file
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = match CmdArgs::try_parse() {
        Ok(args) => args,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(1);
        }
        // --help and --version land here
        Err(err) => {
            let _ = err.print();
            return Ok(());
        }
    };

    let master = args
        .master
        .unwrap_or_else(|| DEFAULT_COORDINATOR_ADDR.to_owned());
    debug!("using coordinator at {}", master);
    let client = Client::new(master);

    match args.cmd {
        SubCommands::Upload { file, name } => {
            client.upload(&file, &name).await?;
            println!("uploaded '{}' as '{}'", file.display(), name);
        }
        SubCommands::Download { name, output } => {
            client.download(&name, &output).await?;
            println!("downloaded '{}' to '{}'", name, output.display());
        }
        SubCommands::List => {
            let files = client.list().await?;
            if files.is_empty() {
                println!("no files stored");
            }
            for file in files {
                println!(
                    "{}  {} bytes  {} chunks",
                    file.filename, file.filesize, file.num_chunks
                );
            }
        }
    }

    Ok(())
}
