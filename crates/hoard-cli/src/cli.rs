use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use hoard_types::{BlobId, Timestamp};

#[derive(Parser)]
#[command(
    name = "hoard",
    about = "hoard — content-addressed blob store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Base URL of the hoard server
    #[arg(
        long,
        global = true,
        env = "HOARD_SERVER",
        default_value = "http://localhost:8010"
    )]
    pub server: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the hoard server
    Serve(ServeArgs),
    /// Upload files (use "-" for stdin)
    Put(PutArgs),
    /// Download a blob
    Get(GetArgs),
    /// Show one page of the time index
    Query(RangeArgs),
    /// Download every blob in a time range, oldest first
    Iter(IterArgs),
    /// Show server statistics
    Stats,
    /// Print the content id of local files without uploading
    Hash(HashArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
    /// Store blobs as files under this directory instead of in memory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,
    #[arg(long)]
    pub bucket: Option<String>,
    #[arg(long)]
    pub index_domain: Option<String>,
    #[arg(long)]
    pub page_size: Option<usize>,
}

#[derive(Args)]
pub struct PutArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct GetArgs {
    pub id: BlobId,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct RangeArgs {
    /// Exclusive lower bound (RFC 3339)
    #[arg(long)]
    pub start: Option<Timestamp>,
    /// Inclusive upper bound (RFC 3339), defaults to now
    #[arg(long)]
    pub end: Option<Timestamp>,
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct IterArgs {
    #[arg(long)]
    pub start: Option<Timestamp>,
    #[arg(long)]
    pub end: Option<Timestamp>,
    /// Save each blob as <dir>/<id>
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct HashArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}
