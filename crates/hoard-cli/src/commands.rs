use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use colored::Colorize;
use hoard_client::HoardClient;
use hoard_crypto::ContentAddresser;
use hoard_protocol::BlobsQuery;
use hoard_server::{HoardServer, ServerConfig, StorageConfig};
use hoard_types::BlobId;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

use crate::cli::*;

const HASH_CHUNK: usize = 64 * 1024;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Hash(args) => cmd_hash(args, format).await,
        Command::Put(args) => cmd_put(&connect(&cli.server)?, args, format).await,
        Command::Get(args) => cmd_get(&connect(&cli.server)?, args).await,
        Command::Query(args) => cmd_query(&connect(&cli.server)?, args, format).await,
        Command::Iter(args) => cmd_iter(&connect(&cli.server)?, args, format).await,
        Command::Stats => cmd_stats(&connect(&cli.server)?, format).await,
    }
}

fn connect(server: &str) -> anyhow::Result<HoardClient> {
    HoardClient::new(server).with_context(|| format!("connecting to {server}"))
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    let config = apply_serve_args(config.apply_env()?, args);
    HoardServer::new(config).await?.serve().await?;
    Ok(())
}

/// Command-line flags win over the file and the environment.
fn apply_serve_args(mut config: ServerConfig, args: ServeArgs) -> ServerConfig {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(root) = args.data_dir {
        config.storage = StorageConfig::Filesystem { root };
    }
    if let Some(bucket) = args.bucket {
        config.bucket = bucket;
    }
    if let Some(domain) = args.index_domain {
        config.index_domain = domain;
    }
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    config
}

async fn cmd_put(client: &HoardClient, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut payloads = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        payloads.push(read_input(path).await?);
    }
    let ids = client.put_many(payloads).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ids)?),
        OutputFormat::Text => {
            for (id, path) in ids.iter().zip(&args.paths) {
                println!("{} {}", id.to_hex().yellow(), path.display());
            }
        }
    }
    Ok(())
}

async fn cmd_get(client: &HoardClient, args: GetArgs) -> anyhow::Result<()> {
    let data = client.get(&args.id).await?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, &data)
                .await
                .with_context(|| format!("writing {}", path.display()))?;
            eprintln!("{} {} bytes → {}", "✓".green(), data.len(), path.display());
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}

async fn cmd_query(client: &HoardClient, args: RangeArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut query = BlobsQuery::new(args.start, args.end);
    query.limit = args.limit;
    let page = client.query_with(&query).await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        OutputFormat::Text => {
            for entry in &page.blobs {
                println!("{}  {}", entry.time.to_string().dimmed(), entry.hash.to_hex().yellow());
            }
            println!(
                "{} blobs in ({}, {}]",
                page.blobs.len().to_string().bold(),
                page.start,
                page.end
            );
        }
    }
    Ok(())
}

async fn cmd_iter(client: &HoardClient, args: IterArgs, format: OutputFormat) -> anyhow::Result<()> {
    if let Some(dir) = &args.out_dir {
        tokio::fs::create_dir_all(dir).await?;
    }
    let mut blobs = client.iter(args.start, args.end);
    let mut count = 0u64;
    let mut bytes = 0u64;
    while let Some(item) = blobs.next().await {
        let blob = item.context("enumeration stopped early; output is incomplete")?;
        if let Some(dir) = &args.out_dir {
            tokio::fs::write(dir.join(blob.id.to_hex()), &blob.data)
                .await
                .with_context(|| format!("writing {}", blob.id))?;
        }
        match format {
            OutputFormat::Json => println!(
                "{}",
                serde_json::json!({ "hash": blob.id, "time": blob.time, "size": blob.data.len() })
            ),
            OutputFormat::Text => println!(
                "{}  {}  {} bytes",
                blob.time.to_string().dimmed(),
                blob.id.to_hex().yellow(),
                blob.data.len()
            ),
        }
        count += 1;
        bytes += blob.data.len() as u64;
    }
    if format == OutputFormat::Text {
        eprintln!("{} {count} blobs, {bytes} bytes", "✓".green().bold());
    }
    Ok(())
}

async fn cmd_stats(client: &HoardClient, format: OutputFormat) -> anyhow::Result<()> {
    let stats = client.stats().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
        OutputFormat::Text => {
            println!("Blobs:        {}", stats.blob_count.to_string().bold());
            println!("Total size:   {} bytes", stats.blob_size.to_string().bold());
            println!("Bucket:       {}", stats.bucket.cyan());
            println!("Index domain: {}", stats.index_domain.cyan());
            println!("Version:      {}", stats.version);
            println!("Started at:   {}", stats.started_at);
        }
    }
    Ok(())
}

async fn cmd_hash(args: HashArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut results = Vec::with_capacity(args.paths.len());
    for path in &args.paths {
        let file = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("opening {}", path.display()))?;
        let (id, len) = hash_reader(file).await?;
        results.push((id, len, path));
    }
    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = results
                .iter()
                .map(|(id, len, path)| {
                    serde_json::json!({ "hash": id, "size": len, "path": path.display().to_string() })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Text => {
            for (id, _, path) in &results {
                println!("{} {}", id.to_hex().yellow(), path.display());
            }
        }
    }
    Ok(())
}

/// Hash a stream without holding it in memory.
async fn hash_reader<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<(BlobId, u64)> {
    let mut address = ContentAddresser::incremental();
    let mut buf = vec![0u8; HASH_CHUNK];
    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        address.update(&buf[..n]);
    }
    Ok((address.finish(), address.len()))
}

/// Read a file, or stdin for `-`.
async fn read_input(path: &Path) -> anyhow::Result<Bytes> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        tokio::io::stdin().read_to_end(&mut buf).await?;
        return Ok(Bytes::from(buf));
    }
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(Bytes::from(data))
}
