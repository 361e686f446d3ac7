//! CloudFiles CLI - Command line interface for object storage operations.
//!
//! Each invocation runs one operation inside a fresh request context.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cloudfiles_common::{ConfigOverrides, FileContent, ObjectRef, StorageConfig};
use cloudfiles_storage::{CloudStorage, RequestContext};

#[derive(Parser)]
#[command(name = "cloudfiles")]
#[command(about = "CloudFiles - Simple file operations on object storage")]
#[command(version)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with configuration overrides.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region override.
    #[arg(long)]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List keys in a bucket (first page only).
    Ls {
        bucket: String,

        /// Only list keys starting with this prefix.
        #[arg(short, long)]
        prefix: Option<String>,
    },

    /// Upload a local file.
    Put {
        bucket: String,
        key: String,

        /// Local file to upload.
        file: PathBuf,

        /// MIME type of the object.
        #[arg(short = 't', long, default_value = "application/octet-stream")]
        content_type: String,

        /// Make the object publicly readable.
        #[arg(long)]
        public: bool,
    },

    /// Download an object.
    Get {
        bucket: String,
        key: String,

        /// Write content to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Decode content as text.
        #[arg(long)]
        text: bool,
    },

    /// Delete one or more objects from a bucket.
    Rm {
        bucket: String,

        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Copy an object.
    Cp {
        source_bucket: String,
        source_key: String,
        dest_bucket: String,
        dest_key: String,

        /// Make the copy publicly readable.
        #[arg(long)]
        public: bool,
    },

    /// Move an object (copy, then delete the source).
    Mv {
        source_bucket: String,
        source_key: String,
        dest_bucket: String,
        dest_key: String,

        /// Make the destination publicly readable.
        #[arg(long)]
        public: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(cli.config.as_deref(), cli.region)?;
    let storage = CloudStorage::new(config);
    let mut ctx = RequestContext::new();

    match cli.command {
        Commands::Ls { bucket, prefix } => {
            cmd_list(&storage, &mut ctx, &bucket, prefix.as_deref()).await
        }

        Commands::Put {
            bucket,
            key,
            file,
            content_type,
            public,
        } => cmd_put(&storage, &mut ctx, &bucket, &key, &file, &content_type, public).await,

        Commands::Get {
            bucket,
            key,
            out,
            text,
        } => cmd_get(&storage, &mut ctx, &bucket, &key, out.as_deref(), text).await,

        Commands::Rm { bucket, keys } => cmd_remove(&storage, &mut ctx, &bucket, keys).await,

        Commands::Cp {
            source_bucket,
            source_key,
            dest_bucket,
            dest_key,
            public,
        } => {
            let source = ObjectRef::new(source_bucket, source_key);
            let dest = ObjectRef::new(dest_bucket, dest_key);
            cmd_copy(&storage, &mut ctx, &source, &dest, public).await
        }

        Commands::Mv {
            source_bucket,
            source_key,
            dest_bucket,
            dest_key,
            public,
        } => {
            let source = ObjectRef::new(source_bucket, source_key);
            let dest = ObjectRef::new(dest_bucket, dest_key);
            cmd_move(&storage, &mut ctx, &source, &dest, public).await
        }
    }
}

/// Merge file, environment and flag overrides over the defaults.
fn load_config(path: Option<&Path>, region: Option<String>) -> Result<StorageConfig> {
    let file = match path {
        Some(path) => ConfigOverrides::from_json_file(path).context("Failed to load config file")?,
        None => ConfigOverrides::default(),
    };
    let env = ConfigOverrides::from_env().context("Invalid environment configuration")?;
    let flags = ConfigOverrides {
        region,
        ..Default::default()
    };

    Ok(StorageConfig::load(Some(file.merge(env).merge(flags))))
}

/// List keys.
async fn cmd_list(
    storage: &CloudStorage,
    ctx: &mut RequestContext,
    bucket: &str,
    prefix: Option<&str>,
) -> Result<()> {
    let keys = storage
        .get_objects_list(ctx, bucket, prefix)
        .await
        .context("Failed to list objects")?;

    if keys.is_empty() {
        println!("No objects found.");
    }
    for key in keys {
        println!("{}", key);
    }

    Ok(())
}

/// Upload a local file.
async fn cmd_put(
    storage: &CloudStorage,
    ctx: &mut RequestContext,
    bucket: &str,
    key: &str,
    file: &Path,
    content_type: &str,
    public: bool,
) -> Result<()> {
    info!("Uploading {} to {}/{}", file.display(), bucket, key);

    let content = tokio::fs::read(file)
        .await
        .context("Failed to read source file")?;
    let size = content.len();

    if !storage
        .upload_file(ctx, bucket, key, content, content_type, public)
        .await
    {
        anyhow::bail!("Upload failed");
    }

    println!("Uploaded {}/{} ({} bytes)", bucket, key, size);
    Ok(())
}

/// Download an object.
async fn cmd_get(
    storage: &CloudStorage,
    ctx: &mut RequestContext,
    bucket: &str,
    key: &str,
    out: Option<&Path>,
    text: bool,
) -> Result<()> {
    let content = storage
        .get_file(ctx, bucket, key, text)
        .await
        .context("Object not found or read failed")?;

    match (out, content) {
        (Some(path), content) => {
            let data = content.into_bytes();
            tokio::fs::write(path, &data)
                .await
                .context("Failed to write output file")?;
            println!("Saved {} ({} bytes)", path.display(), data.len());
        }
        (None, FileContent::Text(text)) => print!("{}", text),
        (None, FileContent::Bytes(data)) => {
            use std::io::Write;
            std::io::stdout()
                .write_all(&data)
                .context("Failed to write to stdout")?;
        }
    }

    Ok(())
}

/// Delete one key, or several in one batch.
async fn cmd_remove(
    storage: &CloudStorage,
    ctx: &mut RequestContext,
    bucket: &str,
    mut keys: Vec<String>,
) -> Result<()> {
    let count = keys.len();
    let ok = if count == 1 {
        let key = keys.remove(0);
        storage.delete_file(ctx, bucket, &key).await
    } else {
        storage.delete_files(ctx, bucket, keys).await
    };

    if !ok {
        anyhow::bail!("Delete failed");
    }

    println!("Deleted {} object(s) from {}", count, bucket);
    Ok(())
}

/// Copy an object.
async fn cmd_copy(
    storage: &CloudStorage,
    ctx: &mut RequestContext,
    source: &ObjectRef,
    dest: &ObjectRef,
    public: bool,
) -> Result<()> {
    if !storage.copy_file(ctx, source, dest, public).await {
        anyhow::bail!("Copy failed: source missing or backend error");
    }

    println!("Copied {} -> {}", source, dest);
    Ok(())
}

/// Move an object.
async fn cmd_move(
    storage: &CloudStorage,
    ctx: &mut RequestContext,
    source: &ObjectRef,
    dest: &ObjectRef,
    public: bool,
) -> Result<()> {
    if !storage.move_file(ctx, source, dest, public).await {
        anyhow::bail!("Move failed: source missing or backend error");
    }

    println!("Moved {} -> {}", source, dest);
    Ok(())
}
