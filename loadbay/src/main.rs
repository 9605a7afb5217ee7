use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use loadbay_core::LocalRepository;
use std::path::{Path, PathBuf};

/// Loadbay - a local image repository for saved container-image archives
#[derive(Parser)]
#[command(name = "loadbay")]
#[command(about = "Load saved container-image archives into a local layer repository", long_about = None)]
#[command(version)]
struct Cli {
    /// Repository root directory (defaults to LOADBAY_ROOT env var or ./loadbay-repo)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new repository
    Init,

    /// Load a saved image archive into the repository
    Load {
        /// Archive file (docker-save style tarball)
        archive: PathBuf,
    },

    /// Import a raw filesystem tarball as a single-layer image
    Import {
        /// Tarball to import
        tarball: PathBuf,

        /// Target image reference (NAME[:TAG], tag defaults to "latest")
        image: String,

        /// Copy the tarball instead of moving it into the repository
        #[arg(long)]
        keep: bool,
    },

    /// List registered image tags
    Images,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    // Determine repository root: CLI arg > LOADBAY_ROOT env var > default
    let root = cli
        .root
        .or_else(|| std::env::var("LOADBAY_ROOT").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("./loadbay-repo"));

    match cli.command {
        Commands::Init => cmd_init(&root),
        Commands::Load { archive } => cmd_load(&root, &archive),
        Commands::Import {
            tarball,
            image,
            keep,
        } => cmd_import(&root, &tarball, &image, keep),
        Commands::Images => cmd_images(&root),
    }
}

fn open_repo(root: &Path) -> Result<LocalRepository> {
    LocalRepository::open(root)
        .with_context(|| format!("Failed to open repository at {}", root.display()))
}

fn cmd_init(root: &Path) -> Result<()> {
    LocalRepository::init(root)
        .with_context(|| format!("Failed to initialize repository at {}", root.display()))?;

    println!("Initialized loadbay repository at {}", root.display());
    Ok(())
}

fn cmd_load(root: &Path, archive: &Path) -> Result<()> {
    let repo = open_repo(root)?;

    let loaded = repo
        .loader()
        .load(archive)
        .with_context(|| format!("Failed to load archive {}", archive.display()))?;

    for name in loaded {
        println!("{name}");
    }
    Ok(())
}

fn cmd_import(root: &Path, tarball: &Path, image: &str, keep: bool) -> Result<()> {
    let repo = open_repo(root)?;
    let (name, tag) = parse_image_ref(image);

    let id = repo
        .importer()
        .import_tarball(tarball, &name, &tag, !keep)
        .with_context(|| format!("Failed to import {}", tarball.display()))?;

    println!("{id} {name}:{tag}");
    Ok(())
}

fn cmd_images(root: &Path) -> Result<()> {
    let repo = open_repo(root)?;
    let images = repo.images().context("Failed to list images")?;

    if images.is_empty() {
        println!("No images (use 'loadbay load' or 'loadbay import')");
    } else {
        for name in images {
            println!("{name}");
        }
    }
    Ok(())
}

/// Parse `name:tag` handling registry port syntax (`registry:5000/foo`).
fn parse_image_ref(image: &str) -> (String, String) {
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name.to_string(), tag.to_string()),
        _ => (image.to_string(), "latest".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_image_ref;

    #[test]
    fn test_parse_image_ref() {
        assert_eq!(
            parse_image_ref("busybox"),
            ("busybox".to_string(), "latest".to_string())
        );
        assert_eq!(
            parse_image_ref("busybox:1.36"),
            ("busybox".to_string(), "1.36".to_string())
        );
        assert_eq!(
            parse_image_ref("registry:5000/foo"),
            ("registry:5000/foo".to_string(), "latest".to_string())
        );
        assert_eq!(
            parse_image_ref("registry:5000/foo:bar"),
            ("registry:5000/foo".to_string(), "bar".to_string())
        );
    }
}
