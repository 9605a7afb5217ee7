//! # Loadbay Core
//!
//! Ingestion engine for saved container-image archives.
//!
//! This library materializes a previously exported image archive (or an
//! arbitrary filesystem tarball) into a local image repository, preserving
//! the layer dependency chain so the image can later be reconstructed by
//! stacking layers in order.
//!
//! ## Features
//!
//! - Recognizes both the legacy (`repositories` index + per-layer
//!   subdirectories) and the sibling-files (`<id>.json` + data file)
//!   archive layouts
//! - Reconstructs the layer dependency chain from per-layer parent
//!   references and materializes it root-first
//! - Wraps raw filesystem tarballs as synthetic single-layer images
//! - Forward-only materialization: layers are immutable, retries are safe
//!
//! ## Example
//!
//! ```no_run
//! use loadbay_core::LocalRepository;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Initialize a new repository
//! let repo = LocalRepository::init("./my-repo")?;
//!
//! // Load a saved image archive
//! let loaded = repo.loader().load(Path::new("./busybox.tar"))?;
//! println!("loaded {}", loaded.join(", "));
//!
//! // Import a raw filesystem tarball as a single-layer image
//! let id = repo
//!     .importer()
//!     .import_tarball(Path::new("./rootfs.tar"), "myimage", "latest", false)?;
//! println!("imported layer {id}");
//! # Ok(())
//! # }
//! ```

mod error;
mod graph;
mod import;
mod layer_id;
mod load;
mod repo;
mod structure;

pub use error::{Error, Result};
pub use graph::{find_head, ordered_chain};
pub use import::{ContainerConfig, LayerMetadata, Platform, TarballImporter, layer_metadata};
pub use layer_id::{LAYER_ID_LEN, LayerId};
pub use load::{ImageLoader, untar};
pub use repo::{LAYER_FORMAT_VERSION, LayerFile, LocalRepository};
pub use structure::{ArchiveStructure, LayerRecord, RepositoriesIndex, load_structure};
