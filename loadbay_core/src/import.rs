//! Importing raw filesystem tarballs as single-layer images.

use crate::error::{Error, Result};
use crate::layer_id::LayerId;
use crate::load::move_file;
use crate::repo::{LayerFile, LocalRepository};
use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Host platform strings recorded in synthesized image metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
}

impl Default for Platform {
    fn default() -> Self {
        Self {
            architecture: container_arch(std::env::consts::ARCH).to_string(),
            os: std::env::consts::OS.to_string(),
        }
    }
}

/// Map a Rust target arch to its container-ecosystem name.
fn container_arch(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    }
}

/// Minimal image descriptor synthesized for imported tarballs.
///
/// Intentionally not a faithful build-time configuration; it exists to
/// satisfy the structural expectations of downstream consumers.
#[derive(Debug, Clone, Serialize)]
pub struct LayerMetadata {
    pub comment: String,
    pub created: String,
    pub config: ContainerConfig,
    pub container_config: ContainerConfig,
    pub architecture: String,
    pub os: String,
    pub id: String,
    pub size: u64,
}

/// A container configuration stanza with every field at its empty/zero
/// default, serialized under Docker's field names.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerConfig {
    pub env: Option<Vec<String>>,
    pub hostname: String,
    pub entrypoint: Option<Vec<String>>,
    pub port_specs: Option<Vec<String>>,
    pub memory: u64,
    pub on_build: Option<Vec<String>>,
    pub open_stdin: bool,
    pub mac_address: String,
    pub cpuset: String,
    pub network_disable: bool,
    pub user: String,
    pub attach_stderr: bool,
    pub attach_stdout: bool,
    pub cmd: Option<Vec<String>>,
    pub stdin_once: bool,
    pub cpus_shares: u64,
    pub working_dir: String,
    pub attach_stdin: bool,
    pub volumes: Option<BTreeMap<String, serde_json::Value>>,
    pub memory_swap: u64,
    pub tty: bool,
    pub domainname: String,
    pub image: String,
    pub labels: Option<BTreeMap<String, String>>,
    pub exposed_ports: Option<BTreeMap<String, serde_json::Value>>,
}

/// Synthesize the metadata object for an imported layer of `size` bytes.
pub fn layer_metadata(id: &LayerId, size: u64, platform: &Platform) -> LayerMetadata {
    LayerMetadata {
        comment: "created by loadbay".to_string(),
        created: Utc::now()
            .format("%Y-%m-%dT%H:%M:%S.000000000Z")
            .to_string(),
        config: ContainerConfig::default(),
        container_config: ContainerConfig::default(),
        architecture: platform.architecture.clone(),
        os: platform.os.clone(),
        id: id.to_string(),
        size,
    }
}

/// Imports raw filesystem tarballs as synthetic single-layer images.
pub struct TarballImporter<'a> {
    repo: &'a LocalRepository,
    platform: Platform,
}

impl<'a> TarballImporter<'a> {
    pub(crate) fn new(repo: &'a LocalRepository) -> Self {
        Self {
            repo,
            platform: Platform::default(),
        }
    }

    /// Override the platform strings recorded in synthesized metadata.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Wrap `tarball` as a single-layer image registered under `image:tag`.
    ///
    /// With `take_ownership` the tarball is moved into the repository;
    /// otherwise it is copied and the original left untouched. Returns the
    /// freshly generated layer identifier.
    pub fn import_tarball(
        &self,
        tarball: &Path,
        image: &str,
        tag: &str,
        take_ownership: bool,
    ) -> Result<LayerId> {
        if !tarball.exists() {
            return Err(Error::archive_not_found(tarball));
        }
        if self.repo.tag_exists(image, tag) {
            return Err(Error::tag_exists(image, tag));
        }

        let tag_dir = self.repo.setup_tag(image, tag)?;
        self.repo.write_version(&tag_dir)?;

        let id = LayerId::random();
        let data_path = self.repo.layer_path(&id, LayerFile::Data);
        if take_ownership {
            move_file(tarball, &data_path)?;
        } else {
            fs::copy(tarball, &data_path)?;
        }

        let size = fs::metadata(&data_path)?.len();
        let metadata = layer_metadata(&id, size, &self.platform);
        fs::write(
            self.repo.layer_path(&id, LayerFile::Metadata),
            serde_json::to_vec_pretty(&metadata)?,
        )?;

        self.repo.set_head(&tag_dir, &id)?;
        Ok(id)
    }
}
