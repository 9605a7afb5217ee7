//! The local image repository store.

use crate::error::{Error, Result};
use crate::import::TarballImporter;
use crate::layer_id::LayerId;
use crate::load::ImageLoader;
use std::fs;
use std::path::{Path, PathBuf};

/// Repository format version written to the config file.
const REPO_VERSION: &str = "1";

/// Layer-format marker written into each tag directory.
pub const LAYER_FORMAT_VERSION: &str = "1.0";

/// Which of a layer's files a repository path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFile {
    /// The layer's JSON metadata.
    Metadata,
    /// The layer's filesystem data.
    Data,
}

impl LayerFile {
    fn extension(self) -> &'static str {
        match self {
            LayerFile::Metadata => "json",
            LayerFile::Data => "layer",
        }
    }
}

/// A local image repository.
///
/// Layout:
/// - `layers/` holds `<id>.json` / `<id>.layer` files shared by all tags
/// - `repos/<image>/<tag>/` registers each tag (`TAG`, `VERSION`, `HEAD`)
/// - `config` carries the repository format version
///
/// Layer files are immutable once written, so re-copying a layer is always
/// safe; the store performs no locking of its own, and concurrent ingestion
/// of the same `image:tag` must be serialized by the caller.
#[derive(Debug)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    /// Initialize a new repository at the given path.
    pub fn init<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        fs::create_dir_all(root.join("layers"))?;
        fs::create_dir_all(root.join("repos"))?;
        fs::write(root.join("config"), format!("version={}\n", REPO_VERSION))?;

        Ok(Self { root })
    }

    /// Open an existing repository, validating its layout and version.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        if !root.exists() {
            return Err(Error::invalid_repo(&root, "directory does not exist"));
        }

        let config_path = root.join("config");
        if !config_path.exists() {
            return Err(Error::invalid_repo(&root, "config file not found"));
        }
        check_config(&root, &fs::read_to_string(&config_path)?)?;

        for dir in ["layers", "repos"] {
            if !root.join(dir).is_dir() {
                return Err(Error::invalid_repo(&root, format!("{dir} directory missing")));
            }
        }

        Ok(Self { root })
    }

    /// Get the root directory of the repository.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding all layer files.
    pub fn layers_dir(&self) -> PathBuf {
        self.root.join("layers")
    }

    /// Path of a layer file inside the repository's layer storage.
    pub fn layer_path(&self, id: &LayerId, file: LayerFile) -> PathBuf {
        self.layers_dir()
            .join(format!("{}.{}", id, file.extension()))
    }

    fn tag_dir(&self, image: &str, tag: &str) -> Result<PathBuf> {
        validate_image_name(image)?;
        validate_tag_name(tag)?;
        Ok(self.root.join("repos").join(image).join(tag))
    }

    /// Whether `image:tag` is already registered.
    pub fn tag_exists(&self, image: &str, tag: &str) -> bool {
        self.tag_dir(image, tag)
            .map(|dir| dir.join("TAG").is_file())
            .unwrap_or(false)
    }

    /// Create the tag directory and register the tag name in it.
    pub fn setup_tag(&self, image: &str, tag: &str) -> Result<PathBuf> {
        let dir = self.tag_dir(image, tag)?;
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("TAG"), format!("{image}:{tag}\n"))?;
        Ok(dir)
    }

    /// Write the layer-format version marker into a tag directory.
    pub fn write_version(&self, tag_dir: &Path) -> Result<()> {
        fs::write(tag_dir.join("VERSION"), LAYER_FORMAT_VERSION)?;
        Ok(())
    }

    /// Record the head layer a tag resolves to.
    pub fn set_head(&self, tag_dir: &Path, id: &LayerId) -> Result<()> {
        fs::write(tag_dir.join("HEAD"), format!("{id}\n"))?;
        Ok(())
    }

    /// Read back the head layer recorded for `image:tag`, if any.
    pub fn head(&self, image: &str, tag: &str) -> Result<Option<LayerId>> {
        let head_path = self.tag_dir(image, tag)?.join("HEAD");
        if !head_path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&head_path)?;
        Ok(LayerId::parse(content.trim()).ok())
    }

    /// List every registered `image:tag`, sorted.
    pub fn images(&self) -> Result<Vec<String>> {
        let mut found = Vec::new();
        collect_tags(&self.root.join("repos"), &mut found)?;
        found.sort();
        Ok(found)
    }

    /// Ingestion interface for saved image archives.
    pub fn loader(&self) -> ImageLoader<'_> {
        ImageLoader::new(self)
    }

    /// Ingestion interface for raw filesystem tarballs.
    pub fn importer(&self) -> TarballImporter<'_> {
        TarballImporter::new(self)
    }
}

fn check_config(root: &Path, content: &str) -> Result<()> {
    let version = content
        .lines()
        .filter_map(|line| line.trim().split_once('='))
        .find(|(key, _)| key.trim() == "version")
        .map(|(_, value)| value.trim().to_string());

    if version.as_deref() != Some(REPO_VERSION) {
        return Err(Error::invalid_repo(
            root,
            format!("unsupported repository version: {:?}", version),
        ));
    }
    Ok(())
}

/// A tag directory is any directory under `repos/` holding a `TAG` file;
/// image names may span several path segments.
fn collect_tags(dir: &Path, found: &mut Vec<String>) -> Result<()> {
    if !dir.is_dir() {
        return Ok(());
    }

    for entry in fs::read_dir(dir)?.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let tag_file = path.join("TAG");
        if tag_file.is_file() {
            found.push(fs::read_to_string(&tag_file)?.trim().to_string());
        } else {
            collect_tags(&path, found)?;
        }
    }
    Ok(())
}

/// Validate an image name. Slashes are allowed (registry namespaces), path
/// traversal is not.
fn validate_image_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::invalid_name("image name cannot be empty"));
    }

    if name.contains("..") || name.contains('\\') || name.starts_with('/') || name.ends_with('/') {
        return Err(Error::invalid_name(format!("invalid image name: {name}")));
    }
    Ok(())
}

/// Validate a tag name: a single path segment.
fn validate_tag_name(tag: &str) -> Result<()> {
    if tag.is_empty() {
        return Err(Error::invalid_name("tag name cannot be empty"));
    }

    if tag.contains("..") || tag.contains('/') || tag.contains('\\') {
        return Err(Error::invalid_name(format!("invalid tag name: {tag}")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_and_open() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("repo");

        LocalRepository::init(&root).unwrap();
        let repo = LocalRepository::open(&root).unwrap();
        assert_eq!(repo.root(), root.as_path());
        assert!(repo.layers_dir().is_dir());
    }

    #[test]
    fn test_open_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        assert!(LocalRepository::open(temp_dir.path().join("missing")).is_err());
    }

    #[test]
    fn test_open_without_config() {
        let temp_dir = TempDir::new().unwrap();
        assert!(LocalRepository::open(temp_dir.path()).is_err());
    }

    #[test]
    fn test_open_unsupported_version() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("repo");
        LocalRepository::init(&root).unwrap();
        fs::write(root.join("config"), "version=99\n").unwrap();

        assert!(LocalRepository::open(&root).is_err());
    }

    #[test]
    fn test_layer_path() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::init(temp_dir.path().join("repo")).unwrap();
        let id = LayerId::parse(&"a".repeat(64)).unwrap();

        assert_eq!(
            repo.layer_path(&id, LayerFile::Metadata),
            repo.layers_dir().join(format!("{id}.json"))
        );
        assert_eq!(
            repo.layer_path(&id, LayerFile::Data),
            repo.layers_dir().join(format!("{id}.layer"))
        );
    }

    #[test]
    fn test_setup_tag_and_exists() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::init(temp_dir.path().join("repo")).unwrap();

        assert!(!repo.tag_exists("busybox", "latest"));

        let tag_dir = repo.setup_tag("busybox", "latest").unwrap();
        assert!(repo.tag_exists("busybox", "latest"));
        assert_eq!(
            fs::read_to_string(tag_dir.join("TAG")).unwrap().trim(),
            "busybox:latest"
        );
    }

    #[test]
    fn test_write_version_marker() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::init(temp_dir.path().join("repo")).unwrap();

        let tag_dir = repo.setup_tag("busybox", "latest").unwrap();
        repo.write_version(&tag_dir).unwrap();

        assert_eq!(
            fs::read_to_string(tag_dir.join("VERSION")).unwrap(),
            LAYER_FORMAT_VERSION
        );
    }

    #[test]
    fn test_head_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::init(temp_dir.path().join("repo")).unwrap();
        let id = LayerId::parse(&"d".repeat(64)).unwrap();

        assert_eq!(repo.head("busybox", "latest").unwrap(), None);

        let tag_dir = repo.setup_tag("busybox", "latest").unwrap();
        repo.set_head(&tag_dir, &id).unwrap();
        assert_eq!(repo.head("busybox", "latest").unwrap(), Some(id));
    }

    #[test]
    fn test_images_listing() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::init(temp_dir.path().join("repo")).unwrap();

        repo.setup_tag("busybox", "latest").unwrap();
        repo.setup_tag("library/ubuntu", "22.04").unwrap();

        assert_eq!(
            repo.images().unwrap(),
            vec!["busybox:latest", "library/ubuntu:22.04"]
        );
    }

    #[test]
    fn test_name_validation() {
        let temp_dir = TempDir::new().unwrap();
        let repo = LocalRepository::init(temp_dir.path().join("repo")).unwrap();

        assert!(repo.setup_tag("../escape", "latest").is_err());
        assert!(repo.setup_tag("", "latest").is_err());
        assert!(repo.setup_tag("busybox", "a/b").is_err());
        assert!(repo.setup_tag("busybox", "").is_err());

        // Namespaced image names are fine
        assert!(repo.setup_tag("library/ubuntu", "latest").is_ok());
    }
}
