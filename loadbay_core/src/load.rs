//! Materializing saved image archives into the repository.

use crate::error::{Error, Result};
use crate::graph;
use crate::layer_id::LayerId;
use crate::repo::{LayerFile, LocalRepository};
use crate::structure::{ArchiveStructure, load_structure};
use log::debug;
use std::fs;
use std::io;
use std::path::Path;
use std::process::Command;

/// Loads saved image archives into a repository.
///
/// Materialization is forward-only: a failure mid-chain leaves the layers
/// already copied in place. Layer content is immutable, so retrying the
/// load is safe.
pub struct ImageLoader<'a> {
    repo: &'a LocalRepository,
}

impl<'a> ImageLoader<'a> {
    pub(crate) fn new(repo: &'a LocalRepository) -> Self {
        Self { repo }
    }

    /// Ingest a saved image archive.
    ///
    /// Extracts the archive into a scratch directory, loads its structure
    /// and materializes every repository/tag it carries. Returns the list
    /// of `image:tag` names loaded.
    pub fn load(&self, archive: &Path) -> Result<Vec<String>> {
        if !archive.exists() {
            return Err(Error::archive_not_found(archive));
        }

        let scratch = tempfile::tempdir()?;
        untar(archive, scratch.path())?;

        let structure = load_structure(scratch.path());
        self.load_repositories(&structure)
    }

    /// Materialize every image/tag named by the structure's repositories
    /// index, failing fast on the first image that cannot be loaded.
    pub fn load_repositories(&self, structure: &ArchiveStructure) -> Result<Vec<String>> {
        let repositories = structure
            .repositories
            .as_ref()
            .ok_or(Error::NoRepositories)?;

        let mut loaded = Vec::new();
        for (image, tags) in repositories {
            for tag in tags.keys() {
                loaded.extend(self.load_image(structure, image, tag)?);
            }
        }
        Ok(loaded)
    }

    /// Materialize one image: register the tag, then copy the layer chain
    /// into the repository root-first.
    ///
    /// An already-registered `image:tag` is a conflict, never overwritten.
    /// A structure with no layers still registers the tag and succeeds.
    pub fn load_image(
        &self,
        structure: &ArchiveStructure,
        image: &str,
        tag: &str,
    ) -> Result<Vec<String>> {
        if self.repo.tag_exists(image, tag) {
            return Err(Error::tag_exists(image, tag));
        }

        let tag_dir = self.repo.setup_tag(image, tag)?;
        self.repo.write_version(&tag_dir)?;

        if let Some(head) = graph::find_head(structure) {
            let chain = graph::ordered_chain(structure, &head);
            for id in chain.iter().rev() {
                let Some(record) = structure.layers.get(id) else {
                    continue;
                };

                if let Some(json_f) = &record.json_f {
                    self.copy_layer_to_repo(json_f, id, LayerFile::Metadata)?;
                } else if let Some(json) = &record.json {
                    // Classic layout carries metadata only in parsed form;
                    // write it back out so the parent chain survives in
                    // the repository.
                    fs::write(
                        self.repo.layer_path(id, LayerFile::Metadata),
                        serde_json::to_vec(json)?,
                    )?;
                }
                if let Some(layer_f) = &record.layer_f {
                    self.copy_layer_to_repo(layer_f, id, LayerFile::Data)?;
                }
            }
            self.repo.set_head(&tag_dir, &head)?;
        }

        Ok(vec![format!("{image}:{tag}")])
    }

    /// Place one layer file into the repository's layer storage under a
    /// name derived from the layer id.
    ///
    /// The source must be an existing regular file. Overwriting an earlier
    /// copy of the same layer is success; layer content is immutable.
    pub fn copy_layer_to_repo(&self, source: &Path, id: &LayerId, file: LayerFile) -> Result<()> {
        if !source.is_file() {
            return Err(Error::layer_copy(
                id.as_str(),
                source,
                io::Error::new(io::ErrorKind::NotFound, "not a regular file"),
            ));
        }

        let dest = self.repo.layer_path(id, file);
        move_file(source, &dest).map_err(|err| Error::layer_copy(id.as_str(), source, err))?;
        debug!("layer {} placed at {}", id, dest.display());
        Ok(())
    }
}

/// Extract a saved archive with the external tar tool.
///
/// Succeeds exactly when the tool reports a zero exit status.
pub fn untar(archive: &Path, dest: &Path) -> Result<()> {
    let status = Command::new("tar")
        .arg("-C")
        .arg(dest)
        .arg("-xf")
        .arg(archive)
        .status()?;

    if !status.success() {
        return Err(Error::extraction_failed(archive, &status));
    }

    debug!("extracted {} into {}", archive.display(), dest.display());
    Ok(())
}

/// Move a file into place, falling back to copy+remove across devices.
pub(crate) fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(source, dest)?;
            fs::remove_file(source)
        }
    }
}
