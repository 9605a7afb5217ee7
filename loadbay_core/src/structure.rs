//! Loading an extracted archive directory into an in-memory model.

use crate::error::Result;
use crate::layer_id::LayerId;
use log::{debug, warn};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

/// The legacy repositories index: image name -> tag name -> head layer id.
pub type RepositoriesIndex = BTreeMap<String, BTreeMap<String, String>>;

/// Everything found in one extracted archive directory.
///
/// Rebuilt on every ingestion call; nothing is retained across calls.
#[derive(Debug, Default)]
pub struct ArchiveStructure {
    /// Repositories index, present only in the legacy layout.
    pub repositories: Option<RepositoriesIndex>,

    /// Layer records keyed by identifier.
    pub layers: HashMap<LayerId, LayerRecord>,
}

/// Per-layer material accumulated across the on-disk shapes a layer can be
/// observed through: a classic metadata subdirectory, a sibling `<id>.json`
/// file, or a bare sibling data file. Shapes merge into one record per
/// identifier, never overwriting previously recorded fields.
#[derive(Debug, Default, Clone)]
pub struct LayerRecord {
    /// Parsed per-layer metadata (classic layout `json` file).
    pub json: Option<Value>,

    /// Format-version marker (classic layout `VERSION` file).
    pub version: Option<String>,

    /// Path to a sibling `<id>.json` metadata file.
    pub json_f: Option<PathBuf>,

    /// Path to the layer's data file.
    pub layer_f: Option<PathBuf>,
}

impl LayerRecord {
    /// The parent layer this record's metadata names, if usable.
    ///
    /// A missing, non-string, or empty `parent` field yields `None`.
    pub fn parent(&self) -> Option<&str> {
        self.json
            .as_ref()?
            .get("parent")?
            .as_str()
            .filter(|parent| !parent.is_empty())
    }
}

/// Build the in-memory model of an extracted archive directory.
///
/// Never fails: a missing or unreadable directory yields an empty
/// structure, and entries recognized by none of the layout rules are
/// silently skipped.
pub fn load_structure(dir: &Path) -> ArchiveStructure {
    let mut structure = ArchiveStructure::default();

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("cannot read {}: {}", dir.display(), err);
            return structure;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };

        if name == "repositories" {
            match read_json(&path) {
                Ok(index) => structure.repositories = Some(index),
                Err(err) => warn!("unreadable repositories index {}: {}", path.display(), err),
            }
        } else if name == "manifest.json" {
            // Manifest-style metadata is handled elsewhere; its presence
            // is not an error.
            debug!("manifest.json present in {}, skipping", dir.display());
        } else if let Ok(id) = LayerId::parse(&name) {
            let record = structure.layers.entry(id).or_default();
            if path.is_dir() {
                load_layer_dir(&path, record);
            } else {
                record.layer_f = Some(path);
            }
        } else if let Some(id) = name
            .strip_suffix(".json")
            .and_then(|stem| LayerId::parse(stem).ok())
        {
            structure.layers.entry(id).or_default().json_f = Some(path);
        }
    }

    structure
}

/// Populate a record from a classic per-layer subdirectory, which holds
/// `json`, `VERSION`, and a data file.
fn load_layer_dir(dir: &Path, record: &mut LayerRecord) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot read layer directory {}: {}", dir.display(), err);
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        match entry.file_name().to_str() {
            Some("json") => match read_json(&path) {
                Ok(json) => record.json = Some(json),
                Err(err) => warn!("unreadable layer metadata {}: {}", path.display(), err),
            },
            Some("VERSION") => match fs::read_to_string(&path) {
                Ok(version) => record.version = Some(version.trim().to_string()),
                Err(err) => warn!("unreadable version marker {}: {}", path.display(), err),
            },
            _ => record.layer_f = Some(path),
        }
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
}
