//! Resolving the layer dependency chain from scattered parent pointers.
//!
//! Layer metadata links each layer to at most one parent, forming disjoint
//! linked chains. The chain head is the layer no other layer names as its
//! parent; the root is the layer with no parent of its own.

use crate::layer_id::LayerId;
use crate::structure::ArchiveStructure;
use std::collections::HashMap;

/// Map each layer to the layer that names it as parent, built once so the
/// walks below don't rescan every record per step.
fn children(structure: &ArchiveStructure) -> HashMap<&str, &LayerId> {
    let mut child_of = HashMap::new();
    for (id, record) in &structure.layers {
        if let Some(parent) = record.parent() {
            child_of.insert(parent, id);
        }
    }
    child_of
}

/// Find the head of the layer chain.
///
/// Walks child pointers from an arbitrary starting layer until reaching a
/// layer nothing claims as parent. The walk is bounded by the layer count,
/// so a malformed cyclic chain returns `None` instead of looping. Returns
/// `None` for a structure with no layers.
pub fn find_head(structure: &ArchiveStructure) -> Option<LayerId> {
    let mut current = structure.layers.keys().next()?;
    let child_of = children(structure);

    for _ in 0..structure.layers.len() {
        match child_of.get(current.as_str()) {
            Some(child) => current = *child,
            None => return Some(current.clone()),
        }
    }

    None
}

/// Produce the chain ordered head-first, root-last.
///
/// Follows `parent` references from `head`, stopping when a record has no
/// usable parent or names one not present in the structure. Empty when the
/// structure has no layers. Materialization order is the reverse of this
/// sequence: a layer is only meaningful once its ancestor exists.
pub fn ordered_chain(structure: &ArchiveStructure, head: &LayerId) -> Vec<LayerId> {
    let mut chain = Vec::new();
    if structure.layers.is_empty() {
        return chain;
    }

    let mut current = head;
    for _ in 0..structure.layers.len() {
        chain.push(current.clone());

        let parent = structure
            .layers
            .get(current.as_str())
            .and_then(|record| record.parent());
        match parent.and_then(|parent| structure.layers.get_key_value(parent)) {
            Some((next, _)) => current = next,
            None => break,
        }
    }

    chain
}
