//! Diagram files: pretty JSON with `Nodes`, `Edges` and `ForbiddenRules`.
//!
//! Loading is all-or-nothing. Callers receive either a complete `Diagram`
//! or a `PersistError`; they swap the live diagram only on success.

use crate::error::PersistError;
use crate::model::Diagram;
use std::fs;
use std::path::Path;

/// Parse a diagram from JSON text.
///
/// Forbidden flags are recomputed from the rules in the file, so stale
/// `IsForbidden` values never survive a load.
pub fn load_from_str(json: &str) -> Result<Diagram, PersistError> {
    let mut diagram: Diagram = serde_json::from_str(json)?;
    let flagged = diagram.refresh_forbidden_flags();
    let dangling = diagram.dangling_edges().count();
    if dangling > 0 {
        log::warn!("loaded diagram has {dangling} edge(s) with missing endpoints");
    }
    log::debug!(
        "loaded diagram: {} nodes, {} edges ({flagged} forbidden), {} rules",
        diagram.nodes.len(),
        diagram.edges.len(),
        diagram.forbidden_rules.len()
    );
    Ok(diagram)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<Diagram, PersistError> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&json)
}

/// Serialize with indentation. Transient highlight flags are not written.
pub fn save_to_string(diagram: &Diagram) -> Result<String, PersistError> {
    Ok(serde_json::to_string_pretty(diagram)?)
}

pub fn save_to_path(diagram: &Diagram, path: impl AsRef<Path>) -> Result<(), PersistError> {
    let path = path.as_ref();
    let json = save_to_string(diagram)?;
    fs::write(path, json).map_err(|source| PersistError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("saved diagram to {}", path.display());
    Ok(())
}
