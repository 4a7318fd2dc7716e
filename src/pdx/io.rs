//! JSON interchange for property trees.
//!
//! Decoding the binary asset is the job of the tree parser; the tools exchange already
//! materialised trees as JSON. Reads and writes are async and finish before any conversion
//! starts.

use std::path::Path;

use anyhow::Context;

use super::PdxNode;

pub async fn read_tree(path: &Path) -> anyhow::Result<PdxNode> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let tree = serde_json::from_slice(&bytes)
        .with_context(|| format!("{} is not a PDX tree", path.display()))?;
    log::debug!("read PDX tree from {}", path.display());
    Ok(tree)
}

pub async fn write_tree(path: &Path, tree: &PdxNode) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(tree)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote PDX tree to {}", path.display());
    Ok(())
}
