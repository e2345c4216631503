//! Lazy recalculation
//!
//! Batches a run of mutations on a lazy tree and recalculates once, then
//! compares the work done against an eager tree fed the same operations.
//!
//! Run with: RUST_LOG=tessera_core=debug cargo run --example lazy_recalculation

use std::env;
use tessera::{MerkleTree, TreeConfig};
use tracing::info;

const LEAVES: usize = 1024;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config: TreeConfig = serde_json::from_str(r#"{ "eager_recalculate": false }"#)?;
    let mut lazy = MerkleTree::empty(config);
    let mut eager: MerkleTree = MerkleTree::default();

    for i in 0..LEAVES {
        let value = format!("record-{i:05}");
        lazy.push_back(&value)?;
        eager.push_back(&value)?;
    }
    info!(state = ?lazy.state(), dirty_from = ?lazy.dirty_from(), "lazy tree filled");

    let lazy_root = lazy.root()?.value();
    let eager_root = eager.root()?.value();
    info!(%lazy_root, %eager_root, "roots after filling");
    anyhow::ensure!(lazy_root == eager_root, "lazy and eager roots differ");

    // Touch the tail only: everything left of the boundary is kept.
    for tree in [&mut lazy, &mut eager] {
        tree.delete(LEAVES - 1)?;
        tree.push_back("replacement")?;
    }
    let lazy_root = lazy.root()?.value();
    info!(
        digests = lazy.stats().last_digests,
        boundary = ?lazy.stats().last_boundary,
        "lazy tail rebuild"
    );
    anyhow::ensure!(lazy_root == eager.root()?.value(), "lazy and eager roots differ");

    lazy.verify()?;
    eager.verify()?;
    println!("root {lazy_root}");
    Ok(())
}
