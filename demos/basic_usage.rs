//! Basic usage of the Merkle tree
//!
//! Builds the six-leaf tree, mutates it at both ends and in the middle, and
//! prints the root after each step.
//!
//! Run with: cargo run --example basic_usage

use std::env;
use tessera::{MerkleTree, Position};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .init();

    let mut tree = MerkleTree::new(["hello", "world", "this", "is", "a", "test"])?;
    println!("{}", "═".repeat(72));
    println!("  Merkle tree: {} leaves, depth {}", tree.size(), tree.depth());
    println!("{}", "═".repeat(72));
    println!("  root  {}", tree.root()?.value());

    tree.push_back("new")?;
    println!("  push_back(\"new\")   size {} root {}", tree.size(), tree.root()?.value());

    tree.push_front("first")?;
    println!("  push_front(\"first\") size {} root {}", tree.size(), tree.root()?.value());

    tree.insert("middle", 4)?;
    println!("  insert(\"middle\", 4) size {} root {}", tree.size(), tree.root()?.value());

    tree.delete(0)?;
    println!("  delete(0)          size {} root {}", tree.size(), tree.root()?.value());

    println!();
    println!("Leaves:");
    for (index, leaf) in tree.leaves().enumerate() {
        let position = leaf
            .position()
            .map_or_else(|| "-".to_string(), |p: Position| p.to_string());
        println!("  ├─ {index:>2} {} at {position}", leaf.value().short());
    }

    for row in 1..tree.depth() {
        let entries = tree.row(row).map_or(0, <[_]>::len);
        println!("  row {row}: {entries} entries");
    }

    tree.verify()?;
    println!();
    println!("{}", serde_json::to_string_pretty(&tree.stats())?);
    Ok(())
}
