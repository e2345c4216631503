//! Integration tests for the Tessera Merkle tree
//!
//! These tests drive the tree through the facade and check it against an
//! independent SHA-256 implementation and a plain model of the leaf list.

use proptest::prelude::*;
use rstest::rstest;
use sha2::{Digest as _, Sha256 as Reference};
use tessera::crypto::{self, Sha256};
use tessera::{CoreError, Digest, MerkleTree, TreeConfig, TreeState};

fn reference(data: &[u8]) -> Digest {
    Digest::new(Reference::digest(data).into())
}

/// Canonical root computed with the reference SHA-256 only
fn reference_root(values: &[Vec<u8>]) -> Option<Digest> {
    fn mth(leaves: &[Digest]) -> Digest {
        if leaves.len() == 1 {
            return leaves[0];
        }
        let k = 1 << (leaves.len() - 1).ilog2();
        let mut joined = mth(&leaves[..k]).as_bytes().to_vec();
        joined.extend_from_slice(mth(&leaves[k..]).as_bytes());
        reference(&joined)
    }

    let leaves: Vec<Digest> = values.iter().map(|v| reference(v)).collect();
    (!leaves.is_empty()).then(|| mth(&leaves))
}

#[rstest]
#[case("", "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")]
#[case("abc", "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
#[case(
    "abcdbcdecdefdefgefghfghighijhijkijkljklmklmnlmnomnopnopq",
    "248d6a61d20638b8e5c026930c3e6039a33ce45964ff2167f6ecedd419db06c1"
)]
fn test_published_vectors(#[case] input: &str, #[case] expected: &str) {
    let expected = Digest::from_hex(expected).unwrap();
    assert_eq!(crypto::digest(input.as_bytes()).unwrap(), expected);
    assert_eq!(hex::encode(reference(input.as_bytes()).as_bytes()), expected.to_hex());
}

#[test]
fn test_streaming_matches_reference_across_block_boundaries() {
    let data: Vec<u8> = (0..1000u32).map(|i| (i * 31 % 251) as u8).collect();
    for len in [55, 56, 63, 64, 65, 119, 120, 128, 1000] {
        let mut engine = Sha256::new();
        for chunk in data[..len].chunks(7) {
            engine.update(chunk).unwrap();
        }
        assert_eq!(engine.finalize(), reference(&data[..len]), "len {len}");
    }
}

#[test_log::test]
fn test_six_leaf_scenario() {
    let values: Vec<Vec<u8>> = ["hello", "world", "this", "is", "a", "test"]
        .iter()
        .map(|s| s.as_bytes().to_vec())
        .collect();
    let mut tree = MerkleTree::new(&values).unwrap();
    assert_eq!(tree.size(), 6);
    assert_eq!(tree.depth(), 4);
    assert_eq!(Some(tree.root().unwrap().value()), reference_root(&values));

    tree.push_back("new").unwrap();
    let mut extended = values.clone();
    extended.push(b"new".to_vec());
    assert_eq!(tree.size(), 7);
    assert_eq!(tree.depth(), 4);
    assert_eq!(Some(tree.root().unwrap().value()), reference_root(&extended));
    assert_eq!(tree.leaf(6).unwrap().value(), reference(b"new"));
}

#[test]
fn test_empty_tree_errors() {
    let mut tree = MerkleTree::empty(TreeConfig::default());
    assert_eq!(tree.state(), TreeState::Empty);
    assert!(matches!(tree.root(), Err(CoreError::EmptyTree)));
    assert!(matches!(
        tree.insert("x", 0),
        Err(CoreError::IndexOutOfRange { index: 0, size: 0 })
    ));
    assert!(matches!(tree.delete(0), Err(CoreError::IndexOutOfRange { .. })));

    tree.push_front("first").unwrap();
    assert_eq!(tree.root().unwrap().value(), reference(b"first"));
}

#[test]
fn test_error_messages() {
    let err = CoreError::IndexOutOfRange { index: 6, size: 6 };
    assert_eq!(err.to_string(), "index out of range: 6 >= size 6");
    assert_eq!(CoreError::EmptyTree.to_string(), "tree is empty");
}

#[derive(Clone, Debug)]
enum Op {
    PushBack(Vec<u8>),
    PushFront(Vec<u8>),
    Insert(Vec<u8>, usize),
    Delete(usize),
    Recalculate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    let value = proptest::collection::vec(any::<u8>(), 0..12);
    prop_oneof![
        4 => value.clone().prop_map(Op::PushBack),
        2 => value.clone().prop_map(Op::PushFront),
        2 => (value, any::<usize>()).prop_map(|(v, i)| Op::Insert(v, i)),
        2 => any::<usize>().prop_map(Op::Delete),
        1 => any::<usize>().prop_map(Op::Recalculate),
    ]
}

fn apply(tree: &mut MerkleTree, model: &mut Vec<Vec<u8>>, op: &Op) {
    match op {
        Op::PushBack(v) => {
            tree.push_back(v).unwrap();
            model.push(v.clone());
        }
        Op::PushFront(v) => {
            tree.push_front(v).unwrap();
            model.insert(0, v.clone());
        }
        Op::Insert(v, i) if !model.is_empty() => {
            let index = i % model.len();
            tree.insert(v, index).unwrap();
            model.insert(index, v.clone());
        }
        Op::Delete(i) if !model.is_empty() => {
            let index = i % model.len();
            tree.delete(index).unwrap();
            model.remove(index);
        }
        Op::Recalculate(i) if !model.is_empty() => {
            tree.recalculate(i % model.len()).unwrap();
        }
        Op::Insert(..) | Op::Delete(_) | Op::Recalculate(_) => {}
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_mutations_converge_to_fresh_build(
        initial in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..12), 1..64),
        ops in proptest::collection::vec(op(), 0..40),
        eager in any::<bool>(),
    ) {
        let config = TreeConfig::default().with_eager_recalculate(eager);
        let mut tree = MerkleTree::with_config(&initial, config).unwrap();
        let mut model = initial.clone();

        for op in &ops {
            apply(&mut tree, &mut model, op);
        }

        prop_assert_eq!(tree.size(), model.len());
        if model.is_empty() {
            prop_assert!(matches!(tree.root(), Err(CoreError::EmptyTree)));
            return Ok(());
        }

        let root = tree.root().unwrap().value();
        let mut fresh = MerkleTree::new(&model).unwrap();
        prop_assert_eq!(root, fresh.root().unwrap().value());
        prop_assert_eq!(Some(root), reference_root(&model));
        prop_assert!(tree.verify().is_ok());
    }

    #[test]
    fn prop_appends_rehash_logarithmically(n in 1usize..2000) {
        let values: Vec<String> = (0..n).map(|i| i.to_string()).collect();
        let mut tree = MerkleTree::new(&values).unwrap();
        tree.push_back("tail").unwrap();
        let stats = tree.stats();
        prop_assert!(stats.last_digests <= stats.depth);
    }
}
