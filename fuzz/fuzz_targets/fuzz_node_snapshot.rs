#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pagetree_core::{NodeSet, TreeNode};

#[derive(Debug, Arbitrary)]
struct RawNode {
    id: u8,
    tree_id: u8,
    level: u8,
    deep: bool,
    lft: u8,
    rght: u8,
}

/// Small levels, optionally pushed against `u32::MAX`.
fn level_of(n: &RawNode) -> u32 {
    let offset = u32::from(n.level % 8);
    if n.deep { u32::MAX - offset } else { offset }
}

fuzz_target!(|raw: Vec<RawNode>| {
    let nodes: Vec<TreeNode> = raw
        .iter()
        .map(|n| {
            TreeNode::new(
                u64::from(n.id),
                u64::from(n.tree_id % 4),
                level_of(n),
                u64::from(n.lft),
                u64::from(n.rght),
            )
        })
        .collect();

    // Arbitrary input must never panic; accepted input must be a real forest.
    let Ok(set) = NodeSet::from_nodes(nodes) else {
        return;
    };

    for node in &set {
        assert!(node.lft < node.rght, "inverted interval accepted");
        let chain = set.ancestors(node.id);
        assert_eq!(chain.len() as u32, set.depth(node), "depth disagrees with ancestry");
        for desc in set.subtree(node.id) {
            assert!(desc.is_descendant_of(node), "subtree leaked a non-descendant");
            assert!(desc.level > node.level, "descendant not deeper");
        }
    }
});
