#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use pagetree_core::{NodeId, NodeSet, TreeNode};
use pagetree_runtime::{
    ActionKind, ControllerPhase, Position, RecordingSink, TreeView, TreeViewConfig,
};

#[derive(Debug, Arbitrary)]
enum Step {
    Toggle(u8),
    Start(u8, u8),
    Cancel,
    Commit(u8, u8),
    Reveal(u8),
}

#[derive(Debug, Arbitrary)]
struct Script {
    parents: Vec<u8>,
    depth: u8,
    steps: Vec<Step>,
}

/// Number a parent vector into nested-set intervals; node 0 is the root.
fn number(parents: &[u8]) -> Vec<TreeNode> {
    let count = parents.len().min(48) + 1;
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, &p) in parents.iter().take(count - 1).enumerate() {
        let child = i + 1;
        children[usize::from(p) % child].push(child);
    }
    let mut out = Vec::with_capacity(count);
    let mut stack = vec![(0usize, 0u32, false)];
    let mut counter = 1u64;
    let mut slots = vec![0usize; count];
    while let Some((idx, level, closing)) = stack.pop() {
        if closing {
            out[slots[idx]].rght = counter;
            counter += 1;
            continue;
        }
        slots[idx] = out.len();
        out.push(TreeNode::new(idx as u64 + 1, 1, level, counter, 0));
        counter += 1;
        stack.push((idx, level, true));
        for &child in children[idx].iter().rev() {
            stack.push((child, level + 1, false));
        }
    }
    out
}

fn kind(byte: u8) -> ActionKind {
    ActionKind::ALL[usize::from(byte) % ActionKind::ALL.len()]
}

fn position(byte: u8) -> Position {
    Position::ALL[usize::from(byte) % Position::ALL.len()]
}

fuzz_target!(|script: Script| {
    let nodes = NodeSet::from_nodes(number(&script.parents)).expect("numbered tree must validate");
    let pick = |byte: u8| NodeId::new(u64::from(byte) % (nodes.len() as u64 + 2) + 1);
    let config = TreeViewConfig {
        initial_expand_depth: u32::from(script.depth % 6),
        ..TreeViewConfig::default()
    };
    let mut view = TreeView::new(nodes.clone(), &config, RecordingSink::new());

    for step in script.steps.iter().take(64) {
        match *step {
            Step::Toggle(n) => {
                let _ = view.toggle(pick(n));
            }
            Step::Start(n, k) => {
                let _ = view.start_action(pick(n), kind(k));
            }
            Step::Cancel => {
                view.cancel_action();
            }
            Step::Commit(n, p) => {
                let before = view.session().copied();
                let result = view.commit_action(pick(n), position(p));
                if let Ok(report) = result {
                    let session = before.expect("commit without session");
                    assert_ne!(report.command.source_id, report.command.target_id);
                    if session.kind == ActionKind::Move {
                        let source = view.nodes().get(session.source).expect("source");
                        let target = view.nodes().get(report.command.target_id).expect("target");
                        assert!(!target.is_descendant_of(source));
                    }
                    assert_eq!(view.phase(), ControllerPhase::Idle);
                }
            }
            Step::Reveal(n) => {
                let _ = view.reveal(pick(n));
            }
        }

        for row in view.rows() {
            assert!(view.visibility().is_rendered(view.nodes(), row.row.id));
        }
    }
});
