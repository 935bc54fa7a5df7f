//! Live-node accounting, in its own test binary so that no other test's
//! allocations show up in the counts.

#![cfg(feature = "audit")]

use lark_lang::{audit, parse_source, Errors, Node, Positions, SourcePos, Syntax};

#[test]
fn checkpoint_reports_zero_live_nodes_after_disposal() {
    let baseline = audit::live_nodes();

    {
        let positions = Positions::new();
        let errors = Errors::silent(positions.clone());
        let syntax = Syntax::built_in(&positions, &errors);
        let tree = parse_source("audit", "write -A, (B + C)", &positions, syntax, &errors)
            .expect("source should produce a tree");
        assert!(audit::live_nodes() > baseline);
        assert!(!audit::checkpoint(baseline).is_empty());
        drop(tree);
    }

    assert_eq!(audit::live_nodes(), baseline);
    assert!(audit::checkpoint(baseline).is_empty());

    let lone = Node::natural(42, SourcePos(0));
    let report = audit::checkpoint(baseline);
    assert_eq!(report.len(), 1);
    drop(lone);
}
