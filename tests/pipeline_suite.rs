use std::path::Path;

use umlflow_core::compile::DiagramOutput;
use umlflow_core::{compile_diagram, compile_diagram_json, parse_strict};

fn load_fixture(rel: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(rel);
    std::fs::read_to_string(&path).unwrap_or_else(|_| panic!("fixture missing: {rel}"))
}

fn assert_valid_output(output: &DiagramOutput, fixture: &str) {
    assert!(output.error.is_none(), "{fixture}: unexpected error: {:?}", output.error);
    assert!(!output.nodes.is_empty(), "{fixture}: no nodes");

    // Every edge endpoint must correspond to a node.
    for edge in &output.edges {
        assert!(
            output.nodes.iter().any(|node| node.id == edge.from),
            "{fixture}: edge from unknown node {}",
            edge.from
        );
        assert!(
            output.nodes.iter().any(|node| node.id == edge.to),
            "{fixture}: edge to unknown node {}",
            edge.to
        );
    }

    // Auto-placed siblings never overlap each other or an anchor.
    for a in &output.nodes {
        for b in &output.nodes {
            if a.id >= b.id || a.parent_offset != b.parent_offset {
                continue;
            }
            if a.has_pos && b.has_pos {
                // Two manual positions may collide; that is the
                // author's choice.
                continue;
            }
            assert!(
                !a.bounds.overlaps(&b.bounds),
                "{fixture}: {} overlaps {}",
                a.id,
                b.id
            );
        }
    }
}

#[test]
fn compile_all_fixtures() {
    // Keep this list explicit so new fixtures must be added intentionally.
    let candidates = [
        "basic.uml",
        "groups.uml",
        "anchors.uml",
        "grid.uml",
        "implicit.uml",
        "kinds.uml",
        "inheritance.uml",
    ];

    for rel in candidates {
        let source = load_fixture(rel);
        let output = compile_diagram(&source);
        assert_valid_output(&output, rel);

        // Determinism: recompiling yields byte-identical JSON.
        assert_eq!(
            compile_diagram_json(&source),
            compile_diagram_json(&source),
            "{rel}: non-deterministic output"
        );

        // Fixtures must parse cleanly.
        assert!(parse_strict(&source).is_ok(), "{rel}: parse failed");
    }
}

#[test]
fn fixture_groups_nest_and_box_children() {
    let source = load_fixture("groups.uml");
    let output = compile_diagram(&source);
    assert_eq!(output.groups.len(), 2, "named groups only");

    let backend = output.groups.iter().find(|group| group.id == "Backend").unwrap();
    let api = output.nodes.iter().find(|node| node.id == "Api").unwrap();
    assert!(
        backend.bounds.x <= api.bounds.x && backend.bounds.right() >= api.bounds.right(),
        "group box must enclose its children"
    );
}

#[test]
fn fixture_anchors_pin_and_size() {
    let source = load_fixture("anchors.uml");
    let output = compile_diagram(&source);
    let pinned = output.nodes.iter().find(|node| node.id == "Pinned").unwrap();
    assert!(pinned.has_pos);
    assert_eq!(
        (pinned.bounds.x, pinned.bounds.y, pinned.bounds.w, pinned.bounds.h),
        (300, 40, 260, 140)
    );
    let floating = output.nodes.iter().find(|node| node.id == "Floating").unwrap();
    assert!(!floating.has_pos);
}

#[test]
fn fixture_implicit_nodes_are_flagged() {
    let source = load_fixture("implicit.uml");
    let output = compile_diagram(&source);
    assert_eq!(output.implicit_nodes.len(), 4);
    assert!(output.nodes.iter().all(|node| !node.explicit));
}

#[test]
fn fixture_kinds_map_to_storage_kinds() {
    let source = load_fixture("kinds.uml");
    let output = compile_diagram(&source);
    let of = |id: &str| output.nodes.iter().find(|node| node.id == id).unwrap();
    assert_eq!(of("Drawable").kind, "class");
    assert!(of("Drawable").modifiers.contains(&"interface".to_string()));
    assert_eq!(of("Dot").kind, "node");
    assert!(of("Dot").modifiers.contains(&"circle".to_string()));
    assert!(of("Shape").modifiers.contains(&"abstract".to_string()));
}

#[test]
fn fixture_inheritance_layers_downward() {
    let source = load_fixture("inheritance.uml");
    let output = compile_diagram(&source);
    let of = |id: &str| output.nodes.iter().find(|node| node.id == id).unwrap();
    assert!(of("Dog").bounds.y > of("Animal").bounds.y);
    assert!(of("Puppy").bounds.y > of("Dog").bounds.y);
}

#[test]
fn broken_input_still_produces_partial_diagram() {
    let source = "class Good\n--> broken -->\nclass AlsoGood\n";
    let output = compile_diagram(source);
    let error = output.error.expect("expected diagnostic");
    assert_eq!(error.line, 2);
    assert_eq!(output.nodes.len(), 2);
}

#[test]
fn empty_input_compiles_to_empty_output() {
    let output = compile_diagram("");
    assert!(output.nodes.is_empty());
    assert!(output.error.is_none());
}
