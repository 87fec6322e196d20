//! The full compile pipeline: parse, resolve, lay out, serialize.
//!
//! This is what hosts call on every keystroke and on every throttled
//! pointer-move during a drag, so it must stay allocation-light and
//! strictly deterministic: identical source yields byte-identical
//! JSON. Parse problems do not blank the output; whatever parsed still
//! lays out, with the diagnostic attached alongside.

use serde::Serialize;

use crate::config::LayoutConfig;
use crate::diagnostics::Diagnostic;
use crate::ir::Point;
use crate::layout::{Bounds, layout_diagram};
use crate::parser::parse_document;
use crate::symbols::resolve;

/// A positioned node ready for the host to render.
#[derive(Debug, Clone, Serialize)]
pub struct NodeOutput {
    pub id: String,
    /// Storage kind: "class" or "node".
    pub kind: String,
    /// Modifiers, keyword-derived ones included.
    pub modifiers: Vec<String>,
    pub label: Option<String>,
    pub body_lines: Vec<String>,
    /// World-space bounds.
    pub bounds: Bounds,
    /// Whether the node is pinned by a manual `@pos`.
    pub has_pos: bool,
    /// World position of the parent group, for converting drag deltas
    /// back into local coordinates.
    pub parent_offset: Point,
    pub explicit: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EdgeOutput {
    pub from: String,
    pub to: String,
    /// Canonical arrow name (e.g. "extends_left", "assoc_right").
    pub arrow: String,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupOutput {
    pub id: String,
    pub bounds: Bounds,
}

/// The combined output sent to the host.
#[derive(Debug, Clone, Serialize)]
pub struct DiagramOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<GroupOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub implicit_nodes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Diagnostic>,
}

/// Run the whole pipeline with the default layout configuration.
pub fn compile_diagram(source: &str) -> DiagramOutput {
    compile_diagram_with_config(source, &LayoutConfig::default())
}

pub fn compile_diagram_with_config(source: &str, config: &LayoutConfig) -> DiagramOutput {
    let parsed = parse_document(source);
    let diagram = resolve(&parsed.document);
    log::debug!(
        "compile: {} entities, {} edges, {} groups, layout {:?}",
        diagram.entities.len(),
        diagram.edges.len(),
        diagram.groups.len().saturating_sub(1),
        diagram.layout
    );
    let layout = layout_diagram(&diagram, config);

    // Named groups only; the synthetic root and anonymous groups are
    // layout-only.
    let groups: Vec<GroupOutput> = diagram
        .groups
        .iter()
        .filter(|group| group.gid != diagram.root)
        .filter_map(|group| {
            let id = group.id.clone()?;
            let bounds = layout.group_world_bounds.get(&group.gid).copied()?;
            Some(GroupOutput { id, bounds })
        })
        .collect();

    let nodes: Vec<NodeOutput> = diagram
        .entities
        .iter()
        .map(|entity| {
            let bounds = layout
                .entity_world_bounds
                .get(&entity.eid)
                .copied()
                .unwrap_or(Bounds {
                    x: 0,
                    y: 0,
                    w: 0,
                    h: 0,
                });
            let parent_offset = layout
                .group_world_pos
                .get(&entity.group)
                .copied()
                .unwrap_or(Point::ZERO);
            NodeOutput {
                id: entity.id.clone(),
                kind: entity.kind.as_str().to_string(),
                modifiers: entity.modifiers.clone(),
                label: entity.label.clone(),
                body_lines: entity.body_lines.clone(),
                bounds,
                has_pos: entity.pos.is_some(),
                parent_offset,
                explicit: entity.explicit,
            }
        })
        .collect();

    let edges: Vec<EdgeOutput> = diagram
        .edges
        .iter()
        .map(|edge| EdgeOutput {
            from: diagram.entity(edge.from).id.clone(),
            to: diagram.entity(edge.to).id.clone(),
            arrow: edge.arrow.clone(),
            label: edge.label.clone(),
        })
        .collect();

    DiagramOutput {
        groups,
        nodes,
        edges,
        implicit_nodes: diagram.implicit.clone(),
        error: parsed.diagnostic,
    }
}

/// JSON form of [`compile_diagram`], the host-facing entry point.
pub fn compile_diagram_json(source: &str) -> String {
    let output = compile_diagram(source);
    serde_json::to_string(&output).unwrap_or_else(|err| {
        log::error!("compile: serialization failed: {err}");
        "{}".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compile_reports_implicit_nodes() {
        let output = compile_diagram("A --> B\n");
        assert_eq!(output.implicit_nodes, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(output.nodes.len(), 2);
        assert!(output.nodes.iter().all(|node| !node.explicit));
        assert!(output.error.is_none());
    }

    #[test]
    fn compile_is_deterministic() {
        let source = "@layout: grid\nclass A\nclass B\ngroup G {\n    class C\n}\nA --> B\nB --> C\n";
        let first = compile_diagram_json(source);
        let second = compile_diagram_json(source);
        assert_eq!(first, second);
    }

    #[test]
    fn compile_keeps_partial_output_on_error() {
        let output = compile_diagram("class A\n???\nclass B\n");
        assert!(output.error.is_some());
        assert_eq!(output.nodes.len(), 2);
    }

    #[test]
    fn compile_reports_error_position() {
        let output = compile_diagram("class A\n???\n");
        let error = output.error.unwrap();
        assert_eq!(error.line, 2);
        assert_eq!(error.column, 1);
    }

    #[test]
    fn compile_groups_expose_named_only() {
        let output = compile_diagram("group Named {\n    class A\n}\ngroup {\n    class B\n}\n");
        assert_eq!(output.groups.len(), 1);
        assert_eq!(output.groups[0].id, "Named");
    }

    #[test]
    fn compile_node_carries_manual_lock() {
        let output = compile_diagram("class X {\n    @pos: (50, 50)\n}\n");
        let node = &output.nodes[0];
        assert!(node.has_pos);
        assert_eq!((node.bounds.x, node.bounds.y), (50, 50));
    }

    #[test]
    fn compile_parent_offset_reflects_group_position() {
        let output = compile_diagram("group G {\n    @pos: (100, 200)\n    class A\n}\n");
        let node = &output.nodes[0];
        assert_eq!(node.parent_offset, Point::new(100, 200));
    }

    #[test]
    fn compile_edges_use_canonical_arrows() {
        let output = compile_diagram("A <|-- B : inherits\n");
        assert_eq!(output.edges[0].arrow, "extends_left");
        assert_eq!(output.edges[0].label.as_deref(), Some("inherits"));
    }

    #[test]
    fn compile_json_skips_empty_sections() {
        let json = compile_diagram_json("");
        assert_eq!(json, "{}");
        let json = compile_diagram_json("class A\n");
        assert!(json.contains("\"nodes\""));
        assert!(!json.contains("\"edges\""));
        assert!(!json.contains("\"error\""));
    }
}
