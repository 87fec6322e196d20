//! Layout engine: turns the resolved diagram into bounding boxes for
//! every entity and group.
//!
//! Two algorithms are selectable through the document-level `@layout`
//! directive: layered hierarchical placement (default) and a simple
//! row-major grid. Both run the same two-pass scheme: groups are laid
//! out bottom-up in local coordinates (children first), then a
//! pre-order pass accumulates world positions and bounds. Entities
//! with a manual `@pos` are fixed anchors; automatic placement never
//! overlaps them. Everything iterates in declaration order, so
//! identical input yields byte-identical output.

mod grid;
mod hierarchical;

pub use grid::layout_grid;
pub use hierarchical::layout_hierarchical;

use std::collections::HashMap;

use serde::Serialize;

use crate::config::{LayoutConfig, Size};
use crate::ir::{LayoutAlgorithm, NodeKind, Point};
use crate::symbols::{Diagram, Entity, EntityId, GroupId};

/// Integer rectangle in a given coordinate space.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Bounds {
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub fn overlaps(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    pub fn union(&self, other: &Bounds) -> Bounds {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = self.right().max(other.right());
        let y1 = self.bottom().max(other.bottom());
        Bounds {
            x: x0,
            y: y0,
            w: x1 - x0,
            h: y1 - y0,
        }
    }
}

/// Positions and bounds for every group and entity, local and world.
#[derive(Debug, Clone, Default)]
pub struct LayoutResult {
    pub group_local_pos: HashMap<GroupId, Point>,
    pub entity_local_pos: HashMap<EntityId, Point>,
    pub group_world_pos: HashMap<GroupId, Point>,
    pub entity_world_pos: HashMap<EntityId, Point>,
    pub group_world_bounds: HashMap<GroupId, Bounds>,
    pub entity_world_bounds: HashMap<EntityId, Bounds>,
}

/// Main entry point: dispatches on the document's `@layout` directive.
pub fn layout_diagram(diagram: &Diagram, config: &LayoutConfig) -> LayoutResult {
    match diagram.layout {
        LayoutAlgorithm::Grid => layout_grid(diagram, config),
        LayoutAlgorithm::Hierarchical => layout_hierarchical(diagram, config),
    }
}

/// Size of an entity: manual `@width`/`@height` win, otherwise the size
/// is derived from the label and member lines using the host's
/// monospace metrics, floored at the kind default width.
pub fn entity_size(entity: &Entity, config: &LayoutConfig) -> Size {
    let default = match entity.kind {
        NodeKind::Node => config.node_size,
        NodeKind::Class => config.class_size,
    };

    let width = match entity.width {
        Some(w) => w,
        None => content_width(entity, config).max(default.w),
    };
    let height = match entity.height {
        Some(h) => h,
        None => content_height(entity, config),
    };

    Size {
        w: width,
        h: height,
    }
}

fn content_width(entity: &Entity, config: &LayoutConfig) -> i32 {
    let sizing = &config.node_sizing;
    let title = entity.label.as_deref().unwrap_or(&entity.id);
    let mut chars = title.chars().count();
    for line in &entity.body_lines {
        chars = chars.max(line.chars().count());
    }
    2 * sizing.padding + chars as i32 * sizing.char_width
}

fn content_height(entity: &Entity, config: &LayoutConfig) -> i32 {
    let sizing = &config.node_sizing;
    let mut lines = 0;

    // Stereotype row for modifiers or non-class keywords.
    if !entity.modifiers.is_empty() || entity.keyword != "class" {
        lines += 1;
    }
    lines += 1; // title
    lines += 1; // separator under the title
    lines += entity.body_lines.len();

    2 * sizing.padding + lines as i32 * sizing.line_height
}

/// Local-space container box of a group: union of child boxes plus
/// padding, or the minimum group size when empty.
pub fn compute_group_local_bounds(
    diagram: &Diagram,
    gid: GroupId,
    config: &LayoutConfig,
    group_local_pos: &HashMap<GroupId, Point>,
    entity_local_pos: &HashMap<EntityId, Point>,
    group_local_bounds: &HashMap<GroupId, Bounds>,
) -> Bounds {
    let group = diagram.group(gid);

    let mut any = false;
    let mut bb = Bounds {
        x: 0,
        y: 0,
        w: 0,
        h: 0,
    };

    for &child_gid in &group.child_groups {
        let p = group_local_pos
            .get(&child_gid)
            .copied()
            .unwrap_or(Point::ZERO);
        let lb = group_local_bounds.get(&child_gid).copied().unwrap_or(Bounds {
            x: 0,
            y: 0,
            w: config.min_group_size.w,
            h: config.min_group_size.h,
        });
        let rect = Bounds {
            x: p.x,
            y: p.y,
            w: lb.w,
            h: lb.h,
        };
        bb = if any {
            bb.union(&rect)
        } else {
            any = true;
            rect
        };
    }

    for &eid in &group.child_entities {
        let p = entity_local_pos.get(&eid).copied().unwrap_or(Point::ZERO);
        let size = entity_size(diagram.entity(eid), config);
        let rect = Bounds {
            x: p.x,
            y: p.y,
            w: size.w,
            h: size.h,
        };
        bb = if any {
            bb.union(&rect)
        } else {
            any = true;
            rect
        };
    }

    if !any {
        return Bounds {
            x: 0,
            y: 0,
            w: config.min_group_size.w,
            h: config.min_group_size.h,
        };
    }

    Bounds {
        x: bb.x - config.group_padding,
        y: bb.y - config.group_padding,
        w: bb.w + 2 * config.group_padding,
        h: bb.h + 2 * config.group_padding,
    }
}

/// Post-order group traversal: children before parent.
pub fn post_order_groups(diagram: &Diagram) -> Vec<GroupId> {
    fn dfs(diagram: &Diagram, gid: GroupId, out: &mut Vec<GroupId>) {
        for &child in &diagram.group(gid).child_groups {
            dfs(diagram, child, out);
        }
        out.push(gid);
    }
    let mut out = Vec::new();
    dfs(diagram, diagram.root, &mut out);
    out
}

/// Pre-order group traversal: parent before children.
pub fn pre_order_groups(diagram: &Diagram) -> Vec<GroupId> {
    fn dfs(diagram: &Diagram, gid: GroupId, out: &mut Vec<GroupId>) {
        out.push(gid);
        for &child in &diagram.group(gid).child_groups {
            dfs(diagram, child, out);
        }
    }
    let mut out = Vec::new();
    dfs(diagram, diagram.root, &mut out);
    out
}

/// Second pass shared by both algorithms: accumulate world positions
/// from local ones and derive world bounds.
pub(crate) fn accumulate_world(
    diagram: &Diagram,
    config: &LayoutConfig,
    group_local_pos: HashMap<GroupId, Point>,
    entity_local_pos: HashMap<EntityId, Point>,
    group_local_bounds: &HashMap<GroupId, Bounds>,
) -> LayoutResult {
    let mut group_world_pos: HashMap<GroupId, Point> = HashMap::new();
    let mut entity_world_pos: HashMap<EntityId, Point> = HashMap::new();
    let mut group_world_bounds: HashMap<GroupId, Bounds> = HashMap::new();
    let mut entity_world_bounds: HashMap<EntityId, Bounds> = HashMap::new();

    group_world_pos.insert(diagram.root, Point::ZERO);

    for gid in pre_order_groups(diagram) {
        let local = group_local_pos.get(&gid).copied().unwrap_or(Point::ZERO);
        let world = if gid == diagram.root {
            Point::ZERO
        } else {
            // Non-root groups always have a parent, and pre-order
            // guarantees the parent's world position exists.
            let parent = diagram.group(gid).parent.unwrap_or(diagram.root);
            let pw = group_world_pos.get(&parent).copied().unwrap_or(Point::ZERO);
            Point::new(pw.x + local.x, pw.y + local.y)
        };
        group_world_pos.insert(gid, world);

        let lb = group_local_bounds.get(&gid).copied().unwrap_or(Bounds {
            x: 0,
            y: 0,
            w: config.min_group_size.w,
            h: config.min_group_size.h,
        });
        group_world_bounds.insert(
            gid,
            Bounds {
                x: world.x + lb.x,
                y: world.y + lb.y,
                w: lb.w,
                h: lb.h,
            },
        );

        for &eid in &diagram.group(gid).child_entities {
            let local = entity_local_pos.get(&eid).copied().unwrap_or(Point::ZERO);
            let world_pos = Point::new(world.x + local.x, world.y + local.y);
            entity_world_pos.insert(eid, world_pos);

            let size = entity_size(diagram.entity(eid), config);
            entity_world_bounds.insert(
                eid,
                Bounds {
                    x: world_pos.x,
                    y: world_pos.y,
                    w: size.w,
                    h: size.h,
                },
            );
        }
    }

    LayoutResult {
        group_local_pos,
        entity_local_pos,
        group_world_pos,
        entity_world_pos,
        group_world_bounds,
        entity_world_bounds,
    }
}

/// Anchor rectangles for one group: fixed entities and fixed child
/// groups, in local coordinates.
pub(crate) fn anchor_rects(
    diagram: &Diagram,
    gid: GroupId,
    config: &LayoutConfig,
    group_local_bounds: &HashMap<GroupId, Bounds>,
) -> Vec<Bounds> {
    let group = diagram.group(gid);
    let mut anchors = Vec::new();

    for &eid in &group.child_entities {
        let entity = diagram.entity(eid);
        if let Some(pos) = entity.pos {
            let size = entity_size(entity, config);
            anchors.push(Bounds {
                x: pos.x,
                y: pos.y,
                w: size.w,
                h: size.h,
            });
        }
    }

    for &child_gid in &group.child_groups {
        if let Some(pos) = diagram.group(child_gid).pos {
            let lb = group_local_bounds.get(&child_gid).copied().unwrap_or(Bounds {
                x: 0,
                y: 0,
                w: config.min_group_size.w,
                h: config.min_group_size.h,
            });
            anchors.push(Bounds {
                x: pos.x,
                y: pos.y,
                w: lb.w,
                h: lb.h,
            });
        }
    }

    anchors
}

/// Place unanchored child groups in a wrapping row below `start_y`.
/// Fixed child groups have already been pinned by the caller.
pub(crate) fn place_auto_groups_row(
    diagram: &Diagram,
    gid: GroupId,
    config: &LayoutConfig,
    start_y: i32,
    group_local_pos: &mut HashMap<GroupId, Point>,
    group_local_bounds: &HashMap<GroupId, Bounds>,
) {
    let padding = config.group_padding;
    let gap = config.gap;
    // Wrap the row of sibling groups roughly at four group widths.
    let max_row_w = 4 * (config.min_group_size.w + gap);

    let mut x = padding;
    let mut y = start_y;

    for &child_gid in &diagram.group(gid).child_groups {
        if diagram.group(child_gid).pos.is_some() {
            continue;
        }
        let bounds = group_local_bounds.get(&child_gid).copied().unwrap_or(Bounds {
            x: 0,
            y: 0,
            w: config.min_group_size.w,
            h: config.min_group_size.h,
        });
        if x + bounds.w > max_row_w && x > padding {
            x = padding;
            y += bounds.h + gap;
        }
        group_local_pos.insert(child_gid, Point::new(x, y));
        x += bounds.w + gap;
    }
}
