//! Layered hierarchical layout (the default algorithm).
//!
//! Relations form a directed graph; every entity's layer is its
//! longest-path distance from a root (an entity with no incoming
//! hierarchy edge). Extends/implements arrows point child to parent,
//! so the metadata on the arrow registry decides which endpoint is the
//! layout parent. Within a layer, entities keep declaration order.
//! Entities with a manual `@pos` are pinned and act as obstacles for
//! the automatically placed ones.

use std::collections::HashMap;

use crate::arrows;
use crate::config::LayoutConfig;
use crate::ir::Point;
use crate::layout::{
    Bounds, LayoutResult, accumulate_world, anchor_rects, compute_group_local_bounds, entity_size,
    place_auto_groups_row, post_order_groups,
};
use crate::symbols::{Diagram, EntityId, GroupId};

pub fn layout_hierarchical(diagram: &Diagram, config: &LayoutConfig) -> LayoutResult {
    let mut group_local_pos: HashMap<GroupId, Point> = HashMap::new();
    let mut entity_local_pos: HashMap<EntityId, Point> = HashMap::new();
    let mut group_local_bounds: HashMap<GroupId, Bounds> = HashMap::new();

    group_local_pos.insert(diagram.root, Point::ZERO);

    // Bottom-up: children are sized before their parent packs them.
    for gid in post_order_groups(diagram) {
        if gid != diagram.root {
            let pos = diagram.group(gid).pos.unwrap_or(Point::ZERO);
            group_local_pos.insert(gid, pos);
        }

        place_group_children(
            diagram,
            gid,
            config,
            &mut group_local_pos,
            &mut entity_local_pos,
            &group_local_bounds,
        );

        let bounds = compute_group_local_bounds(
            diagram,
            gid,
            config,
            &group_local_pos,
            &entity_local_pos,
            &group_local_bounds,
        );
        group_local_bounds.insert(gid, bounds);
    }

    accumulate_world(
        diagram,
        config,
        group_local_pos,
        entity_local_pos,
        &group_local_bounds,
    )
}

/// Directed hierarchy edges between direct children of one group,
/// as (parent, child) index pairs into `ids`.
fn hierarchy_edges(diagram: &Diagram, ids: &[EntityId]) -> Vec<(usize, usize)> {
    let index_of: HashMap<EntityId, usize> = ids
        .iter()
        .enumerate()
        .map(|(idx, &eid)| (eid, idx))
        .collect();

    let mut edges = Vec::new();
    for edge in &diagram.edges {
        let (Some(&from), Some(&to)) = (index_of.get(&edge.from), index_of.get(&edge.to)) else {
            continue;
        };
        let Some(entry) = arrows::entry_for_canonical(&edge.arrow) else {
            continue;
        };
        if !entry.is_hierarchy_edge {
            continue;
        }
        let (mut parent, mut child) = (from, to);
        if entry.is_left {
            std::mem::swap(&mut parent, &mut child);
        }
        if entry.hierarchy_reversed {
            std::mem::swap(&mut parent, &mut child);
        }
        if parent != child {
            edges.push((parent, child));
        }
    }
    edges
}

/// Longest-path layer for each entity. Entities with no relations at
/// all share one trailing layer of their own. Relaxation is capped at
/// the entity count so cycles cannot loop forever.
fn assign_layers(ids: &[EntityId], edges: &[(usize, usize)]) -> Vec<usize> {
    let n = ids.len();
    let mut layer = vec![0usize; n];
    let mut connected = vec![false; n];
    for &(parent, child) in edges {
        connected[parent] = true;
        connected[child] = true;
    }

    for _ in 0..n {
        let mut changed = false;
        for &(parent, child) in edges {
            if layer[child] < layer[parent] + 1 {
                layer[child] = layer[parent] + 1;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let deepest = (0..n)
        .filter(|&idx| connected[idx])
        .map(|idx| layer[idx])
        .max();
    if let Some(deepest) = deepest {
        for idx in 0..n {
            if !connected[idx] {
                layer[idx] = deepest + 1;
            }
        }
    }

    layer
}

fn place_group_children(
    diagram: &Diagram,
    gid: GroupId,
    config: &LayoutConfig,
    group_local_pos: &mut HashMap<GroupId, Point>,
    entity_local_pos: &mut HashMap<EntityId, Point>,
    group_local_bounds: &HashMap<GroupId, Bounds>,
) {
    let group = diagram.group(gid);
    let padding = config.group_padding;
    let gap = config.gap;

    // Pin fixed entities first; they become obstacles.
    for &eid in &group.child_entities {
        if let Some(pos) = diagram.entity(eid).pos {
            entity_local_pos.insert(eid, pos);
        }
    }
    let anchors = anchor_rects(diagram, gid, config, group_local_bounds);

    let ids: Vec<EntityId> = group.child_entities.clone();
    let edges = hierarchy_edges(diagram, &ids);
    let layers = assign_layers(&ids, &edges);

    let layer_count = layers.iter().copied().max().map_or(0, |max| max + 1);
    let mut bottom = padding;

    for current_layer in 0..layer_count {
        let y = padding + current_layer as i32 * config.row_spacing;
        let mut x = padding;

        for (idx, &eid) in ids.iter().enumerate() {
            if layers[idx] != current_layer {
                continue;
            }
            let entity = diagram.entity(eid);
            if entity.pos.is_some() {
                continue;
            }
            let size = entity_size(entity, config);

            // Shift right until the candidate clears every anchor.
            loop {
                let candidate = Bounds {
                    x,
                    y,
                    w: size.w,
                    h: size.h,
                };
                let blocking = anchors.iter().find(|anchor| anchor.overlaps(&candidate));
                match blocking {
                    Some(anchor) => x = anchor.right() + gap,
                    None => break,
                }
            }

            entity_local_pos.insert(eid, Point::new(x, y));
            bottom = bottom.max(y + size.h);
            x += size.w + gap;
        }
    }

    for anchor in &anchors {
        bottom = bottom.max(anchor.bottom());
    }

    place_auto_groups_row(
        diagram,
        gid,
        config,
        bottom + gap,
        group_local_pos,
        group_local_bounds,
    );
}
