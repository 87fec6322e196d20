//! Row-major grid layout.
//!
//! Entities fill fixed-size cells left to right, top to bottom,
//! wrapping at a near-square column count derived from the entity
//! count. Edge relationships are ignored entirely. Slots whose cell
//! would collide with a fixed anchor are skipped, and manual
//! `@pos`/`@width`/`@height` overrides still apply per entity.

use std::collections::HashMap;

use crate::config::LayoutConfig;
use crate::ir::Point;
use crate::layout::{
    Bounds, LayoutResult, accumulate_world, anchor_rects, compute_group_local_bounds, entity_size,
    place_auto_groups_row, post_order_groups,
};
use crate::symbols::{Diagram, EntityId, GroupId};

pub fn layout_grid(diagram: &Diagram, config: &LayoutConfig) -> LayoutResult {
    let mut group_local_pos: HashMap<GroupId, Point> = HashMap::new();
    let mut entity_local_pos: HashMap<EntityId, Point> = HashMap::new();
    let mut group_local_bounds: HashMap<GroupId, Bounds> = HashMap::new();

    group_local_pos.insert(diagram.root, Point::ZERO);

    for gid in post_order_groups(diagram) {
        if gid != diagram.root {
            let pos = diagram.group(gid).pos.unwrap_or(Point::ZERO);
            group_local_pos.insert(gid, pos);
        }

        place_group_children_grid(
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

/// Near-square column count for `n` entities.
fn column_count(n: usize) -> usize {
    if n == 0 {
        return 1;
    }
    (n as f64).sqrt().ceil() as usize
}

fn place_group_children_grid(
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
    let cell_w = config.class_size.w + gap;
    let cell_h = config.class_size.h + gap;

    for &eid in &group.child_entities {
        if let Some(pos) = diagram.entity(eid).pos {
            entity_local_pos.insert(eid, pos);
        }
    }
    let anchors = anchor_rects(diagram, gid, config, group_local_bounds);

    let columns = column_count(group.child_entities.len());
    let mut slot = 0usize;
    let mut bottom = padding;

    for &eid in &group.child_entities {
        let entity = diagram.entity(eid);
        if entity.pos.is_some() {
            continue;
        }
        let size = entity_size(entity, config);

        // Advance past any slot whose cell is consumed by an anchor.
        let pos = loop {
            let col = slot % columns;
            let row = slot / columns;
            let candidate = Bounds {
                x: padding + col as i32 * cell_w,
                y: padding + row as i32 * cell_h,
                w: size.w,
                h: size.h,
            };
            slot += 1;
            if !anchors.iter().any(|anchor| anchor.overlaps(&candidate)) {
                break candidate;
            }
        };

        entity_local_pos.insert(eid, Point::new(pos.x, pos.y));
        bottom = bottom.max(pos.bottom());
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
