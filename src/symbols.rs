//! Symbol resolution: flattens the parsed document into an indexed
//! diagram model and builds the flat identifier namespace.
//!
//! Identifiers are globally unique regardless of group nesting; a
//! relation may reference an id declared anywhere. Endpoints that are
//! never declared are materialized as implicit node-kind entities in
//! first-use order. Duplicate declarations keep the first occurrence
//! and surface a notice for the rest.

use std::collections::HashMap;

use serde::Serialize;

use crate::diagnostics::Notice;
use crate::ir::{Declaration, Document, Group, Item, LayoutAlgorithm, NodeKind, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GroupId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntityId(pub usize);

/// A flattened entity: either an explicit declaration or an implicit
/// relation endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub eid: EntityId,
    pub id: String,
    pub kind: NodeKind,
    pub keyword: String,
    pub modifiers: Vec<String>,
    pub label: Option<String>,
    /// Body lines as written (visibility marker included).
    pub body_lines: Vec<String>,
    pub group: GroupId,
    /// Local position from a manual `@pos`, relative to the parent group.
    pub pos: Option<Point>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub explicit: bool,
    /// Stable traversal order index.
    pub order: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupNode {
    pub gid: GroupId,
    /// None for the synthetic root and anonymous groups.
    pub id: Option<String>,
    pub parent: Option<GroupId>,
    pub pos: Option<Point>,
    pub child_groups: Vec<GroupId>,
    pub child_entities: Vec<EntityId>,
    pub order: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEdge {
    pub from: EntityId,
    pub to: EntityId,
    /// Canonical arrow name from the registry.
    pub arrow: String,
    pub label: Option<String>,
}

/// One namespace entry. `group_path` lists the names of enclosing
/// named groups, outermost first.
#[derive(Debug, Clone, Serialize)]
pub struct SymbolEntry {
    pub name: String,
    pub explicit: bool,
    pub is_group: bool,
    pub group_path: Vec<String>,
    pub entity: Option<EntityId>,
}

/// Flat identifier namespace in first-appearance order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
    #[serde(skip)]
    by_name: HashMap<String, usize>,
}

impl SymbolTable {
    fn insert(&mut self, entry: SymbolEntry) {
        if self.by_name.contains_key(&entry.name) {
            return;
        }
        self.by_name.insert(entry.name.clone(), self.entries.len());
        self.entries.push(entry);
    }

    pub fn get(&self, name: &str) -> Option<&SymbolEntry> {
        self.by_name.get(name).map(|&idx| &self.entries[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn entries(&self) -> &[SymbolEntry] {
        &self.entries
    }
}

/// The resolved, layout-ready diagram model. Groups form a tree rooted
/// at a synthetic root group with index 0; entities and edges are flat
/// vectors in deterministic traversal order.
#[derive(Debug, Clone, Serialize)]
pub struct Diagram {
    pub root: GroupId,
    pub groups: Vec<GroupNode>,
    pub entities: Vec<Entity>,
    pub edges: Vec<ResolvedEdge>,
    /// Ids used in relations but never declared, in first-use order.
    pub implicit: Vec<String>,
    pub notices: Vec<Notice>,
    pub symbols: SymbolTable,
    pub layout: LayoutAlgorithm,
}

impl Diagram {
    pub fn entity(&self, eid: EntityId) -> &Entity {
        &self.entities[eid.0]
    }

    pub fn group(&self, gid: GroupId) -> &GroupNode {
        &self.groups[gid.0]
    }

    pub fn entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.symbols
            .get(name)
            .and_then(|entry| entry.entity)
            .map(|eid| self.entity(eid))
    }
}

struct PendingEdge {
    from: String,
    to: String,
    arrow: String,
    label: Option<String>,
}

struct Resolver {
    groups: Vec<GroupNode>,
    entities: Vec<Entity>,
    entity_by_name: HashMap<String, EntityId>,
    pending_edges: Vec<PendingEdge>,
    notices: Vec<Notice>,
    symbols: SymbolTable,
    next_order: usize,
}

/// Resolve a parsed document into the flattened diagram model.
pub fn resolve(document: &Document) -> Diagram {
    let mut resolver = Resolver::new();
    let root = resolver.new_group(None, None, None);
    resolver.walk_items(&document.items, root, &mut Vec::new());
    resolver.finish(document.layout_algorithm())
}

impl Resolver {
    fn new() -> Self {
        Self {
            groups: Vec::new(),
            entities: Vec::new(),
            entity_by_name: HashMap::new(),
            pending_edges: Vec::new(),
            notices: Vec::new(),
            symbols: SymbolTable::default(),
            next_order: 0,
        }
    }

    fn alloc_order(&mut self) -> usize {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    fn new_group(
        &mut self,
        id: Option<String>,
        parent: Option<GroupId>,
        pos: Option<Point>,
    ) -> GroupId {
        let gid = GroupId(self.groups.len());
        let order = self.alloc_order();
        self.groups.push(GroupNode {
            gid,
            id,
            parent,
            pos,
            child_groups: Vec::new(),
            child_entities: Vec::new(),
            order,
        });
        gid
    }

    fn walk_items(&mut self, items: &[Item], parent: GroupId, path: &mut Vec<String>) {
        for item in items {
            match item {
                Item::Declaration(declaration) => self.add_declaration(declaration, parent, path),
                Item::Group(group) => self.add_group(group, parent, path),
                Item::Relation(relation) => self.pending_edges.push(PendingEdge {
                    from: relation.from.name.clone(),
                    to: relation.to.name.clone(),
                    arrow: relation.arrow.clone(),
                    label: relation.label.clone(),
                }),
                Item::Directive(_) | Item::Comment(_) => {}
            }
        }
    }

    fn add_declaration(&mut self, declaration: &Declaration, parent: GroupId, path: &[String]) {
        if self.entity_by_name.contains_key(&declaration.id.name) {
            log::warn!("duplicate declaration of '{}'", declaration.id.name);
            self.notices.push(Notice::duplicate(&declaration.id.name));
            return;
        }

        let eid = EntityId(self.entities.len());
        let order = self.alloc_order();
        self.entities.push(Entity {
            eid,
            id: declaration.id.name.clone(),
            kind: declaration.kind,
            keyword: declaration.keyword.clone(),
            modifiers: declaration.modifiers.clone(),
            label: declaration.label.clone(),
            body_lines: declaration.members.iter().map(|member| member.raw()).collect(),
            group: parent,
            pos: declaration.pos.map(|pos| Point::new(pos.x, pos.y)),
            width: declaration.width.map(|directive| directive.value),
            height: declaration.height.map(|directive| directive.value),
            explicit: true,
            order,
        });
        self.entity_by_name.insert(declaration.id.name.clone(), eid);
        self.groups[parent.0].child_entities.push(eid);
        self.symbols.insert(SymbolEntry {
            name: declaration.id.name.clone(),
            explicit: true,
            is_group: false,
            group_path: path.to_vec(),
            entity: Some(eid),
        });
    }

    fn add_group(&mut self, group: &Group, parent: GroupId, path: &mut Vec<String>) {
        let name = group.id.as_ref().map(|id| id.name.clone());
        let gid = self.new_group(
            name.clone(),
            Some(parent),
            group.pos.map(|pos| Point::new(pos.x, pos.y)),
        );
        self.groups[parent.0].child_groups.push(gid);

        if let Some(name) = &name {
            self.symbols.insert(SymbolEntry {
                name: name.clone(),
                explicit: true,
                is_group: true,
                group_path: path.to_vec(),
                entity: None,
            });
            path.push(name.clone());
        }
        self.walk_items(&group.items, gid, path);
        if name.is_some() {
            path.pop();
        }
    }

    fn finish(mut self, layout: LayoutAlgorithm) -> Diagram {
        let mut implicit = Vec::new();

        // Materialize endpoints that were never declared.
        for idx in 0..self.pending_edges.len() {
            for name in [
                self.pending_edges[idx].from.clone(),
                self.pending_edges[idx].to.clone(),
            ] {
                if self.entity_by_name.contains_key(&name) {
                    continue;
                }
                let eid = EntityId(self.entities.len());
                let order = self.alloc_order();
                self.entities.push(Entity {
                    eid,
                    id: name.clone(),
                    kind: NodeKind::Node,
                    keyword: "node".to_string(),
                    modifiers: Vec::new(),
                    label: None,
                    body_lines: Vec::new(),
                    group: GroupId(0),
                    pos: None,
                    width: None,
                    height: None,
                    explicit: false,
                    order,
                });
                self.entity_by_name.insert(name.clone(), eid);
                self.groups[0].child_entities.push(eid);
                self.symbols.insert(SymbolEntry {
                    name: name.clone(),
                    explicit: false,
                    is_group: false,
                    group_path: Vec::new(),
                    entity: Some(eid),
                });
                self.notices.push(Notice::implicit(&name));
                implicit.push(name);
            }
        }

        let edges = self
            .pending_edges
            .iter()
            .map(|pending| ResolvedEdge {
                from: self.entity_by_name[&pending.from],
                to: self.entity_by_name[&pending.to],
                arrow: pending.arrow.clone(),
                label: pending.label.clone(),
            })
            .collect();

        Diagram {
            root: GroupId(0),
            groups: self.groups,
            entities: self.entities,
            edges,
            implicit,
            notices: self.notices,
            symbols: self.symbols,
            layout,
        }
    }
}
