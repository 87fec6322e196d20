//! Incremental text patcher: pure `(source, ...) -> String` mutations
//! that keep the rest of the file byte-stable.
//!
//! Every operation reparses the source, locates the target through the
//! spans the parser recorded, and splices only the minimal substring.
//! There is no pretty-printer: text the operation does not touch is
//! returned exactly as it came in, comments and odd whitespace
//! included. Unknown targets are no-ops that return the input
//! unchanged. All operations are idempotent under repeated identical
//! calls.

use crate::ir::{BodySpan, Declaration, Document, Group, Item};
use crate::parser::parse_document;

const INDENT: &str = "    ";

/// Sentinel accepted by [`update_class_geometry`] meaning "leave this
/// dimension unchanged".
pub const KEEP_DIMENSION: i32 = -1;

#[derive(Debug)]
struct Patch {
    start: usize,
    end: usize,
    text: String,
}

fn apply_patches(source: &str, mut patches: Vec<Patch>) -> String {
    // Back to front so earlier offsets stay valid.
    patches.sort_by(|a, b| b.start.cmp(&a.start));
    let mut out = source.to_string();
    for patch in patches {
        out.replace_range(patch.start..patch.end, &patch.text);
    }
    out
}

/// End offset of the line containing `byte` (exclusive of the `\n`).
fn line_end(source: &str, byte: usize) -> usize {
    source[byte..]
        .find('\n')
        .map(|idx| byte + idx)
        .unwrap_or(source.len())
}

/// Full range of the line containing `byte`, including the trailing
/// newline when present.
fn full_line_range(source: &str, byte: usize) -> (usize, usize) {
    let start = source[..byte].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let end = line_end(source, byte);
    let end = if end < source.len() { end + 1 } else { end };
    (start, end)
}

/// Leading whitespace of the line containing `byte`.
fn indent_at(source: &str, byte: usize) -> &str {
    let start = source[..byte].rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let line = &source[start..line_end(source, start)];
    let trimmed = line.trim_start();
    &line[..line.len() - trimmed.len()]
}

fn find_declaration<'d>(items: &'d [Item], id: &str) -> Option<&'d Declaration> {
    for item in items {
        match item {
            Item::Declaration(declaration) if declaration.id.name == id => {
                return Some(declaration);
            }
            Item::Group(group) => {
                if let Some(found) = find_declaration(&group.items, id) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

/// Named groups match by id; anonymous groups match by pre-order index
/// counted over all groups.
fn find_group<'d>(
    items: &'d [Item],
    id: Option<&str>,
    target_index: usize,
    counter: &mut usize,
) -> Option<&'d Group> {
    for item in items {
        if let Item::Group(group) = item {
            let is_match = match (id, &group.id) {
                (Some(target), Some(current)) => current.name == target,
                (None, None) => *counter == target_index,
                _ => false,
            };
            if is_match {
                return Some(group);
            }
            *counter += 1;
            if let Some(found) = find_group(&group.items, id, target_index, counter) {
                return Some(found);
            }
        }
    }
    None
}

/// Directives to write into a declaration or group body.
struct DirectiveEdit {
    pos: Option<(i32, i32)>,
    width: Option<i32>,
    height: Option<i32>,
}

/// Build patches that update or insert directives inside a body block,
/// creating the block when the declaration has none.
fn directive_patches(
    source: &str,
    span_start: usize,
    header_end: usize,
    body: Option<BodySpan>,
    existing_pos: Option<crate::ir::PosDirective>,
    existing_width: Option<crate::ir::SizeDirective>,
    existing_height: Option<crate::ir::SizeDirective>,
    edit: &DirectiveEdit,
) -> Vec<Patch> {
    let mut patches = Vec::new();
    let mut inserts: Vec<String> = Vec::new();

    if let Some((x, y)) = edit.pos {
        match existing_pos {
            Some(directive) => patches.push(Patch {
                start: directive.span.start,
                end: directive.span.end,
                text: format!("@pos: ({x}, {y})"),
            }),
            None => inserts.push(format!("@pos: ({x}, {y})")),
        }
    }
    if let Some(width) = edit.width {
        match existing_width {
            Some(directive) => patches.push(Patch {
                start: directive.span.start,
                end: directive.span.end,
                text: format!("@width: {width}"),
            }),
            None => inserts.push(format!("@width: {width}")),
        }
    }
    if let Some(height) = edit.height {
        match existing_height {
            Some(directive) => patches.push(Patch {
                start: directive.span.start,
                end: directive.span.end,
                text: format!("@height: {height}"),
            }),
            None => inserts.push(format!("@height: {height}")),
        }
    }

    if inserts.is_empty() {
        return patches;
    }

    let indent = indent_at(source, span_start).to_string();
    let inner = format!("{indent}{INDENT}");

    match body {
        Some(body) => {
            // New directive lines go after the last existing directive,
            // or right after the `{` line when there is none.
            let mut at = line_end(source, body.open);
            for existing in [
                existing_pos.map(|directive| directive.span),
                existing_width.map(|directive| directive.span),
                existing_height.map(|directive| directive.span),
            ]
            .into_iter()
            .flatten()
            {
                at = at.max(line_end(source, existing.start));
            }
            let mut text = String::new();
            for line in &inserts {
                text.push_str(&format!("\n{inner}{line}"));
            }
            patches.push(Patch {
                start: at,
                end: at,
                text,
            });
        }
        None => {
            // Grow a block under the single-line header.
            let at = line_end(source, header_end.saturating_sub(1).max(span_start));
            let mut text = format!("\n{indent}{{");
            for line in &inserts {
                text.push_str(&format!("\n{inner}{line}"));
            }
            text.push_str(&format!("\n{indent}}}"));
            patches.push(Patch {
                start: at,
                end: at,
                text,
            });
        }
    }

    patches
}

/// Update an entity's position, creating the `@pos` directive (and a
/// body block) as needed.
pub fn update_class_pos(source: &str, class_id: &str, x: i32, y: i32) -> String {
    update_class_geometry(source, class_id, x, y, KEEP_DIMENSION, KEEP_DIMENSION)
}

/// Update an entity's position and, unless passed the −1 sentinel, its
/// width/height. Pure moves never spuriously add size directives.
pub fn update_class_geometry(
    source: &str,
    class_id: &str,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> String {
    let output = parse_document(source);
    let Some(declaration) = find_declaration(&output.document.items, class_id) else {
        log::warn!("update_class_geometry: '{class_id}' not found");
        return source.to_string();
    };

    let edit = DirectiveEdit {
        pos: Some((x, y)),
        width: (width >= 0).then_some(width),
        height: (height >= 0).then_some(height),
    };
    let patches = directive_patches(
        source,
        declaration.span.start,
        declaration.span.end,
        declaration.body,
        declaration.pos,
        declaration.width,
        declaration.height,
        &edit,
    );
    apply_patches(source, patches)
}

/// Update a group's position. Named groups are addressed by id;
/// anonymous groups by pre-order index with an empty id.
pub fn update_group_pos(
    source: &str,
    group_id: &str,
    group_index: usize,
    x: i32,
    y: i32,
) -> String {
    let output = parse_document(source);
    let id = if group_id.is_empty() {
        None
    } else {
        Some(group_id)
    };
    let mut counter = 0usize;
    let Some(group) = find_group(&output.document.items, id, group_index, &mut counter) else {
        log::warn!("update_group_pos: group not found (id={id:?}, index={group_index})");
        return source.to_string();
    };

    let edit = DirectiveEdit {
        pos: Some((x, y)),
        width: None,
        height: None,
    };
    let patches = directive_patches(
        source,
        group.span.start,
        group.span.end,
        Some(group.body),
        group.pos,
        None,
        None,
        &edit,
    );
    apply_patches(source, patches)
}

/// Materialize a declaration for an id known only as a relation
/// endpoint. Appended at the end of the document; existing content is
/// untouched. No-op when the id is already declared.
pub fn insert_implicit_node(source: &str, node_id: &str, x: i32, y: i32) -> String {
    let output = parse_document(source);
    if find_declaration(&output.document.items, node_id).is_some() {
        log::warn!("insert_implicit_node: '{node_id}' is already declared");
        return source.to_string();
    }

    let mut out = source.to_string();
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!(
        "node {node_id}\n{{\n{INDENT}@pos: ({x}, {y})\n}}\n"
    ));
    out
}

/// Patch that removes a declaration's `@pos` line, collapsing the body
/// block when the directive was its only content.
fn remove_pos_patch(source: &str, declaration: &Declaration) -> Option<Patch> {
    let pos = declaration.pos?;
    let (pos_line_start, pos_line_end) = full_line_range(source, pos.span.start);

    let bare = declaration.members.is_empty()
        && declaration.width.is_none()
        && declaration.height.is_none();
    if bare && let Some(body) = declaration.body {
        let interior_start = body.open + 1;
        let interior_end = body.close.min(source.len());
        let before = &source[interior_start..pos_line_start.max(interior_start)];
        let after = &source[pos_line_end.min(interior_end)..interior_end];
        if before.trim().is_empty() && after.trim().is_empty() {
            // The directive was the block's only content: cut from the
            // last non-whitespace before '{' through '}'.
            let prefix_end = source[..body.open].trim_end().len();
            let end = (body.close + 1).min(source.len());
            return Some(Patch {
                start: prefix_end,
                end,
                text: String::new(),
            });
        }
    }

    Some(Patch {
        start: pos_line_start,
        end: pos_line_end,
        text: String::new(),
    })
}

/// Remove an entity's `@pos`, unlocking it for automatic layout.
pub fn remove_class_pos(source: &str, class_id: &str) -> String {
    let output = parse_document(source);
    let Some(declaration) = find_declaration(&output.document.items, class_id) else {
        log::warn!("remove_class_pos: '{class_id}' not found");
        return source.to_string();
    };
    match remove_pos_patch(source, declaration) {
        Some(patch) => apply_patches(source, vec![patch]),
        None => source.to_string(),
    }
}

/// Remove every `@pos` from all declarations and groups.
pub fn remove_all_pos(source: &str) -> String {
    let output = parse_document(source);
    let mut patches = Vec::new();
    collect_pos_removals(source, &output.document.items, &mut patches);
    apply_patches(source, patches)
}

fn collect_pos_removals(source: &str, items: &[Item], patches: &mut Vec<Patch>) {
    for item in items {
        match item {
            Item::Declaration(declaration) => {
                if let Some(patch) = remove_pos_patch(source, declaration) {
                    patches.push(patch);
                }
            }
            Item::Group(group) => {
                if let Some(pos) = group.pos {
                    let (start, end) = full_line_range(source, pos.span.start);
                    patches.push(Patch {
                        start,
                        end,
                        text: String::new(),
                    });
                }
                collect_pos_removals(source, &group.items, patches);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_strict;

    /// Lines of `b` that differ from `a`, by line number.
    fn changed_lines(a: &str, b: &str) -> Vec<usize> {
        let a_lines: Vec<&str> = a.lines().collect();
        let b_lines: Vec<&str> = b.lines().collect();
        let mut changed = Vec::new();
        for idx in 0..a_lines.len().max(b_lines.len()) {
            if a_lines.get(idx) != b_lines.get(idx) {
                changed.push(idx + 1);
            }
        }
        changed
    }

    #[test]
    fn update_pos_replaces_in_place() {
        let source = "class Foo {\n    @pos: (10, 20)\n}\n";
        let updated = update_class_pos(source, "Foo", 100, 200);
        assert_eq!(updated, "class Foo {\n    @pos: (100, 200)\n}\n");
    }

    #[test]
    fn update_pos_creates_block_for_single_line_declaration() {
        let source = "class Foo\nclass Bar\n";
        let updated = update_class_pos(source, "Foo", 5, 6);
        assert_eq!(updated, "class Foo\n{\n    @pos: (5, 6)\n}\nclass Bar\n");
        // The result must reparse to the same declaration with a pos.
        let doc = parse_strict(&updated).unwrap();
        let Item::Declaration(decl) = &doc.items[0] else {
            panic!("expected declaration");
        };
        assert_eq!(decl.pos.map(|p| (p.x, p.y)), Some((5, 6)));
    }

    #[test]
    fn update_pos_inserts_into_existing_block() {
        let source = "class Foo {\n    +field: int\n}\n";
        let updated = update_class_pos(source, "Foo", 1, 2);
        assert_eq!(updated, "class Foo {\n    @pos: (1, 2)\n    +field: int\n}\n");
    }

    #[test]
    fn update_pos_is_idempotent() {
        let source = "class Foo\n";
        let once = update_class_pos(source, "Foo", 10, 20);
        let twice = update_class_pos(&once, "Foo", 10, 20);
        assert_eq!(once, twice);
    }

    #[test]
    fn update_pos_unknown_id_is_noop() {
        let source = "class Foo\n";
        assert_eq!(update_class_pos(source, "Bar", 1, 2), source);
    }

    #[test]
    fn update_pos_touches_only_target_lines() {
        let source = "%% header\nclass A\nclass B {\n    @pos: (0, 0)\n}\nA --> B\n";
        let updated = update_class_pos(source, "B", 9, 9);
        assert_eq!(changed_lines(source, &updated), vec![4]);
    }

    #[test]
    fn update_pos_preserves_unrelated_formatting() {
        let source = "%%   odd   spacing\nclass A\n\n\nclass B\nA-->B : label\n";
        let updated = update_class_pos(source, "A", 3, 4);
        assert!(updated.contains("%%   odd   spacing"));
        assert!(updated.contains("\n\n\n"));
        assert!(updated.contains("A-->B : label"));
    }

    #[test]
    fn geometry_sentinel_leaves_dimensions_alone() {
        let source = "class Foo\n";
        let updated = update_class_geometry(source, "Foo", 1, 2, KEEP_DIMENSION, KEEP_DIMENSION);
        assert!(!updated.contains("@width"));
        assert!(!updated.contains("@height"));
        assert!(updated.contains("@pos: (1, 2)"));
    }

    #[test]
    fn geometry_writes_all_three_directives() {
        let source = "class Foo\n";
        let updated = update_class_geometry(source, "Foo", 1, 2, 300, 150);
        assert_eq!(
            updated,
            "class Foo\n{\n    @pos: (1, 2)\n    @width: 300\n    @height: 150\n}\n"
        );
    }

    #[test]
    fn geometry_updates_existing_and_inserts_missing() {
        let source = "class Foo {\n    @pos: (0, 0)\n    +x\n}\n";
        let updated = update_class_geometry(source, "Foo", 7, 8, 250, KEEP_DIMENSION);
        assert_eq!(
            updated,
            "class Foo {\n    @pos: (7, 8)\n    @width: 250\n    +x\n}\n"
        );
    }

    #[test]
    fn geometry_is_idempotent() {
        let source = "class Foo {\n    +m()\n}\n";
        let once = update_class_geometry(source, "Foo", 1, 2, 300, 120);
        let twice = update_class_geometry(&once, "Foo", 1, 2, 300, 120);
        assert_eq!(once, twice);
    }

    #[test]
    fn group_pos_named() {
        let source = "group Backend {\n    class Api\n}\n";
        let updated = update_group_pos(source, "Backend", 0, 30, 40);
        assert_eq!(
            updated,
            "group Backend {\n    @pos: (30, 40)\n    class Api\n}\n"
        );
    }

    #[test]
    fn group_pos_anonymous_by_index() {
        let source = "group {\n    class A\n}\ngroup {\n    class B\n}\n";
        let updated = update_group_pos(source, "", 1, 9, 9);
        assert!(!updated.split("class A").next().unwrap().contains("@pos"));
        assert!(updated.contains("group {\n    @pos: (9, 9)\n    class B\n}"));
    }

    #[test]
    fn group_pos_replaces_existing() {
        let source = "group G {\n    @pos: (1, 1)\n}\n";
        let updated = update_group_pos(source, "G", 0, 2, 2);
        assert_eq!(updated, "group G {\n    @pos: (2, 2)\n}\n");
    }

    #[test]
    fn insert_implicit_node_appends_declaration() {
        let source = "A --> B\n";
        let updated = insert_implicit_node(source, "A", 10, 10);
        assert_eq!(updated, "A --> B\nnode A\n{\n    @pos: (10, 10)\n}\n");
        // It is explicit on the next parse.
        let doc = parse_strict(&updated).unwrap();
        let diagram = crate::symbols::resolve(&doc);
        assert!(diagram.entity_by_name("A").unwrap().explicit);
        assert_eq!(diagram.implicit, vec!["B".to_string()]);
    }

    #[test]
    fn insert_implicit_node_adds_missing_trailing_newline() {
        let source = "A --> B";
        let updated = insert_implicit_node(source, "B", 0, 0);
        assert!(updated.starts_with("A --> B\nnode B\n"));
    }

    #[test]
    fn insert_implicit_node_noop_when_declared() {
        let source = "class A\nA --> B\n";
        assert_eq!(insert_implicit_node(source, "A", 1, 1), source);
    }

    #[test]
    fn remove_pos_collapses_empty_block() {
        let source = "class Foo {\n    @pos: (1, 2)\n}\nclass Bar\n";
        let updated = remove_class_pos(source, "Foo");
        assert_eq!(updated, "class Foo\nclass Bar\n");
    }

    #[test]
    fn remove_pos_keeps_block_with_members() {
        let source = "class Foo {\n    @pos: (1, 2)\n    +field\n}\n";
        let updated = remove_class_pos(source, "Foo");
        assert_eq!(updated, "class Foo {\n    +field\n}\n");
    }

    #[test]
    fn remove_pos_keeps_block_with_size_directives() {
        let source = "class Foo {\n    @pos: (1, 2)\n    @width: 300\n}\n";
        let updated = remove_class_pos(source, "Foo");
        assert_eq!(updated, "class Foo {\n    @width: 300\n}\n");
    }

    #[test]
    fn remove_pos_without_pos_is_noop() {
        let source = "class Foo {\n    +field\n}\n";
        assert_eq!(remove_class_pos(source, "Foo"), source);
    }

    #[test]
    fn remove_all_pos_strips_everything() {
        let source = "class A {\n    @pos: (1, 1)\n}\ngroup G {\n    @pos: (2, 2)\n    class B {\n        @pos: (3, 3)\n        +m\n    }\n}\n";
        let updated = remove_all_pos(source);
        assert!(!updated.contains("@pos"));
        // Structure survives.
        let doc = parse_strict(&updated).unwrap();
        let diagram = crate::symbols::resolve(&doc);
        assert!(diagram.entity_by_name("A").is_some());
        assert!(diagram.entity_by_name("B").is_some());
        assert_eq!(diagram.entity_by_name("B").unwrap().body_lines, vec!["+m"]);
    }

    #[test]
    fn remove_all_pos_is_idempotent() {
        let source = "class A {\n    @pos: (1, 1)\n}\n";
        let once = remove_all_pos(source);
        let twice = remove_all_pos(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn update_preserves_trailing_comment_on_directive_line() {
        let source = "class Foo {\n    @pos: (1, 2) %% pinned by hand\n}\n";
        let updated = update_class_pos(source, "Foo", 3, 4);
        assert_eq!(updated, "class Foo {\n    @pos: (3, 4) %% pinned by hand\n}\n");
    }

    #[test]
    fn brace_on_next_line_update_inserts_after_brace() {
        let source = "class Foo\n{\n    +field\n}\n";
        let updated = update_class_pos(source, "Foo", 1, 1);
        assert_eq!(updated, "class Foo\n{\n    @pos: (1, 1)\n    +field\n}\n");
    }
}
