//! Symbol rename and enumeration.
//!
//! Renaming splices every identifier-span occurrence (declaration ids,
//! group ids, relation endpoints) back to front, so only those exact
//! byte ranges change. Occurrences are located through the parsed
//! spans, never by substring search, which keeps identifiers that
//! merely contain the old name as a substring untouched.

use crate::ir::{Document, Item};
use crate::parser::parse_document;
use crate::symbols::resolve;

/// All known identifiers, explicit and implicit, in first-appearance
/// order. When the source does not parse cleanly the parsed portion is
/// supplemented by a line-scanning heuristic so editor completion
/// keeps working mid-keystroke.
pub fn get_symbols(source: &str) -> Vec<String> {
    let output = parse_document(source);
    let diagram = resolve(&output.document);
    let mut symbols = diagram.symbols.names();

    if output.diagnostic.is_some() {
        for candidate in scan_symbols_heuristically(source) {
            if !symbols.contains(&candidate) {
                symbols.push(candidate);
            }
        }
    }

    symbols
}

/// Best-effort symbol scan over raw lines, used only when parsing
/// failed somewhere: looks for `<kind> <ident>` and `group <ident>`
/// shapes.
fn scan_symbols_heuristically(source: &str) -> Vec<String> {
    const KINDS: &[&str] = &[
        "class",
        "interface",
        "enum",
        "struct",
        "record",
        "trait",
        "object",
        "node",
        "rectangle",
        "circle",
        "diamond",
    ];

    let mut symbols: Vec<String> = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        let words: Vec<&str> = trimmed.split_whitespace().collect();
        for (idx, word) in words.iter().enumerate() {
            let is_decl = KINDS.contains(word) || *word == "group";
            if !is_decl || idx + 1 >= words.len() {
                continue;
            }
            let id: String = words[idx + 1]
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
                .collect();
            if !id.is_empty() && !symbols.contains(&id) {
                symbols.push(id);
            }
            break;
        }
    }
    symbols
}

/// Rename every token-boundary occurrence of `old_name` across
/// declarations, group headers, and relation endpoints. Unknown names
/// are a no-op. No collision check is performed: renaming onto an
/// existing identifier merges the two symbols.
pub fn rename_symbol(source: &str, old_name: &str, new_name: &str) -> String {
    let output = parse_document(source);
    let mut spans = Vec::new();
    collect_ident_spans(&output.document, old_name, &mut spans);

    if spans.is_empty() {
        log::warn!("rename_symbol: '{old_name}' not found");
        return source.to_string();
    }

    // Back to front so earlier offsets stay valid.
    spans.sort_by(|a, b| b.0.cmp(&a.0));
    let mut out = source.to_string();
    for (start, end) in spans {
        out.replace_range(start..end, new_name);
    }
    out
}

fn collect_ident_spans(document: &Document, name: &str, spans: &mut Vec<(usize, usize)>) {
    fn walk(items: &[Item], name: &str, spans: &mut Vec<(usize, usize)>) {
        for item in items {
            match item {
                Item::Declaration(declaration) => {
                    if declaration.id.name == name {
                        spans.push((declaration.id.span.start, declaration.id.span.end));
                    }
                }
                Item::Group(group) => {
                    if let Some(id) = &group.id
                        && id.name == name
                    {
                        spans.push((id.span.start, id.span.end));
                    }
                    walk(&group.items, name, spans);
                }
                Item::Relation(relation) => {
                    if relation.from.name == name {
                        spans.push((relation.from.span.start, relation.from.span.end));
                    }
                    if relation.to.name == name {
                        spans.push((relation.to.span.start, relation.to.span.end));
                    }
                }
                Item::Directive(_) | Item::Comment(_) => {}
            }
        }
    }
    walk(&document.items, name, spans);
}
