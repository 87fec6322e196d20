//! The arrow registry: the single source of truth for relation-operator
//! metadata. Arrows are defined once in their canonical right-pointing
//! (or non-directional) form; left-pointing mirrors are generated by
//! reversing the token. The registry is built once, sorted longest
//! token first so the parser can tokenize overlapping operators with a
//! simple longest-match scan, and exported verbatim to hosts for
//! autocomplete and legend UI.

use once_cell::sync::Lazy;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadStyle {
    /// Plain line end.
    None,
    /// Simple arrowhead.
    Arrow,
    /// Hollow triangle (inheritance/realization).
    Triangle,
    /// Filled diamond (composition).
    DiamondFilled,
    /// Hollow diamond (aggregation).
    DiamondEmpty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowDirection {
    Right,
    Left,
    None,
}

/// Base definition of an arrow family, written in canonical form.
#[derive(Debug, Clone)]
struct ArrowDefinition {
    token: &'static str,
    name: &'static str,
    label: &'static str,
    detail: &'static str,
    line_style: LineStyle,
    head_style: HeadStyle,
    tail_style: HeadStyle,
    direction: ArrowDirection,
    /// Does this arrow contribute an edge to the hierarchical layering?
    is_hierarchy_edge: bool,
    /// If true the "to" end is the parent (extends/implements point
    /// child to parent).
    hierarchy_reversed: bool,
}

const ARROW_DEFINITIONS: &[ArrowDefinition] = &[
    ArrowDefinition {
        token: "-->",
        name: "assoc",
        label: "association",
        detail: "Association arrow",
        line_style: LineStyle::Solid,
        head_style: HeadStyle::Arrow,
        tail_style: HeadStyle::None,
        direction: ArrowDirection::Right,
        is_hierarchy_edge: true,
        hierarchy_reversed: false,
    },
    ArrowDefinition {
        token: "->",
        name: "sassoc",
        label: "short association",
        detail: "Short association arrow",
        line_style: LineStyle::Solid,
        head_style: HeadStyle::Arrow,
        tail_style: HeadStyle::None,
        direction: ArrowDirection::Right,
        is_hierarchy_edge: true,
        hierarchy_reversed: false,
    },
    ArrowDefinition {
        token: "--|>",
        name: "extends",
        label: "inheritance",
        detail: "Inheritance/extends arrow",
        line_style: LineStyle::Solid,
        head_style: HeadStyle::Triangle,
        tail_style: HeadStyle::None,
        direction: ArrowDirection::Right,
        is_hierarchy_edge: true,
        hierarchy_reversed: true,
    },
    ArrowDefinition {
        token: "..|>",
        name: "implements",
        label: "realization",
        detail: "Implements/realizes arrow",
        line_style: LineStyle::Dashed,
        head_style: HeadStyle::Triangle,
        tail_style: HeadStyle::None,
        direction: ArrowDirection::Right,
        is_hierarchy_edge: true,
        hierarchy_reversed: true,
    },
    ArrowDefinition {
        token: "..>",
        name: "dep",
        label: "dependency",
        detail: "Dependency arrow",
        line_style: LineStyle::Dashed,
        head_style: HeadStyle::Arrow,
        tail_style: HeadStyle::None,
        direction: ArrowDirection::Right,
        is_hierarchy_edge: true,
        hierarchy_reversed: false,
    },
    ArrowDefinition {
        token: "*--",
        name: "compose",
        label: "composition",
        detail: "Composition (strong ownership); diamond at the owning end",
        line_style: LineStyle::Solid,
        head_style: HeadStyle::None,
        tail_style: HeadStyle::DiamondFilled,
        direction: ArrowDirection::Right,
        is_hierarchy_edge: true,
        hierarchy_reversed: false,
    },
    ArrowDefinition {
        token: "o--",
        name: "aggregate",
        label: "aggregation",
        detail: "Aggregation (weak ownership); diamond at the owning end",
        line_style: LineStyle::Solid,
        head_style: HeadStyle::None,
        tail_style: HeadStyle::DiamondEmpty,
        direction: ArrowDirection::Right,
        is_hierarchy_edge: true,
        hierarchy_reversed: false,
    },
    ArrowDefinition {
        token: "---",
        name: "line",
        label: "plain line",
        detail: "Simple line (no direction)",
        line_style: LineStyle::Solid,
        head_style: HeadStyle::None,
        tail_style: HeadStyle::None,
        direction: ArrowDirection::None,
        is_hierarchy_edge: false,
        hierarchy_reversed: false,
    },
    ArrowDefinition {
        token: "..",
        name: "dotted",
        label: "dotted line",
        detail: "Dotted line (no direction)",
        line_style: LineStyle::Dashed,
        head_style: HeadStyle::None,
        tail_style: HeadStyle::None,
        direction: ArrowDirection::None,
        is_hierarchy_edge: false,
        hierarchy_reversed: false,
    },
];

/// A registry entry with the direction resolved. Left variants swap
/// the head/tail markers so the marker stays on the same visual end.
#[derive(Debug, Clone, Serialize)]
pub struct ArrowEntry {
    /// Token string as written in source (e.g. `-->`, `<|--`).
    pub token: String,
    /// Canonical direction-suffixed name (e.g. `assoc_right`); bare
    /// for non-directional arrows.
    pub canonical_name: String,
    pub name: &'static str,
    pub label: &'static str,
    pub detail: &'static str,
    pub line_style: LineStyle,
    pub head_style: HeadStyle,
    pub tail_style: HeadStyle,
    pub direction: ArrowDirection,
    pub is_left: bool,
    #[serde(skip)]
    pub is_hierarchy_edge: bool,
    #[serde(skip)]
    pub hierarchy_reversed: bool,
}

/// Mirror a directional token: reverse it and flip angle brackets.
/// Returns None when the mirrored spelling equals the original.
fn reverse_token(token: &str) -> Option<String> {
    let reversed: String = token
        .chars()
        .rev()
        .map(|c| match c {
            '>' => '<',
            '<' => '>',
            _ => c,
        })
        .collect();
    if reversed != token { Some(reversed) } else { None }
}

fn build_registry() -> Vec<ArrowEntry> {
    let mut entries = Vec::new();

    for def in ARROW_DEFINITIONS {
        match def.direction {
            ArrowDirection::Right => {
                entries.push(ArrowEntry {
                    token: def.token.to_string(),
                    canonical_name: format!("{}_right", def.name),
                    name: def.name,
                    label: def.label,
                    detail: def.detail,
                    line_style: def.line_style,
                    head_style: def.head_style,
                    tail_style: def.tail_style,
                    direction: ArrowDirection::Right,
                    is_left: false,
                    is_hierarchy_edge: def.is_hierarchy_edge,
                    hierarchy_reversed: def.hierarchy_reversed,
                });

                if let Some(left_token) = reverse_token(def.token) {
                    entries.push(ArrowEntry {
                        token: left_token,
                        canonical_name: format!("{}_left", def.name),
                        name: def.name,
                        label: def.label,
                        detail: def.detail,
                        line_style: def.line_style,
                        // The marker travels with the pointing end.
                        head_style: def.tail_style,
                        tail_style: def.head_style,
                        direction: ArrowDirection::Left,
                        is_left: true,
                        is_hierarchy_edge: def.is_hierarchy_edge,
                        hierarchy_reversed: def.hierarchy_reversed,
                    });
                }
            }
            ArrowDirection::Left => {
                entries.push(ArrowEntry {
                    token: def.token.to_string(),
                    canonical_name: format!("{}_left", def.name),
                    name: def.name,
                    label: def.label,
                    detail: def.detail,
                    line_style: def.line_style,
                    head_style: def.head_style,
                    tail_style: def.tail_style,
                    direction: ArrowDirection::Left,
                    is_left: true,
                    is_hierarchy_edge: def.is_hierarchy_edge,
                    hierarchy_reversed: def.hierarchy_reversed,
                });
            }
            ArrowDirection::None => {
                entries.push(ArrowEntry {
                    token: def.token.to_string(),
                    canonical_name: def.name.to_string(),
                    name: def.name,
                    label: def.label,
                    detail: def.detail,
                    line_style: def.line_style,
                    head_style: def.head_style,
                    tail_style: def.tail_style,
                    direction: ArrowDirection::None,
                    is_left: false,
                    is_hierarchy_edge: def.is_hierarchy_edge,
                    hierarchy_reversed: def.hierarchy_reversed,
                });
            }
        }
    }

    // Longest token first so the tokenizer never splits a long operator
    // into a shorter prefix. Ties: tokens with structural glyphs (|)
    // before plain ones, then lexicographic for a stable order.
    entries.sort_by(|a, b| {
        b.token
            .len()
            .cmp(&a.token.len())
            .then_with(|| b.token.contains('|').cmp(&a.token.contains('|')))
            .then_with(|| a.token.cmp(&b.token))
    });

    entries
}

static ARROW_REGISTRY: Lazy<Vec<ArrowEntry>> = Lazy::new(build_registry);

/// The complete registry, longest token first.
pub fn arrow_registry() -> &'static [ArrowEntry] {
    &ARROW_REGISTRY
}

/// Canonical name for a source token, if it is a known operator.
pub fn canonical_from_token(token: &str) -> Option<&'static str> {
    ARROW_REGISTRY
        .iter()
        .find(|entry| entry.token == token)
        .map(|entry| entry.canonical_name.as_str())
}

/// Source token for a canonical name.
pub fn token_from_canonical(canonical: &str) -> Option<&'static str> {
    ARROW_REGISTRY
        .iter()
        .find(|entry| entry.canonical_name == canonical)
        .map(|entry| entry.token.as_str())
}

/// Full entry for a canonical name.
pub fn entry_for_canonical(canonical: &str) -> Option<&'static ArrowEntry> {
    ARROW_REGISTRY
        .iter()
        .find(|entry| entry.canonical_name == canonical)
}
