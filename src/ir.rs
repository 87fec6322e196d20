use serde::Serialize;

/// Source range of a parsed construct: byte offsets plus 1-based
/// line/column positions. Byte offsets drive the text patcher, the
/// line/column pairs drive editor diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    /// Inclusive start byte offset.
    pub start: usize,
    /// Exclusive end byte offset.
    pub end: usize,
    pub start_line: usize,
    pub start_column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Integer point in the local coordinate space of a parent group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// An identifier together with the exact range it occupies in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpannedIdent {
    pub name: String,
    pub span: Span,
}

/// Storage kind of a declaration. The surface keyword (`interface`,
/// `rectangle`, ...) maps onto one of these two and is kept separately
/// in [`Declaration::keyword`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Class,
    Node,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Class => "class",
            NodeKind::Node => "node",
        }
    }
}

/// Layout algorithm selected by a document-level `@layout` directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutAlgorithm {
    #[default]
    Hierarchical,
    Grid,
}

impl LayoutAlgorithm {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "hierarchical" => Some(Self::Hierarchical),
            "grid" => Some(Self::Grid),
            _ => None,
        }
    }
}

/// Byte offsets of a `{ ... }` body block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BodySpan {
    /// Byte offset of the opening `{`.
    pub open: usize,
    /// Byte offset of the closing `}`.
    pub close: usize,
}

/// One body line of a declaration, split into its optional visibility
/// marker (`+`, `-`, `#`) and the remaining text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub visibility: Option<char>,
    pub text: String,
    pub span: Span,
}

impl Member {
    /// The line as written, marker included.
    pub fn raw(&self) -> String {
        match self.visibility {
            Some(marker) => format!("{}{}", marker, self.text),
            None => self.text.clone(),
        }
    }
}

/// A `@pos: (x, y)` directive inside a declaration or group body.
/// The span covers exactly the directive text so it can be replaced
/// in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PosDirective {
    pub x: i32,
    pub y: i32,
    pub span: Span,
}

/// A `@width: <n>` or `@height: <n>` directive inside a declaration body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SizeDirective {
    pub value: i32,
    pub span: Span,
}

/// An entity declaration (`class Foo "Label" { ... }` and friends).
#[derive(Debug, Clone, Serialize)]
pub struct Declaration {
    /// Keyword as written by the user (`class`, `enum`, `diamond`, ...).
    pub keyword: String,
    pub kind: NodeKind,
    /// Leading modifiers plus the keyword-derived one (`abstract`,
    /// `interface`, `circle`, ...).
    pub modifiers: Vec<String>,
    pub id: SpannedIdent,
    pub label: Option<String>,
    pub members: Vec<Member>,
    pub pos: Option<PosDirective>,
    pub width: Option<SizeDirective>,
    pub height: Option<SizeDirective>,
    pub body: Option<BodySpan>,
    pub span: Span,
}

/// A `group [Id] { ... }` container. `id == None` means an anonymous,
/// layout-only group.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub id: Option<SpannedIdent>,
    pub pos: Option<PosDirective>,
    pub items: Vec<Item>,
    pub body: BodySpan,
    pub span: Span,
}

/// A relation line (`A --> B : label`). `arrow` is the canonical,
/// direction-suffixed name resolved through the arrow registry.
#[derive(Debug, Clone, Serialize)]
pub struct Relation {
    pub from: SpannedIdent,
    pub arrow: String,
    pub to: SpannedIdent,
    pub label: Option<String>,
    pub span: Span,
}

/// A free-standing `@key: value` document directive.
#[derive(Debug, Clone, Serialize)]
pub struct Directive {
    pub key: String,
    pub value: String,
    pub span: Span,
}

/// A comment or blank line, kept only so spans remain dense; it never
/// affects the diagram.
#[derive(Debug, Clone, Serialize)]
pub struct Comment {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Serialize)]
pub enum Item {
    Declaration(Declaration),
    Group(Group),
    Relation(Relation),
    Directive(Directive),
    Comment(Comment),
}

/// A parsed source file: the ordered list of top-level items.
/// Rebuilt from scratch on every parse call; nothing is retained
/// between calls.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Document {
    pub items: Vec<Item>,
}

impl Document {
    /// Layout algorithm selected by the first `@layout` directive,
    /// defaulting to hierarchical.
    pub fn layout_algorithm(&self) -> LayoutAlgorithm {
        for item in &self.items {
            if let Item::Directive(directive) = item
                && directive.key == "layout"
                && let Some(algorithm) = LayoutAlgorithm::from_token(directive.value.trim())
            {
                return algorithm;
            }
        }
        LayoutAlgorithm::default()
    }
}
