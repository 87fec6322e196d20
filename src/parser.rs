//! Line-oriented parser for the umlflow DSL.
//!
//! The grammar is deliberately line-based: every statement starts and
//! ends on line boundaries, `{` may trail a header or sit alone on the
//! next line, and `%%` starts a comment that runs to end of line.
//! Parsing is best-effort: a malformed line produces a positioned
//! diagnostic and is skipped, so one bad line never blanks the whole
//! diagram. Every construct records byte and line/column spans; the
//! text patcher and rename rely on identifier spans being exact.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::arrows::{self, ArrowEntry};
use crate::diagnostics::Diagnostic;
use crate::ir::{
    BodySpan, Comment, Declaration, Directive, Document, Group, Item, Member, NodeKind,
    PosDirective, Relation, SizeDirective, Span, SpannedIdent,
};

/// Keywords that declare class-kind entities and add themselves as a
/// modifier.
pub const CLASS_KEYWORDS: &[&str] = &["interface", "enum", "struct", "record", "trait", "object"];

/// Keywords that declare node-kind entities (shapes) and add themselves
/// as a modifier.
pub const NODE_KEYWORDS: &[&str] = &["rectangle", "circle", "diamond"];

/// Leading declaration modifiers.
pub const MODIFIER_KEYWORDS: &[&str] = &["abstract", "static", "sealed", "final"];

static POS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@pos:\s*\(\s*(-?\d+)\s*,\s*(-?\d+)\s*\)$").unwrap());
static SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@(width|height):\s*(-?\d+)$").unwrap());
static DIRECTIVE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^@([A-Za-z_][A-Za-z0-9_]*):\s*(.*)$").unwrap());

#[derive(Debug, Clone)]
pub struct ParseOutput {
    pub document: Document,
    /// First problem encountered, if any. The document still contains
    /// everything that parsed.
    pub diagnostic: Option<Diagnostic>,
}

/// Parse with per-line recovery: always returns a document, plus the
/// first diagnostic when something was malformed.
pub fn parse_document(input: &str) -> ParseOutput {
    let mut parser = Parser::new(input);
    let items = parser.parse_items_until_end();
    ParseOutput {
        document: Document { items },
        diagnostic: parser.diagnostic,
    }
}

/// All-or-nothing variant of [`parse_document`].
pub fn parse_strict(input: &str) -> Result<Document, Diagnostic> {
    let output = parse_document(input);
    match output.diagnostic {
        Some(diagnostic) => Err(diagnostic),
        None => Ok(output.document),
    }
}

#[derive(Debug, Clone, Copy)]
struct Line<'a> {
    /// Byte offset of the line start in the source.
    start: usize,
    /// Line content without the terminator.
    raw: &'a str,
}

struct Parser<'a> {
    src: &'a str,
    lines: Vec<Line<'a>>,
    i: usize,
    diagnostic: Option<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        let mut lines = Vec::new();
        let mut start = 0usize;
        for (idx, byte) in input.bytes().enumerate() {
            if byte == b'\n' {
                let mut raw = &input[start..idx];
                if let Some(stripped) = raw.strip_suffix('\r') {
                    raw = stripped;
                }
                lines.push(Line { start, raw });
                start = idx + 1;
            }
        }
        if start < input.len() {
            lines.push(Line {
                start,
                raw: &input[start..],
            });
        }
        Self {
            src: input,
            lines,
            i: 0,
            diagnostic: None,
        }
    }

    fn eof(&self) -> bool {
        self.i >= self.lines.len()
    }

    fn advance(&mut self) {
        self.i += 1;
    }

    fn line(&self) -> Line<'a> {
        self.lines[self.i]
    }

    /// Current line with any `%%` comment stripped.
    fn content(&self) -> &'a str {
        strip_comment(self.line().raw)
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        log::warn!("parse: {diagnostic}");
        if self.diagnostic.is_none() {
            self.diagnostic = Some(diagnostic);
        }
    }

    fn err_here(&self, col: usize, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(message, self.i + 1, col.max(1))
    }

    /// Span of a byte range within the current line.
    fn line_span(&self, range_start: usize, range_end: usize) -> Span {
        self.span_at(self.i, range_start, range_end)
    }

    fn span_at(&self, line_idx: usize, range_start: usize, range_end: usize) -> Span {
        let line = self.lines[line_idx];
        Span {
            start: line.start + range_start,
            end: line.start + range_end,
            start_line: line_idx + 1,
            start_column: range_start + 1,
            end_line: line_idx + 1,
            end_column: range_end + 1,
        }
    }

    fn parse_items_until_end(&mut self) -> Vec<Item> {
        let mut items = Vec::new();
        while !self.eof() {
            match self.parse_stmt_or_none() {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(diagnostic) => {
                    self.record(diagnostic);
                    self.advance();
                }
            }
        }
        items
    }

    fn parse_stmt_or_none(&mut self) -> Result<Option<Item>, Diagnostic> {
        let t = self.content().trim();

        if t.is_empty() {
            let item = self.comment_item();
            self.advance();
            return Ok(item.map(Item::Comment));
        }

        // Legacy header line, accepted and ignored.
        if t == "classDiagram" {
            self.advance();
            return Ok(None);
        }

        if t == "}" {
            let col = self.content().find('}').unwrap_or(0) + 1;
            let diagnostic = self.err_here(col, "unexpected '}'");
            return Err(diagnostic);
        }

        if t.starts_with('@') {
            let item = self.parse_directive_line()?;
            self.advance();
            return Ok(Some(Item::Directive(item)));
        }

        let first = first_word(t);
        if first == "group" {
            let group = self.parse_group()?;
            return Ok(Some(Item::Group(group)));
        }

        if first == "class"
            || first == "node"
            || CLASS_KEYWORDS.contains(&first)
            || NODE_KEYWORDS.contains(&first)
            || MODIFIER_KEYWORDS.contains(&first)
        {
            let declaration = self.parse_declaration()?;
            return Ok(Some(Item::Declaration(declaration)));
        }

        let relation = self.parse_relation_line()?;
        self.advance();
        Ok(Some(Item::Relation(relation)))
    }

    /// Comment item for a blank or comment-only line, if it is one.
    fn comment_item(&self) -> Option<Comment> {
        let raw = self.line().raw;
        if let Some(idx) = raw.find("%%") {
            return Some(Comment {
                text: raw[idx + 2..].to_string(),
                span: self.line_span(idx, raw.len()),
            });
        }
        if raw.trim().is_empty() {
            return Some(Comment {
                text: String::new(),
                span: self.line_span(0, raw.len()),
            });
        }
        None
    }

    fn parse_directive_line(&self) -> Result<Directive, Diagnostic> {
        let content = self.content();
        let trimmed = content.trim();
        let at = content.find('@').unwrap_or(0);
        let caps = DIRECTIVE_RE
            .captures(trimmed)
            .ok_or_else(|| self.err_here(at + 1, "expected '@key: value' directive"))?;
        let key = caps[1].to_string();
        let value = caps[2].trim().to_string();
        if key == "layout" && crate::ir::LayoutAlgorithm::from_token(&value).is_none() {
            return Err(self.err_here(
                at + 1,
                format!("unknown layout algorithm '{value}'; expected 'hierarchical' or 'grid'"),
            ));
        }
        let end = at + trimmed.len();
        Ok(Directive {
            key,
            value,
            span: self.line_span(at, end),
        })
    }

    // group { ... }
    // group IDENT { ... }
    // The '{' may trail the header or sit alone on the next line.
    fn parse_group(&mut self) -> Result<Group, Diagnostic> {
        let header_idx = self.i;
        let content = self.content();
        let mut cursor = Cursor::new(content);
        cursor.skip_ws();
        let span_start = cursor.pos;
        cursor.take_ident(); // the 'group' keyword itself

        let mut id: Option<SpannedIdent> = None;
        cursor.skip_ws();
        if let Some((start, end, name)) = cursor.take_ident() {
            id = Some(SpannedIdent {
                name: name.to_string(),
                span: self.line_span(start, end),
            });
        }

        cursor.skip_ws();
        let mut open: Option<usize> = None;
        if cursor.take_char('{') {
            open = Some(self.line().start + cursor.pos - 1);
        }
        cursor.skip_ws();
        if !cursor.rest().is_empty() {
            return Err(self.err_here(cursor.pos + 1, "unexpected tokens in group header"));
        }

        self.advance();

        let open = match open {
            Some(byte) => byte,
            None => self.consume_required_lbrace("group")?,
        };

        let mut pos: Option<PosDirective> = None;
        let mut items: Vec<Item> = Vec::new();

        loop {
            if self.eof() {
                let diagnostic = Diagnostic::new(
                    "unexpected end of file; missing '}' for group",
                    self.lines.len().max(1),
                    1,
                );
                self.record(diagnostic);
                // Keep the partial group so the rest of the document
                // still lays out.
                let close = self.src.len();
                return Ok(self.finish_group(id, pos, items, header_idx, span_start, open, close));
            }

            let t = self.content().trim();

            if t == "}" {
                let close = self.line().start + self.content().find('}').unwrap_or(0);
                self.advance();
                return Ok(self.finish_group(id, pos, items, header_idx, span_start, open, close));
            }

            if t.starts_with("@pos:") {
                match self.parse_pos_directive(t) {
                    Ok(directive) => {
                        if pos.is_some() {
                            self.record(self.err_here(1, "duplicate @pos in group block"));
                        } else {
                            pos = Some(directive);
                        }
                    }
                    Err(diagnostic) => self.record(diagnostic),
                }
                self.advance();
                continue;
            }

            match self.parse_stmt_or_none() {
                Ok(Some(item)) => items.push(item),
                Ok(None) => {}
                Err(diagnostic) => {
                    self.record(diagnostic);
                    self.advance();
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_group(
        &self,
        id: Option<SpannedIdent>,
        pos: Option<PosDirective>,
        items: Vec<Item>,
        header_idx: usize,
        span_start: usize,
        open: usize,
        close: usize,
    ) -> Group {
        let header = self.span_at(header_idx, span_start, span_start);
        let close_end = (close + 1).min(self.src.len());
        let (end_line, end_column) = self.line_col_of(close_end);
        Group {
            id,
            pos,
            items,
            body: BodySpan { open, close },
            span: Span {
                start: header.start,
                end: close_end,
                start_line: header.start_line,
                start_column: header.start_column,
                end_line,
                end_column,
            },
        }
    }

    // [modifiers] kind IDENT ["Label"] [ "{" ... "}" ]
    fn parse_declaration(&mut self) -> Result<Declaration, Diagnostic> {
        let header_idx = self.i;
        let content = self.content();
        let mut cursor = Cursor::new(content);
        cursor.skip_ws();
        let span_start = cursor.pos;

        let mut modifiers: Vec<String> = Vec::new();
        let (keyword, kind) = loop {
            cursor.skip_ws();
            let Some((start, _end, word)) = cursor.take_ident() else {
                return Err(self.err_here(cursor.pos + 1, "expected declaration keyword"));
            };
            if word == "class" {
                break (word.to_string(), NodeKind::Class);
            }
            if word == "node" {
                break (word.to_string(), NodeKind::Node);
            }
            if CLASS_KEYWORDS.contains(&word) {
                modifiers.push(word.to_string());
                break (word.to_string(), NodeKind::Class);
            }
            if NODE_KEYWORDS.contains(&word) {
                modifiers.push(word.to_string());
                break (word.to_string(), NodeKind::Node);
            }
            if MODIFIER_KEYWORDS.contains(&word) {
                modifiers.push(word.to_string());
                continue;
            }
            return Err(self.err_here(start + 1, format!("unknown declaration keyword '{word}'")));
        };

        cursor.skip_ws();
        let Some((id_start, id_end, id_name)) = cursor.take_ident() else {
            return Err(self.err_here(
                cursor.pos + 1,
                format!("expected identifier after '{keyword}'"),
            ));
        };
        let id = SpannedIdent {
            name: id_name.to_string(),
            span: self.line_span(id_start, id_end),
        };

        cursor.skip_ws();
        let mut label: Option<String> = None;
        if cursor.peek() == Some('"') {
            let text = cursor
                .take_string()
                .map_err(|message| self.err_here(cursor.pos + 1, message))?;
            label = Some(text);
        }

        cursor.skip_ws();
        let mut open: Option<usize> = None;
        if cursor.take_char('{') {
            open = Some(self.line().start + cursor.pos - 1);
        }
        cursor.skip_ws();
        if !cursor.rest().is_empty() {
            return Err(self.err_here(cursor.pos + 1, "unexpected tokens in declaration"));
        }
        let header_end = content.trim_end().len();

        self.advance();

        if open.is_none() && self.peek_next_nonempty_is_lbrace() {
            open = Some(self.consume_required_lbrace(&keyword)?);
        }

        let Some(open) = open else {
            // Single-line declaration.
            return Ok(Declaration {
                keyword,
                kind,
                modifiers,
                id,
                label,
                members: Vec::new(),
                pos: None,
                width: None,
                height: None,
                body: None,
                span: self.span_at(header_idx, span_start, header_end),
            });
        };

        let mut pos: Option<PosDirective> = None;
        let mut width: Option<SizeDirective> = None;
        let mut height: Option<SizeDirective> = None;
        let mut members: Vec<Member> = Vec::new();

        loop {
            if self.eof() {
                let diagnostic = Diagnostic::new(
                    format!("unexpected end of file; missing '}}' for {keyword}"),
                    self.lines.len().max(1),
                    1,
                );
                self.record(diagnostic);
                let close = self.src.len();
                return Ok(self.finish_declaration(
                    keyword, kind, modifiers, id, label, members, pos, width, height, header_idx,
                    span_start, open, close,
                ));
            }

            let t = self.content().trim();
            if t.is_empty() {
                self.advance();
                continue;
            }
            if t == "}" {
                let close = self.line().start + self.content().find('}').unwrap_or(0);
                self.advance();
                return Ok(self.finish_declaration(
                    keyword, kind, modifiers, id, label, members, pos, width, height, header_idx,
                    span_start, open, close,
                ));
            }

            if t.starts_with("@pos:") {
                match self.parse_pos_directive(t) {
                    Ok(directive) => {
                        if pos.is_some() {
                            self.record(self.err_here(1, format!("duplicate @pos in {keyword} block")));
                        } else {
                            pos = Some(directive);
                        }
                    }
                    Err(diagnostic) => self.record(diagnostic),
                }
                self.advance();
                continue;
            }

            if t.starts_with("@width:") || t.starts_with("@height:") {
                match self.parse_size_directive(t) {
                    Ok((key, directive)) => {
                        let slot = if key == "width" { &mut width } else { &mut height };
                        if slot.is_some() {
                            self.record(
                                self.err_here(1, format!("duplicate @{key} in {keyword} block")),
                            );
                        } else {
                            *slot = Some(directive);
                        }
                    }
                    Err(diagnostic) => self.record(diagnostic),
                }
                self.advance();
                continue;
            }

            // Opaque member line; the renderer decides what it means.
            let content = self.content();
            let trim_start = content.len() - content.trim_start().len();
            let trim_end = content.trim_end().len();
            let mut chars = t.chars();
            let (visibility, text) = match chars.next() {
                Some(marker @ ('+' | '-' | '#')) => (Some(marker), chars.as_str().to_string()),
                _ => (None, t.to_string()),
            };
            members.push(Member {
                visibility,
                text,
                span: self.line_span(trim_start, trim_end),
            });
            self.advance();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finish_declaration(
        &self,
        keyword: String,
        kind: NodeKind,
        modifiers: Vec<String>,
        id: SpannedIdent,
        label: Option<String>,
        members: Vec<Member>,
        pos: Option<PosDirective>,
        width: Option<SizeDirective>,
        height: Option<SizeDirective>,
        header_idx: usize,
        span_start: usize,
        open: usize,
        close: usize,
    ) -> Declaration {
        let header = self.span_at(header_idx, span_start, span_start);
        let close_end = (close + 1).min(self.src.len());
        let (end_line, end_column) = self.line_col_of(close_end);
        Declaration {
            keyword,
            kind,
            modifiers,
            id,
            label,
            members,
            pos,
            width,
            height,
            body: Some(BodySpan { open, close }),
            span: Span {
                start: header.start,
                end: close_end,
                start_line: header.start_line,
                start_column: header.start_column,
                end_line,
                end_column,
            },
        }
    }

    fn parse_pos_directive(&self, t: &str) -> Result<PosDirective, Diagnostic> {
        let content = self.content();
        let at = content.find('@').unwrap_or(0);
        let caps = POS_RE
            .captures(t)
            .ok_or_else(|| self.err_here(at + 1, "expected @pos: (x, y)"))?;
        let x = caps[1]
            .parse::<i32>()
            .map_err(|_| self.err_here(at + 1, "x must be an integer"))?;
        let y = caps[2]
            .parse::<i32>()
            .map_err(|_| self.err_here(at + 1, "y must be an integer"))?;
        Ok(PosDirective {
            x,
            y,
            span: self.line_span(at, at + t.len()),
        })
    }

    fn parse_size_directive(&self, t: &str) -> Result<(String, SizeDirective), Diagnostic> {
        let content = self.content();
        let at = content.find('@').unwrap_or(0);
        let caps = SIZE_RE
            .captures(t)
            .ok_or_else(|| self.err_here(at + 1, "expected @width: <n> or @height: <n>"))?;
        let key = caps[1].to_string();
        let value = caps[2]
            .parse::<i32>()
            .map_err(|_| self.err_here(at + 1, format!("{key} must be an integer")))?;
        if value <= 0 {
            return Err(self.err_here(at + 1, format!("{key} must be positive")));
        }
        Ok((
            key,
            SizeDirective {
                value,
                span: self.line_span(at, at + t.len()),
            },
        ))
    }

    // A --> B
    // A-->B : label
    fn parse_relation_line(&self) -> Result<Relation, Diagnostic> {
        let content = self.content();
        let trim_start = content.len() - content.trim_start().len();
        let t = content.trim();

        // Split off the label at the first ':'.
        let (head, label) = match t.split_once(':') {
            Some((head, tail)) => {
                let label = tail.trim();
                (
                    head,
                    if label.is_empty() {
                        None
                    } else {
                        Some(label.to_string())
                    },
                )
            }
            None => (t, None),
        };

        let Some((from_range, entry, to_range)) = split_relation(head) else {
            return Err(self.err_here(
                trim_start + 1,
                "invalid statement; expected a declaration, group, or relation like A --> B",
            ));
        };

        let from = SpannedIdent {
            name: head[from_range.clone()].to_string(),
            span: self.line_span(trim_start + from_range.start, trim_start + from_range.end),
        };
        let to = SpannedIdent {
            name: head[to_range.clone()].to_string(),
            span: self.line_span(trim_start + to_range.start, trim_start + to_range.end),
        };

        Ok(Relation {
            from,
            arrow: entry.canonical_name.clone(),
            to,
            label,
            span: self.line_span(trim_start, trim_start + t.len()),
        })
    }

    /// Skip blank/comment lines and consume a lone `{`. Returns its
    /// byte offset.
    fn consume_required_lbrace(&mut self, ctx: &str) -> Result<usize, Diagnostic> {
        while !self.eof() {
            let t = self.content().trim();
            if t.is_empty() {
                self.advance();
                continue;
            }
            if t == "{" {
                let byte = self.line().start + self.content().find('{').unwrap_or(0);
                self.advance();
                return Ok(byte);
            }
            return Err(self.err_here(1, format!("expected '{{' to start {ctx} block")));
        }
        Err(Diagnostic::new(
            "unexpected end of file while looking for '{'",
            self.lines.len().max(1),
            1,
        ))
    }

    fn peek_next_nonempty_is_lbrace(&self) -> bool {
        let mut j = self.i;
        while j < self.lines.len() {
            let t = strip_comment(self.lines[j].raw).trim();
            if t.is_empty() {
                j += 1;
                continue;
            }
            return t == "{";
        }
        false
    }

    /// 1-based line/column of a byte offset.
    fn line_col_of(&self, byte: usize) -> (usize, usize) {
        for (idx, line) in self.lines.iter().enumerate().rev() {
            if byte >= line.start {
                return (idx + 1, byte - line.start + 1);
            }
        }
        (1, 1)
    }
}

fn strip_comment(raw: &str) -> &str {
    match raw.find("%%") {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

fn first_word(t: &str) -> &str {
    let end = t
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(idx, _)| idx)
        .unwrap_or(t.len());
    &t[..end]
}

pub(crate) fn is_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Locate the arrow operator in a relation head and return the byte
/// ranges of the trimmed endpoints. Tokens are tried longest first
/// (registry order), so a three-character operator is never split into
/// a shorter prefix plus stray punctuation.
fn split_relation(head: &str) -> Option<(std::ops::Range<usize>, &'static ArrowEntry, std::ops::Range<usize>)> {
    for entry in arrows::arrow_registry() {
        let Some(at) = head.find(entry.token.as_str()) else {
            continue;
        };
        let left = &head[..at];
        let right = &head[at + entry.token.len()..];
        let left_trimmed = left.trim();
        let right_trimmed = right.trim();
        if !is_ident(left_trimmed) || !is_ident(right_trimmed) {
            continue;
        }
        let left_start = left.len() - left.trim_start().len();
        let left_end = left.trim_end().len();
        let right_offset = at + entry.token.len();
        let right_start = right_offset + (right.len() - right.trim_start().len());
        let right_end = right_offset + right.trim_end().len();
        return Some((left_start..left_end, entry, right_start..right_end));
    }
    None
}

/// Character cursor over a single line of content, tracking byte
/// offsets for span construction.
struct Cursor<'a> {
    s: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { s, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.s[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    fn take_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume `[A-Za-z_][A-Za-z0-9_]*`, returning its byte range and
    /// text.
    fn take_ident(&mut self) -> Option<(usize, usize, &'a str)> {
        let rest = self.rest();
        let mut end = 0usize;
        for (idx, c) in rest.char_indices() {
            if idx == 0 {
                if !(c.is_ascii_alphabetic() || c == '_') {
                    return None;
                }
                end = c.len_utf8();
            } else if c.is_ascii_alphanumeric() || c == '_' {
                end = idx + c.len_utf8();
            } else {
                break;
            }
        }
        if end == 0 {
            return None;
        }
        let start = self.pos;
        self.pos += end;
        Some((start, start + end, &rest[..end]))
    }

    /// Consume a double-quoted string. No escape processing.
    fn take_string(&mut self) -> Result<String, String> {
        let rest = self.rest();
        if !rest.starts_with('"') {
            return Err("expected string".to_string());
        }
        let close = rest[1..]
            .find('"')
            .ok_or_else(|| "unterminated string literal".to_string())?
            + 1;
        let content = rest[1..close].to_string();
        self.pos += close + 1;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(input: &str) -> Document {
        let output = parse_document(input);
        assert!(
            output.diagnostic.is_none(),
            "unexpected diagnostic: {:?}",
            output.diagnostic
        );
        output.document
    }

    fn declarations(document: &Document) -> Vec<&Declaration> {
        document
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Declaration(declaration) => Some(declaration),
                _ => None,
            })
            .collect()
    }

    fn relations(document: &Document) -> Vec<&Relation> {
        document
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Relation(relation) => Some(relation),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn parse_single_line_class() {
        let doc = parse_ok("class Foo\n");
        let decls = declarations(&doc);
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].id.name, "Foo");
        assert_eq!(decls[0].kind, NodeKind::Class);
        assert!(decls[0].body.is_none());
    }

    #[test]
    fn parse_class_with_label_and_body() {
        let input = "class Foo \"My Foo\" {\n    @pos: (10, 20)\n    +name: String\n}\n";
        let doc = parse_ok(input);
        let decls = declarations(&doc);
        assert_eq!(decls[0].label.as_deref(), Some("My Foo"));
        let pos = decls[0].pos.unwrap();
        assert_eq!((pos.x, pos.y), (10, 20));
        assert_eq!(decls[0].members.len(), 1);
        assert_eq!(decls[0].members[0].visibility, Some('+'));
        assert_eq!(decls[0].members[0].text, "name: String");
        assert!(decls[0].body.is_some());
    }

    #[test]
    fn parse_pos_span_covers_directive_text() {
        let input = "class Foo {\n    @pos: (10, 20)\n}\n";
        let doc = parse_ok(input);
        let pos = declarations(&doc)[0].pos.unwrap();
        assert_eq!(&input[pos.span.start..pos.span.end], "@pos: (10, 20)");
        assert_eq!(pos.span.start_line, 2);
        assert_eq!(pos.span.start_column, 5);
    }

    #[test]
    fn parse_keyword_kinds_and_modifiers() {
        let doc = parse_ok("interface Shape\nabstract class Base\ncircle Dot\n");
        let decls = declarations(&doc);
        assert_eq!(decls[0].kind, NodeKind::Class);
        assert_eq!(decls[0].keyword, "interface");
        assert_eq!(decls[0].modifiers, vec!["interface"]);
        assert_eq!(decls[1].modifiers, vec!["abstract"]);
        assert_eq!(decls[1].keyword, "class");
        assert_eq!(decls[2].kind, NodeKind::Node);
        assert_eq!(decls[2].modifiers, vec!["circle"]);
    }

    #[test]
    fn parse_brace_on_next_line() {
        let input = "class Foo\n{\n    @pos: (1, 2)\n}\n";
        let doc = parse_ok(input);
        let decls = declarations(&doc);
        assert!(decls[0].body.is_some());
        assert_eq!(decls[0].pos.unwrap().x, 1);
    }

    #[test]
    fn parse_relation_spaced_and_compact() {
        let doc = parse_ok("A --> B\nC-->D\n");
        let rels = relations(&doc);
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].arrow, "assoc_right");
        assert_eq!(rels[1].from.name, "C");
        assert_eq!(rels[1].to.name, "D");
    }

    #[test]
    fn parse_relation_with_label() {
        let doc = parse_ok("A <|-- B : extends\n");
        let rels = relations(&doc);
        assert_eq!(rels[0].arrow, "extends_left");
        assert_eq!(rels[0].label.as_deref(), Some("extends"));
    }

    #[test]
    fn parse_relation_longest_match_wins() {
        // `A---B` must parse as a plain line, not `--` plus a stray '-'.
        let doc = parse_ok("A---B\nC..|>D\n");
        let rels = relations(&doc);
        assert_eq!(rels[0].arrow, "line");
        assert_eq!(rels[1].arrow, "implements_right");
    }

    #[test]
    fn parse_relation_endpoint_spans_are_exact() {
        let input = "Alpha --> Beta : uses\n";
        let doc = parse_ok(input);
        let rels = relations(&doc);
        assert_eq!(&input[rels[0].from.span.start..rels[0].from.span.end], "Alpha");
        assert_eq!(&input[rels[0].to.span.start..rels[0].to.span.end], "Beta");
    }

    #[test]
    fn parse_group_named_and_anonymous() {
        let input = "group Backend {\n    class Api\n}\ngroup {\n    class Db\n}\n";
        let doc = parse_ok(input);
        let groups: Vec<&Group> = doc
            .items
            .iter()
            .filter_map(|item| match item {
                Item::Group(group) => Some(group),
                _ => None,
            })
            .collect();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].id.as_ref().map(|id| id.name.as_str()), Some("Backend"));
        assert!(groups[1].id.is_none());
        assert_eq!(groups[0].items.len(), 1);
    }

    #[test]
    fn parse_nested_groups() {
        let input = "group Outer {\n    group Inner {\n        class Leaf\n    }\n}\n";
        let doc = parse_ok(input);
        let Item::Group(outer) = &doc.items[0] else {
            panic!("expected group");
        };
        let Item::Group(inner) = &outer.items[0] else {
            panic!("expected nested group");
        };
        assert_eq!(inner.id.as_ref().map(|id| id.name.as_str()), Some("Inner"));
    }

    #[test]
    fn parse_group_pos() {
        let input = "group G {\n    @pos: (5, 7)\n    class A\n}\n";
        let doc = parse_ok(input);
        let Item::Group(group) = &doc.items[0] else {
            panic!("expected group");
        };
        assert_eq!(group.pos.unwrap().y, 7);
    }

    #[test]
    fn parse_comments_become_items() {
        let input = "%% heading\nclass A\n\nA --> A\n";
        let doc = parse_ok(input);
        assert!(matches!(doc.items[0], Item::Comment(_)));
        assert!(matches!(doc.items[2], Item::Comment(_)));
        assert_eq!(doc.items.len(), 4);
    }

    #[test]
    fn parse_trailing_comment_is_ignored() {
        let doc = parse_ok("class A %% note\nA --> A %% self\n");
        assert_eq!(declarations(&doc).len(), 1);
        assert_eq!(relations(&doc).len(), 1);
    }

    #[test]
    fn parse_layout_directive() {
        let doc = parse_ok("@layout: grid\nclass A\n");
        assert_eq!(doc.layout_algorithm(), crate::ir::LayoutAlgorithm::Grid);
    }

    #[test]
    fn parse_unknown_layout_value_is_diagnosed() {
        let output = parse_document("@layout: spiral\nclass A\n");
        let diagnostic = output.diagnostic.expect("expected diagnostic");
        assert!(diagnostic.message.contains("spiral"));
        // The class on the next line still parsed.
        assert_eq!(declarations(&output.document).len(), 1);
    }

    #[test]
    fn parse_recovers_after_bad_line() {
        let output = parse_document("class A\n???\nclass B\n");
        assert!(output.diagnostic.is_some());
        assert_eq!(output.diagnostic.as_ref().unwrap().line, 2);
        let decls = declarations(&output.document);
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn parse_duplicate_pos_is_diagnosed() {
        let output = parse_document("class A {\n    @pos: (1, 2)\n    @pos: (3, 4)\n}\n");
        assert!(output.diagnostic.is_some());
        let decls = declarations(&output.document);
        // First @pos wins.
        assert_eq!(decls[0].pos.unwrap().x, 1);
    }

    #[test]
    fn parse_width_height_directives() {
        let input = "class A {\n    @width: 300\n    @height: 150\n}\n";
        let doc = parse_ok(input);
        let decl = declarations(&doc)[0];
        assert_eq!(decl.width.unwrap().value, 300);
        assert_eq!(decl.height.unwrap().value, 150);
    }

    #[test]
    fn parse_unclosed_group_keeps_children() {
        let output = parse_document("group G {\n    class A\n");
        assert!(output.diagnostic.is_some());
        let Item::Group(group) = &output.document.items[0] else {
            panic!("expected group");
        };
        assert_eq!(group.items.len(), 1);
    }

    #[test]
    fn parse_class_diagram_header_is_tolerated() {
        let doc = parse_ok("classDiagram\nclass A\n");
        assert_eq!(declarations(&doc).len(), 1);
    }

    #[test]
    fn parse_strict_rejects_bad_input() {
        assert!(parse_strict("class\n").is_err());
        assert!(parse_strict("class A\n").is_ok());
    }

    #[test]
    fn parse_crlf_input() {
        let doc = parse_ok("class A\r\nA --> A\r\n");
        assert_eq!(declarations(&doc).len(), 1);
        assert_eq!(relations(&doc).len(), 1);
    }

    #[test]
    fn parse_declaration_span_covers_block() {
        let input = "class Foo {\n    @pos: (1, 1)\n}\nclass Bar\n";
        let doc = parse_ok(input);
        let decls = declarations(&doc);
        let span = decls[0].span;
        assert_eq!(&input[span.start..span.end], "class Foo {\n    @pos: (1, 1)\n}");
    }
}
