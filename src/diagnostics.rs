use serde::Serialize;
use thiserror::Error;

use crate::ir::Span;

/// A positioned problem report. Line/column values are 1-based and map
/// directly onto editor marker ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{message} at {line}:{column}")]
pub struct Diagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        let column = column.max(1);
        Self {
            message: message.into(),
            line,
            column,
            end_line: line,
            // Highlight at least one character.
            end_column: column + 1,
        }
    }

    pub fn from_span(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            line: span.start_line,
            column: span.start_column.max(1),
            end_line: span.end_line,
            end_column: span.end_column.max(2),
        }
    }
}

/// Non-fatal advisory finding. Implicit-node usage and duplicate
/// declarations land here; hosts render these distinctly from hard
/// parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    ImplicitNode,
    DuplicateDeclaration,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub id: String,
    pub message: String,
}

impl Notice {
    pub fn implicit(id: impl Into<String>) -> Self {
        let id = id.into();
        let message = format!("'{id}' is used in a relation but never declared");
        Self {
            kind: NoticeKind::ImplicitNode,
            id,
            message,
        }
    }

    pub fn duplicate(id: impl Into<String>) -> Self {
        let id = id.into();
        let message = format!("'{id}' is declared more than once; the first declaration wins");
        Self {
            kind: NoticeKind::DuplicateDeclaration,
            id,
            message,
        }
    }
}
