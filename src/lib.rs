pub mod arrows;
#[cfg(feature = "cli")]
pub mod cli;
pub mod compile;
pub mod config;
pub mod diagnostics;
pub mod ir;
pub mod layout;
pub mod parser;
pub mod patch;
pub mod rename;
pub mod symbols;

pub use arrows::{ArrowEntry, arrow_registry};
#[cfg(feature = "cli")]
pub use cli::run;
pub use compile::{DiagramOutput, compile_diagram, compile_diagram_json};
pub use config::LayoutConfig;
pub use diagnostics::Diagnostic;
pub use parser::{parse_document, parse_strict};
pub use patch::{
    KEEP_DIMENSION, insert_implicit_node, remove_all_pos, remove_class_pos, update_class_geometry,
    update_class_pos, update_group_pos,
};
pub use rename::{get_symbols, rename_symbol};
