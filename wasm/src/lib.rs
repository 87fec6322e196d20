//! WASM bindings for umlflow-core.
//!
//! Every entry point takes and returns plain strings: diagram
//! descriptions and the arrow registry travel as JSON, mutation
//! operations return the new source text (or the input unchanged when
//! the target does not exist).

use wasm_bindgen::prelude::*;

use umlflow_core::{arrow_registry, compile_diagram_json};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console, js_name = error)]
    fn console_error(s: &str);
}

/// Full pipeline: parse, resolve, lay out, serialize. Parse errors are
/// reported inside the JSON (`error` field) instead of throwing, so
/// the host can render partial diagrams with inline markers.
#[wasm_bindgen]
pub fn compile_diagram(source: &str) -> String {
    compile_diagram_json(source)
}

/// All known identifiers (explicit and implicit) as a JSON array.
#[wasm_bindgen]
pub fn get_symbols(source: &str) -> String {
    let symbols = umlflow_core::get_symbols(source);
    serde_json::to_string(&symbols).unwrap_or_else(|_| "[]".to_string())
}

/// The arrow registry as JSON, for host-side autocomplete, syntax
/// highlighting and legend UI.
#[wasm_bindgen]
pub fn get_arrows() -> String {
    serde_json::to_string(arrow_registry()).unwrap_or_else(|_| "[]".to_string())
}

/// Rename a symbol everywhere and return the updated source. Returns
/// the input unchanged when the symbol does not exist.
#[wasm_bindgen]
pub fn rename_symbol(source: &str, old_name: &str, new_name: &str) -> String {
    let renamed = umlflow_core::rename_symbol(source, old_name, new_name);
    if renamed == source {
        console_error(&format!("Symbol '{old_name}' not found"));
    }
    renamed
}

/// Update an entity's position and return the new source code.
#[wasm_bindgen]
pub fn update_class_pos(source: &str, class_id: &str, x: i32, y: i32) -> String {
    umlflow_core::update_class_pos(source, class_id, x, y)
}

/// Update an entity's geometry. Pass -1 for width/height to leave that
/// dimension unchanged, so pure moves never add size directives.
#[wasm_bindgen]
pub fn update_class_geometry(
    source: &str,
    class_id: &str,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
) -> String {
    umlflow_core::update_class_geometry(source, class_id, x, y, width, height)
}

/// Update a group position. For named groups pass the id; for
/// anonymous groups pass an empty id and the pre-order group index.
#[wasm_bindgen]
pub fn update_group_pos(source: &str, group_id: &str, group_index: usize, x: i32, y: i32) -> String {
    umlflow_core::update_group_pos(source, group_id, group_index, x, y)
}

/// Materialize a declaration for an implicitly-known node. Used when a
/// drag starts on an implicit node so the position has somewhere to
/// live.
#[wasm_bindgen]
pub fn insert_implicit_node(source: &str, node_id: &str, x: i32, y: i32) -> String {
    umlflow_core::insert_implicit_node(source, node_id, x, y)
}

/// Remove an entity's @pos (unlock it for auto-layout).
#[wasm_bindgen]
pub fn remove_class_pos(source: &str, class_id: &str) -> String {
    umlflow_core::remove_class_pos(source, class_id)
}

/// Remove every @pos from all entities and groups (unlock everything).
#[wasm_bindgen]
pub fn remove_all_pos(source: &str) -> String {
    umlflow_core::remove_all_pos(source)
}
