use std::collections::HashMap;

use super::decimal_id;
use crate::parser::{GameObjectMap, SaveFile};

/// A save-internal id to display name table. Built once per loaded
/// document from a catalogue block and read-only afterwards, shared by
/// every country query against that document.
pub type NameTable = HashMap<String, String>;

/// The top level block defining division templates.
const TEMPLATE_CATALOGUE: &str = "division_templates";
/// The top level block defining equipment archetypes.
const EQUIPMENT_CATALOGUE: &str = "equipments";

/// Collect `id={ id=N ... } name=...` entries out of a parsed
/// catalogue block. Entries appear keyed, duplicate-folded or as bare
/// anonymous objects depending on the save revision, so every value in
/// the block is cardinality-normalized and inspected.
fn collect_entries(block: &GameObjectMap, table: &mut NameTable) {
    for (_, value) in block {
        for entry in value.as_object_list() {
            let id = entry
                .get_object("id")
                .and_then(|id| id.get_real("id"))
                .map(decimal_id);
            let name = entry.get_string("name");
            if let (Some(id), Some(name)) = (id, name) {
                table.insert(id, name.as_ref().clone());
            }
        }
    }
}

fn catalogue_names(save: &SaveFile, container: &str) -> NameTable {
    let mut table = NameTable::new();
    if let Some(section) = save.top_level_block(container) {
        collect_entries(&section.parse(), &mut table);
    }
    table
}

/// Build the division template id → display name table.
/// A save without the catalogue yields an empty table, which only
/// means every template falls back to its numeric label downstream.
pub fn template_names(save: &SaveFile) -> NameTable {
    catalogue_names(save, TEMPLATE_CATALOGUE)
}

/// Build the equipment id → display name table.
pub fn equipment_names(save: &SaveFile) -> NameTable {
    catalogue_names(save, EQUIPMENT_CATALOGUE)
}
