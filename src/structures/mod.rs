/// A submodule that builds the per-save id to display name tables.
mod lookup;
pub use lookup::{equipment_names, template_names, NameTable};

/// A submodule that reduces one parsed country block to a [CountrySnapshot].
mod country;
pub use country::CountrySnapshot;

/// Format a save-internal numeric id the way the catalogue tables key
/// it: a decimal string with no fractional part.
pub(crate) fn decimal_id(id: f64) -> String {
    format!("{}", id.trunc() as i64)
}
