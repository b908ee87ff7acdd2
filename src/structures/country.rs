use std::cmp::Ordering;

use indexmap::IndexMap;
use serde::Serialize;

use super::{decimal_id, NameTable};
use crate::parser::{GameObjectMap, SaveFileValue};

/// The `id.type` discriminator of market stockpile equipment entries.
/// The save shares one table across multiple stock kinds; only this
/// kind counts towards the stockpile statistics.
const EQUIPMENT_STOCKPILE_TYPE: f64 = 70.0;

/// How many stockpile entries a snapshot reports at most.
const STOCKPILE_TOP_N: usize = 10;

/// The save format renamed several economy fields across game
/// revisions. Each list is tried in order and the first present key
/// wins, so older and newer saves both resolve.
const MANPOWER_KEYS: &[&str] = &["manpower_pool", "manpower", "total_manpower", "manpower_total"];
const CIVILIAN_FACTORY_KEYS: &[&str] = &[
    "civilian_factories",
    "num_of_civilian_factories",
    "civ_factory_count",
    "civilian_factory_count",
];
const MILITARY_FACTORY_KEYS: &[&str] = &[
    "military_factories",
    "num_of_military_factories",
    "mil_factory_count",
    "military_factory_count",
];
const DOCKYARD_KEYS: &[&str] = &[
    "dockyards",
    "num_of_naval_factories",
    "dockyard_count",
    "naval_factory_count",
];

/// One stockpile line: a resolved equipment display name and the
/// summed amount held.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentAmount {
    pub name: String,
    pub amount: f64,
}

/// A flat, typed view of one country at the save date.
///
/// Every field is either populated or absent; building a snapshot
/// performs no I/O and cannot fail. A snapshot is built once per
/// country query and immutable afterwards.
#[derive(Debug, Serialize)]
pub struct CountrySnapshot {
    pub tag: String,
    pub save_date: Option<String>,
    pub ideology: Option<String>,
    pub ruling_party: Option<String>,

    pub manpower: Option<f64>,
    pub civilian_factories: Option<f64>,
    pub military_factories: Option<f64>,
    pub dockyards: Option<f64>,

    pub political_power: Option<f64>,
    pub stability: Option<f64>,
    pub war_support: Option<f64>,
    pub command_power: Option<f64>,
    pub research_slots: Option<f64>,
    pub capital_state_id: Option<f64>,
    pub major: Option<bool>,

    /// Division counts keyed by resolved template display name.
    /// Iteration order is deterministic for a given save.
    pub divisions_by_template: IndexMap<String, u64>,
    /// At most ten stockpile lines, sorted by amount descending
    /// (ties by name, so the cut is deterministic).
    pub stockpiles_top10: Vec<EquipmentAmount>,
}

/// The first present key of an ordered fallback list wins, regardless
/// of how the remaining keys are laid out in the object.
fn first_real(obj: &GameObjectMap, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| obj.get_real(key))
}

impl CountrySnapshot {
    /// Reduce a parsed country block plus the two per-save lookup
    /// tables to a snapshot. Missing fields become absent attributes,
    /// never errors.
    pub fn from_country(
        tag: &str,
        save_date: Option<&str>,
        country: &GameObjectMap,
        templates: &NameTable,
        equipment: &NameTable,
    ) -> Self {
        let ruling_party = country
            .get_path_string(&["politics", "ruling_party"])
            .map(|s| s.as_ref().clone());
        CountrySnapshot {
            tag: tag.to_owned(),
            save_date: save_date.map(str::to_owned),
            ideology: ruling_party.clone(),
            ruling_party,
            manpower: first_real(country, MANPOWER_KEYS),
            civilian_factories: first_real(country, CIVILIAN_FACTORY_KEYS),
            military_factories: first_real(country, MILITARY_FACTORY_KEYS),
            dockyards: first_real(country, DOCKYARD_KEYS),
            political_power: country.get_path_real(&["politics", "political_power"]),
            stability: country.get_real("stability"),
            war_support: country.get_real("war_support"),
            command_power: country.get_real("command_power"),
            research_slots: country.get_real("research_slot"),
            capital_state_id: country.get_real("capital"),
            major: country.get_boolean("major"),
            divisions_by_template: divisions_by_template(country, templates),
            stockpiles_top10: stockpiles_top(country, equipment),
        }
    }
}

/// Count divisions per template under the country's `units` subtree.
///
/// Units nest arbitrarily deep (armies, corps, naval groups carrying
/// land units), so the whole subtree is visited with an explicit work
/// list rather than native recursion; a hostile save cannot blow the
/// stack. Every object carrying a `division_template_id` whose nested
/// `id` is numeric counts once. Ids resolving to the same display name
/// merge additively.
fn divisions_by_template(country: &GameObjectMap, templates: &NameTable) -> IndexMap<String, u64> {
    let mut counts: IndexMap<String, u64> = IndexMap::new();
    let mut work: Vec<&SaveFileValue> = match country.get("units") {
        Some(units) => vec![units],
        None => return counts,
    };
    while let Some(value) = work.pop() {
        match value {
            SaveFileValue::Object(obj) => {
                if let Some(template) = obj.get_object("division_template_id") {
                    if let Some(id) = template.get_real("id") {
                        *counts.entry(decimal_id(id)).or_insert(0) += 1;
                    }
                }
                for (_, child) in obj {
                    work.push(child);
                }
            }
            SaveFileValue::Array(arr) => {
                work.extend(arr.iter());
            }
            _ => {}
        }
    }
    let mut named: IndexMap<String, u64> = IndexMap::new();
    for (id, count) in counts {
        let name = match templates.get(&id) {
            Some(name) => name.clone(),
            None => format!("Template {}", id),
        };
        *named.entry(name).or_insert(0) += count;
    }
    named
}

/// Sum the market stockpile per equipment id and keep the ten largest.
///
/// The stockpile table is shared across stock kinds and discriminated
/// by `id.type`; only type-70 entries with a strictly positive amount
/// contribute. One occurrence is a bare object, many are a list, so
/// the entry value is cardinality-normalized first.
fn stockpiles_top(country: &GameObjectMap, equipment: &NameTable) -> Vec<EquipmentAmount> {
    let mut sums: IndexMap<String, f64> = IndexMap::new();
    if let Some(entries) =
        country.get_path(&["equipment_market", "market_stockpile", "equipments", "equipment"])
    {
        for entry in entries.as_object_list() {
            let id = match entry.get_object("id") {
                Some(id) => id,
                None => continue,
            };
            if id.get_real("type") != Some(EQUIPMENT_STOCKPILE_TYPE) {
                continue;
            }
            let key = match id.get_real("id") {
                Some(num) => decimal_id(num),
                None => continue,
            };
            match entry.get_real("amount") {
                Some(amount) if amount > 0.0 => {
                    *sums.entry(key).or_insert(0.0) += amount;
                }
                _ => {}
            }
        }
    }
    let mut out: Vec<EquipmentAmount> = sums
        .into_iter()
        .map(|(id, amount)| {
            let name = match equipment.get(&id) {
                Some(name) => name.clone(),
                None => format!("equipment_id_{}", id),
            };
            EquipmentAmount { name, amount }
        })
        .collect();
    out.sort_by(|a, b| {
        b.amount
            .partial_cmp(&a.amount)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    out.truncate(STOCKPILE_TOP_N);
    out
}
