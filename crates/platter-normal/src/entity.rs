//! The entity map: normalized records keyed by type name and id.

use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Stable key of one entity record within its type.
pub type EntityId = String;

/// type name → entity id → record.
///
/// Records are JSON objects with relation fields replaced by refs.
pub type EntityMap = BTreeMap<String, BTreeMap<EntityId, Value>>;

/// Merge `incoming` into `target`.
///
/// Merging is a field-level union per record: newly supplied fields
/// overwrite, fields absent from the incoming record survive. Non-object
/// records are replaced wholesale.
pub fn merge_entities(target: &mut EntityMap, incoming: EntityMap) {
    for (type_name, records) in incoming {
        let slot = target.entry(type_name).or_default();
        for (id, record) in records {
            match slot.entry(id) {
                Entry::Occupied(mut existing) => match (existing.get_mut(), record) {
                    (Value::Object(fields), Value::Object(new_fields)) => {
                        for (name, value) in new_fields {
                            fields.insert(name, value);
                        }
                    }
                    (existing, record) => *existing = record,
                },
                Entry::Vacant(vacant) => {
                    vacant.insert(record);
                }
            }
        }
    }
}
