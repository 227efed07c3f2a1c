//! Normalize nested payloads into flat entity records, and back.

use crate::entity::{EntityId, EntityMap, merge_entities};
use crate::shape::{EntityShape, Shape};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What a completed operation left in the result slot: a single entity
/// ref, an ordered sequence of refs, a raw payload, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResultRef {
    Id(EntityId),
    Ids(Vec<EntityId>),
    Raw(Value),
    Null,
}

/// Output of [`normalize`]: extracted entity records plus the ref that
/// stands in for the payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub entities: EntityMap,
    pub result: ResultRef,
}

/// Errors raised while normalizing a payload against a shape.
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("entity `{entity}` payload must be an object, got {found}")]
    NotAnObject { entity: String, found: &'static str },

    #[error("entity `{entity}` payload is missing id field `{id_field}`")]
    MissingId { entity: String, id_field: String },

    #[error("list payload must be an array, got {found}")]
    NotAnArray { found: &'static str },

    #[error("list shapes require entity elements")]
    ListElement,
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Flatten `payload` against `shape`, extracting entity records.
pub fn normalize(payload: &Value, shape: &Shape) -> Result<Normalized, NormalizeError> {
    let mut entities = EntityMap::new();
    let result = normalize_into(payload, shape, &mut entities)?;
    Ok(Normalized { entities, result })
}

fn normalize_into(
    payload: &Value,
    shape: &Shape,
    entities: &mut EntityMap,
) -> Result<ResultRef, NormalizeError> {
    match shape {
        Shape::Unit => Ok(ResultRef::Raw(payload.clone())),
        Shape::Entity(entity) => normalize_entity(payload, entity, entities),
        Shape::List(element) => {
            let items = payload.as_array().ok_or_else(|| NormalizeError::NotAnArray {
                found: kind_of(payload),
            })?;
            let mut ids = Vec::with_capacity(items.len());
            for item in items {
                match normalize_into(item, element, entities)? {
                    ResultRef::Id(id) => ids.push(id),
                    _ => return Err(NormalizeError::ListElement),
                }
            }
            Ok(ResultRef::Ids(ids))
        }
    }
}

fn normalize_entity(
    payload: &Value,
    entity: &EntityShape,
    entities: &mut EntityMap,
) -> Result<ResultRef, NormalizeError> {
    if payload.is_null() {
        return Ok(ResultRef::Null);
    }
    let fields = payload.as_object().ok_or_else(|| NormalizeError::NotAnObject {
        entity: entity.name.clone(),
        found: kind_of(payload),
    })?;
    let id = fields
        .get(&entity.id_field)
        .and_then(id_key)
        .ok_or_else(|| NormalizeError::MissingId {
            entity: entity.name.clone(),
            id_field: entity.id_field.clone(),
        })?;

    let mut record = serde_json::Map::new();
    for (name, value) in fields {
        match entity.relations.get(name) {
            Some(relation) => {
                let nested = normalize_into(value, relation, entities)?;
                record.insert(name.clone(), ref_value(nested));
            }
            None => {
                record.insert(name.clone(), value.clone());
            }
        }
    }

    let mut extracted = EntityMap::new();
    extracted
        .entry(entity.name.clone())
        .or_default()
        .insert(id.clone(), Value::Object(record));
    merge_entities(entities, extracted);

    Ok(ResultRef::Id(id))
}

/// Entity map key for an id field value. String and numeric ids are
/// accepted; numbers are keyed by their JSON rendering.
fn id_key(value: &Value) -> Option<EntityId> {
    match value {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

/// The in-record rendering of a nested ref.
fn ref_value(result: ResultRef) -> Value {
    match result {
        ResultRef::Id(id) => Value::String(id),
        ResultRef::Ids(ids) => Value::Array(ids.into_iter().map(Value::String).collect()),
        ResultRef::Raw(value) => value,
        ResultRef::Null => Value::Null,
    }
}

/// Parse a stored relation field back into a ref for denormalization.
fn ref_of(value: &Value) -> ResultRef {
    match value {
        Value::String(id) => ResultRef::Id(id.clone()),
        Value::Array(items) => {
            let ids: Option<Vec<EntityId>> = items
                .iter()
                .map(|item| item.as_str().map(str::to_string))
                .collect();
            match ids {
                Some(ids) => ResultRef::Ids(ids),
                None => ResultRef::Raw(value.clone()),
            }
        }
        Value::Null => ResultRef::Null,
        other => ResultRef::Raw(other.clone()),
    }
}

/// Rebuild the nested value a ref stands for.
///
/// Returns `None` when the ref is null, an id is not in the entity map,
/// or the ref does not fit the shape. Within a list, missing elements
/// render as `null` so positions are preserved.
pub fn denormalize(result: &ResultRef, shape: &Shape, entities: &EntityMap) -> Option<Value> {
    match (result, shape) {
        (ResultRef::Null, _) => None,
        (ResultRef::Raw(value), _) => Some(value.clone()),
        (ResultRef::Id(id), Shape::Entity(entity)) => denormalize_entity(id, entity, entities),
        (ResultRef::Ids(ids), Shape::List(element)) => {
            let items = ids
                .iter()
                .map(|id| {
                    denormalize(&ResultRef::Id(id.clone()), element, entities)
                        .unwrap_or(Value::Null)
                })
                .collect();
            Some(Value::Array(items))
        }
        _ => None,
    }
}

fn denormalize_entity(
    id: &str,
    entity: &EntityShape,
    entities: &EntityMap,
) -> Option<Value> {
    let record = entities.get(&entity.name)?.get(id)?;
    let fields = match record.as_object() {
        Some(fields) => fields,
        None => return Some(record.clone()),
    };

    let mut rebuilt: BTreeMap<String, Value> = BTreeMap::new();
    for (name, value) in fields {
        match entity.relations.get(name) {
            Some(relation) => {
                // Keep the stored ref when the related entity is not cached.
                let nested = denormalize(&ref_of(value), relation, entities)
                    .unwrap_or_else(|| value.clone());
                rebuilt.insert(name.clone(), nested);
            }
            None => {
                rebuilt.insert(name.clone(), value.clone());
            }
        }
    }
    serde_json::to_value(rebuilt).ok()
}
