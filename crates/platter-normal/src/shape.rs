//! Response shape descriptors.
//!
//! A `Shape` tells the normalizer what a response payload looks like:
//! a single named entity, an ordered list of entities, or an opaque value
//! that is cached as-is.

use std::collections::BTreeMap;
use std::rc::Rc;

/// Shape of one operation's response payload.
#[derive(Debug, Clone)]
pub enum Shape {
    /// No normalization. The payload is stored raw in the result slot.
    Unit,
    /// A single entity record.
    Entity(Rc<EntityShape>),
    /// An ordered sequence. The element shape must be an entity shape.
    List(Box<Shape>),
}

impl Shape {
    /// Single-entity shape.
    pub fn entity(shape: Rc<EntityShape>) -> Self {
        Self::Entity(shape)
    }

    /// Ordered-list shape over an element shape.
    pub fn list(element: Shape) -> Self {
        Self::List(Box::new(element))
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::Unit
    }
}

impl From<Rc<EntityShape>> for Shape {
    fn from(shape: Rc<EntityShape>) -> Self {
        Self::Entity(shape)
    }
}

/// Describes one entity type: its store name, id field, and nested
/// relation fields that normalize into refs.
#[derive(Debug, Clone)]
pub struct EntityShape {
    pub name: String,
    pub id_field: String,
    pub relations: BTreeMap<String, Shape>,
}

impl EntityShape {
    /// New entity shape keyed by `id`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id_field: "id".to_string(),
            relations: BTreeMap::new(),
        }
    }

    /// Override the id field name.
    #[must_use]
    pub fn id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = field.into();
        self
    }

    /// Declare a nested relation field.
    #[must_use]
    pub fn relation(mut self, field: impl Into<String>, shape: Shape) -> Self {
        self.relations.insert(field.into(), shape);
        self
    }

    /// Finish building, ready for sharing across shapes.
    pub fn build(self) -> Rc<Self> {
        Rc::new(self)
    }
}
