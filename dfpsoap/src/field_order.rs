//! Schema element order per wire element

use std::collections::{HashMap, HashSet};

/// Declared order of one element's children.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityOrder {
    /// Fields of the base type.
    pub fields: Vec<String>,
    /// Field order per concrete subtype (discriminator value).
    pub subtypes: HashMap<String, Vec<String>>,
}

impl EntityOrder {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            subtypes: HashMap::new(),
        }
    }

    pub fn with_subtype<I, S>(mut self, xsi_type: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subtypes.insert(
            xsi_type.to_string(),
            fields.into_iter().map(Into::into).collect(),
        );
        self
    }
}

/// Field-order table of one API version.
///
/// Keys are element names as they appear on the wire (`adUnit`, `sizes`,
/// `filterStatement`), not type names. An element name reused by unrelated
/// types (`values` is both a statement bind list and the argument of
/// `createCustomTargetingValues`) gets a scoped entry under its parent
/// element, which wins over the plain one.
#[derive(Debug, Clone, Default)]
pub struct FieldOrderTable {
    entities: HashMap<String, EntityOrder>,
    scoped: HashMap<String, HashMap<String, EntityOrder>>,
    leaves: HashMap<String, HashSet<String>>,
    wrapped_lists: HashSet<String>,
}

impl FieldOrderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the order of `element`, replacing any previous entry.
    pub fn entity(mut self, element: &str, order: EntityOrder) -> Self {
        self.entities.insert(element.to_string(), order);
        self
    }

    /// Registers the same order under several element names.
    pub fn entities(mut self, elements: &[&str], order: EntityOrder) -> Self {
        for element in elements {
            self.entities.insert((*element).to_string(), order.clone());
        }
        self
    }

    /// Registers the order of `element` when it is a child of `parent`.
    pub fn scoped(mut self, parent: &str, element: &str, order: EntityOrder) -> Self {
        self.scoped
            .entry(parent.to_string())
            .or_default()
            .insert(element.to_string(), order);
        self
    }

    /// Marks `element` under `parent` as text even though its name is
    /// registered as an entity (the `value` of a `TextValue`).
    pub fn leaf(mut self, parent: &str, element: &str) -> Self {
        self.leaves
            .entry(parent.to_string())
            .or_default()
            .insert(element.to_string());
        self
    }

    /// Marks `element` as a list whose items are wrapped in one more layer.
    pub fn wrap_list(mut self, element: &str) -> Self {
        self.wrapped_lists.insert(element.to_string());
        self
    }

    /// Adds the entries of `other`, which take precedence.
    pub fn extend(mut self, other: FieldOrderTable) -> Self {
        self.entities.extend(other.entities);
        for (parent, orders) in other.scoped {
            self.scoped.entry(parent).or_default().extend(orders);
        }
        for (parent, leaves) in other.leaves {
            self.leaves.entry(parent).or_default().extend(leaves);
        }
        self.wrapped_lists.extend(other.wrapped_lists);
        self
    }

    pub fn get(&self, element: &str) -> Option<&EntityOrder> {
        self.entities.get(element)
    }

    /// Entry of `element` under `parent`, falling back to the plain entry.
    pub fn lookup(&self, parent: Option<&str>, element: &str) -> Option<&EntityOrder> {
        parent
            .and_then(|p| self.scoped.get(p))
            .and_then(|orders| orders.get(element))
            .or_else(|| self.entities.get(element))
    }

    /// True when `element` under `parent` is a complex type in this table.
    pub fn is_entity(&self, parent: Option<&str>, element: &str) -> bool {
        let leaf = parent
            .and_then(|p| self.leaves.get(p))
            .is_some_and(|leaves| leaves.contains(element));
        !leaf && self.lookup(parent, element).is_some()
    }

    /// Order of the children of `element` for the given subtype.
    ///
    /// `None` means nothing is registered and fields go out in their
    /// native order: unknown element, or a subtype the element does not
    /// declare.
    pub fn order_for(&self, element: &str, xsi_type: Option<&str>) -> Option<&[String]> {
        self.order_in(None, element, xsi_type)
    }

    /// [`FieldOrderTable::order_for`] for `element` as a child of `parent`.
    pub fn order_in(
        &self,
        parent: Option<&str>,
        element: &str,
        xsi_type: Option<&str>,
    ) -> Option<&[String]> {
        let entity = self.lookup(parent, element)?;
        match xsi_type {
            Some(t) => entity.subtypes.get(t).map(Vec::as_slice),
            None => Some(entity.fields.as_slice()),
        }
    }

    pub fn is_wrapped_list(&self, element: &str) -> bool {
        self.wrapped_lists.contains(element)
    }

    pub fn len(&self) -> usize {
        self.entities.len() + self.scoped.values().map(HashMap::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.scoped.is_empty()
    }
}
