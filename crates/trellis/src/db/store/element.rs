use crate::{db::element::Element, types::ElementId};
use derive_more::{Deref, DerefMut};
use std::collections::BTreeMap;

///
/// ElementStore
///
/// Ordered row store for elements, keyed by id. Populated by content
/// services; the query layer only reads.
///

#[derive(Debug, Default, Deref, DerefMut)]
pub struct ElementStore(BTreeMap<ElementId, Element>);

impl ElementStore {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or replace a row, keyed by the element's own id.
    pub fn save(&mut self, element: Element) {
        self.0.insert(element.id, element);
    }

    #[must_use]
    pub fn row(&self, id: ElementId) -> Option<&Element> {
        self.0.get(&id)
    }

    /// All element ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.0.keys().copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Element> {
        self.0.values()
    }
}
