//! Explicit representation of optionally expanded relations.
//!
//! A manual may be read with or without its steps, and a step with or
//! without its images. `Relation` keeps those two states apart so callers
//! cannot mistake "not fetched" for "has none".

/// Child collection that is either loaded or deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation<T> {
    /// The collection was not fetched for this read.
    NotLoaded,
    /// The collection was fetched; it may be empty.
    Loaded(Vec<T>),
}

impl<T> Default for Relation<T> {
    fn default() -> Self {
        Self::NotLoaded
    }
}

impl<T> Relation<T> {
    /// Borrow the loaded items, if any were fetched.
    pub fn loaded(&self) -> Option<&[T]> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(items) => Some(items.as_slice()),
        }
    }

    /// Whether the relation was fetched.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    /// Consume the relation, yielding the items when loaded.
    pub fn into_loaded(self) -> Option<Vec<T>> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(items) => Some(items),
        }
    }

    /// Transform loaded items, preserving the not-loaded marker.
    pub fn map_items<U>(self, f: impl FnMut(T) -> U) -> Relation<U> {
        match self {
            Self::NotLoaded => Relation::NotLoaded,
            Self::Loaded(items) => Relation::Loaded(items.into_iter().map(f).collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn empty_loaded_relation_differs_from_not_loaded() {
        let empty: Relation<u8> = Relation::Loaded(Vec::new());
        assert!(empty.is_loaded());
        assert_eq!(empty.loaded(), Some(&[][..]));
        assert_eq!(Relation::<u8>::default().loaded(), None);
    }

    #[test]
    fn map_items_keeps_marker() {
        let mapped = Relation::<u8>::NotLoaded.map_items(u16::from);
        assert_eq!(mapped, Relation::NotLoaded);
        let doubled = Relation::Loaded(vec![1_u8, 2]).map_items(|v| v * 2);
        assert_eq!(doubled.into_loaded(), Some(vec![2, 4]));
    }
}
