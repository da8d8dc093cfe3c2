//! Query parameters and the derived query view.
//!
//! The view is an order-preserving subsequence of the canonical collection,
//! stored as canonical positions. It is recomputed from scratch whenever a
//! parameter changes and is never edited in place.
//!
//! # Matching Rules
//!
//! - The prefix matches the start of `name` only (never `country`, never a substring)
//! - Matching is case-insensitive (both sides folded with [`fold_case`])
//! - An empty prefix matches everything
//! - With `favorite_only`, non-favorites are dropped after prefix matching

use super::collection::{fold_case, Collection};

/// Current search parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub search_prefix: String,
    pub favorite_only: bool,
}

impl QueryParams {
    #[must_use]
    pub fn new(search_prefix: impl Into<String>, favorite_only: bool) -> Self {
        Self {
            search_prefix: search_prefix.into(),
            favorite_only,
        }
    }
}

/// Canonical positions of the entries matching a [`QueryParams`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryView {
    positions: Vec<usize>,
}

impl QueryView {
    /// Linear scan of the collection; canonical order is kept, so no sort is needed.
    ///
    /// # Examples
    ///
    /// ```
    /// use citydex::domain::RawEntry;
    /// use citydex::engine::{Collection, QueryParams, QueryView};
    /// use std::collections::HashSet;
    ///
    /// let collection = Collection::merge(
    ///     vec![
    ///         RawEntry::new(1, "Buenos Aires", "AR", -34.6, -58.4),
    ///         RawEntry::new(2, "New York", "US", 40.7, -74.0),
    ///         RawEntry::new(3, "Paris", "FR", 48.9, 2.4),
    ///     ],
    ///     &HashSet::new(),
    /// );
    /// let view = QueryView::compute(&collection, &QueryParams::new("NEW", false));
    /// let names: Vec<&str> = view.entries(&collection).map(|e| &*e.name).collect();
    /// assert_eq!(names, ["New York"]);
    /// ```
    #[must_use]
    pub fn compute(collection: &Collection, params: &QueryParams) -> Self {
        let _span = tracing::debug_span!("compute_query_view",
            total = collection.len(),
            prefix_len = params.search_prefix.len(),
            favorite_only = params.favorite_only
        ).entered();

        let prefix = fold_case(&params.search_prefix);

        let positions: Vec<usize> = collection
            .entries()
            .iter()
            .enumerate()
            .filter(|(position, entry)| {
                (prefix.is_empty()
                    || collection
                        .folded_name(*position)
                        .is_some_and(|name| name.starts_with(&prefix)))
                    && (!params.favorite_only || entry.is_favorite)
            })
            .map(|(position, _)| position)
            .collect();

        tracing::debug!(matched = positions.len(), "query view computed");
        Self { positions }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Canonical positions, ascending.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[must_use]
    pub fn first(&self) -> Option<usize> {
        self.positions.first().copied()
    }

    /// Whether the canonical `position` is part of the view.
    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        self.positions.binary_search(&position).is_ok()
    }

    /// Iterates the matching entries in canonical order.
    pub fn entries<'a>(
        &'a self,
        collection: &'a Collection,
    ) -> impl Iterator<Item = &'a crate::domain::Entry> + 'a {
        self.positions
            .iter()
            .filter_map(move |&position| collection.at(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryId, RawEntry};
    use std::collections::HashSet;

    fn collection() -> Collection {
        Collection::merge(
            vec![
                RawEntry::new(1, "Buenos Aires", "AR", -34.6037, -58.3816),
                RawEntry::new(2, "New York", "US", 40.7128, -74.0060),
                RawEntry::new(3, "Paris", "FR", 48.8566, 2.3522),
                RawEntry::new(4, "Newark", "US", 40.73, -74.17),
                RawEntry::new(5, "Sydney", "AU", -33.86, 151.2),
            ],
            &HashSet::from([EntryId(1), EntryId(3)]),
        )
    }

    fn names(view: &QueryView, collection: &Collection) -> Vec<String> {
        view.entries(collection).map(|e| e.name.to_string()).collect()
    }

    #[test]
    fn empty_prefix_matches_everything() {
        let c = collection();
        let view = QueryView::compute(&c, &QueryParams::default());
        assert_eq!(view.len(), c.len());
    }

    #[test]
    fn prefix_is_anchored_at_start_of_name() {
        let c = collection();
        // "york" is a substring of "New York" but not a prefix.
        assert!(QueryView::compute(&c, &QueryParams::new("york", false)).is_empty());
        // Country codes are never matched.
        assert!(QueryView::compute(&c, &QueryParams::new("AU", false)).is_empty());
        assert_eq!(
            names(&QueryView::compute(&c, &QueryParams::new("new", false)), &c),
            vec!["New York", "Newark"]
        );
    }

    #[test]
    fn favorite_filter_composes_with_prefix() {
        let c = collection();
        assert_eq!(
            names(&QueryView::compute(&c, &QueryParams::new("", true)), &c),
            vec!["Buenos Aires", "Paris"]
        );
        assert_eq!(
            names(&QueryView::compute(&c, &QueryParams::new("paris", true)), &c),
            vec!["Paris"]
        );
        assert!(QueryView::compute(&c, &QueryParams::new("New", true)).is_empty());
    }

    #[test]
    fn view_is_an_ordered_subsequence() {
        let c = collection();
        for prefix in ["", "n", "ne", "p", "x"] {
            for favorite_only in [false, true] {
                let view = QueryView::compute(&c, &QueryParams::new(prefix, favorite_only));
                assert!(view.positions().windows(2).all(|w| w[0] < w[1]));
                for &position in view.positions() {
                    assert!(view.contains(position));
                }
            }
        }
    }

    #[test]
    fn greek_sigma_matches_in_any_case() {
        let c = Collection::merge(
            vec![
                RawEntry::new(1, "ΟΔΟΣΑ", "GR", 38.0, 23.7),
                RawEntry::new(2, "Οδος", "GR", 38.1, 23.8),
            ],
            &HashSet::new(),
        );
        for prefix in ["ΟΔΟΣ", "οδοσ", "οδος"] {
            let view = QueryView::compute(&c, &QueryParams::new(prefix, false));
            assert_eq!(view.len(), 2, "prefix {prefix}");
        }
        assert_eq!(QueryView::compute(&c, &QueryParams::new("ΟΔΟΣΑ", false)).len(), 1);
    }
}
