//! The canonical, always-sorted entry collection and its identity index.

use crate::domain::{Entry, EntryId, RawEntry};
use std::collections::{HashMap, HashSet};

/// Case-folds text for prefix matching.
///
/// Lowercases one character at a time so the result never depends on the
/// surrounding word, and maps the Greek final sigma to its medial form.
/// `"ΟΔΟΣ"`, `"οδος"` and `"οδοσ"` all fold to the same string.
#[must_use]
pub fn fold_case(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ς' { 'σ' } else { c })
        .collect()
}

/// Sorted entries plus the `id → position` index and case-folded names.
///
/// Built once per successful fetch by [`Collection::merge`] and replaced
/// wholesale on the next one. Positions never change in between: favorite
/// toggles mutate entries in place and never re-sort.
#[derive(Debug, Clone, Default)]
pub struct Collection {
    entries: Vec<Entry>,
    folded_names: Vec<String>,
    index: HashMap<EntryId, usize>,
    skipped: usize,
}

impl Collection {
    /// Merges a raw catalog with the persisted favorite keys.
    ///
    /// Every valid raw entry appears exactly once, flagged favorite iff its id
    /// is in `favorites`. Records with a blank name or out-of-range
    /// coordinates are skipped, as are repeated ids (first occurrence wins).
    /// The result is sorted by [`Entry::canonical_cmp`].
    ///
    /// # Examples
    ///
    /// ```
    /// use citydex::domain::{EntryId, RawEntry};
    /// use citydex::engine::Collection;
    /// use std::collections::HashSet;
    ///
    /// let raw = vec![
    ///     RawEntry::new(2, "Paris", "FR", 48.85, 2.35),
    ///     RawEntry::new(1, "Buenos Aires", "AR", -34.6, -58.4),
    /// ];
    /// let collection = Collection::merge(raw, &HashSet::from([EntryId(2)]));
    /// let names: Vec<&str> = collection.entries().iter().map(|e| &*e.name).collect();
    /// assert_eq!(names, ["Buenos Aires", "Paris"]);
    /// assert!(collection.get(EntryId(2)).unwrap().is_favorite);
    /// ```
    #[must_use]
    pub fn merge(raw: Vec<RawEntry>, favorites: &HashSet<EntryId>) -> Self {
        let _span = tracing::debug_span!("merge_catalog",
            raw_count = raw.len(),
            favorite_count = favorites.len()
        ).entered();

        let mut seen = HashSet::with_capacity(raw.len());
        let mut skipped = 0;
        let mut entries = Vec::with_capacity(raw.len());

        for record in raw {
            if let Err(reason) = record.validate() {
                tracing::warn!(id = record.id, name = %record.name, reason, "skipping catalog record");
                skipped += 1;
                continue;
            }
            if !seen.insert(record.id) {
                tracing::warn!(id = record.id, "skipping duplicate catalog id");
                skipped += 1;
                continue;
            }
            let is_favorite = favorites.contains(&record.entry_id());
            entries.push(record.into_entry(is_favorite));
        }

        entries.sort_by(Entry::canonical_cmp);

        let folded_names = entries.iter().map(|e| fold_case(&e.name)).collect();
        let index = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.id, position))
            .collect();

        tracing::debug!(entries = entries.len(), skipped, "catalog merged");

        Self {
            entries,
            folded_names,
            index,
            skipped,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in canonical order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Number of raw records rejected during the merge.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    #[must_use]
    pub fn position(&self, id: EntryId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.position(id).map(|position| &self.entries[position])
    }

    #[must_use]
    pub fn at(&self, position: usize) -> Option<&Entry> {
        self.entries.get(position)
    }

    /// Case-folded name at `position`, used for prefix matching.
    #[must_use]
    pub fn folded_name(&self, position: usize) -> Option<&str> {
        self.folded_names.get(position).map(String::as_str)
    }

    #[must_use]
    pub fn favorite_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_favorite).count()
    }

    /// Sets the favorite flag in place. Returns the updated entry, or `None`
    /// if `id` is not in the collection.
    pub fn set_favorite(&mut self, id: EntryId, is_favorite: bool) -> Option<&Entry> {
        let position = self.position(id)?;
        let entry = &mut self.entries[position];
        entry.is_favorite = is_favorite;
        Some(entry)
    }
}
