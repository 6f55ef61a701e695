use crate::{
    error::WidgetError,
    storage::{KeyValueStore, RECENT_SEARCHES_KEY},
};

/// Upper bound on remembered searches.
pub const MAX_RECENT: usize = 5;

/// Most-recent-first list of unique city names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecentSearches {
    entries: Vec<String>,
}

impl RecentSearches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from stored entries, dropping duplicates and anything past the bound.
    pub fn from_entries(entries: impl IntoIterator<Item = String>) -> Self {
        let mut deduped: Vec<String> = Vec::with_capacity(MAX_RECENT);
        for city in entries {
            if !deduped.contains(&city) {
                deduped.push(city);
            }
        }
        deduped.truncate(MAX_RECENT);
        Self { entries: deduped }
    }

    /// Read the list from storage. Absent, unreadable or unparseable data
    /// loads as an empty list.
    pub async fn load(store: &dyn KeyValueStore) -> Self {
        Self::try_load(store).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read recent searches");
            Self::new()
        })
    }

    /// Like [`RecentSearches::load`], but reports a storage failure instead
    /// of hiding it. Unparseable data still loads as an empty list.
    pub async fn try_load(store: &dyn KeyValueStore) -> Result<Self, WidgetError> {
        let Some(raw) = store.get(RECENT_SEARCHES_KEY).await? else {
            return Ok(Self::new());
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(entries) => Ok(Self::from_entries(entries)),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unparseable recent searches");
                Ok(Self::new())
            }
        }
    }

    /// Move `city` to the front, evicting the oldest entry past the bound.
    pub fn record(&mut self, city: &str) {
        self.entries.retain(|c| c != city);
        self.entries.insert(0, city.to_string());
        self.entries.truncate(MAX_RECENT);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Write `entries` back as a JSON array.
pub async fn persist(store: &dyn KeyValueStore, entries: &[String]) -> Result<(), WidgetError> {
    let json = serde_json::to_string(entries)
        .map_err(|e| WidgetError::StorageUnavailable(e.to_string()))?;
    store.set(RECENT_SEARCHES_KEY, &json).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn record_moves_existing_entry_to_front() {
        let mut recent = RecentSearches::new();
        recent.record("Paris");
        recent.record("Oslo");
        recent.record("Paris");

        assert_eq!(recent.entries(), ["Paris", "Oslo"]);
    }

    #[test]
    fn record_evicts_oldest_past_bound() {
        let mut recent = RecentSearches::new();
        for city in ["A", "B", "C", "D", "E", "F"] {
            recent.record(city);
        }

        assert_eq!(recent.len(), MAX_RECENT);
        assert_eq!(recent.entries(), ["F", "E", "D", "C", "B"]);
    }

    #[test]
    fn re_adding_at_capacity_does_not_evict() {
        let mut recent = RecentSearches::new();
        for city in ["A", "B", "C", "D", "E"] {
            recent.record(city);
        }
        recent.record("A");

        assert_eq!(recent.entries(), ["A", "E", "D", "C", "B"]);
    }

    #[test]
    fn from_entries_normalises_stored_list() {
        let stored = ["A", "B", "A", "C", "D", "E", "F"].map(String::from);
        let recent = RecentSearches::from_entries(stored);

        assert_eq!(recent.entries(), ["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn load_and_persist_round_through_storage() {
        let store = MemoryStore::new().with_entry(RECENT_SEARCHES_KEY, r#"["Rome","Berlin"]"#);

        let mut recent = RecentSearches::load(&store).await;
        assert_eq!(recent.entries(), ["Rome", "Berlin"]);

        recent.record("Berlin");
        persist(&store, recent.entries()).await.unwrap();
        assert_eq!(store.snapshot(RECENT_SEARCHES_KEY).as_deref(), Some(r#"["Berlin","Rome"]"#));
    }

    #[tokio::test]
    async fn load_degrades_to_empty() {
        let garbage = MemoryStore::new().with_entry(RECENT_SEARCHES_KEY, "{not a list");
        assert!(RecentSearches::load(&garbage).await.is_empty());

        assert!(RecentSearches::load(&MemoryStore::unavailable()).await.is_empty());
        assert!(RecentSearches::try_load(&garbage).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn try_load_reports_unavailable_storage() {
        let err = RecentSearches::try_load(&MemoryStore::unavailable()).await.unwrap_err();
        assert!(matches!(err, WidgetError::StorageUnavailable(_)));
    }
}
