use dashmap::DashMap;
use log::debug;
use std::time::{Duration, Instant};

use super::market_data_model::{PriceCacheKey, PriceHistory};
use super::market_data_traits::PriceCacheTrait;
use crate::constants::DEFAULT_PRICE_CACHE_MAX_ENTRIES;

struct CachedHistory {
    history: PriceHistory,
    inserted_at: Instant,
}

/// Process-local TTL cache for price histories.
///
/// Expired entries are swept on every insert. When the cache is still full
/// the oldest entries are dropped to stay within `max_entries`.
pub struct InMemoryPriceCache {
    entries: DashMap<PriceCacheKey, CachedHistory>,
    ttl: Duration,
    max_entries: usize,
}

impl InMemoryPriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_max_entries(ttl, DEFAULT_PRICE_CACHE_MAX_ENTRIES)
    }

    pub fn with_max_entries(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &CachedHistory) -> bool {
        entry.inserted_at.elapsed() < self.ttl
    }

    /// Drops the oldest entries until one more insert fits.
    fn make_room(&self) {
        let excess = (self.entries.len() + 1).saturating_sub(self.max_entries);
        if excess == 0 {
            return;
        }
        let mut by_age: Vec<(Instant, PriceCacheKey)> = self
            .entries
            .iter()
            .map(|entry| (entry.inserted_at, entry.key().clone()))
            .collect();
        by_age.sort_by_key(|(inserted_at, _)| *inserted_at);
        for (_, key) in by_age.into_iter().take(excess) {
            self.entries.remove(&key);
        }
        debug!("Price cache full, dropped {} oldest histories", excess);
    }
}

impl PriceCacheTrait for InMemoryPriceCache {
    fn get(&self, key: &PriceCacheKey) -> Option<PriceHistory> {
        let fresh = self
            .entries
            .get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.history.clone());
        if fresh.is_none() {
            self.entries.remove_if(key, |_, entry| !self.is_fresh(entry));
        }
        fresh
    }

    fn set(&self, key: PriceCacheKey, history: PriceHistory) {
        self.evict_expired();
        if !self.entries.contains_key(&key) {
            self.make_room();
        }
        self.entries.insert(
            key,
            CachedHistory {
                history,
                inserted_at: Instant::now(),
            },
        );
    }

    fn evict_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Evicted {} expired price histories", removed);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PricePoint;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn key(ticker: &str) -> PriceCacheKey {
        PriceCacheKey::new(
            ticker,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
        )
    }

    fn history(ticker: &str) -> PriceHistory {
        PriceHistory::new(
            ticker,
            vec![PricePoint::new(
                NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
                dec!(10),
            )],
        )
    }

    #[test]
    fn test_get_returns_fresh_entry() {
        let cache = InMemoryPriceCache::new(Duration::from_secs(300));
        cache.set(key("A"), history("A"));
        assert_eq!(cache.get(&key("A")), Some(history("A")));
        assert_eq!(cache.get(&key("B")), None);
    }

    #[test]
    fn test_zero_ttl_never_serves() {
        let cache = InMemoryPriceCache::new(Duration::ZERO);
        cache.set(key("A"), history("A"));
        assert_eq!(cache.get(&key("A")), None);
        assert!(cache.is_empty());
    }

    fn sliding_key(ticker: &str, offset: i64) -> PriceCacheKey {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(offset);
        PriceCacheKey::new(ticker, start, start + chrono::Duration::days(30))
    }

    #[test]
    fn test_expired_entries_are_swept_on_insert() {
        let cache = InMemoryPriceCache::new(Duration::from_millis(1));
        for offset in 0..500 {
            cache.set(sliding_key("AAA", offset), history("AAA"));
            cache.set(sliding_key("BBB", offset), history("BBB"));
        }
        std::thread::sleep(Duration::from_millis(20));

        cache.set(key("A"), history("A"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_full_cache_drops_oldest_entries() {
        let cache = InMemoryPriceCache::with_max_entries(Duration::from_secs(300), 3);
        for offset in 0..5 {
            cache.set(sliding_key("AAA", offset), history("AAA"));
            std::thread::sleep(Duration::from_millis(2));
        }

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&sliding_key("AAA", 0)), None);
        assert_eq!(cache.get(&sliding_key("AAA", 1)), None);
        assert!(cache.get(&sliding_key("AAA", 4)).is_some());
    }

    #[test]
    fn test_overwriting_a_key_keeps_other_entries() {
        let cache = InMemoryPriceCache::with_max_entries(Duration::from_secs(300), 2);
        cache.set(key("A"), history("A"));
        cache.set(key("B"), history("B"));
        cache.set(key("B"), history("B"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key("A")).is_some());
    }

    #[test]
    fn test_evict_expired_counts_removed() {
        let cache = InMemoryPriceCache::new(Duration::from_millis(50));
        cache.set(key("A"), history("A"));
        cache.set(key("B"), history("B"));
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.evict_expired(), 2);
        assert_eq!(cache.len(), 0);
    }
}
