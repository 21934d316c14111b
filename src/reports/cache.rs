//! Revision-tagged cache of computed reports.

use std::collections::HashMap;
use std::hash::Hash;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use super::aggregate::{FleetOverview, RestaurantReport};
use crate::realtime::Invalidation;

/// Per-map bound; a full map is emptied before the next insert.
const MAX_ENTRIES: usize = 256;

#[derive(Debug, Clone)]
struct Cached<T> {
    revision_id: i64,
    value: T,
}

/// Insert an entry, dropping entries from older revisions, which can never
/// be served again.
fn insert_current<K: Eq + Hash, T>(map: &mut HashMap<K, Cached<T>>, key: K, entry: Cached<T>) {
    map.retain(|_, cached| cached.revision_id >= entry.revision_id);
    if map.len() >= MAX_ENTRIES && !map.contains_key(&key) {
        map.clear();
    }
    map.insert(key, entry);
}

/// Computed overviews and restaurant reports.
///
/// An entry is only served while its revision equals the store's current
/// revision; invalidation frees memory early.
#[derive(Default)]
pub struct ReportCache {
    overviews: RwLock<HashMap<NaiveDate, Cached<FleetOverview>>>,
    restaurants: RwLock<HashMap<(String, NaiveDate), Cached<RestaurantReport>>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn overview(&self, date: NaiveDate, current_revision: i64) -> Option<FleetOverview> {
        let overviews = self.overviews.read().await;
        overviews
            .get(&date)
            .filter(|cached| cached.revision_id == current_revision)
            .map(|cached| cached.value.clone())
    }

    pub async fn store_overview(&self, overview: &FleetOverview) {
        let mut overviews = self.overviews.write().await;
        insert_current(
            &mut overviews,
            overview.date,
            Cached {
                revision_id: overview.revision_id,
                value: overview.clone(),
            },
        );
    }

    pub async fn restaurant(
        &self,
        restaurant_id: &str,
        date: NaiveDate,
        current_revision: i64,
    ) -> Option<RestaurantReport> {
        let restaurants = self.restaurants.read().await;
        restaurants
            .get(&(restaurant_id.to_string(), date))
            .filter(|cached| cached.revision_id == current_revision)
            .map(|cached| cached.value.clone())
    }

    pub async fn store_restaurant(&self, report: &RestaurantReport) {
        let mut restaurants = self.restaurants.write().await;
        insert_current(
            &mut restaurants,
            (report.restaurant.id.clone(), report.date),
            Cached {
                revision_id: report.revision_id,
                value: report.clone(),
            },
        );
    }

    /// Evict what an invalidation covers. Returns the number of evicted entries.
    ///
    /// Any restaurant change affects the fleet overview, so overviews are
    /// always dropped.
    pub async fn invalidate(&self, invalidation: &Invalidation) -> usize {
        if invalidation.is_noop() {
            return 0;
        }

        let mut overviews = self.overviews.write().await;
        let mut evicted = overviews.len();
        overviews.clear();
        drop(overviews);

        let mut restaurants = self.restaurants.write().await;
        let before = restaurants.len();
        if invalidation.everything {
            restaurants.clear();
        } else {
            restaurants.retain(|(restaurant_id, _), _| {
                !invalidation.restaurants.contains(restaurant_id)
            });
        }
        evicted += before - restaurants.len();
        evicted
    }

    pub async fn entry_count(&self) -> usize {
        self.overviews.read().await.len() + self.restaurants.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::aggregate::{FleetTotals, RestaurantStat, RestaurantSummary};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
    }

    fn report_on(restaurant_id: &str, day: NaiveDate, revision_id: i64) -> RestaurantReport {
        RestaurantReport {
            date: day,
            ..report(restaurant_id, revision_id)
        }
    }

    fn overview(revision_id: i64) -> FleetOverview {
        FleetOverview {
            date: date(),
            revision_id,
            ranking: vec![],
            unassigned: vec![],
            totals: FleetTotals {
                total_expected: 0,
                total_completed: 0,
                total_percentage: 0.0,
                total_percentage_display: 0,
            },
        }
    }

    fn report(restaurant_id: &str, revision_id: i64) -> RestaurantReport {
        RestaurantReport {
            restaurant: RestaurantSummary {
                id: restaurant_id.to_string(),
                name: restaurant_id.to_uppercase(),
                active: true,
            },
            date: date(),
            revision_id,
            stat: RestaurantStat {
                restaurant_id: restaurant_id.to_string(),
                name: restaurant_id.to_uppercase(),
                expected: 0,
                completed: 0,
                missing: 0,
                unassigned_completed: 0,
                percentage: 0.0,
                percentage_display: 0,
                has_activity: false,
                submission_count: 0,
            },
            completed: vec![],
            missing: vec![],
        }
    }

    #[tokio::test]
    async fn test_hit_requires_matching_revision() {
        let cache = ReportCache::new();
        cache.store_overview(&overview(4)).await;

        assert!(cache.overview(date(), 4).await.is_some());
        assert!(cache.overview(date(), 5).await.is_none());
        assert!(cache.overview(date().succ_opt().unwrap(), 4).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidation_evicts_only_named_restaurants() {
        let cache = ReportCache::new();
        cache.store_overview(&overview(1)).await;
        cache.store_restaurant(&report("r1", 1)).await;
        cache.store_restaurant(&report("r2", 1)).await;

        let mut invalidation = Invalidation::default();
        invalidation.restaurants.insert("r1".to_string());
        invalidation.events = 1;

        assert_eq!(cache.invalidate(&invalidation).await, 2);
        assert!(cache.restaurant("r1", date(), 1).await.is_none());
        assert!(cache.restaurant("r2", date(), 1).await.is_some());
        assert_eq!(cache.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_everything_and_noop_invalidations() {
        let cache = ReportCache::new();
        cache.store_restaurant(&report("r1", 1)).await;

        assert_eq!(cache.invalidate(&Invalidation::default()).await, 0);
        assert_eq!(cache.entry_count().await, 1);

        let invalidation = Invalidation {
            everything: true,
            ..Default::default()
        };
        assert_eq!(cache.invalidate(&invalidation).await, 1);
        assert_eq!(cache.entry_count().await, 0);
    }

    #[tokio::test]
    async fn test_storing_newer_revision_drops_older_entries() {
        let cache = ReportCache::new();
        let next_day = date().succ_opt().unwrap();
        cache.store_restaurant(&report_on("r1", date(), 1)).await;
        cache.store_restaurant(&report_on("r2", next_day, 1)).await;
        assert_eq!(cache.entry_count().await, 2);

        cache.store_restaurant(&report_on("r1", next_day, 2)).await;
        assert_eq!(cache.entry_count().await, 1);
        assert!(cache.restaurant("r1", next_day, 2).await.is_some());
    }

    #[tokio::test]
    async fn test_entries_per_map_are_bounded() {
        let cache = ReportCache::new();
        let mut day = date();
        for _ in 0..MAX_ENTRIES + 10 {
            cache.store_restaurant(&report_on("r1", day, 1)).await;
            day = day.succ_opt().unwrap();
        }
        let count = cache.entry_count().await;
        assert!(count <= MAX_ENTRIES, "{} entries", count);
        assert!(count > 0);
    }
}
