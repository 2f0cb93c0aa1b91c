use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::{BannerData, Database, DatabaseError};

/// An in-memory copy of every banner, so listing pages never touches the database.
///
/// Refreshes are serialized, and readers always see either the old or the new
/// snapshot as a whole.
pub struct BannerCache<Db> {
    db: Arc<Db>,
    page_size: usize,
    snapshot: RwLock<Arc<BannerSnapshot>>,
    refreshing: Mutex<()>,
}

/// All banners at one point in time, in creation order
#[derive(Debug, Default)]
pub struct BannerSnapshot {
    banners: Vec<BannerData>,
    max_page: usize,
}

/// One page of banners
#[derive(Debug, Clone)]
pub struct BannerPage {
    pub banners: Vec<BannerData>,
    /// The page that was actually returned, after clamping
    pub page: usize,
    pub max_page: usize,
    /// How many banners exist in total
    pub total: usize,
}

impl<Db> BannerCache<Db>
where
    Db: Database,
{
    /// Creates an empty cache, call [BannerCache::refresh] to fill it
    pub fn new(db: &Arc<Db>, page_size: usize) -> Self {
        Self {
            db: db.clone(),
            page_size: page_size.max(1),
            snapshot: Default::default(),
            refreshing: Mutex::new(()),
        }
    }

    /// Replaces the cached banners with what is currently in the database.
    /// On failure the previous snapshot stays in place.
    pub async fn refresh(&self) -> Result<(), DatabaseError> {
        let _guard = self.refreshing.lock().await;

        let banners = self.db.list_banners().await?;
        let snapshot = BannerSnapshot::new(banners, self.page_size);

        *self.snapshot.write() = Arc::new(snapshot);
        Ok(())
    }

    pub fn snapshot(&self) -> Arc<BannerSnapshot> {
        self.snapshot.read().clone()
    }

    /// Returns page `n` (1-based), clamped to the pages that exist
    pub fn page(&self, n: usize) -> BannerPage {
        self.snapshot().page(n, self.page_size)
    }
}

impl BannerSnapshot {
    pub fn new(banners: Vec<BannerData>, page_size: usize) -> Self {
        let max_page = banners.len().div_ceil(page_size.max(1));

        Self { banners, max_page }
    }

    pub fn banners(&self) -> &[BannerData] {
        &self.banners
    }

    pub fn len(&self) -> usize {
        self.banners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banners.is_empty()
    }

    pub fn max_page(&self) -> usize {
        self.max_page
    }

    pub fn page(&self, n: usize, page_size: usize) -> BannerPage {
        let page_size = page_size.max(1);
        let page = n.clamp(1, self.max_page.max(1));

        let total = self.banners.len();
        let start = ((page - 1) * page_size).min(total);
        let end = (page * page_size).min(total);

        BannerPage {
            banners: self.banners[start..end].to_vec(),
            page,
            max_page: self.max_page,
            total,
        }
    }
}

/// Parses a page request parameter, anything that isn't a positive number is page 1
pub fn requested_page(param: Option<&str>) -> usize {
    param
        .and_then(|p| p.trim().parse::<usize>().ok())
        .filter(|&p| p > 0)
        .unwrap_or(1)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::{
        testutil::{banner, FakeDatabase},
        Database,
    };

    use super::{requested_page, BannerCache, BannerSnapshot};

    fn titles(banners: &[crate::BannerData]) -> Vec<String> {
        banners.iter().map(|b| b.title.clone()).collect()
    }

    #[test]
    fn empty_snapshot_has_no_pages() {
        let snapshot = BannerSnapshot::new(vec![], 9);

        assert_eq!(snapshot.max_page(), 0);

        for n in [0, 1, 2, 100] {
            let page = snapshot.page(n, 9);
            assert!(page.banners.is_empty());
            assert_eq!(page.max_page, 0);
            assert_eq!(page.total, 0);
        }
    }

    #[test]
    fn pages_are_windows_over_the_banners() {
        let banners = (1..=20).map(|i| banner(i, &format!("b{i}"))).collect();
        let snapshot = BannerSnapshot::new(banners, 9);

        assert_eq!(snapshot.max_page(), 3);

        let first = snapshot.page(1, 9);
        assert_eq!(first.banners.len(), 9);
        assert_eq!(first.banners[0].title, "b1");

        let last = snapshot.page(3, 9);
        assert_eq!(titles(&last.banners), vec!["b19", "b20"]);
    }

    #[test]
    fn out_of_range_pages_are_clamped() {
        let banners = (1..=10).map(|i| banner(i, &format!("b{i}"))).collect();
        let snapshot = BannerSnapshot::new(banners, 5);

        assert_eq!(snapshot.page(0, 5).page, 1);
        assert_eq!(snapshot.page(7, 5).page, 2);
        assert_eq!(titles(&snapshot.page(7, 5).banners), titles(&snapshot.page(2, 5).banners));
    }

    #[test]
    fn bad_page_parameters_mean_page_one() {
        assert_eq!(requested_page(None), 1);
        assert_eq!(requested_page(Some("")), 1);
        assert_eq!(requested_page(Some("abc")), 1);
        assert_eq!(requested_page(Some("-3")), 1);
        assert_eq!(requested_page(Some("0")), 1);
        assert_eq!(requested_page(Some("4")), 4);
    }

    #[tokio::test]
    async fn refresh_picks_up_new_banners() {
        let db = Arc::new(FakeDatabase::default());
        let cache = BannerCache::new(&db, 2);

        cache.refresh().await.unwrap();
        assert!(cache.snapshot().is_empty());

        db.push(banner(1, "one"));
        db.push(banner(2, "two"));
        db.push(banner(3, "three"));

        // Nothing changes until the cache is refreshed
        assert!(cache.snapshot().is_empty());

        cache.refresh().await.unwrap();
        let snapshot = cache.snapshot();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.max_page(), 2);
        assert_eq!(titles(&cache.page(2).banners), vec!["three"]);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_snapshot() {
        let db = Arc::new(FakeDatabase::default());
        let cache = BannerCache::new(&db, 9);

        db.push(banner(1, "one"));
        cache.refresh().await.unwrap();

        db.push(banner(2, "two"));
        db.set_failing(true);

        assert!(cache.refresh().await.is_err());
        assert_eq!(titles(cache.snapshot().banners()), vec!["one"]);
    }

    #[tokio::test]
    async fn concurrent_refreshes_end_up_consistent() {
        let db = Arc::new(FakeDatabase::default());
        let cache = Arc::new(BannerCache::new(&db, 4));

        let tasks: Vec<_> = (1..=16)
            .map(|i| {
                let db = db.clone();
                let cache = cache.clone();

                tokio::spawn(async move {
                    db.push(banner(i, &format!("b{i}")));
                    cache.refresh().await.unwrap();

                    let snapshot = cache.snapshot();
                    assert_eq!(snapshot.max_page(), snapshot.len().div_ceil(4));
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(cache.snapshot().len(), 16);
        assert_eq!(db.count_banners().await.unwrap(), 16);
    }
}
