//! Tag-addressed read cache.
//!
//! Entries are stored under a [`CacheKey`] and labelled with one or more
//! [`Tag`]s. Invalidating a tag evicts every entry carrying it. Entries are
//! only ever repopulated lazily by the next read. Storage is a bounded moka
//! cache, so entries also age out and are evicted under capacity pressure.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use dashmap::DashMap;
use moka::sync::Cache;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Customers,
    Customer(Uuid),
    Products,
    Product(Uuid),
    Users,
    User(Uuid),
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Customers => write!(f, "customersCache"),
            Tag::Customer(id) => write!(f, "customerCache-{id}"),
            Tag::Products => write!(f, "productsCache"),
            Tag::Product(id) => write!(f, "productCache-{id}"),
            Tag::Users => write!(f, "usersCache"),
            Tag::User(id) => write!(f, "userCache-{id}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    CustomerList { page: u32, limit: u32 },
    Customer(Uuid),
    CustomerAggregate(Uuid),
    ProductList { tenant: Uuid, page: u32, limit: u32 },
    Product(Uuid),
    UserList { tenant: Uuid, page: u32, limit: u32 },
    User(Uuid),
}

pub struct TagCache<V> {
    entries: Cache<CacheKey, V>,
    /// Keys stored under each tag. May still list keys moka has since evicted;
    /// those are pruned every `PRUNE_EVERY` stores.
    index: DashMap<Tag, HashSet<CacheKey>>,
    /// Index mutations only happen while this lock is held.
    books: Mutex<Books>,
}

#[derive(Default)]
struct Books {
    /// Bumped by every invalidation. A populate only stores its value if no
    /// invalidation happened while it was fetching.
    generation: u64,
    stores: u64,
}

const PRUNE_EVERY: u64 = 1024;

impl<V: Clone + Send + Sync + 'static> TagCache<V> {
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
            index: DashMap::new(),
            books: Mutex::new(Books::default()),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<V> {
        self.entries.get(key)
    }

    /// Return the cached value for `key`, or run `fetch`, tag its result with
    /// `tags` and store it. Errors from `fetch` are returned and never cached.
    pub async fn get_or_try_insert_with<F, Fut, E>(
        &self,
        key: CacheKey,
        tags: impl FnOnce(&V) -> Vec<Tag>,
        fetch: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key) {
            tracing::trace!(?key, "cache hit");
            return Ok(hit);
        }

        let started_at = self.lock_books().generation;
        let value = fetch().await?;
        let tags = tags(&value);
        self.store(key, &tags, value.clone(), started_at);
        Ok(value)
    }

    /// Evict every entry carrying any of `tags`. Returns how many entries were
    /// removed.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        let mut books = self.lock_books();
        books.generation += 1;

        let mut evicted = 0;
        for tag in tags {
            if let Some((_, keys)) = self.index.remove(tag) {
                for key in keys {
                    if self.entries.remove(&key).is_some() {
                        evicted += 1;
                    }
                }
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn store(&self, key: CacheKey, tags: &[Tag], value: V, started_at: u64) {
        let mut books = self.lock_books();
        if books.generation != started_at {
            tracing::debug!(?key, "skipping cache store, invalidated during fetch");
            return;
        }

        self.entries.insert(key, value);
        for tag in tags {
            self.index.entry(*tag).or_default().insert(key);
        }

        books.stores += 1;
        if books.stores % PRUNE_EVERY == 0 {
            self.prune_index();
        }
    }

    /// Drop index keys whose entries were evicted for capacity or age.
    /// Caller holds the books lock.
    fn prune_index(&self) {
        self.entries.run_pending_tasks();
        self.index.retain(|_, keys| {
            keys.retain(|key| self.entries.contains_key(key));
            !keys.is_empty()
        });
    }

    fn lock_books(&self) -> MutexGuard<'_, Books> {
        // The counters stay consistent even if a holder panicked.
        self.books
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_on<F: Future>(fut: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(fut)
    }

    #[test]
    fn miss_then_hit() {
        let cache: TagCache<String> = TagCache::new(100, Duration::from_secs(60));
        let key = CacheKey::Product(Uuid::now_v7());

        let first: Result<_, ()> = block_on(cache.get_or_try_insert_with(
            key,
            |_| vec![Tag::Products],
            || async { Ok("v1".to_string()) },
        ));
        assert_eq!(first.unwrap(), "v1");

        let second: Result<_, ()> = block_on(cache.get_or_try_insert_with(
            key,
            |_| vec![Tag::Products],
            || async { Ok("v2".to_string()) },
        ));
        assert_eq!(second.unwrap(), "v1");
    }

    #[test]
    fn invalidating_a_tag_evicts_all_carriers() {
        let cache: TagCache<u32> = TagCache::new(100, Duration::from_secs(60));
        let tenant = Uuid::now_v7();
        let product = Uuid::now_v7();

        cache.store(CacheKey::ProductList { tenant, page: 1, limit: 5 }, &[Tag::Products, Tag::Customer(tenant)], 1, 0);
        cache.store(CacheKey::Product(product), &[Tag::Product(product), Tag::Customer(tenant)], 2, 0);
        cache.store(CacheKey::CustomerList { page: 1, limit: 5 }, &[Tag::Customers], 3, 0);

        assert_eq!(cache.invalidate(&[Tag::Customer(tenant)]), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&CacheKey::CustomerList { page: 1, limit: 5 }).is_some());
    }

    #[test]
    fn unknown_tag_is_a_noop() {
        let cache: TagCache<u32> = TagCache::new(100, Duration::from_secs(60));
        cache.store(CacheKey::User(Uuid::nil()), &[Tag::User(Uuid::nil())], 1, 0);
        assert_eq!(cache.invalidate(&[Tag::Users]), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let cache: TagCache<u32> = TagCache::new(100, Duration::from_secs(60));
        let key = CacheKey::User(Uuid::now_v7());

        let failed: Result<u32, &str> =
            block_on(cache.get_or_try_insert_with(key, |_| vec![Tag::Users], || async { Err("missing") }));
        assert!(failed.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn populate_racing_an_invalidation_is_not_stored() {
        let cache: TagCache<u32> = TagCache::new(100, Duration::from_secs(60));
        let key = CacheKey::User(Uuid::now_v7());

        let value: Result<u32, ()> = block_on(cache.get_or_try_insert_with(
            key,
            |_| vec![Tag::Users],
            || async {
                // A write lands while this read is still fetching.
                cache.invalidate(&[Tag::Users]);
                Ok(7)
            },
        ));

        assert_eq!(value.unwrap(), 7);
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn tag_names() {
        let id = Uuid::nil();
        assert_eq!(Tag::Users.to_string(), "usersCache");
        assert_eq!(Tag::User(id).to_string(), format!("userCache-{id}"));
        assert_eq!(Tag::Customer(id).to_string(), format!("customerCache-{id}"));
    }

    #[test]
    fn capacity_bounds_entries_and_index() {
        let cache: TagCache<u32> = TagCache::new(10, Duration::from_secs(60));
        let tenant = Uuid::now_v7();

        for page in 0..(2 * PRUNE_EVERY as u32) {
            cache.store(
                CacheKey::ProductList { tenant, page, limit: 5 },
                &[Tag::Products, Tag::Customer(tenant)],
                page,
                0,
            );
        }

        assert!(cache.len() <= 10);
        let indexed = cache.index.get(&Tag::Products).map_or(0, |keys| keys.len());
        assert!(indexed <= 10, "index kept {indexed} keys");
    }

    #[test]
    fn entries_expire() {
        let cache: TagCache<u32> = TagCache::new(10, Duration::from_millis(50));
        let key = CacheKey::User(Uuid::now_v7());
        cache.store(key, &[Tag::Users], 1, 0);
        assert_eq!(cache.get(&key), Some(1));

        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.get(&key), None);
    }
}
