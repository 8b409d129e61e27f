//! In-memory product store
//!
//! Stands in for MongoDB in tests and local experiments. It counts every
//! store operation and can be switched into failure modes, which makes the
//! gating and retry behaviour observable.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;

use crate::config::StoreConfig;

use super::{Product, ProductStore, StoreConnector, StoreError, StoreHandle};

/// Product store held in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    products: RwLock<Vec<Product>>,
    /// Queries issued (pings excluded)
    queries: AtomicUsize,
    pings: AtomicUsize,
    fail_queries: AtomicBool,
    unreachable: AtomicBool,
}

impl MemoryStore {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products: RwLock::new(products),
            ..Self::default()
        }
    }

    /// Number of query operations served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn ping_count(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    /// Make every subsequent query fail
    pub fn set_failing(&self, failing: bool) {
        self.fail_queries.store(failing, Ordering::SeqCst);
    }

    /// Make every subsequent ping fail
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn insert(&self, product: Product) {
        self.products.write().push(product);
    }

    fn begin_query(&self) -> Result<(), StoreError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated query failure".to_string()));
        }
        Ok(())
    }

    fn select<P>(&self, predicate: P) -> Vec<Product>
    where
        P: Fn(&Product) -> bool,
    {
        self.products
            .read()
            .iter()
            .filter(|product| predicate(product))
            .cloned()
            .collect()
    }
}

fn field<'a>(product: &'a Product, name: &str) -> &'a str {
    product.get(name).and_then(|v| v.as_str()).unwrap_or("")
}

fn has_category(product: &Product, category: &str) -> bool {
    product
        .get("categories")
        .and_then(|v| v.as_array())
        .is_some_and(|tags| tags.iter().any(|tag| tag.as_str() == Some(category)))
}

/// Any search term appearing in name or description, ignoring case
fn matches_text(product: &Product, terms: &[String]) -> bool {
    let name = field(product, "name").to_lowercase();
    let description = field(product, "description").to_lowercase();
    terms
        .iter()
        .any(|term| name.contains(term.as_str()) || description.contains(term.as_str()))
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Product>, StoreError> {
        self.begin_query()?;
        Ok(self.products.read().clone())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<Product>, StoreError> {
        self.begin_query()?;
        Ok(self.select(|p| field(p, "sku") == sku).into_iter().next())
    }

    async fn find_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        self.begin_query()?;
        let mut found = self.select(|p| has_category(p, category));
        found.sort_by(|a, b| field(a, "name").cmp(field(b, "name")));
        Ok(found)
    }

    async fn categories(&self) -> Result<Vec<serde_json::Value>, StoreError> {
        self.begin_query()?;
        let distinct: BTreeSet<String> = self
            .products
            .read()
            .iter()
            .filter_map(|p| p.get("categories").and_then(|v| v.as_array()))
            .flatten()
            .filter_map(|tag| tag.as_str().map(str::to_string))
            .collect();
        Ok(distinct.into_iter().map(serde_json::Value::String).collect())
    }

    async fn search(&self, text: &str) -> Result<Vec<Product>, StoreError> {
        self.begin_query()?;
        let terms: Vec<String> = text.split_whitespace().map(str::to_lowercase).collect();
        Ok(self.select(|p| matches_text(p, &terms)))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Query("simulated lost connection".to_string()));
        }
        Ok(())
    }
}

/// Connector handing out a shared [`MemoryStore`], optionally after a run of
/// failed attempts
#[derive(Debug)]
pub struct MemoryConnector {
    store: Arc<MemoryStore>,
    failures_remaining: AtomicUsize,
    attempts: Mutex<Vec<Instant>>,
}

impl MemoryConnector {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            failures_remaining: AtomicUsize::new(0),
            attempts: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `failures` connection attempts before succeeding
    pub fn failing_first(self, failures: usize) -> Self {
        self.failures_remaining.store(failures, Ordering::SeqCst);
        self
    }

    /// Fail the next `failures` connection attempts from now on
    pub fn set_failures(&self, failures: usize) {
        self.failures_remaining.store(failures, Ordering::SeqCst);
    }

    /// Times at which connection attempts started
    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().len()
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, _config: &StoreConfig) -> Result<StoreHandle, StoreError> {
        self.attempts.lock().push(Instant::now());

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(StoreError::Connect("connection refused".to_string()));
        }

        self.store.ping().await?;
        Ok(self.store.clone())
    }
}
