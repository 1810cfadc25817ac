use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::sync::Cache;

use geoalgebra_operators::{eval, Image, SourceResolver};

use crate::error::Result;

/// Caches evaluated call graphs keyed by the verbatim JSON text submitted
/// in the request, not a re-serialized or canonicalized form (source
/// `app.py`'s `@functools.lru_cache(maxsize=64) def eval_image(...)`,
/// which keys on its raw string argument the same way). Two
/// byte-distinct bodies that happen to describe the same graph — say,
/// with different key order or whitespace — get independent entries
/// rather than colliding.
pub struct EvalMemo {
    cache: Cache<String, Arc<Image>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EvalMemo {
    pub fn new(capacity: u64) -> Self {
        Self {
            cache: Cache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn eval(&self, graph: &str, resolver: &dyn SourceResolver) -> Result<Arc<Image>> {
        if let Some(image) = self.cache.get(graph) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(image);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let value: serde_json::Value = serde_json::from_str(graph)?;
        let image = Arc::new(eval(&value, resolver)?);
        self.cache.insert(graph.to_string(), image.clone());
        Ok(image)
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn capacity(&self) -> u64 {
        self.cache.policy().max_capacity().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoalgebra_operators::GdalSourceResolver;

    #[test]
    fn repeated_evaluation_of_the_same_graph_is_a_cache_hit() {
        let memo = EvalMemo::new(64);
        let resolver = GdalSourceResolver;
        let graph = r#"{"name": "constant", "args": [1.0]}"#;

        memo.eval(graph, &resolver).unwrap();
        memo.eval(graph, &resolver).unwrap();

        assert_eq!(memo.misses(), 1);
        assert_eq!(memo.hits(), 1);
    }

    #[test]
    fn differently_formatted_but_equivalent_graphs_are_not_conflated() {
        let memo = EvalMemo::new(64);
        let resolver = GdalSourceResolver;

        memo.eval(r#"{"name":"constant","args":[1.0]}"#, &resolver).unwrap();
        memo.eval(r#"{"name": "constant", "args": [1.0]}"#, &resolver).unwrap();

        assert_eq!(memo.misses(), 2);
        assert_eq!(memo.hits(), 0);
    }
}
