//! Cached compilation.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use helios_search::backends::sql::SqlDialect;
use helios_search::cache::{CachedGenerator, ConditionCache, condition_fingerprint};
use helios_search::error::{GenerationError, GenerationResult};
use helios_search::{CompiledFragment, ConditionGenerator, SearchCondition};

/// Counts how often the wrapped generator actually compiles.
struct Counting<G> {
    inner: G,
    calls: AtomicUsize,
}

impl<G> Counting<G> {
    fn new(inner: G) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<G: ConditionGenerator> ConditionGenerator for Counting<G> {
    fn backend_id(&self) -> String {
        self.inner.backend_id()
    }

    fn compile(&self, condition: &SearchCondition) -> GenerationResult<CompiledFragment> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.compile(condition)
    }
}

fn condition(query: &str) -> SearchCondition {
    common::processor()
        .process_strict(query, &common::users())
        .unwrap()
}

#[test]
fn test_hit_equals_fresh_compile() {
    let generator = CachedGenerator::new(
        Counting::new(common::sql_generator(SqlDialect::Postgres)),
        ConditionCache::in_memory(100, Some(Duration::from_secs(60))),
    );
    let condition = condition("id: 1, 5, 10-12; name: ~i*foo; *(age: >60)");

    let first = generator.compile(&condition).unwrap();
    let second = generator.compile(&condition).unwrap();
    let fresh = common::sql_generator(SqlDialect::Postgres)
        .compile(&condition)
        .unwrap();

    assert_eq!(first, fresh);
    assert_eq!(second, fresh);
    assert_eq!(generator.inner().calls(), 1);
}

#[test]
fn test_views_do_not_affect_the_key() {
    let generator = CachedGenerator::new(
        Counting::new(common::sql_generator(SqlDialect::Sqlite)),
        ConditionCache::in_memory(100, None),
    );

    generator.compile(&condition("id: 7")).unwrap();
    generator.compile(&condition("id: 07")).unwrap();
    generator.compile(&condition("id: 8")).unwrap();

    assert_eq!(generator.inner().calls(), 2);
}

#[test]
fn test_backends_do_not_share_entries() {
    let condition = condition("id: 1");
    let postgres = common::sql_generator(SqlDialect::Postgres);
    let prefixed = common::sql_generator(SqlDialect::Postgres).with_param_prefix("p_");

    assert_ne!(
        condition_fingerprint(&condition, &postgres.backend_id()),
        condition_fingerprint(&condition, &prefixed.backend_id())
    );

    let cache = ConditionCache::in_memory(100, None);
    let first = CachedGenerator::new(postgres, cache.clone());
    let second = CachedGenerator::new(prefixed, cache);

    first.compile(&condition).unwrap();
    let fragment = second.compile(&condition).unwrap();
    assert_eq!(fragment.as_sql().unwrap().sql, "u.id = :p_0");
}

#[test]
fn test_errors_are_not_cached() {
    let generator = CachedGenerator::new(
        Counting::new(common::sql_generator(SqlDialect::SqlServer)),
        ConditionCache::in_memory(100, None),
    );
    let condition = condition("age: 25");

    assert!(generator.compile(&condition).is_err());
    assert!(generator.compile(&condition).is_err());
    assert_eq!(generator.inner().calls(), 2);
}

#[test]
fn test_invalidate() {
    let cache = ConditionCache::in_memory(100, None);
    let generator = CachedGenerator::new(
        Counting::new(common::sql_generator(SqlDialect::Postgres)),
        cache.clone(),
    );
    let condition = condition("id: 3");
    let fingerprint = condition_fingerprint(&condition, &generator.backend_id());

    generator.compile(&condition).unwrap();
    assert!(cache.get(&fingerprint).is_some());
    assert!(cache.invalidate(&fingerprint).unwrap());
    assert!(cache.get(&fingerprint).is_none());

    generator.compile(&condition).unwrap();
    assert_eq!(generator.inner().calls(), 2);
}

#[test]
fn test_invalid_condition_never_hits_the_cache() {
    let generator = CachedGenerator::new(
        Counting::new(common::sql_generator(SqlDialect::Sqlite)),
        ConditionCache::in_memory(100, None),
    );
    let clean = condition("id: 5");
    let invalid = common::processor()
        .process("id: 5, abc", &common::users())
        .unwrap();
    assert!(invalid.has_errors());

    generator.compile(&clean).unwrap();
    let err = generator.compile(&invalid).unwrap_err();
    assert_eq!(err, GenerationError::InvalidCondition { count: 1 });

    let fresh = common::sql_generator(SqlDialect::Sqlite)
        .compile(&invalid)
        .unwrap_err();
    assert_eq!(err, fresh);
    assert_eq!(generator.inner().calls(), 2);
}
