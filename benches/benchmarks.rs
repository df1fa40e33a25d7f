//! Benchmark suite for the authorization hot paths.
//!
//! This module provides performance benchmarks for:
//! - Single permission checks per decision rule
//! - Ownership-scoped checks against directories of various sizes
//! - Catalog reloads after role changes
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench
//!
//! # Save baseline for comparison
//! cargo bench -- --save-baseline main
//!
//! # Compare against baseline
//! cargo bench -- --baseline main
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use journal_authz::authz::{
    check, Catalog, CatalogCache, DirectoryOwnershipResolver, NoOwnership, PermissionChecker,
    ResourceOwnershipContext, Role, User,
};
use journal_authz::testing::MockAuthorDirectory;
use std::sync::Arc;

fn user_with_role(catalog: &Catalog, role: &str) -> User {
    let role: Role = catalog.role(role).cloned().expect("system role missing");
    User::new("u-bench", "bench@journal.test", role)
}

// ============================================================================
// Permission Check Benchmarks
// ============================================================================

/// Benchmark one check per decision rule.
fn bench_check_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("check");
    let catalog = Catalog::standard();
    let super_admin = user_with_role(&catalog, "Super Admin");
    let editor = user_with_role(&catalog, "Editor");
    let viewer = user_with_role(&catalog, "Viewer");

    group.bench_function("unauthenticated", |b| {
        b.iter(|| check(&catalog, &NoOwnership, None, black_box("article.READ"), None))
    });
    group.bench_function("super_admin", |b| {
        b.iter(|| {
            check(
                &catalog,
                &NoOwnership,
                Some(&super_admin),
                black_box("permission.DELETE"),
                None,
            )
        })
    });
    group.bench_function("role_grant", |b| {
        b.iter(|| check(&catalog, &NoOwnership, Some(&editor), black_box("article.DELETE"), None))
    });
    group.bench_function("denied", |b| {
        b.iter(|| check(&catalog, &NoOwnership, Some(&viewer), black_box("user.DELETE"), None))
    });
    group.bench_function("unknown_key", |b| {
        b.iter(|| check(&catalog, &NoOwnership, Some(&viewer), black_box("article.PUBLISH"), None))
    });

    group.finish();
}

// ============================================================================
// Ownership Benchmarks
// ============================================================================

/// Benchmark ownership-scoped checks as the article's author list grows.
fn bench_ownership(c: &mut Criterion) {
    let mut group = c.benchmark_group("ownership");
    let catalog = Catalog::standard();
    let author = user_with_role(&catalog, "Author");

    for size in [1, 10, 100] {
        let ids: Vec<String> = (0..size).map(|i| format!("auth-{}", i)).collect();
        let id_refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let last = ids.last().cloned().unwrap_or_default();
        let directory = MockAuthorDirectory::new()
            .with_author(&last, "bench@journal.test")
            .with_article("art-1", &id_refs);
        let resolver = DirectoryOwnershipResolver::new(directory);
        let ctx = ResourceOwnershipContext::article("art-1");

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("owner_grant", size), &ctx, |b, ctx| {
            b.iter(|| {
                check(
                    &catalog,
                    &resolver,
                    Some(&author),
                    black_box("article.UPDATE"),
                    Some(ctx),
                )
            })
        });
    }

    group.finish();
}

// ============================================================================
// Catalog Benchmarks
// ============================================================================

/// Benchmark a catalog rebuild and reload, plus a check through the cache.
fn bench_catalog_reload(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog");
    let cache = Arc::new(CatalogCache::new(Catalog::standard()));
    let checker = PermissionChecker::new(Arc::clone(&cache), NoOwnership);
    let editor = user_with_role(&checker.catalog(), "Editor");

    group.bench_function("rebuild_and_reload", |b| {
        b.iter(|| {
            let current = cache.snapshot();
            let next = current
                .rebuild(
                    current.permissions().clone(),
                    current.roles().cloned().collect(),
                )
                .expect("rebuild failed");
            black_box(cache.reload(next))
        })
    });
    group.bench_function("cached_check", |b| {
        b.iter(|| checker.check(Some(&editor), black_box("article.UPDATE"), None))
    });

    group.finish();
}

criterion_group!(benches, bench_check_rules, bench_ownership, bench_catalog_reload);
criterion_main!(benches);
