use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sql_ref_extractor::{analyze, analyze_statement, parse_statement};

const SIMPLE_SELECT: &str = "SELECT a, b, c FROM table1";

const MEDIUM_SELECT: &str = r#"
SELECT
    u.id,
    u.name,
    u.email,
    COUNT(o.id) AS order_count,
    SUM(o.total) AS total_spent
FROM users u
LEFT JOIN orders o ON u.id = o.user_id
WHERE u.created_at > '2024-01-01'
    AND u.status = 'active'
GROUP BY u.id, u.name, u.email
HAVING COUNT(o.id) > 5
ORDER BY total_spent DESC
LIMIT 100
"#;

fn join_chain(len: usize) -> String {
    let mut sql = String::from("SELECT t0.c0 FROM t0");
    for i in 1..len {
        sql.push_str(&format!(" JOIN t{i} ON t{prev}.k{i} = t{i}.k{i}", prev = i - 1));
    }
    sql
}

fn bench_analyze_by_query_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_by_size");

    group.bench_function("simple", |b| b.iter(|| analyze(black_box(SIMPLE_SELECT))));

    group.bench_function("medium", |b| b.iter(|| analyze(black_box(MEDIUM_SELECT))));

    group.finish();
}

fn bench_collect_only(c: &mut Criterion) {
    let stmt = match parse_statement(MEDIUM_SELECT) {
        Ok(stmt) => stmt,
        Err(e) => panic!("benchmark query does not parse: {}", e.message),
    };

    c.bench_function("collect_medium", |b| {
        b.iter(|| analyze_statement(black_box(&stmt)))
    });
}

fn bench_join_depth(c: &mut Criterion) {
    let mut group = c.benchmark_group("join_depth");

    for len in [2usize, 8, 32, 128] {
        let sql = join_chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &sql, |b, sql| {
            b.iter(|| analyze(black_box(sql)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_analyze_by_query_size,
    bench_collect_only,
    bench_join_depth
);
criterion_main!(benches);
