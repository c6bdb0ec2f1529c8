use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rustf_query::prelude::*;

fn benchmark_select(c: &mut Criterion) {
    let select = Select::new()
        .table("orders")
        .columns(["id", "customer_id", "total"])
        .condition("status", Operator::In, SqlValue::list(vec!["new", "paid", "shipped"]))
        .add_condition(Condition::is_null("deleted_at"))
        .order_by("id", OrderDirection::Desc)
        .limit(50)
        .offset(100);

    for driver in [DriverType::MySQL, DriverType::PostgreSQL] {
        let ctx = RenderContext::new(driver);
        c.bench_function(&format!("select_render_{}", driver.driver_name()), |b| {
            b.iter(|| {
                let compiled = select.render(black_box(&ctx));
                black_box(compiled)
            })
        });
    }
}

fn benchmark_insert(c: &mut Criterion) {
    let insert = Insert::new()
        .table("events")
        .entry("kind", "click")
        .entry("user_id", 42)
        .entry("payload", SqlValue::Json(serde_json::json!({"x": 1, "y": 2})))
        .insert_methode(InsertMethode::InsertOrUpdate)
        .conflict_columns(["kind", "user_id"]);
    let ctx = RenderContext::new(DriverType::PostgreSQL);

    c.bench_function("upsert_render_postgres", |b| {
        b.iter(|| black_box(insert.render(black_box(&ctx))))
    });
}

fn benchmark_create_table(c: &mut Criterion) {
    let create = TableCreate::new()
        .table("accounts")
        .if_not_exists()
        .column(Column::new("id", DataType::BigInt).auto_increment())
        .column(Column::new("email", DataType::VarChar).length(190).not_null().unique())
        .column(Column::new("balance", DataType::Decimal).precision(12, 2).default_value(0))
        .column(Column::new("created_at", DataType::Timestamp).not_null());
    let ctx = RenderContext::new(DriverType::MySQL);

    c.bench_function("create_table_render_mysql", |b| {
        b.iter(|| black_box(create.render(black_box(&ctx))))
    });
}

criterion_group!(benches, benchmark_select, benchmark_insert, benchmark_create_table);
criterion_main!(benches);
