use rustf_query::database::{DatabaseConnectionConfig, SqliteAdapter};
use rustf_query::prelude::*;
use std::sync::{Arc, Mutex};

/// One pooled connection so every query sees the same in-memory database
async fn memory_adapter() -> Arc<dyn DatabaseAdapter> {
    let config = DatabaseConnectionConfig::builder()
        .url("sqlite::memory:")
        .max_connections(1)
        .min_connections(1)
        .build()
        .unwrap();
    Arc::new(SqliteAdapter::connect("memory", &config).await.unwrap())
}

async fn create_users(adapter: &Arc<dyn DatabaseAdapter>) {
    let mut query = Query::new(adapter.clone());
    query.add(
        TableCreate::new()
            .table("users")
            .column(Column::new("id", DataType::Integer).auto_increment())
            .column(Column::new("name", DataType::VarChar).length(64).not_null())
            .column(Column::new("age", DataType::Integer))
            .constraint(TableConstraint::unique(["name"])),
    );
    query.execute().await.unwrap();
    assert!(query.succeeded());
}

async fn names(adapter: &Arc<dyn DatabaseAdapter>, select: Select) -> Vec<String> {
    let collected = Arc::new(Mutex::new(Vec::new()));
    let sink = collected.clone();
    let mut query = Query::new(adapter.clone());
    query.add(select.on_result(move |rows| {
        rows.for_each(|row| sink.lock().unwrap().push(row["name"].to_string()));
    }));
    query.execute().await.unwrap();
    assert!(query.succeeded());
    let names = collected.lock().unwrap().clone();
    names
}

async fn count(adapter: &Arc<dyn DatabaseAdapter>, table: &str) -> i64 {
    let total = Arc::new(Mutex::new(None));
    let sink = total.clone();
    let mut query = Query::new(adapter.clone());
    query.add(
        Select::new()
            .table(table)
            .column("*")
            .function(SelectFunction::Count)
            .on_result(move |rows| {
                rows.next(|row| *sink.lock().unwrap() = row.values().next().and_then(SqlValue::as_i64));
            }),
    );
    query.execute().await.unwrap();
    let value = total.lock().unwrap().expect("COUNT(*) returned no row");
    value
}

#[tokio::test]
async fn test_connect_runs_statements_on_pooled_connection() {
    let config = DatabaseConnectionConfig::builder()
        .url("sqlite::memory:")
        .max_connections(1)
        .build()
        .unwrap();
    let adapter = connect(&config).await.unwrap();
    assert_eq!(adapter.driver_type(), DriverType::SQLite);
    assert!(adapter.connected());

    let mut conn = adapter.connection().await.unwrap();
    conn.execute("CREATE TABLE kv (k TEXT, v INTEGER);", Vec::new())
        .await
        .unwrap();
    conn.set_auto_commit(false).await.unwrap();
    let inserted = conn
        .execute("INSERT INTO kv (k, v) VALUES (?, ?);", vec!["a".into(), 1.into()])
        .await
        .unwrap();
    assert_eq!(inserted.rows_affected, 1);
    conn.commit().await.unwrap();
    conn.set_auto_commit(true).await.unwrap();

    let rows = conn
        .fetch_all("SELECT v FROM kv WHERE k = ?;", vec!["a".into()])
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["v"].as_i64(), Some(1));
    conn.close().await.unwrap();
}

#[tokio::test]
async fn test_insert_then_select() {
    let adapter = memory_adapter().await;
    assert!(adapter.ping().await.unwrap());
    create_users(&adapter).await;

    let mut query = Query::new(adapter.clone());
    for (name, age) in [("Ada", 36), ("Linus", 17), ("Grace", 45)] {
        query.add(Insert::new().table("users").entry("name", name).entry("age", age));
    }
    query.execute().await.unwrap();
    assert!(query.succeeded());

    let adults = names(
        &adapter,
        Select::new()
            .table("users")
            .column("name")
            .condition("age", Operator::GreaterEquals, 18)
            .order_by("name", OrderDirection::Asc),
    )
    .await;
    assert_eq!(adults, vec!["Ada", "Grace"]);
}

#[tokio::test]
async fn test_batched_updates_and_delete() {
    let adapter = memory_adapter().await;
    create_users(&adapter).await;

    let mut seed = Query::new(adapter.clone());
    for name in ["a", "b", "c", "d"] {
        seed.add(Insert::new().table("users").entry("name", name).entry("age", 20));
    }
    seed.execute().await.unwrap();

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let mut query = Query::new(adapter.clone());
    for name in ["a", "b"] {
        let sink = outcomes.clone();
        query.add(
            Update::new()
                .table("users")
                .set("age", 30)
                .condition("name", Operator::Equals, name)
                .after_query(move |outcome| sink.lock().unwrap().push(outcome.rows_affected)),
        );
    }
    query.add(Delete::new().table("users").condition("name", Operator::Equals, "d"));
    query.execute().await.unwrap();

    assert!(query.succeeded());
    assert_eq!(*outcomes.lock().unwrap(), vec![1, 1]);
    assert_eq!(count(&adapter, "users").await, 3);
    assert_eq!(
        names(
            &adapter,
            Select::new()
                .table("users")
                .condition("age", Operator::Equals, 30)
                .order_by("name", OrderDirection::Asc),
        )
        .await,
        vec!["a", "b"]
    );
}

#[tokio::test]
async fn test_failure_rolls_back_every_statement() {
    let adapter = memory_adapter().await;
    create_users(&adapter).await;

    let mut seed = Query::new(adapter.clone());
    seed.add(Insert::new().table("users").entry("name", "Ada").entry("age", 36));
    seed.execute().await.unwrap();

    let mut query = Query::new(adapter.clone());
    query
        .add(Update::new().table("users").set("age", 99))
        // duplicate name violates the unique constraint
        .add(Insert::new().table("users").entry("name", "Ada"));
    query.execute().await.unwrap();

    assert!(query.executed());
    assert!(!query.succeeded());
    assert_eq!(count(&adapter, "users").await, 1);
    assert!(names(
        &adapter,
        Select::new().table("users").condition("age", Operator::Equals, 99)
    )
    .await
    .is_empty());
}

#[tokio::test]
async fn test_upsert_and_ignore() {
    let adapter = memory_adapter().await;
    create_users(&adapter).await;

    let mut query = Query::new(adapter.clone());
    query
        .add(Insert::new().table("users").entry("name", "Ada").entry("age", 1))
        .add(
            Insert::new()
                .table("users")
                .entry("name", "Ada")
                .entry("age", 2)
                .insert_methode(InsertMethode::InsertOrUpdate)
                .conflict_columns(["name"]),
        )
        .add(
            Insert::new()
                .table("users")
                .entry("name", "Ada")
                .entry("age", 3)
                .insert_methode(InsertMethode::InsertIgnore),
        );
    query.execute().await.unwrap();
    assert!(query.succeeded());

    assert_eq!(count(&adapter, "users").await, 1);
    assert_eq!(
        names(
            &adapter,
            Select::new().table("users").condition("age", Operator::Equals, 2)
        )
        .await,
        vec!["Ada"]
    );
}

#[tokio::test]
async fn test_custom_statement_returning_rows() {
    let adapter = memory_adapter().await;

    let values = Arc::new(Mutex::new(Vec::new()));
    let sink = values.clone();
    let mut query = Query::new(adapter.clone());
    query.add(
        Custom::new("SELECT ? AS answer, ? AS label")
            .param(42)
            .param("life")
            .returns_rows(true)
            .on_result(move |rows| {
                rows.for_each(|row| {
                    sink.lock()
                        .unwrap()
                        .extend(row.values().map(ToString::to_string));
                });
            }),
    );
    query.execute().await.unwrap();

    assert!(query.succeeded());
    assert_eq!(*values.lock().unwrap(), vec!["42", "life"]);
}
