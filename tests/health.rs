use bitedrop_api::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let response = health_check().await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.version, env!("CARGO_PKG_VERSION"));
}

#[test]
fn migration_sql_is_split_per_command() {
    let statements = bitedrop_api::db::split_statements(
        "CREATE TABLE a (id INT);\n\n  CREATE INDEX i ON a (id) ;\n",
    );
    assert_eq!(
        statements,
        vec!["CREATE TABLE a (id INT);", "CREATE INDEX i ON a (id);"]
    );
}
