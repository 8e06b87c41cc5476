use super::*;
use serde_json::json;

fn row(v: Value) -> Row {
    match v {
        Value::Object(m) => m,
        _ => panic!("row must be an object"),
    }
}

fn seeded() -> MemoryStore {
    let m = MemoryStore::new();
    m.insert("transactions", vec![
        row(json!({"id": "t1", "agent_id": "a1", "amount": 500, "created_at": "2024-03-01T10:00:00Z"})),
        row(json!({"id": "t2", "agent_id": "a2", "amount": 1500.5, "created_at": "2024-03-02T10:00:00Z"})),
        row(json!({"id": "t3", "agent_id": "a1", "amount": "2500", "created_at": "2024-03-03T10:00:00Z"})),
        row(json!({"id": "t4", "agent_id": "a1"})),
    ]);
    m
}

#[test]
fn select_filters_orders_and_limits() {
    let m = seeded();
    let q = Query::table("transactions").eq("agent_id", json!("a1")).order_by("created_at", false).limit(2);
    let rows = m.select(&q);
    let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["t3", "t1"]);
}

#[test]
fn comparison_filters_accept_numeric_strings() {
    let m = seeded();
    let q = Query::table("transactions").filter("amount", FilterOp::Gte, json!(1000));
    let mut ids: Vec<String> = m.select(&q).iter().map(|r| r["id"].as_str().unwrap().to_string()).collect();
    ids.sort();
    assert_eq!(ids, vec!["t2", "t3"]);
    // Rows without the column never match, not even `neq`.
    let q = Query::table("transactions").filter("amount", FilterOp::Neq, json!(500));
    assert_eq!(m.select(&q).len(), 2);
}

#[test]
fn unknown_table_reads_empty() {
    assert!(MemoryStore::new().select(&Query::table("nope")).is_empty());
}

#[test]
fn update_and_delete_are_scoped_by_equality() {
    let m = seeded();
    let patch = row(json!({"status": "flagged"}));
    assert_eq!(m.update("transactions", "agent_id", &json!("a1"), &patch), 3);
    let flagged = m.select(&Query::table("transactions").eq("status", json!("flagged")));
    assert_eq!(flagged.len(), 3);
    assert_eq!(m.delete("transactions", "id", &json!("t2")), 1);
    assert_eq!(m.delete("transactions", "id", &json!("t2")), 0);
    assert_eq!(m.select(&Query::table("transactions")).len(), 3);
    assert_eq!(m.update("missing", "id", &json!(1), &patch), 0);
}

#[test]
fn seed_file_loads_tables_and_rejects_bad_shapes() {
    let tmp = tempfile::tempdir().unwrap();
    let good = tmp.path().join("seed.json");
    std::fs::write(&good, r#"{"csp_agents":[{"id":"a1","name":"Ravi"}],"transactions":[]}"#).unwrap();
    let m = MemoryStore::from_seed_file(&good).unwrap();
    assert_eq!(m.table_names(), vec!["csp_agents".to_string(), "transactions".to_string()]);

    let bad = tmp.path().join("bad.json");
    std::fs::write(&bad, r#"{"csp_agents":[1,2]}"#).unwrap();
    assert!(matches!(MemoryStore::from_seed_file(&bad), Err(DataError::Seed(_))));
    assert!(MemoryStore::from_seed_file(&tmp.path().join("missing.json")).is_err());
}

#[test]
fn rest_select_params_follow_postgrest_syntax() {
    let q = Query::table("transactions")
        .eq("agent_id", json!("a1"))
        .filter("amount", FilterOp::Gt, json!(100))
        .order_by("created_at", false)
        .limit(25);
    let params = RestSource::select_params(&q);
    let as_strs: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
    assert_eq!(as_strs, vec![
        ("select", "*"),
        ("agent_id", "eq.a1"),
        ("amount", "gt.100"),
        ("order", "created_at.desc"),
        ("limit", "25"),
    ]);
    let src = RestSource::new("https://example.test/", Some("key")).unwrap();
    assert_eq!(src.table_url("transactions"), "https://example.test/rest/v1/transactions");
}

#[tokio::test]
async fn fetch_or_empty_degrades_on_failure() {
    // Nothing listens on port 9 of localhost; the request fails fast.
    let src = DataSource::Rest(RestSource::new("http://127.0.0.1:9", None).unwrap());
    assert!(src.select(&Query::table("transactions")).await.is_err());
    assert!(src.fetch_or_empty(&Query::table("transactions")).await.is_empty());
    // Invalid table names are rejected before any request.
    let err: AppError = src.select(&Query::table("x;drop")).await.unwrap_err().into();
    assert_eq!(err.http_status(), 400);
}

#[tokio::test]
async fn memory_source_crud_through_facade() {
    let src = DataSource::Memory(MemoryStore::new());
    src.insert("beneficiaries", vec![row(json!({"id": "b1", "name": "Havildar R. Yadav"}))]).await.unwrap();
    assert_eq!(src.update("beneficiaries", "id", &json!("b1"), row(json!({"status": "verified"}))).await.unwrap(), 1);
    let rows = src.select(&Query::table("beneficiaries")).await.unwrap();
    assert_eq!(rows[0]["status"], json!("verified"));
    assert_eq!(src.delete("beneficiaries", "id", &json!("b1")).await.unwrap(), 1);
    assert!(src.fetch_or_empty(&Query::table("beneficiaries")).await.is_empty());
}

#[test]
fn memory_count_ignores_limit_and_order() {
    let m = seeded();
    let q = Query::table("transactions").eq("agent_id", json!("a1")).order_by("created_at", false).limit(1);
    assert_eq!(m.count(&q), 3);
    assert_eq!(m.count(&Query::table("nope")), 0);
}

#[test]
fn content_range_totals() {
    assert_eq!(rest::parse_content_range_total("0-24/3573"), Some(3573));
    assert_eq!(rest::parse_content_range_total("*/0"), Some(0));
    assert_eq!(rest::parse_content_range_total("0-24/*"), None);
    assert_eq!(rest::parse_content_range_total(""), None);
}

#[tokio::test]
async fn rest_count_reads_content_range_without_rows() {
    use axum::extract::RawQuery;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;

    async fn handler(headers: HeaderMap, RawQuery(query): RawQuery) -> (StatusCode, [(&'static str, String); 1], &'static str) {
        let exact = headers.get("prefer").and_then(|v| v.to_str().ok()) == Some("count=exact");
        let query = query.unwrap_or_default();
        if !exact || !query.contains("limit=0") || !query.contains("status=eq.pending") || query.contains("order=") {
            return (StatusCode::BAD_REQUEST, [("content-range", "*/*".to_string())], "[]");
        }
        (StatusCode::PARTIAL_CONTENT, [("content-range", "*/1234".to_string())], "[]")
    }

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = axum::Router::new().route("/rest/v1/transactions", get(handler));
    tokio::spawn(async move { let _ = axum::serve(listener, router).await; });

    let src = DataSource::Rest(RestSource::new(&format!("http://{}", addr), None).unwrap());
    let q = Query::table("transactions").eq("status", json!("pending")).order_by("created_at", false).limit(5);
    assert_eq!(src.count(&q).await.unwrap(), 1234);
    assert_eq!(src.count_or_zero(&Query::table("transactions")).await, 0);
}
