//! RestSource against a local PostgREST stand-in

use nadi_source::{DataSource, Direction, Filter, RemoteError, RestSource, Row, Select};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::Filter as _;
use warp::Reply;

#[derive(Debug, Clone)]
struct Seen {
    method: String,
    table: String,
    query: String,
    apikey: Option<String>,
    authorization: Option<String>,
    prefer: Option<String>,
    body: Option<Value>,
}

type Log = Arc<Mutex<Vec<Seen>>>;

fn respond(seen: &Seen) -> warp::reply::Response {
    match (seen.method.as_str(), seen.table.as_str()) {
        ("GET", "broken") => warp::reply::with_status(
            warp::reply::json(&json!({
                "code": "42P01",
                "message": "relation \"broken\" does not exist",
                "details": null,
                "hint": "check the table name"
            })),
            StatusCode::NOT_FOUND,
        )
        .into_response(),
        ("GET", "gateway") => {
            warp::reply::with_status("upstream down", StatusCode::BAD_GATEWAY).into_response()
        }
        ("GET", _) => warp::reply::json(&json!([
            {"id": "c-1", "title": "Audit"},
            {"id": "c-2", "title": "Raya"}
        ]))
        .into_response(),
        ("POST", _) => {
            let mut row = seen.body.clone().unwrap_or_else(|| json!({}));
            row["id"] = json!("new-id");
            warp::reply::with_status(warp::reply::json(&json!([row])), StatusCode::CREATED)
                .into_response()
        }
        ("PATCH", _) => {
            let mut row = json!({"id": "c-1", "title": "Audit"});
            if let Some(Value::Object(patch)) = &seen.body {
                for (k, v) in patch {
                    row[k] = v.clone();
                }
            }
            warp::reply::json(&json!([row])).into_response()
        }
        _ => warp::reply::json(&json!([])).into_response(),
    }
}

async fn serve() -> (SocketAddr, Log) {
    let log: Log = Arc::default();
    let recorder = log.clone();

    let route = warp::method()
        .and(warp::path!("rest" / "v1" / String))
        .and(
            warp::query::raw()
                .or(warp::any().map(String::new))
                .unify(),
        )
        .and(warp::header::optional::<String>("apikey"))
        .and(warp::header::optional::<String>("authorization"))
        .and(warp::header::optional::<String>("prefer"))
        .and(warp::body::bytes())
        .map(
            move |method: warp::http::Method,
                  table: String,
                  query: String,
                  apikey: Option<String>,
                  authorization: Option<String>,
                  prefer: Option<String>,
                  body: warp::hyper::body::Bytes| {
                let seen = Seen {
                    method: method.to_string(),
                    table,
                    query,
                    apikey,
                    authorization,
                    prefer,
                    body: serde_json::from_slice(&body).ok(),
                };
                let reply = respond(&seen);
                recorder.lock().push(seen);
                reply
            },
        );

    let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (addr, log)
}

fn source(addr: SocketAddr) -> RestSource {
    RestSource::new(&format!("http://{addr}"), "anon-key").unwrap()
}

#[tokio::test]
async fn select_sends_auth_and_encoded_filters() {
    let (addr, log) = serve().await;
    let rows = source(addr)
        .select(
            Select::from("nd_closures")
                .eq("site_id", "s-1")
                .order_by("start_date", Direction::Descending)
                .limit(5),
        )
        .await
        .unwrap();

    assert_eq!(rows.len(), 2);
    let seen = log.lock()[0].clone();
    assert_eq!(seen.method, "GET");
    assert_eq!(seen.table, "nd_closures");
    assert_eq!(
        seen.query,
        "select=*&site_id=eq.s-1&order=start_date.desc&limit=5"
    );
    assert_eq!(seen.apikey.as_deref(), Some("anon-key"));
    assert_eq!(seen.authorization.as_deref(), Some("Bearer anon-key"));
}

#[tokio::test]
async fn insert_asks_for_representation() {
    let (addr, log) = serve().await;
    let mut row = Row::new();
    row.insert("title".to_string(), json!("Audit"));

    let stored = source(addr).insert("nd_closures", row).await.unwrap();
    assert_eq!(stored["id"], "new-id");
    assert_eq!(stored["title"], "Audit");

    let seen = log.lock()[0].clone();
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.prefer.as_deref(), Some("return=representation"));
    assert_eq!(seen.body, Some(json!({"title": "Audit"})));
}

#[tokio::test]
async fn update_filters_by_query() {
    let (addr, log) = serve().await;
    let mut patch = Row::new();
    patch.insert("title".to_string(), json!("Renamed"));

    let rows = source(addr)
        .update("nd_closures", &[Filter::eq("id", "c-1")], patch)
        .await
        .unwrap();
    assert_eq!(rows[0]["title"], "Renamed");
    assert_eq!(log.lock()[0].query, "id=eq.c-1");
}

#[tokio::test]
async fn backend_error_body_is_decoded() {
    let (addr, _log) = serve().await;
    let err = source(addr).select(Select::from("broken")).await.unwrap_err();
    assert_eq!(
        err,
        RemoteError::Backend {
            status: 404,
            code: Some("42P01".to_string()),
            message: "relation \"broken\" does not exist".to_string(),
            details: None,
            hint: Some("check the table name".to_string()),
        }
    );
}

#[tokio::test]
async fn opaque_error_keeps_body() {
    let (addr, _log) = serve().await;
    let err = source(addr).select(Select::from("gateway")).await.unwrap_err();
    assert_eq!(err, RemoteError::backend(502, "upstream down"));
}

#[tokio::test]
async fn unreachable_backend_is_transport_error() {
    // Bind and drop to get a port nothing listens on
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let err = source(addr).select(Select::from("t")).await.unwrap_err();
    assert!(matches!(err, RemoteError::Transport(_)));
}
