//! Integration tests for the `reqwest` product client.
//!
//! Each test starts a one-route-table HTTP responder on a random local port
//! and points a [`CatalogClient`] at it.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use cosmica_core::{Price, ProductId};
use cosmica_integration_tests::draft;
use cosmica_storefront::Storefront;
use cosmica_storefront::api::{ApiError, CatalogClient, ProductService};
use cosmica_storefront::catalog::RefreshOutcome;
use cosmica_storefront::config::{CatalogApiConfig, StorefrontConfig};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

// ============================================================================
// Test server
// ============================================================================

/// A request as seen by the test server.
#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    body: String,
}

type Responder = Arc<dyn Fn(&str, &str) -> (u16, String) + Send + Sync>;

struct TestServer {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    async fn start<F>(respond: F) -> Self
    where
        F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Responder = Arc::new(respond);

        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let respond = Arc::clone(&respond);
                tokio::spawn(async move {
                    handle(stream, &recorded, &respond).await;
                });
            }
        });

        Self { base_url, requests }
    }

    fn client(&self) -> CatalogClient {
        CatalogClient::new(&CatalogApiConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn handle(mut stream: TcpStream, recorded: &Mutex<Vec<Recorded>>, respond: &Responder) {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let mut request_line = head.lines().next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let (status, response_body) = respond(&method, &path);
    recorded.lock().unwrap().push(Recorded { method, path, body });

    let response = format!(
        "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{response_body}",
        response_body.len()
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

fn wire_product(id: &str, name: &str, price: Value) -> Value {
    json!({
        "id": id,
        "nombre": name,
        "precio": price,
        "stock": 3,
        "marca": "Cosmica",
        "categoria": "Tech",
        "descripcionCorta": "short",
        "descripcionLarga": "long",
        "envioSinCargo": true,
        "edadDesde": 4,
        "edadHasta": 9,
        "foto": "https://img.example.com/p.jpg"
    })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_list_products_parses_wire_format() {
    let server = TestServer::start(|_, _| {
        let body = json!([
            wire_product("1", "Robot", json!(25.5)),
            wire_product("2", "Doll", json!("12.00")),
        ]);
        (200, body.to_string())
    })
    .await;

    let products = server.client().list_products().await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Robot");
    assert_eq!(products[0].price.to_string(), "$25.50");
    assert_eq!(products[1].price, Price::from(12_u32));
    assert!(products[1].free_shipping);

    let requests = server.requests();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/productos");
}

#[tokio::test]
async fn test_get_product_by_id() {
    let server =
        TestServer::start(|_, _| (200, wire_product("7", "Kite", json!(9)).to_string())).await;

    let product = server
        .client()
        .get_product(&ProductId::new("7"))
        .await
        .unwrap();

    assert_eq!(product.id, ProductId::new("7"));
    assert_eq!(server.requests()[0].path, "/productos/7");
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let server = TestServer::start(|_, _| (404, "\"Not found\"".to_string())).await;

    let err = server
        .client()
        .get_product(&ProductId::new("404"))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(what) if what == "product 404"));
}

#[tokio::test]
async fn test_server_error_is_reported_with_status() {
    let server = TestServer::start(|_, _| (500, "{\"error\":\"boom\"}".to_string())).await;

    let err = server.client().list_products().await.unwrap_err();

    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 500);
            assert!(body.contains("boom"));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = TestServer::start(|_, _| (200, "[{\"id\": 1".to_string())).await;

    let err = server.client().list_products().await.unwrap_err();

    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_create_product_posts_wire_draft() {
    let server =
        TestServer::start(|_, _| (201, wire_product("31", "Kite", json!(12)).to_string())).await;

    let product = server
        .client()
        .create_product(&draft("Kite", "Outdoor", 12))
        .await
        .unwrap();
    assert_eq!(product.id, ProductId::new("31"));

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/productos");

    let sent: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(sent["nombre"], "Kite");
    assert_eq!(sent["categoria"], "Outdoor");
    assert_eq!(sent["precio"], json!(12.0));
    assert!(sent.get("id").is_none());
}

#[tokio::test]
async fn test_update_product_puts_wire_draft() {
    let server =
        TestServer::start(|_, _| (200, wire_product("5", "Kite", json!(14)).to_string())).await;

    let product = server
        .client()
        .update_product(&ProductId::new("5"), &draft("Kite", "Outdoor", 14))
        .await
        .unwrap();
    assert_eq!(product.price, Price::from(14_u32));

    let request = &server.requests()[0];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/productos/5");

    let sent: Value = serde_json::from_str(&request.body).unwrap();
    assert_eq!(sent["nombre"], "Kite");
    assert_eq!(sent["precio"], json!(14.0));
    assert!(sent.get("id").is_none());
}

#[tokio::test]
async fn test_update_missing_product_is_not_found() {
    let server = TestServer::start(|_, _| (404, "\"Not found\"".to_string())).await;

    let err = server
        .client()
        .update_product(&ProductId::new("8"), &draft("Kite", "Outdoor", 14))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(what) if what == "product 8"));
}

#[tokio::test]
async fn test_delete_product() {
    let server =
        TestServer::start(|_, _| (200, wire_product("5", "Kite", json!(9)).to_string())).await;

    server
        .client()
        .delete_product(&ProductId::new("5"))
        .await
        .unwrap();

    let request = &server.requests()[0];
    assert_eq!(request.method, "DELETE");
    assert_eq!(request.path, "/productos/5");
}

#[tokio::test]
async fn test_storefront_loads_over_http() {
    let server = TestServer::start(|method, path| match (method, path) {
        ("GET", "/productos") => (
            200,
            json!([wire_product("1", "Robot", json!(10))]).to_string(),
        ),
        _ => (404, "\"Not found\"".to_string()),
    })
    .await;

    let config = StorefrontConfig::from_lookup(|key| {
        (key == "CATALOG_API_BASE_URL").then(|| server.base_url.clone())
    })
    .unwrap();
    let (storefront, initial) = Storefront::from_config(&config).unwrap();

    assert_eq!(initial.wait().await, RefreshOutcome::Applied { count: 1 });
    assert_eq!(storefront.catalog().products()[0].name, "Robot");
}
