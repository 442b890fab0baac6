//! End-to-end print flow: HTTP intake → layout → TCP printer, with a fake
//! printer listening on localhost.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use comanda_printer::{FEED_AND_CUT, INIT, PAPER_STATUS_QUERY, SELECT_CP858};
use http_body_util::BodyExt;
use image::{Rgba, RgbaImage};
use parking_lot::Mutex;
use print_server::api::build_app;
use print_server::printing::{NetworkTransport, PrinterDirectory, PrinterTarget};
use print_server::{Config, ServerState};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tower::ServiceExt;

const STATUS_OK: u8 = 0x00;
const STATUS_PAPER_OUT: u8 = 0x60;

/// Answers status queries with `status`, records every print payload
struct FakePrinter {
    addr: SocketAddr,
    status: Arc<AtomicU8>,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FakePrinter {
    async fn start(status: u8) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let status = Arc::new(AtomicU8::new(status));
        let received = Arc::new(Mutex::new(Vec::new()));

        let (s, r) = (status.clone(), received.clone());
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(handle(stream, s.clone(), r.clone()));
            }
        });

        Self {
            addr,
            status,
            received,
        }
    }

    fn target(&self, id: &str) -> PrinterTarget {
        PrinterTarget::new(id, "127.0.0.1", self.addr.port())
    }

    fn set_status(&self, status: u8) {
        self.status.store(status, Ordering::SeqCst);
    }

    fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().clone()
    }

    async fn wait_for(&self, count: usize) -> Vec<Vec<u8>> {
        wait_until(|| self.received.lock().len() >= count).await;
        self.received()
    }
}

async fn handle(mut stream: TcpStream, status: Arc<AtomicU8>, received: Arc<Mutex<Vec<Vec<u8>>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let mut status_connection = false;

    loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if buf == PAPER_STATUS_QUERY {
            status_connection = true;
            let _ = stream.write_all(&[status.load(Ordering::SeqCst)]).await;
            buf.clear();
        }
    }

    if !status_connection && !buf.is_empty() {
        received.lock().push(buf);
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn create_state(printers: Vec<PrinterTarget>, asset_dir: &str) -> ServerState {
    let config = Config::with_overrides("/nonexistent/printers.json", asset_dir, 0);
    ServerState::with_transport(
        &config,
        PrinterDirectory::new(printers),
        Arc::new(NetworkTransport),
    )
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn kitchen_request(printer_id: Option<&str>) -> Value {
    json!({
        "printer_id": printer_id,
        "context": {
            "displayCode": "A12",
            "table": "7",
            "customer": "Rossi",
            "confirmedAt": "2024-06-01T18:45:00Z"
        },
        "lines": [
            {"foodName": "Spaghetti allo scoglio", "quantity": 2, "notes": "senza prezzemolo"},
            {"foodName": "Tiramisù", "quantity": "1"}
        ]
    })
}

#[tokio::test]
async fn kitchen_receipts_carry_progress_numbers() {
    let printer = FakePrinter::start(STATUS_OK).await;
    let state = create_state(vec![printer.target("P1")], "/nonexistent/assets");
    let app = build_app(state.clone());

    let (status, body) = call(&app, "POST", "/api/print/kitchen", Some(kitchen_request(Some("P1")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "E0000");
    assert_eq!(body["data"]["status"], "accepted");
    assert_eq!(body["data"]["progress"], 1);

    let (_, body) = call(&app, "POST", "/api/print/kitchen", Some(kitchen_request(Some("P1")))).await;
    assert_eq!(body["data"]["progress"], 2);

    // Deliveries run concurrently, so arrival order is not fixed
    let payloads = printer.wait_for(2).await;
    assert!(payloads.iter().any(|p| contains(p, b"PROGR: 1")));
    assert!(payloads.iter().any(|p| contains(p, b"PROGR: 2")));

    for payload in &payloads {
        assert!(payload.starts_with(&[INIT.as_slice(), SELECT_CP858.as_slice()].concat()));
        assert!(payload.ends_with(&FEED_AND_CUT));
        assert!(contains(payload, b"2x Spaghetti allo scoglio"));
        assert!(contains(payload, b"NOTE: senza prezzemolo"));
        // ù in CP858
        assert!(contains(payload, b"Tiramis\x97"));
        assert!(contains(payload, b"CONFERMATO: 01/06/2024 20:45"));
    }
    assert!(state.queue().is_empty());
}

#[tokio::test]
async fn paper_out_queues_until_sweep() {
    let printer = FakePrinter::start(STATUS_PAPER_OUT).await;
    let state = create_state(vec![printer.target("P1")], "/nonexistent/assets");
    let app = build_app(state.clone());

    let (status, _) = call(&app, "POST", "/api/print/kitchen", Some(kitchen_request(Some("P1")))).await;
    assert_eq!(status, StatusCode::OK);

    wait_until(|| state.queue().len() == 1).await;
    assert!(printer.received().is_empty());

    let (_, body) = call(&app, "GET", "/api/print/queue", None).await;
    assert_eq!(body["data"]["pending"], 1);
    assert_eq!(body["data"]["jobs"][0]["printer_id"], "P1");
    assert_eq!(body["data"]["jobs"][0]["attempts"], 0);

    // Still no paper: the sweep keeps the job
    let (_, body) = call(&app, "POST", "/api/print/queue/sweep", None).await;
    assert_eq!(body["data"]["started"], true);
    assert_eq!(body["data"]["report"]["delivered"], 0);
    assert_eq!(state.queue().len(), 1);

    printer.set_status(STATUS_OK);
    let (_, body) = call(&app, "POST", "/api/print/queue/sweep", None).await;
    assert_eq!(body["data"]["report"]["delivered"], 1);
    assert_eq!(body["data"]["report"]["kept"], 0);

    let payloads = printer.wait_for(1).await;
    assert!(contains(&payloads[0], b"PROGR: 1"));
    assert!(state.queue().is_empty());
}

#[tokio::test]
async fn unreachable_printer_is_queued() {
    // Bind and drop to get a port with nothing listening
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let state = create_state(
        vec![PrinterTarget::new("P1", "127.0.0.1", port)],
        "/nonexistent/assets",
    );
    let app = build_app(state.clone());

    let (status, body) = call(&app, "POST", "/api/print/kitchen", Some(kitchen_request(Some("P1")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");

    wait_until(|| state.queue().len() == 1).await;
}

#[tokio::test]
async fn invalid_address_is_rejected_and_never_queued() {
    let state = create_state(
        vec![
            PrinterTarget::new("no-ip", "", 9100),
            PrinterTarget::new("no-port", "127.0.0.1", 0),
        ],
        "/nonexistent/assets",
    );
    let app = build_app(state.clone());

    for id in ["no-ip", "no-port"] {
        let (status, body) = call(&app, "POST", "/api/print/kitchen", Some(kitchen_request(Some(id)))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "E0002");
    }

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(state.queue().is_empty());
}

#[tokio::test]
async fn unknown_printer_and_bad_body() {
    let app = build_app(create_state(vec![], "/nonexistent/assets"));

    let (status, body) = call(&app, "POST", "/api/print/kitchen", Some(kitchen_request(Some("P9")))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "E0003");

    let (status, body) = call(&app, "POST", "/api/print/receipt", Some(json!({"lines": "nope"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0006");
}

#[tokio::test]
async fn no_printer_echoes_to_console() {
    let app = build_app(create_state(vec![], "/nonexistent/assets"));

    let (status, body) = call(&app, "POST", "/api/print/kitchen", Some(kitchen_request(None))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "console");
    let text = body["data"]["text"].as_str().unwrap();
    assert!(text.contains("ORDINE: A12"));
    assert!(text.contains("2x Spaghetti allo scoglio"));
    assert!(!text.contains('\u{1b}'));
}

#[tokio::test]
async fn cash_receipt_with_logo_and_tickets() {
    let assets = tempfile::tempdir().unwrap();
    let mut logo = RgbaImage::from_pixel(60, 30, Rgba([255, 255, 255, 255]));
    for y in 5..25 {
        for x in 10..50 {
            logo.put_pixel(x, y, Rgba([0, 0, 0, 255]));
        }
    }
    logo.save(assets.path().join("logo.png")).unwrap();

    let printer = FakePrinter::start(STATUS_OK).await;
    let state = create_state(vec![printer.target("cassa")], assets.path().to_str().unwrap());
    let app = build_app(state);

    let request = json!({
        "printer_id": "cassa",
        "context": {
            "displayCode": "B3",
            "table": "4",
            "ticketNumber": 58,
            "paymentMethod": "CARD",
            "discount": "2,00",
            "singleTickets": [{"foodName": "Coperto", "quantity": 2}]
        },
        "lines": [
            {"foodName": "Margherita", "quantity": 2, "unitPrice": "7,50", "surcharge": 1},
            {"foodName": "Acqua", "quantity": 1, "unitPrice": 2}
        ]
    });
    let (status, body) = call(&app, "POST", "/api/print/receipt", Some(request)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "accepted");

    let payload = printer.wait_for(1).await.remove(0);

    // Logo raster block: 40x20 dots after crop, on a 576-dot canvas
    assert!(contains(&payload, &[0x1D, 0x76, 0x30, 0x00, 72, 0, 20, 0]));
    assert!(contains(&payload, b"PAGAMENTO: PAGAMENTO ELETTRONICO"));
    // 2x7.50 + 2 + 2x1 - 2 = 17, euro sign is 0xD5 in CP858
    assert!(contains(&payload, b" 17,00 \xD5"));
    assert!(contains(&payload, b"SCONTO"));
    // Tear-off ticket after its own cut
    let ticket_at = payload
        .windows(b"2x Coperto".len())
        .position(|w| w == b"2x Coperto")
        .unwrap();
    assert!(contains(&payload[..ticket_at], &FEED_AND_CUT));
}

#[tokio::test]
async fn health_reports_queue() {
    let app = build_app(create_state(
        vec![PrinterTarget::new("P1", "127.0.0.1", 9100)],
        "/nonexistent/assets",
    ));
    let (status, body) = call(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["printers"], 1);
    assert_eq!(body["pending_jobs"], 0);
}
