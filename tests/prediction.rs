use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use minehealth::prediction::run_prediction;
use minehealth::{
    EquipmentType, HttpPredictor, PredictionError, PredictionRequest, RiskLevel,
};

/// Serve a single HTTP request with the given status and body.
///
/// Returns the endpoint URL and a handle yielding the request body.
fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}/predict", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if line == "\r\n" || line.is_empty() {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();
        String::from_utf8(request_body).unwrap()
    });

    (url, handle)
}

fn request() -> PredictionRequest {
    PredictionRequest {
        component_type: EquipmentType::WindingRope,
        temperature: 42.0,
        corrosion: 6.5,
        diameter_reduction: 3.2,
        strength: 3100.0,
        historical_data: None,
    }
    .with_notes("rope replaced 2019")
}

#[test]
fn http_predictor_round_trip() {
    let (url, server) = serve_once(
        "200 OK",
        r#"{"failureProbability":0.35,"reasoning":"within tolerance","recommendations":"re-inspect in 30 days"}"#,
    );
    let predictor = HttpPredictor::new(url, Duration::from_secs(5)).unwrap();

    let response = run_prediction(&predictor, &request()).unwrap();
    assert_eq!(response.failure_probability, 0.35);
    assert_eq!(response.risk(), RiskLevel::Low);
    assert_eq!(response.recommendations, "re-inspect in 30 days");

    let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
    assert_eq!(sent["componentType"], "WindingRope");
    assert_eq!(sent["corrosion"], 6.5);
    assert_eq!(sent["historicalData"], "rope replaced 2019");
}

#[test]
fn http_error_status_is_reported() {
    let (url, server) = serve_once("503 Service Unavailable", r#"{"error":"busy"}"#);
    let predictor = HttpPredictor::new(url, Duration::from_secs(5)).unwrap();

    let err = run_prediction(&predictor, &request()).unwrap_err();
    assert!(matches!(err, PredictionError::Status(s) if s.as_u16() == 503));
    server.join().unwrap();
}

#[test]
fn malformed_response_is_reported() {
    let (url, server) = serve_once("200 OK", r#"{"failureProbability":"high"}"#);
    let predictor = HttpPredictor::new(url, Duration::from_secs(5)).unwrap();

    let err = run_prediction(&predictor, &request()).unwrap_err();
    assert!(matches!(err, PredictionError::InvalidResponse(_)));
    server.join().unwrap();
}

#[test]
fn unreachable_service_is_a_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let predictor =
        HttpPredictor::new(format!("http://{addr}/predict"), Duration::from_secs(2)).unwrap();

    let err = run_prediction(&predictor, &request()).unwrap_err();
    assert!(matches!(err, PredictionError::Transport(_)));
}
