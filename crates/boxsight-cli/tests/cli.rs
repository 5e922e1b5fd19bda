//! Integration tests: run the `boxsight` binary against a one-shot local
//! HTTP server standing in for the detection backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread::{self, JoinHandle};

const CAT_RESPONSE: &str = r#"{"detections":[{"class_id":15,"class_name":"cat","confidence":0.92,
    "bbox":{"x_min":100,"y_min":50,"x_max":200,"y_max":150},
    "original_width":640,"original_height":480}]}"#;

/// Serve exactly one request with `status` and `body`; the handle yields
/// the raw request it received.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = format!("http://{}/detect", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream);

        let mut request = Vec::new();
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            request.extend_from_slice(line.as_bytes());
            if let Some((name, value)) = line.split_once(':') {
                if name.eq_ignore_ascii_case("content-length") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut payload = vec![0; content_length];
        reader.read_exact(&mut payload).unwrap();
        request.extend_from_slice(&payload);

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        request
    });

    (endpoint, handle)
}

/// A fresh scratch directory holding a gray `photo.png` of the given size.
fn scratch(test: &str, width: u32, height: u32) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(test);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    image::RgbaImage::from_pixel(width, height, image::Rgba([200, 200, 200, 255]))
        .save(dir.join("photo.png"))
        .unwrap();
    dir
}

fn run(dir: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_boxsight"))
        .arg(dir.join("photo.png"))
        .arg("-o")
        .arg(dir.join("out.png"))
        .args(extra)
        .env_remove("RUST_LOG")
        .env_remove("BOXSIGHT_ENDPOINT")
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn annotates_image_from_backend() {
    let dir = scratch("annotates_image_from_backend", 640, 480);
    let (endpoint, server) = serve_once("200 OK", CAT_RESPONSE);

    let output = run(&dir, &["--endpoint", &endpoint]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "cat (Confidence: 92.00%)\n");

    let annotated = image::open(dir.join("out.png")).unwrap().to_rgba8();
    assert_eq!(annotated.dimensions(), (640, 480));
    assert_eq!(annotated.get_pixel(90, 100).0, [0x2B, 0, 0, 255]);
    assert_eq!(annotated.get_pixel(150, 100).0, [200, 200, 200, 255]);

    let request = server.join().unwrap();
    let text = String::from_utf8_lossy(&request);
    assert!(text.starts_with("POST /detect HTTP/1.1\r\n"), "{text}");
    assert!(text.contains("multipart/form-data; boundary="));
    assert!(text.contains("Content-Disposition: form-data; name=\"image\"; filename=\"photo.png\""));
    assert!(text.contains("Content-Type: image/png\r\n"));
    assert!(request.windows(4).any(|w| w == b"\x89PNG"));
}

#[test]
fn server_error_fails_with_generic_message() {
    let dir = scratch("server_error_fails_with_generic_message", 64, 64);
    let (endpoint, server) =
        serve_once("500 Internal Server Error", r#"{"error":"model not loaded"}"#);

    let output = run(&dir, &["--endpoint", &endpoint]);
    server.join().unwrap();

    assert!(!output.status.success());
    let err = stderr(&output);
    assert!(err.contains("Error during detection. Please try again."), "{err}");
    // The backend's detail only reaches the log.
    assert!(err.contains("model not loaded"), "{err}");
    assert!(stdout(&output).is_empty());
    assert!(!dir.join("out.png").exists());
}

#[test]
fn malformed_body_fails() {
    let dir = scratch("malformed_body_fails", 64, 64);
    let (endpoint, server) = serve_once("200 OK", r#"{"detections":"nope"}"#);

    let output = run(&dir, &["--endpoint", &endpoint]);
    server.join().unwrap();

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error during detection. Please try again."));
    assert!(!dir.join("out.png").exists());
}

#[test]
fn unreachable_backend_fails() {
    let dir = scratch("unreachable_backend_fails", 64, 64);
    // Bind and drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let endpoint = format!("http://127.0.0.1:{port}/detect");
    let output = run(&dir, &["--endpoint", &endpoint, "--timeout", "5"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Error during detection. Please try again."));
}

#[test]
fn saved_response_needs_no_backend() {
    let dir = scratch("saved_response_needs_no_backend", 640, 480);
    let response = dir.join("response.json");
    std::fs::write(&response, CAT_RESPONSE).unwrap();

    let output = run(&dir, &["--response", response.to_str().unwrap()]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "cat (Confidence: 92.00%)\n");
    assert!(dir.join("out.png").exists());
}

#[test]
fn no_detections_writes_plain_image() {
    let dir = scratch("no_detections_writes_plain_image", 32, 16);
    let (endpoint, server) = serve_once("200 OK", r#"{"detections":[]}"#);

    let output = run(&dir, &["--endpoint", &endpoint]);
    server.join().unwrap();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert!(stderr(&output).contains("No objects detected."));
    let plain = image::open(dir.join("out.png")).unwrap().to_rgba8();
    assert!(plain.pixels().all(|p| p.0 == [200, 200, 200, 255]));
}
