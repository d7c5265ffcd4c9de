use crate::{config::RuntimeConfiguration, router, state::MantraState};
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "mantra-test-boundary";

pub async fn test_state() -> (TempDir, MantraState) {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = RuntimeConfiguration::in_directory(dir.path());
    let state = MantraState::new(SqlitePoolOptions::new().max_connections(2), config)
        .await
        .expect("test state");
    (dir, state)
}

pub async fn test_router() -> (TempDir, Router) {
    let (dir, state) = test_state().await;
    (dir, router(state))
}

enum Part {
    Text(String),
    File {
        file_name: String,
        content_type: String,
        bytes: Vec<u8>,
    },
}

#[derive(Default)]
pub struct MultipartBuilder {
    parts: Vec<(String, Part)>,
}

impl MultipartBuilder {
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self = self.without(name);
        self.parts.push((name.into(), Part::Text(value.into())));
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self = self.without(name);
        self.parts.push((
            name.into(),
            Part::File {
                file_name: file_name.into(),
                content_type: content_type.into(),
                bytes: bytes.to_vec(),
            },
        ));
        self
    }

    pub fn without(mut self, name: &str) -> Self {
        self.parts.retain(|(existing, _)| existing != name);
        self
    }

    pub fn body(&self) -> Vec<u8> {
        let mut body = vec![];
        for (name, part) in &self.parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                            .as_bytes(),
                    );
                }
                Part::File {
                    file_name,
                    content_type,
                    bytes,
                } => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                    body.extend_from_slice(b"\r\n");
                }
            }
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    pub fn request_to(&self, uri: &str) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(self.body()))
            .expect("multipart request")
    }

    pub fn request(&self) -> Request<Body> {
        self.request_to("/api/register")
    }
}

pub fn raj_kumar() -> MultipartBuilder {
    MultipartBuilder::default()
        .text("firstName", "Raj")
        .text("lastName", "Kumar")
        .text("aadhar", "123456789012")
        .text("fatherName", "Ram Kumar")
        .text("address", "123 Main St")
        .text("mobile", "9876543210")
        .text("medium", "CBSE")
        .text("class", "10")
}

pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("get request")
}

pub async fn raw(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.expect("infallible");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    (status, bytes.to_vec())
}

pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = raw(app, request).await;
    let json = serde_json::from_slice(&bytes).expect("json body");
    (status, json)
}

pub async fn send_html(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let (status, bytes) = raw(app, request).await;
    (status, String::from_utf8(bytes).expect("utf8 body"))
}
