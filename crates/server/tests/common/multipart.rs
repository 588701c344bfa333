//! Multipart request builder.

use crate::common::verifier::stub_signature;
use axum::body::Body;
use axum::http::Request;

const BOUNDARY: &str = "sigdrop-test-boundary-7MA4YWxkTrZu0gW";

/// Builds a `multipart/form-data` upload request.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
#[derive(Default)]
pub struct UploadBody {
    body: Vec<u8>,
}

#[allow(dead_code)]
impl UploadBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file part.
    pub fn part(mut self, name: &str, filename: &str, contents: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(contents);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a `file[]` part.
    pub fn file(self, filename: &str, contents: &[u8]) -> Self {
        self.part("file[]", filename, contents)
    }

    /// Add a `signature[]` part with raw contents.
    pub fn signature(self, filename: &str, contents: &[u8]) -> Self {
        self.part("signature[]", filename, contents)
    }

    /// Add a `file[]` part and the `signature[]` the stub verifier accepts for `identity`.
    pub fn signed_file(self, filename: &str, contents: &[u8], identity: &str) -> Self {
        let signature = stub_signature(identity, contents);
        self.file(filename, contents)
            .signature(&format!("{filename}.sig"), &signature)
    }

    /// Add the `identifier` and `directory` text fields.
    pub fn target(self, identifier: &str, directory: &str) -> Self {
        self.text("identifier", identifier)
            .text("directory", directory)
    }

    /// Finish the body and wrap it in a POST request to `uri`.
    pub fn into_request(mut self, uri: &str) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(self.body))
            .unwrap()
    }
}
