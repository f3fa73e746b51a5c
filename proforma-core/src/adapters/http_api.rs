//! HTTP client for the consolidate/export routes
//!
//! Talks to either the proxy or the backend directly; both expose the same
//! two routes. Builds the same multipart form a browser would.

use async_trait::async_trait;
use reqwest::header::{HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};

use crate::config::normalize_url;
use crate::domain::result::{Error, Result};
use crate::domain::{ConsolidatedResult, PdfUpload};
use crate::ports::{ApiResponse, ConsolidatorApi};

pub const CONSOLIDATE_PATH: &str = "/api/consolidate";
pub const EXPORT_PATH: &str = "/api/export-xlsx";

#[derive(Debug, Clone)]
pub struct HttpConsolidatorApi {
    client: Client,
    base_url: String,
}

impl HttpConsolidatorApi {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_url(base_url, "API URL")?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Collect a response without interpreting its status
async fn into_api_response(response: Response) -> Result<ApiResponse> {
    let status = response.status().as_u16();
    let header = |name: HeaderName| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let content_type = header(CONTENT_TYPE);
    let content_disposition = header(CONTENT_DISPOSITION);

    let body = response
        .bytes()
        .await
        .map_err(|e| Error::upstream(format!("Failed to read response body: {}", e)))?;

    Ok(ApiResponse {
        status,
        content_type,
        content_disposition,
        body: body.to_vec(),
    })
}

fn transport_error(url: &str, error: reqwest::Error) -> Error {
    if error.is_connect() {
        Error::upstream(format!("Unable to connect to {}", url))
    } else {
        Error::upstream(format!("Request to {} failed: {}", url, error))
    }
}

#[async_trait]
impl ConsolidatorApi for HttpConsolidatorApi {
    async fn consolidate(&self, files: &[PdfUpload], coa_csv: &str) -> Result<ApiResponse> {
        let mut form = Form::new();
        for file in files {
            let part = Part::bytes(file.bytes.clone())
                .file_name(file.filename.clone())
                .mime_str(&file.content_type)
                .map_err(|e| {
                    Error::validation(format!(
                        "Invalid content type for {}: {}",
                        file.filename, e
                    ))
                })?;
            form = form.part("pdfs", part);
        }
        form = form.text("coa_csv", coa_csv.to_string());

        let url = self.url(CONSOLIDATE_PATH);
        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        into_api_response(response).await
    }

    async fn export_xlsx(&self, result: &ConsolidatedResult) -> Result<ApiResponse> {
        let url = self.url(EXPORT_PATH);
        let response = self
            .client
            .post(&url)
            .json(result)
            .send()
            .await
            .map_err(|e| transport_error(&url, e))?;

        into_api_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve a single canned response and hand back the raw request
    fn one_shot_server(response: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some((name, value)) = line.trim_end().split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                head.push_str(&line);
                if line == "\r\n" {
                    break;
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            let mut stream = stream;
            stream.write_all(response.as_bytes()).unwrap();
            format!("{}{}", head, String::from_utf8_lossy(&body))
        });
        (url, handle)
    }

    #[tokio::test]
    async fn test_consolidate_sends_multipart_form() {
        let (url, handle) = one_shot_server(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n{}",
        );
        let api = HttpConsolidatorApi::new(&url).unwrap();
        let files = vec![PdfUpload::new("q1.pdf", "application/pdf", b"%PDF-1.4 fake".to_vec())];

        let response = api.consolidate(&files, "1000,Cash").await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content_type.as_deref(), Some("application/json"));

        let request = handle.join().unwrap();
        assert!(request.starts_with("POST /api/consolidate HTTP/1.1"));
        assert!(request.to_lowercase().contains("content-type: multipart/form-data; boundary="));
        assert!(request.contains(r#"name="pdfs"; filename="q1.pdf""#));
        assert!(request.contains("%PDF-1.4 fake"));
        assert!(request.contains(r#"name="coa_csv""#));
        assert!(request.contains("1000,Cash"));
    }

    #[tokio::test]
    async fn test_error_status_is_not_an_err() {
        let (url, handle) = one_shot_server(
            "HTTP/1.1 413 Payload Too Large\r\nContent-Type: application/json\r\nContent-Length: 20\r\nConnection: close\r\n\r\n{\"detail\":\"too big\"}",
        );
        let api = HttpConsolidatorApi::new(&url).unwrap();
        let response = api.export_xlsx(&ConsolidatedResult::default()).await.unwrap();
        assert_eq!(response.status, 413);
        assert!(!response.is_success());

        let request = handle.join().unwrap();
        assert!(request.starts_with("POST /api/export-xlsx HTTP/1.1"));
        assert!(request.contains(r#""rows":[]"#));
    }

    #[tokio::test]
    async fn test_unreachable_is_upstream_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let api = HttpConsolidatorApi::new(&url).unwrap();
        let err = api.export_xlsx(&ConsolidatedResult::default()).await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }

    #[test]
    fn test_rejects_bad_url() {
        assert!(HttpConsolidatorApi::new("ftp://example.com").is_err());
        let api = HttpConsolidatorApi::new("http://localhost:3000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:3000");
    }
}
