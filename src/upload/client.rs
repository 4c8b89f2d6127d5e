use super::types::{
    server_error, ProcessRequest, ProcessResponse, ProcessingResult, SelectedFile, UploadResponse,
    UploadedFileHandle,
};
use crate::config::{ConfigError, UploaderConfig};
use crate::error::UploaderError;
use reqwest::multipart::{Form, Part};
use reqwest::Url;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info};

pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, UploaderError>> + Send + 'a>>;

/// The two server endpoints the workflow talks to.
pub trait SheetApi: Send + Sync {
    fn upload_temp_file<'a>(&'a self, file: &'a SelectedFile) -> ApiFuture<'a, UploadedFileHandle>;

    fn process_file<'a>(
        &'a self,
        handle: &'a UploadedFileHandle,
    ) -> ApiFuture<'a, ProcessingResult>;
}

#[derive(Clone)]
pub struct HttpSheetClient {
    client: reqwest::Client,
    upload_url: Url,
    process_url: Url,
}

impl HttpSheetClient {
    pub fn new(config: &UploaderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: reqwest::Client::new(),
            upload_url: config.upload_url()?,
            process_url: config.process_url()?,
        })
    }

    async fn upload(&self, file: &SelectedFile) -> Result<UploadedFileHandle, UploaderError> {
        let content = tokio::fs::read(&file.path)
            .await
            .map_err(|source| UploaderError::ReadFile {
                path: file.path.clone(),
                source,
            })?;

        info!(file = %file.name, bytes = content.len(), url = %self.upload_url, "uploading file");

        let form = Form::new().part("file", Part::bytes(content).file_name(file.name.clone()));

        let response = self
            .client
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploaderError::UploadTransport(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        let body = response.json::<UploadResponse>().await.map_err(|e| {
            UploaderError::UploadTransport(format!(
                "Failed to parse upload response (status {}): {}",
                status, e
            ))
        })?;
        debug!(%status, ?body, "upload response");

        interpret_upload(body)
    }

    async fn process(
        &self,
        handle: &UploadedFileHandle,
    ) -> Result<ProcessingResult, UploaderError> {
        info!(file = %handle.file_name, url = %self.process_url, "requesting processing");

        let response = self
            .client
            .post(self.process_url.clone())
            .json(&ProcessRequest {
                file_name: &handle.file_name,
            })
            .send()
            .await
            .map_err(|e| {
                UploaderError::ProcessingTransport(format!("Failed to send request: {}", e))
            })?;

        let status = response.status();
        let body = response.json::<ProcessResponse>().await.map_err(|e| {
            UploaderError::ProcessingTransport(format!(
                "Failed to parse processing response (status {}): {}",
                status, e
            ))
        })?;
        debug!(%status, ?body, "processing response");

        interpret_process(body)
    }
}

impl SheetApi for HttpSheetClient {
    fn upload_temp_file<'a>(&'a self, file: &'a SelectedFile) -> ApiFuture<'a, UploadedFileHandle> {
        Box::pin(self.upload(file))
    }

    fn process_file<'a>(
        &'a self,
        handle: &'a UploadedFileHandle,
    ) -> ApiFuture<'a, ProcessingResult> {
        Box::pin(self.process(handle))
    }
}

fn interpret_upload(body: UploadResponse) -> Result<UploadedFileHandle, UploaderError> {
    if let Some(message) = server_error(&body.error) {
        return Err(UploaderError::UploadRejected(message.to_string()));
    }

    match body.file_name.filter(|name| !name.is_empty()) {
        Some(file_name) => Ok(UploadedFileHandle { file_name }),
        None => Err(UploaderError::UploadTransport(
            "Upload response did not include a file name".to_string(),
        )),
    }
}

fn interpret_process(body: ProcessResponse) -> Result<ProcessingResult, UploaderError> {
    if let Some(message) = server_error(&body.error) {
        return Err(UploaderError::ProcessingRejected(message.to_string()));
    }

    match (body.sheet_name, body.redirect_url) {
        (Some(sheet_name), Some(redirect_url)) if !redirect_url.is_empty() => {
            Ok(ProcessingResult {
                sheet_name,
                redirect_url,
            })
        }
        _ => Err(UploaderError::ProcessingTransport(
            "Processing response did not include a sheet name and redirect url".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Multipart;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::path::PathBuf;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn client_for(server_url: String) -> HttpSheetClient {
        let config = UploaderConfig {
            server_url,
            ..UploaderConfig::default()
        };
        HttpSheetClient::new(&config).unwrap()
    }

    fn csv_fixture(dir: &tempfile::TempDir, name: &str, contents: &str) -> SelectedFile {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        SelectedFile {
            name: name.to_string(),
            extension: "csv".to_string(),
            size_bytes: contents.len() as u64,
            path,
        }
    }

    /// Echoes the multipart field back as `tmp-<file name>-<byte count>`.
    async fn echo_upload(mut multipart: Multipart) -> (StatusCode, Json<Value>) {
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() != Some("file") {
                continue;
            }
            let name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.unwrap();
            return (
                StatusCode::OK,
                Json(json!({ "file_name": format!("tmp-{}-{}", name, data.len()) })),
            );
        }
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "No file provided" })),
        )
    }

    async fn echo_process(Json(body): Json<Value>) -> Json<Value> {
        let file_name = body["file_name"].as_str().unwrap_or_default();
        Json(json!({
            "sheet_name": format!("Sheet-{}", file_name),
            "redirect_url": "/invoices/1",
        }))
    }

    #[tokio::test]
    async fn uploads_file_as_multipart_field() {
        let url = serve(Router::new().route("/upload_temp_file/", post(echo_upload))).await;
        let dir = tempfile::tempdir().unwrap();
        let file = csv_fixture(&dir, "invoice.csv", "Employee ID,Project\n1,Apollo\n");

        let handle = client_for(url).upload_temp_file(&file).await.unwrap();
        assert_eq!(handle.file_name, "tmp-invoice.csv-29");
    }

    #[tokio::test]
    async fn error_field_with_bad_request_is_a_rejection() {
        let router = Router::new().route(
            "/upload_temp_file/",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "too large" })),
                )
            }),
        );
        let url = serve(router).await;
        let dir = tempfile::tempdir().unwrap();
        let file = csv_fixture(&dir, "invoice.csv", "a,b\n");

        let err = client_for(url).upload_temp_file(&file).await.unwrap_err();
        assert!(matches!(err, UploaderError::UploadRejected(ref m) if m == "too large"));
    }

    #[tokio::test]
    async fn non_json_upload_reply_is_a_transport_error() {
        let router = Router::new().route(
            "/upload_temp_file/",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "<h1>Server Error</h1>") }),
        );
        let url = serve(router).await;
        let dir = tempfile::tempdir().unwrap();
        let file = csv_fixture(&dir, "invoice.csv", "a,b\n");

        let err = client_for(url).upload_temp_file(&file).await.unwrap_err();
        assert!(matches!(err, UploaderError::UploadTransport(_)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let dir = tempfile::tempdir().unwrap();
        let file = csv_fixture(&dir, "invoice.csv", "a,b\n");
        let err = client_for(format!("http://{}", addr))
            .upload_temp_file(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, UploaderError::UploadTransport(_)));
    }

    #[tokio::test]
    async fn missing_local_file_fails_before_sending() {
        let file = SelectedFile {
            name: "gone.csv".to_string(),
            extension: "csv".to_string(),
            size_bytes: 0,
            path: PathBuf::from("/definitely/not/here/gone.csv"),
        };
        let err = client_for("http://127.0.0.1:9".to_string())
            .upload_temp_file(&file)
            .await
            .unwrap_err();
        assert!(matches!(err, UploaderError::ReadFile { .. }));
    }

    #[tokio::test]
    async fn processing_posts_json_file_name() {
        let url = serve(Router::new().route("/process_file/", post(echo_process))).await;
        let handle = UploadedFileHandle {
            file_name: "tmp123.csv".to_string(),
        };

        let result = client_for(url).process_file(&handle).await.unwrap();
        assert_eq!(result.sheet_name, "Sheet-tmp123.csv");
        assert_eq!(result.redirect_url, "/invoices/1");
    }

    #[tokio::test]
    async fn processing_error_field_is_a_rejection() {
        let router = Router::new().route(
            "/process_file/",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": "File not found!" })),
                )
            }),
        );
        let url = serve(router).await;
        let handle = UploadedFileHandle {
            file_name: "tmp123.csv".to_string(),
        };

        let err = client_for(url).process_file(&handle).await.unwrap_err();
        assert!(matches!(err, UploaderError::ProcessingRejected(ref m) if m == "File not found!"));
    }

    #[test]
    fn empty_error_field_does_not_count_as_rejection() {
        let body = UploadResponse {
            error: Some(String::new()),
            file_name: Some("tmp1.csv".to_string()),
        };
        assert_eq!(interpret_upload(body).unwrap().file_name, "tmp1.csv");
    }

    #[test]
    fn success_without_file_name_is_malformed() {
        let err = interpret_upload(UploadResponse::default()).unwrap_err();
        assert!(matches!(err, UploaderError::UploadTransport(_)));
    }

    #[test]
    fn processing_success_needs_redirect() {
        let body = ProcessResponse {
            error: None,
            sheet_name: Some("Sheet1".to_string()),
            redirect_url: None,
        };
        assert!(matches!(
            interpret_process(body).unwrap_err(),
            UploaderError::ProcessingTransport(_)
        ));
    }
}
