use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ::common::storage::{FilesystemAssetStore, StagingArea};
use reqwest::header::HeaderMap;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tempfile::TempDir;

use shelf::assets::AssetService;
use shelf::assets::repository::MemoryAssetRepository;
use shelf::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig,
};
use shelf::state::AppState;
use shelf::utils::jwt::{self, ROLE_ADMIN, ROLE_USER};

const JWT_SECRET: &str = "integration-test-secret";

pub mod routes {
    pub const ASSETS: &str = "/api/v1/assets";
    pub const ASSET_STATS: &str = "/api/v1/assets/stats";

    pub fn asset(id: i32) -> String {
        format!("/api/v1/assets/{id}")
    }

    pub fn asset_serve(id: i32) -> String {
        format!("/api/v1/assets/{id}/serve")
    }

    pub fn asset_download(id: i32) -> String {
        format!("/api/v1/assets/{id}/download")
    }
}

/// A running test server backed by temporary directories and an in-memory
/// asset repository.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub upload_dir: PathBuf,
    pub staging_dir: PathBuf,
    _dir: TempDir,
}

/// JSON view of a response.
pub struct TestResponse {
    pub status: u16,
    pub text: String,
    pub body: Value,
}

/// Raw view of a response, for content endpoints.
pub struct ContentResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub bytes: Vec<u8>,
}

/// A file part for [`TestApp::upload`].
pub struct UploadFile<'a> {
    pub name: &'a str,
    pub mime: Option<&'a str>,
    pub bytes: Vec<u8>,
}

impl<'a> UploadFile<'a> {
    pub fn new(name: &'a str, mime: &'a str, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name,
            mime: Some(mime),
            bytes: bytes.into(),
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_limit(1024 * 1024).await
    }

    /// Spawn with a custom maximum upload size in bytes.
    pub async fn spawn_with_limit(max_upload_size: u64) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let upload_dir = dir.path().join("uploads");
        let staging_dir = dir.path().join("staging");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: "unused".into(),
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.into(),
            },
            storage: StorageConfig {
                upload_dir: upload_dir.clone(),
                staging_dir: staging_dir.clone(),
                max_upload_size,
                staging_max_age_secs: 3600,
            },
        };

        let store = FilesystemAssetStore::new(upload_dir.clone())
            .await
            .expect("Failed to open upload dir");
        let staging = StagingArea::new(staging_dir.clone(), max_upload_size)
            .await
            .expect("Failed to open staging dir");
        let assets = AssetService::new(
            Arc::new(store),
            Arc::new(MemoryAssetRepository::new()),
            staging,
        );

        let state = AppState {
            config,
            assets: Arc::new(assets),
        };
        let app = shelf::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            upload_dir,
            staging_dir,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_token(&self) -> String {
        jwt::sign(1, "curator", ROLE_ADMIN, JWT_SECRET).unwrap()
    }

    pub fn user_token(&self) -> String {
        jwt::sign(2, "reader", ROLE_USER, JWT_SECRET).unwrap()
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send_json(self.client.get(self.url(path)).bearer_auth(token))
            .await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        self.send_json(self.client.get(self.url(path))).await
    }

    pub async fn patch_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        self.send_json(self.client.patch(self.url(path)).json(body).bearer_auth(token))
            .await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        self.send_json(self.client.delete(self.url(path)).bearer_auth(token))
            .await
    }

    /// Fetch a content endpoint, optionally with a `Range` header.
    pub async fn fetch_content(
        &self,
        path: &str,
        range: Option<&str>,
        token: &str,
    ) -> ContentResponse {
        let mut req = self.client.get(self.url(path)).bearer_auth(token);
        if let Some(range) = range {
            req = req.header(reqwest::header::RANGE, range);
        }
        let res = req.send().await.expect("Failed to send request");
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.unwrap_or_default().to_vec();
        ContentResponse {
            status,
            headers,
            bytes,
        }
    }

    /// Upload a file with descriptive metadata. `None` fields are omitted.
    pub async fn upload(
        &self,
        file: UploadFile<'_>,
        title: Option<&str>,
        description: Option<&str>,
        theme: Option<&str>,
        token: &str,
    ) -> TestResponse {
        let mut part = Part::bytes(file.bytes).file_name(file.name.to_string());
        if let Some(mime) = file.mime {
            part = part.mime_str(mime).unwrap();
        }

        let mut form = Form::new().part("file", part);
        for (name, value) in [
            ("title", title),
            ("description", description),
            ("theme", theme),
        ] {
            if let Some(value) = value {
                form = form.text(name, value.to_string());
            }
        }

        self.send_json(
            self.client
                .post(self.url(routes::ASSETS))
                .multipart(form)
                .bearer_auth(token),
        )
        .await
    }

    /// Upload a file with filled-in metadata and return its `id`.
    pub async fn create_asset(&self, file: UploadFile<'_>, title: &str, theme: &str) -> i32 {
        let token = self.admin_token();
        let res = self
            .upload(file, Some(title), Some("Uploaded by a test"), Some(theme), &token)
            .await;
        assert_eq!(res.status, 201, "create_asset failed: {}", res.text);
        res.id()
    }

    /// Every regular file currently under the durable upload directory.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        walk_files(&self.upload_dir)
    }

    /// Every regular file currently in the staging directory.
    pub fn staged_files(&self) -> Vec<PathBuf> {
        walk_files(&self.staging_dir)
    }

    async fn send_json(&self, req: RequestBuilder) -> TestResponse {
        let res = req.send().await.expect("Failed to send request");
        TestResponse::from_response(res).await
    }
}

fn walk_files(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else {
                found.push(path);
            }
        }
    }
    found
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }
}

impl ContentResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
