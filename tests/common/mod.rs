#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use blog_backend::{
    build_router,
    models::errors::AppError,
    services::{
        media_storage::{ImageUpload, MediaStorage, StoredImage, UPLOAD_FOLDER},
        memory_store::MemoryStore,
    },
    utils::config::AppConfig,
    AppState,
};

pub const TEST_MAX_FILE_SIZE: usize = 1024;
pub const ADMIN_USERNAME: &str = "admin";

/// Stand-in for the media provider that records what it was sent.
/// Public ids starting with `reject` are refused the way the provider refuses bad files.
#[derive(Default)]
pub struct FakeMediaStorage {
    pub uploads: Mutex<Vec<ImageUpload>>,
}

#[async_trait]
impl MediaStorage for FakeMediaStorage {
    async fn upload_image(&self, upload: ImageUpload) -> Result<StoredImage, AppError> {
        if upload.public_id.starts_with("reject") {
            return Err(AppError::upload_rejected("Invalid image file"));
        }

        let stored = StoredImage {
            url: format!(
                "https://res.cloudinary.test/image/upload/{}/{}.png",
                UPLOAD_FOLDER, upload.public_id
            ),
            public_id: format!("{}/{}", UPLOAD_FOLDER, upload.public_id),
        };
        self.uploads.lock().unwrap().push(upload);
        Ok(stored)
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub media: Arc<FakeMediaStorage>,
}

/// Setup a test application backed by the in-memory store
pub fn setup_test_app() -> TestApp {
    let config = AppConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        admin_usernames: vec![ADMIN_USERNAME.to_string()],
        max_file_size: TEST_MAX_FILE_SIZE,
        bcrypt_cost: 4,
        ..AppConfig::default()
    };

    let store = MemoryStore::new();
    let media = Arc::new(FakeMediaStorage::default());
    let app_state = AppState::new(config, Arc::new(store.clone()), media.clone());

    TestApp {
        router: build_router(app_state),
        store,
        media,
    }
}

impl TestApp {
    /// Send a JSON request and return the status with the decoded body (`Null` when not JSON)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn register(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Register and log in; returns (user id, token)
    pub async fn signup(&self, username: &str) -> (String, String) {
        let (status, user) = self.register(username, "secret").await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", user);

        let (status, session) = self.login(username, "secret").await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", session);

        (
            user["_id"].as_str().unwrap().to_string(),
            session["token"].as_str().unwrap().to_string(),
        )
    }

    pub async fn create_category(&self, admin_token: &str, name: &str) -> String {
        let (status, category) = self
            .request(
                Method::POST,
                "/api/categories",
                Some(admin_token),
                Some(json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create category failed: {}", category);
        category["_id"].as_str().unwrap().to_string()
    }

    pub async fn create_post(&self, token: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, "/api/posts", Some(token), Some(body))
            .await
    }
}

/// Create a test PNG image (1x1 pixel)
pub fn create_test_image() -> Vec<u8> {
    vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, // IHDR chunk length
        0x49, 0x48, 0x44, 0x52, // IHDR
        0x00, 0x00, 0x00, 0x01, // Width: 1
        0x00, 0x00, 0x00, 0x01, // Height: 1
        0x08, 0x02, 0x00, 0x00, 0x00, // Bit depth, color type, etc.
        0x90, 0x77, 0x53, 0xDE, // CRC
        0x00, 0x00, 0x00, 0x0C, // IDAT chunk length
        0x49, 0x44, 0x41, 0x54, // IDAT
        0x08, 0xD7, 0x63, 0xF8, 0xCF, 0xC0, 0x00, 0x00, // Compressed data
        0x03, 0x01, 0x01, 0x00,
        0x18, 0xDD, 0x8D, 0xB4, // CRC
        0x00, 0x00, 0x00, 0x00, // IEND chunk length
        0x49, 0x45, 0x4E, 0x44, // IEND
        0xAE, 0x42, 0x60, 0x82, // CRC
    ]
}

pub enum Part<'a> {
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    },
    Text {
        name: &'a str,
        value: &'a str,
    },
}

pub const BOUNDARY: &str = "----blogtestboundary";

/// Build a raw multipart/form-data body
pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();

    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::File { name, filename, content_type, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
                body.extend_from_slice(data);
            }
            Part::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
        }
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn upload_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}
