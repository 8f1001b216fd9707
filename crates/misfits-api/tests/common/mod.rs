#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use misfits_api::storage::Storage;
use misfits_api::{AppState, AppStateInner, router};
use misfits_db::Database;

pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub upload_dir: PathBuf,
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_dir);
    }
}

pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub raw: Vec<u8>,
}

impl TestApp {
    pub async fn new() -> Self {
        let upload_dir =
            std::env::temp_dir().join(format!("misfits_api_test_{}", uuid::Uuid::new_v4()));
        let storage = Storage::new(upload_dir.clone()).await.unwrap();

        let state = Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            secret: "test-secret".to_string(),
            storage,
        });

        Self {
            app: router(state.clone()),
            state,
            upload_dir,
        }
    }

    /// Run raw SQL against the app's database.
    pub fn exec_sql(&self, sql: &str) {
        self.state
            .db
            .with_conn(|conn| Ok(conn.execute_batch(sql)?))
            .unwrap();
    }

    /// Every file currently in the upload directory, post images and
    /// profile pictures alike.
    pub fn stored_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let mut dirs = vec![self.upload_dir.clone()];
        while let Some(dir) = dirs.pop() {
            for entry in std::fs::read_dir(&dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    dirs.push(path);
                } else {
                    files.push(path);
                }
            }
        }
        files
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let raw = resp.into_body().collect().await.unwrap().to_bytes().to_vec();
        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);
        Response {
            status,
            headers,
            body,
            raw,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut req = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, cookie: Option<&str>, body: Value) -> Response {
        let mut req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            req = req.header(header::COOKIE, cookie);
        }
        self.send(req.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_empty(&self, uri: &str, cookie: &str) -> Response {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        self.send(req).await
    }

    /// Multipart POST with text fields and at most one file part
    /// `(field, file name, bytes)`.
    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &str, &[u8])>,
    ) -> Response {
        const BOUNDARY: &str = "misfits-test-boundary";

        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        if let Some((field, file_name, data)) = file {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap();
        self.send(req).await
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> Response {
        self.post_json(
            "/register",
            None,
            json!({ "username": username, "email": email, "password": password }),
        )
        .await
    }

    /// Register `name` with `{name}@x.com` and return `(user_id, cookie)`.
    pub async fn signup(&self, name: &str) -> (i64, String) {
        let email = format!("{name}@x.com");
        let resp = self.register(name, &email, "pw-secret").await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);

        let resp = self
            .post_json(
                "/login",
                None,
                json!({ "email": email, "password": "pw-secret" }),
            )
            .await;
        assert_eq!(resp.status, StatusCode::OK);

        (resp.body["user_id"].as_i64().unwrap(), session_cookie(&resp.headers))
    }

    /// Create a text-only post and return its id.
    pub async fn create_post(&self, cookie: &str, content: &str) -> i64 {
        let resp = self
            .post_multipart("/create_post", cookie, &[("content", content)], None)
            .await;
        assert_eq!(resp.status, StatusCode::CREATED, "{:?}", resp.body);
        resp.body["id"].as_i64().unwrap()
    }
}

/// `name=value` pair of the session cookie set by a response.
pub fn session_cookie(headers: &HeaderMap) -> String {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("misfits_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
        .expect("no session cookie set")
}
