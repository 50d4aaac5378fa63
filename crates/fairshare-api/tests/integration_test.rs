use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use fairshare_api::{
    build_router,
    config::Config,
    mailer::{MailError, Mailer, OutgoingEmail},
    AppState,
};
use fairshare_assistant::{AssistantClient, AssistantError, MessageRole, Run, RunStatus};
use fairshare_chat::ThreadOrchestrator;
use fairshare_persist::MemoryStore;
use serde_json::{json, Value};
use tower::ServiceExt;

const KEY: &str = "s3cret";

const CONFIG: &str = r#"
    [server]
    host = "127.0.0.1"
    port = 0

    [cors]
    enabled = true
    origins = ["*"]

    [mongodb]
    database = "fairshare_test"
    pool_size = 1
    timeout_ms = 1000

    [assistant]
    poll_interval_ms = 5
    run_timeout_secs = 5
    request_timeout_secs = 5

    [email]
    enabled = false
    smtp_host = "localhost"
    smtp_port = 2525
    from_name = "FairShare Tax & Bookkeeping"
    admin_address = "admin@fairshare.test"

    [logging]
    level = "debug"
    format = "pretty"
"#;

/// Assistant that answers every message with "echo: <message>"; a stuck
/// one keeps every run in progress until it is cancelled
#[derive(Default)]
struct EchoAssistant {
    stuck: bool,
    threads: AtomicUsize,
    runs: AtomicUsize,
    last_posted: Mutex<HashMap<String, String>>,
    replies: Mutex<HashMap<String, String>>,
    cancelled: Mutex<Vec<String>>,
}

impl EchoAssistant {
    fn stuck() -> Self {
        Self {
            stuck: true,
            ..Self::default()
        }
    }

    fn cancelled_runs(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssistantClient for EchoAssistant {
    async fn create_thread(&self) -> fairshare_assistant::Result<String> {
        let n = self.threads.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("thread_{}", n))
    }

    async fn delete_thread(&self, _thread_id: &str) -> fairshare_assistant::Result<()> {
        Ok(())
    }

    async fn post_message(
        &self,
        thread_id: &str,
        _role: MessageRole,
        content: &str,
    ) -> fairshare_assistant::Result<()> {
        self.last_posted
            .lock()
            .unwrap()
            .insert(thread_id.to_string(), content.to_string());
        Ok(())
    }

    async fn start_run(&self, thread_id: &str, _assistant_id: &str) -> fairshare_assistant::Result<String> {
        let run_id = format!("run_{}", self.runs.fetch_add(1, Ordering::SeqCst) + 1);
        let prompt = self
            .last_posted
            .lock()
            .unwrap()
            .get(thread_id)
            .cloned()
            .unwrap_or_default();
        self.replies
            .lock()
            .unwrap()
            .insert(run_id.clone(), format!("echo: {}", prompt));
        Ok(run_id)
    }

    async fn poll_run(&self, _thread_id: &str, run_id: &str) -> fairshare_assistant::Result<Run> {
        let status = if self.stuck {
            RunStatus::InProgress
        } else {
            RunStatus::Completed
        };
        Ok(Run::new(run_id, status))
    }

    async fn cancel_run(&self, _thread_id: &str, run_id: &str) -> fairshare_assistant::Result<()> {
        self.cancelled.lock().unwrap().push(run_id.to_string());
        Ok(())
    }

    async fn fetch_latest_reply(&self, _thread_id: &str, run_id: &str) -> fairshare_assistant::Result<String> {
        self.replies
            .lock()
            .unwrap()
            .get(run_id)
            .cloned()
            .ok_or_else(|| AssistantError::EmptyReply {
                run_id: run_id.to_string(),
            })
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

struct TestApp {
    router: Router,
    mailer: Arc<RecordingMailer>,
    assistant: Arc<EchoAssistant>,
}

fn app_with(backend_key: Option<&str>, mailer: RecordingMailer) -> TestApp {
    build_app(backend_key, mailer, EchoAssistant::default())
}

fn build_app(backend_key: Option<&str>, mailer: RecordingMailer, assistant: EchoAssistant) -> TestApp {
    let mut config: Config = toml::from_str(CONFIG).unwrap();
    config.backend_key = backend_key.map(str::to_string);

    let store = MemoryStore::new();
    let assistant = Arc::new(assistant);
    let chat = ThreadOrchestrator::builder()
        .store(Arc::new(store.clone()))
        .assistant(assistant.clone())
        .assistant_id("asst_test")
        .poll_interval(config.assistant.poll_interval())
        .run_timeout(config.assistant.run_timeout())
        .build()
        .unwrap();

    let mailer = Arc::new(mailer);
    let state = AppState::new(
        config,
        chat,
        Arc::new(store.clone()),
        Arc::new(store),
        mailer.clone(),
    );

    TestApp {
        router: build_router(Arc::new(state)),
        mailer,
        assistant,
    }
}

fn app() -> TestApp {
    app_with(Some(KEY), RecordingMailer::default())
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, body: Option<Value>, key: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("x-api-key", key);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body), None).await
    }

    async fn admin(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.call(method, uri, body, Some(KEY)).await
    }

    /// Background emails land shortly after the response
    async fn wait_for_emails(&self, count: usize) -> Vec<OutgoingEmail> {
        for _ in 0..100 {
            let sent = self.mailer.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.mailer.sent()
    }
}

#[tokio::test]
async fn test_wake_up_and_health() {
    let app = app();

    let (status, body) = app.get("/wake-up").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Server is awake" }));

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["mongodb"], "in-memory");
}

#[tokio::test]
async fn test_chat_round_trip() {
    let app = app();

    let (status, body) = app.call(Method::POST, "/api/chat/thread", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let thread_id = body["threadId"].as_str().unwrap().to_string();

    let (status, body) = app
        .post("/api/chat/message", json!({ "threadId": thread_id, "message": "hi" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "echo: hi" }));

    let (status, body) = app.get(&format!("/api/chat/history/{}", thread_id)).await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "hi");
    assert_eq!(history[1]["role"], "assistant");
    assert_eq!(history[1]["content"], "echo: hi");

    let (status, body) = app.get("/api/chat/threads").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["threadId"], thread_id.as_str());
    assert_eq!(body[0]["messageCount"], 2);
}

#[tokio::test]
async fn test_dropped_request_cancels_remote_run() {
    let app = build_app(Some(KEY), RecordingMailer::default(), EchoAssistant::stuck());

    let (status, body) = app.call(Method::POST, "/api/chat/thread", None, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let thread_id = body["threadId"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/chat/message")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "threadId": thread_id, "message": "still there?" }).to_string(),
        ))
        .unwrap();
    let pending = tokio::time::timeout(Duration::from_millis(80), app.router.clone().oneshot(request)).await;
    assert!(pending.is_err(), "stuck run should not produce a response");

    // The client is gone; the exchange is cancelled in the background
    for _ in 0..100 {
        if !app.assistant.cancelled_runs().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(app.assistant.cancelled_runs(), vec!["run_1".to_string()]);

    let (status, body) = app.get(&format!("/api/chat/history/{}", thread_id)).await;
    assert_eq!(status, StatusCode::OK);
    let history = body.as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["content"], "still there?");
}

#[tokio::test]
async fn test_chat_errors() {
    let app = app();

    let (status, body) = app.get("/api/chat/threads").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = app.get("/api/chat/history/thread_missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Chat history not found" }));

    let (status, _) = app
        .post("/api/chat/message", json!({ "threadId": "thread_missing", "message": "hi" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.post("/api/chat/message", json!({ "threadId": "thread_1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_archived_thread_rejects_messages() {
    let app = app();
    let (_, body) = app.call(Method::POST, "/api/chat/thread", None, None).await;
    let thread_id = body["threadId"].as_str().unwrap().to_string();

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/chat/admin/threads/{}/status", thread_id),
            Some(json!({ "status": "archived" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "archived");

    let (status, _) = app
        .post("/api/chat/message", json!({ "threadId": thread_id, "message": "hi" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .admin(
            Method::PUT,
            &format!("/api/chat/admin/threads/{}/status", thread_id),
            Some(json!({ "status": "gone" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_admin_thread_deletes() {
    let app = app();
    let mut ids = Vec::new();
    for _ in 0..3 {
        let (_, body) = app.call(Method::POST, "/api/chat/thread", None, None).await;
        ids.push(body["threadId"].as_str().unwrap().to_string());
    }

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/chat/admin/threads/{}", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .admin(Method::DELETE, &format!("/api/chat/admin/threads/{}", ids[0]), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/chat/admin/threads/delete-multiple",
            Some(json!({ "ids": [ids[1], ids[2]] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deletedCount"], 2);

    let (_, body) = app.get("/api/chat/threads").await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_admin_key_sources() {
    let app = app();

    let (status, body) = app.get("/api/blogs/admin/categories").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "message": "Unauthorized" }));

    let (status, _) = app
        .call(Method::GET, "/api/blogs/admin/categories", None, Some("wrong"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.admin(Method::GET, "/api/blogs/admin/categories", None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .get(&format!("/api/blogs/admin/categories?apiKey={}", KEY))
        .await;
    assert_eq!(status, StatusCode::OK);

    // Key in the body; the handler still sees the full body
    let (status, body) = app
        .post(
            "/api/blogs/admin/posts",
            json!({ "apiKey": KEY, "title": "Body auth", "content": "c", "category": "Tax" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["post"]["title"], "Body auth");
}

#[tokio::test]
async fn test_admin_routes_closed_without_backend_key() {
    let app = app_with(None, RecordingMailer::default());

    let (status, _) = app.admin(Method::GET, "/api/contact/admin/contacts", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Public routes are unaffected
    let (status, _) = app.get("/api/blogs").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_blog_lifecycle() {
    let app = app();

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/blogs/admin/posts",
            Some(json!({ "title": "Year End Checklist", "content": "Gather receipts", "category": "Tax" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Post created successfully");
    assert_eq!(body["post"]["slug"], "year-end-checklist");
    assert_eq!(body["post"]["excerpt"], "Year End Checklist...");
    assert_eq!(body["post"]["author"], "Admin");
    let id = body["postId"].as_str().unwrap().to_string();

    app.admin(
        Method::POST,
        "/api/blogs/admin/posts",
        Some(json!({ "title": "Draft", "content": "wip", "category": "Payroll", "published": false })),
    )
    .await;

    let (status, body) = app.get("/api/blogs").await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body.as_array().unwrap().iter().map(|p| p["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Year End Checklist"]);

    let (status, body) = app.get(&format!("/api/blogs/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_id"], id.as_str());

    let (status, body) = app.admin(Method::GET, "/api/blogs/admin/posts?page=1&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["pagination"], json!({ "total": 2, "page": 1, "limit": 1, "pages": 2 }));

    let (_, body) = app.admin(Method::GET, "/api/blogs/admin/posts?search=RECEIPTS", None).await;
    assert_eq!(body["pagination"]["total"], 1);

    let (_, body) = app.admin(Method::GET, "/api/blogs/admin/categories", None).await;
    assert_eq!(body, json!(["Payroll", "Tax"]));

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/blogs/admin/posts/{}", id),
            Some(json!({ "title": "Year End Checklist 2026" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Post updated successfully");
    assert_eq!(body["post"]["title"], "Year End Checklist 2026");

    let (status, body) = app.admin(Method::DELETE, &format!("/api/blogs/admin/posts/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Post deleted successfully" }));

    let (status, body) = app.get(&format!("/api/blogs/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Post not found" }));
}

#[tokio::test]
async fn test_blog_validation() {
    let app = app();

    let (status, body) = app
        .admin(Method::POST, "/api/blogs/admin/posts", Some(json!({ "title": "No body" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Title, content, and category are required" }));

    let (status, body) = app
        .admin(Method::POST, "/api/blogs/admin/posts/delete-multiple", Some(json!({ "ids": [] })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Please provide valid post IDs" }));

    let (status, _) = app
        .admin(Method::PUT, "/api/blogs/admin/posts/unknown", Some(json!({ "title": "x" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_contact_submit_sends_emails() {
    let app = app();

    let (status, body) = app.get("/api/contact/test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Contact routes working" }));

    let (status, body) = app
        .post(
            "/api/contact/submit",
            json!({ "name": "Ana", "email": "ana@example.com", "message": "Payroll question" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, json!({ "success": true, "message": "Contact form submitted successfully" }));

    let sent = app.wait_for_emails(2).await;
    let mut recipients: Vec<&str> = sent.iter().map(|e| e.to.as_str()).collect();
    recipients.sort();
    assert_eq!(recipients, vec!["admin@fairshare.test", "ana@example.com"]);

    let (status, _) = app
        .post("/api/contact/submit", json!({ "name": "Ana", "message": "No email" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_succeeds_when_mail_fails() {
    let app = app_with(
        Some(KEY),
        RecordingMailer {
            fail: true,
            ..Default::default()
        },
    );

    let (status, _) = app
        .post(
            "/api/contact/submit",
            json!({ "name": "Ana", "email": "ana@example.com", "message": "Hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = app.admin(Method::GET, "/api/contact/admin/contacts", None).await;
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_contact_admin_flow() {
    let app = app();
    for name in ["Ana", "Ben"] {
        app.post(
            "/api/contact/submit",
            json!({ "name": name, "email": format!("{}@example.com", name.to_lowercase()), "message": "Hello" }),
        )
        .await;
    }
    app.wait_for_emails(4).await;

    let (status, body) = app
        .admin(Method::GET, "/api/contact/admin/contacts?search=ben", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    let id = body["data"][0]["_id"].as_str().unwrap().to_string();

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/contact/admin/contacts/{}/reply", id),
            Some(json!({ "subject": "Re: Hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "message": "Subject and message are required" }));

    let (status, body) = app
        .admin(
            Method::POST,
            &format!("/api/contact/admin/contacts/{}/reply", id),
            Some(json!({ "subject": "Re: Hello", "message": "Happy to help." })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "Reply sent successfully" }));

    let reply = app.mailer.sent().into_iter().find(|e| e.subject == "Re: Hello").unwrap();
    assert_eq!(reply.to, "ben@example.com");
    assert!(reply.body.starts_with("Dear Ben,"));

    let (_, body) = app
        .admin(Method::GET, &format!("/api/contact/admin/contacts/{}", id), None)
        .await;
    assert_eq!(body["replied"], true);
    assert_eq!(body["status"], "replied");
    assert_eq!(body["replies"][0]["subject"], "Re: Hello");

    let (_, body) = app.admin(Method::GET, "/api/contact/admin/contacts?status=replied", None).await;
    assert_eq!(body["pagination"]["total"], 1);

    let (status, body) = app.admin(Method::GET, "/api/contact/admin/contacts/stats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["new"], 1);
    assert_eq!(body["replied"], 1);
    assert_eq!(body["today"], 2);
    assert_eq!(body["byStatus"]["replied"], 1);

    let (status, body) = app
        .admin(
            Method::PUT,
            &format!("/api/contact/admin/contacts/{}", id),
            Some(json!({ "status": "closed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contact"]["status"], "closed");

    let (status, body) = app
        .admin(
            Method::POST,
            "/api/contact/admin/contacts/delete-multiple",
            Some(json!({ "ids": [id] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "1 contacts deleted successfully", "deletedCount": 1 }));

    let (status, body) = app
        .admin(Method::DELETE, "/api/contact/admin/contacts/unknown", None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "Contact not found" }));
}

#[tokio::test]
async fn test_reply_failure_leaves_contact_unreplied() {
    let app = app_with(
        Some(KEY),
        RecordingMailer {
            fail: true,
            ..Default::default()
        },
    );
    app.post(
        "/api/contact/submit",
        json!({ "name": "Ana", "email": "ana@example.com", "message": "Hi" }),
    )
    .await;
    let (_, body) = app.admin(Method::GET, "/api/contact/admin/contacts", None).await;
    let id = body["data"][0]["_id"].as_str().unwrap().to_string();

    let (status, _) = app
        .admin(
            Method::POST,
            &format!("/api/contact/admin/contacts/{}/reply", id),
            Some(json!({ "subject": "Re", "message": "Hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, body) = app
        .admin(Method::GET, &format!("/api/contact/admin/contacts/{}", id), None)
        .await;
    assert_eq!(body["replied"], false);
}

#[tokio::test]
async fn test_openapi_document_served() {
    let app = app();
    let (status, body) = app.get("/api-docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/api/chat/thread"].is_object());
}
