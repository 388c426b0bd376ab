use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use campus_feed::{
    api::create_app,
    config::Settings,
    domain::{Role, RoleContext},
    repository::{SqliteModuleRepository, SqliteUserRepository},
    service::ServiceContext,
    uploads::LocalUploader,
};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::ServiceExt;

const BOUNDARY: &str = "campusfeedboundary";

struct TestApp {
    router: Router,
    context: Arc<ServiceContext>,
    users: SqliteUserRepository,
    uploads_dir: std::path::PathBuf,
    cs_module: i64,
}

impl TestApp {
    async fn new() -> anyhow::Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        campus_feed::run_migrations(&pool).await?;

        let settings = Settings::default();
        let uploads_dir = std::env::temp_dir().join(format!("campus-feed-{}", uuid::Uuid::new_v4()));
        let uploader = Arc::new(LocalUploader::new(uploads_dir.clone(), settings.feed.max_attachment_bytes));
        let context = Arc::new(ServiceContext::new(pool.clone(), uploader, &settings.feed));
        let router = create_app(context.clone(), Arc::new(settings));

        let users = SqliteUserRepository::new(pool.clone());
        let modules = SqliteModuleRepository::new(pool.clone());
        let cs_module = modules.create("CS101", "Programming").await?.id;

        Ok(Self {
            router,
            context,
            users,
            uploads_dir,
            cs_module,
        })
    }

    /// Creates a user and returns a bearer token for them.
    async fn login(
        &self,
        name: &str,
        roles: &[Role],
        modules: &[(i64, RoleContext)],
    ) -> anyhow::Result<String> {
        let id = self.users.create_user(name, None).await?;
        for role in roles {
            self.users.add_role(id, *role).await?;
        }
        for (module_id, context) in modules {
            self.users.assign_module(id, *module_id, *context).await?;
        }
        Ok(self.context.auth_service.create_session(id, 1).await?)
    }

    async fn send(&self, request: Request<Body>) -> anyhow::Result<(StatusCode, Option<String>, Value)> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let pagination = response
            .headers()
            .get("x-pagination")
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, pagination, body))
    }

    async fn get(&self, uri: &str, token: &str) -> anyhow::Result<(StatusCode, Option<String>, Value)> {
        self.send(
            Request::builder()
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())?,
        )
        .await
    }

    async fn call(&self, method: &str, uri: &str, token: &str) -> anyhow::Result<StatusCode> {
        let (status, _, _) = self
            .send(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())?,
            )
            .await?;
        Ok(status)
    }

    async fn post_form(
        &self,
        token: &str,
        fields: &[(&str, &str)],
        file: Option<(&str, &[u8])>,
    ) -> anyhow::Result<(StatusCode, Value)> {
        let (status, _, body) = self
            .send(
                Request::builder()
                    .method("POST")
                    .uri("/api/feed")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={}", BOUNDARY),
                    )
                    .body(Body::from(multipart_body(fields, file)))?,
            )
            .await?;
        Ok((status, body))
    }
}

fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
                BOUNDARY, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn pagination(header: Option<String>) -> anyhow::Result<Value> {
    let header = header.ok_or_else(|| anyhow::anyhow!("missing X-Pagination header"))?;
    Ok(serde_json::from_str(&header)?)
}

#[tokio::test]
async fn test_feed_requires_session() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, _) = app
        .send(Request::builder().uri("/api/feed").body(Body::empty())?)
        .await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = app.get("/api/feed", "not-a-real-token").await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn test_health_is_public() -> anyhow::Result<()> {
    let app = TestApp::new().await?;

    let (status, _, body) = app
        .send(Request::builder().uri("/health").body(Body::empty())?)
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    Ok(())
}

#[tokio::test]
async fn test_session_cookie_is_accepted() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let token = app.login("stu", &[Role::Student], &[]).await?;

    let (status, _, body) = app
        .send(
            Request::builder()
                .uri("/api/feed")
                .header(header::COOKIE, format!("session={}", token))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!([]));

    Ok(())
}

#[tokio::test]
async fn test_lecturer_post_reaches_module_students() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let module = app.cs_module.to_string();
    let lecturer = app
        .login("lect", &[Role::Lecturer], &[(app.cs_module, RoleContext::Lecturer)])
        .await?;
    let enrolled = app
        .login("in_cs", &[Role::Student], &[(app.cs_module, RoleContext::Student)])
        .await?;
    let outsider = app.login("outsider", &[Role::Student], &[]).await?;

    let (status, created) = app
        .post_form(
            &lecturer,
            &[
                ("kind", "General"),
                ("title", "Lab moved"),
                ("message", "This week's lab is in room 2.14"),
                ("moduleId", &module),
            ],
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["audience"], "ModuleStudents");
    assert_eq!(created["moduleId"], app.cs_module);
    assert_eq!(created["createdBy"], "lect");
    assert_eq!(created["isRead"], false);

    let (status, header, body) = app.get("/api/feed", &enrolled).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["id"], created["id"]);
    let meta = pagination(header)?;
    assert_eq!(meta["totalCount"], 1);
    assert_eq!(meta["currentPage"], 1);

    let (_, header, body) = app.get("/api/feed", &outsider).await?;
    assert_eq!(body, serde_json::json!([]));
    assert_eq!(pagination(header)?["totalCount"], 0);

    Ok(())
}

#[tokio::test]
async fn test_document_upload_is_tagged_and_attachment_stored() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let module = app.cs_module.to_string();
    let lecturer = app
        .login("lect", &[Role::Lecturer], &[(app.cs_module, RoleContext::Lecturer)])
        .await?;

    let (status, created) = app
        .post_form(
            &lecturer,
            &[
                ("type", "DocumentUpload"),
                ("title", "Week 3 slides"),
                ("message", "Slides for the recursion lecture"),
                ("moduleId", &module),
            ],
            Some(("slides.pdf", b"%PDF-1.4 test")),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["title"], "[CS101] Week 3 slides");
    assert_eq!(created["message"], "Slides for the recursion lecture (Module: CS101)");
    let image_path = created["imagePath"].as_str().unwrap_or_default();
    assert!(image_path.starts_with("uploads/"));
    assert!(image_path.ends_with(".pdf"));

    Ok(())
}

#[tokio::test]
async fn test_student_cannot_post() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let student = app.login("stu", &[Role::Student], &[]).await?;

    let (status, body) = app
        .post_form(
            &student,
            &[("kind", "General"), ("title", "Hello"), ("message", "Hello everyone")],
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_bad_input() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let admin = app.login("admin", &[Role::Admin], &[]).await?;
    let lecturer = app.login("lect", &[Role::Lecturer], &[]).await?;

    let (status, _) = app
        .post_form(&admin, &[("kind", "Gossip"), ("title", "Hello"), ("message", "Hello everyone")], None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_form(&admin, &[("title", "Hello"), ("message", "Hello everyone")], None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post_form(&admin, &[("kind", "General"), ("title", "Hi"), ("message", "Hello everyone")], None)
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    // Lecturers may not send System items.
    let (status, _) = app
        .post_form(&lecturer, &[("kind", "System"), ("title", "Outage"), ("message", "Servers are down")], None)
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Nor post to a module they do not teach.
    let module = app.cs_module.to_string();
    let (status, _) = app
        .post_form(
            &lecturer,
            &[("kind", "General"), ("title", "Hello"), ("message", "Hello everyone"), ("moduleId", &module)],
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn test_unknown_module_is_a_client_error() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let admin = app.login("admin", &[Role::Admin], &[]).await?;

    let (status, body) = app
        .post_form(
            &admin,
            &[("kind", "General"), ("title", "Hello"), ("message", "Hello everyone"), ("moduleId", "999")],
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("moduleId"));

    let (status, _) = app
        .post_form(
            &admin,
            &[("kind", "DocumentUpload"), ("title", "Week 1"), ("message", "Lecture slides"), ("moduleId", "999")],
            Some(("slides.pdf", b"%PDF-1.4 test")),
        )
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, header, body) = app.get("/api/feed", &admin).await?;
    assert_eq!(body, serde_json::json!([]));
    assert_eq!(pagination(header)?["totalCount"], 0);
    assert!(!app.uploads_dir.exists());

    Ok(())
}

#[tokio::test]
async fn test_unknown_kind_reported_before_content() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let admin = app.login("admin", &[Role::Admin], &[]).await?;

    let (status, body) = app
        .post_form(&admin, &[("kind", "Gossip"), ("title", "Hi"), ("message", "Hey")], None)
        .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap_or_default().contains("kind"));

    Ok(())
}

#[tokio::test]
async fn test_blank_paging_values_fall_back_to_defaults() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let student = app.login("stu", &[Role::Student], &[]).await?;

    for query in ["?pageNumber=&pageSize=", "?pageNumber=abc&pageSize=1.5"] {
        let (status, header, body) = app.get(&format!("/api/feed{}", query), &student).await?;
        assert_eq!(status, StatusCode::OK, "query {}", query);
        assert_eq!(body, serde_json::json!([]));
        let meta = pagination(header)?;
        assert_eq!(meta["currentPage"], 1);
        assert_eq!(meta["pageSize"], 10);
    }

    Ok(())
}

#[tokio::test]
async fn test_staff_audience_hidden_from_students() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let admin = app.login("admin", &[Role::Admin], &[]).await?;
    let lecturer = app.login("lect", &[Role::Lecturer], &[]).await?;
    let student = app.login("stu", &[Role::Student], &[]).await?;

    let (status, _) = app
        .post_form(
            &admin,
            &[("kind", "System"), ("audience", "Staff"), ("title", "Payroll"), ("message", "Payroll runs Friday")],
            None,
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (_, _, body) = app.get("/api/feed", &lecturer).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(1));

    let (_, _, body) = app.get("/api/feed", &student).await?;
    assert_eq!(body, serde_json::json!([]));

    Ok(())
}

#[tokio::test]
async fn test_pagination_and_type_filter() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let admin = app.login("admin", &[Role::Admin], &[]).await?;
    let student = app.login("stu", &[Role::Student], &[]).await?;

    for (kind, title) in [
        ("General", "First news"),
        ("RepositoryUpdate", "Repo pushed"),
        ("System", "Second news"),
    ] {
        let (status, _) = app
            .post_form(&admin, &[("kind", kind), ("title", title), ("message", "Details to follow")], None)
            .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, header, body) = app.get("/api/feed?pageNumber=1&pageSize=2", &student).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(2));
    assert_eq!(body[0]["title"], "Second news");
    let meta = pagination(header)?;
    assert_eq!(meta["totalCount"], 3);
    assert_eq!(meta["totalPages"], 2);
    assert_eq!(meta["pageSize"], 2);

    let (_, _, body) = app.get("/api/feed?pageNumber=2&pageSize=2", &student).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["title"], "First news");

    let (_, header, _) = app.get("/api/feed?pageSize=500", &student).await?;
    assert_eq!(pagination(header)?["pageSize"], 50);

    let (_, _, body) = app.get("/api/feed?typeFilter=announcement", &student).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(2));

    let (_, _, body) = app.get("/api/feed?typeFilter=notification", &student).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["kind"], "RepositoryUpdate");

    let (_, _, body) = app.get("/api/feed?typeFilter=whatever", &student).await?;
    assert_eq!(body.as_array().map(Vec::len), Some(3));

    Ok(())
}

#[tokio::test]
async fn test_read_state_round_trip() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let admin = app.login("admin", &[Role::Admin], &[]).await?;
    let student = app.login("stu", &[Role::Student], &[]).await?;

    let (_, created) = app
        .post_form(&admin, &[("kind", "General"), ("title", "Exams"), ("message", "Timetable is out")], None)
        .await?;
    let id = created["id"].as_i64().unwrap_or_default();

    assert_eq!(app.call("POST", &format!("/api/feed/{}/read", id), &student).await?, StatusCode::OK);
    assert_eq!(app.call("POST", &format!("/api/feed/{}/read", id), &student).await?, StatusCode::OK);

    let (_, _, body) = app.get("/api/feed", &student).await?;
    assert_eq!(body[0]["isRead"], true);

    // Read state is per user.
    let (_, _, body) = app.get("/api/feed", &admin).await?;
    assert_eq!(body[0]["isRead"], false);

    assert_eq!(app.call("DELETE", &format!("/api/feed/{}/read", id), &student).await?, StatusCode::OK);
    let (_, _, body) = app.get("/api/feed", &student).await?;
    assert_eq!(body[0]["isRead"], false);

    assert_eq!(app.call("POST", "/api/feed/9999/read", &student).await?, StatusCode::NOT_FOUND);
    assert_eq!(app.call("DELETE", "/api/feed/9999/read", &student).await?, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_delete_permissions() -> anyhow::Result<()> {
    let app = TestApp::new().await?;
    let module = app.cs_module.to_string();
    let teaching = [(app.cs_module, RoleContext::Lecturer)];
    let author = app.login("author", &[Role::Lecturer], &teaching).await?;
    let other = app.login("other", &[Role::Lecturer], &teaching).await?;
    let coordinator = app.login("coord", &[Role::Coordinator], &[]).await?;

    let (_, first) = app
        .post_form(
            &author,
            &[("kind", "General"), ("title", "Office hours"), ("message", "Tuesdays at ten"), ("moduleId", &module)],
            None,
        )
        .await?;
    let (_, second) = app
        .post_form(
            &author,
            &[("kind", "General"), ("title", "Reading list"), ("message", "See the library page"), ("moduleId", &module)],
            None,
        )
        .await?;
    let first = format!("/api/feed/{}", first["id"]);
    let second = format!("/api/feed/{}", second["id"]);

    assert_eq!(app.call("DELETE", &first, &other).await?, StatusCode::FORBIDDEN);
    assert_eq!(app.call("DELETE", &first, &author).await?, StatusCode::OK);
    assert_eq!(app.call("DELETE", &first, &author).await?, StatusCode::NOT_FOUND);
    assert_eq!(app.call("DELETE", &second, &coordinator).await?, StatusCode::OK);

    Ok(())
}
