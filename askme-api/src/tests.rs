use crate::routes;
use askme_app::infrastructure::db::run_migrations;
use askme_app::{AppConfig, AppContext};
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use sea_orm::{ConnectOptions, Database};
use serde_json::Value;
use tower::ServiceExt;

async fn app() -> Router {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    run_migrations(&db).await.unwrap();

    let config = AppConfig {
        database_url: "sqlite::memory:".to_string(),
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        page_size: 5,
        static_dir: "static".into(),
        session_inactivity_days: 1,
        secure_cookies: false,
        reconcile_on_start: false,
    };
    routes::router(AppContext::new(config, db))
}

fn form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn json(uri: &str, body: Value, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn location(response: &Response<Body>) -> String {
    response.headers()[header::LOCATION]
        .to_str()
        .unwrap()
        .to_string()
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Signs a new user up and returns the session cookie.
async fn sign_up(app: &Router, username: &str) -> String {
    let body = format!(
        "username={u}&email={u}%40example.com&nickname={u}&password=password123&repeat_password=password123",
        u = username
    );
    let response = app
        .clone()
        .oneshot(form("/signup/", &body, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    cookie.split(';').next().unwrap().to_string()
}

async fn ask(app: &Router, cookie: &str, title: &str) -> String {
    let body = format!("title={title}&text=Some+details&tags=rust+axum");
    let response = app
        .clone()
        .oneshot(form("/ask/", &body, Some(cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = location(&response);
    location
        .trim_start_matches("/question/")
        .trim_end_matches('/')
        .to_string()
}

#[tokio::test]
async fn test_vote_requires_login() {
    let app = app().await;
    let response = app
        .oneshot(json(
            "/like_question/",
            serde_json::json!({"type": "like", "question_id": uuid::Uuid::new_v4().to_string()}),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["status"], "error");
}

#[tokio::test]
async fn test_members_only_pages_redirect_to_login() {
    let app = app().await;
    let response = app.oneshot(get("/ask/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/?next=%2Fask%2F");
}

#[tokio::test]
async fn test_like_question_flow() {
    let app = app().await;
    let author = sign_up(&app, "author").await;
    let voter = sign_up(&app, "voter").await;
    let question_id = ask(&app, &author, "Lifetimes").await;

    let like = |kind: &str, id: &str| {
        json(
            "/like_question/",
            serde_json::json!({"type": kind, "question_id": id}),
            Some(voter.as_str()),
        )
    };

    let response = app.clone().oneshot(like("like", &question_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["rating"], 1);

    let response = app.clone().oneshot(like("like", &question_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(like("dislike", &question_id)).await.unwrap();
    assert_eq!(body_json(response).await["rating"], -1);

    let response = app.clone().oneshot(like("love", &question_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let missing = uuid::Uuid::new_v4().to_string();
    let response = app.clone().oneshot(like("like", &missing)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Question not found");

    let response = app
        .clone()
        .oneshot(json(
            "/unlike_question/",
            serde_json::json!({"question_id": question_id}),
            Some(voter.as_str()),
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["rating"], 0);
}

#[tokio::test]
async fn test_answer_and_approve() {
    let app = app().await;
    let author = sign_up(&app, "asker").await;
    let helper = sign_up(&app, "helper").await;
    let question_id = ask(&app, &author, "Tokio").await;
    let path = format!("/question/{}/", question_id);

    let response = app
        .clone()
        .oneshot(form(&path, "text=Use+spawn_blocking", Some(helper.as_str())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let target = location(&response);
    assert!(target.starts_with(&format!("{}?page=1#answer_", path)));
    let answer_id = target.rsplit("#answer_").next().unwrap().to_string();

    let approve = |cookie: &str| {
        json(
            "/approve_answer/",
            serde_json::json!({"answer_id": answer_id, "question_id": question_id}),
            Some(cookie),
        )
    };
    let response = app.clone().oneshot(approve(helper.as_str())).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(approve(author.as_str())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["is_correct"], true);

    let response = app.clone().oneshot(get(&path, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_text(response).await;
    assert!(html.contains("Use spawn_blocking"));
    assert!(html.contains("Tokio"));
}

#[tokio::test]
async fn test_login_ignores_off_site_next() {
    let app = app().await;
    sign_up(&app, "walter").await;

    let body = "username=walter&password=password123&next=https%3A%2F%2Fevil.example%2F";
    let response = app.clone().oneshot(form("/login/", body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let body = "username=walter&password=password123&next=%2Fhot%2F";
    let response = app.clone().oneshot(form("/login/", body, None)).await.unwrap();
    assert_eq!(location(&response), "/hot/");

    let body = "username=walter&password=wrong-password";
    let response = app.clone().oneshot(form("/login/", body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Invalid username or password"));
}

#[tokio::test]
async fn test_unknown_tag_and_question_are_404_pages() {
    let app = app().await;
    let response = app.clone().oneshot(get("/tag/nothing/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(get("/question/42/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(body_text(response).await.contains("Question not found"));
}

#[tokio::test]
async fn test_missing_target_wins_over_unknown_vote_type() {
    let app = app().await;
    let voter = sign_up(&app, "voter").await;
    let missing = uuid::Uuid::new_v4().to_string();

    let response = app
        .clone()
        .oneshot(json(
            "/like_question/",
            serde_json::json!({"type": "love", "question_id": missing}),
            Some(voter.as_str()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Question not found");

    let response = app
        .clone()
        .oneshot(json(
            "/like_answer/",
            serde_json::json!({"type": "love", "answer_id": missing}),
            Some(voter.as_str()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Answer not found");
}

#[tokio::test]
async fn test_answer_vote_retract_and_delete_endpoints() {
    let app = app().await;
    let asker = sign_up(&app, "asker").await;
    let helper = sign_up(&app, "helper").await;
    let question_id = ask(&app, &asker, "Borrowing").await;
    let path = format!("/question/{}/", question_id);

    let response = app
        .clone()
        .oneshot(form(&path, "text=Clone+it", Some(helper.as_str())))
        .await
        .unwrap();
    let target = location(&response);
    let answer_id = target.rsplit("#answer_").next().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(json(
            "/like_answer/",
            serde_json::json!({"type": "like", "answer_id": answer_id}),
            Some(asker.as_str()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["rating"], 1);
    assert_eq!(body["vote"], "like");

    let unlike_answer = || {
        json(
            "/unlike_answer/",
            serde_json::json!({"answer_id": answer_id}),
            Some(asker.as_str()),
        )
    };
    let response = app.clone().oneshot(unlike_answer()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["rating"], 0);
    assert!(body["vote"].is_null());

    let response = app.clone().oneshot(unlike_answer()).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "Vote not found");

    let response = app
        .clone()
        .oneshot(json(
            "/unlike_question/",
            serde_json::json!({"question_id": question_id}),
            Some(helper.as_str()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let delete = |cookie: &str| {
        json(
            "/delete_answer/",
            serde_json::json!({"answer_id": answer_id}),
            Some(cookie),
        )
    };
    let response = app.clone().oneshot(delete(asker.as_str())).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app.clone().oneshot(delete(helper.as_str())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "success");
    assert_eq!(body["answers_count"], 0);

    let response = app.clone().oneshot(delete(helper.as_str())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
