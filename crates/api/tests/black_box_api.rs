use std::sync::Arc;
use std::time::Duration;

use adminpanel_api::app::{build_app, services::AppServices};
use adminpanel_auth::{AdminUser, PanelUser, Role, password};
use adminpanel_core::SoftDeletable;
use adminpanel_infra::{
    EmailSender, InMemoryActivityStore, InMemoryResetTokenStore, InMemorySessionStore,
    InMemoryUserStore, OutboxMailer, PanelConfig, ResetTokenStore, UserStore,
    reset::RESET_REQUESTED,
};
use adminpanel_ui::PanelRenderer;
use reqwest::StatusCode;

const PASSWORD: &str = "correct horse";

struct TestServer {
    base_url: String,
    users: Arc<InMemoryUserStore<AdminUser>>,
    tokens: Arc<InMemoryResetTokenStore>,
    sessions: Arc<InMemorySessionStore>,
    outbox: Arc<OutboxMailer>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(test_config(), OutboxMailer::new()).await
    }

    async fn spawn_with(config: PanelConfig, mailer: OutboxMailer) -> Self {
        let users = Arc::new(InMemoryUserStore::<AdminUser>::new());
        let tokens = Arc::new(InMemoryResetTokenStore::new());
        let sessions = Arc::new(InMemorySessionStore::new());
        let outbox = Arc::new(mailer);

        let services = AppServices::new(
            config,
            users.clone(),
            tokens.clone(),
            sessions.clone(),
            Arc::new(InMemoryActivityStore::new()),
            outbox.clone(),
            Arc::new(PanelRenderer::new()),
        );

        // Same router as prod, bound to an ephemeral port.
        let app = build_app(Arc::new(services));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            users,
            tokens,
            sessions,
            outbox,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn add_user(&self, email: &str, role: Role, should_reset: bool) -> AdminUser {
        let user = AdminUser::new(
            "Test",
            "Tester",
            email,
            password::hash_password(PASSWORD).unwrap(),
            role.as_str(),
            should_reset,
        );
        self.users.save(&user).await.unwrap();
        user
    }

    async fn login(&self, client: &reqwest::Client, email: &str, password: &str) -> reqwest::Response {
        client
            .post(self.url("/admin/login"))
            .form(&[("email", email), ("password", password)])
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn test_config() -> PanelConfig {
    let mut config = PanelConfig::default();
    config.email = Some(EmailSender {
        address: "panel@example.com".to_string(),
        name: "Panel".to_string(),
    });
    config
}

/// Browser-like client that keeps cookies but lets tests inspect redirects.
fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

fn location(res: &reqwest::Response) -> String {
    res.headers()["location"].to_str().unwrap().to_string()
}

async fn body_of(client: &reqwest::Client, url: String) -> (StatusCode, String) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    (status, res.text().await.unwrap())
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;

    let res = browser().get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_request_redirects_to_login_with_next() {
    let srv = TestServer::spawn().await;

    let res = browser()
        .get(srv.url("/admin/backend/users?page=2"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        "/admin/login?next=/admin/backend/users%3Fpage%3D2"
    );
}

#[tokio::test]
async fn login_returns_to_next_and_opens_dashboard() {
    let srv = TestServer::spawn().await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();

    let res = client
        .post(srv.url("/admin/login"))
        .form(&[
            ("email", "admin@example.com"),
            ("password", PASSWORD),
            ("next", "/admin/backend/users"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/backend/users");

    let (status, body) = body_of(&client, srv.url("/admin/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>Dashboard | Admin Panel</title>"));
}

#[tokio::test]
async fn logged_in_user_skips_the_login_page() {
    let srv = TestServer::spawn().await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();
    srv.login(&client, "admin@example.com", PASSWORD).await;

    let res = client.get(srv.url("/admin/login")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/dashboard");
}

#[tokio::test]
async fn failed_login_flashes_once() {
    let srv = TestServer::spawn().await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();

    let res = srv.login(&client, "admin@example.com", "wrong password").await;
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/login");

    let (_, first) = body_of(&client, srv.url("/admin/login")).await;
    assert!(first.contains("Invalid email or password"));

    let (_, second) = body_of(&client, srv.url("/admin/login")).await;
    assert!(!second.contains("Invalid email or password"));
}

#[tokio::test]
async fn flagged_user_is_sent_to_their_edit_page() {
    let srv = TestServer::spawn().await;
    let user = srv.add_user("flagged@example.com", Role::User, true).await;
    let client = browser();
    srv.login(&client, "flagged@example.com", PASSWORD).await;

    let edit = format!("/admin/backend/users/{}/edit", user.id);

    let res = client.get(srv.url("/admin/dashboard")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), edit);

    let (status, body) = body_of(&client, srv.url(&edit)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Please update your password"));
    assert!(body.contains("alert-danger"));
}

#[tokio::test]
async fn password_reset_flow_and_replay() {
    let srv = TestServer::spawn().await;
    srv.add_user("forgot@example.com", Role::User, false).await;
    let client = browser();

    let res = client
        .post(srv.url("/admin/login/reset"))
        .form(&[("email", "forgot@example.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/login");
    assert_eq!(srv.outbox.sent().len(), 1);

    let token = srv.tokens.find_by_email("forgot@example.com").await.unwrap()[0]
        .token
        .clone();

    let (status, _) = body_of(&client, srv.url(&format!("/admin/login/reset/{token}"))).await;
    assert_eq!(status, StatusCode::OK);

    // Mismatched repeat goes back to the form.
    let res = client
        .post(srv.url("/admin/login/reset/change"))
        .form(&[
            ("token", token.as_str()),
            ("email", "forgot@example.com"),
            ("password", "new password 1"),
            ("passwordRepeat", "new password 2"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), format!("/admin/login/reset/{token}"));

    let change = [
        ("token", token.as_str()),
        ("email", "FORGOT@example.com"),
        ("password", "new password 1"),
        ("passwordRepeat", "new password 1"),
    ];
    let res = client
        .post(srv.url("/admin/login/reset/change"))
        .form(&change)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/admin/login");

    let res = srv.login(&browser(), "forgot@example.com", "new password 1").await;
    assert_eq!(location(&res), "/admin/dashboard");

    // A used token cannot be replayed.
    let res = client
        .post(srv.url("/admin/login/reset/change"))
        .form(&change)
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/admin/login");
    let (_, body) = body_of(&client, srv.url("/admin/login")).await;
    assert!(body.contains("Token does not exist"));
}

#[tokio::test]
async fn reset_for_unknown_email_looks_the_same() {
    let srv = TestServer::spawn().await;

    let res = browser()
        .post(srv.url("/admin/login/reset"))
        .form(&[("email", "nobody@example.com")])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/login");
    assert!(srv.outbox.sent().is_empty());
}

#[tokio::test]
async fn denied_page_redirects_to_dashboard() {
    let srv = TestServer::spawn().await;
    srv.add_user("plain@example.com", Role::User, false).await;
    let client = browser();
    srv.login(&client, "plain@example.com", PASSWORD).await;

    let res = client.get(srv.url("/admin/backend/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/dashboard");

    let (_, body) = body_of(&client, srv.url("/admin/dashboard")).await;
    assert!(body.contains("Page not found"));
}

#[tokio::test]
async fn unknown_route_redirects_to_dashboard() {
    let srv = TestServer::spawn().await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();
    srv.login(&client, "admin@example.com", PASSWORD).await;

    let res = client.get(srv.url("/admin/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/dashboard");
}

#[tokio::test]
async fn admin_creates_deletes_and_restores_a_user() {
    let srv = TestServer::spawn().await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();
    srv.login(&client, "admin@example.com", PASSWORD).await;

    let res = client
        .post(srv.url("/admin/backend/users/store"))
        .form(&[
            ("name", "New Person"),
            ("title", "Editor"),
            ("email", "new@example.com"),
            ("password", ""),
            ("passwordRepeat", ""),
            ("role", "user"),
            ("shouldSendEmail", "true"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/admin/backend/users");

    let created = srv.users.find_by_email("new@example.com").await.unwrap().unwrap();
    assert_eq!(created.role_name(), "User");
    assert!(created.should_reset_password);
    assert_eq!(srv.outbox.sent().len(), 1);

    let (status, body) = body_of(&client, srv.url("/admin/backend/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("new@example.com"));

    let res = client
        .get(srv.url(&format!("/admin/backend/users/{}/delete", created.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/admin/backend/users");
    let deleted = srv.users.find_by_id_with_deleted(&created.id).await.unwrap().unwrap();
    assert!(deleted.is_deleted());

    let res = client
        .get(srv.url(&format!("/admin/backend/users/{}/restore", created.id)))
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/admin/backend/users");
    assert!(srv.users.find_by_id(&created.id).await.unwrap().is_some());

    let (_, dashboard) = body_of(&client, srv.url("/admin/dashboard")).await;
    assert!(dashboard.contains("Recent activity"));
    assert!(dashboard.contains("Created user new@example.com"));
    assert!(dashboard.contains("Deleted user new@example.com"));
    assert!(dashboard.contains("Restored user new@example.com"));
}

#[tokio::test]
async fn duplicate_email_is_a_validation_error() {
    let srv = TestServer::spawn().await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();
    srv.login(&client, "admin@example.com", PASSWORD).await;

    let res = client
        .post(srv.url("/admin/backend/users/store"))
        .form(&[
            ("name", "Clone"),
            ("title", "Clone"),
            ("email", "admin@example.com"),
            ("password", "long enough"),
            ("passwordRepeat", "long enough"),
            ("role", "User"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(location(&res), "/admin/backend/users/create");

    let (_, body) = body_of(&client, srv.url("/admin/backend/users/create")).await;
    assert!(body.contains("Validation error"));
}

#[tokio::test]
async fn trailing_slash_paths_are_still_guarded() {
    let srv = TestServer::spawn().await;

    let res = browser()
        .get(srv.url("/admin/backend/users/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/login?next=/admin/backend/users");

    let user = srv.add_user("flagged@example.com", Role::User, true).await;
    let client = browser();
    srv.login(&client, "flagged@example.com", PASSWORD).await;
    let edit = format!("/admin/backend/users/{}/edit", user.id);

    let res = client.get(srv.url("/admin/dashboard/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), edit);

    let (status, body) = body_of(&client, srv.url(&format!("{edit}/"))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Please update your password"));
}

#[tokio::test]
async fn consumed_session_is_deleted() {
    let srv = TestServer::spawn().await;
    let client = browser();

    // An anonymous visit stores nothing.
    body_of(&client, srv.url("/admin/login")).await;
    assert!(srv.sessions.is_empty());

    srv.login(&client, "nobody@example.com", "wrong password").await;
    assert_eq!(srv.sessions.len(), 1);

    // Rendering the flash empties the session, which is then dropped.
    let (_, body) = body_of(&client, srv.url("/admin/login")).await;
    assert!(body.contains("Invalid email or password"));
    assert!(srv.sessions.is_empty());
}

#[tokio::test]
async fn idle_session_expires() {
    let mut config = test_config();
    config.session_idle_timeout = chrono::Duration::milliseconds(50);
    let srv = TestServer::spawn_with(config, OutboxMailer::new()).await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();
    let res = srv.login(&client, "admin@example.com", PASSWORD).await;
    assert_eq!(location(&res), "/admin/dashboard");
    assert_eq!(srv.sessions.len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;

    let res = client.get(srv.url("/admin/dashboard")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/login?next=/admin/dashboard");
    assert!(srv.sessions.is_empty());
}

#[tokio::test]
async fn failing_mailer_does_not_fail_user_creation() {
    let srv = TestServer::spawn_with(test_config(), OutboxMailer::failing()).await;
    srv.add_user("admin@example.com", Role::Admin, false).await;
    let client = browser();
    srv.login(&client, "admin@example.com", PASSWORD).await;

    let res = client
        .post(srv.url("/admin/backend/users/store"))
        .form(&[
            ("name", "New Person"),
            ("title", "Editor"),
            ("email", "new@example.com"),
            ("password", ""),
            ("passwordRepeat", ""),
            ("role", "User"),
            ("shouldSendEmail", "true"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/backend/users");
    assert!(srv.users.find_by_email("new@example.com").await.unwrap().is_some());
    assert!(srv.outbox.sent().is_empty());

    let (_, body) = body_of(&client, srv.url("/admin/backend/users")).await;
    assert!(body.contains("Successfully created user"));
}

#[tokio::test]
async fn failing_mailer_does_not_fail_reset_request() {
    let srv = TestServer::spawn_with(test_config(), OutboxMailer::failing()).await;
    srv.add_user("forgot@example.com", Role::User, false).await;
    let client = browser();

    let res = client
        .post(srv.url("/admin/login/reset"))
        .form(&[("email", "forgot@example.com")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "/admin/login");
    assert!(srv.outbox.sent().is_empty());

    let (_, body) = body_of(&client, srv.url("/admin/login")).await;
    assert!(body.contains(RESET_REQUESTED));
}
