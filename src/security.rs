//! Request security configuration.
//!
//! [`SecurityPolicy`] is built once at startup and handed to the app factory. It owns
//! the public URL allow-list, the token helper, and the authentication manager used
//! by the login endpoint. The chain it produces is stateless and token-only: there is
//! no session, cookie, CSRF, form-login, basic-auth or logout handling anywhere.

use std::sync::Arc;

use actix_web::http::Method;
use actix_web::middleware::DefaultHeaders;
use actix_web::web;

use crate::auth::{AuthMiddleware, AuthenticationManager, JwtHelper, PasswordEncoder, PatternError, RequestMatcher};
use crate::config::Config;
use crate::repository::UserRepository;

/// Value sent in the `X-Frame-Options` response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOptions {
    /// No header; pages may be embedded anywhere (needed by the diagnostic console).
    Disabled,
    Deny,
    SameOrigin,
}

/// Matches every request outside the API base path.
///
/// Anything not under `{api_path}/**` is public; this is a rule of its own, not a
/// fallback for unmatched routes.
pub fn outside_api(api_path: &str) -> Result<RequestMatcher, PatternError> {
    Ok(RequestMatcher::ant(&format!("{}/**", api_path))?.negate())
}

/// The ordered public URL allow-list: login, user creation, console, and everything outside the API.
pub fn public_urls(api_path: &str, console_path: &str) -> Result<RequestMatcher, PatternError> {
    Ok(RequestMatcher::Or(vec![
        RequestMatcher::ant_with_method(&format!("{}/login", api_path), Method::POST)?,
        RequestMatcher::ant(&format!("{}/users", api_path))?,
        RequestMatcher::ant(&format!("{}/**", console_path))?,
        outside_api(api_path)?,
    ]))
}

pub struct SecurityPolicy {
    api_path: String,
    public_urls: Arc<RequestMatcher>,
    tokens: Arc<JwtHelper>,
    frame_options: FrameOptions,
    authentication_manager: web::Data<AuthenticationManager>,
}

impl SecurityPolicy {
    /// Assembles the policy. A malformed path pattern fails here, at startup.
    pub fn new(
        config: &Config,
        users: Arc<dyn UserRepository>,
        encoder: PasswordEncoder,
    ) -> Result<Self, PatternError> {
        let tokens = Arc::new(JwtHelper::new(&config.jwt_secret, config.jwt_expiration_hours));
        let public_urls = public_urls(&config.api_path, &config.console_path)?;
        log::debug!("public urls: {:?}", public_urls);

        Ok(Self {
            api_path: config.api_path.clone(),
            public_urls: Arc::new(public_urls),
            authentication_manager: web::Data::new(AuthenticationManager::new(
                users,
                encoder,
                Arc::clone(&tokens),
            )),
            tokens,
            frame_options: FrameOptions::Disabled,
        })
    }

    /// Overrides the `X-Frame-Options` setting.
    pub fn with_frame_options(mut self, frame_options: FrameOptions) -> Self {
        self.frame_options = frame_options;
        self
    }

    pub fn api_path(&self) -> &str {
        &self.api_path
    }

    pub fn is_public(&self, method: &Method, path: &str) -> bool {
        self.public_urls.matches(method, path)
    }

    pub fn tokens(&self) -> Arc<JwtHelper> {
        Arc::clone(&self.tokens)
    }

    /// The shared authentication manager for the login endpoint.
    pub fn authentication_manager(&self) -> web::Data<AuthenticationManager> {
        self.authentication_manager.clone()
    }

    /// The authorization filter to wrap around the whole application.
    pub fn filter(&self) -> AuthMiddleware {
        AuthMiddleware::new(Arc::clone(&self.public_urls), Arc::clone(&self.tokens))
    }

    /// Response headers implied by the policy.
    pub fn headers(&self) -> DefaultHeaders {
        match self.frame_options {
            FrameOptions::Disabled => DefaultHeaders::new(),
            FrameOptions::Deny => DefaultHeaders::new().add(("X-Frame-Options", "DENY")),
            FrameOptions::SameOrigin => DefaultHeaders::new().add(("X-Frame-Options", "SAMEORIGIN")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthenticatedUser;
    use crate::repository::MemoryStore;
    use actix_web::{http::header, http::StatusCode, test, App, HttpResponse};
    use uuid::Uuid;

    fn policy() -> SecurityPolicy {
        let config = Config::for_tests("policy_secret");
        SecurityPolicy::new(&config, Arc::new(MemoryStore::new()), PasswordEncoder::new(4)).unwrap()
    }

    #[::core::prelude::v1::test]
    fn test_public_url_rules() {
        let policy = policy();
        assert!(policy.is_public(&Method::POST, "/api/login"));
        assert!(!policy.is_public(&Method::GET, "/api/login"));
        assert!(policy.is_public(&Method::POST, "/api/users"));
        assert!(policy.is_public(&Method::GET, "/api/users"));
        assert!(!policy.is_public(&Method::GET, "/api/users/1"));
        assert!(policy.is_public(&Method::GET, "/console/db"));
        assert!(policy.is_public(&Method::GET, "/health"));
        assert!(policy.is_public(&Method::GET, "/index.html"));
        assert!(!policy.is_public(&Method::GET, "/api"));
        assert!(!policy.is_public(&Method::GET, "/api/tasks"));
        assert!(!policy.is_public(&Method::DELETE, "/api/statuses/1"));
    }

    #[::core::prelude::v1::test]
    fn test_custom_api_path() {
        let matcher = public_urls("/v2", "/console").unwrap();
        assert!(matcher.matches(&Method::POST, "/v2/login"));
        assert!(matcher.matches(&Method::GET, "/api/tasks"));
        assert!(!matcher.matches(&Method::GET, "/v2/tasks"));
    }

    #[::core::prelude::v1::test]
    fn test_malformed_paths_fail_fast() {
        assert!(public_urls("api", "/console").is_err());
        assert!(outside_api("/api/***").is_err());
    }

    async fn whoami(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.email)
    }

    #[actix_rt::test]
    async fn test_filter_requires_token_outside_allow_list() {
        let policy = policy();
        let app = test::init_service(
            App::new()
                .wrap(policy.filter())
                .wrap(policy.headers())
                .route("/api/whoami", web::get().to(whoami))
                .route("/health", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().get("X-Frame-Options").is_none());

        let req = test::TestRequest::get().uri("/api/whoami").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .append_header((header::AUTHORIZATION, "Bearer not-a-token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let token = policy.tokens().issue(Uuid::new_v4(), "me@example.com").unwrap();
        let req = test::TestRequest::get()
            .uri("/api/whoami")
            .append_header((header::AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = test::read_body(resp).await;
        assert_eq!(body, web::Bytes::from_static(b"me@example.com"));
    }

    #[actix_rt::test]
    async fn test_frame_options_header_when_enabled() {
        let policy = policy().with_frame_options(FrameOptions::Deny);
        let app = test::init_service(
            App::new()
                .wrap(policy.headers())
                .route("/health", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.headers().get("X-Frame-Options").unwrap(), "DENY");
    }
}
