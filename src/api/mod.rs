//! HTTP wiring: router, middleware layers, and server bootstrap.

pub mod guard;
pub mod handlers;
mod openapi;
pub mod state;

pub use openapi::ApiDoc;
pub use state::{AppConfig, AppState};

use anyhow::{anyhow, Context, Result};
use axum::{
    body::Body,
    extract::{Extension, MatchedPath},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use url::Url;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::platform::Platform;
use handlers::{account, auth, health, pages, studio, subscription};

/// Build the application router with every layer applied.
///
/// # Errors
/// Returns an error if the configured site URL cannot be turned into a CORS
/// origin.
pub fn router(platform: Arc<Platform>, state: Arc<AppState>) -> Result<Router> {
    let origin = site_origin(state.config().site_url())?;
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true);

    let app = Router::new()
        .route("/", get(pages::root))
        .route("/health", get(health::health))
        .route("/studio", get(pages::studio_page))
        .route("/account/settings", get(pages::account_settings))
        .route("/subscribe", get(pages::subscribe_page))
        .route("/auth/login", get(pages::login_page))
        .route("/auth/register", get(pages::register_page))
        .route("/auth/forgot-password", get(pages::forgot_password_page))
        .route("/auth/verify-email", get(auth::verify::verify_email))
        .route(
            "/auth/reset-password",
            get(auth::recovery::reset_password_landing),
        )
        .route("/api/auth/login", post(auth::login::login))
        .route("/api/auth/signup", post(auth::signup::signup))
        .route("/api/auth/logout", post(auth::session::logout))
        .route("/api/auth/session", get(auth::session::session))
        .route(
            "/api/auth/resend-confirmation",
            post(auth::verify::resend_confirmation),
        )
        .route(
            "/api/auth/forgot-password",
            post(auth::recovery::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(auth::recovery::reset_password),
        )
        .route(
            "/api/account/profile",
            get(account::profile).patch(account::update_profile),
        )
        .route("/api/account", delete(account::delete_account))
        .route(
            "/api/subscription",
            get(subscription::get_subscription)
                .post(subscription::upsert_subscription)
                .patch(subscription::patch_subscription),
        )
        .route("/api/plans", get(subscription::plans))
        .route("/api/studio/state", get(studio::shell_state))
        .route("/api/studio/tool", put(studio::select_tool))
        .route("/api/studio/workspace", put(studio::set_workspace))
        .route("/api/studio/sheets", post(studio::add_sheet))
        .route(
            "/api/studio/sheets/:id/duplicate",
            post(studio::duplicate_sheet),
        )
        .route(
            "/api/studio/sheets/:id",
            axum::routing::patch(studio::update_sheet).delete(studio::remove_sheet),
        )
        .route("/api/studio/layers/:id/toggle", post(studio::toggle_layer))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &Request<Body>| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(platform))
                .layer(Extension(state))
                .layer(middleware::from_fn(guard::guard)),
        );

    Ok(app)
}

/// Start the server.
///
/// # Errors
/// Returns an error if the router cannot be built or the listener fails.
pub async fn new(port: u16, platform: Platform, state: AppState) -> Result<()> {
    let app = router(Arc::new(platform), Arc::new(state))?;

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Gracefully shutdown");
    }
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

fn site_origin(site_url: &str) -> Result<HeaderValue> {
    let parsed =
        Url::parse(site_url).with_context(|| format!("Invalid site URL: {site_url}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Site URL must include a valid host: {site_url}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build site origin header")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn site_origin_strips_path_and_keeps_port() -> Result<()> {
        let origin = site_origin("http://localhost:3000/some/path")?;
        assert_eq!(origin.to_str()?, "http://localhost:3000");

        let origin = site_origin("https://atelier.studio")?;
        assert_eq!(origin.to_str()?, "https://atelier.studio");
        Ok(())
    }

    #[test]
    fn site_origin_rejects_hostless_urls() {
        assert!(site_origin("not a url").is_err());
    }
}
