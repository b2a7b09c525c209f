use crate::{
    api::handlers::{auth, health, messages, submissions},
    auth::{require_admin_api, require_admin_page},
};
use anyhow::{Context, Result, anyhow};
use axum::{
    Router,
    body::Body,
    extract::MatchedPath,
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{delete, get, get_service, post},
};
use std::path::Path;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    services::{ServeDir, ServeFile},
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;
use url::Url;

pub mod handlers;
mod openapi;
mod state;

pub use openapi::openapi;
pub use state::{AppState, AuthConfig};

/// Build the application router.
///
/// `/api/admin/*` (except login and logout) answers `401`/`403` JSON when the
/// caller is not an admin; `/admin` and `/admin.html` redirect to the login
/// page instead. Everything under `static_dir` is public. The admin page is
/// read from `admin_dir`, which must not sit inside `static_dir`, so the only
/// way to reach it is through the guarded routes.
pub fn router(state: AppState, static_dir: &Path, admin_dir: &Path) -> Router {
    let keys = state.keys().clone();

    let guarded = Router::new()
        .route("/session", get(auth::session))
        .route("/submissions", get(submissions::list))
        .route("/submissions/:id", delete(submissions::remove))
        .route("/messages", get(messages::list).post(messages::send))
        .route_layer(middleware::from_fn_with_state(
            keys.clone(),
            require_admin_api,
        ));

    let admin_api = Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .merge(guarded);

    let admin_page = admin_dir.join("admin.html");
    let pages = Router::new()
        .route("/admin", get_service(ServeFile::new(&admin_page)))
        .route("/admin.html", get_service(ServeFile::new(&admin_page)))
        .route_layer(middleware::from_fn_with_state(keys, require_admin_page));

    Router::new()
        .route("/health", get(health::health))
        .route("/api/submissions", post(submissions::create))
        .nest("/api/admin", admin_api)
        .merge(pages)
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    state: AppState,
    static_dir: &Path,
    admin_dir: &Path,
    allowed_origin: Option<&str>,
) -> Result<()> {
    check_site_layout(static_dir, admin_dir)?;
    let cors = cors_layer(allowed_origin)?;

    let app = router(state, static_dir, admin_dir).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Gracefully shutdown");
}

/// Refuse an admin directory inside the public one; the fallback file server
/// would otherwise hand out the admin page without a session.
fn check_site_layout(static_dir: &Path, admin_dir: &Path) -> Result<()> {
    let public = static_dir
        .canonicalize()
        .with_context(|| format!("Static directory not found: {}", static_dir.display()))?;
    let admin = admin_dir
        .canonicalize()
        .with_context(|| format!("Admin directory not found: {}", admin_dir.display()))?;
    if admin.starts_with(&public) {
        return Err(anyhow!(
            "Admin directory {} must not be inside the static directory {}",
            admin_dir.display(),
            static_dir.display()
        ));
    }
    Ok(())
}

/// Cross-origin access for the admin console.
///
/// With an allowed origin configured, only that origin may call the API and
/// credentials (the session cookie) are allowed. Without one any origin may
/// call the API but cookies are not shared.
fn cors_layer(allowed_origin: Option<&str>) -> Result<CorsLayer> {
    let cors = CorsLayer::new()
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([Method::GET, Method::POST, Method::DELETE]);

    Ok(match allowed_origin {
        Some(origin) => cors
            .allow_origin(AllowOrigin::exact(origin_header(origin)?))
            .allow_credentials(true),
        None => cors.allow_origin(Any),
    })
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

fn origin_header(allowed_origin: &str) -> Result<HeaderValue> {
    let parsed = Url::parse(allowed_origin)
        .with_context(|| format!("Invalid allowed origin: {allowed_origin}"))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| anyhow!("Allowed origin must include a valid host: {allowed_origin}"))?;
    let port = parsed
        .port()
        .map_or_else(String::new, |port| format!(":{port}"));
    let origin = format!("{}://{}{}", parsed.scheme(), host, port);
    HeaderValue::from_str(&origin).context("Failed to build allowed origin header")
}
