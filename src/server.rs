use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tera::{Context, Tera};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::connection::ConnectionManager;
use crate::error::Result;
use crate::scan::Cell;
use crate::scheme::Scheme;

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = Tera::default();
        if let Err(e) = tera.add_raw_template("index.html", include_str!("../templates/index.html")) {
            error!("Template parsing error: {}", e);
            std::process::exit(1);
        }
        tera.autoescape_on(vec![".html"]);
        tera
    };
}

pub struct AppState {
    pub config: Arc<AppConfig>,
    pub manager: ConnectionManager,
}

/// Body of `/save` and `/connect`. Both fields are optional at the
/// extractor so a missing `ssid` can be answered with `false`.
#[derive(Debug, Deserialize)]
pub struct NetworkForm {
    ssid: Option<String>,
    passkey: Option<String>,
}

/// Reply of `/save` and `/connect`: the scheme record, or `false` for any failure.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum SchemeReply {
    Scheme(Scheme),
    Failed(bool),
}

impl From<Result<Scheme>> for SchemeReply {
    fn from(result: Result<Scheme>) -> Self {
        match result {
            Ok(scheme) => SchemeReply::Scheme(scheme),
            Err(_) => SchemeReply::Failed(false),
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/active", get(active_handler))
        .route("/scheme", get(scheme_handler))
        .route("/networks", get(networks_handler))
        .route("/save", post(save_handler))
        .route("/connect", post(connect_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn run_server(config: Arc<AppConfig>, manager: ConnectionManager) -> anyhow::Result<()> {
    let addr = config.listen_addr();
    info!(
        addr = %addr,
        ap = %config.ap,
        adapter = %config.adapter,
        "starting server"
    );

    let app = router(Arc::new(AppState { config, manager }));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Scan of the access-point interface; a failed scan lists nothing.
fn visible_networks(state: &AppState) -> Vec<Cell> {
    state
        .manager
        .list_networks(&state.config.ap)
        .unwrap_or_else(|e| {
            error!(interface = %state.config.ap, error = %e, "scan failed");
            Vec::new()
        })
}

async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut context = Context::new();
    context.insert("networks", &visible_networks(&state));
    context.insert("active", &state.manager.active(&state.config.adapter));
    context.insert("name", &state.config.name);

    match TEMPLATES.render("index.html", &context) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            error!("Template render error: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
        }
    }
}

async fn active_handler(State(state): State<Arc<AppState>>) -> Json<Option<String>> {
    Json(state.manager.active(&state.config.adapter))
}

async fn scheme_handler(State(state): State<Arc<AppState>>) -> Json<Option<Scheme>> {
    Json(state.manager.resolve_scheme(&state.config.adapter, None))
}

async fn networks_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Cell>> {
    Json(visible_networks(&state))
}

async fn save_handler(
    State(state): State<Arc<AppState>>,
    form: Option<Form<NetworkForm>>,
) -> Json<SchemeReply> {
    let Some(Form(NetworkForm {
        ssid: Some(ssid),
        passkey,
    })) = form
    else {
        return Json(SchemeReply::Failed(false));
    };

    let result = state
        .manager
        .save_and_replace(&state.config.adapter, &ssid, passkey.as_deref());
    Json(result.into())
}

async fn connect_handler(
    State(state): State<Arc<AppState>>,
    form: Option<Form<NetworkForm>>,
) -> Json<SchemeReply> {
    let Some(Form(NetworkForm {
        ssid: Some(ssid),
        passkey,
    })) = form
    else {
        return Json(SchemeReply::Failed(false));
    };

    let adapter = &state.config.adapter;
    let scheme = match passkey.as_deref().filter(|p| !p.is_empty()) {
        Some(passkey) => state.manager.save_and_replace(adapter, &ssid, Some(passkey)).ok(),
        None => state.manager.resolve_scheme(adapter, Some(ssid.as_str())),
    };

    Json(state.manager.connect(scheme).into())
}
