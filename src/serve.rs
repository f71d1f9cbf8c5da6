use axum::extract::{Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use minijinja::value::Value as MiniValue;
use minijinja::Environment;
use serde_json::json;
use std::sync::Arc;
use tower_http::services::ServeDir;

use papersnap::config::CrawlConfig;
use papersnap::snapshot::SnapshotStore;

#[derive(Clone)]
struct AppState {
    store: SnapshotStore,
}

fn build_template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_loader(minijinja::path_loader("templates"));
    env
}

pub async fn run(config: CrawlConfig, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let state = AppState {
        store: SnapshotStore::new(&config.snapshot_path),
    };
    let env = build_template_env();

    let app = Router::new()
        .route("/", get(index))
        .route("/pdf/:pdf_file", get(show_pdf))
        .route("/health", get(health))
        .nest_service("/static", ServeDir::new("static"))
        .with_state((state, Arc::new(env)));

    let addr = format!("0.0.0.0:{port}");
    println!("starting server on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn render(
    env: &Environment<'static>,
    name: &str,
    context: MiniValue,
) -> Result<Html<String>, (StatusCode, String)> {
    let template = env.get_template(name).map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("template {name} not found: {err}"),
        )
    })?;
    let rendered = template.render(context).map_err(|err| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("failed to render {name}: {err}"),
        )
    })?;
    Ok(Html(rendered))
}

/// The catalog page. Every request re-reads the snapshot, so the page always
/// shows the last successfully written crawl.
async fn index(
    State((state, env)): State<(AppState, Arc<Environment<'static>>)>,
) -> axum::response::Response {
    let papers = match state.store.load() {
        Ok(papers) => papers,
        Err(err) => return (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    };
    let context = minijinja::context! { paperinfo => MiniValue::from_serialize(&papers) };
    match render(&env, "index.html", context) {
        Ok(page) => page.into_response(),
        Err(err) => err.into_response(),
    }
}

/// Viewer page for a PDF already downloaded into the static tree.
async fn show_pdf(
    State((_state, env)): State<(AppState, Arc<Environment<'static>>)>,
    AxumPath(pdf_file): AxumPath<String>,
) -> axum::response::Response {
    let context = minijinja::context! { filename => pdf_file };
    match render(&env, "pdf.html", context) {
        Ok(page) => page.into_response(),
        Err(err) => err.into_response(),
    }
}

async fn health(
    State((state, _env)): State<(AppState, Arc<Environment<'static>>)>,
) -> axum::response::Response {
    let papers = match state.store.load() {
        Ok(papers) => papers,
        Err(err) => return (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    };
    let last_update = state
        .store
        .last_written()
        .map(|time| DateTime::<Utc>::from(time).to_rfc3339());
    Json(json!({
        "papers": papers.len(),
        "last_update": last_update,
    }))
    .into_response()
}
