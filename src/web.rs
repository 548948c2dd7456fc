use std::path::Path;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::context::AppContext;
use crate::error::Error;
use crate::generator::TransactionGenerator;
use crate::latency::LatencyStats;
use crate::model::Classifier;
use crate::render::PredictionReport;
use crate::session::{handle_command, ClientCommand, ServerEvent};
use crate::types::TransactionInput;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!(error = %self, "Request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        };
        let body = Json(serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));
        (status, body).into_response()
    }
}

#[derive(Serialize)]
struct Health {
    model: String,
    trees: usize,
    features: Vec<String>,
    latency: LatencyStats,
}

#[derive(Deserialize)]
struct SampleQuery {
    fraud: Option<bool>,
}

pub fn router<P: AsRef<Path>>(ctx: Arc<AppContext>, static_dir: P) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/predict", post(predict_handler))
        .route("/api/sample", get(sample_handler))
        .route("/api/health", get(health_handler))
        .fallback_service(ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

pub async fn run<P: AsRef<Path>>(
    ctx: Arc<AppContext>,
    port: u16,
    static_dir: P,
) -> Result<(), Box<dyn std::error::Error>> {
    // a missing or broken artifact stops the server before it binds
    let model = ctx.model().await?;
    info!(
        model = %model.classifier.name(),
        features = ?model.mapper.schema().names(),
        "Model ready"
    );

    let app = router(ctx, static_dir);

    let addr = format!("0.0.0.0:{port}");
    info!("Form at http://localhost:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn predict_handler(
    State(ctx): State<Arc<AppContext>>,
    Json(input): Json<TransactionInput>,
) -> Result<Json<PredictionReport>, Error> {
    let report = ctx.predict(&input).await?;
    Ok(Json(report))
}

async fn sample_handler(Query(q): Query<SampleQuery>) -> Json<TransactionInput> {
    let mut gen = TransactionGenerator::new(0.5);
    let tx = match q.fraud {
        Some(true) => gen.generate_fraud(),
        Some(false) => gen.generate_normal(),
        None => gen.generate(),
    };
    Json(tx)
}

async fn health_handler(State(ctx): State<Arc<AppContext>>) -> Result<Json<Health>, Error> {
    let model = ctx.model().await?;
    Ok(Json(Health {
        model: model.classifier.name().to_string(),
        trees: model.classifier.tree_count(),
        features: model.classifier.feature_names().to_vec(),
        latency: ctx.latency_stats(),
    }))
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<Arc<AppContext>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, ctx))
}

/// One socket is one session. Commands are read and handled strictly in order.
async fn handle_socket(socket: WebSocket, ctx: Arc<AppContext>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    error!(error = %e, "Failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session = ctx.open_session();
    info!(session = session.id, "Session opened");
    let _ = tx.send(session.greeting());

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientCommand>(&text) {
                Ok(command) => {
                    debug!(session = session.id, ?command, "Command");
                    handle_command(&ctx, &mut session, command, &tx).await;
                }
                Err(e) => {
                    let _ = tx.send(ServerEvent::Error {
                        message: format!("bad command: {e}"),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    drop(tx);
    let _ = writer.await;
    info!(
        session = session.id,
        flagged = session.watchlist.len(),
        "Session closed"
    );
}
