//! Per-connection state and the commands a session understands.
//!
//! A session lives exactly as long as its connection. Commands are handled
//! one at a time, so the session state needs no locking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, warn};

use crate::context::AppContext;
use crate::render::PredictionReport;
use crate::types::{TransactionInput, DEFAULT_PHONE};

/// Phone numbers tied to transactions flagged as fraud. Append-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Watchlist {
    entries: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `phone` when the report is a fraud verdict. Duplicates are kept.
    pub fn record(&mut self, report: &PredictionReport, phone: &str) -> bool {
        if report.is_fraud() {
            self.entries.push(phone.to_string());
            true
        } else {
            false
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug)]
pub struct Session {
    pub id: u64,
    pub started_at: DateTime<Utc>,
    pub watchlist: Watchlist,
}

impl Session {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            started_at: Utc::now(),
            watchlist: Watchlist::new(),
        }
    }

    pub fn greeting(&self) -> ServerEvent {
        ServerEvent::Session {
            id: self.id,
            started_at: self.started_at,
            watchlist: self.watchlist.entries().to_vec(),
        }
    }
}

// ── Wire protocol ──

fn default_phone() -> String {
    DEFAULT_PHONE.to_string()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientCommand {
    Predict {
        #[serde(default)]
        input: TransactionInput,
        #[serde(default = "default_phone")]
        phone: String,
    },
    Locate {
        #[serde(default)]
        query: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    Session {
        id: u64,
        started_at: DateTime<Utc>,
        watchlist: Vec<String>,
    },
    Prediction {
        #[serde(flatten)]
        report: PredictionReport,
        watchlist: Vec<String>,
    },
    Progress {
        step: u32,
        total: u32,
    },
    Located {
        coordinates: String,
    },
    Error {
        message: String,
    },
}

/// Runs one command to completion, emitting events as it goes.
pub async fn handle_command(
    ctx: &AppContext,
    session: &mut Session,
    command: ClientCommand,
    events: &UnboundedSender<ServerEvent>,
) {
    match command {
        ClientCommand::Predict { input, phone } => match ctx.predict(&input).await {
            Ok(report) => {
                if session.watchlist.record(&report, &phone) {
                    info!(
                        session = session.id,
                        phone = %phone,
                        probability = report.probability,
                        "Fraud verdict, phone added to watchlist"
                    );
                }
                let _ = events.send(ServerEvent::Prediction {
                    report,
                    watchlist: session.watchlist.entries().to_vec(),
                });
            }
            Err(e) => {
                warn!(session = session.id, error = %e, "Prediction failed");
                let _ = events.send(ServerEvent::Error { message: e.to_string() });
            }
        },
        ClientCommand::Locate { query } => {
            let located = ctx
                .locator()
                .locate(&query, |step, total| {
                    let _ = events.send(ServerEvent::Progress { step, total });
                })
                .await;
            if let Some(coordinates) = located {
                let _ = events.send(ServerEvent::Located {
                    coordinates: coordinates.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        let cmd: ClientCommand =
            serde_json::from_str(r#"{"action":"predict","input":{"type":"TRANSFER"}}"#).unwrap();
        match cmd {
            ClientCommand::Predict { input, phone } => {
                assert_eq!(input.kind, crate::types::TransactionType::Transfer);
                assert_eq!(phone, DEFAULT_PHONE);
            }
            other => panic!("unexpected {other:?}"),
        }

        let cmd: ClientCommand = serde_json::from_str(r#"{"action":"locate"}"#).unwrap();
        assert!(matches!(cmd, ClientCommand::Locate { ref query } if query.is_empty()));
    }

    #[test]
    fn events_are_tagged() {
        let json = serde_json::to_value(ServerEvent::Progress { step: 3, total: 100 }).unwrap();
        assert_eq!(json["event"], "progress");
        assert_eq!(json["step"], 3);
    }
}
