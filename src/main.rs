use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use fraud_form::context::{AppConfig, AppContext, DEFAULT_MODEL_PATH};
use fraud_form::web;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Serve the form over HTTP and WebSocket
    Web,
    /// Score one transaction from a file or stdin and exit
    Score,
}

#[derive(Parser)]
#[command(name = "fraud-form", about = "Transaction fraud scoring form")]
struct Cli {
    /// Run mode: web or score
    #[arg(long, env = "FRAUD_FORM_MODE", value_enum, default_value_t = Mode::Web)]
    mode: Mode,

    /// Web server port (web mode only)
    #[arg(long, env = "FRAUD_FORM_PORT", default_value = "3000")]
    port: u16,

    /// Path to the model artifact
    #[arg(long, env = "FRAUD_FORM_MODEL", default_value = DEFAULT_MODEL_PATH)]
    model: PathBuf,

    /// Directory holding the form page (web mode only)
    #[arg(long, env = "FRAUD_FORM_STATIC", default_value = "static")]
    static_dir: PathBuf,

    /// Delay per locator progress step, in milliseconds
    #[arg(long, default_value = "50")]
    locator_step_ms: u64,

    /// Transaction JSON to score (score mode only; stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("fraud_form=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig {
        model_path: cli.model.clone(),
        locator_step: Duration::from_millis(cli.locator_step_ms),
    };
    let ctx = Arc::new(AppContext::new(config));

    match cli.mode {
        Mode::Web => web::run(ctx, cli.port, &cli.static_dir).await?,
        Mode::Score => run_score(&ctx, cli.input).await?,
    }

    Ok(())
}

async fn run_score(ctx: &AppContext, input: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    for line in ctx.score(&raw).await? {
        println!("{line}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_defaults_to_web() {
        let cli = Cli::try_parse_from(["fraud-form"]).unwrap();
        assert_eq!(cli.mode, Mode::Web);
        let cli = Cli::try_parse_from(["fraud-form", "--mode", "score"]).unwrap();
        assert_eq!(cli.mode, Mode::Score);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Cli::try_parse_from(["fraud-form", "--mode", "dashboard"]).is_err());
    }
}
