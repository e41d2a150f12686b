//! TermsCheck server — terms & conditions risk analysis HTTP API.
//!
//! One endpoint does the work: POST /api/analyze takes the document text and
//! returns clauses bucketed into CRITICAL / MEDIUM / LOW risk. The model is
//! reached through OpenRouter; no document text is ever stored.
//!
//! Usage:
//!   OPENROUTER_API_KEY=sk-or-... termscheck-server --bind 0.0.0.0:3700

use std::path::PathBuf;
use std::time::Instant;

use termscheck::ai_client::OpenRouterClient;
use termscheck::server::{router, AppState};
use termscheck::settings;

#[tokio::main]
async fn main() {
    // Parse simple args (no clap to keep binary small)
    let args: Vec<String> = std::env::args().collect();
    let mut bind_arg: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" if i + 1 < args.len() => {
                bind_arg = Some(&args[i + 1]);
                i += 2;
            }
            "--help" | "-h" => {
                println!("termscheck-server — Terms & conditions risk analysis HTTP API");
                println!();
                println!("Usage: termscheck-server [--bind ADDR:PORT]");
                println!();
                println!("Environment variables:");
                println!("  OPENROUTER_API_KEY   OpenRouter credential");
                println!("  TERMSCHECK_BIND      Bind address (default: 0.0.0.0:3700)");
                println!("  TERMSCHECK_SITE_URL  Referrer URL sent to OpenRouter");
                println!("  TERMSCHECK_MODEL     Completion model id");
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    let bind_addr = bind_arg
        .map(|s| s.to_string())
        .or_else(|| std::env::var("TERMSCHECK_BIND").ok())
        .unwrap_or_else(|| "0.0.0.0:3700".to_string());

    // Initialize settings
    let app_data_dir = dirs::data_dir()
        .map(|p| p.join("com.termscheck.app"))
        .unwrap_or_else(|| PathBuf::from("."));
    settings::init(app_data_dir);

    let config = settings::load_config();
    match settings::get_masked_api_key() {
        Some(masked) => println!("[Server] OpenRouter key: {}", masked),
        None => eprintln!(
            "[Server] Warning: OPENROUTER_API_KEY not set; analyze requests will fail"
        ),
    }
    println!("[Server] Model: {}", config.model);
    println!("[Server] Binding to: {}", bind_addr);

    let state = AppState {
        client: OpenRouterClient::new(&config),
        start_time: Instant::now(),
    };

    let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[Server] Failed to bind to {}: {}", bind_addr, e);
            std::process::exit(1);
        }
    };

    println!("[Server] Listening on {}", bind_addr);
    if let Err(e) = axum::serve(listener, router(state)).await {
        eprintln!("[Server] Server error: {}", e);
        std::process::exit(1);
    }
}
