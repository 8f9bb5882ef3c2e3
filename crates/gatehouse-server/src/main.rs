// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Gatehouse login server binary.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gatehouse_server::{create_app_state, create_router};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often expired pending logins and sessions are swept.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

/// Gatehouse - Okta login server.
#[derive(Parser, Debug)]
#[command(name = "gatehouse-server", about = "Gatehouse Okta login server", version)]
struct Args {
	/// Address to bind.
	#[arg(long, env = "GATEHOUSE_SERVER_HOST", default_value = "127.0.0.1")]
	host: String,

	/// Port to bind.
	#[arg(long, env = "GATEHOUSE_SERVER_PORT", default_value_t = 8080)]
	port: u16,

	/// SQLite database URL.
	#[arg(
		long,
		env = "GATEHOUSE_SERVER_DATABASE_URL",
		default_value = "sqlite://gatehouse.db"
	)]
	database_url: String,

	/// Public base URL of this deployment, used to derive the OAuth
	/// redirect URI. Defaults to the bind address.
	#[arg(long, env = "GATEHOUSE_SERVER_BASE_URL")]
	base_url: Option<String>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("gatehouse-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let base_url = args
		.base_url
		.clone()
		.unwrap_or_else(|| format!("http://{}:{}", args.host, args.port));

	tracing::info!(
		host = %args.host,
		port = args.port,
		database = %args.database_url,
		base_url = %base_url,
		"starting gatehouse-server"
	);

	let pool = gatehouse_server_auth::create_pool(&args.database_url).await?;
	let state = create_app_state(pool, base_url).await?;

	// Sweep expired pending logins and sessions in the background.
	{
		let oauth_state_store = Arc::clone(&state.oauth_state_store);
		let session_service = Arc::clone(&state.session_service);
		tokio::spawn(async move {
			let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
			loop {
				interval.tick().await;
				let removed = oauth_state_store.cleanup_expired().await;
				if removed > 0 {
					tracing::debug!(removed_count = removed, "expired pending logins removed");
				}
				let removed = session_service.cleanup_expired().await;
				if removed > 0 {
					tracing::debug!(removed_count = removed, "expired sessions removed");
				}
			}
		});
	}

	let app = create_router(state)
		.layer(TraceLayer::new_for_http())
		.layer(
			CorsLayer::new()
				.allow_origin(Any)
				.allow_methods(Any)
				.allow_headers(Any),
		);

	let addr = format!("{}:{}", args.host, args.port);
	tracing::info!("listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	tracing::info!("server shutdown complete");
	Ok(())
}
