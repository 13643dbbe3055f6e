mod attendance;
mod backup;
mod db;
mod error;
mod ipc;
mod model;
mod qr;
mod repo;
mod reports;
mod roster;
mod school;
mod seed;
mod stats;
mod templates;

use std::io::{self, BufRead, Write};
use tracing_subscriber::{fmt::layer, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_logging() {
    // stdout carries the IPC channel.
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("EDUTRACK_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            layer()
                .with_writer(io::stderr)
                .with_line_number(true)
                .with_target(false),
        )
        .try_init();
}

fn main() {
    init_logging();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edutrackd starting");

    let mut state = ipc::AppState::default();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request line");
                ipc::bad_json(e.to_string())
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, exiting");
}
