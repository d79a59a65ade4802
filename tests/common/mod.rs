#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use wipeguard::http::{build_router, AppState};
use wipeguard::orchestrator::{Orchestrator, SlotView};
use wipeguard::types::JobKind;

pub use wipeguard_test_utils::builders::*;
pub use wipeguard_test_utils::failing_journal::{FailOn, FailingJournal};
pub use wipeguard_test_utils::gated_journal::GatedJournal;
pub use wipeguard_test_utils::scripted_runner::{ScriptedRunner, Step};
pub use wipeguard_test_utils::{collect_frames, init_tracing, parse_sse, with_timeout, SseEvent};

/// Serve the real router on an ephemeral port. The server runs until the
/// test's runtime shuts down.
pub async fn spawn_server(orchestrator: Arc<Orchestrator>, disks_command: &[&str]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let command = disks_command.iter().map(|s| s.to_string()).collect();
    let app = build_router(AppState::new(orchestrator, command));

    tokio::spawn(async move {
        wipeguard::http::serve(listener, app, std::future::pending())
            .await
            .unwrap();
    });

    format!("http://{addr}")
}

/// Poll until the slot for `kind` is free.
pub async fn wait_for_empty_slot(orchestrator: &Orchestrator, kind: JobKind) {
    with_timeout(async {
        while orchestrator.slot_state(kind) != SlotView::Empty {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
}
