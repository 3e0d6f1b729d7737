use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use mapdeck_bridge::{BridgeHub, COLLECTION_BRIDGE};
use mapdeck_core::{CollectionState, ViewState};
use mapdeck_reconcile::Reconciler;
use mapdeck_store::{StateStore, Store};

fn init_tracing() {
    let env = std::env::var("MAPDECK_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    init_tracing();

    let collection: Arc<dyn StateStore<CollectionState>> =
        Arc::new(Store::new(CollectionState::default()));
    let view: Arc<dyn StateStore<ViewState>> = Arc::new(Store::new(ViewState::default()));
    let hub = Arc::new(BridgeHub::new());

    // Single consumer task keeps snapshot application in delivery order;
    // the reconciler itself needs no locks.
    let mut reconciler = Reconciler::new(Arc::clone(&collection), Arc::clone(&view));
    let mut snapshots = hub.subscribe(COLLECTION_BRIDGE);
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snap = snapshots.borrow_and_update().clone();
            if let Some(snap) = snap {
                reconciler.apply_snapshot(&snap);
            }
        }
    });

    // Backend-bound action requests; the backend endpoint lives outside
    // this process, so the sync layer only forwards and logs them.
    let mut actions = hub.actions();
    tokio::spawn(async move {
        loop {
            match actions.recv().await {
                Ok(action) => info!(channel = action.channel(), "action request forwarded"),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "action stream lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!(topic = COLLECTION_BRIDGE, "mapdeck sync layer ready");
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("signal error: {e}");
        std::process::exit(1);
    }
    info!("shutting down");
}
