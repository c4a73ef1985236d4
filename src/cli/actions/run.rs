use super::Action;
use crate::server::{self, AppState};
use std::sync::Arc;

/// Execute the action's business logic by delegating to the appropriate module
pub async fn execute(action: Action) -> anyhow::Result<()> {
    match action {
        Action::Serve {
            listen,
            port,
            metadata,
            db,
            probe_timeout,
        } => {
            let state = AppState {
                metadata,
                db: db.map(Arc::new),
                probe_timeout,
            };
            server::start(listen, port, state).await
        }
    }
}
