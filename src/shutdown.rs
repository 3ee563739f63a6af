//! Signal-driven graceful shutdown (§4.8).

use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

/// Spawns the single signal-listener task. It is the only writer of the returned
/// token's cancellation: on `SIGINT` or `SIGTERM` it cancels exactly once and returns.
pub fn listen_for_shutdown() -> CancellationToken {
    let token = CancellationToken::new();
    let writer = token.clone();
    tokio::spawn(async move {
        let mut interrupt = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
        let mut terminate = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = interrupt.recv() => tracing::info!("received SIGINT, shutting down"),
            _ = terminate.recv() => tracing::info!("received SIGTERM, shutting down"),
        }
        writer.cancel();
    });
    token
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_cancels_on_demand() {
        let token = CancellationToken::new();
        let child = token.child_token();
        assert!(!child.is_cancelled());
        token.cancel();
        assert!(child.is_cancelled());
    }
}
