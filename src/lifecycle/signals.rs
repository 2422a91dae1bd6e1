//! OS signal handling for [`App::run`](super::App::run).
//!
//! On Unix the app shuts down on `SIGINT`, `SIGTERM` or `SIGQUIT`; elsewhere
//! only Ctrl-C is handled.

/// Completes when the process receives a termination signal.
///
/// Returns `Err` if the signal listeners cannot be installed.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = tokio::signal::ctrl_c() => "ctrl-c",
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    tracing::info!(signal = received, "received shutdown signal");
    Ok(())
}

/// Completes when the process receives Ctrl-C.
///
/// Returns `Err` if the signal listener cannot be installed.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!(signal = "ctrl-c", "received shutdown signal");
    Ok(())
}
