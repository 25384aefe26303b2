use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// Re-export tracing macros for convenience
pub use ::tracing::{debug, error, info, instrument, span, trace, warn, Level, Span};

/// Initialize the tracing system
///
/// The filter comes from `TPEN_LOG`, then `RUST_LOG`, then `default_level`.
/// Output goes to stderr; ANSI colouring is only enabled on a TTY.
pub fn init(default_level: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    let filter = build_filter(default_level)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(is_tty())
        .compact()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn build_filter(default_level: &str) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
    if let Ok(directives) = std::env::var(tpen_core::TPEN_LOG_VAR) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return Ok(filter);
        }
    }
    EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))
}

/// Check if we're running in a TTY environment
fn is_tty() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stderr())
}

/// Span covering one permission evaluation
pub fn permission_span(permission: &str, user_id: Option<&str>) -> Span {
    span!(Level::DEBUG, "permission", permission = %permission, user_id = user_id.unwrap_or(""))
}

/// Span covering one vault lookup
pub fn vault_span(uri: &str, kind: &str) -> Span {
    span!(Level::DEBUG, "vault", uri = %uri, kind = %kind)
}
