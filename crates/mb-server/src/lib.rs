//! Command Envelope and Dispatcher
//!
//! This crate exposes the document model as a JSON command surface:
//! - A closed command enum with serde-driven parsing
//! - A uniform response envelope with taxonomy-prefixed errors
//! - A dispatcher serializing commands per document over a shared kernel

pub mod command;
pub mod dispatcher;
pub mod envelope;

// Re-exports for convenience
pub use command::{Command, GeometryAttachment, Request};
pub use dispatcher::{Bridge, DispatcherConfig};
pub use envelope::Response;

/// Install the global tracing subscriber, honoring `RUST_LOG`
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mb_server=debug,mb_model=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
