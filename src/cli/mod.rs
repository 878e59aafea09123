//! Command layer shared by the `monorel` binary

pub mod orchestration;

pub use orchestration::{
    run_publish, run_related, run_snapshot, run_status, run_tree, ProjectStatus, TagReport,
    WorkflowArgs, WorkflowResult,
};

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// Respects `RUST_LOG`; otherwise logs at `level`. Log lines go to stderr so
/// they never mix with command output. Only the first call takes effect.
pub fn init_tracing(level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .ok();
}
