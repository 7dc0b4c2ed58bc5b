use anyhow::Context;
use std::{fs::File, io, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber, filtered through `RUST_LOG`.
///
/// The interactive host owns the terminal, so without a log file nothing is logged there.
pub(crate) fn init(log_file: Option<&Path>, interactive: bool) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env());
    match log_file {
        Some(path) => {
            let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
        }
        None if !interactive => builder.with_writer(io::stderr).init(),
        None => (),
    }
    Ok(())
}
