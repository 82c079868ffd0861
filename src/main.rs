use anyhow::{Context, Result};
use tracing::{debug, info};

use canopy::{Cli, run};

fn main() -> Result<()> {
    let cli = Cli::parse_known();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log_filter())
        .with_writer(std::io::stderr)
        .init();

    if !cli.ignored().is_empty() {
        debug!(args = ?cli.ignored(), "ignoring unrecognised arguments");
    }

    let settings = cli.into_settings();

    rayon::ThreadPoolBuilder::new()
        .num_threads(settings.n_jobs.get())
        .build_global()
        .context("failed to configure thread pool")?;
    info!(threads = settings.n_jobs.get(), "thread pool configured");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    run(&settings, &mut out)?;
    Ok(())
}
