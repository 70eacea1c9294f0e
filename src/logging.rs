use anyhow::Context as _;
use tracing_subscriber::EnvFilter;

/// Default directive when RUST_LOG is unset: our logs at info, the HTTP
/// plumbing quieted.
const FILTRE_PAR_DEFAUT: &str = "info,hyper=warn,reqwest=warn";

pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(FILTRE_PAR_DEFAUT))
        .context("build log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("initialize tracing subscriber: {err}"))?;

    Ok(())
}
