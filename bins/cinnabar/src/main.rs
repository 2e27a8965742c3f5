use anyhow::Context;
use cinnabar_config::SearchConfig;
use cinnabar_engine::Search;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod textdata;

use textdata::TextDataset;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "cinnabar.toml".into());
    let config = SearchConfig::load(&config_path)
        .with_context(|| format!("loading '{config_path}'"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!(
        folders = config.data_folders.len(),
        binning = config.binning,
        "CINNABAR: starting search"
    );

    let search = Search::from_config(&config)?;
    let events = search.run(&TextDataset, &config.data_folders)?;

    info!(transients = events.len(), "search complete");
    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}
