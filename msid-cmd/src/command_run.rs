use anyhow::{bail, Context, Result};
use msid::{
    config::{get_default, Config},
    Analysis,
};
use std::path::PathBuf;
use tracing::info;

fn get_config(analysis: Option<String>, fpath: Option<PathBuf>) -> Result<Config> {
    match (analysis, fpath) {
        (Some(name), _) => get_default(&name).context("getting default config"),
        (None, Some(fpath)) => {
            Config::with_path(&fpath).with_context(|| format!("Invalid config {fpath:?}"))
        }
        (None, None) => bail!("No analysis configuration specified"),
    }
}

pub fn run(
    analysis: Option<String>,
    config: Option<PathBuf>,
    msid_dir: Option<PathBuf>,
    events_dir: Option<PathBuf>,
    output: PathBuf,
) -> Result<()> {
    let config = get_config(analysis, config)?;
    if let Some(desc) = &config.description {
        info!("{}: {desc}", config.name);
    }

    let mut analysis = Analysis::new(config)?;
    if let Some(dir) = msid_dir {
        analysis = analysis.with_msid_dir(dir);
    }
    if let Some(dir) = events_dir {
        analysis = analysis.with_events_dir(dir);
    }

    let paths = analysis
        .run(&output)
        .with_context(|| format!("running analysis {}", analysis.config().name))?;
    info!("rendered {} plots to {output:?}", paths.len());

    Ok(())
}
