use std::{
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Local;
use common::{
    config::{Config, Settings},
    generator::{Generator, generate},
    plot::Plot,
};
use eyre::{Context, Result};
use tokio::fs::read_to_string;
use tracing::{debug, info};

pub async fn load_config(config_file: &Path) -> Result<Config> {
    let content = read_to_string(config_file)
        .await
        .context(format!("Reading {}", config_file.display()))?;
    serde_yml::from_str(&content).context(format!("Parsing {}", config_file.display()))
}

/// Generators run one after the other, each writing its own lines.
pub async fn generate_all<W: Write>(generators: &[Box<dyn Generator>], out: &mut W) -> Result<()> {
    for generator in generators {
        debug!("Running generator {} on {}", generator.name(), generator.dir());
        let written = generate(generator.as_ref(), out).await?;
        info!("{}: {written} commands", generator.name());
    }
    Ok(())
}

/// `<plot_dir>/<name>-<timestamp>`
pub fn plot_path(settings: &Settings, name: &str) -> PathBuf {
    let file_prefix = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    Path::new(settings.plot_dir()).join(format!("{name}-{file_prefix}"))
}

/// Charts of a single plot go to a folder named after its table.
pub async fn plot_all(plots: &[Box<dyn Plot>], settings: &Settings) -> Result<Vec<PathBuf>> {
    let name = match plots {
        [plot] => plot
            .table_path()
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| plot.name().to_owned()),
        _ => "plots".to_owned(),
    };
    plot_named(plots, settings, &name).await
}

async fn plot_named(
    plots: &[Box<dyn Plot>],
    settings: &Settings,
    name: &str,
) -> Result<Vec<PathBuf>> {
    let path = plot_path(settings, name);
    let rendered = common::plot::plot(plots, &path, settings).await?;
    if !rendered.is_empty() {
        info!("Plots created in folder: {}", path.display());
    }
    Ok(rendered)
}

pub async fn run_config<W: Write>(config: &Config, out: &mut W) -> Result<()> {
    debug!(
        "Config {}: {} generators, {} plots",
        config.name,
        config.generators.len(),
        config.plots.len()
    );
    generate_all(&config.generators, out).await?;
    plot_named(&config.plots, &config.settings, &config.name).await?;
    Ok(())
}
