use core::fmt::Debug;
use std::path::{Path, PathBuf};

use dyn_clone::{DynClone, clone_trait_object};
use eyre::Result;
use futures::future::join_all;
use tokio::fs::create_dir_all;
use tracing::debug;

use crate::{
    config::Settings,
    table::{MetricFamily, ResultsTable, Series, TableError},
};

/// Everything needed to draw one chart, independent of any backend.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub title: String,
    pub slug: String,
    /// x axis labels, one per table row
    pub categories: Vec<String>,
    pub series: Vec<Series>,
}

impl Chart {
    /// The `File` column is only required when something is drawn.
    pub fn from_table(table: &ResultsTable, family: &MetricFamily) -> Result<Self, TableError> {
        let series = table.series(family)?;
        let categories = if series.is_empty() {
            Vec::new()
        } else {
            table.categories()?
        };
        debug!("{}: {} series", family.slug, series.len());
        Ok(Self {
            title: family.title.clone(),
            slug: family.slug.clone(),
            categories,
            series,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Finite min and max over all series, or `None` without finite data.
    pub fn y_bounds(&self) -> Option<(f64, f64)> {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[typetag::serde(tag = "type")]
#[async_trait::async_trait]
pub trait Plot: Debug + DynClone + Send + Sync {
    fn name(&self) -> &'static str;
    /// Path of the results table this plot reads
    fn table_path(&self) -> &Path;
    /// Plots the data
    ///
    /// Arguments:
    /// * `table` - Results loaded from [`Plot::table_path`]
    /// * `plot_path` - Directory the rendered charts are written to
    /// * `settings` - Viewer settings
    ///
    /// Returns the rendered files in display order.
    async fn plot(
        &self,
        table: &ResultsTable,
        plot_path: &Path,
        settings: &Settings,
    ) -> Result<Vec<PathBuf>>;
}
clone_trait_object!(Plot);

pub async fn ensure_plot_dirs(dirs: &[PathBuf]) -> Result<()> {
    let create_jobs = dirs.iter().map(create_dir_all);
    for res in join_all(create_jobs).await {
        res?;
    }
    Ok(())
}

pub async fn plot(
    plots: &[Box<dyn Plot>],
    plot_path: &Path,
    settings: &Settings,
) -> Result<Vec<PathBuf>> {
    if plots.is_empty() {
        debug!("No plots");
        return Ok(Vec::new());
    }

    ensure_plot_dirs(&[plot_path.to_path_buf()]).await?;
    let mut rendered = Vec::new();
    for plot in plots {
        let table_path = plot.table_path().to_path_buf();
        let table = tokio::task::spawn_blocking(move || ResultsTable::load(&table_path)).await??;
        rendered.extend(plot.plot(&table, plot_path, settings).await?);
    }
    Ok(rendered)
}
