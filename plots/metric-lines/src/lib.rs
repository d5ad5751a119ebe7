use std::{
    fs,
    path::{Path, PathBuf},
};

use common::{
    config::Settings,
    plot::{Chart, Plot},
    table::{FILE_COLUMN, MetricFamily, ResultsTable},
};
use eyre::{Context, Result, eyre};
use plotters::prelude::*;
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use tokio::{process::Command, task::spawn_blocking};
use tracing::{debug, info, warn};

pub const DEFAULT_TABLE: &str = "plot/max4satPlot.tsv";
const CHART_SIZE: (u32, u32) = (1280, 800);
const X_LABEL_ANGLE: u32 = 45;
const X_LABEL_SIZE: u32 = 12;
/// Gap between the x axis and the start of a label
const X_LABEL_OFFSET: i32 = 10;

/// One line chart per metric family, a line per matching column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricLines {
    pub file: PathBuf,
    #[serde(default = "MetricFamily::defaults")]
    pub families: Vec<MetricFamily>,
}

impl Default for MetricLines {
    fn default() -> Self {
        Self {
            file: PathBuf::from(DEFAULT_TABLE),
            families: MetricFamily::defaults(),
        }
    }
}

#[async_trait::async_trait]
#[typetag::serde]
impl Plot for MetricLines {
    fn name(&self) -> &'static str {
        "metric-lines"
    }

    fn table_path(&self) -> &Path {
        &self.file
    }

    async fn plot(
        &self,
        table: &ResultsTable,
        plot_path: &Path,
        settings: &Settings,
    ) -> Result<Vec<PathBuf>> {
        let jobs = self
            .families
            .iter()
            .map(|family| -> Result<(Chart, PathBuf)> {
                let chart = Chart::from_table(table, family)?;
                let path = plot_path.join(format!("{}.svg", chart.slug));
                Ok((chart, path))
            })
            .collect::<Result<Vec<_>>>()?;

        let rendered = spawn_blocking(move || {
            jobs.into_par_iter()
                .map(|(chart, path)| render_chart(&chart, &path).map(|_| path))
                .collect::<Result<Vec<_>>>()
        })
        .await??;

        for path in &rendered {
            info!("Rendered {}", path.display());
            if settings.show() {
                show(settings.viewer(), path).await;
            }
        }
        Ok(rendered)
    }
}

/// Finite runs of a series, split on NaN. Always holds at least one run so
/// that the series gets a legend entry.
fn segments(values: &[f64]) -> Vec<Vec<(usize, f64)>> {
    let mut runs = vec![Vec::new()];
    for (i, value) in values.iter().copied().enumerate() {
        if value.is_finite() {
            if let Some(run) = runs.last_mut() {
                run.push((i, value));
            }
        } else if runs.last().is_some_and(|run| !run.is_empty()) {
            runs.push(Vec::new());
        }
    }
    if runs.len() > 1 && runs.last().is_some_and(|run| run.is_empty()) {
        runs.pop();
    }
    runs
}

fn y_range(chart: &Chart) -> (f64, f64) {
    match chart.y_bounds() {
        None => (0.0, 1.0),
        Some((lo, hi)) if lo == hi => (lo - 1.0, hi + 1.0),
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
    }
}

/// A category label anchored below its tick, in backend pixels.
struct TickLabel {
    text: String,
    x: i32,
    y: i32,
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// plotters only rotates text by multiples of 90 degrees, so the x labels
/// are written into the finished SVG.
fn rotated_labels(labels: &[TickLabel]) -> String {
    labels
        .iter()
        .map(|label| {
            format!(
                "<text x=\"{x}\" y=\"{y}\" font-family=\"sans-serif\" font-size=\"{X_LABEL_SIZE}\" \
                 text-anchor=\"start\" transform=\"rotate({X_LABEL_ANGLE} {x} {y})\">{}</text>\n",
                escape_xml(&label.text),
                x = label.x,
                y = label.y,
            )
        })
        .collect()
}

fn append_to_svg(path: &Path, extra: &str) -> Result<()> {
    let svg = fs::read_to_string(path).context(format!("Reading {}", path.display()))?;
    let end = svg
        .rfind("</svg>")
        .ok_or_else(|| eyre!("No closing svg tag in {}", path.display()))?;
    let mut out = String::with_capacity(svg.len() + extra.len());
    out.push_str(&svg[..end]);
    out.push_str(extra);
    out.push_str(&svg[end..]);
    fs::write(path, out).context(format!("Writing {}", path.display()))?;
    Ok(())
}

pub fn render_chart(chart: &Chart, path: &Path) -> Result<()> {
    debug!("Rendering {} to {}", chart.title, path.display());
    let labels = {
        let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE)?;

        let last = chart.categories.len().saturating_sub(1).max(1);
        let (y_min, y_max) = y_range(chart);
        let mut ctx = ChartBuilder::on(&root)
            .caption(&chart.title, ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(160)
            .y_label_area_size(60)
            .build_cartesian_2d(0..last, y_min..y_max)?;

        ctx.configure_mesh()
            .x_labels(chart.categories.len().max(1))
            .x_label_formatter(&|_: &usize| String::new())
            .x_desc(FILE_COLUMN)
            .draw()?;

        for (idx, series) in chart.series.iter().enumerate() {
            let style = Palette99::pick(idx).stroke_width(2);
            for (n, run) in segments(&series.values).into_iter().enumerate() {
                let anno = ctx.draw_series(LineSeries::new(run, style))?;
                if n == 0 {
                    anno.label(series.label.clone())
                        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
                }
            }
        }

        if !chart.is_empty() {
            ctx.configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }

        let labels = chart
            .categories
            .iter()
            .enumerate()
            .map(|(i, text)| {
                let (x, y) = ctx.backend_coord(&(i, y_min));
                TickLabel {
                    text: text.clone(),
                    x,
                    y: y + X_LABEL_OFFSET,
                }
            })
            .collect::<Vec<_>>();

        root.present()?;
        labels
    };

    if !labels.is_empty() {
        append_to_svg(path, &rotated_labels(&labels))?;
    }
    Ok(())
}

/// Opens `path` with the viewer and waits for it to exit.
pub async fn show(viewer: &str, path: &Path) {
    let mut parts = viewer.split_whitespace();
    let Some(program) = parts.next() else {
        warn!("No viewer configured, not showing {}", path.display());
        return;
    };
    debug!("Showing {} with {viewer}", path.display());
    match Command::new(program).args(parts).arg(path).status().await {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("{viewer} exited with {status} for {}", path.display()),
        Err(err) => warn!("Could not start {viewer} for {}: {err}", path.display()),
    }
}
