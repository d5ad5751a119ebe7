use serde::{Deserialize, Serialize};

use crate::{generator::Generator, plot::Plot};

pub const DEFAULT_VIEWER: &str = "xdg-open";
pub const DEFAULT_PLOT_DIR: &str = "plots";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub generators: Vec<Box<dyn Generator>>,
    #[serde(default)]
    pub plots: Vec<Box<dyn Plot>>,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Hand each chart to the viewer once rendered
    pub show: Option<bool>,
    /// Program the charts are opened with
    pub viewer: Option<String>,
    pub plot_dir: Option<String>,
}

impl Settings {
    pub fn show(&self) -> bool {
        self.show.unwrap_or(true)
    }

    pub fn viewer(&self) -> &str {
        self.viewer.as_deref().unwrap_or(DEFAULT_VIEWER)
    }

    pub fn plot_dir(&self) -> &str {
        self.plot_dir.as_deref().unwrap_or(DEFAULT_PLOT_DIR)
    }
}
