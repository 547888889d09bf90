use std::{collections::HashSet, fs::File, path::PathBuf};

use serde::Deserialize;

use crate::channel::{TIME_COLUMN, VALUE_COLUMN};
use crate::error::{Error, Result};
use crate::events::EVENT_COLUMN;
use crate::plot::{Colormap, PlotKind};
use crate::style::PlotStyle;
use crate::time::{TimeBase, CXC_EPOCH};

fn default_time_column() -> String {
    TIME_COLUMN.to_string()
}

fn default_value_column() -> String {
    VALUE_COLUMN.to_string()
}

fn default_event_column() -> String {
    EVENT_COLUMN.to_string()
}

fn default_scale() -> f64 {
    1.0
}

fn default_mission_epoch() -> String {
    CXC_EPOCH.to_string()
}

fn default_dir() -> PathBuf {
    PathBuf::from(".")
}

/// A telemetry channel read from one CSV export.
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    pub file: PathBuf,
    /// MSID name; defaults to the one parsed from `file`.
    #[serde(default)]
    pub msid: Option<String>,
    #[serde(default = "default_time_column")]
    pub time_column: String,
    #[serde(default = "default_value_column")]
    pub column: String,
    /// Multiplier applied to values, e.g., 0.001 for m to km.
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub units: Option<String>,
}

impl ChannelSpec {
    /// Axis or legend label: the configured label, else the name with units.
    pub fn display_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match &self.units {
            Some(units) => format!("{} ({units})", self.name),
            None => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventSpec {
    pub name: String,
    pub file: PathBuf,
    #[serde(default = "default_event_column")]
    pub column: String,
    #[serde(default)]
    pub label: Option<String>,
}

/// X axis of a plot: mission time as dates, fractional years, or another channel's values.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(from = "String")]
pub enum XAxis {
    #[default]
    Time,
    Years,
    Channel(String),
}

impl From<String> for XAxis {
    fn from(value: String) -> Self {
        match value.as_str() {
            "time" => XAxis::Time,
            "years" => XAxis::Years,
            _ => XAxis::Channel(value),
        }
    }
}

impl XAxis {
    pub fn is_temporal(&self) -> bool {
        !matches!(self, XAxis::Channel(_))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeriesSpec {
    pub channel: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColorSpec {
    pub channel: String,
    #[serde(default)]
    pub colormap: Colormap,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlotSpec {
    pub name: String,
    #[serde(default)]
    pub kind: PlotKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub x: XAxis,
    pub series: Vec<SeriesSpec>,
    #[serde(default)]
    pub color: Option<ColorSpec>,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default)]
    pub x_range: Option<(f64, f64)>,
    #[serde(default)]
    pub y_range: Option<(f64, f64)>,
    #[serde(default)]
    pub events: Vec<String>,
}

// Per-analysis configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_dir")]
    pub msid_dir: PathBuf,
    #[serde(default = "default_dir")]
    pub events_dir: PathBuf,
    #[serde(default = "default_mission_epoch")]
    pub mission_epoch: String,
    #[serde(default)]
    pub style: PlotStyle,
    pub channels: Vec<ChannelSpec>,
    #[serde(default)]
    pub events: Vec<EventSpec>,
    pub plots: Vec<PlotSpec>,
}

fn check_range(plot: &str, axis: &str, range: Option<(f64, f64)>) -> Result<()> {
    match range {
        Some((lo, hi)) if !(lo < hi) => Err(Error::ConfigInvalid(format!(
            "plot {plot} has invalid {axis}_range [{lo}, {hi}]"
        ))),
        _ => Ok(()),
    }
}

fn unique<'a, I: IntoIterator<Item = &'a String>>(what: &str, names: I) -> Result<HashSet<String>> {
    let mut seen: HashSet<String> = HashSet::default();
    for name in names {
        if !seen.insert(name.clone()) {
            return Err(Error::ConfigInvalid(format!("duplicate {what} name {name}")));
        }
    }
    Ok(seen)
}

impl Config {
    fn validate(self) -> Result<Self> {
        self.time_base()?;
        self.style.validate()?;

        let channels = unique("channel", self.channels.iter().map(|c| &c.name))?;
        let events = unique("event", self.events.iter().map(|e| &e.name))?;
        unique("plot", self.plots.iter().map(|p| &p.name))?;

        for channel in &self.channels {
            if !channel.scale.is_finite() {
                return Err(Error::ConfigInvalid(format!(
                    "channel {} has invalid scale {}",
                    channel.name, channel.scale
                )));
            }
        }

        let check_channel = |plot: &str, name: &str| {
            if channels.contains(name) {
                Ok(())
            } else {
                Err(Error::ConfigInvalid(format!(
                    "plot {plot} references unknown channel {name}"
                )))
            }
        };

        // Make sure plots only reference configured channels and events
        for plot in &self.plots {
            if plot.series.is_empty() {
                return Err(Error::ConfigInvalid(format!(
                    "plot {} has no series",
                    plot.name
                )));
            }
            for series in &plot.series {
                check_channel(&plot.name, &series.channel)?;
            }
            if let XAxis::Channel(name) = &plot.x {
                check_channel(&plot.name, name)?;
            }
            if let Some(color) = &plot.color {
                check_channel(&plot.name, &color.channel)?;
                if plot.kind == PlotKind::Line {
                    return Err(Error::ConfigInvalid(format!(
                        "plot {} colors points but is a line plot",
                        plot.name
                    )));
                }
                if let (Some(lo), Some(hi)) = (color.min, color.max) {
                    check_range(&plot.name, "color", Some((lo, hi)))?;
                }
            }
            check_range(&plot.name, "x", plot.x_range)?;
            check_range(&plot.name, "y", plot.y_range)?;
            for event in &plot.events {
                if !events.contains(event) {
                    return Err(Error::ConfigInvalid(format!(
                        "plot {} references unknown event {event}",
                        plot.name
                    )));
                }
                if !plot.x.is_temporal() {
                    return Err(Error::ConfigInvalid(format!(
                        "plot {} shows events but its x axis is not time",
                        plot.name
                    )));
                }
            }
        }

        Ok(self)
    }

    pub fn time_base(&self) -> Result<TimeBase> {
        TimeBase::from_iso(&self.mission_epoch)
    }

    pub fn channel(&self, name: &str) -> Option<&ChannelSpec> {
        self.channels.iter().find(|c| c.name == name)
    }

    pub fn event(&self, name: &str) -> Option<&EventSpec> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn with_path(fpath: &PathBuf) -> Result<Config> {
        let fin = File::open(fpath)?;
        let config: Config = serde_yaml::from_reader(fin)?;

        config.validate()
    }

    pub fn with_data(dat: &str) -> Result<Config> {
        let config: Config = serde_yaml::from_str(dat)?;
        config.validate()
    }
}

static HVPS_CONFIG: &str = include_str!(concat!(env!("OUT_DIR"), "/hvps.config.yaml"));
static CEA_CONFIG: &str = include_str!(concat!(env!("OUT_DIR"), "/cea.config.yaml"));

/// Names of the built-in analyses.
pub const DEFAULT_ANALYSES: [&str; 2] = ["hvps", "cea"];

pub fn get_default_content(name: &str) -> Option<&'static str> {
    match name {
        "hvps" => Some(HVPS_CONFIG),
        "cea" => Some(CEA_CONFIG),
        _ => None,
    }
}

pub fn get_default(name: &str) -> Result<Config> {
    match get_default_content(name) {
        Some(cfg) => Config::with_data(cfg),
        None => Err(Error::UnknownAnalysis(name.to_string())),
    }
}
