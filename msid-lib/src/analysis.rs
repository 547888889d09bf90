use std::collections::HashMap;
use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn};

use crate::align::align_all;
use crate::channel::{msid_from_path, resolve, Channel};
use crate::config::{Config, PlotSpec, XAxis};
use crate::error::{Error, Result};
use crate::events::EventLog;
use crate::plot::{finite_bounds, render_png, AxisKind, Colorbar, EventMarkers, Figure, Series};
use crate::time::{plot_days_to_years, TimeBase};

/// Channels and event logs loaded for an analysis, by configured name.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub channels: HashMap<String, Channel>,
    pub events: HashMap<String, EventLog>,
}

impl Dataset {
    pub fn channel(&self, name: &str) -> Result<&Channel> {
        self.channels
            .get(name)
            .ok_or_else(|| Error::UnknownChannel(name.to_string()))
    }
}

/// Runs the plots of a [Config]: load, align, convert, render.
#[derive(Debug, Clone)]
pub struct Analysis {
    config: Config,
    time_base: TimeBase,
    msid_dir: PathBuf,
    events_dir: PathBuf,
}

impl Analysis {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            time_base: config.time_base()?,
            msid_dir: config.msid_dir.clone(),
            events_dir: config.events_dir.clone(),
            config,
        })
    }

    /// Override the configured MSID directory.
    #[must_use]
    pub fn with_msid_dir(mut self, dir: PathBuf) -> Self {
        self.msid_dir = dir;
        self
    }

    /// Override the configured mission events directory.
    #[must_use]
    pub fn with_events_dir(mut self, dir: PathBuf) -> Self {
        self.events_dir = dir;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn time_base(&self) -> &TimeBase {
        &self.time_base
    }

    /// Read every configured channel and event log.
    pub fn load(&self) -> Result<Dataset> {
        let mut dataset = Dataset::default();
        for spec in &self.config.channels {
            let path = resolve(&self.msid_dir, &spec.file);
            let msid = spec.msid.clone().unwrap_or_else(|| msid_from_path(&path));
            let channel = Channel::from_csv(&msid, &path, &spec.time_column, &spec.column)?
                .scaled(spec.scale);
            dataset.channels.insert(spec.name.clone(), channel);
        }
        for spec in &self.config.events {
            let path = resolve(&self.events_dir, &spec.file);
            let log = EventLog::from_csv(&spec.name, &path, &spec.column)?;
            dataset.events.insert(spec.name.clone(), log);
        }
        info!(
            "loaded {} channels and {} event logs",
            dataset.channels.len(),
            dataset.events.len()
        );
        Ok(dataset)
    }

    fn channel_label(&self, name: &str) -> String {
        self.config
            .channel(name)
            .map_or_else(|| name.to_string(), |c| c.display_label())
    }

    /// Join the channels a series needs on their common timestamps.
    ///
    /// The first channel is the series' own; the rest are looked up at its sample times.
    fn aligned(&self, plot: &str, dataset: &Dataset, names: &[&str]) -> Result<Vec<Channel>> {
        let channels = names
            .iter()
            .map(|name| dataset.channel(name))
            .collect::<Result<Vec<_>>>()?;
        if channels.len() == 1 {
            return Ok(vec![channels[0].clone()]);
        }

        let times: Vec<_> = channels.iter().map(|c| c.times.view()).collect();
        let masks = align_all(&times, names)?;
        let selected = channels
            .iter()
            .zip(&masks)
            .map(|(c, mask)| c.select(mask))
            .collect::<Result<Vec<_>>>()?;

        let matched = selected[0].len();
        if matched == 0 {
            return Err(Error::NoOverlap(names.join(", ")));
        }
        for (idx, (name, channel)) in names.iter().zip(&channels).enumerate() {
            let dropped = channel.len() - matched;
            if idx == 0 && dropped > 0 {
                warn!(
                    "{plot}: {dropped} of {} {name} samples have no matching timestamp",
                    channel.len()
                );
            } else {
                debug!("{plot}: using {matched} of {} {name} samples", channel.len());
            }
        }
        Ok(selected)
    }

    /// Resolve a plot into a [Figure].
    pub fn figure(&self, dataset: &Dataset, plot: &PlotSpec) -> Result<Figure> {
        let x_axis = match plot.x {
            XAxis::Time => AxisKind::Date,
            XAxis::Years => AxisKind::Years,
            XAxis::Channel(_) => AxisKind::Value,
        };

        let mut series = Vec::with_capacity(plot.series.len());
        for spec in &plot.series {
            let mut names = vec![spec.channel.as_str()];
            if let XAxis::Channel(x) = &plot.x {
                names.push(x.as_str());
            }
            if let Some(color) = &plot.color {
                names.push(color.channel.as_str());
            }
            let channels = self.aligned(&plot.name, dataset, &names)?;

            let y = &channels[0];
            let x = match &plot.x {
                XAxis::Time => self.time_base.to_plot_days(y.times.view())?,
                XAxis::Years => self.time_base.to_years(y.times.view())?,
                XAxis::Channel(_) => channels[1].values.clone(),
            };
            let color_values = plot
                .color
                .as_ref()
                .and_then(|_| channels.last())
                .map(|c| c.values.to_vec());

            series.push(Series {
                label: spec
                    .label
                    .clone()
                    .unwrap_or_else(|| self.channel_label(&spec.channel)),
                x: x.to_vec(),
                y: y.values.to_vec(),
                color_values,
            });
        }

        let colorbar = match &plot.color {
            Some(color) => {
                let bounds = finite_bounds(
                    series
                        .iter()
                        .filter_map(|s| s.color_values.as_ref())
                        .flatten(),
                )
                .unwrap_or((0.0, 1.0));
                Some(Colorbar {
                    colormap: color.colormap,
                    min: color.min.unwrap_or(bounds.0),
                    max: color.max.unwrap_or(bounds.1),
                    label: color
                        .label
                        .clone()
                        .unwrap_or_else(|| self.channel_label(&color.channel)),
                })
            }
            None => None,
        };

        let mut events = Vec::with_capacity(plot.events.len());
        for name in &plot.events {
            let Some(log) = dataset.events.get(name) else {
                return Err(Error::ConfigInvalid(format!(
                    "plot {} references unloaded event {name}",
                    plot.name
                )));
            };
            let days = log.plot_days(&self.time_base)?;
            let x = match x_axis {
                AxisKind::Years => plot_days_to_years(days.view()),
                _ => days,
            };
            let label = self
                .config
                .event(name)
                .and_then(|e| e.label.clone())
                .unwrap_or_else(|| name.clone());
            events.push(EventMarkers {
                label,
                x: x.to_vec(),
            });
        }

        let x_label = plot.x_label.clone().unwrap_or_else(|| match &plot.x {
            XAxis::Time => "Date".to_string(),
            XAxis::Years => "Year".to_string(),
            XAxis::Channel(name) => self.channel_label(name),
        });
        let y_label = plot.y_label.clone().unwrap_or_else(|| match &plot.series[..] {
            [only] => self.channel_label(&only.channel),
            _ => String::default(),
        });

        Ok(Figure {
            name: plot.name.clone(),
            title: plot.title.clone(),
            kind: plot.kind,
            x_axis,
            x_label,
            y_label,
            series,
            colorbar,
            x_range: plot.x_range,
            y_range: plot.y_range,
            events,
        })
    }

    pub fn figures(&self, dataset: &Dataset) -> Result<Vec<Figure>> {
        self.config
            .plots
            .iter()
            .map(|plot| self.figure(dataset, plot))
            .collect()
    }

    /// Load the data and render every plot to `<outdir>/<plot name>.png`.
    pub fn run<P: AsRef<Path>>(&self, outdir: P) -> Result<Vec<PathBuf>> {
        let outdir = outdir.as_ref();
        let span = info_span!("analysis", name = %self.config.name);
        let _guard = span.enter();

        let dataset = self.load()?;
        if !outdir.exists() {
            create_dir_all(outdir)?;
        }

        let mut paths = Vec::with_capacity(self.config.plots.len());
        for plot in &self.config.plots {
            let figure = self.figure(&dataset, plot)?;
            let path = outdir.join(format!("{}.png", plot.name));
            render_png(&figure, &self.config.style, &path)?;
            info!("wrote {} points to {path:?}", figure.num_points());
            paths.push(path);
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod test {
    use ndarray::arr1;

    use super::*;

    const CONFIG: &str = r#"
name: test
channels:
  - name: temp
    file: temp.csv
    column: maxes
    units: C
  - name: pitch
    file: pitch.csv
    label: Pitch (degrees)
  - name: distance
    file: distance.csv
    scale: 0.001
events:
  - name: scs107
    file: scs107s.csv
    label: SCS 107
plots:
  - name: temp_years
    x: years
    series:
      - channel: temp
    color:
      channel: pitch
      max: 180
    events: [scs107]
  - name: pitch_temp
    x: temp
    series:
      - channel: pitch
    color:
      channel: distance
  - name: temp_time
    kind: line
    series:
      - channel: temp
      - channel: pitch
"#;

    fn dataset() -> Dataset {
        let mut dataset = Dataset::default();
        dataset.channels.insert(
            "temp".to_string(),
            Channel::new("2CE00ATM", arr1(&[300.0, 900.0, 1500.0]), arr1(&[30.0, 31.0, 32.0]))
                .unwrap(),
        );
        dataset.channels.insert(
            "pitch".to_string(),
            Channel::new(
                "Point_SunCentAng",
                arr1(&[0.0, 300.0, 600.0, 900.0]),
                arr1(&[45.0, 90.0, 135.0, 170.0]),
            )
            .unwrap(),
        );
        dataset.channels.insert(
            "distance".to_string(),
            Channel::new(
                "Dist_SatEarth",
                arr1(&[0.0, 300.0, 600.0, 900.0]),
                arr1(&[1.0e5, 2.0e5, 3.0e5, 4.0e5]),
            )
            .unwrap(),
        );
        dataset.events.insert(
            "scs107".to_string(),
            EventLog::new("scs107", arr1(&[0.0])),
        );
        dataset
    }

    fn analysis() -> Analysis {
        Analysis::new(Config::with_data(CONFIG).unwrap()).unwrap()
    }

    #[test]
    fn test_years_colored_by_pitch() {
        let analysis = analysis();
        let figure = analysis
            .figure(&dataset(), &analysis.config().plots[0])
            .unwrap();

        assert_eq!(figure.x_axis, AxisKind::Years);
        assert_eq!(figure.series.len(), 1);
        let series = &figure.series[0];
        // 1500 has no pitch sample
        assert_eq!(series.y, vec![30.0, 31.0]);
        assert_eq!(series.color_values, Some(vec![90.0, 170.0]));
        assert_eq!(series.label, "temp (C)");
        let expected = TimeBase::CXC
            .to_years(arr1(&[300.0, 900.0]).view())
            .unwrap()
            .to_vec();
        assert_eq!(series.x, expected);

        let colorbar = figure.colorbar.unwrap();
        assert_eq!((colorbar.min, colorbar.max), (90.0, 180.0));
        assert_eq!(colorbar.label, "Pitch (degrees)");

        assert_eq!(figure.events.len(), 1);
        assert_eq!(figure.events[0].label, "SCS 107");
        assert_eq!(figure.events[0].x, vec![729_390.0 / 365.2422]);
        assert_eq!(figure.x_label, "Year");
        assert_eq!(figure.y_label, "temp (C)");
    }

    #[test]
    fn test_channel_axis() {
        let analysis = analysis();
        let figure = analysis
            .figure(&dataset(), &analysis.config().plots[1])
            .unwrap();

        assert_eq!(figure.x_axis, AxisKind::Value);
        let series = &figure.series[0];
        assert_eq!(series.x, vec![30.0, 31.0]);
        assert_eq!(series.y, vec![90.0, 170.0]);
        // dataset values are already in meters here; scaling happens on load
        assert_eq!(series.color_values, Some(vec![2.0e5, 4.0e5]));
        assert_eq!(figure.x_label, "temp (C)");
    }

    #[test]
    fn test_time_axis_unaligned() {
        let analysis = analysis();
        let figure = analysis
            .figure(&dataset(), &analysis.config().plots[2])
            .unwrap();

        assert_eq!(figure.x_axis, AxisKind::Date);
        assert_eq!(figure.series[0].x.len(), 3);
        assert_eq!(figure.series[1].x.len(), 4);
        assert_eq!(figure.series[1].x[0], 729_390.0);
        assert!(figure.colorbar.is_none());
        assert_eq!(figure.y_label, "");
    }

    #[test]
    fn test_no_overlap() {
        let analysis = analysis();
        let mut dataset = dataset();
        dataset.channels.insert(
            "temp".to_string(),
            Channel::new("2CE00ATM", arr1(&[301.0]), arr1(&[30.0])).unwrap(),
        );
        let err = analysis
            .figure(&dataset, &analysis.config().plots[0])
            .unwrap_err();
        assert!(matches!(err, Error::NoOverlap(_)), "{err}");
    }

    #[test]
    fn test_missing_channel() {
        let analysis = analysis();
        let mut dataset = dataset();
        dataset.channels.remove("pitch");
        let err = analysis
            .figure(&dataset, &analysis.config().plots[0])
            .unwrap_err();
        assert!(matches!(err, Error::UnknownChannel(name) if name == "pitch"));
    }
}
