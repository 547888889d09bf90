use std::path::Path;

use ndarray::Array1;
use tracing::info;

use crate::channel::read_times;
use crate::error::Result;
use crate::time::{Time, TimeBase};

pub const EVENT_COLUMN: &str = "tstart";

/// Mission events, e.g., SCS 107 radiation safing runs, by start time in mission seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct EventLog {
    pub name: String,
    pub starts: Array1<f64>,
}

impl EventLog {
    pub fn new(name: &str, starts: Array1<f64>) -> Self {
        Self {
            name: name.to_string(),
            starts,
        }
    }

    /// Read event start times from `column` of a CSV. An empty log is valid, but every start
    /// time must be finite.
    pub fn from_csv<P: AsRef<Path>>(name: &str, path: P, column: &str) -> Result<Self> {
        let log = Self::new(name, Array1::from(read_times(path.as_ref(), column)?));
        info!("there have been {} {} events", log.len(), log.name);
        Ok(log)
    }

    pub fn len(&self) -> usize {
        self.starts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.starts.is_empty()
    }

    /// Event start times as plot days. Empty logs give an empty array.
    pub fn plot_days(&self, time_base: &TimeBase) -> Result<Array1<f64>> {
        if self.is_empty() {
            return Ok(Array1::default(0));
        }
        time_base.to_plot_days(self.starts.view())
    }

    pub fn times(&self, time_base: &TimeBase) -> Vec<Time> {
        self.starts.iter().map(|t| time_base.time(*t)).collect()
    }
}
