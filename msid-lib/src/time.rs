use std::str::FromStr;

use hifitime::efmt::{Format, Formatter};
use hifitime::{Epoch, TimeScale};
use ndarray::{Array1, ArrayView1};

use crate::error::{Error, Result};

/// Seconds in a UTC day. Leap seconds are not modeled.
pub const SECS_PER_DAY: f64 = 86_400.0;

/// Mean tropical year in days, used for the fractional-year axis.
pub const DAYS_PER_YEAR: f64 = 365.2422;

/// Plot day number of 1970-01-01 where day 1 is January 1, year 1.
pub const UNIX_EPOCH_PLOT_DAY: f64 = 719_163.0;

/// Calendar seconds from 1970-01-01 to the CXC epoch, 1998-01-01T00:00:00 UTC.
pub const CXC_EPOCH_UNIX_SECONDS: f64 = 883_612_800.0;

/// ISO form of the CXC epoch accepted by [TimeBase::from_iso].
pub const CXC_EPOCH: &str = "1998-01-01T00:00:00 UTC";

/// Convert Unix seconds to a plot day number (matplotlib's `epoch2num`).
pub fn unix_to_plot_day(secs: f64) -> f64 {
    UNIX_EPOCH_PLOT_DAY + secs / SECS_PER_DAY
}

/// Inverse of [unix_to_plot_day], as a UTC [Epoch].
pub fn plot_day_to_epoch(day: f64) -> Epoch {
    Epoch::from_unix_seconds((day - UNIX_EPOCH_PLOT_DAY) * SECS_PER_DAY)
}

/// Convert plot day numbers to fractional years since year 0.
pub fn plot_days_to_years(days: ArrayView1<f64>) -> Array1<f64> {
    days.mapv(|d| d / DAYS_PER_YEAR)
}

/// Mission time base: the offset of the mission epoch from the Unix epoch.
///
/// Timestamps are seconds since the mission epoch. Conversion to plot days is anchored on the
/// first timestamp of a sequence and every other value is computed relative to it, so the
/// floating point error grows with elapsed time rather than with the magnitude of the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBase {
    epoch_unix_seconds: f64,
}

impl Default for TimeBase {
    fn default() -> Self {
        Self::CXC
    }
}

impl TimeBase {
    pub const CXC: TimeBase = TimeBase {
        epoch_unix_seconds: CXC_EPOCH_UNIX_SECONDS,
    };

    pub fn new(epoch_unix_seconds: f64) -> Self {
        Self { epoch_unix_seconds }
    }

    pub fn from_epoch(epoch: Epoch) -> Self {
        Self::new(epoch.to_unix_seconds())
    }

    /// Create from an ISO 8601 string such as `1998-01-01T00:00:00 UTC`.
    pub fn from_iso(s: &str) -> Result<Self> {
        let epoch = Epoch::from_str(s).map_err(|e| Error::Time(format!("{s:?}: {e}")))?;
        Ok(Self::from_epoch(epoch))
    }

    /// Plot day number of a single mission timestamp.
    pub fn anchor(&self, secs: f64) -> f64 {
        unix_to_plot_day(self.epoch_unix_seconds + secs)
    }

    /// Convert mission seconds to plot day numbers.
    ///
    /// # Errors
    /// [Error::EmptySeries] if `times` is empty, since the first value anchors the conversion.
    pub fn to_plot_days(&self, times: ArrayView1<f64>) -> Result<Array1<f64>> {
        let Some(&first) = times.get(0) else {
            return Err(Error::EmptySeries);
        };
        let anchor = self.anchor(first);
        Ok(times.mapv(|t| (t - first) / SECS_PER_DAY + anchor))
    }

    pub fn to_years(&self, times: ArrayView1<f64>) -> Result<Array1<f64>> {
        Ok(plot_days_to_years(self.to_plot_days(times)?.view()))
    }

    pub fn time(&self, secs: f64) -> Time {
        Time::from_unix_seconds(self.epoch_unix_seconds + secs)
    }
}

/// Convert CXC seconds to plot day numbers.
pub fn convert_mission_time(times: &[f64]) -> Result<Vec<f64>> {
    Ok(TimeBase::CXC
        .to_plot_days(ArrayView1::from(times))?
        .to_vec())
}

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Time(Epoch);

impl Time {
    pub fn from_unix_seconds(secs: f64) -> Self {
        Time(Epoch::from_unix_seconds(secs))
    }

    /// Create [Time] from CXC seconds (seconds since 1998-01-01T00:00:00 UTC).
    pub fn from_cxc(secs: f64) -> Self {
        TimeBase::CXC.time(secs)
    }

    pub fn from_plot_day(day: f64) -> Self {
        Time(plot_day_to_epoch(day))
    }

    /// Return UTC seconds since Jan 1, 1970
    pub fn unix(&self) -> f64 {
        self.0.to_unix_seconds()
    }

    /// Return CXC seconds
    pub fn cxc(&self) -> f64 {
        self.unix() - CXC_EPOCH_UNIX_SECONDS
    }

    pub fn plot_day(&self) -> f64 {
        unix_to_plot_day(self.unix())
    }

    /// Format ourself in UTC using the provided format string.
    ///
    /// See [hifitime::efmt::Format].
    pub fn format_utc(&self, fmt: &str) -> Result<String> {
        let fmt = Format::from_str(fmt).map_err(|e| Error::Time(format!("{fmt:?}: {e}")))?;
        Ok(self.format_with(fmt))
    }

    pub fn format_with(&self, fmt: Format) -> String {
        let formatter = Formatter::to_time_scale(self.0, fmt, TimeScale::UTC);
        format!("{formatter}")
    }
}
