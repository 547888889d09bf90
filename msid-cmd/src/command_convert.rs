use anyhow::{Context, Result};
use msid::{read_times, TimeBase};
use ndarray::Array1;
use std::{io::Write, path::Path};

const UTC_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Write `times,plot_day,utc` CSV rows for the mission times in `column` of `input`.
pub fn convert<W: Write>(input: &Path, column: &str, epoch: &str, writer: W) -> Result<()> {
    let time_base = TimeBase::from_iso(epoch).context("invalid epoch")?;
    let times = Array1::from(read_times(input, column)?);
    let days = time_base
        .to_plot_days(times.view())
        .with_context(|| format!("converting {input:?}"))?;

    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(["times", "plot_day", "utc"])?;
    for (t, day) in times.iter().zip(days.iter()) {
        let utc = time_base.time(*t).format_utc(UTC_FORMAT)?;
        writer.write_record([t.to_string(), day.to_string(), utc])?;
    }
    writer.flush()?;

    Ok(())
}
