use anyhow::Result;
use msid::{msid_from_path, EventLog, TimeBase};
use serde::Serialize;
use std::{io::Write, path::Path};

#[derive(Debug, Serialize)]
struct Event {
    tstart: f64,
    plot_day: f64,
    utc: String,
}

pub fn events<W: Write>(input: &Path, column: &str, mut writer: W) -> Result<()> {
    let time_base = TimeBase::CXC;
    let log = EventLog::from_csv(&msid_from_path(input), input, column)?;
    let days = log.plot_days(&time_base)?;

    let mut events = Vec::with_capacity(log.len());
    for ((tstart, day), time) in log
        .starts
        .iter()
        .zip(days.iter())
        .zip(log.times(&time_base))
    {
        events.push(Event {
            tstart: *tstart,
            plot_day: *day,
            utc: time.format_utc("%Y-%m-%dT%H:%M:%S")?,
        });
    }

    serde_json::to_writer_pretty(&mut writer, &events)?;
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use serde_json::{json, Value};
    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn test_events() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"tstart,tstop\n86400,90000\n129600,180000\n")
            .unwrap();

        let mut out: Vec<u8> = Vec::default();
        events(file.path(), "tstart", &mut out).unwrap();

        let events: Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(
            events,
            json!([
                {"tstart": 86400.0, "plot_day": 729391.0, "utc": "1998-01-02T00:00:00"},
                {"tstart": 129600.0, "plot_day": 729391.5, "utc": "1998-01-02T12:00:00"},
            ])
        );
    }

    #[test]
    fn test_events_empty() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"tstart\n").unwrap();

        let mut out: Vec<u8> = Vec::default();
        events(file.path(), "tstart", &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "[]");
    }

    #[test]
    fn test_events_nan() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"tstart\n86400\nnan\n").unwrap();

        let mut out: Vec<u8> = Vec::default();
        assert!(events(file.path(), "tstart", &mut out).is_err());
    }
}
