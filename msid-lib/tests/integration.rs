use std::fs::{create_dir, metadata, write};

use msid::config::{get_default, Config, DEFAULT_ANALYSES};
use msid::{Analysis, AxisKind, Error};
use tempfile::TempDir;

#[test]
fn load_configs() {
    for name in DEFAULT_ANALYSES {
        assert!(get_default(name).is_ok(), "{name} config is invalid");
    }
}

fn write_fixtures(dir: &TempDir) {
    let msids = dir.path().join("msids");
    create_dir(&msids).unwrap();
    // pitch and distance on every 5 minute tick, temperatures on a subset
    let mut pitch = String::from("times,vals\n");
    let mut dist = String::from("times,vals\n");
    let mut cea = String::from("times,vals,maxes\n");
    let mut hvps = String::from("times,vals,maxes\n");
    for i in 0..100u32 {
        let t = 6.0e8 + f64::from(i) * 300.0;
        pitch.push_str(&format!("{t},{}\n", 45.0 + f64::from(i)));
        dist.push_str(&format!("{t},{}\n", 1.0e8 + f64::from(i) * 1000.0));
        if i % 2 == 0 {
            cea.push_str(&format!("{t},20.0,{}\n", 25.0 + f64::from(i) * 0.1));
        }
        if i % 4 == 0 {
            hvps.push_str(&format!("{t},30.0,{}\n", 35.0 + f64::from(i) * 0.1));
        }
    }
    write(msids.join("Point_SunCentAng_5min_lifetime.csv"), pitch).unwrap();
    write(msids.join("Dist_SatEarth_5min_lifetime.csv"), dist).unwrap();
    write(msids.join("2CE00ATM_5min_lifetime.csv"), cea).unwrap();
    write(msids.join("2IMHVATM_5min_lifetime.csv"), hvps.clone()).unwrap();
    write(msids.join("2SPHVATM_5min_lifetime.csv"), hvps).unwrap();

    let events = dir.path().join("events");
    create_dir(&events).unwrap();
    write(
        events.join("scs107s.csv"),
        "tstart,tstop\n600003000.0,600006000.0\n600020000.0,600021000.0\n",
    )
    .unwrap();
}

#[test]
fn cea_figures() {
    let dir = TempDir::new().unwrap();
    write_fixtures(&dir);

    let analysis = Analysis::new(get_default("cea").unwrap())
        .unwrap()
        .with_msid_dir(dir.path().join("msids"));
    let dataset = analysis.load().unwrap();

    assert_eq!(dataset.channel("pitch").unwrap().msid, "Point_SunCentAng");
    assert_eq!(dataset.channel("cea_temp").unwrap().len(), 50);
    // meters to kilometers
    assert_eq!(dataset.channel("distance").unwrap().values[1], 100_001.0);

    let figures = analysis.figures(&dataset).unwrap();
    assert_eq!(figures.len(), 3);

    let temps = &figures[0];
    assert_eq!(temps.x_axis, AxisKind::Years);
    assert_eq!(temps.series[0].y.len(), 25);
    assert_eq!(temps.series[1].y.len(), 50);
    // every hvps sample is colored by the pitch at its own timestamp
    assert_eq!(
        temps.series[0].color_values.as_ref().unwrap()[..3],
        [45.0, 49.0, 53.0]
    );
    let colorbar = temps.colorbar.as_ref().unwrap();
    assert_eq!((colorbar.min, colorbar.max), (0.0, 180.0));

    let pitch = &figures[1];
    assert_eq!(pitch.series[0].x.len(), 25);
    assert_eq!(pitch.x_range, Some((20.0, 50.0)));
}

#[test]
fn render_default_analyses() {
    let dir = TempDir::new().unwrap();
    write_fixtures(&dir);
    let outdir = dir.path().join("plots");

    let mut rendered = Vec::default();
    for name in DEFAULT_ANALYSES {
        let analysis = Analysis::new(get_default(name).unwrap())
            .unwrap()
            .with_msid_dir(dir.path().join("msids"))
            .with_events_dir(dir.path().join("events"));
        rendered.extend(analysis.run(&outdir).unwrap());
    }

    assert_eq!(rendered.len(), 4);
    for name in [
        "hvps_temperature",
        "temperature_pitch",
        "pitch_hvps_temperature",
        "distance_pitch",
    ] {
        let path = outdir.join(format!("{name}.png"));
        assert!(rendered.contains(&path), "{path:?} not rendered");
        let meta = metadata(&path).unwrap();
        assert!(meta.len() > 0, "{path:?} is empty");
    }
}

#[test]
fn missing_msid_file() {
    let dir = TempDir::new().unwrap();
    let analysis = Analysis::new(get_default("cea").unwrap())
        .unwrap()
        .with_msid_dir(dir.path().to_path_buf());

    let err = analysis.load().unwrap_err();

    assert!(matches!(err, Error::Csv { .. }), "{err}");
}

#[test]
fn config_from_path() {
    let dir = TempDir::new().unwrap();
    write_fixtures(&dir);
    let path = dir.path().join("custom.yaml");
    write(
        &path,
        "name: custom\nmsid_dir: msids\nchannels:\n  - name: cea\n    file: 2CE00ATM_5min_lifetime.csv\n    column: maxes\nplots:\n  - name: cea\n    kind: line\n    series:\n      - channel: cea\n",
    )
    .unwrap();

    let config = Config::with_path(&path).unwrap();
    let analysis = Analysis::new(config)
        .unwrap()
        .with_msid_dir(dir.path().join("msids"));
    let figures = analysis.figures(&analysis.load().unwrap()).unwrap();

    assert_eq!(figures[0].x_axis, AxisKind::Date);
    let x = &figures[0].series[0].x;
    assert_eq!(x.len(), 50);
    // 10 minutes between cea samples
    assert!((x[1] - x[0] - 600.0 / 86_400.0).abs() < 1e-9);
}
