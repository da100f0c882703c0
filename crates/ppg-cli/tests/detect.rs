use assert_cmd::cargo::cargo_bin_cmd;
use ppg_lib::signal::Events;
use std::{error::Error, f64::consts::PI};

fn sine(offset: f64, sign: f64) -> String {
    // 1.25 Hz at 100 Hz: one period every 80 samples
    (0..400)
        .map(|i| format!("{}\n", offset + sign * (2.0 * PI * 1.25 * i as f64 / 100.0).cos()))
        .collect()
}

#[test]
fn find_valleys_reports_one_per_period() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("ppg");
    cmd.args(["find-valleys", "--fs", "100"])
        .write_stdin(sine(10.0, -1.0));
    let output = cmd.assert().success().get_output().stdout.clone();
    let events: Events = serde_json::from_slice(&output)?;
    assert_eq!(events.indices, vec![0, 80, 160, 240, 320]);
    Ok(())
}

#[test]
fn find_peaks_respects_refractory_distance() -> Result<(), Box<dyn Error>> {
    let mut cmd = cargo_bin_cmd!("ppg");
    cmd.args(["find-peaks", "--fs", "100", "--min-distance-s", "0.4"])
        .write_stdin(sine(10.0, -1.0));
    let output = cmd.assert().success().get_output().stdout.clone();
    let events: Events = serde_json::from_slice(&output)?;
    assert_eq!(events.len(), 5);
    for w in events.indices.windows(2) {
        assert!(w[1] - w[0] > 40);
    }
    Ok(())
}

#[test]
fn find_peaks_rejects_bad_sampling_rate() {
    let mut cmd = cargo_bin_cmd!("ppg");
    cmd.args(["find-peaks", "--fs", "0"]).write_stdin("1\n2\n1\n");
    cmd.assert().failure();
}

#[test]
fn filter_trims_edges_and_keeps_order() -> Result<(), Box<dyn Error>> {
    let mut sim = cargo_bin_cmd!("ppg");
    sim.args(["simulate", "--duration-s", "10"]);
    let recording = sim.assert().success().get_output().stdout.clone();

    let mut cmd = cargo_bin_cmd!("ppg");
    cmd.args(["filter", "--edge-trim", "25"]).write_stdin(recording);
    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output)?;
    let values: Vec<f64> = text.lines().map(|l| l.parse()).collect::<Result<_, _>>()?;
    assert_eq!(values.len(), 200);
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    assert!(mean.abs() < 100.0, "baseline not removed: {mean}");
    Ok(())
}
