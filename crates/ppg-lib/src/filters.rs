use crate::error::ConfigError;

/// Numerator of the heart-rate bandpass (passes roughly 0.5–4 Hz at 25 Hz).
const BANDPASS_B: [f64; 3] = [0.292893, 0.0, -0.292893];
/// Denominator of the heart-rate bandpass, `a[0]` normalised to 1.
const BANDPASS_A: [f64; 3] = [1.0, -1.16574, 0.292893];

/// Second-order IIR bandpass over raw sensor counts.
///
/// Removes the DC offset and high-frequency noise. The first two outputs copy
/// the input because the recurrence has no history yet.
pub fn bandpass_filter(samples: &[u32]) -> Vec<f64> {
    let data: Vec<f64> = samples.iter().map(|&x| x as f64).collect();
    bandpass_filter_f64(&data)
}

/// [`bandpass_filter`] for already real-valued input.
pub fn bandpass_filter_f64(data: &[f64]) -> Vec<f64> {
    let [b0, b1, b2] = BANDPASS_B;
    let [_, a1, a2] = BANDPASS_A;
    let mut out = Vec::with_capacity(data.len());
    for (i, &x) in data.iter().enumerate() {
        let y = if i < 2 {
            x
        } else {
            b0 * x + b1 * data[i - 1] + b2 * data[i - 2] - a1 * out[i - 1] - a2 * out[i - 2]
        };
        out.push(y);
    }
    out
}

/// Trailing moving average. Near the start fewer than `win` samples exist, so
/// only the available ones are averaged.
pub fn moving_average_filter(data: &[f64], win: usize) -> Result<Vec<f64>, ConfigError> {
    if win == 0 {
        return Err(ConfigError::InvalidWindow);
    }
    let out = (0..data.len())
        .map(|i| {
            let window = &data[(i + 1).saturating_sub(win)..=i];
            window.iter().sum::<f64>() / window.len() as f64
        })
        .collect();
    Ok(out)
}

/// Drops zero readings, which the sensor reports when it loses skin contact.
pub fn remove_zero(samples: &[u32]) -> Vec<u32> {
    samples.iter().copied().filter(|&x| x != 0).collect()
}

/// Discards `n` samples from each end to skip the filter's start-up transient.
pub fn trim_edges(data: &[f64], n: usize) -> &[f64] {
    if data.len() <= 2 * n {
        return &[];
    }
    &data[n..data.len() - n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandpass_preserves_length_and_seeds_first_two() {
        let raw = [100, 200, 300, 250, 150, 120];
        let out = bandpass_filter(&raw);
        assert_eq!(out.len(), raw.len());
        assert_eq!(out[0], 100.0);
        assert_eq!(out[1], 200.0);
        let expected = 0.292893 * 300.0 - 0.292893 * 100.0 + 1.16574 * 200.0 - 0.292893 * 100.0;
        assert!((out[2] - expected).abs() < 1e-9);
    }

    #[test]
    fn bandpass_is_deterministic() {
        let raw: Vec<u32> = (0..500).map(|i| 50_000 + (i * 37 % 211) as u32).collect();
        let a = bandpass_filter(&raw);
        let b = bandpass_filter(&raw);
        assert_eq!(
            a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn bandpass_handles_short_input() {
        assert!(bandpass_filter(&[]).is_empty());
        assert_eq!(bandpass_filter(&[7]), vec![7.0]);
    }

    #[test]
    fn bandpass_rejects_dc_offset() {
        let raw = vec![40_000u32; 400];
        let out = bandpass_filter(&raw);
        assert!(out[399].abs() < 1.0, "DC leaked through: {}", out[399]);
    }

    #[test]
    fn moving_average_clips_left_edge() {
        let data = [2.0, 4.0, 6.0, 8.0, 10.0];
        let out = moving_average_filter(&data, 3).unwrap();
        assert_eq!(out.len(), data.len());
        assert!((out[0] - 2.0).abs() < 1e-12);
        assert!((out[1] - 3.0).abs() < 1e-12);
        assert!((out[2] - 4.0).abs() < 1e-12);
        assert!((out[4] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn moving_average_window_one_is_identity() {
        let data = [1.5, -2.0, 3.25];
        assert_eq!(moving_average_filter(&data, 1).unwrap(), data.to_vec());
    }

    #[test]
    fn moving_average_rejects_zero_window() {
        assert_eq!(
            moving_average_filter(&[1.0, 2.0], 0),
            Err(ConfigError::InvalidWindow)
        );
    }

    #[test]
    fn moving_average_is_deterministic() {
        let data: Vec<f64> = (0..300).map(|i| (i as f64 * 0.37).sin() * 120.0).collect();
        let a = moving_average_filter(&data, 6).unwrap();
        let b = moving_average_filter(&data, 6).unwrap();
        assert_eq!(
            a.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            b.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn remove_zero_compacts() {
        assert_eq!(remove_zero(&[0, 5, 0, 0, 9, 1]), vec![5, 9, 1]);
    }

    #[test]
    fn trim_edges_drops_both_ends() {
        let data: Vec<f64> = (0..10).map(|i| i as f64).collect();
        assert_eq!(trim_edges(&data, 2), &data[2..8]);
        assert!(trim_edges(&data, 5).is_empty());
        assert_eq!(trim_edges(&data, 0), &data[..]);
    }
}
