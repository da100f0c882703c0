//! Backend-agnostic figure model. The CLI renders it with plotters.

use crate::signal::{Events, TimeSeries};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Axis {
    pub label: Option<String>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(self) -> (u8, u8, u8) {
        (
            ((self.0 >> 16) & 0xFF) as u8,
            ((self.0 >> 8) & 0xFF) as u8,
            (self.0 & 0xFF) as u8,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub width: u32,
    pub color: Color,
}

/// Scatter markers, used for detected extrema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerSeries {
    pub name: String,
    pub points: Vec<[f64; 2]>,
    pub radius: u32,
    pub color: Color,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Series {
    Line(LineSeries),
    Markers(MarkerSeries),
}

impl Series {
    pub fn points(&self) -> &[[f64; 2]] {
        match self {
            Series::Line(line) => &line.points,
            Series::Markers(markers) => &markers.points,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Figure {
    pub fn new(title: impl Into<Option<String>>) -> Self {
        Self {
            title: title.into(),
            x: Axis::default(),
            y: Axis::default(),
            series: Vec::new(),
        }
    }

    pub fn add_series(&mut self, series: Series) {
        self.series.push(series);
    }

    /// `(x_min, x_max, y_min, y_max)` over every series, or `None` when the
    /// figure holds no finite point.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut pts = self
            .series
            .iter()
            .flat_map(|s| s.points().iter())
            .filter(|p| p[0].is_finite() && p[1].is_finite());
        let first = pts.next()?;
        let init = (first[0], first[0], first[1], first[1]);
        Some(pts.fold(init, |(x0, x1, y0, y1), p| {
            (x0.min(p[0]), x1.max(p[0]), y0.min(p[1]), y1.max(p[1]))
        }))
    }
}

/// Keeps every `len / max_points`-th point.
pub fn decimate_points(points: &[[f64; 2]], max_points: usize) -> Vec<[f64; 2]> {
    if points.len() <= max_points {
        return points.to_vec();
    }
    let bucket_size = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| (i as f64 * bucket_size).floor() as usize)
        .take_while(|&start| start < points.len())
        .map(|start| points[start])
        .collect()
}

fn time_points(series: &TimeSeries) -> Vec<[f64; 2]> {
    let dt = 1.0 / series.fs;
    series
        .data
        .iter()
        .enumerate()
        .map(|(i, value)| [i as f64 * dt, *value])
        .collect()
}

/// Signal trace in seconds with the detected peaks drawn on top.
pub fn figure_from_signal_with_peaks(
    title: &str,
    series: &TimeSeries,
    peaks: &Events,
    max_points: usize,
) -> Figure {
    let mut fig = Figure::new(Some(title.into()));
    fig.x.label = Some("time (s)".into());
    fig.y.label = Some("amplitude".into());
    fig.add_series(Series::Line(LineSeries {
        name: "signal".into(),
        points: decimate_points(&time_points(series), max_points),
        width: 1,
        color: Color(0x1F77B4),
    }));
    let dt = 1.0 / series.fs;
    let markers = peaks
        .indices
        .iter()
        .filter_map(|&i| series.data.get(i).map(|v| [i as f64 * dt, *v]))
        .collect();
    fig.add_series(Series::Markers(MarkerSeries {
        name: "peaks".into(),
        points: markers,
        radius: 3,
        color: Color(0xD62728),
    }));
    fig
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimation_caps_point_count() {
        let points: Vec<[f64; 2]> = (0..1000).map(|i| [i as f64, 0.0]).collect();
        let out = decimate_points(&points, 100);
        assert_eq!(out.len(), 100);
        assert_eq!(out[0], [0.0, 0.0]);
        assert_eq!(out[1], [10.0, 0.0]);
        assert_eq!(decimate_points(&points[..5], 100).len(), 5);
    }

    #[test]
    fn peak_markers_sit_on_the_trace() {
        let ts = TimeSeries {
            fs: 10.0,
            data: vec![0.0, 1.0, 0.0, 2.0, 0.0],
        };
        let fig = figure_from_signal_with_peaks("ppg", &ts, &Events::from_indices(vec![1, 3, 9]), 100);
        assert_eq!(fig.series.len(), 2);
        let markers = fig.series[1].points();
        assert_eq!(markers.len(), 2);
        assert!((markers[1][0] - 0.3).abs() < 1e-12);
        assert_eq!(markers[1][1], 2.0);
        let (x0, x1, y0, y1) = fig.bounds().unwrap();
        assert_eq!((x0, y0, y1), (0.0, 0.0, 2.0));
        assert!((x1 - 0.4).abs() < 1e-12);
    }

    #[test]
    fn empty_figure_has_no_bounds() {
        assert!(Figure::new(None::<String>).bounds().is_none());
    }
}
