pub mod sink;
pub mod text;

pub use sink::{CsvMetricSink, JsonLinesSink, MetricRecord, MetricSink};
pub use text::{parse_u32_samples, read_u32_samples};
