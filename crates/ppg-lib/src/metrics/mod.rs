pub mod hrv;
pub mod quality;
