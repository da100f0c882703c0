//! Fixed-size buffering of a live sample stream into pipeline windows.

use crate::signal::SamplingContext;

/// Collects incoming samples and hands back a full window once `capacity`
/// samples have arrived. Windows do not overlap.
#[derive(Debug, Clone)]
pub struct WindowAccumulator {
    capacity: usize,
    buf: Vec<u32>,
}

impl WindowAccumulator {
    pub fn new(ctx: &SamplingContext) -> Self {
        Self::with_capacity(ctx.capacity())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples waiting for the current window to fill.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    pub fn push(&mut self, sample: u32) -> Option<Vec<u32>> {
        self.buf.push(sample);
        if self.buf.len() == self.capacity {
            Some(std::mem::replace(
                &mut self.buf,
                Vec::with_capacity(self.capacity),
            ))
        } else {
            None
        }
    }

    /// Pushes every sample and returns the windows completed along the way.
    pub fn extend<I: IntoIterator<Item = u32>>(&mut self, samples: I) -> Vec<Vec<u32>> {
        samples.into_iter().filter_map(|s| self.push(s)).collect()
    }

    /// Takes the partial window, leaving the accumulator empty.
    pub fn take_pending(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.buf)
    }
}
