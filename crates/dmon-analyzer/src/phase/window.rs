//! Fixed-size block averages, used to eyeball where phase boundaries fall
//! before writing a plan.

use std::num::NonZeroUsize;

use serde::Serialize;

use super::analyzer::mean;
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub start_index: usize,
    /// exclusive
    pub end_index: usize,
    pub average: f64,
    pub values: Vec<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize(NonZeroUsize);

impl WindowSize {
    pub const DEFAULT: WindowSize = match NonZeroUsize::new(10) {
        Some(size) => WindowSize(size),
        None => unreachable!(),
    };

    pub fn new(samples: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(samples)
            .map(Self)
            .ok_or(ConfigError::EmptyWindow)
    }

    pub fn get(self) -> usize {
        self.0.get()
    }
}

impl Default for WindowSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Split `readings` into consecutive blocks of `window` samples. The last
/// block is shorter when the length is not a multiple of the window.
pub fn block_averages(readings: &[u32], window: WindowSize) -> Vec<BlockSummary> {
    readings
        .chunks(window.get())
        .enumerate()
        .filter_map(|(i, chunk)| {
            let start_index = i * window.get();
            mean(chunk).map(|average| BlockSummary {
                start_index,
                end_index: start_index + chunk.len(),
                average,
                values: chunk.to_vec(),
            })
        })
        .collect()
}
