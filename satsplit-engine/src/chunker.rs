//! Window planning and logit aggregation for long token sequences

use crate::error::{EngineError, Result};

/// Windowing policy for sequences longer than a backend accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    max_seq_len: usize,
    overlap: usize,
}

impl ChunkPolicy {
    /// Create a policy; `overlap` must be smaller than `max_seq_len`
    pub fn new(max_seq_len: usize, overlap: usize) -> Result<Self> {
        if max_seq_len == 0 {
            return Err(EngineError::ConfigError(
                "max sequence length must be greater than 0".to_string(),
            ));
        }
        if overlap >= max_seq_len {
            return Err(EngineError::ConfigError(format!(
                "overlap ({overlap}) must be smaller than max sequence length ({max_seq_len})"
            )));
        }
        Ok(Self {
            max_seq_len,
            overlap,
        })
    }

    /// Window width in tokens
    pub fn max_seq_len(&self) -> usize {
        self.max_seq_len
    }

    /// Tokens shared by consecutive windows
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive window starts
    pub fn stride(&self) -> usize {
        self.max_seq_len - self.overlap
    }

    /// Plan the windows covering `len` tokens
    ///
    /// The last window is clamped to end at `len`. An empty sequence has no
    /// windows.
    pub fn plan(&self, len: usize) -> Vec<ChunkWindow> {
        if len == 0 {
            return Vec::new();
        }
        if len <= self.max_seq_len {
            return vec![ChunkWindow { start: 0, end: len }];
        }

        let mut windows = Vec::with_capacity(len.div_ceil(self.stride()));
        let mut start = 0;
        loop {
            let end = (start + self.max_seq_len).min(len);
            windows.push(ChunkWindow { start, end });
            if end == len {
                break;
            }
            start += self.stride();
        }
        windows
    }
}

/// Token index range `[start, end)` scored in one backend call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkWindow {
    /// First token index
    pub start: usize,
    /// One past the last token index
    pub end: usize,
}

impl ChunkWindow {
    /// Number of tokens in the window
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Per-position running sum and count of window logits
#[derive(Debug, Clone)]
pub struct LogitAccumulator {
    sums: Vec<f64>,
    counts: Vec<u32>,
}

impl LogitAccumulator {
    /// Accumulator for a sequence of `len` tokens
    pub fn new(len: usize) -> Self {
        Self {
            sums: vec![0.0; len],
            counts: vec![0; len],
        }
    }

    /// Add the logits produced for `window`
    pub fn add(&mut self, window: ChunkWindow, logits: &[f32]) -> Result<()> {
        if logits.len() != window.len() {
            return Err(EngineError::LogitCountMismatch {
                expected: window.len(),
                actual: logits.len(),
            });
        }
        if window.end > self.sums.len() {
            return Err(EngineError::ConfigError(format!(
                "window [{}, {}) exceeds sequence length {}",
                window.start,
                window.end,
                self.sums.len()
            )));
        }

        for (offset, &logit) in logits.iter().enumerate() {
            self.sums[window.start + offset] += f64::from(logit);
            self.counts[window.start + offset] += 1;
        }
        Ok(())
    }

    /// Number of windows that covered `position`
    pub fn count(&self, position: usize) -> u32 {
        self.counts.get(position).copied().unwrap_or(0)
    }

    /// Mean logit per position
    pub fn finalize(self) -> Vec<f32> {
        self.sums
            .into_iter()
            .zip(self.counts)
            .map(|(sum, count)| {
                debug_assert!(count > 0, "every position is covered by a window");
                if count == 0 {
                    0.0
                } else {
                    (sum / f64::from(count)) as f32
                }
            })
            .collect()
    }
}

/// Score `ids` window by window and average the overlapping logits
///
/// `score` receives the ids and attention mask of one window. The first
/// failing window aborts the whole sequence.
pub fn score_windows<F>(ids: &[i64], policy: &ChunkPolicy, score: F) -> Result<Vec<f32>>
where
    F: FnMut(ChunkWindow, &[i64], &[i64]) -> Result<Vec<f32>>,
{
    Ok(accumulate_windows(ids, policy, score)?.finalize())
}

/// Score `ids` window by window, leaving the averaging to the caller
///
/// Lets a caller give back whatever `score` borrows before paying for
/// [`LogitAccumulator::finalize`].
pub fn accumulate_windows<F>(
    ids: &[i64],
    policy: &ChunkPolicy,
    mut score: F,
) -> Result<LogitAccumulator>
where
    F: FnMut(ChunkWindow, &[i64], &[i64]) -> Result<Vec<f32>>,
{
    let windows = policy.plan(ids.len());
    let mask = vec![1i64; ids.len()];
    let mut acc = LogitAccumulator::new(ids.len());

    for window in windows {
        let logits = score(
            window,
            &ids[window.start..window.end],
            &mask[window.start..window.end],
        )?;
        acc.add(window, &logits)?;
    }

    Ok(acc)
}
