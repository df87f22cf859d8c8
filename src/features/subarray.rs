//! Maximum-sum contiguous run of a segment (Kadane's scan).

use serde::{Deserialize, Serialize};

/// Best contiguous run found in a segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaxSubarray {
    /// First index of the run (inclusive)
    pub start: usize,
    /// Last index of the run (inclusive)
    pub end: usize,
    /// Sum of the run
    pub sum: f64,
}

impl MaxSubarray {
    /// Number of samples in the run.
    pub fn width(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Returns the contiguous run with the largest sum, or `None` for an empty series.
///
/// The running sum restarts whenever it has gone negative, and the best run
/// only moves on a strict improvement, so the earliest maximal run wins.
///
/// # Example
///
/// ```
/// use pulse_cluster::features::max_subarray;
///
/// let best = max_subarray(&[-2.0, 1.0, -3.0, 4.0, -1.0, 2.0, 1.0, -5.0, 4.0]).unwrap();
/// assert_eq!((best.start, best.end), (3, 6));
/// assert_eq!(best.sum, 6.0);
/// ```
pub fn max_subarray(series: &[f64]) -> Option<MaxSubarray> {
    let (&first, rest) = series.split_first()?;

    let mut best = MaxSubarray {
        start: 0,
        end: 0,
        sum: first,
    };
    let mut running = first;
    let mut run_start = 0;

    for (offset, &x) in rest.iter().enumerate() {
        let i = offset + 1;
        if running < 0.0 {
            running = x;
            run_start = i;
        } else {
            running += x;
        }

        if running > best.sum {
            best = MaxSubarray {
                start: run_start,
                end: i,
                sum: running,
            };
        }
    }

    Some(best)
}
