//! Dynamic Time Warping (DTW) distance for waveform segments.
//!
//! DTW allows elastic alignment between two sequences, so a beat that is
//! slightly shifted or stretched still scores as similar. The local cost is
//! the absolute sample difference.

/// Compute the Dynamic Time Warping distance between two time series.
///
/// # Arguments
/// * `a` - First time series
/// * `b` - Second time series
///
/// # Returns
/// DTW distance (lower is more similar), `+inf` if either input is empty.
pub fn dtw_distance(a: &[f64], b: &[f64]) -> f64 {
    accumulate(a, b, None)
}

/// Compute DTW distance with a Sakoe-Chiba band constraint.
///
/// Warping is limited to `window` positions off the diagonal. The window is
/// widened to at least `|n - m|` so the end cell stays reachable.
pub fn dtw_distance_windowed(a: &[f64], b: &[f64], window: usize) -> f64 {
    accumulate(a, b, Some(window))
}

/// Shared cost accumulation over two rolling rows of the DTW matrix.
fn accumulate(a: &[f64], b: &[f64], window: Option<usize>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }

    let n = a.len();
    let m = b.len();
    let band = window.map(|w| w.max(n.abs_diff(m)));

    let mut prev = vec![f64::INFINITY; m + 1];
    let mut curr = vec![f64::INFINITY; m + 1];
    prev[0] = 0.0;

    for i in 1..=n {
        curr.fill(f64::INFINITY);
        let (j_start, j_end) = match band {
            Some(w) => (1.max(i.saturating_sub(w)), m.min(i + w)),
            None => (1, m),
        };

        let x = a[i - 1];
        for j in j_start..=j_end {
            let cost = (x - b[j - 1]).abs();
            curr[j] = cost + prev[j].min(curr[j - 1]).min(prev[j - 1]);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[m]
}
