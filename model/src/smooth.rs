/// First index of the trailing window of `window` samples ending at `end`,
/// clamped to the start of the series.
pub(crate) fn window_start(end: usize, window: usize) -> usize {
    end.saturating_sub(window.max(1) - 1)
}

/// Trailing running average: `out[i]` is the mean of
/// `values[i - window + 1 ..= i]`, clamped to the start of the series, so
/// early samples average over a shorter effective window. Never looks ahead.
pub(crate) fn trailing_average(values: &[f64], window: usize) -> Vec<f64> {
    let window = window.max(1);
    let mut sum = 0.0;
    values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            sum += value;
            if i >= window {
                sum -= values[i - window];
            }
            sum / (i.min(window - 1) + 1) as f64
        })
        .collect()
}
