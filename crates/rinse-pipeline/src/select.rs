//! Candidate selection.

/// Index of the highest score.
///
/// Ties resolve to the smallest index. `NaN` scores never win; if every
/// score is `NaN` the first index is returned. Returns `None` only for an
/// empty slice.
#[must_use]
pub fn select_best(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &score) in scores.iter().enumerate() {
        match best {
            None => best = Some((i, score)),
            Some((_, current)) if score > current || (current.is_nan() && !score.is_nan()) => {
                best = Some((i, score));
            }
            Some(_) => {}
        }
    }
    best.map(|(i, _)| i)
}
