/// Upper X and Y bounds for a chart of `(x, y)` points.
///
/// X never drops below 1 so a single point still spans an axis; Y is at least `y_floor`.
pub fn compute_bounds(points: &[(f64, f64)], y_floor: f64) -> (f64, f64) {
    let highest_y = points
        .iter()
        .map(|&(_, y)| y)
        .fold(y_floor, f64::max);

    let overall_x = points.last().map(|p| p.0).unwrap_or(1.0).max(1.0);

    (overall_x, highest_y.ceil())
}

/// Number each value from 1 for plotting against run or keystroke order
pub fn numbered_points(values: impl IntoIterator<Item = f64>) -> Vec<(f64, f64)> {
    values
        .into_iter()
        .enumerate()
        .map(|(idx, v)| ((idx + 1) as f64, v))
        .collect()
}

/// Format a simple numeric label consistently
pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.2}")
    }
}
