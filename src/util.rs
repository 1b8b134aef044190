use chrono::Local;

// Wall-clock label stamped on a sample when it enters the chart window
pub fn time_label() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

// Upper chart bound: highest value in the window, at least 1.0 so an
// all-zero window still renders a flat baseline
pub fn axis_max<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> f64 {
    values.into_iter().cloned().fold(1.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_label_is_hh_mm_ss() {
        let label = time_label();
        assert_eq!(label.len(), 8);
        assert_eq!(label.as_bytes()[2], b':');
        assert_eq!(label.as_bytes()[5], b':');
    }

    #[test]
    fn axis_max_never_below_one() {
        assert_eq!(axis_max(&[0.0, 0.2, 0.5]), 1.0);
        assert_eq!(axis_max(&[]), 1.0);
        assert_eq!(axis_max(&[3.0, 98.5, 72.0]), 98.5);
    }
}
