//! PNG charts drawn with plotters.

use plotters::style::RGBColor;
use std::ops::Range;

use crate::process::records::Party;

pub mod timeseries;
pub mod top_states;

pub use timeseries::{render_timeseries, timeseries_points, TimeSeries};
pub use top_states::render_top_states;

pub const INDIAN_RED: RGBColor = RGBColor(205, 92, 92);
pub const DARK_BLUE: RGBColor = RGBColor(0, 0, 139);
pub const LIGHT_GRAY: RGBColor = RGBColor(211, 211, 211);
pub const SLATE_GRAY: RGBColor = RGBColor(112, 128, 144);
pub const LINE_RED: RGBColor = RGBColor(214, 39, 40);
pub const LINE_BLUE: RGBColor = RGBColor(31, 119, 180);

/// Bar color per party bucket.
pub fn bar_color(party: Party) -> RGBColor {
    match party {
        Party::Republican => INDIAN_RED,
        Party::Democrat => DARK_BLUE,
        Party::Other => SLATE_GRAY,
    }
}

/// Line color per party bucket.
pub fn line_color(party: Party) -> RGBColor {
    match party {
        Party::Republican => LINE_RED,
        Party::Democrat => LINE_BLUE,
        Party::Other => SLATE_GRAY,
    }
}

/// Axis range covering `values` and zero, padded by 5%.
pub(crate) fn value_range<I: IntoIterator<Item = f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if hi - lo <= f64::EPSILON {
        return lo..lo + 1.0;
    }
    let pad = (hi - lo) * 0.05;
    let lo = if lo < 0.0 { lo - pad } else { lo };
    lo..hi + pad
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_per_bucket() {
        assert_eq!(bar_color(Party::Republican), INDIAN_RED);
        assert_eq!(bar_color(Party::Democrat), DARK_BLUE);
        assert_eq!(bar_color(Party::Other), SLATE_GRAY);
        assert_eq!(line_color(Party::Republican), LINE_RED);
    }

    #[test]
    fn value_range_includes_zero() {
        let r = value_range(vec![10.0, 20.0]);
        assert_eq!(r.start, 0.0);
        assert!((r.end - 21.0).abs() < 1e-9);

        let r = value_range(vec![-10.0, 10.0, f64::NAN]);
        assert!(r.start < -10.0 && r.end > 10.0);

        assert_eq!(value_range(Vec::new()), 0.0..1.0);
    }
}
