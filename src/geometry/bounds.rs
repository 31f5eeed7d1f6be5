use serde::{Deserialize, Serialize};

/// Fraction of each axis span added on both sides.
const PADDING_RATIO: f64 = 0.1;
/// Minimum padding, used for single points and flat axes.
const MIN_PADDING: f64 = 0.1;

/// Axis-aligned plot range over every point of a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

/// Padded bounds of `points`, or `None` when there is nothing finite to plot.
pub fn axis_bounds(points: impl IntoIterator<Item = (f64, f64)>) -> Option<AxisBounds> {
    let (x_min, x_max, y_min, y_max) = points
        .into_iter()
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .fold(None, |acc: Option<(f64, f64, f64, f64)>, (x, y)| {
            Some(match acc {
                None => (x, x, y, y),
                Some((x0, x1, y0, y1)) => (x0.min(x), x1.max(x), y0.min(y), y1.max(y)),
            })
        })?;

    let x_pad = padding(x_min, x_max);
    let y_pad = padding(y_min, y_max);
    Some(AxisBounds {
        x_min: x_min - x_pad,
        x_max: x_max + x_pad,
        y_min: y_min - y_pad,
        y_max: y_max + y_pad,
    })
}

fn padding(min: f64, max: f64) -> f64 {
    ((max - min) * PADDING_RATIO).max(MIN_PADDING)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn contains(b: &AxisBounds, x: f64, y: f64) -> bool {
        x >= b.x_min && x <= b.x_max && y >= b.y_min && y <= b.y_max
    }

    #[test]
    fn pads_ten_percent_per_axis() {
        let b = axis_bounds([(0.0, 0.0), (10.0, 4.0), (3.0, 1.0)]).unwrap();
        assert!(approx(b.x_min, -1.0));
        assert!(approx(b.x_max, 11.0));
        assert!(approx(b.y_min, -0.4));
        assert!(approx(b.y_max, 4.4));
    }

    #[test]
    fn single_point_gets_minimum_padding() {
        let b = axis_bounds([(2.0, -3.0)]).unwrap();
        assert!(approx(b.x_min, 1.9));
        assert!(approx(b.x_max, 2.1));
        assert!(approx(b.y_min, -3.1));
        assert!(approx(b.y_max, -2.9));
    }

    #[test]
    fn narrow_span_uses_minimum_padding() {
        let b = axis_bounds([(0.0, 0.0), (0.5, 0.0)]).unwrap();
        assert!(approx(b.x_min, -0.1));
        assert!(approx(b.x_max, 0.6));
    }

    #[test]
    fn empty_or_non_finite_input_has_no_bounds() {
        assert_eq!(axis_bounds(std::iter::empty()), None);
        assert_eq!(axis_bounds([(f64::NAN, 1.0), (1.0, f64::INFINITY)]), None);
        let b = axis_bounds([(f64::NAN, 0.0), (1.0, 1.0)]).unwrap();
        assert!(contains(&b, 1.0, 1.0));
    }

    proptest! {
        #[test]
        fn bounds_contain_every_point(pts in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 1..50)) {
            let b = axis_bounds(pts.iter().copied()).unwrap();
            for (x, y) in pts {
                prop_assert!(contains(&b, x, y));
            }
            prop_assert!(b.x_max > b.x_min && b.y_max > b.y_min);
        }
    }
}
