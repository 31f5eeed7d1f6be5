use super::Point;
use std::cmp::Ordering;

/// Z component of `(a - o) x (b - o)`. Positive for a counter-clockwise turn.
pub fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Monotone-chain convex hull, counter-clockwise, not closed.
///
/// Fewer than three points are returned unchanged. Collinear points are
/// dropped from the boundary, so an all-collinear set reduces to its two
/// extreme points. Exact duplicates collapse to one vertex.
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let mut sorted = points.to_vec();
    // Callers pass finite coordinates only. `-0.0` and `0.0` must compare equal.
    sorted.sort_by(|a, b| {
        a.x.partial_cmp(&b.x)
            .unwrap_or(Ordering::Equal)
            .then(a.y.partial_cmp(&b.y).unwrap_or(Ordering::Equal))
    });
    sorted.dedup();
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower = half_chain(sorted.iter());
    let mut upper = half_chain(sorted.iter().rev());

    // Each chain ends where the other begins.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

fn half_chain<'a>(points: impl Iterator<Item = &'a Point>) -> Vec<Point> {
    let mut chain: Vec<Point> = Vec::new();
    for &p in points {
        while chain.len() >= 2 && cross(chain[chain.len() - 2], chain[chain.len() - 1], p) <= 0.0 {
            chain.pop();
        }
        chain.push(p);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Twice the signed area of a polygon given without its closing vertex.
    fn signed_area2(polygon: &[Point]) -> f64 {
        if polygon.len() < 3 {
            return 0.0;
        }
        polygon
            .iter()
            .zip(polygon.iter().cycle().skip(1))
            .map(|(a, b)| a.x * b.y - b.x * a.y)
            .sum()
    }

    fn p(x: f64, y: f64) -> Point {
        Point { x, y }
    }

    fn sorted_set(points: &[Point]) -> Vec<(f64, f64)> {
        // Adding 0.0 folds -0.0 into 0.0 so the set compares by value.
        let mut v: Vec<(f64, f64)> = points.iter().map(|p| (p.x + 0.0, p.y + 0.0)).collect();
        v.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
        v
    }

    #[test]
    fn square_with_interior_point() {
        let pts = [p(0.0, 0.0), p(2.0, 0.0), p(1.0, 1.0), p(2.0, 2.0), p(0.0, 2.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull, vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0)]);
        assert!(signed_area2(&hull) > 0.0);
    }

    #[test]
    fn collinear_edge_points_are_dropped() {
        let pts = [p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(1.0, 2.0)];
        let hull = convex_hull(&pts);
        assert_eq!(sorted_set(&hull), vec![(0.0, 0.0), (1.0, 2.0), (2.0, 0.0)]);
    }

    #[test]
    fn all_collinear_reduces_to_extremes() {
        let pts = [p(1.0, 1.0), p(3.0, 3.0), p(0.0, 0.0), p(2.0, 2.0)];
        assert_eq!(convex_hull(&pts), vec![p(0.0, 0.0), p(3.0, 3.0)]);
    }

    #[test]
    fn small_inputs_pass_through() {
        assert!(convex_hull(&[]).is_empty());
        assert_eq!(convex_hull(&[p(1.0, 2.0)]), vec![p(1.0, 2.0)]);
        let two = [p(5.0, 5.0), p(1.0, 1.0)];
        assert_eq!(convex_hull(&two), two.to_vec());
    }

    #[test]
    fn duplicates_collapse() {
        let same = [p(1.0, 1.0); 4];
        assert_eq!(convex_hull(&same), vec![p(1.0, 1.0)]);
        let tri = [p(0.0, 0.0), p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0), p(4.0, 0.0)];
        assert_eq!(convex_hull(&tri).len(), 3);
    }

    #[test]
    fn signed_zero_x_sorts_with_positive_zero() {
        let pts = [p(-0.0, 5.0), p(0.0, 0.0), p(0.0, 10.0), p(1.0, 5.0)];
        let hull = convex_hull(&pts);
        assert_eq!(hull.len(), 3);
        assert!(hull.contains(&p(0.0, 0.0)));
        assert!(hull.contains(&p(0.0, 10.0)));
        assert!(hull.contains(&p(1.0, 5.0)));
        for q in &pts {
            for (i, a) in hull.iter().enumerate() {
                let b = hull[(i + 1) % hull.len()];
                assert!(cross(*a, b, *q) >= 0.0, "{q:?} outside edge {a:?}->{b:?}");
            }
        }
    }

    #[test]
    fn cross_sign_matches_turn_direction() {
        assert!(cross(p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0)) > 0.0);
        assert!(cross(p(0.0, 0.0), p(1.0, 0.0), p(1.0, -1.0)) < 0.0);
        assert_eq!(cross(p(0.0, 0.0), p(1.0, 1.0), p(2.0, 2.0)), 0.0);
    }

    fn arb_points() -> impl Strategy<Value = Vec<Point>> {
        // Integer grid keeps the orientation test exact; zeros may come out negative.
        prop::collection::vec((-50i32..50, -50i32..50, any::<bool>(), any::<bool>()), 3..40).prop_map(
            |raw| {
                raw.into_iter()
                    .map(|(x, y, neg_x, neg_y)| {
                        let zero_sign = |v: i32, neg: bool| if v == 0 && neg { -0.0 } else { v as f64 };
                        p(zero_sign(x, neg_x), zero_sign(y, neg_y))
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn every_point_is_inside_or_on_hull(pts in arb_points()) {
            let hull = convex_hull(&pts);
            if hull.len() >= 3 {
                for q in &pts {
                    for (i, a) in hull.iter().enumerate() {
                        let b = hull[(i + 1) % hull.len()];
                        prop_assert!(cross(*a, b, *q) >= 0.0, "{:?} outside edge {:?}->{:?}", q, a, b);
                    }
                }
                prop_assert!(signed_area2(&hull) > 0.0, "hull must be counter-clockwise");
            }
        }

        #[test]
        fn hull_vertices_come_from_input(pts in arb_points()) {
            for v in convex_hull(&pts) {
                prop_assert!(pts.contains(&v));
            }
        }

        #[test]
        fn hull_is_deterministic_and_order_independent(pts in arb_points()) {
            let first = convex_hull(&pts);
            let again = convex_hull(&pts);
            prop_assert_eq!(&first, &again);

            let mut reversed = pts.clone();
            reversed.reverse();
            prop_assert_eq!(sorted_set(&first), sorted_set(&convex_hull(&reversed)));
        }
    }
}
