use crate::landmarks::{DetectionResult, Frame, Hand, Point, coordinate_of};

/// Angle (degrees) reported when the triangle is degenerate or the cosine
/// falls outside its domain. Reads as a straight joint.
pub const STRAIGHT_DEG: f64 = 180.0;

pub const DEFAULT_BEND_THRESHOLD_DEG: f64 = 160.0;

fn dist(p: Point, q: Point) -> f64 {
    let dx = (p.x - q.x) as f64;
    let dy = (p.y - q.y) as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Angle at vertex `b` of triangle a-b-c, via the law of cosines.
pub fn angle_at(a: Point, b: Point, c: Point) -> f64 {
    let ab = dist(a, b);
    let bc = dist(b, c);
    let ac = dist(a, c);
    if ab == 0.0 || bc == 0.0 || ac == 0.0 {
        return STRAIGHT_DEG;
    }

    let cos = (ab * ab + bc * bc - ac * ac) / (2.0 * ab * bc);
    if !(-1.0..=1.0).contains(&cos) {
        return STRAIGHT_DEG;
    }
    cos.acos().to_degrees()
}

/// Whether the joint tip-mid-base on `hand` is bent past `threshold_deg`.
/// A missing landmark reads as extended.
pub fn is_bent(
    tip: usize,
    mid: usize,
    base: usize,
    frame: &Frame,
    hand: Hand,
    detection: &DetectionResult,
    threshold_deg: f64,
) -> bool {
    let resolve = |i| coordinate_of(i, frame, hand, detection);
    match (resolve(tip), resolve(mid), resolve(base)) {
        (Some(t), Some(m), Some(b)) => angle_at(t, m, b) < threshold_deg,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Handedness;
    use crate::landmarks::tests::hand;

    #[test]
    fn degenerate_triangles_are_straight() {
        let p = Point::new(3, 4);
        let q = Point::new(10, -2);
        assert_eq!(angle_at(p, p, q), 180.0);
        assert_eq!(angle_at(p, q, q), 180.0);
        assert_eq!(angle_at(q, p, q), 180.0);
        assert_eq!(angle_at(p, p, p), 180.0);
    }

    #[test]
    fn right_angle() {
        let a = angle_at(Point::new(1, 0), Point::new(0, 0), Point::new(0, 1));
        assert!((a - 90.0).abs() < 1e-9, "got {a}");
    }

    #[test]
    fn collinear_points_stay_in_domain() {
        // straight line through the vertex
        let a = angle_at(Point::new(0, 0), Point::new(5, 5), Point::new(10, 10));
        assert!((a - 180.0).abs() < 1e-6, "got {a}");
        // folded back onto itself
        let a = angle_at(Point::new(10, 0), Point::new(0, 0), Point::new(5, 0));
        assert!(a.abs() < 1e-6, "got {a}");
    }

    #[test]
    fn bent_needs_all_three_landmarks() {
        let frame = Frame::metadata_only(0, 100, 100);
        let det = DetectionResult {
            hands: vec![hand(Handedness::Right, &[(0.1, 0.0), (0.0, 0.0)])],
        };
        // index 2 missing
        assert!(!is_bent(0, 1, 2, &frame, Hand::Right, &det, 160.0));
        // wrong hand entirely
        assert!(!is_bent(0, 1, 0, &frame, Hand::Left, &det, 160.0));
    }

    #[test]
    fn bend_threshold() {
        let frame = Frame::metadata_only(0, 100, 100);
        // right angle at landmark 1
        let det = DetectionResult {
            hands: vec![hand(
                Handedness::Left,
                &[(0.1, 0.0), (0.0, 0.0), (0.0, 0.1)],
            )],
        };
        assert!(is_bent(0, 1, 2, &frame, Hand::Left, &det, 160.0));
        assert!(!is_bent(0, 1, 2, &frame, Hand::Left, &det, 80.0));

        // straight finger
        let det = DetectionResult {
            hands: vec![hand(
                Handedness::Left,
                &[(0.0, 0.1), (0.0, 0.2), (0.0, 0.3)],
            )],
        };
        assert!(!is_bent(0, 1, 2, &frame, Hand::Left, &det, 160.0));
    }
}
