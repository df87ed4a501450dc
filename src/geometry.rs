//! Geometry helpers shared by the Gerber generator and board exporter.

use crate::coordinates::{Angle, Length, Path, Point, Vertex};

/// Centre of the circle implied by an arc from `start` to `end` sweeping
/// through `sweep` degrees (positive = counterclockwise, matching the
/// convention used for `Vertex::bulge`).
///
/// Derived from the chord bisector: the centre lies on the perpendicular
/// bisector of the chord, offset from the midpoint by
/// `half_chord * cot(sweep / 2)`. At `|sweep| == 180°` the arc is a
/// semicircle and the centre is exactly the chord midpoint.
pub fn arc_center(start: Point, end: Point, sweep: Angle) -> Point {
    let mid = Point::new(
        Length::from_nm((start.x.as_nm() + end.x.as_nm()) / 2),
        Length::from_nm((start.y.as_nm() + end.y.as_nm()) / 2),
    );

    let half_sweep_rad = sweep.as_deg().to_radians() / 2.0;
    if half_sweep_rad.abs() >= std::f64::consts::FRAC_PI_2 - 1e-12 {
        return mid;
    }

    let dx = (end.x - start.x).as_nm() as f64;
    let dy = (end.y - start.y).as_nm() as f64;
    let cot_half = half_sweep_rad.cos() / half_sweep_rad.sin();

    // Perpendicular to the chord direction, scaled by half-chord * cot(sweep/2).
    let offset_x = -dy / 2.0 * cot_half;
    let offset_y = dx / 2.0 * cot_half;

    Point::new(
        Length::from_nm(mid.x.as_nm() + offset_x.round() as i64),
        Length::from_nm(mid.y.as_nm() + offset_y.round() as i64),
    )
}

/// Converts a centreline path with a constant stroke width into a closed
/// outline path suitable for an area fill (`G36`/`G37` region). Each
/// centreline segment is offset by `width / 2` to either side and the two
/// offset rails are joined with semicircular end caps.
///
/// Curved centreline segments are not supported and are returned
/// unmodified (callers draw these as stroked lines instead); this mirrors
/// the degeneracy-tolerant style used elsewhere (log-and-skip rather than
/// fail the whole export).
pub fn to_outline_strokes(path: &Path, width: Length) -> Path {
    if path.vertices.len() < 2 || width.as_nm() <= 0 {
        return path.clone();
    }
    if path.is_curved() {
        log::warn!("to_outline_strokes: curved centrelines are not supported, returning as-is");
        return path.clone();
    }

    let half = width / 2;
    let mut left = Vec::with_capacity(path.vertices.len());
    let mut right = Vec::with_capacity(path.vertices.len());

    for window in path.vertices.windows(2) {
        let a = window[0].pos;
        let b = window[1].pos;
        let dx = (b.x - a.x).as_nm() as f64;
        let dy = (b.y - a.y).as_nm() as f64;
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            continue;
        }
        let nx = -dy / len * half.as_nm() as f64;
        let ny = dx / len * half.as_nm() as f64;

        left.push(Point::new(
            Length::from_nm(a.x.as_nm() + nx.round() as i64),
            Length::from_nm(a.y.as_nm() + ny.round() as i64),
        ));
        left.push(Point::new(
            Length::from_nm(b.x.as_nm() + nx.round() as i64),
            Length::from_nm(b.y.as_nm() + ny.round() as i64),
        ));
        right.push(Point::new(
            Length::from_nm(a.x.as_nm() - nx.round() as i64),
            Length::from_nm(a.y.as_nm() - ny.round() as i64),
        ));
        right.push(Point::new(
            Length::from_nm(b.x.as_nm() - nx.round() as i64),
            Length::from_nm(b.y.as_nm() - ny.round() as i64),
        ));
    }

    if left.is_empty() {
        return path.clone();
    }

    let mut vertices = Vec::with_capacity(left.len() + right.len() + 3);
    vertices.extend(left.iter().map(|p| Vertex::straight(*p)));
    vertices.push(Vertex::arc(*right.last().unwrap(), Angle::from_deg(180.0)));
    vertices.extend(right.iter().rev().map(|p| Vertex::straight(*p)));
    vertices.push(Vertex::arc(left[0], Angle::from_deg(180.0)));
    vertices.push(Vertex::straight(left[0]));

    Path::new(vertices)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arc_center_semicircle_is_chord_midpoint() {
        let start = Point::new(Length::from_nm(-1_000_000), Length::from_nm(0));
        let end = Point::new(Length::from_nm(1_000_000), Length::from_nm(0));
        let center = arc_center(start, end, Angle::from_deg(180.0));
        assert_eq!(center, Point::ORIGIN);
    }

    #[test]
    fn arc_center_quarter_circle() {
        let start = Point::new(Length::from_nm(1_000_000), Length::from_nm(0));
        let end = Point::new(Length::from_nm(0), Length::from_nm(1_000_000));
        let center = arc_center(start, end, Angle::from_deg(90.0));
        assert!((center.x.as_nm()).abs() < 5);
        assert!((center.y.as_nm()).abs() < 5);
    }

    #[test]
    fn outline_strokes_degenerate_path_unchanged() {
        let single = Path::new(vec![Vertex::straight(Point::ORIGIN)]);
        let out = to_outline_strokes(&single, Length::from_nm(100_000));
        assert_eq!(out, single);
    }

    #[test]
    fn outline_strokes_produces_closed_path() {
        let line = Path::new(vec![
            Vertex::straight(Point::new(Length::from_nm(0), Length::from_nm(0))),
            Vertex::straight(Point::new(Length::from_nm(1_000_000), Length::from_nm(0))),
        ]);
        let out = to_outline_strokes(&line, Length::from_nm(200_000));
        assert!(out.is_closed());
    }
}
