//! Fixed-point length and angle types, and the path/vertex data model.
//!
//! `Length` is a signed nanometre count. The Gerber coordinate format is
//! fixed at `%FSLAX66Y66*%` (6 integer + 6 fractional digits), which is
//! exactly nanometres-as-mm, so serializing a coordinate is printing the
//! nanometre count verbatim — no per-format rounding table is needed, unlike
//! a generic Gerber coordinate library that must support arbitrary `n.m`
//! formats.

use std::convert::TryFrom;
use std::fmt;
use std::num::FpCategory;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_rational::Ratio;

use crate::errors::{GerberError, GerberResult};

const NM_PER_MM: i64 = 1_000_000;
const MICRODEG_PER_DEG: i64 = 1_000_000;

/// A signed length in nanometres.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Length {
    nm: i64,
}

impl Length {
    pub const ZERO: Length = Length { nm: 0 };

    pub const fn from_nm(nm: i64) -> Self {
        Length { nm }
    }

    pub fn from_mm(mm: f64) -> GerberResult<Self> {
        match mm.classify() {
            FpCategory::Nan => Err(GerberError::ConversionError("value is NaN".into())),
            FpCategory::Infinite => Err(GerberError::ConversionError("value is infinite".into())),
            FpCategory::Zero | FpCategory::Subnormal => Ok(Length { nm: 0 }),
            FpCategory::Normal => {
                let scaled = mm * NM_PER_MM as f64;
                if !(i64::MIN as f64..=i64::MAX as f64).contains(&scaled) {
                    Err(GerberError::ConversionError("value is out of bounds".into()))
                } else {
                    Ok(Length { nm: scaled.round() as i64 })
                }
            }
        }
    }

    pub const fn as_nm(self) -> i64 {
        self.nm
    }

    pub fn as_mm(self) -> f64 {
        self.nm as f64 / NM_PER_MM as f64
    }

    pub fn is_zero(self) -> bool {
        self.nm == 0
    }

    pub fn abs(self) -> Length {
        Length { nm: self.nm.abs() }
    }

    /// Coordinate as emitted in a Gerber `X`/`Y`/`I`/`J` field: the raw
    /// nanometre integer, since the fixed 6.6 coordinate format is
    /// nanometres-as-mm.
    pub fn gerber_coord(self) -> String {
        self.nm.to_string()
    }

    /// Millimetre string with exactly six fraction digits, used for
    /// aperture definitions (`%ADD10C,1.000000*%`) and Excellon tool/drill
    /// coordinates. Uses exact integer division so there is never float
    /// rounding drift.
    pub fn mm_string(self) -> String {
        let sign = if self.nm < 0 { "-" } else { "" };
        let n = self.nm.unsigned_abs();
        let whole = n / NM_PER_MM as u64;
        let frac = n % NM_PER_MM as u64;
        format!("{}{}.{:06}", sign, whole, frac)
    }
}

impl Add for Length {
    type Output = Length;
    fn add(self, rhs: Length) -> Length {
        Length { nm: self.nm + rhs.nm }
    }
}

impl Sub for Length {
    type Output = Length;
    fn sub(self, rhs: Length) -> Length {
        Length { nm: self.nm - rhs.nm }
    }
}

impl Neg for Length {
    type Output = Length;
    fn neg(self) -> Length {
        Length { nm: -self.nm }
    }
}

impl Mul<i64> for Length {
    type Output = Length;
    fn mul(self, rhs: i64) -> Length {
        Length { nm: self.nm * rhs }
    }
}

impl Div<i64> for Length {
    type Output = Length;
    fn div(self, rhs: i64) -> Length {
        Length { nm: self.nm / rhs }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}mm", self.mm_string())
    }
}

/// A `Length` known to be `> 0`. Callers are expected to have already
/// validated geometry (degeneracies are logged and skipped upstream)
/// before reaching this type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct PositiveLength(Length);

impl PositiveLength {
    pub fn new(length: Length) -> Option<Self> {
        if length.nm > 0 {
            Some(PositiveLength(length))
        } else {
            None
        }
    }

    pub fn get(self) -> Length {
        self.0
    }
}

/// A `Length` known to be `>= 0`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnsignedLength(Length);

impl UnsignedLength {
    pub fn new(length: Length) -> Option<Self> {
        if length.nm >= 0 {
            Some(UnsignedLength(length))
        } else {
            None
        }
    }

    pub fn get(self) -> Length {
        self.0
    }
}

impl From<PositiveLength> for UnsignedLength {
    fn from(value: PositiveLength) -> Self {
        UnsignedLength(value.0)
    }
}

/// A signed angle in micro-degrees.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Angle {
    microdeg: i64,
}

impl Angle {
    pub const ZERO: Angle = Angle { microdeg: 0 };

    pub const fn from_microdeg(microdeg: i64) -> Self {
        Angle { microdeg }
    }

    pub fn from_deg(deg: f64) -> Self {
        Angle { microdeg: (deg * MICRODEG_PER_DEG as f64).round() as i64 }
    }

    pub const fn as_microdeg(self) -> i64 {
        self.microdeg
    }

    pub fn as_deg(self) -> f64 {
        self.microdeg as f64 / MICRODEG_PER_DEG as f64
    }

    pub fn is_zero(self) -> bool {
        self.microdeg == 0
    }

    /// Normalises into `[0, 360)` degrees, as required when comparing
    /// aperture rotations for dedup purposes.
    pub fn normalized(self) -> Angle {
        let full = 360 * MICRODEG_PER_DEG;
        let mut m = self.microdeg % full;
        if m < 0 {
            m += full;
        }
        Angle { microdeg: m }
    }

    /// Decimal-degree string with up to six fraction digits, trailing
    /// zeros trimmed.
    pub fn deg_string(self) -> String {
        let ratio = Ratio::new(self.microdeg, MICRODEG_PER_DEG);
        let whole = ratio.trunc().to_integer();
        let frac_micro = (self.microdeg - whole * MICRODEG_PER_DEG).abs();
        if frac_micro == 0 {
            whole.to_string()
        } else {
            let mut s = format!("{}.{:06}", whole, frac_micro);
            while s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.pop();
            }
            s
        }
    }

    /// Angles within one micro-degree of a grid multiple snap to it, to
    /// absorb accumulated floating-point noise from upstream geometry.
    pub fn round_to_grid(self, multiple: Angle) -> Angle {
        if multiple.microdeg == 0 {
            return self;
        }
        let nearest = ((self.microdeg as f64) / (multiple.microdeg as f64)).round() as i64
            * multiple.microdeg;
        if (nearest - self.microdeg).abs() <= 1 {
            Angle { microdeg: nearest }
        } else {
            self
        }
    }
}

impl Neg for Angle {
    type Output = Angle;
    fn neg(self) -> Angle {
        Angle { microdeg: -self.microdeg }
    }
}

impl TryFrom<f64> for Angle {
    type Error = GerberError;
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        match value.classify() {
            FpCategory::Nan => Err(GerberError::ConversionError("angle is NaN".into())),
            FpCategory::Infinite => Err(GerberError::ConversionError("angle is infinite".into())),
            _ => Ok(Angle::from_deg(value)),
        }
    }
}

/// A point in board-space, nanometre-precise.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Point {
    pub x: Length,
    pub y: Length,
}

impl Point {
    pub const ORIGIN: Point = Point { x: Length::ZERO, y: Length::ZERO };

    pub fn new(x: Length, y: Length) -> Self {
        Point { x, y }
    }

    pub fn translated(self, dx: Length, dy: Length) -> Point {
        Point { x: self.x + dx, y: self.y + dy }
    }

    /// Mirrors across the X axis (negates Y), used for mirrored
    /// footprints/devices.
    pub fn mirrored_horizontal(self) -> Point {
        Point { x: self.x, y: -self.y }
    }

    /// Rotates counterclockwise about the origin, used to place a device's
    /// local footprint geometry into board coordinates.
    pub fn rotated(self, angle: Angle) -> Point {
        if angle.is_zero() {
            return self;
        }
        let rad = angle.as_deg().to_radians();
        let (sin, cos) = rad.sin_cos();
        let x = self.x.as_nm() as f64;
        let y = self.y.as_nm() as f64;
        Point::new(
            Length::from_nm((x * cos - y * sin).round() as i64),
            Length::from_nm((x * sin + y * cos).round() as i64),
        )
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point { x: self.x - rhs.x, y: self.y - rhs.y }
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point { x: self.x + rhs.x, y: self.y + rhs.y }
    }
}

/// One point on a path, with the sweep angle of the arc segment that
/// *starts* at this vertex (zero means the segment to the next vertex is
/// straight).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Vertex {
    pub pos: Point,
    pub bulge: Angle,
}

impl Vertex {
    pub fn straight(pos: Point) -> Self {
        Vertex { pos, bulge: Angle::ZERO }
    }

    pub fn arc(pos: Point, bulge: Angle) -> Self {
        Vertex { pos, bulge }
    }
}

/// An ordered sequence of vertices. Closed iff first and last positions
/// coincide; curved iff any vertex has a non-zero bulge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Path {
    pub vertices: Vec<Vertex>,
}

impl Path {
    pub fn new(vertices: Vec<Vertex>) -> Self {
        Path { vertices }
    }

    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(first), Some(last)) if self.vertices.len() >= 2 => first.pos == last.pos,
            _ => false,
        }
    }

    pub fn is_curved(&self) -> bool {
        self.vertices.iter().any(|v| !v.bulge.is_zero())
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn translated(&self, dx: Length, dy: Length) -> Path {
        Path {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex { pos: v.pos.translated(dx, dy), bulge: v.bulge })
                .collect(),
        }
    }

    pub fn mirrored_horizontal(&self) -> Path {
        Path {
            vertices: self
                .vertices
                .iter()
                .map(|v| Vertex { pos: v.pos.mirrored_horizontal(), bulge: -v.bulge })
                .collect(),
        }
    }

    /// Rotates every vertex counterclockwise about the origin; arc sweeps
    /// are unaffected since rotation preserves them.
    pub fn rotated(&self, angle: Angle) -> Path {
        Path {
            vertices: self.vertices.iter().map(|v| Vertex { pos: v.pos.rotated(angle), bulge: v.bulge }).collect(),
        }
    }

    /// A closed circular path approximated as two half-circle arcs, used
    /// for library footprint circles that need outline/area treatment.
    pub fn circle(center: Point, diameter: Length) -> Path {
        let r = diameter / 2;
        let left = Point::new(center.x - r, center.y);
        let right = Point::new(center.x + r, center.y);
        Path::new(vec![
            Vertex::arc(left, Angle::from_deg(180.0)),
            Vertex::arc(right, Angle::from_deg(180.0)),
            Vertex::straight(left),
        ])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mm_string_six_fraction_digits() {
        assert_eq!(Length::from_nm(1_600_000).mm_string(), "1.600000");
        assert_eq!(Length::from_nm(800_000).mm_string(), "0.800000");
        assert_eq!(Length::from_nm(-12_345).mm_string(), "-0.012345");
        assert_eq!(Length::from_nm(0).mm_string(), "0.000000");
    }

    #[test]
    fn gerber_coord_is_raw_nanometres() {
        assert_eq!(Length::from_nm(10_000_000).gerber_coord(), "10000000");
        assert_eq!(Length::from_nm(-5).gerber_coord(), "-5");
    }

    #[test]
    fn angle_normalizes_into_0_360() {
        assert_eq!(Angle::from_deg(-90.0).normalized().as_deg(), 270.0);
        assert_eq!(Angle::from_deg(370.0).normalized().as_deg(), 10.0);
        assert_eq!(Angle::from_deg(0.0).normalized().as_deg(), 0.0);
    }

    #[test]
    fn deg_string_trims_trailing_zeros() {
        assert_eq!(Angle::from_deg(90.0).deg_string(), "90");
        assert_eq!(Angle::from_deg(45.5).deg_string(), "45.5");
    }

    #[test]
    fn path_closed_detection() {
        let p = Path::new(vec![
            Vertex::straight(Point::new(Length::from_nm(0), Length::from_nm(0))),
            Vertex::straight(Point::new(Length::from_nm(1), Length::from_nm(0))),
            Vertex::straight(Point::new(Length::from_nm(0), Length::from_nm(0))),
        ]);
        assert!(p.is_closed());

        let open = Path::new(vec![
            Vertex::straight(Point::new(Length::from_nm(0), Length::from_nm(0))),
            Vertex::straight(Point::new(Length::from_nm(1), Length::from_nm(0))),
        ]);
        assert!(!open.is_closed());
    }

    #[test]
    fn positive_length_rejects_non_positive() {
        assert!(PositiveLength::new(Length::from_nm(0)).is_none());
        assert!(PositiveLength::new(Length::from_nm(-1)).is_none());
        assert!(PositiveLength::new(Length::from_nm(1)).is_some());
    }
}
