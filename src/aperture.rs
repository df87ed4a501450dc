//! Aperture list (C2): structural dedup of aperture definitions, D-code
//! assignment starting at 10, and catalog (`%ADD…%`) emission with
//! aperture-function attributes and macro definitions interleaved.

use crate::attribute_value::aperture_function as render_aperture_function;
use crate::attributes::ApertureFunction;
use crate::coordinates::{Angle, Length, Path, Point, Vertex};
use crate::macros::ApertureMacro;

/// The shape an aperture number refers to. Octagons and free-form outlines
/// both compile down to an `Outline` macro aperture; dedup therefore only
/// needs to compare this enum plus the assigned function.
#[derive(Debug, Clone, PartialEq)]
enum Aperture {
    Circle { diameter: Length },
    Rect { x: Length, y: Length },
    Obround { x: Length, y: Length },
    Outline { path: Path },
}

impl Aperture {
    fn definition(&self, macro_name: Option<&str>) -> String {
        match self {
            Aperture::Circle { diameter } => format!("C,{}", diameter.mm_string()),
            Aperture::Rect { x, y } => format!("R,{}X{}", x.mm_string(), y.mm_string()),
            Aperture::Obround { x, y } => format!("O,{}X{}", x.mm_string(), y.mm_string()),
            Aperture::Outline { .. } => macro_name.expect("outline apertures always carry a macro name").to_string(),
        }
    }
}

struct Entry {
    aperture: Aperture,
    function: Option<ApertureFunction>,
    number: u32,
    macro_name: Option<String>,
}

/// Accumulates apertures used while drawing one Gerber file, assigning
/// each distinct `(shape, function)` pair a D-code starting at 10 in
/// first-use order, and rendering the `%ADD…%` catalog.
pub struct ApertureList {
    entries: Vec<Entry>,
    next_number: u32,
    next_macro_index: u32,
}

impl Default for ApertureList {
    fn default() -> Self {
        Self::new()
    }
}

impl ApertureList {
    pub fn new() -> Self {
        ApertureList { entries: Vec::new(), next_number: 10, next_macro_index: 0 }
    }

    fn add(&mut self, aperture: Aperture, function: Option<ApertureFunction>) -> u32 {
        if let Some(existing) =
            self.entries.iter().find(|e| e.aperture == aperture && e.function == function)
        {
            return existing.number;
        }

        let number = self.next_number;
        self.next_number += 1;

        let macro_name = if matches!(aperture, Aperture::Outline { .. }) {
            let name = format!("OUTLINE{}", self.next_macro_index);
            self.next_macro_index += 1;
            Some(name)
        } else {
            None
        };

        self.entries.push(Entry { aperture, function, number, macro_name });
        number
    }

    pub fn add_circle(&mut self, diameter: Length, function: Option<ApertureFunction>) -> u32 {
        self.add(Aperture::Circle { diameter }, function)
    }

    pub fn add_rect(&mut self, x: Length, y: Length, function: Option<ApertureFunction>) -> u32 {
        self.add(Aperture::Rect { x, y }, function)
    }

    /// Collapses to a circle aperture when `x == y`, matching the Gerber
    /// convention that a square-ended obround is degenerate.
    pub fn add_obround(&mut self, x: Length, y: Length, function: Option<ApertureFunction>) -> u32 {
        if x == y {
            return self.add_circle(x, function);
        }
        self.add(Aperture::Obround { x, y }, function)
    }

    pub fn add_octagon(&mut self, diameter: Length, rotation: Angle, function: Option<ApertureFunction>) -> u32 {
        self.add(Aperture::Outline { path: octagon_path(diameter, rotation) }, function)
    }

    /// A custom-shaped aperture from an explicit outline. The path must
    /// already be closed, straight-line-only, and have at least 4 vertices
    /// (3 distinct corners plus the closing point); invalid paths are
    /// logged and skipped rather than producing a malformed macro.
    pub fn add_outline(&mut self, path: Path, function: Option<ApertureFunction>) -> Option<u32> {
        if path.len() < 4 || !path.is_closed() || path.is_curved() {
            log::warn!("add_outline: path is not a valid closed straight-line polygon, skipping aperture");
            return None;
        }
        Some(self.add(Aperture::Outline { path }, function))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the full catalog: each distinct outline macro definition
    /// once, immediately before its first-using `%ADD…%` line, and an
    /// aperture-function attribute comment whenever the function changes
    /// from the previous aperture.
    pub fn generate_string(&self) -> String {
        let mut out = String::new();
        let mut last_function: Option<ApertureFunction> = None;

        for entry in &self.entries {
            if let (Aperture::Outline { path }, Some(name)) = (&entry.aperture, &entry.macro_name) {
                let mac = ApertureMacro::outline(name.clone(), path.clone());
                let mut buf = Vec::new();
                use crate::traits::GerberCode;
                mac.serialize(&mut buf).expect("in-memory serialization is infallible");
                out.push_str(&String::from_utf8(buf).expect("macro body is ASCII"));
            }

            if entry.function != last_function {
                if let Some(f) = entry.function {
                    out.push_str(&render_aperture_function(f).to_gerber_comment());
                }
                last_function = entry.function;
            }

            out.push_str(&format!(
                "%ADD{}{}*%\n",
                entry.number,
                entry.aperture.definition(entry.macro_name.as_deref())
            ));
        }

        out
    }
}

/// A regular octagon's outline, `diameter` being the circumscribed
/// circle's diameter, rotated so that flats align with the X/Y axes at
/// `rotation == 0`.
fn octagon_path(diameter: Length, rotation: Angle) -> Path {
    let r = diameter.as_nm() as f64 / 2.0;
    let mut vertices = Vec::with_capacity(9);
    for i in 0..8 {
        let angle_deg = rotation.as_deg() + 22.5 + 45.0 * i as f64;
        let rad = angle_deg.to_radians();
        let x = (r * rad.cos()).round() as i64;
        let y = (r * rad.sin()).round() as i64;
        vertices.push(Vertex::straight(Point::new(Length::from_nm(x), Length::from_nm(y))));
    }
    vertices.push(vertices[0]);
    Path::new(vertices)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn repeated_circle_reuses_number() {
        let mut list = ApertureList::new();
        let a = list.add_circle(Length::from_nm(1_000_000), None);
        let b = list.add_circle(Length::from_nm(1_000_000), None);
        assert_eq!(a, b);
        assert_eq!(a, 10);
    }

    #[test]
    fn distinct_function_gets_new_number() {
        let mut list = ApertureList::new();
        let a = list.add_circle(Length::from_nm(1_000_000), None);
        let b = list.add_circle(Length::from_nm(1_000_000), Some(ApertureFunction::ViaPad));
        assert_ne!(a, b);
    }

    #[test]
    fn square_obround_collapses_to_circle() {
        let mut list = ApertureList::new();
        let a = list.add_circle(Length::from_nm(500_000), None);
        let b = list.add_obround(Length::from_nm(500_000), Length::from_nm(500_000), None);
        assert_eq!(a, b);
    }

    #[test]
    fn invalid_outline_is_rejected() {
        let mut list = ApertureList::new();
        let too_short = Path::new(vec![
            Vertex::straight(Point::ORIGIN),
            Vertex::straight(Point::new(Length::from_nm(1), Length::from_nm(0))),
        ]);
        assert!(list.add_outline(too_short, None).is_none());
    }

    #[test]
    fn numbering_starts_at_ten_and_increments() {
        let mut list = ApertureList::new();
        let a = list.add_circle(Length::from_nm(1), None);
        let b = list.add_circle(Length::from_nm(2), None);
        assert_eq!(a, 10);
        assert_eq!(b, 11);
    }
}
