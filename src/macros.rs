//! Aperture macros: just enough of the Gerber macro language (`%AM…%`) to
//! express a free-form outline aperture (primitive code 4), which is the
//! only macro primitive a fabrication-data exporter needs for custom pad
//! shapes that don't fit the standard circle/rect/obround/octagon
//! templates.

use std::io::Write;

use crate::coordinates::Path;
use crate::errors::GerberResult;
use crate::traits::{GerberCode, PartialGerberCode};

/// A free-form polygon primitive: exposure, vertex count, vertices (as
/// `x,y` pairs relative to the aperture origin), rotation. Always exposure
/// `1` (on) since these are used to define solid pad outlines.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlinePrimitive {
    pub path: Path,
}

impl<W: Write> PartialGerberCode<W> for OutlinePrimitive {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        // Primitive code 4: exposure,#points,x1,y1,...,xn,yn,rotation
        let vertices = &self.path.vertices;
        write!(writer, "4,1,{}", vertices.len().saturating_sub(1))?;
        for v in vertices {
            write!(writer, ",{},{}", v.pos.x.mm_string(), v.pos.y.mm_string())?;
        }
        write!(writer, ",0")?;
        Ok(())
    }
}

/// A named aperture macro: `%AM<name>*\n<primitives>%\n`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApertureMacro {
    pub name: String,
    pub primitive: OutlinePrimitive,
}

impl ApertureMacro {
    pub fn outline(name: impl Into<String>, path: Path) -> Self {
        ApertureMacro { name: name.into(), primitive: OutlinePrimitive { path } }
    }
}

impl<W: Write> GerberCode<W> for ApertureMacro {
    fn serialize(&self, writer: &mut W) -> GerberResult<()> {
        write!(writer, "%AM{}*\n", self.name)?;
        self.primitive.serialize_partial(writer)?;
        write!(writer, "*%\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::coordinates::{Length, Point, Vertex};

    #[test]
    fn macro_name_is_used_verbatim() {
        let path = Path::new(vec![
            Vertex::straight(Point::new(Length::from_nm(0), Length::from_nm(0))),
            Vertex::straight(Point::new(Length::from_nm(1_000_000), Length::from_nm(0))),
            Vertex::straight(Point::new(Length::from_nm(0), Length::from_nm(1_000_000))),
            Vertex::straight(Point::new(Length::from_nm(0), Length::from_nm(0))),
        ]);
        let m = ApertureMacro::outline("OUTLINE0", path);
        let mut buf = Vec::new();
        m.serialize(&mut buf).unwrap();
        let s = String::from_utf8(buf).unwrap();
        assert!(s.starts_with("%AMOUTLINE0*\n"));
        assert!(s.ends_with("*%\n"));
    }
}
