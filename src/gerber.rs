//! Gerber (RS-274X) generator (C4): the per-file state machine that turns
//! draw/flash calls into a complete `%FS…%`…`M02*` Gerber program with
//! X2/X3 attributes and an aperture catalog.

use std::fs;
use std::path::Path as FsPath;

use chrono::{DateTime, FixedOffset};
use md5::{Digest, Md5};
use uuid::Uuid;

use crate::aperture::ApertureList;
use crate::attribute_value::{
    self, file_creation_date, file_generation_software, file_md5, file_part_single,
    file_project_id, file_same_coordinates, Attribute,
};
use crate::attribute_writer::AttributeWriter;
use crate::attributes::{ApertureFunction, FileFunction, FilePolarity, GenerationSoftware, Ident};
use crate::coordinates::{Angle, Length, Path, Point};
use crate::errors::{GerberResult, WriteError, WriteResult};
use crate::geometry::arc_center;

/// Region-mode fills still select a small circular aperture before `G36`,
/// even though Gerber readers must ignore the current aperture inside a
/// region. Some CAM tools misbehave without one selected.
const REGION_APERTURE_DIAMETER_NM: i64 = 10_000;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum InterpolationMode {
    Linear,
    ClockwiseCircular,
    CounterclockwiseCircular,
}

/// Builds one complete Gerber layer file.
pub struct GerberGenerator {
    file_attributes: Vec<Attribute>,
    file_function: Option<FileFunction>,
    file_polarity: Option<FilePolarity>,
    apertures: ApertureList,
    attribute_writer: AttributeWriter,
    content: String,
    current_aperture: Option<u32>,
    interpolation_mode: Option<InterpolationMode>,
    region_mode: bool,
    position: Point,
}

impl GerberGenerator {
    pub fn new(
        creation_date: DateTime<FixedOffset>,
        generation_software: GenerationSoftware,
        project_name: &str,
        project_uuid: Uuid,
        project_revision: &str,
        same_coordinates: Option<Ident>,
    ) -> Self {
        let file_attributes = vec![
            file_generation_software(&generation_software),
            file_creation_date(creation_date),
            file_project_id(project_name, project_uuid, project_revision),
            file_part_single(),
            file_same_coordinates(same_coordinates.as_ref()),
        ];

        GerberGenerator {
            file_attributes,
            file_function: None,
            file_polarity: None,
            apertures: ApertureList::new(),
            attribute_writer: AttributeWriter::new(),
            content: String::new(),
            current_aperture: None,
            interpolation_mode: Some(InterpolationMode::Linear),
            region_mode: false,
            position: Point::ORIGIN,
        }
    }

    pub fn set_file_function(&mut self, function: FileFunction) {
        self.file_function = Some(function);
    }

    pub fn set_layer_polarity(&mut self, polarity: FilePolarity) {
        self.file_polarity = Some(polarity);
    }

    /// Emits a mid-stream `%LPD*%`/`%LPC*%` load-polarity command: every
    /// region/flash drawn after this switches dark/clear until the next
    /// call. Used to clip silkscreen by stopmask geometry within one file.
    pub fn set_image_polarity(&mut self, polarity: FilePolarity) {
        self.content.push_str(match polarity {
            FilePolarity::Positive => "%LPD*%\n",
            FilePolarity::Negative => "%LPC*%\n",
        });
    }

    fn set_current_attributes(&mut self, attrs: &[Attribute]) {
        for line in self.attribute_writer.diff(attrs) {
            self.content.push_str(&line);
        }
    }

    fn set_current_aperture(&mut self, number: u32) {
        if self.current_aperture != Some(number) {
            self.content.push_str(&format!("D{}*\n", number));
            self.current_aperture = Some(number);
        }
    }

    fn set_region_mode(&mut self, on: bool) {
        if self.region_mode != on {
            self.content.push_str(if on { "G36*\n" } else { "G37*\n" });
            self.region_mode = on;
        }
    }

    fn switch_interpolation_mode(&mut self, mode: InterpolationMode) {
        if self.interpolation_mode != Some(mode) {
            let code = match mode {
                InterpolationMode::Linear => "G01*\n",
                InterpolationMode::ClockwiseCircular => "G02*\n",
                InterpolationMode::CounterclockwiseCircular => "G03*\n",
            };
            self.content.push_str(code);
            self.interpolation_mode = Some(mode);
        }
    }

    fn move_to(&mut self, to: Point) {
        self.content.push_str(&format!(
            "X{}Y{}D02*\n",
            to.x.gerber_coord(),
            to.y.gerber_coord()
        ));
        self.position = to;
    }

    /// Interpolates from the current position to `to`. `bulge` is the
    /// sweep angle of the arc segment starting at the current position;
    /// zero draws a straight line. Always leaves interpolation mode back
    /// at `Linear` afterwards, matching the "default to G01" convention
    /// used throughout this format.
    fn interpolate_to(&mut self, to: Point, bulge: Angle) {
        if bulge.is_zero() {
            self.switch_interpolation_mode(InterpolationMode::Linear);
            self.content.push_str(&format!(
                "X{}Y{}D01*\n",
                to.x.gerber_coord(),
                to.y.gerber_coord()
            ));
        } else {
            let mode = if bulge.as_microdeg() < 0 {
                InterpolationMode::ClockwiseCircular
            } else {
                InterpolationMode::CounterclockwiseCircular
            };
            self.switch_interpolation_mode(mode);
            let center = arc_center(self.position, to, bulge);
            let i = center.x - self.position.x;
            let j = center.y - self.position.y;
            self.content.push_str(&format!(
                "X{}Y{}I{}J{}D01*\n",
                to.x.gerber_coord(),
                to.y.gerber_coord(),
                i.gerber_coord(),
                j.gerber_coord()
            ));
            self.switch_interpolation_mode(InterpolationMode::Linear);
        }
        self.position = to;
    }

    fn flash_at(&mut self, pos: Point) {
        self.content.push_str(&format!(
            "X{}Y{}D03*\n",
            pos.x.gerber_coord(),
            pos.y.gerber_coord()
        ));
        self.position = pos;
    }

    /// Strokes a (possibly curved) centreline path with a round aperture
    /// of the given width.
    pub fn draw_path_stroke(&mut self, path: &Path, width: Length, function: Option<ApertureFunction>, attrs: &[Attribute]) {
        if path.is_empty() {
            return;
        }
        self.set_current_attributes(attrs);
        let number = self.apertures.add_circle(width, function);
        self.set_current_aperture(number);
        self.move_to(path.vertices[0].pos);
        for w in path.vertices.windows(2) {
            self.interpolate_to(w[1].pos, w[0].bulge);
        }
    }

    /// Fills a closed path as a region (`G36`/`G37`), with no stroke
    /// aperture (the current aperture is left untouched — regions don't
    /// use one).
    pub fn draw_path_area(&mut self, path: &Path, function: Option<ApertureFunction>, attrs: &[Attribute]) {
        if path.len() < 3 {
            log::warn!("draw_path_area: path has fewer than 3 vertices, skipping");
            return;
        }
        let mut full_attrs = attrs.to_vec();
        if let Some(f) = function {
            full_attrs.push(attribute_value::aperture_function(f));
        }
        self.set_current_attributes(&full_attrs);
        let compat_aperture = self.apertures.add_circle(Length::from_nm(REGION_APERTURE_DIAMETER_NM), None);
        self.set_current_aperture(compat_aperture);
        self.set_region_mode(true);
        self.move_to(path.vertices[0].pos);
        for w in path.vertices.windows(2) {
            self.interpolate_to(w[1].pos, w[0].bulge);
        }
        self.set_region_mode(false);
    }

    pub fn draw_component_outline(&mut self, path: &Path, line_width: Length, attrs: &[Attribute]) {
        self.draw_path_stroke(path, line_width, Some(ApertureFunction::ComponentOutline), attrs);
    }

    pub fn flash_circle(&mut self, pos: Point, diameter: Length, function: Option<ApertureFunction>, attrs: &[Attribute]) {
        self.set_current_attributes(attrs);
        let number = self.apertures.add_circle(diameter, function);
        self.set_current_aperture(number);
        self.flash_at(pos);
    }

    pub fn flash_rect(&mut self, pos: Point, x: Length, y: Length, rotation: Angle, function: Option<ApertureFunction>, attrs: &[Attribute]) {
        self.set_current_attributes(attrs);
        let number = if rotation.normalized().is_zero() {
            self.apertures.add_rect(x, y, function)
        } else {
            self.apertures
                .add_outline(rotated_rect_path(x, y, rotation), function)
                .expect("a well-formed rectangle always produces a valid outline")
        };
        self.set_current_aperture(number);
        self.flash_at(pos);
    }

    pub fn flash_obround(&mut self, pos: Point, x: Length, y: Length, function: Option<ApertureFunction>, attrs: &[Attribute]) {
        self.set_current_attributes(attrs);
        let number = self.apertures.add_obround(x, y, function);
        self.set_current_aperture(number);
        self.flash_at(pos);
    }

    pub fn flash_octagon(&mut self, pos: Point, diameter: Length, rotation: Angle, function: Option<ApertureFunction>, attrs: &[Attribute]) {
        self.set_current_attributes(attrs);
        let number = self.apertures.add_octagon(diameter, rotation, function);
        self.set_current_aperture(number);
        self.flash_at(pos);
    }

    pub fn flash_component(&mut self, pos: Point, marker_diameter: Length, attrs: &[Attribute]) {
        self.flash_circle(pos, marker_diameter, Some(ApertureFunction::ComponentMain), attrs);
    }

    pub fn flash_component_pin(&mut self, pos: Point, marker_diameter: Length, attrs: &[Attribute]) {
        self.flash_circle(pos, marker_diameter, Some(ApertureFunction::ComponentPin), attrs);
    }

    /// Assembles the header, aperture catalog, body and footer into the
    /// final Gerber text, computing the `%TF.MD5%` digest over the body
    /// with all newlines stripped (matching the convention that the
    /// checksum must be stable across CRLF/LF transcoding).
    pub fn generate(&self) -> GerberResult<String> {
        let mut out = String::new();

        for attr in &self.file_attributes {
            out.push_str(&attr.to_gerber_comment());
        }
        if let Some(function) = &self.file_function {
            out.push_str(&attribute_value::file_function(function).to_gerber_comment());
        }
        if let Some(polarity) = &self.file_polarity {
            let attr = match polarity {
                FilePolarity::Positive => attribute_value::file_polarity_positive(),
                FilePolarity::Negative => attribute_value::file_polarity_negative(),
            };
            out.push_str(&attr.to_gerber_comment());
        }

        out.push_str("%FSLAX66Y66*%\n");
        out.push_str("%MOMM*%\n");
        out.push_str("G01*\n");
        out.push_str("G75*\n");
        out.push_str(&self.apertures.generate_string());
        out.push_str(&self.content);

        let stripped: String = out.chars().filter(|&c| c != '\n').collect();
        let digest = md5_hex(stripped.as_bytes());
        out.push_str(&file_md5(&digest).to_gerber_comment());
        out.push_str("M02*\n");

        Ok(out)
    }

    pub fn save_to_file(&self, path: &FsPath) -> WriteResult<()> {
        let text = self.generate().expect("in-memory generation never fails");
        fs::write(path, text).map_err(|source| WriteError { path: path.to_path_buf(), source })
    }
}

fn rotated_rect_path(x: Length, y: Length, rotation: Angle) -> Path {
    use crate::coordinates::Vertex;
    let hx = x.as_nm() as f64 / 2.0;
    let hy = y.as_nm() as f64 / 2.0;
    let rad = rotation.as_deg().to_radians();
    let (sin, cos) = rad.sin_cos();
    let corners = [(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy), (-hx, -hy)];
    let vertices = corners
        .iter()
        .map(|&(cx, cy)| {
            let rx = cx * cos - cy * sin;
            let ry = cx * sin + cy * cos;
            Vertex::straight(Point::new(Length::from_nm(rx.round() as i64), Length::from_nm(ry.round() as i64)))
        })
        .collect();
    Path::new(vertices)
}

/// Hex-encoded MD5 digest for the `%TF.MD5%` file-integrity attribute.
fn md5_hex(input: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(input);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn md5_of_empty_string_matches_known_value() {
        assert_eq!(md5_hex(b""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn md5_of_abc_matches_known_value() {
        assert_eq!(md5_hex(b"abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    fn software() -> GenerationSoftware {
        GenerationSoftware::new("acme", "fabgen", Some("0.1.0".to_string()))
    }

    fn new_generator() -> GerberGenerator {
        let date = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        GerberGenerator::new(date, software(), "demo", Uuid::nil(), "1", None)
    }

    #[test]
    fn generated_file_ends_with_md5_and_m02() {
        let gen = new_generator();
        let text = gen.generate().unwrap();
        assert!(text.contains("%TF.MD5,"));
        assert!(text.trim_end().ends_with("M02*"));
    }

    #[test]
    fn flash_circle_assigns_and_reuses_aperture() {
        let mut gen = new_generator();
        gen.flash_circle(Point::ORIGIN, Length::from_nm(500_000), None, &[]);
        gen.flash_circle(Point::new(Length::from_nm(1_000_000), Length::from_nm(0)), Length::from_nm(500_000), None, &[]);
        let text = gen.generate().unwrap();
        assert_eq!(text.matches("%ADD10C,0.500000*%").count(), 1);
        assert_eq!(text.matches("D10*").count(), 1);
    }

    #[test]
    fn straight_line_uses_g01_and_d01() {
        let mut gen = new_generator();
        let path = Path::new(vec![
            crate::coordinates::Vertex::straight(Point::ORIGIN),
            crate::coordinates::Vertex::straight(Point::new(Length::from_nm(1_000_000), Length::from_nm(0))),
        ]);
        gen.draw_path_stroke(&path, Length::from_nm(100_000), None, &[]);
        assert!(gen.content.contains("G01*"));
        assert!(gen.content.contains("D01*"));
    }
}
