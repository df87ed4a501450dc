//! Excellon drill generator (C5): point drills grouped by tool, with the
//! same X2/X3 file attributes as the Gerber files in the same job.

use std::fs;
use std::path::Path as FsPath;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::attribute_value::{
    self, aperture_function_mixed_plating_drill, file_creation_date, file_generation_software,
    file_part_single, file_project_id, file_same_coordinates,
};
use crate::attributes::{ApertureFunction, FileFunction, GenerationSoftware, Ident, Plating};
use crate::coordinates::{Length, Point};
use crate::errors::{WriteError, WriteResult};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct Tool {
    diameter_nm: i64,
    plated: bool,
    function: ApertureFunction,
}

/// Builds one complete Excellon drill file. Drills are grouped by tool in
/// first-seen order (not sorted by diameter), matching the convention that
/// the tool list should reflect the order holes were actually added.
pub struct ExcellonGenerator {
    file_attributes_header: String,
    plating: Plating,
    from_layer: u32,
    to_layer: u32,
    tool_order: Vec<Tool>,
    drills: std::collections::HashMap<Tool, Vec<Point>>,
}

impl ExcellonGenerator {
    pub fn new(
        creation_date: DateTime<FixedOffset>,
        generation_software: GenerationSoftware,
        project_name: &str,
        project_uuid: Uuid,
        project_revision: &str,
        same_coordinates: Option<Ident>,
        plating: Plating,
        from_layer: u32,
        to_layer: u32,
    ) -> Self {
        let attrs = [
            file_generation_software(&generation_software),
            file_creation_date(creation_date),
            file_project_id(project_name, project_uuid, project_revision),
            file_part_single(),
            file_same_coordinates(same_coordinates.as_ref()),
        ];
        let mut header = String::new();
        for attr in &attrs {
            header.push_str(&attr.to_excellon_comment());
        }
        let function = match plating {
            Plating::NonPlated => FileFunction::NonPlated { from_layer, to_layer, plating },
            Plating::Plated | Plating::Mixed => FileFunction::Plated { from_layer, to_layer, plating },
        };
        header.push_str(&attribute_value::file_function(&function).to_excellon_comment());

        ExcellonGenerator {
            file_attributes_header: header,
            plating,
            from_layer,
            to_layer,
            tool_order: Vec::new(),
            drills: std::collections::HashMap::new(),
        }
    }

    /// Registers one plated or non-plated drill at `position` with the
    /// given finished diameter and aperture function. Drills sharing a
    /// `(diameter, plated, function)` triple are grouped under the same
    /// tool.
    pub fn drill(&mut self, position: Point, diameter: Length, function: ApertureFunction) {
        self.drill_plated(position, diameter, matches!(self.plating, Plating::Plated | Plating::Mixed), function);
    }

    pub fn drill_plated(&mut self, position: Point, diameter: Length, plated: bool, function: ApertureFunction) {
        let tool = Tool { diameter_nm: diameter.as_nm(), plated, function };
        if !self.drills.contains_key(&tool) {
            self.tool_order.push(tool);
        }
        self.drills.entry(tool).or_default().push(position);
    }

    fn print_tool_list(&self) -> String {
        let mut out = String::new();
        for (i, tool) in self.tool_order.iter().enumerate() {
            let number = i + 1;
            let attr = if matches!(self.plating, Plating::Mixed) {
                aperture_function_mixed_plating_drill(tool.plated, tool.function)
            } else {
                attribute_value::aperture_function(tool.function)
            };
            out.push_str(&attr.to_excellon_comment());
            out.push_str(&format!("T{}C{}\n", number, Length::from_nm(tool.diameter_nm).mm_string()));
        }
        out
    }

    fn print_drills(&self) -> String {
        let mut out = String::new();
        for (i, tool) in self.tool_order.iter().enumerate() {
            let number = i + 1;
            out.push_str(&format!("T{}\n", number));
            for pos in &self.drills[tool] {
                out.push_str(&format!("X{}Y{}\n", pos.x.mm_string(), pos.y.mm_string()));
            }
        }
        out
    }

    pub fn generate(&self) -> String {
        let mut out = String::new();
        out.push_str("M48\n");
        out.push_str(&self.file_attributes_header);
        out.push_str("FMAT,2\n");
        out.push_str("METRIC,TZ\n");
        out.push_str(&self.print_tool_list());
        out.push('%');
        out.push('\n');
        out.push_str("G90*\n");
        out.push_str("G05*\n");
        out.push_str("M71*\n");
        out.push_str(&self.print_drills());
        out.push_str("T0\n");
        out.push_str("M30\n");
        out
    }

    pub fn save_to_file(&self, path: &FsPath) -> WriteResult<()> {
        fs::write(path, self.generate()).map_err(|source| WriteError { path: path.to_path_buf(), source })
    }

    pub fn is_empty(&self) -> bool {
        self.tool_order.is_empty()
    }

    pub fn layer_range(&self) -> (u32, u32) {
        (self.from_layer, self.to_layer)
    }

    /// Exposes the accumulated tool groups in first-seen order, for
    /// re-inserting into a merged mixed-plating generator.
    pub fn tools(&self) -> Vec<(Length, bool, ApertureFunction, Vec<Point>)> {
        self.tool_order
            .iter()
            .map(|tool| (Length::from_nm(tool.diameter_nm), tool.plated, tool.function, self.drills[tool].clone()))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn new_generator(plating: Plating) -> ExcellonGenerator {
        let date = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
        let sw = GenerationSoftware::new("acme", "fabgen", None);
        ExcellonGenerator::new(date, sw, "demo", Uuid::nil(), "1", None, plating, 1, 1)
    }

    #[test]
    fn header_has_m48_and_footer_has_m30() {
        let gen = new_generator(Plating::Plated);
        let text = gen.generate();
        assert!(text.starts_with("M48\n"));
        assert!(text.trim_end().ends_with("M30"));
    }

    #[test]
    fn same_tool_reused_across_drills() {
        let mut gen = new_generator(Plating::Plated);
        gen.drill(Point::ORIGIN, Length::from_nm(800_000), ApertureFunction::ViaDrill);
        gen.drill(Point::new(Length::from_nm(1_000_000), Length::from_nm(0)), Length::from_nm(800_000), ApertureFunction::ViaDrill);
        let text = gen.generate();
        assert_eq!(text.matches("T1C0.800000").count(), 1);
        assert_eq!(text.matches("X0.000000Y0.000000").count(), 1);
    }

    #[test]
    fn distinct_diameters_get_distinct_tools() {
        let mut gen = new_generator(Plating::Plated);
        gen.drill(Point::ORIGIN, Length::from_nm(800_000), ApertureFunction::ViaDrill);
        gen.drill(Point::ORIGIN, Length::from_nm(600_000), ApertureFunction::ViaDrill);
        let text = gen.generate();
        assert!(text.contains("T1C0.800000"));
        assert!(text.contains("T2C0.600000"));
    }

    #[test]
    fn non_mixed_tool_list_uses_the_drill_function() {
        let mut gen = new_generator(Plating::NonPlated);
        gen.drill(Point::ORIGIN, Length::from_nm(800_000), ApertureFunction::MechanicalDrill);
        let text = gen.generate();
        assert!(text.contains("; #@! TA.AperFunction,MechanicalDrill\n"));
    }

    #[test]
    fn mixed_tool_list_prefixes_plating_and_hole_type() {
        let mut gen = new_generator(Plating::Mixed);
        gen.drill_plated(Point::ORIGIN, Length::from_nm(800_000), true, ApertureFunction::ComponentDrill);
        gen.drill_plated(Point::new(Length::from_nm(1_000_000), Length::from_nm(0)), Length::from_nm(3_200_000), false, ApertureFunction::MechanicalDrill);
        let text = gen.generate();
        assert!(text.contains("; #@! TA.AperFunction,Plated,PTH,ComponentDrill\n"));
        assert!(text.contains("; #@! TA.AperFunction,NonPlated,NPTH,MechanicalDrill\n"));
    }

    #[test]
    fn empty_drill_list_is_reported() {
        let gen = new_generator(Plating::Plated);
        assert!(gen.is_empty());
    }
}
