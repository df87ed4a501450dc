//! Board fabrication exporter (C6): orchestrates one `GerberGenerator` or
//! `ExcellonGenerator` per output file, walking the board model in the
//! fixed order devices → net segments (vias + net lines) → planes →
//! polygons → stroke texts for every copper/mask/silkscreen/paste layer.

use std::path::PathBuf;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::attribute_value::{component_footprint, component_manufacturer, component_mount_type, component_mpn, component_value, object_component, object_net, object_pin};
use crate::attribute_value::Attribute;
use crate::attributes::{ApertureFunction, CopperPos, CopperType, FileFunction, FilePolarity, Plating, Side};
use crate::board::{Board, BoardSide, Device, DeviceGraphicLayer, DeviceGraphicShape, PadShape, PolygonLayer, ViaShape};
use crate::coordinates::Length;
use crate::errors::WriteResult;
use crate::excellon::ExcellonGenerator;
use crate::gerber::GerberGenerator;
use crate::attributes::GenerationSoftware;

/// User-facing export configuration (§6.4). Each `suffix_*` is appended to
/// `output_base_path` and may contain the placeholders `{{PROJECT}}`,
/// `{{BOARD}}`, and (inner copper only) `{{CU_LAYER}}`.
pub struct FabricationSettings {
    pub output_base_path: PathBuf,
    pub suffix_drills: String,
    pub suffix_drills_pth: String,
    pub suffix_drills_npth: String,
    pub suffix_outlines: String,
    pub suffix_copper_top: String,
    pub suffix_copper_bot: String,
    pub suffix_copper_inner: String,
    pub suffix_solder_mask_top: String,
    pub suffix_solder_mask_bot: String,
    pub suffix_silkscreen_top: String,
    pub suffix_silkscreen_bot: String,
    pub suffix_solder_paste_top: String,
    pub suffix_solder_paste_bot: String,
    pub merge_drill_files: bool,
    /// Source layer ids contributing to the top/bottom legend. An empty
    /// list means the corresponding silkscreen file is not emitted.
    pub silkscreen_layers_top: Vec<String>,
    pub silkscreen_layers_bot: Vec<String>,
    pub enable_solder_paste_top: bool,
    pub enable_solder_paste_bot: bool,
    pub generation_software: GenerationSoftware,
    pub creation_date: DateTime<FixedOffset>,
}

impl FabricationSettings {
    pub fn new(output_base_path: impl Into<PathBuf>, generation_software: GenerationSoftware, creation_date: DateTime<FixedOffset>) -> Self {
        FabricationSettings {
            output_base_path: output_base_path.into(),
            suffix_drills: "{{PROJECT}}_Drills.drl".to_string(),
            suffix_drills_pth: "{{PROJECT}}_Drills-PTH.drl".to_string(),
            suffix_drills_npth: "{{PROJECT}}_Drills-NPTH.drl".to_string(),
            suffix_outlines: "{{PROJECT}}_Outlines.gbr".to_string(),
            suffix_copper_top: "{{PROJECT}}_Top_Cu.gbr".to_string(),
            suffix_copper_bot: "{{PROJECT}}_Bottom_Cu.gbr".to_string(),
            suffix_copper_inner: "{{PROJECT}}_In{{CU_LAYER}}_Cu.gbr".to_string(),
            suffix_solder_mask_top: "{{PROJECT}}_Top_Mask.gbr".to_string(),
            suffix_solder_mask_bot: "{{PROJECT}}_Bottom_Mask.gbr".to_string(),
            suffix_silkscreen_top: "{{PROJECT}}_Top_Silkscreen.gbr".to_string(),
            suffix_silkscreen_bot: "{{PROJECT}}_Bottom_Silkscreen.gbr".to_string(),
            suffix_solder_paste_top: "{{PROJECT}}_Top_Paste.gbr".to_string(),
            suffix_solder_paste_bot: "{{PROJECT}}_Bottom_Paste.gbr".to_string(),
            merge_drill_files: false,
            silkscreen_layers_top: vec!["TopLegend".to_string()],
            silkscreen_layers_bot: vec!["BotLegend".to_string()],
            enable_solder_paste_top: true,
            enable_solder_paste_bot: true,
            generation_software,
            creation_date,
        }
    }

    /// Substitutes `{{PROJECT}}`/`{{BOARD}}`/`{{CU_LAYER}}`, sanitizing
    /// each substituted value (not the literal suffix text around it),
    /// then resolves against `output_base_path`.
    fn resolve_path(&self, project_name: &str, suffix: &str, cu_layer: Option<u32>) -> PathBuf {
        let sanitized_project = sanitize_filename(project_name);
        let mut resolved = suffix.replace("{{PROJECT}}", &sanitized_project).replace("{{BOARD}}", &sanitized_project);
        if let Some(layer) = cu_layer {
            resolved = resolved.replace("{{CU_LAYER}}", &layer.to_string());
        }
        self.output_base_path.join(resolved)
    }
}

/// Strips characters that are unsafe in a filename on common filesystems.
fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

pub struct BoardExporter<'a> {
    board: &'a Board,
    settings: FabricationSettings,
}

impl<'a> BoardExporter<'a> {
    pub fn new(board: &'a Board, settings: FabricationSettings) -> Self {
        BoardExporter { board, settings }
    }

    fn same_coordinates(&self) -> Option<crate::attributes::Ident> {
        None
    }

    fn new_gerber(&self) -> GerberGenerator {
        GerberGenerator::new(
            self.settings.creation_date,
            self.settings.generation_software.clone(),
            &self.board.project.name,
            self.board.project.uuid,
            &self.board.project.revision,
            self.same_coordinates(),
        )
    }

    fn object_attrs_for_pad(&self, pad: &crate::board::Pad, device: &crate::board::Device) -> Vec<Attribute> {
        let mut attrs = Vec::new();
        match &pad.net_name {
            Some(net) => attrs.push(object_net(net)),
            None => attrs.push(object_net("N/C")),
        }
        attrs.push(object_component(&device.reference_designator));
        if !pad.pin_name.is_empty() {
            attrs.push(object_pin(&device.reference_designator, &pad.pin_name));
        }
        attrs.push(component_value(&device.value));
        attrs.push(component_mount_type(device.mount_type));
        attrs.push(component_manufacturer(&device.manufacturer));
        attrs.push(component_mpn(&device.mpn));
        attrs.push(component_footprint(&device.footprint_name));
        attrs
    }

    fn object_attrs_for_device(&self, device: &Device) -> Vec<Attribute> {
        vec![
            object_component(&device.reference_designator),
            component_value(&device.value),
            component_mount_type(device.mount_type),
            component_manufacturer(&device.manufacturer),
            component_mpn(&device.mpn),
            component_footprint(&device.footprint_name),
        ]
    }

    /// Draws every footprint graphic tagged `target` (after accounting for
    /// the owning device's `mirrored` flag), world-transformed by the
    /// device's position/rotation/mirror (§4.6.2 item 1).
    fn draw_device_graphics(&self, gen: &mut GerberGenerator, target: DeviceGraphicLayer, function: Option<ApertureFunction>) {
        for device in &self.board.devices {
            let attrs = self.object_attrs_for_device(device);
            for graphic in &device.graphics {
                let effective = if device.mirrored { graphic.layer.mirrored() } else { graphic.layer };
                if effective != target {
                    continue;
                }
                match &graphic.shape {
                    DeviceGraphicShape::Outline(path) => {
                        gen.draw_path_stroke(&transform_path(path, device), graphic.line_width, function, &attrs);
                    }
                    DeviceGraphicShape::Area(path) => {
                        gen.draw_path_area(&transform_path(path, device), function, &attrs);
                    }
                    DeviceGraphicShape::Circle { center, diameter } => {
                        let circle = crate::coordinates::Path::circle(transform_point(*center, device), *diameter);
                        gen.draw_path_stroke(&circle, graphic.line_width, function, &attrs);
                    }
                }
            }
        }
    }

    /// Draws the board profile: the outline path itself, plus any
    /// board-level polygons tagged `BoardOutline` (cutouts, slots), both
    /// at the 1 µm minimum stroke width.
    fn draw_outline_layer(&self, gen: &mut GerberGenerator) {
        const OUTLINE_MIN_WIDTH_NM: i64 = 1_000;
        let width = Length::from_nm(OUTLINE_MIN_WIDTH_NM);
        gen.draw_path_stroke(&self.board.outline, width, Some(ApertureFunction::Profile), &[]);
        for polygon in &self.board.polygons {
            if !matches!(polygon.layer, PolygonLayer::BoardOutline) {
                continue;
            }
            let line_width = if polygon.line_width.as_nm() > OUTLINE_MIN_WIDTH_NM {
                polygon.line_width
            } else {
                width
            };
            if !polygon.filled {
                gen.draw_path_stroke(&polygon.path, line_width, Some(ApertureFunction::Profile), &[]);
            } else if polygon.path.is_closed() {
                gen.draw_path_area(&polygon.path, Some(ApertureFunction::Profile), &[]);
            }
        }
    }

    /// Draws all devices, net segments, planes, polygons and stroke texts
    /// that belong on `side`'s copper layer (or the board-outline profile
    /// when `side` is `None`).
    fn draw_copper_layer(&self, gen: &mut GerberGenerator, side: Option<BoardSide>) {
        if let Some(side) = side {
            let target = match side {
                BoardSide::Top => DeviceGraphicLayer::CopperTop,
                BoardSide::Bottom => DeviceGraphicLayer::CopperBottom,
            };
            self.draw_device_graphics(gen, target, Some(ApertureFunction::Conductor));

            for device in &self.board.devices {
                for pad in &device.pads {
                    if pad.side != side {
                        continue;
                    }
                    let attrs = self.object_attrs_for_pad(pad, device);
                    let function = if pad.drill_diameter.is_some() {
                        Some(ApertureFunction::ComponentPad)
                    } else {
                        Some(ApertureFunction::SmdPadCopperDefined)
                    };
                    self.flash_pad(gen, pad, function, &attrs);
                }
            }
        }

        let mut vias: Vec<&crate::board::Via> =
            self.board.net_segments.iter().flat_map(|seg| seg.vias.iter()).collect();
        vias.sort_by_key(|v| v.uuid);
        for via in vias {
            let attrs = vec![attribute_net_for_via(&self.board, via)];
            self.flash_via(gen, via, &attrs);
        }

        for seg in &self.board.net_segments {
            let attrs = match &seg.net_name {
                Some(n) => vec![object_net(n)],
                None => vec![object_net("N/C")],
            };
            for line in &seg.lines {
                let path = crate::coordinates::Path::new(vec![
                    crate::coordinates::Vertex::straight(line.start),
                    crate::coordinates::Vertex::straight(line.end),
                ]);
                gen.draw_path_stroke(&path, line.width, Some(ApertureFunction::Conductor), &attrs);
            }
        }

        for plane in &self.board.planes {
            let attrs: Vec<Attribute> = match &plane.net_name {
                Some(n) => vec![object_net(n)],
                None => Vec::new(),
            };
            for fragment in &plane.fragments {
                gen.draw_path_area(fragment, Some(ApertureFunction::Conductor), &attrs);
            }
        }

        for polygon in &self.board.polygons {
            if !matches!(polygon.layer, PolygonLayer::Copper) {
                continue;
            }
            if polygon.filled {
                gen.draw_path_area(&polygon.path, Some(ApertureFunction::Conductor), &[object_net("")]);
            } else {
                gen.draw_path_stroke(&polygon.path, polygon.line_width, Some(ApertureFunction::Conductor), &[object_net("")]);
            }
        }

        for text in &self.board.stroke_texts {
            gen.draw_path_stroke(&text.path, text.line_width, Some(ApertureFunction::NonConductor), &[]);
        }
    }

    fn flash_pad(&self, gen: &mut GerberGenerator, pad: &crate::board::Pad, function: Option<ApertureFunction>, attrs: &[Attribute]) {
        match pad.shape {
            PadShape::Round => gen.flash_circle(pad.position, pad.width, function, attrs),
            PadShape::Rect => gen.flash_rect(pad.position, pad.width, pad.height, pad.rotation, function, attrs),
            PadShape::Obround => gen.flash_obround(pad.position, pad.width, pad.height, function, attrs),
            PadShape::Octagon => gen.flash_octagon(pad.position, pad.width, pad.rotation, function, attrs),
        }
    }

    fn flash_via(&self, gen: &mut GerberGenerator, via: &crate::board::Via, attrs: &[Attribute]) {
        match via.shape {
            ViaShape::Round => gen.flash_circle(via.position, via.outer_diameter, Some(ApertureFunction::ViaPad), attrs),
            ViaShape::Square => gen.flash_rect(via.position, via.outer_diameter, via.outer_diameter, crate::coordinates::Angle::ZERO, Some(ApertureFunction::ViaPad), attrs),
            ViaShape::Octagon => gen.flash_octagon(via.position, via.outer_diameter, crate::coordinates::Angle::ZERO, Some(ApertureFunction::ViaPad), attrs),
        }
    }

    fn draw_mask_layer(&self, gen: &mut GerberGenerator, side: BoardSide, is_paste: bool) {
        for device in &self.board.devices {
            for pad in &device.pads {
                if pad.side != side {
                    continue;
                }
                // Paste clearance shrinks the opening; mask clearance expands it.
                let (clearance, sign): (Length, i64) = if is_paste {
                    (pad.solder_paste_clearance, -1)
                } else {
                    (pad.stop_mask_clearance, 1)
                };
                let width = pad.width + clearance * sign * 2;
                let height = pad.height + clearance * sign * 2;
                if width.as_nm() <= 0 || height.as_nm() <= 0 {
                    log::warn!("draw_mask_layer: pad opening collapses to zero size, skipping");
                    continue;
                }
                let mut expanded = pad.clone();
                expanded.width = width;
                expanded.height = height;
                let attrs = self.object_attrs_for_pad(pad, device);
                self.flash_pad(gen, &expanded, None, &attrs);
            }
        }

        if !is_paste {
            for via in self.board.net_segments.iter().flat_map(|s| s.vias.iter()) {
                if let Some(clearance) = via.stop_mask_clearance {
                    let diameter = via.outer_diameter + clearance * 2;
                    let attrs = [attribute_net_for_via(self.board, via)];
                    gen.flash_circle(via.position, diameter, None, &attrs);
                }
            }
        }
    }

    fn export_layer(&self, suffix: &str, cu_layer: Option<u32>, function: FileFunction, draw: impl FnOnce(&mut GerberGenerator)) -> WriteResult<PathBuf> {
        let mut gen = self.new_gerber();
        gen.set_file_function(function);
        draw(&mut gen);
        let path = self.settings.resolve_path(&self.board.project.name, suffix, cu_layer);
        gen.save_to_file(&path)?;
        Ok(path)
    }

    fn export_drills(&self) -> WriteResult<Vec<PathBuf>> {
        let mut paths = Vec::new();
        let mut plated = self.new_excellon(Plating::Plated);
        let mut non_plated = self.new_excellon(Plating::NonPlated);

        for device in &self.board.devices {
            for pad in &device.pads {
                if let Some(diameter) = pad.drill_diameter {
                    plated.drill(pad.position, diameter, ApertureFunction::ComponentDrill);
                }
            }
        }
        for via in self.board.net_segments.iter().flat_map(|s| s.vias.iter()) {
            plated.drill(via.position, via.drill_diameter, ApertureFunction::ViaDrill);
        }
        for device in &self.board.devices {
            for hole in &device.holes {
                non_plated.drill(transform_point(hole.position, device), hole.diameter, ApertureFunction::MechanicalDrill);
            }
        }
        for hole in &self.board.holes {
            non_plated.drill(hole.position, hole.diameter, ApertureFunction::MechanicalDrill);
        }

        if self.settings.merge_drill_files {
            let mut merged = self.new_excellon(Plating::Mixed);
            for (diameter, is_plated, function, positions) in plated.tools() {
                for pos in positions {
                    merged.drill_plated(pos, diameter, is_plated, function);
                }
            }
            for (diameter, is_plated, function, positions) in non_plated.tools() {
                for pos in positions {
                    merged.drill_plated(pos, diameter, is_plated, function);
                }
            }
            if !merged.is_empty() {
                let path = self.settings.resolve_path(&self.board.project.name, &self.settings.suffix_drills, None);
                merged.save_to_file(&path)?;
                paths.push(path);
            }
        } else {
            if !plated.is_empty() {
                let path = self.settings.resolve_path(&self.board.project.name, &self.settings.suffix_drills_pth, None);
                plated.save_to_file(&path)?;
                paths.push(path);
            }
            if !non_plated.is_empty() {
                let path = self.settings.resolve_path(&self.board.project.name, &self.settings.suffix_drills_npth, None);
                non_plated.save_to_file(&path)?;
                paths.push(path);
            }
        }

        Ok(paths)
    }

    fn new_excellon(&self, plating: Plating) -> ExcellonGenerator {
        ExcellonGenerator::new(
            self.settings.creation_date,
            self.settings.generation_software.clone(),
            &self.board.project.name,
            self.board.project.uuid,
            &self.board.project.revision,
            self.same_coordinates(),
            plating,
            1,
            self.board.copper_layer_count,
        )
    }

    /// Exports every file in the fixed order: drills, outline, copper
    /// (top, inner 1..N, bottom), soldermask (top, bottom), silkscreen
    /// (top, bottom — only for a non-empty `silkscreen_layers_*` list),
    /// solderpaste (top, bottom — only if the matching `enable_solder_paste_*`
    /// flag is set).
    pub fn export_all_layers(&self) -> WriteResult<Vec<PathBuf>> {
        let mut paths = self.export_drills()?;

        paths.push(self.export_layer(&self.settings.suffix_outlines, None, FileFunction::Profile(Plating::Plated), |gen| {
            self.draw_outline_layer(gen);
        })?);

        paths.push(self.export_layer(
            &self.settings.suffix_copper_top,
            None,
            FileFunction::Copper { layer: 1, pos: CopperPos::Top, copper_type: Some(CopperType::Mixed) },
            |gen| {
                gen.set_layer_polarity(FilePolarity::Positive);
                self.draw_copper_layer(gen, Some(BoardSide::Top));
            },
        )?);

        for inner in 1..self.board.copper_layer_count.saturating_sub(1) {
            let layer_number = inner + 1;
            paths.push(self.export_layer(
                &self.settings.suffix_copper_inner,
                Some(layer_number),
                FileFunction::Copper { layer: layer_number, pos: CopperPos::Inner, copper_type: Some(CopperType::Mixed) },
                |gen| {
                    gen.set_layer_polarity(FilePolarity::Positive);
                    self.draw_copper_layer(gen, None);
                },
            )?);
        }

        if self.board.copper_layer_count >= 2 {
            paths.push(self.export_layer(
                &self.settings.suffix_copper_bot,
                None,
                FileFunction::Copper { layer: self.board.copper_layer_count, pos: CopperPos::Bottom, copper_type: Some(CopperType::Mixed) },
                |gen| {
                    gen.set_layer_polarity(FilePolarity::Positive);
                    self.draw_copper_layer(gen, Some(BoardSide::Bottom));
                },
            )?);
        }

        paths.push(self.export_layer(
            &self.settings.suffix_solder_mask_top,
            None,
            FileFunction::SolderMask { pos: Side::Top, index: None },
            |gen| {
                gen.set_layer_polarity(FilePolarity::Negative);
                self.draw_mask_layer(gen, BoardSide::Top, false);
            },
        )?);
        paths.push(self.export_layer(
            &self.settings.suffix_solder_mask_bot,
            None,
            FileFunction::SolderMask { pos: Side::Bottom, index: None },
            |gen| {
                gen.set_layer_polarity(FilePolarity::Negative);
                self.draw_mask_layer(gen, BoardSide::Bottom, false);
            },
        )?);

        if !self.settings.silkscreen_layers_top.is_empty() {
            paths.push(self.export_layer(
                &self.settings.suffix_silkscreen_top,
                None,
                FileFunction::Legend { pos: Side::Top, index: None },
                |gen| {
                    gen.set_layer_polarity(FilePolarity::Positive);
                    self.draw_device_graphics(gen, DeviceGraphicLayer::SilkscreenTop, Some(ApertureFunction::ComponentOutline));
                    for text in &self.board.stroke_texts {
                        gen.draw_path_stroke(&text.path, text.line_width, None, &[]);
                    }
                    gen.set_image_polarity(FilePolarity::Negative);
                    self.draw_mask_layer(gen, BoardSide::Top, false);
                },
            )?);
        }
        if !self.settings.silkscreen_layers_bot.is_empty() {
            paths.push(self.export_layer(
                &self.settings.suffix_silkscreen_bot,
                None,
                FileFunction::Legend { pos: Side::Bottom, index: None },
                |gen| {
                    gen.set_layer_polarity(FilePolarity::Positive);
                    self.draw_device_graphics(gen, DeviceGraphicLayer::SilkscreenBottom, Some(ApertureFunction::ComponentOutline));
                    gen.set_image_polarity(FilePolarity::Negative);
                    self.draw_mask_layer(gen, BoardSide::Bottom, false);
                },
            )?);
        }

        if self.settings.enable_solder_paste_top {
            paths.push(self.export_layer(
                &self.settings.suffix_solder_paste_top,
                None,
                FileFunction::Paste(Side::Top),
                |gen| {
                    gen.set_layer_polarity(FilePolarity::Positive);
                    self.draw_mask_layer(gen, BoardSide::Top, true);
                },
            )?);
        }
        if self.settings.enable_solder_paste_bot {
            paths.push(self.export_layer(
                &self.settings.suffix_solder_paste_bot,
                None,
                FileFunction::Paste(Side::Bottom),
                |gen| {
                    gen.set_layer_polarity(FilePolarity::Positive);
                    self.draw_mask_layer(gen, BoardSide::Bottom, true);
                },
            )?);
        }

        Ok(paths)
    }
}

/// World-transforms a device-local path: mirror, then rotate, then
/// translate by the device's placement.
fn transform_path(path: &crate::coordinates::Path, device: &Device) -> crate::coordinates::Path {
    let mut p = if device.mirrored { path.mirrored_horizontal() } else { path.clone() };
    p = p.rotated(device.rotation);
    p.translated(device.position.x, device.position.y)
}

fn transform_point(point: crate::coordinates::Point, device: &Device) -> crate::coordinates::Point {
    let p = if device.mirrored { point.mirrored_horizontal() } else { point };
    p.rotated(device.rotation).translated(device.position.x, device.position.y)
}

fn attribute_net_for_via(board: &Board, via: &crate::board::Via) -> Attribute {
    let net = board
        .net_segments
        .iter()
        .find(|seg| seg.vias.iter().any(|v| v.uuid == via.uuid))
        .and_then(|seg| seg.net_name.clone())
        .unwrap_or_else(|| "N/C".to_string());
    object_net(&net)
}

