//! Board model (assumed external collaborator, §1/§4.6): the plain data
//! this crate's exporter consumes. A real caller builds this from its own
//! board/schematic representation; it is not this crate's job to edit or
//! validate board geometry beyond what export needs.

use uuid::Uuid;

use crate::attributes::{CopperType, MountType};
use crate::coordinates::{Angle, Length, Path, Point};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PadShape {
    Round,
    Rect,
    Obround,
    Octagon,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoardSide {
    Top,
    Bottom,
}

/// One copper pad belonging to a device footprint.
#[derive(Debug, Clone, PartialEq)]
pub struct Pad {
    pub position: Point,
    pub rotation: Angle,
    pub shape: PadShape,
    pub width: Length,
    pub height: Length,
    pub side: BoardSide,
    /// `None` for a pure SMT pad; `Some(diameter)` for a THT pad with a
    /// drilled hole.
    pub drill_diameter: Option<Length>,
    pub stop_mask_clearance: Length,
    pub solder_paste_clearance: Length,
    pub net_name: Option<String>,
    pub pin_name: String,
}

/// Which side/stack a device footprint graphic targets, before accounting
/// for the owning device's `mirrored` flag (§4.6.2 item 1: "mirrored
/// devices address the mirrored layer id").
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeviceGraphicLayer {
    CopperTop,
    CopperBottom,
    SilkscreenTop,
    SilkscreenBottom,
}

impl DeviceGraphicLayer {
    pub fn mirrored(self) -> DeviceGraphicLayer {
        match self {
            DeviceGraphicLayer::CopperTop => DeviceGraphicLayer::CopperBottom,
            DeviceGraphicLayer::CopperBottom => DeviceGraphicLayer::CopperTop,
            DeviceGraphicLayer::SilkscreenTop => DeviceGraphicLayer::SilkscreenBottom,
            DeviceGraphicLayer::SilkscreenBottom => DeviceGraphicLayer::SilkscreenTop,
        }
    }
}

/// One footprint-library primitive, in device-local coordinates. The
/// exporter world-transforms these by the owning device's
/// position/rotation/mirror before drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceGraphicShape {
    /// An open or closed centreline, drawn as a stroke.
    Outline(Path),
    /// A closed, filled polygon.
    Area(Path),
    /// A circle, drawn as a stroked outline (never a filled flash).
    Circle { center: Point, diameter: Length },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceGraphic {
    pub layer: DeviceGraphicLayer,
    pub shape: DeviceGraphicShape,
    pub line_width: Length,
}

/// A placed component instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub reference_designator: String,
    pub position: Point,
    pub rotation: Angle,
    pub mirrored: bool,
    pub mount_type: MountType,
    pub value: String,
    pub manufacturer: String,
    pub mpn: String,
    pub footprint_name: String,
    pub pads: Vec<Pad>,
    /// Footprint silkscreen/courtyard/assembly graphics, in local
    /// (pre-transform) coordinates.
    pub graphics: Vec<DeviceGraphic>,
    /// Footprint-defined non-plated holes (e.g. mounting holes), in local
    /// (pre-transform) coordinates.
    pub holes: Vec<Hole>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViaShape {
    Round,
    Square,
    Octagon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Via {
    pub uuid: Uuid,
    pub position: Point,
    pub outer_diameter: Length,
    pub drill_diameter: Length,
    pub shape: ViaShape,
    pub stop_mask_clearance: Option<Length>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetLine {
    pub start: Point,
    pub end: Point,
    pub width: Length,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NetSegment {
    pub net_name: Option<String>,
    pub vias: Vec<Via>,
    pub lines: Vec<NetLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub fragments: Vec<Path>,
    pub net_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolygonLayer {
    BoardOutline,
    Copper,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    pub layer: PolygonLayer,
    pub path: Path,
    pub line_width: Length,
    pub filled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeText {
    pub path: Path,
    pub line_width: Length,
}

/// An unplated structural hole (not associated with a pad or via).
#[derive(Debug, Clone, PartialEq)]
pub struct Hole {
    pub position: Point,
    pub diameter: Length,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectIdentity {
    pub name: String,
    pub uuid: Uuid,
    pub revision: String,
}

/// The board contents the exporter walks to produce each layer file.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub project: ProjectIdentity,
    pub copper_layer_count: u32,
    pub copper_types: Vec<CopperType>,
    pub outline: Path,
    pub devices: Vec<Device>,
    pub net_segments: Vec<NetSegment>,
    pub planes: Vec<Plane>,
    pub polygons: Vec<Polygon>,
    pub stroke_texts: Vec<StrokeText>,
    pub holes: Vec<Hole>,
}
