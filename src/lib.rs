//! # fabgen
//!
//! A Gerber (RS-274X) and Excellon drill emission core for PCB fabrication
//! data, built around the X2/X3 attribute extensions.
//!
//! The crate is organized bottom-up:
//!
//! - [`coordinates`] and [`geometry`] hold the fixed-point data model:
//!   nanometre lengths, micro-degree angles, points, and the vertex/arc
//!   path representation shared by every layer.
//! - [`attributes`] and [`attribute_value`] define the X2/X3 attribute
//!   vocabulary and its string encoding rules.
//! - [`attribute_writer`] tracks which attributes are currently "set" on a
//!   generator and emits the minimal diff (`TO.`/`TD.`) needed to move to
//!   a new set.
//! - [`aperture`] and [`macros`] handle aperture deduplication, D-code
//!   assignment, and macro-backed apertures (rotated rectangles, regular
//!   octagons).
//! - [`gerber`] and [`excellon`] are the two file-format state machines.
//! - [`board`] is the plain data model a caller supplies; [`exporter`]
//!   walks it and drives the two generators to produce a complete set of
//!   fabrication files.
//!
//! [`errors`] holds the crate's error types and [`traits`] the
//! serialization traits ([`GerberCode`] for a complete line/block,
//! [`PartialGerberCode`] for an embeddable fragment) that every emitted
//! type implements.

mod aperture;
mod attribute_value;
mod attribute_writer;
mod attributes;
mod board;
mod coordinates;
mod errors;
mod excellon;
mod exporter;
mod geometry;
mod gerber;
mod macros;
mod traits;

pub use crate::attributes::{
    ApertureFunction, CopperPos, CopperType, FileFunction, FilePolarity, GenerationSoftware, Ident,
    MountType, Plating, Side,
};
pub use crate::board::{
    Board, BoardSide, Device, DeviceGraphic, DeviceGraphicLayer, DeviceGraphicShape, Hole,
    NetLine, NetSegment, Pad, PadShape, Plane, Polygon, PolygonLayer, ProjectIdentity, StrokeText,
    Via, ViaShape,
};
pub use crate::coordinates::{Angle, Length, Path, Point, PositiveLength, UnsignedLength, Vertex};
pub use crate::errors::{GerberError, GerberResult, WriteError, WriteResult};
pub use crate::excellon::ExcellonGenerator;
pub use crate::exporter::{BoardExporter, FabricationSettings};
pub use crate::gerber::GerberGenerator;
pub use crate::traits::{GerberCode, PartialGerberCode};
pub use uuid::Uuid;
