//! Attribute value vocabularies: file-level, aperture-level and object-level
//! enums, and the small supporting types they're built from.
//!
//! These are scoped to the functions a fabrication-data exporter actually
//! emits (copper/mask/paste/legend/profile/drill file functions; via/pad/
//! conductor aperture functions), not the full X2/X3 vocabulary.

use std::io::Write;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::errors::GerberResult;
use crate::traits::PartialGerberCode;

/// Identifies a project, board or net by either a stable UUID or a plain
/// name, used for `%TF.SameCoordinates%`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ident {
    Uuid(Uuid),
    Name(String),
}

impl<W: Write> PartialGerberCode<W> for Ident {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            Ident::Uuid(guid) => write!(writer, "{}", guid)?,
            Ident::Name(value) => write!(writer, "{}", value)?,
        }
        Ok(())
    }
}

/// `%TF.GenerationSoftware,<vendor>,<application>,<version>*%`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSoftware {
    pub vendor: String,
    pub application: String,
    pub version: Option<String>,
}

impl GenerationSoftware {
    pub fn new(vendor: impl Into<String>, application: impl Into<String>, version: Option<String>) -> Self {
        GenerationSoftware { vendor: vendor.into(), application: application.into(), version }
    }
}

impl<W: Write> PartialGerberCode<W> for GenerationSoftware {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        write!(writer, "{},{}", self.vendor, self.application)?;
        if let Some(ref v) = self.version {
            write!(writer, ",{}", v)?;
        }
        Ok(())
    }
}

/// Board side for mask/legend/paste/component file functions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    Top,
    Bottom,
}

impl<W: Write> PartialGerberCode<W> for Side {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            Side::Top => write!(writer, "Top")?,
            Side::Bottom => write!(writer, "Bot")?,
        }
        Ok(())
    }
}

/// Copper-layer position: top, an inner layer, or bottom.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CopperPos {
    Top,
    Inner,
    Bottom,
}

impl<W: Write> PartialGerberCode<W> for CopperPos {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            CopperPos::Top => write!(writer, "Top")?,
            CopperPos::Inner => write!(writer, "Inr")?,
            CopperPos::Bottom => write!(writer, "Bot")?,
        }
        Ok(())
    }
}

/// Whether a copper layer is a dedicated plane, routed signals, or both.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CopperType {
    Plane,
    Signal,
    Mixed,
    Hatched,
}

impl<W: Write> PartialGerberCode<W> for CopperType {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            CopperType::Plane => write!(writer, "Plane")?,
            CopperType::Signal => write!(writer, "Signal")?,
            CopperType::Mixed => write!(writer, "Mixed")?,
            CopperType::Hatched => write!(writer, "Hatched")?,
        }
        Ok(())
    }
}

/// Drill/profile plating state. `Mixed` only applies to the Excellon
/// file-function attribute (a file holding both plated and non-plated
/// holes); the Gerber profile attribute only ever uses `Plated`/`NonPlated`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Plating {
    Plated,
    NonPlated,
    Mixed,
}

impl<W: Write> PartialGerberCode<W> for Plating {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            Plating::Plated => write!(writer, "PTH")?,
            Plating::NonPlated => write!(writer, "NPTH")?,
            Plating::Mixed => write!(writer, "Mixed")?,
        }
        Ok(())
    }
}

/// How a component is mounted, for `.CMnt` object attributes.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MountType {
    Tht,
    Smt,
    Fiducial,
    Other,
}

impl<W: Write> PartialGerberCode<W> for MountType {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            MountType::Tht => write!(writer, "TH")?,
            MountType::Smt => write!(writer, "SMD")?,
            MountType::Fiducial => write!(writer, "Fiducial")?,
            MountType::Other => write!(writer, "Other")?,
        }
        Ok(())
    }
}

/// `%TF.FilePolarity,(Positive|Negative)*%`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilePolarity {
    Positive,
    Negative,
}

impl<W: Write> PartialGerberCode<W> for FilePolarity {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            FilePolarity::Positive => write!(writer, "Positive")?,
            FilePolarity::Negative => write!(writer, "Negative")?,
        }
        Ok(())
    }
}

/// `%TF.FileFunction,<args>*%`, scoped to the functions this exporter emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileFunction {
    Copper { layer: u32, pos: CopperPos, copper_type: Option<CopperType> },
    Plated { from_layer: u32, to_layer: u32, plating: Plating },
    NonPlated { from_layer: u32, to_layer: u32, plating: Plating },
    Profile(Plating),
    SolderMask { pos: Side, index: Option<u32> },
    Legend { pos: Side, index: Option<u32> },
    Paste(Side),
    Component { layer: u32, pos: Side },
}

impl<W: Write> PartialGerberCode<W> for FileFunction {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        match self {
            FileFunction::Copper { layer, pos, copper_type } => {
                write!(writer, "Copper,L{},", layer)?;
                pos.serialize_partial(writer)?;
                if let Some(t) = copper_type {
                    write!(writer, ",")?;
                    t.serialize_partial(writer)?;
                }
            }
            FileFunction::Plated { from_layer, to_layer, plating } => {
                write!(writer, "Plated,{},{},", from_layer, to_layer)?;
                plating.serialize_partial(writer)?;
            }
            FileFunction::NonPlated { from_layer, to_layer, plating } => {
                write!(writer, "NonPlated,{},{},", from_layer, to_layer)?;
                plating.serialize_partial(writer)?;
            }
            FileFunction::Profile(plating) => {
                write!(writer, "Profile,")?;
                plating.serialize_partial(writer)?;
            }
            FileFunction::SolderMask { pos, index } => {
                write!(writer, "Soldermask,")?;
                pos.serialize_partial(writer)?;
                if let Some(i) = index {
                    write!(writer, ",{}", i)?;
                }
            }
            FileFunction::Legend { pos, index } => {
                write!(writer, "Legend,")?;
                pos.serialize_partial(writer)?;
                if let Some(i) = index {
                    write!(writer, ",{}", i)?;
                }
            }
            FileFunction::Paste(pos) => {
                write!(writer, "Paste,")?;
                pos.serialize_partial(writer)?;
            }
            FileFunction::Component { layer, pos } => {
                write!(writer, "Component,L{},", layer)?;
                pos.serialize_partial(writer)?;
            }
        }
        Ok(())
    }
}

/// Aperture-function vocabulary, scoped to what a board exporter flashes:
/// drill/rout apertures, copper pads, and assembly/component-outline
/// flashes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ApertureFunction {
    Profile,
    ViaDrill,
    ComponentDrill,
    MechanicalDrill,
    Conductor,
    NonConductor,
    ComponentPad,
    SmdPadCopperDefined,
    SmdPadSolderMaskDefined,
    ViaPad,
    ComponentMain,
    ComponentPin,
    ComponentOutline,
}

impl<W: Write> PartialGerberCode<W> for ApertureFunction {
    fn serialize_partial(&self, writer: &mut W) -> GerberResult<()> {
        let s = match self {
            ApertureFunction::Profile => "Profile",
            ApertureFunction::ViaDrill => "ViaDrill",
            ApertureFunction::ComponentDrill => "ComponentDrill",
            ApertureFunction::MechanicalDrill => "MechanicalDrill",
            ApertureFunction::Conductor => "Conductor",
            ApertureFunction::NonConductor => "NonConductor",
            ApertureFunction::ComponentPad => "ComponentPad",
            ApertureFunction::SmdPadCopperDefined => "SMDPad,CuDef",
            ApertureFunction::SmdPadSolderMaskDefined => "SMDPad,SMDef",
            ApertureFunction::ViaPad => "ViaPad",
            ApertureFunction::ComponentMain => "ComponentMain",
            ApertureFunction::ComponentPin => "ComponentPin",
            ApertureFunction::ComponentOutline => "ComponentOutline,Body",
        };
        write!(writer, "{}", s)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn render<W: Write>(item: &dyn PartialGerberCode<Vec<u8>>) -> String {
        let mut buf = Vec::new();
        item.serialize_partial(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn copper_file_function_renders() {
        let f = FileFunction::Copper { layer: 1, pos: CopperPos::Top, copper_type: Some(CopperType::Signal) };
        assert_eq!(render::<Vec<u8>>(&f), "Copper,L1,Top,Signal");
    }

    #[test]
    fn profile_file_function_renders() {
        assert_eq!(render::<Vec<u8>>(&FileFunction::Profile(Plating::Plated)), "Profile,PTH");
    }

    #[test]
    fn aperture_function_renders() {
        assert_eq!(render::<Vec<u8>>(&ApertureFunction::ViaDrill), "ViaDrill");
        assert_eq!(
            render::<Vec<u8>>(&ApertureFunction::SmdPadCopperDefined),
            "SMDPad,CuDef"
        );
    }

    #[test]
    fn date_type_alias_compiles() {
        let _: DateTime<FixedOffset> = DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap();
    }
}
