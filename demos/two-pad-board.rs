//! Exports a minimal one-resistor board: two SMT pads on top copper, a
//! rectangular outline, and the corresponding drill/mask/silkscreen set.

use chrono::Utc;
use uuid::Uuid;

use fabgen::{
    Angle, Board, BoardExporter, BoardSide, Device, FabricationSettings,
    GenerationSoftware, Length, MountType, Pad, PadShape, Path, Point, ProjectIdentity, Vertex,
};

fn rect_outline(width: Length, height: Length) -> Path {
    let hw = Length::from_nm(width.as_nm() / 2);
    let hh = Length::from_nm(height.as_nm() / 2);
    Path::new(vec![
        Vertex::straight(Point::new(-hw, -hh)),
        Vertex::straight(Point::new(hw, -hh)),
        Vertex::straight(Point::new(hw, hh)),
        Vertex::straight(Point::new(-hw, hh)),
        Vertex::straight(Point::new(-hw, -hh)),
    ])
}

fn main() {
    env_logger::init();

    let pad_width = Length::from_mm(1.6).unwrap();
    let pad_height = Length::from_mm(1.0).unwrap();
    let pitch = Length::from_mm(3.2).unwrap();
    let half_pitch = Length::from_nm(pitch.as_nm() / 2);

    let r1 = Device {
        reference_designator: "R1".to_string(),
        position: Point::ORIGIN,
        rotation: Angle::from_deg(0.0),
        mirrored: false,
        mount_type: MountType::Smt,
        value: "10k".to_string(),
        manufacturer: "Acme".to_string(),
        mpn: "ACM-10K-0603".to_string(),
        footprint_name: "R_0603".to_string(),
        pads: vec![
            Pad {
                position: Point::new(-half_pitch, Length::ZERO),
                rotation: Angle::from_deg(0.0),
                shape: PadShape::Rect,
                width: pad_width,
                height: pad_height,
                side: BoardSide::Top,
                drill_diameter: None,
                stop_mask_clearance: Length::from_mm(0.05).unwrap(),
                solder_paste_clearance: Length::ZERO,
                net_name: Some("NET1".to_string()),
                pin_name: "1".to_string(),
            },
            Pad {
                position: Point::new(half_pitch, Length::ZERO),
                rotation: Angle::from_deg(0.0),
                shape: PadShape::Rect,
                width: pad_width,
                height: pad_height,
                side: BoardSide::Top,
                drill_diameter: None,
                stop_mask_clearance: Length::from_mm(0.05).unwrap(),
                solder_paste_clearance: Length::ZERO,
                net_name: Some("NET2".to_string()),
                pin_name: "2".to_string(),
            },
        ],
        graphics: vec![],
        holes: vec![],
    };

    let board = Board {
        project: ProjectIdentity { name: "demo-board".to_string(), uuid: Uuid::new_v4(), revision: "A".to_string() },
        copper_layer_count: 2,
        copper_types: vec![],
        outline: rect_outline(Length::from_mm(10.0).unwrap(), Length::from_mm(8.0).unwrap()),
        devices: vec![r1],
        net_segments: vec![],
        planes: vec![],
        polygons: vec![],
        stroke_texts: vec![],
        holes: vec![],
    };

    let settings = FabricationSettings::new(
        "./demo-output",
        GenerationSoftware::new("acme", "fabgen", Some(env!("CARGO_PKG_VERSION").to_string())),
        Utc::now().into(),
    );

    let exporter = BoardExporter::new(&board, settings);
    let paths = exporter.export_all_layers().expect("export failed");
    for path in paths {
        println!("wrote {}", path.display());
    }
}
