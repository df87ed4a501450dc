//! End-to-end export scenarios, driven entirely through the public
//! `Board`/`BoardExporter`/`FabricationSettings` surface: build a board,
//! export it to a scratch directory, and inspect the resulting files.

use std::fs;
use std::path::PathBuf;

use chrono::DateTime;
use uuid::Uuid;

use fabgen::{
    Angle, Board, BoardExporter, BoardSide, Device, FabricationSettings, GenerationSoftware, Hole,
    Length, MountType, NetSegment, Pad, PadShape, Path, Point, ProjectIdentity, Via, ViaShape,
    Vertex,
};

fn mm(v: f64) -> Length {
    Length::from_mm(v).unwrap()
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("fabgen-scenario-{}", name));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

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

fn settings(output_dir: &PathBuf) -> FabricationSettings {
    FabricationSettings::new(
        output_dir.clone(),
        GenerationSoftware::new("acme", "fabgen", Some("0.1.0".to_string())),
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00+00:00").unwrap(),
    )
}

fn empty_board(project_name: &str) -> Board {
    Board {
        project: ProjectIdentity { name: project_name.to_string(), uuid: Uuid::nil(), revision: "A".to_string() },
        copper_layer_count: 1,
        copper_types: vec![],
        outline: rect_outline(mm(30.0), mm(30.0)),
        devices: vec![],
        net_segments: vec![],
        planes: vec![],
        polygons: vec![],
        stroke_texts: vec![],
        holes: vec![],
    }
}

fn read_matching(paths: &[PathBuf], needle: &str) -> String {
    let path = paths
        .iter()
        .find(|p| p.to_string_lossy().contains(needle))
        .unwrap_or_else(|| panic!("no exported file matched {:?} among {:?}", needle, paths));
    fs::read_to_string(path).unwrap()
}

#[test]
fn single_pad_with_no_net_gets_nc_attribute_and_one_aperture() {
    let dir = scratch_dir("single-pad");

    let pad = Pad {
        position: Point::new(mm(10.0), mm(20.0)),
        rotation: Angle::ZERO,
        shape: PadShape::Rect,
        width: mm(1.6),
        height: mm(0.8),
        side: BoardSide::Top,
        drill_diameter: None,
        stop_mask_clearance: mm(0.05),
        solder_paste_clearance: Length::ZERO,
        net_name: None,
        pin_name: "1".to_string(),
    };
    let device = Device {
        reference_designator: "R1".to_string(),
        position: Point::ORIGIN,
        rotation: Angle::ZERO,
        mirrored: false,
        mount_type: MountType::Smt,
        value: "10k".to_string(),
        manufacturer: "Acme".to_string(),
        mpn: "ACM-10K-0603".to_string(),
        footprint_name: "R_0603".to_string(),
        pads: vec![pad],
        graphics: vec![],
        holes: vec![],
    };

    let mut board = empty_board("single-pad");
    board.devices = vec![device];

    let exporter = BoardExporter::new(&board, settings(&dir));
    let paths = exporter.export_all_layers().unwrap();
    let top_cu = read_matching(&paths, "Top_Cu");

    assert_eq!(top_cu.matches("%ADD10R,1.600000X0.800000*%").count(), 1);
    assert_eq!(top_cu.matches("D03*").count(), 1);
    assert!(top_cu.contains("X10000000Y20000000D03*"));
    assert!(top_cu.contains("G04 #@! TO.N,N/C*\n"));
}

#[test]
fn via_with_stop_mask_clearance_expands_the_mask_opening() {
    let dir = scratch_dir("via-mask");

    let via = Via {
        uuid: Uuid::nil(),
        position: Point::ORIGIN,
        outer_diameter: mm(0.6),
        drill_diameter: mm(0.3),
        shape: ViaShape::Round,
        stop_mask_clearance: Some(mm(0.05)),
    };
    let segment = NetSegment { net_name: Some("VCC".to_string()), vias: vec![via], lines: vec![] };

    let mut board = empty_board("via-mask");
    board.net_segments = vec![segment];

    let exporter = BoardExporter::new(&board, settings(&dir));
    let paths = exporter.export_all_layers().unwrap();
    let top_mask = read_matching(&paths, "Top_Mask");

    // 0.6mm outer diameter + 2 * 0.05mm clearance = 0.7mm opening.
    assert!(top_mask.contains("%ADD10C,0.700000*%"));
    assert!(top_mask.contains("X0Y0D03*"));
    assert!(top_mask.contains("G04 #@! TO.N,VCC*\n"));
}

#[test]
fn two_identical_pads_on_the_same_net_share_one_aperture() {
    let dir = scratch_dir("shared-net");

    let make_device = |reference: &str| Device {
        reference_designator: reference.to_string(),
        position: Point::ORIGIN,
        rotation: Angle::ZERO,
        mirrored: false,
        mount_type: MountType::Tht,
        value: "100nF".to_string(),
        manufacturer: "Acme".to_string(),
        mpn: "ACM-CAP".to_string(),
        footprint_name: "C_0805".to_string(),
        pads: vec![Pad {
            position: Point::ORIGIN,
            rotation: Angle::ZERO,
            shape: PadShape::Round,
            width: mm(1.0),
            height: mm(1.0),
            side: BoardSide::Top,
            drill_diameter: Some(mm(0.3)),
            stop_mask_clearance: mm(0.05),
            solder_paste_clearance: Length::ZERO,
            net_name: Some("GND".to_string()),
            pin_name: "1".to_string(),
        }],
        graphics: vec![],
        holes: vec![],
    };

    let mut board = empty_board("shared-net");
    board.devices = vec![make_device("R1"), make_device("R2")];

    let exporter = BoardExporter::new(&board, settings(&dir));
    let paths = exporter.export_all_layers().unwrap();
    let top_cu = read_matching(&paths, "Top_Cu");

    assert_eq!(top_cu.matches("%ADD10C,1.000000*%").count(), 1);
    assert_eq!(top_cu.matches("D03*").count(), 2);
    assert!(top_cu.contains("G04 #@! TO.C,R1*\n"));
    assert!(top_cu.contains("G04 #@! TO.C,R2*\n"));
    // The net is unchanged between the two flashes, so it is only set once.
    assert_eq!(top_cu.matches("TO.N,GND*").count(), 1);
}

#[test]
fn curved_outline_segment_switches_interpolation_mode() {
    let dir = scratch_dir("outline-arc");

    let mut board = empty_board("outline-arc");
    board.outline = Path::new(vec![
        Vertex::arc(Point::new(Length::ZERO, Length::ZERO), Angle::from_deg(90.0)),
        Vertex::straight(Point::new(mm(10.0), mm(10.0))),
        Vertex::straight(Point::new(Length::ZERO, mm(20.0))),
    ]);

    let exporter = BoardExporter::new(&board, settings(&dir));
    let paths = exporter.export_all_layers().unwrap();
    let outlines = read_matching(&paths, "Outlines");

    // 1 micrometre minimum profile stroke width.
    assert!(outlines.contains("%ADD10C,0.001000*%"));

    let move_idx = outlines.find("X0Y0D02*").expect("initial move");
    let arc_mode_idx = outlines.find("G03*").expect("counterclockwise arc mode");
    let arc_line_idx = outlines.find("X10000000Y10000000I").expect("arc interpolation line");
    let linear_mode_idx = outlines[arc_line_idx..].find("G01*").map(|i| i + arc_line_idx).expect("reset to linear");
    let straight_idx = outlines.find("X0Y20000000D01*").expect("final straight segment");

    assert!(move_idx < arc_mode_idx);
    assert!(arc_mode_idx < arc_line_idx);
    assert!(arc_line_idx < linear_mode_idx);
    assert!(linear_mode_idx < straight_idx);
}

#[test]
fn merged_drill_file_lists_plated_then_non_plated_tools() {
    let dir = scratch_dir("merged-drills");

    let via = Via {
        uuid: Uuid::nil(),
        position: Point::new(mm(1.0), mm(1.0)),
        outer_diameter: mm(1.2),
        drill_diameter: mm(0.8),
        shape: ViaShape::Round,
        stop_mask_clearance: None,
    };
    let segment = NetSegment { net_name: Some("GND".to_string()), vias: vec![via], lines: vec![] };

    let mut board = empty_board("merged-drills");
    board.net_segments = vec![segment];
    board.holes = vec![Hole { position: Point::new(mm(5.0), mm(2.0)), diameter: mm(3.2) }];

    let mut export_settings = settings(&dir);
    export_settings.merge_drill_files = true;

    let exporter = BoardExporter::new(&board, export_settings);
    let paths = exporter.export_all_layers().unwrap();
    let drills = read_matching(&paths, "Drills");

    assert!(drills.starts_with("M48\n"));
    assert!(drills.contains("; #@! TA.AperFunction,Plated,PTH,ViaDrill\n"));
    assert!(drills.contains("; #@! TA.AperFunction,NonPlated,NPTH,MechanicalDrill\n"));
    assert!(drills.contains("T1C0.800000\n"));
    assert!(drills.contains("T2C3.200000\n"));
    assert!(drills.contains("T1\nX1.000000Y1.000000\n"));
    assert!(drills.contains("T2\nX5.000000Y2.000000\n"));
    assert!(drills.trim_end().ends_with("M30"));

    let t1_idx = drills.find("T1C0.800000").unwrap();
    let t2_idx = drills.find("T2C3.200000").unwrap();
    assert!(t1_idx < t2_idx, "plated via tool must be listed before the non-plated hole tool");
}

#[test]
fn via_draw_order_is_independent_of_net_segment_storage_order() {
    let via_a = Via {
        uuid: Uuid::from_u128(1),
        position: Point::new(mm(1.0), mm(1.0)),
        outer_diameter: mm(0.6),
        drill_diameter: mm(0.3),
        shape: ViaShape::Round,
        stop_mask_clearance: None,
    };
    let via_b = Via {
        uuid: Uuid::from_u128(2),
        position: Point::new(mm(2.0), mm(2.0)),
        outer_diameter: mm(0.6),
        drill_diameter: mm(0.3),
        shape: ViaShape::Round,
        stop_mask_clearance: None,
    };

    let seg_a = NetSegment { net_name: Some("A".to_string()), vias: vec![via_a.clone()], lines: vec![] };
    let seg_b = NetSegment { net_name: Some("B".to_string()), vias: vec![via_b.clone()], lines: vec![] };

    let dir_forward = scratch_dir("order-forward");
    let mut board_forward = empty_board("order-test");
    board_forward.net_segments = vec![seg_a.clone(), seg_b.clone()];
    let paths_forward =
        BoardExporter::new(&board_forward, settings(&dir_forward)).export_all_layers().unwrap();
    let forward = read_matching(&paths_forward, "Top_Cu");

    let dir_reversed = scratch_dir("order-reversed");
    let mut board_reversed = empty_board("order-test");
    board_reversed.net_segments = vec![seg_b, seg_a];
    let paths_reversed =
        BoardExporter::new(&board_reversed, settings(&dir_reversed)).export_all_layers().unwrap();
    let reversed = read_matching(&paths_reversed, "Top_Cu");

    assert_eq!(forward, reversed);
}
