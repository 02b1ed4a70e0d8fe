mod common;

use std::fs;

use common::{assert_close, gray_jpeg, rgb_jpeg, scan_data_offset};
use dctscope_core::api::inspect::{prepare, InspectOptions};
use dctscope_core::{
    dump_all, extract_component, AbsentBlockPolicy, BlockSlot, BlockSource, DctError,
    DecodeSession, ErrorCategory,
};
use tempfile::tempdir;

#[test]
fn uniform_gray_has_uniform_dc_plane() {
    let jpeg = gray_jpeg(32, 16, 100, |_, _| 200);
    let session = DecodeSession::from_jpeg(&jpeg).expect("Failed to decode fixture");

    assert_eq!((session.width(), session.height()), (32, 16));
    assert_eq!(session.component_count(), 1);
    let luma = session.component(0).unwrap();
    assert_eq!((luma.width_in_blocks, luma.height_in_blocks), (4, 2));
    assert_eq!(session.quant_table(0).unwrap().dc(), 1);

    let plane = extract_component(&session, 0, AbsentBlockPolicy::Fail).unwrap();
    assert_eq!((plane.width(), plane.height()), (4, 2));
    for &sample in plane.samples() {
        assert_close(sample, 200, 2);
    }
}

#[test]
fn dc_plane_follows_block_means() {
    // left half dark, right half bright, split on a block boundary
    let jpeg = gray_jpeg(16, 8, 100, |x, _| if x < 8 { 40 } else { 220 });
    let session = DecodeSession::from_jpeg(&jpeg).unwrap();

    let plane = extract_component(&session, 0, AbsentBlockPolicy::Fail).unwrap();
    assert_close(plane.get(0, 0), 40, 2);
    assert_close(plane.get(1, 0), 220, 2);
}

#[test]
fn color_jpeg_has_three_aligned_planes() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let input = temp_dir.path().join("gray-rgb.jpg");
    fs::write(&input, rgb_jpeg(16, 16, 100, [90, 90, 90])).unwrap();

    let report = prepare()
        .with_jpeg(&input)
        .into_output_folder(temp_dir.path().join("out"))
        .execute()
        .expect("Failed to inspect JPEG");

    let names: Vec<&str> = report.planes.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["y", "cb", "cr"]);
    for plane in &report.planes {
        assert_eq!((plane.image.width(), plane.image.height()), (2, 2));
    }

    // a neutral color has no chroma
    assert_close(report.planes[0].image.get(1, 1), 90, 2);
    assert_close(report.planes[1].image.get(0, 0), 128, 2);
    assert_close(report.planes[2].image.get(0, 0), 128, 2);

    // pgm and jpg per plane, no dump by default
    assert_eq!(report.written.len(), 6);
    assert!(report.dump.is_none());
    for file in ["gray-rgb_y.pgm", "gray-rgb_cb_dc.jpg", "gray-rgb_cr.pgm"] {
        assert!(temp_dir.path().join("out").join(file).exists(), "{} missing", file);
    }
}

#[test]
fn pgm_artifact_holds_the_dc_plane() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let input = temp_dir.path().join("ramp.jpg");
    fs::write(&input, gray_jpeg(24, 8, 100, |x, _| (x / 8 * 100) as u8)).unwrap();

    let report = prepare()
        .with_jpeg(&input)
        .into_output_folder(temp_dir.path())
        .with_options(InspectOptions {
            write_jpeg: false,
            ..InspectOptions::default()
        })
        .execute()
        .unwrap();
    assert_eq!(report.written, vec![temp_dir.path().join("ramp_y.pgm")]);

    let pgm = image::open(temp_dir.path().join("ramp_y.pgm"))
        .unwrap()
        .to_luma8();
    assert_eq!(pgm.dimensions(), (3, 1));
    assert_eq!(pgm.as_raw().as_slice(), report.planes[0].image.samples());
}

#[test]
fn coefficient_dump_lists_every_block() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let input = temp_dir.path().join("checker.jpg");
    fs::write(
        &input,
        gray_jpeg(16, 16, 90, |x, y| if (x + y) % 2 == 0 { 0 } else { 255 }),
    )
    .unwrap();

    let report = prepare()
        .with_jpeg(&input)
        .into_output_folder(temp_dir.path())
        .with_options(InspectOptions {
            write_pgm: false,
            write_jpeg: false,
            dump_coefficients: true,
            ..InspectOptions::default()
        })
        .execute()
        .unwrap();

    let dump = report.dump.expect("dump was requested");
    assert_eq!(dump.emitted, 4);
    assert_eq!(dump.skipped(), 0);

    let text = fs::read_to_string(temp_dir.path().join("checker_coefficients.txt")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 1 + 4 + 1);
    assert_eq!(lines[0], "component 0 y 2x2 blocks");
    for record in &lines[1..5] {
        assert_eq!(record.split_whitespace().count(), 64);
        assert!(record.split_whitespace().all(|v| v.parse::<i16>().is_ok()));
    }
    assert_eq!(lines[5], "skipped 0 blocks (0 absent, 0 in unavailable rows)");

    // a checkerboard has energy in the highest frequency, the last zigzag position
    let last: i16 = lines[1].split_whitespace().last().unwrap().parse().unwrap();
    assert_ne!(last, 0);
}

#[test]
fn truncated_scan_leaves_absent_blocks() {
    let jpeg = gray_jpeg(64, 64, 100, |x, y| ((x * 7 + y * 13) % 256) as u8);
    let start = scan_data_offset(&jpeg);
    let cut = start + (jpeg.len() - start) / 2;
    let truncated = &jpeg[..cut];

    let session = DecodeSession::from_jpeg(truncated).expect("partial scans are kept");
    let store = session.store(0).unwrap();
    assert_eq!(store.component().total_blocks(), 64);

    let rows = store.rows(0, 1).unwrap();
    assert!(matches!(rows.get(0, 0), Some(BlockSlot::Present(_))));

    let err = extract_component(&session, 0, AbsentBlockPolicy::Fail).unwrap_err();
    assert!(matches!(err, DctError::AbsentBlock { component: 0, .. }));
    assert_eq!(err.category(), ErrorCategory::StoreAccess);

    let filled = extract_component(&session, 0, AbsentBlockPolicy::Fill(128)).unwrap();
    assert_eq!(filled.get(7, 7), 128);

    let mut out = Vec::new();
    let report = dump_all(&[store], &mut out).unwrap();
    assert!(report.emitted > 0);
    assert!(report.absent > 0);
    assert_eq!(report.emitted + report.absent, 64);
    assert_eq!(report.unavailable, 0);
}

#[test]
fn broken_input_fails_with_a_category() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");

    let not_jpeg = temp_dir.path().join("not.jpg");
    fs::write(&not_jpeg, b"definitely not a jpeg").unwrap();
    let err = DecodeSession::open(&not_jpeg).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Format);

    let header_only = temp_dir.path().join("header.jpg");
    let jpeg = gray_jpeg(8, 8, 90, |_, _| 0);
    fs::write(&header_only, &jpeg[..scan_data_offset(&jpeg) - 6]).unwrap();
    let err = DecodeSession::open(&header_only).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Open);

    let err = DecodeSession::open(temp_dir.path().join("missing.jpg")).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Open);
}

#[test]
fn quantization_tables_in_natural_order() {
    let temp_dir = tempdir().expect("Failed to create temporary directory");
    let input = temp_dir.path().join("q50.jpg");
    fs::write(&input, gray_jpeg(8, 8, 50, |_, _| 128)).unwrap();

    let tables = dctscope_core::commands::quantization_tables(&input).unwrap();
    assert_eq!(tables.len(), 1);
    let first_row: Vec<u16> = (0..8).map(|x| tables[0].get_natural(0, x)).collect();
    assert_eq!(first_row, [16, 11, 10, 16, 24, 40, 51, 61]);
    assert_eq!(tables[0].get_natural(1, 0), 12);
    assert!(tables[0].to_ascii_table().contains("|   16 |   11 |   10 |"));
}
