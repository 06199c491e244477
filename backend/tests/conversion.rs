//! End-to-end conversion through the public API.

use bomsummary::api::logs::LOG_BROADCASTER;
use bomsummary::{
    convert_bytes, convert_file, convert_rows, write_summary_csv, write_summary_csv_file, BomRow, Category,
    ConvertOptions, PipelineError,
};
use proptest::prelude::*;
use std::io::Write;

const HEADER: &str = "ITEM,SERIAL,PARENT ASSY NO,PARTS,NAME OF PARTS,SIZE,使用,材質,SUPPLY,SUMMARY,単重";

fn quiet() {
    LOG_BROADCASTER.set_quiet(true);
}

fn sheet(lines: &[&str]) -> String {
    let mut text = String::from("組立部品リスト\nORDER,1021K457\n\n");
    text.push_str(HEADER);
    text.push('\n');
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text
}

fn row(item: &str, serial: &str, parts: &str, material: &str, usage: f64, weight: f64) -> BomRow {
    BomRow {
        item_id: item.into(),
        serial_id: serial.into(),
        parts_id: parts.into(),
        material: material.into(),
        usage_quantity: usage,
        unit_weight: weight,
        ..Default::default()
    }
}

#[test]
fn converts_a_realistic_sheet() {
    quiet();
    let text = sheet(&[
        // item 1: base frame
        "1,10A01,,001,BASE FRAME,,1,SS400,,,3200",
        "1,10A01,,002,STIFFENER,PL90,4,SS400,,,20",
        "1,10A01,,003,HEX BOLT,,16,SCM435,,JIS B1180,0.2",
        "1,10A02,,001,TABLE ROLLER,,2,S45C,ES,,60",
        "1,10A02,,002,BRG UNIT,,2,,ES,,5",
        "1,10A02,,003,COVER,,1,SPCC,,,70",
        "1,10A02,,004,GUARD,,1,SPCC,,,55",
        // item 2: piping
        "2.0,20B01,,001,PIPE FLANGE,,1,SPCC,,,45",
        "2,20B01,,002,,,1,SS400,,,150",
    ]);

    let result = convert_bytes("parts.csv", text.as_bytes(), &ConvertOptions::default()).unwrap();

    assert_eq!(result.summaries.len(), 2);

    let first = &result.summaries[0];
    assert_eq!(first.item_id, "1");
    assert_eq!(first.item_name, "BASE FRAME");
    // 001 heavy; 002 thick plate next to a heavy sibling
    assert_eq!(first.totals(Category::Ds).count, 2);
    assert_eq!(first.totals(Category::Ds).mass, 3280.0);
    // roller in S45C (120) plus the heavier of the two unresolved covers (70)
    assert_eq!(first.totals(Category::Dm).count, 2);
    assert_eq!(first.totals(Category::Dm).mass, 190.0);
    assert_eq!(first.totals(Category::De).count, 1);
    assert_eq!(first.totals(Category::De).mass, 55.0);
    assert_eq!(first.totals(Category::D).count, 0);
    assert_eq!(first.categories.total_count(), 5);

    let second = &result.summaries[1];
    assert_eq!(second.item_id, "2");
    assert_eq!(second.totals(Category::Pd).count, 1);
    assert_eq!(second.totals(Category::De).count, 1);
    assert_eq!(second.totals(Category::De).mass, 150.0);

    assert_eq!(result.stats.excluded, 2);
    assert_eq!(result.stats.unresolved, 3);
    assert_eq!(result.stats.totals.get(Category::Ds).count, 2);
}

#[test]
fn reads_shift_jis_files() {
    quiet();
    let text = sheet(&["5,A,,001,架台,,1,SS400,,,10"]);
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(&text);
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    file.write_all(&bytes).unwrap();

    let result = convert_file(file.path(), &ConvertOptions::default()).unwrap();

    assert_eq!(result.summaries[0].item_name, "架台");
    assert_eq!(result.summaries[0].totals(Category::Pd).mass, 10.0);
}

#[test]
fn exclusion_dominates_mass() {
    quiet();
    let mut jis = row("1", "A", "001", "SS400", 1.0, 5000.0);
    jis.summary_text = "JIS".into();

    let result = convert_rows(&[jis], &ConvertOptions::default());

    assert_eq!(result.summaries[0].categories.total_count(), 0);
    assert_eq!(result.stats.excluded, 1);
}

#[test]
fn unresolved_split_follows_mass_rank() {
    quiet();
    let rows: Vec<BomRow> = [80.0, 60.0, 70.0, 55.0, 90.0]
        .iter()
        .enumerate()
        .map(|(i, m)| row("1", "A", &format!("{:03}", i), "SS400", 1.0, *m))
        .collect();

    let result = convert_rows(&rows, &ConvertOptions::default());
    let s = &result.summaries[0];

    assert_eq!(s.totals(Category::Dm).count, 2);
    assert_eq!(s.totals(Category::Dm).mass, 170.0);
    assert_eq!(s.totals(Category::De).count, 3);
    assert_eq!(s.totals(Category::De).mass, 185.0);
}

#[test]
fn conversion_is_idempotent() {
    quiet();
    let text = sheet(&[
        "1,10A01,,001,FRAME,,1,SS400,,,3200",
        "1,10A01,,002,PLATE,,1,SS400,,,75",
        "1,10A01,,003,PLATE,,1,SS400,,,75",
        "2,20B01,,001,ARM,,1,SUS304,,,250",
    ]);

    let render = || {
        let result = convert_bytes("parts.csv", text.as_bytes(), &ConvertOptions::default()).unwrap();
        let mut out = Vec::new();
        write_summary_csv(&mut out, &result.summaries).unwrap();
        out
    };

    assert_eq!(render(), render());
}

#[test]
fn order_fields_come_from_options() {
    quiet();
    let options = ConvertOptions {
        order_name: "ACME".into(),
        order_number: "2024X001".into(),
        ..Default::default()
    };

    let result = convert_rows(&[row("1", "A", "001", "SS400", 1.0, 1.0)], &options);

    assert_eq!(result.summaries[0].order_name, "ACME");
    assert_eq!(result.summaries[0].order_number, "2024X001");
}

#[test]
fn sheet_without_size_column_does_not_read_material_as_thickness() {
    quiet();
    let text = "ITEM,SERIAL,PARENT ASSY NO,PARTS,NAME OF PARTS,使用,材質,SUPPLY,SUMMARY,単重\n\
                1,10A01,,001,FRAME,1,SS400,,,3200\n\
                1,10A01,,002,COVER,1,SS400,,,60\n";
    let options = ConvertOptions { explain: true, ..Default::default() };

    let result = convert_bytes("parts.csv", text.as_bytes(), &options).unwrap();
    let s = &result.summaries[0];

    assert_eq!(s.totals(Category::Ds).count, 1);
    assert_eq!(s.totals(Category::Ds).mass, 3200.0);
    assert_eq!(s.totals(Category::De).count, 1);
    assert_eq!(s.totals(Category::De).mass, 60.0);

    let cover = result.decisions.iter().find(|d| d.parts_id == "002").unwrap();
    assert_eq!(cover.step, Some(12));
}

#[test]
fn missing_serial_header_aborts() {
    quiet();
    let text = "ITEM,X,Y,PARTS\n1,,,001\n";

    let err = convert_bytes("parts.csv", text.as_bytes(), &ConvertOptions::default()).unwrap_err();

    assert!(matches!(err, PipelineError::Sheet(_)));
}

#[test]
fn unsupported_extension_is_rejected() {
    quiet();
    let err = convert_bytes("parts.pdf", b"%PDF", &ConvertOptions::default()).unwrap_err();
    assert!(err.to_string().contains("Unsupported"));
}

#[test]
fn writes_summary_file() {
    quiet();
    let result = convert_rows(&[row("7", "A", "001", "SS400", 2.0, 12.345)], &ConvertOptions::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.csv");

    write_summary_csv_file(&path, &result.summaries).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let last = text.lines().last().unwrap();
    assert!(last.starts_with("TNPR,1021K457,7,Item 7,"));
    assert!(last.ends_with(",1,24.69"));
}

fn arb_row() -> impl Strategy<Value = BomRow> {
    (
        0u8..3,
        0u8..3,
        0u8..6,
        prop_oneof![Just("SS400"), Just("SPCC"), Just("SUS304"), Just("SCM440"), Just("")],
        prop_oneof![Just(""), Just("JIS"), Just("MS")],
        0u32..5,
        0u32..4000,
    )
        .prop_map(|(item, serial, parts, material, summary, usage, weight)| BomRow {
            item_id: item.to_string(),
            serial_id: format!("S{}", serial),
            parts_id: format!("P{}", parts),
            material: material.to_string(),
            summary_text: summary.to_string(),
            usage_quantity: usage as f64,
            unit_weight: weight as f64 / 10.0,
            ..Default::default()
        })
}

proptest! {
    /// Counts equal the number of non-excluded groups; masses match within rounding.
    #[test]
    fn prop_totals_cover_non_excluded_groups(rows in proptest::collection::vec(arb_row(), 1..60)) {
        quiet();
        let options = ConvertOptions { explain: true, ..Default::default() };

        let result = convert_rows(&rows, &options);

        for summary in &result.summaries {
            let kept: Vec<_> = result
                .decisions
                .iter()
                .filter(|d| d.item_id == summary.item_id && !d.excluded)
                .collect();
            let mass: f64 = kept.iter().map(|d| d.mass).sum();

            prop_assert_eq!(summary.categories.total_count(), kept.len());
            prop_assert!((summary.categories.total_mass() - mass).abs() <= 0.03);
        }
    }

    /// Same rows, same output.
    #[test]
    fn prop_repeatable(rows in proptest::collection::vec(arb_row(), 1..40)) {
        quiet();
        let a = convert_rows(&rows, &ConvertOptions::default());
        let b = convert_rows(&rows, &ConvertOptions::default());
        prop_assert_eq!(a.summaries, b.summaries);
    }
}
