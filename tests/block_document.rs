use chrono::{NaiveDate, NaiveDateTime};
use saltofi_rust::{
    Block, ElementView, Entity, FieldValue, InstrumentConfig, Pointing, Rss, SaltError, SkyCoord,
    Target,
};

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/block.xml");

const RA_SECONDS: &str = "./{/PIPT/Proposal/Shared}Coordinates\
    /{/PIPT/Shared}RightAscension/{/PIPT/Shared}Seconds";
const DEC_SIGN: &str = "./{/PIPT/Proposal/Shared}Coordinates\
    /{/PIPT/Shared}Declination/{/PIPT/Shared}Sign";
const EQUINOX: &str = "./{/PIPT/Proposal/Shared}Coordinates/{/PIPT/Shared}Equinox";

fn load() -> ElementView {
    ElementView::open(FIXTURE).expect("fixture should load")
}

fn first_target(doc: &ElementView) -> Target {
    doc.block().targets(doc).unwrap()[0]
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

#[test]
fn test_block_fields() {
    let doc = load();
    let block = doc.block();

    assert_eq!(block.get(&doc, &Block::CODE).unwrap(), "4f1c2a90-block");
    assert_eq!(block.get(&doc, &Block::NAME).unwrap(), "SN 2024abc monitoring");
    assert_eq!(block.get(&doc, &Block::COMMENT).unwrap(), "second epoch");
    assert_eq!(block.get(&doc, &Block::SEMESTER).unwrap(), 1);
    assert_eq!(block.get(&doc, &Block::YEAR).unwrap(), 2024);

    let expiry = NaiveDate::from_ymd_opt(2024, 10, 31)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    assert_eq!(block.get(&doc, &Block::EXPIRY).unwrap(), Some(expiry));
}

#[test]
fn test_tree_navigation() {
    let doc = load();
    let block = doc.block();

    let pointings = block.pointings(&doc).unwrap();
    let names: Vec<String> = pointings
        .iter()
        .map(|p| p.get(&doc, &Pointing::NAME).unwrap())
        .collect();
    assert_eq!(names, vec!["Main pointing", "Comparison field"]);

    let observations = pointings[1].observations(&doc).unwrap();
    assert_eq!(observations.len(), 1);
    assert!(observations[0].rss_configs(&doc).unwrap().is_empty());

    assert_eq!(block.targets(&doc).unwrap().len(), 2);
    assert_eq!(observations[0].targets(&doc).unwrap().len(), 1);
}

#[test]
fn test_instrument_configs_list_rss_before_salticam() {
    let doc = load();
    let observation = doc.block().pointings(&doc).unwrap()[0]
        .observations(&doc)
        .unwrap()[0];

    let configs = observation.instrument_configs(&doc).unwrap();
    let listed: Vec<(&str, String)> = configs
        .iter()
        .map(|c| (c.kind(), c.name(&doc).unwrap()))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("Rss", "Longslit blue".to_string()),
            ("Rss", "Longslit red".to_string()),
            ("Salticam", "Slot mode imaging".to_string()),
        ]
    );

    match configs[1] {
        InstrumentConfig::Rss(rss) => {
            assert_eq!(rss.get(&doc, &Rss::EXPOSURE_TIME).unwrap(), 900.5)
        }
        other => panic!("expected an RSS configuration, got {:?}", other),
    }
}

#[test]
fn test_target_fields_with_proper_motion() {
    let doc = load();
    let target = first_target(&doc);

    assert_eq!(target.get(&doc, &Target::TYPE).unwrap(), "Supernova");
    assert_eq!(target.get(&doc, &Target::PM_RA).unwrap(), 0.0125);
    assert_eq!(target.get(&doc, &Target::PM_DEC).unwrap(), -0.004);
    let epoch = NaiveDateTime::parse_from_str("2015-06-01T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap();
    assert_eq!(target.get(&doc, &Target::EPOCH).unwrap(), Some(epoch));
    assert_eq!(
        target.get(&doc, &Target::MAG_FILTER).unwrap().as_deref(),
        Some("R")
    );
    assert_eq!(target.get(&doc, &Target::MAG_MIN).unwrap(), Some(17.5));
    assert_eq!(target.get(&doc, &Target::MAG_MAX).unwrap(), Some(18.2));
}

#[test]
fn test_optional_leaves_fall_back_to_defaults() {
    let doc = load();
    let target = doc.block().targets(&doc).unwrap()[1];

    assert_eq!(target.get(&doc, &Target::PM_RA).unwrap(), 0.0);
    assert_eq!(target.get(&doc, &Target::PM_DEC).unwrap(), 0.0);
    assert_eq!(target.get(&doc, &Target::EPOCH).unwrap(), None);

    let coord = target.coordinates(&doc).unwrap();
    assert!(approx(coord.ra_deg, 0.0));
    assert!(approx(coord.dec_deg, 12.0));
    assert_eq!(coord.equinox, Some(2000.0));
    assert!(target.finding_charts(&doc).unwrap().is_empty());
}

#[test]
fn test_unparseable_leaf_is_type_coercion() {
    let doc = load();
    let target = doc.block().targets(&doc).unwrap()[1];

    match target.get(&doc, &Target::MAG_MIN) {
        Err(SaltError::TypeCoercion { field, value, .. }) => {
            assert_eq!(field, "mag_min");
            assert_eq!(value, "twelve");
        }
        other => panic!("expected a coercion error, got {:?}", other),
    }
    assert!(matches!(
        target.describe(&doc),
        Err(SaltError::TypeCoercion { .. })
    ));
}

#[test]
fn test_missing_required_leaf_is_node_not_found() {
    let doc = load();
    let observation = doc.block().pointings(&doc).unwrap()[1]
        .observations(&doc)
        .unwrap()[0];
    let salticam = observation.salticam_configs(&doc).unwrap()[0];

    // a Salticam node has no RSS leaves
    let rss = Rss::wrap(salticam.node());
    assert!(matches!(
        rss.get(&doc, &Rss::EXPOSURE_TIME),
        Err(SaltError::NodeNotFound(_))
    ));
}

#[test]
fn test_coordinates_read_composes_sexagesimal() {
    let doc = load();
    let coord = first_target(&doc).coordinates(&doc).unwrap();

    assert!(approx(coord.ra_deg, (10.0 + 20.0 / 60.0 + 30.5 / 3600.0) * 15.0));
    assert!(approx(coord.dec_deg, -(45.0 + 30.0 / 60.0 + 15.25 / 3600.0)));
    assert_eq!(coord.equinox, Some(2000.0));
}

#[test]
fn test_coordinates_round_trip() {
    let mut doc = load();
    let target = first_target(&doc);

    let coord = SkyCoord::new(150.0, -30.5);
    target.set_coordinates(&mut doc, &coord).unwrap();

    let read = target.coordinates(&doc).unwrap();
    assert!(approx(read.ra_deg, 150.0));
    assert!(approx(read.dec_deg, -30.5));

    let node = Some(target.node());
    assert_eq!(doc.get(RA_SECONDS, node, None).unwrap(), "0.000000");
    assert_eq!(doc.get(DEC_SIGN, node, None).unwrap(), "-");
    assert_eq!(doc.get(EQUINOX, node, None).unwrap(), "2000");
}

#[test]
fn test_positive_declination_clears_sign() {
    let mut doc = load();
    let target = first_target(&doc);

    target
        .set_coordinates(&mut doc, &SkyCoord::new(10.0, 5.25).with_equinox(2015.5))
        .unwrap();

    let node = Some(target.node());
    assert_eq!(doc.get(DEC_SIGN, node, None).unwrap(), "");
    assert_eq!(doc.get(EQUINOX, node, None).unwrap(), "2015.500000");
    assert_eq!(target.coordinates(&doc).unwrap().equinox, Some(2015.5));
}

#[test]
fn test_finding_charts_are_replaced() {
    let mut doc = load();
    let target = first_target(&doc);
    assert_eq!(target.finding_charts(&doc).unwrap(), vec!["x.fits"]);

    target
        .set_finding_charts(&mut doc, ["a.fits", "b.fits"])
        .unwrap();
    assert_eq!(target.finding_charts(&doc).unwrap(), vec!["a.fits", "b.fits"]);

    target.set_finding_charts(&mut doc, "c.fits").unwrap();
    assert_eq!(target.finding_charts(&doc).unwrap(), vec!["c.fits"]);

    // survives serialization with the document's own prefix
    let xml = String::from_utf8(doc.to_bytes().unwrap()).unwrap();
    assert!(xml.contains("<ps:Path>c.fits</ps:Path>"));
    assert!(!xml.contains("x.fits"));
}

#[test]
fn test_replaced_finding_charts_keep_layout() {
    let mut doc = load();
    let target = first_target(&doc);

    target
        .set_finding_charts(&mut doc, vec!["a.fits", "b.fits"])
        .unwrap();

    let bytes = doc.to_bytes().unwrap();
    let xml = String::from_utf8(bytes.clone()).unwrap();
    assert!(xml.contains(
        "</ps:FindingChart>\n            <ps:FindingChart><ps:Path>b.fits</ps:Path></ps:FindingChart>\n            </ps:Target>"
    ));

    let reparsed = ElementView::parse(&bytes).unwrap();
    assert_eq!(
        first_target(&reparsed).finding_charts(&reparsed).unwrap(),
        vec!["a.fits", "b.fits"]
    );
}

#[test]
fn test_target_without_magnitude_range() {
    let fixture = std::fs::read_to_string(FIXTURE).unwrap();
    let start = fixture.find("<ps:MagnitudeRange>").unwrap();
    let end = fixture.find("</ps:MagnitudeRange>").unwrap() + "</ps:MagnitudeRange>".len();
    let stripped = format!("{}{}", &fixture[..start], &fixture[end..]);

    let mut doc = ElementView::parse(stripped.as_bytes()).unwrap();
    let target = first_target(&doc);

    assert_eq!(target.get(&doc, &Target::MAG_FILTER).unwrap(), None);
    assert_eq!(target.get(&doc, &Target::MAG_MIN).unwrap(), None);
    assert_eq!(target.get(&doc, &Target::MAG_MAX).unwrap(), None);

    let described = target.describe(&doc).unwrap();
    let magnitudes: Vec<&FieldValue> = described
        .iter()
        .filter(|(name, _)| name.starts_with("mag_"))
        .map(|(_, value)| value)
        .collect();
    assert_eq!(magnitudes, vec![&FieldValue::Absent; 3]);

    // writing into a missing range does not create it
    assert!(matches!(
        target.set(&mut doc, &Target::MAG_MIN, Some(16.0)),
        Err(SaltError::NodeNotFound(_))
    ));
}

#[test]
fn test_describe_walks_field_table() {
    let doc = load();
    let described = doc.block().describe(&doc).unwrap();
    let names: Vec<&str> = described.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, vec!["code", "name", "comment", "semester", "year", "expiry"]);
    assert_eq!(described[3].1, FieldValue::Integer(1));
    assert_eq!(described[1].1, FieldValue::Text("SN 2024abc monitoring".to_string()));
}

#[test]
fn test_assign_semester_persists() {
    let mut doc = load();
    let block = doc.block();

    let tag = block
        .assign_semester(&mut doc, NaiveDate::from_ymd_opt(2024, 5, 10).unwrap())
        .unwrap();
    assert_eq!((tag.semester, tag.year), (1, 2024));

    let reparsed = ElementView::parse(&doc.to_bytes().unwrap()).unwrap();
    let block = reparsed.block();
    assert_eq!(block.get(&reparsed, &Block::SEMESTER).unwrap(), 1);
    assert_eq!(block.get(&reparsed, &Block::YEAR).unwrap(), 2024);
}

#[test]
fn test_other_schema_versions_resolve_alike() {
    let fixture = std::fs::read_to_string(FIXTURE).unwrap();
    let bumped = fixture
        .replace("Proposal/Phase2/4.9", "Proposal/Phase2/5.2")
        .replace("PIPT/Shared/1.6", "PIPT/Shared/2.0");

    let doc = ElementView::parse(bumped.as_bytes()).unwrap();
    let coord = first_target(&doc).coordinates(&doc).unwrap();
    assert!(approx(coord.dec_deg, -(45.0 + 30.0 / 60.0 + 15.25 / 3600.0)));
    assert_eq!(
        doc.block().get(&doc, &Block::NAME).unwrap(),
        "SN 2024abc monitoring"
    );
}

#[test]
fn test_views_from_another_document_are_rejected() {
    let first = load();
    let mut second = load();
    let target = first_target(&first);

    assert!(matches!(
        target.get(&second, &Target::NAME),
        Err(SaltError::ForeignView)
    ));
    assert!(matches!(
        target.set_finding_charts(&mut second, "a.fits"),
        Err(SaltError::ForeignView)
    ));
}
