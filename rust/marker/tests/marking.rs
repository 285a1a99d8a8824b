// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end marking runs against fixture models

use chrono::NaiveDate;
use ifc_marker::{
    find_elements, mark, mark_elements, IfcModel, MarkError, MarkOptions, MarkerIdentity,
    ProgressStage, PsetIndex, Selection, NO_VALUE, PSET_NAME,
};

const KONTOR: &str = include_str!("fixtures/kontor.ifc");
const LAGER: &str = include_str!("fixtures/lager_ifc2x3.ifc");

fn options() -> MarkOptions {
    MarkOptions {
        identity: MarkerIdentity {
            generator: "ifc-marker tests".to_string(),
            ..MarkerIdentity::default()
        },
        date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
    }
}

#[test]
fn index_lists_product_property_values() {
    let mut model = IfcModel::open(KONTOR).unwrap();
    let index = PsetIndex::build(&mut model);

    assert_eq!(
        index.pset_names(),
        vec!["Felles", PSET_NAME, "Pset_WallCommon"]
    );
    assert_eq!(index.property_names("Felles"), vec!["MMI", "Status"]);

    let mmi: Vec<_> = index.values("Felles", "MMI").into_iter().map(|v| v.label).collect();
    assert_eq!(mmi, vec!["700 (1)", "300 (1)"]);
    assert_eq!(index.count("Felles", "Status", NO_VALUE), 1);
    assert_eq!(index.count("Felles", "Status", "Eksisterende; beholdes"), 1);
    assert_eq!(index.count("Pset_WallCommon", "IsExternal", "True"), 1);
    assert_eq!(index.count("Pset_WallCommon", "ThermalTransmittance", "0.18"), 1);
}

#[test]
fn preview_lists_unique_elements() {
    let mut model = IfcModel::open(KONTOR).unwrap();
    let matches = find_elements(&mut model, &Selection::new("Felles", "MMI", "700")).unwrap();

    let preview = matches.preview();
    let names: Vec<_> = preview.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Yttervegg 1", "Yttervegg 2", "-"]);
    assert_eq!(preview[2].type_name, "IfcSlab");

    let door = find_elements(&mut model, &Selection::new("Felles", "Status", NO_VALUE)).unwrap();
    assert_eq!(door.unique_count(), 1);
    assert_eq!(door.matches[0].name.as_deref(), Some("Dør 01"));
}

#[test]
fn marking_run_colours_and_tags_matches() {
    let selection = Selection::new("Felles", "MMI", "700");
    let mut stages = Vec::new();
    let outcome = mark(KONTOR, &selection, "Rosa", &options(), |p| stages.push(p.stage)).unwrap();

    let report = &outcome.report;
    assert_eq!(report.total, 3);
    assert_eq!(report.coloured, 2);
    assert_eq!(report.psets_created, 2);
    assert_eq!(report.psets_updated, 1);
    assert_eq!(report.filter, "Felles.MMI=700");
    assert_eq!(stages.first(), Some(&ProgressStage::Loading));
    assert_eq!(stages.last(), Some(&ProgressStage::Done));

    // Untouched instances are copied verbatim
    assert!(outcome
        .output
        .contains("#51=IFCPROPERTYSINGLEVALUE('Status',$,IFCLABEL('Eksisterende; beholdes'),$);"));
    assert!(outcome.output.starts_with("ISO-10303-21;\nHEADER;\nFILE_DESCRIPTION"));
    assert!(outcome.output.ends_with("ENDSEC;\nEND-ISO-10303-21;\n"));

    let mut marked = IfcModel::open(&outcome.output).unwrap();
    let index = PsetIndex::build(&mut marked);
    assert_eq!(index.count(PSET_NAME, "Farge", "Rosa"), 3);
    assert_eq!(index.count(PSET_NAME, "Filter", "Felles.MMI=700"), 3);
    assert_eq!(index.count(PSET_NAME, "MarkeringsDato", "2025-02-03"), 3);
    assert_eq!(index.count(PSET_NAME, "Generert med", "ifc-marker tests"), 3);
    assert_eq!(
        index.count(PSET_NAME, "Info", "Farget med \"Rosa\" basert på Felles.MMI=700."),
        3
    );

    let style = marked
        .ids_of_type("IFCSURFACESTYLE")
        .into_iter()
        .find(|&id| marked.get(id).unwrap().get_string(0) == Some("NOSKI_Eksisterende_Rosa"))
        .unwrap();
    // The existing styled item now points at the marking style
    assert_eq!(marked.get(36).unwrap().get_refs(1), vec![style]);

    let styled_items: Vec<u32> = marked
        .ids_of_type("IFCSTYLEDITEM")
        .into_iter()
        .map(|id| marked.get(id).unwrap().get_ref(0).unwrap())
        .collect();
    assert_eq!(styled_items.len(), 3);
    assert!(styled_items.contains(&20));
    assert!(styled_items.contains(&31));
}

#[test]
fn existing_style_is_reused_when_marking_marked_output() {
    let selection = Selection::new("Felles", "MMI", "700");
    let first = mark(KONTOR, &selection, "Rosa", &options(), |_| {}).unwrap();
    let second = mark(&first.output, &selection, "Rosa", &options(), |_| {}).unwrap();

    assert!(first.report.style_created);
    assert!(!second.report.style_created);
    assert_eq!(second.report.psets_updated, 3);
    assert_eq!(second.report.psets_created, 0);

    let model = IfcModel::open(&second.output).unwrap();
    assert_eq!(model.ids_of_type("IFCSURFACESTYLE").len(), 2);
    assert_eq!(model.ids_of_type("IFCSTYLEDITEM").len(), 3);
    assert_eq!(model.ids_of_type("IFCPROPERTYSET").len(), first_pset_count(&first.output));
}

fn first_pset_count(content: &str) -> usize {
    IfcModel::open(content).unwrap().ids_of_type("IFCPROPERTYSET").len()
}

#[test]
fn ifc2x3_styles_go_through_assignments() {
    let selection = Selection::new("Konstruksjon", "Brannklasse", "R60");
    let outcome = mark(LAGER, &selection, "Blå", &options(), |_| {}).unwrap();

    assert_eq!(outcome.report.coloured, 1);
    assert_eq!(outcome.report.elements[0].name, "Søyle A1");
    assert_eq!(outcome.report.elements[0].type_name, "IfcColumn");

    let mut model = IfcModel::open(&outcome.output).unwrap();
    let assignments = model.ids_of_type("IFCPRESENTATIONSTYLEASSIGNMENT");
    assert_eq!(assignments.len(), 1);
    let styled = model.ids_of_type("IFCSTYLEDITEM");
    assert_eq!(model.get(styled[0]).unwrap().get_refs(1), assignments);

    // New property sets reuse the file's owner history
    let marker = model
        .ids_of_type("IFCPROPERTYSET")
        .into_iter()
        .find(|&id| model.get(id).unwrap().get_string(2) == Some(PSET_NAME))
        .unwrap();
    assert_eq!(model.get(marker).unwrap().get_ref(1), Some(1));
}

#[test]
fn empty_selection_is_reported() {
    let mut model = IfcModel::open(KONTOR).unwrap();
    let matches = find_elements(&mut model, &Selection::new("Felles", "MMI", "500")).unwrap();
    let err = mark_elements(KONTOR, &matches, "Rosa", &options(), |_| {}).unwrap_err();
    assert!(matches!(err, MarkError::NoMatches(ref f) if f == "Felles.MMI=500"));
}
