use armor::describe::{
    describe, verdict, ChangeType, Compatibility,
};
use armor::diff::{DiffRecord, DiffTag};

fn record(
    qualified_name: &str,
    node_type: &str,
    tag: Option<DiffTag>,
) -> DiffRecord {
    DiffRecord {
        qualified_name: qualified_name.to_string(),
        node_type: node_type.to_string(),
        tag,
        ..Default::default()
    }
}

#[test]
fn verdict_is_a_function_of_change_type() {
    assert_eq!(
        verdict(ChangeType::FunctionalityChanged),
        Compatibility::BackwardCompatible
    );
    assert_eq!(
        verdict(ChangeType::CompatibilityChanged),
        Compatibility::BackwardIncompatible
    );
}

#[test]
fn top_level_addition_is_new_functionality() {
    let diff = vec![record("f", "Function", Some(DiffTag::Added))];
    let records = describe(&diff, "usage.h");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].headerfile, "usage.h");
    assert_eq!(records[0].name, "f");
    assert_eq!(records[0].description, "Function added");
    assert_eq!(records[0].changetype, ChangeType::FunctionalityChanged);
    assert_eq!(records[0].compatibility, Compatibility::BackwardCompatible);
}

#[test]
fn top_level_removal_is_incompatible() {
    let mut removed = record("S", "Struct", Some(DiffTag::Removed));
    removed.data_type = String::new();
    let mut field = record("S.x", "Field", None);
    field.data_type = "int".to_string();
    removed.children.push(field);

    let records = describe(&[removed], "usage.h");
    let lines: Vec<&str> =
        records.iter().map(|r| r.description.as_str()).collect();

    assert_eq!(lines, vec![
        "Struct removed: 'S'",
        "Field removed: 'S.x' with type 'int'",
    ]);
    assert!(records
        .iter()
        .all(|r| r.changetype == ChangeType::CompatibilityChanged));
    assert!(records
        .iter()
        .all(|r| r.compatibility == Compatibility::BackwardIncompatible));
}

#[test]
fn added_function_does_not_enumerate_synthesised_children() {
    let mut added = record("f", "Function", Some(DiffTag::Added));
    added.data_type = "f(int)".to_string();
    added.children.push(record("f.return", "ReturnType", None));
    added.children.push(record("f.a", "Parameter", None));

    let records = describe(&[added], "usage.h");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].description, "Function added");
}

#[test]
fn nested_addition_is_still_a_compatibility_change() {
    let mut modified = record("E", "Enum", Some(DiffTag::Modified));
    let mut added = record("E.D", "Enumerator", Some(DiffTag::Added));
    added.value = "3".to_string();
    modified.children.push(added);

    let records = describe(&[modified], "usage.h");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].description, "Enumerator added: 'E.D'");
    assert_eq!(records[0].changetype, ChangeType::CompatibilityChanged);
}

#[test]
fn paired_removal_and_addition_reads_as_a_type_change() {
    let mut modified = record("S", "Struct", Some(DiffTag::Modified));
    let mut inner = record("S.x", "Field", Some(DiffTag::Modified));
    let mut old = record("S.x", "Field", Some(DiffTag::Removed));
    old.data_type = "int".to_string();
    let mut new = record("S.x", "Field", Some(DiffTag::Added));
    new.data_type = "long".to_string();
    inner.children.push(old);
    inner.children.push(new);
    modified.children.push(inner);

    let records = describe(&[modified], "usage.h");
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].description,
        "Field 'S.x' type changed from 'int' to 'long'"
    );
}

#[test]
fn paired_snapshots_with_same_type_read_as_a_value_change() {
    let mut modified = record("E", "Enum", Some(DiffTag::Modified));
    let mut inner = record("E.B", "Enumerator", Some(DiffTag::Modified));
    let mut old = record("E.B", "Enumerator", Some(DiffTag::Removed));
    old.value = "1".to_string();
    let mut new = record("E.B", "Enumerator", Some(DiffTag::Added));
    new.value = "5".to_string();
    inner.children.push(old);
    inner.children.push(new);
    modified.children.push(inner);

    let records = describe(&[modified], "usage.h");
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].description,
        "Enumerator 'E.B' value changed from '1' to '5'"
    );
}

#[test]
fn function_attribute_snapshots_produce_attribute_rows() {
    let mut modified = record("f", "Function", Some(DiffTag::Modified));
    let mut old = record("f", "Function", Some(DiffTag::Removed));
    old.data_type = "f(int)".to_string();
    old.storage_qualifier = String::new();
    let mut new = record("f", "Function", Some(DiffTag::Added));
    new.data_type = "f(int)".to_string();
    new.storage_qualifier = "static".to_string();
    new.is_inline = true;
    modified.children.push(old);
    modified.children.push(new);

    let records = describe(&[modified], "usage.h");
    let lines: Vec<&str> =
        records.iter().map(|r| r.description.as_str()).collect();

    assert_eq!(lines, vec![
        "Function attribute storage qualifier added 'static'",
        "Function attribute inline added 'inline'",
    ]);
}

#[test]
fn return_type_row() {
    let mut modified = record("g", "Function", Some(DiffTag::Modified));
    let mut inner = record("g.return", "ReturnType", Some(DiffTag::Modified));
    let mut old = record("g.return", "ReturnType", Some(DiffTag::Removed));
    old.data_type = "int".to_string();
    let mut new = record("g.return", "ReturnType", Some(DiffTag::Added));
    new.data_type = "long".to_string();
    inner.children.push(old);
    inner.children.push(new);
    modified.children.push(inner);

    let records = describe(&[modified], "usage.h");
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].description,
        "Return type changed from 'int' to 'long'"
    );
}

#[test]
fn parameter_rename_pairs_by_type() {
    let mut modified = record("f", "Function", Some(DiffTag::Modified));
    let mut old = record("f.a", "Parameter", Some(DiffTag::Removed));
    old.data_type = "int".to_string();
    let mut new = record("f.b", "Parameter", Some(DiffTag::Added));
    new.data_type = "int".to_string();
    modified.children.push(old);
    modified.children.push(new);

    let records = describe(&[modified], "usage.h");
    assert_eq!(records.len(), 1);
    assert_eq!(
        records[0].description,
        "Parameter renamed from 'a' to 'b' (type 'int')"
    );
}

#[test]
fn unpaired_parameters_read_as_addition_and_removal() {
    let mut modified = record("f", "Function", Some(DiffTag::Modified));
    let mut old = record("f.a", "Parameter", Some(DiffTag::Removed));
    old.data_type = "int".to_string();
    let mut new = record("f.b", "Parameter", Some(DiffTag::Added));
    new.data_type = "char *".to_string();
    modified.children.push(old);
    modified.children.push(new);

    let records = describe(&[modified], "usage.h");
    let lines: Vec<&str> =
        records.iter().map(|r| r.description.as_str()).collect();

    assert_eq!(lines, vec![
        "Parameter 'a' removed (type 'int')",
        "Parameter 'b' added (type 'char *')",
    ]);
}

#[test]
fn modified_function_with_no_rows_falls_back() {
    let modified = record("f", "Function", Some(DiffTag::Modified));
    let records = describe(&[modified], "usage.h");

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].description, "Function modified");
}

#[test]
fn untagged_records_are_ignored() {
    let diff = vec![record("f", "Function", None)];
    assert!(describe(&diff, "usage.h").is_empty());
}
