use armor::describe::{verdict, ChangeRecord, ChangeType};
use armor::report::{
    group_records, render_html, render_json, COMPATIBILITY_CHANGED,
    FUNCTIONALITY_ADDED,
};

fn change(
    name: &str,
    description: &str,
    changetype: ChangeType,
) -> ChangeRecord {
    ChangeRecord {
        headerfile: "usage.h".to_string(),
        name: name.to_string(),
        description: description.to_string(),
        changetype,
        compatibility: verdict(changetype),
    }
}

#[test]
fn grouping_joins_descriptions_in_order() {
    let records = vec![
        change("E", "Enumerator removed: 'E.C'", ChangeType::CompatibilityChanged),
        change("E", "Enumerator added: 'E.D'", ChangeType::CompatibilityChanged),
        change("f", "Function added", ChangeType::FunctionalityChanged),
    ];

    let groups = group_records(&records);
    assert_eq!(groups.len(), 2);

    assert_eq!(groups[0].name, "E");
    assert_eq!(
        groups[0].description,
        "Enumerator removed: 'E.C'\nEnumerator added: 'E.D'"
    );
    assert_eq!(groups[0].changetype, COMPATIBILITY_CHANGED);
    assert_eq!(groups[0].compatibility, "backward_incompatible");

    assert_eq!(groups[1].name, "f");
    assert_eq!(groups[1].changetype, FUNCTIONALITY_ADDED);
    assert_eq!(groups[1].compatibility, "backward_compatible");
}

#[test]
fn one_incompatible_contributor_taints_the_group() {
    let records = vec![
        change("f", "Function added", ChangeType::FunctionalityChanged),
        change(
            "f",
            "Function attribute inline added 'inline'",
            ChangeType::CompatibilityChanged,
        ),
    ];

    let groups = group_records(&records);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].changetype, COMPATIBILITY_CHANGED);
    assert_eq!(groups[0].compatibility, "backward_incompatible");
}

#[test]
fn html_renders_one_row_per_group() {
    let records = vec![
        change("E", "Enumerator removed: 'E.C'", ChangeType::CompatibilityChanged),
        change("E", "Enumerator added: 'E.D'", ChangeType::CompatibilityChanged),
        change("f", "Function added", ChangeType::FunctionalityChanged),
    ];
    let html = render_html(&group_records(&records));

    assert_eq!(html.matches("<tr><td>").count(), 2);
    // Newlines in descriptions become line breaks.
    assert!(html.contains("Enumerator removed: 'E.C'<br>"));
    // Compatibility cells are coloured by class.
    assert!(html.contains("class=\"incompatible\">backward_incompatible"));
    assert!(html.contains("class=\"compatible\">backward_compatible"));
}

#[test]
fn html_escapes_markup_in_descriptions() {
    let records = vec![change(
        "T",
        "Typedef 'T' type changed from 'int' to 'vector<int>'",
        ChangeType::CompatibilityChanged,
    )];
    let html = render_html(&group_records(&records));

    assert!(html.contains("vector&lt;int&gt;"));
    assert!(!html.contains("vector<int>"));
}

#[test]
fn html_placeholder_row_when_empty() {
    let html = render_html(&[]);
    assert!(html.contains("No API changes detected"));
}

#[test]
fn json_uses_four_space_indentation() {
    let records =
        vec![change("f", "Function added", ChangeType::FunctionalityChanged)];
    let json = render_json(&group_records(&records)).unwrap();

    assert!(json.starts_with("[\n    {"));
    assert!(json.contains("\n        \"headerfile\": \"usage.h\""));
    assert!(json.contains("\"changetype\": \"Functionality Added\""));
    assert!(json.contains("\"compatibility\": \"backward_compatible\""));
}

#[test]
fn json_of_empty_input_is_an_empty_array() {
    assert_eq!(render_json(&[]).unwrap(), "[]");
}

#[test]
fn rendering_is_deterministic() {
    let records = vec![
        change("E", "Enumerator removed: 'E.C'", ChangeType::CompatibilityChanged),
        change("f", "Function added", ChangeType::FunctionalityChanged),
    ];
    let groups = group_records(&records);

    assert_eq!(render_json(&groups).unwrap(), render_json(&groups).unwrap());
    assert_eq!(render_html(&groups), render_html(&groups));
}
