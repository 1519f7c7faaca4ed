use std::collections::HashSet;

use armor::builder::TreeBuilder;
use armor::context::NormalizedContext;
use armor::describe::{describe, ChangeType};
use armor::diff::{check_layout_change, diff_contexts, DiffRecord, DiffTag};
use armor::frontend::{Index, ParseFlags, TranslationUnit};
use armor::node::NodeKind;
use armor::report::group_records;

static HEADER_NAME: &str = "usage.h";

fn parse_with(
    index: &Index,
    source: &str,
    args: &[String],
    excluded: &[&str],
) -> NormalizedContext {
    let flags = ParseFlags::DETAILED_PREPROCESSING_RECORD
        | ParseFlags::SKIP_FUNCTION_BODIES
        | ParseFlags::INCOMPLETE;
    let tu =
        TranslationUnit::parse_str(index, HEADER_NAME, source, args, flags)
            .expect("Failed to parse header");

    let excluded: HashSet<String> =
        excluded.iter().map(|name| name.to_string()).collect();
    let mut ctx = NormalizedContext::new(excluded);
    TreeBuilder::new(&mut ctx).build(&tu);
    ctx
}

fn diff_sources(base: &str, head: &str) -> Vec<DiffRecord> {
    let index = Index::new().expect("Failed to create index");
    let base = parse_with(&index, base, &[], &[]);
    let head = parse_with(&index, head, &[], &[]);
    diff_contexts(&base, &head)
}

fn diff_cpp_sources(base: &str, head: &str) -> Vec<DiffRecord> {
    let index = Index::new().expect("Failed to create index");
    let args = vec!["-xc++".to_string()];
    let base = parse_with(&index, base, &args, &[]);
    let head = parse_with(&index, head, &args, &[]);
    diff_contexts(&base, &head)
}

fn descriptions(diff: &[DiffRecord]) -> Vec<String> {
    describe(diff, HEADER_NAME)
        .into_iter()
        .map(|record| record.description)
        .collect()
}

#[test]
fn enum_enumerator_removed_and_added() {
    let diff = diff_sources(
        "enum E { A, B, C };\n",
        "enum E { A, B, D };\n",
    );
    let groups = group_records(&describe(&diff, HEADER_NAME));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "E");
    assert!(groups[0].description.contains("Enumerator removed: 'E.C'"));
    assert!(groups[0].description.contains("Enumerator added: 'E.D'"));
    assert_eq!(groups[0].changetype, "Compatibility Changed");
    assert_eq!(groups[0].compatibility, "backward_incompatible");
}

#[test]
fn struct_field_type_changed() {
    let diff = diff_sources(
        "struct S { int x; };\n",
        "struct S { long x; };\n",
    );
    let groups = group_records(&describe(&diff, HEADER_NAME));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "S");
    assert_eq!(
        groups[0].description,
        "Field 'S.x' type changed from 'int' to 'long'"
    );
    assert_eq!(groups[0].compatibility, "backward_incompatible");
}

#[test]
fn top_level_function_added() {
    let diff = diff_sources("", "void f(int);\n");
    let groups = group_records(&describe(&diff, HEADER_NAME));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "f");
    assert_eq!(groups[0].description, "Function added");
    assert_eq!(groups[0].changetype, "Functionality Added");
    assert_eq!(groups[0].compatibility, "backward_compatible");
}

#[test]
fn function_parameter_renamed() {
    let diff = diff_sources("void f(int a);\n", "void f(int b);\n");
    let lines = descriptions(&diff);

    assert_eq!(lines, vec!["Parameter renamed from 'a' to 'b' (type 'int')"]);
    let records = describe(&diff, HEADER_NAME);
    assert_eq!(records[0].changetype, ChangeType::CompatibilityChanged);
}

#[test]
fn function_return_type_changed() {
    let diff = diff_sources("int g(void);\n", "long g(void);\n");
    let lines = descriptions(&diff);

    assert_eq!(lines, vec!["Return type changed from 'int' to 'long'"]);
}

#[test]
fn nested_array_bound_and_sibling_enumerator() {
    let base = "\
typedef int Device;
struct Outer {
    enum Status { OK, FAILED, UNKNOWN } s;
    struct Inner { Device d[10]; } i;
};
";
    let head = "\
typedef int Device;
struct Outer {
    enum Status { OK, FAILED } s;
    struct Inner { Device d[11]; } i;
};
";
    let diff = diff_sources(base, head);
    let groups = group_records(&describe(&diff, HEADER_NAME));

    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, "Outer");
    assert!(groups[0]
        .description
        .contains("Enumerator removed: 'Outer.Status.UNKNOWN'"));
    assert!(groups[0]
        .description
        .contains("Field 'Outer.Inner.d' type changed from"));
    assert_eq!(groups[0].compatibility, "backward_incompatible");
}

#[test]
fn function_made_static_and_inline() {
    let diff = diff_sources(
        "int h(char c);\n",
        "static inline int h(char c) { return c; }\n",
    );
    let lines = descriptions(&diff);

    assert!(lines
        .contains(&"Function attribute storage qualifier added 'static'"
            .to_string()));
    assert!(lines
        .contains(&"Function attribute inline added 'inline'".to_string()));
}

#[test]
fn macro_value_changed() {
    let diff = diff_sources(
        "#define VERSION 1\n",
        "#define VERSION 2\n",
    );
    let lines = descriptions(&diff);

    assert_eq!(lines, vec!["Macro 'VERSION' value changed from '1' to '2'"]);
}

#[test]
fn reflexive_diff_is_empty() {
    let source = "\
enum E { A, B, C };
struct S { int x; struct S *next; };
typedef struct S S;
int g(void);
void f(int a, char *b);
#define LIMIT 64
";
    assert!(diff_sources(source, source).is_empty());
}

#[test]
fn diff_is_deterministic() {
    let base = "enum E { A, B, C };\nint g(void);\n";
    let head = "enum E { A, B };\nlong g(void);\nvoid f(int);\n";

    let first = serde_json::to_string(&diff_sources(base, head)).unwrap();
    let second = serde_json::to_string(&diff_sources(base, head)).unwrap();
    assert_eq!(first, second);
}

fn top_level_tagged(diff: &[DiffRecord], tag: DiffTag) -> Vec<String> {
    diff.iter()
        .filter(|record| record.tag == Some(tag))
        .map(|record| record.qualified_name.clone())
        .collect()
}

#[test]
fn diff_tags_swap_under_key_exchange() {
    let base = "enum E { A, B, C };\nint g(void);\nstruct Gone { int x; };\n";
    let head = "enum E { A, B };\nint g(void);\nstruct Fresh { int y; };\n";

    let forward = diff_sources(base, head);
    let backward = diff_sources(head, base);

    assert_eq!(
        top_level_tagged(&forward, DiffTag::Added),
        top_level_tagged(&backward, DiffTag::Removed)
    );
    assert_eq!(
        top_level_tagged(&forward, DiffTag::Removed),
        top_level_tagged(&backward, DiffTag::Added)
    );
    assert_eq!(
        top_level_tagged(&forward, DiffTag::Modified),
        top_level_tagged(&backward, DiffTag::Modified)
    );
}

#[test]
fn excluded_names_appear_in_no_record() {
    let index = Index::new().expect("Failed to create index");
    let base = parse_with(&index, "enum E { A, B, C };\nint g(void);\n", &[], &["E"]);
    let head = parse_with(&index, "enum E { A, B };\nlong g(void);\n", &[], &["E"]);

    let diff = diff_contexts(&base, &head);
    let json = serde_json::to_string(&diff).unwrap();
    assert!(!json.contains("\"E\""));
    assert!(!json.contains("E.C"));
}

#[test]
fn overloads_match_pairwise_by_signature() {
    let base = "void f(int a);\nvoid f(double b);\n";
    let head = "void f(int c);\nvoid f(double b);\n";

    let diff = diff_cpp_sources(base, head);
    let lines = descriptions(&diff);

    assert_eq!(lines, vec!["Parameter renamed from 'a' to 'c' (type 'int')"]);
}

#[test]
fn overload_signature_change_reads_as_removal_plus_addition() {
    let base = "void f(int a);\n";
    let head = "void f(char *a);\n";

    let diff = diff_cpp_sources(base, head);
    let tags: Vec<Option<DiffTag>> =
        diff.iter().map(|record| record.tag).collect();

    assert_eq!(tags, vec![Some(DiffTag::Removed), Some(DiffTag::Added)]);
}

#[test]
fn reopened_namespaces_merge_into_one_node() {
    let source = "\
namespace ns { void a(); }
namespace ns { void b(); }
";
    assert!(diff_cpp_sources(source, source).is_empty());
}

#[test]
fn function_added_inside_namespace_is_a_compatibility_change() {
    let base = "namespace ns { void a(); }\n";
    let head = "namespace ns { void a(); void b(); }\n";

    let diff = diff_cpp_sources(base, head);
    let records = describe(&diff, HEADER_NAME);

    assert_eq!(records.len(), 1);
    assert!(records[0].description.contains("'ns.b'"));
    assert_eq!(records[0].changetype, ChangeType::CompatibilityChanged);
}

#[test]
fn layout_sentinel_excludes_enums() {
    assert!(!check_layout_change(NodeKind::Enum));
    assert!(check_layout_change(NodeKind::Struct));
    assert!(check_layout_change(NodeKind::Union));
}

#[test]
fn diff_tree_round_trips_through_json() {
    let base = "enum E { A, B, C };\nstruct S { int x; };\nint g(void);\n";
    let head = "enum E { A, B };\nstruct S { long x; };\nlong g(void);\nvoid f(int);\n";

    let diff = diff_sources(base, head);
    let json = armor::report::render_diff_json(&diff).unwrap();
    let back: Vec<DiffRecord> = serde_json::from_str(&json).unwrap();

    assert_eq!(diff, back);
}

#[test]
fn cpp_method_surface_is_tracked() {
    let base = "\
class Device {
public:
    Device();
    virtual int status() const;
private:
    int state_;
};
";
    let head = "\
class Device {
public:
    Device();
    virtual long status() const;
private:
    int state_;
};
";
    let diff = diff_cpp_sources(base, head);
    let lines = descriptions(&diff);

    assert_eq!(lines, vec!["Return type changed from 'int' to 'long'"]);
}
