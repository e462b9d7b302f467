//! Integration tests for the change-value recipe.

use std::sync::Arc;
use std::thread;

use yamlrewrite::config::Config;
use yamlrewrite::document::node::{Block, Documents, Mapping, MappingEntry};
use yamlrewrite::document::parser::parse_yaml;
use yamlrewrite::document::printer::print_yaml;
use yamlrewrite::file::loader::load_yaml_str;
use yamlrewrite::recipe::{ChangeValue, Recipe, RecipeError};

fn parse(source: &str) -> Arc<Documents> {
    Arc::new(parse_yaml(source).unwrap())
}

fn root_mapping(documents: &Documents) -> &Arc<Mapping> {
    documents.documents()[0].block().as_mapping().unwrap()
}

fn entry<'a>(mapping: &'a Mapping, key: &str) -> &'a Arc<MappingEntry> {
    mapping.get(key).unwrap()
}

#[test]
fn test_flow_mapping_value_changed() {
    let documents = parse("subjects: {kind: Service}");
    let recipe = ChangeValue::new("subjects/kind", "Deployment").unwrap();

    let result = recipe.run(&documents);

    assert_eq!(print_yaml(&result), "subjects: {kind: Deployment}");
    let before = entry(root_mapping(&documents), "subjects");
    let after = entry(root_mapping(&result), "subjects");
    assert_eq!(after.prefix(), before.prefix());
    assert_eq!(after.id(), before.id());
    assert_eq!(after.value().prefix(), before.value().prefix());
}

#[test]
fn test_nested_flow_value_changed() {
    let documents = parse("a: {b: {c: 1}}");
    let recipe = ChangeValue::new("a/b/c", "2").unwrap();

    assert_eq!(print_yaml(&recipe.run(&documents)), "a: {b: {c: 2}}");
}

#[test]
fn test_siblings_untouched_and_shared() {
    let documents = parse("a:\n  b:\n    c: 1\n    keep: [x, y]\n  other: 3\nz: 4\n");
    let recipe = ChangeValue::new("a/b/c", "2").unwrap();

    let result = recipe.run(&documents);

    assert_eq!(
        print_yaml(&result),
        "a:\n  b:\n    c: 2\n    keep: [x, y]\n  other: 3\nz: 4\n"
    );

    let a_before = entry(root_mapping(&documents), "a");
    let a_after = entry(root_mapping(&result), "a");
    assert!(!Arc::ptr_eq(a_before, a_after));

    let inner_before = a_before.value().as_mapping().unwrap();
    let inner_after = a_after.value().as_mapping().unwrap();
    assert!(Arc::ptr_eq(
        entry(inner_before, "other"),
        entry(inner_after, "other")
    ));

    let b_before = entry(inner_before, "b").value().as_mapping().unwrap();
    let b_after = entry(inner_after, "b").value().as_mapping().unwrap();
    assert!(Arc::ptr_eq(entry(b_before, "keep"), entry(b_after, "keep")));

    assert!(Arc::ptr_eq(
        entry(root_mapping(&documents), "z"),
        entry(root_mapping(&result), "z")
    ));
}

#[test]
fn test_no_match_returns_input() {
    let documents = parse("x: 1");
    let recipe = ChangeValue::new("y", "9").unwrap();

    let result = recipe.run(&documents);

    assert!(Arc::ptr_eq(&result, &documents));
    assert_eq!(*result, *documents);
    assert_eq!(print_yaml(&result), "x: 1");
}

#[test]
fn test_wildcard_replaces_every_item() {
    let source = "items:\n  - kind: a\n    name: first\n  - kind: b\n    name: second\n";
    let documents = parse(source);
    let recipe = ChangeValue::new("items/*/kind", "Job").unwrap();

    let result = recipe.run(&documents);

    assert_eq!(
        print_yaml(&result),
        "items:\n  - kind: Job\n    name: first\n  - kind: Job\n    name: second\n"
    );
}

#[test]
fn test_index_selects_single_item() {
    let documents = parse("items:\n- kind: a\n- kind: b\n- kind: c\n");
    let recipe = ChangeValue::new("items[-1]/kind", "z").unwrap();

    assert_eq!(
        print_yaml(&recipe.run(&documents)),
        "items:\n- kind: a\n- kind: b\n- kind: z\n"
    );
}

#[test]
fn test_dollar_syntax() {
    let documents = parse("spec:\n  template:\n    image: nginx:1.0\n");
    let recipe = ChangeValue::new("$.spec..image", "nginx:2.0").unwrap();

    assert_eq!(
        print_yaml(&recipe.run(&documents)),
        "spec:\n  template:\n    image: nginx:2.0\n"
    );
}

#[test]
fn test_idempotent() {
    let documents = parse("subjects:\n  kind: Service # the kind\n");
    let recipe = ChangeValue::new("subjects/kind", "Deployment").unwrap();

    let once = recipe.run(&documents);
    let twice = recipe.run(&once);

    assert_eq!(print_yaml(&once), print_yaml(&twice));
    assert!(Arc::ptr_eq(&once, &twice));
}

#[test]
fn test_value_prefix_preserved() {
    let documents = parse("kind:    Service\nnext: # note\n  Service\n");
    let recipe = ChangeValue::new("kind", "Job").unwrap();
    let result = recipe.run(&documents);
    assert_eq!(print_yaml(&result), "kind:    Job\nnext: # note\n  Service\n");

    let recipe = ChangeValue::new("next", "Job").unwrap();
    let result = recipe.run(&documents);
    assert_eq!(print_yaml(&result), "kind:    Service\nnext: # note\n  Job\n");

    let before = entry(root_mapping(&documents), "next");
    let after = entry(root_mapping(&result), "next");
    assert_eq!(after.value().prefix(), before.value().prefix());
    assert_ne!(after.value().id(), before.value().id());
    assert!(after.value().markers().is_empty());
}

#[test]
fn test_key_and_comments_preserved() {
    let source = "# header\nsubjects: # trailing\n  # own line\n  \"kind\": 'Service'   # inline\n";
    let documents = parse(source);
    let recipe = ChangeValue::new("subjects/kind", "Deployment").unwrap();

    let result = recipe.run(&documents);

    assert_eq!(
        print_yaml(&result),
        "# header\nsubjects: # trailing\n  # own line\n  \"kind\": Deployment   # inline\n"
    );
    let subjects = entry(root_mapping(&result), "subjects");
    let kind = entry(subjects.value().as_mapping().unwrap(), "kind");
    let original_subjects = entry(root_mapping(&documents), "subjects");
    let original_kind = entry(original_subjects.value().as_mapping().unwrap(), "kind");
    assert!(Arc::ptr_eq(kind.key(), original_kind.key()));
}

#[test]
fn test_anchored_expression_ignores_deeper_matches() {
    let documents = parse("kind: a\nnested:\n  kind: b\n");

    let anchored = ChangeValue::new("/kind", "x").unwrap();
    assert_eq!(
        print_yaml(&anchored.run(&documents)),
        "kind: x\nnested:\n  kind: b\n"
    );

    let relative = ChangeValue::new("kind", "x").unwrap();
    assert_eq!(
        print_yaml(&relative.run(&documents)),
        "kind: x\nnested:\n  kind: x\n"
    );
}

#[test]
fn test_ancestor_match_replaces_rewritten_descendant() {
    let documents = parse("a:\n  b:\n    a: 1\n");
    let recipe = ChangeValue::new("a", "done").unwrap();

    assert_eq!(print_yaml(&recipe.run(&documents)), "a:\n  done\n");
}

#[test]
fn test_sequence_value_replaced() {
    let documents = parse("ports:\n  - 80\n  - 443\nname: web\n");
    let recipe = ChangeValue::new("ports", "none").unwrap();

    let result = recipe.run(&documents);

    assert_eq!(print_yaml(&result), "ports:\n  none\nname: web\n");
    let ports = entry(root_mapping(&result), "ports");
    assert!(matches!(ports.value(), Block::Scalar(_)));
}

#[test]
fn test_every_document_is_visited() {
    let documents = parse("---\nkind: a\n---\nkind: b\n---\nother: c\n");
    let recipe = ChangeValue::new("kind", "z").unwrap();

    let result = recipe.run(&documents);

    assert_eq!(
        print_yaml(&result),
        "---\nkind: z\n---\nkind: z\n---\nother: c\n"
    );
    assert!(Arc::ptr_eq(
        &result.documents()[2],
        &documents.documents()[2]
    ));
}

#[test]
fn test_input_tree_untouched() {
    let source = "a: 1\nb: 2\n";
    let documents = parse(source);
    let recipe = ChangeValue::new("a", "9").unwrap();

    let _ = recipe.run(&documents);

    assert_eq!(print_yaml(&documents), source);
}

#[test]
fn test_malformed_expression_fails_at_construction() {
    let result = ChangeValue::new("a/b*", "x");
    assert!(matches!(result, Err(RecipeError::InvalidPath { .. })));
    let message = result.unwrap_err().to_string();
    assert!(message.contains("a/b*"));
}

#[test]
fn test_recipe_shared_across_threads() {
    let recipe = Arc::new(ChangeValue::new("kind", "Deployment").unwrap());
    let shared_input = parse("kind: Service\n");

    let outputs: Vec<String> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let recipe = Arc::clone(&recipe);
                let input = if i % 2 == 0 {
                    Arc::clone(&shared_input)
                } else {
                    parse(&format!("kind: Service\nid: {}\n", i))
                };
                scope.spawn(move || print_yaml(&recipe.run(&input)))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, output) in outputs.iter().enumerate() {
        if i % 2 == 0 {
            assert_eq!(output, "kind: Deployment\n");
        } else {
            assert_eq!(output, &format!("kind: Deployment\nid: {}\n", i));
        }
    }
    assert_eq!(print_yaml(&shared_input), "kind: Service\n");
}

#[test]
fn test_indentless_sequence_replacement_stays_valid() {
    let documents = parse("metadata:\n  items:\n  - a\n  - b\n  next: 1\n");
    let recipe = ChangeValue::new("metadata/items", "none").unwrap();

    let output = print_yaml(&recipe.run(&documents));

    assert_eq!(output, "metadata:\n  items:\n    none\n  next: 1\n");
    let value: serde_yaml::Value = serde_yaml::from_str(&output).unwrap();
    assert_eq!(value["metadata"]["items"].as_str(), Some("none"));
    assert_eq!(value["metadata"]["next"].as_i64(), Some(1));
}

#[test]
fn test_role_binding_subjects_need_item_step() {
    let source = "kind: RoleBinding\nsubjects:\n- kind: User\n  name: jane\n";
    let documents = parse(source);

    let direct = ChangeValue::new("subjects/kind", "Group").unwrap();
    assert!(Arc::ptr_eq(&direct.run(&documents), &documents));

    let per_item = ChangeValue::new("subjects/*/kind", "Group").unwrap();
    assert_eq!(
        print_yaml(&per_item.run(&documents)),
        "kind: RoleBinding\nsubjects:\n- kind: Group\n  name: jane\n"
    );
}

#[test]
fn test_byte_order_mark_file_rewritten() {
    let documents = Arc::new(load_yaml_str("\u{feff}kind: Service\n", &Config::default()).unwrap());

    for path in ["kind", "/kind"] {
        let recipe = ChangeValue::new(path, "Deployment").unwrap();
        assert_eq!(
            print_yaml(&recipe.run(&documents)),
            "\u{feff}kind: Deployment\n"
        );
    }
}

#[test]
fn test_values_that_would_change_meaning_are_rejected() {
    for value in ["#x", "x, y", "a: b", "x #y", "{x}", "*ref"] {
        let result = ChangeValue::new("a", value);
        assert!(
            matches!(result, Err(RecipeError::InvalidOption { option: "value", .. })),
            "{:?} should be rejected",
            value
        );
    }
}
