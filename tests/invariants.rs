//! Cross-cutting invariants checked against the fixture package.

mod common;

use std::collections::HashSet;

use common::{extract, extract_with_config, testdata};
use surfacer::facade::Program;
use surfacer::{
    analyzer, are_equivalent_api_file_contents, ApiDocument, Collector, Extractor,
    ExtractorConfig, MessageId, ReleaseTag, Span,
};

fn fixture_entry() -> std::path::PathBuf {
    testdata("widgets").join("index.ts")
}

#[test]
fn span_round_trip_over_fixture_package() {
    let (program, _) = Program::load(&fixture_entry()).unwrap();
    for (_, file) in program.files() {
        let root = file.root();
        let mut cursor = root.walk();
        for node in root.children(&mut cursor) {
            let span = Span::build(file, node);
            assert_eq!(
                span.get_text(),
                file.node_text(node),
                "round trip failed in {}",
                file.rel_path
            );
            span.check_coverage()
                .unwrap_or_else(|e| panic!("coverage failed in {}: {}", file.rel_path, e));
        }
    }
}

#[test]
fn identical_input_yields_identical_artifacts() {
    let config = || ExtractorConfig {
        package_name: Some("widgets".to_string()),
        ..Default::default()
    };
    let first = Extractor::new(config()).run(&fixture_entry()).unwrap();
    let second = Extractor::new(config()).run(&fixture_entry()).unwrap();
    assert_eq!(first.review_text, second.review_text);
    assert_eq!(first.model_json, second.model_json);
}

#[test]
fn fixture_surface_is_collected_in_admission_order() {
    let (program, _) = Program::load(&fixture_entry()).unwrap();
    let collector = Collector::new(&program, analyzer::analyze(&program));

    let names: Vec<&str> = collector
        .entities()
        .iter()
        .map(|e| e.name_for_emit.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "Widget",
            "WidgetOptions",
            "WidgetEvent",
            "WidgetListener",
            "createWidget",
            "Palette",
        ]
    );
    let exported: Vec<bool> = collector.entities().iter().map(|e| e.exported).collect();
    assert_eq!(exported, vec![true, true, true, true, true, false]);
}

#[test]
fn emit_names_are_unique() {
    let (program, _) = Program::load(&fixture_entry()).unwrap();
    let collector = Collector::new(&program, analyzer::analyze(&program));

    let mut seen = HashSet::new();
    for entity in collector.entities() {
        assert!(
            seen.insert(entity.name_for_emit.clone()),
            "duplicate emit name {}",
            entity.name_for_emit
        );
    }
}

#[test]
fn reference_edges_are_minimal() {
    let (program, _) = Program::load(&fixture_entry()).unwrap();
    let collector = Collector::new(&program, analyzer::analyze(&program));
    let graph = &collector.graph;

    for (_, symbol) in graph.symbols() {
        for &root in &symbol.declarations {
            graph.for_each_declaration_recursive(root, &mut |decl_id, decl| {
                for &target in &decl.referenced {
                    assert!(
                        !graph.is_ancestor_or_self_symbol(decl_id, target),
                        "reference to self or ancestor"
                    );
                    assert!(
                        !graph.ancestry_records(decl_id, target),
                        "redundant edge duplicated on an ancestor"
                    );
                }
                let unique: HashSet<_> = decl.referenced.iter().collect();
                assert_eq!(unique.len(), decl.referenced.len(), "duplicate edge");
            });
        }
    }
}

#[test]
fn release_tags_are_monotonic_or_reported() {
    let (program, _) = Program::load(&fixture_entry()).unwrap();
    let mut collector = Collector::new(&program, analyzer::analyze(&program));
    surfacer::metadata::check_semantics(&mut collector, &[]);

    let leak_reported = collector
        .messages
        .messages()
        .iter()
        .any(|m| m.id == MessageId::TypeLeak);

    let symbols: Vec<_> = collector.graph.symbols().map(|(id, _)| id).collect();
    let mut violation_exists = false;
    for symbol in symbols {
        let own = collector.fetch_symbol_metadata(symbol).release_tag;
        let roots = collector.graph.symbol(symbol).declarations.clone();
        for root in roots {
            let mut edges = Vec::new();
            collector
                .graph
                .for_each_declaration_recursive(root, &mut |_, decl| {
                    edges.extend(decl.referenced.iter().copied());
                });
            for target in edges {
                let target_tag = collector.fetch_symbol_metadata(target).release_tag;
                if own != ReleaseTag::None && target_tag != ReleaseTag::None && target_tag < own {
                    violation_exists = true;
                }
            }
        }
    }
    assert_eq!(violation_exists, leak_reported);
}

#[test]
fn fixture_reports_only_the_forgotten_export() {
    let result = Extractor::new(ExtractorConfig::default())
        .run(&fixture_entry())
        .unwrap();
    assert_eq!(result.error_count, 0, "messages: {:?}", result.messages);
    assert!(result
        .messages
        .iter()
        .all(|m| m.id == MessageId::ForgottenExport));
    assert!(result
        .messages
        .iter()
        .any(|m| m.text.contains("Palette")));
}

#[test]
fn review_is_equivalent_under_reformatting() {
    let original = concat!(
        "/** Pair. @public */\n",
        "export interface Pair {\n",
        "  left: number;\n",
        "  right: number;\n",
        "}\n",
    );
    let reformatted = concat!(
        "/** Pair. @public */\n",
        "export interface Pair {\n",
        "\n",
        "    left: number;\n",
        "    right: number;\n",
        "\n",
        "}\n",
    );
    let first = extract(&[("index.ts", original)]);
    let second = extract(&[("index.ts", reformatted)]);
    assert!(
        are_equivalent_api_file_contents(&first.review_text, &second.review_text),
        "first: {:?}\nsecond: {:?}",
        first.review_text,
        second.review_text
    );
}

#[test]
fn equivalence_predicate_properties() {
    // Any two strings differing only by whitespace runs are equivalent.
    assert!(are_equivalent_api_file_contents("a \t\r\n b", "a b"));
    assert!(are_equivalent_api_file_contents("  a", " a"));
    assert!(!are_equivalent_api_file_contents("a", "a b"));
    // Reflexive on arbitrary content.
    let s = "class A { x: number; }";
    assert!(are_equivalent_api_file_contents(s, s));
}

#[test]
fn model_file_matches_schema_shape() {
    let result = extract_with_config(
        &[(
            "index.ts",
            concat!(
                "/**\n * Lib.\n * @packageDocumentation\n */\n",
                "/** W. @public */\nexport class Widget {\n  render(): void;\n}\n",
            ),
        )],
        ExtractorConfig {
            package_name: Some("widgets".to_string()),
            ..Default::default()
        },
    );

    let doc: ApiDocument = serde_json::from_str(&result.model_json).unwrap();
    assert_eq!(doc.metadata.tool, "surfacer");
    assert_eq!(doc.package.name, "widgets");
    assert!(doc.package.doc_comment.is_some());

    let entry = &doc.package.members[0];
    let widget = &entry.members[0];
    assert_eq!(widget.name, "Widget");
    assert_eq!(
        widget.canonical_reference,
        "(widgets:package).(:entrypoint).(Widget:class)"
    );
    assert_eq!(widget.release_tag.as_deref(), Some("Public"));
    assert_eq!(widget.members.len(), 1);
}

#[test]
fn allowed_release_tags_are_enforced() {
    let result = extract_with_config(
        &[("index.ts", "/** W. @alpha */\nexport class W {}\n")],
        ExtractorConfig {
            allowed_release_tags: vec!["@public".to_string(), "@beta".to_string()],
            ..Default::default()
        },
    );
    assert!(result
        .messages
        .iter()
        .any(|m| m.id == MessageId::DisallowedReleaseTag));
}
