use std::collections::HashSet;

use navforge::{ExportFormat, NavIndex, TreeStyle};

const FIXTURE: &str = include_str!("fixtures/annotated.js");

#[test]
fn test_every_node_has_link_or_children() {
    let index = NavIndex::parse_js(FIXTURE).unwrap();
    for entry in index.walk() {
        assert!(
            entry.node.link.is_some() || entry.node.children.is_some(),
            "{} 既没有链接也没有子表",
            entry.node.label
        );
        assert!(!entry.node.label.is_empty());
    }
}

#[test]
fn test_traversal_visits_each_node_once() {
    let index = NavIndex::parse_js(FIXTURE).unwrap();
    let paths: Vec<Vec<usize>> = index.walk().map(|entry| entry.path).collect();
    let unique: HashSet<&Vec<usize>> = paths.iter().collect();
    assert_eq!(paths.len(), index.node_count());
    assert_eq!(unique.len(), paths.len());
}

#[test]
fn test_round_trip() {
    let index = NavIndex::parse_js(FIXTURE).unwrap();
    assert_eq!(index.to_js(), FIXTURE);
    assert_eq!(NavIndex::parse_js(&index.to_js()).unwrap(), index);
}

#[test]
fn test_root_scenario() {
    let index = NavIndex::parse_js(FIXTURE).unwrap();
    let app = &index.roots()[0];
    assert_eq!(app.label, "App");
    assert!(app.link.is_none());
    assert_eq!(app.child_nodes().len(), 1);
    assert_eq!(app.child_nodes()[0].label, "Biodiverse");
    assert_eq!(app.child_nodes()[0].link.as_deref(), Some("classApp_1_1Biodiverse.html"));
    assert!(app.child_nodes()[0].children.is_none());
}

#[test]
fn test_links_are_in_display_order() {
    let index = NavIndex::parse_js(FIXTURE).unwrap();
    let links = index.links();
    assert_eq!(links.first(), Some(&("App", None)));
    assert_eq!(links.last(), Some(&("main", Some("classmain.html"))));
}

#[test]
fn test_statistics_and_view() {
    let index = NavIndex::parse_js(FIXTURE).unwrap();
    let stats = index.statistics();
    assert_eq!(stats.total_nodes, 72);
    assert_eq!(stats.root_count, 3);
    assert_eq!(stats.max_depth, 4);
    assert_eq!(stats.total_nodes, stats.grouping_count + stats.page_count);

    let rendered = index
        .view()
        .with_style(TreeStyle::Indented)
        .with_show_links(false)
        .with_max_depth(Some(1))
        .to_string();
    assert_eq!(rendered, "🧭 annotated (深度限制: 1)\n═══════════════════════════════════════\n• App\n• Biodiverse\n• main\n");
}

#[test]
fn test_every_export_format_imports_back() {
    let index = NavIndex::parse_js(FIXTURE).unwrap();
    for format in [ExportFormat::Js, ExportFormat::Json, ExportFormat::Yaml, ExportFormat::Xml] {
        let exported = index.export(format).unwrap();
        assert_eq!(NavIndex::import(&exported, format).unwrap(), index, "{}", format);
    }
}
