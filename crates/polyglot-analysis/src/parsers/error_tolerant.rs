//! Error regions in tree-sitter trees.

use tree_sitter::Node;

use crate::ir::SourceLocation;

/// Count ERROR and MISSING nodes in a tree-sitter tree.
pub fn count_errors(root: Node) -> (u32, Vec<SourceLocation>) {
    let mut count = 0u32;
    let mut locations = Vec::new();
    collect_errors(root, &mut count, &mut locations);
    (count, locations)
}

fn collect_errors(node: Node, count: &mut u32, locations: &mut Vec<SourceLocation>) {
    if node.is_error() || node.is_missing() {
        *count += 1;
        locations.push(SourceLocation::from_ts_node(&node, None));
    }
    if !node.has_error() {
        return;
    }
    let child_count = node.child_count();
    for i in 0..child_count {
        if let Some(child) = node.child(i) {
            collect_errors(child, count, locations);
        }
    }
}

/// Whether a node is an error region itself.
pub fn is_error_region(node: &Node) -> bool {
    node.is_error() || node.is_missing()
}

/// Check if a node is inside an ERROR subtree.
pub fn is_in_error(node: &Node) -> bool {
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.is_error() {
            return true;
        }
        current = parent.parent();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    fn parse_js(source: &str) -> tree_sitter::Tree {
        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(&Language::JavaScript.ts_language().unwrap())
            .unwrap();
        parser.parse(source, None).unwrap()
    }

    #[test]
    fn clean_source_has_no_errors() {
        let tree = parse_js("let a = 1;\nfoo(a);\n");
        let (count, locations) = count_errors(tree.root_node());
        assert_eq!(count, 0);
        assert!(locations.is_empty());
    }

    #[test]
    fn malformed_source_reports_regions() {
        let tree = parse_js("let a = ;\nfoo(a;\n");
        let (count, locations) = count_errors(tree.root_node());
        assert!(count >= 1);
        assert_eq!(locations.len(), count as usize);
        assert!(locations.iter().all(|l| l.line >= 1));
    }
}
