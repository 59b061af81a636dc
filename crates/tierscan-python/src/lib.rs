use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use tree_sitter::{Language, Node, Parser, Tree};

use tierscan_core::collector::{comment_density, MetricsCollector};
use tierscan_core::types::CodeMetrics;

/// Python metrics collector using tree-sitter.
///
/// Every `def` (including methods, nested and async functions) is one unit.
/// A unit's cyclomatic complexity is 1 plus one per decision point in its own
/// body; nested functions and classes are scored as separate units.
/// Decision points follow radon: comprehension `for` and `if` clauses count,
/// as does the `else` of a loop or `try`.
pub struct PythonCollector {
    language: Language,
}

impl PythonCollector {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_python::LANGUAGE.into(),
        }
    }

    fn parse(&self, content: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .context("failed to set Python language")?;
        parser
            .parse(content, None)
            .context("failed to parse Python file")
    }
}

impl Default for PythonCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for PythonCollector {
    fn language(&self) -> &'static str {
        "python"
    }

    fn file_extensions(&self) -> &[&str] {
        &["py"]
    }

    fn collect(&self, path: &Path, content: &str) -> Result<CodeMetrics> {
        let tree = self.parse(content)?;
        let root = tree.root_node();

        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            anyhow::bail!("syntax error in {} near line {line}", path.display());
        }

        let mut units = Vec::new();
        collect_units(root, &mut units);

        let mut comment_rows = BTreeSet::new();
        collect_comment_rows(root, &mut comment_rows);
        let line_count = content.lines().count();
        let token_count = count_tokens(root);

        Ok(CodeMetrics {
            max_complexity: units.iter().copied().max().unwrap_or(0),
            total_complexity: units.iter().sum(),
            function_count: units.len(),
            comment_density: comment_density(comment_rows.len(), line_count),
            line_count,
            byte_size: content.len() as u64,
            token_count,
        })
    }
}

fn children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let nodes = node.children(&mut cursor).collect();
    nodes
}

/// Find every function and push its complexity onto `units`.
fn collect_units(node: Node, units: &mut Vec<u32>) {
    if node.kind() == "function_definition" {
        let mut complexity = 1;
        if let Some(body) = node.child_by_field_name("body") {
            count_branches(body, &mut complexity, units);
        }
        units.push(complexity);
        return;
    }
    for child in children(node) {
        collect_units(child, units);
    }
}

fn is_decision_point(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "elif_clause"
            | "for_statement"
            | "while_statement"
            | "except_clause"
            | "except_group_clause"
            | "with_statement"
            | "assert_statement"
            | "boolean_operator"
            | "conditional_expression"
            | "if_clause"
            | "for_in_clause"
            | "case_clause"
    )
}

fn count_branches(node: Node, complexity: &mut u32, units: &mut Vec<u32>) {
    for child in children(node) {
        match child.kind() {
            "function_definition" | "class_definition" => {
                collect_units(child, units);
                continue;
            }
            kind if is_decision_point(kind) => *complexity += 1,
            "else_clause"
                if matches!(
                    node.kind(),
                    "for_statement" | "while_statement" | "try_statement"
                ) =>
            {
                *complexity += 1
            }
            _ => {}
        }
        count_branches(child, complexity, units);
    }
}

fn collect_comment_rows(node: Node, rows: &mut BTreeSet<usize>) {
    if node.kind() == "comment" {
        for row in node.start_position().row..=node.end_position().row {
            rows.insert(row);
        }
        return;
    }
    for child in children(node) {
        collect_comment_rows(child, rows);
    }
}

/// Lexical tokens: leaves of the syntax tree, with a string literal counted
/// once. Layout tokens (newlines, indents) are not part of the tree.
fn count_tokens(node: Node) -> usize {
    if node.kind() == "string" || node.child_count() == 0 {
        return usize::from(node.end_byte() > node.start_byte());
    }
    children(node).into_iter().map(count_tokens).sum()
}

/// 1-based line of the first ERROR or MISSING node.
fn first_error_line(node: Node) -> Option<usize> {
    if node.is_error() || node.is_missing() {
        return Some(node.start_position().row + 1);
    }
    children(node)
        .into_iter()
        .filter(|c| c.has_error())
        .find_map(first_error_line)
}
