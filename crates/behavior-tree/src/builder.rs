//! DSL compiler.
//!
//! Trees are written one node per line. Leading `-` characters give the
//! nesting depth, the first token picks the node type, an optional `[...]`
//! group right after it is the comment and the remaining tokens are the
//! parameters:
//!
//! ```text
//! -?
//! --> [chase]
//! ---trigger Player true
//! ---velocity speed 0
//! --wait 2 Skip
//! *speed = 2.5 # units per second
//! ```
//!
//! Lines starting with `*` declare boot variables. They are applied to the
//! tree's variable store once every node is built.
//!
//! Compilation never fails as a whole: a malformed line is logged, recorded
//! as an [`Issue`] and skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::TreeError;
use crate::{Node, NodeClass, NodeId, NodeRegistry, Tree, Value};

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)(?:\s+\[([^\]]*)\])?(.*)$").expect("declaration pattern is valid")
});

static BOOT_FLOAT: LazyLock<Regex> = LazyLock::new(|| boot_pattern(r"\d+\.\d+"));
static BOOT_INT: LazyLock<Regex> = LazyLock::new(|| boot_pattern(r"\d+"));
static BOOT_BOOL: LazyLock<Regex> = LazyLock::new(|| boot_pattern(r"(?i:true|false)"));
static BOOT_STRING: LazyLock<Regex> = LazyLock::new(|| boot_pattern(r"[^\s#]+"));

fn boot_pattern(value: &str) -> Regex {
    Regex::new(&format!(r"^\*+\s*(\w+)\s*=\s*({value})\s*(?:#.*)?$"))
        .expect("boot variable pattern is valid")
}

/// A line the compiler could not honour.
#[derive(Debug)]
pub struct Issue {
    /// 1-based source line.
    pub line: usize,
    pub error: TreeError,
}

/// Output of [`compile`].
#[derive(Debug)]
pub struct Compiled {
    pub tree: Tree,
    pub issues: Vec<Issue>,
}

impl Compiled {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// A parsed node line, before instantiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub depth: usize,
    pub token: String,
    pub comment: String,
    pub params: Vec<String>,
}

/// Splits a node line into depth, token, comment and parameters.
///
/// Returns `None` for lines without depth markers or without a token.
pub fn parse_declaration(line: &str) -> Option<Declaration> {
    let depth = line.chars().take_while(|&c| c == '-').count();
    if depth == 0 {
        return None;
    }
    let body = line[depth..].trim();
    let captures = DECLARATION.captures(body)?;

    Some(Declaration {
        depth,
        token: captures[1].to_string(),
        comment: captures
            .get(2)
            .map_or_else(String::new, |m| m.as_str().to_string()),
        params: captures[3].split_whitespace().map(str::to_string).collect(),
    })
}

/// Parses a `*name = value # comment` line.
///
/// Values are tried as float (`digits.digits`), integer, boolean and finally
/// bare string; the first grammar that matches wins.
pub fn parse_boot_variable(line: &str) -> Option<(String, Value)> {
    let line = line.trim();
    if let Some(c) = BOOT_FLOAT.captures(line) {
        let value = c[2].parse::<f32>().ok()?;
        return Some((c[1].to_string(), Value::Float(value)));
    }
    if let Some(c) = BOOT_INT.captures(line) {
        let value = c[2].parse::<i64>().ok()?;
        return Some((c[1].to_string(), Value::Int(value)));
    }
    if let Some(c) = BOOT_BOOL.captures(line) {
        let value = c[2].eq_ignore_ascii_case("true");
        return Some((c[1].to_string(), Value::Bool(value)));
    }
    BOOT_STRING
        .captures(line)
        .map(|c| (c[1].to_string(), Value::Str(c[2].to_string())))
}

/// Compiles DSL text into a linked, indexed and initialized tree.
pub fn compile(text: &str, registry: &NodeRegistry) -> Compiled {
    let mut tree = Tree::new();
    let mut issues = Vec::new();
    let root = tree.root();

    // Open ancestors by depth. Selectors occupy two slots, sequences and
    // decorators one, leaves none.
    let mut open: Vec<NodeId> = vec![root];
    let mut boot = Vec::new();

    for (number, line) in text.lines().enumerate() {
        let number = number + 1;
        let line = line.trim_end();

        if line.starts_with('*') {
            boot.push(number);
            tree.boot_lines.push(line.to_string());
            continue;
        }
        let Some(decl) = parse_declaration(line) else {
            continue;
        };

        let mut depth = decl.depth;
        if depth > open.len() {
            tracing::warn!(line = number, depth, open = open.len(), "depth exceeds nesting, clamped");
            issues.push(Issue {
                line: number,
                error: TreeError::DepthExceeded {
                    depth,
                    open: open.len(),
                },
            });
            depth = open.len();
        }
        let mut parent = open[depth - 1];
        open.truncate(depth);

        let kind = match registry.instantiate(&decl.token, &decl.params) {
            Ok(kind) => kind,
            Err(error) => {
                tracing::error!(line = number, token = %decl.token, %error, "node skipped");
                issues.push(Issue {
                    line: number,
                    error,
                });
                continue;
            }
        };

        // A decorator keeps its first child. Later lines fall back to the
        // decorator's own parent.
        while let Some(node) = tree.node(parent) {
            if node.class() != NodeClass::Decorator || node.children().is_empty() {
                break;
            }
            tracing::warn!(
                line = number,
                decorator = node.token(),
                "decorator already has a child, attaching to its parent"
            );
            parent = node.parent().unwrap_or(root);
        }

        if parent == root && !tree.is_empty() {
            tracing::error!(line = number, token = %decl.token, "root already has a child");
            issues.push(Issue {
                line: number,
                error: TreeError::RootOccupied,
            });
            continue;
        }

        let class = kind.class();
        let mut node = Node::new(decl.token, kind);
        node.params = decl.params;
        node.comment = decl.comment;
        let id = tree.insert(node);
        tree.link(parent, id);

        match class {
            NodeClass::Selector => open.extend([id, id]),
            NodeClass::Sequence | NodeClass::Decorator => open.push(id),
            NodeClass::Leaf | NodeClass::Root => {}
        }
    }

    tree.reindex();

    for (number, text) in boot.into_iter().zip(&tree.boot_lines) {
        match parse_boot_variable(text) {
            Some((name, value)) => {
                tracing::debug!(%name, %value, "boot variable");
                tree.variables.set(name, value);
            }
            None => {
                tracing::warn!(line = number, text = text.as_str(), "unrecognized boot variable");
                issues.push(Issue {
                    line: number,
                    error: TreeError::BootVariable(text.clone()),
                });
            }
        }
    }

    tree.init_nodes();

    tracing::info!(nodes = tree.len(), issues = issues.len(), "tree compiled");
    Compiled { tree, issues }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Status;

    fn build(text: &str) -> Compiled {
        compile(text, &NodeRegistry::with_defaults())
    }

    fn tokens(tree: &Tree) -> Vec<(usize, String)> {
        tree.order()
            .iter()
            .skip(1)
            .map(|&id| (tree.depth(id), tree.node(id).unwrap().token().to_string()))
            .collect()
    }

    #[test]
    fn declaration_with_comment_and_params() {
        let decl = parse_declaration("--wait [pause a bit] 0.5  Skip").unwrap();
        assert_eq!(decl.depth, 2);
        assert_eq!(decl.token, "wait");
        assert_eq!(decl.comment, "pause a bit");
        assert_eq!(decl.params, vec!["0.5", "Skip"]);

        assert_eq!(parse_declaration("no depth"), None);
        assert_eq!(parse_declaration("---"), None);
    }

    #[test]
    fn boot_variables_use_first_matching_grammar() {
        assert_eq!(
            parse_boot_variable("*speed = 2.5 # comment"),
            Some(("speed".into(), Value::Float(2.5)))
        );
        assert_eq!(
            parse_boot_variable("*lives=3"),
            Some(("lives".into(), Value::Int(3)))
        );
        assert_eq!(
            parse_boot_variable("**armed = TRUE"),
            Some(("armed".into(), Value::Bool(true)))
        );
        assert_eq!(
            parse_boot_variable("*target = Player #who to chase"),
            Some(("target".into(), Value::Str("Player".into())))
        );
        assert_eq!(parse_boot_variable("*broken"), None);
    }

    #[test]
    fn builds_nested_structure() {
        let compiled = build("-?\n--> [chase]\n---trigger Player true\n---velocity 1 0\n--wait 2\n");
        assert!(compiled.is_clean());

        let tree = &compiled.tree;
        assert_eq!(
            tokens(tree),
            vec![
                (1, "?".to_string()),
                (2, ">".to_string()),
                (3, "trigger".to_string()),
                (3, "velocity".to_string()),
                (2, "wait".to_string()),
            ]
        );
        assert_eq!(tree.node_at(2).unwrap().comment(), "chase");
        assert_eq!(tree.node_at(4).unwrap().params(), ["1", "0"]);
    }

    #[test]
    fn selector_opens_two_levels() {
        // The selector's first child may sit one level deeper than usual.
        let compiled = build("-?\n---succeed\n");
        assert!(compiled.is_clean());
        let leaf = compiled.tree.node_at(2).unwrap();
        assert_eq!(leaf.parent(), compiled.tree.id_at(1));
    }

    #[test]
    fn unknown_token_skips_only_that_line() {
        let compiled = build("->\n--jump 3\n--succeed\n");
        assert_eq!(compiled.issues.len(), 1);
        assert_eq!(compiled.issues[0].line, 2);
        assert!(matches!(compiled.issues[0].error, TreeError::UnknownToken(_)));
        assert_eq!(compiled.tree.len(), 3);
    }

    #[test]
    fn too_deep_line_is_clamped() {
        let compiled = build("->\n----succeed\n");
        assert!(matches!(
            compiled.issues[0].error,
            TreeError::DepthExceeded { depth: 4, open: 2 }
        ));
        let leaf = compiled.tree.node_at(2).unwrap();
        assert_eq!(leaf.parent(), compiled.tree.id_at(1));
    }

    #[test]
    fn second_decorator_child_goes_to_decorator_parent() {
        let compiled = build("->\n--invertify\n---fail\n---succeed\n");
        let tree = &compiled.tree;
        assert_eq!(
            tokens(tree),
            vec![
                (1, ">".to_string()),
                (2, "invertify".to_string()),
                (3, "fail".to_string()),
                (2, "succeed".to_string()),
            ]
        );
    }

    #[test]
    fn second_root_child_is_rejected() {
        let compiled = build("-succeed\n-fail\n");
        assert!(matches!(compiled.issues[0].error, TreeError::RootOccupied));
        assert_eq!(compiled.tree.len(), 2);
    }

    #[test]
    fn boot_variables_are_applied_and_kept() {
        let compiled = build("-$ y = speed * 2\n*speed = 2.5 # comment\n");
        let tree = &compiled.tree;
        assert_eq!(tree.variables().get("speed"), Some(&Value::Float(2.5)));
        assert_eq!(tree.boot_lines(), ["*speed = 2.5 # comment"]);
        assert!(tree.variables().contains("y"));
    }

    #[test]
    fn compiled_tree_ticks() {
        let mut compiled = build("-?\n--fail\n--succeed\n");
        assert_eq!(compiled.tree.tick(), Status::Running);
        assert_eq!(compiled.tree.current_node().token(), "succeed");
    }
}
