//! Identifier interning and deterministic short-name generation.
//!
//! Declared identifiers are replaced by dense integer ids during encoding
//! and expanded back to short names during decoding. The mapping is pure:
//! both sides derive the same name from the same id without a shared table.

use compact_str::CompactString;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::{Field, NodeId, NodeKind, Tree};

const SHORT_NAME_CHARS: &[u8; 52] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Words a generated short name must never collide with.
const RESERVED_WORDS: &[&str] = &[
    "abstract",
    "await",
    "boolean",
    "break",
    "byte",
    "case",
    "catch",
    "char",
    "class",
    "const",
    "continue",
    "debugger",
    "default",
    "delete",
    "do",
    "double",
    "else",
    "enum",
    "export",
    "extends",
    "false",
    "final",
    "finally",
    "float",
    "for",
    "function",
    "goto",
    "if",
    "implements",
    "import",
    "in",
    "instanceof",
    "int",
    "interface",
    "let",
    "long",
    "native",
    "new",
    "null",
    "package",
    "private",
    "protected",
    "public",
    "return",
    "short",
    "static",
    "super",
    "switch",
    "synchronized",
    "this",
    "throw",
    "throws",
    "transient",
    "true",
    "try",
    "typeof",
    "var",
    "void",
    "volatile",
    "while",
    "with",
    "yield",
];

/// Expands a dense rename id into a short identifier.
///
/// Base-52 with a shifted continuation digit, so ids enumerate `a`..`Z`,
/// then `aa`..`ZZ`, and so on without gaps. Names that land on a reserved
/// word get an underscore prefix.
pub fn short_name(index: u32) -> CompactString {
    let mut index = index as i64;
    let mut bytes = Vec::new();
    loop {
        bytes.push(SHORT_NAME_CHARS[(index % 52) as usize]);
        index = index / 52 - 1;
        if index < 0 {
            break;
        }
    }
    bytes.reverse();
    // SHORT_NAME_CHARS is ASCII only.
    let name = CompactString::from_utf8(bytes).unwrap_or_default();
    if RESERVED_WORDS.contains(&name.as_str()) {
        CompactString::from(format!("_{name}"))
    } else {
        name
    }
}

/// Insertion-ordered mapping from declared names to dense rename ids.
#[derive(Debug, Default)]
pub struct NameTable {
    ids: FxHashMap<CompactString, u32>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id for `name`, assigning the next dense id on first sight.
    pub fn id_for(&mut self, name: &str) -> u32 {
        if let Some(id) = self.ids.get(name) {
            return *id;
        }
        let id = self.ids.len() as u32;
        self.ids.insert(CompactString::from(name), id);
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Collects every identifier name the tree declares.
///
/// Declaration sites are variable declarator ids (including destructuring
/// patterns), function and class names, and the parameter lists of
/// function-like nodes. Names that only appear in expression position stay
/// outside the set and are never renamed, so references to outer or host
/// globals survive the codec intact.
pub fn collect_declared(tree: &Tree) -> FxHashSet<CompactString> {
    let mut declared = FxHashSet::default();
    let Some(root) = tree.root() else {
        return declared;
    };
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        match tree.kind(id) {
            NodeKind::VariableDeclarator => {
                if let Some(pattern) = tree.child(id, "id") {
                    collect_pattern(tree, pattern, &mut declared);
                }
            }
            NodeKind::FunctionDeclaration | NodeKind::FunctionExpression => {
                if let Some(name) = tree.child(id, "id") {
                    collect_pattern(tree, name, &mut declared);
                }
                collect_params(tree, tree.field(id, "params"), &mut declared);
            }
            NodeKind::ArrowFunctionExpression => {
                collect_params(tree, tree.field(id, "params"), &mut declared);
            }
            NodeKind::ClassExpression => {
                if let Some(name) = tree.child(id, "id") {
                    collect_pattern(tree, name, &mut declared);
                }
            }
            NodeKind::ClassMethod => {
                collect_params(tree, tree.field(id, "params"), &mut declared);
            }
            NodeKind::ForOfStatement => {
                if let Some(left) = tree.child(id, "left")
                    && tree[left].kind == NodeKind::Identifier
                {
                    collect_pattern(tree, left, &mut declared);
                }
            }
            _ => {}
        }
        stack.extend(tree.children(id));
    }
    declared
}

fn collect_params(tree: &Tree, params: Option<&Field>, declared: &mut FxHashSet<CompactString>) {
    let Some(Field::List(items)) = params else {
        return;
    };
    for item in items {
        if let Field::Node(param) = item {
            collect_pattern(tree, *param, declared);
        }
    }
}

fn collect_pattern(tree: &Tree, id: NodeId, declared: &mut FxHashSet<CompactString>) {
    match tree.kind(id) {
        NodeKind::Identifier => {
            if let Some(name) = tree.field(id, "name").and_then(Field::as_str) {
                declared.insert(CompactString::from(name));
            }
        }
        NodeKind::ObjectPattern => {
            if let Some(Field::List(properties)) = tree.field(id, "properties") {
                for property in properties.clone() {
                    if let Field::Node(property) = property {
                        if let Some(value) = tree.child(property, "value") {
                            collect_pattern(tree, value, declared);
                        } else if let Some(argument) = tree.child(property, "argument") {
                            // RestElement inside an object pattern.
                            collect_pattern(tree, argument, declared);
                        }
                    }
                }
            }
        }
        NodeKind::AssignmentPattern => {
            if let Some(left) = tree.child(id, "left") {
                collect_pattern(tree, left, declared);
            }
        }
        NodeKind::RestElement => {
            if let Some(argument) = tree.child(id, "argument") {
                collect_pattern(tree, argument, declared);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "a")]
    #[case(1, "b")]
    #[case(25, "z")]
    #[case(26, "A")]
    #[case(51, "Z")]
    #[case(52, "aa")]
    #[case(53, "ab")]
    #[case(103, "aZ")]
    #[case(104, "ba")]
    #[case(52 + 52 * 52, "aaa")]
    fn test_short_name_sequence(#[case] index: u32, #[case] expected: &str) {
        assert_eq!(short_name(index), expected);
    }

    #[test]
    fn test_short_names_never_collide() {
        let names: FxHashSet<CompactString> = (0..200_000).map(short_name).collect();
        assert_eq!(names.len(), 200_000);
    }

    #[test]
    fn test_short_name_avoids_reserved_words() {
        // "do" sits at 52 + 3 * 52 + 14 = 222 in the enumeration.
        let colliding = (0..100_000)
            .map(short_name)
            .find(|name| name.starts_with('_'))
            .unwrap();
        assert!(RESERVED_WORDS.contains(&&colliding[1..]));
        assert!(!(0..100_000).any(|i| RESERVED_WORDS.contains(&short_name(i).as_str())));
    }

    #[test]
    fn test_name_table_assigns_dense_ids_in_first_seen_order() {
        let mut table = NameTable::new();
        assert_eq!(table.id_for("alpha"), 0);
        assert_eq!(table.id_for("beta"), 1);
        assert_eq!(table.id_for("alpha"), 0);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_collect_declared_finds_declarators_and_params() {
        let mut tree = Tree::new();
        let x = tree.identifier("x");
        let one = tree.numeric_literal(1.0);
        let declarator = tree.variable_declarator(x, Some(one));
        let declaration = tree.variable_declaration("const", vec![declarator]);

        let f = tree.identifier("f");
        let p = tree.identifier("p");
        let used = tree.identifier("console");
        let statement = tree.expression_statement(used);
        let body = tree.block_statement(vec![statement]);
        let function = tree.function_declaration(f, vec![p], body);

        let program = tree.program(vec![declaration, function]);
        tree.file(program);

        let declared = collect_declared(&tree);
        assert!(declared.contains("x"));
        assert!(declared.contains("f"));
        assert!(declared.contains("p"));
        assert!(!declared.contains("console"));
    }
}
