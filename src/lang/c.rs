//! C language support.
//!
//! Parses with tree-sitter-c and lowers the concrete tree into the node model.
//! Lowering resolves just enough typing to tell integer values from pointers:
//! a scope stack for variables and parameters, a table of struct/union field
//! types, and a table of typedefs.

use super::Language;
use crate::error::{FixrevError, Result};
use crate::node::{
    JumpKind, Literal, NodeData, NodeId, NodeKind, Role, SyntaxTree, TreeBuilder, TypeCategory,
};
use std::collections::HashMap;
use std::path::PathBuf;
use tree_sitter::{Language as TsLanguage, Node as TsNode};

/// C programming language.
pub struct C;

impl Language for C {
    fn name(&self) -> &'static str {
        "c"
    }

    fn extensions(&self) -> &[&'static str] {
        &["c", "h"]
    }

    fn grammar(&self) -> TsLanguage {
        tree_sitter_c::LANGUAGE.into()
    }

    fn build_tree(&self, source: &str) -> Result<SyntaxTree> {
        let tree = self.parse(source)?;
        let root = tree.root_node();

        if let Some(bad) = first_error(root) {
            let at = bad.start_position();
            return Err(FixrevError::Parse {
                path: PathBuf::from("<source>"),
                message: format!("syntax error at line {}, column {}", at.row + 1, at.column + 1),
            });
        }

        let mut lowering = Lowering::new(source);
        lowering.collect_declared_types(root, "type_definition");
        lowering.collect_declared_types(root, "field_declaration");
        let id = lowering.lower(root)?;
        lowering.builder.finish(id)
    }
}

/// Type names that denote integers without further resolution.
const INTEGER_TYPES: &[&str] = &[
    "char", "short", "int", "long", "signed", "unsigned", "bool", "_Bool", "size_t", "ssize_t",
    "ptrdiff_t", "intptr_t", "uintptr_t", "intmax_t", "uintmax_t", "off_t", "wchar_t", "int8_t",
    "int16_t", "int32_t", "int64_t", "uint8_t", "uint16_t", "uint32_t", "uint64_t", "char16_t",
    "char32_t",
];

/// Concrete nodes lowered as opaque leaves.
const OPAQUE_KINDS: &[&str] = &[
    "type_definition",
    "struct_specifier",
    "union_specifier",
    "enum_specifier",
    "preproc_include",
    "preproc_def",
    "preproc_function_def",
    "preproc_call",
    "primitive_type",
    "type_identifier",
    "type_descriptor",
    "sized_type_specifier",
    "statement_identifier",
    "field_identifier",
];

fn first_error(root: TsNode<'_>) -> Option<TsNode<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<_> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

fn named_children<'tree>(node: TsNode<'tree>) -> Vec<TsNode<'tree>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|child| !child.is_extra())
        .collect()
}

fn field_children<'tree>(node: TsNode<'tree>, field: &str) -> Vec<TsNode<'tree>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

/// Parses a C number literal. `None` for floating-point spellings.
fn parse_integer(text: &str) -> Option<u128> {
    let cleaned: String = text.chars().filter(|&c| c != '\'').collect();
    let lower = cleaned.to_ascii_lowercase();

    let (digits, radix) = if let Some(hex) = lower.strip_prefix("0x") {
        if hex.contains('.') || hex.contains('p') {
            return None;
        }
        (hex, 16)
    } else if let Some(bin) = lower.strip_prefix("0b") {
        (bin, 2)
    } else {
        if lower.contains('.') || lower.contains('e') {
            return None;
        }
        if lower.len() > 1 && lower.starts_with('0') {
            (&lower[1..], 8)
        } else {
            (lower.as_str(), 10)
        }
    };

    let digits = digits.trim_end_matches(['u', 'l', 'z']);
    if digits.is_empty() {
        // "0", "0u", "0ul" after the octal prefix was split off
        return Some(0);
    }
    u128::from_str_radix(digits, radix).ok()
}

struct Lowering<'s> {
    source: &'s str,
    builder: TreeBuilder,
    scopes: Vec<HashMap<String, TypeCategory>>,
    fields: HashMap<String, TypeCategory>,
    typedefs: HashMap<String, TypeCategory>,
}

impl<'s> Lowering<'s> {
    fn new(source: &'s str) -> Self {
        Self {
            source,
            builder: TreeBuilder::new(source),
            scopes: vec![HashMap::new()],
            fields: HashMap::new(),
            typedefs: HashMap::new(),
        }
    }

    fn text(&self, node: TsNode<'_>) -> &'s str {
        &self.source[node.byte_range()]
    }

    fn data(&self, kind: NodeKind, node: TsNode<'_>) -> NodeData {
        NodeData::new(kind, node.byte_range())
    }

    fn declare(&mut self, name: String, category: TypeCategory) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, category);
        }
    }

    fn lookup(&self, name: &str) -> Option<TypeCategory> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    /// Records typedef or field types declared anywhere in the unit.
    fn collect_declared_types(&mut self, root: TsNode<'_>, kind: &str) {
        let mut stack = vec![root];
        let mut found = Vec::new();
        while let Some(node) = stack.pop() {
            if node.kind() == kind {
                found.push(node);
            }
            let children = named_children(node);
            stack.extend(children.into_iter().rev());
        }

        for node in found {
            let base = node
                .child_by_field_name("type")
                .map(|ty| self.base_category(ty))
                .unwrap_or_default();
            for declarator in field_children(node, "declarator") {
                if let Some((name, category)) = self.declared(declarator, base) {
                    if kind == "type_definition" {
                        self.typedefs.insert(name, category);
                    } else {
                        // Fields are looked up by name alone; a name declared
                        // with different categories resolves to neither.
                        self.fields
                            .entry(name)
                            .and_modify(|known| {
                                if *known != category {
                                    *known = TypeCategory::Other;
                                }
                            })
                            .or_insert(category);
                    }
                }
            }
        }
    }

    fn base_category(&self, ty: TsNode<'_>) -> TypeCategory {
        let text = self.text(ty);
        match ty.kind() {
            "primitive_type" if INTEGER_TYPES.contains(&text) => TypeCategory::Integer,
            "sized_type_specifier" => {
                if text.contains("double") || text.contains("float") {
                    TypeCategory::Other
                } else {
                    TypeCategory::Integer
                }
            }
            "enum_specifier" => TypeCategory::Integer,
            "type_identifier" => self.typedefs.get(text).copied().unwrap_or_else(|| {
                if INTEGER_TYPES.contains(&text) {
                    TypeCategory::Integer
                } else {
                    TypeCategory::Other
                }
            }),
            _ => TypeCategory::Other,
        }
    }

    /// Name introduced by `declarator` and its type category. The innermost
    /// derivation around the name decides the category.
    fn declared(&self, declarator: TsNode<'_>, base: TypeCategory) -> Option<(String, TypeCategory)> {
        let mut category = base;
        let mut current = declarator;
        loop {
            match current.kind() {
                "identifier" | "field_identifier" | "type_identifier" => {
                    return Some((self.text(current).to_string(), category));
                }
                "pointer_declarator" | "array_declarator" => {
                    category = TypeCategory::Pointer;
                    current = current.child_by_field_name("declarator")?;
                }
                "function_declarator" => {
                    category = TypeCategory::Other;
                    current = current.child_by_field_name("declarator")?;
                }
                "init_declarator" => current = current.child_by_field_name("declarator")?,
                "parenthesized_declarator" | "attributed_declarator" => {
                    current = named_children(current).into_iter().next()?;
                }
                _ => return None,
            }
        }
    }

    /// Category of a `type_descriptor`, as written in casts.
    fn descriptor_category(&self, descriptor: TsNode<'_>) -> TypeCategory {
        let base = descriptor
            .child_by_field_name("type")
            .map(|ty| self.base_category(ty))
            .unwrap_or_default();
        let Some(mut current) = descriptor.child_by_field_name("declarator") else {
            return base;
        };
        let mut category = base;
        loop {
            match current.kind() {
                "abstract_pointer_declarator" | "abstract_array_declarator" => {
                    category = TypeCategory::Pointer;
                }
                "abstract_function_declarator" => category = TypeCategory::Other,
                "abstract_parenthesized_declarator" => {}
                _ => return category,
            }
            match current
                .child_by_field_name("declarator")
                .or_else(|| named_children(current).into_iter().next())
            {
                Some(next) => current = next,
                None => return category,
            }
        }
    }

    /// Lowers the tree under `root` with an explicit work stack, so nesting
    /// depth in the source never grows the call stack.
    fn lower(&mut self, root: TsNode<'_>) -> Result<NodeId> {
        let mut tasks = vec![Task::Lower(Role::Item, root)];
        let mut frames: Vec<Frame> = Vec::new();
        let mut lowered = None;

        while let Some(task) = tasks.pop() {
            let closed = match task {
                Task::Lower(role, node) => {
                    let (data, steps) = self.expand(node);
                    frames.push(Frame { role, data });
                    tasks.push(Task::Close);
                    tasks.extend(steps.into_iter().rev());
                    continue;
                }
                Task::Declare(name, category) => {
                    self.declare(name, category);
                    continue;
                }
                Task::PushScope => {
                    self.scopes.push(HashMap::new());
                    continue;
                }
                Task::PopScope => {
                    self.scopes.pop();
                    continue;
                }
                Task::Close => frames.pop(),
            };

            let Some(frame) = closed else {
                return Err(FixrevError::MalformedTree(
                    "lowering closed more nodes than it opened".to_string(),
                ));
            };
            let id = self.builder.add(frame.data);
            match frames.last_mut() {
                Some(parent) => parent.data.push_child(frame.role, id),
                None => lowered = Some(id),
            }
        }

        lowered.ok_or_else(|| FixrevError::MalformedTree("nothing was lowered".to_string()))
    }

    /// The node data for `node` plus the steps that lower its children, in
    /// source order.
    fn expand<'tree>(&mut self, node: TsNode<'tree>) -> (NodeData, Vec<Task<'tree>>) {
        let mut steps = Vec::new();
        let data = match node.kind() {
            "translation_unit" => {
                steps.extend(list(node, Role::Item));
                self.data(NodeKind::TranslationUnit, node)
            }
            "compound_statement" => {
                steps.push(Task::PushScope);
                steps.extend(list(node, Role::Statement));
                steps.push(Task::PopScope);
                self.data(NodeKind::CompoundStatement, node)
            }
            "function_definition" => self.expand_function(node, &mut steps),
            "declaration" => self.expand_declaration(node, &mut steps),
            "expression_statement" => {
                steps.extend(first(node, Role::Expression));
                self.data(NodeKind::ExpressionStatement, node)
            }
            "if_statement" => {
                if let Some(condition) = node.child_by_field_name("condition") {
                    steps.push(Task::Lower(Role::Condition, unparenthesized(condition)));
                }
                if let Some(then) = node.child_by_field_name("consequence") {
                    steps.push(Task::Lower(Role::Then, then));
                }
                if let Some(alternative) = node.child_by_field_name("alternative") {
                    let branch = if alternative.kind() == "else_clause" {
                        named_children(alternative).into_iter().next()
                    } else {
                        Some(alternative)
                    };
                    steps.extend(branch.map(|b| Task::Lower(Role::Else, b)));
                }
                self.data(NodeKind::IfStatement, node)
            }
            "while_statement" => {
                if let Some(condition) = node.child_by_field_name("condition") {
                    steps.push(Task::Lower(Role::Condition, unparenthesized(condition)));
                }
                steps.extend(field(node, "body", Role::Body));
                self.data(NodeKind::WhileStatement, node)
            }
            "for_statement" => {
                steps.push(Task::PushScope);
                for (name, role) in [
                    ("initializer", Role::Init),
                    ("condition", Role::Condition),
                    ("update", Role::Update),
                    ("body", Role::Body),
                ] {
                    steps.extend(field(node, name, role));
                }
                steps.push(Task::PopScope);
                self.data(NodeKind::ForStatement, node)
            }
            "return_statement" => {
                steps.extend(first(node, Role::Value));
                self.jump(node, JumpKind::Return)
            }
            "break_statement" => self.jump(node, JumpKind::Break),
            "continue_statement" => self.jump(node, JumpKind::Continue),
            "goto_statement" => self.jump(node, JumpKind::Goto),
            "identifier" => self.identifier(node),
            "null" => self.literal(node, Literal::Null),
            "number_literal" => {
                let literal = parse_integer(self.text(node))
                    .map(Literal::Integer)
                    .unwrap_or(Literal::Float);
                self.literal(node, literal)
            }
            "char_literal" => self.literal(node, Literal::Char),
            "string_literal" | "concatenated_string" | "raw_string_literal" => {
                self.literal(node, Literal::String)
            }
            "true" => self.literal(node, Literal::Bool(true)),
            "false" => self.literal(node, Literal::Bool(false)),
            "parenthesized_expression" => {
                steps.extend(first(node, Role::Operand));
                self.data(NodeKind::Parenthesis, node)
            }
            "cast_expression" => {
                let category = node
                    .child_by_field_name("type")
                    .map(|ty| self.descriptor_category(ty))
                    .unwrap_or_default();
                steps.extend(field(node, "value", Role::Operand));
                self.data(NodeKind::Cast, node).with_type(category)
            }
            "binary_expression" | "assignment_expression" | "comma_expression" => {
                let op = if node.kind() == "comma_expression" {
                    ","
                } else {
                    node.child_by_field_name("operator")
                        .map(|op| op.kind())
                        .unwrap_or_default()
                };
                steps.extend(field(node, "left", Role::Left));
                steps.extend(field(node, "right", Role::Right));
                self.data(NodeKind::BinaryOp, node).with_operator(op)
            }
            "unary_expression" | "pointer_expression" | "update_expression" => {
                let op = node
                    .child_by_field_name("operator")
                    .map(|op| op.kind())
                    .unwrap_or_default();
                steps.extend(field(node, "argument", Role::Operand));
                self.data(NodeKind::UnaryOp, node).with_operator(op)
            }
            "sizeof_expression" => self.expand_sizeof(node, &mut steps),
            "call_expression" => {
                let mut data = self.data(NodeKind::Call, node);
                if let Some(function) = node.child_by_field_name("function") {
                    if function.kind() == "identifier" {
                        data = data.with_name(self.text(function));
                    }
                    steps.push(Task::Lower(Role::Callee, function));
                }
                if let Some(arguments) = node.child_by_field_name("arguments") {
                    steps.extend(list(arguments, Role::Argument));
                }
                data
            }
            "field_expression" => {
                let mut data = self.data(NodeKind::MemberAccess, node);
                if let Some(op) = node.child_by_field_name("operator") {
                    data = data.with_operator(op.kind());
                }
                if let Some(member) = node.child_by_field_name("field") {
                    let name = self.text(member);
                    let category = self.fields.get(name).copied().unwrap_or_default();
                    data = data.with_name(name).with_type(category);
                }
                steps.extend(field(node, "argument", Role::Operand));
                data
            }
            kind if OPAQUE_KINDS.contains(&kind) => {
                self.data(NodeKind::Other, node).with_label(kind)
            }
            kind => {
                steps.extend(list(node, Role::Child));
                self.data(NodeKind::Other, node).with_label(kind)
            }
        };
        (data, steps)
    }

    fn jump(&self, node: TsNode<'_>, kind: JumpKind) -> NodeData {
        self.data(NodeKind::JumpStatement, node).with_jump(kind)
    }

    fn literal(&self, node: TsNode<'_>, literal: Literal) -> NodeData {
        let category = match literal {
            Literal::Integer(_) | Literal::Char | Literal::Bool(_) => TypeCategory::Integer,
            Literal::Null => TypeCategory::Pointer,
            Literal::Float | Literal::String => TypeCategory::Other,
        };
        self.data(NodeKind::Literal, node)
            .with_literal(literal)
            .with_type(category)
    }

    fn identifier(&self, node: TsNode<'_>) -> NodeData {
        let name = self.text(node);
        if matches!(name, "NULL" | "nullptr") {
            return self.literal(node, Literal::Null);
        }
        let category = self.lookup(name).unwrap_or_default();
        self.data(NodeKind::VariableReference, node)
            .with_name(name)
            .with_type(category)
    }

    fn expand_function<'tree>(
        &mut self,
        node: TsNode<'tree>,
        steps: &mut Vec<Task<'tree>>,
    ) -> NodeData {
        let mut data = self.data(NodeKind::FunctionDefinition, node);
        let declarator = node.child_by_field_name("declarator");
        if let Some((name, _)) = declarator.and_then(|d| self.declared(d, TypeCategory::Other)) {
            self.declare(name.clone(), TypeCategory::Other);
            data = data.with_name(name);
        }

        steps.push(Task::PushScope);
        if let Some(parameters) = declarator.and_then(find_parameters) {
            for parameter in named_children(parameters) {
                if parameter.kind() != "parameter_declaration" {
                    continue;
                }
                let base = parameter
                    .child_by_field_name("type")
                    .map(|ty| self.base_category(ty))
                    .unwrap_or_default();
                if let Some((name, category)) = parameter
                    .child_by_field_name("declarator")
                    .and_then(|d| self.declared(d, base))
                {
                    steps.push(Task::Declare(name, category));
                }
            }
        }
        steps.extend(field(node, "body", Role::Body));
        steps.push(Task::PopScope);
        data
    }

    /// Each name is in scope from its own declarator on, initializer included.
    fn expand_declaration<'tree>(
        &self,
        node: TsNode<'tree>,
        steps: &mut Vec<Task<'tree>>,
    ) -> NodeData {
        let mut data = self.data(NodeKind::Declaration, node);
        let base = node
            .child_by_field_name("type")
            .map(|ty| self.base_category(ty))
            .unwrap_or_default();
        for declarator in field_children(node, "declarator") {
            if let Some((name, category)) = self.declared(declarator, base) {
                data = data.with_name(name.clone());
                steps.push(Task::Declare(name, category));
            }
            if declarator.kind() == "init_declarator" {
                steps.extend(field(declarator, "value", Role::Value));
            }
        }
        data
    }

    fn expand_sizeof<'tree>(
        &mut self,
        node: TsNode<'tree>,
        steps: &mut Vec<Task<'tree>>,
    ) -> NodeData {
        let mut data = self.data(NodeKind::UnaryOp, node).with_operator("sizeof");
        if let Some(value) = node.child_by_field_name("value") {
            steps.push(Task::Lower(Role::Operand, value));
        } else if let Some(descriptor) = node.child_by_field_name("type") {
            // `sizeof(x)` reads as a type name when `x` is a bare identifier.
            let variable = descriptor
                .child_by_field_name("type")
                .filter(|ty| {
                    ty.kind() == "type_identifier"
                        && descriptor.child_by_field_name("declarator").is_none()
                })
                .and_then(|ty| {
                    let name = self.text(ty);
                    self.lookup(name).map(|category| {
                        self.data(NodeKind::VariableReference, ty)
                            .with_name(name)
                            .with_type(category)
                    })
                });
            match variable {
                Some(variable) => data.push_child(Role::Operand, self.builder.add(variable)),
                None => steps.push(Task::Lower(Role::Operand, descriptor)),
            }
        }
        data
    }
}

/// One step of the lowering walk.
enum Task<'tree> {
    /// Lower a node and attach it to the innermost open frame.
    Lower(Role, TsNode<'tree>),
    Declare(String, TypeCategory),
    PushScope,
    PopScope,
    /// Every child of the innermost frame is lowered.
    Close,
}

/// A node whose children are still being lowered.
struct Frame {
    role: Role,
    data: NodeData,
}

fn list<'tree>(node: TsNode<'tree>, role: Role) -> impl Iterator<Item = Task<'tree>> {
    named_children(node)
        .into_iter()
        .map(move |child| Task::Lower(role, child))
}

fn first<'tree>(node: TsNode<'tree>, role: Role) -> Option<Task<'tree>> {
    named_children(node)
        .into_iter()
        .next()
        .map(|child| Task::Lower(role, child))
}

fn field<'tree>(node: TsNode<'tree>, name: &str, role: Role) -> Vec<Task<'tree>> {
    field_children(node, name)
        .into_iter()
        .map(|child| Task::Lower(role, child))
        .collect()
}

/// If/while conditions are lowered without their mandatory parentheses.
fn unparenthesized(condition: TsNode<'_>) -> TsNode<'_> {
    if condition.kind() == "parenthesized_expression"
        && let Some(inner) = named_children(condition).into_iter().next()
    {
        return inner;
    }
    condition
}

/// The parameter list of the function declarator nested in `declarator`.
fn find_parameters(declarator: TsNode<'_>) -> Option<TsNode<'_>> {
    let mut current = declarator;
    loop {
        if current.kind() == "function_declarator" {
            return current.child_by_field_name("parameters");
        }
        current = current
            .child_by_field_name("declarator")
            .or_else(|| named_children(current).into_iter().next())?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;

    fn lower(source: &str) -> SyntaxTree {
        C.build_tree(source).unwrap()
    }

    fn find<'t>(tree: &'t SyntaxTree, pred: impl Fn(&Node<'t>) -> bool) -> Node<'t> {
        tree.root().descendants().find(|n| pred(n)).expect("node not found")
    }

    fn variable<'t>(tree: &'t SyntaxTree, name: &str) -> Node<'t> {
        find(tree, |n| n.kind() == NodeKind::VariableReference && n.name() == Some(name))
    }

    #[test]
    fn test_if_condition_drops_parentheses() {
        let tree = lower("void f(int *p) { if (p == NULL) { return; } else p++; }");
        let stmt = find(&tree, |n| n.kind() == NodeKind::IfStatement);
        let condition = stmt.child(Role::Condition).unwrap();
        assert_eq!(condition.kind(), NodeKind::BinaryOp);
        assert_eq!(condition.text(), "p == NULL");
        assert_eq!(stmt.child(Role::Then).unwrap().text(), "{ return; }");
        assert_eq!(stmt.child(Role::Else).unwrap().text(), "p++;");
    }

    #[test]
    fn test_resolves_parameter_and_local_types() {
        let tree = lower(
            "void f(int n, char *s, unsigned long m) { double d; int arr[4]; n; s; m; d; arr; }",
        );
        assert_eq!(variable(&tree, "n").ty(), TypeCategory::Integer);
        assert_eq!(variable(&tree, "s").ty(), TypeCategory::Pointer);
        assert_eq!(variable(&tree, "m").ty(), TypeCategory::Integer);
        assert_eq!(variable(&tree, "d").ty(), TypeCategory::Other);
        assert_eq!(variable(&tree, "arr").ty(), TypeCategory::Pointer);
    }

    #[test]
    fn test_inner_scope_shadows_outer() {
        let tree = lower("int x; void f(void) { char *x; x; }");
        assert_eq!(variable(&tree, "x").ty(), TypeCategory::Pointer);
    }

    #[test]
    fn test_member_access_and_typedef_types() {
        let tree = lower(
            "typedef struct node *node_t;\n\
             struct node { int val; struct node *next; node_t prev; };\n\
             void f(node_t n) { n->val; n->next; n->prev; n; }",
        );
        let member = |name: &str| {
            find(&tree, |n| n.kind() == NodeKind::MemberAccess && n.name() == Some(name)).ty()
        };
        assert_eq!(member("val"), TypeCategory::Integer);
        assert_eq!(member("next"), TypeCategory::Pointer);
        assert_eq!(member("prev"), TypeCategory::Pointer);
        assert_eq!(variable(&tree, "n").ty(), TypeCategory::Pointer);
    }

    #[test]
    fn test_conflicting_field_categories_resolve_to_other() {
        let tree = lower(
            "struct span { double len; int count; };\n\
             struct text { char *len; int count; };\n\
             void f(struct span *s, struct text *t) { t->len; s->count; }",
        );
        let member = |name: &str| {
            find(&tree, |n| n.kind() == NodeKind::MemberAccess && n.name() == Some(name)).ty()
        };
        assert_eq!(member("len"), TypeCategory::Other);
        assert_eq!(member("count"), TypeCategory::Integer);
    }

    #[test]
    fn test_long_operator_chain() {
        let terms = vec!["a"; 10_000].join(" + ");
        let tree = lower(&format!("int f(int a) {{ return {terms}; }}"));

        let sums = tree
            .root()
            .descendants()
            .filter(|n| n.operator() == Some("+"))
            .count();
        assert_eq!(sums, 9_999);

        let value = find(&tree, |n| n.jump() == Some(JumpKind::Return))
            .child(Role::Value)
            .unwrap();
        assert_eq!(value.text(), terms);
        assert_eq!(variable(&tree, "a").ty(), TypeCategory::Integer);
    }

    #[test]
    fn test_deeply_nested_blocks_keep_scopes() {
        let depth = 2_000;
        let source = format!(
            "void f(int p) {{ {open} char *p; p; {close} p; }}",
            open = "{ ".repeat(depth),
            close = "} ".repeat(depth),
        );
        let tree = lower(&source);
        let types: Vec<TypeCategory> = tree
            .root()
            .descendants()
            .filter(|n| n.kind() == NodeKind::VariableReference)
            .map(|n| n.ty())
            .collect();
        assert_eq!(types, vec![TypeCategory::Pointer, TypeCategory::Integer]);
        assert_eq!(
            tree.root()
                .descendants()
                .filter(|n| n.kind() == NodeKind::CompoundStatement)
                .count(),
            depth + 1
        );
    }

    #[test]
    fn test_null_spellings_and_numbers() {
        let tree = lower("void f(void) { NULL; 0; 0x1F; 10u; 017; 1.5; 'a'; }");
        let literals: Vec<Literal> = tree
            .root()
            .descendants()
            .filter_map(|n| n.literal().cloned())
            .collect();
        assert_eq!(
            literals,
            vec![
                Literal::Null,
                Literal::Integer(0),
                Literal::Integer(31),
                Literal::Integer(10),
                Literal::Integer(15),
                Literal::Float,
                Literal::Char,
            ]
        );
    }

    #[test]
    fn test_parse_integer_spellings() {
        assert_eq!(parse_integer("0"), Some(0));
        assert_eq!(parse_integer("0UL"), Some(0));
        assert_eq!(parse_integer("0b101"), Some(5));
        assert_eq!(parse_integer("1'000"), Some(1000));
        assert_eq!(parse_integer("1e3"), None);
        assert_eq!(parse_integer("0x1p3"), None);
    }

    #[test]
    fn test_cast_records_target_type() {
        let tree = lower("void f(void) { (void *)0; (int)0; }");
        let casts: Vec<TypeCategory> = tree
            .root()
            .descendants()
            .filter(|n| n.kind() == NodeKind::Cast)
            .map(|n| n.ty())
            .collect();
        assert_eq!(casts, vec![TypeCategory::Pointer, TypeCategory::Integer]);
    }

    #[test]
    fn test_call_lowering() {
        let tree = lower("int g(int); void f(int a) { g(a); }");
        let call = find(&tree, |n| n.kind() == NodeKind::Call);
        assert_eq!(call.name(), Some("g"));
        assert_eq!(call.children_with(Role::Argument).count(), 1);
        assert_eq!(call.child(Role::Callee).unwrap().text(), "g");
    }

    #[test]
    fn test_sizeof_of_variable() {
        let tree = lower("void f(int len) { sizeof(len); sizeof len; }");
        let operands: Vec<NodeKind> = tree
            .root()
            .descendants()
            .filter(|n| n.operator() == Some("sizeof"))
            .map(|n| {
                let mut operand = n.child(Role::Operand).unwrap();
                while operand.kind() == NodeKind::Parenthesis {
                    operand = operand.child(Role::Operand).unwrap();
                }
                operand.kind()
            })
            .collect();
        assert_eq!(operands, vec![NodeKind::VariableReference, NodeKind::VariableReference]);
    }

    #[test]
    fn test_for_statement_roles() {
        let tree = lower("void f(int n) { for (int i = 0; i < n; i++) { n--; } }");
        let stmt = find(&tree, |n| n.kind() == NodeKind::ForStatement);
        assert_eq!(stmt.child(Role::Init).unwrap().kind(), NodeKind::Declaration);
        assert_eq!(stmt.child(Role::Condition).unwrap().text(), "i < n");
        assert_eq!(stmt.child(Role::Update).unwrap().text(), "i++");
        assert_eq!(stmt.child(Role::Body).unwrap().text(), "{ n--; }");
        assert_eq!(variable(&tree, "i").ty(), TypeCategory::Integer);
    }

    #[test]
    fn test_comments_are_not_statements() {
        let tree = lower("void f(int a) { /* one */ a; // two\n a; }");
        let body = find(&tree, |n| n.kind() == NodeKind::CompoundStatement);
        assert_eq!(body.statement_count(), 2);
    }

    #[test]
    fn test_jump_statements() {
        let tree = lower("void f(int a) { while (a) { if (a) break; if (a) continue; goto out; } out: return; }");
        let jumps: Vec<JumpKind> = tree.root().descendants().filter_map(|n| n.jump()).collect();
        assert_eq!(
            jumps,
            vec![JumpKind::Break, JumpKind::Continue, JumpKind::Goto, JumpKind::Return]
        );
    }

    #[test]
    fn test_syntax_error_is_rejected() {
        let err = C.build_tree("void f( { if (").unwrap_err();
        assert!(matches!(err, FixrevError::Parse { .. }));
    }
}
