use std::collections::{HashMap, HashSet};

use crate::{
    ast::{
        ast::{Expr, VisitorMut},
        expressions::{
            ArrayLiteralExpr, BinaryExpr, BoolExpr, CallExpr, CastExpr, FloatExpr, IndexExpr,
            IntExpr, MemberExpr, StringExpr, UnaryExpr, VariableExpr,
        },
        statements::{
            BranchStmt, ExternDeclStmt, FnDeclStmt, Item, LinkStmt, LoopStmt, ReturnStmt, Stmt,
            StructDeclStmt, Toplevel, VarDeclStmt,
        },
        types::{FunctionSignature, Member, Type, PRIMITIVES},
    },
    errors::errors::{ErrorImpl, ErrorStack},
    lexer::tokens::TokenKind,
    Position,
};

/// A variable declared inside a function body.
#[derive(Debug, Clone, PartialEq)]
pub struct Local {
    pub name: String,
    pub ty: Type,
    /// Block depth of the declaration, 0 for parameters and top-level statements
    pub depth: u32,
}

/// Every local of one function.
///
/// `declared` keeps all locals in declaration order for the code generator.
/// `visible` maps a name to the stack of declarations currently in scope,
/// innermost last, as indices into `declared`.
#[derive(Debug, Default)]
pub struct Locals {
    declared: Vec<Local>,
    visible: HashMap<String, Vec<usize>>,
}

impl Locals {
    /// Declares a local at `depth`.
    ///
    /// Shadowing a declaration from an outer block is allowed; a second
    /// declaration at the same depth is not.
    pub fn declare(&mut self, name: &str, ty: Type, depth: u32) -> Result<(), ErrorImpl> {
        let stack = self.visible.entry(name.to_string()).or_default();

        if let Some(index) = stack.last() {
            if self.declared[*index].depth == depth {
                return Err(ErrorImpl::VariableRedefinition {
                    variable: name.to_string(),
                });
            }
        }

        stack.push(self.declared.len());
        self.declared.push(Local {
            name: name.to_string(),
            ty,
            depth,
        });
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Local> {
        let index = self.visible.get(name)?.last()?;
        self.declared.get(*index)
    }

    /// Drops every declaration deeper than `depth`.
    pub fn close_blocks(&mut self, depth: u32) {
        for stack in self.visible.values_mut() {
            while stack
                .last()
                .is_some_and(|index| self.declared[*index].depth > depth)
            {
                stack.pop();
            }
        }
    }

    pub fn declared(&self) -> &[Local] {
        &self.declared
    }
}

/// The semantic analyzer and the symbol table it leaves behind.
///
/// Analysis walks the tree through `VisitorMut`. Each expression visit returns
/// the expression's type and also records it on the node. After an error the
/// unresolved type is returned, which silences follow-up diagnostics on the
/// same expression.
#[derive(Debug)]
pub struct SymTable {
    structs: HashMap<String, Type>,
    functions: HashMap<String, FunctionSignature>,
    locals: HashMap<String, Locals>,
    /// Signature of the function whose body is being analyzed
    current: Option<FunctionSignature>,
    block_depth: u32,
    found_return: bool,
    errors: ErrorStack,
}

impl Default for SymTable {
    fn default() -> Self {
        SymTable::new()
    }
}

impl SymTable {
    pub fn new() -> Self {
        let structs = PRIMITIVES
            .iter()
            .map(|name| (name.to_string(), Type::named(name)))
            .collect();

        SymTable {
            structs,
            functions: HashMap::new(),
            locals: HashMap::new(),
            current: None,
            block_depth: 0,
            found_return: false,
            errors: ErrorStack::new(),
        }
    }

    /// Analyzes a whole program in place.
    ///
    /// Fills in expression types and `var` declarations, rewrites non-boolean
    /// conditions and drops statements after a top-level `return`. Diagnostics
    /// are appended to `errors`. A toplevel that was already analyzed is left
    /// untouched.
    pub fn analyze(&mut self, toplevel: &mut Toplevel, errors: &mut ErrorStack) {
        toplevel.accept_mut(self);

        for error in self.errors.drain() {
            errors.push_error(error);
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn struct_type(&self, name: &str) -> Option<&Type> {
        self.structs.get(name)
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.structs.contains_key(name)
    }

    /// Type of `member` in the struct named by `ty`.
    pub fn member_type(&self, ty: &Type, member: &str) -> Option<&Type> {
        self.structs
            .get(&ty.name)?
            .members
            .iter()
            .find(|candidate| candidate.name == member)
            .map(|candidate| &candidate.ty)
    }

    /// Members of a struct in storage order.
    ///
    /// Volatile structs keep their declaration order. Other structs place
    /// larger members first; members of equal size keep declaration order.
    pub fn layout(&self, name: &str) -> Option<Vec<&Member>> {
        let declared = self.structs.get(name)?;
        let mut members: Vec<&Member> = declared.members.iter().collect();

        if !declared.volatile {
            members.sort_by_key(|member| std::cmp::Reverse(self.size_of(&member.ty)));
        }

        Some(members)
    }

    /// Index of `member` in the storage order of the struct named by `ty`.
    pub fn member_offset(&self, ty: &Type, member: &str) -> Option<usize> {
        self.layout(&ty.name)?
            .iter()
            .position(|candidate| candidate.name == member)
    }

    /// Byte offset of `member`, without padding.
    pub fn member_byte_offset(&self, ty: &Type, member: &str) -> Option<u32> {
        let layout = self.layout(&ty.name)?;
        let index = layout.iter().position(|candidate| candidate.name == member)?;

        Some(
            layout[..index]
                .iter()
                .map(|candidate| self.size_of(&candidate.ty))
                .sum(),
        )
    }

    /// Storage size in bytes, resolving struct names against this table.
    pub fn size_of(&self, ty: &Type) -> u32 {
        self.size_of_guarded(ty, &mut vec![])
    }

    fn size_of_guarded<'a>(&'a self, ty: &'a Type, visiting: &mut Vec<&'a str>) -> u32 {
        if ty.is_pointer() {
            return ty.size();
        }

        if let Some(element) = ty.element_type() {
            let mut resolved = ty.clone();
            if let Some(declared) = self.structs.get(&element.name) {
                if let Some(element) = resolved.element.as_mut() {
                    element.members = declared.members.clone();
                }
            }
            return resolved.size();
        }

        match self.structs.get(&ty.name) {
            Some(declared) if !declared.members.is_empty() => {
                if visiting.contains(&ty.name.as_str()) {
                    return 0;
                }
                visiting.push(&ty.name);
                let size = declared
                    .members
                    .iter()
                    .map(|member| self.size_of_guarded(&member.ty, visiting))
                    .sum();
                visiting.pop();
                size
            }
            _ => ty.size(),
        }
    }

    /// Locals of `function` in declaration order.
    pub fn locals_of(&self, function: &str) -> Option<&[Local]> {
        self.locals.get(function).map(|locals| locals.declared())
    }

    /// Human readable listing of all types and functions, sorted by name.
    pub fn dump(&self) -> String {
        let mut buffer = String::from("Types:\n");

        let mut names: Vec<&String> = self.structs.keys().collect();
        names.sort();
        for name in names {
            buffer.push_str(&self.structs[name].full_string());
            buffer.push('\n');
        }

        buffer.push_str("Functions:\n");
        let mut names: Vec<&String> = self.functions.keys().collect();
        names.sort();
        for name in names {
            let signature = &self.functions[name];
            buffer.push_str(&format!("{}\n\treturns {}\n", name, signature.return_type));
            for (ty, parameter) in signature
                .parameters
                .iter()
                .zip(signature.parameter_names.iter())
            {
                buffer.push_str(&format!("\t{} {}\n", ty, parameter));
            }
            buffer.push('\n');
        }

        buffer
    }

    fn error(&mut self, error: ErrorImpl, position: &Position) {
        self.errors.push(error, position.clone());
    }

    /// Checks that every name a type refers to is declared.
    fn check_type_exists(&mut self, ty: &Type, position: &Position) -> bool {
        if ty.is_variadic() || self.has_type(ty.base_name()) {
            return true;
        }

        self.error(
            ErrorImpl::UnknownType {
                type_: ty.base_name().to_string(),
            },
            position,
        );
        false
    }

    fn current_locals(&mut self) -> &mut Locals {
        let name = self
            .current
            .as_ref()
            .map(|signature| signature.name.clone())
            .unwrap_or_default();
        self.locals.entry(name).or_default()
    }

    fn lookup(&self, name: &str) -> Option<&Local> {
        let function = self.current.as_ref()?;
        self.locals.get(&function.name)?.get(name)
    }

    fn open_block(&mut self) {
        self.block_depth += 1;
    }

    fn close_block(&mut self) {
        self.block_depth -= 1;
        let depth = self.block_depth;
        self.current_locals().close_blocks(depth);
    }

    fn visit_body(&mut self, body: &mut [Stmt]) {
        for stmt in body.iter_mut() {
            stmt.accept_mut(self);
        }
    }

    /// Analyzes a condition and turns `int` and pointer results into
    /// `cond != 0`.
    fn demote_to_bool(&mut self, condition: &mut Expr) {
        let ty = condition.accept_mut(self);
        if ty.is_unresolved() || ty.is_scalar("bool") {
            return;
        }

        if ty.is_scalar("int") || ty.is_pointer() {
            let position = condition.get_position().clone();
            let mut zero = Expr::int(0, position.clone());
            zero.set_type(Type::int());

            let operand = std::mem::replace(condition, zero.clone());
            let mut demoted = Expr::binary(TokenKind::NotEquals, operand, zero, position);
            demoted.set_type(Type::bool());
            *condition = demoted;
            return;
        }

        let position = condition.get_position().clone();
        self.error(
            ErrorImpl::ConditionNotBool {
                type_: ty.to_string(),
            },
            &position,
        );
    }

    /// Registers every function, extern and struct name.
    ///
    /// Returns the item indices whose definitions won; later duplicates are
    /// reported and skipped.
    fn register_declarations(&mut self, toplevel: &Toplevel) -> HashSet<usize> {
        let mut accepted = HashSet::new();

        for (index, item) in toplevel.items.iter().enumerate() {
            match item {
                Item::Function(FnDeclStmt {
                    signature,
                    position,
                    ..
                })
                | Item::Extern(ExternDeclStmt {
                    signature,
                    position,
                }) => {
                    if self.functions.contains_key(&signature.name) {
                        self.error(
                            ErrorImpl::FunctionRedefinition {
                                function: signature.name.clone(),
                            },
                            position,
                        );
                        continue;
                    }
                    self.functions
                        .insert(signature.name.clone(), signature.clone());
                    accepted.insert(index);
                }
                Item::Struct(decl) => {
                    if self.structs.contains_key(&decl.name) {
                        self.error(
                            ErrorImpl::TypeRedefinition {
                                type_: decl.name.clone(),
                            },
                            &decl.position,
                        );
                        continue;
                    }
                    let mut ty = Type::named(&decl.name);
                    ty.volatile = decl.volatile;
                    self.structs.insert(decl.name.clone(), ty);
                    accepted.insert(index);
                }
                Item::Link(_) => {
                    accepted.insert(index);
                }
            }
        }

        accepted
    }

    /// Reports structs that contain themselves through by-value members.
    fn check_recursive_structs(&mut self, toplevel: &Toplevel, accepted: &HashSet<usize>) {
        for index in &toplevel.structs {
            let Some(Item::Struct(decl)) = toplevel.items.get(*index) else {
                continue;
            };
            if !accepted.contains(index) {
                continue;
            }

            if self.contains_by_value(&decl.name, &decl.name, &mut HashSet::new()) {
                self.error(
                    ErrorImpl::RecursiveStruct {
                        type_: decl.name.clone(),
                    },
                    &decl.position,
                );
            }
        }
    }

    fn contains_by_value(&self, outer: &str, name: &str, seen: &mut HashSet<String>) -> bool {
        if !seen.insert(name.to_string()) {
            return false;
        }

        let Some(declared) = self.structs.get(name) else {
            return false;
        };

        declared.members.iter().any(|member| {
            member.ty.is_struct()
                && (member.ty.name == outer || self.contains_by_value(outer, &member.ty.name, seen))
        })
    }

    fn check_signature(&mut self, signature: &FunctionSignature, position: &Position) {
        for ty in &signature.parameters {
            if self.check_type_exists(ty, position) && ty.is_void() {
                self.error(ErrorImpl::VoidVariable, position);
            }
        }
        self.check_type_exists(&signature.return_type, position);
    }

    /// Checks indexing. Realigned arrays may only be indexed as the target of
    /// a member access, which passes `allow_realigned`.
    fn analyze_index(&mut self, node: &mut IndexExpr, allow_realigned: bool) -> Type {
        let target = node.target.accept_mut(self);
        let index = node.index.accept_mut(self);

        let ty = if target.is_unresolved() {
            Type::unresolved()
        } else if !target.is_array() || target.is_pointer() {
            self.error(
                ErrorImpl::InvalidIndexTarget {
                    type_: target.to_string(),
                },
                &node.position,
            );
            Type::unresolved()
        } else if target.realigned && !allow_realigned {
            self.error(ErrorImpl::RealignedIndexWithoutMember, &node.position);
            Type::unresolved()
        } else {
            target.element_type().cloned().unwrap_or_default()
        };

        if !index.is_unresolved() && !index.is_scalar("int") {
            let position = node.index.get_position().clone();
            self.error(ErrorImpl::IndexType, &position);
        }

        node.ty = ty.clone();
        ty
    }

    fn check_arithmetic(&mut self, operator: TokenKind, ty: &Type, position: &Position) -> bool {
        if ty.is_arithmetic() {
            return true;
        }

        self.error(
            ErrorImpl::InvalidOperand {
                operator: operator.to_string(),
                type_: ty.to_string(),
            },
            position,
        );
        false
    }
}

fn call_matches(signature: &FunctionSignature, arguments: &[Type]) -> bool {
    let fixed = signature.fixed_parameters();

    let count_matches = if signature.is_variadic() {
        arguments.len() >= fixed.len()
    } else {
        arguments.len() == fixed.len()
    };

    count_matches
        && fixed.iter().zip(arguments).all(|(parameter, argument)| {
            argument.is_unresolved()
                || (parameter == argument && !realigned_mismatch(parameter, argument))
                || (parameter.is_void_pointer() && (argument.is_pointer() || argument.is_array()))
        })
}

/// Arrays that compare equal but differ in memory layout, e.g. `[]P` and
/// `[]@P`, at any nesting level.
fn realigned_mismatch(expected: &Type, received: &Type) -> bool {
    match (expected.element_type(), received.element_type()) {
        (Some(left), Some(right)) => {
            expected.realigned != received.realigned || realigned_mismatch(left, right)
        }
        _ => false,
    }
}

impl VisitorMut for SymTable {
    type Output = Type;

    fn visit_toplevel(&mut self, node: &mut Toplevel) -> Type {
        if node.analyzed {
            return Type::void();
        }

        let accepted = self.register_declarations(node);

        for index in node.structs.clone() {
            if !accepted.contains(&index) {
                continue;
            }
            if let Some(item) = node.items.get_mut(index) {
                item.accept_mut(self);
            }
        }
        self.check_recursive_structs(node, &accepted);

        for index in node.functions.iter().chain(node.externs.iter()) {
            if !accepted.contains(index) {
                continue;
            }
            match &node.items[*index] {
                Item::Function(decl) => self.check_signature(&decl.signature, &decl.position),
                Item::Extern(decl) => self.check_signature(&decl.signature, &decl.position),
                _ => {}
            }
        }

        for index in node.functions.clone() {
            if !accepted.contains(&index) {
                continue;
            }
            if let Some(item) = node.items.get_mut(index) {
                item.accept_mut(self);
            }
        }

        node.analyzed = true;
        Type::void()
    }

    fn visit_link(&mut self, _node: &mut LinkStmt) -> Type {
        Type::void()
    }

    fn visit_struct(&mut self, node: &mut StructDeclStmt) -> Type {
        let mut members: Vec<Member> = vec![];

        for member in &node.members {
            if !self.check_type_exists(&member.ty, &member.position) {
                continue;
            }
            if member.ty.is_void() {
                self.error(ErrorImpl::VoidVariable, &member.position);
                continue;
            }
            if members.iter().any(|existing| existing.name == member.name) {
                self.error(
                    ErrorImpl::MemberRedefinition {
                        type_: node.name.clone(),
                        member: member.name.clone(),
                    },
                    &member.position,
                );
                continue;
            }

            members.push(Member {
                name: member.name.clone(),
                ty: member.ty.clone(),
            });
        }

        let mut ty = Type::named(&node.name);
        ty.members = members;
        ty.volatile = node.volatile;
        self.structs.insert(node.name.clone(), ty.clone());
        ty
    }

    fn visit_function(&mut self, node: &mut FnDeclStmt) -> Type {
        self.current = Some(node.signature.clone());
        self.block_depth = 0;
        self.found_return = false;
        self.locals.insert(node.signature.name.clone(), Locals::default());

        for (ty, name) in node
            .signature
            .parameters
            .iter()
            .zip(node.signature.parameter_names.iter())
        {
            if self.structs.contains_key(name) {
                self.error(
                    ErrorImpl::IdentifierRedefinition {
                        identifier: name.clone(),
                    },
                    &node.position,
                );
                continue;
            }
            if let Err(error) = self.current_locals().declare(name, ty.clone(), 0) {
                self.error(error, &node.position);
            }
        }

        let mut end = node.body.len();
        for (index, stmt) in node.body.iter_mut().enumerate() {
            stmt.accept_mut(self);
            if self.found_return {
                end = index + 1;
                break;
            }
        }
        node.body.truncate(end);

        let return_type = &node.signature.return_type;
        if !self.found_return && !return_type.is_void() {
            self.error(
                ErrorImpl::MissingReturn {
                    function: node.signature.name.clone(),
                    expected: return_type.to_string(),
                },
                &node.position,
            );
        }

        self.current = None;
        Type::void()
    }

    fn visit_extern(&mut self, _node: &mut ExternDeclStmt) -> Type {
        Type::void()
    }

    fn visit_var_decl(&mut self, node: &mut VarDeclStmt) -> Type {
        if self.functions.contains_key(&node.identifier)
            || self.structs.contains_key(&node.identifier)
        {
            self.error(
                ErrorImpl::IdentifierRedefinition {
                    identifier: node.identifier.clone(),
                },
                &node.position,
            );
            return Type::void();
        }

        if !node.inferred {
            if !self.check_type_exists(&node.ty, &node.position) {
                return Type::void();
            }
            if node.ty.is_void() {
                self.error(ErrorImpl::VoidVariable, &node.position);
                return Type::void();
            }
        }

        if let Some(value) = node.value.as_mut() {
            let received = value.accept_mut(self);

            if node.inferred {
                if received.is_void() {
                    self.error(ErrorImpl::VoidVariable, &node.position);
                    return Type::void();
                }
                node.ty = received;
            } else if !received.is_unresolved()
                && (received != node.ty || realigned_mismatch(&node.ty, &received))
            {
                self.error(
                    ErrorImpl::AssignmentMismatch {
                        expected: node.ty.to_string(),
                        received: received.to_string(),
                    },
                    &node.position,
                );
            }
        }

        let depth = self.block_depth;
        let ty = node.ty.clone();
        if let Err(error) = self.current_locals().declare(&node.identifier, ty, depth) {
            self.error(error, &node.position);
        }

        Type::void()
    }

    fn visit_return(&mut self, node: &mut ReturnStmt) -> Type {
        let Some(signature) = self.current.clone() else {
            return Type::void();
        };
        let expected = &signature.return_type;

        match node.value.as_mut() {
            Some(value) => {
                let received = value.accept_mut(self);
                if expected.is_void() {
                    self.error(
                        ErrorImpl::ReturnValueInVoid {
                            function: signature.name.clone(),
                        },
                        &node.position,
                    );
                } else if !received.is_unresolved()
                    && (&received != expected || realigned_mismatch(expected, &received))
                {
                    self.error(
                        ErrorImpl::ReturnTypeMismatch {
                            function: signature.name.clone(),
                            expected: expected.to_string(),
                            received: received.to_string(),
                        },
                        &node.position,
                    );
                }
            }
            None if !expected.is_void() => {
                self.error(
                    ErrorImpl::ReturnTypeMismatch {
                        function: signature.name.clone(),
                        expected: expected.to_string(),
                        received: Type::void().to_string(),
                    },
                    &node.position,
                );
            }
            None => {}
        }

        if self.block_depth == 0 {
            self.found_return = true;
        }

        Type::void()
    }

    fn visit_branch(&mut self, node: &mut BranchStmt) -> Type {
        self.demote_to_bool(&mut node.condition);

        self.open_block();
        self.visit_body(&mut node.body);
        self.close_block();

        if let Some(else_body) = node.else_body.as_mut() {
            self.open_block();
            self.visit_body(else_body);
            self.close_block();
        }

        Type::void()
    }

    fn visit_loop(&mut self, node: &mut LoopStmt) -> Type {
        self.open_block();

        if let Some(prefix) = node.prefix.as_mut() {
            prefix.accept_mut(self);
        }
        self.demote_to_bool(&mut node.condition);
        if let Some(suffix) = node.suffix.as_mut() {
            suffix.accept_mut(self);
        }
        self.visit_body(&mut node.body);

        self.close_block();
        Type::void()
    }

    fn visit_call(&mut self, node: &mut CallExpr) -> Type {
        let arguments: Vec<Type> = node
            .arguments
            .iter_mut()
            .map(|argument| argument.accept_mut(self))
            .collect();

        let Some(signature) = self.functions.get(&node.identifier).cloned() else {
            self.error(
                ErrorImpl::UndefinedFunction {
                    function: node.identifier.clone(),
                },
                &node.position,
            );
            node.ty = Type::unresolved();
            return Type::unresolved();
        };

        if !call_matches(&signature, &arguments) {
            let call = format!(
                "{}({})",
                node.identifier,
                arguments
                    .iter()
                    .map(|ty| ty.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            self.error(
                ErrorImpl::SignatureMismatch {
                    call,
                    signature: signature.to_string(),
                },
                &node.position,
            );
        }

        node.ty = signature.return_type.clone();
        signature.return_type
    }

    fn visit_binary(&mut self, node: &mut BinaryExpr) -> Type {
        let left = node.left.accept_mut(self);
        let right = node.right.accept_mut(self);
        let operator = node.operator;

        let ty = if left.is_unresolved() || right.is_unresolved() {
            Type::unresolved()
        } else if operator == TokenKind::Push {
            match left.element_type() {
                Some(element) if !left.is_pointer() => {
                    if element == &right && !realigned_mismatch(element, &right) {
                        left.clone()
                    } else {
                        self.error(
                            ErrorImpl::TypeMismatch {
                                operator: operator.to_string(),
                                left: left.to_string(),
                                right: right.to_string(),
                            },
                            &node.position,
                        );
                        Type::unresolved()
                    }
                }
                _ => {
                    self.error(
                        ErrorImpl::InvalidOperand {
                            operator: operator.to_string(),
                            type_: left.to_string(),
                        },
                        &node.position,
                    );
                    Type::unresolved()
                }
            }
        } else if operator.is_assignment() {
            if left != right || realigned_mismatch(&left, &right) {
                self.error(
                    ErrorImpl::AssignmentMismatch {
                        expected: left.to_string(),
                        received: right.to_string(),
                    },
                    &node.position,
                );
                Type::unresolved()
            } else if operator != TokenKind::Assignment
                && !self.check_arithmetic(operator, &left, &node.position)
            {
                Type::unresolved()
            } else {
                left
            }
        } else if left != right {
            self.error(
                ErrorImpl::TypeMismatch {
                    operator: operator.to_string(),
                    left: left.to_string(),
                    right: right.to_string(),
                },
                &node.position,
            );
            Type::unresolved()
        } else if operator.is_comparison() {
            Type::bool()
        } else if self.check_arithmetic(operator, &left, &node.position) {
            left
        } else {
            Type::unresolved()
        };

        node.ty = ty.clone();
        ty
    }

    fn visit_unary(&mut self, node: &mut UnaryExpr) -> Type {
        let operand = node.operand.accept_mut(self);

        let ty = if operand.is_unresolved() {
            Type::unresolved()
        } else {
            match node.operator {
                TokenKind::Ampersand => operand.with_pointer_depth(operand.pointer_depth + 1),
                TokenKind::Star if operand.pointer_depth == 0 => {
                    self.error(ErrorImpl::CannotDereference, &node.position);
                    Type::unresolved()
                }
                TokenKind::Star => operand.with_pointer_depth(operand.pointer_depth - 1),
                TokenKind::Question if operand.is_array() && !operand.is_pointer() => Type::int(),
                TokenKind::Pop if operand.is_array() && !operand.is_pointer() => {
                    operand.element_type().cloned().unwrap_or_default()
                }
                operator => {
                    self.error(
                        ErrorImpl::InvalidOperand {
                            operator: operator.to_string(),
                            type_: operand.to_string(),
                        },
                        &node.position,
                    );
                    Type::unresolved()
                }
            }
        };

        node.ty = ty.clone();
        ty
    }

    fn visit_cast(&mut self, node: &mut CastExpr) -> Type {
        let operand = node.operand.accept_mut(self);

        let ty = if self.has_type(node.target.base_name()) {
            node.target.clone()
        } else {
            self.error(
                ErrorImpl::InvalidCast {
                    from: operand.to_string(),
                    to: node.target.to_string(),
                },
                &node.position,
            );
            Type::unresolved()
        };

        node.ty = ty.clone();
        ty
    }

    fn visit_array_literal(&mut self, node: &mut ArrayLiteralExpr) -> Type {
        if let Some(length) = node.length.as_mut() {
            let ty = length.accept_mut(self);
            if !ty.is_unresolved() && !ty.is_scalar("int") {
                let position = length.get_position().clone();
                self.error(ErrorImpl::ArrayLengthType, &position);
            }
        }

        let element = node.array_type.element_type().cloned().unwrap_or_default();
        let ty = if !self.check_type_exists(&element, &node.position) {
            Type::unresolved()
        } else if node.array_type.realigned && !element.is_struct() {
            self.error(
                ErrorImpl::RealignedElement {
                    type_: element.to_string(),
                },
                &node.position,
            );
            Type::unresolved()
        } else {
            node.array_type.clone()
        };

        node.ty = ty.clone();
        ty
    }

    fn visit_index(&mut self, node: &mut IndexExpr) -> Type {
        self.analyze_index(node, false)
    }

    fn visit_member(&mut self, node: &mut MemberExpr) -> Type {
        let target = match node.target.as_mut() {
            Expr::Index(index) => self.analyze_index(index, true),
            target => target.accept_mut(self),
        };

        let ty = if target.is_unresolved() {
            Type::unresolved()
        } else {
            match self.member_type(&target, &node.member) {
                Some(member) if target.is_struct() => member.clone(),
                _ => {
                    self.error(
                        ErrorImpl::UnknownMember {
                            type_: target.to_string(),
                            member: node.member.clone(),
                        },
                        &node.position,
                    );
                    Type::unresolved()
                }
            }
        };

        node.ty = ty.clone();
        ty
    }

    fn visit_variable(&mut self, node: &mut VariableExpr) -> Type {
        let ty = match self.lookup(&node.identifier) {
            Some(local) => local.ty.clone(),
            None => {
                self.error(
                    ErrorImpl::UndefinedVariable {
                        variable: node.identifier.clone(),
                    },
                    &node.position,
                );
                Type::unresolved()
            }
        };

        node.ty = ty.clone();
        ty
    }

    fn visit_string(&mut self, node: &mut StringExpr) -> Type {
        node.ty = Type::pointer("char", 1);
        node.ty.clone()
    }

    fn visit_int(&mut self, node: &mut IntExpr) -> Type {
        node.ty = Type::int();
        Type::int()
    }

    fn visit_float(&mut self, node: &mut FloatExpr) -> Type {
        node.ty = Type::float();
        Type::float()
    }

    fn visit_bool(&mut self, node: &mut BoolExpr) -> Type {
        node.ty = Type::bool();
        Type::bool()
    }
}
