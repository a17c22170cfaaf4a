//! Indented tree dump of a module, printed by `--verbose-ast`.

use crate::lexer::tokens::TokenKind;

use super::{
    ast::{Expr, Visitor},
    expressions::{
        ArrayLiteralExpr, BinaryExpr, BoolExpr, CallExpr, CastExpr, FloatExpr, IndexExpr,
        IntExpr, MemberExpr, StringExpr, UnaryExpr, VariableExpr,
    },
    statements::{
        BranchStmt, ExternDeclStmt, FnDeclStmt, LinkStmt, LoopStmt, ReturnStmt, Stmt,
        StructDeclStmt, Toplevel, VarDeclStmt,
    },
    types::Type,
};

#[derive(Default)]
pub struct AstPrinter {
    buffer: String,
    indent: usize,
}

impl AstPrinter {
    pub fn new() -> Self {
        AstPrinter::default()
    }

    /// Renders the whole module.
    pub fn print(toplevel: &Toplevel) -> String {
        let mut printer = AstPrinter::new();
        toplevel.accept(&mut printer);
        printer.buffer
    }

    fn line(&mut self, text: &str) {
        self.buffer.push_str(&"  ".repeat(self.indent));
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    fn nested<F: FnOnce(&mut Self)>(&mut self, header: &str, body: F) {
        self.line(header);
        self.indent += 1;
        body(self);
        self.indent -= 1;
    }

    fn block(&mut self, header: &str, body: &[Stmt]) {
        self.nested(header, |printer| {
            for stmt in body {
                stmt.accept(printer);
            }
        });
    }

    fn typed(&self, label: &str, expr_type: &Type) -> String {
        if expr_type.is_unresolved() {
            label.to_string()
        } else {
            format!("{} : {}", label, expr_type)
        }
    }
}

impl Visitor for AstPrinter {
    type Output = ();

    fn visit_toplevel(&mut self, node: &Toplevel) {
        let header = format!("Toplevel {}", node.module);
        self.nested(&header, |printer| {
            for item in &node.items {
                item.accept(printer);
            }
        });
    }

    fn visit_link(&mut self, node: &LinkStmt) {
        self.line(&format!("Link \"{}\"", node.library));
    }

    fn visit_struct(&mut self, node: &StructDeclStmt) {
        let header = if node.volatile {
            format!("Struct {} (volatile)", node.name)
        } else {
            format!("Struct {}", node.name)
        };
        self.nested(&header, |printer| {
            for member in &node.members {
                printer.line(&format!("{} {}", member.ty, member.name));
            }
        });
    }

    fn visit_function(&mut self, node: &FnDeclStmt) {
        let header = format!(
            "Function {} -> {}",
            node.signature, node.signature.return_type
        );
        self.block(&header, &node.body);
    }

    fn visit_extern(&mut self, node: &ExternDeclStmt) {
        self.line(&format!(
            "Extern {} -> {}",
            node.signature, node.signature.return_type
        ));
    }

    fn visit_var_decl(&mut self, node: &VarDeclStmt) {
        let header = if node.inferred && node.ty.is_unresolved() {
            format!("VariableDeclare var {}", node.identifier)
        } else {
            format!("VariableDeclare {} {}", node.ty, node.identifier)
        };
        self.nested(&header, |printer| {
            if let Some(value) = &node.value {
                value.accept(printer);
            }
        });
    }

    fn visit_return(&mut self, node: &ReturnStmt) {
        self.nested("Return", |printer| {
            if let Some(value) = &node.value {
                value.accept(printer);
            }
        });
    }

    fn visit_branch(&mut self, node: &BranchStmt) {
        self.nested("Branch", |printer| {
            printer.nested("Condition", |printer| node.condition.accept(printer));
            printer.block("Then", &node.body);
            if let Some(else_body) = &node.else_body {
                printer.block("Else", else_body);
            }
        });
    }

    fn visit_loop(&mut self, node: &LoopStmt) {
        self.nested("Loop", |printer| {
            if let Some(prefix) = &node.prefix {
                printer.nested("Prefix", |printer| prefix.accept(printer));
            }
            printer.nested("Condition", |printer| node.condition.accept(printer));
            if let Some(suffix) = &node.suffix {
                printer.nested("Suffix", |printer| suffix.accept(printer));
            }
            printer.block("Body", &node.body);
        });
    }

    fn visit_call(&mut self, node: &CallExpr) {
        let header = self.typed(&format!("Call {}", node.identifier), &node.ty);
        self.nested(&header, |printer| {
            for argument in &node.arguments {
                argument.accept(printer);
            }
        });
    }

    fn visit_binary(&mut self, node: &BinaryExpr) {
        let header = self.typed(&format!("BinaryExpr '{}'", node.operator), &node.ty);
        self.nested(&header, |printer| {
            node.left.accept(printer);
            node.right.accept(printer);
        });
    }

    fn visit_unary(&mut self, node: &UnaryExpr) {
        let header = self.typed(&format!("UnaryExpr '{}'", node.operator), &node.ty);
        self.nested(&header, |printer| node.operand.accept(printer));
    }

    fn visit_cast(&mut self, node: &CastExpr) {
        let header = format!("Cast <{}>", node.target);
        self.nested(&header, |printer| node.operand.accept(printer));
    }

    fn visit_array_literal(&mut self, node: &ArrayLiteralExpr) {
        let header = format!("ArrayLiteral {}", node.array_type);
        self.nested(&header, |printer| {
            if let Some(length) = &node.length {
                length.accept(printer);
            }
        });
    }

    fn visit_index(&mut self, node: &IndexExpr) {
        let header = self.typed("Index", &node.ty);
        self.nested(&header, |printer| {
            node.target.accept(printer);
            node.index.accept(printer);
        });
    }

    fn visit_member(&mut self, node: &MemberExpr) {
        let header = self.typed(&format!("MemberAccess .{}", node.member), &node.ty);
        self.nested(&header, |printer| node.target.accept(printer));
    }

    fn visit_variable(&mut self, node: &VariableExpr) {
        let text = self.typed(&format!("Variable {}", node.identifier), &node.ty);
        self.line(&text);
    }

    fn visit_string(&mut self, node: &StringExpr) {
        self.line(&format!("StringLit {:?}", node.value));
    }

    fn visit_int(&mut self, node: &IntExpr) {
        self.line(&format!("IntLit {}", node.value));
    }

    fn visit_float(&mut self, node: &FloatExpr) {
        self.line(&format!("FloatLit {}", node.value));
    }

    fn visit_bool(&mut self, node: &BoolExpr) {
        self.line(&format!("BoolLit {}", node.value));
    }
}

/// One-line rendering of an expression, used in tests and debug logs.
pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Int(node) => node.value.to_string(),
        Expr::Float(node) => node.value.to_string(),
        Expr::String(node) => format!("{:?}", node.value),
        Expr::Bool(node) => node.value.to_string(),
        Expr::ArrayLiteral(node) => match &node.length {
            Some(length) => format!("[{}]{}", render_expr(length), node.array_type.base_name()),
            None => format!("[]{}", node.array_type.base_name()),
        },
        Expr::Variable(node) => node.identifier.clone(),
        Expr::Call(node) => format!(
            "{}({})",
            node.identifier,
            node.arguments
                .iter()
                .map(render_expr)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Expr::Binary(node) => format!(
            "({} {} {})",
            render_expr(&node.left),
            node.operator,
            render_expr(&node.right)
        ),
        Expr::Unary(node) => match node.operator {
            TokenKind::Star | TokenKind::Ampersand => {
                format!("({}{})", node.operator, render_expr(&node.operand))
            }
            _ => format!("({}{})", render_expr(&node.operand), node.operator),
        },
        Expr::Cast(node) => format!("(<{}>{})", node.target, render_expr(&node.operand)),
        Expr::Index(node) => format!("{}[{}]", render_expr(&node.target), render_expr(&node.index)),
        Expr::Member(node) => format!("{}.{}", render_expr(&node.target), node.member),
    }
}
