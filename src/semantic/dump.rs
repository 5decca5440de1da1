//! Text rendering of a program decorated with inferred types.

use std::fmt::{self, Write};

use crate::ast::{ClassDecl, Expr, ExprKind, Feature, Program};
use crate::intern::Interner;
use super::annotations::TypeAnnotations;

/// Write every class, feature and expression of `program`, one node per
/// line, each expression followed by `: <type>`.
pub fn write_annotated(
    out: &mut impl Write,
    program: &Program,
    annotations: &TypeAnnotations,
    interner: &Interner,
) -> fmt::Result {
    let mut dumper = Dumper {
        out,
        annotations,
        interner,
    };
    for class in &program.classes {
        dumper.class(class)?;
    }
    Ok(())
}

struct Dumper<'d, W: Write> {
    out: &'d mut W,
    annotations: &'d TypeAnnotations,
    interner: &'d Interner,
}

impl<W: Write> Dumper<'_, W> {
    fn class(&mut self, class: &ClassDecl) -> fmt::Result {
        let name = self.interner.resolve(class.name);
        let parent = self.interner.resolve(class.parent);
        let file = self.interner.resolve(class.file);
        writeln!(self.out, "class {name} inherits {parent} ({file}:{})", class.line)?;

        for feature in &class.features {
            match feature {
                Feature::Method(method) => {
                    let formals: Vec<String> = method
                        .formals
                        .iter()
                        .map(|f| format!("{} : {}", self.interner.resolve(f.name), self.interner.resolve(f.type_decl)))
                        .collect();
                    writeln!(
                        self.out,
                        "  method {}({}) : {}",
                        self.interner.resolve(method.name),
                        formals.join(", "),
                        self.interner.resolve(method.return_type)
                    )?;
                    self.expr(&method.body, 2)?;
                }
                Feature::Attribute(attr) => {
                    writeln!(
                        self.out,
                        "  attribute {} : {}",
                        self.interner.resolve(attr.name),
                        self.interner.resolve(attr.type_decl)
                    )?;
                    if !attr.init.is_no_expr() {
                        self.expr(&attr.init, 2)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr, depth: usize) -> fmt::Result {
        let interner = self.interner;
        let ty = self
            .annotations
            .type_of(expr)
            .map_or("_untyped", |ty| interner.resolve(ty));
        let name = |sym| interner.resolve(sym);

        let label = match &expr.kind {
            ExprKind::IntConst(value) => format!("int {value}"),
            ExprKind::BoolConst(value) => format!("bool {value}"),
            ExprKind::StringConst(value) => format!("string {value:?}"),
            ExprKind::Object(sym) => format!("object {}", name(*sym)),
            ExprKind::Assign { name: target, .. } => format!("assign {}", name(*target)),
            ExprKind::StaticDispatch { type_name, method, .. } => {
                format!("static dispatch @{}.{}", name(*type_name), name(*method))
            }
            ExprKind::Dispatch { method, .. } => format!("dispatch {}", name(*method)),
            ExprKind::Cond { .. } => "cond".to_string(),
            ExprKind::Loop { .. } => "loop".to_string(),
            ExprKind::Block(_) => "block".to_string(),
            ExprKind::Let {
                name: var, type_decl, ..
            } => format!("let {} : {}", name(*var), name(*type_decl)),
            ExprKind::Case { .. } => "case".to_string(),
            ExprKind::New(ty) => format!("new {}", name(*ty)),
            ExprKind::IsVoid(_) => "isvoid".to_string(),
            ExprKind::Arith { op, .. } => format!("arith {}", op.symbol()),
            ExprKind::Compare { op, .. } => format!("compare {}", op.symbol()),
            ExprKind::Eq { .. } => "compare =".to_string(),
            ExprKind::Neg(_) => "neg".to_string(),
            ExprKind::Not(_) => "not".to_string(),
            ExprKind::NoExpr => "no_expr".to_string(),
        };
        writeln!(self.out, "{:indent$}{label} : {ty}", "", indent = depth * 2)?;

        let depth = depth + 1;
        match &expr.kind {
            ExprKind::Assign { value, .. } => self.expr(value, depth),
            ExprKind::StaticDispatch { receiver, args, .. } | ExprKind::Dispatch { receiver, args, .. } => {
                self.expr(receiver, depth)?;
                args.iter().try_for_each(|arg| self.expr(arg, depth))
            }
            ExprKind::Cond {
                pred,
                then_branch,
                else_branch,
            } => {
                self.expr(pred, depth)?;
                self.expr(then_branch, depth)?;
                self.expr(else_branch, depth)
            }
            ExprKind::Loop { pred, body } => {
                self.expr(pred, depth)?;
                self.expr(body, depth)
            }
            ExprKind::Block(body) => body.iter().try_for_each(|e| self.expr(e, depth)),
            ExprKind::Let { init, body, .. } => {
                if !init.is_no_expr() {
                    self.expr(init, depth)?;
                }
                self.expr(body, depth)
            }
            ExprKind::Case { scrutinee, branches } => {
                self.expr(scrutinee, depth)?;
                for branch in branches {
                    writeln!(
                        self.out,
                        "{:indent$}branch {} : {}",
                        "",
                        self.interner.resolve(branch.name),
                        self.interner.resolve(branch.type_decl),
                        indent = depth * 2
                    )?;
                    self.expr(&branch.body, depth + 1)?;
                }
                Ok(())
            }
            ExprKind::IsVoid(operand) | ExprKind::Neg(operand) | ExprKind::Not(operand) => self.expr(operand, depth),
            ExprKind::Arith { left, right, .. }
            | ExprKind::Compare { left, right, .. }
            | ExprKind::Eq { left, right } => {
                self.expr(left, depth)?;
                self.expr(right, depth)
            }
            ExprKind::IntConst(_)
            | ExprKind::BoolConst(_)
            | ExprKind::StringConst(_)
            | ExprKind::Object(_)
            | ExprKind::New(_)
            | ExprKind::NoExpr => Ok(()),
        }
    }
}
