//! Typing rules for expressions.

use rustc_hash::FxHashSet;

use crate::ast::{CaseBranch, Expr, ExprKind};
use crate::intern::Symbol;
use crate::semantic::diagnostics::SemanticErrorKind;
use crate::semantic::method_table::MethodSignature;
use super::ClassChecker;

impl ClassChecker<'_, '_> {
    /// Infer the static type of `expr` and record it in the annotations.
    pub(super) fn infer(&mut self, expr: &Expr) -> Symbol {
        let ty = self.infer_kind(expr);
        self.annotations.insert(expr.id, ty);
        ty
    }

    fn infer_kind(&mut self, expr: &Expr) -> Symbol {
        let wk = self.wk;
        match &expr.kind {
            ExprKind::IntConst(_) => wk.int,
            ExprKind::BoolConst(_) => wk.bool_,
            ExprKind::StringConst(_) => wk.string,
            ExprKind::NoExpr => wk.no_type,

            ExprKind::Object(name) => {
                if *name == wk.self_ {
                    return wk.self_type;
                }
                match self.scopes.lookup(*name) {
                    Some(ty) => ty,
                    None => {
                        let kind = SemanticErrorKind::UndeclaredIdentifier { name: self.name(*name) };
                        self.error(expr.line, kind);
                        self.fallback(expr)
                    }
                }
            }

            ExprKind::Assign { name, value } => {
                let value_type = self.infer(value);
                if *name == wk.self_ {
                    self.error(expr.line, SemanticErrorKind::AssignToSelf);
                    return self.fallback(expr);
                }
                let Some(declared) = self.scopes.lookup(*name) else {
                    let kind = SemanticErrorKind::AssignUndeclared { name: self.name(*name) };
                    self.error(expr.line, kind);
                    return self.fallback(expr);
                };
                if !self.conforms(declared, value_type) {
                    if !self.is_recovered(value) {
                        let kind = SemanticErrorKind::AssignMismatch {
                            name: self.name(*name),
                            declared: self.name(declared),
                            found: self.name(value_type),
                        };
                        self.error(expr.line, kind);
                    }
                    return self.fallback(expr);
                }
                value_type
            }

            ExprKind::StaticDispatch {
                receiver,
                type_name,
                method,
                args,
            } => {
                let receiver_type = self.infer(receiver);
                let mut failed = false;

                if !self.conforms(*type_name, receiver_type) {
                    failed = true;
                    if !self.is_recovered(receiver) {
                        let kind = SemanticErrorKind::StaticDispatchNotAncestor {
                            expr_type: self.name(receiver_type),
                            target: self.name(*type_name),
                        };
                        self.error(expr.line, kind);
                    }
                }

                let signature = self.lookup_method(*type_name, *method);
                if signature.is_none() {
                    failed = true;
                    // an unknown target class already failed the conformance check
                    if self.hierarchy.is_type_defined(*type_name) {
                        let kind = SemanticErrorKind::UndefinedMethod {
                            method: self.name(*method),
                            class: self.name(*type_name),
                        };
                        self.error(expr.line, kind);
                    }
                }

                failed |= self.check_arguments(expr.line, *method, args, signature.as_ref());
                match signature {
                    Some(sig) if !failed => self.dispatch_result(&sig, *type_name),
                    _ => self.fallback(expr),
                }
            }

            ExprKind::Dispatch { receiver, method, args } => {
                let receiver_type = self.infer(receiver);
                let signature = self.lookup_method(receiver_type, *method);
                let mut failed = signature.is_none();

                if failed && !self.is_recovered(receiver) {
                    let class = if receiver_type == wk.self_type {
                        self.class.name
                    } else {
                        receiver_type
                    };
                    let kind = SemanticErrorKind::UndefinedMethod {
                        method: self.name(*method),
                        class: self.name(class),
                    };
                    self.error(expr.line, kind);
                }

                failed |= self.check_arguments(expr.line, *method, args, signature.as_ref());
                match signature {
                    Some(sig) if !failed => self.dispatch_result(&sig, receiver_type),
                    _ => self.fallback(expr),
                }
            }

            ExprKind::Cond {
                pred,
                then_branch,
                else_branch,
            } => {
                self.check_predicate(pred, "if");
                let then_type = self.infer(then_branch);
                let else_type = self.infer(else_branch);
                if else_branch.is_no_expr() {
                    then_type
                } else {
                    self.hierarchy.common_ancestor(then_type, else_type, self.class.name)
                }
            }

            ExprKind::Loop { pred, body } => {
                self.check_predicate(pred, "while");
                self.infer(body);
                wk.object
            }

            ExprKind::Block(body) => {
                let mut last = wk.object;
                for expr in body {
                    last = self.infer(expr);
                }
                last
            }

            ExprKind::Let {
                name,
                type_decl,
                init,
                body,
            } => {
                let init_type = self.infer(init);
                let binds_self = *name == wk.self_;
                if binds_self {
                    self.error(expr.line, SemanticErrorKind::SelfBinding { construct: "let" });
                }

                let type_defined = self.hierarchy.is_type_defined(*type_decl);
                if !type_defined {
                    let kind = SemanticErrorKind::UndefinedDeclaredType {
                        binding: format!("let variable {}", self.name(*name)),
                        ty: self.name(*type_decl),
                    };
                    self.error(expr.line, kind);
                } else if !init.is_no_expr()
                    && !self.conforms(*type_decl, init_type)
                    && !self.is_recovered(init)
                {
                    let kind = SemanticErrorKind::LetInitMismatch {
                        name: self.name(*name),
                        declared: self.name(*type_decl),
                        found: self.name(init_type),
                    };
                    self.error(expr.line, kind);
                }

                self.scoped(|this| {
                    if !binds_self {
                        this.scopes.add(*name, *type_decl);
                    }
                    this.infer(body)
                })
            }

            ExprKind::Case { scrutinee, branches } => {
                self.infer(scrutinee);
                self.check_case_branches(branches)
            }

            ExprKind::New(ty) => {
                if !self.hierarchy.is_type_defined(*ty) {
                    let kind = SemanticErrorKind::UndefinedNewType { ty: self.name(*ty) };
                    self.error(expr.line, kind);
                    self.recovered.insert(expr.id);
                }
                *ty
            }

            ExprKind::IsVoid(operand) => {
                self.infer(operand);
                wk.bool_
            }

            ExprKind::Arith { op, left, right } => {
                let (left_type, right_type) = (self.infer(left), self.infer(right));
                if self.both_int(left, left_type, right, right_type, expr.line, |l, r| {
                    SemanticErrorKind::NonIntArithmetic {
                        op: op.symbol(),
                        left: l,
                        right: r,
                    }
                }) {
                    wk.int
                } else {
                    self.fallback(expr)
                }
            }

            ExprKind::Compare { op, left, right } => {
                let (left_type, right_type) = (self.infer(left), self.infer(right));
                if self.both_int(left, left_type, right, right_type, expr.line, |l, r| {
                    SemanticErrorKind::NonIntComparison {
                        op: op.symbol(),
                        left: l,
                        right: r,
                    }
                }) {
                    wk.bool_
                } else {
                    self.fallback(expr)
                }
            }

            ExprKind::Eq { left, right } => {
                let (left_type, right_type) = (self.infer(left), self.infer(right));
                let primitive = wk.is_primitive(left_type) || wk.is_primitive(right_type);
                if primitive && left_type != right_type {
                    if !self.is_recovered(left) && !self.is_recovered(right) {
                        let kind = SemanticErrorKind::IllegalEquality {
                            left: self.name(left_type),
                            right: self.name(right_type),
                        };
                        self.error(expr.line, kind);
                    }
                    return self.fallback(expr);
                }
                wk.bool_
            }

            ExprKind::Neg(operand) => {
                let ty = self.infer(operand);
                if ty == wk.int {
                    return wk.int;
                }
                if !self.is_recovered(operand) {
                    let kind = SemanticErrorKind::NonIntNegation { found: self.name(ty) };
                    self.error(expr.line, kind);
                }
                self.fallback(expr)
            }

            ExprKind::Not(operand) => {
                let ty = self.infer(operand);
                if ty == wk.bool_ {
                    return wk.bool_;
                }
                if !self.is_recovered(operand) {
                    let kind = SemanticErrorKind::NonBoolNot { found: self.name(ty) };
                    self.error(expr.line, kind);
                }
                self.fallback(expr)
            }
        }
    }

    /// Mark `expr` as recovered and return the fallback type.
    fn fallback(&mut self, expr: &Expr) -> Symbol {
        self.recovered.insert(expr.id);
        self.wk.object
    }

    fn lookup_method(&self, class_type: Symbol, method: Symbol) -> Option<MethodSignature> {
        let signature = self
            .methods
            .resolve(self.hierarchy, class_type, method, self.class.name)
            .cloned();
        tracing::trace!(
            method = self.interner.resolve(method),
            receiver = self.interner.resolve(class_type),
            defined_in = ?signature.as_ref().map(|sig| self.interner.resolve(sig.defined_in)),
            "resolve dispatch"
        );
        signature
    }

    /// A declared `SELF_TYPE` return takes the type the dispatch went through.
    fn dispatch_result(&self, sig: &MethodSignature, through: Symbol) -> Symbol {
        if sig.return_type == self.wk.self_type {
            through
        } else {
            sig.return_type
        }
    }

    /// Type every argument, then match them against the formals.
    /// Returns whether anything failed.
    fn check_arguments(
        &mut self,
        line: usize,
        method: Symbol,
        args: &[Expr],
        signature: Option<&MethodSignature>,
    ) -> bool {
        let actual_types: Vec<Symbol> = args.iter().map(|arg| self.infer(arg)).collect();
        let Some(sig) = signature else {
            return false;
        };

        let mut failed = false;
        if args.len() != sig.formal_types.len() {
            failed = true;
            let kind = SemanticErrorKind::DispatchArity {
                method: self.name(method),
                expected: sig.formal_types.len(),
                found: args.len(),
            };
            self.error(line, kind);
        }

        for (i, ((arg, &actual), &formal)) in args.iter().zip(&actual_types).zip(&sig.formal_types).enumerate() {
            if self.conforms(formal, actual) {
                continue;
            }
            failed = true;
            if !self.is_recovered(arg) {
                let kind = SemanticErrorKind::ArgumentMismatch {
                    method: self.name(method),
                    position: i + 1,
                    formal: self.name(formal),
                    actual: self.name(actual),
                };
                self.error(arg.line, kind);
            }
        }
        failed
    }

    fn check_predicate(&mut self, pred: &Expr, construct: &'static str) {
        let ty = self.infer(pred);
        if ty != self.wk.bool_ && !self.is_recovered(pred) {
            let kind = SemanticErrorKind::NonBoolPredicate {
                construct,
                found: self.name(ty),
            };
            self.error(pred.line, kind);
        }
    }

    /// Both operands must be Int. Reports through `make` unless every
    /// offending operand already recovered from its own error.
    fn both_int(
        &mut self,
        left: &Expr,
        left_type: Symbol,
        right: &Expr,
        right_type: Symbol,
        line: usize,
        make: impl FnOnce(String, String) -> SemanticErrorKind,
    ) -> bool {
        let int = self.wk.int;
        let bad_left = left_type != int;
        let bad_right = right_type != int;
        if !bad_left && !bad_right {
            return true;
        }
        let blame = (bad_left && !self.is_recovered(left)) || (bad_right && !self.is_recovered(right));
        if blame {
            let kind = make(self.name(left_type), self.name(right_type));
            self.error(line, kind);
        }
        false
    }

    /// Type each branch in its own scope and join the branch types.
    fn check_case_branches(&mut self, branches: &[CaseBranch]) -> Symbol {
        let mut seen = FxHashSet::default();
        let mut joined: Option<Symbol> = None;

        for branch in branches {
            if !seen.insert(branch.type_decl) {
                let kind = SemanticErrorKind::DuplicateCaseBranch { ty: self.name(branch.type_decl) };
                self.error(branch.line, kind);
            }
            if !self.hierarchy.contains(branch.type_decl) {
                let kind = SemanticErrorKind::UndefinedDeclaredType {
                    binding: format!("case branch {}", self.name(branch.name)),
                    ty: self.name(branch.type_decl),
                };
                self.error(branch.line, kind);
            }
            let binds_self = branch.name == self.wk.self_;
            if binds_self {
                self.error(branch.line, SemanticErrorKind::SelfBinding { construct: "case branch" });
            }

            let body_type = self.scoped(|this| {
                if !binds_self {
                    this.scopes.add(branch.name, branch.type_decl);
                }
                this.infer(&branch.body)
            });

            joined = Some(match joined {
                None => body_type,
                Some(ty) => self.hierarchy.common_ancestor(ty, body_type, self.class.name),
            });
        }

        joined.unwrap_or(self.wk.object)
    }
}
