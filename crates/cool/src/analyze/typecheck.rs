//! Phase 2: feature and expression type checking.

use std::rc::Rc;

use ahash::AHashMap;

use crate::{
    ast::{BinaryOp, CaseBranch, Expr, ExprLoc, LetBinding, UnaryOp},
    diagnostics::{Diagnostic, DiagnosticBag, DiagnosticCode, Position},
    symbols::{AttrSymbol, BOOL, INT, MethodSymbol, SELF_TYPE, STRING, SymbolTable},
};

use super::types::{Ty, conforms, lub};

/// Type-checks every user class in registration (source) order.
pub(crate) fn run(table: &SymbolTable, bag: &mut DiagnosticBag) {
    let user_classes: Vec<Rc<str>> = table
        .classes()
        .filter(|c| !c.is_builtin)
        .map(|c| Rc::clone(&c.name))
        .collect();
    for class_name in user_classes {
        let mut checker = TypeChecker {
            table,
            bag: &mut *bag,
            current_class: class_name,
            scopes: Vec::new(),
        };
        checker.check_class();
    }
}

/// Checker state for one class: the table, the enclosing class, and the
/// stack of local scopes (formals, `let` bindings, `case` binders).
struct TypeChecker<'a, 'b> {
    table: &'a SymbolTable,
    bag: &'b mut DiagnosticBag,
    current_class: Rc<str>,
    scopes: Vec<AHashMap<Rc<str>, Ty>>,
}

impl TypeChecker<'_, '_> {
    fn emit(&mut self, code: DiagnosticCode, position: &Position, message: String) {
        self.bag.push(Diagnostic::error(code, position.clone(), message));
    }

    /// Resolves a written type name, reporting undefined names once at the
    /// point of use and recovering with `Object`.
    fn resolve_type(&mut self, name: &str, position: &Position) -> Ty {
        if name == SELF_TYPE {
            return Ty::SelfTy(Rc::clone(&self.current_class));
        }
        match self.table.get(name) {
            Some(symbol) => Ty::Class(Rc::clone(&symbol.name)),
            None => {
                self.emit(DiagnosticCode::UndefinedType, position, format!("undefined type {name}"));
                Ty::object()
            }
        }
    }

    /// Like `resolve_type` but silent; used where the defining class already
    /// reported the problem.
    fn resolve_quiet(&self, name: &str) -> Ty {
        if name == SELF_TYPE {
            Ty::SelfTy(Rc::clone(&self.current_class))
        } else {
            match self.table.get(name) {
                Some(symbol) => Ty::Class(Rc::clone(&symbol.name)),
                None => Ty::object(),
            }
        }
    }

    fn lookup_local(&self, name: &str) -> Option<Ty> {
        self.scopes.iter().rev().find_map(|frame| frame.get(name)).cloned()
    }

    /// Γ lookup: innermost local frame outward, then the attributes of the
    /// enclosing class including inherited ones.
    fn lookup_var(&self, name: &str) -> Option<Ty> {
        if let Some(ty) = self.lookup_local(name) {
            return Some(ty);
        }
        self.table
            .lookup_attr(&self.current_class, name)
            .map(|attr| self.resolve_quiet(&attr.declared_type))
    }

    fn check_class(&mut self) {
        let table = self.table;
        let class = table
            .get(&self.current_class)
            .expect("phase 1 registered every user class");
        let parent = class.parent_name.clone();
        let attrs: Vec<&AttrSymbol> = class.attributes.values().collect();
        let methods: Vec<&MethodSymbol> = class.methods.values().collect();

        for attr in attrs {
            if let Some(parent_name) = parent.as_deref()
                && let Some(inherited) = table.lookup_attr(parent_name, &attr.name)
            {
                self.emit(
                    DiagnosticCode::DuplicateAttribute,
                    &attr.position,
                    format!(
                        "attribute {} is already defined in ancestor class {}",
                        attr.name, inherited.defining_class
                    ),
                );
            }
            self.check_attribute(attr);
        }
        for method in methods {
            self.check_method(method, parent.as_deref());
        }
    }

    fn check_attribute(&mut self, attr: &AttrSymbol) {
        if &*attr.name == "self" {
            self.emit(
                DiagnosticCode::SelfTypeMisused,
                &attr.position,
                "an attribute may not be named self".to_owned(),
            );
        }
        let declared = self.resolve_type(&attr.declared_type, &attr.position);
        if let Some(initializer) = &attr.initializer {
            self.scopes.clear();
            let actual = self.typeof_expr(initializer);
            if !conforms(self.table, &actual, &declared) {
                self.emit(
                    DiagnosticCode::TypeMismatchInAttributeInit,
                    &initializer.position,
                    format!(
                        "cannot initialize attribute {} of type {declared} with a value of type {actual}",
                        attr.name
                    ),
                );
            }
        }
    }

    fn check_method(&mut self, method: &MethodSymbol, parent: Option<&str>) {
        // Override consistency is reported before any body typing errors.
        if let Some(parent_name) = parent
            && let Some(inherited) = self.table.lookup_method(parent_name, &method.name)
        {
            self.check_override(method, inherited);
        }

        let mut frame: AHashMap<Rc<str>, Ty> = AHashMap::new();
        for formal in &method.formals {
            if &*formal.name == "self" {
                self.emit(
                    DiagnosticCode::SelfTypeMisused,
                    &method.position,
                    format!("formal parameter of method {} may not be named self", method.name),
                );
                continue;
            }
            let ty = if &*formal.declared_type == SELF_TYPE {
                self.emit(
                    DiagnosticCode::SelfTypeMisused,
                    &method.position,
                    format!("formal parameter {} may not have type SELF_TYPE", formal.name),
                );
                Ty::object()
            } else {
                self.resolve_type(&formal.declared_type, &method.position)
            };
            if frame.contains_key(&formal.name) {
                self.emit(
                    DiagnosticCode::DuplicateFormal,
                    &method.position,
                    format!("formal parameter {} of method {} is declared twice", formal.name, method.name),
                );
                continue;
            }
            frame.insert(Rc::clone(&formal.name), ty);
        }

        self.scopes.clear();
        self.scopes.push(frame);
        let body_ty = self.typeof_expr(&method.body);
        self.scopes.pop();

        let declared_return = if &*method.return_type == SELF_TYPE {
            Ty::SelfTy(Rc::clone(&self.current_class))
        } else {
            self.resolve_type(&method.return_type, &method.position)
        };
        if !conforms(self.table, &body_ty, &declared_return) {
            self.emit(
                DiagnosticCode::MethodBodyTypeMismatch,
                &method.body.position,
                format!(
                    "the body of method {} has type {body_ty} but the declared return type is {declared_return}",
                    method.name
                ),
            );
        }
    }

    /// Overrides must preserve the inherited signature exactly.
    fn check_override(&mut self, method: &MethodSymbol, inherited: &MethodSymbol) {
        if method.formals.len() != inherited.formals.len() {
            self.emit(
                DiagnosticCode::OverrideMismatch,
                &method.position,
                format!(
                    "method {} takes {} formal(s) but overrides a method with {}",
                    method.name,
                    method.formals.len(),
                    inherited.formals.len()
                ),
            );
            return;
        }
        for (own, theirs) in method.formals.iter().zip(&inherited.formals) {
            if own.declared_type != theirs.declared_type {
                self.emit(
                    DiagnosticCode::OverrideMismatch,
                    &method.position,
                    format!(
                        "method {} declares formal {} with type {} but the inherited method declares {}",
                        method.name, own.name, own.declared_type, theirs.declared_type
                    ),
                );
            }
        }
        if method.return_type != inherited.return_type {
            self.emit(
                DiagnosticCode::OverrideMismatch,
                &method.position,
                format!(
                    "method {} returns {} but the inherited method returns {}",
                    method.name, method.return_type, inherited.return_type
                ),
            );
        }
    }

    fn typeof_expr(&mut self, expr: &ExprLoc) -> Ty {
        match &expr.expr {
            Expr::IntLit(_) => Ty::Class(Rc::from(INT)),
            Expr::StringLit(_) => Ty::Class(Rc::from(STRING)),
            Expr::BoolLit(_) => Ty::Class(Rc::from(BOOL)),
            Expr::SelfRef => Ty::SelfTy(Rc::clone(&self.current_class)),
            Expr::Identifier(name) => match self.lookup_var(name) {
                Some(ty) => ty,
                None => {
                    self.emit(
                        DiagnosticCode::UndefinedVariable,
                        &expr.position,
                        format!("undefined identifier {name}"),
                    );
                    Ty::object()
                }
            },
            Expr::Assign { id, value } => self.check_assign(id, value, &expr.position),
            Expr::New { type_name } => {
                if &**type_name == SELF_TYPE {
                    Ty::SelfTy(Rc::clone(&self.current_class))
                } else {
                    self.resolve_type(type_name, &expr.position)
                }
            }
            Expr::IsVoid { operand } => {
                self.typeof_expr(operand);
                Ty::Class(Rc::from(BOOL))
            }
            Expr::UnaryOp { op, operand } => self.check_unary(*op, operand, &expr.position),
            Expr::BinaryOp { op, left, right } => self.check_binary(*op, left, right, &expr.position),
            Expr::If {
                pred,
                then_branch,
                else_branch,
            } => {
                let pred_ty = self.typeof_expr(pred);
                if !pred_ty.is_class_named(BOOL) {
                    self.emit(
                        DiagnosticCode::IfPredicateNotBool,
                        &pred.position,
                        format!("the predicate of an if has type {pred_ty}, expected Bool"),
                    );
                }
                let then_ty = self.typeof_expr(then_branch);
                let else_ty = self.typeof_expr(else_branch);
                lub(self.table, &then_ty, &else_ty)
            }
            Expr::While { pred, body } => {
                let pred_ty = self.typeof_expr(pred);
                if !pred_ty.is_class_named(BOOL) {
                    self.emit(
                        DiagnosticCode::WhilePredicateNotBool,
                        &pred.position,
                        format!("the predicate of a while has type {pred_ty}, expected Bool"),
                    );
                }
                self.typeof_expr(body);
                Ty::object()
            }
            Expr::Block { exprs } => {
                let mut last = Ty::object();
                for inner in exprs {
                    last = self.typeof_expr(inner);
                }
                last
            }
            Expr::Let { bindings, body } => self.check_let(bindings, body),
            Expr::Case { scrutinee, branches } => self.check_case(scrutinee, branches),
            Expr::Dispatch {
                receiver,
                static_type,
                method,
                args,
            } => self.check_dispatch(receiver, static_type.as_deref(), method, args, &expr.position),
            Expr::NoExpression => Ty::object(),
            Expr::Builtin(_) => Ty::object(),
        }
    }

    fn check_assign(&mut self, id: &Rc<str>, value: &ExprLoc, position: &Position) -> Ty {
        let value_ty = self.typeof_expr(value);
        if &**id == "self" {
            self.emit(
                DiagnosticCode::AssignToSelf,
                position,
                "cannot assign to self".to_owned(),
            );
            return value_ty;
        }
        match self.lookup_var(id) {
            Some(declared) => {
                if !conforms(self.table, &value_ty, &declared) {
                    self.emit(
                        DiagnosticCode::AssignToWrongType,
                        position,
                        format!("cannot assign a value of type {value_ty} to {id} of type {declared}"),
                    );
                }
            }
            None => {
                self.emit(
                    DiagnosticCode::UndefinedVariable,
                    position,
                    format!("undefined identifier {id}"),
                );
            }
        }
        value_ty
    }

    fn check_unary(&mut self, op: UnaryOp, operand: &ExprLoc, position: &Position) -> Ty {
        let operand_ty = self.typeof_expr(operand);
        let (required, result) = match op {
            UnaryOp::Negate => (INT, INT),
            UnaryOp::Not => (BOOL, BOOL),
        };
        if !operand_ty.is_class_named(required) {
            self.emit(
                DiagnosticCode::InvalidUnaryOperation,
                position,
                format!("operator {} requires a {required} operand, found {operand_ty}", op.symbol()),
            );
        }
        Ty::Class(Rc::from(result))
    }

    fn check_binary(&mut self, op: BinaryOp, left: &ExprLoc, right: &ExprLoc, position: &Position) -> Ty {
        let left_ty = self.typeof_expr(left);
        let right_ty = self.typeof_expr(right);
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                if !(left_ty.is_class_named(INT) && right_ty.is_class_named(INT)) {
                    self.emit(
                        DiagnosticCode::InvalidBinaryOperation,
                        position,
                        format!(
                            "operator {} requires Int operands, found {left_ty} and {right_ty}",
                            op.symbol()
                        ),
                    );
                }
                Ty::Class(Rc::from(INT))
            }
            BinaryOp::Lt | BinaryOp::Le => {
                if !(left_ty.is_class_named(INT) && right_ty.is_class_named(INT)) {
                    self.emit(
                        DiagnosticCode::InvalidBinaryOperation,
                        position,
                        format!(
                            "operator {} requires Int operands, found {left_ty} and {right_ty}",
                            op.symbol()
                        ),
                    );
                }
                Ty::Class(Rc::from(BOOL))
            }
            BinaryOp::Eq => {
                let left_primitive = [INT, STRING, BOOL].iter().any(|p| left_ty.is_class_named(p));
                let right_primitive = [INT, STRING, BOOL].iter().any(|p| right_ty.is_class_named(p));
                if (left_primitive || right_primitive) && left_ty != right_ty {
                    self.emit(
                        DiagnosticCode::InvalidBinaryOperation,
                        position,
                        format!("comparison = between {left_ty} and {right_ty} is not permitted"),
                    );
                }
                Ty::Class(Rc::from(BOOL))
            }
        }
    }

    /// Each binding is introduced in order: visible to the initializers of
    /// later bindings and to the body.
    fn check_let(&mut self, bindings: &[LetBinding], body: &ExprLoc) -> Ty {
        let mut pushed = 0usize;
        for binding in bindings {
            if &*binding.id == "self" {
                self.emit(
                    DiagnosticCode::SelfTypeMisused,
                    &binding.position,
                    "a let binding may not be named self".to_owned(),
                );
            }
            let declared = self.resolve_type(&binding.declared_type, &binding.position);
            if let Some(initializer) = &binding.initializer {
                let actual = self.typeof_expr(initializer);
                if !conforms(self.table, &actual, &declared) {
                    self.emit(
                        DiagnosticCode::LetBindingTypeMismatch,
                        &initializer.position,
                        format!(
                            "cannot initialize let binding {} of type {declared} with a value of type {actual}",
                            binding.id
                        ),
                    );
                }
            }
            let mut frame = AHashMap::new();
            frame.insert(Rc::clone(&binding.id), declared);
            self.scopes.push(frame);
            pushed += 1;
        }
        let body_ty = self.typeof_expr(body);
        for _ in 0..pushed {
            self.scopes.pop();
        }
        body_ty
    }

    fn check_case(&mut self, scrutinee: &ExprLoc, branches: &[CaseBranch]) -> Ty {
        self.typeof_expr(scrutinee);
        let mut seen: Vec<Rc<str>> = Vec::new();
        let mut result: Option<Ty> = None;
        for branch in branches {
            if &*branch.id == "self" {
                self.emit(
                    DiagnosticCode::SelfTypeMisused,
                    &branch.position,
                    "a case branch may not bind self".to_owned(),
                );
            }
            let declared = if &*branch.declared_type == SELF_TYPE {
                self.emit(
                    DiagnosticCode::SelfTypeMisused,
                    &branch.position,
                    "a case branch may not have type SELF_TYPE".to_owned(),
                );
                Ty::object()
            } else {
                self.resolve_type(&branch.declared_type, &branch.position)
            };
            if seen.contains(&branch.declared_type) {
                self.emit(
                    DiagnosticCode::CaseBranchDuplicateType,
                    &branch.position,
                    format!("duplicate case branch for type {}", branch.declared_type),
                );
            } else {
                seen.push(Rc::clone(&branch.declared_type));
            }

            let mut frame = AHashMap::new();
            frame.insert(Rc::clone(&branch.id), declared);
            self.scopes.push(frame);
            let branch_ty = self.typeof_expr(&branch.body);
            self.scopes.pop();

            result = Some(match result {
                Some(previous) => lub(self.table, &previous, &branch_ty),
                None => branch_ty,
            });
        }
        result.unwrap_or_else(Ty::object)
    }

    fn check_dispatch(
        &mut self,
        receiver: &ExprLoc,
        static_type: Option<&str>,
        method: &str,
        args: &[ExprLoc],
        position: &Position,
    ) -> Ty {
        let table = self.table;
        let receiver_ty = self.typeof_expr(receiver);

        let lookup_class: Rc<str> = match static_type {
            Some(name) if name == SELF_TYPE => {
                self.emit(
                    DiagnosticCode::SelfTypeMisused,
                    position,
                    "the type of a static dispatch may not be SELF_TYPE".to_owned(),
                );
                Rc::from(receiver_ty.lookup_name())
            }
            Some(name) => match table.get(name) {
                Some(symbol) => {
                    if !conforms(table, &receiver_ty, &Ty::Class(Rc::clone(&symbol.name))) {
                        self.emit(
                            DiagnosticCode::StaticDispatchTypeError,
                            position,
                            format!("expression of type {receiver_ty} does not conform to static dispatch type {name}"),
                        );
                    }
                    Rc::clone(&symbol.name)
                }
                None => {
                    self.emit(DiagnosticCode::UndefinedType, position, format!("undefined type {name}"));
                    Rc::from(receiver_ty.lookup_name())
                }
            },
            None => Rc::from(receiver_ty.lookup_name()),
        };

        let Some(resolved) = table.lookup_method(&lookup_class, method) else {
            self.emit(
                DiagnosticCode::UndefinedMethod,
                position,
                format!("class {lookup_class} has no method {method}"),
            );
            for arg in args {
                self.typeof_expr(arg);
            }
            return Ty::object();
        };

        if args.len() != resolved.formals.len() {
            self.emit(
                DiagnosticCode::WrongNumberOfArguments,
                position,
                format!(
                    "method {method} expects {} argument(s), got {}",
                    resolved.formals.len(),
                    args.len()
                ),
            );
        }
        for (index, arg) in args.iter().enumerate() {
            let arg_ty = self.typeof_expr(arg);
            let Some(formal) = resolved.formals.get(index) else {
                continue;
            };
            let expected = self.resolve_quiet(&formal.declared_type);
            if !conforms(table, &arg_ty, &expected) {
                self.emit(
                    DiagnosticCode::ArgumentTypeMismatch,
                    &arg.position,
                    format!(
                        "argument {} ({}) of method {method}: expected {expected}, found {arg_ty}",
                        index + 1,
                        formal.name
                    ),
                );
            }
        }

        if &*resolved.return_type == SELF_TYPE {
            // SELF_TYPE in return position becomes the receiver's static type
            // for dynamic dispatch, and the named type for static dispatch.
            match static_type {
                Some(name) if name != SELF_TYPE => Ty::Class(lookup_class),
                _ => receiver_ty,
            }
        } else {
            self.resolve_quiet(&resolved.return_type)
        }
    }
}
