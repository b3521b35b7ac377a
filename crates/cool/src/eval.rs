//! The tree-walking evaluator.
//!
//! Evaluation is a synchronous recursive procedure over method bodies taken
//! from the symbol table. Runtime faults unwind through [`RunResult`] and are
//! converted into a single diagnostic by the façade.

use std::rc::Rc;

use ahash::AHashMap;
use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::{
    ast::{BinaryOp, CaseBranch, Expr, ExprLoc, LetBinding, UnaryOp},
    builtins,
    diagnostics::{DiagnosticCode, Position},
    env::LocalEnv,
    exception::{RunError, RunResult},
    io::{InputSource, OutputSink},
    resource::ResourceLimits,
    symbols::{MAIN, MethodSymbol, SELF_TYPE, SymbolTable, is_primitive},
    value::{Instance, Value},
};

/// Call-argument vector; most Cool methods take only a handful.
type ArgValues = SmallVec<[Value; 4]>;

/// One run's evaluation state: the analyzed program, the I/O endpoints, and
/// the call-depth meter.
pub(crate) struct Machine<'a> {
    symbols: &'a SymbolTable,
    input: &'a mut dyn InputSource,
    output: &'a mut dyn OutputSink,
    limits: ResourceLimits,
    depth: usize,
}

impl<'a> Machine<'a> {
    pub(crate) fn new(
        symbols: &'a SymbolTable,
        input: &'a mut dyn InputSource,
        output: &'a mut dyn OutputSink,
        limits: ResourceLimits,
    ) -> Self {
        Self {
            symbols,
            input,
            output,
            limits,
            depth: 0,
        }
    }

    pub(crate) fn write_output(&mut self, s: &str) {
        self.output.write_str(s);
    }

    pub(crate) fn read_input_line(&mut self) -> Option<String> {
        self.input.read_line()
    }

    /// Instantiates `Main` and dispatches `main()` on it.
    ///
    /// A `Main` class without a `main` method passed analysis (the method
    /// could live on an ancestor only at dispatch time), so it is reported
    /// here as an `UndefinedMethod` fault.
    pub(crate) fn run_main(&mut self) -> RunResult<Value> {
        let symbols = self.symbols;
        let main_object = self.instantiate(MAIN, &Position::none())?;
        let Some(method) = symbols.lookup_method(MAIN, "main") else {
            return Err(RunError::new(
                DiagnosticCode::UndefinedMethod,
                "class Main has no method main",
                None,
            ));
        };
        self.invoke_method(&main_object, method, ArgValues::new(), &Position::none())
    }

    /// `new T`: lay out the slots from `Object` down to `T`, fill defaults,
    /// then run initializers in the same order with `self` bound to the new
    /// object, so earlier-initialized attributes are visible to later ones.
    fn instantiate(&mut self, class_name: &str, position: &Position) -> RunResult<Value> {
        if is_primitive(class_name) {
            return Ok(Value::default_for_type(class_name));
        }
        let symbols = self.symbols;
        let Some(class_symbol) = symbols.get(class_name) else {
            return Err(RunError::internal(format!("new of undefined class {class_name}"), position));
        };
        let layout = symbols.attr_layout(class_name);
        let mut slots = IndexMap::new();
        for attr in &layout {
            slots.insert(Rc::clone(&attr.name), Value::default_for_type(&attr.declared_type));
        }
        let object = Value::Object(Rc::new(Instance::new(Rc::clone(&class_symbol.name), slots)));
        for attr in &layout {
            let Some(initializer) = &attr.initializer else {
                continue;
            };
            let value = self.eval(initializer, &object, &mut LocalEnv::new())?;
            if let Value::Object(instance) = &object {
                instance.set_slot(&attr.name, value);
            }
        }
        Ok(object)
    }

    fn eval(&mut self, expr: &ExprLoc, me: &Value, env: &mut LocalEnv) -> RunResult<Value> {
        match &expr.expr {
            Expr::IntLit(value) => Ok(Value::Int(*value)),
            Expr::StringLit(value) => Ok(Value::Str(Rc::clone(value))),
            Expr::BoolLit(value) => Ok(Value::Bool(*value)),
            Expr::SelfRef => Ok(me.clone()),
            Expr::Identifier(name) => self.eval_identifier(name, me, &expr.position, env),
            Expr::Assign { id, value } => self.eval_assign(id, value, me, &expr.position, env),
            Expr::Block { exprs } => {
                let mut last = Value::Void;
                for inner in exprs {
                    last = self.eval(inner, me, env)?;
                }
                Ok(last)
            }
            Expr::If {
                pred,
                then_branch,
                else_branch,
            } => {
                let pred_value = self.eval(pred, me, env)?;
                if as_bool(&pred_value, &pred.position)? {
                    self.eval(then_branch, me, env)
                } else {
                    self.eval(else_branch, me, env)
                }
            }
            Expr::While { pred, body } => loop {
                let pred_value = self.eval(pred, me, env)?;
                if !as_bool(&pred_value, &pred.position)? {
                    return Ok(Value::Void);
                }
                self.eval(body, me, env)?;
            },
            Expr::Let { bindings, body } => self.eval_let(bindings, body, me, env),
            Expr::Case { scrutinee, branches } => self.eval_case(scrutinee, branches, me, &expr.position, env),
            Expr::New { type_name } => self.eval_new(type_name, me, &expr.position),
            Expr::IsVoid { operand } => {
                let value = self.eval(operand, me, env)?;
                Ok(Value::Bool(value.is_void()))
            }
            Expr::UnaryOp { op, operand } => {
                let value = self.eval(operand, me, env)?;
                match op {
                    UnaryOp::Negate => Ok(Value::Int(as_int(&value, &operand.position)?.wrapping_neg())),
                    UnaryOp::Not => Ok(Value::Bool(!as_bool(&value, &operand.position)?)),
                }
            }
            Expr::BinaryOp { op, left, right } => self.eval_binary(*op, left, right, me, &expr.position, env),
            Expr::Dispatch {
                receiver,
                static_type,
                method,
                args,
            } => self.eval_dispatch(receiver, static_type.as_deref(), method, args, &expr.position, me, env),
            Expr::NoExpression => Ok(Value::Void),
            Expr::Builtin(_) => Err(RunError::internal(
                "built-in body evaluated outside dispatch",
                &expr.position,
            )),
        }
    }

    fn eval_identifier(&mut self, name: &str, me: &Value, position: &Position, env: &LocalEnv) -> RunResult<Value> {
        if let Some(value) = env.lookup(name) {
            return Ok(value);
        }
        if let Value::Object(instance) = me
            && let Some(value) = instance.get_slot(name)
        {
            return Ok(value);
        }
        Err(RunError::internal(format!("unbound identifier {name}"), position))
    }

    fn eval_assign(
        &mut self,
        id: &str,
        value_expr: &ExprLoc,
        me: &Value,
        position: &Position,
        env: &mut LocalEnv,
    ) -> RunResult<Value> {
        let value = self.eval(value_expr, me, env)?;
        if env.assign(id, value.clone()) {
            return Ok(value);
        }
        if let Value::Object(instance) = me
            && instance.set_slot(id, value.clone())
        {
            return Ok(value);
        }
        Err(RunError::internal(format!("assignment to unbound identifier {id}"), position))
    }

    fn eval_new(&mut self, type_name: &str, me: &Value, position: &Position) -> RunResult<Value> {
        if type_name == SELF_TYPE {
            let Some(class_name) = me.dynamic_class_name() else {
                return Err(RunError::internal("new SELF_TYPE with a void receiver", position));
            };
            let class_name = class_name.to_owned();
            return self.instantiate(&class_name, position);
        }
        self.instantiate(type_name, position)
    }

    fn eval_let(
        &mut self,
        bindings: &[LetBinding],
        body: &ExprLoc,
        me: &Value,
        env: &mut LocalEnv,
    ) -> RunResult<Value> {
        let mut pushed = 0usize;
        let mut run = || -> RunResult<Value> {
            for binding in bindings {
                let value = match &binding.initializer {
                    Some(initializer) => self.eval(initializer, me, env)?,
                    None => Value::default_for_type(&binding.declared_type),
                };
                env.push_binding(Rc::clone(&binding.id), value);
                pushed += 1;
            }
            self.eval(body, me, env)
        };
        let result = run();
        for _ in 0..pushed {
            env.pop_frame();
        }
        result
    }

    /// Selects the branch whose type is the nearest ancestor of the
    /// scrutinee's dynamic class (smallest upward distance wins).
    fn eval_case(
        &mut self,
        scrutinee: &ExprLoc,
        branches: &[CaseBranch],
        me: &Value,
        position: &Position,
        env: &mut LocalEnv,
    ) -> RunResult<Value> {
        let value = self.eval(scrutinee, me, env)?;
        if value.is_void() {
            return Err(RunError::case_on_void(position));
        }
        let dynamic = value
            .dynamic_class_name()
            .map(str::to_owned)
            .unwrap_or_default();
        let mut best: Option<(u32, &CaseBranch)> = None;
        for branch in branches {
            if let Some(distance) = self.symbols.distance_up(&dynamic, &branch.declared_type)
                && best.is_none_or(|(current, _)| distance < current)
            {
                best = Some((distance, branch));
            }
        }
        let Some((_, branch)) = best else {
            return Err(RunError::case_unmatched(&dynamic, position));
        };
        env.push_binding(Rc::clone(&branch.id), value);
        let result = self.eval(&branch.body, me, env);
        env.pop_frame();
        result
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &ExprLoc,
        right: &ExprLoc,
        me: &Value,
        position: &Position,
        env: &mut LocalEnv,
    ) -> RunResult<Value> {
        let left_value = self.eval(left, me, env)?;
        let right_value = self.eval(right, me, env)?;
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let lhs = as_int(&left_value, &left.position)?;
                let rhs = as_int(&right_value, &right.position)?;
                let result = match op {
                    BinaryOp::Add => lhs.wrapping_add(rhs),
                    BinaryOp::Sub => lhs.wrapping_sub(rhs),
                    BinaryOp::Mul => lhs.wrapping_mul(rhs),
                    BinaryOp::Div => {
                        if rhs == 0 {
                            return Err(RunError::division_by_zero(position));
                        }
                        lhs.wrapping_div(rhs)
                    }
                    _ => unreachable!("outer match covers only arithmetic here"),
                };
                Ok(Value::Int(result))
            }
            BinaryOp::Lt => {
                let lhs = as_int(&left_value, &left.position)?;
                let rhs = as_int(&right_value, &right.position)?;
                Ok(Value::Bool(lhs < rhs))
            }
            BinaryOp::Le => {
                let lhs = as_int(&left_value, &left.position)?;
                let rhs = as_int(&right_value, &right.position)?;
                Ok(Value::Bool(lhs <= rhs))
            }
            BinaryOp::Eq => Ok(Value::Bool(left_value.cool_eq(&right_value))),
        }
    }

    /// Runtime dispatch: receiver first, then resolution, then arguments
    /// left to right, then the body in a fresh local environment.
    fn eval_dispatch(
        &mut self,
        receiver: &ExprLoc,
        static_type: Option<&str>,
        method: &str,
        args: &[ExprLoc],
        position: &Position,
        me: &Value,
        env: &mut LocalEnv,
    ) -> RunResult<Value> {
        let receiver_value = self.eval(receiver, me, env)?;
        if receiver_value.is_void() {
            return Err(RunError::dispatch_on_void(method, position));
        }
        let lookup_class = match static_type {
            Some(name) => name.to_owned(),
            None => receiver_value
                .dynamic_class_name()
                .map(str::to_owned)
                .unwrap_or_default(),
        };
        let symbols = self.symbols;
        let Some(method_symbol) = symbols.lookup_method(&lookup_class, method) else {
            return Err(RunError::internal(
                format!("class {lookup_class} has no method {method}"),
                position,
            ));
        };
        let mut arg_values = ArgValues::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg, me, env)?);
        }
        self.invoke_method(&receiver_value, method_symbol, arg_values, position)
    }

    fn invoke_method(
        &mut self,
        receiver: &Value,
        method: &MethodSymbol,
        args: ArgValues,
        position: &Position,
    ) -> RunResult<Value> {
        if let Expr::Builtin(tag) = &method.body.expr {
            return builtins::invoke(self, *tag, receiver, &args, position);
        }
        self.enter_call(position)?;
        let mut frame = AHashMap::new();
        for (formal, value) in method.formals.iter().zip(args) {
            frame.insert(Rc::clone(&formal.name), value);
        }
        let mut callee_env = LocalEnv::from_frame(frame);
        let result = self.eval(&method.body, receiver, &mut callee_env);
        self.depth -= 1;
        result
    }

    fn enter_call(&mut self, position: &Position) -> RunResult<()> {
        if self.depth >= self.limits.max_recursion_depth {
            return Err(RunError::runtime(
                format!("maximum recursion depth of {} exceeded", self.limits.max_recursion_depth),
                position,
            ));
        }
        self.depth += 1;
        Ok(())
    }
}

fn as_int(value: &Value, position: &Position) -> RunResult<i64> {
    i64::try_from(value).map_err(|e| RunError::internal(e.to_string(), position))
}

fn as_bool(value: &Value, position: &Position) -> RunResult<bool> {
    bool::try_from(value).map_err(|e| RunError::internal(e.to_string(), position))
}
