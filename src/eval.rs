//! The evaluator: recursive dispatch over the AST, the primitive catalog,
//! and lambda application.
//!
//! `eval` walks a [`Value`] graph exactly as the reader built it — there is
//! no separate bytecode or intermediate form, matching the homoiconic
//! design called out in `spec.md` §1. Special forms receive their operands
//! unevaluated so they can choose whether and when to evaluate them;
//! regular primitives and lambdas always evaluate left-to-right in the
//! caller's environment first.

use crate::env::{EnvRef, Envs};
use crate::error::{Error, Result};
use crate::value::{Arena, Primitive, SymbolId, Value, ValueRef};

/// Bundles the two arenas an evaluation walks, plus the name → primitive
/// table built once at construction (`spec.md` §9: "an immutable table
/// built at interpreter construction", not a process-wide singleton).
pub struct Evaluator<'a> {
    pub arena: &'a mut Arena,
    pub envs: &'a mut Envs,
    pub primitives: &'a std::collections::HashMap<SymbolId, Primitive>,
}

fn arity_error(special: bool, msg: impl Into<String>) -> Error {
    if special {
        Error::syntax(msg)
    } else {
        Error::runtime(msg)
    }
}

impl<'a> Evaluator<'a> {
    /// Evaluates `expr` in `env`. Returns `None` for forms that produce no
    /// value (e.g. `define`, a falsy one-armed `if`, `set!`).
    pub fn eval(&mut self, expr: Option<ValueRef>, env: EnvRef) -> Result<Option<ValueRef>> {
        let r = expr.ok_or_else(|| Error::runtime("cannot evaluate the empty list"))?;
        match self.arena.get(r) {
            Value::Number(_) | Value::Bool(_) | Value::Lambda { .. } | Value::Primitive(_) => {
                Ok(Some(r))
            }
            Value::Symbol(id) => {
                let id = *id;
                self.eval_symbol(id, env)
            }
            Value::Pair { car, cdr } => {
                let (operator_expr, operands) = (*car, *cdr);
                self.apply(operator_expr, operands, env)
            }
        }
    }

    fn eval_symbol(&mut self, id: SymbolId, env: EnvRef) -> Result<Option<ValueRef>> {
        match self.arena.symbol_name(id) {
            "#t" => Ok(Some(self.arena.alloc(Value::Bool(true)))),
            "#f" => Ok(Some(self.arena.alloc(Value::Bool(false)))),
            _ => {
                if let Some(&prim) = self.primitives.get(&id) {
                    Ok(Some(self.arena.alloc(Value::Primitive(prim))))
                } else {
                    let text = self.arena.symbol_name(id).to_string();
                    self.envs.lookup_or_err(env, id, &text)
                }
            }
        }
    }

    fn apply(
        &mut self,
        operator_expr: Option<ValueRef>,
        operands: Option<ValueRef>,
        env: EnvRef,
    ) -> Result<Option<ValueRef>> {
        let operator = self.eval(operator_expr, env)?;
        let operator_ref =
            operator.ok_or_else(|| Error::runtime("cannot apply the empty list"))?;
        match self.arena.get(operator_ref).clone() {
            Value::Primitive(p) => self.apply_primitive(p, operands, env),
            Value::Lambda {
                params,
                body,
                captured_env,
            } => self.apply_lambda(&params, &body, captured_env, operands, env),
            _ => Err(Error::runtime("cannot apply a non-procedure value")),
        }
    }

    fn apply_lambda(
        &mut self,
        params: &[SymbolId],
        body: &[Option<ValueRef>],
        captured_env: EnvRef,
        operands: Option<ValueRef>,
        caller_env: EnvRef,
    ) -> Result<Option<ValueRef>> {
        let arg_exprs = self
            .arena
            .list_elements(operands)
            .ok_or_else(|| Error::runtime("malformed argument list"))?;
        if arg_exprs.len() != params.len() {
            return Err(Error::runtime(format!(
                "lambda expects {} argument(s), got {}",
                params.len(),
                arg_exprs.len()
            )));
        }

        let mut values = Vec::with_capacity(arg_exprs.len());
        for expr in arg_exprs {
            values.push(self.eval(expr, caller_env)?);
        }

        let call_env = self.envs.child_of(captured_env);
        for (&param, value) in params.iter().zip(values) {
            self.envs.define(call_env, param, value);
        }

        let mut result = None;
        for &form in body {
            result = self.eval(form, call_env)?;
        }
        Ok(result)
    }

    fn apply_primitive(
        &mut self,
        prim: Primitive,
        operands: Option<ValueRef>,
        env: EnvRef,
    ) -> Result<Option<ValueRef>> {
        use Primitive::*;

        let special = prim.is_special_form();
        let args = self.arena.list_elements(operands).ok_or_else(|| {
            arity_error(special, format!("malformed argument list for {}", prim.name()))
        })?;

        match prim {
            Quote => self.eval_quote(&args),
            If => self.eval_if(&args, env),
            Lambda => self.eval_lambda(&args, env),
            Define => self.eval_define(&args, env),
            SetBang => self.eval_set(&args, env),
            SetCarBang | SetCdrBang => self.eval_set_field(prim, &args, env),
            And => self.eval_and(&args, env),
            Or => self.eval_or(&args, env),
            _ => {
                let mut values = Vec::with_capacity(args.len());
                for a in &args {
                    values.push(self.eval(*a, env)?);
                }
                self.apply_regular(prim, values)
            }
        }
    }

    // Special forms
    // --------------------------------------------------

    fn eval_quote(&mut self, args: &[Option<ValueRef>]) -> Result<Option<ValueRef>> {
        if args.len() != 1 {
            return Err(arity_error(true, "quote expects exactly 1 argument"));
        }
        Ok(args[0])
    }

    fn eval_if(&mut self, args: &[Option<ValueRef>], env: EnvRef) -> Result<Option<ValueRef>> {
        if args.len() != 2 && args.len() != 3 {
            return Err(arity_error(true, "if expects 2 or 3 arguments"));
        }
        let test = self.eval(args[0], env)?;
        if self.arena.is_truthy(test) {
            self.eval(args[1], env)
        } else if args.len() == 3 {
            self.eval(args[2], env)
        } else {
            Ok(None)
        }
    }

    fn eval_lambda(&mut self, args: &[Option<ValueRef>], env: EnvRef) -> Result<Option<ValueRef>> {
        if args.len() < 2 {
            return Err(arity_error(
                true,
                "lambda requires a parameter list and at least one body form",
            ));
        }
        let params = self.parse_param_list(args[0])?;
        let body = args[1..].to_vec();
        Ok(Some(self.arena.alloc(Value::Lambda {
            params,
            body,
            captured_env: env,
        })))
    }

    fn parse_param_list(&self, params: Option<ValueRef>) -> Result<Vec<SymbolId>> {
        let elems = self
            .arena
            .list_elements(params)
            .ok_or_else(|| Error::syntax("lambda's parameter list must be a proper list"))?;
        elems
            .into_iter()
            .map(|e| match e {
                Some(r) => match self.arena.get(r) {
                    Value::Symbol(id) => Ok(*id),
                    _ => Err(Error::syntax("lambda parameters must be symbols")),
                },
                None => Err(Error::syntax("lambda parameters must be symbols")),
            })
            .collect()
    }

    fn eval_define(&mut self, args: &[Option<ValueRef>], env: EnvRef) -> Result<Option<ValueRef>> {
        if args.is_empty() {
            return Err(arity_error(true, "define requires at least a name"));
        }
        match args[0] {
            Some(r) if matches!(self.arena.get(r), Value::Symbol(_)) => {
                if args.len() != 2 {
                    return Err(arity_error(
                        true,
                        "define of a name requires exactly one expression",
                    ));
                }
                let Value::Symbol(id) = self.arena.get(r) else {
                    unreachable!()
                };
                let id = *id;
                let value = self.eval(args[1], env)?;
                self.envs.define(env, id, value);
                Ok(None)
            }
            Some(r) if self.arena.is_pair(r) => {
                if args.len() < 2 {
                    return Err(arity_error(
                        true,
                        "define of a function requires at least one body form",
                    ));
                }
                let Value::Pair { car, cdr } = self.arena.get(r) else {
                    unreachable!()
                };
                let (name_expr, param_list) = (*car, *cdr);
                let name_id = match name_expr {
                    Some(nr) => match self.arena.get(nr) {
                        Value::Symbol(id) => *id,
                        _ => return Err(Error::syntax("define's function name must be a symbol")),
                    },
                    None => return Err(Error::syntax("define's function name must be a symbol")),
                };
                let params = self.parse_param_list(param_list)?;
                let body = args[1..].to_vec();
                // The lambda captures the current frame, and the name is
                // bound in that same frame, so recursive calls and later
                // redefinitions of other names in this frame are visible to
                // the body at call time (spec.md §9 open question).
                let lambda_ref = self.arena.alloc(Value::Lambda {
                    params,
                    body,
                    captured_env: env,
                });
                self.envs.define(env, name_id, Some(lambda_ref));
                Ok(None)
            }
            _ => Err(Error::syntax(
                "define's first argument must be a symbol or a (name params...) list",
            )),
        }
    }

    fn eval_set(&mut self, args: &[Option<ValueRef>], env: EnvRef) -> Result<Option<ValueRef>> {
        if args.len() != 2 {
            return Err(arity_error(true, "set! expects exactly 2 arguments"));
        }
        let name = self.expect_symbol_arg(args[0], "set!")?;
        let value = self.eval(args[1], env)?;
        let text = self.arena.symbol_name(name).to_string();
        self.envs.assign(env, name, value, &text)?;
        Ok(None)
    }

    fn eval_set_field(
        &mut self,
        prim: Primitive,
        args: &[Option<ValueRef>],
        env: EnvRef,
    ) -> Result<Option<ValueRef>> {
        if args.len() != 2 {
            return Err(arity_error(
                true,
                format!("{} expects exactly 2 arguments", prim.name()),
            ));
        }
        let pair_val = self.eval(args[0], env)?;
        let pair_ref = pair_val.ok_or_else(|| Error::runtime("expected a pair"))?;
        if !self.arena.is_pair(pair_ref) {
            return Err(Error::runtime("expected a pair"));
        }
        let new_value = self.eval(args[1], env)?;
        match self.arena.get_mut(pair_ref) {
            Value::Pair { car, cdr } => {
                if prim == Primitive::SetCarBang {
                    *car = new_value;
                } else {
                    *cdr = new_value;
                }
            }
            _ => unreachable!("checked above"),
        }
        Ok(None)
    }

    fn eval_and(&mut self, args: &[Option<ValueRef>], env: EnvRef) -> Result<Option<ValueRef>> {
        if args.is_empty() {
            return Ok(Some(self.arena.alloc(Value::Bool(true))));
        }
        let mut last = None;
        for &a in args {
            last = self.eval(a, env)?;
            if !self.arena.is_truthy(last) {
                return Ok(last);
            }
        }
        Ok(last)
    }

    fn eval_or(&mut self, args: &[Option<ValueRef>], env: EnvRef) -> Result<Option<ValueRef>> {
        if args.is_empty() {
            return Ok(Some(self.arena.alloc(Value::Bool(false))));
        }
        let mut last = None;
        for &a in args {
            last = self.eval(a, env)?;
            if self.arena.is_truthy(last) {
                return Ok(last);
            }
        }
        Ok(last)
    }

    fn expect_symbol_arg(&self, arg: Option<ValueRef>, form: &str) -> Result<SymbolId> {
        match arg {
            Some(r) => match self.arena.get(r) {
                Value::Symbol(id) => Ok(*id),
                _ => Err(Error::syntax(format!("{form}'s first argument must be a symbol"))),
            },
            None => Err(Error::syntax(format!("{form}'s first argument must be a symbol"))),
        }
    }

    // Regular primitives (all arguments already evaluated)
    // --------------------------------------------------

    fn apply_regular(
        &mut self,
        prim: Primitive,
        values: Vec<Option<ValueRef>>,
    ) -> Result<Option<ValueRef>> {
        use Primitive::*;
        match prim {
            NumberP => self.predicate(&values, |arena, r| matches!(arena.get(r), Value::Number(_))),
            BooleanP => self.predicate(&values, |arena, r| matches!(arena.get(r), Value::Bool(_))),
            SymbolP => self.predicate(&values, |arena, r| matches!(arena.get(r), Value::Symbol(_))),
            PairP => self.predicate(&values, |arena, r| arena.is_pair(r)),
            NullP => {
                if values.len() != 1 {
                    return Err(Error::runtime("null? expects exactly 1 argument"));
                }
                Ok(Some(self.arena.alloc(Value::Bool(values[0].is_none()))))
            }
            ListP => {
                if values.len() != 1 {
                    return Err(Error::runtime("list? expects exactly 1 argument"));
                }
                let is_list = self.arena.is_list(values[0]);
                Ok(Some(self.arena.alloc(Value::Bool(is_list))))
            }
            Add => self.fold_arith(&values, 0, |a, b| Ok(a + b)),
            Mul => self.fold_arith(&values, 1, |a, b| Ok(a * b)),
            Sub => self.fold_arith_nonempty(&values, "-", |a, b| Ok(a - b)),
            Div => self.fold_arith_nonempty(&values, "/", |a, b| {
                if b == 0 {
                    Err(Error::runtime("division by zero"))
                } else {
                    Ok(a / b)
                }
            }),
            Max => self.fold_arith_nonempty(&values, "max", |a, b| Ok(a.max(b))),
            Min => self.fold_arith_nonempty(&values, "min", |a, b| Ok(a.min(b))),
            Abs => {
                if values.len() != 1 {
                    return Err(Error::runtime("abs expects exactly 1 argument"));
                }
                let n = self.expect_number(values[0])?;
                Ok(Some(self.arena.alloc(Value::Number(n.abs()))))
            }
            Eq => self.compare(&values, |a, b| a == b),
            Lt => self.compare(&values, |a, b| a < b),
            Gt => self.compare(&values, |a, b| a > b),
            Le => self.compare(&values, |a, b| a <= b),
            Ge => self.compare(&values, |a, b| a >= b),
            Cons => {
                if values.len() != 2 {
                    return Err(Error::runtime("cons expects exactly 2 arguments"));
                }
                Ok(Some(self.arena.alloc(Value::Pair {
                    car: values[0],
                    cdr: values[1],
                })))
            }
            Car => {
                let p = self.expect_pair_arg(&values, "car")?;
                match self.arena.get(p) {
                    Value::Pair { car, .. } => Ok(*car),
                    _ => unreachable!("checked above"),
                }
            }
            Cdr => {
                let p = self.expect_pair_arg(&values, "cdr")?;
                match self.arena.get(p) {
                    Value::Pair { cdr, .. } => Ok(*cdr),
                    _ => unreachable!("checked above"),
                }
            }
            List => Ok(self.arena.alloc_list(values)),
            ListRef => self.list_ref(&values),
            ListTail => self.list_tail(&values),
            Not => {
                if values.len() != 1 {
                    return Err(Error::runtime("not expects exactly 1 argument"));
                }
                let truthy = self.arena.is_truthy(values[0]);
                Ok(Some(self.arena.alloc(Value::Bool(!truthy))))
            }
            Quote | If | Lambda | Define | SetBang | SetCarBang | SetCdrBang | And | Or => {
                unreachable!("special forms are dispatched before apply_regular")
            }
        }
    }

    fn predicate(
        &mut self,
        values: &[Option<ValueRef>],
        test: impl Fn(&Arena, ValueRef) -> bool,
    ) -> Result<Option<ValueRef>> {
        if values.len() != 1 {
            return Err(Error::runtime("predicate expects exactly 1 argument"));
        }
        let result = match values[0] {
            Some(r) => test(self.arena, r),
            None => false,
        };
        Ok(Some(self.arena.alloc(Value::Bool(result))))
    }

    fn expect_number(&self, value: Option<ValueRef>) -> Result<i64> {
        match value {
            Some(r) => match self.arena.get(r) {
                Value::Number(n) => Ok(*n),
                _ => Err(Error::runtime("expected a number")),
            },
            None => Err(Error::runtime("expected a number")),
        }
    }

    fn expect_pair_arg(&self, values: &[Option<ValueRef>], name: &str) -> Result<ValueRef> {
        if values.len() != 1 {
            return Err(Error::runtime(format!("{name} expects exactly 1 argument")));
        }
        match values[0] {
            Some(r) if self.arena.is_pair(r) => Ok(r),
            _ => Err(Error::runtime(format!("{name} expects a pair"))),
        }
    }

    fn fold_arith(
        &mut self,
        values: &[Option<ValueRef>],
        init: i64,
        op: impl Fn(i64, i64) -> Result<i64>,
    ) -> Result<Option<ValueRef>> {
        let mut acc = init;
        for &v in values {
            acc = op(acc, self.expect_number(v)?)?;
        }
        Ok(Some(self.arena.alloc(Value::Number(acc))))
    }

    fn fold_arith_nonempty(
        &mut self,
        values: &[Option<ValueRef>],
        name: &str,
        op: impl Fn(i64, i64) -> Result<i64>,
    ) -> Result<Option<ValueRef>> {
        if values.is_empty() {
            return Err(Error::runtime(format!("{name} requires at least 1 argument")));
        }
        let mut acc = self.expect_number(values[0])?;
        for &v in &values[1..] {
            acc = op(acc, self.expect_number(v)?)?;
        }
        Ok(Some(self.arena.alloc(Value::Number(acc))))
    }

    fn compare(
        &mut self,
        values: &[Option<ValueRef>],
        op: impl Fn(i64, i64) -> bool,
    ) -> Result<Option<ValueRef>> {
        let mut nums = Vec::with_capacity(values.len());
        for &v in values {
            nums.push(self.expect_number(v)?);
        }
        let result = nums.len() < 2 || nums.windows(2).all(|w| op(w[0], w[1]));
        Ok(Some(self.arena.alloc(Value::Bool(result))))
    }

    fn list_ref(&mut self, values: &[Option<ValueRef>]) -> Result<Option<ValueRef>> {
        if values.len() != 2 {
            return Err(Error::runtime("list-ref expects exactly 2 arguments"));
        }
        let k = self.expect_number(values[1])?;
        if k < 0 {
            return Err(Error::runtime("list-ref index out of range"));
        }
        let mut cursor = values[0];
        for _ in 0..k {
            cursor = match cursor {
                Some(r) => match self.arena.get(r) {
                    Value::Pair { cdr, .. } => *cdr,
                    _ => return Err(Error::runtime("list-ref index out of range")),
                },
                None => return Err(Error::runtime("list-ref index out of range")),
            };
        }
        match cursor {
            Some(r) => match self.arena.get(r) {
                Value::Pair { car, .. } => Ok(*car),
                _ => Err(Error::runtime("list-ref index out of range")),
            },
            None => Err(Error::runtime("list-ref index out of range")),
        }
    }

    fn list_tail(&mut self, values: &[Option<ValueRef>]) -> Result<Option<ValueRef>> {
        if values.len() != 2 {
            return Err(Error::runtime("list-tail expects exactly 2 arguments"));
        }
        let k = self.expect_number(values[1])?;
        if k < 0 {
            return Err(Error::runtime("list-tail index out of range"));
        }
        let mut cursor = values[0];
        for _ in 0..k {
            cursor = match cursor {
                Some(r) => match self.arena.get(r) {
                    Value::Pair { cdr, .. } => *cdr,
                    _ => return Err(Error::runtime("list-tail index out of range")),
                },
                None => return Err(Error::runtime("list-tail index out of range")),
            };
        }
        Ok(cursor)
    }
}
