//! Tree-walking executor for compiled routines.
//!
//! The interpreter owns no world state. Everything a script can observe or
//! mutate flows through the [`RoverApi`] trait (the fixed primitive
//! whitelist) or the context mapping handed to [`run`]. Each invocation
//! carries an operation budget so a script that never terminates faults
//! its tick instead of stalling the host.

use std::collections::HashMap;
use thiserror::Error;

use crate::constants::MAX_STEPS_PER_TICK;
use crate::script::ast::{AccessorOp, BinOp, Call, Expr, Primitive, Routine, Stmt};
use crate::value::{Value, values_equal};

/// The fixed set of primitives a routine may invoke. Implemented by the
/// mission bridge; test doubles implement it to observe call sequences.
pub trait RoverApi {
    /// Attempt one forward move. Yields whether the rover actually moved.
    fn move_forward(&mut self) -> Result<Value, RuntimeFault>;
    /// Rotate to a relative (`"left"`/`"right"`) or cardinal heading.
    fn turn(&mut self, heading: &Value) -> Result<Value, RuntimeFault>;
    /// Read one named sensor (`front`/`far`/`left`/`right`).
    fn scan(&mut self, sensor: &Value) -> Result<Value, RuntimeFault>;
    /// Emit one line of script output.
    fn write_line(&mut self, text: &str);
}

/// Faults raised while a routine runs. Caught at tick granularity by the
/// session; they never unwind further.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuntimeFault {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },
    #[error("%Get/%Set target is not a mapping")]
    NotAMapping,
    #[error("ordering comparison needs numeric operands")]
    NonNumericComparison,
    #[error("`For` bounds must be numeric")]
    NonNumericLoopBound,
    #[error("`For` step evaluated to a non-positive number")]
    NonPositiveStep,
    #[error("unknown sensor `{name}`")]
    UnknownSensor { name: String },
    #[error("unknown turn direction `{name}`")]
    UnknownTurn { name: String },
    #[error("routine exceeded the per-invocation operation budget")]
    BudgetExhausted,
}

/// Execute one routine invocation against the given context and bridge.
///
/// Every bridge call a statement issues completes before the next
/// statement runs; statements execute in source order.
///
/// # Errors
///
/// Returns the first [`RuntimeFault`] raised by the script, the accessor
/// layer, or the bridge.
pub fn run(
    routine: &Routine,
    context: &Value,
    api: &mut dyn RoverApi,
) -> Result<(), RuntimeFault> {
    let mut exec = Exec {
        context_param: &routine.context_param,
        context,
        api,
        locals: HashMap::new(),
        budget: MAX_STEPS_PER_TICK,
    };
    exec.exec_block(&routine.body)?;
    Ok(())
}

/// Outcome of a statement block: keep going, or unwind out of the routine.
enum Flow {
    Continue,
    Quit,
}

struct Exec<'a> {
    context_param: &'a str,
    context: &'a Value,
    api: &'a mut dyn RoverApi,
    locals: HashMap<String, Value>,
    budget: u32,
}

impl Exec<'_> {
    fn charge(&mut self) -> Result<(), RuntimeFault> {
        if self.budget == 0 {
            return Err(RuntimeFault::BudgetExhausted);
        }
        self.budget -= 1;
        Ok(())
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<Flow, RuntimeFault> {
        for stmt in stmts {
            if let Flow::Quit = self.exec_stmt(stmt)? {
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, RuntimeFault> {
        self.charge()?;
        match stmt {
            Stmt::Set { name, expr } => {
                let value = self.eval(expr)?;
                self.locals.insert(name.clone(), value);
                Ok(Flow::Continue)
            }
            Stmt::Do(call) => {
                self.eval_call(call)?;
                Ok(Flow::Continue)
            }
            Stmt::Write(expr) => {
                let text = self.eval(expr)?.to_text();
                self.api.write_line(&text);
                Ok(Flow::Continue)
            }
            Stmt::If { arms, fallback } => {
                for arm in arms {
                    if self.eval(&arm.cond)?.truthy() {
                        return self.exec_block(&arm.body);
                    }
                }
                match fallback {
                    Some(body) => self.exec_block(body),
                    None => Ok(Flow::Continue),
                }
            }
            Stmt::For {
                var,
                start,
                step,
                end,
                body,
            } => self.exec_for(var, start, step, end, body),
            Stmt::Quit => Ok(Flow::Quit),
        }
    }

    /// Counted loop: `var` walks from `start` by `step` while it stays
    /// within the inclusive upper bound `end`.
    fn exec_for(
        &mut self,
        var: &str,
        start: &Expr,
        step: &Expr,
        end: &Expr,
        body: &[Stmt],
    ) -> Result<Flow, RuntimeFault> {
        let start = self.eval_num(start)?;
        let step = self.eval_num(step)?;
        let end = self.eval_num(end)?;
        if step <= 0.0 {
            return Err(RuntimeFault::NonPositiveStep);
        }

        let mut cursor = start;
        while cursor <= end {
            self.charge()?;
            self.locals.insert(var.to_string(), Value::Num(cursor));
            if let Flow::Quit = self.exec_block(body)? {
                return Ok(Flow::Quit);
            }
            cursor += step;
        }
        Ok(Flow::Continue)
    }

    fn eval_num(&mut self, expr: &Expr) -> Result<f64, RuntimeFault> {
        self.eval(expr)?
            .as_num()
            .ok_or(RuntimeFault::NonNumericLoopBound)
    }

    fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeFault> {
        self.charge()?;
        match expr {
            Expr::Num(n) => Ok(Value::Num(*n)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Ident(name) => self.lookup(name),
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                self.apply_binary(*op, &lhs, &rhs)
            }
            Expr::Call(call) => self.eval_call(call),
        }
    }

    fn lookup(&self, name: &str) -> Result<Value, RuntimeFault> {
        if name == self.context_param {
            return Ok(self.context.clone());
        }
        self.locals
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeFault::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn apply_binary(&self, op: BinOp, lhs: &Value, rhs: &Value) -> Result<Value, RuntimeFault> {
        let value = match op {
            BinOp::Eq => Value::Bool(values_equal(lhs, rhs)),
            BinOp::Ne => Value::Bool(!values_equal(lhs, rhs)),
            BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
                let (Some(a), Some(b)) = (lhs.as_num(), rhs.as_num()) else {
                    return Err(RuntimeFault::NonNumericComparison);
                };
                Value::Bool(match op {
                    BinOp::Lt => a < b,
                    BinOp::Le => a <= b,
                    BinOp::Gt => a > b,
                    _ => a >= b,
                })
            }
            // Concatenation works on whatever the operands render as; no
            // coercion beyond the textual form.
            BinOp::Concat => Value::Str(format!("{}{}", lhs.to_text(), rhs.to_text())),
        };
        Ok(value)
    }

    fn eval_call(&mut self, call: &Call) -> Result<Value, RuntimeFault> {
        match call {
            Call::Bridge { primitive, args } => {
                let args = self.eval_args(args)?;
                let arg = |i: usize| args.get(i).cloned().unwrap_or(Value::Undefined);
                match primitive {
                    Primitive::Move => self.api.move_forward(),
                    Primitive::Turn => self.api.turn(&arg(0)),
                    Primitive::Scan => self.api.scan(&arg(0)),
                    Primitive::Write => {
                        self.api.write_line(&arg(0).to_text());
                        Ok(Value::Undefined)
                    }
                }
            }
            Call::Accessor { target, op, args } => {
                let target = self.eval(target)?;
                let args = self.eval_args(args)?;
                let map = target.as_map().ok_or(RuntimeFault::NotAMapping)?;
                match op {
                    AccessorOp::Get => Ok(map.borrow().get(&args[0].to_text())),
                    AccessorOp::Set => {
                        let key = args[0].to_text();
                        map.borrow_mut().set(key, args[1].clone());
                        Ok(Value::Undefined)
                    }
                }
            }
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> Result<Vec<Value>, RuntimeFault> {
        args.iter().map(|arg| self.eval(arg)).collect()
    }
}
