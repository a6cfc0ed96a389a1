//! XPath Expression Compiler
//!
//! Flattens the parsed AST into a postfix op list for the stack evaluator.
//! Step predicates stay attached to their step because proximity positions
//! are counted per context node, not over the merged result.

use super::parser::{Axis, BinaryOp, Expr, NodeTest, Step};

/// Compiled XPath expression
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    pub ops: Vec<Op>,
}

/// Compiled location step
#[derive(Debug, Clone)]
pub struct CompiledStep {
    pub axis: Axis,
    pub test: NodeTest,
    pub predicates: Vec<CompiledExpr>,
}

/// Compiled operation
#[derive(Debug, Clone)]
pub enum Op {
    /// Push the document node
    Root,
    /// Push the context node
    Context,
    /// Replace the node set on top of the stack by the step result
    Step(Box<CompiledStep>),
    /// Filter the node set on top of the stack
    Predicate(Box<CompiledExpr>),
    /// Union two node sets
    Union,
    /// Push literal number
    Number(f64),
    /// Push literal string
    String(String),
    /// Call function (name, arg count)
    Call(String, usize),
    /// Binary operation
    Binary(BinaryOp),
    /// Negate
    Negate,
    /// Variable reference
    Variable(String),
}

impl CompiledExpr {
    /// Compile a parsed expression
    pub fn compile(expr: &Expr) -> Self {
        let mut ops = Vec::new();
        compile_expr(expr, &mut ops);
        CompiledExpr { ops }
    }
}

fn compile_expr(expr: &Expr, ops: &mut Vec<Op>) {
    match expr {
        Expr::Root => ops.push(Op::Root),
        Expr::Context => ops.push(Op::Context),
        Expr::Parent => {
            ops.push(Op::Context);
            ops.push(Op::Step(Box::new(CompiledStep {
                axis: Axis::Parent,
                test: NodeTest::Node,
                predicates: Vec::new(),
            })));
        }
        Expr::Number(n) => ops.push(Op::Number(*n)),
        Expr::String(s) => ops.push(Op::String(s.clone())),
        Expr::Variable(name) => ops.push(Op::Variable(name.clone())),
        Expr::Negate(inner) => {
            compile_expr(inner, ops);
            ops.push(Op::Negate);
        }
        Expr::Binary(left, op, right) => {
            compile_expr(left, ops);
            compile_expr(right, ops);
            ops.push(Op::Binary(*op));
        }
        Expr::Union(left, right) => {
            compile_expr(left, ops);
            compile_expr(right, ops);
            ops.push(Op::Union);
        }
        Expr::Path(base, step) => {
            compile_expr(base, ops);
            ops.push(compile_step(step));
        }
        Expr::Filter(base, predicate) => {
            compile_expr(base, ops);
            ops.push(Op::Predicate(Box::new(CompiledExpr::compile(predicate))));
        }
        Expr::Step(step) => {
            ops.push(Op::Context);
            ops.push(compile_step(step));
        }
        Expr::Function(name, args) => {
            for arg in args {
                compile_expr(arg, ops);
            }
            ops.push(Op::Call(name.clone(), args.len()));
        }
    }
}

fn compile_step(step: &Step) -> Op {
    Op::Step(Box::new(CompiledStep {
        axis: step.axis,
        test: step.node_test.clone(),
        predicates: step.predicates.iter().map(CompiledExpr::compile).collect(),
    }))
}

/// Compile an XPath expression string
pub fn compile(xpath: &str) -> Result<CompiledExpr, String> {
    let expr = super::parser::parse(xpath)?;
    Ok(CompiledExpr::compile(&expr))
}
