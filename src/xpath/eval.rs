//! XPath Evaluation Engine
//!
//! Stack machine over compiled ops. Node sets are kept in document order
//! using ranks computed once per evaluation, since node ids stop reflecting
//! document order as soon as the tree is edited.

use super::axes::{matches_attribute_test, matches_node_test, navigate};
use super::compiler::{compile, CompiledExpr, CompiledStep, Op};
use super::functions::{self, CallContext};
use super::parser::{Axis, BinaryOp};
use super::value::{format_number, parse_number, XPathValue};
use crate::dom::{DocumentAccess, NodeId};

/// Evaluation context - generic over document type
pub struct EvalContext<'a, D: DocumentAccess> {
    pub doc: &'a D,
    order: &'a [u32],
    pub node: NodeId,
    pub position: usize,
    pub size: usize,
}

impl<'a, D: DocumentAccess> EvalContext<'a, D> {
    fn at(&self, node: NodeId, position: usize, size: usize) -> Self {
        EvalContext {
            doc: self.doc,
            order: self.order,
            node,
            position,
            size,
        }
    }

    fn rank(&self, node: NodeId) -> u32 {
        self.order.get(node as usize).copied().unwrap_or(u32::MAX)
    }

    /// Sort into document order and drop duplicates
    fn normalize(&self, mut nodes: Vec<NodeId>) -> Vec<NodeId> {
        nodes.sort_by_key(|&n| (self.rank(n), n));
        nodes.dedup();
        nodes
    }
}

/// Evaluate an XPath expression with the document node as context
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate<D: DocumentAccess>(doc: &D, xpath: &str) -> Result<XPathValue, String> {
    let compiled = compile(xpath)?;
    evaluate_compiled(doc, &compiled, doc.document_node_id())
}

/// Evaluate an XPath expression from a specific context node
#[must_use = "XPath evaluation result should be used"]
pub fn evaluate_from_node<D: DocumentAccess>(
    doc: &D,
    context_node: NodeId,
    xpath: &str,
) -> Result<XPathValue, String> {
    let compiled = compile(xpath)?;
    evaluate_compiled(doc, &compiled, context_node)
}

/// Evaluate a compiled expression
pub fn evaluate_compiled<D: DocumentAccess>(
    doc: &D,
    expr: &CompiledExpr,
    context_node: NodeId,
) -> Result<XPathValue, String> {
    let order = doc.document_order();
    let ctx = EvalContext {
        doc,
        order: &order,
        node: context_node,
        position: 1,
        size: 1,
    };
    run(expr, &ctx)
}

fn pop(stack: &mut Vec<XPathValue>) -> Result<XPathValue, String> {
    stack.pop().ok_or_else(|| "Malformed expression".to_string())
}

fn run<D: DocumentAccess>(expr: &CompiledExpr, ctx: &EvalContext<'_, D>) -> Result<XPathValue, String> {
    let mut stack: Vec<XPathValue> = Vec::new();

    for op in &expr.ops {
        let value = match op {
            Op::Root => XPathValue::NodeSet(vec![ctx.doc.document_node_id()]),
            Op::Context => XPathValue::NodeSet(vec![ctx.node]),
            Op::Step(step) => {
                let input = pop(&mut stack)?;
                apply_step(ctx, input, step)?
            }
            Op::Predicate(predicate) => match pop(&mut stack)? {
                XPathValue::NodeSet(nodes) => XPathValue::NodeSet(filter(ctx, nodes, predicate)?),
                XPathValue::StringList(values) => {
                    XPathValue::StringList(filter_values(ctx, values, predicate)?)
                }
                _ => return Err("Predicate applied to a non-node-set".to_string()),
            },
            Op::Union => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                match (left, right) {
                    (XPathValue::NodeSet(mut l), XPathValue::NodeSet(r)) => {
                        l.extend(r);
                        XPathValue::NodeSet(ctx.normalize(l))
                    }
                    (XPathValue::StringList(mut l), XPathValue::StringList(r)) => {
                        l.extend(r);
                        XPathValue::StringList(l)
                    }
                    _ => return Err("Union requires two node-sets".to_string()),
                }
            }
            Op::Number(n) => XPathValue::Number(*n),
            Op::String(s) => XPathValue::String(s.clone()),
            Op::Variable(name) => return Err(format!("Undefined variable ${}", name)),
            Op::Negate => {
                let value = pop(&mut stack)?;
                XPathValue::Number(-number_of(ctx.doc, &value))
            }
            Op::Binary(op) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                binary(ctx.doc, *op, &left, &right)
            }
            Op::Call(name, arg_count) => {
                let split = stack
                    .len()
                    .checked_sub(*arg_count)
                    .ok_or_else(|| "Malformed expression".to_string())?;
                let args = stack.split_off(split);
                let call_ctx = CallContext {
                    doc: ctx.doc,
                    node: ctx.node,
                    position: ctx.position,
                    size: ctx.size,
                };
                functions::call(name, args, &call_ctx)?
            }
        };
        stack.push(value);
    }

    pop(&mut stack)
}

fn apply_step<D: DocumentAccess>(
    ctx: &EvalContext<'_, D>,
    input: XPathValue,
    step: &CompiledStep,
) -> Result<XPathValue, String> {
    let XPathValue::NodeSet(nodes) = input else {
        return Err("Location step applied to a non-node-set".to_string());
    };
    let doc = ctx.doc;

    if step.axis == Axis::Attribute {
        if !step.predicates.is_empty() {
            return Err("Predicates on attribute steps are not supported".to_string());
        }
        let values = nodes
            .iter()
            .flat_map(|&node| doc.get_attribute_values(node))
            .filter(|(name, _)| matches_attribute_test(name, &step.test))
            .map(|(_, value)| value.to_string())
            .collect();
        return Ok(XPathValue::StringList(values));
    }

    let mut result = Vec::new();
    for node in nodes {
        let mut selected: Vec<NodeId> = navigate(doc, node, step.axis)
            .into_iter()
            .filter(|&candidate| matches_node_test(doc, candidate, &step.test))
            .collect();
        for predicate in &step.predicates {
            selected = filter(ctx, selected, predicate)?;
        }
        result.extend(selected);
    }
    Ok(XPathValue::NodeSet(ctx.normalize(result)))
}

/// Keep the nodes for which the predicate holds, positions counted in input order
fn filter<D: DocumentAccess>(
    ctx: &EvalContext<'_, D>,
    nodes: Vec<NodeId>,
    predicate: &CompiledExpr,
) -> Result<Vec<NodeId>, String> {
    let size = nodes.len();
    let mut kept = Vec::with_capacity(size);
    for (i, node) in nodes.into_iter().enumerate() {
        let result = run(predicate, &ctx.at(node, i + 1, size))?;
        if predicate_holds(&result, i + 1) {
            kept.push(node);
        }
    }
    Ok(kept)
}

/// Positional filtering of attribute values; the context node is unchanged
fn filter_values<D: DocumentAccess>(
    ctx: &EvalContext<'_, D>,
    values: Vec<String>,
    predicate: &CompiledExpr,
) -> Result<Vec<String>, String> {
    let size = values.len();
    let mut kept = Vec::with_capacity(size);
    for (i, value) in values.into_iter().enumerate() {
        let result = run(predicate, &ctx.at(ctx.node, i + 1, size))?;
        if predicate_holds(&result, i + 1) {
            kept.push(value);
        }
    }
    Ok(kept)
}

fn predicate_holds(result: &XPathValue, position: usize) -> bool {
    match result {
        XPathValue::Number(n) => position as f64 == *n,
        other => other.to_boolean(),
    }
}

/// XPath string() with document access
pub fn string_of<D: DocumentAccess>(doc: &D, value: &XPathValue) -> String {
    match value {
        XPathValue::NodeSet(nodes) => nodes.first().map(|&n| doc.string_value(n)).unwrap_or_default(),
        XPathValue::StringList(list) => list.first().cloned().unwrap_or_default(),
        XPathValue::Boolean(b) => b.to_string(),
        XPathValue::Number(n) => format_number(*n),
        XPathValue::String(s) => s.clone(),
    }
}

/// XPath number() with document access
pub fn number_of<D: DocumentAccess>(doc: &D, value: &XPathValue) -> f64 {
    match value {
        XPathValue::Number(n) => *n,
        XPathValue::Boolean(b) => f64::from(u8::from(*b)),
        other => parse_number(&string_of(doc, other)),
    }
}

fn binary<D: DocumentAccess>(doc: &D, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> XPathValue {
    let arithmetic = |f: fn(f64, f64) -> f64| XPathValue::Number(f(number_of(doc, left), number_of(doc, right)));
    match op {
        BinaryOp::Or => XPathValue::Boolean(left.to_boolean() || right.to_boolean()),
        BinaryOp::And => XPathValue::Boolean(left.to_boolean() && right.to_boolean()),
        BinaryOp::Eq | BinaryOp::NotEq | BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            XPathValue::Boolean(compare(doc, op, left, right))
        }
        BinaryOp::Add => arithmetic(|a, b| a + b),
        BinaryOp::Sub => arithmetic(|a, b| a - b),
        BinaryOp::Mul => arithmetic(|a, b| a * b),
        BinaryOp::Div => arithmetic(|a, b| a / b),
        BinaryOp::Mod => arithmetic(|a, b| a % b),
    }
}

/// String values of the items of a node set or attribute list
fn items<D: DocumentAccess>(doc: &D, value: &XPathValue) -> Option<Vec<String>> {
    match value {
        XPathValue::NodeSet(nodes) => Some(nodes.iter().map(|&n| doc.string_value(n)).collect()),
        XPathValue::StringList(list) => Some(list.clone()),
        _ => None,
    }
}

/// XPath 1.0 §3.4 comparison; sets compare existentially
fn compare<D: DocumentAccess>(doc: &D, op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    match (items(doc, left), items(doc, right)) {
        (Some(l), Some(r)) => l.iter().any(|a| {
            r.iter()
                .any(|b| compare_atomic(op, &XPathValue::String(a.clone()), &XPathValue::String(b.clone())))
        }),
        (Some(set), None) => compare_set(op, &set, right, true),
        (None, Some(set)) => compare_set(op, &set, left, false),
        (None, None) => compare_atomic(op, left, right),
    }
}

fn compare_set(op: BinaryOp, set: &[String], atom: &XPathValue, set_on_left: bool) -> bool {
    if let XPathValue::Boolean(_) = atom {
        let set_value = XPathValue::Boolean(!set.is_empty());
        return if set_on_left {
            compare_atomic(op, &set_value, atom)
        } else {
            compare_atomic(op, atom, &set_value)
        };
    }
    set.iter().any(|item| {
        let item = XPathValue::String(item.clone());
        if set_on_left {
            compare_atomic(op, &item, atom)
        } else {
            compare_atomic(op, atom, &item)
        }
    })
}

fn compare_atomic(op: BinaryOp, left: &XPathValue, right: &XPathValue) -> bool {
    let as_number = |v: &XPathValue| match v {
        XPathValue::Number(n) => *n,
        XPathValue::Boolean(b) => f64::from(u8::from(*b)),
        XPathValue::String(s) => parse_number(s),
        _ => f64::NAN,
    };
    let as_string = |v: &XPathValue| match v {
        XPathValue::String(s) => s.clone(),
        XPathValue::Number(n) => format_number(*n),
        XPathValue::Boolean(b) => b.to_string(),
        _ => String::new(),
    };

    match op {
        BinaryOp::Eq | BinaryOp::NotEq => {
            let equal = if matches!(left, XPathValue::Boolean(_)) || matches!(right, XPathValue::Boolean(_)) {
                left.to_boolean() == right.to_boolean()
            } else if matches!(left, XPathValue::Number(_)) || matches!(right, XPathValue::Number(_)) {
                as_number(left) == as_number(right)
            } else {
                as_string(left) == as_string(right)
            };
            if op == BinaryOp::Eq {
                equal
            } else {
                !equal
            }
        }
        BinaryOp::Lt => as_number(left) < as_number(right),
        BinaryOp::LtEq => as_number(left) <= as_number(right),
        BinaryOp::Gt => as_number(left) > as_number(right),
        BinaryOp::GtEq => as_number(left) >= as_number(right),
        _ => false,
    }
}
