//! XPath 1.0 Functions
//!
//! Node set: position(), last(), count(), local-name(), name()
//! String: string(), concat(), starts-with(), contains(), substring(),
//!   substring-before(), substring-after(), string-length(),
//!   normalize-space(), translate()
//! Boolean: boolean(), not(), true(), false()
//! Number: number(), sum(), floor(), ceiling(), round()

use super::eval::{number_of, string_of};
use super::value::{parse_number, XPathValue};
use crate::dom::{DocumentAccess, NodeId};

/// Dynamic context a function sees
pub struct CallContext<'a, D: DocumentAccess> {
    pub doc: &'a D,
    pub node: NodeId,
    pub position: usize,
    pub size: usize,
}

fn check_arity(name: &str, args: &[XPathValue], min: usize, max: usize) -> Result<(), String> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    if min == max {
        Err(format!("{name}() takes {min} argument(s), got {}", args.len()))
    } else {
        Err(format!("{name}() takes {min} to {max} arguments, got {}", args.len()))
    }
}

/// Evaluate a function call
pub fn call<D: DocumentAccess>(
    name: &str,
    args: Vec<XPathValue>,
    ctx: &CallContext<'_, D>,
) -> Result<XPathValue, String> {
    let doc = ctx.doc;
    let string_arg = |i: usize| string_of(doc, &args[i]);
    // string of the first argument, or of the context node when omitted
    let string_or_context = || match args.first() {
        Some(value) => string_of(doc, value),
        None => doc.string_value(ctx.node),
    };

    let value = match name {
        "last" => {
            check_arity(name, &args, 0, 0)?;
            XPathValue::Number(ctx.size as f64)
        }
        "position" => {
            check_arity(name, &args, 0, 0)?;
            XPathValue::Number(ctx.position as f64)
        }
        "count" => {
            check_arity(name, &args, 1, 1)?;
            match args[0].item_count() {
                Some(n) => XPathValue::Number(n as f64),
                None => return Err("count() argument must be a node-set".to_string()),
            }
        }
        "name" | "local-name" => {
            check_arity(name, &args, 0, 1)?;
            let node = match args.first() {
                None => Some(ctx.node),
                Some(XPathValue::NodeSet(nodes)) => nodes.first().copied(),
                Some(_) => return Err(format!("{name}() argument must be a node-set")),
            };
            let text = node.and_then(|n| {
                if name == "name" {
                    doc.node_name(n)
                } else {
                    doc.node_local_name(n)
                }
            });
            XPathValue::String(text.unwrap_or_default().to_string())
        }

        "string" => {
            check_arity(name, &args, 0, 1)?;
            XPathValue::String(string_or_context())
        }
        "concat" => {
            if args.len() < 2 {
                return Err("concat() takes at least 2 arguments".to_string());
            }
            XPathValue::String(args.iter().map(|a| string_of(doc, a)).collect())
        }
        "starts-with" => {
            check_arity(name, &args, 2, 2)?;
            XPathValue::Boolean(string_arg(0).starts_with(&string_arg(1)))
        }
        "contains" => {
            check_arity(name, &args, 2, 2)?;
            XPathValue::Boolean(string_arg(0).contains(&string_arg(1)))
        }
        "substring-before" => {
            check_arity(name, &args, 2, 2)?;
            let s = string_arg(0);
            let before = s.find(&string_arg(1)).map(|i| s[..i].to_string());
            XPathValue::String(before.unwrap_or_default())
        }
        "substring-after" => {
            check_arity(name, &args, 2, 2)?;
            let s = string_arg(0);
            let pattern = string_arg(1);
            let after = s.find(&pattern).map(|i| s[i + pattern.len()..].to_string());
            XPathValue::String(after.unwrap_or_default())
        }
        "substring" => {
            check_arity(name, &args, 2, 3)?;
            let start = round_half_up(number_of(doc, &args[1]));
            let end = match args.get(2) {
                Some(len) => start + round_half_up(number_of(doc, len)),
                None => f64::INFINITY,
            };
            // characters at 1-based position p with start <= p < end
            let picked = string_arg(0)
                .chars()
                .enumerate()
                .filter(|&(i, _)| {
                    let p = (i + 1) as f64;
                    p >= start && p < end
                })
                .map(|(_, c)| c)
                .collect();
            XPathValue::String(picked)
        }
        "string-length" => {
            check_arity(name, &args, 0, 1)?;
            XPathValue::Number(string_or_context().chars().count() as f64)
        }
        "normalize-space" => {
            check_arity(name, &args, 0, 1)?;
            let s = string_or_context();
            XPathValue::String(s.split_ascii_whitespace().collect::<Vec<_>>().join(" "))
        }
        "translate" => {
            check_arity(name, &args, 3, 3)?;
            let from: Vec<char> = string_arg(1).chars().collect();
            let to: Vec<char> = string_arg(2).chars().collect();
            let translated = string_arg(0)
                .chars()
                .filter_map(|c| match from.iter().position(|&f| f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            XPathValue::String(translated)
        }

        "boolean" => {
            check_arity(name, &args, 1, 1)?;
            XPathValue::Boolean(args[0].to_boolean())
        }
        "not" => {
            check_arity(name, &args, 1, 1)?;
            XPathValue::Boolean(!args[0].to_boolean())
        }
        "true" | "false" => {
            check_arity(name, &args, 0, 0)?;
            XPathValue::Boolean(name == "true")
        }

        "number" => {
            check_arity(name, &args, 0, 1)?;
            match args.first() {
                Some(value) => XPathValue::Number(number_of(doc, value)),
                None => XPathValue::Number(parse_number(&doc.string_value(ctx.node))),
            }
        }
        "sum" => {
            check_arity(name, &args, 1, 1)?;
            let total = match &args[0] {
                XPathValue::NodeSet(nodes) => nodes.iter().map(|&n| parse_number(&doc.string_value(n))).sum(),
                XPathValue::StringList(list) => list.iter().map(|s| parse_number(s)).sum(),
                _ => return Err("sum() argument must be a node-set".to_string()),
            };
            XPathValue::Number(total)
        }
        "floor" | "ceiling" | "round" => {
            check_arity(name, &args, 1, 1)?;
            let n = number_of(doc, &args[0]);
            XPathValue::Number(match name {
                "floor" => n.floor(),
                "ceiling" => n.ceil(),
                _ => round_half_up(n),
            })
        }

        _ => return Err(format!("Unknown function: {}", name)),
    };
    Ok(value)
}

/// XPath round(): nearest integer, halves toward positive infinity
fn round_half_up(n: f64) -> f64 {
    if n.is_nan() || n.is_infinite() {
        n
    } else {
        (n + 0.5).floor()
    }
}

#[cfg(test)]
mod tests {
    use crate::dom::parse;
    use crate::xpath::{evaluate, XPathValue};

    fn eval(xml: &str, expr: &str) -> XPathValue {
        let tree = parse(xml.as_bytes()).unwrap();
        evaluate(&tree, expr).unwrap()
    }

    fn string(xml: &str, expr: &str) -> String {
        match eval(xml, expr) {
            XPathValue::String(s) => s,
            other => panic!("expected string, got {:?}", other),
        }
    }

    fn number(xml: &str, expr: &str) -> f64 {
        match eval(xml, expr) {
            XPathValue::Number(n) => n,
            other => panic!("expected number, got {:?}", other),
        }
    }

    #[test]
    fn test_string_functions() {
        let xml = "<r><a>  hello   world </a><b>x</b></r>";
        assert_eq!(string(xml, "concat(/r/b, '-', 'y')"), "x-y");
        assert_eq!(string(xml, "normalize-space(/r/a)"), "hello world");
        assert_eq!(string(xml, "substring('12345', 2, 3)"), "234");
        assert_eq!(string(xml, "substring('12345', 1.5, 2.6)"), "234");
        assert_eq!(string(xml, "substring-before('a/b', '/')"), "a");
        assert_eq!(string(xml, "substring-after('a/b', '/')"), "b");
        assert_eq!(string(xml, "translate('bar', 'abc', 'ABC')"), "BAr");
    }

    #[test]
    fn test_node_set_functions() {
        let xml = "<r><p/><p/><cp:q xmlns:cp=\"urn:x\"/></r>";
        assert_eq!(number(xml, "count(/r/p)"), 2.0);
        assert_eq!(number(xml, "count(/r/p/@missing)"), 0.0);
        assert_eq!(string(xml, "name(/r/*[3])"), "cp:q");
        assert_eq!(string(xml, "local-name(/r/*[3])"), "q");
    }

    #[test]
    fn test_number_functions() {
        let xml = "<r><v>1.5</v><v>2</v></r>";
        assert_eq!(number(xml, "sum(/r/v)"), 3.5);
        assert_eq!(number(xml, "round(2.5)"), 3.0);
        assert_eq!(number(xml, "round(-2.5)"), -2.0);
        assert_eq!(number(xml, "floor(/r/v[1])"), 1.0);
        assert!(number(xml, "number('x')").is_nan());
    }

    #[test]
    fn test_arity_and_unknown_functions() {
        let tree = parse(b"<r/>").unwrap();
        assert!(evaluate(&tree, "count()").is_err());
        assert!(evaluate(&tree, "frobnicate(1)").is_err());
        assert!(evaluate(&tree, "count('x')").is_err());
    }
}
