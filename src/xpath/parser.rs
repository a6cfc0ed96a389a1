//! XPath Parser
//!
//! Recursive descent parser for XPath 1.0 expressions over the token list
//! produced by the lexer. The whole input must form one expression; trailing
//! tokens are an error.

use super::lexer::{tokenize, Token};

/// XPath expression AST node
#[derive(Debug, Clone)]
pub enum Expr {
    /// Root path (/)
    Root,
    /// Current context (.)
    Context,
    /// Parent (..)
    Parent,
    /// Union of two expressions (|)
    Union(Box<Expr>, Box<Expr>),
    /// Path expression (expr/step)
    Path(Box<Expr>, Box<Step>),
    /// Filter expression with predicate
    Filter(Box<Expr>, Box<Expr>),
    /// Function call
    Function(String, Vec<Expr>),
    /// Binary operation
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// Unary negation
    Negate(Box<Expr>),
    /// Literal number
    Number(f64),
    /// Literal string
    String(String),
    /// Variable reference
    Variable(String),
    /// Location step relative to the context node
    Step(Box<Step>),
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// Location step in a path
#[derive(Debug, Clone)]
pub struct Step {
    pub axis: Axis,
    pub node_test: NodeTest,
    pub predicates: Vec<Expr>,
}

impl Step {
    fn abbreviated(axis: Axis) -> Self {
        Step {
            axis,
            node_test: NodeTest::Node,
            predicates: Vec::new(),
        }
    }
}

/// XPath axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Child,
    Descendant,
    DescendantOrSelf,
    Parent,
    Ancestor,
    AncestorOrSelf,
    FollowingSibling,
    PrecedingSibling,
    Following,
    Preceding,
    Self_,
    Attribute,
    Namespace,
}

impl Axis {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "child" => Some(Axis::Child),
            "descendant" => Some(Axis::Descendant),
            "descendant-or-self" => Some(Axis::DescendantOrSelf),
            "parent" => Some(Axis::Parent),
            "ancestor" => Some(Axis::Ancestor),
            "ancestor-or-self" => Some(Axis::AncestorOrSelf),
            "following-sibling" => Some(Axis::FollowingSibling),
            "preceding-sibling" => Some(Axis::PrecedingSibling),
            "following" => Some(Axis::Following),
            "preceding" => Some(Axis::Preceding),
            "self" => Some(Axis::Self_),
            "attribute" => Some(Axis::Attribute),
            "namespace" => Some(Axis::Namespace),
            _ => None,
        }
    }

    /// Reverse axes number their proximity positions backwards
    pub fn is_reverse(self) -> bool {
        matches!(
            self,
            Axis::Parent | Axis::Ancestor | Axis::AncestorOrSelf | Axis::PrecedingSibling | Axis::Preceding
        )
    }
}

/// Node test in a location step
#[derive(Debug, Clone)]
pub enum NodeTest {
    /// Matches any principal node (*)
    Any,
    /// Matches by qualified name as written
    Name(String),
    /// Matches prefix:*
    NamespaceWildcard(String),
    /// node() - matches any node
    Node,
    /// text() - matches text nodes
    Text,
    /// comment() - matches comments
    Comment,
    /// processing-instruction() - matches PIs
    ProcessingInstruction(Option<String>),
}

/// Parse an XPath expression string
pub fn parse(input: &str) -> Result<Expr, String> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err("Empty expression".to_string());
    }
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.parse_expr()?;
    match parser.current() {
        None => Ok(expr),
        Some(token) => Err(format!("Unexpected trailing token: {:?}", token)),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn lookahead(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn at(&self, token: &Token) -> bool {
        self.current() == Some(token)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, token: Token) -> Result<(), String> {
        if self.at(&token) {
            self.advance();
            Ok(())
        } else {
            Err(format!("Expected {:?}, found {:?}", token, self.current()))
        }
    }

    fn parse_expr(&mut self) -> Result<Expr, String> {
        self.parse_or_expr()
    }

    /// Left-associative binary level: `next (op next)*`
    fn parse_binary_level(
        &mut self,
        next: fn(&mut Self) -> Result<Expr, String>,
        operator: fn(&Token) -> Option<BinaryOp>,
    ) -> Result<Expr, String> {
        let mut left = next(self)?;
        while let Some(op) = self.current().and_then(operator) {
            self.advance();
            let right = next(self)?;
            left = Expr::Binary(Box::new(left), op, Box::new(right));
        }
        Ok(left)
    }

    fn parse_or_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_and_expr, |t| match t {
            Token::Or => Some(BinaryOp::Or),
            _ => None,
        })
    }

    fn parse_and_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_equality_expr, |t| match t {
            Token::And => Some(BinaryOp::And),
            _ => None,
        })
    }

    fn parse_equality_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_relational_expr, |t| match t {
            Token::Eq => Some(BinaryOp::Eq),
            Token::NotEq => Some(BinaryOp::NotEq),
            _ => None,
        })
    }

    fn parse_relational_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_additive_expr, |t| match t {
            Token::Lt => Some(BinaryOp::Lt),
            Token::LtEq => Some(BinaryOp::LtEq),
            Token::Gt => Some(BinaryOp::Gt),
            Token::GtEq => Some(BinaryOp::GtEq),
            _ => None,
        })
    }

    fn parse_additive_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_multiplicative_expr, |t| match t {
            Token::Plus => Some(BinaryOp::Add),
            Token::Minus => Some(BinaryOp::Sub),
            _ => None,
        })
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr, String> {
        self.parse_binary_level(Self::parse_unary_expr, |t| match t {
            Token::Star => Some(BinaryOp::Mul),
            Token::Div => Some(BinaryOp::Div),
            Token::Mod => Some(BinaryOp::Mod),
            _ => None,
        })
    }

    fn parse_unary_expr(&mut self) -> Result<Expr, String> {
        if self.at(&Token::Minus) {
            self.advance();
            let expr = self.parse_unary_expr()?;
            Ok(Expr::Negate(Box::new(expr)))
        } else {
            self.parse_union_expr()
        }
    }

    fn parse_union_expr(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_path_expr()?;
        while self.at(&Token::Pipe) {
            self.advance();
            let right = self.parse_path_expr()?;
            left = Expr::Union(Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    /// True when the current token can begin a location step
    fn at_step_start(&self) -> bool {
        matches!(
            self.current(),
            Some(
                Token::Name(_)
                    | Token::NameTest(_)
                    | Token::NodeType(_)
                    | Token::Axis(_)
                    | Token::Star
                    | Token::At
                    | Token::Dot
                    | Token::DoubleDot
            )
        )
    }

    fn parse_path_expr(&mut self) -> Result<Expr, String> {
        let expr = match self.current() {
            Some(Token::Slash) => {
                self.advance();
                if !self.at_step_start() {
                    return Ok(Expr::Root);
                }
                let step = self.parse_step()?;
                Expr::Path(Box::new(Expr::Root), Box::new(step))
            }
            Some(Token::DoubleSlash) => {
                self.advance();
                let descend = Expr::Path(
                    Box::new(Expr::Root),
                    Box::new(Step::abbreviated(Axis::DescendantOrSelf)),
                );
                let step = self.parse_step()?;
                Expr::Path(Box::new(descend), Box::new(step))
            }
            _ if self.is_function_call() || self.is_primary_start() => {
                let primary = self.parse_primary_expr()?;
                self.parse_predicates_onto(primary)?
            }
            _ => {
                let step = self.parse_step()?;
                Expr::Step(Box::new(step))
            }
        };
        self.parse_path_continuation(expr)
    }

    fn is_function_call(&self) -> bool {
        matches!(self.current(), Some(Token::Name(_))) && self.lookahead(1) == Some(&Token::LeftParen)
    }

    fn is_primary_start(&self) -> bool {
        matches!(
            self.current(),
            Some(Token::Number(_) | Token::String(_) | Token::Dollar | Token::LeftParen)
        )
    }

    /// Filter predicates applied to a primary expression
    fn parse_predicates_onto(&mut self, mut expr: Expr) -> Result<Expr, String> {
        while self.at(&Token::LeftBracket) {
            self.advance();
            let predicate = self.parse_expr()?;
            self.expect(Token::RightBracket)?;
            expr = Expr::Filter(Box::new(expr), Box::new(predicate));
        }
        Ok(expr)
    }

    /// `/step` and `//step` continuations
    fn parse_path_continuation(&mut self, mut expr: Expr) -> Result<Expr, String> {
        loop {
            match self.current() {
                Some(Token::Slash) => {
                    self.advance();
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(expr), Box::new(step));
                }
                Some(Token::DoubleSlash) => {
                    self.advance();
                    let descend = Expr::Path(
                        Box::new(expr),
                        Box::new(Step::abbreviated(Axis::DescendantOrSelf)),
                    );
                    let step = self.parse_step()?;
                    expr = Expr::Path(Box::new(descend), Box::new(step));
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, String> {
        let token = self.current().cloned();
        match token {
            Some(Token::Number(n)) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            Some(Token::String(s)) => {
                self.advance();
                Ok(Expr::String(s))
            }
            Some(Token::Dollar) => {
                self.advance();
                match self.current().cloned() {
                    Some(Token::Name(name)) => {
                        self.advance();
                        Ok(Expr::Variable(name))
                    }
                    _ => Err("Expected variable name".to_string()),
                }
            }
            Some(Token::LeftParen) => {
                self.advance();
                let expr = self.parse_expr()?;
                self.expect(Token::RightParen)?;
                Ok(expr)
            }
            Some(Token::Name(name)) => {
                self.advance();
                self.expect(Token::LeftParen)?;
                let args = self.parse_function_args()?;
                Ok(Expr::Function(name, args))
            }
            other => Err(format!("Unexpected token: {:?}", other)),
        }
    }

    fn parse_step(&mut self) -> Result<Step, String> {
        match self.current() {
            Some(Token::Dot) => {
                self.advance();
                return Ok(Step::abbreviated(Axis::Self_));
            }
            Some(Token::DoubleDot) => {
                self.advance();
                return Ok(Step::abbreviated(Axis::Parent));
            }
            _ => {}
        }

        let mut axis = Axis::Child;
        if self.at(&Token::At) {
            axis = Axis::Attribute;
            self.advance();
        } else if let Some(Token::Axis(name)) = self.current() {
            axis = Axis::from_name(name).ok_or_else(|| format!("Unknown axis: {}", name))?;
            self.advance();
            self.expect(Token::DoubleColon)?;
        }

        let node_test = self.parse_node_test()?;

        let mut predicates = Vec::new();
        while self.at(&Token::LeftBracket) {
            self.advance();
            predicates.push(self.parse_expr()?);
            self.expect(Token::RightBracket)?;
        }

        Ok(Step {
            axis,
            node_test,
            predicates,
        })
    }

    fn parse_node_test(&mut self) -> Result<NodeTest, String> {
        let token = self.current().cloned();
        self.advance();
        match token {
            Some(Token::Star) => Ok(NodeTest::Any),
            Some(Token::Name(name)) => Ok(NodeTest::Name(name)),
            Some(Token::NameTest(wildcard)) => {
                let prefix = wildcard.trim_end_matches(":*").to_string();
                Ok(NodeTest::NamespaceWildcard(prefix))
            }
            Some(Token::NodeType(kind)) => {
                self.expect(Token::LeftParen)?;
                let target = match self.current().cloned() {
                    Some(Token::String(s)) if kind == "processing-instruction" => {
                        self.advance();
                        Some(s)
                    }
                    _ => None,
                };
                self.expect(Token::RightParen)?;
                match kind.as_str() {
                    "node" => Ok(NodeTest::Node),
                    "text" => Ok(NodeTest::Text),
                    "comment" => Ok(NodeTest::Comment),
                    _ => Ok(NodeTest::ProcessingInstruction(target)),
                }
            }
            other => Err(format!("Expected node test, got {:?}", other)),
        }
    }

    fn parse_function_args(&mut self) -> Result<Vec<Expr>, String> {
        let mut args = Vec::new();
        if !self.at(&Token::RightParen) {
            args.push(self.parse_expr()?);
            while self.at(&Token::Comma) {
                self.advance();
                args.push(self.parse_expr()?);
            }
        }
        self.expect(Token::RightParen)?;
        Ok(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_path() {
        let expr = parse("/root/child").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_predicate_on_step() {
        let expr = parse("item[@uID='w1']").unwrap();
        match expr {
            Expr::Step(step) => {
                assert_eq!(step.axis, Axis::Child);
                assert_eq!(step.predicates.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_descendant() {
        let expr = parse("//externaldata").unwrap();
        assert!(matches!(expr, Expr::Path(..)));
    }

    #[test]
    fn test_function() {
        let expr = parse("count(//item)").unwrap();
        assert!(matches!(expr, Expr::Function(name, _) if name == "count"));
    }

    #[test]
    fn test_filtered_group() {
        let expr = parse("(/a/point)[2]/x").unwrap();
        match expr {
            Expr::Path(base, step) => {
                assert!(matches!(*base, Expr::Filter(..)));
                assert!(matches!(step.node_test, NodeTest::Name(ref n) if n == "x"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_root_alone_and_in_union() {
        assert!(matches!(parse("/").unwrap(), Expr::Root));
        assert!(matches!(parse("/ | /a").unwrap(), Expr::Union(..)));
    }

    #[test]
    fn test_abbreviated_steps() {
        assert!(parse("/a/..").is_ok());
        assert!(parse("//.").is_ok());
        assert!(parse("../b").is_ok());
    }

    #[test]
    fn test_malformed() {
        for bad in ["", "/a/b]", "/a[", "/a/", "a b", "count(", "//", "/a[1", "@"] {
            assert!(parse(bad).is_err(), "accepted {:?}", bad);
        }
    }
}
