//! XPath Lexer
//!
//! Tokenizes XPath expressions. Operator names (`and`, `or`, `mod`, `div`)
//! are only recognized where an operator may appear, so they remain usable as
//! element names.

/// XPath token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Operators
    Slash,       // /
    DoubleSlash, // //
    Dot,         // .
    DoubleDot,   // ..
    At,          // @
    Pipe,        // |
    Plus,        // +
    Minus,       // -
    Star,        // *
    Eq,          // =
    NotEq,       // !=
    Lt,          // <
    LtEq,        // <=
    Gt,          // >
    GtEq,        // >=
    And,         // and
    Or,          // or
    Mod,         // mod
    Div,         // div

    // Brackets
    LeftParen,    // (
    RightParen,   // )
    LeftBracket,  // [
    RightBracket, // ]

    // Literals
    Number(f64),
    String(String),

    // Names
    Name(String),     // NCName or QName
    NameTest(String), // prefix:*
    NodeType(String), // node, text, comment, processing-instruction (followed by '(')

    // Axis
    Axis(String), // child, descendant, ... (followed by '::')

    // Special
    DoubleColon, // ::
    Comma,       // ,
    Dollar,      // $
}

impl Token {
    /// Whether an operator name may follow this token
    ///
    /// XPath 1.0 §3.7: a name is an operator name when there is a preceding
    /// token that is not `@`, `::`, `(`, `[`, `,` or an operator.
    fn allows_operator_after(&self) -> bool {
        !matches!(
            self,
            Token::At
                | Token::DoubleColon
                | Token::LeftParen
                | Token::LeftBracket
                | Token::Comma
                | Token::Slash
                | Token::DoubleSlash
                | Token::Pipe
                | Token::Plus
                | Token::Minus
                | Token::Star
                | Token::Eq
                | Token::NotEq
                | Token::Lt
                | Token::LtEq
                | Token::Gt
                | Token::GtEq
                | Token::And
                | Token::Or
                | Token::Mod
                | Token::Div
                | Token::Dollar
        )
    }
}

/// Tokenize an expression; fails on characters and literals XPath does not allow
pub fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    tokens: Vec<Token>,
}

impl<'a> Lexer<'a> {
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn operator_allowed(&self) -> bool {
        self.tokens.last().is_some_and(Token::allows_operator_after)
    }

    fn run(&mut self) -> Result<(), String> {
        loop {
            self.skip_whitespace();
            let Some(c) = self.peek() else {
                return Ok(());
            };
            let token = self.next_token(c)?;
            self.tokens.push(token);
        }
    }

    fn skip_whitespace(&mut self) {
        let trimmed = self.remaining().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    /// Consume `len` bytes and yield `token`
    fn take(&mut self, len: usize, token: Token) -> Result<Token, String> {
        self.pos += len;
        Ok(token)
    }

    fn next_token(&mut self, c: char) -> Result<Token, String> {
        let next = self.peek_second();
        match c {
            '/' if next == Some('/') => self.take(2, Token::DoubleSlash),
            '/' => self.take(1, Token::Slash),
            '.' if next == Some('.') => self.take(2, Token::DoubleDot),
            '.' if next.is_some_and(|d| d.is_ascii_digit()) => Ok(self.read_number()),
            '.' => self.take(1, Token::Dot),
            '@' => self.take(1, Token::At),
            '|' => self.take(1, Token::Pipe),
            '+' => self.take(1, Token::Plus),
            '-' => self.take(1, Token::Minus),
            '*' => self.take(1, Token::Star),
            '=' => self.take(1, Token::Eq),
            '!' if next == Some('=') => self.take(2, Token::NotEq),
            '<' if next == Some('=') => self.take(2, Token::LtEq),
            '<' => self.take(1, Token::Lt),
            '>' if next == Some('=') => self.take(2, Token::GtEq),
            '>' => self.take(1, Token::Gt),
            '(' => self.take(1, Token::LeftParen),
            ')' => self.take(1, Token::RightParen),
            '[' => self.take(1, Token::LeftBracket),
            ']' => self.take(1, Token::RightBracket),
            ',' => self.take(1, Token::Comma),
            '$' => self.take(1, Token::Dollar),
            ':' if next == Some(':') => self.take(2, Token::DoubleColon),
            '"' | '\'' => self.read_string(c),
            '0'..='9' => Ok(self.read_number()),
            _ if is_name_start_char(c) => Ok(self.read_name()),
            _ => Err(format!("Unexpected character '{}' at offset {}", c, self.pos)),
        }
    }

    fn read_number(&mut self) -> Token {
        let rest = self.remaining();
        let mut end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if rest[end..].starts_with('.') {
            end += 1;
            end += rest[end..]
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len() - end);
        }
        self.pos += end;
        Token::Number(rest[..end].parse().unwrap_or(f64::NAN))
    }

    fn read_string(&mut self, quote: char) -> Result<Token, String> {
        let body = &self.remaining()[1..];
        let close = body
            .find(quote)
            .ok_or_else(|| format!("Unterminated string literal at offset {}", self.pos))?;
        let value = body[..close].to_string();
        self.pos += close + 2;
        Ok(Token::String(value))
    }

    fn scan_ncname(&mut self) -> &'a str {
        let rest = self.remaining();
        let end = rest.find(|c: char| !is_name_char(c)).unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }

    fn read_name(&mut self) -> Token {
        let operator_allowed = self.operator_allowed();
        let name = self.scan_ncname();

        if operator_allowed {
            match name {
                "and" => return Token::And,
                "or" => return Token::Or,
                "mod" => return Token::Mod,
                "div" => return Token::Div,
                _ => {}
            }
        }

        // prefix:local or prefix:*
        if self.peek() == Some(':') && self.peek_second() != Some(':') {
            let after = &self.remaining()[1..];
            if after.starts_with('*') {
                self.pos += 2;
                return Token::NameTest(format!("{name}:*"));
            }
            if after.starts_with(is_name_start_char) {
                self.pos += 1;
                let local = self.scan_ncname();
                return Token::Name(format!("{name}:{local}"));
            }
        }

        let lookahead = self.remaining().trim_start();
        if lookahead.starts_with("::") {
            Token::Axis(name.to_string())
        } else if lookahead.starts_with('(')
            && matches!(name, "node" | "text" | "comment" | "processing-instruction")
        {
            Token::NodeType(name.to_string())
        } else {
            Token::Name(name.to_string())
        }
    }
}

fn is_name_start_char(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-' || c == '.'
}
