//! Lexer and parser for the statements understood by the built-in calculator.

use crate::types::{EvalError, Value};

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Int(i64),
    Ident(String),
    Op(&'static str),
    /// Statement separator: a newline or `;`.
    Sep,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Int(n) => write!(f, "{}", n),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Op(op) => write!(f, "{}", op),
            Token::Sep => write!(f, "end of statement"),
        }
    }
}

/// Operators, longest first so that `<=` wins over `<`.
const OPERATORS: &[&str] = &[
    "||", "&&", "==", "!=", "<=", ">=", "<", ">", "+", "-", "*", "/", "%", "!", "=", "(", ")",
    "[", "]", ",",
];

/// Words with a fixed meaning; they cannot be assigned to.
const RESERVED: &[&str] = &[
    "if", "elsif", "else", "unless", "then", "end", "begin", "true", "false", "nil", "class",
    "module", "def", "do",
];

/// Constructs recognised but not evaluated.
const UNSUPPORTED: &[&str] = &["class", "module", "def", "do"];

/// Deepest expression tree the parser will build. Both parsing and
/// evaluation recurse once per level.
pub const MAX_DEPTH: usize = 128;

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Lit(Value),
    Var(String),
    Assign(String, Box<Expr>),
    Array(Vec<Expr>),
    Unary(&'static str, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    /// `if`/`elsif` arms in order, then the optional `else` body.
    If(Vec<(Expr, Vec<Expr>)>, Option<Vec<Expr>>),
    Block(Vec<Expr>),
}

// ========== Lexer ==========

/// Split source text into tokens.
///
/// Newlines inside `()` or `[]` do not end a statement. `#` starts a comment
/// that runs to the end of the line.
pub fn lex(src: &str) -> Result<Vec<Token>, EvalError> {
    let mut tokens = Vec::new();
    let mut depth: usize = 0;
    let mut rest = src;

    while let Some(c) = rest.chars().next() {
        if c == '#' {
            let end = rest.find('\n').unwrap_or(rest.len());
            rest = &rest[end..];
            continue;
        }
        if c == '\n' || c == ';' {
            if depth == 0 || c == ';' {
                tokens.push(Token::Sep);
            }
            rest = &rest[1..];
            continue;
        }
        if c.is_whitespace() {
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if c.is_ascii_digit() {
            let end = rest.find(|c: char| !c.is_ascii_digit() && c != '_').unwrap_or(rest.len());
            let digits: String = rest[..end].chars().filter(|&c| c != '_').collect();
            let n = digits
                .parse::<i64>()
                .map_err(|_| EvalError::new("RangeError", format!("integer literal {} is too large", digits)))?;
            tokens.push(Token::Int(n));
            rest = &rest[end..];
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let end = rest.find(|c: char| !crate::tokenizer::is_word_char(c)).unwrap_or(rest.len());
            tokens.push(Token::Ident(rest[..end].to_string()));
            rest = &rest[end..];
            continue;
        }
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                match *op {
                    "(" | "[" => depth += 1,
                    ")" | "]" => depth = depth.saturating_sub(1),
                    _ => {}
                }
                tokens.push(Token::Op(*op));
                rest = &rest[op.len()..];
            }
            None => return Err(EvalError::syntax(format!("unexpected character '{}'", c))),
        }
    }

    Ok(tokens)
}

// ========== Parser ==========

/// Parse a whole statement list.
pub fn parse(src: &str) -> Result<Vec<Expr>, EvalError> {
    let mut parser = Parser {
        tokens: lex(src)?,
        pos: 0,
        depth: 0,
    };
    let body = parser.body(&[])?;
    match parser.peek() {
        None => Ok(body),
        Some(tok) => Err(EvalError::syntax(format!("unexpected '{}'", tok))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

fn too_deep() -> EvalError {
    EvalError::new("SystemStackError", "stack level too deep")
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    fn at_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(s)) if s == word)
    }

    fn at_any_word(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.at_word(w))
    }

    fn at_op(&self, op: &str) -> bool {
        matches!(self.peek(), Some(Token::Op(o)) if *o == op)
    }

    /// Consume `op` if it is next.
    fn eat_op(&mut self, op: &str) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<(), EvalError> {
        if self.eat_op(op) {
            return Ok(());
        }
        Err(self.unexpected(&format!("'{}'", op)))
    }

    fn expect_word(&mut self, word: &str) -> Result<(), EvalError> {
        if self.at_word(word) {
            self.pos += 1;
            return Ok(());
        }
        Err(self.unexpected(&format!("'{}'", word)))
    }

    fn unexpected(&self, expected: &str) -> EvalError {
        match self.peek() {
            Some(tok) => EvalError::syntax(format!("unexpected '{}', expecting {}", tok, expected)),
            None => EvalError::syntax(format!("unexpected end of input, expecting {}", expected)),
        }
    }

    /// Go one level deeper, failing past [`MAX_DEPTH`].
    fn descend(&mut self) -> Result<(), EvalError> {
        if self.depth >= MAX_DEPTH {
            return Err(too_deep());
        }
        self.depth += 1;
        Ok(())
    }

    fn nested(&mut self, f: fn(&mut Self) -> Result<Expr, EvalError>) -> Result<Expr, EvalError> {
        self.descend()?;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(Token::Sep)) {
            self.pos += 1;
        }
    }

    /// Statements up to (not including) one of the `stop` words or end of input.
    fn body(&mut self, stop: &[&str]) -> Result<Vec<Expr>, EvalError> {
        let mut stmts = Vec::new();
        loop {
            self.skip_separators();
            if self.peek().is_none() || self.at_any_word(stop) {
                return Ok(stmts);
            }
            stmts.push(self.statement()?);
            match self.peek() {
                None | Some(Token::Sep) => {}
                Some(_) if self.at_any_word(stop) => {}
                Some(tok) => return Err(EvalError::syntax(format!("unexpected '{}'", tok))),
            }
        }
    }

    fn statement(&mut self) -> Result<Expr, EvalError> {
        self.nested(Self::assignment)
    }

    fn assignment(&mut self) -> Result<Expr, EvalError> {
        if let (Some(Token::Ident(name)), Some(Token::Op("="))) =
            (self.tokens.get(self.pos), self.tokens.get(self.pos + 1))
        {
            if RESERVED.contains(&name.as_str()) {
                return Err(EvalError::syntax(format!("can't assign to {}", name)));
            }
            let name = name.clone();
            self.pos += 2;
            let value = self.statement()?;
            return Ok(Expr::Assign(name, Box::new(value)));
        }
        self.or()
    }

    fn binary(
        &mut self,
        ops: &[&'static str],
        next: fn(&mut Self) -> Result<Expr, EvalError>,
    ) -> Result<Expr, EvalError> {
        let base = self.depth;
        let mut lhs = next(self)?;
        while let Some(op) = ops.iter().find(|op| self.at_op(op)) {
            self.pos += 1;
            // every operator in a chain adds a level to the left spine
            self.descend()?;
            let rhs = next(self)?;
            lhs = Expr::Binary(*op, Box::new(lhs), Box::new(rhs));
        }
        self.depth = base;
        Ok(lhs)
    }

    fn or(&mut self) -> Result<Expr, EvalError> {
        self.binary(&["||"], Self::and)
    }

    fn and(&mut self) -> Result<Expr, EvalError> {
        self.binary(&["&&"], Self::equality)
    }

    fn equality(&mut self) -> Result<Expr, EvalError> {
        self.binary(&["==", "!="], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr, EvalError> {
        self.binary(&["<=", ">=", "<", ">"], Self::additive)
    }

    fn additive(&mut self) -> Result<Expr, EvalError> {
        self.binary(&["+", "-"], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr, EvalError> {
        self.binary(&["*", "/", "%"], Self::unary)
    }

    fn unary(&mut self) -> Result<Expr, EvalError> {
        for op in ["-", "!"] {
            if self.eat_op(op) {
                let operand = self.nested(Self::unary)?;
                return Ok(Expr::Unary(op, Box::new(operand)));
            }
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, EvalError> {
        match self.next() {
            Some(Token::Int(n)) => Ok(Expr::Lit(Value::Int(n))),
            Some(Token::Op("(")) => {
                let inner = self.statement()?;
                self.expect_op(")")?;
                Ok(inner)
            }
            Some(Token::Op("[")) => {
                let mut items = Vec::new();
                while !self.at_op("]") {
                    items.push(self.statement()?);
                    if !self.eat_op(",") {
                        break;
                    }
                }
                self.expect_op("]")?;
                Ok(Expr::Array(items))
            }
            Some(Token::Ident(word)) => self.word(word),
            Some(tok) => Err(EvalError::syntax(format!("unexpected '{}'", tok))),
            None => Err(EvalError::syntax("unexpected end of input")),
        }
    }

    fn word(&mut self, word: String) -> Result<Expr, EvalError> {
        match word.as_str() {
            "true" => Ok(Expr::Lit(Value::Bool(true))),
            "false" => Ok(Expr::Lit(Value::Bool(false))),
            "nil" => Ok(Expr::Lit(Value::Nil)),
            "if" => self.if_tail(false),
            "unless" => self.if_tail(true),
            "begin" => {
                let body = self.body(&["end"])?;
                self.expect_word("end")?;
                Ok(Expr::Block(body))
            }
            w if UNSUPPORTED.contains(&w) => Err(EvalError::new(
                "NotImplementedError",
                format!("'{}' is not supported by this evaluator", w),
            )),
            w if RESERVED.contains(&w) => Err(EvalError::syntax(format!("unexpected '{}'", w))),
            other => Ok(Expr::Var(other.to_string())),
        }
    }

    /// Everything after `if`/`unless` up to and including the matching `end`.
    fn if_tail(&mut self, negate: bool) -> Result<Expr, EvalError> {
        let mut arms = Vec::new();
        let mut otherwise = None;
        let mut cond = self.statement()?;
        if negate {
            cond = Expr::Unary("!", Box::new(cond));
        }

        loop {
            if self.at_word("then") {
                self.pos += 1;
            }
            let stop: &[&str] = if negate { &["else", "end"] } else { &["elsif", "else", "end"] };
            let body = self.body(stop)?;
            arms.push((cond, body));

            if self.at_word("elsif") {
                self.pos += 1;
                cond = self.statement()?;
                continue;
            }
            if self.at_word("else") {
                self.pos += 1;
                otherwise = Some(self.body(&["end"])?);
            }
            self.expect_word("end")?;
            return Ok(Expr::If(arms, otherwise));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_basic() {
        let tokens = lex("x = 1 + 20").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("x".into()),
                Token::Op("="),
                Token::Int(1),
                Token::Op("+"),
                Token::Int(20),
            ]
        );
    }

    #[test]
    fn test_lex_two_char_operators() {
        let tokens = lex("a <= b != c").unwrap();
        assert_eq!(tokens[1], Token::Op("<="));
        assert_eq!(tokens[3], Token::Op("!="));
    }

    #[test]
    fn test_lex_separators_and_comments() {
        let tokens = lex("1; 2 # three\n4").unwrap();
        assert_eq!(
            tokens,
            vec![Token::Int(1), Token::Sep, Token::Int(2), Token::Sep, Token::Int(4)]
        );
    }

    #[test]
    fn test_lex_newline_inside_brackets_is_ignored() {
        let tokens = lex("[1,\n2]\n").unwrap();
        assert_eq!(tokens.iter().filter(|t| **t == Token::Sep).count(), 1);
    }

    #[test]
    fn test_lex_rejects_unknown_characters() {
        let err = lex("1 $ 2").unwrap_err();
        assert_eq!(err.kind, "SyntaxError");
    }

    #[test]
    fn test_lex_huge_literal() {
        let err = lex("99999999999999999999").unwrap_err();
        assert_eq!(err.kind, "RangeError");
    }

    #[test]
    fn test_parse_precedence() {
        let program = parse("1 + 2 * 3").unwrap();
        assert_eq!(
            program,
            vec![Expr::Binary(
                "+",
                Box::new(Expr::Lit(Value::Int(1))),
                Box::new(Expr::Binary(
                    "*",
                    Box::new(Expr::Lit(Value::Int(2))),
                    Box::new(Expr::Lit(Value::Int(3)))
                ))
            )]
        );
    }

    #[test]
    fn test_parse_if_elsif_else() {
        let program = parse("if a\n1\nelsif b\n2\nelse\n3\nend\n").unwrap();
        match &program[0] {
            Expr::If(arms, Some(otherwise)) => {
                assert_eq!(arms.len(), 2);
                assert_eq!(otherwise, &vec![Expr::Lit(Value::Int(3))]);
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_end() {
        let err = parse("if true\n1\n").unwrap_err();
        assert_eq!(err.kind, "SyntaxError");
        assert!(err.message.contains("'end'"));
    }

    #[test]
    fn test_parse_stray_end() {
        assert_eq!(parse("end").unwrap_err().kind, "SyntaxError");
    }

    #[test]
    fn test_parse_unsupported_block() {
        let err = parse("def foo\nend").unwrap_err();
        assert_eq!(err.kind, "NotImplementedError");
    }

    #[test]
    fn test_parse_assign_to_reserved() {
        assert_eq!(parse("nil = 1").unwrap_err().kind, "SyntaxError");
    }

    #[test]
    fn test_parse_nesting_limit() {
        let deep = format!("{}1{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.to_string(), "SystemStackError: stack level too deep");

        let negations = format!("{}1", "-".repeat(100_000));
        assert_eq!(parse(&negations).unwrap_err().kind, "SystemStackError");

        let nested_ifs = "if true\n".repeat(MAX_DEPTH + 1) + &"end\n".repeat(MAX_DEPTH + 1);
        assert_eq!(parse(&nested_ifs).unwrap_err().kind, "SystemStackError");
    }

    #[test]
    fn test_parse_long_operator_chain() {
        let sum = vec!["1"; MAX_DEPTH * 2].join(" + ");
        assert_eq!(parse(&sum).unwrap_err().kind, "SystemStackError");
        let short = vec!["1"; 50].join(" + ");
        assert!(parse(&short).is_ok());
    }

    #[test]
    fn test_parse_moderate_nesting() {
        let n = MAX_DEPTH / 2;
        let src = format!("{}[1]{}", "(".repeat(n), ")".repeat(n));
        assert_eq!(parse(&src).unwrap(), vec![Expr::Array(vec![Expr::Lit(Value::Int(1))])]);
    }

    #[test]
    fn test_parse_trailing_garbage() {
        assert_eq!(parse("1 2").unwrap_err().kind, "SyntaxError");
    }
}
