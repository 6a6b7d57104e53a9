//! Plural-Forms rule parsing and evaluation.
//!
//! The `Plural-Forms:` header carries a C-like expression over the single
//! integer variable `n`, used to pick the msgstr variant for a count, e.g.
//! `nplurals=2; plural=(n != 1);` for Italian.

use std::iter::Peekable;

use thiserror::Error;

/// Defines errors that may occur while parsing or evaluating a rule.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PluralError {
    /// Error when the header value lacks the `nplurals=` part
    #[error("Plural-Forms rule is missing 'nplurals='")]
    MissingNplurals,
    /// Error when the header value lacks the `plural=` part
    #[error("Plural-Forms rule is missing 'plural='")]
    MissingPlural,
    /// Error when `nplurals=` is not a positive integer
    #[error("Invalid nplurals value '{0}'")]
    InvalidNplurals(String),
    /// Error when the expression contains an unknown character
    #[error("Unexpected character '{0}' in plural expression")]
    UnexpectedChar(char),
    /// Error when a token appears where it is not allowed
    #[error("Unexpected token '{0}' in plural expression")]
    UnexpectedToken(String),
    /// Error when the expression ends mid-construct
    #[error("Unexpected end of plural expression")]
    UnexpectedEnd,
    /// Error when evaluation divides or takes a modulus by zero
    #[error("Division by zero while evaluating plural expression for n = {0}")]
    DivisionByZero(u64),
}

/// Lexical token of the expression language.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// The variable `n`.
    Var,
    /// A decimal literal.
    Num(u64),
    /// An operator or punctuation lexeme.
    Op(&'static str),
}

/// Non-short-circuiting binary operators, boolean ones evaluating to 0 or 1
/// as in C. `||` and `&&` have their own expression nodes so evaluation can
/// short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Expr {
    /// The variable `n`.
    Var,
    /// A literal.
    Num(u64),
    /// Logical negation.
    Not(Box<Expr>),
    /// Short-circuiting `||`.
    Or(Box<Expr>, Box<Expr>),
    /// Short-circuiting `&&`.
    And(Box<Expr>, Box<Expr>),
    /// A non-short-circuiting binary operation.
    Bin(BinOp, Box<Expr>, Box<Expr>),
    /// C ternary `cond ? then : else`.
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

/// A parsed `Plural-Forms:` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralForms {
    /// Number of plural categories the catalog declares.
    pub nplurals: usize,
    /// The selection expression.
    expr: Expr,
}

impl PluralForms {
    /// Parses a header value like `nplurals=2; plural=(n != 1);`.
    ///
    /// # Errors
    /// Returns an error if either part is missing or the expression is not
    /// a well-formed boolean/integer formula over `n`.
    pub fn parse(rule: &str) -> Result<Self, PluralError> {
        let mut nplurals = None;
        let mut plural_src = None;

        for part in rule.split(';') {
            let part = part.trim();
            if let Some(value) = part.strip_prefix("nplurals=") {
                nplurals = Some(
                    value
                        .trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|&n| n > 0)
                        .ok_or_else(|| PluralError::InvalidNplurals(value.trim().to_string()))?,
                );
            } else if let Some(expr) = part.strip_prefix("plural=") {
                plural_src = Some(expr.trim());
            }
        }

        let nplurals = nplurals.ok_or(PluralError::MissingNplurals)?;
        let plural_src = plural_src.ok_or(PluralError::MissingPlural)?;

        let tokens = tokenize(plural_src)?;
        let mut tokens = tokens.into_iter().peekable();
        let expr = parse_ternary(&mut tokens)?;
        if let Some(extra) = tokens.next() {
            return Err(PluralError::UnexpectedToken(token_text(&extra)));
        }

        Ok(Self { nplurals, expr })
    }

    /// Returns the plural index for a count.
    ///
    /// Boolean results are 0 or 1, so `(n != 1)` maps 1 → 0 and anything
    /// else → 1.
    ///
    /// # Errors
    /// Returns an error if evaluation divides by zero.
    pub fn index(&self, n: u64) -> Result<usize, PluralError> {
        let value = eval(&self.expr, n)?;
        Ok(usize::try_from(value).unwrap_or(usize::MAX))
    }
}

/// Lexes the expression into tokens.
fn tokenize(src: &str) -> Result<Vec<Token>, PluralError> {
    let mut tokens = Vec::new();
    let mut chars = src.chars().peekable();

    while let Some(&c) = chars.peek() {
        match c {
            ' ' | '\t' => {
                chars.next();
            }
            'n' => {
                chars.next();
                tokens.push(Token::Var);
            }
            '0'..='9' => {
                let mut value: u64 = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    value = value.saturating_mul(10).saturating_add(u64::from(d));
                    chars.next();
                }
                tokens.push(Token::Num(value));
            }
            '|' | '&' => {
                chars.next();
                if chars.next_if_eq(&c).is_none() {
                    return Err(PluralError::UnexpectedChar(c));
                }
                tokens.push(Token::Op(if c == '|' { "||" } else { "&&" }));
            }
            '=' => {
                chars.next();
                if chars.next_if_eq(&'=').is_none() {
                    return Err(PluralError::UnexpectedChar('='));
                }
                tokens.push(Token::Op("=="));
            }
            '!' => {
                chars.next();
                tokens.push(Token::Op(if chars.next_if_eq(&'=').is_some() { "!=" } else { "!" }));
            }
            '<' => {
                chars.next();
                tokens.push(Token::Op(if chars.next_if_eq(&'=').is_some() { "<=" } else { "<" }));
            }
            '>' => {
                chars.next();
                tokens.push(Token::Op(if chars.next_if_eq(&'=').is_some() { ">=" } else { ">" }));
            }
            '+' | '-' | '*' | '/' | '%' | '(' | ')' | '?' | ':' => {
                chars.next();
                tokens.push(Token::Op(match c {
                    '+' => "+",
                    '-' => "-",
                    '*' => "*",
                    '/' => "/",
                    '%' => "%",
                    '(' => "(",
                    ')' => ")",
                    '?' => "?",
                    _ => ":",
                }));
            }
            other => return Err(PluralError::UnexpectedChar(other)),
        }
    }

    Ok(tokens)
}

/// Display text of a token for error messages.
fn token_text(token: &Token) -> String {
    match token {
        Token::Var => "n".to_string(),
        Token::Num(v) => v.to_string(),
        Token::Op(op) => (*op).to_string(),
    }
}

/// Token stream alias used by the descent functions.
type Tokens = Peekable<std::vec::IntoIter<Token>>;

/// Consumes the next token if it is the given operator.
fn eat_op(tokens: &mut Tokens, op: &str) -> bool {
    matches!(tokens.peek(), Some(Token::Op(o)) if *o == op) && tokens.next().is_some()
}

/// `ternary := or ('?' ternary ':' ternary)?`
fn parse_ternary(tokens: &mut Tokens) -> Result<Expr, PluralError> {
    let cond = parse_or(tokens)?;
    if !eat_op(tokens, "?") {
        return Ok(cond);
    }
    let then = parse_ternary(tokens)?;
    if !eat_op(tokens, ":") {
        return Err(tokens.next().map_or(PluralError::UnexpectedEnd, |t| {
            PluralError::UnexpectedToken(token_text(&t))
        }));
    }
    let otherwise = parse_ternary(tokens)?;
    Ok(Expr::Ternary(Box::new(cond), Box::new(then), Box::new(otherwise)))
}

/// `or := and ('||' and)*`
fn parse_or(tokens: &mut Tokens) -> Result<Expr, PluralError> {
    let mut lhs = parse_and(tokens)?;
    while eat_op(tokens, "||") {
        let rhs = parse_and(tokens)?;
        lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

/// `and := binary ('&&' binary)*`
fn parse_and(tokens: &mut Tokens) -> Result<Expr, PluralError> {
    let mut lhs = parse_binary(tokens, 0)?;
    while eat_op(tokens, "&&") {
        let rhs = parse_binary(tokens, 0)?;
        lhs = Expr::And(Box::new(lhs), Box::new(rhs));
    }
    Ok(lhs)
}

/// Binary operator precedence levels, loosest first.
const PRECEDENCE: &[&[(&str, BinOp)]] = &[
    &[("==", BinOp::Eq), ("!=", BinOp::Ne)],
    &[("<=", BinOp::Le), (">=", BinOp::Ge), ("<", BinOp::Lt), (">", BinOp::Gt)],
    &[("+", BinOp::Add), ("-", BinOp::Sub)],
    &[("*", BinOp::Mul), ("/", BinOp::Div), ("%", BinOp::Mod)],
];

/// Left-associative binary expression at the given precedence level.
fn parse_binary(tokens: &mut Tokens, level: usize) -> Result<Expr, PluralError> {
    let Some(ops) = PRECEDENCE.get(level) else {
        return parse_unary(tokens);
    };

    let mut lhs = parse_binary(tokens, level + 1)?;
    'outer: loop {
        for (text, op) in *ops {
            if eat_op(tokens, text) {
                let rhs = parse_binary(tokens, level + 1)?;
                lhs = Expr::Bin(*op, Box::new(lhs), Box::new(rhs));
                continue 'outer;
            }
        }
        return Ok(lhs);
    }
}

/// `unary := '!' unary | primary`
fn parse_unary(tokens: &mut Tokens) -> Result<Expr, PluralError> {
    if eat_op(tokens, "!") {
        return Ok(Expr::Not(Box::new(parse_unary(tokens)?)));
    }
    parse_primary(tokens)
}

/// `primary := 'n' | number | '(' ternary ')'`
fn parse_primary(tokens: &mut Tokens) -> Result<Expr, PluralError> {
    match tokens.next() {
        Some(Token::Var) => Ok(Expr::Var),
        Some(Token::Num(v)) => Ok(Expr::Num(v)),
        Some(Token::Op("(")) => {
            let inner = parse_ternary(tokens)?;
            if eat_op(tokens, ")") {
                Ok(inner)
            } else {
                Err(tokens.next().map_or(PluralError::UnexpectedEnd, |t| {
                    PluralError::UnexpectedToken(token_text(&t))
                }))
            }
        }
        Some(other) => Err(PluralError::UnexpectedToken(token_text(&other))),
        None => Err(PluralError::UnexpectedEnd),
    }
}

/// Evaluates the expression for a count. Booleans are 0/1 as in C.
fn eval(expr: &Expr, n: u64) -> Result<u64, PluralError> {
    Ok(match expr {
        Expr::Var => n,
        Expr::Num(v) => *v,
        Expr::Not(inner) => u64::from(eval(inner, n)? == 0),
        Expr::Ternary(cond, then, otherwise) => {
            if eval(cond, n)? == 0 {
                eval(otherwise, n)?
            } else {
                eval(then, n)?
            }
        }
        // || and && short-circuit like C, which also sidesteps evaluating
        // a divide-by-zero on the untaken side.
        Expr::Or(lhs, rhs) => u64::from(eval(lhs, n)? != 0 || eval(rhs, n)? != 0),
        Expr::And(lhs, rhs) => u64::from(eval(lhs, n)? != 0 && eval(rhs, n)? != 0),
        Expr::Bin(op, lhs, rhs) => {
            let l = eval(lhs, n)?;
            let r = eval(rhs, n)?;
            match op {
                BinOp::Eq => u64::from(l == r),
                BinOp::Ne => u64::from(l != r),
                BinOp::Lt => u64::from(l < r),
                BinOp::Le => u64::from(l <= r),
                BinOp::Gt => u64::from(l > r),
                BinOp::Ge => u64::from(l >= r),
                BinOp::Add => l.saturating_add(r),
                BinOp::Sub => l.saturating_sub(r),
                BinOp::Mul => l.saturating_mul(r),
                BinOp::Div => l.checked_div(r).ok_or(PluralError::DivisionByZero(n))?,
                BinOp::Mod => l.checked_rem(r).ok_or(PluralError::DivisionByZero(n))?,
            }
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[googletest::test]
    fn test_italian_rule() {
        let forms = PluralForms::parse("nplurals=2; plural=(n != 1);").unwrap();

        expect_that!(forms.nplurals, eq(2));
        expect_that!(forms.index(0), ok(eq(&1)));
        expect_that!(forms.index(1), ok(eq(&0)));
        expect_that!(forms.index(2), ok(eq(&1)));
        expect_that!(forms.index(100), ok(eq(&1)));
    }

    #[googletest::test]
    fn test_japanese_rule_single_form() {
        let forms = PluralForms::parse("nplurals=1; plural=0;").unwrap();

        expect_that!(forms.nplurals, eq(1));
        expect_that!(forms.index(0), ok(eq(&0)));
        expect_that!(forms.index(42), ok(eq(&0)));
    }

    // ロシア語など 3 形式のルールで三項演算子と % を確認
    #[rstest]
    #[case::one(1, 0)]
    #[case::two(2, 1)]
    #[case::five(5, 2)]
    #[case::eleven(11, 2)]
    #[case::twenty_one(21, 0)]
    #[case::twenty_three(23, 1)]
    #[case::hundred(100, 2)]
    fn test_russian_rule(#[case] n: u64, #[case] expected: usize) {
        let rule = "nplurals=3; plural=(n%10==1 && n%100!=11 ? 0 : n%10>=2 && n%10<=4 && \
                    (n%100<10 || n%100>=20) ? 1 : 2);";
        let forms = PluralForms::parse(rule).unwrap();

        assert_eq!(forms.index(n).unwrap(), expected);
    }

    #[googletest::test]
    fn test_negation_and_comparison() {
        let forms = PluralForms::parse("nplurals=2; plural=!(n == 1);").unwrap();

        expect_that!(forms.index(1), ok(eq(&0)));
        expect_that!(forms.index(7), ok(eq(&1)));
    }

    #[googletest::test]
    fn test_short_circuit_skips_untaken_side() {
        // The right operand divides by n, so n = 0 only works if || stops
        // after the left operand.
        let forms = PluralForms::parse("nplurals=2; plural=(n == 0 || 10 / n > 5);").unwrap();

        expect_that!(forms.index(0), ok(eq(&1)));
        expect_that!(forms.index(1), ok(eq(&1)));
        expect_that!(forms.index(10), ok(eq(&0)));
    }

    #[rstest]
    #[case::missing_nplurals("plural=(n != 1);", PluralError::MissingNplurals)]
    #[case::missing_plural("nplurals=2;", PluralError::MissingPlural)]
    #[case::zero_nplurals("nplurals=0; plural=0;", PluralError::InvalidNplurals("0".to_string()))]
    #[case::bad_nplurals("nplurals=two; plural=0;", PluralError::InvalidNplurals("two".to_string()))]
    #[case::bad_char("nplurals=2; plural=(m != 1);", PluralError::UnexpectedChar('m'))]
    #[case::single_eq("nplurals=2; plural=(n = 1);", PluralError::UnexpectedChar('='))]
    #[case::dangling("nplurals=2; plural=(n !=;", PluralError::UnexpectedEnd)]
    fn test_malformed_rules(#[case] rule: &str, #[case] expected: PluralError) {
        assert_that!(PluralForms::parse(rule), err(eq(&expected)));
    }

    #[googletest::test]
    fn test_unbalanced_parens() {
        let result = PluralForms::parse("nplurals=2; plural=(n != 1;");

        expect_that!(result, err(anything()));
    }

    #[googletest::test]
    fn test_division_by_zero() {
        let forms = PluralForms::parse("nplurals=2; plural=n % 0;").unwrap();

        expect_that!(forms.index(5), err(eq(&PluralError::DivisionByZero(5))));
    }

    #[googletest::test]
    fn test_trailing_tokens_rejected() {
        let result = PluralForms::parse("nplurals=2; plural=n 1;");

        expect_that!(result, err(eq(&PluralError::UnexpectedToken("1".to_string()))));
    }
}
