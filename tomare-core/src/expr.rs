//! 式の構文検証
//!
//! ブレークポイントの条件式や自動表示式を受け付ける前に、構文だけを検査します。
//! 評価は一切行わないため、検証中にターゲットのコードが実行されることはありません。
//!
//! 受け付ける構文はターゲット言語の式のサブセットです:
//! リテラル、変数（`x`, `@x`, `$x`, `Const`, `A::B`）、単項・二項演算子、
//! 三項演算子、メソッド呼び出し（`a.b(c)`）、添字（`a[0]`）、配列リテラル。
//! 代入（`=`）は条件式の書き間違いとみなして拒否します。

use crate::Result;

/// リテラル
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    /// 数値リテラルはソース表記のまま保持する（桁数の上限なし、`_` は除去済み）
    Int(String),
    Float(String),
    Str(String),
    Symbol(String),
}

/// 式の構文木
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Literal),
    /// 変数・定数・レシーバなしのメソッド名: `x`, `@x`, `$x`, `Foo`, `self`
    Name(String),
    /// 定数のスコープ解決: `A::B`
    Scope {
        base: Box<Expression>,
        name: String,
    },
    Unary {
        op: String,
        operand: Box<Expression>,
    },
    Binary {
        op: String,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Ternary {
        cond: Box<Expression>,
        then: Box<Expression>,
        otherwise: Box<Expression>,
    },
    /// メソッド呼び出し: `recv.name(args)` または `name(args)`
    Call {
        receiver: Option<Box<Expression>>,
        method: String,
        args: Vec<Expression>,
    },
    /// 添字アクセス: `base[index, ...]`
    Index {
        base: Box<Expression>,
        index: Vec<Expression>,
    },
    Array(Vec<Expression>),
}

/// 字句
#[derive(Debug, Clone, PartialEq)]
enum Token {
    Int(String),
    Float(String),
    Str(String),
    Symbol(String),
    Ident(String),
    /// `@x`, `@@x`, `$x`
    Sigil(String),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    Scope,
    Question,
    Colon,
}

/// 長いものから順に照合する演算子
const OPERATORS: &[&str] = &[
    "===", "<=>", "**", "==", "!=", "=~", "!~", "<=", ">=", "<<", ">>", "&&", "||", "+", "-",
    "*", "/", "%", "<", ">", "!", "~", "&", "|", "^",
];

/// 構文として正しい式かどうかを判定する
///
/// 空文字列や空白のみの文字列は拒否します。
pub fn validate(candidate: &str) -> bool {
    !candidate.trim().is_empty() && parse_expression(candidate).is_ok()
}

/// 式をパースする
pub fn parse_expression(input: &str) -> Result<Expression> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let expr = parser.parse_expr(0)?;

    if let Some(tok) = parser.peek() {
        return Err(anyhow::anyhow!("Unexpected {:?} after expression", tok));
    }
    Ok(expr)
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `?`/`!` の直後が `at` のとき、それをメソッド名の一部として扱えるか
///
/// `x.nil?==false` は接尾辞付きの名前と `==` に分け、`x!=y` は `x` と `!=` に分けます。
fn ends_method_suffix(chars: &[char], at: usize) -> bool {
    match chars.get(at).copied() {
        None => true,
        Some(c) if c.is_whitespace() => true,
        Some('(' | ')' | ']' | ',' | '.' | '<' | '>' | '&' | '|' | '*' | '/' | '%' | '^') => true,
        // 単独の `=` は `!=` や代入の一部
        Some('=' | '!') => matches!(chars.get(at + 1), Some('=' | '~')),
        Some(_) => false,
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        if c.is_ascii_digit() {
            let (token, next) = lex_number(&chars, i)?;
            tokens.push(token);
            i = next;
            continue;
        }

        if is_ident_start(c) {
            let start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            // `empty?` や `save!` のようなメソッド名の接尾辞
            if i < chars.len()
                && (chars[i] == '?' || chars[i] == '!')
                && ends_method_suffix(&chars, i + 1)
            {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        if c == '@' || c == '$' {
            let start = i;
            i += 1;
            if c == '@' && chars.get(i) == Some(&'@') {
                i += 1;
            }
            let name_start = i;
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            if i == name_start {
                return Err(anyhow::anyhow!("Invalid variable name at column {}", start + 1));
            }
            tokens.push(Token::Sigil(chars[start..i].iter().collect()));
            continue;
        }

        if c == '"' || c == '\'' {
            let (s, next) = lex_string(&chars, i)?;
            tokens.push(Token::Str(s));
            i = next;
            continue;
        }

        if c == ':' {
            if chars.get(i + 1) == Some(&':') {
                tokens.push(Token::Scope);
                i += 2;
            } else if chars.get(i + 1).copied().is_some_and(is_ident_start) {
                let start = i + 1;
                i += 1;
                while i < chars.len() && is_ident_char(chars[i]) {
                    i += 1;
                }
                tokens.push(Token::Symbol(chars[start..i].iter().collect()));
            } else {
                tokens.push(Token::Colon);
                i += 1;
            }
            continue;
        }

        let punct = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ',' => Some(Token::Comma),
            '.' => Some(Token::Dot),
            '?' => Some(Token::Question),
            _ => None,
        };
        if let Some(token) = punct {
            tokens.push(token);
            i += 1;
            continue;
        }

        let rest: String = chars[i..chars.len().min(i + 3)].iter().collect();
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                tokens.push(Token::Op(*op));
                i += op.chars().count();
            }
            None => {
                return Err(anyhow::anyhow!("Unexpected character '{}' at column {}", c, i + 1));
            }
        }
    }

    Ok(tokens)
}

fn lex_number(chars: &[char], start: usize) -> Result<(Token, usize)> {
    let mut i = start;

    if chars[i] == '0' && matches!(chars.get(i + 1), Some('x' | 'X')) {
        i += 2;
        let digits_start = i;
        while i < chars.len() && (chars[i].is_ascii_hexdigit() || chars[i] == '_') {
            i += 1;
        }
        if i == digits_start || (i < chars.len() && is_ident_char(chars[i])) {
            return Err(anyhow::anyhow!("Invalid hexadecimal literal at column {}", start + 1));
        }
        let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
        return Ok((Token::Int(text), i));
    }

    while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
        i += 1;
    }
    let mut is_float = false;
    if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
        is_float = true;
        i += 1;
        while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '_') {
            i += 1;
        }
    }
    if i < chars.len() && is_ident_start(chars[i]) {
        return Err(anyhow::anyhow!("Invalid numeric literal at column {}", start + 1));
    }

    let text: String = chars[start..i].iter().filter(|c| **c != '_').collect();
    let token = if is_float {
        Token::Float(text)
    } else {
        Token::Int(text)
    };
    Ok((token, i))
}

fn lex_string(chars: &[char], start: usize) -> Result<(String, usize)> {
    let quote = chars[start];
    let mut out = String::new();
    let mut i = start + 1;

    while i < chars.len() {
        match chars[i] {
            '\\' if i + 1 < chars.len() => {
                out.push(chars[i + 1]);
                i += 2;
            }
            c if c == quote => return Ok((out, i + 1)),
            c => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(anyhow::anyhow!("Unterminated string literal"))
}

/// 二項演算子の結合力 (左, 右)
fn infix_binding_power(token: &Token) -> Option<(&'static str, u8, u8)> {
    let op = match token {
        Token::Op(op) => *op,
        Token::Ident(word) if word == "and" => "and",
        Token::Ident(word) if word == "or" => "or",
        _ => return None,
    };
    let (l, r) = match op {
        "and" | "or" => (2, 3),
        "||" => (8, 9),
        "&&" => (10, 11),
        "==" | "!=" | "===" | "=~" | "!~" | "<=>" => (12, 13),
        "<" | "<=" | ">" | ">=" => (14, 15),
        "|" | "^" => (16, 17),
        "&" => (18, 19),
        "<<" | ">>" => (20, 21),
        "+" | "-" => (22, 23),
        "*" | "/" | "%" => (24, 25),
        "**" => (29, 28),
        _ => return None,
    };
    Some((op, l, r))
}

const NOT_BINDING_POWER: u8 = 4;
const TERNARY_BINDING_POWER: u8 = 6;
const NEGATE_BINDING_POWER: u8 = 26;
const BANG_BINDING_POWER: u8 = 30;

/// 式の入れ子の上限
const MAX_NESTING_DEPTH: usize = 256;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// 現在の `parse_expr` の再帰の深さ
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(tok) if tok == expected => Ok(()),
            Some(tok) => Err(anyhow::anyhow!("Expected {:?}, found {:?}", expected, tok)),
            None => Err(anyhow::anyhow!("Expected {:?}, found end of input", expected)),
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(name)) => Ok(name),
            Some(tok) => Err(anyhow::anyhow!("Expected a name, found {:?}", tok)),
            None => Err(anyhow::anyhow!("Expected a name, found end of input")),
        }
    }

    fn parse_expr(&mut self, min_bp: u8) -> Result<Expression> {
        self.depth += 1;
        if self.depth > MAX_NESTING_DEPTH {
            return Err(anyhow::anyhow!("Expression nested too deeply"));
        }
        let expr = self.parse_operators(min_bp);
        self.depth -= 1;
        expr
    }

    fn parse_operators(&mut self, min_bp: u8) -> Result<Expression> {
        let mut lhs = self.parse_prefix()?;

        loop {
            let Some(token) = self.peek().cloned() else {
                break;
            };

            // 後置演算子は最も強く結合する
            match token {
                Token::Dot => {
                    self.next();
                    let method = self.expect_ident()?;
                    let args = if self.peek() == Some(&Token::LParen) {
                        self.next();
                        self.parse_list(Token::RParen)?
                    } else {
                        Vec::new()
                    };
                    lhs = Expression::Call {
                        receiver: Some(Box::new(lhs)),
                        method,
                        args,
                    };
                    continue;
                }
                Token::Scope => {
                    self.next();
                    let name = self.expect_ident()?;
                    lhs = Expression::Scope {
                        base: Box::new(lhs),
                        name,
                    };
                    continue;
                }
                Token::LBracket => {
                    self.next();
                    let index = self.parse_list(Token::RBracket)?;
                    if index.is_empty() {
                        return Err(anyhow::anyhow!("Empty index expression"));
                    }
                    lhs = Expression::Index {
                        base: Box::new(lhs),
                        index,
                    };
                    continue;
                }
                Token::LParen => {
                    let Expression::Name(name) = &lhs else {
                        return Err(anyhow::anyhow!("Unexpected '(' after expression"));
                    };
                    let method = name.clone();
                    self.next();
                    let args = self.parse_list(Token::RParen)?;
                    lhs = Expression::Call {
                        receiver: None,
                        method,
                        args,
                    };
                    continue;
                }
                Token::Question => {
                    if TERNARY_BINDING_POWER < min_bp {
                        break;
                    }
                    self.next();
                    let then = self.parse_expr(0)?;
                    self.expect(Token::Colon)?;
                    let otherwise = self.parse_expr(TERNARY_BINDING_POWER)?;
                    lhs = Expression::Ternary {
                        cond: Box::new(lhs),
                        then: Box::new(then),
                        otherwise: Box::new(otherwise),
                    };
                    continue;
                }
                _ => {}
            }

            let Some((op, l_bp, r_bp)) = infix_binding_power(&token) else {
                break;
            };
            if l_bp < min_bp {
                break;
            }
            self.next();
            let rhs = self.parse_expr(r_bp)?;
            lhs = Expression::Binary {
                op: op.to_string(),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }

        Ok(lhs)
    }

    fn parse_prefix(&mut self) -> Result<Expression> {
        let token = self
            .next()
            .ok_or_else(|| anyhow::anyhow!("Unexpected end of expression"))?;

        let expr = match token {
            Token::Int(text) => Expression::Literal(Literal::Int(text)),
            Token::Float(text) => Expression::Literal(Literal::Float(text)),
            Token::Str(s) => Expression::Literal(Literal::Str(s)),
            Token::Symbol(s) => Expression::Literal(Literal::Symbol(s)),
            Token::Sigil(name) => Expression::Name(name),
            Token::Ident(word) => match word.as_str() {
                "nil" => Expression::Literal(Literal::Nil),
                "true" => Expression::Literal(Literal::Bool(true)),
                "false" => Expression::Literal(Literal::Bool(false)),
                "not" => Expression::Unary {
                    op: "not".to_string(),
                    operand: Box::new(self.parse_expr(NOT_BINDING_POWER)?),
                },
                "and" | "or" => {
                    return Err(anyhow::anyhow!("Unexpected keyword '{}'", word));
                }
                _ => Expression::Name(word),
            },
            Token::Op(op @ "-") => Expression::Unary {
                op: op.to_string(),
                operand: Box::new(self.parse_expr(NEGATE_BINDING_POWER)?),
            },
            Token::Op(op @ ("!" | "~" | "+")) => Expression::Unary {
                op: op.to_string(),
                operand: Box::new(self.parse_expr(BANG_BINDING_POWER)?),
            },
            Token::Scope => {
                let name = self.expect_ident()?;
                Expression::Name(format!("::{}", name))
            }
            Token::LParen => {
                let inner = self.parse_expr(0)?;
                self.expect(Token::RParen)?;
                inner
            }
            Token::LBracket => Expression::Array(self.parse_list(Token::RBracket)?),
            other => return Err(anyhow::anyhow!("Unexpected {:?}", other)),
        };

        Ok(expr)
    }

    /// 区切り記号までのカンマ区切りの式リストをパースする（開き記号は消費済み）
    fn parse_list(&mut self, close: Token) -> Result<Vec<Expression>> {
        let mut items = Vec::new();
        if self.peek() == Some(&close) {
            self.next();
            return Ok(items);
        }

        loop {
            items.push(self.parse_expr(0)?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(tok) if tok == close => break,
                Some(tok) => return Err(anyhow::anyhow!("Expected ',' or {:?}, found {:?}", close, tok)),
                None => return Err(anyhow::anyhow!("Expected {:?}, found end of input", close)),
            }
        }

        Ok(items)
    }
}
