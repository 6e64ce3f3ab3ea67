use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::{FailureType, ToolExecutionError};
use crate::policy;

use super::{get_str, ToolExecutionContext, ToolHandler, ToolResult};

pub struct CalcHandler;

#[async_trait]
impl ToolHandler for CalcHandler {
    fn validate_args(&self, raw_args: &HashMap<String, Value>) -> Result<HashMap<String, Value>, ToolExecutionError> {
        let expression = get_str(raw_args, "expression")
            .ok_or_else(|| ToolExecutionError::new(FailureType::SchemaError, "calc requires a string 'expression'"))?;
        let mut validated = HashMap::new();
        validated.insert("expression".to_string(), json!(expression));
        Ok(validated)
    }

    async fn invoke(
        &self,
        validated_args: &HashMap<String, Value>,
        _ctx: &mut ToolExecutionContext<'_>,
    ) -> Result<ToolResult, ToolExecutionError> {
        let expression = get_str(validated_args, "expression").unwrap();
        policy::check_calc_expression(&expression)?;

        let result = evaluate(&expression)
            .map_err(|e| ToolExecutionError::new(FailureType::ToolError, e).with_diagnostics(&[("expression", json!(expression))]))?;

        Ok(ToolResult { ok: true, message: "calc completed".to_string(), data: json!({ "result": result }) })
    }
}

/// Recursive-descent evaluator over numeric literals, unary `+`/`-`, and
/// binary `+ - * / // % **`, matching Python's operator precedence
/// (`**` binds tighter than unary minus on its left operand, right-assoc).
fn evaluate(expression: &str) -> Result<f64, String> {
    let tokens = tokenize(expression)?;
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.parse_expr()?;
    if parser.pos != parser.tokens.len() {
        return Err("unexpected trailing tokens".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    StarStar,
    Slash,
    SlashSlash,
    Percent,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<Token>, String> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        match c {
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::StarStar);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                if chars.get(i + 1) == Some(&'/') {
                    tokens.push(Token::SlashSlash);
                    i += 2;
                } else {
                    tokens.push(Token::Slash);
                    i += 1;
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal.parse::<f64>().map_err(|_| format!("invalid numeric literal: {literal}"))?;
                tokens.push(Token::Number(value));
            }
            other => return Err(format!("unexpected character: {other}")),
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        tok
    }

    // expr := term (('+' | '-') term)*
    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut value = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.advance();
                    value += self.parse_term()?;
                }
                Some(Token::Minus) => {
                    self.advance();
                    value -= self.parse_term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // term := factor (('*' | '/' | '//' | '%') factor)*
    fn parse_term(&mut self) -> Result<f64, String> {
        let mut value = self.parse_factor()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.advance();
                    value *= self.parse_factor()?;
                }
                Some(Token::Slash) => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    if rhs == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= rhs;
                }
                Some(Token::SlashSlash) => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    if rhs == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value = (value / rhs).floor();
                }
                Some(Token::Percent) => {
                    self.advance();
                    let rhs = self.parse_factor()?;
                    if rhs == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value %= rhs;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    // power := atom ('**' factor)?   (right-associative; binds tighter than unary minus)
    fn parse_power(&mut self) -> Result<f64, String> {
        let base = self.parse_atom()?;
        if let Some(Token::StarStar) = self.peek() {
            self.advance();
            let exponent = self.parse_factor()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    // factor := ('+' | '-') factor | power
    fn parse_factor(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some(Token::Plus) => {
                self.advance();
                self.parse_factor()
            }
            Some(Token::Minus) => {
                self.advance();
                Ok(-self.parse_factor()?)
            }
            _ => self.parse_power(),
        }
    }

    fn parse_atom(&mut self) -> Result<f64, String> {
        match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.parse_expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err("expected closing parenthesis".to_string()),
                }
            }
            other => Err(format!("unexpected token: {other:?}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_basic_arithmetic() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn power_is_right_associative() {
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
    }

    #[test]
    fn floor_div_and_mod() {
        assert_eq!(evaluate("7 // 2").unwrap(), 3.0);
        assert_eq!(evaluate("7 % 2").unwrap(), 1.0);
    }

    #[test]
    fn rejects_division_by_zero() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn unary_minus_binds_before_power_argument() {
        assert_eq!(evaluate("-2 ** 2").unwrap(), -4.0);
    }
}
