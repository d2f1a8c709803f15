//! Arithmetic calculator tool

use crate::error::{Result, ToolError};
use crate::tools::{Tool, ToolCall, ToolResult};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Evaluates arithmetic expressions
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CalculatorTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression and return the numeric result. \
         Supports + - * / % ^, parentheses, unary minus and decimal numbers."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "expr": {
                    "type": "string",
                    "description": "The expression to evaluate, e.g. \"(2 + 3) * 4\""
                }
            },
            "required": ["expr"]
        })
    }

    async fn execute(&self, call: ToolCall) -> Result<ToolResult> {
        let expr: String = call.get_parameter("expr")?;

        let value = evaluate(&expr).map_err(|message| ToolError::ExecutionFailed {
            name: self.name().to_string(),
            message: format!("cannot evaluate '{}': {}", expr, message),
        })?;

        Ok(ToolResult::text(format_number(value)))
    }
}

/// Render whole numbers without a fractional part
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expr: &str) -> std::result::Result<f64, String> {
    let mut parser = Parser {
        chars: expr.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
        depth: 0,
    };

    if parser.chars.is_empty() {
        return Err("empty expression".to_string());
    }

    let value = parser.expression()?;
    if let Some(c) = parser.peek() {
        return Err(format!("unexpected character '{}'", c));
    }
    if !value.is_finite() {
        return Err("result is not a finite number".to_string());
    }
    Ok(value)
}

// expression := term (('+' | '-') term)*
// term       := power (('*' | '/' | '%') power)*
// power      := unary ('^' power)?
// unary      := '-' unary | primary
// primary    := number | '(' expression ')'
struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

/// Deepest nesting of parentheses, signs and exponents accepted
const MAX_DEPTH: usize = 256;

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_DEPTH`]
    fn nested<F>(&mut self, f: F) -> std::result::Result<f64, String>
    where
        F: FnOnce(&mut Self) -> std::result::Result<f64, String>,
    {
        if self.depth >= MAX_DEPTH {
            return Err("expression nested too deeply".to_string());
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn expression(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.bump();
            let rhs = self.term()?;
            if op == '+' {
                value += rhs;
            } else {
                value -= rhs;
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> std::result::Result<f64, String> {
        let mut value = self.power()?;
        while let Some(op @ ('*' | '/' | '%')) = self.peek() {
            self.bump();
            let rhs = self.power()?;
            if op != '*' && rhs == 0.0 {
                return Err("division by zero".to_string());
            }
            value = match op {
                '*' => value * rhs,
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    fn power(&mut self) -> std::result::Result<f64, String> {
        let base = self.unary()?;
        if self.peek() == Some('^') {
            self.bump();
            // right associative
            let exponent = self.nested(Self::power)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> std::result::Result<f64, String> {
        match self.peek() {
            Some('-') => {
                self.bump();
                Ok(-self.nested(Self::unary)?)
            }
            Some('+') => {
                self.bump();
                self.nested(Self::unary)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> std::result::Result<f64, String> {
        match self.peek() {
            Some('(') => {
                self.bump();
                let value = self.nested(Self::expression)?;
                match self.bump() {
                    Some(')') => Ok(value),
                    _ => Err("missing closing parenthesis".to_string()),
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) => Err(format!("unexpected character '{}'", c)),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn number(&mut self) -> std::result::Result<f64, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("invalid number '{}'", literal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(evaluate("2+2").unwrap(), 4.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(evaluate("2^3^2").unwrap(), 512.0);
        assert_eq!(evaluate("-3 + 10 % 4").unwrap(), -1.0);
        assert_eq!(evaluate("1.5 * 2").unwrap(), 3.0);
    }

    #[test]
    fn test_evaluate_errors() {
        assert!(evaluate("").is_err());
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("2 + x").is_err());
        assert!(evaluate("1..2").is_err());
        assert!(evaluate("3)").is_err());
    }

    #[test]
    fn test_evaluate_rejects_deep_nesting() {
        let deep = "(".repeat(100_000);
        assert_eq!(
            evaluate(&deep).unwrap_err(),
            "expression nested too deeply"
        );

        let parens = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(
            evaluate(&parens).unwrap_err(),
            "expression nested too deeply"
        );

        let signs = format!("{}1", "-".repeat(100_000));
        assert_eq!(
            evaluate(&signs).unwrap_err(),
            "expression nested too deeply"
        );

        let towers = format!("1{}", "^1".repeat(100_000));
        assert_eq!(
            evaluate(&towers).unwrap_err(),
            "expression nested too deeply"
        );

        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluate(&shallow).unwrap(), 1.0);
        assert_eq!(evaluate("--2").unwrap(), 2.0);
    }

    #[tokio::test]
    async fn test_execute() {
        let tool = CalculatorTool::new();
        let result = tool
            .execute(ToolCall::new("calculator", json!({"expr": "2+2"})))
            .await
            .unwrap();
        assert_eq!(result.content_text(), "4");

        let result = tool
            .execute(ToolCall::new("calculator", json!({"expr": "7 / 2"})))
            .await
            .unwrap();
        assert_eq!(result.content_text(), "3.5");

        assert!(tool
            .execute(ToolCall::new("calculator", json!({})))
            .await
            .is_err());
    }
}
