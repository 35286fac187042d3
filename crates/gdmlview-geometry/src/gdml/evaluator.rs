//! Arithmetic expressions in GDML attribute values.
//!
//! Values such as `"2*cm"`, `"halfLength + 0.5*mm"` or `"360*deg"` are
//! evaluated against the constants defined so far and the built-in unit
//! table. Units follow the convention millimetre = radian = gram = 1.

use std::collections::HashMap;
use std::f64::consts::PI;

use crate::error::{GeometryError, Result};

/// Density unit used for reporting material densities.
pub const G_PER_CM3: f64 = 1.0e-3;

fn builtin(name: &str) -> Option<f64> {
    let value = match name {
        "mm" | "millimeter" => 1.0,
        "cm" | "centimeter" => 10.0,
        "m" | "meter" => 1.0e3,
        "km" | "kilometer" => 1.0e6,
        "um" | "micrometer" => 1.0e-3,
        "nm" | "nanometer" => 1.0e-6,
        "rad" | "radian" => 1.0,
        "mrad" | "milliradian" => 1.0e-3,
        "deg" | "degree" => PI / 180.0,
        "pi" => PI,
        "twopi" => 2.0 * PI,
        "g" | "gram" => 1.0,
        "mg" | "milligram" => 1.0e-3,
        "kg" | "kilogram" => 1.0e3,
        "mm3" => 1.0,
        "cm3" => 1.0e3,
        "m3" => 1.0e9,
        _ => return None,
    };
    Some(value)
}

fn function(name: &str) -> Option<fn(f64) -> f64> {
    let f: fn(f64) -> f64 = match name {
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "sqrt" => f64::sqrt,
        "abs" => f64::abs,
        "exp" => f64::exp,
        "log" => f64::ln,
        _ => return None,
    };
    Some(f)
}

/// Named constants and an expression evaluator over them.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    constants: HashMap<String, f64>,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines a named constant.
    ///
    /// GDML forbids redefinition, so a second definition of `name` fails.
    pub fn define(&mut self, name: &str, value: f64) -> Result<()> {
        if self.constants.contains_key(name) {
            return Err(GeometryError::DuplicateName {
                kind: "constant",
                name: name.to_string(),
            });
        }
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.constants.get(name).copied()
    }

    /// Evaluates an expression.
    pub fn evaluate(&self, expression: &str) -> Result<f64> {
        let mut parser = Parser {
            evaluator: self,
            chars: expression.chars().collect(),
            pos: 0,
            depth: 0,
        };
        let fail = |reason: String| GeometryError::Expression {
            expression: expression.to_string(),
            reason,
        };

        let value = parser.expr().map_err(fail)?;
        parser.skip_whitespace();
        if parser.pos != parser.chars.len() {
            return Err(fail(format!("unexpected '{}'", parser.chars[parser.pos])));
        }
        if !value.is_finite() {
            return Err(fail("result is not finite".to_string()));
        }
        Ok(value)
    }

    fn resolve(&self, name: &str) -> Option<f64> {
        self.get(name).or_else(|| builtin(name))
    }
}

type ParseResult = std::result::Result<f64, String>;

/// Bound on operand nesting (parentheses, signs, exponents, calls).
const MAX_NESTING: usize = 256;

struct Parser<'a> {
    evaluator: &'a Evaluator,
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn skip_whitespace(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expr(&mut self) -> ParseResult {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    fn term(&mut self) -> ParseResult {
        let mut value = self.unary()?;
        loop {
            if self.eat('*') {
                value *= self.unary()?;
            } else if self.eat('/') {
                let divisor = self.unary()?;
                if divisor == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= divisor;
            } else {
                return Ok(value);
            }
        }
    }

    // Every recursive path passes through here, so this bounds the stack.
    fn unary(&mut self) -> ParseResult {
        if self.depth >= MAX_NESTING {
            return Err("expression nested too deeply".to_string());
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> ParseResult {
        if self.eat('-') {
            Ok(-self.unary()?)
        } else if self.eat('+') {
            self.unary()
        } else {
            self.power()
        }
    }

    fn power(&mut self) -> ParseResult {
        let base = self.primary()?;
        if self.eat('^') {
            Ok(base.powf(self.unary()?))
        } else {
            Ok(base)
        }
    }

    fn primary(&mut self) -> ParseResult {
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.eat(')') {
                    Ok(value)
                } else {
                    Err("missing ')'".to_string())
                }
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.identifier(),
            Some(c) => Err(format!("unexpected '{c}'")),
            None => Err("unexpected end of expression".to_string()),
        }
    }

    fn number(&mut self) -> ParseResult {
        let start = self.pos;
        let digits = |p: &mut Self| {
            while p.chars.get(p.pos).is_some_and(char::is_ascii_digit) {
                p.pos += 1;
            }
        };
        digits(self);
        if self.chars.get(self.pos) == Some(&'.') {
            self.pos += 1;
            digits(self);
        }
        if matches!(self.chars.get(self.pos), Some('e' | 'E')) {
            let mark = self.pos;
            self.pos += 1;
            if matches!(self.chars.get(self.pos), Some('+' | '-')) {
                self.pos += 1;
            }
            if self.chars.get(self.pos).is_some_and(char::is_ascii_digit) {
                digits(self);
            } else {
                // Not an exponent; leave `e` for the identifier rule.
                self.pos = mark;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map_err(|_| format!("bad number '{text}'"))
    }

    fn identifier(&mut self) -> ParseResult {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect();

        if self.peek() == Some('(') {
            let f = function(&name).ok_or_else(|| format!("unknown function '{name}'"))?;
            self.pos += 1;
            let argument = self.expr()?;
            if !self.eat(')') {
                return Err("missing ')'".to_string());
            }
            return Ok(f(argument));
        }

        self.evaluator
            .resolve(&name)
            .ok_or_else(|| format!("unknown identifier '{name}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expression: &str) -> f64 {
        Evaluator::new().evaluate(expression).unwrap()
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval("1 + 2 * 3"), 7.0);
        assert_eq!(eval("(1 + 2) * 3"), 9.0);
        assert_eq!(eval("-2^2"), -4.0);
        assert_eq!(eval("2^3^2"), 512.0);
        assert_eq!(eval("10 / 4"), 2.5);
        assert_eq!(eval("1.5e3"), 1500.0);
        assert_eq!(eval(".5"), 0.5);
    }

    #[test]
    fn test_units() {
        assert_eq!(eval("2*cm"), 20.0);
        assert_eq!(eval("1*m + 5*mm"), 1005.0);
        assert!((eval("180*deg") - PI).abs() < 1e-12);
        assert!((eval("1.29*mg/cm3") / G_PER_CM3 - 1.29e-3).abs() < 1e-15);
    }

    #[test]
    fn test_functions() {
        assert!((eval("sin(pi/2)") - 1.0).abs() < 1e-12);
        assert_eq!(eval("sqrt(16)"), 4.0);
    }

    #[test]
    fn test_constants() {
        let mut evaluator = Evaluator::new();
        evaluator.define("half", 25.0).unwrap();
        assert_eq!(evaluator.evaluate("2*half*mm").unwrap(), 50.0);
        assert!(evaluator.define("half", 1.0).is_err());
        // User constants shadow unit names.
        evaluator.define("m", 2.0).unwrap();
        assert_eq!(evaluator.evaluate("m").unwrap(), 2.0);
    }

    #[test]
    fn test_errors() {
        let evaluator = Evaluator::new();
        for bad in ["", "1 +", "(1", "foo", "bar(1)", "1 / 0", "2 3", "1e"] {
            let err = evaluator.evaluate(bad);
            assert!(
                matches!(err, Err(GeometryError::Expression { .. })),
                "'{bad}' should fail"
            );
        }
    }

    #[test]
    fn test_nesting_limit() {
        let evaluator = Evaluator::new();
        let shallow = format!("{}1{}", "(".repeat(50), ")".repeat(50));
        assert_eq!(evaluator.evaluate(&shallow).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        let signs = format!("{}1", "-".repeat(200_000));
        let calls = format!("{}1{}", "abs(".repeat(1000), ")".repeat(1000));
        let powers = vec!["1"; 1000].join("^");
        for expression in [deep, signs, calls, powers] {
            match evaluator.evaluate(&expression) {
                Err(GeometryError::Expression { reason, .. }) => {
                    assert_eq!(reason, "expression nested too deeply");
                }
                other => panic!("expected nesting error, got {other:?}"),
            }
        }
    }
}
