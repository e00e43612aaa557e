//! Emitted call expressions: assembly and replay
//!
//! [`assemble`] writes `<namespace>.<method>(<arg>, <arg>)` from Output-mode
//! literals. [`parse_call_expression`] reads such text back, accepting the
//! JSON literals, `<accessor>.<identifier>` references and function literals
//! the serializer emits, and [`CallExpression::evaluate`] turns the parsed
//! arguments into live values.

use explorer_core::{FormKey, LiveValue};
use serde_json::Value;
use thiserror::Error;

use super::{Literal, SerializeContext, SerializeError};
use crate::script::matching_brace;

/// Separator between emitted arguments unless configured otherwise
pub const DEFAULT_SEPARATOR: &str = ", ";

/// Join Output-mode literals into a call expression
pub fn assemble(key: &FormKey, args: &[Literal], separator: &str) -> String {
    let rendered: Vec<String> = args.iter().map(Literal::render).collect();
    format!("{}.{}({})", key.namespace, key.method, rendered.join(separator))
}

/// Parse failure with the byte offset it was detected at
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct ExpressionError {
    pub position: usize,
    pub message: String,
}

impl ExpressionError {
    fn new(position: usize, message: impl Into<String>) -> Self {
        Self {
            position,
            message: message.into(),
        }
    }
}

/// One parsed argument
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Json(Value),
    /// `<accessor>.<identifier>`
    GlobalRef(String),
    /// Function source text, `function(...) { ... }`
    Function(String),
    Array(Vec<ExprNode>),
    Object(Vec<(String, ExprNode)>),
}

impl ExprNode {
    fn evaluate(&self, param: &str, ctx: &SerializeContext<'_>) -> Result<LiveValue, SerializeError> {
        match self {
            Self::Json(value) => Ok(LiveValue::from(value.clone())),
            Self::GlobalRef(identifier) => ctx.resolve(identifier),
            Self::Function(source) => ctx.compile(param, source),
            Self::Array(items) => items
                .iter()
                .map(|item| item.evaluate(param, ctx))
                .collect::<Result<_, _>>()
                .map(LiveValue::Array),
            Self::Object(members) => members
                .iter()
                .map(|(k, v)| v.evaluate(param, ctx).map(|v| (k.clone(), v)))
                .collect::<Result<_, _>>()
                .map(LiveValue::Object),
        }
    }
}

/// A parsed `<namespace>.<method>(...)` expression
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    pub key: FormKey,
    pub args: Vec<ExprNode>,
}

impl CallExpression {
    /// Live arguments, in order
    ///
    /// Failures name the argument as `#<index>` (zero based).
    pub fn evaluate(&self, ctx: &SerializeContext<'_>) -> Result<Vec<LiveValue>, SerializeError> {
        self.args
            .iter()
            .enumerate()
            .map(|(i, arg)| arg.evaluate(&format!("#{i}"), ctx))
            .collect()
    }
}

/// Parse an emitted call expression
///
/// `global_accessor` is the object name references were emitted through;
/// any other bare identifier path is rejected.
pub fn parse_call_expression(
    text: &str,
    global_accessor: &str,
) -> Result<CallExpression, ExpressionError> {
    let mut parser = Parser {
        text,
        pos: 0,
        accessor: global_accessor,
    };
    let expr = parser.call()?;
    parser.skip_ws();
    if parser.pos < text.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(expr)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    accessor: &'a str,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error(&self, message: impl Into<String>) -> ExpressionError {
        ExpressionError::new(self.pos, message)
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.text.len() - trimmed.len();
    }

    fn expect(&mut self, c: char) -> Result<(), ExpressionError> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(format!("expected '{c}'")))
        }
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn identifier(&mut self) -> Result<&'a str, ExpressionError> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(i, c)| {
                let ok = c.is_ascii_alphabetic()
                    || c == '_'
                    || c == '$'
                    || (i > 0 && c.is_ascii_digit());
                !ok
            })
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn call(&mut self) -> Result<CallExpression, ExpressionError> {
        let namespace = self.identifier()?.to_string();
        let mut method_parts = Vec::new();
        while self.eat('.') {
            method_parts.push(self.identifier()?);
        }
        if method_parts.is_empty() {
            return Err(self.error("expected '<namespace>.<method>'"));
        }
        let key = FormKey::new(namespace, method_parts.join("."));

        self.expect('(')?;
        let mut args = Vec::new();
        if !self.eat(')') {
            loop {
                args.push(self.value()?);
                if self.eat(')') {
                    break;
                }
                self.expect(',')?;
            }
        }
        Ok(CallExpression { key, args })
    }

    fn value(&mut self) -> Result<ExprNode, ExpressionError> {
        self.skip_ws();
        match self.peek() {
            Some('"') => self.string().map(|s| ExprNode::Json(Value::String(s))),
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) => self.word(),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn string(&mut self) -> Result<String, ExpressionError> {
        let start = self.pos;
        let mut escaped = false;
        for (i, c) in self.rest().char_indices().skip(1) {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                let end = self.pos + i + 1;
                let literal = &self.text[start..end];
                let parsed: String = serde_json::from_str(literal)
                    .map_err(|e| ExpressionError::new(start, e.to_string()))?;
                self.pos = end;
                return Ok(parsed);
            }
        }
        Err(ExpressionError::new(start, "unterminated string"))
    }

    fn number(&mut self) -> Result<ExprNode, ExpressionError> {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(self.rest().len());
        let literal = &self.text[start..start + len];
        let value: Value = serde_json::from_str(literal)
            .map_err(|_| ExpressionError::new(start, format!("invalid number '{literal}'")))?;
        self.pos += len;
        Ok(ExprNode::Json(value))
    }

    fn array(&mut self) -> Result<ExprNode, ExpressionError> {
        self.expect('[')?;
        let mut items = Vec::new();
        if !self.eat(']') {
            loop {
                items.push(self.value()?);
                if self.eat(']') {
                    break;
                }
                self.expect(',')?;
            }
        }
        Ok(collapse_array(items))
    }

    fn object(&mut self) -> Result<ExprNode, ExpressionError> {
        self.expect('{')?;
        let mut members = Vec::new();
        if !self.eat('}') {
            loop {
                self.skip_ws();
                let key = if self.peek() == Some('"') {
                    self.string()?
                } else {
                    self.identifier()?.to_string()
                };
                self.expect(':')?;
                members.push((key, self.value()?));
                if self.eat('}') {
                    break;
                }
                self.expect(',')?;
            }
        }
        Ok(collapse_object(members))
    }

    fn word(&mut self) -> Result<ExprNode, ExpressionError> {
        let start = self.pos;
        let word = self.identifier()?;
        match word {
            "true" => Ok(ExprNode::Json(Value::Bool(true))),
            "false" => Ok(ExprNode::Json(Value::Bool(false))),
            "null" | "undefined" => Ok(ExprNode::Json(Value::Null)),
            "function" => self.function(start),
            w if w == self.accessor => {
                self.expect('.')?;
                let identifier = self.identifier()?;
                Ok(ExprNode::GlobalRef(identifier.to_string()))
            }
            other => Err(ExpressionError::new(
                start,
                format!("unknown identifier '{other}'"),
            )),
        }
    }

    fn function(&mut self, start: usize) -> Result<ExprNode, ExpressionError> {
        let open = self.rest().find('{').map(|i| self.pos + i).ok_or_else(|| {
            ExpressionError::new(start, "function literal without a body")
        })?;
        let close = matching_brace(self.text, open)
            .ok_or_else(|| ExpressionError::new(open, "unbalanced braces in function body"))?;
        self.pos = close + 1;
        Ok(ExprNode::Function(self.text[start..=close].to_string()))
    }
}

/// Plain-data arrays collapse back to a single JSON node
fn collapse_array(items: Vec<ExprNode>) -> ExprNode {
    if items.iter().all(|i| matches!(i, ExprNode::Json(_))) {
        ExprNode::Json(Value::Array(
            items
                .into_iter()
                .filter_map(|i| match i {
                    ExprNode::Json(v) => Some(v),
                    _ => None,
                })
                .collect(),
        ))
    } else {
        ExprNode::Array(items)
    }
}

fn collapse_object(members: Vec<(String, ExprNode)>) -> ExprNode {
    if members.iter().all(|(_, v)| matches!(v, ExprNode::Json(_))) {
        ExprNode::Json(Value::Object(
            members
                .into_iter()
                .filter_map(|(k, v)| match v {
                    ExprNode::Json(v) => Some((k, v)),
                    _ => None,
                })
                .collect(),
        ))
    } else {
        ExprNode::Object(members)
    }
}
