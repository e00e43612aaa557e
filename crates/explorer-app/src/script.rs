//! Script engines for callback literals
//!
//! A callback literal is function source text embedded in form input. The
//! serializer never interprets that text itself; it hands it to a
//! [`ScriptEngine`], which decides whether the text becomes an invocable
//! [`Callback`] or stays data.
//!
//! Two engines ship:
//! - [`SourceOnlyEngine`] keeps the text and never compiles it.
//! - [`ExprEngine`] compiles small function bodies: `return <expr>`
//!   statements and `console.log(...)` calls. Parameter references and
//!   member access are resolved natively (so objects pass through
//!   untouched); everything else is evaluated with `evalexpr`.

use std::sync::Arc;

use evalexpr::{ContextWithMutableVariables, HashMapContext};
use explorer_core::{Callback, CallbackError, CompiledFunction, LiveValue};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while compiling a callback literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("not a function literal: {0}")]
    NotAFunction(String),

    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("unsupported statement `{0}`")]
    Unsupported(String),
}

/// Compiles function source text (`function(x){ ... }`) into a callback
pub trait ScriptEngine: Send + Sync {
    /// Short name for logs and the status bar
    fn name(&self) -> &'static str;

    fn compile(&self, source: &str) -> Result<Callback, ScriptError>;
}

/// Keeps callback literals as text; invoking them reports `NotCompiled`
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceOnlyEngine;

impl ScriptEngine for SourceOnlyEngine {
    fn name(&self) -> &'static str {
        "source-only"
    }

    fn compile(&self, source: &str) -> Result<Callback, ScriptError> {
        parse_function(source)?;
        Ok(Callback::source_only(source))
    }
}

/// Receives `console.log` output of compiled callbacks
pub type ConsoleSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Engine for single-expression callback bodies
#[derive(Clone, Default)]
pub struct ExprEngine {
    console: Option<ConsoleSink>,
}

impl ExprEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `console.log` lines somewhere besides the log file
    pub fn with_console(mut self, console: ConsoleSink) -> Self {
        self.console = Some(console);
        self
    }
}

impl std::fmt::Debug for ExprEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExprEngine")
            .field("console", &self.console.is_some())
            .finish()
    }
}

impl ScriptEngine for ExprEngine {
    fn name(&self) -> &'static str {
        "expr"
    }

    fn compile(&self, source: &str) -> Result<Callback, ScriptError> {
        let function = parse_function(source)?;
        let statements = split_statements(&function.body)?
            .into_iter()
            .map(|s| Statement::parse(&s))
            .collect::<Result<Vec<_>, _>>()?;
        let program = Program {
            params: function.params,
            statements,
            console: self.console.clone(),
        };
        Ok(Callback::compiled(source, Arc::new(program)))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
struct FunctionLiteral {
    params: Vec<String>,
    body: String,
}

pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn parse_function(source: &str) -> Result<FunctionLiteral, ScriptError> {
    let text = source.trim();
    let rest = text
        .strip_prefix("function")
        .ok_or_else(|| ScriptError::NotAFunction(text.to_string()))?;

    let open = rest
        .find('(')
        .ok_or_else(|| ScriptError::Syntax("missing parameter list".to_string()))?;
    let name = rest[..open].trim();
    if !name.is_empty() && !is_identifier(name) {
        return Err(ScriptError::NotAFunction(text.to_string()));
    }
    let close = rest[open..]
        .find(')')
        .map(|i| i + open)
        .ok_or_else(|| ScriptError::Syntax("unterminated parameter list".to_string()))?;

    let mut params = Vec::new();
    for param in rest[open + 1..close].split(',').map(str::trim) {
        if param.is_empty() {
            continue;
        }
        if !is_identifier(param) {
            return Err(ScriptError::Syntax(format!("invalid parameter `{param}`")));
        }
        params.push(param.to_string());
    }

    let after = &rest[close + 1..];
    let body_start = after
        .find(|c: char| !c.is_whitespace())
        .filter(|&i| after[i..].starts_with('{'))
        .ok_or_else(|| ScriptError::Syntax("missing function body".to_string()))?;
    let body_end = matching_brace(after, body_start)
        .ok_or_else(|| ScriptError::Syntax("unbalanced braces in function body".to_string()))?;
    if !after[body_end + 1..].trim().is_empty() {
        return Err(ScriptError::Syntax(
            "unexpected text after function body".to_string(),
        ));
    }

    Ok(FunctionLiteral {
        params,
        body: after[body_start + 1..body_end].to_string(),
    })
}

/// Index of the `}` closing the `{` at `open`, skipping string literals
pub(crate) fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => quote = Some(c),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on `separator` at nesting depth zero, outside string literals
fn split_top_level(text: &str, separators: &[char]) -> Result<Vec<String>, ScriptError> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ScriptError::Syntax(format!("unbalanced `{c}`")));
                }
                current.push(c);
            }
            c if depth == 0 && separators.contains(&c) => {
                parts.push(std::mem::take(&mut current));
            }
            c => current.push(c),
        }
    }
    if quote.is_some() {
        return Err(ScriptError::Syntax("unterminated string literal".to_string()));
    }
    if depth != 0 {
        return Err(ScriptError::Syntax("unbalanced brackets".to_string()));
    }
    parts.push(current);
    Ok(parts)
}

/// Drop `//` comments outside string literals, keeping the line breaks
fn strip_line_comments(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' | '`' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if chars.peek() == Some(&'/') => {
                while chars.peek().is_some_and(|&next| next != '\n') {
                    chars.next();
                }
            }
            c => out.push(c),
        }
    }
    out
}

/// Characters that carry an expression over a line break
const CONTINUATION: &[char] = &[
    '+', '-', '*', '/', '%', '&', '|', '<', '>', '=', '!', '?', ':', ',', '.',
];

/// Statements of a function body
///
/// `;` always ends a statement. A line break ends one only when the text so
/// far is a complete statement and no operator on either side of the break
/// continues it.
fn split_statements(body: &str) -> Result<Vec<String>, ScriptError> {
    let body = strip_line_comments(body);
    let mut statements = Vec::new();

    for chunk in split_top_level(&body, &[';'])? {
        let mut current = String::new();
        for line in split_top_level(&chunk, &['\n'])? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !current.is_empty() {
                let complete = Statement::parse(&current).is_ok()
                    && !current.ends_with(CONTINUATION)
                    && !line.starts_with(CONTINUATION);
                if complete {
                    statements.push(std::mem::take(&mut current));
                } else {
                    current.push(' ');
                }
            }
            current.push_str(line);
        }
        if !current.is_empty() {
            statements.push(current);
        }
    }
    Ok(statements)
}

#[derive(Debug, Clone, PartialEq)]
enum Statement {
    Return(Option<String>),
    Log(Vec<String>),
}

impl Statement {
    fn parse(text: &str) -> Result<Self, ScriptError> {
        if text == "return" {
            return Ok(Self::Return(None));
        }
        if let Some(rest) = text.strip_prefix("return") {
            if rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
                return Ok(Self::Return(Some(rest.trim().to_string())));
            }
        }
        if let Some(inner) = text
            .strip_prefix("console.log(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let args = split_top_level(inner, &[','])?
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            return Ok(Self::Log(args));
        }
        Err(ScriptError::Unsupported(text.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Evaluation
// ─────────────────────────────────────────────────────────────────────────────

struct Program {
    params: Vec<String>,
    statements: Vec<Statement>,
    console: Option<ConsoleSink>,
}

struct Scope<'a> {
    bindings: Vec<(&'a str, &'a LiveValue)>,
}

impl<'a> Scope<'a> {
    fn lookup(&self, name: &str) -> Option<&'a LiveValue> {
        self.bindings
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// `param` or `param.member.member`; `None` if the root is not bound
    fn resolve_path(&self, expr: &str) -> Option<LiveValue> {
        let mut segments = expr.split('.');
        let root = segments.next()?;
        if !is_identifier(root) {
            return None;
        }
        let mut current = self.lookup(root)?.clone();
        for segment in segments {
            if !is_identifier(segment) {
                return None;
            }
            current = current.get(segment).cloned().unwrap_or(LiveValue::Null);
        }
        Some(current)
    }
}

impl Program {
    fn evaluate(&self, expr: &str, scope: &Scope<'_>) -> Result<LiveValue, CallbackError> {
        let expr = expr.trim();
        if expr.is_empty() || expr == "undefined" || expr == "null" {
            return Ok(LiveValue::Null);
        }
        if let Some(value) = scope.resolve_path(expr) {
            return Ok(value);
        }
        if let Ok(value) = serde_json::from_str::<Value>(expr) {
            return Ok(LiveValue::from(value));
        }
        evaluate_with_evalexpr(expr, scope)
    }

    fn log(&self, args: &[String], scope: &Scope<'_>) -> Result<(), CallbackError> {
        let mut parts = Vec::with_capacity(args.len());
        for arg in args {
            parts.push(self.evaluate(arg, scope)?.to_string());
        }
        let line = parts.join(" ");
        tracing::info!(target: "callback", "{}", line);
        if let Some(console) = &self.console {
            console(&line);
        }
        Ok(())
    }
}

impl CompiledFunction for Program {
    fn call(&self, args: &[LiveValue]) -> Result<LiveValue, CallbackError> {
        static UNDEFINED: LiveValue = LiveValue::Null;
        let scope = Scope {
            bindings: self
                .params
                .iter()
                .enumerate()
                .map(|(i, name)| (name.as_str(), args.get(i).unwrap_or(&UNDEFINED)))
                .collect(),
        };

        for statement in &self.statements {
            match statement {
                Statement::Return(None) => return Ok(LiveValue::Null),
                Statement::Return(Some(expr)) => return self.evaluate(expr, &scope),
                Statement::Log(args) => self.log(args, &scope)?,
            }
        }
        Ok(LiveValue::Null)
    }
}

fn evaluate_with_evalexpr(expr: &str, scope: &Scope<'_>) -> Result<LiveValue, CallbackError> {
    let mut context: HashMapContext = HashMapContext::new();
    for (name, value) in &scope.bindings {
        let bound: Option<evalexpr::Value> = match value {
            LiveValue::Bool(b) => Some(evalexpr::Value::Boolean(*b)),
            LiveValue::String(s) => Some(evalexpr::Value::String(s.clone())),
            LiveValue::Number(n) => match n.as_i64() {
                Some(i) => Some(evalexpr::Value::Int(i)),
                None => n.as_f64().map(evalexpr::Value::Float),
            },
            _ => None,
        };
        if let Some(bound) = bound {
            context
                .set_value((*name).to_string(), bound)
                .map_err(|e| CallbackError::runtime(e.to_string()))?;
        }
    }

    let translated = expr
        .replace("===", "==")
        .replace("!==", "!=")
        .replace('\'', "\"");
    let value = evalexpr::eval_with_context(&translated, &context)
        .map_err(|e| CallbackError::runtime(format!("`{expr}`: {e}")))?;
    Ok(from_evalexpr(value))
}

fn from_evalexpr(value: evalexpr::Value) -> LiveValue {
    match value {
        evalexpr::Value::String(s) => LiveValue::String(s),
        evalexpr::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(LiveValue::Number)
            .unwrap_or(LiveValue::Null),
        evalexpr::Value::Int(i) => LiveValue::Number(i.into()),
        evalexpr::Value::Boolean(b) => LiveValue::Bool(b),
        evalexpr::Value::Tuple(items) => {
            LiveValue::Array(items.into_iter().map(from_evalexpr).collect())
        }
        evalexpr::Value::Empty => LiveValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[test]
    fn test_identity_callback_returns_argument_unchanged() {
        let cb = ExprEngine::new().compile("function(x){return x}").unwrap();
        let arg = LiveValue::from(json!({"id": "m1", "tags": [1, 2]}));
        assert_eq!(cb.call(&[arg.clone()]).unwrap(), arg);
        assert_eq!(cb.source(), "function(x){return x}");
    }

    #[test]
    fn test_member_access_and_arithmetic() {
        let engine = ExprEngine::new();
        let member = engine
            .compile("function (msg) { return msg.sender.name; }")
            .unwrap();
        let msg = LiveValue::from(json!({"sender": {"name": "ana"}}));
        assert_eq!(member.call(&[msg]).unwrap(), LiveValue::from("ana"));

        let sum = engine.compile("function add(a, b) { return a + b }").unwrap();
        assert_eq!(
            sum.call(&[LiveValue::from(2_i64), LiveValue::from(40_i64)])
                .unwrap(),
            LiveValue::from(42_i64)
        );

        let cmp = engine.compile("function(code){ return code === 0 }").unwrap();
        assert_eq!(cmp.call(&[LiveValue::from(0_i64)]).unwrap(), LiveValue::Bool(true));
    }

    #[test]
    fn test_missing_arguments_are_undefined() {
        let cb = ExprEngine::new().compile("function(a, b){ return b }").unwrap();
        assert_eq!(cb.call(&[LiveValue::from(1_i64)]).unwrap(), LiveValue::Null);
    }

    #[test]
    fn test_console_log_reaches_sink() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let engine = ExprEngine::new().with_console(Arc::new(move |line: &str| {
            captured.lock().unwrap().push(line.to_string());
        }));
        let cb = engine
            .compile("function(event) {\n  console.log('received', event.type);\n}")
            .unwrap();
        let result = cb
            .call(&[LiveValue::from(json!({"type": "message"}))])
            .unwrap();

        assert_eq!(result, LiveValue::Null);
        assert_eq!(*lines.lock().unwrap(), vec!["received message".to_string()]);
    }

    #[test]
    fn test_compile_rejects_non_functions_and_bad_bodies() {
        let engine = ExprEngine::new();
        assert!(matches!(
            engine.compile("alert(1)"),
            Err(ScriptError::NotAFunction(_))
        ));
        assert!(matches!(
            engine.compile("function(x){ return x"),
            Err(ScriptError::Syntax(_))
        ));
        assert!(matches!(
            engine.compile("function(x){ while(true){} }"),
            Err(ScriptError::Unsupported(_))
        ));
        assert!(matches!(
            engine.compile("function(x){ return x } trailing"),
            Err(ScriptError::Syntax(_))
        ));
    }

    #[test]
    fn test_braces_inside_strings_do_not_close_body() {
        let cb = ExprEngine::new()
            .compile(r#"function(){ return "}{" }"#)
            .unwrap();
        assert_eq!(cb.call(&[]).unwrap(), LiveValue::from("}{"));
    }

    #[test]
    fn test_expression_continues_across_line_break() {
        let cb = ExprEngine::new()
            .compile("function(a, b) {\n  return a +\n    b\n}")
            .unwrap();
        assert_eq!(
            cb.call(&[LiveValue::from(2_i64), LiveValue::from(40_i64)])
                .unwrap(),
            LiveValue::from(42_i64)
        );
    }

    #[test]
    fn test_line_comments_are_ignored() {
        let cb = ExprEngine::new()
            .compile("function(x) {\n  // echo the argument\n  return x // unchanged\n}")
            .unwrap();
        assert_eq!(cb.call(&[LiveValue::from("m1")]).unwrap(), LiveValue::from("m1"));

        let url = ExprEngine::new()
            .compile(r#"function() { return "https://example.com" }"#)
            .unwrap();
        assert_eq!(url.call(&[]).unwrap(), LiveValue::from("https://example.com"));
    }

    #[test]
    fn test_line_break_ends_complete_statement() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let engine = ExprEngine::new().with_console(Arc::new(move |line: &str| {
            captured.lock().unwrap().push(line.to_string());
        }));
        let cb = engine
            .compile("function(event) {\n  console.log(event.type)\n  return event.id\n}")
            .unwrap();

        let result = cb
            .call(&[LiveValue::from(json!({"type": "message", "id": "m7"}))])
            .unwrap();
        assert_eq!(result, LiveValue::from("m7"));
        assert_eq!(*lines.lock().unwrap(), vec!["message".to_string()]);
    }

    #[test]
    fn test_source_only_engine_keeps_text() {
        let cb = SourceOnlyEngine.compile("function(x){return x}").unwrap();
        assert!(!cb.is_compiled());
        assert!(matches!(
            cb.call(&[]),
            Err(CallbackError::NotCompiled { .. })
        ));
        assert!(SourceOnlyEngine.compile("42").is_err());
    }
}
