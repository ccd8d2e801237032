//! Python expression fragments as a typed tree, and the canonicalizing
//! renderer that turns one fragment into source text.
//!
//! Field declarations are composed, never string-concatenated: a fragment is
//! a call expression with a dotted callee chain and a keyword-argument list
//! whose values are themselves leaves or nested calls. The renderer is the
//! only place fragment text is produced, which is what keeps output
//! byte-identical across runs.
use std::fmt::Write;

/// One AST leaf or call node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PyExpr {
    /// Bare identifier (also `True`/`False`/`None`).
    Name(String),
    /// String literal; rendered in Python single-quote repr form.
    Str(String),
    /// Numeric literal, carried as already-formatted text.
    Number(String),
    Call(PyCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PyCall {
    /// Dereference chain, e.g. `["fields", "IntegerField"]`.
    pub callee: Vec<String>,
    /// Keyword arguments in declaration order; order is significant for
    /// output determinism.
    pub kwargs: Vec<(String, PyExpr)>,
}

impl PyExpr {
    pub fn name(v: impl Into<String>) -> Self {
        PyExpr::Name(v.into())
    }

    pub fn str(v: impl Into<String>) -> Self {
        PyExpr::Str(v.into())
    }

    pub fn true_() -> Self {
        PyExpr::name("True")
    }

    pub fn false_() -> Self {
        PyExpr::name("False")
    }

    pub fn call(
        callee: impl IntoIterator<Item = impl Into<String>>,
        kwargs: impl IntoIterator<Item = (impl Into<String>, PyExpr)>,
    ) -> Self {
        PyExpr::Call(PyCall {
            callee: callee.into_iter().map(Into::into).collect(),
            kwargs: kwargs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        })
    }
}

/// Canonical single-expression formatter.
#[derive(Debug, Default)]
pub struct PyRenderer;

impl PyRenderer {
    pub fn render(&self, expr: &PyExpr) -> String {
        let mut out = String::new();
        self.write_expr(&mut out, expr);
        out
    }

    fn write_expr(&self, out: &mut String, expr: &PyExpr) {
        match expr {
            PyExpr::Name(v) => out.push_str(v),
            PyExpr::Number(v) => out.push_str(v),
            PyExpr::Str(v) => write_py_str_repr(out, v),
            PyExpr::Call(call) => {
                out.push_str(&call.callee.join("."));
                out.push('(');
                for (i, (k, v)) in call.kwargs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(k);
                    out.push('=');
                    self.write_expr(out, v);
                }
                out.push(')');
            }
        }
    }
}

/// Python `repr()` of a string: single quotes, `\` and `'` escaped.
fn write_py_str_repr(out: &mut String, v: &str) {
    out.push('\'');
    for c in v.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => {
                let _ = write!(out, "{c}");
            }
        }
    }
    out.push('\'');
}

// ------------------------------- Tests ------------------------------------ //
