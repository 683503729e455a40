//! Function and class definitions.

use std::sync::Arc;

use super::{Expr, Stmt};
use crate::Span;

/// Parameters of a function, already classified by kind.
///
/// Positional slots are `required` followed by `defaults`, in declaration
/// order. `varargs` collects positional overflow, `kwargs` collects unknown
/// keywords.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParamSpec {
    pub required: Vec<String>,
    pub defaults: Vec<(String, Expr)>,
    pub varargs: Option<String>,
    pub kwargs: Option<String>,
}

impl ParamSpec {
    /// Number of parameters that can be filled positionally.
    #[inline]
    pub fn positional_count(&self) -> usize {
        self.required.len() + self.defaults.len()
    }

    /// Name of the positional parameter at `index`.
    pub fn positional_name(&self, index: usize) -> Option<&str> {
        if index < self.required.len() {
            return Some(&self.required[index]);
        }
        self.defaults
            .get(index - self.required.len())
            .map(|(name, _)| name.as_str())
    }

    /// Position of a named positional parameter.
    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.required
            .iter()
            .position(|p| p == name)
            .or_else(|| {
                self.defaults
                    .iter()
                    .position(|(p, _)| p == name)
                    .map(|i| i + self.required.len())
            })
    }

    /// Every bound name, in binding order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.required
            .iter()
            .map(String::as_str)
            .chain(self.defaults.iter().map(|(n, _)| n.as_str()))
            .chain(self.varargs.as_deref())
            .chain(self.kwargs.as_deref())
    }
}

/// A `def` or `lambda`.
///
/// Lambdas are represented as functions named `<lambda>` whose body is a
/// single `return`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: ParamSpec,
    pub body: Arc<[Stmt]>,
    pub docstring: Option<String>,
    pub span: Span,
}

impl FunctionDef {
    pub const LAMBDA_NAME: &'static str = "<lambda>";

    pub fn is_lambda(&self) -> bool {
        self.name == Self::LAMBDA_NAME
    }
}

/// A `class Name(Parent):` definition.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub parent: Option<Expr>,
    pub body: Vec<Stmt>,
    pub docstring: Option<String>,
    pub span: Span,
}
