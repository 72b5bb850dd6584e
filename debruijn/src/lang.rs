use std::rc::Rc;

use crate::prelude::*;

#[derive(PartialEq, Eq, Hash, Clone, derive_more::Display, Debug)]
pub enum Token {
    #[display(fmt = "(")]
    LParen,
    #[display(fmt = ")")]
    RParen,
    #[display(fmt = "λ")]
    Lambda,
    #[display(fmt = "{_0}")]
    Name(Name),
    #[display(fmt = "{_0}")]
    Index(usize),
}

/// Surface syntax, before names are resolved to de Bruijn indices.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Term {
    /// `x`
    Variable(Spanned<Name>),
    /// `0`
    Index(Spanned<usize>),
    /// `λx t`, or `λt` in nameless notation
    Abstract(Spanned<Option<Name>>, Rc<Spanned<Term>>),
    /// `t t`
    Apply(Rc<Spanned<Term>>, Rc<Spanned<Term>>),
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Variable(name) => f.write_fmt(format_args!("{name}")),
            Term::Index(index) => f.write_fmt(format_args!("{index}")),
            Term::Abstract(binder, body) => match binder.value() {
                Some(name) => f.write_fmt(format_args!("(λ{name} {body})")),
                None => f.write_fmt(format_args!("(λ{body})")),
            },
            Term::Apply(lhs, rhs) => f.write_fmt(format_args!("({lhs} {rhs})")),
        }
    }
}
