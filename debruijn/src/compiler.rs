use tracing::trace;

use crate::{
    lang,
    prelude::*,
    term::{Index, Term},
};

/// How variables are written in one input. An input never mixes the two.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum Notation {
    /// `λa λb b a`
    Named,
    /// `λλ0 1`
    Nameless,
}

fn detect_notation(term: &lang::Term) -> Notation {
    fn uses_indices(term: &lang::Term) -> bool {
        match term {
            lang::Term::Variable(_) => false,
            lang::Term::Index(_) => true,
            lang::Term::Abstract(_, body) => uses_indices(body.value()),
            lang::Term::Apply(lhs, rhs) => uses_indices(lhs.value()) || uses_indices(rhs.value()),
        }
    }
    if uses_indices(term) {
        Notation::Nameless
    } else {
        Notation::Named
    }
}

/// The binders visible at the current point of the term, innermost last.
struct Scope {
    notation: Notation,
    binders: Vec<Option<Name>>,
}

impl Scope {
    fn new(notation: Notation) -> Self {
        Self {
            notation,
            binders: vec![],
        }
    }

    fn lookup(&self, name: &Spanned<Name>) -> Result<Index> {
        self.binders
            .iter()
            .rev()
            .enumerate()
            .find_map(|(i, x)| (x.as_ref() == Some(name.value())).then(|| i))
            .ok_or_else(|| {
                Error::custom(
                    name.span(),
                    format!("Found a free variable `{}`", name.value()),
                )
            })
    }

    fn check_index(&self, index: &Spanned<usize>) -> Result<Index> {
        let i = *index.value();
        if i < self.binders.len() {
            Ok(i)
        } else {
            Err(Error::custom(
                index.span(),
                format!(
                    "Index {i} has no enclosing binder, only {} in scope",
                    self.binders.len()
                ),
            ))
        }
    }

    fn compile(&mut self, term: &Spanned<lang::Term>) -> Result<Term> {
        Ok(match term.value() {
            lang::Term::Variable(name) => {
                if self.notation == Notation::Nameless {
                    return Err(Error::custom(
                        name.span(),
                        format!(
                            "Found a named variable `{}` in a term written with indices",
                            name.value()
                        ),
                    ));
                }
                Term::var(self.lookup(name)?)
            }
            lang::Term::Index(index) => Term::var(self.check_index(index)?),
            lang::Term::Abstract(binder, body) => {
                match (self.notation, binder.value()) {
                    (Notation::Named, None) => {
                        return Err(Error::custom(
                            binder.span(),
                            "Expected a variable name after the binder",
                        ))
                    }
                    (Notation::Nameless, Some(name)) => {
                        return Err(Error::custom(
                            binder.span(),
                            format!("Found a named binder `{name}` in a term written with indices"),
                        ))
                    }
                    _ => {}
                }
                self.binders.push(*binder.value());
                trace!(depth = self.binders.len(), binder = ?binder.value(), "enter binder");
                let body = self.compile(body);
                self.binders.pop();
                Term::lam(body?)
            }
            lang::Term::Apply(lhs, rhs) => {
                let lhs = self.compile(lhs)?;
                let rhs = self.compile(rhs)?;
                Term::app(lhs, rhs)
            }
        })
    }
}

/// Resolves every variable of `term` to the distance to its binder.
///
/// Only closed terms are accepted: a name or index with no enclosing binder is
/// an error carrying the span of the offending variable.
pub fn compile(term: &Spanned<lang::Term>) -> Result<Term> {
    Scope::new(detect_notation(term.value())).compile(term)
}
