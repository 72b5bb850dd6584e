use std::rc::Rc;

pub type Index = usize;

/// A lambda term with variables as de Bruijn indices.
///
/// `Var(0)` refers to the innermost enclosing `Lam`. Children sit behind `Rc`
/// so unchanged subtrees can be shared between a term and its reducts; terms
/// are never mutated after construction.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Term {
    /// `0`, `1`, ...
    Var(Index),
    /// `λt`
    Lam(Rc<Term>),
    /// `t t`
    App(Rc<Term>, Rc<Term>),
}

impl Term {
    pub fn var(index: Index) -> Self {
        Term::Var(index)
    }

    pub fn lam(body: impl Into<Rc<Term>>) -> Self {
        Term::Lam(body.into())
    }

    pub fn app(func: impl Into<Rc<Term>>, arg: impl Into<Rc<Term>>) -> Self {
        Term::App(func.into(), arg.into())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let id = Term::lam(Term::var(0));
        assert_eq!(
            Term::app(id.clone(), id.clone()),
            Term::App(Rc::new(Term::Lam(Term::Var(0).into())), id.into())
        );
        assert_ne!(Term::lam(Term::var(0)), Term::lam(Term::var(1)));
        assert_ne!(
            Term::app(Term::var(0), Term::var(1)),
            Term::app(Term::var(1), Term::var(0))
        );
        assert_ne!(Term::var(0), Term::lam(Term::var(0)));
    }
}
