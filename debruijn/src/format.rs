//! De Bruijn notation for [`Term`]s, e.g. `(λ0) λλ1 0`.
//!
//! An abstraction extends as far right as possible, so it is only
//! parenthesized when something follows it. Application associates to the
//! left, so only an application in argument position needs parentheses. The
//! output is accepted by [`crate::parser::parse`].

use crate::term::Term;

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        /// `last` is whether nothing follows `term` up to the enclosing group.
        fn fmt_rec(term: &Term, last: bool, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match term {
                Term::Var(i) => f.write_fmt(format_args!("{i}")),
                Term::Lam(body) if last => {
                    f.write_str("λ")?;
                    fmt_rec(body, true, f)
                }
                Term::Lam(_) => {
                    f.write_str("(")?;
                    fmt_rec(term, true, f)?;
                    f.write_str(")")
                }
                Term::App(lhs, rhs) => {
                    fmt_rec(lhs, false, f)?;
                    f.write_str(" ")?;
                    if let Term::App(_, _) = rhs.as_ref() {
                        f.write_str("(")?;
                        fmt_rec(rhs, true, f)?;
                        f.write_str(")")
                    } else {
                        fmt_rec(rhs, last, f)
                    }
                }
            }
        }
        fmt_rec(self, true, f)
    }
}

pub fn show(term: &Term) -> String {
    term.to_string()
}
