use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::term::{Index, Term};

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("No normal form within {limit} steps, stopped at `{term}`")]
    StepLimitExceeded { limit: usize, term: Term },
}
pub type Result<T> = std::result::Result<T, EvalError>;

trait VarMapper {
    /// `depth` is the number of binders crossed since the root of the traversal.
    fn on_var(&mut self, depth: usize, index: Index) -> Term;
}

fn map_var(term: &Term, mapper: &mut impl VarMapper) -> Term {
    fn rec(term: &Term, mapper: &mut impl VarMapper, depth: usize) -> Term {
        match term {
            Term::Var(i) => mapper.on_var(depth, *i),
            Term::Lam(body) => Term::lam(rec(body, mapper, depth + 1)),
            Term::App(lhs, rhs) => Term::app(rec(lhs, mapper, depth), rec(rhs, mapper, depth)),
        }
    }
    rec(term, mapper, 0)
}

/// Adds `amount` to every index of `term` that is at least `cutoff`.
///
/// The cutoff grows by one under each binder, so indices bound inside `term`
/// are left alone. A negative shift saturates at zero instead of wrapping.
pub fn shift(term: &Term, amount: isize, cutoff: usize) -> Term {
    struct M {
        amount: isize,
        cutoff: usize,
    }
    impl VarMapper for M {
        fn on_var(&mut self, depth: usize, index: Index) -> Term {
            if index >= self.cutoff + depth {
                Term::var(index.saturating_add_signed(self.amount))
            } else {
                Term::var(index)
            }
        }
    }
    map_var(term, &mut M { amount, cutoff })
}

/// Replaces `target` in `term` by `replacement` and removes its binder.
///
/// Indices above `target` refer past the removed binder and drop by one;
/// indices below it are untouched. Under `depth` binders the target becomes
/// `target + depth` and the replacement is shifted by `depth`.
pub fn substitute(term: &Term, target: Index, replacement: &Term) -> Term {
    struct M<'a> {
        target: Index,
        replacement: &'a Term,
    }
    impl<'a> VarMapper for M<'a> {
        fn on_var(&mut self, depth: usize, index: Index) -> Term {
            let target = self.target + depth;
            match index.cmp(&target) {
                std::cmp::Ordering::Equal => shift(self.replacement, depth as isize, 0),
                std::cmp::Ordering::Greater => Term::var(index - 1),
                std::cmp::Ordering::Less => Term::var(index),
            }
        }
    }
    map_var(
        term,
        &mut M {
            target,
            replacement,
        },
    )
}

/// `(λbody) arg`
fn apply(body: &Term, arg: &Term) -> Term {
    substitute(body, 0, arg)
}

/// Applies one step of leftmost-outermost, call-by-value reduction.
///
/// Returns `None` when `term` is in normal form, which includes every
/// abstraction: bodies are never reduced.
pub fn reduce_step(term: &Term) -> Option<Term> {
    if let Term::App(lhs, rhs) = term {
        // E-APP1
        if let Some(lhs) = reduce_step(lhs) {
            return Some(Term::App(lhs.into(), Rc::clone(rhs)));
        }
        if let Term::Lam(body) = lhs.as_ref() {
            // E-APP2
            if let Some(rhs) = reduce_step(rhs) {
                return Some(Term::App(Rc::clone(lhs), rhs.into()));
            }
            // E-APPABS
            return Some(apply(body, rhs));
        }
    }
    None
}

/// The reduction trace of a term: every term produced by successive
/// [`reduce_step`] calls, not including the starting term.
///
/// Nothing bounds the trace; a term without a normal form yields forever.
pub struct Steps {
    current: Term,
}

impl Iterator for Steps {
    type Item = Term;

    fn next(&mut self) -> Option<Term> {
        let next = reduce_step(&self.current)?;
        self.current = next.clone();
        Some(next)
    }
}

pub fn steps(term: &Term) -> Steps {
    Steps {
        current: term.clone(),
    }
}

#[derive(PartialEq, Eq, Debug)]
pub struct Normalized {
    pub term: Term,
    pub steps: usize,
}

/// Reduces `term` until no step applies, giving up after `limit` steps.
pub fn normalize(term: &Term, limit: Option<usize>) -> Result<Normalized> {
    let mut current = term.clone();
    let mut count = 0;
    while let Some(next) = reduce_step(&current) {
        if let Some(limit) = limit.filter(|&limit| count >= limit) {
            warn!(limit, "step limit reached");
            return Err(EvalError::StepLimitExceeded {
                limit,
                term: current,
            });
        }
        count += 1;
        debug!(step = count, term = %next, "reduced");
        current = next;
    }
    Ok(Normalized {
        term: current,
        steps: count,
    })
}

#[cfg(test)]
mod test {
    use super::{Term::*, *};
    use crate::parser::parse;

    macro_rules! var {
        ($n:expr) => {
            Var($n)
        };
    }
    macro_rules! lam {
        ($body: expr) => {
            Lam($body.into())
        };
    }
    macro_rules! app {
        ($lhs:expr, $rhs: expr) => {
            App($lhs.into(), $rhs.into())
        };
    }

    fn trace(input: &str) -> Vec<Term> {
        steps(&parse(input).unwrap()).collect()
    }

    #[test]
    fn test_shift() {
        assert_eq!(shift(&var!(0), 1, 0), var!(1));
        assert_eq!(shift(&var!(0), 1, 1), var!(0));
        assert_eq!(shift(&lam!(var!(0)), 3, 0), lam!(var!(0)));
        assert_eq!(
            shift(&lam!(app!(var!(0), var!(1))), 2, 0),
            lam!(app!(var!(0), var!(3)))
        );
        assert_eq!(
            shift(&app!(var!(0), lam!(var!(2))), -1, 1),
            app!(var!(0), lam!(var!(1)))
        );
        assert_eq!(shift(&var!(0), -1, 0), var!(0));
    }

    #[test]
    fn test_substitute() {
        assert_eq!(substitute(&var!(0), 0, &lam!(var!(0))), lam!(var!(0)));
        assert_eq!(substitute(&var!(1), 0, &lam!(var!(0))), var!(0));
        assert_eq!(substitute(&var!(0), 1, &lam!(var!(0))), var!(0));
        // the replacement's free index crosses one more binder
        assert_eq!(
            substitute(&lam!(app!(var!(1), var!(0))), 0, &var!(4)),
            lam!(app!(var!(5), var!(0)))
        );
        assert_eq!(
            substitute(&lam!(lam!(var!(2))), 0, &lam!(var!(1))),
            lam!(lam!(lam!(var!(3))))
        );
    }

    #[test]
    fn test_shift_then_substitute_is_identity() {
        let terms = [
            var!(0),
            var!(3),
            lam!(var!(0)),
            lam!(app!(var!(0), var!(1))),
            lam!(lam!(app!(app!(var!(2), var!(0)), var!(5)))),
            app!(lam!(var!(1)), app!(var!(0), lam!(var!(0)))),
        ];
        let replacements = [lam!(var!(0)), lam!(lam!(app!(var!(1), var!(0))))];
        for t in &terms {
            for r in &replacements {
                assert_eq!(&substitute(&shift(t, 1, 0), 0, r), t);
            }
        }
    }

    #[test]
    fn test_reduce() {
        let id = lam!(var!(0));
        assert_eq!(reduce_step(&app!(id.clone(), id.clone())), Some(id.clone()));
        assert_eq!(reduce_step(&id), None);
        assert_eq!(reduce_step(&var!(0)), None);
        // K applied to an argument keeps the outer binder's body
        assert_eq!(
            reduce_step(&app!(lam!(lam!(var!(1))), id.clone())),
            Some(lam!(id.clone()))
        );
    }

    #[test]
    fn test_reduce_order() {
        let id = lam!(var!(0));
        let redex = app!(id.clone(), id.clone());
        // function position first
        assert_eq!(
            reduce_step(&app!(redex.clone(), redex.clone())),
            Some(app!(id.clone(), redex.clone()))
        );
        // then the argument, before substituting
        assert_eq!(
            reduce_step(&app!(lam!(lam!(var!(1))), redex.clone())),
            Some(app!(lam!(lam!(var!(1))), id.clone()))
        );
        // a stuck function position blocks the argument
        assert_eq!(reduce_step(&app!(var!(0), redex.clone())), None);
    }

    #[test]
    fn test_no_reduction_under_binders() {
        let id = lam!(var!(0));
        let term = lam!(app!(id.clone(), id.clone()));
        assert_eq!(reduce_step(&term), None);
        assert_eq!(reduce_step(&lam!(lam!(app!(id.clone(), var!(1))))), None);
    }

    #[test]
    fn test_free_variables_are_inert() {
        assert_eq!(reduce_step(&var!(7)), None);
        assert_eq!(reduce_step(&app!(var!(7), var!(2))), None);
        assert_eq!(
            reduce_step(&app!(lam!(app!(var!(0), var!(3))), var!(7))),
            Some(app!(var!(7), var!(2)))
        );
    }

    #[test]
    fn test_normal_form_is_stable() {
        let term = parse("(λa a) λb b").unwrap();
        let normal = normalize(&term, None).unwrap().term;
        assert_eq!(reduce_step(&normal), None);
        assert_eq!(reduce_step(&normal), None);
    }

    #[test]
    fn test_scenarios() {
        assert_eq!(trace("(λa a) λb b"), vec![lam!(var!(0))]);
        assert_eq!(trace("(λa λb b a)"), vec![]);
        assert_eq!(
            trace("((λa λb b a) λc c)"),
            vec![lam!(app!(var!(0), lam!(var!(0))))]
        );
    }

    #[test]
    fn test_church_numerals() {
        // 2 = λf λx f (f x), succ = λn λf λx f (n f x)
        let term = parse("(λn λf λx f (n f x)) λf λx f (f x)").unwrap();
        let Normalized { term, steps } = normalize(&term, None).unwrap();
        assert_eq!(steps, 1);
        // the body is not reduced further
        assert_eq!(
            term,
            lam!(lam!(app!(
                var!(1),
                app!(
                    app!(
                        lam!(lam!(app!(var!(1), app!(var!(1), var!(0))))),
                        var!(1)
                    ),
                    var!(0)
                )
            )))
        );
    }

    #[test]
    fn test_trace_is_deterministic() {
        let input = "(λx λy x) ((λa a) λb b) ((λc c) λd d)";
        assert_eq!(trace(input), trace(input));
        assert_eq!(trace(input).len(), 4);
        assert_eq!(trace(input).last(), Some(&lam!(var!(0))));
    }

    #[test]
    fn test_step_limit() {
        let omega = parse("(λx x x) λx x x").unwrap();
        assert_eq!(reduce_step(&omega), Some(omega.clone()));
        match normalize(&omega, Some(10)) {
            Err(EvalError::StepLimitExceeded { limit, term }) => {
                assert_eq!(limit, 10);
                assert_eq!(term, omega);
            }
            other => panic!("expected the step limit to be hit, got {other:?}"),
        }
        let id = parse("(λa a) λb b").unwrap();
        assert_eq!(normalize(&id, Some(1)).unwrap().steps, 1);
        assert!(normalize(&id, Some(0)).is_err());
    }
}
