use std::rc::Rc;

use chumsky::prelude::*;

use crate::{
    compiler,
    lang::{Term, Token},
    prelude::*,
    term,
};

pub trait SimpleParser<I: Clone + std::hash::Hash, O>:
    Parser<I, O, Error = Error<I>> + Clone
{
    #[allow(clippy::type_complexity)]
    fn spanned(self) -> chumsky::combinator::MapWithSpan<Self, fn(O, Span) -> Spanned<O>, O>
    where
        Self: Sized,
        I: std::cmp::Eq,
    {
        self.map_with_span(|value, span| Spanned { span, value })
    }

    fn refcounted(self) -> chumsky::combinator::Map<Self, fn(O) -> std::rc::Rc<O>, O>
    where
        Self: Sized,
        I: std::cmp::Eq,
    {
        self.map(Rc::new)
    }
}
impl<I: Clone + std::hash::Hash, O, T> SimpleParser<I, O> for T where
    T: Parser<I, O, Error = Error<I>> + Clone
{
}

pub fn lexer() -> impl SimpleParser<char, Vec<Spanned<Token>>> {
    let symbols = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just('λ').to(Token::Lambda),
        just('\\').to(Token::Lambda),
    ));
    // Every lowercase letter is a variable of its own: `ab` is `a b`.
    let name = filter(|c: &char| c.is_ascii_lowercase()).map(Token::Name);
    let index = text::int::<char, _>(10)
        .from_str()
        .try_map(|r, span| r.map_err(|e| Error::custom(span, format!("{e}"))))
        .map(Token::Index);
    let token = choice((symbols, name, index));
    token.spanned().padded().repeated().then_ignore(end())
}

fn term_parser() -> impl SimpleParser<Token, Spanned<Term>> {
    recursive(|term: Recursive<_, Spanned<Term>, _>| {
        let name = select! { Token::Name(name) => name, }.spanned();
        let index = select! { Token::Index(index) => index, }.spanned();

        // x, 0
        let variable = choice((name.map(Term::Variable), index.map(Term::Index)))
            .labelled("variable");

        // λx term, λterm
        // Whether the binder must be named is decided during resolution.
        let binder = just(Token::Lambda)
            .ignore_then(select! { Token::Name(name) => name, }.or_not())
            .spanned();
        let abs = binder
            .then(term.clone().refcounted())
            .map(|(binder, body)| Term::Abstract(binder, body))
            .labelled("abstract");

        // (term)
        let parenthesized = term
            .map(Spanned::forget_span)
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .labelled("parenthesized");

        let atom = choice((variable, abs, parenthesized)).spanned();

        // term term
        atom.clone().then(atom.repeated()).foldl(|lhs, rhs| {
            let span = merge_span(&lhs.span(), &rhs.span());
            Spanned {
                span,
                value: Term::Apply(lhs.into(), rhs.into()),
            }
        })
    })
    .labelled("term")
}

fn parse_full<T>(s: &str, parser: impl SimpleParser<Token, T>) -> Result<T, Vec<Error<String>>> {
    let len = s.chars().count();
    let eoi = Span {
        start: len,
        end: len + 1,
    };
    let tokens = lexer().parse(s).map_err(|es| {
        es.into_iter()
            .map(|e| e.map(|e| e.to_string()))
            .collect::<Vec<_>>()
    })?;
    let value = parser
        .then_ignore(end())
        .parse(chumsky::Stream::from_iter(
            eoi,
            tokens
                .into_iter()
                .map(|Spanned { span, value }| (value, span)),
        ))
        .map_err(|es| {
            es.into_iter()
                .map(|e| e.map(|e| e.to_string()))
                .collect::<Vec<_>>()
        })?;
    Ok(value)
}

/// Parses the surface syntax without resolving any names.
pub fn parse_term(s: &str) -> Result<Spanned<Term>, Vec<Error<String>>> {
    parse_full(s, term_parser())
}

/// Parses a closed term and resolves its variables to de Bruijn indices.
pub fn parse(s: &str) -> Result<term::Term, Vec<Error<String>>> {
    let term = parse_term(s)?;
    compiler::compile(&term).map_err(|e| vec![e])
}
