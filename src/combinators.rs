// ABOUTME: A small parser-combinator algebra over token slices
// Written from scratch rather than built on a combinator crate: the ten
// primitives here (reserved, tag, concat, alternate, opt, rep, process,
// lazy, phrase, exp) are the grammar-construction kit the parser is built from

use std::rc::Rc;

use crate::token::{Token, TokenKind};

type ParseFn<T> = dyn Fn(&[Token], usize) -> Option<(T, usize)>;

/// A parser that consumes tokens starting at a position and yields either a
/// value and the position just past it, or `None` on failure.
#[derive(Clone)]
pub struct Parser<T> {
    f: Rc<ParseFn<T>>,
}

impl<T: 'static> Parser<T> {
    pub fn new(f: impl Fn(&[Token], usize) -> Option<(T, usize)> + 'static) -> Self {
        Parser { f: Rc::new(f) }
    }

    pub fn parse(&self, tokens: &[Token], pos: usize) -> Option<(T, usize)> {
        (self.f)(tokens, pos)
    }
}

/// Matches a single token with the exact lexeme and kind.
pub fn reserved(word: &'static str, kind: TokenKind) -> Parser<String> {
    Parser::new(move |tokens, pos| {
        let tok = tokens.get(pos)?;
        if tok.lexeme == word && tok.kind == kind {
            Some((tok.lexeme.clone(), pos + 1))
        } else {
            None
        }
    })
}

/// Matches any token of the given kind, yielding its lexeme.
pub fn tag(kind: TokenKind) -> Parser<String> {
    Parser::new(move |tokens, pos| {
        let tok = tokens.get(pos)?;
        if tok.kind == kind {
            Some((tok.lexeme.clone(), pos + 1))
        } else {
            None
        }
    })
}

/// Sequences two parsers; on success yields the pair of their values.
pub fn concat<A: 'static, B: 'static>(a: Parser<A>, b: Parser<B>) -> Parser<(A, B)> {
    Parser::new(move |tokens, pos| {
        let (va, p1) = a.parse(tokens, pos)?;
        let (vb, p2) = b.parse(tokens, p1)?;
        Some(((va, vb), p2))
    })
}

/// Ordered choice: tries `a`, falling back to `b` from the same position.
pub fn alternate<T: 'static>(a: Parser<T>, b: Parser<T>) -> Parser<T> {
    Parser::new(move |tokens, pos| a.parse(tokens, pos).or_else(|| b.parse(tokens, pos)))
}

/// Always succeeds, yielding `Some(value)` or `None`.
pub fn opt<T: 'static>(a: Parser<T>) -> Parser<Option<T>> {
    Parser::new(move |tokens, pos| match a.parse(tokens, pos) {
        Some((v, p)) => Some((Some(v), p)),
        None => Some((None, pos)),
    })
}

/// Greedy zero-or-more; always succeeds, yielding the (possibly empty) list
/// of sub-results.
pub fn rep<T: 'static>(a: Parser<T>) -> Parser<Vec<T>> {
    Parser::new(move |tokens, pos| {
        let mut results = Vec::new();
        let mut p = pos;
        while let Some((v, next)) = a.parse(tokens, p) {
            results.push(v);
            p = next;
        }
        Some((results, p))
    })
}

/// Post-transforms a successful result's value through `f`.
pub fn process<A: 'static, B: 'static>(
    a: Parser<A>,
    f: impl Fn(A) -> B + 'static,
) -> Parser<B> {
    Parser::new(move |tokens, pos| {
        let (v, p) = a.parse(tokens, pos)?;
        Some((f(v), p))
    })
}

/// Materializes its inner parser only when invoked, breaking recursive
/// grammar graphs that would otherwise infinitely construct parsers.
pub fn lazy<T: 'static>(build: impl Fn() -> Parser<T> + 'static) -> Parser<T> {
    Parser::new(move |tokens, pos| build().parse(tokens, pos))
}

/// Succeeds only if `a` consumes every remaining token; the top-level
/// combinator for an entire program.
pub fn phrase<T: 'static>(a: Parser<T>) -> Parser<T> {
    Parser::new(move |tokens, pos| {
        let (v, p) = a.parse(tokens, pos)?;
        if p == tokens.len() {
            Some((v, p))
        } else {
            None
        }
    })
}

/// The left-associative fold combinator: parses `term (sep term)*`, folding
/// the accumulator through the binary reducer each `sep` match yields.
pub fn exp<T: Clone + 'static>(
    term: Parser<T>,
    sep: Parser<Rc<dyn Fn(T, T) -> T>>,
) -> Parser<T> {
    Parser::new(move |tokens, pos| {
        let (mut acc, mut p) = term.parse(tokens, pos)?;
        loop {
            let Some((reducer, p1)) = sep.parse(tokens, p) else {
                break;
            };
            let Some((rhs, p2)) = term.parse(tokens, p1) else {
                break;
            };
            acc = reducer(acc, rhs);
            p = p2;
        }
        Some((acc, p))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;

    fn tok(lexeme: &str, kind: TokenKind) -> Token {
        Token::new(lexeme, kind, 0)
    }

    #[test]
    fn reserved_matches_exact_lexeme_and_kind() {
        let p = reserved("if", TokenKind::Reserved);
        let tokens = vec![tok("if", TokenKind::Reserved)];
        assert_eq!(p.parse(&tokens, 0), Some(("if".to_string(), 1)));
    }

    #[test]
    fn alternate_tries_left_then_right() {
        let p = alternate(reserved("a", TokenKind::Reserved), reserved("b", TokenKind::Reserved));
        let tokens = vec![tok("b", TokenKind::Reserved)];
        assert_eq!(p.parse(&tokens, 0), Some(("b".to_string(), 1)));
    }

    #[test]
    fn rep_succeeds_on_zero_matches() {
        let p = rep(reserved("x", TokenKind::Reserved));
        let tokens: Vec<Token> = vec![];
        assert_eq!(p.parse(&tokens, 0), Some((vec![], 0)));
    }

    #[test]
    fn rep_collects_greedily() {
        let p = rep(tag(TokenKind::Int));
        let tokens = vec![
            tok("1", TokenKind::Int),
            tok("2", TokenKind::Int),
            tok("x", TokenKind::Identifier),
        ];
        let (v, pos) = p.parse(&tokens, 0).unwrap();
        assert_eq!(v, vec!["1", "2"]);
        assert_eq!(pos, 2);
    }

    #[test]
    fn exp_folds_left_associatively() {
        let num = tag(TokenKind::Int).map_into();
        let sep: Parser<Rc<dyn Fn(i64, i64) -> i64>> =
            process(reserved("-", TokenKind::Reserved), |_| {
                Rc::new(|l: i64, r: i64| l - r) as Rc<dyn Fn(i64, i64) -> i64>
            });
        let p = exp(num, sep);
        let tokens = vec![
            tok("10", TokenKind::Int),
            tok("-", TokenKind::Reserved),
            tok("3", TokenKind::Int),
            tok("-", TokenKind::Reserved),
            tok("2", TokenKind::Int),
        ];
        let (v, _) = p.parse(&tokens, 0).unwrap();
        assert_eq!(v, 5);
    }

    trait MapInto {
        fn map_into(self) -> Parser<i64>;
    }
    impl MapInto for Parser<String> {
        fn map_into(self) -> Parser<i64> {
            process(self, |s: String| s.parse::<i64>().unwrap())
        }
    }
}
