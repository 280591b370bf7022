// ABOUTME: Token stream -> AST, built entirely from the combinator algebra in combinators.rs
// Mutually recursive productions (stmtList <-> stmt, aexp <-> aexp_term) are
// tied together with lazy so construction terminates despite the grammar's cycles

use std::rc::Rc;

use crate::ast::{AssignTarget, BinOp, Expr, RelOp, Stmt};
use crate::combinators::{
    alternate, concat, exp, lazy, opt, phrase, process, rep, reserved, tag, Parser,
};
use crate::error::TinyError;
use crate::token::{Token, TokenKind};

fn kw(word: &'static str) -> Parser<String> {
    reserved(word, TokenKind::Reserved)
}

fn keyword_alt(words: &'static [&'static str]) -> Parser<String> {
    let mut iter = words.iter();
    let first = kw(iter.next().expect("non-empty operator list"));
    iter.fold(first, |acc, w| alternate(acc, kw(w)))
}

fn alt_many<T: 'static>(mut ps: Vec<Parser<T>>) -> Parser<T> {
    let first = ps.remove(0);
    ps.into_iter().fold(first, alternate)
}

fn ident() -> Parser<String> {
    tag(TokenKind::Identifier)
}

/// Parses a complete program: a token stream produced by the lexer and
/// comment filter (raw `Reserved("\n")` separators are dropped here, a thin
/// filter before the grammar proper, per design notes).
pub fn parse(tokens: &[Token]) -> Result<Stmt, TinyError> {
    let filtered: Vec<Token> = tokens
        .iter()
        .filter(|t| !(t.kind == TokenKind::Reserved && t.lexeme == "\n"))
        .cloned()
        .collect();
    match phrase(stmt_list()).parse(&filtered, 0) {
        Some((stmt, _)) => Ok(stmt),
        None => Err(TinyError::ParseError),
    }
}

// ---------------------------------------------------------------- literals

fn num_int() -> Parser<Expr> {
    process(tag(TokenKind::Int), |s: String| {
        Expr::IntLit(s.parse().expect("lexer guarantees digits"))
    })
}

fn num_double() -> Parser<Expr> {
    process(tag(TokenKind::Double), |s: String| {
        Expr::DoubleLit(s.parse().expect("lexer guarantees a valid float"))
    })
}

fn str_lit() -> Parser<Expr> {
    process(tag(TokenKind::Str), Expr::StrLit)
}

fn bool_lit() -> Parser<Expr> {
    process(tag(TokenKind::Bool), |s: String| Expr::BoolLit(s == "True"))
}

fn number() -> Parser<Expr> {
    alternate(num_int(), num_double())
}

// --------------------------------------------------------------- aexp_term

fn aexp_tuple() -> Parser<Expr> {
    process(
        concat(kw("("), concat(lazy(aexp), kw(")"))),
        |(_, (e, _))| e,
    )
}

fn neg_expr() -> Parser<Expr> {
    process(concat(kw("~"), lazy(aexp)), |(_, e)| Expr::Neg(Box::new(e)))
}

fn ident_expr() -> Parser<Expr> {
    process(ident(), Expr::Var)
}

fn arg_list() -> Parser<Vec<Expr>> {
    process(
        opt(concat(lazy(aexp), rep(concat(kw(","), lazy(aexp))))),
        |maybe| match maybe {
            None => vec![],
            Some((first, rest)) => {
                let mut args = vec![first];
                args.extend(rest.into_iter().map(|(_, e)| e));
                args
            }
        },
    )
}

fn call_expr() -> Parser<Expr> {
    process(
        concat(ident(), concat(kw("("), concat(arg_list(), kw(")")))),
        |(name, (_, (args, _)))| Expr::Call(name, args),
    )
}

fn subscript_index() -> Parser<Expr> {
    process(
        concat(kw("["), concat(lazy(aexp), kw("]"))),
        |(_, (e, _))| e,
    )
}

fn subscript_expr() -> Parser<Expr> {
    process(
        concat(ident(), concat(subscript_index(), rep(subscript_index()))),
        |(name, (first, rest))| {
            let mut indices = vec![first];
            indices.extend(rest);
            Expr::Subscript(name, indices)
        },
    )
}

/// Ordering mirrors the grammar's tie-break rule: `call` and `subscript`
/// must be tried before bare `ident`, since both start with an identifier.
fn aexp_term() -> Parser<Expr> {
    alt_many(vec![
        aexp_tuple(),
        call_expr(),
        number(),
        neg_expr(),
        subscript_expr(),
        ident_expr(),
        str_lit(),
        bool_lit(),
    ])
}

// ------------------------------------------------------------- arithmetic

const AEXP_LEVELS: &[&[&str]] = &[
    &["%"],
    &["*", "/", "div"],
    &["+", "-"],
    &["|", "&", "^"],
    &["shl", "shr"],
];

fn binop_for(op: &str) -> BinOp {
    match op {
        "%" => BinOp::Mod,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "div" => BinOp::FloorDiv,
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "|" => BinOp::BitOr,
        "&" => BinOp::BitAnd,
        "^" => BinOp::BitXor,
        "shl" => BinOp::Shl,
        "shr" => BinOp::Shr,
        other => unreachable!("unexpected arithmetic operator {other:?}"),
    }
}

fn binop_sep(ops: &'static [&'static str]) -> Parser<Rc<dyn Fn(Expr, Expr) -> Expr>> {
    process(keyword_alt(ops), |op: String| {
        let binop = binop_for(&op);
        Rc::new(move |l: Expr, r: Expr| Expr::BinOp(binop, Box::new(l), Box::new(r)))
            as Rc<dyn Fn(Expr, Expr) -> Expr>
    })
}

/// Precedence climbing: fold `Exp` once per level, highest binding
/// innermost (applied first, closest to `aexp_term`).
pub fn aexp() -> Parser<Expr> {
    let mut p = aexp_term();
    for level in AEXP_LEVELS {
        p = exp(p, binop_sep(level));
    }
    p
}

// ---------------------------------------------------------------- boolean

fn relop_for(op: &str) -> RelOp {
    match op {
        ">" => RelOp::Gt,
        "<" => RelOp::Lt,
        ">=" => RelOp::Ge,
        "<=" => RelOp::Le,
        "=" => RelOp::Eq,
        "!=" => RelOp::Ne,
        other => unreachable!("unexpected relational operator {other:?}"),
    }
}

fn bexp_not() -> Parser<Expr> {
    process(concat(kw("not"), lazy(bexp_term)), |(_, e)| {
        Expr::Not(Box::new(e))
    })
}

fn bexp_relation_op() -> Parser<Expr> {
    process(
        concat(
            aexp(),
            concat(keyword_alt(&[">", "<", ">=", "<=", "=", "!="]), aexp()),
        ),
        |(l, (op, r))| Expr::RelOp(relop_for(&op), Box::new(l), Box::new(r)),
    )
}

fn bexp_tuple() -> Parser<Expr> {
    process(
        concat(kw("("), concat(lazy(bexp), kw(")"))),
        |(_, (e, _))| e,
    )
}

fn bexp_term() -> Parser<Expr> {
    alt_many(vec![bexp_not(), bexp_relation_op(), bexp_tuple(), bool_lit()])
}

/// `not` is consumed as a unary prefix inside `bexp_term`; the infix
/// precedence level above it in the original grammar never has a binary
/// reducer to apply and can never match, so only `andalso`/`orelse` are
/// implemented as an `Exp` fold here.
const BEXP_LEVELS: &[&[&str]] = &[&["andalso", "orelse"]];

fn logic_sep(ops: &'static [&'static str]) -> Parser<Rc<dyn Fn(Expr, Expr) -> Expr>> {
    process(keyword_alt(ops), |op: String| {
        let reducer: Rc<dyn Fn(Expr, Expr) -> Expr> = match op.as_str() {
            "andalso" => Rc::new(|l: Expr, r: Expr| Expr::And(Box::new(l), Box::new(r))),
            "orelse" => Rc::new(|l: Expr, r: Expr| Expr::Or(Box::new(l), Box::new(r))),
            other => unreachable!("unexpected logic operator {other:?}"),
        };
        reducer
    })
}

pub fn bexp() -> Parser<Expr> {
    let mut p = bexp_term();
    for level in BEXP_LEVELS {
        p = exp(p, logic_sep(level));
    }
    p
}

// -------------------------------------------------------------- statements

fn assign_target() -> Parser<AssignTarget> {
    alternate(
        process(
            concat(ident(), concat(subscript_index(), rep(subscript_index()))),
            |(name, (first, rest))| {
                let mut indices = vec![first];
                indices.extend(rest);
                AssignTarget::Subscript(name, indices)
            },
        ),
        process(ident(), AssignTarget::Name),
    )
}

fn array_init_expr() -> Parser<Expr> {
    let element = alternate(lazy(array_init_expr), aexp());
    process(
        concat(
            kw("array"),
            concat(
                kw("("),
                concat(aexp(), concat(opt(concat(kw(","), element)), kw(")"))),
            ),
        ),
        |(_, (_, (size, (maybe_init, _))))| {
            let init = maybe_init.map(|(_, e)| Box::new(e));
            Expr::ArrayInit(Box::new(size), init)
        },
    )
}

fn rhs_expr() -> Parser<Expr> {
    alternate(array_init_expr(), aexp())
}

fn assign_stmt() -> Parser<Stmt> {
    process(
        concat(assign_target(), concat(kw(":="), rhs_expr())),
        |(target, (_, expr))| Stmt::Assign(target, expr),
    )
}

fn call_stmt() -> Parser<Stmt> {
    process(call_expr(), |e| match e {
        Expr::Call(name, args) => Stmt::Call(name, args),
        _ => unreachable!("call_expr always yields Expr::Call"),
    })
}

fn param_list() -> Parser<Vec<String>> {
    process(
        opt(concat(ident(), rep(concat(kw(","), ident())))),
        |maybe| match maybe {
            None => vec![],
            Some((first, rest)) => {
                let mut params = vec![first];
                params.extend(rest.into_iter().map(|(_, p)| p));
                params
            }
        },
    )
}

fn func_decl_stmt() -> Parser<Stmt> {
    process(
        concat(
            kw("func"),
            concat(
                ident(),
                concat(
                    kw("("),
                    concat(
                        param_list(),
                        concat(kw(")"), concat(kw("=>"), concat(lazy(stmt_list), kw("end")))),
                    ),
                ),
            ),
        ),
        |(_, (name, (_, (params, (_, (_, (body, _)))))))| {
            Stmt::FuncDecl(name, params, Rc::new(body))
        },
    )
}

/// An anonymous `func (...) => ... end` with no name immediately after
/// `func` — the surface syntax chosen for `LambdaDecl` (see design notes:
/// the reserved-word list has no dedicated `lambda` keyword).
fn lambda_decl_stmt() -> Parser<Stmt> {
    process(
        concat(
            kw("func"),
            concat(
                kw("("),
                concat(
                    param_list(),
                    concat(kw(")"), concat(kw("=>"), concat(lazy(stmt_list), kw("end")))),
                ),
            ),
        ),
        |(_, (_, (params, (_, (_, (body, _))))))| Stmt::LambdaDecl(params, Rc::new(body)),
    )
}

fn func_or_lambda_decl() -> Parser<Stmt> {
    alternate(func_decl_stmt(), lambda_decl_stmt())
}

fn if_stmt() -> Parser<Stmt> {
    process(
        concat(
            kw("if"),
            concat(
                bexp(),
                concat(
                    kw("then"),
                    concat(
                        lazy(stmt_list),
                        concat(opt(concat(kw("else"), lazy(stmt_list))), kw("end")),
                    ),
                ),
            ),
        ),
        |(_, (cond, (_, (then_stmt, (maybe_else, _)))))| {
            let else_stmt = maybe_else.map(|(_, s)| Box::new(s));
            Stmt::If(cond, Box::new(then_stmt), else_stmt)
        },
    )
}

fn while_stmt() -> Parser<Stmt> {
    process(
        concat(
            kw("while"),
            concat(bexp(), concat(kw("do"), concat(lazy(stmt_list), kw("end")))),
        ),
        |(_, (cond, (_, (body, _))))| Stmt::While(cond, Box::new(body)),
    )
}

fn for_stmt() -> Parser<Stmt> {
    process(
        concat(
            kw("for"),
            concat(
                kw("("),
                concat(
                    opt(lazy(assign_stmt)),
                    concat(
                        kw(";"),
                        concat(
                            opt(bexp()),
                            concat(
                                kw(";"),
                                concat(
                                    opt(lazy(assign_stmt)),
                                    concat(
                                        kw(")"),
                                        concat(kw("do"), concat(lazy(stmt_list), kw("end"))),
                                    ),
                                ),
                            ),
                        ),
                    ),
                ),
            ),
        ),
        |(_, (_, (init, (_, (cond, (_, (post, (_, (_, (body, _))))))))))| {
            Stmt::For(
                init.map(Box::new),
                cond,
                post.map(Box::new),
                Box::new(body),
            )
        },
    )
}

fn return_stmt() -> Parser<Stmt> {
    process(concat(kw("return"), aexp()), |(_, e)| Stmt::Return(e))
}

fn subscript_stmt() -> Parser<Stmt> {
    process(subscript_expr(), Stmt::Expr)
}

fn aexp_stmt() -> Parser<Stmt> {
    process(aexp(), Stmt::Expr)
}

fn stmt() -> Parser<Stmt> {
    alt_many(vec![
        assign_stmt(),
        call_stmt(),
        func_or_lambda_decl(),
        if_stmt(),
        while_stmt(),
        for_stmt(),
        return_stmt(),
        subscript_stmt(),
        aexp_stmt(),
    ])
}

pub fn stmt_list() -> Parser<Stmt> {
    let sep: Parser<Rc<dyn Fn(Stmt, Stmt) -> Stmt>> = process(kw(";"), |_| {
        Rc::new(|l: Stmt, r: Stmt| Stmt::Compound(Box::new(l), Box::new(r)))
            as Rc<dyn Fn(Stmt, Stmt) -> Stmt>
    });
    exp(stmt(), sep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_src(src: &str) -> Stmt {
        let tokens = tokenize(src).unwrap();
        parse(&tokens).unwrap()
    }

    #[test]
    fn parses_simple_assignment() {
        let stmt = parse_src("x := 3");
        assert_eq!(
            stmt,
            Stmt::Assign(AssignTarget::Name("x".to_string()), Expr::IntLit(3))
        );
    }

    #[test]
    fn operator_precedence_mul_over_add() {
        let stmt = parse_src("a + b * c");
        match stmt {
            Stmt::Expr(Expr::BinOp(BinOp::Add, l, r)) => {
                assert_eq!(*l, Expr::Var("a".to_string()));
                assert_eq!(
                    *r,
                    Expr::BinOp(
                        BinOp::Mul,
                        Box::new(Expr::Var("b".to_string())),
                        Box::new(Expr::Var("c".to_string()))
                    )
                );
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn operator_precedence_add_over_mul_other_order() {
        let stmt = parse_src("a * b + c");
        match stmt {
            Stmt::Expr(Expr::BinOp(BinOp::Add, l, r)) => {
                assert_eq!(
                    *l,
                    Expr::BinOp(
                        BinOp::Mul,
                        Box::new(Expr::Var("a".to_string())),
                        Box::new(Expr::Var("b".to_string()))
                    )
                );
                assert_eq!(*r, Expr::Var("c".to_string()));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn left_associative_subtraction() {
        let stmt = parse_src("a - b - c");
        match stmt {
            Stmt::Expr(Expr::BinOp(BinOp::Sub, l, r)) => {
                assert_eq!(
                    *l,
                    Expr::BinOp(
                        BinOp::Sub,
                        Box::new(Expr::Var("a".to_string())),
                        Box::new(Expr::Var("b".to_string()))
                    )
                );
                assert_eq!(*r, Expr::Var("c".to_string()));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn subscript_assignment_is_not_mistaken_for_subscript_expr_stmt() {
        let stmt = parse_src("a[0] := 1");
        match stmt {
            Stmt::Assign(AssignTarget::Subscript(name, idx), Expr::IntLit(1)) => {
                assert_eq!(name, "a");
                assert_eq!(idx, vec![Expr::IntLit(0)]);
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn parses_func_decl_and_call() {
        let stmt = parse_src("func add(a, b) => return a + b end; add(2, 3)");
        assert!(matches!(stmt, Stmt::Compound(_, _)));
    }

    #[test]
    fn parses_anonymous_lambda() {
        let stmt = parse_src("func (x) => return x end");
        assert!(matches!(stmt, Stmt::LambdaDecl(_, _)));
    }

    #[test]
    fn parses_array_init() {
        let stmt = parse_src("a := array(3, 0)");
        match stmt {
            Stmt::Assign(_, Expr::ArrayInit(size, Some(init))) => {
                assert_eq!(*size, Expr::IntLit(3));
                assert_eq!(*init, Expr::IntLit(0));
            }
            other => panic!("unexpected parse: {other:?}"),
        }
    }

    #[test]
    fn parses_for_loop() {
        let stmt = parse_src("for (i := 1; i <= 5; i := i + 1) do s := s + i end");
        assert!(matches!(stmt, Stmt::For(Some(_), Some(_), Some(_), _)));
    }

    #[test]
    fn rejects_malformed_program() {
        let tokens = tokenize("x := := 1").unwrap();
        assert!(parse(&tokens).is_err());
    }
}
