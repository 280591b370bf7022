// ABOUTME: Strips balanced <* ... *> comment regions out of a token stream

use crate::error::TinyError;
use crate::token::{Token, TokenKind};

/// Removes every token that falls inside a balanced `<* ... *>` region.
///
/// Unbalanced delimiters are a fatal `CommentError`. Regions are allowed to
/// appear textually nested (`<* <* *> *>`), but nesting carries no semantic
/// meaning: once the outermost pair is found, everything inside it
/// (including further `<*`/`*>` pairs) is dropped as one unit.
pub fn strip_comments(tokens: Vec<Token>) -> Result<Vec<Token>, TinyError> {
    let mut stack: Vec<usize> = Vec::new();
    let mut pairs: Vec<(usize, usize)> = Vec::new();

    for tok in &tokens {
        match tok.kind {
            TokenKind::BeginComment => stack.push(tok.index),
            TokenKind::EndComment => match stack.pop() {
                Some(begin) => pairs.push((begin, tok.index)),
                None => {
                    return Err(TinyError::CommentError {
                        message: "unbalanced comment delimiter: stray `*>`".to_string(),
                    })
                }
            },
            _ => {}
        }
    }
    if !stack.is_empty() {
        return Err(TinyError::CommentError {
            message: "unbalanced comment delimiter: unterminated `<*`".to_string(),
        });
    }

    pairs.sort_by(|a, b| b.0.cmp(&a.0));
    let mut retained: Vec<(usize, usize)> = Vec::new();
    for (begin, end) in pairs {
        let nested_in_retained = retained
            .iter()
            .any(|&(rb, re)| begin > rb && end < re);
        if !nested_in_retained {
            retained.push((begin, end));
        }
    }

    Ok(tokens
        .into_iter()
        .filter(|t| {
            !retained
                .iter()
                .any(|&(b, e)| t.index >= b && t.index <= e)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn lexemes(src: &str) -> Vec<String> {
        let toks = tokenize(src).unwrap();
        strip_comments(toks)
            .unwrap()
            .into_iter()
            .map(|t| t.lexeme)
            .collect()
    }

    #[test]
    fn strips_simple_comment() {
        assert_eq!(lexemes("x := 1 <* comment *> + 2"), vec!["x", ":=", "1", "+", "2"]);
    }

    #[test]
    fn comment_neutrality() {
        let plain = lexemes("x := 1 + 2");
        let commented = lexemes("<* leading *> x := 1 + 2 <* trailing *>");
        assert_eq!(plain, commented);
    }

    #[test]
    fn textually_nested_comment_dropped_as_one_unit() {
        assert_eq!(lexemes("x := 1 <* outer <* inner *> still outer *> + 2"), vec!["x", ":=", "1", "+", "2"]);
    }

    #[test]
    fn unbalanced_stray_end_is_error() {
        let toks = tokenize("x := 1 *>").unwrap();
        assert!(strip_comments(toks).is_err());
    }

    #[test]
    fn unterminated_begin_is_error() {
        let toks = tokenize("x := 1 <* oops").unwrap();
        assert!(strip_comments(toks).is_err());
    }
}
