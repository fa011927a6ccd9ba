//! Tokenizer for the production section of a grammar file.
//!
//! Lower-case identifiers are terminals, capitalized identifiers are
//! non-terminals. Punctuation stands for the terminal named in [`SYM_NAMES`],
//! so `Expr -> Expr + Term` refers to a terminal declared as `plus`.

use anyhow::{Result, bail};
use logos::Logos;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// `label:` in front of a production.
    Label(String),
    NonTerm(String),
    Term(String),
    /// `Head:label`, naming a production in a directive.
    ProdRef(String),
    /// `->`
    Prod,
    LineFeed,
    Start,
    ShiftOn,
    ReduceOn,
}

#[derive(Logos, Debug, PartialEq)]
#[logos(skip r"[ \t\f\r]+")]
enum LogosToken {
    #[regex(r"\n")]
    LineFeed,

    #[regex(r"--[^\n]*")]
    Comment,

    #[token("->")]
    Prod,

    #[regex(r"%[a-z_]+")]
    Directive,

    #[regex(r"[a-z][a-zA-Z0-9_]*:")]
    Label,

    #[regex(r"[A-Z][a-zA-Z0-9_]*:[a-zA-Z0-9_]+")]
    ProdRef,

    #[regex(r"[a-z][a-zA-Z0-9_]*")]
    Atom,

    #[regex(r"[A-Z][a-zA-Z0-9_]*")]
    Var,

    #[regex(r###"[-~`!@#$%^&*+=|\\<>?/;\(\)\[\]{},\.'":]"###)]
    Sym,
}

/// Terminal names that punctuation in production bodies stands for.
pub const SYM_NAMES: &[(char, &str)] = &[
    ('.', "dot"),
    ('-', "minus"),
    ('~', "tilde"),
    ('`', "backtick"),
    ('!', "exclamation"),
    ('@', "at"),
    ('#', "hash"),
    ('$', "dollar"),
    ('%', "percent"),
    ('^', "caret"),
    ('&', "ampersand"),
    ('*', "asterisk"),
    ('+', "plus"),
    ('=', "equals"),
    ('|', "pipe"),
    ('\\', "backslash"),
    ('<', "lessThan"),
    ('>', "greaterThan"),
    ('?', "question"),
    ('/', "slash"),
    (';', "semicolon"),
    ('(', "leftParen"),
    (')', "rightParen"),
    ('[', "leftBrack"),
    (']', "rightBrack"),
    ('{', "leftBrace"),
    ('}', "rightBrace"),
    (',', "comma"),
    ('\'', "singleQuote"),
    ('"', "doubleQuote"),
    (':', "colon"),
];

fn sym_name(c: char) -> Option<&'static str> {
    SYM_NAMES.iter().find(|(s, _)| *s == c).map(|(_, n)| *n)
}

/// Tokenizes a production section. `first_line` is the 1-based number of
/// its first line, used in error messages.
pub(crate) fn tokenize(input: &str, first_line: usize) -> Result<Vec<Token>> {
    let mut lex = LogosToken::lexer(input);
    let mut line_no = first_line;
    let mut out = Vec::new();
    while let Some(kind) = lex.next() {
        let slice = lex.slice();
        let token = match kind {
            Ok(LogosToken::LineFeed) => {
                line_no += 1;
                Token::LineFeed
            }
            Ok(LogosToken::Comment) => continue,
            Ok(LogosToken::Prod) => Token::Prod,
            Ok(LogosToken::Directive) => match slice {
                "%start" => Token::Start,
                "%shift_on" => Token::ShiftOn,
                "%reduce_on" => Token::ReduceOn,
                "%nl" => Token::Term("$nl".into()),
                "%nonl" => Token::Term("$nonl".into()),
                _ => bail!("Unknown directive {:?} at line {}", slice, line_no),
            },
            Ok(LogosToken::Label) => Token::Label(slice[..slice.len() - 1].to_string()),
            Ok(LogosToken::ProdRef) => Token::ProdRef(slice.to_string()),
            Ok(LogosToken::Atom) => Token::Term(slice.to_string()),
            Ok(LogosToken::Var) => Token::NonTerm(slice.to_string()),
            Ok(LogosToken::Sym) => match slice.chars().next().and_then(sym_name) {
                Some(name) => Token::Term(name.to_string()),
                None => bail!("Unexpected {:?} at line {}", slice, line_no),
            },
            Err(()) => bail!("Unexpected {:?} at line {}", slice, line_no),
        };
        out.push(token);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_terms() {
        let input = "\n\nadd: Expr -> Expr + term x123 -- hello\n%shift_on Stmt:if else\n";
        let toks = tokenize(input, 1).unwrap();
        assert_eq!(
            toks,
            vec![
                Token::LineFeed,
                Token::LineFeed,
                Token::Label("add".into()),
                Token::NonTerm("Expr".into()),
                Token::Prod,
                Token::NonTerm("Expr".into()),
                Token::Term("plus".into()),
                Token::Term("term".into()),
                Token::Term("x123".into()),
                Token::LineFeed,
                Token::ShiftOn,
                Token::ProdRef("Stmt:if".into()),
                Token::Term("else".into()),
                Token::LineFeed,
            ]
        );
    }

    #[test]
    fn markers_and_errors() {
        let toks = tokenize("S -> a %nl", 1).unwrap();
        assert_eq!(toks.last(), Some(&Token::Term("$nl".into())));
        let err = tokenize("\n%bogus", 10).unwrap_err();
        assert!(err.to_string().contains("line 11"));
    }
}
