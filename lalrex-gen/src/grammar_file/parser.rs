use super::lexer::Token;
use chumsky::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Symbol {
    Term(String),
    NonTerm(String),
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Term(s) | Symbol::NonTerm(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Item {
    Production {
        label: Option<String>,
        head: String,
        body: Vec<Symbol>,
    },
    Start(String),
    ShiftOn {
        production: String,
        symbols: Vec<String>,
    },
    ReduceOn {
        production: String,
        symbols: Vec<String>,
    },
}

pub(crate) fn parser<'a>() -> impl Parser<'a, &'a [Token], Vec<Item>, extra::Err<Rich<'a, Token>>> {
    let symbol = select! {
        Token::Term(t) => Symbol::Term(t),
        Token::NonTerm(n) => Symbol::NonTerm(n),
    }
    .labelled("symbol");

    let body = symbol.repeated().collect::<Vec<_>>();

    let head = select! {
        Token::NonTerm(n) => n,
    }
    .labelled("head");

    let term = select! {
        Token::Term(t) => t,
    }
    .labelled("terminal");

    let prod_ref = select! {
        Token::ProdRef(r) => r,
    }
    .labelled("production reference");

    let prod_kw = just(Token::Prod).labelled("->");
    let lf = just(Token::LineFeed).labelled("line feed");

    let production = select! { Token::Label(l) => l }
        .or_not()
        .then(head.clone())
        .then_ignore(prod_kw)
        .then(body)
        .then_ignore(lf.clone())
        .map(|((label, head), body)| Some(Item::Production { label, head, body }));

    let start = just(Token::Start)
        .ignore_then(head)
        .then_ignore(lf.clone())
        .map(|h| Some(Item::Start(h)));

    let overrides = term.repeated().at_least(1).collect::<Vec<_>>();

    let shift_on = just(Token::ShiftOn)
        .ignore_then(prod_ref.clone())
        .then(overrides.clone())
        .then_ignore(lf.clone())
        .map(|(production, symbols)| Some(Item::ShiftOn { production, symbols }));

    let reduce_on = just(Token::ReduceOn)
        .ignore_then(prod_ref)
        .then(overrides)
        .then_ignore(lf.clone())
        .map(|(production, symbols)| Some(Item::ReduceOn { production, symbols }));

    let empty_line = lf.map(|_| None::<Item>);

    choice((production, start, shift_on, reduce_on, empty_line))
        .repeated()
        .collect::<Vec<_>>()
        .map(|items| items.into_iter().flatten().collect::<Vec<_>>())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> Token {
        Token::Term(s.into())
    }

    fn n(s: &str) -> Token {
        Token::NonTerm(s.into())
    }

    #[test]
    fn single_production() {
        let tokens = vec![
            Token::Label("add".into()),
            n("Expr"),
            Token::Prod,
            n("Expr"),
            t("plus"),
            n("Term"),
            Token::LineFeed,
        ];
        let items = parser().parse(&tokens).into_result().unwrap();
        assert_eq!(
            items,
            vec![Item::Production {
                label: Some("add".into()),
                head: "Expr".into(),
                body: vec![
                    Symbol::NonTerm("Expr".into()),
                    Symbol::Term("plus".into()),
                    Symbol::NonTerm("Term".into()),
                ],
            }]
        );
    }

    #[test]
    fn directives_and_empty_lines() {
        let tokens = vec![
            Token::LineFeed,
            Token::Start,
            n("S"),
            Token::LineFeed,
            n("S"),
            Token::Prod,
            Token::LineFeed,
            Token::ShiftOn,
            Token::ProdRef("S:if".into()),
            t("else"),
            t("semicolon"),
            Token::LineFeed,
        ];
        let items = parser().parse(&tokens).into_result().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], Item::Start("S".into()));
        assert!(matches!(&items[1], Item::Production { label: None, body, .. } if body.is_empty()));
        assert!(matches!(&items[2], Item::ShiftOn { symbols, .. } if symbols.len() == 2));
    }

    #[test]
    fn rejects_missing_arrow() {
        let tokens = vec![n("S"), t("a"), Token::LineFeed];
        assert!(parser().parse(&tokens).into_result().is_err());
    }
}
