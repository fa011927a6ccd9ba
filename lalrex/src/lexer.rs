//! Table-driven scanner over a [`CharBuffer`].

use crate::buffer::CharBuffer;
use crate::cursor::{LineCounter, Position, is_line_break};
use crate::error::{ParserError, ParserErrorKind};
use lalrex_gen::{Grammar, LexicalAutomaton, MatchOutcome, SymbolId};
use smartstring::alias::String;

/// A significant lexeme handed to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub symbol: SymbolId,
    pub text: String,
    /// Absolute offset in UTF-16 code units.
    pub position: usize,
    /// Trivia skipped before this token contained a line break.
    pub line_break_before: bool,
}

impl Token {
    pub fn is_end(&self) -> bool {
        self.symbol == Grammar::END
    }
}

const LEXEME_PREVIEW: usize = 32;

/// Runs a [`LexicalAutomaton`] over the pending part of a buffer.
#[derive(Debug)]
pub struct Scanner<'g> {
    automaton: &'g LexicalAutomaton,
    /// Automaton terminal index to grammar symbol.
    terminals: &'g [SymbolId],
    trivia: Vec<bool>,
    lines: Option<LineCounter>,
    line_break: bool,
    /// Trivia lexemes skipped so far.
    trivia_skipped: usize,
}

impl<'g> Scanner<'g> {
    pub fn new(
        grammar: &Grammar,
        automaton: &'g LexicalAutomaton,
        terminals: &'g [SymbolId],
        track_lines: bool,
    ) -> Self {
        let trivia = terminals
            .iter()
            .map(|t| grammar.symbol_info(*t).options().trivia)
            .collect();
        Self {
            automaton,
            terminals,
            trivia,
            lines: track_lines.then(LineCounter::new),
            line_break: false,
            trivia_skipped: 0,
        }
    }

    pub fn trivia_skipped(&self) -> usize {
        self.trivia_skipped
    }

    /// Line and column of an absolute offset, when lines are tracked.
    pub fn location(&self, pos: usize) -> Option<Position> {
        self.lines.as_ref().and_then(|l| l.location(pos))
    }

    /// Scans the next significant token. `Ok(None)` means the buffer must
    /// be refilled first. At the end of input an end token is returned.
    pub fn scan(&mut self, buf: &mut CharBuffer) -> Result<Option<Token>, ParserError> {
        loop {
            let pending = buf.pending();
            if pending.is_empty() {
                if !buf.at_end() {
                    return Ok(None);
                }
                return Ok(Some(Token {
                    symbol: Grammar::END,
                    text: String::new(),
                    position: buf.position(),
                    line_break_before: std::mem::take(&mut self.line_break),
                }));
            }
            let (terminal, len) = match self.automaton.longest_match(pending, buf.at_end()) {
                MatchOutcome::NeedMore => return Ok(None),
                MatchOutcome::NoMatch => {
                    let end = pending
                        .iter()
                        .take(LEXEME_PREVIEW)
                        .position(|u| is_line_break(*u))
                        .unwrap_or(pending.len().min(LEXEME_PREVIEW));
                    return Err(ParserError {
                        kind: ParserErrorKind::UnrecognizedInput,
                        position: buf.position(),
                        location: self.location(buf.position()),
                        lexeme: std::string::String::from_utf16_lossy(&pending[..end]).into(),
                        stack: String::new(),
                    });
                }
                MatchOutcome::Matched { terminal, len } => (terminal, len),
            };
            let position = buf.position();
            let units = &pending[..len];
            if let Some(lines) = self.lines.as_mut() {
                lines.observe(position, units);
                lines.discard_before(position);
            }
            if self.trivia[terminal] {
                self.trivia_skipped += 1;
                if units.iter().any(|u| is_line_break(*u)) {
                    self.line_break = true;
                }
                buf.consume(len);
                continue;
            }
            let token = Token {
                symbol: self.terminals[terminal],
                text: std::string::String::from_utf16_lossy(units).into(),
                position,
                line_break_before: std::mem::take(&mut self.line_break),
            };
            log::trace!("scanned {:?} {:?} at {}", token.symbol, token.text, position);
            buf.consume(len);
            return Ok(Some(token));
        }
    }
}

/// Symbols of the automaton's terminals, in automaton order.
pub(crate) fn terminal_symbols(grammar: &Grammar) -> Vec<SymbolId> {
    grammar
        .terminals()
        .filter(|s| s.pattern().is_some())
        .map(|s| s.id())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StrSource;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn grammar() -> Grammar {
        let mut g = Grammar::new();
        g.create_trivia("ws", "[ \\t\\r\\n\\u2028]+").unwrap();
        g.create_trivia("comment", "#[^\\n]*").unwrap();
        g.create_terminal("ident", "[a-z]+").unwrap();
        g.create_terminal("num", "[0-9]+").unwrap();
        g.create_terminal("let", "let").unwrap();
        g
    }

    fn scan_all(g: &Grammar, text: &str, capacity: usize) -> Result<Vec<Token>, ParserError> {
        let lexer = g.create_lexical_automaton();
        let terms = terminal_symbols(g);
        let mut scanner = Scanner::new(g, &lexer, &terms, true);
        let mut src = StrSource::new(text);
        let mut buf = CharBuffer::with_capacity(capacity);
        let mut out = Vec::new();
        loop {
            match scanner.scan(&mut buf)? {
                None => {
                    buf.fill(&mut src).unwrap();
                }
                Some(t) => {
                    let end = t.is_end();
                    out.push(t);
                    if end {
                        return Ok(out);
                    }
                }
            }
        }
    }

    #[test]
    fn skips_trivia_and_flags_line_breaks() {
        init_logger();
        let g = grammar();
        let toks = scan_all(&g, "let x # note\n  42", 64).unwrap();
        let names: Vec<&str> = toks.iter().map(|t| g.name(t.symbol)).collect();
        // ident and let tie on "let"; the earlier declaration wins.
        assert_eq!(names, ["ident", "ident", "num", "$end"]);
        assert_eq!(toks[2].text.as_str(), "42");
        assert_eq!(toks[2].position, 15);
        assert!(toks[2].line_break_before);
        assert!(!toks[1].line_break_before);
        assert!(!toks[3].line_break_before);
    }

    #[test]
    fn locations_agree_with_line_break_flag() {
        init_logger();
        let g = grammar();
        for (text, dollar) in [("ab\r cd $x", 7), ("ab\r\n cd $x", 8), ("ab\u{2028} cd $x", 7)] {
            let err = scan_all(&g, text, 64).unwrap_err();
            assert_eq!(err.position, dollar, "{text:?}");
            assert_eq!(err.location, Some(Position::new(2, 5)), "{text:?}");
        }
        let toks = scan_all(&g, "ab\r cd", 64).unwrap();
        assert!(toks[1].line_break_before);
        // One unit at a time the `\r\n` pair still counts once.
        let err = scan_all(&g, "ab\r\n\r\n cd $x", 1).unwrap_err();
        assert_eq!(err.location, Some(Position::new(3, 5)));
    }

    #[test]
    fn chunking_does_not_change_tokens() {
        init_logger();
        let g = grammar();
        let text = "alpha 12\nbeta  # c\n\n 7 gamma";
        let whole = scan_all(&g, text, text.len()).unwrap();
        for cap in 1..6 {
            assert_eq!(scan_all(&g, text, cap).unwrap(), whole, "capacity {cap}");
        }
    }

    #[test]
    fn reports_unrecognized_input_with_location() {
        init_logger();
        let g = grammar();
        let err = scan_all(&g, "ab\n cd $x y", 64).unwrap_err();
        assert!(matches!(err.kind, ParserErrorKind::UnrecognizedInput));
        assert_eq!(err.position, 7);
        assert_eq!(err.location, Some(Position::new(2, 5)));
        assert_eq!(err.lexeme.as_str(), "$x y");
    }
}
