//! Table-driven LALR(1) interpreter.

use crate::bindings::{Bindings, Values};
use crate::buffer::CharBuffer;
use crate::compiled::CompiledGrammar;
use crate::error::{ParserError, ParserErrorKind};
use crate::lexer::{Scanner, Token};
use crate::source::{AsyncUtf8Reader, CharSource, StrSource, Utf8Reader};
use lalrex_gen::{Action, Grammar, ProductionId, SymbolId};
use smartstring::alias::String;
use std::io::Read;
use tokio::io::AsyncRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
    /// Initial window size in UTF-16 code units; raised to at least one.
    pub buffer_capacity: usize,
    /// Keep line starts so errors carry a line and column.
    pub track_lines: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            buffer_capacity: 4096,
            track_lines: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserStats {
    /// Significant tokens, including the end of input.
    pub tokens: usize,
    /// Whitespace and comments skipped by the scanner.
    pub trivia: usize,
    pub shifts: usize,
    pub reductions: usize,
    pub buffer_shifts: usize,
}

/// Parses input against a [`CompiledGrammar`], invoking the actions in its
/// [`Bindings`] as tokens complete and productions reduce.
///
/// A parser may run any number of parses, one at a time; [`stats`](Self::stats)
/// describes the most recent one.
pub struct Parser<'g, C, V> {
    compiled: &'g CompiledGrammar,
    bindings: Bindings<'g, C, V>,
    options: ParserOptions,
    stats: ParserStats,
}

impl<'g, C, V> Parser<'g, C, V> {
    pub fn new(compiled: &'g CompiledGrammar, bindings: Bindings<'g, C, V>) -> Self {
        Self::with_options(compiled, bindings, ParserOptions::default())
    }

    pub fn with_options(
        compiled: &'g CompiledGrammar,
        bindings: Bindings<'g, C, V>,
        options: ParserOptions,
    ) -> Self {
        debug_assert!(std::ptr::eq(bindings.grammar(), compiled.grammar()));
        Self {
            compiled,
            bindings,
            options,
            stats: ParserStats::default(),
        }
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    pub fn stats(&self) -> ParserStats {
        self.stats.clone()
    }

    fn run(&self, buf: CharBuffer) -> Run<'_, 'g, C, V> {
        Run {
            compiled: self.compiled,
            bindings: &self.bindings,
            scanner: Scanner::new(
                self.compiled.grammar(),
                self.compiled.lexer(),
                self.compiled.terminals(),
                self.options.track_lines,
            ),
            buf,
            states: vec![0],
            symbols: Vec::new(),
            values: Vec::new(),
            token: None,
            marker_shifted: false,
            stats: ParserStats::default(),
        }
    }

    /// Parses in-memory text in a single window. Returns the value of the
    /// goal symbol.
    pub fn parse_str(&mut self, ctx: &mut C, text: &str) -> Result<Option<V>, ParserError> {
        let buf = CharBuffer::from_units(text.encode_utf16().collect());
        self.drive(ctx, buf, &mut StrSource::new(""))
    }

    /// Parses a blocking stream through a window of
    /// [`buffer_capacity`](ParserOptions::buffer_capacity) units.
    pub fn parse<S: CharSource + ?Sized>(&mut self, ctx: &mut C, src: &mut S) -> Result<Option<V>, ParserError> {
        let buf = CharBuffer::with_capacity(self.options.buffer_capacity);
        self.drive(ctx, buf, src)
    }

    /// Parses UTF-8 from any reader.
    pub fn parse_reader<R: Read>(&mut self, ctx: &mut C, reader: R) -> Result<Option<V>, ParserError> {
        self.parse(ctx, &mut Utf8Reader::new(reader))
    }

    fn drive<S: CharSource + ?Sized>(
        &mut self,
        ctx: &mut C,
        buf: CharBuffer,
        src: &mut S,
    ) -> Result<Option<V>, ParserError> {
        let mut run = self.run(buf);
        let result = loop {
            match run.advance(ctx) {
                Ok(Step::NeedInput) => {
                    if let Err(e) = run.buf.fill(src) {
                        break Err(run.error(ParserErrorKind::Source(e), None));
                    }
                }
                Ok(Step::Accepted(value)) => break Ok(value),
                Err(e) => break Err(e),
            }
        };
        let stats = run.finish();
        self.stats = stats;
        result
    }

    /// Parses an asynchronous stream. Suspends only while waiting for
    /// input; scanning and parsing in between run synchronously.
    pub async fn parse_async<R: AsyncRead + Unpin>(
        &mut self,
        ctx: &mut C,
        src: &mut AsyncUtf8Reader<R>,
    ) -> Result<Option<V>, ParserError> {
        let mut run = self.run(CharBuffer::with_capacity(self.options.buffer_capacity));
        let result = loop {
            match run.advance(ctx) {
                Ok(Step::NeedInput) => {
                    let read = src.read_units(run.buf.prepare_fill()).await;
                    match read {
                        Ok(n) => run.buf.commit(n),
                        Err(e) => break Err(run.error(ParserErrorKind::Source(e), None)),
                    }
                }
                Ok(Step::Accepted(value)) => break Ok(value),
                Err(e) => break Err(e),
            }
        };
        let stats = run.finish();
        self.stats = stats;
        result
    }
}

enum Step<V> {
    NeedInput,
    Accepted(Option<V>),
}

/// State of a single parse.
struct Run<'p, 'g, C, V> {
    compiled: &'g CompiledGrammar,
    bindings: &'p Bindings<'g, C, V>,
    scanner: Scanner<'g>,
    buf: CharBuffer,
    states: Vec<usize>,
    symbols: Vec<SymbolId>,
    values: Vec<Option<V>>,
    /// Token scanned but not yet shifted.
    token: Option<Token>,
    /// A line-break marker was already shifted in front of `token`.
    marker_shifted: bool,
    stats: ParserStats,
}

impl<C, V> Run<'_, '_, C, V> {
    fn grammar(&self) -> &Grammar {
        self.compiled.grammar()
    }

    fn finish(&self) -> ParserStats {
        ParserStats {
            trivia: self.scanner.trivia_skipped(),
            buffer_shifts: self.buf.shifts(),
            ..self.stats.clone()
        }
    }

    fn advance(&mut self, ctx: &mut C) -> Result<Step<V>, ParserError> {
        let table = self.compiled.table();
        loop {
            let token = match self.token.take() {
                Some(t) => t,
                None => match self.scanner.scan(&mut self.buf)? {
                    Some(t) => {
                        self.stats.tokens += 1;
                        t
                    }
                    None => return Ok(Step::NeedInput),
                },
            };
            if log::log_enabled!(log::Level::Trace) {
                self.dump_state(&token);
            }
            let state = self.state();

            if !self.marker_shifted {
                let marker = if token.line_break_before {
                    Grammar::LINE_BREAK
                } else {
                    Grammar::NO_LINE_BREAK
                };
                match table.action(state, marker) {
                    // The marker is shifted only where the token can follow it.
                    Some(Action::Shift(next)) if table.action(next, token.symbol).is_some() => {
                        log::trace!("Shift {} on {}", next, self.grammar().name(marker));
                        self.push(next, marker, None);
                        self.marker_shifted = true;
                        self.token = Some(token);
                        continue;
                    }
                    Some(Action::Reduce(prod)) => {
                        self.reduce(ctx, prod, &token)?;
                        self.token = Some(token);
                        continue;
                    }
                    _ => {}
                }
            }

            match table.action(state, token.symbol) {
                Some(Action::Shift(next)) => {
                    log::trace!("Shift {}", next);
                    let value = self
                        .bindings
                        .token(ctx, token.symbol, &token.text)
                        .map_err(|e| self.error(ParserErrorKind::Handler(e), Some(&token)))?;
                    self.push(next, token.symbol, value);
                    self.marker_shifted = false;
                    self.stats.shifts += 1;
                }
                Some(Action::Reduce(prod)) => {
                    self.reduce(ctx, prod, &token)?;
                    self.token = Some(token);
                }
                Some(Action::Accept) => {
                    log::trace!("Accept");
                    let value = self.values.pop().flatten();
                    return Ok(Step::Accepted(value));
                }
                None => {
                    let what = if token.is_end() {
                        String::from("end of input")
                    } else {
                        String::from(self.grammar().name(token.symbol))
                    };
                    return Err(self.error(ParserErrorKind::UnexpectedToken(what), Some(&token)));
                }
            }
        }
    }

    #[inline]
    fn state(&self) -> usize {
        self.states.last().copied().unwrap_or(0)
    }

    fn push(&mut self, state: usize, symbol: SymbolId, value: Option<V>) {
        self.states.push(state);
        self.symbols.push(symbol);
        self.values.push(value);
    }

    fn reduce(&mut self, ctx: &mut C, prod: ProductionId, token: &Token) -> Result<(), ParserError> {
        let grammar = self.compiled.grammar();
        let table = self.compiled.table();
        let len = table.body(grammar, prod).len();
        log::trace!("Reduce {}", table.production_name(grammar, prod));
        if len > self.values.len() {
            return Err(self.error(
                ParserErrorKind::Internal("parser stack underflow".into()),
                Some(token),
            ));
        }
        let at = self.values.len() - len;
        let values = Values::new(self.values.split_off(at));
        self.symbols.truncate(at);
        self.states.truncate(at + 1);
        let value = self
            .bindings
            .reduce(ctx, prod, values)
            .map_err(|e| self.error(ParserErrorKind::Handler(e), Some(token)))?;
        let head = grammar.production(prod).head();
        let next = table.goto(self.state(), head).ok_or_else(|| {
            self.error(
                ParserErrorKind::Internal(format!("no goto on {}", grammar.name(head)).into()),
                Some(token),
            )
        })?;
        self.push(next, head, value);
        self.stats.reductions += 1;
        Ok(())
    }

    fn stack(&self) -> String {
        let mut out = String::new();
        for (i, sym) in self.symbols.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(self.grammar().name(*sym));
        }
        out
    }

    fn error(&self, kind: ParserErrorKind, token: Option<&Token>) -> ParserError {
        let position = token.map_or(self.buf.position(), |t| t.position);
        ParserError {
            kind,
            position,
            location: self.scanner.location(position),
            lexeme: token.map(|t| t.text.clone()).unwrap_or_default(),
            stack: self.stack(),
        }
    }

    fn dump_state(&self, incoming: &Token) {
        let mut output = String::new();
        for (i, state) in self.states.iter().enumerate() {
            output.push_str(&format!("<{}>  ", state));
            if let Some(sym) = self.symbols.get(i) {
                output.push_str(self.grammar().name(*sym));
                output.push_str("  ");
            }
        }
        log::trace!(
            "{}<-  {}{:?}",
            output,
            self.grammar().name(incoming.symbol),
            incoming.text
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lalrex_gen::DefaultResolver;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    /// Sums of numbers; statements end at a line break or `;`.
    fn statements() -> CompiledGrammar {
        let mut g = Grammar::new();
        g.create_trivia("ws", "[ \\t\\r\\n]+").unwrap();
        g.create_terminal("num", "[0-9]+").unwrap();
        g.create_terminal("plus", "\\+").unwrap();
        g.create_terminal("semi", ";").unwrap();
        let list = g.create_non_terminal("list").unwrap();
        let stmt = g.create_non_terminal("stmt").unwrap();
        let expr = g.create_non_terminal("expr").unwrap();
        g.add_rule(list, "list:more", "list stmt").unwrap();
        g.add_rule(list, "list:one", "stmt").unwrap();
        g.add_rule(stmt, "stmt:semi", "expr semi").unwrap();
        g.add_rule(stmt, "stmt:nl", "expr $nl").unwrap();
        g.add_rule(expr, "expr:add", "expr $nonl plus num").unwrap();
        g.add_rule(expr, "expr:num", "num").unwrap();
        CompiledGrammar::compile_with(g, "list", &DefaultResolver).unwrap()
    }

    fn bindings(g: &CompiledGrammar) -> Bindings<'_, Vec<i64>, i64> {
        Bindings::<Vec<i64>, i64>::new(g.grammar())
            .on_token("num", |_, t| Ok(t.parse()?))
            .unwrap()
            .on_reduce("expr:add", |_, v| Ok(v.take(0)? + v.take(3)?))
            .unwrap()
            .on_reduce("stmt:semi", |out, v| {
                let x = v.take(0)?;
                out.push(x);
                Ok(x)
            })
            .unwrap()
            .on_reduce("stmt:nl", |out, v| {
                let x = v.take(0)?;
                out.push(x);
                Ok(x)
            })
            .unwrap()
    }

    #[test]
    fn line_breaks_terminate_statements() {
        init_logger();
        let g = statements();
        let mut p = Parser::new(&g, bindings(&g));
        let mut out = Vec::new();
        p.parse_str(&mut out, "1 + 2;\n3\n4 + 5 + 6;").unwrap();
        assert_eq!(out, [3, 3, 15]);
        let stats = p.stats();
        assert_eq!(stats.tokens, 12);
        assert_eq!(stats.trivia, 8);
        assert!(stats.reductions > 0);

        // A break before `+` ends the statement, so `+ 2` cannot follow.
        let err = p.parse_str(&mut Vec::new(), "1\n+ 2;").unwrap_err();
        assert!(matches!(err.kind, ParserErrorKind::UnexpectedToken(ref s) if s.as_str() == "plus"));
        assert_eq!(err.location.map(|l| l.line), Some(2));
    }

    #[test]
    fn streaming_matches_in_memory() {
        init_logger();
        let g = statements();
        let text = "10 + 20;\n30 + 40\n  5;";
        let mut p = Parser::new(&g, bindings(&g));
        let mut whole = Vec::new();
        p.parse_str(&mut whole, text).unwrap();
        for cap in [1, 2, 3, 7] {
            let opts = ParserOptions {
                buffer_capacity: cap,
                ..ParserOptions::default()
            };
            let mut p = Parser::with_options(&g, bindings(&g), opts);
            let mut out = Vec::new();
            p.parse(&mut out, &mut StrSource::new(text)).unwrap();
            assert_eq!(out, whole, "capacity {cap}");
            let mut out = Vec::new();
            p.parse_reader(&mut out, text.as_bytes()).unwrap();
            assert_eq!(out, whole, "reader, capacity {cap}");
        }
    }

    #[test]
    fn reports_unexpected_end_and_handler_failure() {
        init_logger();
        let g = statements();
        let mut p = Parser::new(&g, bindings(&g));
        let err = p.parse_str(&mut Vec::new(), "1 +").unwrap_err();
        assert!(matches!(err.kind, ParserErrorKind::UnexpectedToken(ref s) if s.as_str() == "end of input"));
        assert_eq!(err.position, 3);
        assert_eq!(err.stack.as_str(), "expr $nonl plus");

        let err = p
            .parse_str(&mut Vec::new(), "99999999999999999999;")
            .unwrap_err();
        assert!(matches!(err.kind, ParserErrorKind::Handler(_)));
        assert_eq!(err.lexeme.as_str(), "99999999999999999999");
    }

    #[test]
    fn unbound_reduction_passes_first_value() {
        init_logger();
        let g = statements();
        let b = Bindings::new(g.grammar()).on_token("num", |_: &mut (), t| Ok(t.len())).unwrap();
        let mut p = Parser::new(&g, b);
        assert_eq!(p.parse_str(&mut (), "123 + 4;").unwrap(), Some(3));
    }

    #[tokio::test]
    async fn async_parse_matches_sync() {
        init_logger();
        let g = statements();
        let text = "1 + 1\n2 + 2;";
        let opts = ParserOptions {
            buffer_capacity: 2,
            ..ParserOptions::default()
        };
        let mut p = Parser::with_options(&g, bindings(&g), opts);
        let mut out = Vec::new();
        let mut src = AsyncUtf8Reader::new(text.as_bytes());
        p.parse_async(&mut out, &mut src).await.unwrap();
        assert_eq!(out, [2, 4]);
        assert!(p.stats().buffer_shifts > 0);
    }
}
