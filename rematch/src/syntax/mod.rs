/*!
Pattern syntax support: the grammar and the recursive-descent parser that
compiles a pattern into an [`Nfa`](crate::nfa::Nfa).

Supported syntax:

```text
DOT       ::= '.'
OPERATOR  ::= '*' | '+' | '?'
SPECIAL   ::= DOT | OPERATOR | '(' | ')' | '[' | ']' | '^' | '{' | '|' | '}'
ESCAPE    ::= '\' (SPECIAL | '-')
CHAR      ::= ESCAPE | (printable - SPECIAL)
ELEMENT   ::= (printable - ']') | ('\' ']')
Range     ::= ELEMENT | ELEMENT '-' ELEMENT
Set       ::= '^'? Range+
Atom      ::= CHAR | DOT | '(' Expr ')' | '[' Set ']'
Factor    ::= Atom OPERATOR?
Term      ::= Factor Term?
Expr      ::= Term ('|' Expr)?
```

where `printable` is the inclusive byte range `0x20..=0x7E`. There is no
Unicode support; any other byte in a pattern is rejected. `{` and `}` are
reserved: they are special, cannot appear as plain characters and have no
operator meaning, so they only ever show up escaped.

Inside a class, `-` is literal unless it sits between two elements (decided
with two bytes of lookahead), and `]` can only be written as `\]`. A
negated class matches per range: `[^a-c]` accepts any printable byte
outside `a..=c`, and a multi-range negated class accepts a byte that
avoids *any one* of its ranges.

The parser produces, for every accepted production, an NFA fragment: a
`(start, end)` pair of state handles whose `end` is a `Match` placeholder.
Composing fragments rewrites the placeholder in place, so the whole
construction allocates a small fixed number of states per operator and
never walks what it already built.
*/

use crate::nfa::{BuildError, Builder, ErrorKind, Nfa, State, StateId};

/// The default limit on group nesting depth.
pub const DEFAULT_NEST_LIMIT: u32 = 250;

/// Parse the given pattern using the default configuration and compile it
/// into an NFA.
///
/// # Example
///
/// ```
/// use rematch::{nfa::ErrorKind, syntax};
///
/// assert!(syntax::parse("h(e|a)*llo*").is_ok());
///
/// let err = syntax::parse("h(e|a*llo*").unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::ExpectedCloseParen);
/// assert_eq!(err.offset(), 10);
/// ```
pub fn parse(pattern: &str) -> Result<Nfa, BuildError> {
    Parser::new(pattern, DEFAULT_NEST_LIMIT, None).parse()
}

fn is_special(byte: u8) -> bool {
    matches!(
        byte,
        b'.' | b'*' | b'+' | b'?' | b'(' | b')' | b'[' | b']' | b'^' | b'{' | b'|' | b'}'
    )
}

fn is_printable(byte: u8) -> bool {
    (0x20..=0x7E).contains(&byte)
}

/// A read cursor over the pattern bytes.
///
/// `peek` returns 0 once the input is exhausted, which doubles as the
/// end-of-pattern marker; 0 is not printable, so no production ever
/// consumes it.
struct Cursor<'p> {
    bytes: &'p [u8],
    pos: usize,
}

impl<'p> Cursor<'p> {
    fn new(pattern: &'p str) -> Cursor<'p> {
        Cursor { bytes: pattern.as_bytes(), pos: 0 }
    }

    /// The byte at the cursor, or 0 at the end.
    fn peek(&self) -> u8 {
        self.bytes.get(self.pos).copied().unwrap_or(0)
    }

    /// The byte one past the cursor, or 0. Needed to tell a range `a-z`
    /// from a literal `-` before `]`.
    fn peek_ahead(&self) -> u8 {
        self.bytes.get(self.pos + 1).copied().unwrap_or(0)
    }

    /// Return the current byte and advance past it.
    fn bump(&mut self) -> u8 {
        let byte = self.peek();
        if self.pos < self.bytes.len() {
            self.pos += 1;
        }
        byte
    }

    /// One past the last consumed byte.
    fn offset(&self) -> usize {
        self.pos
    }
}

/// An NFA fragment under construction: one entry state and one exit state.
///
/// The exit state always holds a `Match` placeholder until a composition
/// operator rewrites it to chain onto a successor. A fragment is *trivial*
/// when its start is a `Range` pointing directly at its end; composition
/// then skips the placeholder hop entirely.
#[derive(Clone, Copy, Debug)]
struct ThompsonRef {
    start: StateId,
    end: StateId,
}

pub(crate) struct Parser<'p> {
    pattern: &'p str,
    cursor: Cursor<'p>,
    builder: Builder,
    nest_limit: u32,
    depth: u32,
}

impl<'p> Parser<'p> {
    pub(crate) fn new(pattern: &'p str, nest_limit: u32, size_limit: Option<usize>) -> Parser<'p> {
        Parser {
            pattern,
            cursor: Cursor::new(pattern),
            builder: Builder::new(size_limit),
            nest_limit,
            depth: 0,
        }
    }

    /// Run the `Expr` production over the whole pattern.
    ///
    /// On success the fragment's exit state is the unique reachable `Match`
    /// state and the final cursor offset is recorded on the NFA. A byte
    /// that cannot continue any production (an unbalanced `)` at the top
    /// level) ends parsing early with success and a partial offset rather
    /// than an error; callers can compare
    /// [`parsed_len`](crate::nfa::Nfa::parsed_len) against the pattern
    /// length to detect it.
    pub(crate) fn parse(mut self) -> Result<Nfa, BuildError> {
        let expr = self.parse_expr()?;
        let offset = self.cursor.offset();
        Ok(self.builder.finish(expr.start, self.pattern, offset))
    }

    fn error(&self, kind: ErrorKind) -> BuildError {
        BuildError::new(kind, self.cursor.offset())
    }

    fn push(&mut self, state: State) -> Result<StateId, BuildError> {
        let offset = self.cursor.offset();
        self.builder
            .push(state)
            .map_err(|kind| BuildError::new(kind, offset))
    }

    /// `Expr ::= Term ('|' Expr)?`, with the right recursion flattened into
    /// a loop and a right-to-left fold so that alternation stays
    /// right-associative without growing the call stack per `|`.
    fn parse_expr(&mut self) -> Result<ThompsonRef, BuildError> {
        let mut terms = vec![self.parse_term()?];
        while self.cursor.peek() == b'|' {
            self.cursor.bump();
            terms.push(self.parse_term()?);
        }
        let mut expr = terms.pop().expect("at least one term");
        while let Some(term) = terms.pop() {
            expr = self.c_alt(term, expr)?;
        }
        Ok(expr)
    }

    /// `Term ::= Factor Term?`, flattened like `parse_expr`. A factor
    /// follows whenever the next byte is not one of the three bytes that
    /// can legally follow a term.
    fn parse_term(&mut self) -> Result<ThompsonRef, BuildError> {
        let mut factors = vec![self.parse_factor()?];
        loop {
            match self.cursor.peek() {
                0 | b'|' | b')' => break,
                _ => factors.push(self.parse_factor()?),
            }
        }
        let mut term = factors.pop().expect("at least one factor");
        while let Some(factor) = factors.pop() {
            term = self.c_cat(factor, term);
        }
        Ok(term)
    }

    /// `Factor ::= Atom OPERATOR?`
    fn parse_factor(&mut self) -> Result<ThompsonRef, BuildError> {
        let atom = self.parse_atom()?;
        match self.cursor.peek() {
            b'*' => {
                self.cursor.bump();
                self.c_star(atom)
            }
            b'+' => {
                self.cursor.bump();
                self.c_plus(atom)
            }
            b'?' => {
                self.cursor.bump();
                self.c_question(atom)
            }
            _ => Ok(atom),
        }
    }

    /// `Atom ::= CHAR | DOT | '(' Expr ')' | '[' Set ']'`
    fn parse_atom(&mut self) -> Result<ThompsonRef, BuildError> {
        match self.cursor.peek() {
            0 => Err(self.error(ErrorKind::UnexpectedEof)),
            b'(' => {
                self.cursor.bump();
                self.depth += 1;
                if self.depth > self.nest_limit {
                    return Err(self.error(ErrorKind::ExceededNestLimit));
                }
                let expr = self.parse_expr()?;
                self.depth -= 1;
                if self.cursor.peek() != b')' {
                    return Err(self.error(ErrorKind::ExpectedCloseParen));
                }
                self.cursor.bump();
                Ok(expr)
            }
            b'[' => {
                self.cursor.bump();
                self.parse_set()
            }
            b'.' => {
                self.cursor.bump();
                self.c_range(0x20, 0x7E)
            }
            b'\\' => {
                self.cursor.bump();
                match self.cursor.peek() {
                    0 => Err(self.error(ErrorKind::UnexpectedEof)),
                    byte if is_special(byte) || byte == b'-' => {
                        self.cursor.bump();
                        self.c_range(byte, byte)
                    }
                    _ => Err(self.error(ErrorKind::ExpectedSpecial)),
                }
            }
            byte if is_special(byte) => Err(self.error(ErrorKind::UnexpectedSpecial)),
            byte if !is_printable(byte) => Err(self.error(ErrorKind::ExpectedChar)),
            byte => {
                self.cursor.bump();
                self.c_range(byte, byte)
            }
        }
    }

    /// `Set ::= '^'? Range+`, with the opening `[` already consumed.
    /// Ranges are compiled one fragment each and joined by alternation.
    fn parse_set(&mut self) -> Result<ThompsonRef, BuildError> {
        let negated = if self.cursor.peek() == b'^' {
            self.cursor.bump();
            true
        } else {
            false
        };
        let mut set = self.parse_set_range(negated)?;
        while self.cursor.peek() != b']' {
            let range = self.parse_set_range(negated)?;
            set = self.c_alt(set, range)?;
        }
        self.cursor.bump();
        Ok(set)
    }

    /// `Range ::= ELEMENT | ELEMENT '-' ELEMENT`
    fn parse_set_range(&mut self, negated: bool) -> Result<ThompsonRef, BuildError> {
        let lo = self.parse_element()?;
        let hi = if self.cursor.peek() == b'-'
            && self.cursor.peek_ahead() != b']'
            && self.cursor.peek_ahead() != 0
        {
            self.cursor.bump();
            let hi = self.parse_element()?;
            if hi < lo {
                return Err(self.error(ErrorKind::UnorderedRange));
            }
            hi
        } else {
            lo
        };
        if negated {
            self.c_negated_range(lo, hi)
        } else {
            self.c_range(lo, hi)
        }
    }

    fn parse_element(&mut self) -> Result<u8, BuildError> {
        match self.cursor.peek() {
            0 => Err(self.error(ErrorKind::UnexpectedEof)),
            b']' => Err(self.error(ErrorKind::UnexpectedSpecial)),
            b'\\' => {
                self.cursor.bump();
                if self.cursor.peek() == b']' {
                    self.cursor.bump();
                    Ok(b']')
                } else {
                    Err(self.error(ErrorKind::ExpectedCloseBracket))
                }
            }
            byte if !is_printable(byte) => Err(self.error(ErrorKind::ExpectedElement)),
            byte => {
                self.cursor.bump();
                Ok(byte)
            }
        }
    }

    /// One byte in `lo..=hi`: `start = Range -> end`.
    fn c_range(&mut self, lo: u8, hi: u8) -> Result<ThompsonRef, BuildError> {
        let end = self.push(State::Match)?;
        let start = self.push(State::Range { lo, hi, out: Some(end) })?;
        Ok(ThompsonRef { start, end })
    }

    /// Any printable byte outside `lo..=hi`: a split over the two ranges on
    /// either side, converging on one shared exit. A side that would be
    /// empty (`lo` at 0x20 or `hi` at 0x7E) compiles to an empty range that
    /// can never be taken.
    fn c_negated_range(&mut self, lo: u8, hi: u8) -> Result<ThompsonRef, BuildError> {
        let end = self.push(State::Match)?;
        let below = self.push(State::Range { lo: 0x20, hi: lo - 1, out: Some(end) })?;
        let above = self.push(State::Range { lo: hi + 1, hi: 0x7E, out: Some(end) })?;
        let start = self.push(State::Split { out1: Some(below), out2: Some(above) })?;
        Ok(ThompsonRef { start, end })
    }

    fn is_trivial(&self, f: ThompsonRef) -> bool {
        matches!(
            *self.builder.state(f.start),
            State::Range { out: Some(out), .. } if out == f.end
        )
    }

    /// Point a trivial fragment's range directly at `to`, orphaning its
    /// placeholder exit.
    fn redirect_trivial(&mut self, f: ThompsonRef, to: StateId) {
        if let State::Range { lo, hi, .. } = *self.builder.state(f.start) {
            self.builder.set(f.start, State::Range { lo, hi, out: Some(to) });
        }
    }

    /// `a b`: chain `a`'s exit onto `b`. Allocates nothing; a trivial `a`
    /// skips the epsilon hop through its placeholder.
    fn c_cat(&mut self, a: ThompsonRef, b: ThompsonRef) -> ThompsonRef {
        if self.is_trivial(a) {
            self.redirect_trivial(a, b.start);
        } else {
            self.builder
                .set(a.end, State::Split { out1: Some(b.start), out2: None });
        }
        ThompsonRef { start: a.start, end: b.end }
    }

    /// `a | b`: a fresh split over both entries. A trivial operand is wired
    /// straight to the other operand's exit instead of allocating a shared
    /// one.
    fn c_alt(&mut self, a: ThompsonRef, b: ThompsonRef) -> Result<ThompsonRef, BuildError> {
        let start = self.push(State::Split { out1: Some(a.start), out2: Some(b.start) })?;
        if self.is_trivial(a) {
            self.redirect_trivial(a, b.end);
            return Ok(ThompsonRef { start, end: b.end });
        }
        if self.is_trivial(b) {
            self.redirect_trivial(b, a.end);
            return Ok(ThompsonRef { start, end: a.end });
        }
        let end = self.push(State::Match)?;
        self.builder
            .set(a.end, State::Split { out1: Some(end), out2: None });
        self.builder
            .set(b.end, State::Split { out1: Some(end), out2: None });
        Ok(ThompsonRef { start, end })
    }

    /// `a*`: the exit loops back to the entry or leaves; the new entry may
    /// skip `a` entirely.
    fn c_star(&mut self, f: ThompsonRef) -> Result<ThompsonRef, BuildError> {
        let end = self.push(State::Match)?;
        let start = self.push(State::Split { out1: Some(f.start), out2: Some(end) })?;
        self.builder
            .set(f.end, State::Split { out1: Some(f.start), out2: Some(end) });
        Ok(ThompsonRef { start, end })
    }

    /// `a+`: like `a*` but entry goes through `a` at least once.
    fn c_plus(&mut self, f: ThompsonRef) -> Result<ThompsonRef, BuildError> {
        let end = self.push(State::Match)?;
        self.builder
            .set(f.end, State::Split { out1: Some(f.start), out2: Some(end) });
        Ok(ThompsonRef { start: f.start, end })
    }

    /// `a?`: a split that either enters `a` or jumps to its exit.
    fn c_question(&mut self, f: ThompsonRef) -> Result<ThompsonRef, BuildError> {
        let start = self.push(State::Split { out1: Some(f.start), out2: Some(f.end) })?;
        Ok(ThompsonRef { start, end: f.end })
    }
}
