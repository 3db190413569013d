//! The Parser Frontend Adapter: turns a `RegexSource` into a `RegexAst`,
//! instrumented with `log::trace!` timing around the parse call. The
//! grammar is hand-rolled rather than delegated to an existing AST crate,
//! since supporting look-around and back-references needs node shapes no
//! off-the-shelf regex AST represents.

use std::time::Instant;

use log::trace;

use crate::buffer::CompilationBuffer;
use crate::errors::{RegexError, Result};
use crate::options::RegexOptions;
use crate::source::RegexSource;

use super::{
    AssertionKind, Ast, ClassBracketed, ClassItem, Group, GroupKind, Look, PerlClass, Repetition,
    RepetitionOp, RepetitionRange, RegexAst,
};

/// Adapts a `RegexSource` (after an optional flavor translation performed by
/// the caller, see [`crate::flavor`]) into a `RegexAst`.
pub struct Parser<'a> {
    source: &'a RegexSource,
    options: &'a RegexOptions,
}

impl<'a> Parser<'a> {
    /// Creates a parser for `source`. `buffer` is accepted for symmetry with
    /// the other pipeline stages; this parser does not need scratch storage
    /// ahead of time, so it is unused.
    pub fn new(source: &'a RegexSource, options: &'a RegexOptions, _buffer: &mut CompilationBuffer) -> Self {
        Self { source, options }
    }

    /// Parses the pattern, returning a `RegexAst` or an `Unsupported` error
    /// with a human-readable reason.
    pub fn parse(&self) -> Result<RegexAst> {
        let now = Instant::now();
        let mut state = ParseState::new(self.source.pattern());
        let root = state.parse_alternation()?;
        if !state.at_end() {
            return Err(RegexError::unsupported(format!(
                "unexpected character '{}' at position {}",
                state.peek().unwrap_or_default(),
                state.pos
            )));
        }
        let elapsed = now.elapsed();
        trace!(
            "Parsing pattern '{}' took {} microseconds.",
            self.source.pattern(),
            elapsed.as_micros()
        );
        let mut regex_ast =
            RegexAst::new(root, self.source.flags(), self.options.max_repetition_bound);
        regex_ast.prepare_for_dfa();
        Ok(regex_ast)
    }

    /// Runs the AST-level post-pass. Delegates to
    /// `RegexAst::prepare_for_dfa`, already invoked by `parse()`; exposed
    /// separately so callers holding a `RegexAst` built elsewhere (e.g. in
    /// tests) can re-run it.
    pub fn prepare_for_dfa(ast: &mut RegexAst) {
        ast.prepare_for_dfa();
    }
}

/// The mutable cursor-based recursive-descent parser state.
struct ParseState {
    chars: Vec<char>,
    pos: usize,
    next_capture_group: u32,
}

impl ParseState {
    fn new(pattern: &str) -> Self {
        Self {
            chars: pattern.chars().collect(),
            pos: 0,
            next_capture_group: 1,
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(RegexError::unsupported(format!(
                "expected '{c}' at position {}",
                self.pos
            )))
        }
    }

    /// `alternation := concat ('|' concat)*`
    fn parse_alternation(&mut self) -> Result<Ast> {
        let mut branches = vec![self.parse_concat()?];
        while self.eat('|') {
            branches.push(self.parse_concat()?);
        }
        Ok(if branches.len() == 1 {
            branches.pop().unwrap()
        } else {
            Ast::Alternation(branches)
        })
    }

    /// `concat := repetition*`, stopping at `|`, `)`, or end of input.
    fn parse_concat(&mut self) -> Result<Ast> {
        let mut nodes = Vec::new();
        while let Some(c) = self.peek() {
            if c == '|' || c == ')' {
                break;
            }
            nodes.push(self.parse_repetition()?);
        }
        Ok(match nodes.len() {
            0 => Ast::Empty,
            1 => nodes.pop().unwrap(),
            _ => Ast::Concat(nodes),
        })
    }

    /// `repetition := atom ('?' | '*' | '+' | '{' range '}')? '?'?`
    fn parse_repetition(&mut self) -> Result<Ast> {
        let atom = self.parse_atom()?;
        let op = match self.peek() {
            Some('?') => {
                self.bump();
                Some(RepetitionOp::ZeroOrOne)
            }
            Some('*') => {
                self.bump();
                Some(RepetitionOp::ZeroOrMore)
            }
            Some('+') => {
                self.bump();
                Some(RepetitionOp::OneOrMore)
            }
            Some('{') if self.looks_like_counted_repetition() => {
                Some(RepetitionOp::Range(self.parse_repetition_range()?))
            }
            _ => None,
        };
        let Some(op) = op else { return Ok(atom) };
        let greedy = !self.eat('?');
        Ok(Ast::Repetition(Repetition {
            ast: Box::new(atom),
            op,
            greedy,
        }))
    }

    /// Looks ahead past `{` for `digits`, `digits,`, or `digits,digits`
    /// followed by `}`, without consuming anything. A `{` not shaped like a
    /// counted repetition is treated as a literal brace, matching
    /// ECMAScript's lenient handling of stray braces.
    fn looks_like_counted_repetition(&self) -> bool {
        let mut i = self.pos + 1;
        let mut saw_digit = false;
        while self.chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
            saw_digit = true;
        }
        if !saw_digit {
            return false;
        }
        if self.chars.get(i) == Some(&',') {
            i += 1;
            while self.chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
        }
        self.chars.get(i) == Some(&'}')
    }

    fn parse_repetition_range(&mut self) -> Result<RepetitionRange> {
        self.expect('{')?;
        let m = self.parse_number()?;
        let range = if self.eat(',') {
            if self.peek() == Some('}') {
                RepetitionRange::AtLeast(m)
            } else {
                let n = self.parse_number()?;
                RepetitionRange::Bounded(m, n)
            }
        } else {
            RepetitionRange::Exactly(m)
        };
        self.expect('}')?;
        Ok(range)
    }

    fn parse_number(&mut self) -> Result<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.pos == start {
            return Err(RegexError::unsupported(format!(
                "expected a number at position {}",
                self.pos
            )));
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits
            .parse()
            .map_err(|_| RegexError::unsupported(format!("quantifier bound '{digits}' out of range")))
    }

    /// `atom := group | class | '.' | '^' | '$' | escape | literal`
    fn parse_atom(&mut self) -> Result<Ast> {
        match self.peek() {
            Some('(') => self.parse_group(),
            Some('[') => self.parse_class(),
            Some('.') => {
                self.bump();
                Ok(Ast::Dot)
            }
            Some('^') => {
                self.bump();
                Ok(Ast::Assertion(AssertionKind::StartLine))
            }
            Some('$') => {
                self.bump();
                Ok(Ast::Assertion(AssertionKind::EndLine))
            }
            Some('\\') => self.parse_escape(),
            Some(c) => {
                self.bump();
                Ok(Ast::Literal(c))
            }
            None => Err(RegexError::unsupported("unexpected end of pattern")),
        }
    }

    fn parse_group(&mut self) -> Result<Ast> {
        self.expect('(')?;
        if self.eat('?') {
            if self.eat(':') {
                let inner = self.parse_alternation()?;
                self.expect(')')?;
                return Ok(Ast::Group(Group {
                    kind: GroupKind::NonCapturing,
                    ast: Box::new(inner),
                }));
            }
            if self.eat('=') {
                let inner = self.parse_alternation()?;
                self.expect(')')?;
                return Ok(Ast::Assertion(AssertionKind::Look(Look {
                    behind: false,
                    negate: false,
                    ast: Box::new(inner),
                })));
            }
            if self.eat('!') {
                let inner = self.parse_alternation()?;
                self.expect(')')?;
                return Ok(Ast::Assertion(AssertionKind::Look(Look {
                    behind: false,
                    negate: true,
                    ast: Box::new(inner),
                })));
            }
            if self.peek() == Some('<') && matches!(self.peek_at(1), Some('=') | Some('!')) {
                self.bump();
                let negate = self.bump() == Some('!');
                let inner = self.parse_alternation()?;
                self.expect(')')?;
                return Ok(Ast::Assertion(AssertionKind::Look(Look {
                    behind: true,
                    negate,
                    ast: Box::new(inner),
                })));
            }
            if self.eat('<') {
                let name = self.parse_group_name()?;
                let id = self.next_capture_group();
                let inner = self.parse_alternation()?;
                self.expect(')')?;
                return Ok(Ast::Group(Group {
                    kind: GroupKind::Capturing(id, Some(name)),
                    ast: Box::new(inner),
                }));
            }
            return Err(RegexError::unsupported(format!(
                "unrecognized group syntax at position {}",
                self.pos
            )));
        }
        let id = self.next_capture_group();
        let inner = self.parse_alternation()?;
        self.expect(')')?;
        Ok(Ast::Group(Group {
            kind: GroupKind::Capturing(id, None),
            ast: Box::new(inner),
        }))
    }

    fn next_capture_group(&mut self) -> crate::ids::CaptureGroupID {
        let id = crate::ids::CaptureGroupID::new(self.next_capture_group);
        self.next_capture_group += 1;
        id
    }

    fn parse_group_name(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(|c| c != '>') {
            self.bump();
        }
        if self.at_end() {
            return Err(RegexError::unsupported("unterminated group name"));
        }
        let name: String = self.chars[start..self.pos].iter().collect();
        self.expect('>')?;
        Ok(name)
    }

    fn parse_escape(&mut self) -> Result<Ast> {
        self.expect('\\')?;
        match self.bump() {
            Some('d') => Ok(Ast::ClassPerl(PerlClass::Digit(false))),
            Some('D') => Ok(Ast::ClassPerl(PerlClass::Digit(true))),
            Some('w') => Ok(Ast::ClassPerl(PerlClass::Word(false))),
            Some('W') => Ok(Ast::ClassPerl(PerlClass::Word(true))),
            Some('s') => Ok(Ast::ClassPerl(PerlClass::Space(false))),
            Some('S') => Ok(Ast::ClassPerl(PerlClass::Space(true))),
            Some('b') => Ok(Ast::Assertion(AssertionKind::WordBoundary)),
            Some('B') => Ok(Ast::Assertion(AssertionKind::NotWordBoundary)),
            Some('n') => Ok(Ast::Literal('\n')),
            Some('r') => Ok(Ast::Literal('\r')),
            Some('t') => Ok(Ast::Literal('\t')),
            Some(c) if c.is_ascii_digit() && c != '0' => {
                let start = self.pos - 1;
                while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.bump();
                }
                let digits: String = self.chars[start..self.pos].iter().collect();
                let n: u32 = digits
                    .parse()
                    .map_err(|_| RegexError::unsupported("back-reference index out of range"))?;
                Ok(Ast::Backreference(n))
            }
            Some(c) => Ok(Ast::Literal(c)),
            None => Err(RegexError::unsupported("dangling escape at end of pattern")),
        }
    }

    /// `class := '[' '^'? (range | perl-class | char)* ']'`
    fn parse_class(&mut self) -> Result<Ast> {
        self.expect('[')?;
        let negated = self.eat('^');
        let mut items = Vec::new();
        while self.peek().is_some() && self.peek() != Some(']') {
            let item = self.parse_class_item()?;
            if let (ClassItem::Char(lo), Some('-')) = (&item, self.peek()) {
                if self.peek_at(1).is_some() && self.peek_at(1) != Some(']') {
                    let lo = *lo;
                    self.bump();
                    let hi = self.parse_class_char()?;
                    items.push(ClassItem::Range(lo, hi));
                    continue;
                }
            }
            items.push(item);
        }
        if !self.eat(']') {
            return Err(RegexError::unsupported("unterminated character class"));
        }
        Ok(Ast::ClassBracketed(ClassBracketed { negated, items }))
    }

    fn parse_class_item(&mut self) -> Result<ClassItem> {
        if self.peek() == Some('\\') {
            self.bump();
            return match self.bump() {
                Some('d') => Ok(ClassItem::Perl(PerlClass::Digit(false))),
                Some('D') => Ok(ClassItem::Perl(PerlClass::Digit(true))),
                Some('w') => Ok(ClassItem::Perl(PerlClass::Word(false))),
                Some('W') => Ok(ClassItem::Perl(PerlClass::Word(true))),
                Some('s') => Ok(ClassItem::Perl(PerlClass::Space(false))),
                Some('S') => Ok(ClassItem::Perl(PerlClass::Space(true))),
                Some('n') => Ok(ClassItem::Char('\n')),
                Some('r') => Ok(ClassItem::Char('\r')),
                Some('t') => Ok(ClassItem::Char('\t')),
                Some(c) => Ok(ClassItem::Char(c)),
                None => Err(RegexError::unsupported("dangling escape in character class")),
            };
        }
        Ok(ClassItem::Char(self.bump().unwrap()))
    }

    fn parse_class_char(&mut self) -> Result<char> {
        if self.peek() == Some('\\') {
            self.bump();
            return self
                .bump()
                .ok_or_else(|| RegexError::unsupported("dangling escape in character class"));
        }
        self.bump()
            .ok_or_else(|| RegexError::unsupported("unterminated character class"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{RegexFlags, RegexSource};

    fn parse(pattern: &str) -> Result<RegexAst> {
        let source = RegexSource::new(pattern, RegexFlags::default());
        let options = RegexOptions::default();
        let mut buffer = CompilationBuffer::new();
        Parser::new(&source, &options, &mut buffer).parse()
    }

    #[test]
    fn parses_plain_literal_run() {
        let ast = parse("abc").unwrap();
        assert_eq!(ast.root().to_string(), "abc");
    }

    #[test]
    fn parses_alternation_and_capture_group() {
        let ast = parse("(a|b)c").unwrap();
        assert_eq!(ast.number_of_capture_groups(), 1);
        assert!(ast.properties().has_alternations);
        assert!(ast.properties().has_capture_groups);
    }

    #[test]
    fn positive_lookahead_is_parseable() {
        let ast = parse("(?=x)y").unwrap();
        assert!(ast.properties().has_look_around_assertions);
        assert!(!ast.properties().has_negative_look_ahead);
    }

    #[test]
    fn negative_lookahead_is_parseable_and_flagged() {
        let ast = parse("(?!x)y").unwrap();
        assert!(ast.properties().has_negative_look_ahead);
    }

    #[test]
    fn backreference_is_parseable_and_flagged() {
        let ast = parse(r"\1(a)").unwrap();
        assert!(ast.properties().has_back_references);
    }

    #[test]
    fn large_counted_repetition_is_flagged() {
        let ast = parse("a{0,100000}").unwrap();
        assert!(ast.properties().has_large_counted_repetitions);
    }

    #[test]
    fn loop_pattern_has_loops_and_no_captures() {
        let ast = parse("a*b").unwrap();
        assert!(ast.properties().has_loops);
        assert!(!ast.properties().has_capture_groups);
    }

    #[test]
    fn empty_pattern_parses_to_empty() {
        let ast = parse("").unwrap();
        assert!(matches!(ast.root(), Ast::Empty));
        assert!(!ast.is_dead());
    }

    #[test]
    fn empty_bracket_pattern_is_dead() {
        let ast = parse("[]").unwrap();
        assert!(ast.is_dead());
    }

    #[test]
    fn unterminated_class_is_unsupported() {
        assert!(parse("[").is_err());
    }

    #[test]
    fn named_capture_group_round_trips_name() {
        let ast = parse("(?<year>\\d{4})").unwrap();
        assert_eq!(ast.number_of_capture_groups(), 1);
        match ast.root() {
            Ast::Group(g) => match &g.kind {
                GroupKind::Capturing(_, Some(name)) => assert_eq!(name, "year"),
                other => panic!("unexpected group kind: {other:?}"),
            },
            other => panic!("unexpected root: {other:?}"),
        }
    }
}
