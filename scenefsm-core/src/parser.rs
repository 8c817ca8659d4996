//! Recursive descent parser for state machine programs.
//!
//! Grammar:
//!
//! ```text
//! program    := { statement } ;
//! statement  := command ';' ;
//! command    := IDENTIFIER '(' [ arglist ] ')' ;
//! arglist    := arg { ',' arg } ;
//! arg        := IDENTIFIER | NUMBER ;
//! ```
//!
//! A syntax error is recorded and the parser skips past the next `;` before
//! carrying on, so a single pass reports every broken statement. Statements
//! with an unknown keyword are reported and dropped.

use crate::command::{Command, CommandKind};
use crate::diagnostic::Diagnostics;
use crate::lexer::Token;

/// What the parser was looking for when it failed.
type Expected = &'static str;

/// Parses a token stream into commands, recording faults in `diagnostics`.
pub fn parse(tokens: &[Token], diagnostics: &mut Diagnostics) -> Vec<Command> {
    Parser::new(tokens, diagnostics).parse_program()
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    diagnostics: &'a mut Diagnostics,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token], diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            tokens,
            pos: 0,
            diagnostics,
        }
    }

    fn parse_program(&mut self) -> Vec<Command> {
        tracing::trace!("parsing {} tokens", self.tokens.len());
        let mut commands = Vec::new();

        while !self.at_end() {
            let start = self.pos;
            match self.parse_statement() {
                Ok(Some(command)) => commands.push(command),
                Ok(None) => {}
                Err(expected) => {
                    self.diagnostics.syntax(self.tokens, self.pos, expected);
                    self.synchronize(start);
                }
            }
        }

        commands
    }

    fn parse_statement(&mut self) -> Result<Option<Command>, Expected> {
        let keyword_pos = self.pos;
        let (name, args) = self.parse_command()?;

        let kind = CommandKind::from_keyword(&name);
        if kind.is_none() {
            self.diagnostics.unrecognized(self.tokens, keyword_pos, &name);
        }

        self.expect(';')?;

        Ok(kind.map(|kind| Command {
            name,
            args,
            kind,
            line: self.tokens[keyword_pos].line,
        }))
    }

    fn parse_command(&mut self) -> Result<(String, Vec<String>), Expected> {
        let name = self.expect_identifier()?;
        tracing::trace!("got keyword {}", name);

        self.expect('(')?;
        if self.eat(')') {
            return Ok((name, Vec::new()));
        }

        let args = self.parse_arg_list()?;
        self.expect(')')?;

        Ok((name, args))
    }

    fn parse_arg_list(&mut self) -> Result<Vec<String>, Expected> {
        let mut args = vec![self.parse_arg()?];
        while self.eat(',') {
            args.push(self.parse_arg()?);
        }
        tracing::trace!("got arglist {:?}", args);
        Ok(args)
    }

    fn parse_arg(&mut self) -> Result<String, Expected> {
        match self.peek() {
            Some(token) if token.is_identifier() || token.as_number().is_some() => {
                let text = token.text.clone();
                self.pos += 1;
                Ok(text)
            }
            _ => Err("<identifier or number>"),
        }
    }

    fn expect_identifier(&mut self) -> Result<String, Expected> {
        match self.peek() {
            Some(token) if token.is_identifier() => {
                let text = token.text.clone();
                self.pos += 1;
                Ok(text)
            }
            _ => Err("<identifier>"),
        }
    }

    fn expect(&mut self, c: char) -> Result<(), Expected> {
        if self.eat(c) {
            return Ok(());
        }
        Err(match c {
            '(' => "(",
            ')' => ")",
            ',' => ",",
            _ => ";",
        })
    }

    fn eat(&mut self, c: char) -> bool {
        match self.peek() {
            Some(token) if token.is_punct(c) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Skips past the next `;`, always making progress from `start`.
    fn synchronize(&mut self, start: usize) {
        while let Some(token) = self.peek() {
            self.pos += 1;
            if token.is_punct(';') {
                break;
            }
        }
        if self.pos == start {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}
