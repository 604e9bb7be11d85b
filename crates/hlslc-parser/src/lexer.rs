//! Hand-written lexer for the HLSL subset.
//!
//! Identifiers are classified at lex time by consulting live scope state
//! through the narrow [`LexerEnv`] interface, which resolves the
//! declaration-vs-expression grammar ambiguity without backtracking.
//! `#line` directives embedded by the preprocessor update the current
//! line and intern new file names into the compilation's pool.

use hlslc_ir::{FileName, Handle, SourceLoc, TokenSpan};

use crate::token::{Keyword, Token, TokenKind};

/// How an identifier resolves against the current scope stack.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum IdentClass {
    /// Names a registered type.
    Type,
    /// Names a declared variable.
    Variable,
    /// Names neither.
    Fresh,
}

/// The scope state the lexer consults. Implemented by the compilation
/// context; kept narrow so the lexer has no dependency on scope
/// internals.
pub trait LexerEnv {
    /// Classifies an identifier against the current scope stack.
    /// Variables shadow types.
    fn classify(&self, name: &str) -> IdentClass;

    /// Interns a file name from a `#line` directive.
    fn intern_file(&mut self, name: &str) -> Handle<FileName>;
}

pub struct Lexer<'a> {
    src: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    file: Handle<FileName>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, file: Handle<FileName>) -> Self {
        Self {
            src: source.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            file,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.src.get(self.pos + ahead).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek(0)?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(b)
    }

    fn loc(&self) -> SourceLoc {
        SourceLoc::new(self.file, self.line, self.col)
    }

    /// Skips whitespace, comments, and `#line` directives.
    fn skip_trivia(&mut self, env: &mut dyn LexerEnv) {
        loop {
            match self.peek(0) {
                Some(b' ' | b'\t' | b'\r' | b'\n') => {
                    self.bump();
                }
                Some(b'/') if self.peek(1) == Some(b'/') => {
                    while let Some(b) = self.peek(0) {
                        if b == b'\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some(b'/') if self.peek(1) == Some(b'*') => {
                    self.bump();
                    self.bump();
                    while let Some(b) = self.bump() {
                        if b == b'*' && self.peek(0) == Some(b'/') {
                            self.bump();
                            break;
                        }
                    }
                }
                Some(b'#') => self.lex_directive(env),
                _ => return,
            }
        }
    }

    /// Consumes a `#line <num> ["file"]` directive (through its newline)
    /// and applies it. Unrecognized directives are skipped to end of line.
    fn lex_directive(&mut self, env: &mut dyn LexerEnv) {
        self.bump(); // '#'
        self.skip_blanks();
        let word = self.take_word();
        if word != "line" {
            self.skip_directive_line();
            return;
        }

        self.skip_blanks();
        let mut number = String::new();
        while let Some(b @ b'0'..=b'9') = self.peek(0) {
            number.push(b as char);
            self.bump();
        }
        let new_line: Option<u32> = number.parse().ok();

        self.skip_blanks();
        let mut new_file = None;
        if self.peek(0) == Some(b'"') {
            self.bump();
            let mut name = String::new();
            while let Some(b) = self.peek(0) {
                if b == b'"' || b == b'\n' {
                    break;
                }
                name.push(b as char);
                self.bump();
            }
            if self.peek(0) == Some(b'"') {
                self.bump();
            }
            new_file = Some(name);
        }

        self.skip_directive_line();
        if let Some(line) = new_line {
            self.line = line;
            self.col = 1;
        }
        if let Some(name) = new_file {
            self.file = env.intern_file(&name);
        }
    }

    fn skip_blanks(&mut self) {
        while let Some(b' ' | b'\t') = self.peek(0) {
            self.bump();
        }
    }

    /// Skips to and through the end of the current line. A `#line`
    /// directive overrides the line counter afterwards.
    fn skip_directive_line(&mut self) {
        while let Some(b) = self.bump() {
            if b == b'\n' {
                return;
            }
        }
    }

    fn take_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(b) = self.peek(0) {
            if b.is_ascii_alphanumeric() || b == b'_' {
                word.push(b as char);
                self.bump();
            } else {
                break;
            }
        }
        word
    }

    /// Produces the next token. Never fails: unmappable characters yield
    /// [`TokenKind::Unknown`], end of input yields [`TokenKind::Eof`].
    pub fn next_token(&mut self, env: &mut dyn LexerEnv) -> Token {
        self.skip_trivia(env);
        let start = self.loc();

        let Some(b) = self.peek(0) else {
            return self.token(start, TokenKind::Eof);
        };

        if b.is_ascii_alphabetic() || b == b'_' {
            let word = self.take_word();
            let kind = match word.as_str() {
                "true" => TokenKind::BoolConst(true),
                "false" => TokenKind::BoolConst(false),
                _ => match Keyword::from_str(&word) {
                    Some(kw) => TokenKind::Keyword(kw),
                    None => match env.classify(&word) {
                        IdentClass::Variable => TokenKind::VarName(word),
                        IdentClass::Type => TokenKind::TypeName(word),
                        IdentClass::Fresh => TokenKind::NewIdent(word),
                    },
                },
            };
            return self.token(start, kind);
        }

        if b.is_ascii_digit() || (b == b'.' && self.peek(1).is_some_and(|c| c.is_ascii_digit())) {
            let kind = self.lex_number();
            return self.token(start, kind);
        }

        if b == b'"' {
            let kind = self.lex_string();
            return self.token(start, kind);
        }

        let kind = self.lex_operator();
        self.token(start, kind)
    }

    fn token(&self, start: SourceLoc, kind: TokenKind) -> Token {
        Token {
            kind,
            span: TokenSpan::new(start, self.line, self.col),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        // Hexadecimal.
        if self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X')) {
            self.bump();
            self.bump();
            let mut value: u64 = 0;
            while let Some(b) = self.peek(0) {
                let digit = match b {
                    b'0'..=b'9' => u64::from(b - b'0'),
                    b'a'..=b'f' => u64::from(b - b'a' + 10),
                    b'A'..=b'F' => u64::from(b - b'A' + 10),
                    _ => break,
                };
                value = value.wrapping_mul(16).wrapping_add(digit);
                self.bump();
            }
            return self.int_with_suffix(value);
        }

        let mut text = String::new();
        let mut is_float = false;

        while let Some(b @ b'0'..=b'9') = self.peek(0) {
            text.push(b as char);
            self.bump();
        }
        if self.peek(0) == Some(b'.') {
            is_float = true;
            text.push('.');
            self.bump();
            while let Some(b @ b'0'..=b'9') = self.peek(0) {
                text.push(b as char);
                self.bump();
            }
        }
        if matches!(self.peek(0), Some(b'e' | b'E')) {
            let sign_ok = matches!(self.peek(1), Some(b'0'..=b'9'))
                || (matches!(self.peek(1), Some(b'+' | b'-'))
                    && matches!(self.peek(2), Some(b'0'..=b'9')));
            if sign_ok {
                is_float = true;
                text.push('e');
                self.bump();
                if let Some(b @ (b'+' | b'-')) = self.peek(0) {
                    text.push(b as char);
                    self.bump();
                }
                while let Some(b @ b'0'..=b'9') = self.peek(0) {
                    text.push(b as char);
                    self.bump();
                }
            }
        }

        match self.peek(0) {
            Some(b'f' | b'F') => {
                self.bump();
                return TokenKind::FloatConst(text.parse().unwrap_or(0.0));
            }
            Some(b'h' | b'H') => {
                self.bump();
                return TokenKind::HalfConst(text.parse().unwrap_or(0.0));
            }
            _ => {}
        }
        if is_float {
            return TokenKind::FloatConst(text.parse().unwrap_or(0.0));
        }

        // Octal (leading zero), otherwise decimal.
        let value = if text.len() > 1 && text.starts_with('0') {
            u64::from_str_radix(&text[1..], 8).unwrap_or_else(|_| text.parse().unwrap_or(0))
        } else {
            text.parse().unwrap_or(0)
        };
        self.int_with_suffix(value)
    }

    fn int_with_suffix(&mut self, value: u64) -> TokenKind {
        let mut unsigned = false;
        loop {
            match self.peek(0) {
                Some(b'u' | b'U') => {
                    unsigned = true;
                    self.bump();
                }
                Some(b'l' | b'L') => {
                    self.bump();
                }
                _ => break,
            }
        }
        if unsigned {
            TokenKind::UintConst(value as u32)
        } else {
            TokenKind::IntConst(value as i32)
        }
    }

    fn lex_string(&mut self) -> TokenKind {
        self.bump(); // opening quote
        let mut text = String::new();
        while let Some(b) = self.peek(0) {
            match b {
                b'"' => {
                    self.bump();
                    return TokenKind::StringConst(text);
                }
                b'\n' => break,
                b'\\' => {
                    self.bump();
                    match self.bump() {
                        Some(b'n') => text.push('\n'),
                        Some(b't') => text.push('\t'),
                        Some(c) => text.push(c as char),
                        None => break,
                    }
                }
                _ => {
                    text.push(b as char);
                    self.bump();
                }
            }
        }
        // Unterminated string: surface what was collected.
        TokenKind::StringConst(text)
    }

    fn lex_operator(&mut self) -> TokenKind {
        let b = self.bump().expect("caller checked non-empty");
        macro_rules! two {
            ($second:literal, $long:expr, $short:expr) => {
                if self.peek(0) == Some($second) {
                    self.bump();
                    $long
                } else {
                    $short
                }
            };
        }
        match b {
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b':' => TokenKind::Colon,
            b'.' => TokenKind::Dot,
            b'?' => TokenKind::Question,
            b'+' => match self.peek(0) {
                Some(b'+') => {
                    self.bump();
                    TokenKind::Inc
                }
                Some(b'=') => {
                    self.bump();
                    TokenKind::AddAssign
                }
                _ => TokenKind::Plus,
            },
            b'-' => match self.peek(0) {
                Some(b'-') => {
                    self.bump();
                    TokenKind::Dec
                }
                Some(b'=') => {
                    self.bump();
                    TokenKind::SubAssign
                }
                _ => TokenKind::Minus,
            },
            b'*' => two!(b'=', TokenKind::MulAssign, TokenKind::Star),
            b'/' => two!(b'=', TokenKind::DivAssign, TokenKind::Slash),
            b'%' => two!(b'=', TokenKind::ModAssign, TokenKind::Percent),
            b'~' => TokenKind::Tilde,
            b'!' => two!(b'=', TokenKind::Ne, TokenKind::Not),
            b'=' => two!(b'=', TokenKind::EqEq, TokenKind::Assign),
            b'&' => match self.peek(0) {
                Some(b'&') => {
                    self.bump();
                    TokenKind::AmpAmp
                }
                Some(b'=') => {
                    self.bump();
                    TokenKind::AndAssign
                }
                _ => TokenKind::Amp,
            },
            b'|' => match self.peek(0) {
                Some(b'|') => {
                    self.bump();
                    TokenKind::PipePipe
                }
                Some(b'=') => {
                    self.bump();
                    TokenKind::OrAssign
                }
                _ => TokenKind::Pipe,
            },
            b'^' => two!(b'=', TokenKind::XorAssign, TokenKind::Caret),
            b'<' => match self.peek(0) {
                Some(b'<') => {
                    self.bump();
                    two!(b'=', TokenKind::ShlAssign, TokenKind::Shl)
                }
                Some(b'=') => {
                    self.bump();
                    TokenKind::Le
                }
                _ => TokenKind::Lt,
            },
            b'>' => match self.peek(0) {
                Some(b'>') => {
                    self.bump();
                    two!(b'=', TokenKind::ShrAssign, TokenKind::Shr)
                }
                Some(b'=') => {
                    self.bump();
                    TokenKind::Ge
                }
                _ => TokenKind::Gt,
            },
            other => TokenKind::Unknown(other as char),
        }
    }
}
