// ABOUTME: Scanner turning UTF-8 source text into a lazy stream of positioned tokens

use crate::token::{lookup_identifier, Token, TokenKind};

/// Reads one token at a time off of a source string. Identifiers, keywords,
/// numbers, and punctuation are assumed ASCII; string literal bodies may
/// carry arbitrary UTF-8 bytes. `read_string` runs the byte cursor up to the
/// next quote/backslash/EOF before slicing, so multi-byte characters are
/// sliced whole rather than one byte at a time.
pub struct Scanner<'a> {
    source: &'a [u8],
    position: usize,
    read_position: usize,
    ch: u8,
    line: u32,
    column: u32,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner {
            source: source.as_bytes(),
            position: 0,
            read_position: 0,
            ch: 0,
            line: 1,
            column: 0,
        };
        scanner.advance();
        scanner
    }

    fn advance(&mut self) {
        if self.ch == b'\n' {
            self.line += 1;
            self.column = 0;
        }
        self.position = self.read_position;
        self.ch = if self.read_position >= self.source.len() {
            0
        } else {
            self.source[self.read_position]
        };
        self.read_position += 1;
        self.column += 1;
    }

    fn peek(&self) -> u8 {
        if self.read_position >= self.source.len() {
            0
        } else {
            self.source[self.read_position]
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.ch {
                b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
                b'/' if self.peek() == b'/' => {
                    while self.ch != b'\n' && self.ch != 0 {
                        self.advance();
                    }
                }
                b'/' if self.peek() == b'*' => {
                    self.advance(); // consume '/'
                    self.advance(); // consume '*'
                    while !(self.ch == b'*' && self.peek() == b'/') && self.ch != 0 {
                        self.advance();
                    }
                    if self.ch != 0 {
                        self.advance(); // consume '*'
                        self.advance(); // consume '/'
                    }
                }
                _ => break,
            }
        }
    }

    fn read_while(&mut self, pred: impl Fn(u8) -> bool) -> (usize, usize) {
        let start = self.position;
        while pred(self.ch) {
            self.advance();
        }
        (start, self.position)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        String::from_utf8_lossy(&self.source[start..end]).into_owned()
    }

    /// Handles `=`/`!`/`<`/`>`, each of which may be followed by `=` to form
    /// a two-character operator.
    fn read_compound(&mut self, single: TokenKind, doubled: TokenKind, line: u32, col: u32) -> Token {
        let lit = self.ch as char;
        if self.peek() == b'=' {
            self.advance();
            let second = self.ch as char;
            self.advance();
            Token::new(doubled, format!("{}{}", lit, second), line, col)
        } else {
            self.advance();
            Token::new(single, lit.to_string(), line, col)
        }
    }

    fn read_string(&mut self, line: u32, col: u32) -> Token {
        self.advance(); // consume opening quote
        let mut value = String::new();
        loop {
            match self.ch {
                0 => break, // unterminated; caller gets what was scanned
                b'"' => {
                    self.advance();
                    break;
                }
                b'\\' => {
                    self.advance();
                    match self.ch {
                        b'n' => value.push('\n'),
                        b't' => value.push('\t'),
                        b'"' => value.push('"'),
                        b'\\' => value.push('\\'),
                        0 => break,
                        other => {
                            value.push('\\');
                            value.push(other as char);
                        }
                    }
                    self.advance();
                }
                _ => {
                    let start = self.position;
                    while self.ch != b'"' && self.ch != b'\\' && self.ch != 0 {
                        self.advance();
                    }
                    value.push_str(&self.slice(start, self.position));
                }
            }
        }
        Token::new(TokenKind::String, value, line, col)
    }

    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let col = self.column;

        macro_rules! single {
            ($kind:expr) => {{
                let lit = (self.ch as char).to_string();
                self.advance();
                Token::new($kind, lit, line, col)
            }};
        }

        match self.ch {
            0 => Token::new(TokenKind::Eof, "", line, col),
            b';' => single!(TokenKind::Semicolon),
            b'+' => single!(TokenKind::Plus),
            b'-' => single!(TokenKind::Minus),
            b'*' => single!(TokenKind::Star),
            b'/' => single!(TokenKind::Slash),
            b'^' => single!(TokenKind::Caret),
            b',' => single!(TokenKind::Comma),
            b'(' => single!(TokenKind::LParen),
            b')' => single!(TokenKind::RParen),
            b'{' => single!(TokenKind::LBrace),
            b'}' => single!(TokenKind::RBrace),
            b'[' => single!(TokenKind::LBracket),
            b']' => single!(TokenKind::RBracket),
            b'=' => self.read_compound(TokenKind::Assign, TokenKind::Equal, line, col),
            b'!' => self.read_compound(TokenKind::Bang, TokenKind::NotEqual, line, col),
            b'<' => self.read_compound(TokenKind::Less, TokenKind::LessEqual, line, col),
            b'>' => self.read_compound(TokenKind::Greater, TokenKind::GreaterEqual, line, col),
            b'"' => self.read_string(line, col),
            c if is_letter(c) => {
                let (start, end) = self.read_while(is_letter_or_digit);
                let literal = self.slice(start, end);
                let kind = lookup_identifier(&literal);
                Token::new(kind, literal, line, col)
            }
            c if is_digit(c) => {
                let (start, _) = self.read_while(is_digit);
                if self.ch == b'.' && is_digit(self.peek()) {
                    self.advance(); // consume '.'
                    self.read_while(is_digit);
                }
                let literal = self.slice(start, self.position);
                Token::new(TokenKind::Number, literal, line, col)
            }
            c => {
                self.advance();
                Token::new(TokenKind::Illegal, (c as char).to_string(), line, col)
            }
        }
    }
}

fn is_letter(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_'
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_letter_or_digit(c: u8) -> bool {
    is_letter(c) || is_digit(c)
}

/// Collects every token from `source`, always ending in exactly one `Eof`.
pub fn scan_all(source: &str) -> Vec<Token> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    loop {
        let tok = scanner.next_token();
        let done = tok.kind == TokenKind::Eof;
        tokens.push(tok);
        if done {
            break;
        }
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        scan_all(src).into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn ends_with_single_eof() {
        let toks = scan_all("var x = 1;");
        assert_eq!(toks.last().unwrap().kind, TokenKind::Eof);
        assert_eq!(toks.iter().filter(|t| t.kind == TokenKind::Eof).count(), 1);
    }

    #[test]
    fn eof_is_idempotent() {
        let mut scanner = Scanner::new("");
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
        assert_eq!(scanner.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn punctuation_and_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("= + - ! * / ^ < > <= >= == != , ; ( ) { } [ ]"),
            vec![
                Assign, Plus, Minus, Bang, Star, Slash, Caret, Less, Greater, LessEqual,
                GreaterEqual, Equal, NotEqual, Comma, Semicolon, LParen, RParen, LBrace, RBrace,
                LBracket, RBracket, Eof,
            ]
        );
    }

    #[test]
    fn keywords_vs_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("fn var true false if else return nil assign Inf NaN foo"),
            vec![
                Fn, Var, True, False, If, Else, Return, Nil, AssignKeyword, Inf, NaN, Identifier,
                Eof
            ]
        );
    }

    #[test]
    fn line_and_column_point_at_first_character() {
        let toks = scan_all("var a\n  = 12;");
        // var
        assert_eq!((toks[0].line, toks[0].column), (1, 1));
        // a
        assert_eq!((toks[1].line, toks[1].column), (1, 5));
        // =
        assert_eq!((toks[2].line, toks[2].column), (2, 3));
        // 12
        assert_eq!((toks[3].line, toks[3].column), (2, 5));
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(kinds("1 // comment\n2"), vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]);
    }

    #[test]
    fn block_comments_are_skipped_and_not_nested() {
        assert_eq!(
            kinds("1 /* a /* nested */ b */ 2"),
            vec![TokenKind::Number, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn numbers_integer_and_decimal() {
        let toks = scan_all("42 3.14 7.");
        assert_eq!(toks[0].literal, "42");
        assert_eq!(toks[1].literal, "3.14");
        // trailing dot with no following digit is not consumed into the number
        assert_eq!(toks[2].literal, "7");
    }

    #[test]
    fn string_literal_with_escapes() {
        let toks = scan_all(r#""a\nb\t\"c\"\\d""#);
        assert_eq!(toks[0].kind, TokenKind::String);
        assert_eq!(toks[0].literal, "a\nb\t\"c\"\\d");
    }

    #[test]
    fn string_literal_with_multibyte_utf8() {
        let toks = scan_all("\"café \u{1F600}\"");
        assert_eq!(toks[0].kind, TokenKind::String);
        assert_eq!(toks[0].literal, "café \u{1F600}");
    }

    #[test]
    fn illegal_byte() {
        let toks = scan_all("@");
        assert_eq!(toks[0].kind, TokenKind::Illegal);
        assert_eq!(toks[0].literal, "@");
    }

    #[test]
    fn mixed_whitespace_and_comment_runs_collapse() {
        let toks = scan_all("  // c1\n /* c2 */  \n 1");
        assert_eq!(toks[0].kind, TokenKind::Number);
    }
}
