//! Character scanner for literal text (key literals and array elements)

use super::errors::{ValueError, ValueResult};

/// Forward-only scanner over literal text
pub(crate) struct Scanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Unconsumed remainder
    pub(crate) fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub(crate) fn skip_ws(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }

    /// Next non-whitespace character without consuming it
    pub(crate) fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.rest().chars().next()
    }

    pub(crate) fn is_at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    /// Consumes `c` if it is the next non-whitespace character
    pub(crate) fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, c: char) -> ValueResult<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("'{}'", c)))
        }
    }

    /// Consumes a case-insensitive keyword that is immediately followed by `(`
    ///
    /// The scanner is left untouched when the keyword does not match.
    pub(crate) fn eat_call(&mut self, keyword: &str) -> bool {
        let start = self.pos;
        self.skip_ws();
        let rest = self.rest();
        let matches = rest.len() >= keyword.len()
            && rest.is_char_boundary(keyword.len())
            && rest[..keyword.len()].eq_ignore_ascii_case(keyword);
        if matches {
            self.pos += keyword.len();
            if self.eat('(') {
                return true;
            }
        }
        self.pos = start;
        false
    }

    /// Consumes a case-insensitive bare word (not followed by an identifier character)
    pub(crate) fn eat_word(&mut self, word: &str) -> bool {
        let start = self.pos;
        self.skip_ws();
        let rest = self.rest();
        if rest.len() >= word.len()
            && rest.is_char_boundary(word.len())
            && rest[..word.len()].eq_ignore_ascii_case(word)
        {
            let next = rest[word.len()..].chars().next();
            if !next.map(is_ident_char).unwrap_or(false) {
                self.pos += word.len();
                return true;
            }
        }
        self.pos = start;
        false
    }

    /// Consumes a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`)
    pub(crate) fn identifier(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !is_ident_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        Some(&rest[..end])
    }

    /// Consumes a number-like token: digits, signs, dots, exponents and the
    /// `NaN`/`inf` spellings
    pub(crate) fn number_token(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '+' | '-')))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if end == 0 {
            return None;
        }
        self.pos += end;
        Some(&rest[..end])
    }

    /// Consumes a quoted string, resolving backslash escapes
    pub(crate) fn quoted(&mut self, quote: char) -> ValueResult<String> {
        self.expect(quote)?;
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some((_, escaped)) => out.push(escaped),
                    None => break,
                }
            } else if c == quote {
                self.pos += i + c.len_utf8();
                return Ok(out);
            } else {
                out.push(c);
            }
        }
        Err(ValueError::validation(format!(
            "unterminated {}-quoted string",
            quote
        )))
    }

    /// Consumes a backtick-quoted name; a doubled backtick is a literal backtick
    pub(crate) fn backticked(&mut self) -> ValueResult<String> {
        self.expect('`')?;
        let mut out = String::new();
        let mut chars = self.rest().char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c == '`' {
                if matches!(chars.peek(), Some((_, '`'))) {
                    chars.next();
                    out.push('`');
                } else {
                    self.pos += i + 1;
                    return Ok(out);
                }
            } else {
                out.push(c);
            }
        }
        Err(ValueError::validation("unterminated backtick-quoted name"))
    }

    /// Builds an error describing what was expected at the current position
    pub(crate) fn unexpected(&self, expected: &str) -> ValueError {
        let found: String = self.rest().chars().take(12).collect();
        if found.is_empty() {
            ValueError::validation(format!("expected {} but input ended", expected))
        } else {
            ValueError::validation(format!("expected {} at '{}'", expected, found))
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True if `s` can be written without backtick quoting
pub(crate) fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(is_ident_char),
        _ => false,
    }
}

/// Single-quotes `s`, escaping backslashes and single quotes
pub(crate) fn single_quote(s: &str) -> String {
    quote_with(s, '\'')
}

/// Double-quotes `s`, escaping backslashes and double quotes
pub(crate) fn double_quote(s: &str) -> String {
    quote_with(s, '"')
}

fn quote_with(s: &str, quote: char) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        if c == '\\' || c == quote {
            out.push('\\');
        }
        out.push(c);
    }
    out.push(quote);
    out
}

/// Backtick-quotes `s` unless it is a plain identifier
pub(crate) fn quote_name(s: &str) -> String {
    if is_plain_identifier(s) {
        s.to_string()
    } else {
        format!("`{}`", s.replace('`', "``"))
    }
}
