//! Character cursor over a descriptor string
//!
//! Number readers follow scanf conventions: leading ASCII whitespace is
//! skipped, then at least one digit must follow. A value that does not fit
//! `u32` does not match.

pub(crate) struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    pub fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume and return the next character, whatever it is
    pub fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Consume `expected` if it is the next character
    pub fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    pub fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let len = rest.find(|c: char| !pred(c)).unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    /// Consume everything up to (not including) one of `stops`
    pub fn take_until(&mut self, stops: &[char]) -> &'a str {
        self.take_while(|c| !stops.contains(&c))
    }

    pub fn skip_whitespace(&mut self) {
        self.take_while(|c| c.is_ascii_whitespace());
    }

    /// Run `f`, rewinding the cursor if it does not match
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = f(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    pub fn decimal(&mut self) -> Option<u32> {
        self.number(10)
    }

    pub fn hex(&mut self) -> Option<u32> {
        self.number(16)
    }

    fn number(&mut self, radix: u32) -> Option<u32> {
        self.attempt(|c| {
            c.skip_whitespace();
            let digits = c.take_while(|ch| ch.is_digit(radix));
            if digits.is_empty() {
                return None;
            }
            u32::from_str_radix(digits, radix).ok()
        })
    }
}
