/// Message tokenizer: split raw message text into command tokens.
///
/// Tokens are separated by unescaped whitespace. A span wrapped in matching
/// `"` or `'` keeps its whitespace and loses the quotes. A backslash escapes
/// whitespace, quotes and itself; before anything else it is kept as-is.
/// An opening quote with no closing partner is treated as a literal character,
/// so tokenizing never fails.
use std::collections::VecDeque;
use std::fmt;

/// An ordered token stream that is consumed from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tokens {
    inner: VecDeque<String>,
}

impl Tokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn peek(&self) -> Option<&str> {
        self.inner.front().map(String::as_str)
    }

    pub fn pop_front(&mut self) -> Option<String> {
        self.inner.pop_front()
    }

    pub fn push_front(&mut self, token: impl Into<String>) {
        self.inner.push_front(token.into());
    }

    /// Replace the first token in place, e.g. after stripping a prefix from it.
    pub fn replace_front(&mut self, token: impl Into<String>) {
        if let Some(front) = self.inner.front_mut() {
            *front = token.into();
        }
    }

    /// Consume every remaining token, joined by single spaces.
    pub fn take_rest(&mut self) -> String {
        self.inner.drain(..).collect::<Vec<_>>().join(" ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.inner.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Tokens {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            inner: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.iter().collect();
        write!(f, "{}", parts.join(" "))
    }
}

fn is_quote(c: char) -> bool {
    c == '"' || c == '\''
}

/// Whether an unescaped `quote` occurs at or after `from`.
fn has_closing(chars: &[char], from: usize, quote: char) -> bool {
    let mut i = from;
    while i < chars.len() {
        match chars[i] {
            '\\' => i += 2,
            c if c == quote => return true,
            _ => i += 1,
        }
    }
    false
}

/// Split `text` into tokens.
pub fn tokenize(text: &str) -> Tokens {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = VecDeque::new();
    let mut current = String::new();
    // Distinguishes an empty quoted token (`""`) from "no token yet".
    let mut started = false;
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\\' {
            match chars.get(i + 1) {
                Some(&next) if next.is_whitespace() || is_quote(next) || next == '\\' => {
                    current.push(next);
                    i += 2;
                }
                _ => {
                    current.push('\\');
                    i += 1;
                }
            }
            started = true;
            continue;
        }

        match quote {
            Some(open) if c == open => quote = None,
            Some(_) => current.push(c),
            None if c.is_whitespace() => {
                if started {
                    tokens.push_back(std::mem::take(&mut current));
                    started = false;
                }
            }
            None if is_quote(c) && has_closing(&chars, i + 1, c) => {
                quote = Some(c);
                started = true;
            }
            None => {
                current.push(c);
                started = true;
            }
        }
        i += 1;
    }

    if started {
        tokens.push_back(current);
    }

    Tokens { inner: tokens }
}
