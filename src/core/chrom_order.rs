//! Natural ordering of chromosome names
//!
//! Used when a chromosome order has to be inferred (e.g. from a reader's contig
//! list) instead of being taken verbatim from a sizes file.
//!
//! Rules, highest priority first:
//! 1. A plain name sorts before any `_`-suffixed name (`chr1` < `chr1_random`).
//! 2. Two `_`-suffixed names compare by the text after their first `_`.
//! 3. Names containing `m`, `y` or `x` (case-insensitive) go last, `x` < `y` < `m`.
//! 4. Otherwise names are split into digit / non-digit runs; digit runs compare
//!    numerically and text runs case-insensitively.
//!
//! Names that are still equal fall back to a plain byte comparison so that
//! sorting is total and deterministic.

use std::cmp::Ordering;

/// Sex and mitochondrial markers, in the order they must trail everything else.
/// A later key sorts after an earlier one.
const TRAILING_KEYS: [char; 3] = ['m', 'y', 'x'];

/// One run of a tokenized chromosome name
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Number(String),
    Text(String),
}

impl Token {
    fn cmp_token(&self, other: &Token) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => cmp_digits(a, b),
            (Token::Text(a), Token::Text(b)) => a.cmp(b),
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
        }
    }
}

/// Compare two digit runs numerically without overflowing on long runs
fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Split a name into alternating digit / non-digit runs.
/// Text runs are lowercased.
fn tokenize(name: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for c in name.chars() {
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != in_digits {
            tokens.push(make_token(std::mem::take(&mut current), in_digits));
        }
        in_digits = is_digit;
        current.push(c);
    }
    if !current.is_empty() {
        tokens.push(make_token(current, in_digits));
    }
    tokens
}

fn make_token(run: String, digits: bool) -> Token {
    if digits {
        Token::Number(run)
    } else {
        Token::Text(run.to_lowercase())
    }
}

fn cmp_tokens(a: &[Token], b: &[Token]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.cmp_token(y) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    a.len().cmp(&b.len())
}

/// Position of the highest-priority trailing key contained in `name`, if any.
/// Larger values sort later.
fn trailing_rank(name: &str) -> Option<usize> {
    let lower = name.to_lowercase();
    TRAILING_KEYS
        .iter()
        .position(|key| lower.contains(*key))
        .map(|pos| TRAILING_KEYS.len() - pos)
}

fn natural_cmp_inner(a: &str, b: &str) -> Ordering {
    match (a.split_once('_'), b.split_once('_')) {
        (Some((_, a_suffix)), Some((_, b_suffix))) => return natural_cmp_inner(a_suffix, b_suffix),
        (Some(_), None) => return Ordering::Greater,
        (None, Some(_)) => return Ordering::Less,
        (None, None) => {}
    }

    match (trailing_rank(a), trailing_rank(b)) {
        (Some(x), Some(y)) if x != y => return x.cmp(&y),
        (Some(_), None) => return Ordering::Greater,
        (None, Some(_)) => return Ordering::Less,
        _ => {}
    }

    cmp_tokens(&tokenize(a), &tokenize(b))
}

/// Compare two chromosome names in natural (karyotype-like) order
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_cmp_inner(a, b).then_with(|| a.cmp(b))
}

/// Sort `(name, length)` pairs in natural chromosome order
pub fn sort_chromosomes<L>(rows: &mut [(String, L)]) {
    rows.sort_by(|x, y| natural_cmp(&x.0, &y.0));
}
