//! Regex text helpers shared by shape models and the aggregator
//!
//! Output is restricted to constructs common to mainstream engines: escaped
//! literals, bracket classes, `{n}` / `{m,n}` quantifiers, plain groups with
//! alternation and `?`. The one dialect-specific token is [`ALPHA_CLASS`];
//! patterns target the `regex` crate syntax, the same engine
//! [`ShapeAggregator::matches`](super::ShapeAggregator::matches) compiles with.

use std::collections::BTreeSet;

/// Generalized token for a run of decimal digits
pub const DIGIT_CLASS: &str = r"\d";

/// Generalized token for a run of alphabetic characters
///
/// Unicode property syntax of the `regex` crate and PCRE2. Java spells it
/// `\p{IsAlphabetic}`; JavaScript needs the `u` flag.
pub const ALPHA_CLASS: &str = r"\p{Alphabetic}";

/// Permissive pattern used once the shape cap overflows
pub const CATCH_ALL: &str = ".+";

/// Pattern returned when nothing has been tracked yet
pub const MATCH_EVERYTHING: &str = ".*";

/// Append `c` to `out`, escaping it if it is a regex metacharacter
pub(crate) fn escape_literal(c: char, out: &mut String) {
    if matches!(
        c,
        '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
    ) {
        out.push('\\');
    }
    out.push(c);
}

/// Distinct run lengths rendered as an alternation before collapsing to a range
pub const DEFAULT_LENGTH_ALTERNATION_LIMIT: usize = 3;

/// Escape a whole string as a literal pattern
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        escape_literal(c, &mut out);
    }
    out
}

/// Repeat an atom exactly `n` times
pub(crate) fn repeat(atom: &str, n: usize) -> String {
    if n == 1 {
        atom.to_string()
    } else {
        format!("{atom}{{{n}}}")
    }
}

/// Render an atom under the run-length variability policy
///
/// - a single length renders as an exact repeat
/// - a contiguous set renders as `{min,max}`
/// - up to `alternation_limit` scattered lengths render as an ascending
///   alternation of exact repeats
/// - anything larger collapses to `{min,max}`
pub(crate) fn quantify(atom: &str, lengths: &BTreeSet<usize>, alternation_limit: usize) -> String {
    let (Some(&min), Some(&max)) = (lengths.first(), lengths.last()) else {
        return String::new();
    };

    if min == max {
        return repeat(atom, min);
    }

    let contiguous = max - min + 1 == lengths.len();
    if !contiguous && lengths.len() <= alternation_limit {
        let alternatives: Vec<String> = lengths.iter().map(|&n| repeat(atom, n)).collect();
        return format!("({})", alternatives.join("|"));
    }

    format!("{atom}{{{min},{max}}}")
}
