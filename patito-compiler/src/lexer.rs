//! Lexical pre-scan (spec §4.10, §7).
//!
//! The real tokenization is the pest grammar's job (`grammar/patito.pest`)
//! -- pest aborts the whole parse on the first unrecognized byte, which
//! doesn't match spec §7's "warn with character, line, column; skip the
//! offending character and continue lexing". So before handing source
//! text to pest, `prescan` walks it once, record a [`Diagnostic`] for
//! every byte that can never start or continue a Patito token, and
//! drops it from the text pest will actually see.

use crate::error::Diagnostic;

/// True for every character that can legally start or continue a Patito
/// token: identifier/digit characters, the fixed punctuation set the
/// grammar recognizes (`; , : = { } ( ) + - * / > < ! .`), the quote
/// character that delimits string literals, and whitespace.
///
/// This positively matches the token catalog rather than merely
/// excluding control characters, so a stray out-of-catalog symbol (say
/// `@` or `#`) is caught here instead of reaching pest, which has no
/// "skip and continue" mode of its own.
///
/// The prescan has no notion of being "inside" a string literal, so a
/// character that pest's `string_literal` rule would accept (anything
/// but an embedded `"`) but that isn't in this catalog -- e.g. `@` in
/// `cout("a@b")` -- is still flagged and stripped here. Patito source in
/// the wild sticks to the documented token catalog even inside string
/// literals, so this trade-off buys "never hard-abort on a stray
/// symbol" at the cost of not supporting arbitrary punctuation in
/// string contents.
fn is_allowed(ch: char) -> bool {
    if ch.is_whitespace() {
        return true;
    }
    if ch.is_alphanumeric() {
        return true;
    }
    matches!(
        ch,
        ';' | ',' | ':' | '=' | '{' | '}' | '(' | ')' | '+' | '-' | '*' | '/' | '>' | '<' | '!'
            | '.' | '"'
    )
}

/// Strips bytes that can't start or continue any token, recording one
/// [`Diagnostic::InvalidChar`] per offending character with its 1-based
/// line and column. Lines are counted the way spec §6 describes:
/// "newlines advance the line counter".
pub fn prescan(source: &str) -> (String, Vec<Diagnostic>) {
    let mut out = String::with_capacity(source.len());
    let mut diagnostics = Vec::new();
    let mut line = 1usize;
    let mut column = 1usize;

    for ch in source.chars() {
        if is_allowed(ch) {
            out.push(ch);
        } else {
            diagnostics.push(Diagnostic::InvalidChar { ch, line, column });
        }

        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (out, diagnostics)
}
