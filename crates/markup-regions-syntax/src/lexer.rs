//! # Lexer - Tokenizing Markup Source
//!
//! Breaks an HTML fragment into a flat sequence of tokens using the [Logos]
//! lexer generator.
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## The Lossless Guarantee
//!
//! Every byte in the input appears in exactly one token. Nothing is skipped:
//!
//! ```
//! use markup_regions_syntax::lexer::lex;
//!
//! let input = "<p>Hello <b>world</b>!</p>";
//! let tokens = lex(input);
//!
//! let reconstructed: String = tokens.iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```
//!
//! ## Token Design
//!
//! Tokens are context-free. The lexer does not know whether `<br>` is a void
//! element or whether an end tag matches anything open; that is the tree
//! builder's job. A `<` that does not open a tag becomes a [`TokenKind::Lt`]
//! token so callers can fold it back into text.

use logos::{Lexer, Logos};

/// Token kinds produced by the Logos lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<!-- ... -->`, running to end of input if unterminated
    #[token("<!--", lex_comment)]
    Comment,

    /// `<!DOCTYPE ...>` and other markup declarations
    #[regex(r"<![^>\-][^>]*>")]
    Declaration,

    /// `</name ...>`
    #[regex(r"</[A-Za-z][^>]*>")]
    EndTag,

    /// `<name ...>` or `<name .../>`
    #[regex(r"<[A-Za-z][^>]*>")]
    StartTag,

    /// A `<` that does not open a tag
    #[token("<")]
    Lt,

    /// Character data between tags
    #[regex(r"[^<]+")]
    Text,
}

fn lex_comment(lex: &mut Lexer<TokenKind>) {
    let rest = lex.remainder();
    let len = rest.find("-->").map(|i| i + 3).unwrap_or(rest.len());
    lex.bump(len);
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
///
/// Guarantees that all bytes from the input appear in the output tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        // Logos error means unrecognized input - keep it as text
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push((Token { kind, text }, span));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(kind: TokenKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_plain_text() {
        assert_eq!(
            lex("The quick brown fox"),
            vec![token(TokenKind::Text, "The quick brown fox")]
        );
    }

    #[test]
    fn lex_element_with_text() {
        assert_eq!(
            lex("<p class=\"a\">hi</p>"),
            vec![
                token(TokenKind::StartTag, "<p class=\"a\">"),
                token(TokenKind::Text, "hi"),
                token(TokenKind::EndTag, "</p>"),
            ]
        );
    }

    #[test]
    fn lex_comment_containing_angle_bracket() {
        assert_eq!(
            lex("a<!-- x > y -->b"),
            vec![
                token(TokenKind::Text, "a"),
                token(TokenKind::Comment, "<!-- x > y -->"),
                token(TokenKind::Text, "b"),
            ]
        );
    }

    #[test]
    fn lex_unterminated_comment_runs_to_end() {
        assert_eq!(
            lex("<!-- open"),
            vec![token(TokenKind::Comment, "<!-- open")]
        );
    }

    #[test]
    fn lex_doctype() {
        assert_eq!(
            lex("<!DOCTYPE html><p>"),
            vec![
                token(TokenKind::Declaration, "<!DOCTYPE html>"),
                token(TokenKind::StartTag, "<p>"),
            ]
        );
    }

    #[test]
    fn lex_stray_less_than() {
        assert_eq!(
            lex("1 < 2"),
            vec![
                token(TokenKind::Text, "1 "),
                token(TokenKind::Lt, "<"),
                token(TokenKind::Text, " 2"),
            ]
        );
    }

    #[test]
    fn spans_cover_input() {
        let input = "<div>a<br/>b</div>";
        let spans: Vec<_> = lex_with_spans(input)
            .into_iter()
            .map(|(_, span)| span)
            .collect();
        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(input.len()));
        for pair in spans.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
