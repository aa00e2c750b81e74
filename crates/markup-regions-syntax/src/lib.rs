//! # markup-regions-syntax
//!
//! A lossless tokenizer for HTML fragments using [Logos].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ## Architecture Overview
//!
//! ```text
//! Source Text → Lexer → Tokens → Tag scanner → (name, attrs)
//!               (Logos)
//! ```
//!
//! This crate deliberately stops at tokens. Building a tree (void elements,
//! implicit closes, entity decoding) happens in `markup-regions-engine`,
//! which owns the document model.
//!
//! ## Quick Start
//!
//! ```
//! use markup_regions_syntax::{lex, scan_start_tag, TokenKind};
//!
//! let tokens = lex("<p id=\"intro\">Hi</p>");
//! assert_eq!(tokens[0].kind, TokenKind::StartTag);
//!
//! let tag = scan_start_tag(tokens[0].text).unwrap();
//! assert_eq!(tag.name, "p");
//! assert_eq!(tag.attrs, vec![("id".to_string(), "intro".to_string())]);
//! ```

pub mod lexer;
pub mod tag;

pub use lexer::{Token, TokenKind, lex, lex_with_spans};
pub use tag::{StartTag, scan_end_tag, scan_start_tag};

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nested_markup_round_trips() {
        let input = "<div><p>The <em>quick</em> brown</p><!-- c --><br></div>";
        let tokens = lex(input);
        let reconstructed: String = tokens.iter().map(|t| t.text).collect();
        assert_eq!(reconstructed, input);

        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::StartTag,
                TokenKind::StartTag,
                TokenKind::Text,
                TokenKind::StartTag,
                TokenKind::Text,
                TokenKind::EndTag,
                TokenKind::Text,
                TokenKind::EndTag,
                TokenKind::Comment,
                TokenKind::StartTag,
                TokenKind::EndTag,
            ]
        );
    }
}
