//! Parse error codes and records.
//!
//! Errors are identified by the kebab-case codes the WHATWG specification
//! uses, not by distinct types. All of them are recoverable; the parser
//! records them (when error collection is on) and keeps going.

use std::fmt;

/// A line/column pair, both 1-based. Column counts code points, not bytes.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

impl Position {
    pub fn start() -> Position {
        Position { line: 1, column: 0 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

macro_rules! error_codes {
    ($(
        $string:literal <=> $variant:ident,
    )*) => {
        /// Every parse error the tokenizer and tree constructor can emit.
        #[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
        #[non_exhaustive]
        pub enum ErrorCode {
            $($variant,)*
        }

        impl ErrorCode {
            /// The kebab-case code as written in the WHATWG spec.
            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match *self {
                    $(ErrorCode::$variant => $string,)*
                }
            }
        }

        impl std::str::FromStr for ErrorCode {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($string => Ok(ErrorCode::$variant),)*
                    _ => Err(()),
                }
            }
        }
    }
}

error_codes! {
    // Tokenizer errors.
    "abrupt-closing-of-empty-comment" <=> AbruptClosingOfEmptyComment,
    "abrupt-doctype-public-identifier" <=> AbruptDoctypePublicIdentifier,
    "abrupt-doctype-system-identifier" <=> AbruptDoctypeSystemIdentifier,
    "absence-of-digits-in-numeric-character-reference" <=> AbsenceOfDigitsInNumericCharacterReference,
    "cdata-in-html-content" <=> CdataInHtmlContent,
    "character-reference-outside-unicode-range" <=> CharacterReferenceOutsideUnicodeRange,
    "control-character-in-input-stream" <=> ControlCharacterInInputStream,
    "control-character-reference" <=> ControlCharacterReference,
    "duplicate-attribute" <=> DuplicateAttribute,
    "end-tag-with-attributes" <=> EndTagWithAttributes,
    "end-tag-with-trailing-solidus" <=> EndTagWithTrailingSolidus,
    "eof-before-tag-name" <=> EofBeforeTagName,
    "eof-in-attribute-value-double-quoted" <=> EofInAttributeValueDoubleQuoted,
    "eof-in-cdata" <=> EofInCdata,
    "eof-in-comment" <=> EofInComment,
    "eof-in-doctype" <=> EofInDoctype,
    "eof-in-script-html-comment-like-text" <=> EofInScriptHtmlCommentLikeText,
    "eof-in-tag" <=> EofInTag,
    "incorrectly-closed-comment" <=> IncorrectlyClosedComment,
    "incorrectly-opened-comment" <=> IncorrectlyOpenedComment,
    "invalid-character-sequence-after-doctype-name" <=> InvalidCharacterSequenceAfterDoctypeName,
    "invalid-first-character-of-tag-name" <=> InvalidFirstCharacterOfTagName,
    "missing-attribute-value" <=> MissingAttributeValue,
    "missing-doctype-name" <=> MissingDoctypeName,
    "missing-doctype-public-identifier" <=> MissingDoctypePublicIdentifier,
    "missing-doctype-system-identifier" <=> MissingDoctypeSystemIdentifier,
    "missing-end-tag-name" <=> MissingEndTagName,
    "missing-quote-before-doctype-public-identifier" <=> MissingQuoteBeforeDoctypePublicIdentifier,
    "missing-quote-before-doctype-system-identifier" <=> MissingQuoteBeforeDoctypeSystemIdentifier,
    "missing-semicolon-after-character-reference" <=> MissingSemicolonAfterCharacterReference,
    "missing-whitespace-after-doctype-public-keyword" <=> MissingWhitespaceAfterDoctypePublicKeyword,
    "missing-whitespace-after-doctype-system-keyword" <=> MissingWhitespaceAfterDoctypeSystemKeyword,
    "missing-whitespace-before-doctype-name" <=> MissingWhitespaceBeforeDoctypeName,
    "missing-whitespace-between-attributes" <=> MissingWhitespaceBetweenAttributes,
    "missing-whitespace-between-doctype-public-and-system-identifiers" <=> MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers,
    "nested-comment" <=> NestedComment,
    "noncharacter-character-reference" <=> NoncharacterCharacterReference,
    "noncharacter-in-input-stream" <=> NoncharacterInInputStream,
    "null-character-reference" <=> NullCharacterReference,
    "surrogate-character-reference" <=> SurrogateCharacterReference,
    "unexpected-character-after-doctype-system-identifier" <=> UnexpectedCharacterAfterDoctypeSystemIdentifier,
    "unexpected-character-in-attribute-name" <=> UnexpectedCharacterInAttributeName,
    "unexpected-character-in-unquoted-attribute-value" <=> UnexpectedCharacterInUnquotedAttributeValue,
    "unexpected-equals-sign-before-attribute-name" <=> UnexpectedEqualsSignBeforeAttributeName,
    "unexpected-null-character" <=> UnexpectedNullCharacter,
    "unexpected-question-mark-instead-of-tag-name" <=> UnexpectedQuestionMarkInsteadOfTagName,
    "unexpected-solidus-in-tag" <=> UnexpectedSolidusInTag,
    "unknown-named-character-reference" <=> UnknownNamedCharacterReference,

    // Tree construction errors.
    "duplicate-body" <=> DuplicateBody,
    "duplicate-head" <=> DuplicateHead,
    "end-tag-without-matching-open-element" <=> EndTagWithoutMatchingOpenElement,
    "foreign-content-breakout" <=> ForeignContentBreakout,
    "formatting-element-not-current-node" <=> FormattingElementNotCurrentNode,
    "formatting-element-not-in-scope" <=> FormattingElementNotInScope,
    "formatting-element-not-open" <=> FormattingElementNotOpen,
    "missing-doctype" <=> MissingDoctype,
    "non-void-html-element-start-tag-with-trailing-solidus" <=> NonVoidHtmlElementStartTagWithTrailingSolidus,
    "unclosed-elements-at-end-of-body" <=> UnclosedElementsAtEndOfBody,
    "unexpected-bad-doctype" <=> UnexpectedBadDoctype,
    "unexpected-characters-in-table" <=> UnexpectedCharactersInTable,
    "unexpected-doctype" <=> UnexpectedDoctype,
    "unexpected-token-after-after-body" <=> UnexpectedTokenAfterAfterBody,
    "unexpected-token-after-after-frameset" <=> UnexpectedTokenAfterAfterFrameset,
    "unexpected-token-after-body" <=> UnexpectedTokenAfterBody,
    "unexpected-token-after-frameset" <=> UnexpectedTokenAfterFrameset,
    "unexpected-token-after-head" <=> UnexpectedTokenAfterHead,
    "unexpected-token-before-head" <=> UnexpectedTokenBeforeHead,
    "unexpected-token-before-html" <=> UnexpectedTokenBeforeHtml,
    "unexpected-token-in-body" <=> UnexpectedTokenInBody,
    "unexpected-token-in-caption" <=> UnexpectedTokenInCaption,
    "unexpected-token-in-cell" <=> UnexpectedTokenInCell,
    "unexpected-token-in-column-group" <=> UnexpectedTokenInColumnGroup,
    "unexpected-token-in-foreign-content" <=> UnexpectedTokenInForeignContent,
    "unexpected-token-in-frameset" <=> UnexpectedTokenInFrameset,
    "unexpected-token-in-head" <=> UnexpectedTokenInHead,
    "unexpected-token-in-head-noscript" <=> UnexpectedTokenInHeadNoscript,
    "unexpected-token-in-initial-mode" <=> UnexpectedTokenInInitialMode,
    "unexpected-token-in-row" <=> UnexpectedTokenInRow,
    "unexpected-token-in-select" <=> UnexpectedTokenInSelect,
    "unexpected-token-in-table" <=> UnexpectedTokenInTable,
    "unexpected-token-in-table-body" <=> UnexpectedTokenInTableBody,
    "unexpected-token-in-table-text" <=> UnexpectedTokenInTableText,
    "unexpected-token-in-template" <=> UnexpectedTokenInTemplate,
    "unexpected-token-in-text-mode" <=> UnexpectedTokenInTextMode,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}

/// A recorded parse error: what went wrong and where.
#[derive(PartialEq, Eq, Copy, Clone, Hash, Debug)]
pub struct ParseError {
    pub code: ErrorCode,
    pub position: Position,
}

impl ParseError {
    pub fn new(code: ErrorCode, position: Position) -> ParseError {
        ParseError { code, position }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.position)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trip_codes() {
        for code in [
            ErrorCode::EofInTag,
            ErrorCode::DuplicateAttribute,
            ErrorCode::UnexpectedTokenInTable,
        ] {
            assert_eq!(code.as_str().parse::<ErrorCode>(), Ok(code));
        }
        assert!("no-such-code".parse::<ErrorCode>().is_err());
    }

    #[test]
    fn display() {
        let err = ParseError::new(
            ErrorCode::UnexpectedNullCharacter,
            Position { line: 3, column: 7 },
        );
        assert_eq!(err.to_string(), "unexpected-null-character (3:7)");
    }
}
