use tendril::StrTendril;

use crate::errors::{ParseError, Position};
use crate::interface::{Attribute, LocalName};
use crate::tokenizer::states::RawKind;

pub use self::TagKind::{EndTag, StartTag};

/// A `DOCTYPE` token.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Doctype {
    pub name: Option<StrTendril>,
    pub public_id: Option<StrTendril>,
    pub system_id: Option<StrTendril>,
    pub force_quirks: bool,
}

#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum TagKind {
    StartTag,
    EndTag,
}

/// A tag token.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Tag {
    pub kind: TagKind,
    pub name: LocalName,
    pub self_closing: bool,
    pub attrs: Vec<Attribute>,
}

impl Tag {
    /// Equivalent tags for the Noah's Ark clause: same kind and name, same
    /// attribute set in any order. Attribute names within one tag are
    /// unique (the tokenizer drops duplicates), so a one-way containment
    /// check with equal lengths suffices. Ignores the self-closing flag.
    pub fn equiv_modulo_attr_order(&self, other: &Tag) -> bool {
        self.kind == other.kind
            && self.name == other.name
            && self.attrs.len() == other.attrs.len()
            && self.attrs.iter().all(|a| {
                other
                    .attrs
                    .iter()
                    .any(|b| a.name == b.name && a.value == b.value)
            })
    }

    pub fn attribute(&self, name: &str) -> Option<&StrTendril> {
        self.attrs
            .iter()
            .find(|a| a.name.prefix.is_none() && &*a.name.local == name)
            .map(|a| &a.value)
    }
}

#[derive(PartialEq, Eq, Debug)]
pub enum Token {
    Doctype(Doctype),
    Tag(Tag),
    Comment(StrTendril),
    Characters(StrTendril),
    NullCharacter,
    Eof,
    Error(ParseError),
}

/// What the sink wants the tokenizer to do after the current token.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[must_use]
pub enum TokenSinkResult {
    Continue,
    /// Switch to the PLAINTEXT state; there is no way back.
    Plaintext,
    /// Switch to a raw-data state for the element just inserted.
    RawData(RawKind),
}

/// Types that consume tokens from the tokenizer.
pub trait TokenSink {
    /// Process one token. The position is where the token ended in the
    /// source.
    fn process_token(&mut self, token: Token, position: Position) -> TokenSinkResult;

    /// Tokenization reached the end of the input.
    fn end(&mut self) {}

    /// Used by the markup declaration open state: `<![CDATA[` only opens a
    /// CDATA section when the adjusted current node is foreign. The default
    /// makes every CDATA section a bogus comment.
    fn adjusted_current_node_in_foreign_content(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::interface::QualName;

    fn tag_with(attrs: Vec<(&str, &str)>) -> Tag {
        Tag {
            kind: StartTag,
            name: LocalName::from("b"),
            self_closing: false,
            attrs: attrs
                .into_iter()
                .map(|(k, v)| Attribute {
                    name: QualName::html(k),
                    value: StrTendril::from_slice(v),
                })
                .collect(),
        }
    }

    #[test]
    fn tag_equivalence_ignores_attr_order() {
        let a = tag_with(vec![("id", "x"), ("class", "y")]);
        let b = tag_with(vec![("class", "y"), ("id", "x")]);
        assert!(a.equiv_modulo_attr_order(&b));

        let c = tag_with(vec![("id", "x")]);
        assert!(!a.equiv_modulo_attr_order(&c));

        let d = tag_with(vec![("id", "x"), ("class", "z")]);
        assert!(!a.equiv_modulo_attr_order(&d));
    }
}
