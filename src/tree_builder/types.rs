//! Types used within the tree builder code. Not exported to users.

use tendril::StrTendril;

use crate::dom::NodeId;
use crate::tokenizer::states::RawKind;
use crate::tokenizer::Tag;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub(crate) enum InsertionMode {
    Initial,
    BeforeHtml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    InTemplate,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
}

/// Is a character run known to be (non-)whitespace?
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub(crate) enum SplitStatus {
    NotSplit,
    Whitespace,
    NotWhitespace,
}

/// A subset/refinement of `tokenizer::Token`. Everything else is handled
/// specially at the beginning of `process_token`.
#[derive(PartialEq, Eq, Clone, Debug)]
pub(crate) enum Token {
    Tag(Tag),
    Comment(StrTendril),
    Characters(SplitStatus, StrTendril),
    NullCharacter,
    Eof,
}

pub(crate) enum ProcessResult {
    Done,
    DoneAckSelfClosing,
    SplitWhitespace(StrTendril),
    Reprocess(InsertionMode, Token),
    ToPlaintext,
    ToRawData(RawKind),
}

pub(crate) enum FormatEntry {
    Element(NodeId, Tag),
    Marker,
}

pub(crate) enum InsertionPoint {
    /// Insert as last child of this parent.
    LastChild(NodeId),
    /// Foster parenting: insert before this table, or at the end of its
    /// previous open element if the table has been detached.
    TableFosterParenting {
        element: NodeId,
        prev_element: NodeId,
    },
}
