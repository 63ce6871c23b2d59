//! The HTML5 tokenizer.

pub use self::interface::{Doctype, EndTag, StartTag, Tag, TagKind};
pub use self::interface::{Token, TokenSink, TokenSinkResult};

use self::buffer::{delim_set, Chunk, DelimSet, InputBuffer};
use self::char_ref::{CharRef, CharRefTokenizer, Status};
use self::states::{DoubleEscaped, Escaped};
use self::states::{DoubleQuoted, Public, SingleQuoted, System, Unquoted};
use self::states::{Rawtext, Rcdata, ScriptData, ScriptDataEscaped};

use log::{debug, trace};
use tendril::StrTendril;

use crate::errors::{ErrorCode, ParseError, Position};
use crate::interface::{Attribute, LocalName, Namespace, QualName};
use crate::macros::unwrap_or_return;
use crate::util::str::lower_ascii_letter;

pub mod buffer;
mod char_ref;
mod interface;
pub mod states;

pub(crate) enum ProcessResult {
    Continue,
    Suspend,
}

fn option_push(opt_str: &mut Option<StrTendril>, c: char) {
    match *opt_str {
        Some(ref mut s) => s.push_char(c),
        None => *opt_str = Some(StrTendril::from_char(c)),
    }
}

/// Tokenizer options, with an impl for `Default`.
#[derive(Clone)]
pub struct TokenizerOpts {
    /// Emit parse error tokens with positions? Default: false.
    pub collect_errors: bool,

    /// Discard a `U+FEFF BYTE ORDER MARK` at the beginning of the stream?
    /// Default: true.
    pub discard_bom: bool,

    /// Initial state override, for fragment parsing and the tests.
    pub initial_state: Option<states::State>,

    /// Last start tag name, for the "appropriate end tag" check when the
    /// machine starts inside a raw-text state.
    pub last_start_tag_name: Option<String>,
}

impl Default for TokenizerOpts {
    fn default() -> TokenizerOpts {
        TokenizerOpts {
            collect_errors: false,
            discard_bom: true,
            initial_state: None,
            last_start_tag_name: None,
        }
    }
}

/// The HTML tokenizer.
pub struct Tokenizer<Sink> {
    /// Options controlling the behavior of the tokenizer.
    opts: TokenizerOpts,

    /// Destination for tokens we emit.
    pub sink: Sink,

    /// The abstract machine state as described in the spec.
    state: states::State,

    /// The remaining input.
    input: InputBuffer,

    /// Tokenizer for character references, if we're tokenizing one at the
    /// moment.
    char_ref_tokenizer: Option<Box<CharRefTokenizer>>,

    /// Current input character. Just consumed, may reconsume.
    current_char: char,

    /// Should we reconsume the current input character?
    reconsume: bool,

    /// Did we just consume \r, translating it to \n? In that case we need
    /// to ignore the next character if it's \n.
    ignore_lf: bool,

    /// Current tag kind.
    current_tag_kind: TagKind,

    /// Current tag name.
    current_tag_name: StrTendril,

    /// Current tag is self-closing?
    current_tag_self_closing: bool,

    /// Current tag attributes.
    current_tag_attrs: Vec<Attribute>,

    /// Current attribute name.
    current_attr_name: StrTendril,

    /// Current attribute value.
    current_attr_value: StrTendril,

    /// Current comment.
    current_comment: StrTendril,

    /// Current doctype token.
    current_doctype: Doctype,

    /// Last start tag name, for use in checking "appropriate end tag".
    last_start_tag_name: Option<LocalName>,

    /// The "temporary buffer" mentioned in the spec.
    temp_buf: StrTendril,

    /// Current source position, 1-based line, code points within the line.
    position: Position,
}

impl<Sink: TokenSink> Tokenizer<Sink> {
    /// Create a new tokenizer which feeds tokens to a particular `TokenSink`.
    pub fn new(sink: Sink, mut opts: TokenizerOpts) -> Tokenizer<Sink> {
        let start_tag_name = opts.last_start_tag_name.take().map(|s| LocalName::from(&*s));
        let state = opts.initial_state.unwrap_or(states::Data);
        Tokenizer {
            opts,
            sink,
            state,
            input: InputBuffer::new(""),
            char_ref_tokenizer: None,
            current_char: '\0',
            reconsume: false,
            ignore_lf: false,
            current_tag_kind: StartTag,
            current_tag_name: StrTendril::new(),
            current_tag_self_closing: false,
            current_tag_attrs: vec![],
            current_attr_name: StrTendril::new(),
            current_attr_value: StrTendril::new(),
            current_comment: StrTendril::new(),
            current_doctype: Doctype::default(),
            last_start_tag_name: start_tag_name,
            temp_buf: StrTendril::new(),
            position: Position::start(),
        }
    }

    /// Tokenize the whole input, driving every token through the sink, then
    /// signal the end of the stream.
    pub fn run(&mut self, input: &str) {
        let input = if self.opts.discard_bom {
            input.strip_prefix('\u{feff}').unwrap_or(input)
        } else {
            input
        };
        self.input = InputBuffer::new(input);
        while let ProcessResult::Continue = self.step() {}
        self.end();
    }

    /// Recover the sink once tokenization is done.
    pub fn into_sink(self) -> Sink {
        self.sink
    }

    fn process_token(&mut self, token: Token) -> TokenSinkResult {
        self.sink.process_token(token, self.position)
    }

    fn process_token_and_continue(&mut self, token: Token) {
        let result = self.process_token(token);
        assert!(matches!(result, TokenSinkResult::Continue));
    }

    //§ preprocessing-the-input-stream
    // Normalize newlines, advance the source position, and (when error
    // collection is on) flag control characters and noncharacters.
    fn get_preprocessed_char(&mut self, mut c: char) -> Option<char> {
        if self.ignore_lf {
            self.ignore_lf = false;
            if c == '\n' {
                c = self.input.next()?;
            }
        }

        if c == '\r' {
            self.ignore_lf = true;
            c = '\n';
        }

        if c == '\n' {
            self.position.line += 1;
            self.position.column = 0;
        } else {
            self.position.column += 1;
        }

        if self.opts.collect_errors {
            match c as u32 {
                0x01..=0x08 | 0x0B | 0x0E..=0x1F | 0x7F..=0x9F => {
                    self.emit_error(ErrorCode::ControlCharacterInInputStream)
                },
                n if (0xFDD0..=0xFDEF).contains(&n) || (n & 0xFFFE) == 0xFFFE => {
                    self.emit_error(ErrorCode::NoncharacterInInputStream)
                },
                _ => (),
            }
        }

        trace!("got character {c:?}");
        self.current_char = c;
        Some(c)
    }

    //§ tokenization
    // Get the next input character, if one is available.
    fn get_char(&mut self) -> Option<char> {
        if self.reconsume {
            self.reconsume = false;
            Some(self.current_char)
        } else {
            self.input.next().and_then(|c| self.get_preprocessed_char(c))
        }
    }

    // Consume either one character or a run of "ordinary" characters for
    // the current state. Every delimiter set includes \r and \n, so runs
    // never need newline normalization.
    fn pop_except_from(&mut self, set: DelimSet) -> Option<Chunk> {
        // Bail to the per-character path for the corner cases: a pending
        // reconsume, a half-normalized newline, or error collection (which
        // wants to inspect every character).
        if self.opts.collect_errors || self.reconsume || self.ignore_lf {
            return self.get_char().map(Chunk::Delim);
        }

        match self.input.pop_except_from(set)? {
            Chunk::Delim(c) => self.get_preprocessed_char(c).map(Chunk::Delim),
            Chunk::Run(run) => {
                trace!("got characters {run:?}");
                self.position.column += run.chars().count() as u64;
                Some(Chunk::Run(run))
            },
        }
    }

    // Check whether the next characters match `pat`, consuming them if so.
    // See InputBuffer::eat.
    fn eat(&mut self, pat: &str, eq: fn(&u8, &u8) -> bool) -> bool {
        if self.ignore_lf {
            self.ignore_lf = false;
            if self.peek_input() == Some('\n') {
                self.discard_input_char();
            }
        }
        let matched = self.input.eat(pat, eq);
        if matched {
            self.position.column += pat.len() as u64;
        }
        matched
    }

    /// Switch into the PLAINTEXT state. Used when priming a fragment parse
    /// whose context element is `<plaintext>`.
    pub fn set_plaintext_state(&mut self) {
        self.state = states::Plaintext;
    }

    fn bad_char_error(&mut self, code: ErrorCode) {
        trace!("parse error: {code} in state {:?}", self.state);
        self.emit_error(code);
    }

    fn emit_char(&mut self, c: char) {
        self.process_token_and_continue(match c {
            '\0' => Token::NullCharacter,
            _ => Token::Characters(StrTendril::from_char(c)),
        });
    }

    // The string must not contain '\0'!
    fn emit_chars(&mut self, b: StrTendril) {
        self.process_token_and_continue(Token::Characters(b));
    }

    fn emit_current_tag(&mut self) {
        self.finish_attribute();

        let name = LocalName::from(&*self.current_tag_name);
        self.current_tag_name.clear();

        match self.current_tag_kind {
            StartTag => {
                self.last_start_tag_name = Some(name.clone());
            },
            EndTag => {
                if !self.current_tag_attrs.is_empty() {
                    self.emit_error(ErrorCode::EndTagWithAttributes);
                }
                if self.current_tag_self_closing {
                    self.emit_error(ErrorCode::EndTagWithTrailingSolidus);
                }
            },
        }

        let token = Token::Tag(Tag {
            kind: self.current_tag_kind,
            name,
            self_closing: self.current_tag_self_closing,
            attrs: std::mem::take(&mut self.current_tag_attrs),
        });

        match self.process_token(token) {
            TokenSinkResult::Continue => (),
            TokenSinkResult::Plaintext => self.state = states::Plaintext,
            TokenSinkResult::RawData(kind) => self.state = states::RawData(kind),
        }
    }

    fn emit_temp_buf(&mut self) {
        let buf = std::mem::take(&mut self.temp_buf);
        self.emit_chars(buf);
    }

    fn emit_current_comment(&mut self) {
        let comment = std::mem::take(&mut self.current_comment);
        self.process_token_and_continue(Token::Comment(comment));
    }

    fn discard_tag(&mut self) {
        self.current_tag_name.clear();
        self.current_tag_self_closing = false;
        self.current_tag_attrs = vec![];
    }

    fn create_tag(&mut self, kind: TagKind, c: char) {
        self.discard_tag();
        self.current_tag_name.push_char(c);
        self.current_tag_kind = kind;
    }

    fn have_appropriate_end_tag(&self) -> bool {
        match self.last_start_tag_name {
            Some(ref last) => {
                self.current_tag_kind == EndTag && *self.current_tag_name == **last
            },
            None => false,
        }
    }

    fn create_attribute(&mut self, c: char) {
        self.finish_attribute();
        self.current_attr_name.push_char(c);
    }

    fn finish_attribute(&mut self) {
        if self.current_attr_name.is_empty() {
            return;
        }

        // First attribute with a given name wins.
        let dup = {
            let name = &*self.current_attr_name;
            self.current_tag_attrs.iter().any(|a| *a.name.local == *name)
        };

        if dup {
            self.emit_error(ErrorCode::DuplicateAttribute);
            self.current_attr_name.clear();
            self.current_attr_value.clear();
        } else {
            let name = LocalName::from(&*self.current_attr_name);
            self.current_attr_name.clear();
            self.current_tag_attrs.push(Attribute {
                // The tree builder rewrites the namespace for adjusted
                // foreign attributes; everything starts out plain.
                name: QualName::new(None, Namespace::Html, name),
                value: std::mem::take(&mut self.current_attr_value),
            });
        }
    }

    fn emit_current_doctype(&mut self) {
        let doctype = std::mem::take(&mut self.current_doctype);
        self.process_token_and_continue(Token::Doctype(doctype));
    }

    fn doctype_id(&mut self, kind: states::DoctypeIdKind) -> &mut Option<StrTendril> {
        match kind {
            Public => &mut self.current_doctype.public_id,
            System => &mut self.current_doctype.system_id,
        }
    }

    fn clear_doctype_id(&mut self, kind: states::DoctypeIdKind) {
        match self.doctype_id(kind) {
            Some(s) => s.clear(),
            id @ None => *id = Some(StrTendril::new()),
        }
    }

    fn consume_char_ref(&mut self) {
        let in_attr = matches!(self.state, states::AttributeValue(_));
        self.char_ref_tokenizer = Some(Box::new(CharRefTokenizer::new(in_attr)));
    }

    fn emit_eof(&mut self) {
        self.process_token_and_continue(Token::Eof);
    }

    fn peek_input(&self) -> Option<char> {
        if self.reconsume {
            Some(self.current_char)
        } else {
            self.input.peek()
        }
    }

    // peek_input() deals in raw characters (no newline normalization);
    // discarding must drop exactly one raw character so un-consumption
    // stays byte-exact.
    fn discard_input_char(&mut self) {
        if self.reconsume {
            self.reconsume = false;
        } else {
            self.input.next();
            self.position.column += 1;
        }
    }

    fn unconsume(&mut self, s: &str) {
        self.input.push_front(s);
    }

    fn emit_error(&mut self, code: ErrorCode) {
        if self.opts.collect_errors {
            let error = ParseError::new(code, self.position);
            self.process_token_and_continue(Token::Error(error));
        }
    }
}
//§ END

// Shorthand for common state machine actions.
macro_rules! shorthand (
    ( $me:ident : create_tag $kind:ident $c:expr   ) => ( $me.create_tag($kind, $c)                  );
    ( $me:ident : push_tag $c:expr                 ) => ( $me.current_tag_name.push_char($c)         );
    ( $me:ident : discard_tag                      ) => ( $me.discard_tag()                          );
    ( $me:ident : discard_char                     ) => ( $me.discard_input_char()                   );
    ( $me:ident : push_temp $c:expr                ) => ( $me.temp_buf.push_char($c)                 );
    ( $me:ident : clear_temp                       ) => ( $me.temp_buf.clear()                       );
    ( $me:ident : create_attr $c:expr              ) => ( $me.create_attribute($c)                   );
    ( $me:ident : push_name $c:expr                ) => ( $me.current_attr_name.push_char($c)        );
    ( $me:ident : push_value $c:expr               ) => ( $me.current_attr_value.push_char($c)       );
    ( $me:ident : append_value $t:expr             ) => ( $me.current_attr_value.push_tendril($t)    );
    ( $me:ident : push_comment $c:expr             ) => ( $me.current_comment.push_char($c)          );
    ( $me:ident : append_comment $s:expr           ) => ( $me.current_comment.push_slice($s)         );
    ( $me:ident : emit_comment                     ) => ( $me.emit_current_comment()                 );
    ( $me:ident : clear_comment                    ) => ( $me.current_comment.clear()                );
    ( $me:ident : create_doctype                   ) => ( $me.current_doctype = Doctype::default()   );
    ( $me:ident : push_doctype_name $c:expr        ) => ( option_push(&mut $me.current_doctype.name, $c) );
    ( $me:ident : push_doctype_id $k:expr, $c:expr ) => ( option_push($me.doctype_id($k), $c)        );
    ( $me:ident : clear_doctype_id $k:expr         ) => ( $me.clear_doctype_id($k)                   );
    ( $me:ident : force_quirks                     ) => ( $me.current_doctype.force_quirks = true    );
    ( $me:ident : emit_doctype                     ) => ( $me.emit_current_doctype()                 );
    ( $me:ident : error $code:ident                ) => ( $me.bad_char_error(ErrorCode::$code)       );
);

// A little DSL for sequencing shorthand actions.
macro_rules! go (
    // A pattern like $($cmd:tt)* ; $($rest:tt)* causes parse ambiguity.
    // We have to tell the parser how much lookahead we need.

    ( $me:ident : $a:tt                   ; $($rest:tt)* ) => ({ shorthand!($me: $a);          go!($me: $($rest)*); });
    ( $me:ident : $a:tt $b:tt             ; $($rest:tt)* ) => ({ shorthand!($me: $a $b);       go!($me: $($rest)*); });
    ( $me:ident : $a:tt $b:tt $c:tt       ; $($rest:tt)* ) => ({ shorthand!($me: $a $b $c);    go!($me: $($rest)*); });
    ( $me:ident : $a:tt $b:tt $c:tt $d:tt ; $($rest:tt)* ) => ({ shorthand!($me: $a $b $c $d); go!($me: $($rest)*); });

    // These can only come at the end.

    ( $me:ident : to $s:ident                    ) => ({ $me.state = states::$s; return ProcessResult::Continue;           });
    ( $me:ident : to $s:ident $k1:expr           ) => ({ $me.state = states::$s($k1); return ProcessResult::Continue;      });
    ( $me:ident : to $s:ident $k1:ident $k2:expr ) => ({ $me.state = states::$s($k1($k2)); return ProcessResult::Continue; });

    ( $me:ident : reconsume $s:ident                    ) => ({ $me.reconsume = true; go!($me: to $s);         });
    ( $me:ident : reconsume $s:ident $k1:expr           ) => ({ $me.reconsume = true; go!($me: to $s $k1);     });
    ( $me:ident : reconsume $s:ident $k1:ident $k2:expr ) => ({ $me.reconsume = true; go!($me: to $s $k1 $k2); });

    ( $me:ident : consume_char_ref ) => ({ $me.consume_char_ref(); return ProcessResult::Continue; });

    // We have a default next state after emitting a tag, but the sink can
    // override.
    ( $me:ident : emit_tag $s:ident ) => ({
        $me.state = states::$s;
        $me.emit_current_tag();
        return ProcessResult::Continue;
    });

    ( $me:ident : eof ) => ({ $me.emit_eof(); return ProcessResult::Suspend; });

    // If nothing else matched, it's a single command.
    ( $me:ident : $($cmd:tt)+ ) => ( shorthand!($me: $($cmd)+) );

    // or nothing.
    ( $me:ident : ) => (());
);

// These macros cause early return from the function where they are used.
macro_rules! get_char ( ($me:expr) => (
    unwrap_or_return!($me.get_char(), ProcessResult::Suspend)
));

macro_rules! peek ( ($me:expr) => (
    unwrap_or_return!($me.peek_input(), ProcessResult::Suspend)
));

macro_rules! pop_except_from ( ($me:expr, $set:expr) => (
    unwrap_or_return!($me.pop_except_from($set), ProcessResult::Suspend)
));

impl<Sink: TokenSink> Tokenizer<Sink> {
    // Run one step of the state machine. Returns Suspend at the end of the
    // available input.
    #[allow(clippy::never_loop)]
    fn step(&mut self) -> ProcessResult {
        if self.char_ref_tokenizer.is_some() {
            return self.step_char_ref_tokenizer();
        }

        trace!("processing in state {:?}", self.state);
        match self.state {
            //§ data-state
            states::Data => loop {
                match pop_except_from!(self, delim_set!('\r' '\0' '&' '<' '\n')) {
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\0');
                    },
                    Chunk::Delim('&') => go!(self: consume_char_ref),
                    Chunk::Delim('<') => go!(self: to TagOpen),
                    Chunk::Delim(c) => self.emit_char(c),
                    Chunk::Run(b) => self.emit_chars(b),
                }
            },

            //§ rcdata-state
            states::RawData(Rcdata) => loop {
                match pop_except_from!(self, delim_set!('\r' '\0' '&' '<' '\n')) {
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                    },
                    Chunk::Delim('&') => go!(self: consume_char_ref),
                    Chunk::Delim('<') => go!(self: to RawLessThanSign Rcdata),
                    Chunk::Delim(c) => self.emit_char(c),
                    Chunk::Run(b) => self.emit_chars(b),
                }
            },

            //§ rawtext-state
            states::RawData(Rawtext) => loop {
                match pop_except_from!(self, delim_set!('\r' '\0' '<' '\n')) {
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                    },
                    Chunk::Delim('<') => go!(self: to RawLessThanSign Rawtext),
                    Chunk::Delim(c) => self.emit_char(c),
                    Chunk::Run(b) => self.emit_chars(b),
                }
            },

            //§ script-data-state
            states::RawData(ScriptData) => loop {
                match pop_except_from!(self, delim_set!('\r' '\0' '<' '\n')) {
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                    },
                    Chunk::Delim('<') => go!(self: to RawLessThanSign ScriptData),
                    Chunk::Delim(c) => self.emit_char(c),
                    Chunk::Run(b) => self.emit_chars(b),
                }
            },

            //§ script-data-escaped-state
            states::RawData(ScriptDataEscaped(Escaped)) => loop {
                match pop_except_from!(self, delim_set!('\r' '\0' '-' '<' '\n')) {
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                    },
                    Chunk::Delim('-') => {
                        self.emit_char('-');
                        go!(self: to ScriptDataEscapedDash Escaped);
                    },
                    Chunk::Delim('<') => go!(self: to RawLessThanSign ScriptDataEscaped Escaped),
                    Chunk::Delim(c) => self.emit_char(c),
                    Chunk::Run(b) => self.emit_chars(b),
                }
            },

            //§ script-data-double-escaped-state
            states::RawData(ScriptDataEscaped(DoubleEscaped)) => loop {
                match pop_except_from!(self, delim_set!('\r' '\0' '-' '<' '\n')) {
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                    },
                    Chunk::Delim('-') => {
                        self.emit_char('-');
                        go!(self: to ScriptDataEscapedDash DoubleEscaped);
                    },
                    Chunk::Delim('<') => {
                        self.emit_char('<');
                        go!(self: to RawLessThanSign ScriptDataEscaped DoubleEscaped);
                    },
                    Chunk::Delim(c) => self.emit_char(c),
                    Chunk::Run(b) => self.emit_chars(b),
                }
            },

            //§ plaintext-state
            states::Plaintext => loop {
                match pop_except_from!(self, delim_set!('\r' '\0' '\n')) {
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                    },
                    Chunk::Delim(c) => self.emit_char(c),
                    Chunk::Run(b) => self.emit_chars(b),
                }
            },

            //§ tag-open-state
            states::TagOpen => loop {
                match get_char!(self) {
                    '!' => go!(self: to MarkupDeclarationOpen),
                    '/' => go!(self: to EndTagOpen),
                    '?' => {
                        go!(self: error UnexpectedQuestionMarkInsteadOfTagName);
                        go!(self: clear_comment; reconsume BogusComment);
                    },
                    c => match lower_ascii_letter(c) {
                        Some(cl) => go!(self: create_tag StartTag cl; to TagName),
                        None => {
                            go!(self: error InvalidFirstCharacterOfTagName);
                            self.emit_char('<');
                            go!(self: reconsume Data);
                        },
                    },
                }
            },

            //§ end-tag-open-state
            states::EndTagOpen => loop {
                match get_char!(self) {
                    '>' => {
                        go!(self: error MissingEndTagName);
                        go!(self: to Data);
                    },
                    c => match lower_ascii_letter(c) {
                        Some(cl) => go!(self: create_tag EndTag cl; to TagName),
                        None => {
                            go!(self: error InvalidFirstCharacterOfTagName);
                            go!(self: clear_comment; reconsume BogusComment);
                        },
                    },
                }
            },

            //§ tag-name-state
            states::TagName => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => go!(self: to BeforeAttributeName),
                    '/' => go!(self: to SelfClosingStartTag),
                    '>' => go!(self: emit_tag Data),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_tag '\u{fffd}');
                    },
                    c => go!(self: push_tag (c.to_ascii_lowercase())),
                }
            },

            //§ script-data-escaped-less-than-sign-state
            states::RawLessThanSign(ScriptDataEscaped(Escaped)) => loop {
                match get_char!(self) {
                    '/' => go!(self: clear_temp; to RawEndTagOpen ScriptDataEscaped Escaped),
                    c => match lower_ascii_letter(c) {
                        Some(cl) => {
                            go!(self: clear_temp; push_temp cl);
                            self.emit_char('<');
                            self.emit_char(c);
                            go!(self: to ScriptDataEscapeStart DoubleEscaped);
                        },
                        None => {
                            self.emit_char('<');
                            go!(self: reconsume RawData ScriptDataEscaped Escaped);
                        },
                    },
                }
            },

            //§ script-data-double-escaped-less-than-sign-state
            states::RawLessThanSign(ScriptDataEscaped(DoubleEscaped)) => loop {
                match get_char!(self) {
                    '/' => {
                        go!(self: clear_temp);
                        self.emit_char('/');
                        go!(self: to ScriptDataDoubleEscapeEnd);
                    },
                    _ => go!(self: reconsume RawData ScriptDataEscaped DoubleEscaped),
                }
            },

            //§ rcdata-less-than-sign-state rawtext-less-than-sign-state script-data-less-than-sign-state
            // otherwise
            states::RawLessThanSign(kind) => loop {
                match get_char!(self) {
                    '/' => go!(self: clear_temp; to RawEndTagOpen kind),
                    '!' if kind == ScriptData => {
                        self.emit_char('<');
                        self.emit_char('!');
                        go!(self: to ScriptDataEscapeStart Escaped);
                    },
                    _ => {
                        self.emit_char('<');
                        go!(self: reconsume RawData kind);
                    },
                }
            },

            //§ rcdata-end-tag-open-state rawtext-end-tag-open-state script-data-end-tag-open-state script-data-escaped-end-tag-open-state
            states::RawEndTagOpen(kind) => loop {
                let c = get_char!(self);
                match lower_ascii_letter(c) {
                    Some(cl) => go!(self: create_tag EndTag cl; push_temp c; to RawEndTagName kind),
                    None => {
                        self.emit_char('<');
                        self.emit_char('/');
                        go!(self: reconsume RawData kind);
                    },
                }
            },

            //§ rcdata-end-tag-name-state rawtext-end-tag-name-state script-data-end-tag-name-state script-data-escaped-end-tag-name-state
            states::RawEndTagName(kind) => loop {
                let c = get_char!(self);
                if self.have_appropriate_end_tag() {
                    match c {
                        '\t' | '\n' | '\x0C' | ' ' => go!(self: clear_temp; to BeforeAttributeName),
                        '/' => go!(self: clear_temp; to SelfClosingStartTag),
                        '>' => go!(self: clear_temp; emit_tag Data),
                        _ => (),
                    }
                }

                match lower_ascii_letter(c) {
                    Some(cl) => go!(self: push_tag cl; push_temp c),
                    None => {
                        go!(self: discard_tag);
                        self.emit_char('<');
                        self.emit_char('/');
                        self.emit_temp_buf();
                        go!(self: reconsume RawData kind);
                    },
                }
            },

            //§ script-data-double-escape-start-state
            states::ScriptDataEscapeStart(DoubleEscaped) => loop {
                let c = get_char!(self);
                match c {
                    '\t' | '\n' | '\x0C' | ' ' | '/' | '>' => {
                        let esc = if &*self.temp_buf == "script" {
                            DoubleEscaped
                        } else {
                            Escaped
                        };
                        self.emit_char(c);
                        go!(self: to RawData ScriptDataEscaped esc);
                    },
                    _ => match lower_ascii_letter(c) {
                        Some(cl) => {
                            go!(self: push_temp cl);
                            self.emit_char(c);
                        },
                        None => go!(self: reconsume RawData ScriptDataEscaped Escaped),
                    },
                }
            },

            //§ script-data-escape-start-state
            states::ScriptDataEscapeStart(Escaped) => loop {
                match get_char!(self) {
                    '-' => {
                        self.emit_char('-');
                        go!(self: to ScriptDataEscapeStartDash);
                    },
                    _ => go!(self: reconsume RawData ScriptData),
                }
            },

            //§ script-data-escape-start-dash-state
            states::ScriptDataEscapeStartDash => loop {
                match get_char!(self) {
                    '-' => {
                        self.emit_char('-');
                        go!(self: to ScriptDataEscapedDashDash Escaped);
                    },
                    _ => go!(self: reconsume RawData ScriptData),
                }
            },

            //§ script-data-escaped-dash-state script-data-double-escaped-dash-state
            states::ScriptDataEscapedDash(kind) => loop {
                match get_char!(self) {
                    '-' => {
                        self.emit_char('-');
                        go!(self: to ScriptDataEscapedDashDash kind);
                    },
                    '<' => {
                        if kind == DoubleEscaped {
                            self.emit_char('<');
                        }
                        go!(self: to RawLessThanSign ScriptDataEscaped kind);
                    },
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                        go!(self: to RawData ScriptDataEscaped kind);
                    },
                    c => {
                        self.emit_char(c);
                        go!(self: to RawData ScriptDataEscaped kind);
                    },
                }
            },

            //§ script-data-escaped-dash-dash-state script-data-double-escaped-dash-dash-state
            states::ScriptDataEscapedDashDash(kind) => loop {
                match get_char!(self) {
                    '-' => self.emit_char('-'),
                    '<' => {
                        if kind == DoubleEscaped {
                            self.emit_char('<');
                        }
                        go!(self: to RawLessThanSign ScriptDataEscaped kind);
                    },
                    '>' => {
                        self.emit_char('>');
                        go!(self: to RawData ScriptData);
                    },
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        self.emit_char('\u{fffd}');
                        go!(self: to RawData ScriptDataEscaped kind);
                    },
                    c => {
                        self.emit_char(c);
                        go!(self: to RawData ScriptDataEscaped kind);
                    },
                }
            },

            //§ script-data-double-escape-end-state
            states::ScriptDataDoubleEscapeEnd => loop {
                let c = get_char!(self);
                match c {
                    '\t' | '\n' | '\x0C' | ' ' | '/' | '>' => {
                        let esc = if &*self.temp_buf == "script" {
                            Escaped
                        } else {
                            DoubleEscaped
                        };
                        self.emit_char(c);
                        go!(self: to RawData ScriptDataEscaped esc);
                    },
                    _ => match lower_ascii_letter(c) {
                        Some(cl) => {
                            go!(self: push_temp cl);
                            self.emit_char(c);
                        },
                        None => go!(self: reconsume RawData ScriptDataEscaped DoubleEscaped),
                    },
                }
            },

            //§ before-attribute-name-state
            states::BeforeAttributeName => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => (),
                    '/' => go!(self: to SelfClosingStartTag),
                    '>' => go!(self: emit_tag Data),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: create_attr '\u{fffd}'; to AttributeName);
                    },
                    c => match lower_ascii_letter(c) {
                        Some(cl) => go!(self: create_attr cl; to AttributeName),
                        None => {
                            match c {
                                '=' => {
                                    go!(self: error UnexpectedEqualsSignBeforeAttributeName)
                                },
                                '"' | '\'' | '<' => {
                                    go!(self: error UnexpectedCharacterInAttributeName)
                                },
                                _ => (),
                            }
                            go!(self: create_attr c; to AttributeName);
                        },
                    },
                }
            },

            //§ attribute-name-state
            states::AttributeName => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => go!(self: to AfterAttributeName),
                    '/' => go!(self: to SelfClosingStartTag),
                    '=' => go!(self: to BeforeAttributeValue),
                    '>' => go!(self: emit_tag Data),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_name '\u{fffd}');
                    },
                    c => match lower_ascii_letter(c) {
                        Some(cl) => go!(self: push_name cl),
                        None => {
                            if matches!(c, '"' | '\'' | '<') {
                                go!(self: error UnexpectedCharacterInAttributeName);
                            }
                            go!(self: push_name c);
                        },
                    },
                }
            },

            //§ after-attribute-name-state
            states::AfterAttributeName => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => (),
                    '/' => go!(self: to SelfClosingStartTag),
                    '=' => go!(self: to BeforeAttributeValue),
                    '>' => go!(self: emit_tag Data),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: create_attr '\u{fffd}'; to AttributeName);
                    },
                    c => match lower_ascii_letter(c) {
                        Some(cl) => go!(self: create_attr cl; to AttributeName),
                        None => {
                            if matches!(c, '"' | '\'' | '<') {
                                go!(self: error UnexpectedCharacterInAttributeName);
                            }
                            go!(self: create_attr c; to AttributeName);
                        },
                    },
                }
            },

            //§ before-attribute-value-state
            // Use peek so we can handle the first attr character along with
            // the rest, hopefully in the same buffer run.
            states::BeforeAttributeValue => loop {
                match peek!(self) {
                    '\t' | '\n' | '\r' | '\x0C' | ' ' => go!(self: discard_char),
                    '"' => go!(self: discard_char; to AttributeValue DoubleQuoted),
                    '\'' => go!(self: discard_char; to AttributeValue SingleQuoted),
                    '>' => {
                        go!(self: discard_char);
                        go!(self: error MissingAttributeValue);
                        go!(self: emit_tag Data);
                    },
                    _ => go!(self: to AttributeValue Unquoted),
                }
            },

            //§ attribute-value-(double-quoted)-state
            states::AttributeValue(DoubleQuoted) => loop {
                match pop_except_from!(self, delim_set!('\r' '"' '&' '\0' '\n')) {
                    Chunk::Delim('"') => go!(self: to AfterAttributeValueQuoted),
                    Chunk::Delim('&') => go!(self: consume_char_ref),
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_value '\u{fffd}');
                    },
                    Chunk::Delim(c) => go!(self: push_value c),
                    Chunk::Run(b) => go!(self: append_value (&b)),
                }
            },

            //§ attribute-value-(single-quoted)-state
            states::AttributeValue(SingleQuoted) => loop {
                match pop_except_from!(self, delim_set!('\r' '\'' '&' '\0' '\n')) {
                    Chunk::Delim('\'') => go!(self: to AfterAttributeValueQuoted),
                    Chunk::Delim('&') => go!(self: consume_char_ref),
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_value '\u{fffd}');
                    },
                    Chunk::Delim(c) => go!(self: push_value c),
                    Chunk::Run(b) => go!(self: append_value (&b)),
                }
            },

            //§ attribute-value-(unquoted)-state
            states::AttributeValue(Unquoted) => loop {
                match pop_except_from!(self, delim_set!('\r' '\t' '\n' '\x0C' ' ' '&' '>' '\0')) {
                    Chunk::Delim('\t') | Chunk::Delim('\n') | Chunk::Delim('\x0C')
                    | Chunk::Delim(' ') => go!(self: to BeforeAttributeName),
                    Chunk::Delim('&') => go!(self: consume_char_ref),
                    Chunk::Delim('>') => go!(self: emit_tag Data),
                    Chunk::Delim('\0') => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_value '\u{fffd}');
                    },
                    Chunk::Delim(c) => {
                        if matches!(c, '"' | '\'' | '<' | '=' | '`') {
                            go!(self: error UnexpectedCharacterInUnquotedAttributeValue);
                        }
                        go!(self: push_value c);
                    },
                    Chunk::Run(b) => go!(self: append_value (&b)),
                }
            },

            //§ after-attribute-value-(quoted)-state
            states::AfterAttributeValueQuoted => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => go!(self: to BeforeAttributeName),
                    '/' => go!(self: to SelfClosingStartTag),
                    '>' => go!(self: emit_tag Data),
                    _ => {
                        go!(self: error MissingWhitespaceBetweenAttributes);
                        go!(self: reconsume BeforeAttributeName);
                    },
                }
            },

            //§ self-closing-start-tag-state
            states::SelfClosingStartTag => loop {
                match get_char!(self) {
                    '>' => {
                        self.current_tag_self_closing = true;
                        go!(self: emit_tag Data);
                    },
                    _ => {
                        go!(self: error UnexpectedSolidusInTag);
                        go!(self: reconsume BeforeAttributeName);
                    },
                }
            },

            //§ comment-start-state
            states::CommentStart => loop {
                match get_char!(self) {
                    '-' => go!(self: to CommentStartDash),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_comment '\u{fffd}'; to Comment);
                    },
                    '>' => {
                        go!(self: error AbruptClosingOfEmptyComment);
                        go!(self: emit_comment; to Data);
                    },
                    c => go!(self: push_comment c; to Comment),
                }
            },

            //§ comment-start-dash-state
            states::CommentStartDash => loop {
                match get_char!(self) {
                    '-' => go!(self: to CommentEnd),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: append_comment "-\u{fffd}"; to Comment);
                    },
                    '>' => {
                        go!(self: error AbruptClosingOfEmptyComment);
                        go!(self: emit_comment; to Data);
                    },
                    c => go!(self: push_comment '-'; push_comment c; to Comment),
                }
            },

            //§ comment-state
            states::Comment => loop {
                match get_char!(self) {
                    c @ '<' => go!(self: push_comment c; to CommentLessThanSign),
                    '-' => go!(self: to CommentEndDash),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_comment '\u{fffd}');
                    },
                    c => go!(self: push_comment c),
                }
            },

            //§ comment-less-than-sign-state
            states::CommentLessThanSign => loop {
                match get_char!(self) {
                    c @ '!' => go!(self: push_comment c; to CommentLessThanSignBang),
                    c @ '<' => go!(self: push_comment c),
                    _ => go!(self: reconsume Comment),
                }
            },

            //§ comment-less-than-sign-bang
            states::CommentLessThanSignBang => loop {
                match get_char!(self) {
                    '-' => go!(self: to CommentLessThanSignBangDash),
                    _ => go!(self: reconsume Comment),
                }
            },

            //§ comment-less-than-sign-bang-dash
            states::CommentLessThanSignBangDash => loop {
                match get_char!(self) {
                    '-' => go!(self: to CommentLessThanSignBangDashDash),
                    _ => go!(self: reconsume CommentEndDash),
                }
            },

            //§ comment-less-than-sign-bang-dash-dash
            states::CommentLessThanSignBangDashDash => loop {
                match get_char!(self) {
                    '>' => go!(self: reconsume CommentEnd),
                    _ => {
                        go!(self: error NestedComment);
                        go!(self: reconsume CommentEnd);
                    },
                }
            },

            //§ comment-end-dash-state
            states::CommentEndDash => loop {
                match get_char!(self) {
                    '-' => go!(self: to CommentEnd),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: append_comment "-\u{fffd}"; to Comment);
                    },
                    c => go!(self: push_comment '-'; push_comment c; to Comment),
                }
            },

            //§ comment-end-state
            states::CommentEnd => loop {
                match get_char!(self) {
                    '>' => go!(self: emit_comment; to Data),
                    '!' => go!(self: to CommentEndBang),
                    '-' => go!(self: push_comment '-'),
                    _ => go!(self: append_comment "--"; reconsume Comment),
                }
            },

            //§ comment-end-bang-state
            states::CommentEndBang => loop {
                match get_char!(self) {
                    '-' => go!(self: append_comment "--!"; to CommentEndDash),
                    '>' => {
                        go!(self: error IncorrectlyClosedComment);
                        go!(self: emit_comment; to Data);
                    },
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: append_comment "--!\u{fffd}"; to Comment);
                    },
                    c => go!(self: append_comment "--!"; push_comment c; to Comment),
                }
            },

            //§ doctype-state
            states::Doctype => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => go!(self: to BeforeDoctypeName),
                    '>' => go!(self: reconsume BeforeDoctypeName),
                    _ => {
                        go!(self: error MissingWhitespaceBeforeDoctypeName);
                        go!(self: reconsume BeforeDoctypeName);
                    },
                }
            },

            //§ before-doctype-name-state
            states::BeforeDoctypeName => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => (),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: create_doctype; push_doctype_name '\u{fffd}'; to DoctypeName);
                    },
                    '>' => {
                        go!(self: error MissingDoctypeName);
                        go!(self: create_doctype; force_quirks; emit_doctype; to Data);
                    },
                    c => go!(self: create_doctype; push_doctype_name (c.to_ascii_lowercase());
                                  to DoctypeName),
                }
            },

            //§ doctype-name-state
            states::DoctypeName => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => go!(self: clear_temp; to AfterDoctypeName),
                    '>' => go!(self: emit_doctype; to Data),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_doctype_name '\u{fffd}');
                    },
                    c => go!(self: push_doctype_name (c.to_ascii_lowercase())),
                }
            },

            //§ after-doctype-name-state
            states::AfterDoctypeName => loop {
                if self.eat("public", u8::eq_ignore_ascii_case) {
                    go!(self: to AfterDoctypeKeyword Public);
                } else if self.eat("system", u8::eq_ignore_ascii_case) {
                    go!(self: to AfterDoctypeKeyword System);
                } else {
                    match get_char!(self) {
                        '\t' | '\n' | '\x0C' | ' ' => (),
                        '>' => go!(self: emit_doctype; to Data),
                        _ => {
                            go!(self: error InvalidCharacterSequenceAfterDoctypeName);
                            go!(self: force_quirks; reconsume BogusDoctype);
                        },
                    }
                }
            },

            //§ after-doctype-public-keyword-state after-doctype-system-keyword-state
            states::AfterDoctypeKeyword(kind) => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => go!(self: to BeforeDoctypeIdentifier kind),
                    '"' => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::MissingWhitespaceAfterDoctypePublicKeyword,
                            System => ErrorCode::MissingWhitespaceAfterDoctypeSystemKeyword,
                        });
                        go!(self: clear_doctype_id kind; to DoctypeIdentifierDoubleQuoted kind);
                    },
                    '\'' => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::MissingWhitespaceAfterDoctypePublicKeyword,
                            System => ErrorCode::MissingWhitespaceAfterDoctypeSystemKeyword,
                        });
                        go!(self: clear_doctype_id kind; to DoctypeIdentifierSingleQuoted kind);
                    },
                    '>' => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::MissingDoctypePublicIdentifier,
                            System => ErrorCode::MissingDoctypeSystemIdentifier,
                        });
                        go!(self: force_quirks; emit_doctype; to Data);
                    },
                    _ => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::MissingQuoteBeforeDoctypePublicIdentifier,
                            System => ErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                        });
                        go!(self: force_quirks; reconsume BogusDoctype);
                    },
                }
            },

            //§ before-doctype-public-identifier-state before-doctype-system-identifier-state
            states::BeforeDoctypeIdentifier(kind) => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => (),
                    '"' => go!(self: clear_doctype_id kind; to DoctypeIdentifierDoubleQuoted kind),
                    '\'' => go!(self: clear_doctype_id kind; to DoctypeIdentifierSingleQuoted kind),
                    '>' => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::MissingDoctypePublicIdentifier,
                            System => ErrorCode::MissingDoctypeSystemIdentifier,
                        });
                        go!(self: force_quirks; emit_doctype; to Data);
                    },
                    _ => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::MissingQuoteBeforeDoctypePublicIdentifier,
                            System => ErrorCode::MissingQuoteBeforeDoctypeSystemIdentifier,
                        });
                        go!(self: force_quirks; reconsume BogusDoctype);
                    },
                }
            },

            //§ doctype-public-identifier-(double-quoted)-state doctype-system-identifier-(double-quoted)-state
            states::DoctypeIdentifierDoubleQuoted(kind) => loop {
                match get_char!(self) {
                    '"' => go!(self: to AfterDoctypeIdentifier kind),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_doctype_id kind, '\u{fffd}');
                    },
                    '>' => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::AbruptDoctypePublicIdentifier,
                            System => ErrorCode::AbruptDoctypeSystemIdentifier,
                        });
                        go!(self: force_quirks; emit_doctype; to Data);
                    },
                    c => go!(self: push_doctype_id kind, c),
                }
            },

            //§ doctype-public-identifier-(single-quoted)-state doctype-system-identifier-(single-quoted)-state
            states::DoctypeIdentifierSingleQuoted(kind) => loop {
                match get_char!(self) {
                    '\'' => go!(self: to AfterDoctypeIdentifier kind),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_doctype_id kind, '\u{fffd}');
                    },
                    '>' => {
                        self.bad_char_error(match kind {
                            Public => ErrorCode::AbruptDoctypePublicIdentifier,
                            System => ErrorCode::AbruptDoctypeSystemIdentifier,
                        });
                        go!(self: force_quirks; emit_doctype; to Data);
                    },
                    c => go!(self: push_doctype_id kind, c),
                }
            },

            //§ after-doctype-public-identifier-state
            states::AfterDoctypeIdentifier(Public) => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => {
                        go!(self: to BetweenDoctypePublicAndSystemIdentifiers)
                    },
                    '>' => go!(self: emit_doctype; to Data),
                    '"' => {
                        go!(self: error MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers);
                        go!(self: clear_doctype_id System; to DoctypeIdentifierDoubleQuoted System);
                    },
                    '\'' => {
                        go!(self: error MissingWhitespaceBetweenDoctypePublicAndSystemIdentifiers);
                        go!(self: clear_doctype_id System; to DoctypeIdentifierSingleQuoted System);
                    },
                    _ => {
                        go!(self: error MissingQuoteBeforeDoctypeSystemIdentifier);
                        go!(self: force_quirks; reconsume BogusDoctype);
                    },
                }
            },

            //§ after-doctype-system-identifier-state
            states::AfterDoctypeIdentifier(System) => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => (),
                    '>' => go!(self: emit_doctype; to Data),
                    _ => {
                        go!(self: error UnexpectedCharacterAfterDoctypeSystemIdentifier);
                        go!(self: reconsume BogusDoctype);
                    },
                }
            },

            //§ between-doctype-public-and-system-identifiers-state
            states::BetweenDoctypePublicAndSystemIdentifiers => loop {
                match get_char!(self) {
                    '\t' | '\n' | '\x0C' | ' ' => (),
                    '>' => go!(self: emit_doctype; to Data),
                    '"' => {
                        go!(self: clear_doctype_id System; to DoctypeIdentifierDoubleQuoted System)
                    },
                    '\'' => {
                        go!(self: clear_doctype_id System; to DoctypeIdentifierSingleQuoted System)
                    },
                    _ => {
                        go!(self: error MissingQuoteBeforeDoctypeSystemIdentifier);
                        go!(self: force_quirks; reconsume BogusDoctype);
                    },
                }
            },

            //§ bogus-doctype-state
            states::BogusDoctype => loop {
                match get_char!(self) {
                    '>' => go!(self: emit_doctype; to Data),
                    '\0' => go!(self: error UnexpectedNullCharacter),
                    _ => (),
                }
            },

            //§ bogus-comment-state
            states::BogusComment => loop {
                match get_char!(self) {
                    '>' => go!(self: emit_comment; to Data),
                    '\0' => {
                        go!(self: error UnexpectedNullCharacter);
                        go!(self: push_comment '\u{fffd}');
                    },
                    c => go!(self: push_comment c),
                }
            },

            //§ markup-declaration-open-state
            states::MarkupDeclarationOpen => loop {
                if self.eat("--", u8::eq) {
                    go!(self: clear_comment; to CommentStart);
                } else if self.eat("doctype", u8::eq_ignore_ascii_case) {
                    go!(self: to Doctype);
                } else if self.eat("[CDATA[", u8::eq) {
                    if self.sink.adjusted_current_node_in_foreign_content() {
                        go!(self: clear_temp; to CdataSection);
                    }
                    // In HTML content the section becomes a bogus comment
                    // that keeps the literal "[CDATA[" prefix.
                    go!(self: error CdataInHtmlContent);
                    go!(self: clear_comment; append_comment "[CDATA["; to BogusComment);
                } else {
                    go!(self: error IncorrectlyOpenedComment);
                    go!(self: clear_comment; reconsume BogusComment);
                }
            },

            //§ cdata-section-state
            states::CdataSection => loop {
                match get_char!(self) {
                    ']' => go!(self: to CdataSectionBracket),
                    '\0' => {
                        self.emit_temp_buf();
                        self.emit_char('\0');
                    },
                    c => go!(self: push_temp c),
                }
            },

            //§ cdata-section-bracket
            states::CdataSectionBracket => match get_char!(self) {
                ']' => go!(self: to CdataSectionEnd),
                _ => go!(self: push_temp ']'; reconsume CdataSection),
            },

            //§ cdata-section-end
            states::CdataSectionEnd => loop {
                match get_char!(self) {
                    ']' => go!(self: push_temp ']'),
                    '>' => {
                        self.emit_temp_buf();
                        go!(self: to Data);
                    },
                    _ => go!(self: push_temp ']'; push_temp ']'; reconsume CdataSection),
                }
            },
            //§ END
        }
    }

    fn step_char_ref_tokenizer(&mut self) -> ProcessResult {
        // Take the sub-tokenizer out so it can borrow us mutably.
        let mut tok = self.char_ref_tokenizer.take().unwrap();
        match tok.step(self) {
            Status::Done(char_ref) => {
                self.process_char_ref(char_ref);
                ProcessResult::Continue
            },
            Status::Stuck => {
                self.char_ref_tokenizer = Some(tok);
                ProcessResult::Suspend
            },
            Status::Progress => {
                self.char_ref_tokenizer = Some(tok);
                ProcessResult::Continue
            },
        }
    }

    fn process_char_ref(&mut self, char_ref: CharRef) {
        let CharRef {
            mut chars,
            mut num_chars,
        } = char_ref;

        if num_chars == 0 {
            chars[0] = '&';
            num_chars = 1;
        }

        for i in 0..num_chars {
            let c = chars[i as usize];
            match self.state {
                states::Data | states::RawData(states::Rcdata) => self.emit_char(c),

                states::AttributeValue(_) => self.current_attr_value.push_char(c),

                _ => panic!(
                    "state {:?} should not be reachable in process_char_ref",
                    self.state
                ),
            }
        }
    }

    /// Finish tokenization: resolve a pending character reference, process
    /// whatever it un-consumed, then run the per-state end-of-file rules.
    fn end(&mut self) {
        if let Some(mut tok) = self.char_ref_tokenizer.take() {
            let char_ref = tok.end_of_file(self);
            self.process_char_ref(char_ref);
        }

        // A character reference can un-consume input; tokenize it.
        while let ProcessResult::Continue = self.step() {}

        loop {
            match self.eof_step() {
                ProcessResult::Continue => (),
                ProcessResult::Suspend => break,
            }
        }

        self.sink.end();
    }

    fn eof_step(&mut self) -> ProcessResult {
        debug!("processing EOF in state {:?}", self.state);
        match self.state {
            states::Data
            | states::RawData(Rcdata)
            | states::RawData(Rawtext)
            | states::RawData(ScriptData)
            | states::Plaintext => go!(self: eof),

            states::RawData(ScriptDataEscaped(_))
            | states::ScriptDataEscapedDash(_)
            | states::ScriptDataEscapedDashDash(_) => {
                go!(self: error EofInScriptHtmlCommentLikeText);
                go!(self: to Data);
            },

            states::AttributeValue(DoubleQuoted) => {
                go!(self: error EofInAttributeValueDoubleQuoted);
                go!(self: to Data);
            },

            states::TagName
            | states::BeforeAttributeName
            | states::AttributeName
            | states::AfterAttributeName
            | states::AttributeValue(_)
            | states::AfterAttributeValueQuoted
            | states::SelfClosingStartTag => {
                go!(self: error EofInTag);
                go!(self: to Data);
            },

            states::BeforeAttributeValue => go!(self: reconsume AttributeValue Unquoted),

            states::TagOpen => {
                go!(self: error EofBeforeTagName);
                self.emit_char('<');
                go!(self: to Data);
            },

            states::EndTagOpen => {
                go!(self: error EofBeforeTagName);
                self.emit_char('<');
                self.emit_char('/');
                go!(self: to Data);
            },

            states::RawLessThanSign(ScriptDataEscaped(DoubleEscaped)) => {
                go!(self: to RawData ScriptDataEscaped DoubleEscaped)
            },

            states::RawLessThanSign(kind) => {
                self.emit_char('<');
                go!(self: to RawData kind);
            },

            states::RawEndTagOpen(kind) => {
                self.emit_char('<');
                self.emit_char('/');
                go!(self: to RawData kind);
            },

            states::RawEndTagName(kind) => {
                self.emit_char('<');
                self.emit_char('/');
                self.emit_temp_buf();
                go!(self: to RawData kind);
            },

            states::ScriptDataEscapeStart(kind) => go!(self: to RawData ScriptDataEscaped kind),

            states::ScriptDataEscapeStartDash => go!(self: to RawData ScriptData),

            states::ScriptDataDoubleEscapeEnd => {
                go!(self: to RawData ScriptDataEscaped DoubleEscaped)
            },

            states::CommentStart
            | states::CommentStartDash
            | states::Comment
            | states::CommentEndDash
            | states::CommentEnd
            | states::CommentEndBang => {
                go!(self: error EofInComment);
                go!(self: emit_comment; to Data);
            },

            states::CommentLessThanSign | states::CommentLessThanSignBang => {
                go!(self: reconsume Comment)
            },

            states::CommentLessThanSignBangDash => go!(self: reconsume CommentEndDash),

            states::CommentLessThanSignBangDashDash => go!(self: reconsume CommentEnd),

            states::Doctype | states::BeforeDoctypeName => {
                go!(self: error EofInDoctype);
                go!(self: create_doctype; force_quirks; emit_doctype; to Data);
            },

            states::DoctypeName
            | states::AfterDoctypeName
            | states::AfterDoctypeKeyword(_)
            | states::BeforeDoctypeIdentifier(_)
            | states::DoctypeIdentifierDoubleQuoted(_)
            | states::DoctypeIdentifierSingleQuoted(_)
            | states::AfterDoctypeIdentifier(_)
            | states::BetweenDoctypePublicAndSystemIdentifiers => {
                go!(self: error EofInDoctype);
                go!(self: force_quirks; emit_doctype; to Data);
            },

            states::BogusDoctype => go!(self: emit_doctype; to Data),

            states::BogusComment => go!(self: emit_comment; to Data),

            states::MarkupDeclarationOpen => {
                go!(self: error IncorrectlyOpenedComment);
                go!(self: clear_comment; to BogusComment);
            },

            states::CdataSection => {
                self.emit_temp_buf();
                go!(self: error EofInCdata);
                go!(self: to Data);
            },

            states::CdataSectionBracket => go!(self: push_temp ']'; to CdataSection),

            states::CdataSectionEnd => go!(self: push_temp ']'; push_temp ']'; to CdataSection),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::errors::Position;

    /// A sink that records every token it sees.
    #[derive(Default)]
    struct Collector {
        tokens: Vec<Token>,
    }

    impl TokenSink for Collector {
        fn process_token(&mut self, token: Token, _position: Position) -> TokenSinkResult {
            self.tokens.push(token);
            TokenSinkResult::Continue
        }
    }

    fn tokenize(input: &str) -> Vec<Token> {
        let mut tok = Tokenizer::new(Collector::default(), TokenizerOpts::default());
        tok.run(input);
        tok.into_sink().tokens
    }

    fn text_of(tokens: &[Token]) -> String {
        let mut out = String::new();
        for t in tokens {
            match t {
                Token::Characters(s) => out.push_str(s),
                Token::NullCharacter => out.push('\0'),
                _ => (),
            }
        }
        out
    }

    #[test]
    fn simple_tag_with_attrs() {
        let tokens = tokenize("<DIV Class=\"a\" class=b id=c>");
        let Token::Tag(tag) = &tokens[0] else {
            panic!("expected a tag");
        };
        assert_eq!(&*tag.name, "div");
        // Duplicate `class` is dropped, first value wins.
        assert_eq!(tag.attrs.len(), 2);
        assert_eq!(&*tag.attrs[0].name.local, "class");
        assert_eq!(&*tag.attrs[0].value, "a");
        assert_eq!(&*tag.attrs[1].name.local, "id");
    }

    #[test]
    fn lone_less_than_is_text() {
        assert_eq!(text_of(&tokenize("<")), "<");
        assert_eq!(text_of(&tokenize("</")), "</");
    }

    #[test]
    fn empty_comment() {
        let tokens = tokenize("<!---->");
        match &tokens[0] {
            Token::Comment(text) => assert_eq!(&**text, ""),
            other => panic!("expected comment, got {other:?}"),
        }
    }

    #[test]
    fn entities_in_data() {
        // Longest legacy prefix match, then an unmatched remainder,
        // then numeric escapes.
        assert_eq!(
            text_of(&tokenize("&amp;&notit;&#x41;&#99999999;")),
            "&\u{ac}it;A\u{fffd}"
        );
    }

    #[test]
    fn entity_without_semicolon_in_attribute() {
        // "&copy" followed by an alphanumeric must not decode in an
        // attribute value.
        let tokens = tokenize("<a href=\"?a=b&copyright=1\">");
        let Token::Tag(tag) = &tokens[0] else {
            panic!("expected a tag");
        };
        assert_eq!(&*tag.attrs[0].value, "?a=b&copyright=1");

        // But it does decode in data.
        assert_eq!(text_of(&tokenize("&copyright")), "\u{a9}right");
    }

    #[test]
    fn newline_normalization() {
        assert_eq!(text_of(&tokenize("a\r\nb\rc")), "a\nb\nc");
    }

    #[test]
    fn doctype_with_ids() {
        let tokens = tokenize(
            "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">",
        );
        match &tokens[0] {
            Token::Doctype(d) => {
                assert_eq!(d.name.as_deref(), Some("html"));
                assert_eq!(d.public_id.as_deref(), Some("-//W3C//DTD HTML 4.01//EN"));
                assert_eq!(
                    d.system_id.as_deref(),
                    Some("http://www.w3.org/TR/html4/strict.dtd")
                );
                assert!(!d.force_quirks);
            },
            other => panic!("expected doctype, got {other:?}"),
        }
    }

    #[test]
    fn self_closing_flag() {
        let tokens = tokenize("<br/>");
        match &tokens[0] {
            Token::Tag(tag) => assert!(tag.self_closing),
            other => panic!("expected tag, got {other:?}"),
        }
    }

    #[test]
    fn errors_collected_with_positions() {
        let opts = TokenizerOpts {
            collect_errors: true,
            ..Default::default()
        };
        let mut tok = Tokenizer::new(Collector::default(), opts);
        tok.run("a\n<p x=1 x=2>");
        let tokens = tok.into_sink().tokens;
        let errors: Vec<_> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Error(e) => Some(*e),
                _ => None,
            })
            .collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ErrorCode::DuplicateAttribute);
        assert_eq!(errors[0].position.line, 2);
    }

    #[test]
    fn cdata_is_bogus_comment_in_html() {
        let tokens = tokenize("<![CDATA[x]]>");
        match &tokens[0] {
            Token::Comment(text) => assert_eq!(&**text, "[CDATA[x]]"),
            other => panic!("expected comment, got {other:?}"),
        }
    }
}
