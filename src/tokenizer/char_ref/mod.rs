//! The character reference sub-tokenizer, driven one character at a time
//! by the main state machine while it sits in a "consume a character
//! reference" position.

use log::debug;
use std::char::from_u32;
use tendril::StrTendril;

use super::{TokenSink, Tokenizer};
use crate::data;
use crate::errors::ErrorCode;

pub(super) struct CharRef {
    /// The resulting character(s).
    pub(super) chars: [char; 2],

    /// How many slots in `chars` are valid?
    pub(super) num_chars: u8,
}

impl CharRef {
    pub(super) const EMPTY: CharRef = CharRef {
        chars: ['\0', '\0'],
        num_chars: 0,
    };
}

pub(super) enum Status {
    Stuck,
    Progress,
    Done(CharRef),
}

#[derive(Debug)]
enum State {
    Begin,
    Octothorpe,
    Numeric(u32), // base
    NumericSemicolon,
    Named,
    BogusName,
}

pub(super) struct CharRefTokenizer {
    state: State,
    is_consumed_in_attribute: bool,

    num: u32,
    num_too_big: bool,
    seen_digit: bool,
    hex_marker: Option<char>,

    name_buf: StrTendril,
    name_match: Option<[u32; 2]>,
    name_len: usize,
}

impl CharRefTokenizer {
    pub(super) fn new(is_consumed_in_attribute: bool) -> CharRefTokenizer {
        CharRefTokenizer {
            state: State::Begin,
            is_consumed_in_attribute,
            num: 0,
            num_too_big: false,
            seen_digit: false,
            hex_marker: None,
            name_buf: StrTendril::new(),
            name_match: None,
            name_len: 0,
        }
    }

    fn finish_one(&mut self, c: char) -> Status {
        Status::Done(CharRef {
            chars: [c, '\0'],
            num_chars: 1,
        })
    }

    pub(super) fn step<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        debug!("char ref tokenizer stepping in state {:?}", self.state);
        match self.state {
            State::Begin => self.do_begin(tokenizer),
            State::Octothorpe => self.do_octothorpe(tokenizer),
            State::Numeric(base) => self.do_numeric(tokenizer, base),
            State::NumericSemicolon => self.do_numeric_semicolon(tokenizer),
            State::Named => self.do_named(tokenizer),
            State::BogusName => self.do_bogus_name(tokenizer),
        }
    }

    fn do_begin<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        match tokenizer.peek_input() {
            Some('a'..='z' | 'A'..='Z' | '0'..='9') => {
                self.state = State::Named;
                Status::Progress
            },
            Some('#') => {
                tokenizer.discard_input_char();
                self.state = State::Octothorpe;
                Status::Progress
            },
            Some(_) => Status::Done(CharRef::EMPTY),
            None => Status::Stuck,
        }
    }

    fn do_octothorpe<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        match tokenizer.peek_input() {
            Some(c @ ('x' | 'X')) => {
                tokenizer.discard_input_char();
                self.hex_marker = Some(c);
                self.state = State::Numeric(16);
            },
            Some(_) => {
                self.hex_marker = None;
                self.state = State::Numeric(10);
            },
            None => return Status::Stuck,
        }
        Status::Progress
    }

    fn do_numeric<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>, base: u32) -> Status {
        let Some(c) = tokenizer.peek_input() else {
            return Status::Stuck;
        };
        match c.to_digit(base) {
            Some(n) => {
                tokenizer.discard_input_char();
                self.num = self.num.wrapping_mul(base);
                if self.num > 0x10FFFF {
                    // Overflow is possible past here; keep parsing digits
                    // but ignore the accumulated value.
                    self.num_too_big = true;
                }
                self.num = self.num.wrapping_add(n);
                self.seen_digit = true;
                Status::Progress
            },

            None if !self.seen_digit => self.unconsume_numeric(tokenizer),

            None => {
                self.state = State::NumericSemicolon;
                Status::Progress
            },
        }
    }

    fn do_numeric_semicolon<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        match tokenizer.peek_input() {
            Some(';') => tokenizer.discard_input_char(),
            Some(_) => tokenizer.emit_error(ErrorCode::MissingSemicolonAfterCharacterReference),
            None => return Status::Stuck,
        }
        self.finish_numeric(tokenizer)
    }

    fn unconsume_numeric<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        match self.hex_marker {
            Some(c) => tokenizer.unconsume(&format!("#{c}")),
            None => tokenizer.unconsume("#"),
        }
        tokenizer.emit_error(ErrorCode::AbsenceOfDigitsInNumericCharacterReference);
        Status::Done(CharRef::EMPTY)
    }

    fn finish_numeric<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        fn conv(n: u32) -> char {
            from_u32(n).expect("invalid char missed by error handling cases")
        }

        let (c, error) = match self.num {
            n if n > 0x10FFFF || self.num_too_big => (
                '\u{fffd}',
                Some(ErrorCode::CharacterReferenceOutsideUnicodeRange),
            ),
            0x00 => ('\u{fffd}', Some(ErrorCode::NullCharacterReference)),
            0xD800..=0xDFFF => ('\u{fffd}', Some(ErrorCode::SurrogateCharacterReference)),

            n @ 0x80..=0x9F => match data::C1_REPLACEMENTS[(n - 0x80) as usize] {
                Some(c) => (c, Some(ErrorCode::ControlCharacterReference)),
                None => (conv(n), Some(ErrorCode::ControlCharacterReference)),
            },

            n @ (0x01..=0x08 | 0x0B | 0x0D..=0x1F | 0x7F) => {
                (conv(n), Some(ErrorCode::ControlCharacterReference))
            },

            n if (0xFDD0..=0xFDEF).contains(&n) || (n & 0xFFFE) == 0xFFFE => {
                (conv(n), Some(ErrorCode::NoncharacterCharacterReference))
            },

            n => (conv(n), None),
        };

        if let Some(code) = error {
            tokenizer.emit_error(code);
        }
        self.finish_one(c)
    }

    fn do_named<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        // peek + discard skips newline normalization, which keeps
        // un-consumption exact.
        let Some(c) = tokenizer.peek_input() else {
            return Status::Stuck;
        };
        tokenizer.discard_input_char();
        self.name_buf.push_char(c);
        match data::entity_lookup(&self.name_buf) {
            data::EntityLookup::Terminal(chars) => {
                // A full match, but a longer one may still come (&not is
                // terminal, &notin; continues past it).
                self.name_match = Some(chars);
                self.name_len = self.name_buf.len();
                Status::Progress
            },
            data::EntityLookup::Prefix => Status::Progress,
            data::EntityLookup::Missing => self.finish_named(tokenizer, Some(c)),
        }
    }

    fn unconsume_name<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) {
        tokenizer.unconsume(&self.name_buf);
        self.name_buf.clear();
    }

    fn finish_named<Sink: TokenSink>(
        &mut self,
        tokenizer: &mut Tokenizer<Sink>,
        end_char: Option<char>,
    ) -> Status {
        let Some(chars) = self.name_match else {
            match end_char {
                Some(c) if c.is_ascii_alphanumeric() => {
                    // Keep scanning for a semicolon to decide whether this
                    // is an unknown reference or just an ampersand.
                    self.state = State::BogusName;
                    return Status::Progress;
                },
                Some(';') if self.name_buf.len() > 1 => {
                    tokenizer.emit_error(ErrorCode::UnknownNamedCharacterReference);
                },
                _ => (),
            }
            self.unconsume_name(tokenizer);
            return Status::Done(CharRef::EMPTY);
        };

        // We have a match, but may have consumed characters beyond it.
        //
        //     &not    => match for U+00AC
        //     &noti   => valid prefix for &notin
        //     &notit  => can't continue match
        let name_len = self.name_len;
        assert!(name_len > 0);
        let last_matched = self.name_buf[name_len - 1..].chars().next().unwrap();
        let next_after = self.name_buf[name_len..].chars().next();

        // In an attribute, a match not ending in ';' followed by '=' or an
        // alphanumeric is flushed as literal text, for historical reasons.
        let unconsume_all = match (self.is_consumed_in_attribute, last_matched, next_after) {
            (_, ';', _) => false,
            (true, _, Some('=')) => true,
            (true, _, Some(c)) if c.is_ascii_alphanumeric() => true,
            _ => {
                tokenizer.emit_error(ErrorCode::MissingSemicolonAfterCharacterReference);
                false
            },
        };

        if unconsume_all {
            self.unconsume_name(tokenizer);
            Status::Done(CharRef::EMPTY)
        } else {
            tokenizer.unconsume(&self.name_buf[name_len..]);
            Status::Done(CharRef {
                chars: [
                    from_u32(chars[0]).unwrap(),
                    from_u32(chars[1]).unwrap_or('\0'),
                ],
                num_chars: if chars[1] == 0 { 1 } else { 2 },
            })
        }
    }

    fn do_bogus_name<Sink: TokenSink>(&mut self, tokenizer: &mut Tokenizer<Sink>) -> Status {
        let Some(c) = tokenizer.peek_input() else {
            return Status::Stuck;
        };
        tokenizer.discard_input_char();
        self.name_buf.push_char(c);
        match c {
            _ if c.is_ascii_alphanumeric() => return Status::Progress,
            ';' => tokenizer.emit_error(ErrorCode::UnknownNamedCharacterReference),
            _ => (),
        }
        self.unconsume_name(tokenizer);
        Status::Done(CharRef::EMPTY)
    }

    pub(super) fn end_of_file<Sink: TokenSink>(
        &mut self,
        tokenizer: &mut Tokenizer<Sink>,
    ) -> CharRef {
        loop {
            let status = match self.state {
                State::Begin => Status::Done(CharRef::EMPTY),
                State::Numeric(_) if !self.seen_digit => self.unconsume_numeric(tokenizer),
                State::Numeric(_) | State::NumericSemicolon => {
                    tokenizer.emit_error(ErrorCode::MissingSemicolonAfterCharacterReference);
                    self.finish_numeric(tokenizer)
                },
                State::Named => self.finish_named(tokenizer, None),
                State::BogusName => {
                    self.unconsume_name(tokenizer);
                    Status::Done(CharRef::EMPTY)
                },
                State::Octothorpe => {
                    tokenizer.unconsume("#");
                    tokenizer.emit_error(ErrorCode::AbsenceOfDigitsInNumericCharacterReference);
                    Status::Done(CharRef::EMPTY)
                },
            };

            match status {
                Status::Done(char_ref) => return char_ref,
                Status::Stuck => return CharRef::EMPTY,
                Status::Progress => {},
            }
        }
    }
}
