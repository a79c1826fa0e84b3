//! Lenient HTML tokenizer on top of `quick-xml`.
//!
//! Produces start tag, end tag, text and "other" tokens in document order.
//! Every token carries the raw source slice it was read from, so markup that
//! is not rewritten can be copied to the output byte for byte.
//!
//! `quick-xml` is an XML reader, so a few HTML rules are layered on top:
//! - end tag names are not checked against start tags
//! - attributes are parsed with HTML rules (unquoted and valueless values)
//! - the content of raw text elements (`script`, `style`, ...) is read up to
//!   the matching close tag without interpreting `<`
//! - adjacent text and entity references are merged into one text token

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::node::Attributes;

/// Elements whose content is text, never markup.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style", "textarea", "title"];

/// A single token with its raw source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Start(StartToken<'a>),
    End { name: String, raw: &'a str },
    Text(&'a str),
    /// Comments, doctype, processing instructions and CDATA.
    Other(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StartToken<'a> {
    /// Lower-cased tag name.
    pub(crate) name: String,
    pub(crate) attributes: Attributes,
    pub(crate) raw: &'a str,
    /// Written as `<name ... />`.
    pub(crate) self_closing: bool,
}

/// Token kind with byte offsets into the input.
enum RawKind {
    Start {
        name: String,
        attributes: Attributes,
        self_closing: bool,
    },
    End {
        name: String,
    },
    Text,
    Other,
}

struct RawToken {
    kind: RawKind,
    start: usize,
    end: usize,
}

pub(crate) struct Tokenizer<'a> {
    input: &'a str,
    /// Offset of the reader's slice within `input`.
    base: usize,
    reader: Reader<&'a [u8]>,
    /// Set after a raw text element opens; holds its name.
    raw_text_until: Option<String>,
    lookahead: Option<RawToken>,
    finished: bool,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(input: &'a str) -> Self {
        Self {
            input,
            base: 0,
            reader: html_reader(input),
            raw_text_until: None,
            lookahead: None,
            finished: false,
        }
    }

    /// Absolute position of the reader in `input`.
    fn offset(&self) -> usize {
        let relative = usize::try_from(self.reader.buffer_position())
            .unwrap_or(self.input.len() - self.base);
        (self.base + relative).min(self.input.len())
    }

    /// Restart reading at an absolute offset.
    fn seek(&mut self, offset: usize) {
        let input = self.input;
        self.base = offset;
        self.reader = html_reader(&input[offset..]);
    }

    fn read_raw(&mut self) -> Option<RawToken> {
        if let Some(token) = self.lookahead.take() {
            return Some(token);
        }
        if self.finished {
            return None;
        }

        let start = self.offset();

        if let Some(name) = self.raw_text_until.take() {
            let end = find_close_tag(&self.input[start..], &name)
                .map_or(self.input.len(), |offset| start + offset);
            if end > start {
                self.seek(end);
                return Some(RawToken {
                    kind: RawKind::Text,
                    start,
                    end,
                });
            }
        }

        let kind = match self.reader.read_event() {
            Ok(Event::Start(tag)) => {
                let (name, attributes) = decode_start(&tag);
                if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
                    self.raw_text_until = Some(name.clone());
                }
                RawKind::Start {
                    name,
                    attributes,
                    self_closing: false,
                }
            }
            Ok(Event::Empty(tag)) => {
                let (name, attributes) = decode_start(&tag);
                RawKind::Start {
                    name,
                    attributes,
                    self_closing: true,
                }
            }
            Ok(Event::End(tag)) => RawKind::End {
                name: String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase(),
            },
            Ok(Event::Text(_) | Event::GeneralRef(_)) => RawKind::Text,
            Ok(Event::Eof) => {
                self.finished = true;
                return None;
            }
            Ok(_) => RawKind::Other,
            Err(err) => {
                tracing::warn!(
                    position = start,
                    error = %err,
                    "Unreadable markup, passing the rest of the document through"
                );
                self.finished = true;
                return (start < self.input.len()).then(|| RawToken {
                    kind: RawKind::Text,
                    start,
                    end: self.input.len(),
                });
            }
        };

        Some(RawToken {
            kind,
            start,
            end: self.offset(),
        })
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        let input = self.input;
        let token = self.read_raw()?;
        let raw = &input[token.start..token.end];

        Some(match token.kind {
            RawKind::Start {
                name,
                attributes,
                self_closing,
            } => Token::Start(StartToken {
                name,
                attributes,
                raw,
                self_closing,
            }),
            RawKind::End { name } => Token::End { name, raw },
            RawKind::Other => Token::Other(raw),
            RawKind::Text => {
                let mut end = token.end;
                while let Some(next) = self.read_raw() {
                    if matches!(next.kind, RawKind::Text) && next.start == end {
                        end = next.end;
                    } else {
                        self.lookahead = Some(next);
                        break;
                    }
                }
                Token::Text(&input[token.start..end])
            }
        })
    }
}

fn html_reader(input: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;
    config.allow_dangling_amp = true;
    config.check_comments = false;
    config.expand_empty_elements = false;
    reader
}

fn decode_start(tag: &BytesStart<'_>) -> (String, Attributes) {
    let name = String::from_utf8_lossy(tag.name().as_ref()).to_ascii_lowercase();
    let mut attributes = Attributes::new();
    for attr in tag.html_attributes().with_checks(false).flatten() {
        attributes.insert(
            String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        );
    }
    (name, attributes)
}

/// Find `</name` (ASCII case-insensitive) followed by a tag boundary.
fn find_close_tag(haystack: &str, name: &str) -> Option<usize> {
    let bytes = haystack.as_bytes();
    let mut from = 0;
    while let Some(found) = haystack[from..].find("</") {
        let at = from + found;
        let name_end = at + 2 + name.len();
        let name_matches = bytes
            .get(at + 2..name_end)
            .is_some_and(|candidate| candidate.eq_ignore_ascii_case(name.as_bytes()));
        let boundary = bytes
            .get(name_end)
            .is_none_or(|b| b.is_ascii_whitespace() || *b == b'>' || *b == b'/');
        if name_matches && boundary {
            return Some(at);
        }
        from = at + 2;
    }
    None
}
