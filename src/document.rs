//! In-memory HTML document with addressable `<head>` and `<body>`.
//!
//! The template is tokenized with `quick-xml` in a lenient configuration
//! (no end-name or well-formedness checks, bare `&` and stray close tags
//! allowed), so ordinary HTML with void elements and unclosed tags streams
//! through. Entity references are never decoded: every event is written back
//! with its original bytes, and injected fragments are written raw. The
//! content of `<script>` and `<style>` is copied verbatim up to the matching
//! close tag, so markup inside string literals is not tokenized.
//!
//! Fragments queued with [`Document::append`] are emitted on serialization
//! right before `</head>` or `</body>`. A section missing from the template
//! is synthesized only when something was appended to it:
//!
//! - head: right after the `<html …>` start tag, or before the first element
//!   (after any doctype, comments and whitespace)
//! - body: right before `</html>`, or at the very end

use quick_xml::{
    Reader, Writer,
    events::{BytesStart, Event},
    name::QName,
};
use std::io::{BufRead, Cursor, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("HTML parse error at byte {position}: {source}")]
    Parse {
        position: u64,
        source: quick_xml::Error,
    },
    #[error("HTML write error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialized document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Insertion point for appended markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Head,
    Body,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Head => "head",
            Self::Body => "body",
        })
    }
}

/// Which structural elements the template declares.
#[derive(Debug, Default, Clone, Copy)]
struct Layout {
    has_html: bool,
    has_head: bool,
    has_body: bool,
    has_shortcut_icon: bool,
}

impl Layout {
    fn record(&mut self, elem: &BytesStart<'_>) {
        let name = elem.name();
        if is_tag(name, "html") {
            self.has_html = true;
        } else if is_tag(name, "head") {
            self.has_head = true;
        } else if is_tag(name, "body") {
            self.has_body = true;
        } else if is_icon_link(elem) {
            self.has_shortcut_icon = true;
        }
    }
}

#[derive(Debug)]
pub struct Document {
    markup: String,
    layout: Layout,
    head: Vec<String>,
    body: Vec<String>,
}

fn create_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    let config = reader.config_mut();
    config.trim_text(false);
    config.enable_all_checks(false);
    config.allow_dangling_amp = true;
    config.allow_unmatched_ends = true;
    reader
}

fn is_tag(name: QName<'_>, tag: &str) -> bool {
    name.as_ref().eq_ignore_ascii_case(tag.as_bytes())
}

/// Elements whose content is raw text, not markup.
fn raw_text_tag(name: QName<'_>) -> Option<&'static str> {
    ["script", "style"].into_iter().find(|tag| is_tag(name, tag))
}

/// Offset of the first `</tag` (any case) that really closes the element.
fn find_close_tag(haystack: &[u8], tag: &str) -> Option<usize> {
    let tag = tag.as_bytes();
    (0..haystack.len()).find(|&i| {
        let rest = &haystack[i..];
        rest.starts_with(b"</")
            && rest.len() >= 2 + tag.len()
            && rest[2..2 + tag.len()].eq_ignore_ascii_case(tag)
            && rest
                .get(2 + tag.len())
                .is_none_or(|&b| b == b'>' || b == b'/' || b.is_ascii_whitespace())
    })
}

/// Consume the content of a raw-text element right after its start tag.
/// The closing tag is left for the reader.
fn read_raw_text<'a>(reader: &mut Reader<&'a [u8]>, tag: &str) -> &'a [u8] {
    let rest: &'a [u8] = *reader.get_ref();
    let len = find_close_tag(rest, tag).unwrap_or(rest.len());
    reader.stream().consume(len);
    &rest[..len]
}

/// Events that may precede a synthesized `<head>` in a template with
/// neither `<html>` nor `<head>`.
fn is_prologue(event: &Event<'_>) -> bool {
    match event {
        Event::DocType(_) | Event::Decl(_) | Event::PI(_) | Event::Comment(_) => true,
        Event::Text(text) => text.iter().all(u8::is_ascii_whitespace),
        _ => false,
    }
}

fn is_icon_link(elem: &BytesStart<'_>) -> bool {
    is_tag(elem.name(), "link")
        && elem.html_attributes().flatten().any(|attr| {
            attr.key.as_ref().eq_ignore_ascii_case(b"rel")
                && matches!(
                    String::from_utf8_lossy(&attr.value).trim().to_ascii_lowercase().as_str(),
                    "icon" | "shortcut icon"
                )
        })
}

impl Document {
    /// Tokenize `markup` and record its head/body layout.
    pub fn parse(markup: impl Into<String>) -> Result<Self, DocumentError> {
        let markup = markup.into();
        let mut layout = Layout::default();
        let mut reader = create_reader(markup.as_bytes());

        loop {
            match reader.read_event() {
                Ok(Event::Start(elem)) => {
                    layout.record(&elem);
                    if let Some(tag) = raw_text_tag(elem.name()) {
                        read_raw_text(&mut reader, tag);
                    }
                }
                Ok(Event::Empty(elem)) => layout.record(&elem),
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(source) => {
                    return Err(DocumentError::Parse {
                        position: reader.error_position(),
                        source,
                    });
                }
            }
        }

        Ok(Self {
            markup,
            layout,
            head: Vec::new(),
            body: Vec::new(),
        })
    }

    /// Queue a raw markup fragment for `section`.
    pub fn append(&mut self, section: Section, fragment: impl Into<String>) {
        match section {
            Section::Head => self.head.push(fragment.into()),
            Section::Body => self.body.push(fragment.into()),
        }
    }

    /// Whether the template, or anything appended to head, declares a
    /// shortcut icon.
    pub fn has_shortcut_icon(&self) -> bool {
        self.layout.has_shortcut_icon
            || self
                .head
                .iter()
                .any(|fragment| fragment.contains("rel=\"shortcut icon\""))
    }

    /// Fragments queued so far for `section`.
    pub fn fragments(&self, section: Section) -> &[String] {
        match section {
            Section::Head => &self.head,
            Section::Body => &self.body,
        }
    }

    /// Serialize the template with all queued fragments in place.
    pub fn to_html(&self) -> Result<String, DocumentError> {
        let extra: usize = self.head.iter().chain(&self.body).map(String::len).sum();
        let mut writer = Writer::new(Cursor::new(Vec::with_capacity(
            self.markup.len() + extra + 32,
        )));
        let mut reader = create_reader(self.markup.as_bytes());
        let mut head_done = false;
        let mut body_done = false;
        // no <html> to hang it on: head goes before the first real content
        let mut head_pending = !self.layout.has_html && !self.layout.has_head;

        loop {
            let event = match reader.read_event() {
                Ok(Event::Eof) => break,
                Ok(event) => event,
                Err(source) => {
                    return Err(DocumentError::Parse {
                        position: reader.error_position(),
                        source,
                    });
                }
            };
            if head_pending && !is_prologue(&event) {
                self.write_wrapped(&mut writer, Section::Head)?;
                head_pending = false;
                head_done = true;
            }

            match event {
                Event::Start(elem) => {
                    let name = elem.name();
                    let raw_text = raw_text_tag(name);
                    if is_tag(name, "html") {
                        writer.write_event(Event::Start(elem))?;
                        if !self.layout.has_head && !head_done {
                            self.write_wrapped(&mut writer, Section::Head)?;
                            head_done = true;
                        }
                    } else if is_tag(name, "body") && !head_done {
                        // `<head>` was never closed
                        self.write_fragments(&mut writer, Section::Head)?;
                        head_done = true;
                        writer.write_event(Event::Start(elem))?;
                    } else {
                        writer.write_event(Event::Start(elem))?;
                    }
                    if let Some(tag) = raw_text {
                        let text = read_raw_text(&mut reader, tag);
                        writer.get_mut().write_all(text)?;
                    }
                }
                Event::End(elem) => {
                    let name = elem.name();
                    if is_tag(name, "head") && !head_done {
                        self.write_fragments(&mut writer, Section::Head)?;
                        head_done = true;
                    } else if is_tag(name, "body") && !body_done {
                        self.write_fragments(&mut writer, Section::Body)?;
                        body_done = true;
                    } else if is_tag(name, "html") && !self.layout.has_body && !body_done {
                        self.write_wrapped(&mut writer, Section::Body)?;
                        body_done = true;
                    }
                    writer.write_event(Event::End(elem))?;
                }
                event => writer.write_event(event)?,
            }
        }

        if head_pending {
            self.write_wrapped(&mut writer, Section::Head)?;
            head_done = true;
        }
        if !head_done {
            self.write_fragments(&mut writer, Section::Head)?;
        }
        if !body_done {
            if self.layout.has_body {
                self.write_fragments(&mut writer, Section::Body)?;
            } else {
                self.write_wrapped(&mut writer, Section::Body)?;
            }
        }

        Ok(String::from_utf8(writer.into_inner().into_inner())?)
    }

    fn write_fragments(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        section: Section,
    ) -> Result<(), DocumentError> {
        for fragment in self.fragments(section) {
            writer.get_mut().write_all(fragment.as_bytes())?;
        }
        Ok(())
    }

    /// Write `<section>…</section>`, only if something was appended.
    fn write_wrapped(
        &self,
        writer: &mut Writer<Cursor<Vec<u8>>>,
        section: Section,
    ) -> Result<(), DocumentError> {
        if self.fragments(section).is_empty() {
            return Ok(());
        }
        write!(writer.get_mut(), "<{section}>")?;
        self.write_fragments(writer, section)?;
        write!(writer.get_mut(), "</{section}>")?;
        Ok(())
    }
}
