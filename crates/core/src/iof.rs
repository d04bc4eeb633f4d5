//! IOF XML 3.0 result list handling
//!
//! OFeed identifies competitors by the `<Id>` of each `<Person>`. SI-Droid
//! Event either leaves the id out or fills it with values that are not
//! unique across classes, so every `<Person>` is renumbered 1, 2, 3... in
//! document order before upload:
//!
//! ```text
//! <Person><Name>...</Name></Person>
//! ```
//!
//! becomes
//!
//! ```text
//! <Person><Id>1</Id><Name>...</Name></Person>
//! ```
//!
//! The document is streamed with `quick-xml`; everything outside the ids is
//! written back untouched.

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use tracing::debug;

const PERSON: &[u8] = b"Person";
const ID: &[u8] = b"Id";
const NAME: &[u8] = b"Name";

/// Marker that SI-Droid only emits once at least one competitor has a result
pub const PERSON_RESULT_MARKER: &str = "<PersonResult>";

/// Whether a result list contains any person results
#[must_use]
pub fn has_person_results(xml: &str) -> bool {
    xml.contains(PERSON_RESULT_MARKER)
}

/// Result of stamping ids into a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped {
    /// Rewritten document
    pub xml: String,
    /// Number of `<Person>` elements that received an id
    pub persons: u32,
}

/// Insert or update `<Id>` in every `<Person>` of an IOF XML 3.0 document
///
/// # Errors
///
/// Returns an `XmlParseError` if the document is not well-formed.
pub fn update_or_insert_ids(xml: &str) -> Result<String> {
    stamp_ids(xml).map(|stamped| stamped.xml)
}

/// Like [`update_or_insert_ids`], also reporting how many persons were numbered
///
/// # Errors
///
/// Returns an `XmlParseError` if the document is not well-formed.
pub fn stamp_ids(xml: &str) -> Result<Stamped> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + 256));

    let mut persons = 0u32;
    let mut depth = 0usize;
    let mut roots = 0usize;
    let mut first = true;

    loop {
        let event = read_event(&mut reader)?;

        if first {
            first = false;
            if !matches!(event, Event::Decl(_) | Event::Eof) {
                write(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("no"))))?;
                write(&mut writer, Event::Text(BytesText::from_escaped("\n")))?;
            }
        }

        if depth == 0 {
            match &event {
                Event::Start(_) | Event::Empty(_) => {
                    roots += 1;
                    if roots > 1 {
                        return Err(Error::xml("Document has more than one root element"));
                    }
                }
                Event::Text(text) if !text.iter().all(u8::is_ascii_whitespace) => {
                    return Err(Error::xml("Text is not allowed outside the root element"));
                }
                _ => {}
            }
        }

        match event {
            Event::Start(start) if start.name().as_ref() == PERSON => {
                for event in stamp_person(&mut reader, start, &mut persons)? {
                    write(&mut writer, event)?;
                }
            }
            Event::Empty(start) if start.name().as_ref() == PERSON => {
                for event in stamp_empty_person(start, &mut persons) {
                    write(&mut writer, event)?;
                }
            }
            Event::Start(start) => {
                depth += 1;
                write(&mut writer, Event::Start(start))?;
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                write(&mut writer, Event::End(end))?;
            }
            Event::Eof => break,
            other => write(&mut writer, other)?,
        }
    }

    if roots == 0 {
        return Err(Error::xml("Document has no root element"));
    }
    if depth != 0 {
        return Err(Error::xml("Unexpected end of document, unclosed elements remain"));
    }

    let xml = String::from_utf8(writer.into_inner())
        .map_err(|e| Error::xml(format!("Output is not valid UTF-8: {e}")))?;

    debug!(persons, bytes = xml.len(), "Stamped person ids");
    Ok(Stamped { xml, persons })
}

/// Read the next event, rejecting text and attribute values with bad escapes
fn read_event<'a>(reader: &mut Reader<&'a [u8]>) -> Result<Event<'a>> {
    let event = reader.read_event()?;
    match &event {
        Event::Text(text) => {
            text.unescape()
                .map_err(|e| Error::xml(format!("Invalid text content: {e}")))?;
        }
        Event::Start(start) | Event::Empty(start) => check_attributes(start)?,
        _ => {}
    }
    Ok(event)
}

fn check_attributes(start: &BytesStart<'_>) -> Result<()> {
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::xml(format!("Invalid attribute: {e}")))?;
        attr.unescape_value()
            .map_err(|e| Error::xml(format!("Invalid attribute value: {e}")))?;
    }
    Ok(())
}

/// Piece of a `<Person>` body; nested persons are stamped as a unit
enum Node<'a> {
    Event(Event<'a>),
    Person(Vec<Event<'a>>),
}

/// Number the `<Person>` just opened and any persons nested in it
///
/// Returns the complete element, start and end tags included.
fn stamp_person<'a>(
    reader: &mut Reader<&'a [u8]>,
    start: BytesStart<'a>,
    persons: &mut u32,
) -> Result<Vec<Event<'a>>> {
    *persons += 1;
    let number = *persons;
    let (body, end) = collect_person_body(reader, persons)?;

    let mut events = Vec::with_capacity(body.len() + 5);
    events.push(Event::Start(start));
    match first_id(&body) {
        Some(index) => replace_id_content(&mut events, body, index, number),
        None => insert_id_before_name(&mut events, body, number),
    }
    events.push(Event::End(end));
    Ok(events)
}

fn stamp_empty_person<'a>(start: BytesStart<'a>, persons: &mut u32) -> Vec<Event<'a>> {
    *persons += 1;
    let mut events = vec![Event::Start(start)];
    push_id(&mut events, *persons);
    events.push(Event::End(BytesEnd::new("Person")));
    events
}

/// Read the children of a `<Person>` up to its end tag
fn collect_person_body<'a>(
    reader: &mut Reader<&'a [u8]>,
    persons: &mut u32,
) -> Result<(Vec<Node<'a>>, BytesEnd<'a>)> {
    let mut body = Vec::new();
    let mut depth = 0usize;

    loop {
        match read_event(reader)? {
            Event::Start(start) if start.name().as_ref() == PERSON => {
                body.push(Node::Person(stamp_person(reader, start, persons)?));
            }
            Event::Empty(start) if start.name().as_ref() == PERSON => {
                body.push(Node::Person(stamp_empty_person(start, persons)));
            }
            Event::End(end) if depth == 0 => return Ok((body, end)),
            Event::Start(start) => {
                depth += 1;
                body.push(Node::Event(Event::Start(start)));
            }
            Event::End(end) => {
                depth -= 1;
                body.push(Node::Event(Event::End(end)));
            }
            Event::Eof => return Err(Error::xml("Unexpected end of document inside <Person>")),
            other => body.push(Node::Event(other)),
        }
    }
}

/// Position of the first `<Id>` belonging to this person, not to a nested one
fn first_id(body: &[Node<'_>]) -> Option<usize> {
    body.iter().position(|node| match node {
        Node::Event(Event::Start(s) | Event::Empty(s)) => s.name().as_ref() == ID,
        _ => false,
    })
}

fn flatten<'a>(events: &mut Vec<Event<'a>>, node: Node<'a>) {
    match node {
        Node::Event(event) => events.push(event),
        Node::Person(person) => events.extend(person),
    }
}

/// Replace the content of the `<Id>` found at `index`
fn replace_id_content<'a>(
    events: &mut Vec<Event<'a>>,
    body: Vec<Node<'a>>,
    index: usize,
    number: u32,
) {
    let mut skip_depth: Option<usize> = None;

    for (i, node) in body.into_iter().enumerate() {
        if let Some(depth) = skip_depth.as_mut() {
            // Inside the old <Id>: drop children until its end tag
            match node {
                Node::Event(Event::Start(_)) => *depth += 1,
                Node::Event(Event::End(end)) if *depth == 0 => {
                    skip_depth = None;
                    events.push(Event::End(end));
                }
                Node::Event(Event::End(_)) => *depth -= 1,
                _ => {}
            }
            continue;
        }

        if i != index {
            flatten(events, node);
            continue;
        }

        match node {
            Node::Event(Event::Start(start)) => {
                events.push(Event::Start(start));
                events.push(Event::Text(BytesText::from_escaped(number.to_string())));
                skip_depth = Some(0);
            }
            Node::Event(Event::Empty(start)) => {
                events.push(Event::Start(start));
                events.push(Event::Text(BytesText::from_escaped(number.to_string())));
                events.push(Event::End(BytesEnd::new("Id")));
            }
            other => flatten(events, other),
        }
    }
}

/// Insert `<Id>` before the first direct `<Name>` child, or at the end
fn insert_id_before_name<'a>(events: &mut Vec<Event<'a>>, body: Vec<Node<'a>>, number: u32) {
    let mut depth = 0usize;
    let mut inserted = false;

    for node in body {
        if !inserted && depth == 0 {
            if let Node::Event(Event::Start(s) | Event::Empty(s)) = &node {
                if s.name().as_ref() == NAME {
                    push_id(events, number);
                    inserted = true;
                }
            }
        }

        match &node {
            Node::Event(Event::Start(_)) => depth += 1,
            Node::Event(Event::End(_)) => depth = depth.saturating_sub(1),
            _ => {}
        }
        flatten(events, node);
    }

    if !inserted {
        push_id(events, number);
    }
}

fn push_id(events: &mut Vec<Event<'_>>, number: u32) {
    events.push(Event::Start(BytesStart::new("Id")));
    events.push(Event::Text(BytesText::from_escaped(number.to_string())));
    events.push(Event::End(BytesEnd::new("Id")));
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::xml(format!("Failed to write XML: {e}")))
}
