//! `rdfs:comment` annotation for OWL classes in RDF/XML.
//!
//! The document is streamed through `quick-xml` and written back event for
//! event. Each `rdf:Description` is buffered until its end tag so we can look
//! at its direct children before deciding whether it needs a comment:
//!
//! - a description is a class when it has `rdf:type rdf:resource=owl:Class`
//!   or any `rdfs:subClassOf` child
//! - classes without `rdf:about`/`rdf:ID`, or that already carry an
//!   `rdfs:comment`, are left alone (and counted)
//! - everything else gets `<rdfs:comment xml:lang="en">` right after its first
//!   `rdfs:label`, or as the last child when there is no label
//!
//! Events are written back exactly as read, so formatting, XML comments and
//! entity references survive untouched. Entities declared in the internal DTD
//! subset are expanded only to read IRIs and labels.

pub mod definitions;
pub mod entities;

use std::path::Path;

use anyhow::{bail, Context, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, PrefixDeclaration, QName, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::Writer;
use tracing::info;

pub use definitions::{generate_definition, local_name};
pub use entities::Entities;

pub const RDF_NS: &[u8] = b"http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &[u8] = b"http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_CLASS_IRI: &str = "http://www.w3.org/2002/07/owl#Class";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationStats {
    /// Every `rdf:Description`, class or not.
    pub descriptions: usize,
    pub classes: usize,
    pub added: usize,
    pub skipped_existing: usize,
    pub skipped_no_id: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Term {
    Description,
    Type,
    SubClassOf,
    Comment,
    Label,
    Other,
}

fn term_of(reader: &NsReader<&[u8]>, name: QName) -> Term {
    let (ns, local) = reader.resolve_element(name);
    let ResolveResult::Bound(Namespace(ns)) = ns else {
        return Term::Other;
    };
    if ns == RDF_NS {
        match local.as_ref() {
            b"Description" => Term::Description,
            b"type" => Term::Type,
            _ => Term::Other,
        }
    } else if ns == RDFS_NS {
        match local.as_ref() {
            b"subClassOf" => Term::SubClassOf,
            b"comment" => Term::Comment,
            b"label" => Term::Label,
            _ => Term::Other,
        }
    } else {
        Term::Other
    }
}

/// Value of the `rdf:{local}` attribute on `start`, if present.
fn rdf_attribute(
    reader: &NsReader<&[u8]>,
    entities: &Entities,
    start: &BytesStart,
    local: &[u8],
) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr?;
        if let (ResolveResult::Bound(Namespace(ns)), name) = reader.resolve_attribute(attr.key) {
            if ns == RDF_NS && name.as_ref() == local {
                let value = attr.unescape_value_with(|name| entities.resolve(name))?;
                return Ok(Some(value.into_owned()));
            }
        }
    }
    Ok(None)
}

fn is_whitespace(text: &[u8]) -> bool {
    text.iter().all(u8::is_ascii_whitespace)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelState {
    Absent,
    Open,
    /// Event index right after the label's end tag.
    Closed(usize),
}

/// One buffered `rdf:Description`.
struct Frame<'i> {
    events: Vec<Event<'i>>,
    /// Elements currently open below the description itself.
    depth: usize,
    iri: Option<String>,
    is_class: bool,
    has_comment: bool,
    label: LabelState,
    label_text: String,
    indent: Option<String>,
}

impl<'i> Frame<'i> {
    fn new(start: Event<'i>, iri: Option<String>) -> Self {
        Self {
            events: vec![start],
            depth: 0,
            iri,
            is_class: false,
            has_comment: false,
            label: LabelState::Absent,
            label_text: String::new(),
            indent: None,
        }
    }

    /// Record a child element whose start (or empty) event was just pushed.
    fn child(&mut self, term: Term, owl_class_type: bool, empty: bool) {
        if self.depth == 0 {
            match term {
                Term::Type if owl_class_type => self.is_class = true,
                Term::SubClassOf => self.is_class = true,
                Term::Comment => self.has_comment = true,
                Term::Label if self.label == LabelState::Absent => {
                    self.label = if empty {
                        LabelState::Closed(self.events.len())
                    } else {
                        LabelState::Open
                    };
                }
                _ => {}
            }
        }
        if !empty {
            self.depth += 1;
        }
    }

    /// Record an end tag that was just pushed.
    fn close_child(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        if self.depth == 0 && self.label == LabelState::Open {
            self.label = LabelState::Closed(self.events.len());
        }
    }

    fn text(&mut self, raw: &[u8], unescaped: &str) {
        if self.depth == 0 && self.indent.is_none() && is_whitespace(raw) {
            self.indent = Some(unescaped.to_string());
        }
        if self.depth == 1 && self.label == LabelState::Open {
            self.label_text.push_str(unescaped);
        }
    }

    /// Close out the description, inserting a comment when it needs one.
    fn finish(mut self, stats: &mut AnnotationStats, rdfs_prefix: Option<&str>) -> Vec<Event<'i>> {
        if !self.is_class {
            return self.events;
        }
        stats.classes += 1;

        let Some(iri) = self.iri.as_deref() else {
            stats.skipped_no_id += 1;
            return self.events;
        };
        if self.has_comment {
            stats.skipped_existing += 1;
            return self.events;
        }

        let label = match self.label_text.trim() {
            "" => local_name(iri),
            label => label,
        };
        let definition = generate_definition(label);

        let at = match self.label {
            LabelState::Closed(at) => at,
            _ => self.append_position(),
        };

        let mut inserted: Vec<Event<'i>> = Vec::with_capacity(4);
        if let Some(indent) = &self.indent {
            inserted.push(Event::Text(BytesText::new(indent).into_owned()));
        }
        inserted.extend(comment_events(&definition, rdfs_prefix));
        self.events.splice(at..at, inserted);

        stats.added += 1;
        self.events
    }

    /// Before the closing tag and any whitespace that leads up to it.
    fn append_position(&self) -> usize {
        let end = self.events.len() - 1;
        match self.events.get(end.wrapping_sub(1)) {
            Some(Event::Text(t)) if end > 1 && is_whitespace(t) => end - 1,
            _ => end,
        }
    }
}

fn comment_events<'a>(definition: &str, rdfs_prefix: Option<&str>) -> [Event<'a>; 3] {
    let name = match rdfs_prefix {
        Some("") => "comment".to_string(),
        Some(prefix) => format!("{prefix}:comment"),
        None => "rdfs:comment".to_string(),
    };
    let mut start = BytesStart::new(name.clone());
    if rdfs_prefix.is_none() {
        start.push_attribute(("xmlns:rdfs", "http://www.w3.org/2000/01/rdf-schema#"));
    }
    start.push_attribute(("xml:lang", "en"));

    [
        Event::Start(start),
        Event::Text(BytesText::new(definition).into_owned()),
        Event::End(BytesEnd::new(name)),
    ]
}

/// Prefix bound to the RDFS namespace on the root element.
fn root_rdfs_prefix(start: &BytesStart) -> Result<Option<String>> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.value.as_ref() != RDFS_NS {
            continue;
        }
        match attr.key.as_namespace_binding() {
            Some(PrefixDeclaration::Named(prefix)) => {
                return Ok(Some(String::from_utf8_lossy(prefix).into_owned()))
            }
            Some(PrefixDeclaration::Default) => return Ok(Some(String::new())),
            None => {}
        }
    }
    Ok(None)
}

/// Add generated `rdfs:comment`s to every class in an RDF/XML document.
pub fn annotate_classes(xml: &str) -> Result<(String, AnnotationStats)> {
    let mut reader = NsReader::from_str(xml);
    let mut writer = Writer::new(Vec::with_capacity(xml.len() + xml.len() / 8));
    let mut frames: Vec<Frame> = Vec::new();
    let mut stats = AnnotationStats::default();
    let mut rdfs_prefix: Option<String> = None;
    let mut entities = Entities::default();
    let mut seen_root = false;

    loop {
        let event = reader
            .read_event()
            .with_context(|| format!("malformed XML near byte {}", reader.buffer_position()))?;

        match event {
            Event::Eof => break,
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                if !seen_root {
                    seen_root = true;
                    rdfs_prefix = root_rdfs_prefix(e)?;
                }

                let term = term_of(&reader, e.name());
                if term == Term::Description {
                    stats.descriptions += 1;
                    if !empty {
                        if let Some(parent) = frames.last_mut() {
                            parent.child(Term::Other, false, false);
                        }
                        let iri = match rdf_attribute(&reader, &entities, e, b"about")? {
                            Some(iri) => Some(iri),
                            None => rdf_attribute(&reader, &entities, e, b"ID")?,
                        };
                        frames.push(Frame::new(event, iri));
                        continue;
                    }
                }

                let owl_class_type = term == Term::Type
                    && rdf_attribute(&reader, &entities, e, b"resource")?.as_deref()
                        == Some(OWL_CLASS_IRI);
                match frames.last_mut() {
                    Some(frame) => {
                        frame.events.push(event);
                        frame.child(term, owl_class_type, empty);
                    }
                    None => writer.write_event(event)?,
                }
            }
            Event::End(_) => match frames.pop() {
                Some(mut frame) if frame.depth == 0 => {
                    frame.events.push(event);
                    let events = frame.finish(&mut stats, rdfs_prefix.as_deref());
                    match frames.last_mut() {
                        Some(parent) => {
                            parent.events.extend(events);
                            parent.close_child();
                        }
                        None => {
                            for event in events {
                                writer.write_event(event)?;
                            }
                        }
                    }
                }
                Some(mut frame) => {
                    frame.events.push(event);
                    frame.close_child();
                    frames.push(frame);
                }
                None => writer.write_event(event)?,
            },
            Event::Text(ref t) => match frames.last_mut() {
                Some(frame) => {
                    let text = t.unescape_with(|name| entities.resolve(name))?.into_owned();
                    frame.text(t, &text);
                    frame.events.push(event);
                }
                None => writer.write_event(event)?,
            },
            Event::DocType(ref d) => {
                entities.extend_from_doctype(&String::from_utf8_lossy(d));
                writer.write_event(event)?;
            }
            Event::CData(ref c) => match frames.last_mut() {
                Some(frame) => {
                    let text = String::from_utf8_lossy(c).into_owned();
                    frame.text(c, &text);
                    frame.events.push(event);
                }
                None => writer.write_event(event)?,
            },
            other => match frames.last_mut() {
                Some(frame) => frame.events.push(other),
                None => writer.write_event(other)?,
            },
        }
    }

    if !frames.is_empty() {
        bail!("document ended inside an unclosed rdf:Description");
    }

    let output = String::from_utf8(writer.into_inner()).context("annotated XML is not UTF-8")?;
    Ok((output, stats))
}

/// Annotate `input` and write the result to `output`.
pub fn annotate_file(input: &Path, output: &Path) -> Result<AnnotationStats> {
    let xml = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let (annotated, stats) =
        annotate_classes(&xml).with_context(|| format!("failed to annotate {}", input.display()))?;
    std::fs::write(output, annotated)
        .with_context(|| format!("failed to write {}", output.display()))?;

    info!(
        descriptions = stats.descriptions,
        classes = stats.classes,
        added = stats.added,
        skipped_existing = stats.skipped_existing,
        skipped_no_id = stats.skipped_no_id,
        output = %output.display(),
        "annotated ontology"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ONTOLOGY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"
         xmlns:owl="http://www.w3.org/2002/07/owl#">
  <rdf:Description rdf:about="http://example.org/onto#Deposit">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Class"/>
    <rdfs:label>Deposit</rdfs:label>
    <rdfs:subClassOf rdf:resource="http://example.org/onto#FinancialConcept"/>
  </rdf:Description>
  <rdf:Description rdf:about="http://example.org/onto#DataAsset">
    <rdfs:subClassOf rdf:resource="http://example.org/onto#Asset"/>
    <rdfs:label>Data asset</rdfs:label>
  </rdf:Description>
  <rdf:Description rdf:about="http://example.org/onto/Withdrawal">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Class"/>
  </rdf:Description>
  <rdf:Description rdf:about="http://example.org/onto#Ledger">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#Class"/>
    <rdfs:comment>Already documented.</rdfs:comment>
  </rdf:Description>
  <rdf:Description>
    <rdfs:subClassOf rdf:resource="http://example.org/onto#Anonymous"/>
  </rdf:Description>
  <rdf:Description rdf:about="http://example.org/onto#amount">
    <rdf:type rdf:resource="http://www.w3.org/2002/07/owl#DatatypeProperty"/>
    <rdfs:label>amount</rdfs:label>
  </rdf:Description>
</rdf:RDF>
"#;

    #[test]
    fn classes_are_annotated_and_counted() {
        let (output, stats) = annotate_classes(ONTOLOGY).unwrap();

        assert_eq!(
            stats,
            AnnotationStats {
                descriptions: 6,
                classes: 5,
                added: 3,
                skipped_existing: 1,
                skipped_no_id: 1,
            }
        );
        assert!(output.contains(
            "<rdfs:label>Deposit</rdfs:label>\n    <rdfs:comment xml:lang=\"en\">A Deposit concept represented in the ontology.</rdfs:comment>"
        ));
        assert!(output.contains(
            "<rdfs:comment xml:lang=\"en\">An asset that represents stored, managed, or governed data.</rdfs:comment>"
        ));
        assert!(output.contains("A Withdrawal concept represented in the ontology."));
        assert!(!output.contains("A amount concept"));
        assert_eq!(output.matches("rdfs:comment xml:lang").count(), 3);
        assert!(output.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    }

    #[test]
    fn comment_without_label_goes_last() {
        let (output, _) = annotate_classes(ONTOLOGY).unwrap();
        assert!(output.contains(
            "<rdf:type rdf:resource=\"http://www.w3.org/2002/07/owl#Class\"/>\n    <rdfs:comment xml:lang=\"en\">A Withdrawal concept represented in the ontology.</rdfs:comment>\n  </rdf:Description>"
        ));
    }

    #[test]
    fn annotating_twice_adds_nothing() {
        let (once, _) = annotate_classes(ONTOLOGY).unwrap();
        let (twice, stats) = annotate_classes(&once).unwrap();
        assert_eq!(once, twice);
        assert_eq!(stats.added, 0);
        assert_eq!(stats.skipped_existing, 4);
    }

    #[test]
    fn rdf_id_and_custom_prefix() {
        let xml = r##"<r:RDF xmlns:r="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:s="http://www.w3.org/2000/01/rdf-schema#"><r:Description r:ID="Process"><s:subClassOf r:resource="#Thing"/></r:Description></r:RDF>"##;
        let (output, stats) = annotate_classes(xml).unwrap();
        assert_eq!(stats.added, 1);
        assert!(output.contains(
            r##"<s:subClassOf r:resource="#Thing"/><s:comment xml:lang="en">A repeatable operational or technical activity that produces, transforms, or manages data.</s:comment></r:Description>"##
        ));
    }

    #[test]
    fn dtd_entities_expand_in_iris_and_labels() {
        let xml = r#"<?xml version="1.0"?>
<!DOCTYPE rdf:RDF [
    <!ENTITY owl "http://www.w3.org/2002/07/owl#" >
    <!ENTITY onto "http://example.org/onto#" >
]>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#">
  <rdf:Description rdf:about="&onto;Deposit">
    <rdf:type rdf:resource="&owl;Class"/>
  </rdf:Description>
  <rdf:Description rdf:about="&onto;Payout">
    <rdf:type rdf:resource="&owl;Class"/>
    <rdfs:label>Payout &amp; &onto;</rdfs:label>
  </rdf:Description>
</rdf:RDF>
"#;
        let (output, stats) = annotate_classes(xml).unwrap();
        assert_eq!(stats.classes, 2);
        assert_eq!(stats.added, 2);
        assert!(output.contains("A Deposit concept represented in the ontology."));
        assert!(output.contains(
            "A Payout &amp; http://example.org/onto# concept represented in the ontology."
        ));
        // Source text keeps its entity references.
        assert!(output.contains("<!ENTITY onto \"http://example.org/onto#\" >"));
        assert!(output.contains(r#"rdf:about="&onto;Deposit""#));
    }

    #[test]
    fn undeclared_entity_is_an_error() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="&missing;X"></rdf:Description></rdf:RDF>"#;
        assert!(annotate_classes(xml).is_err());
    }

    #[test]
    fn nested_descriptions_are_visited() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:rdfs="http://www.w3.org/2000/01/rdf-schema#"><rdf:Description rdf:about="urn:x:Outer"><rdfs:subClassOf><rdf:Description rdf:about="urn:x:Inner"><rdfs:subClassOf rdf:resource="urn:x:Root"/></rdf:Description></rdfs:subClassOf><rdfs:label>Outer</rdfs:label></rdf:Description></rdf:RDF>"#;
        let (output, stats) = annotate_classes(xml).unwrap();
        assert_eq!(stats.descriptions, 2);
        assert_eq!(stats.added, 2);
        assert!(output.contains("A urn:x:Inner concept represented in the ontology."));
        assert!(output.contains(
            r#"<rdfs:label>Outer</rdfs:label><rdfs:comment xml:lang="en">A Outer concept represented in the ontology.</rdfs:comment></rdf:Description>"#
        ));
    }

    #[test]
    fn unclosed_description_is_an_error() {
        let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><rdf:Description rdf:about="urn:x">"#;
        assert!(annotate_classes(xml).is_err());
    }

    #[test]
    fn files_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ontology.owl");
        let output = dir.path().join("ontology_with_comments.owl");
        std::fs::write(&input, ONTOLOGY).unwrap();

        let stats = annotate_file(&input, &output).unwrap();
        assert_eq!(stats.added, 3);
        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("A Deposit concept represented in the ontology."));
    }
}
