use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::Value;
use thiserror::Error;

use super::epoch::parse_feed_epoch;
use super::types::{EphemerisSnapshot, FieldMap, StateVector};

const SEGMENT_PATH: [&str; 3] = ["oem", "body", "segment"];
const VECTOR_FIELDS: [&str; 6] = ["X", "Y", "Z", "X_DOT", "Y_DOT", "Z_DOT"];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed XML: {0}")]
    Structure(String),
    #[error("missing element: {0}")]
    MissingElement(String),
    #[error("segment has no state vectors")]
    NoStateVectors,
    #[error("state vector {index}: invalid epoch '{value}': {source}")]
    Epoch {
        index: usize,
        value: String,
        source: chrono::ParseError,
    },
    #[error("state vector {index}: invalid {field} value '{value}'")]
    Number {
        index: usize,
        field: &'static str,
        value: String,
    },
}

/// Minimal owned XML tree.
#[derive(Debug, Default)]
struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Element>,
}

impl Element {
    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    fn require(&self, name: &str, path: &str) -> Result<&Element, ParseError> {
        self.child(name)
            .ok_or_else(|| ParseError::MissingElement(format!("{path}.{name}")))
    }

    fn text(&self) -> &str {
        self.text.trim()
    }

    fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.children.is_empty() && self.text().is_empty()
    }

    /// Attributes and children as a mapping; text is kept under `#text` when
    /// the element also carries structure.
    fn to_map(&self) -> FieldMap {
        let mut map = FieldMap::new();
        for (key, value) in &self.attributes {
            map.insert(format!("@{key}"), Value::String(value.clone()));
        }
        for child in &self.children {
            let value = child.to_value();
            match map.get_mut(&child.name) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
                None => {
                    map.insert(child.name.clone(), value);
                }
            }
        }
        if !self.text().is_empty() {
            map.insert("#text".to_string(), Value::String(self.text().to_string()));
        }
        map
    }

    fn to_value(&self) -> Value {
        if self.is_empty() {
            Value::Null
        } else if self.attributes.is_empty() && self.children.is_empty() {
            Value::String(self.text().to_string())
        } else {
            Value::Object(self.to_map())
        }
    }
}

fn open_element(start: &BytesStart<'_>) -> Result<Element, ParseError> {
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attributes.push((key, value));
    }
    Ok(Element {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes,
        ..Default::default()
    })
}

fn read_tree(xml: &[u8]) -> Result<Element, ParseError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?;
        match event {
            Event::Start(start) => stack.push(open_element(&start)?),
            Event::Empty(start) => {
                let element = open_element(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => set_root(&mut root, element)?,
                }
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| ParseError::Structure("unexpected closing tag".into()))?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None => set_root(&mut root, element)?,
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::Structure(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| ParseError::Structure("document has no root element".into()))
}

fn set_root(root: &mut Option<Element>, element: Element) -> Result<(), ParseError> {
    if root.is_some() {
        return Err(ParseError::Structure("multiple root elements".into()));
    }
    *root = Some(element);
    Ok(())
}

/// Parse an OEM ephemeris document.
pub fn parse_oem(xml: &[u8]) -> Result<EphemerisSnapshot, ParseError> {
    let root = read_tree(xml)?;
    if root.name != "ndm" {
        return Err(ParseError::MissingElement("ndm".into()));
    }

    let oem = root.require("oem", "ndm")?;
    let header = oem.require("header", "ndm.oem")?.to_map();

    let mut segment = &root;
    let mut path = String::from("ndm");
    for name in SEGMENT_PATH {
        segment = segment.require(name, &path)?;
        path = format!("{path}.{name}");
    }

    let metadata = segment.require("metadata", &path)?.to_map();
    let data = segment.require("data", &path)?;

    let comments: Vec<String> = data
        .children_named("COMMENT")
        .map(Element::text)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .collect();
    if data.child("COMMENT").is_none() {
        log::debug!("no COMMENT entries in segment data");
    }

    let state_vectors = data
        .children_named("stateVector")
        .enumerate()
        .map(|(index, element)| parse_state_vector(index, element))
        .collect::<Result<Vec<_>, _>>()?;
    if state_vectors.is_empty() {
        return Err(ParseError::NoStateVectors);
    }

    Ok(EphemerisSnapshot {
        header,
        metadata,
        comments,
        state_vectors,
    })
}

fn parse_state_vector(index: usize, element: &Element) -> Result<StateVector, ParseError> {
    let path = format!("stateVector[{index}]");

    let epoch_text = element.require("EPOCH", &path)?.text();
    let epoch = parse_feed_epoch(epoch_text).map_err(|source| ParseError::Epoch {
        index,
        value: epoch_text.to_string(),
        source,
    })?;

    let mut values = [0.0; 6];
    for (slot, field) in values.iter_mut().zip(VECTOR_FIELDS) {
        let text = element.require(field, &path)?.text();
        *slot = text
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::Number {
                index,
                field,
                value: text.to_string(),
            })?;
    }
    let [x, y, z, x_dot, y_dot, z_dot] = values;

    Ok(StateVector {
        epoch,
        x,
        y,
        z,
        x_dot,
        y_dot,
        z_dot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ephemeris::epoch::format_epoch;

    const SAMPLE: &str = include_str!("../../testdata/iss_oem_sample.xml");

    fn document(data: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ndm><oem id="CCSDS_OEM_VERS" version="2.0">
  <header><CREATION_DATE>2024-047T18:49:49.573Z</CREATION_DATE><ORIGINATOR>JSC</ORIGINATOR></header>
  <body><segment>
    <metadata><OBJECT_NAME>ISS</OBJECT_NAME><REF_FRAME>EME2000</REF_FRAME></metadata>
    <data>{data}</data>
  </segment></body>
</oem></ndm>"#
        )
    }

    const VECTOR: &str = r#"<stateVector>
        <EPOCH>2024-047T12:00:00.000Z</EPOCH>
        <X units="km">-4514.59</X><Y units="km">-1549.25</Y><Z units="km">4865.63</Z>
        <X_DOT units="km/s">-1.19</X_DOT><Y_DOT units="km/s">-7.49</Y_DOT><Z_DOT units="km/s">-1.51</Z_DOT>
    </stateVector>"#;

    #[test]
    fn parses_sample_feed() {
        let snapshot = parse_oem(SAMPLE.as_bytes()).unwrap();

        assert_eq!(snapshot.header["ORIGINATOR"], "JSC");
        assert_eq!(snapshot.object_name(), Some("ISS"));
        assert_eq!(snapshot.metadata["REF_FRAME"], "EME2000");
        assert_eq!(snapshot.comments.len(), 3);
        assert_eq!(snapshot.comments[0], "Units are in kg and m^2");

        assert_eq!(snapshot.state_vectors.len(), 5);
        let first = &snapshot.state_vectors[0];
        assert_eq!(format_epoch(&first.epoch), "2024-02-16T12:00:00.000000Z");
        assert_eq!(first.x, -4514.5906);
        assert_eq!(first.z_dot, -1.5118);

        let epochs: Vec<_> = snapshot.state_vectors.iter().map(|v| v.epoch).collect();
        let mut sorted = epochs.clone();
        sorted.sort();
        assert_eq!(epochs, sorted);
    }

    #[test]
    fn header_keeps_attributes_and_order() {
        let xml = document(VECTOR).replace(
            "<ORIGINATOR>JSC</ORIGINATOR>",
            r#"<ORIGINATOR site="Houston">JSC</ORIGINATOR>"#,
        );
        let snapshot = parse_oem(xml.as_bytes()).unwrap();
        let keys: Vec<_> = snapshot.header.keys().cloned().collect();
        assert_eq!(keys, ["CREATION_DATE", "ORIGINATOR"]);
        assert_eq!(snapshot.header["ORIGINATOR"]["@site"], "Houston");
        assert_eq!(snapshot.header["ORIGINATOR"]["#text"], "JSC");
    }

    #[test]
    fn missing_comments_yield_empty_list() {
        let snapshot = parse_oem(document(VECTOR).as_bytes()).unwrap();
        assert!(snapshot.comments.is_empty());
        assert_eq!(snapshot.state_vectors.len(), 1);
    }

    #[test]
    fn empty_comments_are_dropped() {
        let data = format!("<COMMENT>only one</COMMENT><COMMENT/><COMMENT>  </COMMENT>{VECTOR}");
        let snapshot = parse_oem(document(&data).as_bytes()).unwrap();
        assert_eq!(snapshot.comments, vec!["only one".to_string()]);
    }

    #[test]
    fn segment_without_vectors_fails() {
        let err = parse_oem(document("<COMMENT>x</COMMENT>").as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::NoStateVectors));
    }

    #[test]
    fn non_numeric_component_fails() {
        let data = VECTOR.replace("-1549.25", "n/a");
        let err = parse_oem(document(&data).as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Number { field: "Y", .. }), "{err}");

        let data = VECTOR.replace("-1549.25", "NaN");
        assert!(parse_oem(document(&data).as_bytes()).is_err());
    }

    #[test]
    fn missing_component_fails() {
        let data = VECTOR.replace(r#"<Z_DOT units="km/s">-1.51</Z_DOT>"#, "");
        let err = parse_oem(document(&data).as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingElement(ref p) if p.ends_with("Z_DOT")));
    }

    #[test]
    fn bad_epoch_fails() {
        let data = VECTOR.replace("2024-047T12:00:00.000Z", "yesterday");
        let err = parse_oem(document(&data).as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::Epoch { index: 0, .. }));
    }

    #[test]
    fn malformed_documents_fail() {
        assert!(parse_oem(b"not xml at all").is_err());
        assert!(parse_oem(b"<ndm><oem></ndm>").is_err());
        assert!(parse_oem(b"<ndm><oem><header/>").is_err());
        assert!(matches!(
            parse_oem(b"<ndm><oem><header/></oem></ndm>"),
            Err(ParseError::MissingElement(_))
        ));
    }
}
