//! Streaming single-level element tracker over quick-xml.
//!
//! Track logs can be arbitrarily large, so no document tree is ever
//! materialized. At most one watched element is captured at a time; all
//! character data nested under it is accumulated into an [`ElementCapture`]
//! that is created per accumulation cycle and consumed when the element
//! closes.

use std::collections::HashMap;
use std::io::BufRead;
use std::time::{Duration, Instant};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{PhototagError, Result};

/// Progress callbacks fire at most this often.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(200);

/// Courtesy hook pulsed opportunistically during a long parse so a host
/// can keep an indicator alive. Never relied on for correctness.
pub type ProgressFn<'a> = &'a mut dyn FnMut();

/// Data accumulated under one watched element. Attributes of the element
/// itself and the text of nested children are kept apart so similarly
/// named attributes and children cannot collide.
#[derive(Debug, Default)]
pub struct ElementCapture {
    attrs: HashMap<String, String>,
    text: HashMap<String, String>,
}

impl ElementCapture {
    /// Attribute of the watched element, e.g. `lat` on `trkpt`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Accumulated character data of a nested element, or of the watched
    /// element itself when it carries text directly (KML `when`).
    pub fn text(&self, name: &str) -> Option<&str> {
        self.text.get(name).map(String::as_str)
    }
}

/// Reactions a format parser feeds to [`parse_stream`].
pub trait ElementWatcher {
    /// Required document root element. A different root aborts parsing
    /// with [`PhototagError::FormatMismatch`] before any data is consumed.
    fn root(&self) -> &'static str;

    /// Element names worth reacting to at all.
    fn watched(&self, name: &str) -> bool;

    /// A watched element just opened. Return `true` to capture its
    /// subtree; `false` to treat it as a bare marker (segment starts).
    fn begin(&mut self, name: &str) -> bool;

    /// A captured element closed; consume its accumulated data.
    fn complete(&mut self, name: &str, capture: ElementCapture) -> Result<()>;
}

struct Capturing {
    name: String,
    /// Nesting depth below the captured element
    depth: usize,
    /// Innermost open element, routing character data
    current: String,
    capture: ElementCapture,
}

/// Drive a quick-xml reader through a watcher until end of document.
pub fn parse_stream<R: BufRead, W: ElementWatcher>(
    mut reader: Reader<R>,
    watcher: &mut W,
    mut progress: Option<ProgressFn<'_>>,
) -> Result<()> {
    let mut buf = Vec::new();
    let mut root_seen = false;
    let mut capturing: Option<Capturing> = None;
    // First event pulses immediately, then at most every interval.
    let mut last_pulse = Instant::now() - PROGRESS_INTERVAL;

    loop {
        let event = reader.read_event_into(&mut buf).map_err(|e| {
            PhototagError::MalformedData(format!(
                "XML error at byte {}: {e}",
                reader.buffer_position()
            ))
        })?;

        match event {
            Event::Eof => break,

            Event::Start(ref e) => {
                let name = element_name(e);
                if !root_seen {
                    check_root(watcher.root(), &name)?;
                    root_seen = true;
                } else {
                    handle_start(watcher, &mut capturing, name, e)?;
                }
            }

            // Self-closing elements open and close in one event.
            Event::Empty(ref e) => {
                let name = element_name(e);
                if !root_seen {
                    check_root(watcher.root(), &name)?;
                    root_seen = true;
                } else {
                    handle_start(watcher, &mut capturing, name.clone(), e)?;
                    handle_end(watcher, &mut capturing, &name)?;
                }
            }

            Event::End(ref e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                handle_end(watcher, &mut capturing, &name)?;
            }

            Event::Text(ref e) => {
                if let Some(state) = capturing.as_mut() {
                    let text = e.unescape().map_err(|err| {
                        PhototagError::MalformedData(format!("bad character data: {err}"))
                    })?;
                    if !text.trim().is_empty() {
                        state
                            .capture
                            .text
                            .entry(state.current.clone())
                            .or_default()
                            .push_str(&text);
                    }
                }
            }

            _ => {}
        }

        buf.clear();

        if let Some(pulse) = progress.as_mut() {
            if last_pulse.elapsed() >= PROGRESS_INTERVAL {
                pulse();
                last_pulse = Instant::now();
            }
        }
    }

    if !root_seen {
        return Err(PhototagError::FormatMismatch {
            expected: watcher.root(),
            found: None,
        });
    }

    Ok(())
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn check_root(expected: &'static str, found: &str) -> Result<()> {
    if found == expected {
        Ok(())
    } else {
        Err(PhototagError::FormatMismatch {
            expected,
            found: Some(found.to_string()),
        })
    }
}

fn handle_start<W: ElementWatcher>(
    watcher: &mut W,
    capturing: &mut Option<Capturing>,
    name: String,
    e: &BytesStart<'_>,
) -> Result<()> {
    match capturing.as_mut() {
        None => {
            if watcher.watched(&name) && watcher.begin(&name) {
                let mut capture = ElementCapture::default();
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| {
                        PhototagError::MalformedData(format!("bad attribute: {err}"))
                    })?;
                    capture.attrs.insert(
                        String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                        String::from_utf8_lossy(&attr.value).into_owned(),
                    );
                }
                *capturing = Some(Capturing {
                    current: name.clone(),
                    name,
                    depth: 0,
                    capture,
                });
            }
        }
        Some(state) => {
            state.depth += 1;
            state.current = name;
        }
    }
    Ok(())
}

fn handle_end<W: ElementWatcher>(
    watcher: &mut W,
    capturing: &mut Option<Capturing>,
    name: &str,
) -> Result<()> {
    match capturing.take() {
        Some(state) if state.name == name && state.depth == 0 => {
            watcher.complete(&state.name, state.capture)
        }
        Some(mut state) => {
            if state.depth > 0 {
                state.depth -= 1;
                if state.depth == 0 {
                    state.current = state.name.clone();
                }
            }
            *capturing = Some(state);
            Ok(())
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        begun: Vec<String>,
        completed: Vec<(String, Vec<(String, String)>)>,
    }

    impl ElementWatcher for Recorder {
        fn root(&self) -> &'static str {
            "doc"
        }

        fn watched(&self, name: &str) -> bool {
            matches!(name, "item" | "marker")
        }

        fn begin(&mut self, name: &str) -> bool {
            self.begun.push(name.to_string());
            name == "item"
        }

        fn complete(&mut self, name: &str, capture: ElementCapture) -> Result<()> {
            let mut pairs: Vec<(String, String)> = capture
                .text
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            pairs.sort();
            self.completed.push((name.to_string(), pairs));
            Ok(())
        }
    }

    fn parse(xml: &str, recorder: &mut Recorder) -> Result<()> {
        parse_stream(Reader::from_reader(xml.as_bytes()), recorder, None)
    }

    #[test]
    fn captures_nested_text_per_child() {
        let mut rec = Recorder::default();
        parse(
            "<doc><item><a>1</a><b>2</b></item><item><a>3</a></item></doc>",
            &mut rec,
        )
        .unwrap();
        assert_eq!(rec.completed.len(), 2);
        assert_eq!(
            rec.completed[0].1,
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string())
            ]
        );
    }

    #[test]
    fn markers_fire_without_capture() {
        let mut rec = Recorder::default();
        parse("<doc><marker/><item><a>x</a></item></doc>", &mut rec).unwrap();
        assert_eq!(rec.begun, vec!["marker", "item"]);
        assert_eq!(rec.completed.len(), 1);
    }

    #[test]
    fn wrong_root_fails_before_any_capture() {
        let mut rec = Recorder::default();
        let err = parse("<other><item><a>x</a></item></other>", &mut rec).unwrap_err();
        assert!(matches!(err, PhototagError::FormatMismatch { .. }));
        assert!(rec.begun.is_empty());
    }

    #[test]
    fn direct_text_of_watched_element_lands_under_its_own_name() {
        let mut rec = Recorder::default();
        parse("<doc><item>hello</item></doc>", &mut rec).unwrap();
        assert_eq!(
            rec.completed[0].1,
            vec![("item".to_string(), "hello".to_string())]
        );
    }

    #[test]
    fn broken_xml_is_malformed_data() {
        let mut rec = Recorder::default();
        let err = parse("<doc><item><a>1</item></doc>", &mut rec).unwrap_err();
        assert!(matches!(err, PhototagError::MalformedData(_)));
    }
}
