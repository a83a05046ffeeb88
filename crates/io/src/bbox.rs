//! Parser for `pdftotext -bbox` output.
//!
//! The document is XHTML with one `<page>` per PDF page and one
//! `<word xMin=".." yMin=".." xMax=".." yMax="..">text</word>` per word.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use confronto_recon::Token;

use crate::error::IoError;

/// Positioned words per page, in document order.
pub fn parse_bbox(xml: &str) -> Result<Vec<Vec<Token>>, IoError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut pages: Vec<Vec<Token>> = Vec::new();
    let mut current_word: Option<Token> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.name().as_ref() {
                b"page" => pages.push(Vec::new()),
                b"word" => current_word = Some(word_box(e)?),
                _ => {}
            },
            Ok(Event::Empty(ref e)) if e.name().as_ref() == b"page" => pages.push(Vec::new()),
            Ok(Event::Text(ref e)) => {
                if let Some(word) = current_word.as_mut() {
                    word.text.push_str(&String::from_utf8_lossy(e.as_ref()));
                }
            }
            Ok(Event::GeneralRef(ref e)) => {
                if let Some(word) = current_word.as_mut() {
                    let name = String::from_utf8_lossy(e.as_ref());
                    match resolve_entity(&name) {
                        Some(c) => word.text.push(c),
                        None => {
                            word.text.push('&');
                            word.text.push_str(&name);
                            word.text.push(';');
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) if e.name().as_ref() == b"word" => {
                if let Some(mut word) = current_word.take() {
                    word.text = word.text.trim().to_string();
                    if !word.text.is_empty() {
                        if pages.is_empty() {
                            pages.push(Vec::new());
                        }
                        if let Some(page) = pages.last_mut() {
                            page.push(word);
                        }
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IoError::Xml(format!(
                    "at byte {}: {e}",
                    reader.error_position()
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    let words: usize = pages.iter().map(Vec::len).sum();
    log::info!("bbox: {} pages, {words} words", pages.len());
    Ok(pages)
}

fn word_box(e: &BytesStart) -> Result<Token, IoError> {
    let mut coords = [None; 4];
    for attr in e.attributes().flatten() {
        let slot = match attr.key.as_ref() {
            b"xMin" => 0,
            b"xMax" => 1,
            b"yMin" => 2,
            b"yMax" => 3,
            _ => continue,
        };
        let raw = String::from_utf8_lossy(&attr.value);
        let value: f64 = raw
            .trim()
            .parse()
            .map_err(|_| IoError::Xml(format!("bad coordinate '{raw}' on <word>")))?;
        coords[slot] = Some(value);
    }

    match coords {
        [Some(x0), Some(x1), Some(top), Some(bottom)] => Ok(Token::new("", x0, x1, top, bottom)),
        _ => Err(IoError::Xml("<word> without xMin/xMax/yMin/yMax".into())),
    }
}

fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix('x').or_else(|| num.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
