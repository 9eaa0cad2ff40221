//! Parsers for SVN XML output.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::SvnError;
use crate::revisions::Revnum;

/// One `<logentry>` of `svn log --xml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SvnLogEntry {
    pub revision: Revnum,
    pub author: String,
    pub date: String,
    pub message: String,
}

/// Parse the output of `svn log --xml`, keeping the tool's entry order.
pub fn parse_svn_log(xml: &str) -> Result<Vec<SvnLogEntry>, SvnError> {
    debug!("parsing svn log XML ({} bytes)", xml.len());
    if !xml.contains("<log") {
        return Err(SvnError::XmlParse("missing <log> element".into()));
    }

    let mut entries = Vec::new();
    for part in xml.split("<logentry").skip(1) {
        let entry_xml = match part.find("</logentry>") {
            Some(pos) => &part[..pos],
            None => part,
        };
        let revision = match extract_attr_from_str(opening_tag(entry_xml), "revision")
            .and_then(|s| s.parse::<Revnum>().ok())
        {
            Some(rev) => rev,
            None => {
                warn!("skipping SVN log entry with missing or unparseable revision attribute");
                continue;
            }
        };
        entries.push(SvnLogEntry {
            revision,
            author: extract_tag_content(entry_xml, "author").unwrap_or_default(),
            date: extract_tag_content(entry_xml, "date").unwrap_or_default(),
            message: extract_tag_content(entry_xml, "msg").unwrap_or_default(),
        });
    }
    debug!(count = entries.len(), "parsed svn log entries");
    Ok(entries)
}

/// The attribute section of a `<logentry ...>` fragment.
fn opening_tag(fragment: &str) -> &str {
    match fragment.find('>') {
        Some(pos) => &fragment[..pos],
        None => fragment,
    }
}

fn extract_tag_content(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}", tag);
    let close = format!("</{}>", tag);
    let mut search_from = 0;
    while let Some(rel_pos) = xml[search_from..].find(&open) {
        let start_pos = search_from + rel_pos;
        let after_open = &xml[start_pos + open.len()..];
        // Next char must be '>' or whitespace, otherwise <msgid> would match <msg.
        if let Some(ch) = after_open.chars().next() {
            if ch != '>' && !ch.is_ascii_whitespace() {
                search_from = start_pos + open.len();
                continue;
            }
        }
        let content_start = after_open.find('>')? + 1;
        let content = &after_open[content_start..];
        let end_pos = content.find(&close)?;
        return Some(xml_unescape(content[..end_pos].trim()));
    }
    None
}

/// Unescape the predefined XML entities and numeric character references.
fn xml_unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = tail
            .find(';')
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|c| (c, semi)));
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x") {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

fn extract_attr_from_str(s: &str, attr: &str) -> Option<String> {
    let pattern_dq = format!("{}=\"", attr);
    if let Some(pos) = s.find(&pattern_dq) {
        let after = &s[pos + pattern_dq.len()..];
        let end = after.find('"')?;
        return Some(after[..end].to_string());
    }
    let pattern_sq = format!("{}='", attr);
    if let Some(pos) = s.find(&pattern_sq) {
        let after = &s[pos + pattern_sq.len()..];
        let end = after.find('\'')?;
        return Some(after[..end].to_string());
    }
    None
}
