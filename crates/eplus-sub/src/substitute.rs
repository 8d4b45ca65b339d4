//! Regex-based field substitution inside IDF object blocks
//!
//! IDF objects are written one field per line:
//!
//! ```text
//! Schedule:Compact,
//!     HTGSETP_SCH_NO_OPTIMUM,  !- Name
//!     Temperature,             !- Schedule Type Limits Name
//!     Through: 12/31,          !- Field 1
//!     For: AllDays,            !- Field 2
//!     Until: 24:00,            !- Field 3
//!     20.0;                    !- Field 4
//! ```
//!
//! A field is located by the object-type token, then the instance name, then
//! the first line whose `!-` annotation names the field. The search never
//! crosses the `;` that closes the object, so a field missing from the named
//! object is not looked up in the next one. Only the value token at the start
//! of that line is replaced. This is pattern matching, not a
//! parse: an absent target leaves the document untouched.

use std::borrow::Cow;
use std::path::Path;

use regex::{Captures, Regex};
use tracing::debug;

use crate::error::{Result, SubError};
use crate::path::expand;
use crate::request::{FieldKey, Scalar, ScalarRequest};

/// Compiled matcher for one `(object, name, field)` address
#[derive(Debug, Clone)]
pub struct FieldPattern {
    key: FieldKey,
    regex: Regex,
}

impl FieldPattern {
    pub fn new(key: &FieldKey) -> Result<Self> {
        let pattern = format!(
            r"(?ms)(?P<head>{}[^;]*?)(?P<name>{}[^;]*?^ *)(?P<value>[^,;]+)(?P<tail>(?:,|;) +!- {})",
            regex::escape(&key.object),
            regex::escape(&key.name),
            regex::escape(&key.field),
        );
        Ok(Self {
            key: key.clone(),
            regex: Regex::new(&pattern)?,
        })
    }

    pub fn key(&self) -> &FieldKey {
        &self.key
    }

    /// Current literal text of the first matching field, if any
    pub fn find<'d>(&self, document: &'d str) -> Option<&'d str> {
        self.regex
            .captures(document)
            .and_then(|caps| caps.name("value"))
            .map(|m| m.as_str())
    }

    /// Replace the value token of every match; returns the new text and the match count
    pub fn replace<'d>(&self, document: &'d str, value: &str) -> (Cow<'d, str>, usize) {
        let mut hits = 0;
        let replaced = self.regex.replace_all(document, |caps: &Captures| {
            hits += 1;
            format!("{}{}{}{}", &caps["head"], &caps["name"], value, &caps["tail"])
        });
        (replaced, hits)
    }
}

/// Substitute one field, returning a new document.
///
/// A target that is not present yields an unchanged copy.
pub fn substitute_field(document: &str, key: &FieldKey, value: &Scalar) -> Result<String> {
    let pattern = FieldPattern::new(key)?;
    let rendered = value.to_string();
    let (replaced, hits) = pattern.replace(document, &rendered);

    if hits == 0 {
        debug!(target_field = %key, "Field not found, document left unchanged");
    } else {
        debug!(target_field = %key, value = %rendered, hits, "Substituted field");
    }

    Ok(replaced.into_owned())
}

/// Apply every entry of `request` in order.
pub fn apply_request(document: &str, request: &ScalarRequest) -> Result<String> {
    let mut current = document.to_string();
    for (key, value) in request.iter() {
        current = substitute_field(&current, key, value)?;
    }
    Ok(current)
}

/// Read `template` and apply `request` to it.
pub fn substitute_file(template: impl AsRef<Path>, request: &ScalarRequest) -> Result<String> {
    let template = expand(template);
    let document = std::fs::read_to_string(&template).map_err(|e| SubError::io(&template, e))?;
    apply_request(&document, request)
}

/// Literal text of a field in `document`, if present
pub fn field_value<'d>(document: &'d str, key: &FieldKey) -> Result<Option<&'d str>> {
    Ok(FieldPattern::new(key)?.find(document))
}
