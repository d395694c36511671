//! Field selections for Drive file resources.
//!
//! An [`ApiFields`] is what a caller wants to know about each listed file.
//! It is validated against what an operation supports, rendered into the
//! `fields` selector of the request, and used to cut each returned file down
//! to exactly the requested record.

use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::GoogleDriveError;
use crate::types::SHORTCUT_MIME_TYPE;

/// One listed file, restricted to the requested fields.
pub type FileRecord = Map<String, Value>;

/// A top-level field, optionally with sub-fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Simple(String),
    Nested { name: String, subfields: Vec<String> },
}

impl FieldSpec {
    pub fn name(&self) -> &str {
        match self {
            FieldSpec::Simple(name) => name,
            FieldSpec::Nested { name, .. } => name,
        }
    }
}

impl fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldSpec::Simple(name) => f.write_str(name),
            FieldSpec::Nested { name, subfields } => {
                write!(f, "{}({})", name, subfields.join(", "))
            }
        }
    }
}

/// Ordered selection of file fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiFields {
    fields: Vec<FieldSpec>,
}

impl ApiFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection of plain fields.
    pub fn simple<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names.into_iter().fold(Self::new(), |fields, name| fields.field(name))
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(FieldSpec::Simple(name.into()));
        self
    }

    pub fn nested<I, S>(mut self, name: impl Into<String>, subfields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.push(FieldSpec::Nested {
            name: name.into(),
            subfields: subfields.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn specs(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Fields a file listing can return.
    pub fn listing_prototype() -> Self {
        Self::simple(["id", "name", "mimeType", "createdTime", "copyRequiresWriterPermission"])
            .nested("imageMediaMetadata", ["width", "height", "time"])
            .nested("videoMediaMetadata", ["width", "height"])
            .field("webContentLink")
            .field("thumbnailLink")
            .field("description")
    }

    /// Whether every requested field (and sub-field) appears in `prototype`.
    pub fn check(&self, prototype: &ApiFields) -> bool {
        self.fields.iter().all(|spec| match spec {
            FieldSpec::Simple(name) => prototype
                .fields
                .iter()
                .any(|allowed| matches!(allowed, FieldSpec::Simple(n) if n == name)),
            FieldSpec::Nested { name, subfields } => prototype.fields.iter().any(|allowed| {
                matches!(
                    allowed,
                    FieldSpec::Nested { name: n, subfields: allowed_subfields }
                        if n == name && subfields.iter().all(|s| allowed_subfields.contains(s))
                )
            }),
        })
    }

    /// Render the selector used inside `files(...)`.
    ///
    /// Asking for `id` or `mimeType` also asks for what is needed to resolve
    /// shortcuts to their targets.
    pub fn format(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        let mut push = |part: String| {
            if !parts.contains(&part) {
                parts.push(part);
            }
        };

        for spec in &self.fields {
            match spec {
                FieldSpec::Simple(name) if name == "id" || name == "mimeType" => {
                    push(name.clone());
                    push("mimeType".to_string());
                    push("shortcutDetails(targetId, targetMimeType)".to_string());
                }
                other => push(other.to_string()),
            }
        }

        parts.join(", ")
    }

    /// Reduce a returned file to the requested fields.
    ///
    /// A shortcut reports its target's ID and MIME type. Fields the file
    /// does not carry come back as `null`.
    pub fn parse_response(&self, file: &Map<String, Value>) -> FileRecord {
        let is_shortcut = file.get("mimeType").and_then(Value::as_str) == Some(SHORTCUT_MIME_TYPE);
        let target = |key: &str| {
            file.get("shortcutDetails")
                .and_then(|details| details.get(key))
                .cloned()
                .unwrap_or(Value::Null)
        };
        let own = |key: &str| file.get(key).cloned().unwrap_or(Value::Null);

        let mut record = FileRecord::new();
        for spec in &self.fields {
            match spec {
                FieldSpec::Nested { name, subfields } => {
                    let nested = file.get(name);
                    let values = subfields
                        .iter()
                        .map(|sub| {
                            let value = nested
                                .and_then(|object| object.get(sub))
                                .cloned()
                                .unwrap_or(Value::Null);
                            (sub.clone(), value)
                        })
                        .collect();
                    record.insert(name.clone(), Value::Object(values));
                }
                FieldSpec::Simple(name) if name == "id" => {
                    let id = if is_shortcut { target("targetId") } else { own("id") };
                    record.insert(name.clone(), id);
                }
                FieldSpec::Simple(name) if name == "mimeType" => {
                    let mime_type = if is_shortcut {
                        target("targetMimeType")
                    } else {
                        own("mimeType")
                    };
                    record.insert(name.clone(), mime_type);
                }
                FieldSpec::Simple(name) => {
                    record.insert(name.clone(), own(name));
                }
            }
        }
        record
    }
}

impl fmt::Display for ApiFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.fields.iter().map(ToString::to_string).collect();
        f.write_str(&rendered.join(", "))
    }
}

/// Parses the selector syntax, e.g. `id, name, imageMediaMetadata(width, height)`.
impl FromStr for ApiFields {
    type Err = GoogleDriveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || GoogleDriveError::UnsupportedField {
            fields: s.to_string(),
            operation: "parse_fields".to_string(),
        };

        let mut fields = ApiFields::new();
        let mut rest = s.trim();

        while !rest.is_empty() {
            let end = rest.find([',', '(']).unwrap_or(rest.len());
            let name = rest[..end].trim();
            if name.is_empty() {
                return Err(malformed());
            }

            if rest[end..].starts_with('(') {
                let close = rest[end..].find(')').ok_or_else(malformed)? + end;
                let subfields: Vec<&str> = rest[end + 1..close]
                    .split(',')
                    .map(str::trim)
                    .collect();
                if subfields.iter().any(|sub| sub.is_empty()) {
                    return Err(malformed());
                }
                fields = fields.nested(name, subfields);
                rest = rest[close + 1..].trim_start();
            } else {
                fields = fields.field(name);
                rest = &rest[end..];
            }

            rest = match rest.strip_prefix(',') {
                Some(next) => next.trim_start(),
                None if rest.is_empty() => rest,
                None => return Err(malformed()),
            };
        }

        Ok(fields)
    }
}
