//! Multipart form construction.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::MultipartPart;
use crate::errors::{SmtpError, SmtpResult};

/// A form field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Sent as one part named after the field.
    Text(String),
    /// Sent as one part per element, each named `field[]`.
    List(Vec<String>),
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue::Text(value)
    }
}

impl From<Vec<String>> for FormValue {
    fn from(values: Vec<String>) -> Self {
        FormValue::List(values)
    }
}

impl From<Vec<&str>> for FormValue {
    fn from(values: Vec<&str>) -> Self {
        FormValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// A file input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileInput {
    /// Sent as one part named after the field.
    Single(PathBuf),
    /// Sent as one part per file, named `field[0]`, `field[1]`, ...
    Many(Vec<PathBuf>),
}

impl From<PathBuf> for FileInput {
    fn from(path: PathBuf) -> Self {
        FileInput::Single(path)
    }
}

impl From<&Path> for FileInput {
    fn from(path: &Path) -> Self {
        FileInput::Single(path.to_path_buf())
    }
}

impl From<&str> for FileInput {
    fn from(path: &str) -> Self {
        FileInput::Single(PathBuf::from(path))
    }
}

impl From<Vec<PathBuf>> for FileInput {
    fn from(paths: Vec<PathBuf>) -> Self {
        FileInput::Many(paths)
    }
}

/// Ordered description of a multipart form: text fields first, then files.
///
/// Files are only read from disk by [`MultipartForm::into_parts`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultipartForm {
    fields: Vec<(String, FormValue)>,
    files: Vec<(String, FileInput)>,
}

impl MultipartForm {
    /// Creates an empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the text fields of a form from a JSON object.
    ///
    /// Strings are sent verbatim, numbers in their JSON spelling, booleans
    /// as `1`/`0`, arrays as repeated parts and nested objects as JSON text.
    /// Null values are skipped.
    pub fn from_json(object: &Map<String, Value>) -> Self {
        let mut form = Self::new();
        for (name, value) in object {
            let value = match value {
                Value::Null => continue,
                Value::Array(items) => {
                    FormValue::List(items.iter().filter_map(scalar_text).collect())
                }
                other => match scalar_text(other) {
                    Some(text) => FormValue::Text(text),
                    None => continue,
                },
            };
            form.fields.push((name.clone(), value));
        }
        form
    }

    /// Adds a text field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Adds a file input.
    pub fn file(mut self, name: impl Into<String>, input: impl Into<FileInput>) -> Self {
        self.files.push((name.into(), input.into()));
        self
    }

    /// Returns true if the form references at least one file.
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    /// Expands the form into wire parts, reading every referenced file.
    ///
    /// # Errors
    ///
    /// Returns [`SmtpError::File`] if a file cannot be read.
    pub async fn into_parts(self) -> SmtpResult<Vec<MultipartPart>> {
        let mut parts = Vec::new();

        for (name, value) in self.fields {
            match value {
                FormValue::Text(value) => parts.push(MultipartPart::Text { name, value }),
                FormValue::List(values) => {
                    let name = format!("{name}[]");
                    parts.extend(values.into_iter().map(|value| MultipartPart::Text {
                        name: name.clone(),
                        value,
                    }));
                }
            }
        }

        for (name, input) in self.files {
            match input {
                FileInput::Single(path) => parts.push(file_part(name, &path).await?),
                FileInput::Many(paths) => {
                    for (index, path) in paths.iter().enumerate() {
                        parts.push(file_part(format!("{name}[{index}]"), path).await?);
                    }
                }
            }
        }

        Ok(parts)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(if *flag { "1" } else { "0" }.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

async fn file_part(name: String, path: &Path) -> SmtpResult<MultipartPart> {
    let data = tokio::fs::read(path).await.map_err(|source| SmtpError::File {
        path: path.to_path_buf(),
        source,
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let content_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();

    Ok(MultipartPart::File {
        name,
        filename,
        content_type,
        data,
    })
}
