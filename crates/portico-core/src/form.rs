//! Parsed form-data extension types.
//!
//! The multipart stage stores these in the [`RequestContext`] extensions;
//! route handlers (the login action in particular) read them back.
//!
//! [`RequestContext`]: crate::RequestContext

use bytes::Bytes;
use std::collections::HashMap;

/// Text fields parsed from a form body.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    fields: HashMap<String, String>,
}

impl FormFields {
    /// Creates an empty field set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a field.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Gets a field value by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if no fields were parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One file part retained from a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Form field name the file arrived under.
    pub field_name: String,
    /// Client-supplied file name, if any.
    pub file_name: Option<String>,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

/// File parts retained from a multipart body.
///
/// Only present when upload handling is enabled and the configured
/// resolver selected a handler that retains files; the fields-only
/// default never stores this extension.
#[derive(Debug, Clone, Default)]
pub struct UploadedFiles {
    files: Vec<UploadedFile>,
}

impl UploadedFiles {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a retained file.
    pub fn push(&mut self, file: UploadedFile) {
        self.files.push(file);
    }

    /// Returns the retained files.
    #[must_use]
    pub fn files(&self) -> &[UploadedFile] {
        &self.files
    }

    /// Returns the number of retained files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True if no files were retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_fields() {
        let mut fields = FormFields::new();
        fields.insert("email", "a@x.com");
        assert_eq!(fields.get("email"), Some("a@x.com"));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_uploaded_files() {
        let mut files = UploadedFiles::new();
        assert!(files.is_empty());
        files.push(UploadedFile {
            field_name: "avatar".to_string(),
            file_name: Some("me.png".to_string()),
            content_type: Some("image/png".to_string()),
            data: Bytes::from_static(b"png"),
        });
        assert_eq!(files.len(), 1);
        assert_eq!(files.files()[0].field_name, "avatar");
    }
}
