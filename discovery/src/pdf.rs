//! PDF form-field extraction.
//!
//! Walks the AcroForm field tree of a document (`/Root /AcroForm /Fields`,
//! descending through `/Kids`) and returns every terminal field with its
//! fully-qualified name and a [`PdfFieldKind`]. Field type (`/FT`) and field
//! flags (`/Ff`) are inheritable, so both are carried down the tree. Kids
//! without a partial name (`/T`) are widget annotations of their parent, not
//! fields of their own.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use fieldmap_core::FieldSet;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Radio button flag (bit 16 of `/Ff`).
const FF_RADIO: i64 = 1 << 15;
/// Push button flag (bit 17 of `/Ff`).
const FF_PUSHBUTTON: i64 = 1 << 16;

/// Upper bound on chained indirect references before giving up.
const MAX_REFERENCE_HOPS: usize = 32;
/// Upper bound on field-tree depth.
const MAX_TREE_DEPTH: usize = 64;

/// Errors raised while reading a form-bearing PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// The file could not be read.
    #[error("failed to read PDF '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The bytes are not a parseable PDF.
    #[error("failed to parse PDF '{path}': {source}")]
    Load {
        path: String,
        #[source]
        source: lopdf::Error,
    },

    /// The document has no interactive form dictionary.
    #[error("PDF '{0}' has no AcroForm dictionary")]
    NoAcroForm(String),

    /// The form dictionary exists but declares no fields.
    #[error("PDF '{0}' has an AcroForm with no fields")]
    NoFormFields(String),

    /// The document structure is broken (dangling references, cycles, wrong types).
    #[error("malformed PDF '{path}': {detail}")]
    Malformed { path: String, detail: String },
}

/// Coarse field type, decided from `/FT` and `/Ff`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PdfFieldKind {
    Text,
    Checkbox,
    Signature,
    Radio,
    Dropdown,
    Other,
}

impl PdfFieldKind {
    fn classify(field_type: Option<&[u8]>, flags: i64) -> Self {
        match field_type {
            Some(b"Tx") => Self::Text,
            Some(b"Btn") if flags & FF_PUSHBUTTON != 0 => Self::Other,
            Some(b"Btn") if flags & FF_RADIO != 0 => Self::Radio,
            Some(b"Btn") => Self::Checkbox,
            Some(b"Ch") => Self::Dropdown,
            Some(b"Sig") => Self::Signature,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for PdfFieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Checkbox => write!(f, "checkbox"),
            Self::Signature => write!(f, "signature"),
            Self::Radio => write!(f, "radio"),
            Self::Dropdown => write!(f, "dropdown"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One terminal form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfField {
    /// Fully-qualified name (partial names joined with `.`).
    pub name: String,
    pub kind: PdfFieldKind,
    /// Widget rectangle `[x1, y1, x2, y2]` of the field or its first widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f64; 4]>,
}

/// Reads a PDF file and lists its form fields in field-tree order.
///
/// # Errors
///
/// [`PdfError::Io`] when the file cannot be read, [`PdfError::Load`] when it
/// is not a PDF, [`PdfError::NoAcroForm`] / [`PdfError::NoFormFields`] when it
/// has no form, and [`PdfError::Malformed`] for a broken field tree.
pub fn extract_pdf_fields(path: impl AsRef<Path>) -> Result<Vec<PdfField>, PdfError> {
    let path = path.as_ref();
    let label = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|source| PdfError::Io {
        path: label.clone(),
        source,
    })?;
    extract_pdf_fields_from_bytes(&bytes, &label)
}

/// Same as [`extract_pdf_fields`] for an in-memory document.
///
/// `label` names the document in errors and logs.
pub fn extract_pdf_fields_from_bytes(bytes: &[u8], label: &str) -> Result<Vec<PdfField>, PdfError> {
    let document = Document::load_mem(bytes).map_err(|source| PdfError::Load {
        path: label.to_string(),
        source,
    })?;
    fields_from_document(&document, label)
}

/// Lists the form fields of an already loaded document.
pub fn fields_from_document(document: &Document, label: &str) -> Result<Vec<PdfField>, PdfError> {
    let mut walker = FieldWalker {
        document,
        label,
        visited: HashSet::new(),
        fields: Vec::new(),
    };

    let root = document
        .trailer
        .get(b"Root")
        .map_err(|_| walker.malformed("trailer has no /Root"))?;
    let catalog = walker.dictionary(root, "/Root")?;
    let Ok(acroform) = catalog.get(b"AcroForm") else {
        return Err(PdfError::NoAcroForm(label.to_string()));
    };
    let acroform = walker.dictionary(acroform, "/AcroForm")?;
    let roots = match acroform.get(b"Fields") {
        Ok(fields) => walker.array(fields, "/AcroForm /Fields")?,
        Err(_) => return Err(PdfError::NoFormFields(label.to_string())),
    };

    let top = Inherited::default();
    for node in roots {
        walker.walk(node, &top, 0)?;
    }

    if walker.fields.is_empty() {
        return Err(PdfError::NoFormFields(label.to_string()));
    }
    debug!(pdf = label, count = walker.fields.len(), "extracted PDF form fields");
    Ok(walker.fields)
}

/// Distinct field names, in field-tree order.
pub fn pdf_field_set(fields: &[PdfField]) -> FieldSet {
    fields.iter().map(|field| field.name.clone()).collect()
}

#[derive(Default)]
struct Inherited<'a> {
    name: Option<String>,
    field_type: Option<&'a [u8]>,
    flags: i64,
}

struct FieldWalker<'a> {
    document: &'a Document,
    label: &'a str,
    visited: HashSet<ObjectId>,
    fields: Vec<PdfField>,
}

impl<'a> FieldWalker<'a> {
    fn walk(
        &mut self,
        node: &'a Object,
        parent: &Inherited<'a>,
        depth: usize,
    ) -> Result<(), PdfError> {
        if depth > MAX_TREE_DEPTH {
            return Err(self.malformed("field tree is too deep"));
        }
        if let Object::Reference(id) = node {
            if !self.visited.insert(*id) {
                return Err(self.malformed(&format!(
                    "field tree revisits object {} {}",
                    id.0, id.1
                )));
            }
        }
        let dict = self.dictionary(node, "field")?;

        let partial = dict
            .get(b"T")
            .ok()
            .and_then(|t| self.resolve(t).ok())
            .and_then(text_string);
        let inherited = Inherited {
            name: match (&parent.name, partial) {
                (Some(prefix), Some(partial)) => Some(format!("{prefix}.{partial}")),
                (None, Some(partial)) => Some(partial),
                (prefix, None) => prefix.clone(),
            },
            field_type: self.name_entry(dict, b"FT").or(parent.field_type),
            flags: self.integer_entry(dict, b"Ff").unwrap_or(parent.flags),
        };

        let kids: Vec<&'a Object> = match dict.get(b"Kids") {
            Ok(kids) => self.array(kids, "/Kids")?.iter().collect(),
            Err(_) => Vec::new(),
        };
        let (named_kids, widgets): (Vec<&'a Object>, Vec<&'a Object>) = kids
            .into_iter()
            .partition(|kid| self.is_named_field(*kid));

        if !named_kids.is_empty() {
            for kid in named_kids {
                self.walk(kid, &inherited, depth + 1)?;
            }
            return Ok(());
        }

        let Some(name) = inherited.name else {
            warn!(pdf = self.label, "skipping form field without a name");
            return Ok(());
        };
        let rect = self.rect(dict).or_else(|| {
            widgets.iter().find_map(|widget| {
                let widget = self.dictionary(*widget, "widget").ok()?;
                self.rect(widget)
            })
        });
        self.fields.push(PdfField {
            name,
            kind: PdfFieldKind::classify(inherited.field_type, inherited.flags),
            rect,
        });
        Ok(())
    }

    fn is_named_field(&self, kid: &'a Object) -> bool {
        self.resolve(kid)
            .ok()
            .and_then(|obj| match obj {
                Object::Dictionary(dict) => Some(dict),
                _ => None,
            })
            .is_some_and(|dict| dict.has(b"T"))
    }

    fn resolve(&self, object: &'a Object) -> Result<&'a Object, PdfError> {
        let mut current = object;
        let mut hops = 0;
        while let Object::Reference(id) = current {
            hops += 1;
            if hops > MAX_REFERENCE_HOPS {
                return Err(self.malformed("reference chain is too long"));
            }
            current = self.document.get_object(*id).map_err(|err| {
                self.malformed(&format!("cannot resolve object {} {}: {err}", id.0, id.1))
            })?;
        }
        Ok(current)
    }

    fn dictionary(&self, object: &'a Object, what: &str) -> Result<&'a Dictionary, PdfError> {
        match self.resolve(object)? {
            Object::Dictionary(dict) => Ok(dict),
            Object::Stream(stream) => Ok(&stream.dict),
            _ => Err(self.malformed(&format!("{what} is not a dictionary"))),
        }
    }

    fn array(&self, object: &'a Object, what: &str) -> Result<&'a Vec<Object>, PdfError> {
        match self.resolve(object)? {
            Object::Array(items) => Ok(items),
            _ => Err(self.malformed(&format!("{what} is not an array"))),
        }
    }

    fn name_entry(&self, dict: &'a Dictionary, key: &[u8]) -> Option<&'a [u8]> {
        match self.resolve(dict.get(key).ok()?).ok()? {
            Object::Name(name) => Some(name.as_slice()),
            _ => None,
        }
    }

    fn integer_entry(&self, dict: &'a Dictionary, key: &[u8]) -> Option<i64> {
        match self.resolve(dict.get(key).ok()?).ok()? {
            Object::Integer(value) => Some(*value),
            _ => None,
        }
    }

    fn rect(&self, dict: &'a Dictionary) -> Option<[f64; 4]> {
        let Object::Array(items) = self.resolve(dict.get(b"Rect").ok()?).ok()? else {
            return None;
        };
        if items.len() != 4 {
            return None;
        }
        let mut rect = [0.0; 4];
        for (slot, item) in rect.iter_mut().zip(items) {
            *slot = match self.resolve(item).ok()? {
                Object::Integer(value) => *value as f64,
                Object::Real(value) => f64::from(*value),
                _ => return None,
            };
        }
        Some(rect)
    }

    fn malformed(&self, detail: &str) -> PdfError {
        PdfError::Malformed {
            path: self.label.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Decodes a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, or
/// single-byte PDFDocEncoding (read as Latin-1).
fn text_string(object: &Object) -> Option<String> {
    let bytes = match object {
        Object::String(bytes, _) => bytes.as_slice(),
        Object::Name(bytes) => return Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => return None,
    };
    let text: String = if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
        char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    } else if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        String::from_utf8_lossy(utf8).into_owned()
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    };
    Some(text)
}
