/*!
 * Reading and writing annotation documents.
 *
 * The on-disk encoding sits behind `DocumentCodec`, so a native annotation
 * tool format can be plugged in without touching the alignment code. The
 * crate ships a JSON codec.
 */

use log::debug;
use std::path::Path;

use crate::document::model::AnnotationDocument;
use crate::errors::DocumentError;
use crate::file_utils::FileManager;

/// Encoding of an annotation document
pub trait DocumentCodec: Send + Sync {
    /// Parse a document from its textual form
    fn decode(&self, input: &str) -> Result<AnnotationDocument, DocumentError>;

    /// Render a document to its textual form
    fn encode(&self, document: &AnnotationDocument) -> Result<String, DocumentError>;
}

/// JSON encoding of the document model
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec {
    /// Pretty-print output
    pub pretty: bool,
}

impl JsonCodec {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DocumentCodec for JsonCodec {
    fn decode(&self, input: &str) -> Result<AnnotationDocument, DocumentError> {
        let mut document: AnnotationDocument =
            serde_json::from_str(input).map_err(|e| DocumentError::Codec(e.to_string()))?;
        document.restore()?;
        Ok(document)
    }

    fn encode(&self, document: &AnnotationDocument) -> Result<String, DocumentError> {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(document)
        } else {
            serde_json::to_string(document)
        };
        encoded.map_err(|e| DocumentError::Codec(e.to_string()))
    }
}

impl AnnotationDocument {
    /// Load a JSON document; an empty id is replaced by the file stem
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DocumentError> {
        Self::load_with(path, &JsonCodec::default())
    }

    /// Load a document with the given codec
    pub fn load_with<P: AsRef<Path>>(path: P, codec: &dyn DocumentCodec) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let content = FileManager::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut document = codec.decode(&content)?;
        if document.id().is_empty() {
            document.set_id(FileManager::document_id(path));
        }

        debug!("Loaded '{}' with {} tiers", document.id(), document.tier_names().len());
        Ok(document)
    }

    /// Save as pretty JSON, creating parent directories
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        self.save_with(path, &JsonCodec::pretty())
    }

    /// Save with the given codec
    pub fn save_with<P: AsRef<Path>>(&self, path: P, codec: &dyn DocumentCodec) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let encoded = codec.encode(self)?;
        FileManager::write_to_file(path, &encoded).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;

        debug!("Saved '{}' to {}", self.id(), path.display());
        Ok(())
    }
}
