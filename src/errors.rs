/*!
 * Error types for the tieralign library.
 *
 * Structural problems with a document (missing tiers, name collisions,
 * intervals that break tier ordering) are `DocumentError`s. Problems found
 * while aligning two tiers or building a tier hierarchy are `AlignError`s;
 * they carry the document identifier and the offending time offset so the
 * source annotation can be inspected by hand.
 */

use thiserror::Error;

/// Errors raised by operations on a single annotation document
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The requested tier does not exist
    #[error("Tier '{tier}' not found")]
    TierNotFound {
        /// Requested tier name
        tier: String,
    },

    /// A tier with this name already exists
    #[error("Tier '{tier}' already exists")]
    DuplicateTier {
        /// Colliding tier name
        tier: String,
    },

    /// The operation needs the other kind of tier
    #[error("Tier '{tier}' is not {expected}")]
    WrongTierKind {
        /// Tier name
        tier: String,
        /// Human readable kind the operation expected
        expected: &'static str,
    },

    /// A referential tier names a structural type that was never registered
    #[error("Unknown structural type '{name}'")]
    UnknownStructuralType {
        /// Structural type name
        name: String,
    },

    /// A referential tier was used with a parent it is not attached to
    #[error("Tier '{tier}' has parent '{actual}', not '{requested}'")]
    ParentMismatch {
        /// Referential tier name
        tier: String,
        /// Parent declared on the tier
        actual: String,
        /// Parent requested by the caller
        requested: String,
    },

    /// The tier cannot be removed while other tiers reference it
    #[error("Tier '{tier}' is the parent of '{child}'")]
    ParentInUse {
        /// Tier that was about to be removed
        tier: String,
        /// A tier that depends on it
        child: String,
    },

    /// Start time after end time
    #[error("Invalid interval on tier '{tier}': start {start_ms}ms > end {end_ms}ms")]
    InvalidInterval {
        /// Tier name
        tier: String,
        /// Start offset
        start_ms: u64,
        /// End offset
        end_ms: u64,
    },

    /// The interval would overlap an existing annotation on the same tier
    #[error(
        "Interval {start_ms}-{end_ms}ms overlaps {existing_start_ms}-{existing_end_ms}ms on tier '{tier}'"
    )]
    OverlappingInterval {
        /// Tier name
        tier: String,
        /// Rejected start offset
        start_ms: u64,
        /// Rejected end offset
        end_ms: u64,
        /// Start of the annotation already on the tier
        existing_start_ms: u64,
        /// End of the annotation already on the tier
        existing_end_ms: u64,
    },

    /// No annotation covers the given time
    #[error("No annotation on tier '{tier}' at {time_ms}ms")]
    NoAnnotationAt {
        /// Tier name
        tier: String,
        /// Requested time offset
        time_ms: u64,
    },

    /// A referential annotation points to an id that is not on the parent tier
    #[error("Annotation {id} on tier '{tier}' references missing parent {parent_id}")]
    DanglingReference {
        /// Referential tier name
        tier: String,
        /// Referential annotation id
        id: u64,
        /// Missing parent id
        parent_id: u64,
    },

    /// Reading or writing a document failed
    #[error("I/O error on '{path}': {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The document could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),
}

/// Errors raised while classifying overlaps or building tier hierarchies
#[derive(Error, Debug)]
pub enum AlignError {
    /// Structural problem in the document being processed
    #[error("{document}: {source}")]
    Document {
        /// Document identifier
        document: String,
        /// Underlying structural error
        #[source]
        source: DocumentError,
    },

    /// A midpoint did not resolve to any annotation of the target tier
    #[error(
        "{document}: no annotation on tier '{tier}' contains {time_ms}ms (midpoint of {start_ms}-{end_ms}ms from tier '{source_tier}')"
    )]
    NoContainingAnnotation {
        /// Document identifier
        document: String,
        /// Tier that was searched
        tier: String,
        /// Tier the time range came from
        source_tier: String,
        /// Midpoint that failed to resolve
        time_ms: u64,
        /// Start of the originating range
        start_ms: u64,
        /// End of the originating range
        end_ms: u64,
    },

    /// The reference tier holds no annotations at all
    #[error("{document}: reference tier '{tier}' is empty")]
    EmptyReferenceTier {
        /// Document identifier
        document: String,
        /// Tier name
        tier: String,
    },

    /// Two documents do not share the same clock
    #[error("{document}: timeline mismatch with '{other}': {reason}")]
    TimelineMismatch {
        /// Document identifier
        document: String,
        /// The other document
        other: String,
        /// What differs
        reason: String,
    },

    /// The requested transformation makes no sense for this document
    #[error("{document}: {reason}")]
    InvalidRequest {
        /// Document identifier
        document: String,
        /// Explanation
        reason: String,
    },

    /// A segment has a negative or non-finite offset or duration
    #[error("Invalid segment at offset {offset}s with duration {duration}s")]
    InvalidSegment {
        /// Offset in seconds
        offset: f64,
        /// Duration in seconds
        duration: f64,
    },
}

impl DocumentError {
    /// Attach the identifier of the document the error was raised in
    pub fn in_document(self, document: impl Into<String>) -> AlignError {
        AlignError::Document {
            document: document.into(),
            source: self,
        }
    }
}

/// Adds the document identifier to structural errors, like `anyhow::Context`
pub trait WithDocument<T> {
    fn in_document(self, document: &str) -> Result<T, AlignError>;
}

impl<T> WithDocument<T> for Result<T, DocumentError> {
    fn in_document(self, document: &str) -> Result<T, AlignError> {
        self.map_err(|e| e.in_document(document))
    }
}

impl AlignError {
    /// Whether this error came from a failed midpoint lookup
    pub fn is_containment(&self) -> bool {
        matches!(self, Self::NoContainingAnnotation { .. })
    }
}
