/*!
 * Annotation document model and codecs.
 *
 * - `model`: documents, tiers, annotations, structural types
 * - `codec`: `DocumentCodec` trait, JSON codec, load/save
 */

pub mod codec;
pub mod model;

pub use codec::{DocumentCodec, JsonCodec};
pub use model::{
    AnnotationDocument, AnnotationId, Constraint, IntervalAnnotation, RefAnnotation,
    StructuralType, Tier, TierContent, TierSpec, Timeline,
};
