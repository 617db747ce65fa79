//! Annotation lifecycle: data types, trigger policy, edit invalidation and the
//! per-buffer session that ties them together.

pub mod diff;
mod session;
pub mod trigger;
mod types;

pub use diff::{find_changed_region, invalidate_annotations, should_reanalyze, ChangedRegion};
pub use session::{AnnotationSession, SessionOptions};
pub use trigger::{
    detect_trigger_event, should_trigger_analysis, TriggerEvent, TriggerHandler, TriggerOptions,
};
pub use types::{
    accept_candidates, Annotation, AnnotationCandidate, AnnotationId, AnnotationRequest,
    AnnotationResponse, AnnotationSnapshot,
};
