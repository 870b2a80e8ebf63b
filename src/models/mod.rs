pub mod field_map;
pub mod loaders;
pub mod post;

pub use field_map::{BodyFillStrategy, EditorKind, FieldMap};
pub use loaders::load_field_map;
pub use post::{Post, SubmissionOutcome};
