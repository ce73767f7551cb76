pub mod filler;
pub mod outcome;
pub mod semantic;
pub mod spatial;

pub use filler::{FieldLocation, FormDocument, FormFiller, TemplateDocument, TemplateField};
pub use outcome::{BindingReport, FieldOutcome, FillReport};
pub use spatial::bind;
