//! Reply construction: template tables, the response generator and the final
//! post-processing pass.

pub mod generator;
pub mod post_process;
pub mod templates;

pub use generator::{BlockKind, ResponseBlock, ResponseGenerator, ResponsePlan};
pub use post_process::PostProcessor;
pub use templates::{ConfidenceBand, TemplateFamily, TemplateLibrary};
