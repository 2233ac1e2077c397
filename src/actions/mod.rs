pub mod click;
pub mod highlight;
pub mod registry;
pub mod select;
pub mod type_text;

pub use registry::{CapabilityRegistry, ElementCapabilities};
