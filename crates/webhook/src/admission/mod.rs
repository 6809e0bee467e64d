//! Pod admission: classification, runtime-class injection, device mutation
//! and scheduler rerouting, folded into a single [`AdmissionOutcome`].

pub mod classifier;
pub mod dispatcher;
pub mod errors;
pub mod mutator;
pub mod outcome;
pub mod patch;
pub mod runtime_class;

pub use classifier::has_accelerator_resources;
pub use classifier::AcceleratorResources;
pub use classifier::is_privileged;
pub use errors::AdmissionError;
pub use mutator::PodMutator;
pub use outcome::AdmissionOutcome;
pub use outcome::DenyReason;
pub use outcome::OutcomeCause;
pub use outcome::OUTCOME_ANNOTATION;
