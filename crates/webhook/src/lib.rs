//! Mutating admission webhook for shared GPU pods.
//!
//! Pods requesting accelerator resources get the GPU runtime class, have
//! their containers rewritten by the vendor device handlers and are handed to
//! the GPU-aware scheduler. Everything is expressed as a JSON patch against
//! the submitted pod.

pub mod admission;
pub mod api;
pub mod cmd;
pub mod config;
pub mod device;
pub mod quantity;
