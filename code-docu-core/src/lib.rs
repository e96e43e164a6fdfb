#![doc = "code-docu-core: core pipeline library for code-docu."]

//! This crate contains the documentation pipeline and the contracts of the
//! collaborators it depends on. Transport (HTTP clients, archive download,
//! bookkeeping) lives in the binary crate.
//!
//! # Usage
//! Build a [`workflow::Workflow`] with a [`config::WorkflowConfig`] and a
//! [`contract::TextGenerator`], then call `run` with an extracted source tree.

pub mod aggregate;
pub mod collect;
pub mod config;
pub mod contract;
pub mod package;
pub mod persist;
pub mod summarize;
pub mod workflow;

pub use config::{OverviewNameClash, WorkflowConfig};
pub use contract::{
    GeneratedDoc, GenerationError, ItemDoc, OverviewDocument, PersistenceError, RunError,
    SourceItem, TextGenerator,
};
pub use workflow::{run_workflow, RunReport, Workflow};
