//! Operations module
//!
//! Coordinates the publish pipeline: file resolution, strategy selection and
//! sequential pushes

pub mod files;
pub mod outcome;
pub mod publish;
pub mod push;
pub mod strategy;
pub mod tools;

pub use files::resolve_package_files;
pub use outcome::{PublishOutcome, TaskMessage, TaskResult, TaskStatus};
pub use publish::*;
pub use push::{Publisher, PushContext, PushResult, push_all};
pub use strategy::{PushStrategy, StrategyChoice, StrategyInputs, select_strategy};
