//! Linkguard Validator
//!
//! Detects relations that would be broken by deleting or publishing
//! resources, or that are already broken in a resource tree.
//!
//! The validators provided:
//! - [`DeleteValidator`]: incoming relations from outside a delete set
//! - [`PublishValidator`]: links that would not resolve online after a publish
//! - [`SystemValidator`]: the publish check with reporting and progress, or a
//!   scan of the whole tree
//! - [`InternalLinksValidator`]: dangling links of a set of resources, with
//!   visibility filtering
//!
//! Broken links are data, never errors. Only failures of the environment
//! (an unreadable store, cancellation) fail a whole operation.
//!
//! # Examples
//!
//! ```no_run
//! use linkguard_domain::{Project, RelationTypeRegistry, RequestContext, SiteRegistry};
//! use linkguard_store::SqliteStore;
//! use linkguard_validator::{DeleteValidator, RelationValidator};
//! use std::sync::Arc;
//!
//! let store = SqliteStore::new("linkguard.db", Arc::new(RelationTypeRegistry::new())).unwrap();
//! let mut ctx = RequestContext::new("editor", Project::Offline, "/sites/default");
//! let sites = SiteRegistry::new();
//!
//! let validator = DeleteValidator::new(&store, &mut ctx, ["/index.html"], true);
//! for key in validator.key_set() {
//!     let entry = validator.info_entry(key, &sites).unwrap();
//!     println!("{} is linked from {} resources", entry.resource_name, entry.relations.len());
//! }
//! ```

#![warn(missing_docs)]

mod cleanup;
mod config;
mod delete;
mod error;
mod expand;
mod info;
mod internal_links;
mod outcome;
mod progress;
mod publish;
mod report;
mod system;

#[cfg(test)]
mod testing;

pub use cleanup::remove_dangling_user_relations;
pub use config::ValidatorConfig;
pub use delete::DeleteValidator;
pub use error::ValidatorError;
pub use info::{InfoEntry, RelationValidator, SIBLING_MARKER};
pub use internal_links::InternalLinksValidator;
pub use outcome::{BrokenRelations, ResourceOutcome, ValidationRun};
pub use progress::{CancellationFlag, ProgressMonitor};
pub use publish::PublishValidator;
pub use report::{TextReport, TracingReport, ValidationReport};
pub use system::SystemValidator;
