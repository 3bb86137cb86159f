//! Validation of publish lists

use crate::{BrokenRelations, RelationValidator, SystemValidator, ValidationRun};
use linkguard_domain::{PublishList, RelationStore, RequestContext};
use std::fmt::Display;

/// Relations that would be broken online after publishing a list
///
/// Wraps [`SystemValidator`] in its default configuration, without report
/// or progress monitor. A failed run is logged and yields an empty result.
#[derive(Debug, Clone, Default)]
pub struct PublishValidator {
    run: ValidationRun,
    broken: BrokenRelations,
}

impl PublishValidator {
    /// Validate publishing `publish_list`
    pub fn new<S>(store: &S, ctx: &mut RequestContext, publish_list: &PublishList) -> Self
    where
        S: RelationStore,
        S::Error: Display,
    {
        let validated = SystemValidator::default_config().validate_resources(
            store,
            ctx,
            Some(publish_list),
            None,
            None,
        );
        match validated {
            Ok(run) => {
                let broken = run.broken_relations();
                Self { run, broken }
            }
            Err(e) => {
                tracing::error!("Failed to validate the publish list: {}", e);
                Self::default()
            }
        }
    }

    /// Per-resource outcomes
    pub fn run(&self) -> &ValidationRun {
        &self.run
    }
}

impl RelationValidator for PublishValidator {
    fn broken_relations(&self) -> &BrokenRelations {
        &self.broken
    }
}
