//! Visitor pattern for configs.
//!
//! Both traits are implemented by the [`EnvConfig`](macro@crate::EnvConfig) derive macro;
//! they rarely need to be used directly.

use std::{any, fmt};

use crate::{EnvConfig, metadata::ConfigMetadata};

/// Visitor of config fields. Fields are visited in the declaration order.
pub trait EnvVisitor {
    /// Visits a mutable reference to a field. `index` points into [`ConfigMetadata::fields`].
    fn visit_field(&mut self, index: usize, field: &mut dyn any::Any);
}

/// Mutable config visitor.
pub trait VisitEnv {
    /// Performs the visit.
    fn visit_env(&mut self, visitor: &mut dyn EnvVisitor);
}

/// Config that can be populated from env vars together with its metadata.
pub struct RootConfig<'a> {
    pub(crate) metadata: &'static ConfigMetadata,
    pub(crate) config: &'a mut dyn VisitEnv,
}

impl fmt::Debug for RootConfig<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RootConfig")
            .field("ty", &self.metadata.ty)
            .finish_non_exhaustive()
    }
}

impl<'a> RootConfig<'a> {
    /// Wraps a reference to a config.
    pub fn new<C: EnvConfig>(config: &'a mut C) -> Self {
        Self {
            metadata: &C::DESCRIPTION,
            config,
        }
    }

    /// Returns metadata of the wrapped config.
    pub fn metadata(&self) -> &'static ConfigMetadata {
        self.metadata
    }
}

/// Target of the parsing entry points.
///
/// Implemented for all configs, and for `Option` / `Box` wrappers around them. An empty `Option`
/// is not a valid target; parsing it fails with [`ParseErrorKind::Structural`](crate::ParseErrorKind::Structural).
pub trait EnvTarget {
    /// Returns the config to populate, or `None` if there is nothing to populate.
    fn root_config(&mut self) -> Option<RootConfig<'_>>;
}

impl<C: EnvTarget + ?Sized> EnvTarget for &mut C {
    fn root_config(&mut self) -> Option<RootConfig<'_>> {
        (**self).root_config()
    }
}

impl<C: EnvConfig> EnvTarget for Option<C> {
    fn root_config(&mut self) -> Option<RootConfig<'_>> {
        self.as_mut().map(RootConfig::new)
    }
}

impl<C: EnvConfig> EnvTarget for Box<C> {
    fn root_config(&mut self) -> Option<RootConfig<'_>> {
        Some(RootConfig::new(&mut **self))
    }
}
