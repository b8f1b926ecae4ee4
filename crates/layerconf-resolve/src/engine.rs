//! Resolution engine
//!
//! Walks the override layers in ascending precedence order
//! (`location → role → user → device`) and merges each applicable fragment
//! into a deep copy of the base.

use crate::merge::{merge_checked, SchemaViolation};
use layerconf_document::{
    ConfigurationDocument, DefaultsProvider, ResolutionContext, ScopeFragment, ScopeKey, ScopeType,
    StoredDocument,
};
use serde::Serialize;
use std::ops::Deref;

/// Fully merged configuration for one request context
///
/// Never persisted; recomputed on every read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EffectiveConfiguration(ConfigurationDocument);

impl EffectiveConfiguration {
    #[inline]
    #[must_use]
    pub fn as_document(&self) -> &ConfigurationDocument {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn into_document(self) -> ConfigurationDocument {
        self.0
    }
}

impl Deref for EffectiveConfiguration {
    type Target = ConfigurationDocument;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Result of one resolution
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    /// The merged configuration
    pub effective: EffectiveConfiguration,
    /// Fragment entries that were ignored
    pub warnings: Vec<SchemaViolation>,
    /// Scopes whose fragments were applied, in application order
    pub applied: Vec<ScopeKey>,
}

/// Stateless resolver
///
/// Inputs are borrowed and never mutated, so one base can be shared by any
/// number of concurrent resolutions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolutionEngine;

impl ResolutionEngine {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Merge the fragments selected by `context` over `base`
    ///
    /// `org` fragments in `fragments` are not applied here: the org layer is
    /// `base` itself (see [`ResolutionEngine::overlay_org`]). Fragments for a
    /// layer are applied only when `context` supplies that layer's id.
    /// Several fragments for the same scope are applied in sequence order.
    #[must_use]
    pub fn resolve(
        &self,
        base: &ConfigurationDocument,
        fragments: &[ScopeFragment],
        context: &ResolutionContext,
    ) -> Resolution {
        let mut accumulator = base.clone();
        let mut warnings = Vec::new();
        let mut applied = Vec::new();

        for layer in ScopeType::OVERRIDE_LAYERS {
            let Some(id) = context.id_for(layer) else {
                continue;
            };

            for fragment in fragments
                .iter()
                .filter(|f| f.scope.scope_type() == layer && f.scope.scope_id() == Some(id))
            {
                merge_checked(&mut accumulator, &fragment.settings, &fragment.scope, &mut warnings);
                applied.push(fragment.scope.clone());
            }
        }

        report(&warnings);
        Resolution {
            effective: EffectiveConfiguration(accumulator),
            warnings,
            applied,
        }
    }

    /// Overlay the stored org fragment on the built-in defaults
    #[must_use]
    pub fn overlay_org(&self, defaults: &ConfigurationDocument, org: &ConfigurationDocument) -> Resolution {
        let mut accumulator = defaults.clone();
        let mut warnings = Vec::new();
        let scope = ScopeKey::org();
        merge_checked(&mut accumulator, org, &scope, &mut warnings);

        report(&warnings);
        let applied = if org.is_empty() { Vec::new() } else { vec![scope] };
        Resolution {
            effective: EffectiveConfiguration(accumulator),
            warnings,
            applied,
        }
    }

    /// Full resolution of a stored document: defaults, org, then layers
    #[must_use]
    pub fn resolve_stored(
        &self,
        defaults: &DefaultsProvider,
        stored: &StoredDocument,
        context: &ResolutionContext,
    ) -> Resolution {
        let stored = stored.normalized();
        let org = self.overlay_org(defaults.defaults(), &stored.org);
        let mut layered = self.resolve(org.effective.as_document(), &stored.fragments, context);

        let mut warnings = org.warnings;
        warnings.append(&mut layered.warnings);
        let mut applied = org.applied;
        applied.append(&mut layered.applied);

        Resolution {
            effective: layered.effective,
            warnings,
            applied,
        }
    }
}

fn report(warnings: &[SchemaViolation]) {
    for warning in warnings {
        tracing::warn!(scope = %warning.scope(), violation = %warning, "ignoring fragment entry");
    }
}
