//! Common error infrastructure for gameplay-core.
//!
//! This module provides shared types and traits used across all error types in
//! gameplay-core. Domain-specific errors (e.g. `ActivationFailure`,
//! `EffectError`) are defined in their respective modules alongside the
//! operations they validate.
//!
//! # Classification
//!
//! - **Configuration errors**: data that can never work (missing cooldown
//!   magnitude, retained effects on a non-instanced ability). `Fatal` or
//!   `Validation`.
//! - **Invariant violations**: the arbiter or the death lifecycle observed a
//!   state it should never reach. `Internal`.
//! - **Transient failures**: one effect in a batch failed to apply. `Recoverable`.
//!
//! Authorization failures (a client calling a server-only mutation) are not
//! errors: the mutating method simply returns without effect.

use crate::ability::AbilitySpecHandle;
use crate::ids::ActorId;
use crate::prediction::PredictionKey;

/// Severity level of an error, used for categorization and logging priority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the surrounding batch continues.
    ///
    /// Examples: one ongoing effect failed to apply, ability on cooldown
    Recoverable,

    /// Validation error - invalid request, should not retry without changes.
    ///
    /// Examples: unknown ability handle, activation blocked by tags
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: arbiter found a non-replaceable exclusive ability, death
    /// state regression. These indicate bugs and should be investigated.
    Internal,

    /// Fatal error - content is misconfigured and the operation can never succeed.
    ///
    /// Examples: set-by-caller cooldown without a set-by-caller duration
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug or bad content.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Contextual information attached to errors for debugging and diagnostics.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    /// Ability-owner whose state machine produced the error.
    pub owner: Option<ActorId>,

    /// Ability spec involved, if any.
    pub ability: Option<AbilitySpecHandle>,

    /// Prediction key the failing operation ran under.
    pub prediction_key: Option<PredictionKey>,

    /// Optional static message providing additional context.
    pub message: Option<&'static str>,
}

impl ErrorContext {
    /// Creates a new error context for the given owner.
    #[must_use]
    pub const fn new(owner: ActorId) -> Self {
        Self {
            owner: Some(owner),
            ability: None,
            prediction_key: None,
            message: None,
        }
    }

    /// Attaches an ability handle to this context (builder pattern).
    #[must_use]
    pub const fn with_ability(mut self, ability: AbilitySpecHandle) -> Self {
        self.ability = Some(ability);
        self
    }

    /// Attaches a prediction key to this context (builder pattern).
    #[must_use]
    pub const fn with_prediction_key(mut self, key: PredictionKey) -> Self {
        self.prediction_key = Some(key);
        self
    }

    /// Attaches a static message to this context (builder pattern).
    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all gameplay-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait GameplayError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns the context information for this error, if available.
    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    /// Returns a static string identifier for this error variant.
    ///
    /// Default implementation uses the error type name.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_builder_collects_fields() {
        let ctx = ErrorContext::new(ActorId(3))
            .with_ability(AbilitySpecHandle(7))
            .with_prediction_key(PredictionKey(2))
            .with_message("cooldown");

        assert_eq!(ctx.owner, Some(ActorId(3)));
        assert_eq!(ctx.ability, Some(AbilitySpecHandle(7)));
        assert_eq!(ctx.prediction_key, Some(PredictionKey(2)));
        assert_eq!(ctx.message, Some("cooldown"));
    }

    #[test]
    fn severity_classification() {
        assert!(ErrorSeverity::Recoverable.is_recoverable());
        assert!(!ErrorSeverity::Validation.is_internal());
        assert!(ErrorSeverity::Internal.is_internal());
        assert!(ErrorSeverity::Fatal.is_internal());
        assert_eq!(ErrorSeverity::Fatal.as_str(), "fatal");
    }
}
