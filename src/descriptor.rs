use crate::coerce::FieldKind;

/// Normalized binding metadata for a single record field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldDescriptor {
    /// Environment variable key, never empty
    pub key: &'static str,
    /// Default literal used when the environment has no value, may be empty
    pub default: &'static str,
    /// Whether a field with no value and no default is left at its zero value
    pub optional: bool,
    /// Human-readable description, only used for documentation
    pub description: &'static str,
}

impl FieldDescriptor {
    /// Build a descriptor from a field's declared metadata.
    ///
    /// Returns `None` when the lookup key is empty: such a field is outside the
    /// binder's contract and must be skipped, not reported.
    pub fn extract(
        key: &'static str,
        default: &'static str,
        optional: bool,
        description: &'static str,
    ) -> Option<Self> {
        if key.is_empty() {
            return None;
        }

        Some(Self {
            key,
            default,
            optional,
            description,
        })
    }

    /// Whether binding fails when neither environment nor default provide a value
    ///
    /// A field with a default can never be missing, so only fields that are
    /// neither optional nor defaulted are required.
    pub fn required(&self) -> bool {
        !self.optional && self.default.is_empty()
    }
}

/// A descriptor together with the kind its field coerces to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldMetadata {
    pub descriptor: FieldDescriptor,
    pub kind: FieldKind,
}

impl FieldMetadata {
    pub fn new(descriptor: FieldDescriptor, kind: FieldKind) -> Self {
        Self { descriptor, kind }
    }

    /// Field metadata for documentation, `None` for fields that are never bound
    pub fn describe(descriptor: Option<FieldDescriptor>, kind: FieldKind) -> Option<Self> {
        descriptor.map(|descriptor| Self::new(descriptor, kind))
    }
}
