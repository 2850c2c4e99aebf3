use crate::{
    descriptor::FieldDescriptor,
    environment::{EnvSource, NotUnicode},
};

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Environment,
    Default,
}

/// Choose the raw value for a field: the environment value, else the default.
///
/// Returns `Ok(None)` when both are empty. The `optional` flag is not
/// consulted here; whether an unresolved field is an error is the caller's
/// decision. A set value that is not Unicode is passed through as an error.
pub fn resolve(
    descriptor: &FieldDescriptor,
    env: &dyn EnvSource,
) -> Result<Option<(String, Source)>, NotUnicode> {
    if let Some(value) = env.get(descriptor.key)?.filter(|v| !v.is_empty()) {
        return Ok(Some((value, Source::Environment)));
    }

    if !descriptor.default.is_empty() {
        return Ok(Some((descriptor.default.to_string(), Source::Default)));
    }

    Ok(None)
}
