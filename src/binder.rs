use crate::{
    coerce::{Bindable, CoercionFailure, FieldKind, Value, coerce},
    descriptor::{FieldDescriptor, FieldMetadata},
    environment::{EnvSource, NotUnicode},
    error::{BindError, CoercionError},
    resolve::{Source, resolve},
};
use std::{fs, path::Path};

/// Walks a record's fields in declaration order and binds each from the environment
///
/// A coercion error aborts binding at once. Missing required keys are
/// collected and reported together by [`Binder::finish`].
///
/// # Example
/// ```rust
/// use envbind::{Binder, FieldDescriptor};
/// use std::collections::HashMap;
///
/// let env = HashMap::from([("HTTP_PORT".to_string(), "8080".to_string())]);
/// let mut binder = Binder::new(&env);
/// let port: i32 = binder
///     .field(FieldDescriptor::extract("HTTP_PORT", "1234", false, "HTTP port"))
///     .unwrap();
///
/// assert_eq!(port, 8080);
/// assert!(binder.finish().is_ok());
/// ```
pub struct Binder<'e> {
    env: &'e dyn EnvSource,
    missing: Vec<String>,
}

impl<'e> Binder<'e> {
    pub fn new(env: &'e dyn EnvSource) -> Self {
        Self {
            env,
            missing: Vec::new(),
        }
    }

    /// Resolve and coerce one field
    ///
    /// Returns `Ok(None)` when the field is skipped (no descriptor), when an
    /// optional field has no value, or when a required field is missing; the
    /// last case is recorded for [`Binder::finish`]. A set value that is not
    /// valid Unicode fails like any other coercion.
    pub fn value(
        &mut self,
        descriptor: Option<FieldDescriptor>,
        kind: FieldKind,
    ) -> Result<Option<Value>, CoercionError> {
        let Some(descriptor) = descriptor else {
            return Ok(None);
        };

        let resolved = resolve(&descriptor, self.env).map_err(|NotUnicode(lossy)| {
            CoercionError::new(descriptor.key, &lossy, kind, CoercionFailure::InvalidUnicode)
        })?;

        match resolved {
            Some((raw, source)) => {
                let source = match source {
                    Source::Environment => "env",
                    Source::Default => "default",
                };
                tracing::debug!(
                    key = descriptor.key,
                    source,
                    kind = %kind,
                    "resolved configuration field"
                );
                coerce(&raw, kind)
                    .map(Some)
                    .map_err(|failure| CoercionError::new(descriptor.key, &raw, kind, failure))
            }
            None if descriptor.optional => {
                tracing::debug!(key = descriptor.key, "optional field left unset");
                Ok(None)
            }
            None => {
                self.missing.push(descriptor.key.to_string());
                Ok(None)
            }
        }
    }

    /// Bind one typed field, leaving `T::default()` when no value is bound
    pub fn field<T: Bindable>(
        &mut self,
        descriptor: Option<FieldDescriptor>,
    ) -> Result<T, BindError> {
        let key = descriptor.map(|d| d.key).unwrap_or_default();

        match self.value(descriptor, T::KIND)? {
            Some(value) => {
                let kind = value.kind();
                T::from_value(value).ok_or_else(|| {
                    BindError::TypeMismatch(CoercionError::new(
                        key,
                        &kind.to_string(),
                        T::KIND,
                        CoercionFailure::UnsupportedKind,
                    ))
                })
            }
            None => Ok(T::default()),
        }
    }

    /// Bind a field whose type has no coercion
    ///
    /// Any resolved value fails with an unsupported field type error. An
    /// unresolved field is handled like any other: optional fields keep
    /// `T::default()`, required ones are reported missing.
    pub fn unsupported<T: Default>(
        &mut self,
        descriptor: Option<FieldDescriptor>,
        type_name: &'static str,
    ) -> Result<T, BindError> {
        self.value(descriptor, FieldKind::Unsupported(type_name))?;
        Ok(T::default())
    }

    /// Keys recorded as missing so far
    pub fn missing(&self) -> &[String] {
        &self.missing
    }

    /// Complete the binding pass, failing if any required key was missing
    pub fn finish(self) -> Result<(), BindError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            tracing::warn!(
                missing = %self.missing.join(" "),
                "required configuration missing"
            );
            Err(BindError::MissingRequired { keys: self.missing })
        }
    }
}

/// Render a Markdown reference of the given fields' environment variables
pub fn render_docs(fields: &[FieldMetadata]) -> String {
    let mut md = String::new();

    md.push_str("## Environment Variables Summary\n\n");
    md.push_str("| Variable | Kind | Required | Description | Default |\n");
    md.push_str("|----------|------|----------|-------------|---------|\n");
    for field in fields {
        let descriptor = &field.descriptor;
        let required_str = if descriptor.required() { "Yes" } else { "No" };
        let default_display = if descriptor.default.is_empty() {
            "-"
        } else {
            descriptor.default
        };
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            descriptor.key, field.kind, required_str, descriptor.description, default_display
        ));
    }

    md
}

/// Write the Markdown reference of the given fields to a file
pub fn write_docs(fields: &[FieldMetadata], path: impl AsRef<Path>) -> std::io::Result<()> {
    fs::write(path, render_docs(fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coerce::Seconds;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn desc(key: &'static str, default: &'static str, optional: bool) -> Option<FieldDescriptor> {
        FieldDescriptor::extract(key, default, optional, "")
    }

    #[test]
    fn test_field_from_environment() {
        let env = env(&[("HTTP_API_VERSION", "2")]);
        let mut binder = Binder::new(&env);

        let version: i32 = binder.field(desc("HTTP_API_VERSION", "1", false)).unwrap();

        assert_eq!(version, 2);
        assert!(binder.finish().is_ok());
    }

    #[test]
    fn test_field_from_default() {
        let env = env(&[]);
        let mut binder = Binder::new(&env);

        let port: i32 = binder.field(desc("HTTP_PORT", "1234", false)).unwrap();

        assert_eq!(port, 1234);
        assert!(binder.finish().is_ok());
    }

    #[test]
    fn test_skipped_field_is_not_read() {
        let env = env(&[("", "ignored")]);
        let mut binder = Binder::new(&env);

        let value: i64 = binder.field(desc("", "", false)).unwrap();

        assert_eq!(value, 0);
        assert!(binder.missing().is_empty());
        assert!(binder.finish().is_ok());
    }

    #[test]
    fn test_optional_field_keeps_zero_value() {
        let env = env(&[]);
        let mut binder = Binder::new(&env);

        let secret: String = binder.field(desc("DB_PASSWORD", "", true)).unwrap();
        let ratio: f32 = binder.field(desc("SAMPLE_RATE", "", true)).unwrap();

        assert_eq!(secret, "");
        assert_eq!(ratio, 0.0);
        assert!(binder.finish().is_ok());
    }

    #[test]
    fn test_missing_fields_are_collected_in_order() {
        let env = env(&[("PRESENT", "yes")]);
        let mut binder = Binder::new(&env);

        let _: String = binder.field(desc("FIRST", "", false)).unwrap();
        let _: String = binder.field(desc("PRESENT", "", false)).unwrap();
        let _: i32 = binder.field(desc("SECOND", "", false)).unwrap();
        let _: bool = binder.field(desc("THIRD", "", false)).unwrap();

        match binder.finish() {
            Err(BindError::MissingRequired { keys }) => {
                assert_eq!(keys, vec!["FIRST", "SECOND", "THIRD"]);
            }
            other => panic!("expected MissingRequired, got {:?}", other),
        }
    }

    #[test]
    fn test_coercion_error_is_immediate() {
        let env = env(&[("STATSD_INTERVAL", "notanumber")]);
        let mut binder = Binder::new(&env);

        let _: String = binder.field(desc("DB_CONN_STRING", "", false)).unwrap();
        let result: Result<i64, _> = binder.field(desc("STATSD_INTERVAL", "10", false));

        assert_eq!(
            result,
            Err(BindError::TypeMismatch(CoercionError::new(
                "STATSD_INTERVAL",
                "notanumber",
                FieldKind::Int64,
                CoercionFailure::InvalidSyntax,
            )))
        );
    }

    #[test]
    fn test_invalid_default_is_a_coercion_error() {
        let env = env(&[]);
        let mut binder = Binder::new(&env);

        let result: Result<bool, _> = binder.field(desc("STATSD_ENABLED", "maybe", false));

        assert!(matches!(result, Err(BindError::TypeMismatch(_))));
    }

    #[test]
    fn test_duration_field() {
        let env = env(&[("STATSD_INTERVAL", "30")]);
        let mut binder = Binder::new(&env);

        let interval: Seconds = binder.field(desc("STATSD_INTERVAL", "10", false)).unwrap();

        assert_eq!(interval, Seconds(30));
    }

    #[test]
    fn test_negative_duration_field() {
        let env = env(&[("STATSD_INTERVAL", "-5")]);
        let mut binder = Binder::new(&env);

        let interval: Seconds = binder.field(desc("STATSD_INTERVAL", "10", false)).unwrap();

        assert_eq!(interval, Seconds(-5));
        assert_eq!(interval.to_duration(), None);
    }

    struct NonUnicodeEnv;

    impl EnvSource for NonUnicodeEnv {
        fn get(&self, key: &str) -> Result<Option<String>, NotUnicode> {
            match key {
                "DB_CONN_STRING" => Err(NotUnicode("\u{FFFD}db".to_string())),
                _ => Ok(None),
            }
        }
    }

    #[test]
    fn test_non_unicode_value_is_a_coercion_error() {
        let mut binder = Binder::new(&NonUnicodeEnv);

        let _: i32 = binder.field(desc("HTTP_PORT", "1234", false)).unwrap();
        let result: Result<String, _> = binder.field(desc("DB_CONN_STRING", "", false));

        assert_eq!(
            result,
            Err(BindError::TypeMismatch(CoercionError::new(
                "DB_CONN_STRING",
                "\u{FFFD}db",
                FieldKind::Text,
                CoercionFailure::InvalidUnicode,
            )))
        );
        assert!(binder.missing().is_empty());
    }

    #[test]
    fn test_unsupported_field_with_value_fails() {
        let env = env(&[("WORKERS", "8")]);
        let mut binder = Binder::new(&env);

        let result: Result<u8, _> = binder.unsupported(desc("WORKERS", "", false), "u8");

        match result {
            Err(BindError::TypeMismatch(err)) => {
                assert_eq!(err.key, "WORKERS");
                assert_eq!(err.value, "8");
                assert_eq!(err.kind, FieldKind::Unsupported("u8"));
                assert_eq!(err.failure, CoercionFailure::UnsupportedKind);
            }
            other => panic!("expected TypeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_optional_field_without_value() {
        let env = env(&[]);
        let mut binder = Binder::new(&env);

        let workers: u8 = binder.unsupported(desc("WORKERS", "", true), "u8").unwrap();

        assert_eq!(workers, 0);
        assert!(binder.finish().is_ok());
    }

    #[test]
    fn test_value_returns_dynamic_value() {
        let env = env(&[("RATE", "1.5")]);
        let mut binder = Binder::new(&env);

        let value = binder.value(desc("RATE", "", false), FieldKind::Float32).unwrap();

        assert_eq!(value, Some(Value::Float32(1.5)));
    }

    #[test]
    fn test_render_docs() {
        let fields = vec![
            FieldMetadata::new(
                FieldDescriptor::extract("HTTP_PORT", "1234", false, "HTTP listener port").unwrap(),
                FieldKind::Int32,
            ),
            FieldMetadata::new(
                FieldDescriptor::extract("DB_CONN_STRING", "", false, "Postgres DSN").unwrap(),
                FieldKind::Text,
            ),
            FieldMetadata::new(
                FieldDescriptor::extract("DB_PASSWORD", "", true, "Database password").unwrap(),
                FieldKind::Text,
            ),
        ];

        let md = render_docs(&fields);

        assert!(md.contains("| Variable | Kind | Required | Description | Default |"));
        assert!(md.contains("| HTTP_PORT | int32 | No | HTTP listener port | 1234 |"));
        assert!(md.contains("| DB_CONN_STRING | text | Yes | Postgres DSN | - |"));
        assert!(md.contains("| DB_PASSWORD | text | No | Database password | - |"));
    }
}
