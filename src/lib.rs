//! Bind statically typed configuration records from environment variables.
//!
//! Records are declared with [`define_config!`]; each field names its
//! environment key, an optional default literal and an `optional` marker.
//! Binding happens once at startup and yields either a fully populated record
//! or a [`BindError`].

extern crate self as envbind;

pub mod app;
pub mod binder;
pub mod coerce;
pub mod descriptor;
pub mod environment;
pub mod error;
pub mod resolve;

// Re-export main types
pub use app::{AppConfig, StatsdSettings};
pub use binder::{Binder, render_docs, write_docs};
pub use coerce::{Bindable, CoercionFailure, FieldKind, Seconds, Value, coerce};
pub use descriptor::{FieldDescriptor, FieldMetadata};
pub use environment::{EmptyEnv, EnvSource, NotUnicode, ProcessEnv, load_dotenv};
pub use error::{BindError, CoercionError, format_bind_error};
pub use resolve::resolve;

// Re-export macro
pub use envbind_macros::define_config;

/// A configuration record that can be bound from an environment
pub trait Bind: Sized {
    /// Bind every field in declaration order
    ///
    /// Missing required keys are recorded on the binder rather than returned;
    /// use [`Bind::bind_from`] for a complete binding pass.
    fn bind_fields(binder: &mut Binder<'_>) -> Result<Self, BindError>;

    /// Metadata of every bound field, in declaration order
    fn fields() -> Vec<FieldMetadata>;

    /// Bind from the given environment
    fn bind_from(env: &dyn EnvSource) -> Result<Self, BindError> {
        let mut binder = Binder::new(env);
        let record = Self::bind_fields(&mut binder)?;
        binder.finish()?;
        Ok(record)
    }

    /// Bind from the process environment, after loading `.env` if present
    fn from_env() -> Result<Self, BindError> {
        bind_from_env()
    }

    /// Bind from the process environment, panicking with a report on failure
    fn load() -> Self {
        match Self::from_env() {
            Ok(record) => record,
            Err(err) => panic!("{}", format_bind_error(&err)),
        }
    }
}

/// Build a configuration record from the process environment
///
/// Call once at startup, before any component reads configuration. Any error
/// means the record is unusable and dependent subsystems must not start.
pub fn bind_from_env<T: Bind>() -> Result<T, BindError> {
    load_dotenv();

    let record = T::bind_from(&ProcessEnv)?;
    tracing::info!(
        fields = T::fields().len(),
        record = std::any::type_name::<T>(),
        "configuration bound from environment"
    );
    Ok(record)
}
