//! Configuration access port.

use crate::domain::error::SentiError;

/// Typed lookups over a sectioned key/value store.
///
/// Getters with a default return it only when the key is absent or blank.
/// A value that is present but does not parse is `ConfigInvalid`.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, SentiError>;
    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, SentiError>;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, SentiError>;
}
