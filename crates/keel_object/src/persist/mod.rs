//! The backend-independent persistence protocol.
//!
//! [`Saver`] and [`Loader`] drive object graphs through the [`FormatWriter`]
//! and [`FormatReader`] traits; everything reference-shaped (deduplication,
//! cycles, asset substitution) is handled here, while the backend only sees
//! flat scopes and leaf values.

mod error;
mod format;
mod load;
mod save;

pub use error::{LoadError, SaveError};
pub use format::{FormatReader, FormatWriter, RefCode, RefToken};
pub use load::Loader;
pub use save::Saver;

// -----------------------------------------------------------------------------
// Persist

/// A plain substructure that persists inside its owner's record.
///
/// Unlike [`Object`](crate::Object) implementors, `Persist` values have no
/// class, no record of their own and no reference identity; they serialize
/// as a named group through [`Saver::write_nested`] and
/// [`Loader::read_nested`].
///
/// # Examples
///
/// ```
/// use keel_math::Vec3;
/// use keel_object::persist::{LoadError, Loader, Persist, SaveError, Saver};
///
/// #[derive(Default)]
/// struct Extents {
///     min: Vec3,
///     max: Vec3,
/// }
///
/// impl Persist for Extents {
///     fn save(&self, ar: &mut Saver<'_>) -> Result<(), SaveError> {
///         ar.write_vec3(Some("min"), self.min);
///         ar.write_vec3(Some("max"), self.max);
///         Ok(())
///     }
///
///     fn load(&mut self, ar: &mut Loader<'_>) -> Result<(), LoadError> {
///         if let Some(min) = ar.read_vec3(Some("min")) {
///             self.min = min;
///         }
///         if let Some(max) = ar.read_vec3(Some("max")) {
///             self.max = max;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Persist {
    /// Writes this value into the currently open group.
    fn save(&self, ar: &mut Saver<'_>) -> Result<(), SaveError>;

    /// Reads this value from the currently open group.
    fn load(&mut self, ar: &mut Loader<'_>) -> Result<(), LoadError>;
}

impl Saver<'_> {
    /// Writes `value` as a group named `name` in the current scope.
    pub fn write_nested<T: Persist>(&mut self, name: &str, value: &T) -> Result<(), SaveError> {
        self.begin_group(Some(name));
        let result = value.save(self);
        self.end_group();
        result
    }
}

impl Loader<'_> {
    /// Reads the group named `name` into `value`.
    ///
    /// Returns `Ok(false)` and leaves `value` untouched when the group is
    /// absent.
    pub fn read_nested<T: Persist>(
        &mut self,
        name: &str,
        value: &mut T,
    ) -> Result<bool, LoadError> {
        if !self.begin_group(Some(name)) {
            return Ok(false);
        }
        let result = value.load(self);
        self.end_group();
        result.map(|_| true)
    }
}
