//! Property resolution.
//!
//! A props type is what `render` receives. Callers supply its `Input` form,
//! in which defaulted properties are optional, and the class supplies a
//! `Defaults` descriptor. [`Props::resolve`] merges the two once per render.
//! `#[derive(Props)]` writes all three for a struct; mark defaulted fields
//! with `#[prop(default)]` (default comes from the class) or
//! `#[prop(default = expr)]`.
//!
//! An absent property and an explicit `None` resolve the same way.

/// Props a class renders with.
pub trait Props: Sized + 'static {
    /// What callers pass.
    type Input: Clone + 'static;
    /// Per-class default values for the optional properties.
    type Defaults: Default + 'static;

    fn resolve(input: Self::Input, defaults: &Self::Defaults) -> Self;
}

impl Props for () {
    type Input = ();
    type Defaults = ();

    fn resolve(_input: (), _defaults: &()) -> Self {}
}

/// Picks the caller's value, else the declared default. A property without
/// a default is a recoverable gap: warn and use `T::default()`.
pub fn backfill<T: Clone + Default>(
    given: Option<T>,
    default: &Option<T>,
    owner: &str,
    field: &str,
) -> T {
    match (given, default) {
        (Some(value), _) => value,
        (None, Some(default)) => default.clone(),
        (None, None) => {
            log::warn!("{owner}.{field}: no value and no default; using Default::default()");
            T::default()
        }
    }
}
