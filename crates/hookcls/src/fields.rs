//! Render-affecting field declarations.
//!
//! A component's fields are declared once per class with
//! [`render_affecting!`](crate::render_affecting). The macro produces a marker
//! type with one typed key per field and a [`FieldRegistry`] mapping names to
//! initialisers. The registry is built on first use and never changes after
//! that; every instance of the class reads from the same one.
//!
//! ```rust
//! use hookcls::{FieldSet, render_affecting};
//!
//! render_affecting! {
//!     pub struct Shape {
//!         width: u32 = 10,
//!         height: u32 = 10,
//!     }
//! }
//!
//! render_affecting! {
//!     pub struct Labelled: Shape {
//!         label: String = "box".to_string(),
//!     }
//! }
//!
//! assert_eq!(Shape::registry().len(), 2);
//! assert_eq!(Labelled::registry().len(), 3);
//! assert_eq!(Labelled::label.name(), "label");
//! ```

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use smallvec::SmallVec;

/// Key of a tracked field: writes go through `set` and schedule a render.
pub struct Field<T> {
    name: &'static str,
    _ty: PhantomData<fn() -> T>,
}

impl<T> Field<T> {
    pub const fn tracked(name: &'static str) -> Self {
        Self {
            name,
            _ty: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Field<T> {}

impl<T> fmt::Debug for Field<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Field({})", self.name)
    }
}

/// Key of a state field: read-only between renders, changed by dispatching
/// updaters that apply when the next render begins.
pub struct StateField<T> {
    name: &'static str,
    _ty: PhantomData<fn() -> T>,
}

impl<T> StateField<T> {
    pub const fn state(name: &'static str) -> Self {
        Self {
            name,
            _ty: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for StateField<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for StateField<T> {}

impl<T> fmt::Debug for StateField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateField({})", self.name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Tracked,
    State,
}

type Init = Arc<dyn Fn() -> Box<dyn Any> + Send + Sync>;

#[derive(Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    init: Init,
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .finish()
    }
}

/// Per-class field list. Built by [`render_affecting!`](crate::render_affecting)
/// and stored in a `static`, so it is shared by all instances.
#[derive(Clone, Debug)]
pub struct FieldRegistry {
    owner: &'static str,
    specs: Vec<FieldSpec>,
}

impl FieldRegistry {
    pub fn new(owner: &'static str) -> Self {
        Self {
            owner,
            specs: Vec::new(),
        }
    }

    /// Starts a subclass registry from a copy of `parent`. Declarations made
    /// on the copy never reach the parent.
    pub fn extend(parent: &FieldRegistry, owner: &'static str) -> Self {
        Self {
            owner,
            specs: parent.specs.clone(),
        }
    }

    pub fn tracked<T: 'static>(
        self,
        name: &'static str,
        init: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        self.declare(name, FieldKind::Tracked, init)
    }

    pub fn state<T: 'static>(
        self,
        name: &'static str,
        init: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        self.declare(name, FieldKind::State, init)
    }

    fn declare<T: 'static>(
        mut self,
        name: &'static str,
        kind: FieldKind,
        init: impl Fn() -> T + Send + Sync + 'static,
    ) -> Self {
        let spec = FieldSpec {
            name,
            kind,
            init: Arc::new(move || Box::new(init()) as Box<dyn Any>),
        };
        // A redeclared name replaces the inherited initialiser in place.
        match self.index_of(name) {
            Some(index) => self.specs[index] = spec,
            None => self.specs.push(spec),
        }
        self
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|s| s.name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.specs.iter().position(|s| s.name == name)
    }

    pub fn spec(&self, index: usize) -> Option<&FieldSpec> {
        self.specs.get(index)
    }

    pub(crate) fn initial_values(&self) -> SmallVec<[Box<dyn Any>; 4]> {
        self.specs.iter().map(|s| (s.init)()).collect()
    }
}

/// Marker types produced by [`render_affecting!`](crate::render_affecting).
pub trait FieldSet: 'static {
    fn registry() -> &'static FieldRegistry;
}

/// No fields.
impl FieldSet for () {
    fn registry() -> &'static FieldRegistry {
        static EMPTY: OnceLock<FieldRegistry> = OnceLock::new();
        EMPTY.get_or_init(|| FieldRegistry::new("()"))
    }
}

/// Declares a class's render-affecting fields.
///
/// Fields in the body are tracked: writing a different value schedules a
/// render. Fields in the optional `state { .. }` section are changed only by
/// dispatching updaters. `: Parent` inherits the parent's fields; inherited
/// fields keep using the parent's keys.
#[macro_export]
macro_rules! render_affecting {
    (@base , $owner:expr) => {
        $crate::FieldRegistry::new($owner)
    };
    (@base $parent:ty, $owner:expr) => {
        $crate::FieldRegistry::extend(<$parent as $crate::FieldSet>::registry(), $owner)
    };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident $(: $parent:ty)? {
            $($field:ident : $ty:ty = $init:expr),* $(,)?
        }
        $(state {
            $($sfield:ident : $sty:ty = $sinit:expr),* $(,)?
        })?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Default)]
        $vis struct $name;

        #[allow(non_upper_case_globals)]
        impl $name {
            $(
                pub const $field: $crate::Field<$ty> = $crate::Field::tracked(stringify!($field));
            )*
            $($(
                pub const $sfield: $crate::StateField<$sty> =
                    $crate::StateField::state(stringify!($sfield));
            )*)?
        }

        impl $crate::FieldSet for $name {
            fn registry() -> &'static $crate::FieldRegistry {
                static REGISTRY: ::std::sync::OnceLock<$crate::FieldRegistry> =
                    ::std::sync::OnceLock::new();
                REGISTRY.get_or_init(|| {
                    $crate::render_affecting!(@base $($parent)?, stringify!($name))
                        $(.tracked(stringify!($field), || -> $ty { $init }))*
                        $($(.state(stringify!($sfield), || -> $sty { $sinit }))*)?
                })
            }
        }
    };
}
