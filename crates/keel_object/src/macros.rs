// Declaration macros for persistable classes and enumerations.

// -----------------------------------------------------------------------------
// impl_object_fn

/// Implements the boilerplate methods of [`Object`](crate::Object) inside a
/// manual `impl` block.
///
/// Use this when a class needs custom `save`/`load` hooks and is therefore
/// written by hand instead of through [`persist_class!`](crate::persist_class).
/// The type must also implement [`Persistable`](crate::Persistable), which
/// supplies the class name.
///
/// # Examples
///
/// ```
/// use keel_object::info::{TypeInfo, TypeTraits, Typed};
/// use keel_object::registry::ClassBuilder;
/// use keel_object::{Object, ObjectRef, Persistable, impl_object_fn};
///
/// #[derive(Default)]
/// struct Terrain {
///     seed: u64,
/// }
///
/// impl Object for Terrain {
///     impl_object_fn!();
/// }
///
/// impl Typed for Terrain {
///     fn type_info() -> &'static TypeInfo {
///         static INFO: TypeInfo = TypeInfo::class(
///             "Terrain",
///             size_of::<Terrain>(),
///             TypeTraits::OBJECT
///                 .union(TypeTraits::CONSTRUCTABLE)
///                 .union(TypeTraits::PUBLIC_CONSTRUCT),
///         );
///         &INFO
///     }
/// }
///
/// impl Persistable for Terrain {
///     const CLASS: &'static str = "Terrain";
///
///     fn class_info() -> keel_object::info::ClassInfo {
///         ClassBuilder::new(Self::CLASS)
///             .construct(|| ObjectRef::new(Terrain::default()))
///             .build()
///     }
/// }
///
/// let terrain = ObjectRef::new(Terrain { seed: 7 });
/// assert_eq!(terrain.class_name(), "Terrain");
/// ```
#[macro_export]
macro_rules! impl_object_fn {
    () => {
        fn class_name(&self) -> &'static str {
            <Self as $crate::Persistable>::CLASS
        }

        fn as_object(&self) -> &dyn $crate::Object {
            self
        }

        fn as_object_mut(&mut self) -> &mut dyn $crate::Object {
            self
        }
    };
}

// -----------------------------------------------------------------------------
// __persist_submit

#[cfg(feature = "auto_register")]
#[doc(hidden)]
#[macro_export]
macro_rules! __persist_submit {
    ($($registration:tt)*) => {
        $crate::__macro_exports::inventory::submit! { $($registration)* }
    };
}

#[cfg(not(feature = "auto_register"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __persist_submit {
    ($($registration:tt)*) => {};
}

// -----------------------------------------------------------------------------
// persist_class

/// Declares a persistable class: the struct, its property descriptors and
/// its registration metadata in one place.
///
/// The body lists properties as `name: Type`; a property marked
/// `[transient]` exists on the struct but never touches documents. A class
/// deriving from another names the parent and the field embedding it:
/// `class Child: Parent via field`. Prefixing with `internal` declares a
/// class only the load machinery may instantiate.
///
/// Declared classes implement [`Object`](crate::Object) with default
/// property-driven persistence, [`Typed`](crate::info::Typed) and
/// [`Persistable`](crate::Persistable), and are submitted for
/// [`ClassRegistry::auto_register`](crate::ClassRegistry::auto_register)
/// when the `auto_register` feature is on.
///
/// # Examples
///
/// ```
/// use keel_object::{ClassRegistry, Value, persist_class};
///
/// persist_class! {
///     class Body {
///         mass: f32,
///     }
/// }
///
/// persist_class! {
///     class Ship: Body via body {
///         name: String,
///         [transient] wake_timer: f32,
///     }
/// }
///
/// let mut registry = ClassRegistry::new();
/// registry.register::<Body>();
/// registry.register::<Ship>();
/// assert_eq!(registry.get("Ship").unwrap().parent(), Some("Body"));
///
/// let ship = Ship {
///     body: Body { mass: 120.0 },
///     name: "Dawn".into(),
///     wake_timer: 0.0,
/// };
/// assert!(matches!(
///     registry.get_property(&ship, "mass"),
///     Some(Value::F32(mass)) if mass == 120.0
/// ));
/// ```
#[macro_export]
macro_rules! persist_class {
    (class $name:ident { $($body:tt)* }) => {
        $crate::persist_class!(@build $name, (public), (), { $($body)* });
    };
    (class $name:ident : $parent:ident via $pfield:ident { $($body:tt)* }) => {
        $crate::persist_class!(@build $name, (public), ($parent, $pfield), { $($body)* });
    };
    (internal class $name:ident { $($body:tt)* }) => {
        $crate::persist_class!(@build $name, (internal), (), { $($body)* });
    };
    (internal class $name:ident : $parent:ident via $pfield:ident { $($body:tt)* }) => {
        $crate::persist_class!(@build $name, (internal), ($parent, $pfield), { $($body)* });
    };

    (@build $name:ident, ($access:ident), ($($parent:ident, $pfield:ident)?),
     { $($([$flag:ident])? $prop:ident : $pty:ty),* $(,)? }) => {
        #[derive(Debug, Default)]
        pub struct $name {
            $(pub $pfield: $parent,)?
            $(pub $prop: $pty,)*
        }

        impl $crate::Object for $name {
            $crate::impl_object_fn!();
        }

        impl $crate::info::Typed for $name {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static INFO: $crate::info::TypeInfo = $crate::info::TypeInfo::class(
                    ::core::stringify!($name),
                    ::core::mem::size_of::<$name>(),
                    $crate::persist_class!(@traits $access),
                );
                &INFO
            }
        }

        impl $crate::Persistable for $name {
            const CLASS: &'static str = ::core::stringify!($name);

            fn class_info() -> $crate::info::ClassInfo {
                let builder = $crate::registry::ClassBuilder::new(
                    <$name as $crate::Persistable>::CLASS,
                );
                $(
                    let builder = builder.parent(
                        <$parent as $crate::Persistable>::CLASS,
                        $crate::info::ParentLens {
                            by_ref: |obj| {
                                match <dyn $crate::Object>::downcast_ref::<$name>(obj) {
                                    ::core::option::Option::Some(concrete) => {
                                        $crate::Object::as_object(&concrete.$pfield)
                                    }
                                    ::core::option::Option::None => ::core::panic!(
                                        "parent lens of `{}` applied to a different class",
                                        ::core::stringify!($name),
                                    ),
                                }
                            },
                            by_mut: |obj| {
                                match <dyn $crate::Object>::downcast_mut::<$name>(obj) {
                                    ::core::option::Option::Some(concrete) => {
                                        $crate::Object::as_object_mut(&mut concrete.$pfield)
                                    }
                                    ::core::option::Option::None => ::core::panic!(
                                        "parent lens of `{}` applied to a different class",
                                        ::core::stringify!($name),
                                    ),
                                }
                            },
                        },
                    );
                )?
                $(
                    let builder = builder.property($crate::info::PropertyInfo::new::<$pty>(
                        ::core::stringify!($prop),
                        $crate::persist_class!(@flags $($flag)?),
                        |obj| {
                            match <dyn $crate::Object>::downcast_ref::<$name>(obj) {
                                ::core::option::Option::Some(concrete) => {
                                    $crate::value::Value::from(
                                        ::core::clone::Clone::clone(&concrete.$prop),
                                    )
                                }
                                ::core::option::Option::None => ::core::panic!(
                                    "property `{}` of `{}` read from a different class",
                                    ::core::stringify!($prop),
                                    ::core::stringify!($name),
                                ),
                            }
                        },
                        |obj, value| {
                            let concrete =
                                match <dyn $crate::Object>::downcast_mut::<$name>(obj) {
                                    ::core::option::Option::Some(concrete) => concrete,
                                    ::core::option::Option::None => ::core::panic!(
                                        "property `{}` of `{}` written on a different class",
                                        ::core::stringify!($prop),
                                        ::core::stringify!($name),
                                    ),
                                };
                            match <$pty as $crate::value::FromValue>::from_value(value) {
                                ::core::option::Option::Some(value) => concrete.$prop = value,
                                ::core::option::Option::None => ::core::panic!(
                                    "property `{}` of `{}` received a value of the wrong kind",
                                    ::core::stringify!($prop),
                                    ::core::stringify!($name),
                                ),
                            }
                        },
                    ));
                )*
                $crate::persist_class!(@construct $access, builder, $name)
            }
        }

        $crate::__persist_submit! {
            $crate::registry::ClassRegistration {
                name: <$name as $crate::Persistable>::CLASS,
                parent: $crate::persist_class!(@parent_name $($parent)?),
                class_info: <$name as $crate::Persistable>::class_info,
            }
        }
    };

    (@traits public) => {
        $crate::info::TypeTraits::OBJECT
            .union($crate::info::TypeTraits::CONSTRUCTABLE)
            .union($crate::info::TypeTraits::PUBLIC_CONSTRUCT)
    };
    (@traits internal) => {
        $crate::info::TypeTraits::OBJECT.union($crate::info::TypeTraits::CONSTRUCTABLE)
    };

    (@flags) => {
        $crate::info::PropertyFlags::empty()
    };
    (@flags transient) => {
        $crate::info::PropertyFlags::TRANSIENT
    };

    (@construct public, $builder:ident, $name:ident) => {
        $builder
            .construct(|| $crate::ObjectRef::new(<$name as ::core::default::Default>::default()))
            .build()
    };
    (@construct internal, $builder:ident, $name:ident) => {
        $builder
            .construct_internal(|| {
                $crate::ObjectRef::new(<$name as ::core::default::Default>::default())
            })
            .build()
    };

    (@parent_name) => {
        ::core::option::Option::None
    };
    (@parent_name $parent:ident) => {
        ::core::option::Option::Some(<$parent as $crate::Persistable>::CLASS)
    };
}

// -----------------------------------------------------------------------------
// persist_enum

/// Declares a persistable enumeration.
///
/// Every constant carries an explicit numeric value; the first constant is
/// the default. Documents store constants by name, so renaming a constant
/// changes the wire format while renumbering does not.
///
/// # Examples
///
/// ```
/// use keel_object::info::Enumerated;
/// use keel_object::persist_enum;
///
/// persist_enum! {
///     enum Blend {
///         Opaque = 0,
///         Alpha = 1,
///         Additive = 2,
///     }
/// }
///
/// assert_eq!(Blend::default(), Blend::Opaque);
/// assert_eq!(Blend::Alpha.name(), "Alpha");
/// assert_eq!(Blend::from_raw(2), Some(Blend::Additive));
/// assert_eq!(Blend::from_name("garbage"), None);
/// ```
#[macro_export]
macro_rules! persist_enum {
    (enum $name:ident { $first:ident = $firstval:expr $(, $variant:ident = $value:expr)* $(,)? }) => {
        #[repr(i64)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
        pub enum $name {
            #[default]
            $first = $firstval,
            $($variant = $value,)*
        }

        impl $crate::info::Enumerated for $name {
            fn enum_info() -> &'static $crate::info::EnumInfo {
                static CELL: ::std::sync::OnceLock<$crate::info::EnumInfo> =
                    ::std::sync::OnceLock::new();
                CELL.get_or_init(|| {
                    $crate::info::EnumInfo::new(
                        ::core::stringify!($name),
                        &[
                            (::core::stringify!($first), $firstval),
                            $((::core::stringify!($variant), $value),)*
                        ],
                    )
                })
            }

            fn name(self) -> &'static str {
                match self {
                    Self::$first => ::core::stringify!($first),
                    $(Self::$variant => ::core::stringify!($variant),)*
                }
            }

            fn raw(self) -> i64 {
                self as i64
            }

            fn from_raw(raw: i64) -> ::core::option::Option<Self> {
                if raw == Self::$first as i64 {
                    return ::core::option::Option::Some(Self::$first);
                }
                $(
                    if raw == Self::$variant as i64 {
                        return ::core::option::Option::Some(Self::$variant);
                    }
                )*
                ::core::option::Option::None
            }
        }

        impl $crate::info::Typed for $name {
            fn type_info() -> &'static $crate::info::TypeInfo {
                static INFO: $crate::info::TypeInfo = $crate::info::TypeInfo::enumeration(
                    ::core::stringify!($name),
                    ::core::mem::size_of::<$name>(),
                    <$name as $crate::info::Enumerated>::enum_info,
                );
                &INFO
            }
        }

        impl ::core::convert::From<$name> for $crate::value::Value {
            fn from(value: $name) -> Self {
                $crate::value::Value::Enum($crate::value::EnumValue {
                    name: $crate::info::Enumerated::name(value),
                    value: $crate::info::Enumerated::raw(value),
                })
            }
        }

        impl $crate::value::FromValue for $name {
            fn from_value(value: $crate::value::Value) -> ::core::option::Option<Self> {
                match value {
                    $crate::value::Value::Enum(constant) => {
                        <$name as $crate::info::Enumerated>::from_raw(constant.value)
                    }
                    _ => ::core::option::Option::None,
                }
            }
        }
    };
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::info::{Enumerated, TypeTraits, Typed, ValueKind};
    use crate::object::Persistable;
    use crate::value::{FromValue, Value};

    persist_class! {
        class Emitter {
            rate: f32,
            [transient] accum: f32,
        }
    }

    persist_class! {
        class BurstEmitter: Emitter via base {
            burst: u32,
        }
    }

    persist_class! {
        internal class Reservoir {
            capacity: u32,
        }
    }

    persist_enum! {
        enum Space {
            Local = 0,
            World = 1,
        }
    }

    #[test]
    fn class_metadata() {
        assert_eq!(Emitter::CLASS, "Emitter");
        let info = Emitter::class_info();
        assert_eq!(info.name(), "Emitter");
        assert!(info.parent().is_none());
        assert_eq!(info.properties().len(), 2);
        assert!(!info.property("rate").unwrap().is_transient());
        assert!(info.property("accum").unwrap().is_transient());

        let type_info = Emitter::type_info();
        assert_eq!(type_info.kind(), ValueKind::Object);
        assert!(type_info.has_traits(TypeTraits::PUBLIC_CONSTRUCT));
    }

    #[test]
    fn derived_class_projects_parent() {
        let info = BurstEmitter::class_info();
        assert_eq!(info.parent(), Some("Emitter"));

        let emitter = BurstEmitter {
            base: Emitter {
                rate: 5.0,
                accum: 0.0,
            },
            burst: 3,
        };
        let lens = info.parent_lens().unwrap();
        let base = (lens.by_ref)(&emitter);
        assert_eq!(base.class_name(), "Emitter");
    }

    #[test]
    fn property_accessors() {
        let mut emitter = Emitter {
            rate: 2.0,
            accum: 0.0,
        };
        let info = Emitter::class_info();
        let rate = info.property("rate").unwrap();
        assert!(matches!(rate.get(&emitter), Value::F32(r) if r == 2.0));
        rate.set(&mut emitter, Value::F32(8.0));
        assert_eq!(emitter.rate, 8.0);
    }

    #[test]
    #[should_panic(expected = "received a value of the wrong kind")]
    fn wrong_kind_write_panics() {
        let mut emitter = Emitter::default();
        let info = Emitter::class_info();
        info.property("rate").unwrap().set(&mut emitter, Value::Bool(true));
    }

    #[test]
    #[should_panic(expected = "read from a different class")]
    fn foreign_object_read_panics() {
        let reservoir = Reservoir::default();
        let info = Emitter::class_info();
        let _ = info.property("rate").unwrap().get(&reservoir);
    }

    #[test]
    fn internal_class_traits() {
        let type_info = Reservoir::type_info();
        assert!(type_info.has_traits(TypeTraits::CONSTRUCTABLE));
        assert!(!type_info.has_traits(TypeTraits::PUBLIC_CONSTRUCT));
        assert!(Reservoir::class_info().construct_for_load().is_some());
    }

    #[test]
    #[should_panic(expected = "does not allow public construction")]
    fn internal_class_public_construct_panics() {
        let _ = Reservoir::class_info().construct();
    }

    #[test]
    fn enum_metadata() {
        assert_eq!(Space::default(), Space::Local);
        assert_eq!(Space::World.name(), "World");
        assert_eq!(Space::World.raw(), 1);
        assert_eq!(Space::from_raw(0), Some(Space::Local));
        assert_eq!(Space::from_raw(9), None);
        assert_eq!(Space::from_name("World"), Some(Space::World));
        assert_eq!(Space::from_name("world"), None);

        let info = Space::enum_info();
        assert_eq!(info.name(), "Space");
        assert_eq!(info.names(), ["Local", "World"]);
        assert_eq!(Space::type_info().kind(), ValueKind::Enum);
    }

    #[test]
    fn enum_value_conversions() {
        let value = Value::from(Space::World);
        assert!(matches!(
            &value,
            Value::Enum(constant) if constant.name == "World" && constant.value == 1
        ));
        assert_eq!(Space::from_value(value), Some(Space::World));
        assert_eq!(Space::from_value(Value::I64(1)), None);
    }
}
