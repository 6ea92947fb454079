//! Deferred configuration cells
//!
//! A [`DeferredValue`] holds either a concrete value or [`Setting::Deferred`],
//! in which case reading it looks up the field of the same name on another
//! render context: the ambient one for [`DeferredValue::get`], or an explicit
//! one for [`DeferredValue::get_in`]. Resolution goes exactly one level deep.

use crate::ambient;
use crate::callback::CallbackList;
use crate::context::{ImageFormat, RenderContext, StructureScale};
use crate::error::{ContextError, ContextResult};

/// A concrete value or a marker meaning "use the ambient context's value"
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Setting<T> {
    #[default]
    Deferred,
    Value(T),
}

impl<T> Setting<T> {
    #[inline]
    pub fn is_deferred(&self) -> bool {
        matches!(self, Setting::Deferred)
    }

    /// The concrete value, if any
    pub fn value(&self) -> Option<&T> {
        match self {
            Setting::Value(v) => Some(v),
            Setting::Deferred => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Setting<U> {
        match self {
            Setting::Value(v) => Setting::Value(f(v)),
            Setting::Deferred => Setting::Deferred,
        }
    }
}

impl<T> From<T> for Setting<T> {
    fn from(value: T) -> Self {
        Setting::Value(value)
    }
}

/// A field value with its type erased, as returned by [`RenderContext::lookup`]
#[derive(Debug, Clone)]
pub enum FieldValue {
    Size(u32),
    Bound(Option<u32>),
    Scale(StructureScale),
    Float(f64),
    Format(ImageFormat),
    Flag(bool),
    Callbacks(CallbackList),
}

impl FieldValue {
    /// Name of the contained type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Size(_) => u32::TYPE_NAME,
            FieldValue::Bound(_) => <Option<u32>>::TYPE_NAME,
            FieldValue::Scale(_) => StructureScale::TYPE_NAME,
            FieldValue::Float(_) => f64::TYPE_NAME,
            FieldValue::Format(_) => ImageFormat::TYPE_NAME,
            FieldValue::Flag(_) => bool::TYPE_NAME,
            FieldValue::Callbacks(_) => CallbackList::TYPE_NAME,
        }
    }
}

/// Types a render context field can hold
pub trait ContextValue: Clone {
    const TYPE_NAME: &'static str;

    fn into_field(self) -> FieldValue;

    fn from_field(field: FieldValue) -> Option<Self>;
}

macro_rules! context_value {
    ($ty:ty, $variant:ident, $name:literal) => {
        impl ContextValue for $ty {
            const TYPE_NAME: &'static str = $name;

            #[inline]
            fn into_field(self) -> FieldValue {
                FieldValue::$variant(self)
            }

            #[inline]
            fn from_field(field: FieldValue) -> Option<Self> {
                match field {
                    FieldValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

context_value!(u32, Size, "size");
context_value!(Option<u32>, Bound, "optional size");
context_value!(StructureScale, Scale, "structure scale");
context_value!(f64, Float, "float");
context_value!(ImageFormat, Format, "image format");
context_value!(bool, Flag, "bool");
context_value!(CallbackList, Callbacks, "callback list");

/// A named configuration cell that may defer to another context
#[derive(Debug, Clone)]
pub struct DeferredValue<T> {
    name: &'static str,
    current: Setting<T>,
    initial: Setting<T>,
}

impl<T: ContextValue> DeferredValue<T> {
    /// Create a cell; `initial` is what [`reset`](Self::reset) restores
    pub fn new(name: &'static str, initial: impl Into<Setting<T>>) -> Self {
        let initial = initial.into();
        DeferredValue {
            name,
            current: initial.clone(),
            initial,
        }
    }

    /// A cell that starts out deferred
    pub fn deferred(name: &'static str) -> Self {
        Self::new(name, Setting::<T>::Deferred)
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.current.is_deferred()
    }

    /// The raw setting, without resolution
    #[inline]
    pub fn setting(&self) -> &Setting<T> {
        &self.current
    }

    /// Resolve against the ambient context
    pub fn get(&self) -> ContextResult<T> {
        match &self.current {
            Setting::Value(v) => Ok(v.clone()),
            Setting::Deferred => resolve(self.name, &ambient::current()),
        }
    }

    /// Resolve against an explicit context
    pub fn get_in(&self, ctx: &RenderContext) -> ContextResult<T> {
        match &self.current {
            Setting::Value(v) => Ok(v.clone()),
            Setting::Deferred => resolve(self.name, ctx),
        }
    }

    pub fn set(&mut self, setting: impl Into<Setting<T>>) {
        self.current = setting.into();
    }

    #[inline]
    pub fn set_value(&mut self, value: T) {
        self.current = Setting::Value(value);
    }

    #[inline]
    pub fn defer(&mut self) {
        self.current = Setting::Deferred;
    }

    /// Restore the construction-time setting
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
    }

    /// The current setting as an untyped field
    pub fn field(&self) -> Setting<FieldValue> {
        self.current.clone().map(ContextValue::into_field)
    }
}

fn resolve<T: ContextValue>(name: &str, ctx: &RenderContext) -> ContextResult<T> {
    match ctx.lookup(name)? {
        Setting::Deferred => Err(ContextError::UnresolvedField(name.to_string())),
        Setting::Value(field) => {
            let actual = field.type_name();
            T::from_field(field).ok_or_else(|| ContextError::TypeMismatch {
                field: name.to_string(),
                expected: T::TYPE_NAME,
                actual,
            })
        }
    }
}
