// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Values a template is rendered against.

use std::{collections::BTreeMap, fmt, rc::Rc};

use derive_more::with_trait::{Deref, DerefMut, From};
use itertools::Itertools as _;

use crate::format::expr::Lambda;

/// Single value of a [`TemplateData`] record or of an evaluated expression.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// Absent value.
    #[default]
    Undefined,

    /// Explicit `null`.
    Null,

    /// Boolean.
    Bool(bool),

    /// Number. Integers are represented exactly up to 2<sup>53</sup>.
    Number(f64),

    /// String.
    String(String),

    /// Array of values.
    Array(Vec<Value>),

    /// Nested record, accessible with `.` and `[]`.
    Object(BTreeMap<String, Value>),

    /// `colors` namespace exposing the [`STYLES`] registry.
    ///
    /// [`STYLES`]: crate::style::STYLES
    Colors,

    /// Style function taken out of the `colors` namespace.
    Style(&'static str),

    /// Arrow function created inside an expression.
    Lambda(Rc<Lambda>),
}

impl Value {
    /// Returns a human readable name of this [`Value`]'s type, the way
    /// `typeof` reports it.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null | Self::Array(_) | Self::Object(_) | Self::Colors => {
                "object"
            }
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Style(_) | Self::Lambda(_) => "function",
        }
    }

    /// Indicates whether this [`Value`] is considered `true` in a condition.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_)
            | Self::Object(_)
            | Self::Colors
            | Self::Style(_)
            | Self::Lambda(_) => true,
        }
    }

    /// Indicates whether this [`Value`] is `null` or `undefined`.
    #[must_use]
    pub const fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    /// Converts this [`Value`] into a number, the way arithmetic does.
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined
            | Self::Object(_)
            | Self::Colors
            | Self::Style(_)
            | Self::Lambda(_) => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    0.0
                } else {
                    s.parse().unwrap_or(f64::NAN)
                }
            }
            Self::Array(items) => match items.as_slice() {
                [] => 0.0,
                [single] => single.to_number(),
                _ => f64::NAN,
            },
        }
    }
}

/// Stringifies a number with plain decimal notation and no locale specific
/// separators.
#[must_use]
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".into()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.into()
    } else if n == 0.0 {
        // Negative zero prints as plain zero.
        "0".into()
    } else {
        n.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => f.write_str(&number_to_string(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                let joined = items
                    .iter()
                    .map(|v| {
                        if v.is_nullish() {
                            String::new()
                        } else {
                            v.to_string()
                        }
                    })
                    .join(",");
                f.write_str(&joined)
            }
            Self::Object(_) | Self::Colors => f.write_str("[object Object]"),
            Self::Style(name) => {
                write!(f, "function {name}() {{ [native code] }}")
            }
            Self::Lambda(_) => f.write_str("(...) => { ... }"),
        }
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),* $(,)?) => {$(
        impl From<$ty> for Value {
            #[allow(clippy::cast_precision_loss, trivial_numeric_casts)]
            fn from(n: $ty) -> Self {
                Self::Number(n as f64)
            }
        }
    )*};
}

impl_from_number!(i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl From<TemplateData> for Value {
    fn from(data: TemplateData) -> Self {
        Self::Object(data.0)
    }
}

/// Record of named [`Value`]s a template is rendered against.
#[derive(Clone, Debug, Default, Deref, DerefMut, From, PartialEq)]
pub struct TemplateData(BTreeMap<String, Value>);

impl TemplateData {
    /// Creates an empty [`TemplateData`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the given `value` under the given `name`.
    #[must_use]
    pub fn with(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        let _ = self.0.insert(name.into(), value.into());
        self
    }

    /// Returns the [`Value`] stored under the given `name`, if any.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for TemplateData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
