//! Cache Result Module
//!
//! Structured outcomes returned by every cache operation.

use std::borrow::Cow;

use serde::Serialize;

use crate::error::{CacheError, OperationFailure};

// == Result Code ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CacheResultCode {
    Success,
    NotExists,
    Expired,
    Fail,
}

impl CacheResultCode {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheResultCode::Success => "SUCCESS",
            CacheResultCode::NotExists => "NOT_EXISTS",
            CacheResultCode::Expired => "EXPIRED",
            CacheResultCode::Fail => "FAIL",
        }
    }
}

// == Cache Result ==
/// Outcome of a PUT or INVALIDATE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResult {
    code: CacheResultCode,
    message: Option<Cow<'static, str>>,
}

impl CacheResult {
    pub const SUCCESS: CacheResult = CacheResult {
        code: CacheResultCode::Success,
        message: None,
    };

    /// A `FAIL` result carrying `<Category>:<message>` of the error.
    pub fn fail(err: &CacheError) -> Self {
        Self {
            code: CacheResultCode::Fail,
            message: Some(Cow::Owned(err.describe())),
        }
    }

    pub fn code(&self) -> CacheResultCode {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.code == CacheResultCode::Success
    }
}

// == Cache Get Result ==
/// Outcome of a GET. Only `SUCCESS` carries a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheGetResult<V> {
    code: CacheResultCode,
    message: Option<Cow<'static, str>>,
    value: Option<V>,
}

impl<V> CacheGetResult<V> {
    pub fn success(value: V) -> Self {
        Self {
            code: CacheResultCode::Success,
            message: None,
            value: Some(value),
        }
    }

    /// Plain absence, no message.
    pub const fn not_exists() -> Self {
        Self {
            code: CacheResultCode::NotExists,
            message: None,
            value: None,
        }
    }

    /// Absence caused by a released weak or soft reference.
    pub const fn released(message: &'static str) -> Self {
        Self {
            code: CacheResultCode::NotExists,
            message: Some(Cow::Borrowed(message)),
            value: None,
        }
    }

    pub const fn expired() -> Self {
        Self {
            code: CacheResultCode::Expired,
            message: None,
            value: None,
        }
    }

    pub fn fail(err: &CacheError) -> Self {
        Self {
            code: CacheResultCode::Fail,
            message: Some(Cow::Owned(err.describe())),
            value: None,
        }
    }

    pub fn code(&self) -> CacheResultCode {
        self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.code == CacheResultCode::Success
    }

    pub fn value(&self) -> Option<&V> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<V> {
        self.value
    }

    /// Folds the result into a `Result` for `?`-style callers.
    ///
    /// Absence and expiry become `Ok(None)`; a failure stays an error so it
    /// is never mistaken for a miss.
    pub fn into_result(self) -> Result<Option<V>, OperationFailure> {
        match self.code {
            CacheResultCode::Fail => Err(OperationFailure::new(
                self.message.map(Cow::into_owned).unwrap_or_default(),
            )),
            _ => Ok(self.value),
        }
    }
}
