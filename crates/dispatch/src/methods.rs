use http::Method;
use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;
use thiserror::Error;

/// The set of verbs a payload field applies to.
///
/// [`Methods::ALL`] also covers extension methods that have no dedicated flag.
///
/// # Example
/// ```
/// use http::Method;
/// use micro_dispatch::Methods;
///
/// let methods: Methods = "get, post".parse().unwrap();
/// assert_eq!(methods, Methods::GET | Methods::POST);
/// assert!(methods.contains(&Method::POST));
/// assert!(!methods.contains(&Method::PUT));
/// ```
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Methods(u16);

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown method token '{token}'")]
pub struct ParseMethodsError {
    token: String,
}

const NAMED: [(&str, Methods); 7] = [
    ("GET", Methods::GET),
    ("POST", Methods::POST),
    ("PUT", Methods::PUT),
    ("DELETE", Methods::DELETE),
    ("PATCH", Methods::PATCH),
    ("HEAD", Methods::HEAD),
    ("OPTIONS", Methods::OPTIONS),
];

impl Methods {
    pub const NONE: Methods = Methods(0);
    pub const GET: Methods = Methods(1);
    pub const POST: Methods = Methods(1 << 1);
    pub const PUT: Methods = Methods(1 << 2);
    pub const DELETE: Methods = Methods(1 << 3);
    pub const PATCH: Methods = Methods(1 << 4);
    pub const HEAD: Methods = Methods(1 << 5);
    pub const OPTIONS: Methods = Methods(1 << 6);
    pub const ALL: Methods = Methods(u16::MAX);

    #[inline]
    pub const fn union(self, other: Methods) -> Methods {
        Methods(self.0 | other.0)
    }

    /// Returns true if `method` is part of this set.
    pub fn contains(self, method: &Method) -> bool {
        if self == Methods::ALL {
            return true;
        }

        NAMED.iter().any(|(name, flag)| method.as_str() == *name && self.0 & flag.0 != 0)
    }
}

impl BitOr for Methods {
    type Output = Methods;

    fn bitor(self, rhs: Methods) -> Methods {
        self.union(rhs)
    }
}

impl FromStr for Methods {
    type Err = ParseMethodsError;

    /// Parses a comma separated list of method names, or `all` / `*`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut methods = Methods::NONE;
        for token in s.split(',').map(str::trim) {
            if token == "*" || token.eq_ignore_ascii_case("all") {
                return Ok(Methods::ALL);
            }

            let flag = NAMED
                .iter()
                .find(|(name, _)| token.eq_ignore_ascii_case(name))
                .map(|(_, flag)| *flag)
                .ok_or_else(|| ParseMethodsError { token: token.to_owned() })?;
            methods = methods | flag;
        }
        Ok(methods)
    }
}

impl fmt::Debug for Methods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Methods::ALL {
            return f.write_str("Methods(ALL)");
        }
        let names = NAMED.iter().filter(|(_, flag)| self.0 & flag.0 != 0).map(|(name, _)| *name);
        f.debug_tuple("Methods").field(&names.collect::<Vec<_>>()).finish()
    }
}
