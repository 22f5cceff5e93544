use std::fmt;

use serde::{Deserialize, Serialize};

/// Role ladder of a platform user.
///
/// Ordering is meaningful: a check for `Teacher` also admits
/// `Administrator` and `SuperAdmin`. Serialized as its integer rank
/// (`0..=3`), the representation carried inside user tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub enum UserKind {
    Student = 0,
    Teacher = 1,
    Administrator = 2,
    SuperAdmin = 3,
}

impl UserKind {
    pub fn rank(self) -> i16 {
        self as i16
    }

    /// Returns `true` when this role meets `min`.
    pub fn at_least(self, min: UserKind) -> bool {
        self >= min
    }
}

impl TryFrom<i16> for UserKind {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Student),
            1 => Ok(Self::Teacher),
            2 => Ok(Self::Administrator),
            3 => Ok(Self::SuperAdmin),
            other => Err(format!("unknown user kind {other}")),
        }
    }
}

impl From<UserKind> for i16 {
    fn from(kind: UserKind) -> Self {
        kind.rank()
    }
}

impl fmt::Display for UserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Student => "student",
            Self::Teacher => "teacher",
            Self::Administrator => "administrator",
            Self::SuperAdmin => "superadmin",
        };
        f.write_str(name)
    }
}
