//! Typed ID wrappers for sessions and tools.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed IDs prevent mixing up a session id with a tool name at the type
/// level. They're plain strings underneath — no format is enforced.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            /// Create a new typed id from anything that converts to `String`.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

typed_id!(SessionId, "Identifies a conversation session.");
typed_id!(ToolName, "Identifies a registered tool.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_roundtrips_through_display() {
        let id = SessionId::new("s1");
        assert_eq!(id.to_string(), "s1");
        assert_eq!(id.as_str(), "s1");
    }

    #[test]
    fn tool_name_from_str_and_string() {
        let a: ToolName = "activity_generator".into();
        let b: ToolName = String::from("activity_generator").into();
        assert_eq!(a, b);
    }
}
