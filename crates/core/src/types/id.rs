//! Newtype IDs for type-safe entity references.
//!
//! The backend assigns UUID strings to every row; the `define_id!` macro
//! wraps them so a `ProductId` can never be passed where a `UserId` is
//! expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around a backend-assigned `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `short_ref()`
/// - `From<String>` / `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use varmina_core::define_id;
/// define_id!(ProductId);
/// define_id!(UserId);
///
/// let product_id = ProductId::new("9f0c2a51-1b44-4c59-a2ff-6f2a9d3cf001");
/// assert_eq!(product_id.short_ref(), "9f0c2a51");
///
/// // These are different types, so this won't compile:
/// // let _: UserId = product_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from a string value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Short human-readable reference: the first 8 characters.
            ///
            /// Used in quote messages where a full UUID is noise.
            #[must_use]
            pub fn short_ref(&self) -> &str {
                let end = self
                    .0
                    .char_indices()
                    .nth(8)
                    .map_or(self.0.len(), |(i, _)| i);
                self.0.get(..end).unwrap_or(&self.0)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(UserId);
define_id!(AssetId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_ref_truncates_uuid() {
        let id = ProductId::new("9f0c2a51-1b44-4c59-a2ff-6f2a9d3cf001");
        assert_eq!(id.short_ref(), "9f0c2a51");
    }

    #[test]
    fn short_ref_keeps_short_ids_whole() {
        let id = ProductId::new("abc");
        assert_eq!(id.short_ref(), "abc");
    }

    #[test]
    fn display_matches_inner_value() {
        let id = UserId::new("user-1");
        assert_eq!(id.to_string(), "user-1");
        assert_eq!(id.as_str(), "user-1");
    }
}
