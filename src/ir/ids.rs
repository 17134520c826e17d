//! Newtype ids for images, annotations and categories.
//!
//! COCO links its three arrays purely through integer ids, so keeping them
//! as distinct types stops an image id from being used as a category id.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of an image record.
    ImageId
);

define_id!(
    /// Identifier of an annotation record, unique across the whole dataset.
    AnnotationId
);

define_id!(
    /// Identifier of a category (class label).
    CategoryId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_compare_by_value() {
        assert_eq!(ImageId(1), ImageId::from(1));
        assert!(CategoryId(2) > CategoryId(1));
        assert_eq!(AnnotationId::new(7).as_u64(), 7);
    }

    #[test]
    fn debug_names_the_id_kind() {
        assert_eq!(format!("{:?}", ImageId(3)), "ImageId(3)");
        assert_eq!(format!("{:?}", CategoryId(1)), "CategoryId(1)");
        assert_eq!(ImageId(3).to_string(), "3");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&AnnotationId(42)).unwrap();
        assert_eq!(json, "42");
    }
}
