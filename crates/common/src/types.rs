use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// Wraps the storage-assigned integer key to prevent mixing up
        /// identifiers of different entities.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from a raw storage key.
            pub fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw storage key.
            pub fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

entity_id! {
    /// Unique identifier for a customer.
    CustomerId
}

entity_id! {
    /// Unique identifier for a product.
    ProductId
}

entity_id! {
    /// Unique identifier for a sales order.
    OrderId
}

entity_id! {
    /// Unique identifier for a line item within a sales order.
    LineItemId
}

entity_id! {
    /// Unique identifier for an offered service.
    ServiceId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_preserves_raw_key() {
        let id = OrderId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(i64::from(id), 42);
    }

    #[test]
    fn id_display_is_raw_key() {
        assert_eq!(ProductId::new(7).to_string(), "7");
    }

    #[test]
    fn id_serializes_transparently() {
        let id = CustomerId::new(3);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "3");
        let back: CustomerId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_of_same_entity_compare_by_value() {
        assert_eq!(LineItemId::new(1), LineItemId::from(1));
        assert_ne!(LineItemId::new(1), LineItemId::new(2));
    }
}
