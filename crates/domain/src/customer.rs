//! Customers and their postal address.

use common::{AddressId, CustomerId};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value_objects::{require_email, require_not_blank};

/// A store customer.
///
/// The customer is the non-owning side of both of its relations: the address
/// and the orders carry the `customer_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    id: CustomerId,
    name: String,
    /// Unique across customers, stored lowercase.
    email: String,
}

impl Customer {
    /// Creates a new customer after validating name and email.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: CustomerId::new(),
            name: require_not_blank("name", name)?,
            email: require_email(email)?,
        })
    }

    /// Rebuilds a customer from persisted fields.
    pub fn restore(id: CustomerId, name: String, email: String) -> Self {
        Self { id, name, email }
    }

    pub fn id(&self) -> CustomerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// Raw address fields as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressFields {
    pub street: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
}

impl AddressFields {
    fn validated(self) -> Result<Self> {
        Ok(Self {
            street: require_not_blank("street", self.street)?,
            city: require_not_blank("city", self.city)?,
            country: require_not_blank("country", self.country)?,
            postal_code: require_not_blank("postal_code", self.postal_code)?,
        })
    }
}

/// Postal address, the owning side of the customer 1:1 relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Address {
    id: AddressId,
    customer_id: CustomerId,
    #[serde(flatten)]
    fields: AddressFields,
}

impl Address {
    /// Creates an address bound to `customer_id`.
    pub fn new(customer_id: CustomerId, fields: AddressFields) -> Result<Self> {
        Ok(Self {
            id: AddressId::new(),
            customer_id,
            fields: fields.validated()?,
        })
    }

    /// Rebuilds an address from persisted fields.
    pub fn restore(id: AddressId, customer_id: CustomerId, fields: AddressFields) -> Self {
        Self {
            id,
            customer_id,
            fields,
        }
    }

    /// Replaces every field in place, keeping id and owner.
    pub fn update(&mut self, fields: AddressFields) -> Result<()> {
        self.fields = fields.validated()?;
        Ok(())
    }

    pub fn id(&self) -> AddressId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn street(&self) -> &str {
        &self.fields.street
    }

    pub fn city(&self) -> &str {
        &self.fields.city
    }

    pub fn country(&self) -> &str {
        &self.fields.country
    }

    pub fn postal_code(&self) -> &str {
        &self.fields.postal_code
    }

    pub fn fields(&self) -> &AddressFields {
        &self.fields
    }
}

/// A customer joined with its address, if one exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerWithAddress {
    pub customer: Customer,
    pub address: Option<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DomainError;

    fn fields() -> AddressFields {
        AddressFields {
            street: "Calle Mayor 1".to_string(),
            city: "Madrid".to_string(),
            country: "Spain".to_string(),
            postal_code: "28013".to_string(),
        }
    }

    #[test]
    fn test_new_customer_normalizes_fields() {
        let customer = Customer::new("  Ana  ", "Ana@Example.com").unwrap();
        assert_eq!(customer.name(), "Ana");
        assert_eq!(customer.email(), "ana@example.com");
    }

    #[test]
    fn test_new_customer_rejects_blank_name() {
        let err = Customer::new(" ", "ana@example.com").unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "name", .. }));
    }

    #[test]
    fn test_new_customer_rejects_bad_email() {
        let err = Customer::new("Ana", "not-an-email").unwrap_err();
        assert!(matches!(err, DomainError::Validation { field: "email", .. }));
    }

    #[test]
    fn test_address_is_bound_to_customer() {
        let customer = Customer::new("Ana", "ana@example.com").unwrap();
        let address = Address::new(customer.id(), fields()).unwrap();
        assert_eq!(address.customer_id(), customer.id());
        assert_eq!(address.city(), "Madrid");
    }

    #[test]
    fn test_address_rejects_blank_fields() {
        let mut bad = fields();
        bad.postal_code = "".to_string();
        let err = Address::new(CustomerId::new(), bad).unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation {
                field: "postal_code",
                ..
            }
        ));
    }

    #[test]
    fn test_address_update_keeps_identity() {
        let mut address = Address::new(CustomerId::new(), fields()).unwrap();
        let id = address.id();
        let mut moved = fields();
        moved.city = "Sevilla".to_string();

        address.update(moved).unwrap();
        assert_eq!(address.id(), id);
        assert_eq!(address.city(), "Sevilla");
    }

    #[test]
    fn test_failed_update_leaves_address_unchanged() {
        let mut address = Address::new(CustomerId::new(), fields()).unwrap();
        let mut bad = fields();
        bad.street = " ".to_string();

        assert!(address.update(bad).is_err());
        assert_eq!(address.street(), "Calle Mayor 1");
    }

    #[test]
    fn test_address_serializes_flat() {
        let address = Address::new(CustomerId::new(), fields()).unwrap();
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["city"], "Madrid");
        assert!(json.get("fields").is_none());
    }
}
