//! Customer registration and address management.

use domain::{Address, AddressFields, Customer, CustomerId, CustomerWithAddress};
use store::{CustomerStore, Store, Transaction};

use crate::commands::NewCustomer;
use crate::error::{Result, ServiceError};

/// Service for customers and their address.
pub struct CustomerService<S: Store> {
    store: S,
}

impl<S: Store> CustomerService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a customer and its address in one transaction.
    #[tracing::instrument(skip(self, cmd), fields(email = %cmd.email))]
    pub async fn create_customer(&self, cmd: NewCustomer) -> Result<CustomerWithAddress> {
        let customer = Customer::new(cmd.name, cmd.email)?;
        let address = Address::new(customer.id(), cmd.address)?;

        let mut tx = self.store.begin().await?;
        if tx.customer_exists_by_email(customer.email()).await? {
            return Err(ServiceError::Conflict(format!(
                "Email {} is already registered",
                customer.email()
            )));
        }
        tx.save_customer(&customer).await?;
        tx.save_address(&address).await?;
        tx.commit().await?;

        tracing::info!(customer_id = %customer.id(), "customer registered");
        Ok(CustomerWithAddress {
            customer,
            address: Some(address),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_customer(&self, id: CustomerId) -> Result<CustomerWithAddress> {
        let mut tx = self.store.begin().await?;
        let customer = tx
            .get_customer(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", id))?;
        let address = tx.get_address(id).await?;
        Ok(CustomerWithAddress { customer, address })
    }

    /// Looks a customer up by email, ignoring case and surrounding spaces.
    #[tracing::instrument(skip(self))]
    pub async fn get_customer_by_email(&self, email: &str) -> Result<CustomerWithAddress> {
        let email = email.trim().to_lowercase();
        let mut tx = self.store.begin().await?;
        let customer = tx
            .get_customer_by_email(&email)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", &email))?;
        let address = tx.get_address(customer.id()).await?;
        Ok(CustomerWithAddress { customer, address })
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_customers(&self) -> Result<Vec<CustomerWithAddress>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_customers().await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_customers_by_city(&self, city: &str) -> Result<Vec<CustomerWithAddress>> {
        let mut tx = self.store.begin().await?;
        Ok(tx.list_customers_by_city(city.trim()).await?)
    }

    /// Replaces the customer's address fields, creating the address if the
    /// customer has none yet.
    #[tracing::instrument(skip(self, fields))]
    pub async fn update_address(
        &self,
        customer_id: CustomerId,
        fields: AddressFields,
    ) -> Result<Address> {
        let mut tx = self.store.begin().await?;
        tx.get_customer(customer_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer", customer_id))?;

        let address = match tx.get_address(customer_id).await? {
            Some(mut existing) => {
                existing.update(fields)?;
                existing
            }
            None => Address::new(customer_id, fields)?,
        };
        tx.save_address(&address).await?;
        tx.commit().await?;
        Ok(address)
    }

    /// Deletes a customer with its address and orders.
    #[tracing::instrument(skip(self))]
    pub async fn delete_customer(&self, id: CustomerId) -> Result<()> {
        let mut tx = self.store.begin().await?;
        if !tx.delete_customer(id).await? {
            return Err(ServiceError::not_found("customer", id));
        }
        tx.commit().await?;
        tracing::info!(customer_id = %id, "customer deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use store::InMemoryStore;

    fn new_customer(email: &str, city: &str) -> NewCustomer {
        NewCustomer {
            name: "Ana".to_string(),
            email: email.to_string(),
            address: AddressFields {
                street: "Calle Luna 3".to_string(),
                city: city.to_string(),
                country: "Spain".to_string(),
                postal_code: "41001".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let service = CustomerService::new(InMemoryStore::new());
        service
            .create_customer(new_customer("ana@example.com", "Sevilla"))
            .await
            .unwrap();

        let err = service
            .create_customer(new_customer("ANA@example.com", "Madrid"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_lookup_by_email_is_case_insensitive() {
        let service = CustomerService::new(InMemoryStore::new());
        let created = service
            .create_customer(new_customer("ana@example.com", "Sevilla"))
            .await
            .unwrap();

        let found = service
            .get_customer_by_email(" Ana@Example.COM ")
            .await
            .unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_invalid_input_is_validation_failure() {
        let service = CustomerService::new(InMemoryStore::new());
        let mut bad = new_customer("ana@example.com", "Sevilla");
        bad.address.street = " ".to_string();

        let err = service.create_customer(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailed);
        assert!(service.list_customers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_address_keeps_identity() {
        let service = CustomerService::new(InMemoryStore::new());
        let created = service
            .create_customer(new_customer("ana@example.com", "Sevilla"))
            .await
            .unwrap();
        let customer_id = created.customer.id();
        let original_id = created.address.unwrap().id();

        let mut fields = new_customer("x@example.com", "Cadiz").address;
        fields.street = "Plaza 1".to_string();
        let updated = service.update_address(customer_id, fields).await.unwrap();

        assert_eq!(updated.id(), original_id);
        assert_eq!(updated.city(), "Cadiz");
        let by_city = service.list_customers_by_city("Cadiz").await.unwrap();
        assert_eq!(by_city.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_customer() {
        let service = CustomerService::new(InMemoryStore::new());
        let err = service.delete_customer(CustomerId::new()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
