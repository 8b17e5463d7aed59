use crate::{
    db::DbPool,
    entities::{
        item, purchase_order, supplier, supplier_contact,
        supplier_statement::{self, PaymentStatus},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use slog::Logger;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

static MONTH_YEAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").expect("valid month-year pattern"));

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateSupplierInput {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub address: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub abn_number: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
pub struct UpdateSupplierInput {
    pub name: Option<String>,
    pub address: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub abn_number: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateContactInput {
    #[validate(length(min = 1, message = "Name must not be empty"))]
    pub name: String,
    pub role: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateContactInput {
    pub name: Option<String>,
    pub role: Option<Option<String>>,
    pub email: Option<Option<String>>,
    pub phone: Option<Option<String>>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateStatementInput {
    /// Billing period, "YYYY-MM"
    pub month_year: String,
    pub due_date: Option<NaiveDate>,
    pub amount: Decimal,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateStatementInput {
    pub due_date: Option<Option<NaiveDate>>,
    pub amount: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
}

/// Service for supplier master data, contacts and statements
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    logger: Logger,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>, logger: Logger) -> Self {
        Self {
            db_pool,
            event_sender,
            logger,
        }
    }

    #[instrument(skip(self, input))]
    pub async fn create_supplier(
        &self,
        input: CreateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        input.validate()?;

        let saved = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            address: Set(input.address),
            email: Set(input.email),
            phone: Set(input.phone),
            website: Set(input.website),
            abn_number: Set(input.abn_number),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "Supplier created"; "supplier_id" => %saved.id);
        self.event_sender
            .send(Event::SupplierCreated(saved.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_supplier(&self, supplier_id: Uuid) -> Result<supplier::Model, ServiceError> {
        self.find_required(supplier_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_suppliers(&self) -> Result<Vec<supplier::Model>, ServiceError> {
        supplier::Entity::find()
            .order_by_asc(supplier::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, input))]
    pub async fn update_supplier(
        &self,
        supplier_id: Uuid,
        input: UpdateSupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        let existing = self.find_required(supplier_id).await?;
        let mut active: supplier::ActiveModel = existing.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Name must not be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(address) = input.address {
            active.address = Set(address);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }
        if let Some(website) = input.website {
            active.website = Set(website);
        }
        if let Some(abn_number) = input.abn_number {
            active.abn_number = Set(abn_number);
        }
        active.updated_at = Set(Some(Utc::now()));

        let updated = active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        self.event_sender
            .send(Event::SupplierUpdated(updated.id))
            .await
            .map_err(ServiceError::EventError)?;

        Ok(updated)
    }

    /// Deletes a supplier and its owned contacts and statements.
    ///
    /// Refused while purchase orders or items still reference the supplier.
    #[instrument(skip(self))]
    pub async fn delete_supplier(&self, supplier_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.find_required(supplier_id).await?;

        let po_refs = purchase_order::Entity::find()
            .filter(purchase_order::Column::SupplierId.eq(supplier_id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if po_refs > 0 {
            return Err(ServiceError::Conflict(
                "Supplier has purchase orders and cannot be deleted".to_string(),
            ));
        }

        let item_refs = item::Entity::find()
            .filter(item::Column::SupplierId.eq(supplier_id))
            .count(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        if item_refs > 0 {
            return Err(ServiceError::Conflict(
                "Supplier is referenced by items and cannot be deleted".to_string(),
            ));
        }

        supplier_contact::Entity::delete_many()
            .filter(supplier_contact::Column::SupplierId.eq(supplier_id))
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        supplier_statement::Entity::delete_many()
            .filter(supplier_statement::Column::SupplierId.eq(supplier_id))
            .exec(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        existing
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        slog::info!(self.logger, "Supplier deleted"; "supplier_id" => %supplier_id);
        self.event_sender
            .send(Event::SupplierDeleted(supplier_id))
            .await
            .map_err(ServiceError::EventError)
    }

    // Contacts

    #[instrument(skip(self, input))]
    pub async fn create_contact(
        &self,
        supplier_id: Uuid,
        input: CreateContactInput,
    ) -> Result<supplier_contact::Model, ServiceError> {
        input.validate()?;
        self.find_required(supplier_id).await?;

        supplier_contact::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(supplier_id),
            name: Set(input.name),
            role: Set(input.role),
            email: Set(input.email),
            phone: Set(input.phone),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn list_contacts(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<supplier_contact::Model>, ServiceError> {
        self.find_required(supplier_id).await?;
        supplier_contact::Entity::find()
            .filter(supplier_contact::Column::SupplierId.eq(supplier_id))
            .order_by_asc(supplier_contact::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self, input))]
    pub async fn update_contact(
        &self,
        supplier_id: Uuid,
        contact_id: Uuid,
        input: UpdateContactInput,
    ) -> Result<supplier_contact::Model, ServiceError> {
        let contact = self.find_contact(supplier_id, contact_id).await?;
        let mut active: supplier_contact::ActiveModel = contact.into();

        if let Some(name) = input.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Name must not be empty".to_string(),
                ));
            }
            active.name = Set(name);
        }
        if let Some(role) = input.role {
            active.role = Set(role);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(phone) = input.phone {
            active.phone = Set(phone);
        }

        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn delete_contact(
        &self,
        supplier_id: Uuid,
        contact_id: Uuid,
    ) -> Result<(), ServiceError> {
        let contact = self.find_contact(supplier_id, contact_id).await?;
        contact
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    // Statements

    #[instrument(skip(self, input))]
    pub async fn create_statement(
        &self,
        supplier_id: Uuid,
        input: CreateStatementInput,
    ) -> Result<supplier_statement::Model, ServiceError> {
        if !MONTH_YEAR_RE.is_match(&input.month_year) {
            return Err(ServiceError::ValidationError(
                "month_year must be formatted as YYYY-MM".to_string(),
            ));
        }
        self.find_required(supplier_id).await?;

        supplier_statement::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(supplier_id),
            month_year: Set(input.month_year),
            due_date: Set(input.due_date),
            amount: Set(input.amount),
            payment_status: Set(input.payment_status.unwrap_or(PaymentStatus::Pending)),
            file_url: Set(None),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn list_statements(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<supplier_statement::Model>, ServiceError> {
        self.find_required(supplier_id).await?;
        supplier_statement::Entity::find()
            .filter(supplier_statement::Column::SupplierId.eq(supplier_id))
            .order_by_desc(supplier_statement::Column::MonthYear)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn get_statement(
        &self,
        supplier_id: Uuid,
        statement_id: Uuid,
    ) -> Result<supplier_statement::Model, ServiceError> {
        self.find_statement(supplier_id, statement_id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_statement(
        &self,
        supplier_id: Uuid,
        statement_id: Uuid,
        input: UpdateStatementInput,
    ) -> Result<supplier_statement::Model, ServiceError> {
        let statement = self.find_statement(supplier_id, statement_id).await?;
        let mut active: supplier_statement::ActiveModel = statement.into();

        if let Some(due_date) = input.due_date {
            active.due_date = Set(due_date);
        }
        if let Some(amount) = input.amount {
            active.amount = Set(amount);
        }
        if let Some(payment_status) = input.payment_status {
            active.payment_status = Set(payment_status);
        }
        active.updated_at = Set(Some(Utc::now()));

        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Records the stored statement file's URL
    #[instrument(skip(self))]
    pub async fn attach_statement_file(
        &self,
        supplier_id: Uuid,
        statement_id: Uuid,
        file_url: String,
    ) -> Result<supplier_statement::Model, ServiceError> {
        let statement = self.find_statement(supplier_id, statement_id).await?;
        let mut active: supplier_statement::ActiveModel = statement.into();
        active.file_url = Set(Some(file_url));
        active.updated_at = Set(Some(Utc::now()));
        active
            .update(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    #[instrument(skip(self))]
    pub async fn delete_statement(
        &self,
        supplier_id: Uuid,
        statement_id: Uuid,
    ) -> Result<(), ServiceError> {
        let statement = self.find_statement(supplier_id, statement_id).await?;
        statement
            .delete(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;
        Ok(())
    }

    async fn find_required(&self, supplier_id: Uuid) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", supplier_id)))
    }

    async fn find_contact(
        &self,
        supplier_id: Uuid,
        contact_id: Uuid,
    ) -> Result<supplier_contact::Model, ServiceError> {
        supplier_contact::Entity::find_by_id(contact_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|c| c.supplier_id == supplier_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Contact {} not found for supplier {}",
                    contact_id, supplier_id
                ))
            })
    }

    async fn find_statement(
        &self,
        supplier_id: Uuid,
        statement_id: Uuid,
    ) -> Result<supplier_statement::Model, ServiceError> {
        supplier_statement::Entity::find_by_id(statement_id)
            .one(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .filter(|s| s.supplier_id == supplier_id)
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Statement {} not found for supplier {}",
                    statement_id, supplier_id
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_year_pattern_accepts_valid_periods() {
        assert!(MONTH_YEAR_RE.is_match("2026-01"));
        assert!(MONTH_YEAR_RE.is_match("2026-12"));
    }

    #[test]
    fn month_year_pattern_rejects_invalid_periods() {
        assert!(!MONTH_YEAR_RE.is_match("2026-13"));
        assert!(!MONTH_YEAR_RE.is_match("2026-1"));
        assert!(!MONTH_YEAR_RE.is_match("Jan 2026"));
        assert!(!MONTH_YEAR_RE.is_match(""));
    }
}
