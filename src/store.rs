use bson::oid::ObjectId;
use futures::TryStreamExt;
use mongodb::{
    bson::doc,
    options::{FindOptions, IndexOptions},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::errors::{Error, Result};
use crate::schemas::{Expense, Payment};

/// Expenses and payments as stored in MongoDB. Records are only ever
/// inserted, listed or deleted.
#[derive(Clone)]
pub struct Store {
    expenses: Collection<Expense>,
    payments: Collection<Payment>,
}

impl Store {
    pub fn new(client: &Client, database: &str) -> Self {
        let database = client.database(database);
        Store {
            expenses: database.collection("expenses"),
            payments: database.collection("payments"),
        }
    }

    pub async fn ensure_indexes(&self) -> Result<()> {
        create_indexes(&self.expenses).await?;
        create_indexes(&self.payments).await
    }

    pub async fn insert_expense(&self, mut expense: Expense) -> Result<Expense> {
        expense.id = ObjectId::new().to_hex();
        self.expenses.insert_one(&expense, None).await?;
        info!(id = %expense.id, paid_by = %expense.paid_by, amount = %expense.amount, "Expense added");
        Ok(expense)
    }

    pub async fn list_expenses(&self) -> Result<Vec<Expense>> {
        list_newest_first(&self.expenses).await
    }

    pub async fn delete_expense(&self, id: &str) -> Result<()> {
        delete_by_id(&self.expenses, id, "expense").await
    }

    pub async fn insert_payment(&self, mut payment: Payment) -> Result<Payment> {
        payment.id = ObjectId::new().to_hex();
        self.payments.insert_one(&payment, None).await?;
        info!(id = %payment.id, from = %payment.from, to = %payment.to, amount = %payment.amount, "Payment added");
        Ok(payment)
    }

    pub async fn list_payments(&self) -> Result<Vec<Payment>> {
        list_newest_first(&self.payments).await
    }

    pub async fn delete_payment(&self, id: &str) -> Result<()> {
        delete_by_id(&self.payments, id, "payment").await
    }
}

async fn create_indexes<T>(collection: &Collection<T>) -> Result<()>
where
    T: Send + Sync,
{
    let by_id = IndexModel::builder()
        .keys(doc! { "id": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    let by_date = IndexModel::builder().keys(doc! { "date": -1 }).build();
    collection.create_indexes([by_id, by_date], None).await?;
    debug!(collection = collection.name(), "Indexes ready");
    Ok(())
}

// Dates are stored as ISO strings, so sorting them as text is chronological.
async fn list_newest_first<T>(collection: &Collection<T>) -> Result<Vec<T>>
where
    T: DeserializeOwned + Serialize + Unpin + Send + Sync,
{
    let options = FindOptions::builder().sort(doc! { "date": -1 }).build();
    let cursor = collection.find(None, options).await?;
    Ok(cursor.try_collect::<Vec<T>>().await?)
}

async fn delete_by_id<T>(collection: &Collection<T>, id: &str, kind: &str) -> Result<()>
where
    T: Send + Sync,
{
    let result = collection.delete_one(doc! { "id": id }, None).await?;
    if result.deleted_count == 0 {
        return Err(Error::NotFound(format!("{kind} {id}")));
    }
    info!(id, kind, "Record deleted");
    Ok(())
}
