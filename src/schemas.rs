use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};
use crate::money::to_cents;
use crate::split::{even_split, validate_split};

pub type Person = String;

pub type SplitWith = BTreeMap<Person, SplitShare>;

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SplitShare {
    pub checked: bool,
    #[serde(default)]
    pub amount: Decimal,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub amount: Decimal,
    pub paid_by: Person,
    pub date: NaiveDate,
    #[serde(default)]
    pub split_with: SplitWith,
}

impl Expense {
    /// Shares of the people this expense is actually split with.
    pub fn checked_shares(&self) -> impl Iterator<Item = (&Person, Decimal)> {
        self.split_with
            .iter()
            .filter(|(_, share)| share.checked)
            .map(|(person, share)| (person, share.amount))
    }

    pub fn involves(&self, person: &str) -> bool {
        self.paid_by == person
            || self
                .split_with
                .get(person)
                .is_some_and(|share| share.checked)
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Payment {
    #[serde(default)]
    pub id: String,
    pub from: Person,
    pub to: Person,
    pub amount: Decimal,
    pub date: NaiveDate,
}

impl Payment {
    pub fn involves(&self, person: &str) -> bool {
        self.from == person || self.to == person
    }
}

/// Body of a new expense. The split is either given share by share or
/// allocated evenly between the listed people.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseRequest {
    pub title: String,
    pub amount: Decimal,
    pub paid_by: Person,
    pub date: NaiveDate,
    #[serde(default)]
    pub split_with: Option<SplitWith>,
    #[serde(default)]
    pub split_evenly: Option<Vec<Person>>,
}

impl ExpenseRequest {
    pub fn into_expense(self, people: &[Person], today: NaiveDate) -> Result<Expense> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(Error::InvalidInput("an expense needs a title".into()));
        }
        let amount = to_cents(self.amount)?;
        if amount < Decimal::ZERO {
            return Err(Error::InvalidInput(format!(
                "expense amount {amount} is negative"
            )));
        }
        ensure_known(&self.paid_by, people)?;
        if self.date > today {
            return Err(Error::InvalidInput(format!(
                "expense date {} is in the future",
                self.date
            )));
        }

        let split_with = match (self.split_with, self.split_evenly) {
            (Some(split_with), None) => normalize_split(split_with, people)?,
            (None, Some(participants)) => even_split(amount, &participants, people)?,
            _ => {
                return Err(Error::InvalidInput(
                    "provide exactly one of splitWith or splitEvenly".into(),
                ))
            }
        };
        validate_split(amount, &split_with)?;

        Ok(Expense {
            id: String::new(),
            title,
            amount,
            paid_by: self.paid_by,
            date: self.date,
            split_with,
        })
    }
}

fn normalize_split(split_with: SplitWith, people: &[Person]) -> Result<SplitWith> {
    split_with
        .into_iter()
        .map(|(person, share)| {
            ensure_known(&person, people)?;
            let amount = to_cents(share.amount)?;
            if share.checked && amount < Decimal::ZERO {
                return Err(Error::InvalidInput(format!(
                    "share of {person} is negative"
                )));
            }
            Ok((
                person,
                SplitShare {
                    checked: share.checked,
                    amount,
                },
            ))
        })
        .collect()
}

#[derive(Clone, Debug, Deserialize)]
pub struct PaymentRequest {
    pub from: Person,
    pub to: Person,
    pub amount: Decimal,
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

impl PaymentRequest {
    pub fn into_payment(self, people: &[Person], today: NaiveDate) -> Result<Payment> {
        ensure_known(&self.from, people)?;
        ensure_known(&self.to, people)?;
        if self.from == self.to {
            return Err(Error::InvalidInput(format!(
                "{} cannot pay themselves",
                self.from
            )));
        }
        let amount = to_cents(self.amount)?;
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidInput(format!(
                "payment amount {amount} must be positive"
            )));
        }
        let date = self.date.unwrap_or(today);
        if date > today {
            return Err(Error::InvalidInput(format!(
                "payment date {date} is in the future"
            )));
        }

        Ok(Payment {
            id: String::new(),
            from: self.from,
            to: self.to,
            amount,
            date,
        })
    }
}

pub fn ensure_known(person: &str, people: &[Person]) -> Result<()> {
    if people.iter().any(|known| known == person) {
        Ok(())
    } else {
        Err(Error::UnknownPerson(person.to_string()))
    }
}
