use rust_decimal::Decimal;
use serde::Serialize;

use crate::balance::NetBalance;
use crate::exchange::Exchange;
use crate::schemas::{Expense, Payment};

// An empty selection means "everyone".
fn selected(person: Option<&str>) -> Option<&str> {
    person.filter(|person| !person.is_empty())
}

/// Keeps the expenses a person paid for or shares in, and the payments they
/// sent or received. Without a person everything is kept.
pub fn filter_for_person<'a>(
    person: Option<&str>,
    expenses: &'a [Expense],
    payments: &'a [Payment],
) -> (Vec<&'a Expense>, Vec<&'a Payment>) {
    match selected(person) {
        Some(person) => (
            expenses
                .iter()
                .filter(|expense| expense.involves(person))
                .collect(),
            payments
                .iter()
                .filter(|payment| payment.involves(person))
                .collect(),
        ),
        None => (expenses.iter().collect(), payments.iter().collect()),
    }
}

pub fn total_paid_by(person: &str, expenses: &[Expense]) -> Decimal {
    expenses
        .iter()
        .filter(|expense| expense.paid_by == person)
        .map(|expense| expense.amount)
        .sum()
}

pub fn exchanges_for_person<'a>(person: Option<&str>, exchanges: &'a [Exchange]) -> Vec<&'a Exchange> {
    match selected(person) {
        Some(person) => exchanges
            .iter()
            .filter(|exchange| exchange.from == person || exchange.to == person)
            .collect(),
        None => exchanges.iter().collect(),
    }
}

/// What one person (or, without a selection, the whole group) sees.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary<'a> {
    pub person: Option<&'a str>,
    pub total_paid: Decimal,
    pub balance: Option<Decimal>,
    pub expenses: Vec<&'a Expense>,
    pub payments: Vec<&'a Payment>,
    pub settlements: Vec<&'a Exchange>,
}

pub fn summarize<'a>(
    person: Option<&'a str>,
    expenses: &'a [Expense],
    payments: &'a [Payment],
    balances: &NetBalance,
    settlements: &'a [Exchange],
) -> Summary<'a> {
    let person = selected(person);
    let total_paid = match person {
        Some(person) => total_paid_by(person, expenses),
        None => expenses.iter().map(|expense| expense.amount).sum(),
    };
    let (expenses, payments) = filter_for_person(person, expenses, payments);

    Summary {
        person,
        total_paid,
        balance: person.and_then(|person| balances.get(person)),
        expenses,
        payments,
        settlements: exchanges_for_person(person, settlements),
    }
}
