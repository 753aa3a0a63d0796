use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use crate::balance::{NetBalance, PersonalBalance};
use crate::money::CENT;
use crate::schemas::Person;

/// A suggested transfer that settles part of a debt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Exchange {
    pub from: Person,
    pub to: Person,
    pub amount: Decimal,
}

/// Raised when what creditors are owed and what debtors owe drift apart by
/// more than rounding can explain.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConservationWarning {
    pub owed: Decimal,
    pub owing: Decimal,
    pub tolerance: Decimal,
}

impl ConservationWarning {
    pub fn gap(&self) -> Decimal {
        (self.owed - self.owing).abs()
    }
}

impl fmt::Display for ConservationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "creditors are owed {} but debtors owe {} (gap {}, tolerance {})",
            self.owed,
            self.owing,
            self.gap(),
            self.tolerance
        )
    }
}

pub fn check_conservation(balances: &NetBalance) -> Option<ConservationWarning> {
    let (receivers, payers) = split_receivers_and_payers(balances);
    let owed: Decimal = receivers.iter().map(|person| person.balance).sum();
    let owing: Decimal = payers.iter().map(|person| person.balance).sum();
    let tolerance = CENT * Decimal::from(balances.len());
    (balances.total().abs() > tolerance).then_some(ConservationWarning {
        owed,
        owing,
        tolerance,
    })
}

// Receivers have a positive balance, payers a negative one (kept as its
// magnitude). Settled people are in neither.
fn split_receivers_and_payers(
    balances: &NetBalance,
) -> (Vec<PersonalBalance>, Vec<PersonalBalance>) {
    let mut receivers = Vec::new();
    let mut payers = Vec::new();

    for entry in balances.iter() {
        let person = PersonalBalance {
            person: entry.person.clone(),
            balance: entry.balance.abs(),
        };
        if entry.balance > Decimal::ZERO {
            receivers.push(person);
        } else if entry.balance < Decimal::ZERO {
            payers.push(person);
        }
    }

    (receivers, payers)
}

/// Reduces the balances to a short list of transfers by repeatedly matching
/// the biggest remaining receiver with the biggest remaining payer.
///
/// Equal amounts keep the order of `balances`, so the result is the same on
/// every run for the same input.
pub fn simplify(balances: &NetBalance) -> Vec<Exchange> {
    if let Some(warning) = check_conservation(balances) {
        warn!(%warning, "balances do not net to zero, settling what can be matched");
    }

    let (mut receivers, mut payers) = split_receivers_and_payers(balances);
    receivers.sort_by(|a, b| b.balance.cmp(&a.balance));
    payers.sort_by(|a, b| b.balance.cmp(&a.balance));

    let mut exchanges = Vec::new();
    let (mut r, mut p) = (0, 0);

    while r < receivers.len() && p < payers.len() {
        let receiver = &mut receivers[r];
        let payer = &mut payers[p];

        let amount = receiver.balance.min(payer.balance);
        exchanges.push(Exchange {
            from: payer.person.clone(),
            to: receiver.person.clone(),
            amount,
        });
        receiver.balance -= amount;
        payer.balance -= amount;

        if receiver.balance.is_zero() {
            r += 1;
        }
        if payer.balance.is_zero() {
            p += 1;
        }
    }

    exchanges
}
