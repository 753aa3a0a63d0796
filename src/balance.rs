use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::warn;

use crate::schemas::{Expense, Payment, Person};

#[derive(Clone, Debug, PartialEq)]
pub struct PersonalBalance {
    pub person: Person,
    pub balance: Decimal,
}

/// Signed balance per person: positive means the group owes them money,
/// negative means they owe the group.
///
/// Entries keep the configured person order. Anyone who shows up in the
/// records without being configured is appended after them, alphabetically.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetBalance {
    entries: Vec<PersonalBalance>,
}

impl NetBalance {
    pub fn new(people: &[Person]) -> Self {
        let mut balances = NetBalance::default();
        for person in people {
            if balances.get(person).is_none() {
                balances.entries.push(PersonalBalance {
                    person: person.clone(),
                    balance: Decimal::ZERO,
                });
            }
        }
        balances
    }

    pub fn get(&self, person: &str) -> Option<Decimal> {
        self.entries
            .iter()
            .find(|entry| entry.person == person)
            .map(|entry| entry.balance)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonalBalance> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of all balances. Zero for any ledger built from valid records.
    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|entry| entry.balance).sum()
    }

    fn adjust(&mut self, person: &str, amount: Decimal) {
        match self.entries.iter_mut().find(|entry| entry.person == person) {
            Some(entry) => entry.balance += amount,
            None => {
                warn!(person, "balance entry for a person outside the configured list");
                self.entries.push(PersonalBalance {
                    person: person.to_string(),
                    balance: amount,
                });
            }
        }
    }
}

impl FromIterator<(Person, Decimal)> for NetBalance {
    fn from_iter<I: IntoIterator<Item = (Person, Decimal)>>(iter: I) -> Self {
        NetBalance {
            entries: iter
                .into_iter()
                .map(|(person, balance)| PersonalBalance { person, balance })
                .collect(),
        }
    }
}

impl Serialize for NetBalance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.person, &entry.balance)?;
        }
        map.end()
    }
}

pub fn aggregate(expenses: &[Expense], payments: &[Payment], people: &[Person]) -> NetBalance {
    let mut balances = NetBalance::new(people);
    let configured = balances.len();

    for expense in expenses {
        for (person, amount) in expense.checked_shares() {
            balances.adjust(person, -amount);
            balances.adjust(&expense.paid_by, amount);
        }
    }

    // Paying someone back clears part of the payer's debt and part of what
    // the recipient is still owed.
    for payment in payments {
        balances.adjust(&payment.from, payment.amount);
        balances.adjust(&payment.to, -payment.amount);
    }

    balances.entries[configured..].sort_by(|a, b| a.person.cmp(&b.person));
    balances
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::MAX_AMOUNT;
    use crate::schemas::{SplitShare, SplitWith};
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn people() -> Vec<Person> {
        ["HL", "JY", "ML", "PY", "SH"].map(String::from).to_vec()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn expense(amount: Decimal, paid_by: &str, shares: &[(&str, Decimal)]) -> Expense {
        Expense {
            id: String::new(),
            title: "Dinner".into(),
            amount,
            paid_by: paid_by.into(),
            date: date(),
            split_with: shares
                .iter()
                .map(|(person, amount)| {
                    (
                        person.to_string(),
                        SplitShare {
                            checked: true,
                            amount: *amount,
                        },
                    )
                })
                .collect::<SplitWith>(),
        }
    }

    fn payment(from: &str, to: &str, amount: Decimal) -> Payment {
        Payment {
            id: String::new(),
            from: from.into(),
            to: to.into(),
            amount,
            date: date(),
        }
    }

    fn dinner() -> Expense {
        expense(
            dec!(30.00),
            "HL",
            &[("HL", dec!(10.00)), ("JY", dec!(10.00)), ("ML", dec!(10.00))],
        )
    }

    #[test]
    fn payer_is_owed_everyone_elses_share() {
        let balances = aggregate(&[dinner()], &[], &people());
        assert_eq!(balances.get("HL"), Some(dec!(20.00)));
        assert_eq!(balances.get("JY"), Some(dec!(-10.00)));
        assert_eq!(balances.get("ML"), Some(dec!(-10.00)));
        assert_eq!(balances.get("PY"), Some(dec!(0)));
        assert_eq!(balances.len(), 5);
    }

    #[test]
    fn payments_reduce_debt() {
        let balances = aggregate(&[dinner()], &[payment("JY", "HL", dec!(10.00))], &people());
        assert_eq!(balances.get("HL"), Some(dec!(10.00)));
        assert_eq!(balances.get("JY"), Some(dec!(0.00)));
        assert_eq!(balances.get("ML"), Some(dec!(-10.00)));
    }

    #[test]
    fn payment_alone_moves_money_between_two_people() {
        let balances = aggregate(&[], &[payment("PY", "SH", dec!(12.50))], &people());
        assert_eq!(balances.get("PY"), Some(dec!(12.50)));
        assert_eq!(balances.get("SH"), Some(dec!(-12.50)));
        assert!(balances
            .iter()
            .filter(|entry| entry.person != "PY" && entry.person != "SH")
            .all(|entry| entry.balance.is_zero()));
    }

    #[test]
    fn payer_outside_the_split_is_owed_everything() {
        let balances = aggregate(
            &[expense(dec!(9.00), "SH", &[("JY", dec!(4.50)), ("PY", dec!(4.50))])],
            &[],
            &people(),
        );
        assert_eq!(balances.get("SH"), Some(dec!(9.00)));
        assert_eq!(balances.get("JY"), Some(dec!(-4.50)));
    }

    #[test]
    fn unchecked_shares_are_ignored() {
        let mut expense = dinner();
        expense.split_with.insert(
            "PY".into(),
            SplitShare {
                checked: false,
                amount: dec!(99),
            },
        );
        let balances = aggregate(&[expense], &[], &people());
        assert_eq!(balances.get("PY"), Some(dec!(0)));
        assert_eq!(balances.get("HL"), Some(dec!(20.00)));
    }

    #[test]
    fn largest_accepted_amounts_aggregate_without_overflow() {
        let big = expense(MAX_AMOUNT, "HL", &[("JY", MAX_AMOUNT)]);
        let balances = aggregate(&[big.clone(), big], &[], &people());
        assert_eq!(balances.get("HL"), Some(MAX_AMOUNT * Decimal::TWO));
        assert_eq!(balances.get("JY"), Some(-MAX_AMOUNT * Decimal::TWO));
    }

    #[test]
    fn unknown_people_are_appended_alphabetically() {
        let balances = aggregate(
            &[expense(dec!(2), "HL", &[("ZZ", dec!(1)), ("AA", dec!(1))])],
            &[],
            &people(),
        );
        let order: Vec<&str> = balances.iter().map(|entry| entry.person.as_str()).collect();
        assert_eq!(order, ["HL", "JY", "ML", "PY", "SH", "AA", "ZZ"]);
        assert_eq!(balances.get("AA"), Some(dec!(-1)));
    }

    #[test]
    fn serializes_as_ordered_object() {
        let balances = aggregate(&[dinner()], &[], &people()[..3]);
        assert_eq!(
            serde_json::to_string(&balances).unwrap(),
            r#"{"HL":"20.00","JY":"-10.00","ML":"-10.00"}"#
        );
    }

    proptest! {
        #[test]
        fn expenses_never_create_money(
            splits in prop::collection::vec(
                (0usize..5, prop::collection::vec((0usize..5, 0i64..100_000), 1..5)),
                0..20,
            )
        ) {
            let people = people();
            let expenses: Vec<Expense> = splits
                .iter()
                .map(|(payer, shares)| {
                    let shares: Vec<(&str, Decimal)> = shares
                        .iter()
                        .map(|(person, cents)| (people[*person].as_str(), Decimal::new(*cents, 2)))
                        .collect();
                    let total = shares.iter().map(|(_, amount)| *amount).sum();
                    expense(total, &people[*payer], &shares)
                })
                .collect();
            prop_assert_eq!(aggregate(&expenses, &[], &people).total(), Decimal::ZERO);
        }
    }
}
