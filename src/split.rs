use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::errors::{Error, Result};
use crate::money::{round_cents, to_cents, CENT};
use crate::schemas::{ensure_known, Person, SplitShare, SplitWith};

pub type Allocation = BTreeMap<Person, Decimal>;

/// Divides `total` between `participants` so the shares add up to it exactly.
///
/// Every participant gets the per-head amount rounded half-up to cents. The
/// rounding remainder goes to the last participant in the given order. A
/// remainder bigger than one cent is spread one cent at a time from the last
/// participant backwards, so no two shares differ by more than a cent.
pub fn allocate(total: Decimal, participants: &[Person]) -> Result<Allocation> {
    let total = to_cents(total)?;
    if total < Decimal::ZERO {
        return Err(Error::InvalidInput(format!(
            "cannot split a negative amount ({total})"
        )));
    }
    if participants.is_empty() {
        return Err(Error::InvalidInput(
            "cannot split an amount between zero participants".into(),
        ));
    }

    let count = Decimal::from(participants.len());
    let mut share = round_cents(total / count);
    share.rescale(2);

    let mut allocation = Allocation::new();
    for person in participants {
        if allocation.insert(person.clone(), share).is_some() {
            return Err(Error::InvalidInput(format!(
                "{person} appears twice in the split"
            )));
        }
    }

    let mut remainder = round_cents(total - share * count);
    for person in participants.iter().rev() {
        if remainder.is_zero() {
            break;
        }
        let adjustment = if remainder.abs() <= CENT {
            remainder
        } else if remainder.is_sign_negative() {
            -CENT
        } else {
            CENT
        };
        if let Some(amount) = allocation.get_mut(person) {
            *amount += adjustment;
        }
        remainder -= adjustment;
    }

    Ok(allocation)
}

/// Checks that the checked shares of a split add up to the expense total.
pub fn validate_split(total: Decimal, split_with: &SplitWith) -> Result<()> {
    let actual: Decimal = split_with
        .values()
        .filter(|share| share.checked)
        .map(|share| share.amount)
        .sum();
    if round_cents(actual) != round_cents(total) {
        return Err(Error::InvalidSplit {
            expected: total,
            actual,
        });
    }
    Ok(())
}

/// Builds a full split record for `people`, with the allocated share for
/// each participant and an unchecked zero share for everyone else.
pub fn even_split(total: Decimal, participants: &[Person], people: &[Person]) -> Result<SplitWith> {
    for person in participants {
        ensure_known(person, people)?;
    }
    let allocation = allocate(total, participants)?;
    Ok(people
        .iter()
        .map(|person| {
            let share = match allocation.get(person) {
                Some(amount) => SplitShare {
                    checked: true,
                    amount: *amount,
                },
                None => SplitShare {
                    checked: false,
                    amount: Decimal::new(0, 2),
                },
            };
            (person.clone(), share)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn names(names: &[&str]) -> Vec<Person> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn remainder_goes_to_last_participant() {
        let allocation = allocate(dec!(10.00), &names(&["A", "B", "C"])).unwrap();
        assert_eq!(allocation["A"], dec!(3.33));
        assert_eq!(allocation["B"], dec!(3.33));
        assert_eq!(allocation["C"], dec!(3.34));
    }

    #[test]
    fn negative_remainder_comes_off_last_participant() {
        let allocation = allocate(dec!(20.00), &names(&["A", "B", "C"])).unwrap();
        assert_eq!(allocation["A"], dec!(6.67));
        assert_eq!(allocation["B"], dec!(6.67));
        assert_eq!(allocation["C"], dec!(6.66));
    }

    #[test]
    fn order_decides_who_absorbs_the_remainder() {
        let allocation = allocate(dec!(10.00), &names(&["C", "B", "A"])).unwrap();
        assert_eq!(allocation["A"], dec!(3.34));
        assert_eq!(allocation["C"], dec!(3.33));
    }

    #[test]
    fn large_remainders_are_spread() {
        // 0.02 / 4 rounds up to 0.01 each, two cents too many.
        let allocation = allocate(dec!(0.02), &names(&["A", "B", "C", "D"])).unwrap();
        assert_eq!(allocation["A"], dec!(0.01));
        assert_eq!(allocation["B"], dec!(0.01));
        assert_eq!(allocation["C"], dec!(0.00));
        assert_eq!(allocation["D"], dec!(0.00));
    }

    #[test]
    fn shares_have_two_decimals() {
        let allocation = allocate(dec!(30), &names(&["A", "B", "C"])).unwrap();
        assert_eq!(allocation["A"].to_string(), "10.00");
    }

    #[rstest]
    #[case(dec!(10), &[])]
    #[case(dec!(-1), &["A"])]
    #[case(dec!(1.001), &["A"])]
    #[case(dec!(10), &["A", "A"])]
    fn invalid_allocations(#[case] total: Decimal, #[case] participants: &[&str]) {
        assert!(matches!(
            allocate(total, &names(participants)),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_split_accepts_exact_sum() {
        let split = even_split(dec!(10), &names(&["A", "B", "C"]), &names(&["A", "B", "C", "D"]))
            .unwrap();
        assert!(validate_split(dec!(10), &split).is_ok());
        assert!(!split["D"].checked);
    }

    #[test]
    fn even_split_rejects_unknown_participants() {
        assert!(matches!(
            even_split(dec!(10), &names(&["A", "Z"]), &names(&["A", "B"])),
            Err(Error::UnknownPerson(p)) if p == "Z"
        ));
    }

    proptest! {
        #[test]
        fn shares_sum_to_total_and_stay_fair(cents in 0i64..1_000_000, count in 1usize..=12) {
            let total = Decimal::new(cents, 2);
            let participants: Vec<Person> = (0..count).map(|i| format!("P{i}")).collect();
            let allocation = allocate(total, &participants).unwrap();

            let sum: Decimal = allocation.values().copied().sum();
            prop_assert_eq!(sum, total);

            let max = allocation.values().max().copied().unwrap();
            let min = allocation.values().min().copied().unwrap();
            prop_assert!(max - min <= CENT);
            prop_assert!(min >= Decimal::ZERO);
        }
    }
}
