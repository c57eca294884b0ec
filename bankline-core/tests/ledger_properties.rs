//! Property tests for the account ledger rules
//!
//! Run with: cargo test --test ledger_properties

use proptest::prelude::*;
use rust_decimal::Decimal;

use bankline_core::domain::{Account, AccountKind, Transaction, TransactionKind};
use bankline_core::Error;

fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

fn open(savings: bool, overdraft_cents: i64) -> Account {
    let kind = if savings {
        AccountKind::savings(Decimal::new(5, 2))
    } else {
        AccountKind::checking(cents(overdraft_cents), Decimal::new(10, 2))
    };
    Account::open("Property Holder", kind).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    /// Property: after any sequence of operations the balance equals the signed
    /// sum of the log, one entry was appended per successful operation, and the
    /// balance never went below the variant's floor.
    #[test]
    fn balance_matches_log(
        savings in any::<bool>(),
        overdraft in 0i64..50_000i64,
        ops in prop::collection::vec((any::<bool>(), 1i64..100_000i64), 1..40)
    ) {
        let mut account = open(savings, overdraft);
        let floor = account.kind().balance_floor();
        let mut successes = 0usize;

        for (is_deposit, amount) in ops {
            let result = if is_deposit {
                account.deposit(cents(amount))
            } else {
                account.withdraw(cents(amount))
            };
            if result.is_ok() {
                successes += 1;
            }
            prop_assert!(account.balance() >= floor);
        }

        let logged: Decimal = account.transactions().iter().map(|t| t.signed_amount()).sum();
        prop_assert_eq!(account.balance(), logged);
        prop_assert_eq!(account.transactions().len(), successes);
    }

    /// Property: a withdrawal succeeds exactly when it fits the available
    /// amount, and a rejected one changes nothing.
    #[test]
    fn withdraw_succeeds_iff_within_available(
        savings in any::<bool>(),
        overdraft in 0i64..50_000i64,
        deposit in 1i64..100_000i64,
        amount in 1i64..200_000i64
    ) {
        let mut account = open(savings, overdraft);
        account.deposit(cents(deposit)).unwrap();
        let before = account.clone();
        let available = account.available_to_withdraw();

        match account.withdraw(cents(amount)) {
            Ok(()) => {
                prop_assert!(cents(amount) <= available);
                prop_assert_eq!(account.balance(), before.balance() - cents(amount));
            }
            Err(Error::InsufficientFunds { requested, available: reported }) => {
                prop_assert!(cents(amount) > available);
                prop_assert_eq!(requested, cents(amount));
                prop_assert_eq!(reported, available);
                prop_assert_eq!(&account, &before);
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Property: computing the yield twice gives the same value and leaves the
    /// account untouched.
    #[test]
    fn compute_yield_is_pure(savings in any::<bool>(), deposit in 1i64..10_000_000i64) {
        let mut account = open(savings, 0);
        account.deposit(cents(deposit)).unwrap();
        let before = account.clone();

        let first = account.compute_yield().unwrap();
        let second = account.compute_yield().unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(&account, &before);
        if savings {
            prop_assert_eq!(first, cents(deposit) * Decimal::new(5, 2));
        } else {
            prop_assert_eq!(first, Decimal::ZERO);
        }
    }

    /// Property: the direct mutators and the transaction dispatch path leave
    /// accounts in the same state.
    #[test]
    fn direct_and_dispatched_paths_agree(
        savings in any::<bool>(),
        ops in prop::collection::vec((any::<bool>(), 1i64..100_000i64), 1..20)
    ) {
        let mut direct = open(savings, 10_000);
        let mut dispatched = direct.clone();

        for (is_deposit, amount) in ops {
            let (a, b) = if is_deposit {
                (
                    direct.deposit(cents(amount)),
                    Transaction::deposit(cents(amount)).unwrap().apply(&mut dispatched),
                )
            } else {
                (
                    direct.withdraw(cents(amount)),
                    Transaction::withdrawal(cents(amount)).unwrap().apply(&mut dispatched),
                )
            };
            prop_assert_eq!(a.is_ok(), b.is_ok());
        }

        prop_assert_eq!(direct.balance(), dispatched.balance());
        let kinds = |acc: &Account| acc.transactions().iter().map(|t| t.kind()).collect::<Vec<TransactionKind>>();
        prop_assert_eq!(kinds(&direct), kinds(&dispatched));
    }

    /// Property: non-positive amounts are always rejected before any change.
    #[test]
    fn non_positive_amounts_rejected(savings in any::<bool>(), amount in -100_000i64..=0i64) {
        let mut account = open(savings, 10_000);
        prop_assert!(matches!(account.deposit(cents(amount)), Err(Error::InvalidAmount(_))));
        prop_assert!(matches!(account.withdraw(cents(amount)), Err(Error::InvalidAmount(_))));
        prop_assert!(account.transactions().is_empty());
        prop_assert_eq!(account.balance(), Decimal::ZERO);
    }
}
