use proptest::prelude::*;
use topup_core::services::admission::{
    normalize_identity, validate, AdmissionError, MAX_TOPUP_AMOUNT, MIN_TOPUP_AMOUNT,
};

#[test]
fn test_bounds_are_inclusive() {
    assert!(validate("6281234567890", MIN_TOPUP_AMOUNT).is_ok());
    assert!(validate("6281234567890", MAX_TOPUP_AMOUNT).is_ok());
}

#[test]
fn test_normalization_is_canonical() {
    for raw in [
        "6281234567890",
        "081234567890",
        "+6281234567890",
        "62 812-3456-7890",
    ] {
        assert_eq!(
            normalize_identity(raw).as_deref(),
            Some("6281234567890"),
            "raw input: {raw}"
        );
    }
}

proptest! {
    #[test]
    fn prop_amount_below_minimum_always_rejected(amount in i64::MIN..MIN_TOPUP_AMOUNT) {
        prop_assert_eq!(
            validate("6281234567890", amount),
            Err(AdmissionError::AmountOutOfRange)
        );
    }

    #[test]
    fn prop_amount_above_maximum_always_rejected(amount in (MAX_TOPUP_AMOUNT + 1)..i64::MAX) {
        prop_assert_eq!(
            validate("6281234567890", amount),
            Err(AdmissionError::AmountOutOfRange)
        );
    }

    #[test]
    fn prop_amount_in_range_accepted(amount in MIN_TOPUP_AMOUNT..=MAX_TOPUP_AMOUNT) {
        let (identity, validated) = validate("081234567890", amount).unwrap();
        prop_assert_eq!(identity, "6281234567890".to_string());
        prop_assert_eq!(validated, amount);
    }

    #[test]
    fn prop_normalized_output_is_stable(subscriber in "8[0-9]{8,11}") {
        // Whatever normalizes once normalizes to itself again.
        if let Some(normalized) = normalize_identity(&format!("0{subscriber}")) {
            prop_assert_eq!(normalize_identity(&normalized), Some(normalized.clone()));
        }
    }
}
