use proptest::prelude::*;
use quarrel_engine::checks::{classify, is_doubles, reverse_digits};
use quarrel_engine::HitsPolicy;

fn policy() -> impl Strategy<Value = HitsPolicy> {
    prop_oneof![Just(HitsPolicy::Ability), Just(HitsPolicy::Generic)]
}

proptest! {
    #[test]
    fn success_is_roll_under(raw in 1..=100i32, target in -50..150i32, modifier in -30..30i32, p in policy()) {
        let res = classify(raw, target, modifier, 0, p);
        prop_assert_eq!(res.is_success, raw <= target + modifier);
    }

    #[test]
    fn critical_and_fumble_are_exclusive(raw in 1..=100i32, target in -50..150i32, p in policy()) {
        let res = classify(raw, target, 0, 0, p);
        prop_assert!(!(res.is_critical && res.is_fumble));
        if res.is_critical { prop_assert!(res.is_success); }
        if res.is_fumble { prop_assert!(!res.is_success); }
    }

    #[test]
    fn doubles_are_repeated_digits(raw in 1..=100i32) {
        prop_assert_eq!(is_doubles(raw), raw < 100 && raw % 11 == 0);
    }

    #[test]
    fn hits_sign_follows_success(raw in 1..=100i32, target in -50..150i32, p in policy()) {
        let res = classify(raw, target, 0, 0, p);
        if res.is_success {
            prop_assert!(res.hits >= 0);
        } else {
            prop_assert!(res.hits <= 0);
        }
    }

    #[test]
    fn critical_and_fumble_floors(raw in 1..=100i32, target in -50..150i32) {
        let generic = classify(raw, target, 0, 0, HitsPolicy::Generic);
        let ability = classify(raw, target, 0, 0, HitsPolicy::Ability);
        if generic.is_critical {
            prop_assert!(generic.hits >= 1);
            prop_assert!(ability.hits >= 6);
        }
        if generic.is_fumble {
            prop_assert!(generic.hits <= -1);
            prop_assert_eq!(ability.hits, -6);
        }
    }

    #[test]
    fn reversing_twice_restores_the_roll(raw in 1..=100i32) {
        prop_assert_eq!(reverse_digits(reverse_digits(raw)), raw);
    }
}
