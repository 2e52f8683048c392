use proptest::prelude::*;

use govproxy_types::{Decision, Origin, Timestamp};

fn any_origin() -> impl Strategy<Value = Origin> {
    prop::sample::select(Origin::ALL.to_vec())
}

proptest! {
    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Timestamp elapsed_since: elapsed_since(now) = now - self (saturating).
    #[test]
    fn timestamp_elapsed_since(base in 0u64..1_000_000, offset in 0u64..1_000_000) {
        let t = Timestamp::new(base);
        let now = Timestamp::new(base + offset);
        prop_assert_eq!(t.elapsed_since(now), offset);
    }

    /// days_elapsed agrees with whole-second arithmetic.
    #[test]
    fn days_elapsed_matches_seconds(
        start in 0u64..10_000_000,
        days in 0u32..60,
        offset in 0u64..10_000_000,
    ) {
        let t = Timestamp::new(start);
        let now = Timestamp::new(start + offset);
        prop_assert_eq!(t.days_elapsed(days, now), offset >= u64::from(days) * 86_400);
    }

    /// Origins survive a JSON map-key roundtrip (period tables are keyed by origin).
    #[test]
    fn origin_json_key_roundtrip(origin in any_origin()) {
        let mut map = std::collections::BTreeMap::new();
        map.insert(origin, 1u32);
        let json = serde_json::to_string(&map).unwrap();
        let back: std::collections::BTreeMap<Origin, u32> = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.get(&origin), Some(&1));
    }

    /// Decision display and parse are inverses.
    #[test]
    fn decision_display_parse(d in prop::sample::select(vec![Decision::Aye, Decision::Nay, Decision::Abstain])) {
        prop_assert_eq!(d.to_string().parse::<Decision>().unwrap(), d);
    }
}
