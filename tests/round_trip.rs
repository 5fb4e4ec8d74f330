//! Encoding a walked struct and decoding the text into a fresh default value
//! reproduces the original, for every supported leaf shape.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;
use tagfig::{BuildOptions, Walk, build};

#[derive(Walk, Default, Debug, Clone, PartialEq)]
struct Inner {
    pub label: String,
    pub weight: f32,
}

#[derive(Walk, Default, Debug, Clone, PartialEq)]
struct Sample {
    pub name: String,
    pub enabled: bool,
    pub small: i8,
    pub offset: i64,
    pub big: u128,
    pub ratio: f64,
    pub wait: Duration,
    pub at: DateTime<Utc>,
    #[tagfig(fmt = "DateTime")]
    pub local: DateTime<Utc>,
    pub ids: Vec<u32>,
    #[tagfig(config = ",string", sep = ";")]
    pub words: Vec<String>,
    pub waits: Vec<Duration>,
    pub maybe: Option<Box<i32>>,
    pub nested: Option<Inner>,
}

fn round_trip(original: &mut Sample) -> Sample {
    let options = BuildOptions::default();
    let encoded: Vec<(String, String)> = {
        let set = build(original, &options).unwrap();
        set.leaves().map(|n| (n.key(), n.get_str())).collect()
    };

    let mut copy = Sample::default();
    {
        let mut set = build(&mut copy, &options).unwrap();
        for (key, text) in &encoded {
            let node = set.get_mut(key).unwrap();
            node.set_str(text)
                .unwrap_or_else(|e| panic!("{key}: cannot decode {text:?}: {e:?}"));
        }
    }
    copy
}

fn word() -> impl Strategy<Value = String> {
    "[a-z0-9_]{1,8}"
}

fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000, 0u32..1_000_000_000)
        .prop_map(|(secs, nanos)| Utc.timestamp_opt(secs, nanos).unwrap())
}

fn whole_seconds() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..4_000_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn duration() -> impl Strategy<Value = Duration> {
    (any::<u64>(), 0u32..1_000_000_000).prop_map(|(secs, nanos)| Duration::new(secs, nanos))
}

fn sample() -> impl Strategy<Value = Sample> {
    use prop::collection::vec;

    let scalars = (
        ".*",
        any::<bool>(),
        any::<i8>(),
        any::<i64>(),
        any::<u128>(),
        -1.0e12f64..1.0e12,
    );
    let times = (duration(), timestamp(), whole_seconds());
    let lists = (
        vec(any::<u32>(), 0..6),
        vec(word(), 0..6),
        vec(duration(), 0..4),
    );
    let pointers = (any::<i32>(), word(), -1.0e6f32..1.0e6);

    (scalars, times, lists, pointers).prop_map(
        |(
            (name, enabled, small, offset, big, ratio),
            (wait, at, local),
            (ids, words, waits),
            (maybe, label, weight),
        )| Sample {
            name,
            enabled,
            small,
            offset,
            big,
            ratio,
            wait,
            at,
            local,
            ids,
            words,
            waits,
            maybe: Some(Box::new(maybe)),
            nested: Some(Inner { label, weight }),
        },
    )
}

proptest! {
    #[test]
    fn encode_then_decode_is_identity(mut original in sample()) {
        let copy = round_trip(&mut original);
        prop_assert_eq!(copy, original);
    }
}

#[test]
fn quoted_list_text() {
    let mut s = Sample {
        words: vec!["a".into(), "b".into()],
        ..Sample::default()
    };
    let set = build(&mut s, &BuildOptions::default()).unwrap();
    assert_eq!(set.get("words").unwrap().get_str(), r#"["a";"b"]"#);
}

#[test]
fn empty_lists_survive() {
    let mut s = Sample::default();
    assert_eq!(round_trip(&mut s), s);
}
