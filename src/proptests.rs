use std::collections::BTreeMap;
use std::ops::Bound;

use proptest::prelude::*;
use proptest_derive::Arbitrary;

use crate::{Cursor, RadixMap, SeekOp};

/// Reference implementation: a `BTreeMap` agrees with the radix map on
/// every operation, including ordered seeks.
#[derive(Default)]
struct Model {
    map: BTreeMap<Vec<u8>, u64>,
}

impl Model {
    fn seek(&self, op: SeekOp, probe: &[u8]) -> Option<(&Vec<u8>, &u64)> {
        match op {
            SeekOp::First => self.map.iter().next(),
            SeekOp::Last => self.map.iter().next_back(),
            SeekOp::Eq => self.map.get_key_value(probe),
            SeekOp::Ge => self
                .map
                .range::<[u8], _>((Bound::Included(probe), Bound::Unbounded))
                .next(),
            SeekOp::Gt => self
                .map
                .range::<[u8], _>((Bound::Excluded(probe), Bound::Unbounded))
                .next(),
            SeekOp::Le => self
                .map
                .range::<[u8], _>((Bound::Unbounded, Bound::Included(probe)))
                .next_back(),
            SeekOp::Lt => self
                .map
                .range::<[u8], _>((Bound::Unbounded, Bound::Excluded(probe)))
                .next_back(),
        }
    }
}

/// Actions applied to both implementations.
#[derive(Arbitrary, Debug, Clone)]
enum Action {
    Insert(KeyValue),
    TryInsert(KeyValue),
    Get(Key),
    Remove(Key),
    Seek(Op, Key),
    IterAll,
}

#[derive(Arbitrary, Debug, Clone, Copy)]
enum Op {
    First,
    Last,
    Eq,
    Ge,
    Gt,
    Le,
    Lt,
}

impl From<Op> for SeekOp {
    fn from(op: Op) -> Self {
        match op {
            Op::First => SeekOp::First,
            Op::Last => SeekOp::Last,
            Op::Eq => SeekOp::Eq,
            Op::Ge => SeekOp::Ge,
            Op::Gt => SeekOp::Gt,
            Op::Le => SeekOp::Le,
            Op::Lt => SeekOp::Lt,
        }
    }
}

/// Key generation biased towards collisions: a tiny alphabet plus a few
/// fixed prefixes makes splits, interior keys and re-compression common.
#[derive(Debug, Clone)]
struct Key(Vec<u8>);

#[derive(Debug, Clone)]
struct KeyValue {
    key: Key,
    value: u64,
}

impl Arbitrary for Key {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            Just(Key(vec![])),
            // Dense short keys over {a, b, c}.
            prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c']), 1..8)
                .prop_map(Key),
            // Arbitrary bytes, including NUL and 0xFF.
            prop::collection::vec(any::<u8>(), 1..24).prop_map(Key),
            // Keys hanging off a long shared run.
            prop::collection::vec(prop::sample::select(vec![b'x', b'y']), 0..4).prop_map(|tail| {
                let mut key = b"shared/prefix/".to_vec();
                key.extend_from_slice(&tail);
                Key(key)
            }),
        ]
        .boxed()
    }
}

impl Arbitrary for KeyValue {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (any::<Key>(), any::<u64>())
            .prop_map(|(key, value)| KeyValue { key, value })
            .boxed()
    }
}

#[derive(Default)]
struct Test {
    map: RadixMap<u64>,
    model: Model,
}

impl Test {
    fn execute(&mut self, action: Action) {
        match action {
            Action::Insert(kv) => {
                let key = kv.key.0;
                let ours = self.map.insert(&key, kv.value);
                let expected = self.model.map.insert(key.clone(), kv.value);
                assert_eq!(ours, expected, "insert mismatch for key {key:?}");
                self.map.check_invariants();
            }
            Action::TryInsert(kv) => {
                let key = kv.key.0;
                let ours = self.map.try_insert(&key, kv.value);
                if self.model.map.contains_key(&key) {
                    assert_eq!(ours, Err(kv.value), "try_insert overwrote key {key:?}");
                } else {
                    assert_eq!(ours, Ok(()), "try_insert refused fresh key {key:?}");
                    self.model.map.insert(key, kv.value);
                }
                self.map.check_invariants();
            }
            Action::Get(key) => {
                let key = key.0;
                assert_eq!(
                    self.map.get(&key),
                    self.model.map.get(&key),
                    "get mismatch for key {key:?}"
                );
            }
            Action::Remove(key) => {
                let key = key.0;
                let ours = self.map.remove(&key);
                let expected = self.model.map.remove(&key);
                assert_eq!(ours, expected, "remove mismatch for key {key:?}");
                self.map.check_invariants();
            }
            Action::Seek(op, key) => {
                let op = SeekOp::from(op);
                let probe = key.0;
                let mut cur = Cursor::new();
                let found = cur.seek(&self.map, op, &probe);
                match self.model.seek(op, &probe) {
                    Some((k, v)) => {
                        assert!(found, "seek {op:?} {probe:?} missed {k:?}");
                        assert!(cur.next(&self.map));
                        assert_eq!(cur.key(), &k[..], "seek {op:?} {probe:?}");
                        assert_eq!(cur.value(&self.map), Some(v), "seek {op:?} {probe:?}");
                    }
                    None => {
                        assert!(!found, "seek {op:?} {probe:?} expected EOF");
                        assert!(cur.eof());
                    }
                }
            }
            Action::IterAll => {
                let ours: Vec<(Vec<u8>, u64)> =
                    self.map.iter().map(|(k, v)| (k, *v)).collect();
                let expected: Vec<(Vec<u8>, u64)> = self
                    .model
                    .map
                    .iter()
                    .map(|(k, v)| (k.clone(), *v))
                    .collect();
                assert_eq!(ours, expected, "forward iteration diverged");

                let mut backwards = Vec::new();
                let mut cur = Cursor::new();
                cur.seek(&self.map, SeekOp::Last, b"");
                while cur.prev(&self.map) {
                    backwards.push((cur.key().to_vec(), *cur.value(&self.map).unwrap()));
                }
                backwards.reverse();
                assert_eq!(backwards, expected, "backward iteration diverged");
            }
        }
        assert_eq!(self.map.len(), self.model.map.len(), "length diverged");
        assert_eq!(self.map.is_empty(), self.model.map.is_empty());
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn proptest_vs_btreemap(actions in prop::collection::vec(any::<Action>(), 1..96)) {
        let mut test = Test::default();
        for action in actions {
            test.execute(action);
        }
    }
}
