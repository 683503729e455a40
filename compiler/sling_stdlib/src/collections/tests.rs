#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use super::*;
use crate::test_helpers::run;

fn pair(element: Value, count: i64) -> Value {
    Value::tuple(vec![element, Value::Int(count)])
}

#[test]
fn counter_counts_and_defaults_to_zero() {
    let src = "
from collections import Counter
c = Counter([1, 1, 2, 3, 3, 3])
[c[1], c[3], c[4]]
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![Value::Int(2), Value::Int(3), Value::Int(0)]))
    );
}

#[test]
fn counter_groups_by_inspect_form() {
    let src = "
from collections import Counter
c = Counter([1, '1', [2], [2]])
[c[1], c['1'], c[[2]], c.most_common(1)]
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![
            Value::Int(2),
            Value::Int(2),
            Value::Int(2),
            Value::list(vec![pair(Value::Int(1), 2)]),
        ]))
    );
}

#[test]
fn counter_most_common() {
    let src = "
from collections import Counter
c = Counter('abracadabra')
c.most_common(2)
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![
            pair(Value::string("a"), 5),
            pair(Value::string("b"), 2),
        ]))
    );

    let src = "
from collections import Counter
c = Counter([1, 1, 2, 3, 3, 3])
c.most_common()
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![
            pair(Value::Int(3), 3),
            pair(Value::Int(1), 2),
            pair(Value::Int(2), 1),
        ]))
    );
}

#[test]
fn counter_item_assignment() {
    let src = "
from collections import Counter
c = Counter()
c['x'] += 1
c['x'] += 1
c['y'] = 7
c.most_common()
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![
            pair(Value::string("y"), 7),
            pair(Value::string("x"), 2),
        ]))
    );
}

#[test]
fn defaultdict_fills_missing_keys() {
    let src = "
from collections import defaultdict
groups = defaultdict(list)
for word in ['apple', 'avocado', 'banana']:
    groups[word[0]].append(word)
[groups['a'], groups['b'], groups.keys()]
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![
            Value::list(vec![Value::string("apple"), Value::string("avocado")]),
            Value::list(vec![Value::string("banana")]),
            Value::list(vec![Value::string("a"), Value::string("b")]),
        ]))
    );
}

#[test]
fn defaultdict_calls_script_factories() {
    let src = "
from collections import defaultdict
def zero():
    return 0
counts = defaultdict(zero)
for ch in 'hello':
    counts[ch] += 1
[counts['l'], counts.get('z'), counts.get('z', -1), len(counts.items())]
";
    assert_eq!(
        run(src),
        Ok(Value::list(vec![
            Value::Int(2),
            Value::Null,
            Value::Int(-1),
            Value::Int(4),
        ]))
    );
}

#[test]
fn defaultdict_without_factory_raises_key_error() {
    let src = "
from collections import defaultdict
d = defaultdict()
d['missing']
";
    let err = run(src).unwrap_err();
    assert_eq!(err.exception_type(), "KeyError");
}

#[test]
fn library_lists_both_classes() {
    let lib = collections();
    assert_eq!(lib.name(), "collections");
    let names: Vec<&str> = lib.functions().keys().map(String::as_str).collect();
    assert_eq!(names, vec![COUNTER, DEFAULTDICT]);
    assert!(matches!(lib.functions()[COUNTER], Value::Class(_)));
}
