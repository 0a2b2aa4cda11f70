#[cfg(test)]
mod tests {
    use crate::array::NumArray;
    use crate::*;
    use ndarray::{ArrayD, IxDyn};
    use proptest::prelude::*;

    fn run(src: &str, stack: Vec<Value>) -> Vec<Value> {
        Tin::new(src)
            .expect("program compiles")
            .execute(stack)
            .expect("program runs")
    }

    /// Run with a one-element input stack and read the first element of
    /// the result, the way the reference harness does.
    fn first(src: &str, input: Value) -> Value {
        run(src, vec![input])
            .first()
            .expect("non-empty result stack")
            .clone()
    }

    /// Run with a one-element input stack and read the top of the result.
    fn top(src: &str, input: Value) -> Value {
        run(src, vec![input])
            .last()
            .expect("non-empty result stack")
            .clone()
    }

    fn int_array(values: &[i64]) -> Value {
        let items: Vec<Value> = values.iter().map(|&v| Value::Int(v)).collect();
        Value::Array(NumArray::from_values(&items).expect("array builds"))
    }

    fn factorial(n: i64) -> i64 {
        (1..=n).product()
    }

    fn is_prime(n: i64) -> bool {
        n > 1 && (2..n).all(|j| n % j != 0)
    }

    fn fib(n: i64) -> i64 {
        let (mut a, mut b) = (0i64, 1i64);
        for _ in 0..n {
            let next = a + b;
            a = b;
            b = next;
        }
        a
    }

    const RECURSIVE_FACTORIAL: &str = "|◊⟨!!⊲∇·→n⟩:⟨1→n⟩.n←n|→|F| F";
    const PRIMALITY: &str = "→n(.nι``.n%𝔹∀1.n>)∀←n";
    const IDENTITY: &str = "→n(.nι{0.nR↶1↶↑})←n";
    const FIBONACCI: &str = "!!→n1<?⟨2ι→r ⊲ι{(.r1↓ .r∑)→r}.r1↓→n⟩.n←n";

    #[test]
    fn iterative_factorial_sweep() {
        for n in 0..=12 {
            assert_eq!(
                first("ι⊳∏", Value::Int(n)),
                Value::Int(factorial(n)),
                "n = {}",
                n
            );
        }
    }

    #[test]
    fn recursive_factorial_sweep() {
        for n in 0..=12 {
            assert_eq!(
                first(RECURSIVE_FACTORIAL, Value::Int(n)),
                Value::Int(factorial(n)),
                "n = {}",
                n
            );
        }
    }

    #[test]
    fn recursive_factorial_matches_iterative() {
        for n in 0..=12 {
            assert_eq!(
                first(RECURSIVE_FACTORIAL, Value::Int(n)),
                first("ι⊳∏", Value::Int(n)),
                "n = {}",
                n
            );
        }
    }

    #[test]
    fn naive_primality_sweep() {
        for n in 0..100 {
            assert_eq!(
                first(PRIMALITY, Value::Int(n)),
                Value::Bool(is_prime(n)),
                "n = {}",
                n
            );
        }
    }

    #[test]
    fn identity_matrix_generation() {
        for n in 1..=8usize {
            let expected = ArrayD::from_shape_fn(IxDyn(&[n, n]), |d| (d[0] == d[1]) as i64);
            match first(IDENTITY, Value::Int(n as i64)) {
                Value::Array(NumArray::Int(a)) => assert_eq!(a, expected, "n = {}", n),
                other => panic!("expected an int matrix for n = {}, got {:?}", n, other),
            }
        }
    }

    #[test]
    fn mean_of_an_array() {
        let result = first("!⍴↶∑/", int_array(&[2, 4, 6, 8]));
        match result {
            Value::Float(x) => assert!((x - 5.0).abs() < 1e-9, "got {}", x),
            other => panic!("expected a float, got {:?}", other),
        }
    }

    #[test]
    fn iterative_fibonacci_sweep() {
        for n in 0..=20 {
            assert_eq!(top(FIBONACCI, Value::Int(n)), Value::Int(fib(n)), "n = {}", n);
        }
    }

    #[test]
    fn printing_pushes_nothing() {
        assert_eq!(run("5$", vec![]), vec![]);
    }

    #[test]
    fn foreach_matches_manual_unrolling() {
        let arr = int_array(&[3, 1, 4, 1, 5]);
        let looped = run("{⊳}", vec![arr]);
        let manual: Vec<Value> = [3, 1, 4, 1, 5].iter().map(|&v| Value::Int(v + 1)).collect();
        assert_eq!(looped, manual);
    }

    #[test]
    fn storer_collects_scalars_in_order() {
        let out = run("(7 8 9)", vec![]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], int_array(&[7, 8, 9]));
    }

    #[test]
    fn scopes_introduced_and_released_are_absent() {
        let tin = Tin::new(PRIMALITY).expect("compiles");
        let mut machine = Machine::new();
        machine
            .execute(tin.program(), vec![Value::Int(17)])
            .expect("runs");
        assert_eq!(machine.scope_count(), 0);
    }

    proptest! {
        #[test]
        fn pushing_then_duplicating_leaves_the_value_twice(v in any::<i64>()) {
            let out = run("!", vec![Value::Int(v)]);
            prop_assert_eq!(out, vec![Value::Int(v), Value::Int(v)]);
        }

        #[test]
        fn storer_round_trips_scalar_runs(values in proptest::collection::vec(0u16..1000, 0..8)) {
            let body: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            let src = format!("({})", body.join(" "));
            let out = run(&src, vec![]);
            prop_assert_eq!(out.len(), 1);
            match &out[0] {
                Value::Array(a) => {
                    prop_assert_eq!(a.len_axis0(), values.len());
                    for (i, v) in values.iter().enumerate() {
                        prop_assert_eq!(a.index(i as i64).unwrap(), Value::Int(*v as i64));
                    }
                }
                other => prop_assert!(false, "expected an array, got {:?}", other),
            }
        }

        #[test]
        fn foreach_equivalence(values in proptest::collection::vec(-100i64..100, 1..6)) {
            let arr: Vec<Value> = values.iter().map(|&v| Value::Int(v)).collect();
            let arr = Value::Array(NumArray::from_values(&arr).unwrap());
            let looped = run("{⊳⊳}", vec![arr]);
            let manual: Vec<Value> = values.iter().map(|&v| Value::Int(v + 2)).collect();
            prop_assert_eq!(looped, manual);
        }

        #[test]
        fn swap_is_its_own_inverse(a in any::<i64>(), b in any::<i64>()) {
            let out = run("↶↶", vec![Value::Int(a), Value::Int(b)]);
            prop_assert_eq!(out, vec![Value::Int(a), Value::Int(b)]);
        }
    }
}
