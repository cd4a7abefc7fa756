use crate::binding::FieldBinding;
use std::cmp::Ordering;

/// Deterministic processing order for a class's bindings.
///
/// Hinted bindings (order >= 0) come first by `(order, name)`, then the
/// unhinted ones by name. Writes that insert or delete rows shift everything
/// below them, so callers use hints to control which fields observe the
/// shifted grid.
pub fn resolve_order(bindings: Vec<FieldBinding>) -> Vec<FieldBinding> {
    let mut bindings = bindings;
    bindings.sort_by(|a, b| compare(a.order(), a.name, b.order(), b.name));
    bindings
}

/// Ordering of `(hint, name)` pairs used by [`resolve_order`].
pub fn compare(a_order: i32, a_name: &str, b_order: i32, b_name: &str) -> Ordering {
    match (a_order >= 0, b_order >= 0) {
        (true, true) => a_order.cmp(&b_order).then_with(|| a_name.cmp(b_name)),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a_name.cmp(b_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut items: Vec<(i32, &'static str)>) -> Vec<&'static str> {
        items.sort_by(|a, b| compare(a.0, a.1, b.0, b.1));
        items.into_iter().map(|(_, n)| n).collect()
    }

    #[test]
    fn hinted_before_unhinted() {
        let out = sorted(vec![(-1, "a"), (5, "z"), (-1, "b"), (0, "y")]);
        assert_eq!(out, vec!["y", "z", "a", "b"]);
    }

    #[test]
    fn equal_hints_tie_break_by_name() {
        let out = sorted(vec![(2, "delta"), (2, "alpha"), (1, "omega"), (2, "beta")]);
        assert_eq!(out, vec!["omega", "alpha", "beta", "delta"]);
    }

    #[test]
    fn independent_of_input_order() {
        let base = vec![(3, "c"), (-1, "x"), (3, "a"), (0, "m"), (-7, "b"), (1, "k")];
        let expected = sorted(base.clone());
        for shift in 0..base.len() {
            let mut rotated = base.clone();
            rotated.rotate_left(shift);
            assert_eq!(sorted(rotated.clone()), expected);
            rotated.reverse();
            assert_eq!(sorted(rotated), expected);
        }
        assert_eq!(expected, vec!["m", "k", "a", "c", "b", "x"]);
    }
}
