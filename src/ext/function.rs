use std::collections::HashMap;
use std::hash::Hash;

/// Caches results of `f` by argument.
pub fn memoize<A, R, F>(f: F) -> impl FnMut(A) -> R
where
    A: Eq + Hash + Clone,
    R: Clone,
    F: Fn(A) -> R,
{
    let mut cache: HashMap<A, R> = HashMap::new();
    move |arg: A| {
        if let Some(hit) = cache.get(&arg) {
            return hit.clone();
        }
        let result = f(arg.clone());
        cache.insert(arg, result.clone());
        result
    }
}

/// Fixes the first argument of a two-argument function.
pub fn curry<A, B, R, F>(f: F, first: A) -> impl Fn(B) -> R
where
    A: Clone,
    F: Fn(A, B) -> R,
{
    move |second: B| f(first.clone(), second)
}

/// Iterates `f` from `start` until the value stops changing.
///
/// Gives up after `max_steps` applications and returns `None`.
pub fn least_fixed_point<T, F>(f: F, start: T, max_steps: usize) -> Option<T>
where
    T: PartialEq,
    F: Fn(&T) -> T,
{
    let mut current = start;
    for _ in 0..max_steps {
        let next = f(&current);
        if next == current {
            return Some(current);
        }
        current = next;
    }
    None
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn memoize_calls_once_per_argument() {
        let calls = Cell::new(0);
        let mut square = memoize(|n: u64| {
            calls.set(calls.get() + 1);
            n * n
        });
        assert_eq!(square(4), 16);
        assert_eq!(square(4), 16);
        assert_eq!(square(5), 25);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn curry_binds_leading_argument() {
        let greet = curry(|greeting: &str, name: &str| format!("{greeting}, {name}"), "hi");
        assert_eq!(greet("ada"), "hi, ada");
    }

    #[test]
    fn fixed_point_converges_or_gives_up() {
        assert_eq!(least_fixed_point(|n: &u32| n / 2, 100, 64), Some(0));
        assert_eq!(least_fixed_point(|n: &u32| n + 1, 0, 8), None);
    }
}
