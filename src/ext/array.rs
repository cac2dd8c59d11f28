use num_traits::{Float, NumCast};

use crate::ext::{NumberExt, ObjectMap, Rng};
use crate::Value;

pub trait SliceExt<T> {
    /// Element at `i` wrapped modulo the length; `None` only when empty.
    fn index_wrapped(&self, i: i64) -> Option<&T>;
    fn last_item(&self) -> Option<&T>;
    /// First occurrences only, in original order.
    fn unique(&self) -> Vec<T>
    where
        T: PartialEq + Clone;
    /// Builds a map from these keys, taking values from `object`.
    fn pick(&self, object: &ObjectMap) -> ObjectMap
    where
        T: AsRef<str>;
    /// Sorted by `key`, largest first. Ties keep their original order.
    fn sort_by_desc<F>(&self, key: F) -> Vec<T>
    where
        T: Clone,
        F: FnMut(&T) -> f64;
    fn random_item(&self, rng: &mut Rng) -> Option<&T>;
    fn shuffled(&self, rng: &mut Rng) -> Vec<T>
    where
        T: Clone;
}

impl<T> SliceExt<T> for [T] {
    fn index_wrapped(&self, i: i64) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        let len = self.len() as i64;
        self.get(i.rem_euclid(len) as usize)
    }

    fn last_item(&self) -> Option<&T> {
        self.last()
    }

    fn unique(&self) -> Vec<T>
    where
        T: PartialEq + Clone,
    {
        let mut out: Vec<T> = Vec::with_capacity(self.len());
        for item in self {
            if !out.contains(item) {
                out.push(item.clone());
            }
        }
        out
    }

    fn pick(&self, object: &ObjectMap) -> ObjectMap
    where
        T: AsRef<str>,
    {
        let keys = self.iter().map(AsRef::as_ref).collect::<Vec<_>>();
        object.only(&keys)
    }

    fn sort_by_desc<F>(&self, mut key: F) -> Vec<T>
    where
        T: Clone,
        F: FnMut(&T) -> f64,
    {
        let mut keyed = self
            .iter()
            .map(|item| (key(item), item.clone()))
            .collect::<Vec<_>>();
        keyed.sort_by(|(a, _), (b, _)| b.total_cmp(a));
        keyed.into_iter().map(|(_, item)| item).collect()
    }

    fn random_item(&self, rng: &mut Rng) -> Option<&T> {
        if self.is_empty() {
            return None;
        }
        self.get(rng.below(self.len()))
    }

    fn shuffled(&self, rng: &mut Rng) -> Vec<T>
    where
        T: Clone,
    {
        let mut out = self.to_vec();
        for i in (1..out.len()).rev() {
            let j = rng.below(i + 1);
            out.swap(i, j);
        }
        out
    }
}

pub trait NumericSliceExt<T: Float> {
    fn max_value(&self) -> Option<T>;
    fn min_value(&self) -> Option<T>;
    fn sum(&self) -> T;
    fn mean(&self) -> Option<T>;
    /// Middle of the sorted values; the mean of the two middles for even lengths.
    fn median(&self) -> Option<T>;
    /// Population standard deviation.
    fn std_dev(&self) -> Option<T>;
    /// `[r, g, b]` channels to `#rrggbb`.
    fn to_color_hex(&self) -> String;
}

impl<T: Float> NumericSliceExt<T> for [T] {
    fn max_value(&self) -> Option<T> {
        self.iter().copied().reduce(T::max)
    }

    fn min_value(&self) -> Option<T> {
        self.iter().copied().reduce(T::min)
    }

    fn sum(&self) -> T {
        self.iter().fold(T::zero(), |acc, value| acc + *value)
    }

    fn mean(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        Some(self.sum() / <T as NumCast>::from(self.len())?)
    }

    fn median(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let mut sorted = self.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            return Some(sorted[mid]);
        }
        Some((sorted[mid - 1] + sorted[mid]) / <T as NumCast>::from(2)?)
    }

    fn std_dev(&self) -> Option<T> {
        let mean = self.mean()?;
        let variance = self
            .iter()
            .map(|value| (*value - mean).powi(2))
            .fold(T::zero(), |acc, value| acc + value)
            / <T as NumCast>::from(self.len())?;
        Some(variance.sqrt())
    }

    fn to_color_hex(&self) -> String {
        let mut out = String::from("#");
        for channel in self {
            let max = <T as NumCast>::from(255).unwrap_or(*channel);
            let hex = channel.clamp_between(T::zero(), max).to_hex();
            if hex.len() < 2 {
                out.push('0');
            }
            out.push_str(&hex);
        }
        out
    }
}

pub trait ValuesExt {
    /// First truthy value, or the last value when none is truthy.
    fn any_truthy(&self) -> Value;
    /// First falsy value, or the last value when all are truthy.
    fn all_truthy(&self) -> Value;
}

impl ValuesExt for [Value] {
    fn any_truthy(&self) -> Value {
        self.iter()
            .find(|value| value.truthy())
            .or_else(|| self.last())
            .cloned()
            .unwrap_or_default()
    }

    fn all_truthy(&self) -> Value {
        self.iter()
            .find(|value| !value.truthy())
            .or_else(|| self.last())
            .cloned()
            .unwrap_or_default()
    }
}

pub trait VecExt<T> {
    fn add<I: IntoIterator<Item = T>>(&mut self, items: I) -> &mut Self;
    fn prepend<I: IntoIterator<Item = T>>(&mut self, items: I) -> &mut Self;
    /// Removes the first occurrence of `item`, if any.
    fn remove_item(&mut self, item: &T) -> &mut Self
    where
        T: PartialEq;
}

impl<T> VecExt<T> for Vec<T> {
    fn add<I: IntoIterator<Item = T>>(&mut self, items: I) -> &mut Self {
        self.extend(items);
        self
    }

    fn prepend<I: IntoIterator<Item = T>>(&mut self, items: I) -> &mut Self {
        let tail = std::mem::take(self);
        self.extend(items);
        self.extend(tail);
        self
    }

    fn remove_item(&mut self, item: &T) -> &mut Self
    where
        T: PartialEq,
    {
        if let Some(idx) = self.iter().position(|candidate| candidate == item) {
            self.remove(idx);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_wraps_in_both_directions() {
        let items = [10, 20, 30];
        assert_eq!(items.index_wrapped(0), Some(&10));
        assert_eq!(items.index_wrapped(3), Some(&10));
        assert_eq!(items.index_wrapped(-1), Some(&30));
        assert_eq!(items.index_wrapped(-7), Some(&30));
        let empty: [i32; 0] = [];
        assert_eq!(empty.index_wrapped(2), None);
    }

    #[test]
    fn unique_remove_and_prepend() {
        let mut items = vec![1, 2, 1, 3, 2];
        assert_eq!(items.unique(), vec![1, 2, 3]);
        items.remove_item(&1).prepend([0]).add([9]);
        assert_eq!(items, vec![0, 2, 1, 3, 2, 9]);
    }

    #[test]
    fn sort_by_desc_orders_largest_first() {
        let words = ["a", "ccc", "bb"];
        assert_eq!(
            words.sort_by_desc(|word| word.len() as f64),
            vec!["ccc", "bb", "a"]
        );
    }

    #[test]
    fn statistics() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(values.sum(), 40.0);
        assert_eq!(values.mean(), Some(5.0));
        assert_eq!(values.median(), Some(4.5));
        assert_eq!(values.std_dev(), Some(2.0));
        assert_eq!(values.max_value(), Some(9.0));
        assert_eq!([3.0, 1.0, 2.0].median(), Some(2.0));
        assert_eq!([255.0, 8.0, 0.0].to_color_hex(), "#ff0800");
    }

    #[test]
    fn truthiness_folds() {
        let values = [Value::Null, Value::from(0), Value::from("x"), Value::from(1)];
        assert_eq!(values.any_truthy(), Value::from("x"));
        assert_eq!(values.all_truthy(), Value::Null);
        let falsy = [Value::Null, Value::from("")];
        assert_eq!(falsy.any_truthy(), Value::from(""));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = Rng::new(7);
        let mut shuffled = [1, 2, 3, 4, 5].shuffled(&mut rng);
        shuffled.sort();
        assert_eq!(shuffled, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn pick_builds_map_from_keys() {
        let object = ObjectMap::new().with("a", 1).with("b", 2);
        let picked = ["b"].pick(&object);
        assert_eq!(picked.keys().collect::<Vec<_>>(), vec!["b"]);
    }
}
