/// Single-slot memo: keeps the last key and the value computed from it.
/// A lookup with an equal key returns the cached value; any other key
/// recomputes and replaces it.
#[derive(Debug, Clone)]
pub struct Memo<K, V> {
    slot: Option<(K, V)>,
    computations: usize,
}

impl<K: PartialEq, V> Memo<K, V> {
    pub fn new() -> Self {
        Self {
            slot: None,
            computations: 0,
        }
    }

    pub fn get_or_compute<F>(&mut self, key: K, compute: F) -> &V
    where
        F: FnOnce(&K) -> V,
    {
        if self.slot.as_ref().is_some_and(|(cached, _)| *cached != key) {
            self.slot = None;
        }
        let computations = &mut self.computations;
        let (_, value) = self.slot.get_or_insert_with(|| {
            *computations += 1;
            let value = compute(&key);
            (key, value)
        });
        value
    }

    /// Cached value, if any, without touching the key.
    pub fn peek(&self) -> Option<&V> {
        self.slot.as_ref().map(|(_, v)| v)
    }

    pub fn invalidate(&mut self) {
        self.slot = None;
    }

    /// How many times a value has been computed.
    pub fn computations(&self) -> usize {
        self.computations
    }
}

impl<K: PartialEq, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_key_reuses_value() {
        let mut memo: Memo<(String, u32), String> = Memo::new();
        let key = ("alos_dem".to_string(), 5);
        assert_eq!(memo.get_or_compute(key.clone(), |(m, l)| format!("{m}:{l}")), "alos_dem:5");
        assert_eq!(memo.get_or_compute(key, |_| unreachable!()), "alos_dem:5");
        assert_eq!(memo.computations(), 1);
    }

    #[test]
    fn new_key_recomputes() {
        let mut memo: Memo<u32, u32> = Memo::new();
        memo.get_or_compute(1, |k| k * 10);
        assert_eq!(*memo.get_or_compute(2, |k| k * 10), 20);
        assert_eq!(memo.computations(), 2);
        assert_eq!(memo.peek(), Some(&20));
    }

    #[test]
    fn invalidate_forces_recompute() {
        let mut memo: Memo<u32, u32> = Memo::new();
        memo.get_or_compute(1, |k| *k);
        memo.invalidate();
        assert!(memo.peek().is_none());
        memo.get_or_compute(1, |k| *k);
        assert_eq!(memo.computations(), 2);
    }
}
