//! A one-to-one mapping with lookup in both directions

use std::hash::Hash;

use hashbrown::HashMap;

/// Pairs each left value with at most one right value and vice versa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bijection<L: Eq + Hash, R: Eq + Hash> {
    fwd: HashMap<L, R>,
    bck: HashMap<R, L>,
}

impl<L: Copy + Eq + Hash, R: Copy + Eq + Hash> Default for Bijection<L, R> {
    #[inline]
    fn default() -> Self { Self::new() }
}

impl<L: Copy + Eq + Hash, R: Copy + Eq + Hash> Bijection<L, R> {
    /// An empty mapping
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            fwd: HashMap::new(),
            bck: HashMap::new(),
        }
    }

    /// The right value paired with `l`
    #[inline]
    #[must_use]
    pub fn image(&self, l: L) -> Option<R> { self.fwd.get(&l).copied() }

    /// The left value paired with `r`
    #[inline]
    #[must_use]
    pub fn preimage(&self, r: R) -> Option<L> { self.bck.get(&r).copied() }

    /// Point `l` at `r`, releasing whatever `l` mapped to before.
    ///
    /// Returns true if the mapping changed.
    ///
    /// # Errors
    /// If `r` already belongs to a different left value, that value is
    /// returned and the mapping is left untouched.
    pub fn rebind(&mut self, l: L, r: R) -> Result<bool, L> {
        match self.bck.get(&r) {
            Some(&owner) if owner == l => return Ok(false),
            Some(&owner) => return Err(owner),
            None => (),
        }

        if let Some(old) = self.fwd.insert(l, r) {
            self.bck.remove(&old);
        }
        self.bck.insert(r, l);

        Ok(true)
    }
}

#[cfg(test)]
mod test {
    use super::Bijection;

    #[test]
    fn rebind_moves_image() {
        let mut b = Bijection::new();
        assert_eq!(b.rebind(1, 'a'), Ok(true));
        assert_eq!(b.rebind(2, 'b'), Ok(true));

        assert_eq!(b.rebind(1, 'c'), Ok(true));
        assert_eq!(b.image(1), Some('c'));
        assert_eq!(b.preimage('c'), Some(1));
        assert_eq!(b.preimage('a'), None);

        assert_eq!(b.rebind(1, 'c'), Ok(false));
        assert_eq!(b.rebind(1, 'b'), Err(2));
        assert_eq!(b.image(1), Some('c'));
        assert_eq!(b.image(2), Some('b'));
    }
}
