//! Fresh identifier supply

use std::{mem, ops::RangeFrom};

/// Types with a next value
pub trait Succ {
    /// The value directly after `self`
    #[must_use]
    fn succ(self) -> Self;
}

impl<T> Succ for T
where RangeFrom<T>: Iterator<Item = T>
{
    fn succ(self) -> Self { (self..).nth(1).unwrap_or_else(|| unreachable!()) }
}

/// Hands out each value of `T` at most once, counting upwards
#[derive(Debug, Default, Clone)]
#[repr(transparent)]
pub struct Free<T>(T);

impl<T> From<T> for Free<T> {
    fn from(val: T) -> Self { Self(val) }
}

impl<T: Clone + Succ> Free<T> {
    /// Take the next unused value
    #[must_use]
    pub fn fresh(&mut self) -> T {
        let succ = self.0.clone().succ();
        mem::replace(&mut self.0, succ)
    }
}
