//! Splittable mesh subsets as seen by the size coordinator.

/// A subset of a mesh that an external driver may split further.
pub trait Selection {
    /// Point or element count used for size comparisons.
    fn length(&self) -> u64;
}

impl Selection for u64 {
    fn length(&self) -> u64 {
        *self
    }
}

impl<S: Selection + ?Sized> Selection for &S {
    fn length(&self) -> u64 {
        (**self).length()
    }
}

impl<S: Selection + ?Sized> Selection for Box<S> {
    fn length(&self) -> u64 {
        (**self).length()
    }
}

/// Where the globally largest selection lives.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LargestSelection {
    /// Participant holding it.
    pub rank: usize,
    /// Index into that participant's local list; only known on `rank`.
    pub index: Option<usize>,
}

/// Size of the largest local selection, 0 when there are none.
pub fn local_max<S: Selection>(selections: &[S]) -> u64 {
    selections.iter().map(Selection::length).max().unwrap_or(0)
}

/// First local index whose size equals `value`.
pub fn find_local<S: Selection>(selections: &[S], value: u64) -> Option<usize> {
    selections.iter().position(|s| s.length() == value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        let sizes = [3u64, 9, 9, 1];
        assert_eq!(local_max(&sizes), 9);
        assert_eq!(find_local(&sizes, 9), Some(1));
        assert_eq!(find_local(&sizes, 4), None);
        assert_eq!(local_max::<u64>(&[]), 0);
    }
}
