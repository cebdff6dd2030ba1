/// One inclusion flag per dataset row, aligned by position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mask(Vec<bool>);

impl Mask {
    /// Every row included.
    pub fn all(len: usize) -> Self {
        Mask(vec![true; len])
    }

    /// No row included.
    pub fn none(len: usize) -> Self {
        Mask(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, row: usize) -> Option<bool> {
        self.0.get(row).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    /// Number of included rows.
    pub fn count(&self) -> usize {
        self.0.iter().filter(|b| **b).count()
    }

    /// Row indices of included rows, ascending.
    pub fn indices(&self) -> Vec<usize> {
        self.0
            .iter()
            .enumerate()
            .filter(|(_, b)| **b)
            .map(|(i, _)| i)
            .collect()
    }

    /// Elementwise AND. Rows beyond the shorter mask become false.
    pub fn and(&self, other: &Mask) -> Mask {
        self.zip_with(other, |a, b| a && b)
    }

    /// Elementwise OR. Rows beyond the shorter mask keep their own value.
    pub fn or(&self, other: &Mask) -> Mask {
        self.zip_with(other, |a, b| a || b)
    }

    pub fn not(&self) -> Mask {
        Mask(self.0.iter().map(|b| !b).collect())
    }

    fn zip_with(&self, other: &Mask, f: impl Fn(bool, bool) -> bool) -> Mask {
        let n = self.len().max(other.len());
        (0..n)
            .map(|i| f(self.get(i).unwrap_or(false), other.get(i).unwrap_or(false)))
            .collect()
    }
}

impl From<Vec<bool>> for Mask {
    fn from(flags: Vec<bool>) -> Self {
        Mask(flags)
    }
}

impl From<Mask> for Vec<bool> {
    fn from(mask: Mask) -> Self {
        mask.0
    }
}

impl FromIterator<bool> for Mask {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Mask(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinators() {
        let a = Mask::from(vec![true, true, false, false]);
        let b = Mask::from(vec![true, false, true, false]);
        assert_eq!(a.and(&b).as_slice(), &[true, false, false, false]);
        assert_eq!(a.or(&b).as_slice(), &[true, true, true, false]);
        assert_eq!(a.not().as_slice(), &[false, false, true, true]);
    }

    #[test]
    fn test_indices_and_count() {
        let m = Mask::from(vec![false, true, false, true]);
        assert_eq!(m.indices(), vec![1, 3]);
        assert_eq!(m.count(), 2);
        assert_eq!(Mask::all(3).count(), 3);
        assert_eq!(Mask::none(3).count(), 0);
    }
}
