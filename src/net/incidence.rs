//! 合成网的输入（Pre）/输出（Post）矩阵：每个区域贡献一行，每个事件一列。
//! 合成过程中只追加行与列，从不删除。
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::index_vec::{Idx, IndexVec};

type SmallRow<T> = SmallVec<[T; 4]>;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Incidence<T> {
    rows: IndexVec<PlaceId, SmallRow<T>>,
    cols: usize,
}

impl<T: Clone> Incidence<T> {
    /// No places, `transitions` columns.
    pub fn empty(transitions: usize) -> Self {
        Self {
            rows: IndexVec::new(),
            cols: transitions,
        }
    }

    pub fn places(&self) -> usize {
        self.rows.len()
    }

    pub fn transitions(&self) -> usize {
        self.cols
    }

    /// Appends the row of a new place; it must span every transition.
    pub fn push_place(&mut self, row: impl IntoIterator<Item = T>) -> PlaceId {
        let row = row.into_iter().collect::<SmallRow<T>>();
        debug_assert_eq!(row.len(), self.cols, "place row does not span every transition");
        self.rows.push(row)
    }

    /// Appends a column holding `fill` for every existing place.
    pub fn push_transition(&mut self, fill: T) -> TransitionId {
        self.rows.iter_mut().for_each(|row| row.push(fill.clone()));
        self.cols += 1;
        TransitionId::from_usize(self.cols - 1)
    }

    pub fn get(&self, place: PlaceId, transition: TransitionId) -> &T {
        &self.rows[place][transition.index()]
    }

    pub fn row(&self, place: PlaceId) -> &[T] {
        &self.rows[place]
    }

    /// Entries of one transition, place by place.
    pub fn column(&self, transition: TransitionId) -> impl Iterator<Item = (PlaceId, &T)> {
        self.rows
            .iter_enumerated()
            .map(move |(place, row)| (place, &row[transition.index()]))
    }
}

impl<T: fmt::Debug> fmt::Debug for Incidence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rows.iter()).finish()
    }
}

impl Incidence<u64> {
    /// Signed entrywise difference, used for `C = Post - Pre`.
    pub fn difference(&self, other: &Self) -> Incidence<i64> {
        assert_eq!(
            (self.places(), self.cols),
            (other.places(), other.cols),
            "incidence shapes differ"
        );
        let rows = self
            .rows
            .iter()
            .zip(other.rows.iter())
            .map(|(left, right)| left.iter().zip(right).map(|(l, r)| *l as i64 - *r as i64).collect())
            .collect();
        Incidence { rows, cols: self.cols }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_grow_under_existing_rows() {
        let mut pre = Incidence::empty(1);
        let p0 = pre.push_place([2u64]);
        let t1 = pre.push_transition(0);
        let p1 = pre.push_place([0, 1]);
        assert_eq!(pre.row(p0), &[2, 0]);
        assert_eq!(*pre.get(p1, t1), 1);
        assert_eq!(pre.column(t1).map(|(_, w)| *w).collect::<Vec<_>>(), vec![0, 1]);

        let mut post = Incidence::empty(2);
        post.push_place([0u64, 3]);
        post.push_place([1, 0]);
        let c = post.difference(&pre);
        assert_eq!(c.row(p0), &[-2, 3]);
        assert_eq!(c.row(p1), &[1, -1]);
    }
}
