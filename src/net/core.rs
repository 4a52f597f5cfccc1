//! 合成结果：由区域（region）构成的 P/T 网及其 DOT 渲染与结构类检查。
use std::fmt::{self, Write as FmtWrite};
use std::fs;
use std::path::Path;

use crate::net::ids::{PlaceId, TransitionId};
use crate::net::incidence::Incidence;
use crate::net::index_vec::{Idx, IndexVec};
use crate::net::structure::{Marking, Place, Transition, Weight};

#[derive(Clone, serde::Serialize, serde::Deserialize)]
pub struct Net {
    pub name: String,
    pub places: IndexVec<PlaceId, Place>,
    pub transitions: IndexVec<TransitionId, Transition>,
    pub pre: Incidence<Weight>,
    pub post: Incidence<Weight>,
}

impl fmt::Debug for Net {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Net")
            .field("name", &self.name)
            .field("places", &self.places)
            .field("transitions", &self.transitions)
            .field("pre", &self.pre)
            .field("post", &self.post)
            .finish()
    }
}

impl Net {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            places: IndexVec::new(),
            transitions: IndexVec::new(),
            pre: Incidence::empty(0),
            post: Incidence::empty(0),
        }
    }

    pub fn add_transition(&mut self, transition: Transition) -> TransitionId {
        let transition_id = self.transitions.push(transition);
        self.pre.push_transition(0);
        self.post.push_transition(0);
        transition_id
    }

    /// Adds a place together with its full arc rows; `consume[t]` is the
    /// place -> t weight, `produce[t]` the t -> place weight.
    pub fn add_place(
        &mut self,
        place: Place,
        consume: impl IntoIterator<Item = Weight>,
        produce: impl IntoIterator<Item = Weight>,
    ) -> PlaceId {
        let place_id = self.places.push(place);
        self.pre.push_place(consume);
        self.post.push_place(produce);
        place_id
    }

    pub fn places_len(&self) -> usize {
        self.places.len()
    }

    pub fn transitions_len(&self) -> usize {
        self.transitions.len()
    }

    pub fn transition_by_label(&self, label: &str) -> Option<TransitionId> {
        self.transitions
            .iter_enumerated()
            .find(|(_, transition)| transition.label == label)
            .map(|(id, _)| id)
    }

    pub fn initial_marking(&self) -> Marking {
        Marking(self.places.iter().map(|p| p.tokens).collect())
    }

    pub fn c_matrix(&self) -> Incidence<i64> {
        self.post.difference(&self.pre)
    }

    /// Places consumed from by `transition`.
    pub fn preset(&self, transition: TransitionId) -> Vec<PlaceId> {
        self.pre
            .column(transition)
            .filter(|(_, weight)| **weight > 0)
            .map(|(place, _)| place)
            .collect()
    }

    /// Places produced into by `transition`.
    pub fn postset(&self, transition: TransitionId) -> Vec<PlaceId> {
        self.post
            .column(transition)
            .filter(|(_, weight)| **weight > 0)
            .map(|(place, _)| place)
            .collect()
    }

    /// 所有弧权重不超过 1。
    pub fn is_plain(&self) -> bool {
        self.places.indices().all(|place| {
            self.pre.row(place).iter().all(|w| *w <= 1)
                && self.post.row(place).iter().all(|w| *w <= 1)
        })
    }

    /// 无自环（side condition）：没有迁移同时消耗并产生同一库所。
    pub fn is_pure(&self) -> bool {
        self.places.indices().all(|place| {
            self.pre
                .row(place)
                .iter()
                .zip(self.post.row(place))
                .all(|(consume, produce)| *consume == 0 || *produce == 0)
        })
    }

    /// Every place has at most one producing and at most one consuming transition.
    pub fn is_t_net(&self) -> bool {
        self.places.indices().all(|place| {
            self.pre.row(place).iter().filter(|w| **w > 0).count() <= 1
                && self.post.row(place).iter().filter(|w| **w > 0).count() <= 1
        })
    }

    /// Every place has at most one consuming transition.
    pub fn is_output_nonbranching(&self) -> bool {
        self.places
            .indices()
            .all(|place| self.pre.row(place).iter().filter(|w| **w > 0).count() <= 1)
    }

    pub fn to_dot(&self) -> String {
        let mut dot = String::new();
        let _ = writeln!(&mut dot, "digraph \"{}\" {{", escape_label(&self.name));
        let _ = writeln!(&mut dot, "    rankdir=LR;");
        let _ = writeln!(&mut dot, "    node [fontname=\"Helvetica\"];");

        for (place_id, place) in self.places.iter_enumerated() {
            let _ = writeln!(
                &mut dot,
                "    place_{} [label=\"{}\\n{}\", shape=circle];",
                place_id.index(),
                escape_label(&place.name),
                place.tokens
            );
        }

        for (transition_id, transition) in self.transitions.iter_enumerated() {
            let _ = writeln!(
                &mut dot,
                "    trans_{} [label=\"{}\", shape=box];",
                transition_id.index(),
                escape_label(&transition.label)
            );
        }

        for place in self.places.indices() {
            let place_node = format!("place_{}", place.index());
            let arcs = self
                .pre
                .row(place)
                .iter()
                .enumerate()
                .map(|(idx, weight)| (place_node.clone(), format!("trans_{idx}"), *weight))
                .chain(
                    self.post
                        .row(place)
                        .iter()
                        .enumerate()
                        .map(|(idx, weight)| (format!("trans_{idx}"), place_node.clone(), *weight)),
                );
            for (from, to, weight) in arcs {
                match weight {
                    0 => {}
                    1 => {
                        let _ = writeln!(&mut dot, "    {} -> {};", from, to);
                    }
                    _ => {
                        let _ = writeln!(&mut dot, "    {} -> {} [label=\"{}\"];", from, to, weight);
                    }
                }
            }
        }

        let _ = writeln!(&mut dot, "}}");
        dot
    }

    pub fn write_dot<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_dot())
    }
}

fn escape_label(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle_net() -> Net {
        let mut net = Net::empty("cycle");
        let a = net.add_transition(Transition::new("a"));
        let b = net.add_transition(Transition::new("b"));
        net.add_place(Place::new("p0", 1), [1, 0], [0, 1]);
        net.add_place(Place::new("p1", 0), [0, 1], [1, 0]);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        net
    }

    #[test]
    fn add_place_fills_incidence_rows() {
        let net = cycle_net();
        assert_eq!(net.places_len(), 2);
        assert_eq!(net.transitions_len(), 2);
        let a = net.transition_by_label("a").unwrap();
        assert_eq!(net.preset(a), vec![PlaceId::new(0)]);
        assert_eq!(net.postset(a), vec![PlaceId::new(1)]);
        assert_eq!(net.initial_marking().tokens(PlaceId::new(0)), 1);
        let c = net.c_matrix();
        assert_eq!(*c.get(PlaceId::new(0), a), -1);
        assert_eq!(*c.get(PlaceId::new(1), a), 1);
    }

    #[test]
    fn structural_classes() {
        let mut net = cycle_net();
        assert!(net.is_plain());
        assert!(net.is_pure());
        assert!(net.is_t_net());
        assert!(net.is_output_nonbranching());

        // self-loop on a, consumed by both transitions, double weight on b
        net.add_place(Place::new("p2", 2), [1, 2], [1, 0]);
        assert!(!net.is_plain());
        assert!(!net.is_pure());
        assert!(!net.is_t_net());
        assert!(!net.is_output_nonbranching());
    }

    #[test]
    fn dot_lists_weighted_arcs() {
        let mut net = cycle_net();
        net.add_place(Place::new("p\"2", 0), [0, 0], [3, 0]);
        let dot = net.to_dot();
        assert!(dot.starts_with("digraph \"cycle\""));
        assert!(dot.contains("place_0 -> trans_0;"));
        assert!(dot.contains("trans_0 -> place_2 [label=\"3\"];"));
        assert!(dot.contains("p\\\"2"));
    }
}
