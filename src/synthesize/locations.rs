use std::collections::{BTreeMap, BTreeSet};

use crate::net::ids::EventId;
use crate::net::index_vec::IndexVec;
use crate::synthesize::UtilityError;
use crate::synthesize::utility::RegionUtility;

/// Optional location per event, used for distributable synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationMap {
    locations: IndexVec<EventId, Option<String>>,
}

impl LocationMap {
    /// Map without any location.
    pub fn new(utility: &RegionUtility<'_>) -> Self {
        Self {
            locations: IndexVec::from_elem_n(None, utility.number_of_events()),
        }
    }

    /// Builds the map from `label -> location` pairs; every label must be an
    /// event of the utility's transition system.
    pub fn from_labels(
        utility: &RegionUtility<'_>,
        labels: &BTreeMap<String, String>,
    ) -> Result<Self, UtilityError> {
        let mut map = Self::new(utility);
        for (label, location) in labels {
            map.set(utility.event_index(label)?, location.clone());
        }
        Ok(map)
    }

    /// Every event in a location of its own, named after the event.
    pub fn one_per_event(utility: &RegionUtility<'_>) -> Self {
        Self {
            locations: utility
                .events()
                .iter()
                .map(|(_, label)| Some(label.to_owned()))
                .collect(),
        }
    }

    pub fn set(&mut self, event: EventId, location: impl Into<String>) {
        self.locations[event] = Some(location.into());
    }

    pub fn get(&self, event: EventId) -> Option<&str> {
        self.locations.get(event).and_then(|location| location.as_deref())
    }

    /// Distinct locations in use.
    pub fn locations(&self) -> BTreeSet<&str> {
        self.locations.iter().filter_map(|location| location.as_deref()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.iter().all(Option::is_none)
    }
}
