use std::fmt;

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::net::core::Net;
use crate::net::structure::{Place, Transition};
use crate::net::ids::EventId;
use crate::net::index_vec::Idx;
use crate::synthesize::UtilityError;
use crate::synthesize::locations::LocationMap;
use crate::synthesize::properties::PnProperties;
use crate::synthesize::region::Region;
use crate::synthesize::separation::{InequalitySystemSeparation, Separation, SeparationError, create_separation};
use crate::synthesize::utility::RegionUtility;
use crate::ts::StateId;

/// One separation instance of a transition system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Problem {
    States(StateId, StateId),
    Event(StateId, EventId),
}

/// Solves every separation problem of a transition system and collects the
/// regions that become the places of the synthesized net.
pub struct Synthesizer<'a> {
    utility: &'a RegionUtility<'a>,
    separation: InequalitySystemSeparation<'a>,
    parallel: bool,
}

impl<'a> Synthesizer<'a> {
    pub fn new(
        utility: &'a RegionUtility<'a>,
        properties: PnProperties,
        locations: &LocationMap,
    ) -> Result<Self, UtilityError> {
        Ok(Self {
            utility,
            separation: create_separation(utility, properties, locations)?,
            parallel: false,
        })
    }

    /// Solve the instances on the rayon thread pool. The outcome does not
    /// depend on scheduling.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn properties(&self) -> PnProperties {
        self.separation.properties()
    }

    /// Event/state separation instances: every event not enabled at a
    /// reachable state.
    fn event_problems(&self) -> Vec<Problem> {
        let ts = self.utility.transition_system();
        let mut problems = Vec::new();
        for &state in self.utility.spanning_tree().reachable_states() {
            for (event, label) in self.utility.events().iter() {
                if !ts.is_enabled(state, label) {
                    problems.push(Problem::Event(state, event));
                }
            }
        }
        problems
    }

    /// State separation instances: unordered pairs of reachable states.
    fn state_problems(&self) -> Vec<Problem> {
        let states = self.utility.spanning_tree().reachable_states();
        states
            .iter()
            .enumerate()
            .flat_map(|(i, &state)| states[i + 1..].iter().map(move |&other| Problem::States(state, other)))
            .collect()
    }

    fn is_solved_by(&self, problem: Problem, region: &Region) -> Result<bool, UtilityError> {
        match problem {
            Problem::States(state, other) => region.solves_state_separation(self.utility, state, other),
            Problem::Event(state, event) => region.solves_event_separation(self.utility, state, event),
        }
    }

    fn is_solved(&self, problem: Problem, regions: &[Region]) -> Result<bool, UtilityError> {
        for region in regions {
            if self.is_solved_by(problem, region)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn solve(&self, problem: Problem) -> Result<Option<Region>, SeparationError> {
        match problem {
            Problem::Event(state, event) => self
                .separation
                .separate_event(state, self.utility.event_label(event)),
            // complementary regions may be cut off by k-boundedness, so both
            // directions are tried
            Problem::States(state, other) => match self.separation.separate_states(state, other)? {
                Some(region) => Ok(Some(region)),
                None => self.separation.separate_states(other, state),
            },
        }
    }

    /// Adds the region for `problem` to `regions` unless an earlier region
    /// already solves it. Returns `false` for unsolvable problems.
    fn merge(
        &self,
        problem: Problem,
        solution: impl FnOnce() -> Result<Option<Region>, SeparationError>,
        regions: &mut Vec<Region>,
    ) -> Result<bool, SeparationError> {
        if self.is_solved(problem, regions)? {
            return Ok(true);
        }
        match solution()? {
            Some(region) => {
                debug!("{problem:?} solved by {}", region.display_with(self.utility));
                if !regions.contains(&region) {
                    regions.push(region);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn solve_all(&self, problems: &[Problem], regions: &mut Vec<Region>) -> Result<Vec<Problem>, SeparationError> {
        let mut unsolved = Vec::new();
        if self.parallel {
            let solutions = problems
                .par_iter()
                .map(|problem| self.solve(*problem))
                .collect::<Result<Vec<_>, _>>()?;
            for (problem, solution) in problems.iter().zip(solutions) {
                if !self.merge(*problem, || Ok(solution), regions)? {
                    unsolved.push(*problem);
                }
            }
        } else {
            for problem in problems {
                if !self.merge(*problem, || self.solve(*problem), regions)? {
                    unsolved.push(*problem);
                }
            }
        }
        Ok(unsolved)
    }

    pub fn synthesize(&self) -> Result<SynthesisOutcome, SeparationError> {
        let ts = self.utility.transition_system();
        let mut regions = Vec::new();

        let event_problems = self.event_problems();
        let unsolved_events = self.solve_all(&event_problems, &mut regions)?;
        let state_problems = self.state_problems();
        let unsolved_states = self.solve_all(&state_problems, &mut regions)?;

        let outcome = SynthesisOutcome {
            name: ts.name().to_owned(),
            events: self.utility.events().iter().map(|(_, label)| label.to_owned()).collect(),
            regions,
            unsolved_states: unsolved_states
                .into_iter()
                .filter_map(|problem| match problem {
                    Problem::States(state, other) => {
                        Some((ts.state_name(state).to_owned(), ts.state_name(other).to_owned()))
                    }
                    Problem::Event(..) => None,
                })
                .collect(),
            unsolved_events: unsolved_events
                .into_iter()
                .filter_map(|problem| match problem {
                    Problem::Event(state, event) => Some((
                        ts.state_name(state).to_owned(),
                        self.utility.event_label(event).to_owned(),
                    )),
                    Problem::States(..) => None,
                })
                .collect(),
        };

        info!(
            "synthesis of `{}` with {}: {} event/state and {} state separation problems, {} regions",
            outcome.name,
            self.properties(),
            event_problems.len(),
            state_problems.len(),
            outcome.regions.len()
        );
        for (state, other) in &outcome.unsolved_states {
            warn!("states {state} and {other} cannot be separated");
        }
        for (state, event) in &outcome.unsolved_events {
            warn!("event {event} cannot be disabled in state {state}");
        }
        Ok(outcome)
    }
}

/// Regions found by [`Synthesizer::synthesize`] and the problems left open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOutcome {
    name: String,
    events: Vec<String>,
    regions: Vec<Region>,
    unsolved_states: Vec<(String, String)>,
    unsolved_events: Vec<(String, String)>,
}

impl SynthesisOutcome {
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Pairs of state names no region separates.
    pub fn unsolved_states(&self) -> &[(String, String)] {
        &self.unsolved_states
    }

    /// `(state, event)` pairs where the event stays enabled in every region.
    pub fn unsolved_events(&self) -> &[(String, String)] {
        &self.unsolved_events
    }

    /// The net generated by the regions has a reachability graph isomorphic
    /// to the transition system.
    pub fn is_success(&self) -> bool {
        self.unsolved_states.is_empty() && self.unsolved_events.is_empty()
    }

    /// One transition per event (in event order), one place `p<i>` per region.
    pub fn to_net(&self) -> Net {
        let mut net = Net::empty(self.name.clone());
        for label in &self.events {
            net.add_transition(Transition::new(label.clone()));
        }
        for (i, region) in self.regions.iter().enumerate() {
            let events = (0..self.events.len()).map(EventId::from_usize);
            net.add_place(
                Place::new(format!("p{i}"), region.initial_marking()),
                events.clone().map(|event| region.backward_weight(event)),
                events.map(|event| region.forward_weight(event)),
            );
        }
        net
    }
}

impl fmt::Display for SynthesisOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} regions", self.name, self.regions.len())?;
        for region in &self.regions {
            writeln!(f, "  {region}")?;
        }
        for (state, other) in &self.unsolved_states {
            writeln!(f, "  unsolved SSP ({state}, {other})")?;
        }
        for (state, event) in &self.unsolved_events {
            writeln!(f, "  unsolved ESSP ({state}, {event})")?;
        }
        Ok(())
    }
}
