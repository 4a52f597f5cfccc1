use log::debug;

use crate::equations::{ConstraintGroup, InequalitySystem, Relation, find_solution};
use crate::net::ids::EventId;
use crate::net::index_vec::Idx;
use crate::synthesize::UtilityError;
use crate::synthesize::locations::LocationMap;
use crate::synthesize::properties::PnProperties;
use crate::synthesize::region::Region;
use crate::synthesize::separation::layout::VariableLayout;
use crate::synthesize::separation::{Separation, SeparationError};
use crate::synthesize::utility::RegionUtility;
use crate::ts::StateId;

/// Separation by integer constraint solving over the region basis.
#[derive(Debug, Clone)]
pub struct InequalitySystemSeparation<'a> {
    utility: &'a RegionUtility<'a>,
    properties: PnProperties,
    layout: VariableLayout,
    /// Must hold for every region.
    system: InequalitySystem,
    /// One alternative of each must hold.
    additional: Vec<ConstraintGroup>,
}

impl<'a> InequalitySystemSeparation<'a> {
    /// # Panics
    ///
    /// If `properties` asks for an output-nonbranching net; use
    /// [`super::create_separation`] for that.
    pub fn new(
        utility: &'a RegionUtility<'a>,
        properties: PnProperties,
        locations: &LocationMap,
    ) -> Result<Self, UtilityError> {
        assert!(
            !properties.is_output_nonbranching(),
            "output-nonbranching must be turned into locations before building the engine"
        );
        let layout = VariableLayout::new(utility.number_of_events(), utility.region_basis().len());
        debug!(
            "variables: weights {:?}, coefficients {:?}, forward {:?}, backward {:?}, initial marking {}",
            layout.weights(),
            layout.coefficients(),
            layout.forward_weights(),
            layout.backward_weights(),
            layout.initial_marking()
        );

        let mut separation = Self {
            utility,
            properties,
            layout,
            system: InequalitySystem::new(),
            additional: Vec::new(),
        };
        separation.require_linear_combination();
        separation.require_decomposition();
        separation.require_reachable_markings()?;
        if let Some(k) = properties.k_bounded() {
            separation.require_k_bounded(k)?;
        }
        if properties.is_plain() {
            separation.require_plainness();
        }

        let mut additional = vec![separation.require_distributable(locations)];
        if properties.is_conflict_free() {
            additional.push(separation.require_conflict_free());
        }
        if properties.is_t_net() {
            additional.push(separation.require_t_net_postset());
            additional.push(separation.require_t_net_preset());
        }
        separation.additional = additional.into_iter().map(ConstraintGroup::AnyOf).collect();
        debug!(
            "{} baseline constraints, {} disjunctive groups for {}",
            separation.system.len(),
            separation.additional.len(),
            properties
        );
        Ok(separation)
    }

    pub fn utility(&self) -> &'a RegionUtility<'a> {
        self.utility
    }

    pub fn properties(&self) -> PnProperties {
        self.properties
    }

    pub fn layout(&self) -> VariableLayout {
        self.layout
    }

    /// Constraints every region found by this engine satisfies.
    pub fn baseline(&self) -> &InequalitySystem {
        &self.system
    }

    fn events(&self) -> impl Iterator<Item = EventId> + use<> {
        (0..self.utility.number_of_events()).map(EventId::from_usize)
    }

    /// Coefficients of `m0 + Parikh(state) · weight`.
    fn state_marking(&self, state: StateId) -> Result<Vec<i64>, UtilityError> {
        let parikh = self.utility.parikh_vector(state)?;
        let mut coefficients = self.layout.zeros();
        for (event, count) in parikh.iter_enumerated() {
            coefficients[self.layout.weight(event)] = *count as i64;
        }
        coefficients[self.layout.initial_marking()] = 1;
        Ok(coefficients)
    }

    /// Coefficients summing `variable(e')` over every event `e' != event`.
    fn all_but(&self, event: EventId, variable: impl Fn(&VariableLayout, EventId) -> usize) -> Vec<i64> {
        let mut coefficients = self.layout.zeros();
        for other in self.events().filter(|other| *other != event) {
            coefficients[variable(&self.layout, other)] = 1;
        }
        coefficients
    }

    // weight(e) = sum_i lambda_i * basis_i(e)
    fn require_linear_combination(&mut self) {
        let utility = self.utility;
        let basis = utility.region_basis();
        for event in self.events() {
            let mut coefficients = self.layout.zeros();
            coefficients[self.layout.weight(event)] = -1;
            for (entry, region) in basis.iter().enumerate() {
                coefficients[self.layout.coefficient(entry)] = region.weight(event);
            }
            self.system.add_inequality(
                0,
                Relation::Equal,
                coefficients,
                format!("weight of {} is a combination of the basis", self.utility.event_label(event)),
            );
        }
    }

    fn require_decomposition(&mut self) {
        for event in self.events() {
            let label = self.utility.event_label(event).to_owned();
            let mut coefficients = self.layout.zeros();
            coefficients[self.layout.weight(event)] = -1;
            coefficients[self.layout.forward(event)] = 1;
            coefficients[self.layout.backward(event)] = -1;
            self.system
                .add_inequality(0, Relation::Equal, coefficients, format!("weight = forward - backward for {label}"));

            let mut coefficients = self.layout.zeros();
            coefficients[self.layout.forward(event)] = 1;
            self.system
                .add_inequality(0, Relation::GreaterEqual, coefficients, format!("forward weight of {label}"));

            let mut coefficients = self.layout.zeros();
            coefficients[self.layout.backward(event)] = 1;
            self.system
                .add_inequality(0, Relation::GreaterEqual, coefficients, format!("backward weight of {label}"));
        }

        let mut coefficients = self.layout.zeros();
        coefficients[self.layout.initial_marking()] = 1;
        self.system
            .add_inequality(0, Relation::GreaterEqual, coefficients, "initial marking");
    }

    /// Every reachable state has a non-negative marking and every arc leaving
    /// it stays enabled. Arcs from unreachable states are ignored.
    fn require_reachable_markings(&mut self) -> Result<(), UtilityError> {
        let utility = self.utility;
        let ts = utility.transition_system();
        for &state in utility.spanning_tree().reachable_states() {
            let coefficients = self.state_marking(state)?;
            self.system.add_inequality(
                0,
                Relation::GreaterEqual,
                coefficients,
                format!("marking of {} is non-negative", ts.state_name(state)),
            );
        }

        for arc in ts.arcs() {
            let Ok(mut coefficients) = self.state_marking(arc.source) else {
                continue;
            };
            let event = utility.event_index(arc.label)?;
            coefficients[self.layout.backward(event)] -= 1;
            self.system.add_inequality(
                0,
                Relation::GreaterEqual,
                coefficients,
                format!("{} is enabled in {}", arc.label, ts.state_name(arc.source)),
            );
        }
        Ok(())
    }

    fn require_k_bounded(&mut self, k: u32) -> Result<(), UtilityError> {
        let utility = self.utility;
        let ts = utility.transition_system();
        for &state in utility.spanning_tree().reachable_states() {
            let coefficients = self.state_marking(state)?;
            self.system.add_inequality(
                i64::from(k),
                Relation::LessEqual,
                coefficients,
                format!("{} obeys {k}-boundedness", ts.state_name(state)),
            );
        }
        Ok(())
    }

    fn require_plainness(&mut self) {
        for event in self.events() {
            for variable in [self.layout.forward(event), self.layout.backward(event)] {
                let mut coefficients = self.layout.zeros();
                coefficients[variable] = 1;
                self.system.add_inequality(1, Relation::LessEqual, coefficients, "plain");
            }
        }
    }

    /// Only events of a single location consume from the region. Empty if no
    /// event has a location.
    fn require_distributable(&self, locations: &LocationMap) -> Vec<InequalitySystem> {
        locations
            .locations()
            .into_iter()
            .map(|location| {
                let mut coefficients = self.layout.zeros();
                for event in self.events() {
                    if locations.get(event).is_some_and(|other| other != location) {
                        coefficients[self.layout.backward(event)] = 1;
                    }
                }
                let mut system = InequalitySystem::new();
                system.add_inequality(
                    0,
                    Relation::Equal,
                    coefficients,
                    format!("only events at {location} consume"),
                );
                system
            })
            .collect()
    }

    /// Either a single event consumes, or no event decreases the marking.
    fn require_conflict_free(&self) -> Vec<InequalitySystem> {
        let mut alternatives = self
            .events()
            .map(|event| {
                let mut system = InequalitySystem::new();
                system.add_inequality(
                    0,
                    Relation::Equal,
                    self.all_but(event, VariableLayout::backward),
                    format!("only {} consumes", self.utility.event_label(event)),
                );
                system
            })
            .collect::<Vec<_>>();

        let mut system = InequalitySystem::new();
        for event in self.events() {
            let mut coefficients = self.layout.zeros();
            coefficients[self.layout.weight(event)] = 1;
            system.add_inequality(
                0,
                Relation::LessEqual,
                coefficients,
                format!("preset contains postset for {}", self.utility.event_label(event)),
            );
        }
        alternatives.push(system);
        alternatives
    }

    fn require_t_net_postset(&self) -> Vec<InequalitySystem> {
        self.events()
            .map(|event| {
                let mut system = InequalitySystem::new();
                system.add_inequality(
                    0,
                    Relation::Equal,
                    self.all_but(event, VariableLayout::forward),
                    format!("only {} produces", self.utility.event_label(event)),
                );
                system
            })
            .collect()
    }

    fn require_t_net_preset(&self) -> Vec<InequalitySystem> {
        self.events()
            .map(|event| {
                let mut system = InequalitySystem::new();
                system.add_inequality(
                    0,
                    Relation::Equal,
                    self.all_but(event, VariableLayout::backward),
                    format!("only {} consumes", self.utility.event_label(event)),
                );
                system
            })
            .collect()
    }

    fn solve(&self, instance: InequalitySystem) -> Result<Option<Region>, SeparationError> {
        debug!("solving for {}", instance.inequalities()[0]);
        let mut groups = Vec::with_capacity(self.additional.len() + 2);
        groups.push(ConstraintGroup::Required(instance));
        groups.push(ConstraintGroup::Required(self.system.clone()));
        groups.extend(self.additional.iter().cloned());

        let Some(solution) = find_solution(&groups) else {
            debug!("no region");
            return Ok(None);
        };
        let mut region = self.layout.decode(&solution)?;
        debug!("region: {}", region.display_with(self.utility));

        if self.properties.is_pure() {
            region = region.make_pure();
        }
        debug_assert!(
            region.minimal_consistent_marking(self.utility) <= region.initial_marking(),
            "region {region} is inconsistent with solution {solution:?}"
        );
        Ok(Some(region))
    }
}

impl Separation for InequalitySystemSeparation<'_> {
    fn separate_states(&self, state: StateId, other: StateId) -> Result<Option<Region>, SeparationError> {
        if !self.utility.is_reachable(state) || !self.utility.is_reachable(other) {
            return Ok(None);
        }
        // m(state) < m(other); the initial marking cancels out
        let mut coefficients = self.state_marking(state)?;
        for (value, subtrahend) in coefficients.iter_mut().zip(self.state_marking(other)?) {
            *value -= subtrahend;
        }
        let ts = self.utility.transition_system();
        let mut instance = InequalitySystem::new();
        instance.add_inequality(
            -1,
            Relation::LessEqual,
            coefficients,
            format!("separate {} from {}", ts.state_name(state), ts.state_name(other)),
        );
        self.solve(instance)
    }

    fn separate_event(&self, state: StateId, event: &str) -> Result<Option<Region>, SeparationError> {
        if !self.utility.is_reachable(state) {
            return Ok(None);
        }
        let event_id = self.utility.event_index(event)?;
        let mut coefficients = self.state_marking(state)?;
        if self.properties.is_pure() {
            // m(state) + weight(event) < 0
            coefficients[self.layout.weight(event_id)] += 1;
        } else {
            // m(state) < backward(event)
            coefficients[self.layout.backward(event_id)] -= 1;
        }
        let mut instance = InequalitySystem::new();
        instance.add_inequality(
            -1,
            Relation::LessEqual,
            coefficients,
            format!(
                "separate {} from event {event}",
                self.utility.transition_system().state_name(state)
            ),
        );
        self.solve(instance)
    }
}
