//! Evolution of composite hybrid automata.
//!
//! An [`Evolver`] alternates continuous flow, delegated to a
//! [`FlowSolver`], with discrete transitions:
//!
//! - Flow proceeds in steps of at most the configured maximum size. Within a
//!   step the earliest time at which a watched guard may hold, or the
//!   invariant may fail, is bracketed by bisection and the step is cut there.
//! - Enabled urgent transitions fire immediately and take precedence over
//!   permissive ones.
//! - Under [`Semantics::Upper`] every other enabled continuation, including
//!   flowing on past an enabled permissive transition, becomes a separate
//!   branch. Under [`Semantics::Lower`] only the first enabled transition
//!   fires.
//!
//! Branches are independent once forked. They are evolved round by round:
//! every queued branch runs to termination, optionally in parallel, and the
//! branches it forks off are queued for the next round in a deterministic
//! order.

mod blocking;
mod runner;

use std::collections::{BTreeMap, HashMap};

use braid_automata::CompositeAutomaton;
use braid_core::{FlowSolver, Observer};
use rayon::prelude::*;
use tracing::{debug, instrument};

use runner::{Outcome, Runner, Seed, Task};

use crate::{
    Branch, BranchId, Configuration, Error, EvolutionTime, HybridSet, Orbit, Sample, SampleKind,
    Semantics, orbit::Status,
};

/// Reported to an observer as each branch finishes.
#[derive(Debug, Clone, Copy)]
pub struct Progress<'a> {
    /// Zero-based round in which the branch was evolved.
    pub round: usize,
    pub branch: &'a Branch,
}

/// Observer actions that alter the evolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop before evolving any further rounds.
    StopEarly,
}

/// Evolves initial sets of a composite automaton.
#[derive(Debug)]
pub struct Evolver<'a, S> {
    system: &'a CompositeAutomaton,
    solver: S,
    configuration: Configuration,
}

impl<'a, S: FlowSolver> Evolver<'a, S> {
    /// Creates an evolver for `system`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn new(
        system: &'a CompositeAutomaton,
        solver: S,
        configuration: Configuration,
    ) -> Result<Self, Error> {
        configuration
            .validate()
            .map_err(|reason| Error::InvalidConfig { reason })?;
        Ok(Self {
            system,
            solver,
            configuration,
        })
    }

    #[must_use]
    pub fn system(&self) -> &CompositeAutomaton {
        self.system
    }

    #[must_use]
    pub fn solver(&self) -> &S {
        &self.solver
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Evolves `initial` within the `time` budget.
    ///
    /// # Errors
    ///
    /// Fails if the budget or initial set is invalid, a reachable location
    /// has conflicting dynamics, an expression cannot be evaluated, the flow
    /// solver fails, or the orbit exceeds the branch limit.
    pub fn orbit(
        &self,
        initial: &HybridSet,
        time: EvolutionTime,
        semantics: Semantics,
    ) -> Result<Orbit, Error> {
        self.orbit_observed(initial, time, semantics, ())
    }

    /// Like [`orbit`](Self::orbit), reporting each finished branch to
    /// `observer`.
    ///
    /// # Errors
    ///
    /// See [`orbit`](Self::orbit).
    #[instrument(skip_all, fields(time = time.time, transitions = time.transitions, ?semantics))]
    pub fn orbit_observed<O>(
        &self,
        initial: &HybridSet,
        time: EvolutionTime,
        semantics: Semantics,
        mut observer: O,
    ) -> Result<Orbit, Error>
    where
        O: for<'b> Observer<Progress<'b>, Action>,
    {
        if !time.time.is_finite() || time.time < 0.0 {
            return Err(Error::InvalidTime { time: time.time });
        }

        let (location, state) = initial.resolve(self.system)?;
        let root_mode = self.system.mode(&location)?;
        let auxiliary = root_mode
            .auxiliary(state.bounds())
            .map_err(|e| Error::eval(&location, e))?;

        let root = Sample {
            time: 0.0,
            transitions: 0,
            location: location.clone(),
            state: state.clone(),
            auxiliary,
            swept: None,
            kind: SampleKind::Initial,
        };
        let mut queue = vec![Task {
            id: BranchId(0),
            parent: None,
            seed: Seed {
                fork: 0,
                samples: vec![root],
                location,
                state,
                time: 0.0,
                transitions: 0,
                dismissed: BTreeMap::new(),
            },
        }];

        let mut branches: Vec<Branch> = Vec::new();
        let mut created = 1;
        let mut round = 0;
        let mut status = Status::Complete;

        while !queue.is_empty() {
            debug!(round, branches = queue.len(), "evolving round");
            let outcomes = self.run_round(std::mem::take(&mut queue), time, semantics)?;

            for Outcome { branch, children } in outcomes {
                for seed in children {
                    if created >= self.configuration.maximum_branches {
                        return Err(Error::TooManyBranches {
                            limit: self.configuration.maximum_branches,
                        });
                    }
                    queue.push(Task {
                        id: BranchId(created),
                        parent: Some(branch.id),
                        seed,
                    });
                    created += 1;
                }
                if let Some(Action::StopEarly) = observer.observe(&Progress {
                    round,
                    branch: &branch,
                }) {
                    status = Status::StoppedEarly;
                }
                branches.push(branch);
            }

            if status == Status::StoppedEarly {
                debug!(round, dropped = queue.len(), "stopped by observer");
                break;
            }
            round += 1;
        }

        debug!(branches = branches.len(), ?status, "orbit complete");
        Ok(Orbit::new(branches, status))
    }

    fn run_round(
        &self,
        tasks: Vec<Task>,
        budget: EvolutionTime,
        semantics: Semantics,
    ) -> Result<Vec<Outcome>, Error> {
        let run = |task: Task| {
            Runner {
                system: self.system,
                solver: &self.solver,
                configuration: &self.configuration,
                budget,
                semantics,
                modes: HashMap::new(),
            }
            .run(task)
        };

        if self.configuration.parallel && tasks.len() > 1 {
            tasks.into_par_iter().map(run).collect()
        } else {
            tasks.into_iter().map(run).collect()
        }
    }
}

/// Evolves `initial` through `system` with a fresh [`Evolver`].
///
/// # Errors
///
/// See [`Evolver::new`] and [`Evolver::orbit`].
pub fn evolve<S: FlowSolver>(
    system: &CompositeAutomaton,
    solver: S,
    configuration: Configuration,
    initial: &HybridSet,
    time: EvolutionTime,
    semantics: Semantics,
) -> Result<Orbit, Error> {
    Evolver::new(system, solver, configuration)?.orbit(initial, time, semantics)
}
