use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use braid_automata::{
    CompositeAutomaton, CompositeLocation, CompositeTransition, Mode, TransitionKey,
};
use braid_core::{Enclosure, FlowSolver, FlowStep, Interval, SpaceError, Truth, Valuation};
use braid_solvers::crossing;
use tracing::{debug, trace};

use super::blocking;
use crate::{
    BlockCause, Branch, BranchId, Configuration, Error, EvolutionTime, Sample, SampleKind,
    Semantics, Sweep, Termination,
};

/// When a transition ignored by a flow-on continuation is watched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Release {
    /// Once the guard is false everywhere, so only a fresh rising edge
    /// enables it.
    WhenFalse,
    /// Once the guard holds everywhere, at which point it fires.
    WhenTrue,
}

/// A branch waiting to be evolved.
#[derive(Debug)]
pub(super) struct Task {
    pub(super) id: BranchId,
    pub(super) parent: Option<BranchId>,
    pub(super) seed: Seed,
}

/// Where a branch starts: the hybrid state after a fork.
#[derive(Debug, Clone)]
pub(super) struct Seed {
    /// Number of the parent's samples shared with this branch.
    pub(super) fork: usize,
    pub(super) samples: Vec<Sample>,
    pub(super) location: CompositeLocation,
    pub(super) state: Enclosure,
    pub(super) time: f64,
    pub(super) transitions: usize,
    pub(super) dismissed: BTreeMap<TransitionKey, Release>,
}

/// A finished branch and the continuations it forked off.
#[derive(Debug)]
pub(super) struct Outcome {
    pub(super) branch: Branch,
    pub(super) children: Vec<Seed>,
}

enum Alternative {
    Jump(usize),
    FlowOn(Vec<(TransitionKey, Release)>),
}

/// Evolves one branch to its termination.
pub(super) struct Runner<'a, S> {
    pub(super) system: &'a CompositeAutomaton,
    pub(super) solver: &'a S,
    pub(super) configuration: &'a Configuration,
    pub(super) budget: EvolutionTime,
    pub(super) semantics: Semantics,
    pub(super) modes: HashMap<CompositeLocation, Arc<Mode>>,
}

impl<S: FlowSolver> Runner<'_, S> {
    fn mode(&mut self, location: &CompositeLocation) -> Result<Arc<Mode>, Error> {
        if let Some(mode) = self.modes.get(location) {
            return Ok(Arc::clone(mode));
        }
        let mode = Arc::new(self.system.mode(location)?);
        self.modes.insert(location.clone(), Arc::clone(&mode));
        Ok(mode)
    }

    pub(super) fn run(mut self, task: Task) -> Result<Outcome, Error> {
        let Task { id, parent, seed } = task;
        let Seed {
            fork,
            mut samples,
            mut location,
            mut state,
            mut time,
            mut transitions,
            mut dismissed,
        } = seed;
        let mut children = Vec::new();

        let termination = loop {
            let mode = self.mode(&location)?;

            let radius = state.radius();
            if radius > self.configuration.maximum_enclosure_radius {
                break Termination::EnclosureTooLarge { radius };
            }
            if time >= self.budget.time {
                break Termination::TimeExpired;
            }
            if transitions >= self.budget.transitions {
                break Termination::StepBudgetExpired;
            }

            let env = mode
                .environment(state.bounds())
                .map_err(|e| Error::eval(&location, e))?;
            let enabled = enabled_transitions(&mode, &env, &mut dismissed)
                .map_err(|e| Error::eval(&location, e))?;
            let invariant = mode
                .invariant()
                .eval(&env)
                .map_err(|e| Error::eval(&location, e))?;

            if !enabled.is_empty() {
                let mut seeds = Vec::new();
                for alternative in self.alternatives(&mode, &enabled, invariant) {
                    let seed = match alternative {
                        Alternative::Jump(index) => {
                            let transition = &mode.transitions()[index];
                            let sample = self.jump(&env, &state, transition, time, transitions)?;
                            Seed {
                                fork: samples.len(),
                                location: sample.location.clone(),
                                state: sample.state.clone(),
                                time,
                                transitions: transitions + 1,
                                dismissed: BTreeMap::new(),
                                samples: vec![sample],
                            }
                        }
                        Alternative::FlowOn(release) => {
                            let mut dismissed = dismissed.clone();
                            dismissed.extend(release);
                            Seed {
                                fork: samples.len(),
                                samples: Vec::new(),
                                location: location.clone(),
                                state: state.clone(),
                                time,
                                transitions,
                                dismissed,
                            }
                        }
                    };
                    seeds.push(seed);
                }
                drop(env);

                let mut seeds = seeds.into_iter();
                if let Some(next) = seeds.next() {
                    samples.extend(next.samples);
                    location = next.location;
                    state = next.state;
                    transitions = next.transitions;
                    dismissed = next.dismissed;
                }
                children.extend(seeds);
                continue;
            }

            if invariant.is_false() {
                break Termination::Blocked(BlockCause::Deadlock);
            }
            if let Some(events) = blocking::unreachable_guards(&mode, &env)
                .map_err(|e| Error::eval(&location, e))?
            {
                break Termination::Blocked(BlockCause::UnreachableGuards { events });
            }
            drop(env);

            let remaining = self.budget.time - time;
            let horizon = self.configuration.maximum_step_size.min(remaining);
            let watch_invariant = invariant.is_true();

            let mut last: Option<(f64, FlowStep)> = None;
            let crossing = crossing::earliest(horizon, &self.configuration.crossing, |s| {
                let step = self
                    .solver
                    .step(&*mode, &state, s)
                    .map_err(|e| Error::solver(&location, time, e))?;
                let hit = triggered(&mode, &dismissed, watch_invariant, &step)
                    .map_err(|e| Error::eval(&location, e))?;
                if hit || s == horizon {
                    last = Some((s, step));
                }
                Ok::<_, Error>(hit)
            })?;

            let duration = crossing.map_or(horizon, |c| c.upper);
            let step = match last {
                Some((s, step)) if s == duration => step,
                _ => self
                    .solver
                    .step(&*mode, &state, duration)
                    .map_err(|e| Error::solver(&location, time, e))?,
            };

            let end = if duration >= remaining {
                self.budget.time
            } else {
                time + duration
            };
            trace!(branch = %id, %location, start = time, end, crossing = crossing.is_some(), "flow");

            let auxiliary = mode
                .auxiliary(step.reached.bounds())
                .map_err(|e| Error::eval(&location, e))?;
            let swept_auxiliary = mode
                .auxiliary(step.swept.bounds())
                .map_err(|e| Error::eval(&location, e))?;
            samples.push(Sample {
                time: end,
                transitions,
                location: location.clone(),
                state: step.reached.clone(),
                auxiliary,
                swept: Some(Sweep {
                    start: time,
                    state: step.swept,
                    auxiliary: swept_auxiliary,
                }),
                kind: SampleKind::Flow,
            });
            time = end;
            state = step.reached;
        };

        debug!(branch = %id, time, transitions, %termination, children = children.len(), "branch finished");

        Ok(Outcome {
            branch: Branch {
                id,
                parent,
                fork,
                samples,
                termination,
            },
            children,
        })
    }

    /// The continuations out of a state with enabled transitions, the first
    /// of which the current branch follows.
    fn alternatives(
        &self,
        mode: &Mode,
        enabled: &[(usize, Truth)],
        invariant: Truth,
    ) -> Vec<Alternative> {
        let transitions = mode.transitions();
        let urgent = |index: usize| transitions[index].is_urgent();
        let firing = enabled
            .iter()
            .find(|&&(index, truth)| urgent(index) && truth.is_true());

        match self.semantics {
            Semantics::Lower => {
                let (index, _) = firing.copied().unwrap_or(enabled[0]);
                vec![Alternative::Jump(index)]
            }
            Semantics::Upper if firing.is_some() => enabled
                .iter()
                .filter(|&&(index, _)| urgent(index))
                .map(|&(index, _)| Alternative::Jump(index))
                .collect(),
            Semantics::Upper => {
                let mut alternatives: Vec<Alternative> = enabled
                    .iter()
                    .map(|&(index, _)| Alternative::Jump(index))
                    .collect();
                if !invariant.is_false() {
                    let release = enabled
                        .iter()
                        .map(|&(index, _)| {
                            let release = if urgent(index) {
                                Release::WhenTrue
                            } else {
                                Release::WhenFalse
                            };
                            (transitions[index].key(), release)
                        })
                        .collect();
                    alternatives.push(Alternative::FlowOn(release));
                }
                alternatives
            }
        }
    }

    /// Applies a transition's reset, evaluating every right-hand side
    /// against the pre-jump valuation.
    fn jump<V>(
        &mut self,
        env: &V,
        state: &Enclosure,
        transition: &CompositeTransition,
        time: f64,
        transitions: usize,
    ) -> Result<Sample, Error>
    where
        V: Valuation<Interval> + ?Sized,
    {
        let space = state.space();
        let mut bounds = state.bounds().to_vec();
        for reset in &transition.reset {
            let value: Interval = reset
                .expr()
                .eval(env)
                .map_err(|e| Error::eval(&transition.target, e))?;
            let index = space
                .index_of(reset.target().name())
                .ok_or_else(|| SpaceError::UnknownVariable {
                    name: reset.target().key().clone(),
                })?;
            bounds[index] = value;
        }
        let next = Enclosure::new(Arc::clone(space), bounds)?;

        let target = self.mode(&transition.target)?;
        let auxiliary = target
            .auxiliary(next.bounds())
            .map_err(|e| Error::eval(&transition.target, e))?;

        debug!(event = %transition.event, time, target = %transition.target, "jump");
        Ok(Sample {
            time,
            transitions: transitions + 1,
            location: transition.target.clone(),
            state: next,
            auxiliary,
            swept: None,
            kind: SampleKind::Jump {
                event: transition.event.clone(),
            },
        })
    }
}

/// Transitions whose guard may hold on `env`, in declaration order.
///
/// Dismissed transitions are skipped, and released once their release
/// condition is met.
fn enabled_transitions<V>(
    mode: &Mode,
    env: &V,
    dismissed: &mut BTreeMap<TransitionKey, Release>,
) -> Result<Vec<(usize, Truth)>, braid_core::EvalError>
where
    V: Valuation<Interval> + ?Sized,
{
    let mut enabled = Vec::new();
    for (index, transition) in mode.transitions().iter().enumerate() {
        let truth = transition.guard.eval(env)?;
        if !dismissed.is_empty() {
            let key = transition.key();
            match dismissed.get(&key) {
                Some(Release::WhenFalse) => {
                    if truth.is_false() {
                        dismissed.remove(&key);
                    }
                    continue;
                }
                Some(Release::WhenTrue) => {
                    if truth == Truth::Indeterminate {
                        continue;
                    }
                    dismissed.remove(&key);
                }
                None => {}
            }
        }
        if truth.is_possible() {
            enabled.push((index, truth));
        }
    }
    Ok(enabled)
}

/// Whether a flow step reaches something that must stop the flow: a watched
/// guard becoming possible, a pending urgent guard holding everywhere, or
/// the invariant failing somewhere.
fn triggered(
    mode: &Mode,
    dismissed: &BTreeMap<TransitionKey, Release>,
    watch_invariant: bool,
    step: &FlowStep,
) -> Result<bool, braid_core::EvalError> {
    let swept = mode.environment(step.swept.bounds())?;
    if watch_invariant && !mode.invariant().eval(&swept)?.is_true() {
        return Ok(true);
    }
    for transition in mode.transitions() {
        let hit = match dismissed.get(&transition.key()) {
            None => transition.guard.eval(&swept)?.is_possible(),
            Some(Release::WhenTrue) => {
                let reached = mode.environment(step.reached.bounds())?;
                transition.guard.eval(&reached)?.is_true()
            }
            Some(Release::WhenFalse) => false,
        };
        if hit {
            return Ok(true);
        }
    }
    Ok(false)
}
