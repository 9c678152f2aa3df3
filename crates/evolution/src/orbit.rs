//! The result of an evolution: a tree of branches.

mod branch;
mod sample;

pub use branch::{BlockCause, Branch, BranchId, Termination};
pub use sample::{Sample, SampleKind, Sweep};

use std::ops::RangeInclusive;

use braid_core::Interval;

/// Whether the evolution explored everything within its budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Complete,
    /// An observer stopped the evolution; queued branches were dropped.
    StoppedEarly,
}

/// The tree of branches produced by evolving an initial set.
///
/// Branches are stored in creation order, so a parent always precedes its
/// children and the first branch is the root.
#[derive(Debug, Clone, PartialEq)]
pub struct Orbit {
    branches: Vec<Branch>,
    status: Status,
}

impl Orbit {
    pub(crate) fn new(branches: Vec<Branch>, status: Status) -> Self {
        Self { branches, status }
    }

    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    #[must_use]
    pub fn branches(&self) -> &[Branch] {
        &self.branches
    }

    #[must_use]
    pub fn branch(&self, id: BranchId) -> Option<&Branch> {
        self.branches.get(id.0)
    }

    /// Every stored sample, branch by branch; shared prefixes appear once.
    pub fn samples(&self) -> impl Iterator<Item = &Sample> + Clone + '_ {
        self.branches.iter().flat_map(Branch::samples)
    }

    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.branches.iter().map(|b| b.samples.len()).sum()
    }

    /// The full history of a branch from the initial set, including the
    /// prefix it shares with its ancestors.
    ///
    /// Returns `None` for an unknown id.
    pub fn lineage(&self, id: BranchId) -> Option<impl Iterator<Item = &Sample> + Clone + '_> {
        let segments = self.segments(id)?;
        Some(segments.into_iter().flatten())
    }

    fn segments(&self, id: BranchId) -> Option<Vec<&[Sample]>> {
        let branch = self.branch(id)?;
        let mut segments = match branch.parent {
            Some(parent) => {
                let mut segments = self.segments(parent)?;
                let own = segments.pop().unwrap_or(&[]);
                segments.push(&own[..branch.fork.min(own.len())]);
                segments
            }
            None => Vec::new(),
        };
        segments.push(&branch.samples);
        Some(segments)
    }

    /// The last sample of every branch's lineage, with its termination.
    pub fn final_samples(&self) -> impl Iterator<Item = (&Branch, &Sample)> + '_ {
        self.branches
            .iter()
            .filter_map(|branch| Some((branch, self.lineage(branch.id)?.last()?)))
    }

    /// Hull of every value `name` takes over the time window, across all
    /// branches.
    ///
    /// Flow samples contribute their swept set when their step overlaps the
    /// window. Returns `None` if no sample covers the window or `name` is
    /// unknown.
    #[must_use]
    pub fn range(&self, name: &str, window: RangeInclusive<f64>) -> Option<Interval> {
        let (from, to) = (*window.start(), *window.end());
        self.samples()
            .filter_map(|sample| {
                let (start, end) = sample.span();
                if end < from || start > to {
                    return None;
                }
                if start == end {
                    sample.get(name)
                } else {
                    sample.swept_get(name)
                }
            })
            .reduce(|a, b| a.hull(&b))
    }

    /// Times of every jump on `event`, across all branches, in ascending order.
    #[must_use]
    pub fn jump_times(&self, event: &str) -> Vec<f64> {
        let mut times: Vec<f64> = self
            .samples()
            .filter(|s| matches!(&s.kind, SampleKind::Jump { event: e } if e.name() == event))
            .map(|s| s.time)
            .collect();
        times.sort_by(f64::total_cmp);
        times
    }

    /// Terminations of all branches, in branch order.
    pub fn terminations(&self) -> impl Iterator<Item = &Termination> + '_ {
        self.branches.iter().map(|b| &b.termination)
    }
}
