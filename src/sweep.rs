use crate::error::{InputError, SweepError};
use crate::metric::{Element, Metric, MetricValue};
use crate::powerflow::{solve, PowerFlowSolver};
use crate::session::Session;
use derive_builder::Builder;
use std::collections::BTreeMap;

/// Sweep options.
#[derive(Debug, Clone, Builder)]
#[builder(default)]
pub struct SweepOpt {
    /// Number of load multipliers sampled. Default value is 200.
    pub points: usize,

    /// First load multiplier. Default value is 1.0.
    pub lam_min: f64,

    /// Last load multiplier. Defaults to the network's registered maximum.
    pub lam_max: Option<f64>,

    /// Bisection steps between the last converged and the first failed
    /// multiplier. Default value is 0 (no refinement).
    pub refine: usize,

    /// Metrics evaluated at every converged level. Default is all four.
    pub metrics: Vec<Metric>,
}

impl Default for SweepOpt {
    fn default() -> Self {
        Self {
            points: 200,
            lam_min: 1.0,
            lam_max: None,
            refine: 0,
            metrics: Metric::ALL.to_vec(),
        }
    }
}

impl SweepOpt {
    /// Evenly spaced load multipliers from `lam_min` to `lam_max`, falling
    /// back to `default_max` for the upper bound.
    pub fn multipliers(&self, default_max: f64) -> Result<Vec<f64>, InputError> {
        if self.points < 2 {
            return Err(InputError::Points(self.points));
        }
        let (min, max) = (self.lam_min, self.lam_max.unwrap_or(default_max));
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && max > min) {
            return Err(InputError::Range { min, max });
        }
        Ok(linspace(min, max, self.points))
    }
}

/// `n` evenly spaced values from `start` to `stop`, both inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { stop } else { start + step * i as f64 })
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepState {
    /// Solving and evaluating the current multiplier.
    Running,
    /// The last multiplier converged and its metrics were appended.
    Converged,
    /// A multiplier failed to converge.
    Collapsed,
    /// No further multipliers will be solved.
    Finished,
}

/// Values of one metric at every converged level, in increasing
/// multiplier order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    metric: Metric,
    points: Vec<(f64, MetricValue)>,
}

impl MetricSeries {
    fn new(metric: Metric) -> Self {
        Self {
            metric,
            points: Vec::new(),
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn points(&self) -> &[(f64, MetricValue)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Critical value at every level: the maximum for the L-index and the
    /// minimum for the others. Levels without elements are skipped.
    pub fn critical_curve(&self) -> Vec<(f64, f64)> {
        let extremum = self.metric.extremum();
        self.points
            .iter()
            .filter_map(|(lam, v)| v.critical(extremum).map(|(c, _)| (*lam, c)))
            .collect()
    }
}

/// Solver diagnostics and critical elements of one converged level.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelRecord {
    pub load_multiplier: f64,
    pub iterations: usize,
    pub min_singular_value: Option<f64>,
    pub critical: BTreeMap<Metric, (f64, Element)>,
}

/// Where the sweep stopped converging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Collapse {
    /// Empirical collapse point, `None` if the first multiplier failed.
    pub last_converged: Option<f64>,
    pub first_failed: f64,
    /// Bracket narrowed by bisection, when refinement was requested.
    pub refined: Option<(f64, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub levels: Vec<LevelRecord>,
    pub series: BTreeMap<Metric, MetricSeries>,
    /// `None` if every multiplier converged.
    pub collapse: Option<Collapse>,
}

impl SweepOutcome {
    pub fn series(&self, metric: Metric) -> Option<&MetricSeries> {
        self.series.get(&metric)
    }
}

/// Sweep re-solves the power flow at increasing load multipliers until the
/// first non-convergence, evaluating the enabled metrics at every
/// converged level.
pub struct Sweep<'a> {
    session: &'a Session,
    solver: &'a dyn PowerFlowSolver,
    multipliers: Vec<f64>,
    metrics: Vec<Metric>,
    refine: usize,
    state: SweepState,
}

impl<'a> Sweep<'a> {
    pub fn new(
        session: &'a Session,
        solver: &'a dyn PowerFlowSolver,
        multipliers: Vec<f64>,
        metrics: &[Metric],
        refine: usize,
    ) -> Result<Self, InputError> {
        if multipliers.is_empty()
            || multipliers.iter().any(|lam| !lam.is_finite() || *lam < 0.0)
            || multipliers.windows(2).any(|w| w[1] <= w[0])
        {
            return Err(InputError::Multipliers);
        }
        let mut metrics = metrics.to_vec();
        metrics.sort();
        metrics.dedup();
        if metrics.is_empty() {
            return Err(InputError::NoMetrics);
        }
        Ok(Self {
            session,
            solver,
            multipliers,
            metrics,
            refine,
            state: SweepState::Running,
        })
    }

    pub fn state(&self) -> SweepState {
        self.state
    }

    /// Runs the sweep to completion. Non-convergence ends the sweep and is
    /// recorded in the outcome; topology errors abort it.
    pub fn run(&mut self) -> Result<SweepOutcome, SweepError> {
        let mut series: BTreeMap<Metric, MetricSeries> =
            self.metrics.iter().map(|&m| (m, MetricSeries::new(m))).collect();
        let mut levels = Vec::new();
        let mut collapse = None;

        for &lam in self.multipliers.iter() {
            self.state = SweepState::Running;
            let pf = solve(self.session, self.solver, lam);

            if !pf.converged {
                self.state = SweepState::Collapsed;
                let last_converged = levels.last().map(|l: &LevelRecord| l.load_multiplier);
                log::info!(
                    "'{}' collapsed: last converged {}, first failed {}",
                    self.session.network().name,
                    last_converged.map_or("none".to_string(), |l| l.to_string()),
                    lam
                );
                collapse = Some(Collapse {
                    last_converged,
                    first_failed: lam,
                    refined: last_converged
                        .filter(|_| self.refine > 0)
                        .map(|lo| self.bisect(lo, lam)),
                });
                break;
            }

            let mut critical = BTreeMap::new();
            for &metric in self.metrics.iter() {
                let value = metric.evaluate(&pf, self.session)?;
                log::trace!("{} at {}: {}", metric, lam, value);
                if let Some(c) = value.critical(metric.extremum()) {
                    critical.insert(metric, c);
                }
                if let Some(s) = series.get_mut(&metric) {
                    s.points.push((lam, value));
                }
            }
            levels.push(LevelRecord {
                load_multiplier: lam,
                iterations: pf.iterations,
                min_singular_value: pf.min_singular_value,
                critical,
            });
            self.state = SweepState::Converged;
            log::debug!("load multiplier {} converged in {} iterations", lam, pf.iterations);
        }
        self.state = SweepState::Finished;

        Ok(SweepOutcome {
            levels,
            series,
            collapse,
        })
    }

    // Narrows [lo, hi] with `refine` bisection steps. No metrics are
    // evaluated.
    fn bisect(&self, mut lo: f64, mut hi: f64) -> (f64, f64) {
        for step in 0..self.refine {
            let mid = 0.5 * (lo + hi);
            if solve(self.session, self.solver, mid).converged {
                lo = mid;
            } else {
                hi = mid;
            }
            log::debug!("refinement step {}: collapse within [{}, {}]", step + 1, lo, hi);
        }
        (lo, hi)
    }
}
