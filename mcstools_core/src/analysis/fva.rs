//! Flux variability analysis
use indexmap::IndexMap;
use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::analysis::AnalysisError;
use crate::metabolic_model::model::Model;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::clarabel::ClarabelSolver;
use crate::optimize::solvers::Solver;

const OBJECTIVE_CONSTRAINT: &str = "fva_objective";

/// Feasible flux range of a reaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxRange {
    pub minimum: f64,
    pub maximum: f64,
}

impl FluxRange {
    /// Whether no flux other than zero (within `tolerance`) is feasible
    pub fn is_blocked(&self, tolerance: f64) -> bool {
        self.minimum.abs() < tolerance && self.maximum.abs() < tolerance
    }
}

impl Model {
    /// Minimum and maximum flux of each of `reactions`
    ///
    /// With a `fraction_of_optimum` above zero the model objective is first optimized and
    /// then constrained to at least `fraction_of_optimum` times its optimum (at most, when
    /// minimizing). The per reaction problems are solved on `processes` threads.
    pub fn flux_variability_analysis<S: AsRef<str> + Sync>(
        &self,
        reactions: &[S],
        fraction_of_optimum: f64,
        processes: usize,
    ) -> Result<IndexMap<String, FluxRange>, AnalysisError> {
        if let Some(unknown) = reactions
            .iter()
            .map(AsRef::as_ref)
            .find(|id| !self.reactions.contains_key(*id))
        {
            return Err(AnalysisError::UnknownReaction(unknown.to_string()));
        }

        let solver = ClarabelSolver::default();
        let mut problem = self.to_problem()?;
        if fraction_of_optimum > 0. {
            let optimum = self.flux_balance_analysis(&solver)?.objective_value;
            let (lower_bound, upper_bound) = match self.objective_sense {
                ObjectiveSense::Maximize => (fraction_of_optimum * optimum, f64::INFINITY),
                ObjectiveSense::Minimize => (f64::NEG_INFINITY, fraction_of_optimum * optimum),
            };
            let variables: Vec<&str> = self.objective.keys().map(String::as_str).collect();
            let coefficients: Vec<f64> = self.objective.values().copied().collect();
            problem.add_new_inequality_constraint_by_id(
                OBJECTIVE_CONSTRAINT,
                &variables,
                &coefficients,
                lower_bound,
                upper_bound,
            )?;
            debug!("Objective constrained to [{}, {}]", lower_bound, upper_bound);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(processes.max(1))
            .build()?;
        info!(
            "Running FVA for {} reactions on {} threads",
            reactions.len(),
            processes.max(1)
        );
        let ranges: Vec<FluxRange> = pool.install(|| {
            reactions
                .par_iter()
                .map(|id| flux_range(&problem, id.as_ref(), &solver))
                .collect::<Result<Vec<_>, AnalysisError>>()
        })?;

        Ok(reactions
            .iter()
            .map(|id| id.as_ref().to_string())
            .zip(ranges)
            .collect())
    }
}

fn flux_range<S: Solver + ?Sized>(
    base: &Problem,
    reaction: &str,
    solver: &S,
) -> Result<FluxRange, AnalysisError> {
    let mut problem = base.clone();
    problem.remove_all_objective_terms();
    problem.add_new_linear_objective_term_by_id(reaction, 1.)?;

    let mut extreme = |sense: ObjectiveSense| -> Result<f64, AnalysisError> {
        problem.update_objective_sense(sense);
        let solution = problem.solve(solver)?;
        match solution.objective_value {
            Some(value) if solution.status.is_usable() => Ok(value),
            _ => Err(AnalysisError::NotOptimal(solution.status)),
        }
    };
    let minimum = extreme(ObjectiveSense::Minimize)?;
    let maximum = extreme(ObjectiveSense::Maximize)?;
    Ok(FluxRange { minimum, maximum })
}
