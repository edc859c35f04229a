use log::{debug, info, warn};

pub mod checks;
pub mod equation;
pub mod error;
pub mod variable;

pub use equation::{Counters, Equation, EquationType};
pub use error::{Issue, IssueKind, Issues};
pub use variable::{RecordId, RoleEvent, VariableRecord, VariableRole, VariableTracker};

use crate::ast::MathFunctions;
use crate::model::{ComponentId, Model, VariableId};
use crate::parser::mathml::parse_math;
use checks::SemanticChecks;

/// The outcome of analysing a model: a role for every variable and a
/// resolution order for every equation, or the issues that prevented it.
#[derive(Debug, Clone, Default)]
pub struct Analysis {
    pub tracker: VariableTracker,
    pub equations: Vec<Equation>,
    pub functions: MathFunctions,
    pub voi: Option<VariableId>,
    pub issues: Issues,
}

impl Analysis {
    /// Resolved equations, in resolution order.
    pub fn resolved_equations(&self) -> Vec<&Equation> {
        let mut ret = self
            .equations
            .iter()
            .filter(|e| e.is_resolved())
            .collect::<Vec<_>>();
        ret.sort_by_key(|e| e.order());
        ret
    }

    pub fn record_of(&self, model: &Model, variable: VariableId) -> Option<&VariableRecord> {
        self.tracker.find(model, variable).map(|id| self.tracker.get(id))
    }
}

struct Analyser<'a> {
    model: &'a Model,
    analysis: Analysis,
}

impl<'a> Analyser<'a> {
    fn new(model: &'a Model) -> Self {
        Self {
            model,
            analysis: Analysis::default(),
        }
    }

    fn issues(&self) -> &Issues {
        &self.analysis.issues
    }

    // Track each variable of the component. Of a set of equivalent variables,
    // at most one may be initialised, and that one represents the set.
    fn register_variables(&mut self, component: ComponentId) {
        let model = self.model;
        for &variable in model.component(component).variables() {
            let id = self.analysis.tracker.record_for(model, variable);
            let record = self.analysis.tracker.get_mut(id);
            let tracked = record.variable();
            let initialised = model.variable(variable).has_initial_value();
            if initialised && !model.variable(tracked).has_initial_value() {
                record.set_variable(model, variable);
            } else if initialised && tracked != variable {
                let tracked = model.variable(tracked);
                self.analysis.issues.push(
                    Issue::generator(format!(
                        "{} and variable '{}' in component '{}' of model '{}' are equivalent and cannot therefore both be initialised (to '{}' and '{}').",
                        model.describe_variable(variable),
                        tracked.name(),
                        model.component(tracked.component()).name(),
                        model.name(),
                        model.variable(variable).initial_value().unwrap_or_default(),
                        tracked.initial_value().unwrap_or_default()
                    ))
                    .with_component(component),
                );
            }
        }
    }

    fn translate(&mut self, component: ComponentId) {
        let model = self.model;
        let parsed = parse_math(model, component);
        self.analysis.issues.extend(parsed.issues);
        self.analysis.functions.extend(&parsed.functions);
        for equation in parsed.equations {
            let tracker = &mut self.analysis.tracker;
            let variables = equation
                .variables
                .iter()
                .map(|v| tracker.record_for(model, *v))
                .collect::<Vec<_>>();
            let ode_variables = equation
                .ode_variables
                .iter()
                .map(|v| tracker.record_for(model, *v))
                .collect::<Vec<_>>();
            self.analysis.equations.push(Equation::new(
                equation.ast,
                component,
                variables,
                ode_variables,
            ));
        }
    }

    fn check_semantics(&mut self) {
        let analysis = &mut self.analysis;
        let mut checks = SemanticChecks::new(
            self.model,
            &mut analysis.tracker,
            &mut analysis.voi,
            &mut analysis.issues,
        );
        for equation in &analysis.equations {
            checks.check(equation.ast());
        }
    }

    // Constants need no equation, so they are numbered first, in the order
    // they were tracked.
    fn index_constants(&mut self) -> usize {
        let mut count = 0;
        for record in self.analysis.tracker.iter_mut() {
            if record.role() == VariableRole::Constant {
                record.set_index(count);
                count += 1;
            }
        }
        count
    }

    fn resolve(&mut self, mut counters: Counters) {
        let analysis = &mut self.analysis;
        for pass in 1.. {
            let mut progress = 0;
            for equation in analysis.equations.iter_mut() {
                if equation.check(&mut analysis.tracker, &mut counters) {
                    progress += 1;
                }
            }
            debug!("resolver pass {} resolved {} equation(s)", pass, progress);
            if progress == 0 {
                break;
            }
        }
        let unresolved = analysis.equations.len() - counters.resolved();
        if unresolved > 0 {
            warn!("{} equation(s) could not be resolved", unresolved);
        }
    }

    fn check_unresolved(&mut self) {
        let model = self.model;
        for (_, record) in self.analysis.tracker.iter() {
            let problem = match record.role() {
                VariableRole::Unknown => "is of unknown type",
                VariableRole::ShouldBeState => "is used in an ODE, but it is not initialised",
                _ => continue,
            };
            self.analysis.issues.push(Issue::generator(format!(
                "{} {}.",
                model.describe_variable(record.variable()),
                problem
            )));
        }
    }
}

/// Classify every variable of `model` and order its equations.
///
/// Components are visited depth first, a component's own variables and math
/// before those of the components it encapsulates. Each later stage only runs
/// if no issue has been raised so far.
pub fn analyse(model: &Model) -> Analysis {
    let mut analyser = Analyser::new(model);
    let components = model.components_depth_first();
    for &component in &components {
        analyser.register_variables(component);
        analyser.translate(component);
    }
    info!(
        "analysing model '{}': {} component(s), {} equation(s), {} variable(s)",
        model.name(),
        components.len(),
        analyser.analysis.equations.len(),
        analyser.analysis.tracker.len()
    );

    if analyser.issues().is_empty() {
        analyser.check_semantics();
    }
    let constant_count = analyser.index_constants();
    if analyser.issues().is_empty() {
        analyser.resolve(Counters::new(constant_count));
    }
    if analyser.issues().is_empty() {
        analyser.check_unresolved();
    }

    if !analyser.issues().is_empty() {
        info!(
            "model '{}' has {} issue(s)",
            model.name(),
            analyser.issues().len()
        );
    }
    analyser.analysis
}
