use std::fmt;

use log::debug;

use super::variable::{RecordId, VariableRole, VariableTracker};
use crate::ast::Ast;
use crate::model::ComponentId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationType {
    Unknown,
    TrueConstant,
    VariableBasedConstant,
    Rate,
    Algebraic,
}

impl fmt::Display for EquationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            EquationType::Unknown => "unknown",
            EquationType::TrueConstant => "true constant",
            EquationType::VariableBasedConstant => "variable-based constant",
            EquationType::Rate => "rate",
            EquationType::Algebraic => "algebraic",
        };
        write!(f, "{}", name)
    }
}

/// Running counters shared by every equation of a model during resolution.
#[derive(Debug, Clone, Default)]
pub struct Counters {
    equation_order: usize,
    state_index: usize,
    variable_index: usize,
}

impl Counters {
    /// Constants are indexed before resolution starts, so computed variables
    /// are numbered after them.
    pub fn new(constant_count: usize) -> Self {
        Self {
            equation_order: 0,
            state_index: 0,
            variable_index: constant_count,
        }
    }

    fn next_order(&mut self) -> usize {
        self.equation_order += 1;
        self.equation_order
    }

    fn next_state(&mut self) -> usize {
        self.state_index += 1;
        self.state_index - 1
    }

    fn next_variable(&mut self) -> usize {
        self.variable_index += 1;
        self.variable_index - 1
    }

    pub fn resolved(&self) -> usize {
        self.equation_order
    }
}

/// One equation of the model and the variables it still depends on.
#[derive(Debug, Clone)]
pub struct Equation {
    ast: Ast,
    component: ComponentId,
    kind: EquationType,
    order: usize,
    variables: Vec<RecordId>,
    ode_variables: Vec<RecordId>,
    truly_constant: bool,
    variable_based_constant: bool,
    computed: Option<RecordId>,
}

fn push_unique(list: &mut Vec<RecordId>, id: RecordId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

impl Equation {
    pub fn new(
        ast: Ast,
        component: ComponentId,
        variables: impl IntoIterator<Item = RecordId>,
        ode_variables: impl IntoIterator<Item = RecordId>,
    ) -> Self {
        let mut ret = Self {
            ast,
            component,
            kind: EquationType::Unknown,
            order: 0,
            variables: Vec::new(),
            ode_variables: Vec::new(),
            truly_constant: true,
            variable_based_constant: true,
            computed: None,
        };
        for id in variables {
            push_unique(&mut ret.variables, id);
        }
        for id in ode_variables {
            push_unique(&mut ret.ode_variables, id);
        }
        ret
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }
    pub fn component(&self) -> ComponentId {
        self.component
    }
    pub fn kind(&self) -> EquationType {
        self.kind
    }
    /// Position in resolution order, starting at 1, or 0 if unresolved.
    pub fn order(&self) -> usize {
        self.order
    }
    pub fn is_resolved(&self) -> bool {
        self.order != 0
    }
    /// The variable this equation computes, once resolved.
    pub fn computed_variable(&self) -> Option<RecordId> {
        self.computed
    }

    fn remaining(&self) -> Option<RecordId> {
        match (self.variables.as_slice(), self.ode_variables.as_slice()) {
            ([id], []) | ([], [id]) => Some(*id),
            _ => None,
        }
    }

    /// Try to resolve the equation against what is currently known. Returns
    /// whether it was resolved by this call.
    pub fn check(&mut self, tracker: &mut VariableTracker, counters: &mut Counters) -> bool {
        if self.is_resolved() {
            return false;
        }
        // a single variable that already has a role is overconstrained
        if let Some(id) = self.remaining() {
            if tracker.get(id).role() != VariableRole::Unknown {
                return false;
            }
        }

        let has_role = |id: &RecordId| tracker.get(*id).role() != VariableRole::Unknown;
        let has_non_constant_role = |id: &RecordId| {
            !matches!(
                tracker.get(*id).role(),
                VariableRole::Unknown | VariableRole::Constant
            )
        };
        self.truly_constant = self.truly_constant
            && !self.variables.iter().any(has_role)
            && !self.ode_variables.iter().any(has_role);
        self.variable_based_constant = self.variable_based_constant
            && !self.variables.iter().any(has_non_constant_role)
            && !self.ode_variables.iter().any(has_non_constant_role);

        self.variables.retain(|id| !tracker.get(*id).is_known());
        self.ode_variables
            .retain(|id| !tracker.get(*id).is_known_in_derivative());

        let id = match self.remaining() {
            Some(id) => id,
            None => return false,
        };
        let record = tracker.get_mut(id);
        if record.role() == VariableRole::Unknown {
            record.set_role(if self.truly_constant {
                VariableRole::ComputedTrueConstant
            } else if self.variable_based_constant {
                VariableRole::ComputedVariableBasedConstant
            } else {
                VariableRole::Algebraic
            });
        }
        self.kind = match record.role() {
            VariableRole::State => EquationType::Rate,
            VariableRole::ComputedTrueConstant => EquationType::TrueConstant,
            VariableRole::ComputedVariableBasedConstant => EquationType::VariableBasedConstant,
            VariableRole::Algebraic => EquationType::Algebraic,
            _ => return false,
        };
        let index = if self.kind == EquationType::Rate {
            counters.next_state()
        } else {
            counters.next_variable()
        };
        record.set_index(index);
        record.mark_computed();
        self.order = counters.next_order();
        self.computed = Some(id);
        debug!(
            "equation {} computes a {} variable with index {}",
            self.order,
            record.role(),
            index
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::{Counters, Equation, EquationType};
    use crate::analyser::variable::{RoleEvent, VariableRole, VariableTracker};
    use crate::ast::{Ast, AstKind};
    use crate::model::Model;

    #[test]
    fn resolves_in_dependency_order() {
        let mut model = Model::new("m");
        let c = model.add_component("c");
        let a = model.add_variable(c, "a", "dimensionless");
        let b = model.add_variable(c, "b", "dimensionless");
        let k = model.add_variable(c, "k", "dimensionless");
        model.set_initial_value(k, "2");

        let mut tracker = VariableTracker::new();
        let ra = tracker.record_for(&model, a);
        let rb = tracker.record_for(&model, b);
        let rk = tracker.record_for(&model, k);
        tracker.get_mut(rk).set_index(0);

        // b = a * k, then a = 3
        let ast = Ast::new(AstKind::Pi);
        let mut b_eq = Equation::new(ast.clone(), c, [rb, ra, rk], []);
        let mut a_eq = Equation::new(ast, c, [ra], []);
        let mut counters = Counters::new(1);

        assert!(!b_eq.check(&mut tracker, &mut counters));
        assert!(a_eq.check(&mut tracker, &mut counters));
        assert_eq!(a_eq.kind(), EquationType::TrueConstant);
        assert_eq!(a_eq.order(), 1);
        assert_eq!(tracker.get(ra).index(), Some(1));

        assert!(b_eq.check(&mut tracker, &mut counters));
        assert_eq!(b_eq.kind(), EquationType::Algebraic);
        assert_eq!(b_eq.order(), 2);
        assert_eq!(b_eq.computed_variable(), Some(rb));
        assert_eq!(tracker.get(rb).index(), Some(2));

        // resolved equations are left alone
        assert!(!b_eq.check(&mut tracker, &mut counters));
        assert_eq!(counters.resolved(), 2);
    }

    #[test]
    fn constant_only_equation_is_variable_based() {
        let mut model = Model::new("m");
        let c = model.add_component("c");
        let a = model.add_variable(c, "a", "dimensionless");
        let k = model.add_variable(c, "k", "dimensionless");
        model.set_initial_value(k, "2");

        let mut tracker = VariableTracker::new();
        let ra = tracker.record_for(&model, a);
        let rk = tracker.record_for(&model, k);
        let mut equation = Equation::new(Ast::new(AstKind::Pi), c, [ra, rk], []);
        let mut counters = Counters::new(1);
        assert!(equation.check(&mut tracker, &mut counters));
        assert_eq!(equation.kind(), EquationType::VariableBasedConstant);
        assert_eq!(
            tracker.get(ra).role(),
            VariableRole::ComputedVariableBasedConstant
        );
    }

    #[test]
    fn rate_equation() {
        let mut model = Model::new("m");
        let c = model.add_component("c");
        let t = model.add_variable(c, "t", "second");
        let x = model.add_variable(c, "x", "dimensionless");
        model.set_initial_value(x, "1");

        let mut tracker = VariableTracker::new();
        let rt = tracker.record_for(&model, t);
        let rx = tracker.record_for(&model, x);
        tracker.get_mut(rt).promote(RoleEvent::BoundVariable);
        tracker.get_mut(rx).promote(RoleEvent::Differentiated);

        // dx/dt = x
        let mut equation = Equation::new(Ast::new(AstKind::Pi), c, [rx], [rt, rx]);
        let mut counters = Counters::new(0);
        assert!(equation.check(&mut tracker, &mut counters));
        assert_eq!(equation.kind(), EquationType::Rate);
        assert_eq!(tracker.get(rx).index(), Some(0));
        assert!(tracker.get(rx).is_computed());
    }

    #[test]
    fn overconstrained_equation_is_skipped() {
        let mut model = Model::new("m");
        let c = model.add_component("c");
        let k = model.add_variable(c, "k", "dimensionless");
        model.set_initial_value(k, "2");

        let mut tracker = VariableTracker::new();
        let rk = tracker.record_for(&model, k);
        let mut equation = Equation::new(Ast::new(AstKind::Pi), c, [rk], []);
        let mut counters = Counters::new(1);
        assert!(!equation.check(&mut tracker, &mut counters));
        assert!(!equation.is_resolved());
    }
}
