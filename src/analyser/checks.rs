use super::error::{Issue, Issues};
use super::variable::{RoleEvent, VariableTracker};
use crate::ast::{Ast, AstKind};
use crate::model::{Model, VariableId};

/// Walks equations looking for the variable of integration, derivatives and
/// states, reporting misuse of any of them.
pub(crate) struct SemanticChecks<'a> {
    model: &'a Model,
    tracker: &'a mut VariableTracker,
    voi: &'a mut Option<VariableId>,
    issues: &'a mut Issues,
}

fn kind_at<'b>(ancestors: &[&'b Ast], depth: usize) -> Option<&'b AstKind> {
    ancestors
        .len()
        .checked_sub(depth)
        .map(|i| &ancestors[i].kind)
}

impl<'a> SemanticChecks<'a> {
    pub fn new(
        model: &'a Model,
        tracker: &'a mut VariableTracker,
        voi: &'a mut Option<VariableId>,
        issues: &'a mut Issues,
    ) -> Self {
        Self {
            model,
            tracker,
            voi,
            issues,
        }
    }

    pub fn check(&mut self, ast: &Ast) {
        let mut ancestors = Vec::new();
        self.visit(ast, &mut ancestors);
    }

    fn visit<'b>(&mut self, ast: &'b Ast, ancestors: &mut Vec<&'b Ast>) {
        let parent = kind_at(ancestors, 1);
        let grandparent = kind_at(ancestors, 2);
        let great_grandparent = kind_at(ancestors, 3);

        match (&ast.kind, parent, grandparent) {
            (AstKind::Ci(variable), Some(AstKind::Bvar), Some(AstKind::Diff)) => {
                self.variable_of_integration(*variable)
            }
            (AstKind::Ci(variable), Some(AstKind::Diff), _) => {
                let id = self.tracker.record_for(self.model, *variable);
                self.tracker.get_mut(id).promote(RoleEvent::Differentiated);
            }
            (AstKind::Cn(value), Some(AstKind::Degree), Some(AstKind::Bvar))
                if great_grandparent == Some(&AstKind::Diff) =>
            {
                if value.trim().parse::<f64>().ok() != Some(1.0) {
                    let diff = ancestors[ancestors.len() - 3];
                    if let Some(variable) = diff.right().and_then(|r| r.variable()) {
                        let variable = self.model.variable(variable);
                        self.issues.push(Issue::generator(format!(
                            "The differential equation for variable '{}' in component '{}' of model '{}' must be of the first order.",
                            variable.name(),
                            self.model.component(variable.component()).name(),
                            self.model.name()
                        )));
                    }
                }
            }
            _ => {}
        }

        ancestors.push(ast);
        if let Some(left) = ast.left() {
            self.visit(left, ancestors);
        }
        if let Some(right) = ast.right() {
            self.visit(right, ancestors);
        }
        ancestors.pop();
    }

    fn variable_of_integration(&mut self, variable: VariableId) {
        // the role is set even when the variable is rejected below, so it is
        // not also reported as being of unknown type
        let id = self.tracker.record_for(self.model, variable);
        self.tracker.get_mut(id).promote(RoleEvent::BoundVariable);

        match *self.voi {
            None => {
                if self.model.variable(variable).has_initial_value() {
                    self.issues.push(Issue::generator(format!(
                        "{} cannot be both a variable of integration and initialised.",
                        self.model.describe_variable(variable)
                    )));
                } else {
                    *self.voi = Some(variable);
                }
            }
            Some(voi) if !self.model.is_equivalent(variable, voi) => {
                let voi = self.model.variable(voi);
                let other = self.model.variable(variable);
                self.issues.push(Issue::generator(format!(
                    "Variable '{}' in component '{}' of model '{}' and variable '{}' in component '{}' of model '{}' cannot both be a variable of integration.",
                    voi.name(),
                    self.model.component(voi.component()).name(),
                    self.model.name(),
                    other.name(),
                    self.model.component(other.component()).name(),
                    self.model.name()
                )));
            }
            Some(_) => {}
        }
    }
}
