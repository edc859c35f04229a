use std::collections::HashMap;
use std::fmt;

use crate::model::{Model, VariableId};

/// What a variable turns out to be once the model has been analysed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableRole {
    Unknown,
    /// Differentiated, but not (yet) known to have an initial value.
    ShouldBeState,
    VariableOfIntegration,
    State,
    /// Has an initial value and is never computed.
    Constant,
    /// Computed from literals only.
    ComputedTrueConstant,
    /// Computed from constants.
    ComputedVariableBasedConstant,
    Algebraic,
}

/// Facts learned about a variable while walking a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleEvent {
    HasInitialValue,
    Differentiated,
    BoundVariable,
}

impl VariableRole {
    /// The role after `event`. Roles only ever move towards more specific
    /// ones, so the order in which facts are learned does not matter.
    pub fn promote(self, event: RoleEvent) -> Self {
        match (self, event) {
            (_, RoleEvent::BoundVariable) => VariableRole::VariableOfIntegration,
            (VariableRole::Unknown, RoleEvent::HasInitialValue) => VariableRole::Constant,
            (VariableRole::ShouldBeState, RoleEvent::HasInitialValue) => VariableRole::State,
            (VariableRole::Unknown, RoleEvent::Differentiated) => VariableRole::ShouldBeState,
            (VariableRole::Constant, RoleEvent::Differentiated) => VariableRole::State,
            (role, _) => role,
        }
    }

    pub fn is_computed_constant(&self) -> bool {
        matches!(
            self,
            VariableRole::ComputedTrueConstant | VariableRole::ComputedVariableBasedConstant
        )
    }

    /// Roles stored in the generated `variables` array.
    pub fn is_variable(&self) -> bool {
        matches!(self, VariableRole::Constant | VariableRole::Algebraic) || self.is_computed_constant()
    }
}

impl fmt::Display for VariableRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            VariableRole::Unknown => "unknown",
            VariableRole::ShouldBeState => "should be state",
            VariableRole::VariableOfIntegration => "variable of integration",
            VariableRole::State => "state",
            VariableRole::Constant => "constant",
            VariableRole::ComputedTrueConstant => "computed true constant",
            VariableRole::ComputedVariableBasedConstant => "computed variable-based constant",
            VariableRole::Algebraic => "algebraic",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(usize);

/// The analysis state of one set of equivalent variables. `variable` is the
/// member that represents the set; it is the initialised one, if any.
#[derive(Debug, Clone)]
pub struct VariableRecord {
    variable: VariableId,
    role: VariableRole,
    index: Option<usize>,
    computed: bool,
}

impl VariableRecord {
    fn new(model: &Model, variable: VariableId) -> Self {
        let mut ret = Self {
            variable,
            role: VariableRole::Unknown,
            index: None,
            computed: false,
        };
        ret.set_variable(model, variable);
        ret
    }

    pub fn variable(&self) -> VariableId {
        self.variable
    }
    pub fn role(&self) -> VariableRole {
        self.role
    }
    pub fn index(&self) -> Option<usize> {
        self.index
    }
    pub fn is_computed(&self) -> bool {
        self.computed
    }

    /// Make `variable` the representative of this record, learning from its
    /// initial value.
    pub fn set_variable(&mut self, model: &Model, variable: VariableId) {
        self.variable = variable;
        if model.variable(variable).has_initial_value() {
            self.promote(RoleEvent::HasInitialValue);
        }
    }

    pub fn promote(&mut self, event: RoleEvent) {
        self.role = self.role.promote(event);
    }

    pub(crate) fn set_role(&mut self, role: VariableRole) {
        self.role = role;
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = Some(index);
    }

    pub(crate) fn mark_computed(&mut self) {
        self.computed = true;
    }

    /// Whether the value is available to an equation that uses the variable
    /// outside of a derivative.
    pub fn is_known(&self) -> bool {
        self.computed
            || matches!(
                self.role,
                VariableRole::VariableOfIntegration | VariableRole::State | VariableRole::Constant
            )
    }

    /// Same as [`VariableRecord::is_known`], for a variable used in a
    /// derivative: a state is only known there once its rate is computed.
    pub fn is_known_in_derivative(&self) -> bool {
        self.computed || self.role == VariableRole::VariableOfIntegration
    }
}

/// Maps model variables to records, giving all variables of an equivalence
/// set the same record.
#[derive(Debug, Clone, Default)]
pub struct VariableTracker {
    records: Vec<VariableRecord>,
    lookup: HashMap<VariableId, RecordId>,
}

impl VariableTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, model: &Model, variable: VariableId) -> Option<RecordId> {
        if let Some(id) = self.lookup.get(&variable) {
            return Some(*id);
        }
        self.records
            .iter()
            .position(|r| model.is_equivalent(variable, r.variable))
            .map(RecordId)
    }

    /// The record for `variable`, created if none of its equivalent variables
    /// has one yet.
    pub fn record_for(&mut self, model: &Model, variable: VariableId) -> RecordId {
        let id = match self.find(model, variable) {
            Some(id) => id,
            None => {
                self.records.push(VariableRecord::new(model, variable));
                RecordId(self.records.len() - 1)
            }
        };
        self.lookup.insert(variable, id);
        id
    }

    pub fn get(&self, id: RecordId) -> &VariableRecord {
        &self.records[id.0]
    }

    pub fn get_mut(&mut self, id: RecordId) -> &mut VariableRecord {
        &mut self.records[id.0]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in the order they were created.
    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &VariableRecord)> {
        self.records.iter().enumerate().map(|(i, r)| (RecordId(i), r))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut VariableRecord> {
        self.records.iter_mut()
    }

    pub fn count_role(&self, role: VariableRole) -> usize {
        self.records.iter().filter(|r| r.role == role).count()
    }
}
