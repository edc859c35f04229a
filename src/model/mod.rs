use std::collections::{HashSet, VecDeque};
use std::fmt;

pub mod reader;
pub use reader::parse_model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableId(usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    units: String,
    initial_value: Option<String>,
    component: ComponentId,
    equivalences: Vec<VariableId>,
}

impl Variable {
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn units(&self) -> &str {
        &self.units
    }
    pub fn initial_value(&self) -> Option<&str> {
        self.initial_value.as_deref()
    }
    pub fn has_initial_value(&self) -> bool {
        self.initial_value.is_some()
    }
    pub fn component(&self) -> ComponentId {
        self.component
    }
    /// Variables this one was directly declared equivalent to.
    pub fn equivalences(&self) -> &[VariableId] {
        self.equivalences.as_slice()
    }
}

#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    math: String,
    variables: Vec<VariableId>,
    components: Vec<ComponentId>,
    parent: Option<ComponentId>,
}

impl Component {
    pub fn name(&self) -> &str {
        &self.name
    }
    /// The raw MathML of the component, possibly holding several `<math>` elements.
    pub fn math(&self) -> &str {
        &self.math
    }
    pub fn variables(&self) -> &[VariableId] {
        self.variables.as_slice()
    }
    /// Encapsulated (child) components, in declaration order.
    pub fn components(&self) -> &[ComponentId] {
        self.components.as_slice()
    }
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }
}

/// The entity graph the generator walks. Components and variables live in
/// arenas and refer to each other through [`ComponentId`] and [`VariableId`].
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    components: Vec<Component>,
    variables: Vec<Variable>,
    roots: Vec<ComponentId>,
}

impl Model {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_component(&mut self, name: &str) -> ComponentId {
        let id = ComponentId(self.components.len());
        self.components.push(Component {
            name: name.to_owned(),
            math: String::new(),
            variables: Vec::new(),
            components: Vec::new(),
            parent: None,
        });
        self.roots.push(id);
        id
    }

    /// Make `child` an encapsulated component of `parent`. A component that
    /// already has a parent is moved.
    pub fn encapsulate(&mut self, parent: ComponentId, child: ComponentId) {
        if parent == child {
            return;
        }
        match self.components[child.0].parent {
            Some(old) => self.components[old.0].components.retain(|c| *c != child),
            None => self.roots.retain(|c| *c != child),
        }
        self.components[child.0].parent = Some(parent);
        self.components[parent.0].components.push(child);
    }

    pub fn add_child_component(&mut self, parent: ComponentId, name: &str) -> ComponentId {
        let id = self.add_component(name);
        self.encapsulate(parent, id);
        id
    }

    pub fn add_variable(&mut self, component: ComponentId, name: &str, units: &str) -> VariableId {
        let id = VariableId(self.variables.len());
        self.variables.push(Variable {
            name: name.to_owned(),
            units: units.to_owned(),
            initial_value: None,
            component,
            equivalences: Vec::new(),
        });
        self.components[component.0].variables.push(id);
        id
    }

    /// Set (or, with an empty string, clear) the initial value of a variable.
    pub fn set_initial_value(&mut self, variable: VariableId, value: &str) {
        let value = value.trim();
        self.variables[variable.0].initial_value = if value.is_empty() {
            None
        } else {
            Some(value.to_owned())
        };
    }

    pub fn set_math(&mut self, component: ComponentId, math: &str) {
        self.components[component.0].math = math.to_owned();
    }

    pub fn append_math(&mut self, component: ComponentId, math: &str) {
        self.components[component.0].math.push_str(math);
    }

    pub fn add_equivalence(&mut self, a: VariableId, b: VariableId) {
        if a == b {
            return;
        }
        if !self.variables[a.0].equivalences.contains(&b) {
            self.variables[a.0].equivalences.push(b);
        }
        if !self.variables[b.0].equivalences.contains(&a) {
            self.variables[b.0].equivalences.push(a);
        }
    }

    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0]
    }

    /// Top-level components, in declaration order.
    pub fn components(&self) -> &[ComponentId] {
        self.roots.as_slice()
    }

    pub fn component_count(&self) -> usize {
        self.roots.len()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn find_component(&self, name: &str) -> Option<ComponentId> {
        self.components
            .iter()
            .position(|c| c.name == name)
            .map(ComponentId)
    }

    pub fn find_variable(&self, component: ComponentId, name: &str) -> Option<VariableId> {
        self.components[component.0]
            .variables
            .iter()
            .copied()
            .find(|v| self.variables[v.0].name == name)
    }

    /// Every component, parents before their children, siblings in
    /// declaration order.
    pub fn components_depth_first(&self) -> Vec<ComponentId> {
        let mut ret = Vec::with_capacity(self.components.len());
        let mut stack: Vec<ComponentId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            ret.push(id);
            stack.extend(self.components[id.0].components.iter().rev().copied());
        }
        ret
    }

    /// Whether two variables are connected through any chain of declared
    /// equivalences. A variable is equivalent to itself.
    pub fn is_equivalent(&self, a: VariableId, b: VariableId) -> bool {
        if a == b {
            return true;
        }
        let mut seen = HashSet::from([a]);
        let mut queue = VecDeque::from([a]);
        while let Some(v) = queue.pop_front() {
            for &next in &self.variables[v.0].equivalences {
                if next == b {
                    return true;
                }
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        false
    }

    /// "Variable 'x' in component 'c' of model 'm'", used in every issue that
    /// names a variable.
    pub fn describe_variable(&self, id: VariableId) -> String {
        let variable = self.variable(id);
        format!(
            "Variable '{}' in component '{}' of model '{}'",
            variable.name,
            self.component(variable.component).name,
            self.name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Model;

    #[test]
    fn equivalence_is_transitive() {
        let mut model = Model::new("m");
        let a = model.add_component("a");
        let b = model.add_component("b");
        let c = model.add_component("c");
        let x = model.add_variable(a, "x", "second");
        let y = model.add_variable(b, "y", "second");
        let z = model.add_variable(c, "z", "second");
        let w = model.add_variable(c, "w", "second");
        model.add_equivalence(x, y);
        model.add_equivalence(y, z);
        assert!(model.is_equivalent(x, z));
        assert!(model.is_equivalent(z, x));
        assert!(model.is_equivalent(w, w));
        assert!(!model.is_equivalent(x, w));
    }

    #[test]
    fn encapsulation_order() {
        let mut model = Model::new("m");
        let main = model.add_component("main");
        let sub = model.add_child_component(main, "sub");
        let sub_sub = model.add_child_component(sub, "sub_sub");
        let other = model.add_component("other");
        let sibling = model.add_child_component(main, "sibling");
        assert_eq!(model.components(), &[main, other]);
        assert_eq!(
            model.components_depth_first(),
            vec![main, sub, sub_sub, sibling, other]
        );
        assert_eq!(model.component(sub_sub).parent(), Some(sub));
    }

    #[test]
    fn empty_initial_value_is_cleared() {
        let mut model = Model::new("m");
        let c = model.add_component("c");
        let x = model.add_variable(c, "x", "dimensionless");
        model.set_initial_value(x, "1.0");
        assert_eq!(model.variable(x).initial_value(), Some("1.0"));
        model.set_initial_value(x, "  ");
        assert!(!model.variable(x).has_initial_value());
        assert_eq!(
            model.describe_variable(x),
            "Variable 'x' in component 'c' of model 'm'"
        );
    }
}
