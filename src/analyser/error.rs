use std::fmt;

use crate::model::ComponentId;

/// Which stage of processing raised an [`Issue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A modelling problem found while classifying variables.
    Generator,
    /// MathML the translator could not turn into an equation.
    Translation,
    /// Math content that is not well-formed XML.
    Xml,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            IssueKind::Generator => write!(f, "Generator"),
            IssueKind::Translation => write!(f, "Translation"),
            IssueKind::Xml => write!(f, "Xml"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    text: String,
    kind: IssueKind,
    component: Option<ComponentId>,
}

impl Issue {
    pub fn new(text: String, kind: IssueKind) -> Self {
        Self {
            text,
            kind,
            component: None,
        }
    }

    pub fn generator(text: String) -> Self {
        Self::new(text, IssueKind::Generator)
    }

    pub fn with_component(mut self, component: ComponentId) -> Self {
        self.component = Some(component);
        self
    }

    pub fn description(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    pub fn component(&self) -> Option<ComponentId> {
        self.component
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.text)
    }
}

/// Issues in the order they were raised.
#[derive(Debug, Clone, Default)]
pub struct Issues {
    issues: Vec<Issue>,
}

impl Issues {
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }
    pub fn push(&mut self, new: Issue) {
        self.issues.push(new);
    }

    pub fn extend(&mut self, new: Vec<Issue>) {
        self.issues.extend(new)
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
    pub fn len(&self) -> usize {
        self.issues.len()
    }
    pub fn get(&self, index: usize) -> Option<&Issue> {
        self.issues.get(index)
    }
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    pub fn has_issue_contains(&self, text: &str) -> bool {
        self.issues.iter().any(|issue| issue.text.contains(text))
    }
}

impl fmt::Display for Issues {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.issues
            .iter()
            .try_for_each(|issue| writeln!(f, "{}", issue))
    }
}

impl<'a> IntoIterator for &'a Issues {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}
