use std::collections::BTreeSet;
use std::fmt;

/// A math helper that generated code may need to define for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MathFunction {
    Square,
    Xor,
    Factorial,
    Min,
    Max,
    Gcd,
    Lcm,
    Sec,
    Csc,
    Cot,
    Sech,
    Csch,
    Coth,
    Asec,
    Acsc,
    Acot,
    Asech,
    Acsch,
    Acoth,
}

impl MathFunction {
    pub fn name(&self) -> &'static str {
        match self {
            MathFunction::Square => "sqr",
            MathFunction::Xor => "xor",
            MathFunction::Factorial => "fact",
            MathFunction::Min => "min",
            MathFunction::Max => "max",
            MathFunction::Gcd => "gcd",
            MathFunction::Lcm => "lcm",
            MathFunction::Sec => "sec",
            MathFunction::Csc => "csc",
            MathFunction::Cot => "cot",
            MathFunction::Sech => "sech",
            MathFunction::Csch => "csch",
            MathFunction::Coth => "coth",
            MathFunction::Asec => "asec",
            MathFunction::Acsc => "acsc",
            MathFunction::Acot => "acot",
            MathFunction::Asech => "asech",
            MathFunction::Acsch => "acsch",
            MathFunction::Acoth => "acoth",
        }
    }
}

impl fmt::Display for MathFunction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The set of helpers a model's equations use. Iteration order is fixed, so
/// emitted helper definitions are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MathFunctions(BTreeSet<MathFunction>);

impl MathFunctions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, function: MathFunction) {
        // lcm is defined in terms of gcd
        if function == MathFunction::Lcm {
            self.0.insert(MathFunction::Gcd);
        }
        self.0.insert(function);
    }

    pub fn extend(&mut self, other: &MathFunctions) {
        for function in other.iter() {
            self.insert(function);
        }
    }

    pub fn contains(&self, function: MathFunction) -> bool {
        self.0.contains(&function)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = MathFunction> + '_ {
        self.0.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::{MathFunction, MathFunctions};

    #[test]
    fn lcm_pulls_in_gcd() {
        let mut functions = MathFunctions::new();
        functions.insert(MathFunction::Lcm);
        functions.insert(MathFunction::Min);
        assert!(functions.contains(MathFunction::Gcd));
        let names = functions.iter().map(|f| f.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["min", "gcd", "lcm"]);
    }
}
