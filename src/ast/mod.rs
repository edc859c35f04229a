use std::fmt;

use crate::model::VariableId;

pub mod functions;
pub use functions::{MathFunction, MathFunctions};

#[derive(Debug, Clone, PartialEq)]
pub enum AstKind {
    // relational operators, `Eq` being the equation's own `=`
    Eq,
    EqEq,
    Neq,
    Lt,
    Leq,
    Gt,
    Geq,

    // arithmetic operators
    Plus,
    Minus,
    Times,
    Divide,
    Power,
    Root,
    Abs,
    Exp,
    Ln,
    Log,
    Ceiling,
    Floor,
    Factorial,

    // logical operators
    And,
    Or,
    Xor,
    Not,

    Diff,

    Min,
    Max,
    Gcd,
    Lcm,

    // trigonometric operators
    Sin,
    Cos,
    Tan,
    Sec,
    Csc,
    Cot,
    Sinh,
    Cosh,
    Tanh,
    Sech,
    Csch,
    Coth,
    Asin,
    Acos,
    Atan,
    Asec,
    Acsc,
    Acot,
    Asinh,
    Acosh,
    Atanh,
    Asech,
    Acsch,
    Acoth,

    Rem,

    // piecewise statement
    Piecewise,
    Piece,
    Otherwise,

    // tokens
    Cn(String),
    Ci(VariableId),

    // qualifiers
    Degree,
    Logbase,
    Bvar,

    // constants
    True,
    False,
    E,
    Pi,
    Inf,
    Nan,
}

impl AstKind {
    /// The kind named by an empty MathML operator or constant element, e.g.
    /// `<plus/>` or `<pi/>`.
    ///
    /// `eq` maps to the relational [`AstKind::EqEq`]; only the translator
    /// knows when it is the equation's own `=`.
    pub fn from_element_name(name: &str) -> Option<Self> {
        let kind = match name {
            "eq" => AstKind::EqEq,
            "neq" => AstKind::Neq,
            "lt" => AstKind::Lt,
            "leq" => AstKind::Leq,
            "gt" => AstKind::Gt,
            "geq" => AstKind::Geq,
            "plus" => AstKind::Plus,
            "minus" => AstKind::Minus,
            "times" => AstKind::Times,
            "divide" => AstKind::Divide,
            "power" => AstKind::Power,
            "root" => AstKind::Root,
            "abs" => AstKind::Abs,
            "exp" => AstKind::Exp,
            "ln" => AstKind::Ln,
            "log" => AstKind::Log,
            "ceiling" => AstKind::Ceiling,
            "floor" => AstKind::Floor,
            "factorial" => AstKind::Factorial,
            "and" => AstKind::And,
            "or" => AstKind::Or,
            "xor" => AstKind::Xor,
            "not" => AstKind::Not,
            "diff" => AstKind::Diff,
            "min" => AstKind::Min,
            "max" => AstKind::Max,
            "gcd" => AstKind::Gcd,
            "lcm" => AstKind::Lcm,
            "sin" => AstKind::Sin,
            "cos" => AstKind::Cos,
            "tan" => AstKind::Tan,
            "sec" => AstKind::Sec,
            "csc" => AstKind::Csc,
            "cot" => AstKind::Cot,
            "sinh" => AstKind::Sinh,
            "cosh" => AstKind::Cosh,
            "tanh" => AstKind::Tanh,
            "sech" => AstKind::Sech,
            "csch" => AstKind::Csch,
            "coth" => AstKind::Coth,
            "arcsin" => AstKind::Asin,
            "arccos" => AstKind::Acos,
            "arctan" => AstKind::Atan,
            "arcsec" => AstKind::Asec,
            "arccsc" => AstKind::Acsc,
            "arccot" => AstKind::Acot,
            "arcsinh" => AstKind::Asinh,
            "arccosh" => AstKind::Acosh,
            "arctanh" => AstKind::Atanh,
            "arcsech" => AstKind::Asech,
            "arccsch" => AstKind::Acsch,
            "arccoth" => AstKind::Acoth,
            "rem" => AstKind::Rem,
            "true" => AstKind::True,
            "false" => AstKind::False,
            "exponentiale" => AstKind::E,
            "pi" => AstKind::Pi,
            "infinity" => AstKind::Inf,
            "notanumber" => AstKind::Nan,
            _ => return None,
        };
        Some(kind)
    }

    /// How many operands an `<apply>` of this operator accepts, qualifiers
    /// (`bvar`, `degree`, `logbase`) included. `None` for kinds that are not
    /// operators.
    pub fn operand_range(&self) -> Option<(usize, usize)> {
        let range = match self {
            AstKind::Eq
            | AstKind::EqEq
            | AstKind::Neq
            | AstKind::Lt
            | AstKind::Leq
            | AstKind::Gt
            | AstKind::Geq
            | AstKind::Divide
            | AstKind::Power
            | AstKind::Rem
            | AstKind::Diff => (2, 2),
            AstKind::Minus | AstKind::Root | AstKind::Log => (1, 2),
            AstKind::Plus => (1, usize::MAX),
            AstKind::Times
            | AstKind::And
            | AstKind::Or
            | AstKind::Xor
            | AstKind::Min
            | AstKind::Max
            | AstKind::Gcd
            | AstKind::Lcm => (2, usize::MAX),
            AstKind::Abs
            | AstKind::Exp
            | AstKind::Ln
            | AstKind::Ceiling
            | AstKind::Floor
            | AstKind::Factorial
            | AstKind::Not
            | AstKind::Sin
            | AstKind::Cos
            | AstKind::Tan
            | AstKind::Sec
            | AstKind::Csc
            | AstKind::Cot
            | AstKind::Sinh
            | AstKind::Cosh
            | AstKind::Tanh
            | AstKind::Sech
            | AstKind::Csch
            | AstKind::Coth
            | AstKind::Asin
            | AstKind::Acos
            | AstKind::Atan
            | AstKind::Asec
            | AstKind::Acsc
            | AstKind::Acot
            | AstKind::Asinh
            | AstKind::Acosh
            | AstKind::Atanh
            | AstKind::Asech
            | AstKind::Acsch
            | AstKind::Acoth => (1, 1),
            _ => return None,
        };
        Some(range)
    }

    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            AstKind::EqEq | AstKind::Neq | AstKind::Lt | AstKind::Leq | AstKind::Gt | AstKind::Geq
        )
    }

    // NOT is unary, so it never needs parentheses around it
    pub fn is_logical_or_bitwise(&self) -> bool {
        matches!(self, AstKind::And | AstKind::Or | AstKind::Xor)
    }

    /// The helper function the generated code needs for this kind, if the
    /// target language is not expected to provide it.
    pub fn math_function(&self) -> Option<MathFunction> {
        let function = match self {
            AstKind::Factorial => MathFunction::Factorial,
            AstKind::Min => MathFunction::Min,
            AstKind::Max => MathFunction::Max,
            AstKind::Gcd => MathFunction::Gcd,
            AstKind::Lcm => MathFunction::Lcm,
            AstKind::Xor => MathFunction::Xor,
            AstKind::Sec => MathFunction::Sec,
            AstKind::Csc => MathFunction::Csc,
            AstKind::Cot => MathFunction::Cot,
            AstKind::Sech => MathFunction::Sech,
            AstKind::Csch => MathFunction::Csch,
            AstKind::Coth => MathFunction::Coth,
            AstKind::Asec => MathFunction::Asec,
            AstKind::Acsc => MathFunction::Acsc,
            AstKind::Acot => MathFunction::Acot,
            AstKind::Asech => MathFunction::Asech,
            AstKind::Acsch => MathFunction::Acsch,
            AstKind::Acoth => MathFunction::Acoth,
            _ => return None,
        };
        Some(function)
    }
}

impl fmt::Display for AstKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AstKind::Cn(value) => write!(f, "{}", value),
            AstKind::Ci(variable) => write!(f, "{}", variable),
            other => write!(f, "{}", format!("{:?}", other).to_lowercase()),
        }
    }
}

/// One node of an equation. Operators keep at most two operands; longer
/// MathML operand lists are folded to the right, so `a+b+c` is
/// `Plus(a, Plus(b, c))`.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    pub kind: AstKind,
    pub left: Option<Box<Ast>>,
    pub right: Option<Box<Ast>>,
}

impl Ast {
    pub fn new(kind: AstKind) -> Self {
        Self {
            kind,
            left: None,
            right: None,
        }
    }

    pub fn unary(kind: AstKind, left: Ast) -> Self {
        Self {
            kind,
            left: Some(Box::new(left)),
            right: None,
        }
    }

    pub fn binary(kind: AstKind, left: Ast, right: Ast) -> Self {
        Self {
            kind,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn left(&self) -> Option<&Ast> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Ast> {
        self.right.as_deref()
    }

    pub fn variable(&self) -> Option<VariableId> {
        match self.kind {
            AstKind::Ci(variable) => Some(variable),
            _ => None,
        }
    }

    /// The numeric value of a literal, looking through `degree` and
    /// `logbase` qualifiers.
    pub fn numeric_value(&self) -> Option<f64> {
        match &self.kind {
            AstKind::Cn(value) => value.trim().parse().ok(),
            AstKind::Degree | AstKind::Logbase => self.left()?.numeric_value(),
            _ => None,
        }
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.left, &self.right) {
            (None, None) => write!(f, "{}", self.kind),
            (Some(left), None) => write!(f, "{}({})", self.kind, left),
            (None, Some(right)) => write!(f, "{}(_, {})", self.kind, right),
            (Some(left), Some(right)) => write!(f, "{}({}, {})", self.kind, left, right),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Ast, AstKind};

    fn cn(value: &str) -> Ast {
        Ast::new(AstKind::Cn(value.to_owned()))
    }

    #[test]
    fn display_nested() {
        let ast = Ast::binary(
            AstKind::Plus,
            cn("1"),
            Ast::binary(AstKind::Plus, cn("2"), Ast::unary(AstKind::Sin, Ast::new(AstKind::Pi))),
        );
        assert_eq!(ast.to_string(), "plus(1, plus(2, sin(pi)))");
    }

    #[test]
    fn numeric_value_through_qualifiers() {
        assert_eq!(Ast::unary(AstKind::Degree, cn(" 2 ")).numeric_value(), Some(2.0));
        assert_eq!(Ast::unary(AstKind::Logbase, cn("10.0")).numeric_value(), Some(10.0));
        assert_eq!(Ast::unary(AstKind::Bvar, cn("1")).numeric_value(), None);
        assert_eq!(cn("abc").numeric_value(), None);
    }

    #[test]
    fn operator_classes() {
        assert_eq!(AstKind::from_element_name("eq"), Some(AstKind::EqEq));
        assert_eq!(AstKind::from_element_name("arccoth"), Some(AstKind::Acoth));
        assert_eq!(AstKind::from_element_name("ci"), None);
        assert_eq!(AstKind::Plus.operand_range(), Some((1, usize::MAX)));
        assert_eq!(AstKind::Pi.operand_range(), None);
        assert!(AstKind::Geq.is_relational());
        assert!(!AstKind::Eq.is_relational());
        assert!(AstKind::Xor.is_logical_or_bitwise());
        assert!(!AstKind::Not.is_logical_or_bitwise());
        assert_eq!(AstKind::Cos.math_function(), None);
    }
}
