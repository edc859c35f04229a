use std::collections::BTreeMap;

use crate::ast::{AstKind, MathFunction};

/// The strings code is generated from. Every operator, function and constant
/// of the expression language maps to a literal in the target language, and
/// a few flags select between operator and function-call forms.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorProfile {
    // relational and logical operators
    pub eq: String,
    pub eq_eq: String,
    pub neq: String,
    pub lt: String,
    pub leq: String,
    pub gt: String,
    pub geq: String,
    pub and: String,
    pub or: String,
    pub xor: String,
    pub not: String,
    pub has_xor_operator: bool,

    // arithmetic operators
    pub plus: String,
    pub minus: String,
    pub times: String,
    pub divide: String,
    pub power: String,
    pub square_root: String,
    pub square: String,
    pub absolute_value: String,
    pub exponential: String,
    pub napierian_logarithm: String,
    pub common_logarithm: String,
    pub ceiling: String,
    pub floor: String,
    pub factorial: String,
    pub has_power_operator: bool,

    pub min: String,
    pub max: String,
    pub gcd: String,
    pub lcm: String,
    pub rem: String,

    // trigonometric functions
    pub sin: String,
    pub cos: String,
    pub tan: String,
    pub sec: String,
    pub csc: String,
    pub cot: String,
    pub sinh: String,
    pub cosh: String,
    pub tanh: String,
    pub sech: String,
    pub csch: String,
    pub coth: String,
    pub asin: String,
    pub acos: String,
    pub atan: String,
    pub asec: String,
    pub acsc: String,
    pub acot: String,
    pub asinh: String,
    pub acosh: String,
    pub atanh: String,
    pub asech: String,
    pub acsch: String,
    pub acoth: String,

    /// Piecewise templates, with `#cond`, `#if` and `#else` placeholders.
    pub has_conditional_operator: bool,
    pub conditional_operator_if: String,
    pub conditional_operator_else: String,
    pub piecewise_if: String,
    pub piecewise_else: String,

    // constants
    pub true_value: String,
    pub false_value: String,
    pub e: String,
    pub pi: String,
    pub inf: String,
    pub nan: String,

    pub variable_of_integration: String,
    pub states_array: String,
    pub rates_array: String,
    pub variables_array: String,
    pub command_separator: String,

    /// Source of the helpers the target language lacks. Functions without an
    /// entry are assumed to be built in.
    pub helper_functions: BTreeMap<MathFunction, String>,

    /// Templates of a complete implementation; `#code` is replaced by the
    /// indented statements of each method.
    pub preamble: String,
    pub initialise_variables_method: String,
    pub compute_computed_constants_method: String,
    pub compute_rates_method: String,
    pub compute_variables_method: String,
    pub empty_method_body: String,
    pub indent: String,
}

fn helpers(entries: &[(MathFunction, &str)]) -> BTreeMap<MathFunction, String> {
    entries
        .iter()
        .map(|(function, source)| (*function, source.to_string()))
        .collect()
}

fn c_reciprocal(name: &str, body: &str) -> String {
    format!("double {}(double x)\n{{\n    return {};\n}}\n", name, body)
}

fn python_reciprocal(name: &str, body: &str) -> String {
    format!("def {}(x):\n    return {}\n", name, body)
}

impl GeneratorProfile {
    /// C99, the default.
    pub fn c() -> Self {
        let mut helper_functions = helpers(&[
            (
                MathFunction::Square,
                "double sqr(double x)\n{\n    return x*x;\n}\n",
            ),
            (
                MathFunction::Xor,
                "double xor(double x, double y)\n{\n    return (x != 0.0) ^ (y != 0.0);\n}\n",
            ),
            (
                MathFunction::Factorial,
                "double fact(double x)\n{\n    return tgamma(x+1.0);\n}\n",
            ),
            (
                MathFunction::Min,
                "double min(double x, double y)\n{\n    return (x < y)?x:y;\n}\n",
            ),
            (
                MathFunction::Max,
                "double max(double x, double y)\n{\n    return (x > y)?x:y;\n}\n",
            ),
            (
                MathFunction::Gcd,
                "double gcd(double x, double y)\n{\n    double a = fabs(x);\n    double b = fabs(y);\n\n    while (b != 0.0) {\n        double t = fmod(a, b);\n\n        a = b;\n        b = t;\n    }\n\n    return a;\n}\n",
            ),
            (
                MathFunction::Lcm,
                "double lcm(double x, double y)\n{\n    return ((x == 0.0) || (y == 0.0))?0.0:fabs(x*y)/gcd(x, y);\n}\n",
            ),
        ]);
        for (function, body) in [
            (MathFunction::Sec, "1.0/cos(x)"),
            (MathFunction::Csc, "1.0/sin(x)"),
            (MathFunction::Cot, "1.0/tan(x)"),
            (MathFunction::Sech, "1.0/cosh(x)"),
            (MathFunction::Csch, "1.0/sinh(x)"),
            (MathFunction::Coth, "1.0/tanh(x)"),
            (MathFunction::Asec, "acos(1.0/x)"),
            (MathFunction::Acsc, "asin(1.0/x)"),
            (MathFunction::Acot, "atan(1.0/x)"),
            (MathFunction::Asech, "acosh(1.0/x)"),
            (MathFunction::Acsch, "asinh(1.0/x)"),
            (MathFunction::Acoth, "atanh(1.0/x)"),
        ] {
            helper_functions.insert(function, c_reciprocal(function.name(), body));
        }

        Self {
            eq: " = ".to_string(),
            eq_eq: " == ".to_string(),
            neq: " != ".to_string(),
            lt: " < ".to_string(),
            leq: " <= ".to_string(),
            gt: " > ".to_string(),
            geq: " >= ".to_string(),
            and: " && ".to_string(),
            or: " || ".to_string(),
            xor: "xor".to_string(),
            not: "!".to_string(),
            has_xor_operator: false,

            plus: "+".to_string(),
            minus: "-".to_string(),
            times: "*".to_string(),
            divide: "/".to_string(),
            power: "pow".to_string(),
            square_root: "sqrt".to_string(),
            square: "sqr".to_string(),
            absolute_value: "fabs".to_string(),
            exponential: "exp".to_string(),
            napierian_logarithm: "log".to_string(),
            common_logarithm: "log10".to_string(),
            ceiling: "ceil".to_string(),
            floor: "floor".to_string(),
            factorial: "fact".to_string(),
            has_power_operator: false,

            min: "min".to_string(),
            max: "max".to_string(),
            gcd: "gcd".to_string(),
            lcm: "lcm".to_string(),
            rem: "fmod".to_string(),

            sin: "sin".to_string(),
            cos: "cos".to_string(),
            tan: "tan".to_string(),
            sec: "sec".to_string(),
            csc: "csc".to_string(),
            cot: "cot".to_string(),
            sinh: "sinh".to_string(),
            cosh: "cosh".to_string(),
            tanh: "tanh".to_string(),
            sech: "sech".to_string(),
            csch: "csch".to_string(),
            coth: "coth".to_string(),
            asin: "asin".to_string(),
            acos: "acos".to_string(),
            atan: "atan".to_string(),
            asec: "asec".to_string(),
            acsc: "acsc".to_string(),
            acot: "acot".to_string(),
            asinh: "asinh".to_string(),
            acosh: "acosh".to_string(),
            atanh: "atanh".to_string(),
            asech: "asech".to_string(),
            acsch: "acsch".to_string(),
            acoth: "acoth".to_string(),

            has_conditional_operator: true,
            conditional_operator_if: "(#cond)?#if".to_string(),
            conditional_operator_else: ":#else".to_string(),
            piecewise_if: "piecewise(#cond, #if".to_string(),
            piecewise_else: ", #else)".to_string(),

            true_value: "true".to_string(),
            false_value: "false".to_string(),
            e: "2.71828182845905".to_string(),
            pi: "3.14159265358979".to_string(),
            inf: "1.0/0.0".to_string(),
            nan: "sqrt(-1.0)".to_string(),

            variable_of_integration: "voi".to_string(),
            states_array: "states".to_string(),
            rates_array: "rates".to_string(),
            variables_array: "variables".to_string(),
            command_separator: ";".to_string(),

            helper_functions,

            preamble: "#include <math.h>\n#include <stdbool.h>\n".to_string(),
            initialise_variables_method:
                "void initializeVariables(double *states, double *variables)\n{\n#code}\n".to_string(),
            compute_computed_constants_method:
                "void computeComputedConstants(double *variables)\n{\n#code}\n".to_string(),
            compute_rates_method:
                "void computeRates(double voi, double *states, double *rates, double *variables)\n{\n#code}\n"
                    .to_string(),
            compute_variables_method:
                "void computeVariables(double voi, double *states, double *rates, double *variables)\n{\n#code}\n"
                    .to_string(),
            empty_method_body: String::new(),
            indent: "    ".to_string(),
        }
    }

    /// Python 3, relying on `from math import *`.
    pub fn python() -> Self {
        let mut helper_functions = helpers(&[
            (MathFunction::Square, "def sqr(x):\n    return x*x\n"),
            (
                MathFunction::Xor,
                "def xor_func(x, y):\n    return 1.0 if bool(x) ^ bool(y) else 0.0\n",
            ),
            (MathFunction::Factorial, "def fact(x):\n    return gamma(x+1.0)\n"),
            (
                MathFunction::Lcm,
                "def lcm(x, y):\n    return 0.0 if x == 0.0 or y == 0.0 else fabs(x*y)/gcd(x, y)\n",
            ),
            (
                MathFunction::Gcd,
                "def gcd(x, y):\n    a, b = fabs(x), fabs(y)\n    while b != 0.0:\n        a, b = b, fmod(a, b)\n    return a\n",
            ),
        ]);
        for (function, body) in [
            (MathFunction::Sec, "1.0/cos(x)"),
            (MathFunction::Csc, "1.0/sin(x)"),
            (MathFunction::Cot, "1.0/tan(x)"),
            (MathFunction::Sech, "1.0/cosh(x)"),
            (MathFunction::Csch, "1.0/sinh(x)"),
            (MathFunction::Coth, "1.0/tanh(x)"),
            (MathFunction::Asec, "acos(1.0/x)"),
            (MathFunction::Acsc, "asin(1.0/x)"),
            (MathFunction::Acot, "atan(1.0/x)"),
            (MathFunction::Asech, "acosh(1.0/x)"),
            (MathFunction::Acsch, "asinh(1.0/x)"),
            (MathFunction::Acoth, "atanh(1.0/x)"),
        ] {
            helper_functions.insert(function, python_reciprocal(function.name(), body));
        }

        Self {
            and: " and ".to_string(),
            or: " or ".to_string(),
            xor: "xor_func".to_string(),
            not: "not ".to_string(),

            power: "**".to_string(),
            has_power_operator: true,

            conditional_operator_if: "#if if #cond".to_string(),
            conditional_operator_else: " else #else".to_string(),

            true_value: "1.0".to_string(),
            false_value: "0.0".to_string(),
            e: "e".to_string(),
            pi: "pi".to_string(),
            inf: "inf".to_string(),
            nan: "nan".to_string(),

            command_separator: String::new(),

            helper_functions,

            preamble: "from math import *\n".to_string(),
            initialise_variables_method: "def initialize_variables(states, variables):\n#code"
                .to_string(),
            compute_computed_constants_method: "def compute_computed_constants(variables):\n#code"
                .to_string(),
            compute_rates_method: "def compute_rates(voi, states, rates, variables):\n#code"
                .to_string(),
            compute_variables_method:
                "def compute_variables(voi, states, rates, variables):\n#code".to_string(),
            empty_method_body: "pass\n".to_string(),
            ..Self::c()
        }
    }

    /// The name of the function rendering `kind` as `name(argument, ...)`.
    pub fn function_name(&self, kind: &AstKind) -> Option<&str> {
        let name = match kind {
            AstKind::Abs => &self.absolute_value,
            AstKind::Exp => &self.exponential,
            AstKind::Ln => &self.napierian_logarithm,
            AstKind::Ceiling => &self.ceiling,
            AstKind::Floor => &self.floor,
            AstKind::Factorial => &self.factorial,
            AstKind::Min => &self.min,
            AstKind::Max => &self.max,
            AstKind::Gcd => &self.gcd,
            AstKind::Lcm => &self.lcm,
            AstKind::Rem => &self.rem,
            AstKind::Sin => &self.sin,
            AstKind::Cos => &self.cos,
            AstKind::Tan => &self.tan,
            AstKind::Sec => &self.sec,
            AstKind::Csc => &self.csc,
            AstKind::Cot => &self.cot,
            AstKind::Sinh => &self.sinh,
            AstKind::Cosh => &self.cosh,
            AstKind::Tanh => &self.tanh,
            AstKind::Sech => &self.sech,
            AstKind::Csch => &self.csch,
            AstKind::Coth => &self.coth,
            AstKind::Asin => &self.asin,
            AstKind::Acos => &self.acos,
            AstKind::Atan => &self.atan,
            AstKind::Asec => &self.asec,
            AstKind::Acsc => &self.acsc,
            AstKind::Acot => &self.acot,
            AstKind::Asinh => &self.asinh,
            AstKind::Acosh => &self.acosh,
            AstKind::Atanh => &self.atanh,
            AstKind::Asech => &self.asech,
            AstKind::Acsch => &self.acsch,
            AstKind::Acoth => &self.acoth,
            _ => return None,
        };
        Some(name.as_str())
    }

    /// The literal for an operator rendered infix.
    pub fn operator(&self, kind: &AstKind) -> Option<&str> {
        let op = match kind {
            AstKind::Eq => &self.eq,
            AstKind::EqEq => &self.eq_eq,
            AstKind::Neq => &self.neq,
            AstKind::Lt => &self.lt,
            AstKind::Leq => &self.leq,
            AstKind::Gt => &self.gt,
            AstKind::Geq => &self.geq,
            AstKind::Plus => &self.plus,
            AstKind::Minus => &self.minus,
            AstKind::Times => &self.times,
            AstKind::Divide => &self.divide,
            AstKind::And => &self.and,
            AstKind::Or => &self.or,
            AstKind::Xor => &self.xor,
            AstKind::Power | AstKind::Root => &self.power,
            _ => return None,
        };
        Some(op.as_str())
    }

    pub fn constant(&self, kind: &AstKind) -> Option<&str> {
        let value = match kind {
            AstKind::True => &self.true_value,
            AstKind::False => &self.false_value,
            AstKind::E => &self.e,
            AstKind::Pi => &self.pi,
            AstKind::Inf => &self.inf,
            AstKind::Nan => &self.nan,
            _ => return None,
        };
        Some(value.as_str())
    }

    pub fn piecewise_if_code(&self, condition: &str, value: &str) -> String {
        let template = if self.has_conditional_operator {
            &self.conditional_operator_if
        } else {
            &self.piecewise_if
        };
        template.replacen("#cond", condition, 1).replacen("#if", value, 1)
    }

    pub fn piecewise_else_code(&self, value: &str) -> String {
        let template = if self.has_conditional_operator {
            &self.conditional_operator_else
        } else {
            &self.piecewise_else
        };
        template.replacen("#else", value, 1)
    }
}

impl Default for GeneratorProfile {
    fn default() -> Self {
        Self::c()
    }
}

#[cfg(test)]
mod tests {
    use super::GeneratorProfile;
    use crate::ast::{AstKind, MathFunction};

    #[test]
    fn c_is_the_default() {
        assert_eq!(GeneratorProfile::default(), GeneratorProfile::c());
    }

    #[test]
    fn python_overrides() {
        let python = GeneratorProfile::python();
        assert!(python.has_power_operator);
        assert_eq!(python.operator(&AstKind::Power), Some("**"));
        assert_eq!(python.operator(&AstKind::Plus), Some("+"));
        assert_eq!(python.function_name(&AstKind::Asinh), Some("asinh"));
        assert_eq!(python.constant(&AstKind::Nan), Some("nan"));
        assert!(!python.helper_functions.contains_key(&MathFunction::Min));
        assert_eq!(python.piecewise_if_code("x > 0", "1.0"), "1.0 if x > 0");
        assert_eq!(python.piecewise_else_code("2.0"), " else 2.0");
    }

    #[test]
    fn c_helpers_cover_every_function() {
        let c = GeneratorProfile::c();
        for function in [
            MathFunction::Square,
            MathFunction::Xor,
            MathFunction::Factorial,
            MathFunction::Min,
            MathFunction::Max,
            MathFunction::Gcd,
            MathFunction::Lcm,
            MathFunction::Sec,
            MathFunction::Acoth,
        ] {
            let source = c.helper_functions.get(&function).unwrap();
            assert!(source.starts_with(&format!("double {}(", function.name())));
        }
        assert_eq!(
            c.helper_functions[&MathFunction::Csch],
            "double csch(double x)\n{\n    return 1.0/sinh(x);\n}\n"
        );
        assert_eq!(c.piecewise_if_code("x > 0", "1.0"), "(x > 0)?1.0");
    }

    #[test]
    fn piecewise_function_form() {
        let mut c = GeneratorProfile::c();
        c.has_conditional_operator = false;
        let code = format!(
            "{}{}",
            c.piecewise_if_code("a", "1.0"),
            c.piecewise_else_code("2.0")
        );
        assert_eq!(code, "piecewise(a, 1.0, 2.0)");
    }
}
