use super::profile::GeneratorProfile;
use crate::analyser::{Analysis, VariableRole};
use crate::ast::{Ast, AstKind};
use crate::model::{Model, VariableId};

fn kind(ast: Option<&Ast>) -> Option<&AstKind> {
    ast.map(|a| &a.kind)
}

fn is(ast: Option<&Ast>, expected: AstKind) -> bool {
    kind(ast) == Some(&expected)
}

fn is_relational(ast: Option<&Ast>) -> bool {
    kind(ast).is_some_and(|k| k.is_relational())
}

fn is_logical_or_bitwise(ast: Option<&Ast>) -> bool {
    kind(ast).is_some_and(|k| k.is_logical_or_bitwise())
}

fn is_piecewise(ast: Option<&Ast>) -> bool {
    is(ast, AstKind::Piecewise)
}

// a plus or minus with two operands, as opposed to a unary one
fn is_binary(ast: Option<&Ast>, expected: AstKind) -> bool {
    is(ast, expected) && ast.is_some_and(|a| a.right().is_some())
}

fn is_binary_sum(ast: Option<&Ast>) -> bool {
    is_binary(ast, AstKind::Plus) || is_binary(ast, AstKind::Minus)
}

fn is_negative_number(ast: Option<&Ast>) -> bool {
    matches!(kind(ast), Some(AstKind::Cn(value)) if value.trim_start().starts_with('-'))
}

fn is_token(ast: Option<&Ast>) -> bool {
    matches!(
        kind(ast),
        Some(
            AstKind::Cn(_)
                | AstKind::Ci(_)
                | AstKind::True
                | AstKind::False
                | AstKind::E
                | AstKind::Pi
                | AstKind::Inf
                | AstKind::Nan
        )
    )
}

fn parenthesize(code: String) -> String {
    format!("({})", code)
}

/// Renders expressions in the syntax of a [`GeneratorProfile`], adding only
/// the parentheses the operator precedence requires (and a few more for
/// readability around logical operators).
pub struct Renderer<'a> {
    model: &'a Model,
    analysis: &'a Analysis,
    profile: &'a GeneratorProfile,
}

impl<'a> Renderer<'a> {
    pub fn new(model: &'a Model, analysis: &'a Analysis, profile: &'a GeneratorProfile) -> Self {
        Self {
            model,
            analysis,
            profile,
        }
    }

    pub fn render(&self, ast: &Ast) -> String {
        self.code(ast, None)
    }

    /// `states[i]`, `rates[i]` (for a state under a derivative),
    /// `variables[i]` or the variable of integration.
    pub fn variable_name(&self, variable: VariableId, parent: Option<&AstKind>) -> String {
        let record = match self.analysis.record_of(self.model, variable) {
            Some(record) => record,
            None => return self.model.variable(variable).name().to_string(),
        };
        let array = match record.role() {
            VariableRole::VariableOfIntegration => {
                return self.profile.variable_of_integration.clone()
            }
            VariableRole::State if parent == Some(&AstKind::Diff) => &self.profile.rates_array,
            VariableRole::State => &self.profile.states_array,
            _ => &self.profile.variables_array,
        };
        match record.index() {
            Some(index) => format!("{}[{}]", array, index),
            None => self.model.variable(variable).name().to_string(),
        }
    }

    fn child(&self, ast: Option<&Ast>, parent: &Ast) -> String {
        match ast {
            Some(ast) => self.code(ast, Some(&parent.kind)),
            None => String::new(),
        }
    }

    fn call(&self, name: &str, ast: &Ast) -> String {
        match ast.right() {
            Some(right) => format!(
                "{}({}, {})",
                name,
                self.child(ast.left(), ast),
                self.child(Some(right), ast)
            ),
            None => format!("{}({})", name, self.child(ast.left(), ast)),
        }
    }

    fn operator(&self, op: &str, ast: &Ast) -> String {
        let (l, r) = (ast.left(), ast.right());
        let power_operator = |a: Option<&Ast>| {
            self.profile.has_power_operator && (is(a, AstKind::Power) || is(a, AstKind::Root))
        };
        let (wrap_left, wrap_right) = match ast.kind {
            AstKind::Plus => (
                is_relational(l) || is_logical_or_bitwise(l) || is_piecewise(l),
                is_relational(r) || is_logical_or_bitwise(r) || is_piecewise(r),
            ),
            AstKind::Minus => (
                is_relational(l) || is_logical_or_bitwise(l) || is_piecewise(l),
                is_relational(r)
                    || is(r, AstKind::Minus)
                    || is_negative_number(r)
                    || is_logical_or_bitwise(r)
                    || is_piecewise(r)
                    || is_binary(r, AstKind::Plus),
            ),
            AstKind::Times => (
                is_relational(l) || is_logical_or_bitwise(l) || is_piecewise(l) || is_binary_sum(l),
                is_relational(r) || is_logical_or_bitwise(r) || is_piecewise(r) || is_binary_sum(r),
            ),
            AstKind::Divide => (
                is_relational(l) || is_logical_or_bitwise(l) || is_piecewise(l) || is_binary_sum(l),
                is_relational(r)
                    || is(r, AstKind::Times)
                    || is(r, AstKind::Divide)
                    || is_logical_or_bitwise(r)
                    || is_piecewise(r)
                    || is_binary_sum(r),
            ),
            AstKind::And | AstKind::Or | AstKind::Xor => {
                // every other logical operator is parenthesized
                let other_logical = |a: Option<&Ast>| {
                    is_logical_or_bitwise(a) && kind(a) != Some(&ast.kind)
                };
                let wrap = |a: Option<&Ast>| {
                    is_relational(a)
                        || other_logical(a)
                        || is_piecewise(a)
                        || is_binary_sum(a)
                        || power_operator(a)
                };
                (wrap(l), wrap(r))
            }
            AstKind::Power => (
                is_relational(l)
                    || is(l, AstKind::Minus)
                    || is(l, AstKind::Times)
                    || is(l, AstKind::Divide)
                    || is_logical_or_bitwise(l)
                    || is_piecewise(l)
                    || is_binary(l, AstKind::Plus)
                    || is_negative_number(l)
                    || power_operator(l),
                is_relational(r)
                    || is(r, AstKind::Minus)
                    || is(r, AstKind::Times)
                    || is(r, AstKind::Divide)
                    || is(r, AstKind::Power)
                    || is(r, AstKind::Root)
                    || is_logical_or_bitwise(r)
                    || is_piecewise(r)
                    || is_binary(r, AstKind::Plus),
            ),
            _ => (false, false),
        };

        let mut left = self.child(l, ast);
        let mut right = self.child(r, ast);
        if wrap_left {
            left = parenthesize(left);
        }
        if wrap_right {
            right = parenthesize(right);
        }
        format!("{}{}{}", left, op, right)
    }

    // unary minus and not
    fn prefix(&self, op: &str, ast: &Ast) -> String {
        let l = ast.left();
        let mut left = self.child(l, ast);
        if is_relational(l)
            || is(l, AstKind::Plus)
            || is(l, AstKind::Minus)
            || is_negative_number(l)
            || is_logical_or_bitwise(l)
            || is_piecewise(l)
        {
            left = parenthesize(left);
        }
        format!("{}{}", op, left)
    }

    fn power(&self, ast: &Ast) -> String {
        match ast.right().and_then(Ast::numeric_value) {
            Some(v) if v == 0.5 => {
                format!("{}({})", self.profile.square_root, self.child(ast.left(), ast))
            }
            Some(v) if v == 2.0 => {
                format!("{}({})", self.profile.square, self.child(ast.left(), ast))
            }
            _ if self.profile.has_power_operator => self.operator(&self.profile.power, ast),
            _ => self.call(&self.profile.power, ast),
        }
    }

    // root of `x` with a `degree` qualifier as left child, or a plain square
    // root
    fn root(&self, ast: &Ast) -> String {
        let (degree, operand) = match (ast.left(), ast.right()) {
            (Some(degree), Some(operand)) => (degree, operand),
            _ => return format!("{}({})", self.profile.square_root, self.child(ast.left(), ast)),
        };
        if degree.numeric_value() == Some(2.0) {
            return format!("{}({})", self.profile.square_root, self.child(Some(operand), ast));
        }
        let value = degree.left().unwrap_or(degree);
        let mut reciprocal = self.child(Some(degree), ast);
        if !is_token(Some(value)) {
            reciprocal = parenthesize(reciprocal);
        }
        let reciprocal = format!("1.0/{}", reciprocal);
        if !self.profile.has_power_operator {
            return format!(
                "{}({}, {})",
                self.profile.power,
                self.child(Some(operand), ast),
                reciprocal
            );
        }
        let r = Some(operand);
        let mut base = self.child(r, ast);
        if is_relational(r)
            || is(r, AstKind::Minus)
            || is(r, AstKind::Times)
            || is(r, AstKind::Divide)
            || is_logical_or_bitwise(r)
            || is_piecewise(r)
            || is_binary(r, AstKind::Plus)
        {
            base = parenthesize(base);
        }
        format!("{}{}({})", base, self.profile.power, reciprocal)
    }

    // logarithm with an optional `logbase` qualifier as left child
    fn log(&self, ast: &Ast) -> String {
        let (base, operand) = match (ast.left(), ast.right()) {
            (Some(base), Some(operand)) => (base, operand),
            _ => {
                return format!(
                    "{}({})",
                    self.profile.common_logarithm,
                    self.child(ast.left(), ast)
                )
            }
        };
        let operand = self.child(Some(operand), ast);
        if base.numeric_value() == Some(10.0) {
            return format!("{}({})", self.profile.common_logarithm, operand);
        }
        format!(
            "{}({})/{}({})",
            self.profile.napierian_logarithm,
            operand,
            self.profile.napierian_logarithm,
            self.child(Some(base), ast)
        )
    }

    fn piecewise(&self, ast: &Ast) -> String {
        let left = self.child(ast.left(), ast);
        let otherwise = match ast.right() {
            // a last piece without an otherwise evaluates to NaN
            Some(right) if right.kind == AstKind::Piece => format!(
                "{}{}",
                self.child(Some(right), ast),
                self.profile.piecewise_else_code(&self.profile.nan)
            ),
            Some(right) => self.child(Some(right), ast),
            None => self.profile.nan.clone(),
        };
        format!("{}{}", left, self.profile.piecewise_else_code(&otherwise))
    }

    fn code(&self, ast: &Ast, parent: Option<&AstKind>) -> String {
        match &ast.kind {
            AstKind::Plus if ast.right().is_none() => self.child(ast.left(), ast),
            AstKind::Minus if ast.right().is_none() => self.prefix(&self.profile.minus, ast),
            AstKind::Not => self.prefix(&self.profile.not, ast),
            AstKind::Xor if !self.profile.has_xor_operator => self.call(&self.profile.xor, ast),
            AstKind::Power => self.power(ast),
            AstKind::Root => self.root(ast),
            AstKind::Log => self.log(ast),
            AstKind::Diff => self.child(ast.right(), ast),
            AstKind::Piecewise => self.piecewise(ast),
            AstKind::Piece => self.profile.piecewise_if_code(
                &self.child(ast.right(), ast),
                &self.child(ast.left(), ast),
            ),
            AstKind::Otherwise | AstKind::Degree | AstKind::Logbase | AstKind::Bvar => {
                self.child(ast.left(), ast)
            }
            AstKind::Cn(value) => value.clone(),
            AstKind::Ci(variable) => self.variable_name(*variable, parent),
            kind => {
                if let Some(op) = self.profile.operator(kind) {
                    self.operator(op, ast)
                } else if let Some(name) = self.profile.function_name(kind) {
                    self.call(name, ast)
                } else {
                    self.profile.constant(kind).unwrap_or_default().to_string()
                }
            }
        }
    }
}
