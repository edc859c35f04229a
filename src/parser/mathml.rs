use roxmltree::{Document, Node};

use crate::analyser::{Issue, IssueKind};
use crate::ast::{Ast, AstKind, MathFunction, MathFunctions};
use crate::model::{ComponentId, Model, VariableId};

pub const MATHML_NS: &str = "http://www.w3.org/1998/Math/MathML";

const CELLML_2_0_NS: &str = "http://www.cellml.org/cellml/2.0#";

/// One top-level element of a `<math>` block, with the variables it
/// references. Variables that appear under a `diff` (the differentiated
/// variable and the bound variable) are kept apart from the others.
#[derive(Debug, Clone)]
pub struct ParsedEquation {
    pub ast: Ast,
    pub variables: Vec<VariableId>,
    pub ode_variables: Vec<VariableId>,
}

/// Everything translated from one component's math.
#[derive(Debug, Clone, Default)]
pub struct ParsedMath {
    pub equations: Vec<ParsedEquation>,
    pub functions: MathFunctions,
    pub issues: Vec<Issue>,
}

struct Translator<'a> {
    model: &'a Model,
    component: ComponentId,
    variables: Vec<VariableId>,
    ode_variables: Vec<VariableId>,
    functions: MathFunctions,
}

fn mathml_children<'a, 'input>(node: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(MATHML_NS))
        .collect()
}

fn is_mathml_element(node: &Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().namespace() == Some(MATHML_NS)
        && node.tag_name().name() == name
}

impl<'a> Translator<'a> {
    fn new(model: &'a Model, component: ComponentId) -> Self {
        Self {
            model,
            component,
            variables: Vec::new(),
            ode_variables: Vec::new(),
            functions: MathFunctions::new(),
        }
    }

    fn issue(&self, text: String) -> Issue {
        Issue::new(text, IssueKind::Translation).with_component(self.component)
    }

    fn location(&self) -> String {
        format!(
            "component '{}' of model '{}'",
            self.model.component(self.component).name(),
            self.model.name()
        )
    }

    fn track(&mut self, variable: VariableId, ode: bool) {
        let list = if ode {
            &mut self.ode_variables
        } else {
            &mut self.variables
        };
        if !list.contains(&variable) {
            list.push(variable);
        }
    }

    // right-fold `nodes` into nested `kind` nodes: a, (b, (c, d))
    fn fold(&mut self, kind: &AstKind, nodes: &[Node], under_diff: bool) -> Result<Ast, Issue> {
        let (last, rest) = match nodes.split_last() {
            Some(split) => split,
            None => return Err(self.issue(format!("Missing operand in {}.", self.location()))),
        };
        let mut ret = self.translate(*last, under_diff)?;
        for node in rest.iter().rev() {
            let left = self.translate(*node, under_diff)?;
            ret = Ast::binary(kind.clone(), left, ret);
        }
        Ok(ret)
    }

    fn translate_apply(&mut self, node: Node) -> Result<Ast, Issue> {
        let children = mathml_children(node);
        let (operator, operands) = match children.split_first() {
            Some(split) => split,
            None => {
                return Err(self.issue(format!(
                    "An 'apply' element in {} has no operator.",
                    self.location()
                )))
            }
        };
        let name = operator.tag_name().name();
        let mut kind = match AstKind::from_element_name(name) {
            Some(kind) if kind.operand_range().is_some() => kind,
            _ => {
                return Err(self.issue(format!(
                    "Math element '{}' in {} is not a supported operator.",
                    name,
                    self.location()
                )))
            }
        };
        if kind == AstKind::EqEq && node.parent().is_some_and(|p| is_mathml_element(&p, "math")) {
            kind = AstKind::Eq;
        }
        let (min, max) = kind.operand_range().unwrap_or((1, 1));
        if operands.len() < min || operands.len() > max {
            return Err(self.issue(format!(
                "Operator '{}' in {} cannot take {} operand(s).",
                name,
                self.location(),
                operands.len()
            )));
        }
        let under_diff = kind == AstKind::Diff;
        let left = self.translate(operands[0], under_diff)?;
        let ret = match operands.len() {
            1 => Ast::unary(kind.clone(), left),
            2 => {
                let right = self.translate(operands[1], under_diff)?;
                Ast::binary(kind.clone(), left, right)
            }
            _ => {
                let right = self.fold(&kind, &operands[1..], under_diff)?;
                Ast::binary(kind.clone(), left, right)
            }
        };

        if let Some(function) = kind.math_function() {
            self.functions.insert(function);
        }
        if kind == AstKind::Power && ret.right().and_then(|r| r.numeric_value()) == Some(2.0) {
            self.functions.insert(MathFunction::Square);
        }
        Ok(ret)
    }

    fn translate_piecewise(&mut self, node: Node) -> Result<Ast, Issue> {
        let children = mathml_children(node);
        if children.is_empty() {
            return Err(self.issue(format!(
                "A 'piecewise' element in {} has no pieces.",
                self.location()
            )));
        }
        let left = self.translate(children[0], false)?;
        if children.len() == 1 {
            return Ok(Ast::unary(AstKind::Piecewise, left));
        }
        let right = self.fold(&AstKind::Piecewise, &children[1..], false)?;
        Ok(Ast::binary(AstKind::Piecewise, left, right))
    }

    fn translate_cn(&self, node: Node) -> Result<Ast, Issue> {
        // e-notation literals are written as <cn>mantissa<sep/>exponent</cn>
        let mut value = String::new();
        for child in node.children() {
            if child.is_text() {
                value.push_str(child.text().unwrap_or_default().trim());
            } else if is_mathml_element(&child, "sep") {
                value.push('e');
            }
        }
        if value.is_empty() {
            return Err(self.issue(format!("A 'cn' element in {} is empty.", self.location())));
        }
        Ok(Ast::new(AstKind::Cn(value)))
    }

    fn translate_ci(&mut self, node: Node, under_diff: bool) -> Result<Ast, Issue> {
        let name = node.text().unwrap_or_default().trim();
        let variable = self
            .model
            .find_variable(self.component, name)
            .ok_or_else(|| {
                self.issue(format!(
                    "Variable '{}' referenced in {} does not exist.",
                    name,
                    self.location()
                ))
            })?;
        self.track(variable, under_diff);
        Ok(Ast::new(AstKind::Ci(variable)))
    }

    fn translate_qualifier(&mut self, node: Node, kind: AstKind) -> Result<Ast, Issue> {
        let children = mathml_children(node);
        match children.as_slice() {
            [child] => Ok(Ast::unary(kind, self.translate(*child, false)?)),
            _ => Err(self.issue(format!(
                "A '{}' element in {} must have exactly one child.",
                node.tag_name().name(),
                self.location()
            ))),
        }
    }

    /// Translate one MathML element. `under_diff` is set for the direct
    /// operands of a `diff` and is passed through a `bvar`, so both the
    /// differentiated variable and the variable of integration are tracked as
    /// ODE variables.
    fn translate(&mut self, node: Node, under_diff: bool) -> Result<Ast, Issue> {
        let name = node.tag_name().name();
        if node.tag_name().namespace() != Some(MATHML_NS) {
            return Err(self.issue(format!(
                "Element '{}' in {} is not a MathML element.",
                name,
                self.location()
            )));
        }
        match name {
            "apply" => self.translate_apply(node),
            "piecewise" => self.translate_piecewise(node),
            "piece" => {
                let children = mathml_children(node);
                match children.as_slice() {
                    [value, condition] => {
                        let value = self.translate(*value, false)?;
                        let condition = self.translate(*condition, false)?;
                        Ok(Ast::binary(AstKind::Piece, value, condition))
                    }
                    _ => Err(self.issue(format!(
                        "A 'piece' element in {} must have a value and a condition.",
                        self.location()
                    ))),
                }
            }
            "otherwise" => self.translate_qualifier(node, AstKind::Otherwise),
            "cn" => self.translate_cn(node),
            "ci" => self.translate_ci(node, under_diff),
            "degree" => self.translate_qualifier(node, AstKind::Degree),
            "logbase" => self.translate_qualifier(node, AstKind::Logbase),
            "bvar" => {
                let children = mathml_children(node);
                match children.as_slice() {
                    [variable] => Ok(Ast::unary(
                        AstKind::Bvar,
                        self.translate(*variable, under_diff)?,
                    )),
                    [variable, degree] => {
                        let variable = self.translate(*variable, under_diff)?;
                        let degree = self.translate(*degree, false)?;
                        Ok(Ast::binary(AstKind::Bvar, variable, degree))
                    }
                    _ => Err(self.issue(format!(
                        "A 'bvar' element in {} must have one or two children.",
                        self.location()
                    ))),
                }
            }
            _ => match AstKind::from_element_name(name) {
                Some(kind) if kind.operand_range().is_none() => Ok(Ast::new(kind)),
                _ => Err(self.issue(format!(
                    "Math element '{}' in {} is not supported.",
                    name,
                    self.location()
                ))),
            },
        }
    }
}

/// Translate the math of `component` into equations.
///
/// Each element child of a `<math>` element is one equation. An equation that
/// cannot be translated is dropped and reported as an issue; the others are
/// still returned.
pub fn parse_math(model: &Model, component: ComponentId) -> ParsedMath {
    let mut ret = ParsedMath::default();
    let math = model.component(component).math();
    if math.trim().is_empty() {
        return ret;
    }

    // a component may hold several <math> elements, each possibly inside a
    // <scope> carrying the namespace declarations of the CellML document
    let text = format!(
        "<wrapper xmlns=\"{}\" xmlns:cellml=\"{}\">{}</wrapper>",
        MATHML_NS, CELLML_2_0_NS, math
    );
    let doc = match Document::parse(&text) {
        Ok(doc) => doc,
        Err(err) => {
            ret.issues.push(
                Issue::new(
                    format!(
                        "The math in component '{}' of model '{}' could not be parsed: {}.",
                        model.component(component).name(),
                        model.name(),
                        err
                    ),
                    IssueKind::Xml,
                )
                .with_component(component),
            );
            return ret;
        }
    };

    for math in doc
        .root_element()
        .descendants()
        .filter(|n| is_mathml_element(n, "math"))
    {
        for node in mathml_children(math) {
            let mut translator = Translator::new(model, component);
            match translator.translate(node, false) {
                Ok(ast) => {
                    ret.functions.extend(&translator.functions);
                    ret.equations.push(ParsedEquation {
                        ast,
                        variables: translator.variables,
                        ode_variables: translator.ode_variables,
                    });
                }
                Err(issue) => ret.issues.push(issue),
            }
        }
    }
    ret
}

#[cfg(test)]
mod tests {
    use super::{parse_math, MATHML_NS};
    use crate::analyser::IssueKind;
    use crate::model::Model;

    fn math(body: &str) -> String {
        format!("<math xmlns=\"{}\">{}</math>", MATHML_NS, body)
    }

    fn model_with(body: &str) -> Model {
        let mut model = Model::new("m");
        let main = model.add_component("main");
        for name in ["t", "a", "b", "c", "d", "e", "x"] {
            model.add_variable(main, name, "dimensionless");
        }
        model.set_math(main, &math(body));
        model
    }

    macro_rules! translate_tests {
        ($($name:ident: $body:literal => $expect:literal,)*) => {
        $(
            #[test]
            fn $name() {
                let model = model_with($body);
                let main = model.components()[0];
                let parsed = parse_math(&model, main);
                assert!(parsed.issues.is_empty(), "{:?}", parsed.issues);
                assert_eq!(parsed.equations.len(), 1);
                assert_eq!(parsed.equations[0].ast.to_string(), $expect);
            }
        )*
        }
    }

    translate_tests! {
        right_fold_plus: "<apply><eq/><ci>x</ci><apply><plus/><ci>a</ci><ci>b</ci><ci>c</ci><ci>d</ci><ci>e</ci></apply></apply>"
            => "eq(v6, plus(v1, plus(v2, plus(v3, plus(v4, v5)))))",
        unary_minus: "<apply><eq/><ci>x</ci><apply><minus/><ci>a</ci></apply></apply>"
            => "eq(v6, minus(v1))",
        relational_eq: "<apply><eq/><ci>x</ci><piecewise><piece><cn>1</cn><apply><eq/><ci>a</ci><ci>b</ci></apply></piece><otherwise><cn>2</cn></otherwise></piecewise></apply>"
            => "eq(v6, piecewise(piece(1, eqeq(v1, v2)), otherwise(2)))",
        three_pieces: "<apply><eq/><ci>x</ci><piecewise><piece><cn>1</cn><true/></piece><piece><cn>2</cn><false/></piece><otherwise><cn>3</cn></otherwise></piecewise></apply>"
            => "eq(v6, piecewise(piece(1, true), piecewise(piece(2, false), otherwise(3))))",
        e_notation: "<apply><eq/><ci>x</ci><cn type=\"e-notation\">1.5<sep/>3</cn></apply>"
            => "eq(v6, 1.5e3)",
        root_with_degree: "<apply><eq/><ci>x</ci><apply><root/><degree><cn>3</cn></degree><ci>a</ci></apply></apply>"
            => "eq(v6, root(degree(3), v1))",
        diff_with_bvar: "<apply><eq/><apply><diff/><bvar><ci>t</ci></bvar><ci>x</ci></apply><pi/></apply>"
            => "eq(diff(bvar(v0), v6), pi)",
    }

    #[test]
    fn diff_variables_are_ode_variables() {
        let model = model_with(
            "<apply><eq/><apply><diff/><bvar><ci>t</ci></bvar><ci>x</ci></apply><apply><times/><ci>a</ci><ci>x</ci></apply></apply>",
        );
        let main = model.components()[0];
        let parsed = parse_math(&model, main);
        let equation = &parsed.equations[0];
        let name = |v| model.variable(v).name().to_owned();
        assert_eq!(
            equation.ode_variables.iter().copied().map(name).collect::<Vec<_>>(),
            vec!["t", "x"]
        );
        assert_eq!(
            equation.variables.iter().copied().map(name).collect::<Vec<_>>(),
            vec!["a", "x"]
        );
    }

    #[test]
    fn records_helper_functions() {
        let model = model_with(
            "<apply><eq/><ci>x</ci><apply><plus/><apply><power/><ci>a</ci><cn>2.0</cn></apply><apply><lcm/><ci>b</ci><ci>c</ci></apply><apply><sec/><ci>d</ci></apply></apply></apply>",
        );
        let parsed = parse_math(&model, model.components()[0]);
        let names = parsed.functions.iter().map(|f| f.name()).collect::<Vec<_>>();
        assert_eq!(names, vec!["sqr", "gcd", "lcm", "sec"]);
    }

    #[test]
    fn unknown_variable_is_an_issue() {
        let model = model_with("<apply><eq/><ci>x</ci><ci>nope</ci></apply>");
        let parsed = parse_math(&model, model.components()[0]);
        assert!(parsed.equations.is_empty());
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind(), IssueKind::Translation);
        assert_eq!(
            parsed.issues[0].description(),
            "Variable 'nope' referenced in component 'main' of model 'm' does not exist."
        );
    }

    #[test]
    fn unsupported_element_is_an_issue() {
        let model = model_with(
            "<apply><eq/><ci>x</ci><apply><sum/><ci>a</ci></apply></apply><apply><eq/><ci>a</ci><cn>1</cn></apply>",
        );
        let parsed = parse_math(&model, model.components()[0]);
        assert_eq!(parsed.equations.len(), 1);
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].description().contains("'sum'"));
    }

    #[test]
    fn wrong_arity_is_an_issue() {
        let model = model_with("<apply><eq/><ci>x</ci><apply><divide/><ci>a</ci></apply></apply>");
        let parsed = parse_math(&model, model.components()[0]);
        assert_eq!(parsed.issues.len(), 1);
        assert!(parsed.issues[0].description().contains("cannot take 1 operand(s)"));
    }

    #[test]
    fn malformed_math_is_an_xml_issue() {
        let mut model = Model::new("m");
        let main = model.add_component("main");
        model.set_math(main, "<math><apply>");
        let parsed = parse_math(&model, main);
        assert_eq!(parsed.issues.len(), 1);
        assert_eq!(parsed.issues[0].kind(), IssueKind::Xml);
    }
}
