use std::fmt;

use itertools::Itertools;
use log::info;

use super::expression::Renderer;
use super::profile::GeneratorProfile;
use crate::analyser::{analyse, Analysis, EquationType, Issues, VariableRole};
use crate::ast::MathFunction;
use crate::model::{Model, VariableId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelType {
    /// No model was processed, or it has issues.
    Unknown,
    Ode,
    Algebraic,
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelType::Unknown => write!(f, "unknown"),
            ModelType::Ode => write!(f, "ode"),
            ModelType::Algebraic => write!(f, "algebraic"),
        }
    }
}

/// A variable as it appears in generated code.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVariable {
    pub name: String,
    pub units: String,
    pub component: String,
    pub kind: VariableRole,
    pub index: usize,
}

/// Turns a model into code, through [`Generator::process_model`] and the
/// code block queries. Every query reflects the last processed model.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    profile: GeneratorProfile,
    model: Option<Model>,
    analysis: Analysis,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profile(profile: GeneratorProfile) -> Self {
        Self {
            profile,
            ..Default::default()
        }
    }

    pub fn profile(&self) -> &GeneratorProfile {
        &self.profile
    }

    pub fn set_profile(&mut self, profile: GeneratorProfile) {
        self.profile = profile;
    }

    /// Analyse `model`, replacing everything learned from a previous one.
    pub fn process_model(&mut self, model: &Model) {
        self.analysis = analyse(model);
        self.model = Some(model.clone());
        info!(
            "processed model '{}': {} state(s), {} variable(s), {} issue(s)",
            model.name(),
            self.state_count(),
            self.variable_count(),
            self.issue_count()
        );
    }

    pub fn issues(&self) -> &Issues {
        &self.analysis.issues
    }

    pub fn issue_count(&self) -> usize {
        self.analysis.issues.len()
    }

    fn has_issues(&self) -> bool {
        !self.analysis.issues.is_empty()
    }

    pub fn model_type(&self) -> ModelType {
        match (&self.model, self.analysis.voi) {
            (None, _) => ModelType::Unknown,
            _ if self.has_issues() => ModelType::Unknown,
            (Some(_), Some(_)) => ModelType::Ode,
            (Some(_), None) => ModelType::Algebraic,
        }
    }

    pub fn state_count(&self) -> usize {
        self.analysis.tracker.count_role(VariableRole::State)
    }

    pub fn rate_count(&self) -> usize {
        self.state_count()
    }

    pub fn variable_count(&self) -> usize {
        self.analysis
            .tracker
            .iter()
            .filter(|(_, r)| r.role().is_variable())
            .count()
    }

    fn generated_variable(&self, model: &Model, variable: VariableId, kind: VariableRole, index: usize) -> GeneratedVariable {
        let variable = model.variable(variable);
        GeneratedVariable {
            name: variable.name().to_string(),
            units: variable.units().to_string(),
            component: model.component(variable.component()).name().to_string(),
            kind,
            index,
        }
    }

    fn listing(&self, keep: impl Fn(VariableRole) -> bool) -> Vec<GeneratedVariable> {
        let model = match &self.model {
            Some(model) => model,
            None => return Vec::new(),
        };
        self.analysis
            .tracker
            .iter()
            .filter(|(_, r)| keep(r.role()))
            .filter_map(|(_, r)| {
                r.index()
                    .map(|index| self.generated_variable(model, r.variable(), r.role(), index))
            })
            .sorted_by_key(|v| v.index)
            .collect()
    }

    pub fn variable_of_integration(&self) -> Option<GeneratedVariable> {
        let model = self.model.as_ref()?;
        let voi = self.analysis.voi?;
        Some(self.generated_variable(model, voi, VariableRole::VariableOfIntegration, 0))
    }

    /// States, ordered by index.
    pub fn states(&self) -> Vec<GeneratedVariable> {
        self.listing(|role| role == VariableRole::State)
    }

    /// Constants, computed constants and algebraic variables, ordered by
    /// index.
    pub fn variables(&self) -> Vec<GeneratedVariable> {
        self.listing(|role| role.is_variable())
    }

    // nothing is generated for a model with issues
    fn generation_model(&self) -> Option<&Model> {
        if self.has_issues() {
            return None;
        }
        self.model.as_ref()
    }

    fn statement(&self, code: String) -> String {
        format!("{}{}\n", code, self.profile.command_separator)
    }

    fn equations_code(&self, keep: impl Fn(EquationType) -> bool) -> String {
        let model = match self.generation_model() {
            Some(model) => model,
            None => return String::new(),
        };
        let renderer = Renderer::new(model, &self.analysis, &self.profile);
        self.analysis
            .resolved_equations()
            .into_iter()
            .filter(|e| keep(e.kind()))
            .map(|e| self.statement(renderer.render(e.ast())))
            .join("")
    }

    /// Source of the helpers the equations use that the target language
    /// does not provide.
    pub fn needed_math_methods(&self) -> String {
        if self.generation_model().is_none() {
            return String::new();
        }
        self.analysis
            .functions
            .iter()
            .filter(|f| *f != MathFunction::Xor || !self.profile.has_xor_operator)
            .filter_map(|f| self.profile.helper_functions.get(&f))
            .join("\n")
    }

    /// Literal initial values of states and constants, then the equations
    /// computing true constants.
    pub fn initialise_variables(&self) -> String {
        let model = match self.generation_model() {
            Some(model) => model,
            None => return String::new(),
        };
        let renderer = Renderer::new(model, &self.analysis, &self.profile);
        let mut ret = self
            .analysis
            .tracker
            .iter()
            .filter(|(_, r)| matches!(r.role(), VariableRole::State | VariableRole::Constant))
            .filter_map(|(_, r)| {
                let value = model.variable(r.variable()).initial_value()?;
                Some(self.statement(format!(
                    "{}{}{}",
                    renderer.variable_name(r.variable(), None),
                    self.profile.eq,
                    value
                )))
            })
            .join("");
        ret.push_str(&self.equations_code(|kind| kind == EquationType::TrueConstant));
        ret
    }

    pub fn compute_constant_equations(&self) -> String {
        self.equations_code(|kind| kind == EquationType::VariableBasedConstant)
    }

    pub fn compute_rate_equations(&self) -> String {
        self.equations_code(|kind| kind == EquationType::Rate)
    }

    pub fn compute_algebraic_equations(&self) -> String {
        self.equations_code(|kind| kind == EquationType::Algebraic)
    }

    fn method(&self, template: &str, code: &str) -> String {
        let body = if code.is_empty() {
            self.profile.empty_method_body.as_str()
        } else {
            code
        };
        let body = body
            .lines()
            .map(|line| format!("{}{}\n", self.profile.indent, line))
            .join("");
        template.replacen("#code", &body, 1)
    }

    /// A complete source file: preamble, helpers and one method per block.
    /// Rates are computed with the algebraic variables they may depend on.
    pub fn implementation_code(&self) -> String {
        if self.generation_model().is_none() {
            return String::new();
        }
        let rates = self.equations_code(|kind| {
            matches!(kind, EquationType::Rate | EquationType::Algebraic)
        });
        let methods = [
            self.method(&self.profile.initialise_variables_method, &self.initialise_variables()),
            self.method(
                &self.profile.compute_computed_constants_method,
                &self.compute_constant_equations(),
            ),
            self.method(&self.profile.compute_rates_method, &rates),
            self.method(
                &self.profile.compute_variables_method,
                &self.compute_algebraic_equations(),
            ),
        ];
        let helpers = self.needed_math_methods();
        let ret = [self.profile.preamble.as_str(), helpers.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .chain(methods)
            .join("\n");
        ret
    }
}

#[cfg(test)]
mod tests {
    use super::{Generator, ModelType};
    use crate::codegen::GeneratorProfile;
    use crate::model::{parse_model, Model};

    fn model(variables: &str, math: &str) -> Model {
        parse_model(&format!(
            r#"<model xmlns="http://www.cellml.org/cellml/2.0#" name="m">
  <component name="main">
    {}
    <math xmlns="http://www.w3.org/1998/Math/MathML">{}</math>
  </component>
</model>"#,
            variables, math
        ))
        .unwrap()
    }

    fn variables(names: &[&str]) -> String {
        names
            .iter()
            .map(|n| format!(r#"<variable name="{}" units="dimensionless"/>"#, n))
            .collect()
    }

    // each test renders `x = <rhs>`: a, b, c and d are true constants
    // (indices 0 to 3) so x is algebraic, with index 4
    macro_rules! render_tests {
        ($($name:ident: $rhs:literal => $c:literal, $python:literal,)*) => {
        $(
            #[test]
            fn $name() {
                let model = model(
                    &variables(&["x", "a", "b", "c", "d"]),
                    &format!(
                        "<apply><eq/><ci>x</ci>{}</apply>\
                         <apply><eq/><ci>a</ci><cn>1</cn></apply>\
                         <apply><eq/><ci>b</ci><cn>2</cn></apply>\
                         <apply><eq/><ci>c</ci><cn>3</cn></apply>\
                         <apply><eq/><ci>d</ci><cn>4</cn></apply>",
                        $rhs
                    ),
                );
                let mut generator = Generator::new();
                generator.process_model(&model);
                assert_eq!(generator.issue_count(), 0, "{}", generator.issues());
                let code = generator.compute_algebraic_equations();
                assert_eq!(code, format!("variables[4] = {};\n", $c));

                generator.set_profile(GeneratorProfile::python());
                let code = generator.compute_algebraic_equations();
                assert_eq!(code, format!("variables[4] = {}\n", $python));
            }
        )*
        }
    }

    render_tests! {
        plus_chain: "<apply><plus/><ci>a</ci><ci>b</ci><ci>c</ci></apply>"
            => "variables[0]+variables[1]+variables[2]", "variables[0]+variables[1]+variables[2]",
        minus_of_sum: "<apply><minus/><ci>a</ci><apply><plus/><ci>b</ci><ci>c</ci></apply></apply>"
            => "variables[0]-(variables[1]+variables[2])", "variables[0]-(variables[1]+variables[2])",
        minus_of_minus: "<apply><minus/><ci>a</ci><apply><minus/><ci>b</ci></apply></apply>"
            => "variables[0]-(-variables[1])", "variables[0]-(-variables[1])",
        times_of_sum: "<apply><times/><apply><plus/><ci>a</ci><ci>b</ci></apply><ci>c</ci></apply>"
            => "(variables[0]+variables[1])*variables[2]", "(variables[0]+variables[1])*variables[2]",
        divide_of_product: "<apply><divide/><ci>a</ci><apply><times/><ci>b</ci><ci>c</ci></apply></apply>"
            => "variables[0]/(variables[1]*variables[2])", "variables[0]/(variables[1]*variables[2])",
        power_general: "<apply><power/><ci>a</ci><ci>b</ci></apply>"
            => "pow(variables[0], variables[1])", "variables[0]**variables[1]",
        power_of_sum: "<apply><power/><apply><plus/><ci>a</ci><ci>b</ci></apply><cn>3</cn></apply>"
            => "pow(variables[0]+variables[1], 3)", "(variables[0]+variables[1])**3",
        power_of_power: "<apply><power/><apply><power/><ci>a</ci><ci>b</ci></apply><ci>c</ci></apply>"
            => "pow(pow(variables[0], variables[1]), variables[2])", "(variables[0]**variables[1])**variables[2]",
        power_of_negative_number: "<apply><power/><cn>-2</cn><ci>a</ci></apply>"
            => "pow(-2, variables[0])", "(-2)**variables[0]",
        minus_negative_number: "<apply><minus/><ci>a</ci><cn>-1</cn></apply>"
            => "variables[0]-(-1)", "variables[0]-(-1)",
        negate_negative_number: "<apply><times/><ci>a</ci><apply><minus/><cn>-1</cn></apply></apply>"
            => "variables[0]*-(-1)", "variables[0]*-(-1)",
        power_half: "<apply><power/><ci>a</ci><cn>0.5</cn></apply>"
            => "sqrt(variables[0])", "sqrt(variables[0])",
        power_two: "<apply><power/><ci>a</ci><cn>2.0</cn></apply>"
            => "sqr(variables[0])", "sqr(variables[0])",
        square_root: "<apply><root/><ci>a</ci></apply>"
            => "sqrt(variables[0])", "sqrt(variables[0])",
        cube_root: "<apply><root/><degree><cn>3</cn></degree><ci>a</ci></apply>"
            => "pow(variables[0], 1.0/3)", "variables[0]**(1.0/3)",
        root_of_expression_degree: "<apply><root/><degree><apply><plus/><ci>b</ci><cn>1</cn></apply></degree><ci>a</ci></apply>"
            => "pow(variables[0], 1.0/(variables[1]+1))", "variables[0]**(1.0/(variables[1]+1))",
        log_base_ten: "<apply><log/><logbase><cn>10</cn></logbase><ci>a</ci></apply>"
            => "log10(variables[0])", "log10(variables[0])",
        log_base_two: "<apply><log/><logbase><cn>2</cn></logbase><ci>a</ci></apply>"
            => "log(variables[0])/log(2)", "log(variables[0])/log(2)",
        log_default: "<apply><log/><ci>a</ci></apply>"
            => "log10(variables[0])", "log10(variables[0])",
        logical: "<apply><and/><apply><lt/><ci>a</ci><ci>b</ci></apply><apply><or/><ci>c</ci><ci>d</ci></apply></apply>"
            => "(variables[0] < variables[1]) && (variables[2] || variables[3])", "(variables[0] < variables[1]) and (variables[2] or variables[3])",
        xor_function: "<apply><xor/><ci>a</ci><ci>b</ci></apply>"
            => "xor(variables[0], variables[1])", "xor_func(variables[0], variables[1])",
        not_relational: "<apply><not/><apply><eq/><ci>a</ci><ci>b</ci></apply></apply>"
            => "!(variables[0] == variables[1])", "not (variables[0] == variables[1])",
        nested_min: "<apply><min/><ci>a</ci><ci>b</ci><ci>c</ci></apply>"
            => "min(variables[0], min(variables[1], variables[2]))", "min(variables[0], min(variables[1], variables[2]))",
        trigonometry: "<apply><plus/><apply><sin/><ci>a</ci></apply><apply><arccoth/><ci>b</ci></apply></apply>"
            => "sin(variables[0])+acoth(variables[1])", "sin(variables[0])+acoth(variables[1])",
        constants: "<apply><times/><pi/><exponentiale/><ci>a</ci></apply>"
            => "3.14159265358979*2.71828182845905*variables[0]", "pi*e*variables[0]",
        rem: "<apply><rem/><ci>a</ci><ci>b</ci></apply>"
            => "fmod(variables[0], variables[1])", "fmod(variables[0], variables[1])",
        piecewise_otherwise: "<piecewise><piece><ci>a</ci><apply><gt/><ci>b</ci><cn>0</cn></apply></piece><otherwise><ci>c</ci></otherwise></piecewise>"
            => "(variables[1] > 0)?variables[0]:variables[2]", "variables[0] if variables[1] > 0 else variables[2]",
        piecewise_without_otherwise: "<piecewise><piece><ci>a</ci><true/></piece><piece><ci>b</ci><false/></piece></piecewise>"
            => "(true)?variables[0]:(false)?variables[1]:sqrt(-1.0)", "variables[0] if 1.0 else variables[1] if 0.0 else nan",
        piecewise_single: "<piecewise><piece><ci>a</ci><true/></piece></piecewise>"
            => "(true)?variables[0]:sqrt(-1.0)", "variables[0] if 1.0 else nan",
    }

    #[test]
    fn nothing_processed() {
        let generator = Generator::new();
        assert_eq!(generator.model_type(), ModelType::Unknown);
        assert_eq!(generator.state_count(), 0);
        assert!(generator.states().is_empty());
        assert!(generator.variable_of_integration().is_none());
        assert_eq!(generator.implementation_code(), "");
    }

    #[test]
    fn xor_operator() {
        let model = model(
            &variables(&["x", "a", "b"]),
            "<apply><eq/><ci>x</ci><apply><xor/><ci>a</ci><ci>b</ci></apply></apply>\
             <apply><eq/><ci>a</ci><cn>1</cn></apply>\
             <apply><eq/><ci>b</ci><cn>0</cn></apply>",
        );
        let mut profile = GeneratorProfile::c();
        profile.has_xor_operator = true;
        profile.xor = " ^ ".to_string();
        let mut generator = Generator::with_profile(profile);
        generator.process_model(&model);
        assert_eq!(
            generator.compute_algebraic_equations(),
            "variables[2] = variables[0] ^ variables[1];\n"
        );
        assert_eq!(generator.needed_math_methods(), "");
    }

    #[test]
    fn helper_functions() {
        let model = model(
            &variables(&["x", "a"]),
            "<apply><eq/><ci>x</ci><apply><lcm/><apply><sec/><ci>a</ci></apply><cn>2</cn></apply></apply>\
             <apply><eq/><ci>a</ci><cn>1</cn></apply>",
        );
        let mut generator = Generator::new();
        generator.process_model(&model);
        let methods = generator.needed_math_methods();
        assert!(methods.starts_with("double gcd(double x, double y)\n"));
        assert!(methods.contains("\ndouble lcm(double x, double y)\n"));
        assert!(methods.ends_with("double sec(double x)\n{\n    return 1.0/cos(x);\n}\n"));
    }
}
