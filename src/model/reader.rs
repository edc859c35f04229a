use anyhow::{anyhow, Context, Result};
use itertools::Itertools;
use log::debug;
use roxmltree::{Document, Node};

use super::{ComponentId, Model};
use crate::parser::mathml::MATHML_NS;

const CELLML_NAMESPACES: &[&str] = &[
    "http://www.cellml.org/cellml/1.0#",
    "http://www.cellml.org/cellml/1.1#",
    "http://www.cellml.org/cellml/2.0#",
];

fn is_cellml_element(node: &Node, name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == name
        && node
            .tag_name()
            .namespace()
            .is_some_and(|ns| CELLML_NAMESPACES.contains(&ns))
}

fn cellml_children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| is_cellml_element(n, name))
}

fn required_attribute<'a>(node: &Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name).ok_or_else(|| {
        anyhow!(
            "<{}> element is missing its '{}' attribute",
            node.tag_name().name(),
            name
        )
    })
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('"', "&quot;")
}

// A <math> element is kept as text, so the namespace declarations in scope at
// it (cmeta, cellml, a prefixed MathML namespace...) are replayed on an
// enclosing <scope> element.
fn scoped_math(text: &str, math: Node) -> String {
    let declarations = math
        .namespaces()
        .filter(|ns| ns.name() != Some("xml"))
        .map(|ns| match ns.name() {
            Some(prefix) => format!(" xmlns:{}=\"{}\"", prefix, escape_attribute(ns.uri())),
            None => format!(" xmlns=\"{}\"", escape_attribute(ns.uri())),
        })
        .join("");
    format!("<scope{}>{}</scope>", declarations, &text[math.range()])
}

fn component_named(model: &Model, name: &str) -> Result<ComponentId> {
    model
        .find_component(name)
        .ok_or_else(|| anyhow!("component '{}' does not exist", name))
}

fn read_encapsulation(model: &mut Model, parent: Option<ComponentId>, node: Node) -> Result<()> {
    for component_ref in cellml_children(node, "component_ref") {
        let id = component_named(model, required_attribute(&component_ref, "component")?)?;
        if let Some(parent) = parent {
            model.encapsulate(parent, id);
        }
        read_encapsulation(model, Some(id), component_ref)?;
    }
    Ok(())
}

fn read_connection(model: &mut Model, connection: Node) -> Result<()> {
    // CellML 2.0 names the components on the connection itself, 1.x uses a
    // map_components child.
    let (name_1, name_2) = match cellml_children(connection, "map_components").next() {
        Some(map) => (
            required_attribute(&map, "component_1")?,
            required_attribute(&map, "component_2")?,
        ),
        None => (
            required_attribute(&connection, "component_1")?,
            required_attribute(&connection, "component_2")?,
        ),
    };
    let component_1 = component_named(model, name_1)?;
    let component_2 = component_named(model, name_2)?;
    for map in cellml_children(connection, "map_variables") {
        let variable_1 = required_attribute(&map, "variable_1")?;
        let variable_2 = required_attribute(&map, "variable_2")?;
        let v1 = model.find_variable(component_1, variable_1).ok_or_else(|| {
            anyhow!("variable '{}' does not exist in component '{}'", variable_1, name_1)
        })?;
        let v2 = model.find_variable(component_2, variable_2).ok_or_else(|| {
            anyhow!("variable '{}' does not exist in component '{}'", variable_2, name_2)
        })?;
        model.add_equivalence(v1, v2);
    }
    Ok(())
}

/// Build a [`Model`] from a CellML 1.0, 1.1 or 2.0 document.
///
/// Only the structure the generator relies on is read: components and their
/// variables, raw `<math>` content, encapsulation and connections. Imports,
/// units definitions and resets are ignored.
pub fn parse_model(text: &str) -> Result<Model> {
    let doc = Document::parse(text).context("failed to parse CellML document")?;
    let root = doc.root_element();
    if !is_cellml_element(&root, "model") {
        return Err(anyhow!(
            "expected a CellML <model> root element, found <{}>",
            root.tag_name().name()
        ));
    }
    let mut model = Model::new(root.attribute("name").unwrap_or_default());

    for node in cellml_children(root, "component") {
        let name = required_attribute(&node, "name")?;
        let component = model.add_component(name);
        for variable in cellml_children(node, "variable") {
            let id = model.add_variable(
                component,
                required_attribute(&variable, "name")?,
                variable.attribute("units").unwrap_or_default(),
            );
            if let Some(value) = variable.attribute("initial_value") {
                model.set_initial_value(id, value);
            }
        }
        for math in node
            .children()
            .filter(|n| n.is_element() && n.tag_name().namespace() == Some(MATHML_NS))
        {
            model.append_math(component, &scoped_math(text, math));
        }
    }

    for encapsulation in root
        .children()
        .filter(|n| is_cellml_element(n, "encapsulation"))
    {
        read_encapsulation(&mut model, None, encapsulation)
            .context("invalid encapsulation hierarchy")?;
    }
    // CellML 1.x spells the hierarchy as a <group> with an encapsulation
    // <relationship_ref>.
    for group in cellml_children(root, "group") {
        let is_encapsulation = cellml_children(group, "relationship_ref")
            .any(|r| r.attribute("relationship") == Some("encapsulation"));
        if is_encapsulation {
            read_encapsulation(&mut model, None, group).context("invalid encapsulation group")?;
        }
    }

    for connection in cellml_children(root, "connection") {
        read_connection(&mut model, connection).context("invalid connection")?;
    }

    debug!(
        "read model '{}' with {} variables",
        model.name(),
        model.variable_count()
    );
    Ok(model)
}
