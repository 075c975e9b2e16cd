//! Drawable nodes and edges derived from extracted models.
//!
//! [`Graph::from_models`] produces one node per model and one directed edge
//! per model reference: supertypes, plain and array fields, generic
//! arguments, union members and function return types. Edge ids number the
//! edges in order, so two graphs built from equal models are equal.
//!
//! [`HoverState`] decides which nodes and edges a renderer highlights while
//! a node is hovered.

use serde::Serialize;
use tg_core::{FieldShape, Model, ModelType, TypeRef};

/// What an edge was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Interface `extends` or class `extends`.
    Extends,
    /// Class `implements`.
    Implements,
    /// A schema field referencing a model.
    Field,
}

/// One drawable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    /// The model id.
    pub id: String,
    /// The model's declaration kind.
    pub model_type: ModelType,
    /// One source handle per schema field, in schema order.
    pub handles: Vec<String>,
}

/// One directed edge between two models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    /// Unique id: `{n}-{model}-{target}` for supertypes, `{n}-{model}-{field}`
    /// for plain and array fields, `{n}-{model}-{field}-{target}` otherwise.
    pub id: String,
    /// Referencing model.
    pub source: String,
    /// Referenced model.
    pub target: String,
    /// Field handle on the source node; `None` for supertype edges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// What the edge was derived from.
    pub kind: EdgeKind,
}

/// Nodes and edges of a model graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Graph {
    /// One node per model, in model order.
    pub nodes: Vec<GraphNode>,
    /// Edges in model order, then field order.
    pub edges: Vec<GraphEdge>,
}

/// The handle id of a model's field.
#[must_use]
pub fn field_handle(model: &str, field: &str) -> String {
    format!("{model}-source-{field}")
}

impl Graph {
    /// Builds the graph of `models`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tg_extract::{Graph, ModelParser};
    ///
    /// let models = ModelParser::new("type A = { a: B[] }; type B = { b: string };")?.get_models();
    /// let graph = Graph::from_models(&models);
    ///
    /// assert_eq!(graph.nodes.len(), 2);
    /// assert_eq!(graph.edges[0].id, "1-A-a");
    /// assert_eq!(graph.edges[0].source_handle.as_deref(), Some("A-source-a"));
    /// # Ok::<(), tg_ts_parser::ParseError>(())
    /// ```
    #[must_use]
    pub fn from_models(models: &[Model]) -> Self {
        let nodes = models
            .iter()
            .map(|model| GraphNode {
                id: model.id.clone(),
                model_type: model.model_type(),
                handles: model
                    .schema
                    .iter()
                    .map(|field| field_handle(&model.id, &field.name))
                    .collect(),
            })
            .collect();

        let mut builder = EdgeBuilder::default();
        for model in models {
            builder.supertypes(model);
            builder.fields(model);
        }

        Self {
            nodes,
            edges: builder.edges,
        }
    }

    /// Edges that start or end at `id`.
    pub fn edges_of<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.source == id || edge.target == id)
    }
}

#[derive(Default)]
struct EdgeBuilder {
    edges: Vec<GraphEdge>,
}

impl EdgeBuilder {
    fn push(&mut self, label: &str, source: &str, target: &str, handle: Option<String>, kind: EdgeKind) {
        let n = self.edges.len() + 1;
        self.edges.push(GraphEdge {
            id: format!("{n}-{source}-{label}"),
            source: source.to_owned(),
            target: target.to_owned(),
            source_handle: handle,
            kind,
        });
    }

    fn supertypes(&mut self, model: &Model) {
        use tg_core::ModelKind;

        let (extends, implements): (Vec<&TypeRef>, &[TypeRef]) = match &model.kind {
            ModelKind::Interface { extends } => (extends.iter().collect(), &[]),
            ModelKind::TypeAlias => (Vec::new(), &[]),
            ModelKind::Class {
                extends,
                implements,
            } => (extends.iter().collect(), implements.as_slice()),
        };
        for target in extends.into_iter().filter_map(TypeRef::as_model) {
            self.push(target.id(), &model.id, target.id(), None, EdgeKind::Extends);
        }
        for target in implements.iter().filter_map(TypeRef::as_model) {
            self.push(target.id(), &model.id, target.id(), None, EdgeKind::Implements);
        }
    }

    fn fields(&mut self, model: &Model) {
        for field in &model.schema {
            let handle = || Some(field_handle(&model.id, &field.name));
            match &field.shape {
                FieldShape::Default { ty } | FieldShape::Array { element_type: ty } => {
                    if let Some(target) = ty.as_model() {
                        self.push(&field.name, &model.id, target.id(), handle(), EdgeKind::Field);
                    }
                }
                shape => {
                    for target in shape.referenced_models() {
                        let label = format!("{}-{}", field.name, target.id());
                        self.push(&label, &model.id, target.id(), handle(), EdgeKind::Field);
                    }
                }
            }
        }
    }
}

/// Decoration of an edge while a node is hovered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeDecoration {
    /// The edge touches the hovered node.
    pub highlighted: bool,
    /// Another node is hovered.
    pub faded: bool,
}

/// Which node, if any, the pointer is over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoverState {
    hovered: Option<String>,
}

impl HoverState {
    /// Nothing hovered.
    #[must_use]
    pub const fn new() -> Self {
        Self { hovered: None }
    }

    /// Marks `id` as hovered.
    pub fn hover(&mut self, id: impl Into<String>) {
        self.hovered = Some(id.into());
    }

    /// Clears the hovered node.
    pub fn clear(&mut self) {
        self.hovered = None;
    }

    /// The hovered node id.
    #[must_use]
    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// A node is highlighted when it is hovered or directly linked to the
    /// hovered node in either direction.
    #[must_use]
    pub fn is_node_highlighted(&self, model: &Model) -> bool {
        let Some(hovered) = self.hovered() else {
            return false;
        };
        model.id == hovered || model.depends_on(hovered) || model.is_depended_on_by(hovered)
    }

    /// Edges touching the hovered node are highlighted; all others fade.
    #[must_use]
    pub fn edge_decoration(&self, edge: &GraphEdge) -> EdgeDecoration {
        match self.hovered() {
            None => EdgeDecoration::default(),
            Some(hovered) if edge.source == hovered || edge.target == hovered => EdgeDecoration {
                highlighted: true,
                faded: false,
            },
            Some(_) => EdgeDecoration {
                highlighted: false,
                faded: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModelParser;
    use tg_core::find_model;

    fn models(source: &str) -> Vec<Model> {
        ModelParser::new(source)
            .expect("ModelParser creation failed")
            .get_models()
    }

    fn edge_ids(graph: &Graph) -> Vec<&str> {
        graph.edges.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_field_edges() {
        let graph = Graph::from_models(&models(
            r"
            interface User { id: string; posts: Post[]; best: Post; tags: Map<Post, User> }
            interface Post { author: User; reply(to: Post): Post[] }
            ",
        ));
        assert_eq!(
            edge_ids(&graph),
            [
                "1-User-posts",
                "2-User-best",
                "3-User-tags-Post",
                "4-User-tags-User",
                "5-Post-author",
                "6-Post-reply-Post",
                "7-Post-reply-Post",
            ]
        );
        assert!(
            graph
                .edges
                .iter()
                .all(|edge| edge.kind == EdgeKind::Field && edge.source_handle.is_some())
        );
        assert_eq!(graph.nodes[0].handles, ["User-source-id", "User-source-posts", "User-source-best", "User-source-tags"]);
    }

    #[test]
    fn test_supertype_edges() {
        let graph = Graph::from_models(&models(
            r"
            interface Named { name: string }
            interface User extends Named, Other {}
            class Base {}
            class Admin extends Base implements Named {}
            ",
        ));
        let edges: Vec<(&str, EdgeKind)> = graph.edges.iter().map(|e| (e.id.as_str(), e.kind)).collect();
        assert_eq!(
            edges,
            [
                ("1-User-Named", EdgeKind::Extends),
                ("2-Admin-Base", EdgeKind::Extends),
                ("3-Admin-Named", EdgeKind::Implements),
            ]
        );
        assert!(graph.edges.iter().all(|e| e.source_handle.is_none()));
    }

    #[test]
    fn test_self_loop_edge() {
        let graph = Graph::from_models(&models("interface Node { children: Node[] }"));
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.edges[0].source, "Node");
        assert_eq!(graph.edges[0].target, "Node");
        assert_eq!(graph.edges_of("Node").count(), 1);
    }

    #[test]
    fn test_graph_is_deterministic() {
        let source = crate::samples::TASK_MANAGEMENT.source;
        assert_eq!(
            Graph::from_models(&models(source)),
            Graph::from_models(&models(source))
        );
    }

    #[test]
    fn test_hover_highlighting() {
        let models = models("interface A { b: B } interface B { c: C } interface C {}");
        let graph = Graph::from_models(&models);
        let a = find_model(&models, "A").expect("A");
        let b = find_model(&models, "B").expect("B");
        let c = find_model(&models, "C").expect("C");

        let mut hover = HoverState::new();
        assert!(!hover.is_node_highlighted(a));
        assert_eq!(hover.edge_decoration(&graph.edges[0]), EdgeDecoration::default());

        hover.hover("B");
        assert!(hover.is_node_highlighted(a));
        assert!(hover.is_node_highlighted(b));
        assert!(hover.is_node_highlighted(c));

        hover.hover("A");
        assert!(!hover.is_node_highlighted(c));
        assert_eq!(
            hover.edge_decoration(&graph.edges[0]),
            EdgeDecoration {
                highlighted: true,
                faded: false
            }
        );
        assert_eq!(
            hover.edge_decoration(&graph.edges[1]),
            EdgeDecoration {
                highlighted: false,
                faded: true
            }
        );

        hover.clear();
        assert_eq!(hover.hovered(), None);
    }

    #[test]
    fn test_graph_serialization_shape() {
        let graph = Graph::from_models(&models("interface A { b: B } interface B {}"));
        let json = serde_json::to_value(&graph).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "nodes": [
                    { "id": "A", "modelType": "interface", "handles": ["A-source-b"] },
                    { "id": "B", "modelType": "interface", "handles": [] }
                ],
                "edges": [
                    {
                        "id": "1-A-b",
                        "source": "A",
                        "target": "B",
                        "sourceHandle": "A-source-b",
                        "kind": "field"
                    }
                ]
            })
        );
    }
}
