//! # Navigation Tree
//!
//! A tree keyed by URL path segments, built once from an OpenAPI/Swagger
//! document. It powers `ls` and path-aware completion. The tree is never
//! mutated after it is built; the current URL's path acts as the cursor.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::cmp::Ordering;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NodeType {
    Dir,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    node_type: NodeType,
    children: Vec<Node>,
}

impl Node {
    pub fn new(name: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            name: name.into(),
            node_type,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Insert a chain of nodes; intermediate nodes are directories and the
    /// last one gets `node_type` unless it already exists.
    pub fn add_path(&mut self, path: &[&str], node_type: NodeType) {
        let Some((name, tail)) = path.split_first() else {
            return;
        };
        if name.is_empty() || *name == "." || *name == ".." {
            self.add_path(tail, node_type);
            return;
        }

        let index = match self.children.iter().position(|c| c.name == *name) {
            Some(index) => index,
            None => {
                let child_type = if tail.is_empty() {
                    node_type
                } else {
                    NodeType::Dir
                };
                self.children.push(Node::new(*name, child_type));
                self.children.len() - 1
            }
        };

        let child = &mut self.children[index];
        if !tail.is_empty() {
            // A file that gains children becomes a directory
            child.node_type = NodeType::Dir;
            child.add_path(tail, node_type);
        }
    }

    /// Look up a direct child; with `wildcard`, a `{param}` child matches any name
    pub fn find_child(&self, name: &str, wildcard: bool) -> Option<&Node> {
        self.children
            .iter()
            .find(|c| c.name == name)
            .or_else(|| {
                if wildcard {
                    self.children
                        .iter()
                        .find(|c| c.name.starts_with('{') && c.name.ends_with('}'))
                } else {
                    None
                }
            })
    }

    /// Children of the node reached by walking `path` from here, sorted with
    /// directories first. `None` when the path leaves the tree.
    pub fn ls<'a>(&'a self, path: &[&str]) -> Option<Vec<&'a Node>> {
        let mut trail: Vec<&'a Node> = vec![self];
        for name in path {
            match *name {
                "" | "." => continue,
                ".." => {
                    if trail.len() > 1 {
                        trail.pop();
                    }
                }
                name => {
                    let cur: &'a Node = trail.last().copied()?;
                    let child = cur.find_child(name, true)?;
                    trail.push(child);
                }
            }
        }

        let cur: &'a Node = trail.last().copied()?;
        let mut children: Vec<&Node> = cur.children.iter().collect();
        children.sort_by(|a, b| compare_nodes(a, b));
        Some(children)
    }
}

fn compare_nodes(a: &Node, b: &Node) -> Ordering {
    a.node_type
        .cmp(&b.node_type)
        .then_with(|| a.name.cmp(&b.name))
}

/// Navigation tree plus the base URL its document describes
#[derive(Debug, Clone)]
pub struct NavTree {
    root: Node,
    base_url: Option<String>,
}

impl NavTree {
    pub fn new(root: Node) -> Self {
        Self {
            root,
            base_url: None,
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Base URL declared by the document (`schemes`/`host`/`basePath` or `servers`)
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    /// Read a JSON OpenAPI/Swagger document from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read spec file '{}'", path.display()))?;
        let document: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse spec file '{}'", path.display()))?;
        Ok(Self::from_openapi(&document))
    }

    pub fn from_openapi(document: &Value) -> Self {
        let info = DocumentInfo::deserialize(document).unwrap_or_else(|e| {
            tracing::warn!("Ignoring malformed base URL fields in spec: {}", e);
            DocumentInfo::default()
        });
        let base_path = info.base_path.as_deref().unwrap_or("");
        let base_segments: Vec<&str> = base_path.split('/').filter(|s| !s.is_empty()).collect();

        let mut root = Node::new("root", NodeType::Dir);
        if let Some(paths) = document.get("paths").and_then(Value::as_object) {
            for (path, endpoint) in paths {
                let mut segments = base_segments.clone();
                segments.extend(path.split('/').filter(|s| !s.is_empty()));
                root.add_path(&segments, NodeType::Dir);

                for name in non_path_parameters(document, endpoint) {
                    let mut full = segments.clone();
                    full.push(name);
                    root.add_path(&full, NodeType::File);
                }
            }
        }

        tracing::debug!("Built navigation tree with {} top-level nodes", root.children.len());
        Self {
            root,
            base_url: info.base_url(),
        }
    }

    /// Children at the path of `url`, optionally moved by the relative `path`
    pub fn children_at(&self, url: &str, path: Option<&str>) -> Vec<&Node> {
        let url_path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_default();

        let mut segments: Vec<&str> = Vec::new();
        match path {
            Some(p) if p.starts_with('/') => segments.extend(p.split('/')),
            Some(p) => {
                segments.extend(url_path.split('/'));
                segments.extend(p.split('/'));
            }
            None => segments.extend(url_path.split('/')),
        }

        self.root.ls(&segments).unwrap_or_default()
    }
}

/// Names of query/body/header parameters declared for any method of `endpoint`
fn non_path_parameters<'a>(document: &'a Value, endpoint: &'a Value) -> Vec<&'a str> {
    let Some(endpoint) = endpoint.as_object() else {
        return Vec::new();
    };

    let shared: Vec<&Value> = endpoint
        .get("parameters")
        .and_then(Value::as_array)
        .map(|a| a.iter().collect())
        .unwrap_or_default();

    let mut names = Vec::new();
    for (method, info) in endpoint {
        if matches!(
            method.as_str(),
            "parameters" | "servers" | "$ref" | "summary" | "description"
        ) {
            continue;
        }
        let own = info
            .get("parameters")
            .and_then(Value::as_array)
            .map(|a| a.iter().collect::<Vec<_>>())
            .unwrap_or_default();

        for param in shared.iter().copied().chain(own.iter().copied()) {
            let param = resolve_ref(document, param);
            if param.get("in").and_then(Value::as_str) == Some("path") {
                continue;
            }
            if let Some(name) = param.get("name").and_then(Value::as_str) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names
}

/// Follow a local `$ref` such as `#/parameters/limit`
fn resolve_ref<'a>(document: &'a Value, value: &'a Value) -> &'a Value {
    let Some(reference) = value.get("$ref").and_then(Value::as_str) else {
        return value;
    };
    let Some(pointer) = reference.strip_prefix('#') else {
        return value;
    };
    document.pointer(pointer).unwrap_or(value)
}

/// Top-level fields that locate the API: Swagger 2 `schemes`/`host`/`basePath`
/// or OpenAPI 3 `servers`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentInfo {
    host: Option<String>,
    #[serde(default)]
    schemes: Vec<String>,
    base_path: Option<String>,
    #[serde(default)]
    servers: Vec<ServerEntry>,
}

#[derive(Debug, Deserialize)]
struct ServerEntry {
    url: String,
}

impl DocumentInfo {
    fn base_url(&self) -> Option<String> {
        if let Some(host) = self.host.as_deref() {
            let scheme = self.schemes.first().map(String::as_str).unwrap_or("https");
            let base_path = self.base_path.as_deref().unwrap_or("");
            return Some(format!("{scheme}://{host}{base_path}"));
        }

        self.servers
            .first()
            .map(|s| s.url.as_str())
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"))
            .map(str::to_string)
    }
}
