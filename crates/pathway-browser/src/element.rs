//! Element and form access
//!
//! The emulator only reads a handful of attributes and walks parents, so
//! elements are traits the embedder implements over its own DOM.
//! `MemoryElement` and `MemoryForm` are detached stand-ins.

use pathway_http::{File, FileMap};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub trait Element: Send + Sync {
    /// Upper-case tag name, e.g. `A`
    fn node_name(&self) -> String;

    fn attribute(&self, name: &str) -> Option<String>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn parent(&self) -> Option<Arc<dyn Element>>;

    fn id(&self) -> Option<String> {
        self.attribute("id").filter(|id| !id.is_empty())
    }
}

/// Field values and files pulled out of a form
#[derive(Debug, Clone, PartialEq)]
pub struct FormData {
    /// Nested field map
    pub body: Value,
    pub files: FileMap,
}

impl Default for FormData {
    fn default() -> Self {
        Self {
            body: Value::Object(Map::new()),
            files: FileMap::new(),
        }
    }
}

pub trait FormElement: Element {
    /// The raw `action`. Empty when absent, which submits to the document
    /// itself.
    fn action(&self) -> String {
        self.attribute("action").unwrap_or_default()
    }

    /// Declared method, `get` when absent
    fn method(&self) -> String {
        self.attribute("method")
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "get".to_string())
    }

    fn enctype(&self) -> String {
        self.attribute("enctype")
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| "application/x-www-form-urlencoded".to_string())
    }

    fn extract(&self) -> FormData;

    /// Restore the fields to their initial values
    fn reset(&self);
}

/// A detached element with fixed attributes
pub struct MemoryElement {
    node_name: String,
    attributes: BTreeMap<String, String>,
    parent: Option<Arc<dyn Element>>,
}

impl MemoryElement {
    pub fn new(tag: &str) -> Self {
        Self {
            node_name: tag.to_ascii_uppercase(),
            attributes: BTreeMap::new(),
            parent: None,
        }
    }

    pub fn anchor(href: &str) -> Self {
        Self::new("a").attr("href", href)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn child_of(mut self, parent: Arc<dyn Element>) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl Element for MemoryElement {
    fn node_name(&self) -> String {
        self.node_name.clone()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(&name.to_ascii_lowercase()).cloned()
    }

    fn parent(&self) -> Option<Arc<dyn Element>> {
        self.parent.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
    pub disabled: bool,
}

/// A detached form. Field names use bracket notation for nesting:
/// `user[name]` builds an object, `tags[]` appends to an array.
pub struct MemoryForm {
    attributes: BTreeMap<String, String>,
    fields: Vec<FormField>,
    files: FileMap,
    parent: Option<Arc<dyn Element>>,
    resets: AtomicUsize,
}

impl MemoryForm {
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            fields: Vec::new(),
            files: FileMap::new(),
            parent: None,
            resets: AtomicUsize::new(0),
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.push(FormField {
            name: name.to_string(),
            value: value.to_string(),
            disabled: false,
        });
        self
    }

    pub fn disabled_field(mut self, name: &str, value: &str) -> Self {
        self.fields.push(FormField {
            name: name.to_string(),
            value: value.to_string(),
            disabled: true,
        });
        self
    }

    pub fn file(mut self, name: &str, file: File) -> Self {
        self.files.entry(name.to_string()).or_default().push(file);
        self
    }

    pub fn child_of(mut self, parent: Arc<dyn Element>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// How many times `reset` has been called
    pub fn reset_count(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

impl Default for MemoryForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for MemoryForm {
    fn node_name(&self) -> String {
        "FORM".to_string()
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.attributes.get(&name.to_ascii_lowercase()).cloned()
    }

    fn parent(&self) -> Option<Arc<dyn Element>> {
        self.parent.clone()
    }
}

impl FormElement for MemoryForm {
    fn extract(&self) -> FormData {
        let mut body = Value::Object(Map::new());
        for field in self.fields.iter().filter(|f| !f.disabled && !f.name.is_empty()) {
            let path = field_path(&field.name);
            insert_path(&mut body, &path, Value::String(field.value.clone()));
        }

        FormData {
            body,
            files: self.files.clone(),
        }
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// `a[b][]` -> `["a", "b", ""]`
fn field_path(name: &str) -> Vec<&str> {
    let Some(open) = name.find('[') else {
        return vec![name];
    };
    if open == 0 {
        return vec![name];
    }

    let mut segments = vec![&name[..open]];
    let mut rest = &name[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        match inner.find(']') {
            Some(close) => {
                segments.push(&inner[..close]);
                rest = &inner[close + 1..];
            }
            None => break,
        }
    }
    segments
}

fn empty_container(array: bool) -> Value {
    if array {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

fn insert_path(target: &mut Value, path: &[&str], value: Value) {
    let Some((key, rest)) = path.split_first() else {
        return;
    };

    if rest.is_empty() {
        match target {
            Value::Array(items) => items.push(value),
            Value::Object(map) => match map.get_mut(*key) {
                Some(Value::Array(items)) => items.push(value),
                Some(existing) => {
                    // Repeated names collect into an array.
                    let previous = existing.take();
                    *existing = Value::Array(vec![previous, value]);
                }
                None => {
                    map.insert((*key).to_string(), value);
                }
            },
            _ => {}
        }
        return;
    }

    let wants_array = rest[0].is_empty();
    let child = match target {
        Value::Object(map) => map
            .entry((*key).to_string())
            .or_insert_with(|| empty_container(wants_array)),
        Value::Array(items) => {
            items.push(empty_container(wants_array));
            match items.last_mut() {
                Some(child) => child,
                None => return,
            }
        }
        _ => return,
    };

    if !child.is_object() && !child.is_array() {
        *child = empty_container(wants_array);
    }
    insert_path(child, rest, value);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_path() {
        assert_eq!(field_path("q"), vec!["q"]);
        assert_eq!(field_path("user[name]"), vec!["user", "name"]);
        assert_eq!(field_path("tags[]"), vec!["tags", ""]);
        assert_eq!(field_path("a[b][c]"), vec!["a", "b", "c"]);
        assert_eq!(field_path("[odd]"), vec!["[odd]"]);
    }

    #[test]
    fn test_extract_nested_fields() {
        let form = MemoryForm::new()
            .field("q", "hello")
            .field("user[name]", "ada")
            .field("user[role]", "admin")
            .field("tags[]", "a")
            .field("tags[]", "b")
            .disabled_field("secret", "x")
            .field("", "unnamed");

        let data = form.extract();
        assert_eq!(
            data.body,
            json!({
                "q": "hello",
                "user": { "name": "ada", "role": "admin" },
                "tags": ["a", "b"],
            })
        );
        assert!(data.files.is_empty());
    }

    #[test]
    fn test_repeated_names_collect() {
        let form = MemoryForm::new().field("color", "red").field("color", "blue");
        assert_eq!(form.extract().body, json!({ "color": ["red", "blue"] }));
    }

    #[test]
    fn test_form_defaults() {
        let form = MemoryForm::new().attr("action", "/search");

        assert_eq!(form.action(), "/search");
        assert_eq!(MemoryForm::new().action(), "");
        assert_eq!(form.method(), "get");
        assert_eq!(form.enctype(), "application/x-www-form-urlencoded");
        assert_eq!(form.node_name(), "FORM");

        form.reset();
        assert_eq!(form.reset_count(), 1);
    }

    #[test]
    fn test_files_are_kept_apart() {
        let form = MemoryForm::new()
            .field("title", "report")
            .file("upload", File::new("a.pdf", 1024, "application/pdf"));

        let data = form.extract();
        assert_eq!(data.body, json!({ "title": "report" }));
        assert_eq!(data.files["upload"][0].name, "a.pdf");
    }

    #[test]
    fn test_element_parent_chain() {
        let anchor: Arc<dyn Element> = Arc::new(MemoryElement::anchor("/x").attr("ID", "link"));
        let span = MemoryElement::new("span").child_of(Arc::clone(&anchor));

        assert_eq!(span.node_name(), "SPAN");
        let parent = span.parent().unwrap();
        assert_eq!(parent.node_name(), "A");
        assert_eq!(parent.attribute("href"), Some("/x".to_string()));
        assert_eq!(parent.id(), Some("link".to_string()));
    }
}
