//! Handlers and their declared parameter schema.
//!
//! # Responsibilities
//! - Describe what each handler parameter is bound from
//! - Reject ill-formed schemas at registration time
//! - Carry the bound argument set into the handler call
//!
//! # Design Decisions
//! - Parameter kinds are declared up front; the dispatcher never inspects
//!   handler types at call time
//! - Handlers are shared as `Arc<Handler>` and never mutated after registration

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::http::error::HttpError;
use crate::http::headers::Headers;
use crate::http::response::Response;
use crate::routing::error::RegistrationError;
use crate::routing::model::{BodyModel, BodySchema};

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// A segment captured from the route template.
    PathParam,
    /// The request body, validated against a schema.
    BodyModel(BodySchema),
    /// The parsed request headers.
    Headers,
}

/// One declared handler parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub kind: ParamKind,
}

impl Param {
    pub fn path(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PathParam,
        }
    }

    pub fn body(name: impl Into<String>, schema: BodySchema) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::BodyModel(schema),
        }
    }

    pub fn headers(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::Headers,
        }
    }
}

/// Validated list of handler parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamSchema {
    params: Vec<Param>,
}

impl ParamSchema {
    /// Names must be unique; at most one body model and one headers slot.
    pub fn new(params: Vec<Param>) -> Result<Self, RegistrationError> {
        let mut body: Option<&str> = None;
        let mut headers: Option<&str> = None;
        for (i, param) in params.iter().enumerate() {
            if params[..i].iter().any(|p| p.name == param.name) {
                return Err(RegistrationError::DuplicateParameter(param.name.clone()));
            }
            match param.kind {
                ParamKind::BodyModel(_) => {
                    if let Some(first) = body {
                        return Err(RegistrationError::MultipleBodyModels {
                            first: first.to_string(),
                            second: param.name.clone(),
                        });
                    }
                    body = Some(param.name.as_str());
                }
                ParamKind::Headers => {
                    if let Some(first) = headers {
                        return Err(RegistrationError::MultipleHeaderSlots {
                            first: first.to_string(),
                            second: param.name.clone(),
                        });
                    }
                    headers = Some(param.name.as_str());
                }
                ParamKind::PathParam => {}
            }
        }
        Ok(Self { params })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn path_params(&self) -> impl Iterator<Item = &str> {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::PathParam)
            .map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// A single bound argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Path(String),
    Body(BodyModel),
    Headers(Headers),
}

/// The merged argument set passed to a handler, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: HashMap<String, Argument>,
}

impl Arguments {
    pub(crate) fn insert(&mut self, name: impl Into<String>, arg: Argument) {
        self.values.insert(name.into(), arg);
    }

    fn missing(name: &str, expected: &str) -> HttpError {
        HttpError::Handler(format!("no {expected} argument named `{name}`"))
    }

    /// Captured path segment, always the raw string.
    pub fn path(&self, name: &str) -> Result<&str, HttpError> {
        match self.values.get(name) {
            Some(Argument::Path(v)) => Ok(v.as_str()),
            _ => Err(Self::missing(name, "path")),
        }
    }

    pub fn body(&self, name: &str) -> Result<&BodyModel, HttpError> {
        match self.values.get(name) {
            Some(Argument::Body(m)) => Ok(m),
            _ => Err(Self::missing(name, "body")),
        }
    }

    /// Body model converted into a concrete type.
    pub fn body_as<T: DeserializeOwned>(&self, name: &str) -> Result<T, HttpError> {
        self.body(name)?
            .deserialize()
            .map_err(|e| HttpError::binding(name, e.to_string()))
    }

    pub fn headers(&self, name: &str) -> Result<&Headers, HttpError> {
        match self.values.get(name) {
            Some(Argument::Headers(h)) => Ok(h),
            _ => Err(Self::missing(name, "headers")),
        }
    }
}

/// Handler callable signature.
pub type HandlerFn = dyn Fn(&Arguments) -> Result<Response, HttpError> + Send + Sync;

/// A registered handler: declared parameters plus the callable.
pub struct Handler {
    schema: ParamSchema,
    func: Box<HandlerFn>,
}

/// Shared reference stored in the route trie.
pub type HandlerRef = Arc<Handler>;

impl Handler {
    pub fn new<F>(params: Vec<Param>, func: F) -> Result<Self, RegistrationError>
    where
        F: Fn(&Arguments) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        Ok(Self {
            schema: ParamSchema::new(params)?,
            func: Box::new(func),
        })
    }

    pub fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    pub fn call(&self, args: &Arguments) -> Result<Response, HttpError> {
        (self.func)(args)
    }
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Handler")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::model::FieldKind;
    use serde_json::json;

    #[test]
    fn schema_rejects_duplicate_names() {
        let err = ParamSchema::new(vec![Param::path("id"), Param::headers("id")]).unwrap_err();
        assert_eq!(err, RegistrationError::DuplicateParameter("id".into()));
    }

    #[test]
    fn schema_allows_one_body_and_one_headers_slot() {
        let schema = BodySchema::new("A").field("a", FieldKind::Any);
        assert!(ParamSchema::new(vec![
            Param::path("id"),
            Param::body("payload", schema.clone()),
            Param::headers("headers"),
        ])
        .is_ok());

        let err = ParamSchema::new(vec![
            Param::body("a", schema.clone()),
            Param::body("b", schema),
        ])
        .unwrap_err();
        assert!(matches!(err, RegistrationError::MultipleBodyModels { .. }));

        let err = ParamSchema::new(vec![Param::headers("h1"), Param::headers("h2")]).unwrap_err();
        assert!(matches!(err, RegistrationError::MultipleHeaderSlots { .. }));
    }

    #[test]
    fn path_params_lists_only_path_slots() {
        let schema = ParamSchema::new(vec![
            Param::path("org"),
            Param::headers("headers"),
            Param::path("repo"),
        ])
        .unwrap();
        assert_eq!(schema.path_params().collect::<Vec<_>>(), vec!["org", "repo"]);
    }

    #[test]
    fn handler_receives_arguments() {
        let handler = Handler::new(vec![Param::path("id")], |args| {
            Ok(Response::json(json!({ "id": args.path("id")? })))
        })
        .unwrap();

        let mut args = Arguments::default();
        args.insert("id", Argument::Path("7".into()));
        let resp = handler.call(&args).unwrap();
        assert_eq!(resp.body(), &json!({"id": "7"}));
    }

    #[test]
    fn wrong_argument_kind_is_reported() {
        let mut args = Arguments::default();
        args.insert("id", Argument::Path("7".into()));
        assert!(args.headers("id").is_err());
        assert!(args.body("missing").is_err());
    }
}
