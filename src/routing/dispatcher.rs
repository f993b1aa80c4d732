//! Request dispatch.
//!
//! # Responsibilities
//! - Validate the method token
//! - Resolve the handler through the route trie
//! - Bind path parameters, the body model and headers to handler inputs
//! - Invoke the handler
//!
//! # Design Decisions
//! - GET never forwards a body, whatever the parser decoded
//! - Route misses are an explicit error, never a silent no-op
//! - Binding consults the declared parameter schema only

use std::collections::HashMap;

use crate::http::error::HttpError;
use crate::http::headers::Headers;
use crate::http::method::Method;
use crate::http::request::{Body, ParsedRequest};
use crate::http::response::Response;
use crate::routing::handler::{Argument, Arguments, Handler, ParamKind};
use crate::routing::trie::RouteTrie;

/// Immutable dispatcher over a frozen route table.
#[derive(Debug)]
pub struct Dispatcher {
    routes: RouteTrie,
}

impl Dispatcher {
    pub fn new(routes: RouteTrie) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &RouteTrie {
        &self.routes
    }

    /// Dispatch a parsed request.
    pub fn dispatch(&self, request: ParsedRequest) -> Result<Response, HttpError> {
        self.handle_request(&request.method, &request.path, &request.headers, request.body)
    }

    pub fn handle_request(
        &self,
        method_str: &str,
        path: &str,
        headers: &Headers,
        body: Body,
    ) -> Result<Response, HttpError> {
        let method: Method = method_str.parse()?;
        let body = if method.carries_body() { body } else { Body::new() };

        let matched = self
            .routes
            .search(path, method)
            .ok_or_else(|| HttpError::RouteNotFound {
                method: method_str.to_string(),
                path: path.to_string(),
            })?;

        tracing::debug!(
            %method,
            path,
            params = matched.params.len(),
            "Route resolved"
        );

        let args = bind_arguments(&matched.handler, matched.params, headers, &body)?;
        matched.handler.call(&args)
    }
}

/// Build the argument set a handler declares.
fn bind_arguments(
    handler: &Handler,
    mut path_params: HashMap<String, String>,
    headers: &Headers,
    body: &Body,
) -> Result<Arguments, HttpError> {
    let mut args = Arguments::default();
    for param in handler.schema().iter() {
        let arg = match &param.kind {
            ParamKind::PathParam => path_params
                .remove(&param.name)
                .map(Argument::Path)
                .ok_or_else(|| HttpError::binding(&param.name, "path parameter not captured"))?,
            ParamKind::BodyModel(schema) => schema
                .validate(body)
                .map(Argument::Body)
                .map_err(|e| HttpError::binding(&param.name, e.to_string()))?,
            ParamKind::Headers => Argument::Headers(headers.clone()),
        };
        args.insert(param.name.clone(), arg);
    }
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::error::ErrorKind;
    use crate::http::headers::SupportedHeader;
    use crate::routing::handler::Param;
    use crate::routing::model::{BodySchema, FieldKind};
    use crate::routing::router::Router;
    use serde_json::{json, Value};

    fn body(value: Value) -> Body {
        match value {
            Value::Object(map) => map,
            _ => Body::new(),
        }
    }

    fn user_schema() -> BodySchema {
        BodySchema::new("User")
            .field("name", FieldKind::String)
            .optional("age", FieldKind::Integer)
    }

    fn dispatcher() -> Dispatcher {
        let mut router = Router::new();
        router
            .get("/users/{id}", vec![Param::path("id")], |args| {
                Ok(Response::json(json!({ "id": args.path("id")? })))
            })
            .unwrap()
            .post(
                "/users",
                vec![Param::body("user", user_schema())],
                |args| Ok(Response::json(args.body("user")?.to_value())),
            )
            .unwrap()
            .put(
                "/users/{id}",
                vec![
                    Param::path("id"),
                    Param::body("user", user_schema()),
                    Param::headers("headers"),
                ],
                |args| {
                    Ok(Response::json(json!({
                        "id": args.path("id")?,
                        "user": args.body("user")?.to_value(),
                        "agent": args.headers("headers")?.get(SupportedHeader::UserAgent),
                    })))
                },
            )
            .unwrap()
            .get(
                "/echo-body",
                vec![Param::body("payload", BodySchema::new("Any").allow_unknown_fields())],
                |args| Ok(Response::json(args.body("payload")?.to_value())),
            )
            .unwrap();
        router.into_dispatcher()
    }

    #[test]
    fn path_param_is_passed_as_string() {
        let resp = dispatcher()
            .handle_request("GET", "/users/42", &Headers::new(), Body::new())
            .unwrap();
        assert_eq!(resp.body(), &json!({"id": "42"}));
        assert!(resp.body()["id"].is_string());
    }

    #[test]
    fn invalid_method_fails() {
        let err = dispatcher()
            .handle_request("DELETE", "/users/42", &Headers::new(), Body::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidMethod);
    }

    #[test]
    fn unknown_route_is_not_found() {
        let err = dispatcher()
            .handle_request("GET", "/nope", &Headers::new(), Body::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RouteNotFound);
    }

    #[test]
    fn known_path_with_unregistered_method_is_not_found() {
        let err = dispatcher()
            .handle_request("POST", "/users/42", &Headers::new(), Body::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RouteNotFound);
    }

    #[test]
    fn post_binds_body_model() {
        let resp = dispatcher()
            .handle_request(
                "POST",
                "/users",
                &Headers::new(),
                body(json!({"name": "ada", "age": "36"})),
            )
            .unwrap();
        assert_eq!(resp.body(), &json!({"name": "ada", "age": 36}));
    }

    #[test]
    fn invalid_body_model_is_binding_error() {
        let err = dispatcher()
            .handle_request("POST", "/users", &Headers::new(), body(json!({"age": 3})))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BindingError);
        assert!(err.to_string().contains("`user`"));
    }

    #[test]
    fn put_merges_path_body_and_headers() {
        let headers: Headers = [(SupportedHeader::UserAgent, "test-agent".to_string())]
            .into_iter()
            .collect();
        let resp = dispatcher()
            .handle_request("PUT", "/users/7", &headers, body(json!({"name": "bo"})))
            .unwrap();
        assert_eq!(
            resp.body(),
            &json!({"id": "7", "user": {"name": "bo"}, "agent": "test-agent"})
        );
    }

    #[test]
    fn get_drops_parsed_body() {
        let resp = dispatcher()
            .handle_request("GET", "/echo-body", &Headers::new(), body(json!({"a": 1})))
            .unwrap();
        assert_eq!(resp.body(), &json!({}));
    }

    #[test]
    fn dispatches_parsed_request() {
        let request = crate::http::request::RequestParser::default()
            .parse("GET /users/abc HTTP/1.1\r\nAccept: */*\r\n\r\n")
            .unwrap();
        let resp = dispatcher().dispatch(request).unwrap();
        assert_eq!(resp.body(), &json!({"id": "abc"}));
    }
}
