//! Route registration.
//!
//! # Responsibilities
//! - Accept GET/POST/PUT registrations during startup
//! - Validate handler schemas against their route templates
//! - Freeze the route table into a [`Dispatcher`]
//!
//! # Design Decisions
//! - Consuming the builder is the only way to obtain a dispatcher, so no
//!   registration API exists once serving begins
//! - Re-registering a (template, method) pair replaces the handler and warns

use std::sync::Arc;

use crate::http::error::HttpError;
use crate::http::method::Method;
use crate::http::response::Response;
use crate::routing::dispatcher::Dispatcher;
use crate::routing::error::RegistrationError;
use crate::routing::handler::{Arguments, Handler, HandlerRef, Param};
use crate::routing::trie::{parse_template, RouteTrie, TemplateSegment};

/// Startup-only route table builder.
#[derive(Debug, Default)]
pub struct Router {
    trie: RouteTrie,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<F>(&mut self, template: &str, params: Vec<Param>, func: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Arguments) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.route(Method::Get, template, params, func)
    }

    pub fn post<F>(&mut self, template: &str, params: Vec<Param>, func: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Arguments) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.route(Method::Post, template, params, func)
    }

    pub fn put<F>(&mut self, template: &str, params: Vec<Param>, func: F) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Arguments) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        self.route(Method::Put, template, params, func)
    }

    pub fn route<F>(
        &mut self,
        method: Method,
        template: &str,
        params: Vec<Param>,
        func: F,
    ) -> Result<&mut Self, RegistrationError>
    where
        F: Fn(&Arguments) -> Result<Response, HttpError> + Send + Sync + 'static,
    {
        let handler = Handler::new(params, func)?;
        self.handler(method, template, Arc::new(handler))
    }

    /// Register an already built handler.
    pub fn handler(
        &mut self,
        method: Method,
        template: &str,
        handler: HandlerRef,
    ) -> Result<&mut Self, RegistrationError> {
        let captured: Vec<&str> = parse_template(template)?
            .into_iter()
            .filter_map(|s| match s {
                TemplateSegment::Param(name) => Some(name),
                _ => None,
            })
            .collect();
        if let Some(param) = handler
            .schema()
            .path_params()
            .find(|p| !captured.contains(p))
        {
            return Err(RegistrationError::UnknownPathParameter {
                template: template.to_string(),
                param: param.to_string(),
            });
        }

        if self.trie.insert(template, method, handler)?.is_some() {
            tracing::warn!(%method, template, "Route re-registered, previous handler replaced");
        } else {
            tracing::debug!(%method, template, "Route registered");
        }
        Ok(self)
    }

    /// Route table registered so far.
    pub fn routes(&self) -> &RouteTrie {
        &self.trie
    }

    /// Freeze the table; no further registration is possible.
    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher::new(self.trie)
    }
}
