//! Ordered fallback chain for free-text queries.

use crate::command::{CommandContext, CommandRegistry};
use crate::picker::Picker;
use crate::response::{ErrorKind, Response};
use crate::triggers::{NlpRule, TriggerRule};
use query_backends::QueryBackend;
use scope_store::{ScopeState, UserSettings};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Tries custom responses, then NLP rules, then query backends, stopping at
/// the first that produces a reply.
pub struct FallbackChain {
    commands: Arc<CommandRegistry>,
    custom_responses: Vec<TriggerRule>,
    nlp_rules: Vec<NlpRule>,
    backends: Vec<Arc<dyn QueryBackend>>,
    picker: Picker,
}

impl FallbackChain {
    pub fn new(commands: Arc<CommandRegistry>) -> Self {
        Self {
            commands,
            custom_responses: Vec::new(),
            nlp_rules: Vec::new(),
            backends: Vec::new(),
            picker: Picker::new(),
        }
    }

    pub fn with_custom_responses(mut self, rules: Vec<TriggerRule>) -> Self {
        self.custom_responses = rules;
        self
    }

    pub fn with_nlp_rules(mut self, rules: Vec<NlpRule>) -> Self {
        self.nlp_rules = rules;
        self
    }

    /// Append a backend. Backends are tried in the order they were added.
    pub fn with_backend(mut self, backend: Arc<dyn QueryBackend>) -> Self {
        self.backends.push(backend);
        self
    }

    pub fn with_picker(mut self, picker: Picker) -> Self {
        self.picker = picker;
        self
    }

    /// Whether any strategy is configured.
    pub fn is_enabled(&self) -> bool {
        !self.custom_responses.is_empty() || !self.nlp_rules.is_empty() || !self.backends.is_empty()
    }

    /// Produce a response for a query.
    ///
    /// Always yields something: when every strategy fails the result is a
    /// "no result" error.
    #[instrument(skip_all, fields(scope = %ctx.scope_id(), user = %ctx.author().id))]
    pub async fn resolve(
        &self,
        query: &str,
        ctx: &CommandContext,
        state: &mut ScopeState,
        user: &UserSettings,
    ) -> Response {
        if let Some(response) = self.custom_response(query, ctx, state).await {
            return response;
        }

        if let Some(response) = self.nlp(query, ctx, state).await {
            return response;
        }

        if let Some(response) = self.query_backends(query, ctx, state, user).await {
            return response;
        }

        debug!("No strategy answered the query");
        Response::Error(ErrorKind::NoResult)
    }

    async fn custom_response(
        &self,
        query: &str,
        ctx: &CommandContext,
        state: &mut ScopeState,
    ) -> Option<Response> {
        for rule in &self.custom_responses {
            if !rule.is_match(query) {
                continue;
            }

            if let Some(invocation) = self.picker.pick(rule.commands()) {
                debug!(
                    "Custom response {:?} runs command {}",
                    rule.expression(),
                    invocation.command_name
                );
                let ctx = ctx.clone().with_command(&invocation.command_name, "");
                return Some(
                    self.commands
                        .invoke(&invocation.command_name, &invocation.args, &ctx, state)
                        .await,
                );
            }

            if let Some(reply) = self.picker.pick(rule.replies()) {
                debug!("Custom response {:?} replied", rule.expression());
                return Some(Response::reply(reply.clone()));
            }
        }

        None
    }

    async fn nlp(
        &self,
        query: &str,
        ctx: &CommandContext,
        state: &mut ScopeState,
    ) -> Option<Response> {
        for rule in &self.nlp_rules {
            let Some(args) = rule.arguments(query) else {
                continue;
            };

            if !self.commands.contains(rule.command()) {
                warn!("NLP rule points at unknown command {}", rule.command());
                continue;
            }

            let ctx = ctx.clone().with_command(rule.command(), "");
            return match self.commands.invoke(rule.command(), &args, &ctx, state).await {
                Response::Error(kind) => {
                    debug!("NLP command {} failed: {:?}", rule.command(), kind);
                    None
                }
                response => Some(response),
            };
        }

        None
    }

    async fn query_backends(
        &self,
        query: &str,
        ctx: &CommandContext,
        state: &mut ScopeState,
        user: &UserSettings,
    ) -> Option<Response> {
        let user_id = ctx.author().id.as_str();

        for backend in &self.backends {
            let keep_context = backend.supports_continuation() && !user.forget_conversations;
            let continuation = if keep_context {
                state.continuation(user_id).map(str::to_string)
            } else {
                None
            };

            match backend.query(query, continuation.as_deref()).await {
                Ok(answer) if answer.answer.is_empty() => {
                    warn!(backend = %backend.name(), "Backend returned an empty answer");
                }
                Ok(answer) => {
                    info!(backend = %backend.name(), "Backend answered query");
                    if keep_context {
                        if let Some(token) = answer.continuation {
                            state.set_continuation(user_id, token);
                        }
                    }
                    return Some(Response::reply(answer.answer));
                }
                Err(e) => {
                    warn!(backend = %backend.name(), "Query failed: {}", e);
                }
            }
        }

        None
    }
}
