//! Quote lifecycle: Draft -> Presented -> Bound.
//!
//! Quotes are authored by agents and only their author may change them.
//! The generic update path moves a quote forward to Presented at most;
//! Bound is reached only through [`QuoteWorkflow::bind`], which flips
//! the quote and inserts its policy in one store transaction.

use std::sync::Arc;

use agencydesk_core::authz::{self, Caller, Operation, ResourceKind};
use agencydesk_core::error::{BrokerError, BrokerResult};
use agencydesk_core::models::policy::{BindQuote, NewPolicy, Policy, generate_policy_number};
use agencydesk_core::models::quote::{
    CreateLineItem, CreateQuote, Quote, QuoteLineItem, QuoteStatus, UpdateQuote,
};
use agencydesk_core::repository::{
    PaginatedResult, Pagination, PolicyRepository, QuoteRepository, Store,
};
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct QuoteWorkflow<S> {
    store: Arc<S>,
}

impl<S> Clone for QuoteWorkflow<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// Statuses a quote may be in for an update targeting `next` to apply.
fn allowed_from(next: Option<QuoteStatus>) -> &'static [QuoteStatus] {
    match next {
        Some(QuoteStatus::Draft) => &[QuoteStatus::Draft],
        Some(QuoteStatus::Presented) | None => &[QuoteStatus::Draft, QuoteStatus::Presented],
        Some(QuoteStatus::Bound) => &[],
    }
}

fn check_transition(current: QuoteStatus, next: Option<QuoteStatus>) -> BrokerResult<()> {
    if current == QuoteStatus::Bound {
        return Err(BrokerError::conflict("quote is already bound"));
    }
    match next {
        Some(QuoteStatus::Bound) => Err(BrokerError::validation(
            "a quote is bound through the bind operation",
        )),
        Some(next) if !current.can_transition_to(next) => Err(BrokerError::validation(format!(
            "quote cannot move from {current} to {next}"
        ))),
        _ => Ok(()),
    }
}

impl<S: Store> QuoteWorkflow<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Open a Draft quote for a customer of the caller's agency.
    pub async fn create(&self, caller: &Caller, input: CreateQuote) -> BrokerResult<Quote> {
        authz::require(caller, ResourceKind::Quote, Operation::Write)?;
        let agency_id = caller.agency()?;
        let quote = self
            .store
            .quotes()
            .create(caller.user_id, agency_id, input)
            .await?;
        info!(
            caller = %caller.user_id,
            quote_id = %quote.id,
            customer_id = %quote.customer_id,
            "quote opened"
        );
        Ok(quote)
    }

    pub async fn get(&self, caller: &Caller, id: Uuid) -> BrokerResult<Quote> {
        let scope = authz::scope_filter(caller, ResourceKind::Quote)?;
        self.store.quotes().get(scope, id).await
    }

    pub async fn list(
        &self,
        caller: &Caller,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Quote>> {
        let scope = authz::scope_filter(caller, ResourceKind::Quote)?;
        self.store.quotes().list(scope, pagination).await
    }

    /// Change a quote's metadata or move it from Draft to Presented.
    pub async fn update(
        &self,
        caller: &Caller,
        id: Uuid,
        input: UpdateQuote,
    ) -> BrokerResult<Quote> {
        authz::require(caller, ResourceKind::Quote, Operation::Write)?;
        let scope = authz::scope_filter(caller, ResourceKind::Quote)?;
        let current = self.store.quotes().get(scope, id).await?;
        check_transition(current.status, input.status)?;

        let next = input.status;
        match self
            .store
            .quotes()
            .update(scope, id, allowed_from(next), input)
            .await
        {
            Ok(quote) => {
                info!(
                    caller = %caller.user_id,
                    quote_id = %id,
                    status = %quote.status,
                    "quote updated"
                );
                Ok(quote)
            }
            // The status moved between the read and the guarded write.
            Err(BrokerError::NotFound { .. }) => {
                let now = self.store.quotes().get(scope, id).await?;
                check_transition(now.status, next)?;
                Err(BrokerError::conflict("quote changed concurrently"))
            }
            Err(e) => Err(e),
        }
    }

    /// Price a coverage from a granted provider on one of the caller's
    /// own, still bindable quotes.
    pub async fn add_line_item(
        &self,
        caller: &Caller,
        quote_id: Uuid,
        input: CreateLineItem,
    ) -> BrokerResult<QuoteLineItem> {
        authz::require(caller, ResourceKind::QuoteLineItem, Operation::Write)?;
        if !input.price.is_finite() || input.price < 0.0 {
            return Err(BrokerError::validation("price must be a non-negative number"));
        }
        let agency_id = caller.agency()?;
        let item = self
            .store
            .quotes()
            .add_line_item(caller.user_id, agency_id, quote_id, input)
            .await?;
        info!(
            caller = %caller.user_id,
            quote_id = %quote_id,
            provider_id = %item.provider_id,
            line_item_id = %item.id,
            "line item added"
        );
        Ok(item)
    }

    /// Line items visible to the caller. Naming a quote the caller
    /// cannot see is `NotFound` rather than an empty page.
    pub async fn list_line_items(
        &self,
        caller: &Caller,
        quote_id: Option<Uuid>,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<QuoteLineItem>> {
        let scope = authz::scope_filter(caller, ResourceKind::QuoteLineItem)?;
        if let Some(quote_id) = quote_id {
            self.store.quotes().get(scope, quote_id).await?;
        }
        self.store
            .quotes()
            .list_line_items(scope, quote_id, pagination)
            .await
    }

    /// Bind a quote, creating its policy.
    ///
    /// Either the quote ends up Bound with exactly one Active policy, or
    /// nothing changes. A quote that is already Bound is a `Conflict`.
    pub async fn bind(&self, caller: &Caller, input: BindQuote) -> BrokerResult<Policy> {
        authz::require(caller, ResourceKind::Policy, Operation::Write)?;
        if input.effective_date >= input.expiration_date {
            return Err(BrokerError::validation(
                "effective_date must precede expiration_date",
            ));
        }

        let scope = authz::scope_filter(caller, ResourceKind::Quote)?;
        let quote = self.store.quotes().get(scope, input.quote_id).await?;
        if !quote.status.is_bindable() {
            return Err(BrokerError::conflict("quote is already bound"));
        }

        let policy_number = match input.policy_number.as_deref().map(str::trim) {
            Some(number) if !number.is_empty() => number.to_string(),
            _ => generate_policy_number(Utc::now(), quote.id),
        };

        let policy = NewPolicy {
            id: Uuid::new_v4(),
            quote_id: quote.id,
            agent_id: caller.user_id,
            agency_id: caller.agency()?,
            provider_id: input.provider_id,
            policy_number,
            effective_date: input.effective_date,
            expiration_date: input.expiration_date,
            metadata: input
                .metadata
                .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
        };

        match self.store.policies().bind(policy).await {
            Ok(policy) => {
                info!(
                    caller = %caller.user_id,
                    quote_id = %policy.quote_id,
                    policy_id = %policy.id,
                    customer_id = %policy.customer_id,
                    "quote bound to policy"
                );
                Ok(policy)
            }
            Err(e) => {
                warn!(
                    caller = %caller.user_id,
                    quote_id = %quote.id,
                    error = %e,
                    "bind rejected"
                );
                Err(e)
            }
        }
    }

    pub async fn get_policy(&self, caller: &Caller, id: Uuid) -> BrokerResult<Policy> {
        let scope = authz::scope_filter(caller, ResourceKind::Policy)?;
        self.store.policies().get(scope, id).await
    }

    /// The policy bound from a quote, if the quote is visible and bound.
    pub async fn policy_for_quote(
        &self,
        caller: &Caller,
        quote_id: Uuid,
    ) -> BrokerResult<Option<Policy>> {
        let scope = authz::scope_filter(caller, ResourceKind::Quote)?;
        self.store.quotes().get(scope, quote_id).await?;
        self.store.policies().find_by_quote(quote_id).await
    }

    pub async fn list_policies(
        &self,
        caller: &Caller,
        pagination: Pagination,
    ) -> BrokerResult<PaginatedResult<Policy>> {
        let scope = authz::scope_filter(caller, ResourceKind::Policy)?;
        self.store.policies().list(scope, pagination).await
    }
}
