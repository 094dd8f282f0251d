//! The purchase saga: transition table and handlers.

use async_trait::async_trait;
use saga_engine::{Applied, CorrelatedEvent, Outbox, SagaDefinition, TransitionTable};
use saga_store::SagaInstance;
use tracing::info;

use crate::commands::PurchaseCommand;
use crate::events::{PurchaseEvent, PurchaseEventKind, PurchaseRequestedData};
use crate::instance::PurchaseSaga;
use crate::pricing::{PriceQuote, PricingActivity, PricingError};
use crate::state::PurchaseState;

/// Handler for the initial transition, fed the already-resolved price.
///
/// Pricing is the only activity the saga consults, and only here; keeping
/// the handler itself a total function means a pricing failure is a
/// faulting transition, not an error the transport would redeliver.
type StartHandler = fn(
    &PurchaseRequestedData,
    Result<PriceQuote, PricingError>,
    &mut Outbox<PurchaseCommand>,
) -> PurchaseSaga;

/// Handler for a transition from an existing state.
type StepHandler = fn(&mut PurchaseSaga, &PurchaseEvent, &mut Outbox<PurchaseCommand>);

/// Tagged transition handler stored in the table.
#[derive(Clone, Copy)]
pub enum Handler {
    /// Creates the instance; registered only for the pre-initial state.
    Start(StartHandler),
    /// Mutates an existing instance's working copy.
    Step(StepHandler),
}

/// The purchase saga definition: owns the pricing activity and the
/// transition table mapping (state, event kind) to handlers.
pub struct PurchaseSagaDefinition<P> {
    pricing: P,
    table: TransitionTable<PurchaseState, PurchaseEventKind, Handler>,
}

impl<P> PurchaseSagaDefinition<P> {
    /// Builds the definition with the full purchase transition table.
    ///
    /// Terminal states register no handlers, so late or duplicate events
    /// against `Completed` and `Faulted` instances fall through to
    /// [`Applied::Ignored`].
    pub fn new(pricing: P) -> Self {
        let table = TransitionTable::new()
            .initially(PurchaseEventKind::PurchaseRequested, Handler::Start(on_purchase_requested))
            .during(
                PurchaseState::Accepted,
                PurchaseEventKind::InventoryItemsGranted,
                Handler::Step(on_items_granted),
            )
            .during(
                PurchaseState::Accepted,
                PurchaseEventKind::GrantItemsFaulted,
                Handler::Step(on_grant_items_faulted),
            )
            .during(
                PurchaseState::ItemsGranted,
                PurchaseEventKind::GilDebited,
                Handler::Step(on_gil_debited),
            )
            .during(
                PurchaseState::ItemsGranted,
                PurchaseEventKind::DebitGilFaulted,
                Handler::Step(on_debit_gil_faulted),
            );

        Self { pricing, table }
    }

    /// Returns the number of registered transitions.
    pub fn transition_count(&self) -> usize {
        self.table.len()
    }
}

/// Initial transition: price the purchase, then either accept it and ask
/// inventory to grant the items, or fault it before anything downstream
/// is asked to act.
fn on_purchase_requested(
    data: &PurchaseRequestedData,
    quote: Result<PriceQuote, PricingError>,
    outbox: &mut Outbox<PurchaseCommand>,
) -> PurchaseSaga {
    match quote {
        Ok(quote) => {
            outbox.send(PurchaseCommand::grant_items(
                data.user_id,
                data.item_id,
                data.quantity,
                data.correlation_id,
            ));
            PurchaseSaga::accepted(
                data.correlation_id,
                data.user_id,
                data.item_id,
                data.quantity,
                quote.total,
            )
        }
        Err(err) => {
            PurchaseSaga::faulted(
                data.correlation_id,
                data.user_id,
                data.item_id,
                data.quantity,
                err.to_string(),
            )
        }
    }
}

/// Accepted + InventoryItemsGranted: the items are in the buyer's
/// inventory, so ask the ledger to debit the priced total.
fn on_items_granted(
    saga: &mut PurchaseSaga,
    _event: &PurchaseEvent,
    outbox: &mut Outbox<PurchaseCommand>,
) {
    // An Accepted instance is priced during its initial transition; an
    // unpriced one must never reach the ledger.
    let Some(total) = saga.purchase_total() else {
        saga.record_error("accepted purchase has no priced total");
        saga.transition_to(PurchaseState::Faulted);
        return;
    };
    outbox.send(PurchaseCommand::debit_gil(
        saga.user_id(),
        total,
        saga.correlation_id(),
    ));
    saga.transition_to(PurchaseState::ItemsGranted);
}

/// Accepted + GrantItemsFaulted: nothing was granted, so nothing needs
/// compensating; record the failure and fault.
fn on_grant_items_faulted(
    saga: &mut PurchaseSaga,
    event: &PurchaseEvent,
    _outbox: &mut Outbox<PurchaseCommand>,
) {
    if let PurchaseEvent::GrantItemsFaulted(data) = event {
        saga.record_error(data.reason.clone());
    }
    saga.transition_to(PurchaseState::Faulted);
}

/// ItemsGranted + GilDebited: payment settled, the purchase is done.
fn on_gil_debited(
    saga: &mut PurchaseSaga,
    _event: &PurchaseEvent,
    _outbox: &mut Outbox<PurchaseCommand>,
) {
    saga.transition_to(PurchaseState::Completed);
}

/// ItemsGranted + DebitGilFaulted: the debit failed after items were
/// granted, so emit the compensation returning them, then fault.
fn on_debit_gil_faulted(
    saga: &mut PurchaseSaga,
    event: &PurchaseEvent,
    outbox: &mut Outbox<PurchaseCommand>,
) {
    if let PurchaseEvent::DebitGilFaulted(data) = event {
        saga.record_error(data.reason.clone());
    }
    outbox.send(PurchaseCommand::substract_items(
        saga.user_id(),
        saga.item_id(),
        saga.quantity(),
        saga.correlation_id(),
    ));
    saga.transition_to(PurchaseState::Faulted);
}

#[async_trait]
impl<P> SagaDefinition for PurchaseSagaDefinition<P>
where
    P: PricingActivity,
{
    type Instance = PurchaseSaga;
    type Event = PurchaseEvent;
    type Command = PurchaseCommand;

    async fn start(
        &self,
        event: &PurchaseEvent,
        outbox: &mut Outbox<PurchaseCommand>,
    ) -> Option<PurchaseSaga> {
        let handler = self.table.lookup(None, event.kind())?;

        let Handler::Start(handler) = handler else {
            return None;
        };
        let PurchaseEvent::PurchaseRequested(data) = event else {
            return None;
        };

        let quote = self.pricing.resolve(data.item_id, data.quantity).await;
        let saga = handler(data, quote, outbox);
        info!(
            correlation_id = %saga.correlation_id(),
            state = %saga.state(),
            "purchase saga started"
        );
        Some(saga)
    }

    async fn advance(
        &self,
        instance: &mut PurchaseSaga,
        event: &PurchaseEvent,
        outbox: &mut Outbox<PurchaseCommand>,
    ) -> Applied {
        let from = instance.state();
        match self.table.lookup(Some(from), event.kind()) {
            Some(Handler::Step(handler)) => {
                handler(instance, event, outbox);
                info!(
                    correlation_id = %instance.correlation_id(),
                    event = event.name(),
                    %from,
                    to = %instance.state(),
                    "purchase saga advanced"
                );
                Applied::Mutated
            }
            // Start handlers never register against stored states.
            Some(Handler::Start(_)) | None => Applied::Ignored,
        }
    }
}
