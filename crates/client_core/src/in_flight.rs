//! Ticketing shared by the controllers.
//!
//! Every state-touching action takes a monotonically increasing ticket when
//! it is issued. The [`InFlight`] guard releases the action's loading claim
//! when dropped, whether the call resolved, failed or its future was dropped
//! mid-flight.

pub(crate) trait Tracked {
    fn finish(&self, ticket: u64);
}

pub(crate) struct InFlight<'a, C: Tracked + ?Sized> {
    owner: &'a C,
    ticket: u64,
}

impl<'a, C: Tracked + ?Sized> InFlight<'a, C> {
    pub(crate) fn new(owner: &'a C, ticket: u64) -> Self {
        Self { owner, ticket }
    }

    pub(crate) fn ticket(&self) -> u64 {
        self.ticket
    }
}

impl<C: Tracked + ?Sized> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        self.owner.finish(self.ticket);
    }
}

/// Issue and in-flight bookkeeping for one stream of tickets.
#[derive(Debug, Default)]
pub(crate) struct TicketBook {
    issued: u64,
    in_flight: usize,
}

impl TicketBook {
    pub(crate) fn issue(&mut self) -> u64 {
        self.issued += 1;
        self.in_flight += 1;
        self.issued
    }

    /// Returns true when nothing is in flight any more.
    pub(crate) fn release(&mut self) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.in_flight == 0
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.in_flight > 0
    }
}
