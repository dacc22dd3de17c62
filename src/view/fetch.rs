/// Identifies one fetch issued by a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

/// Sequence counter per view. Only the latest ticket may write the view's
/// rendered region; anything older finished too late and is dropped.
#[derive(Clone, Debug, Default)]
pub struct FetchSlot {
    latest: u64,
    in_flight: bool,
}

impl FetchSlot {
    pub fn issue(&mut self) -> Ticket {
        self.latest += 1;
        self.in_flight = true;
        Ticket(self.latest)
    }

    /// Makes every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.in_flight = false;
    }

    /// Consumes `ticket` if it is still current.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if ticket.0 == self.latest && self.in_flight {
            self.in_flight = false;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn older_ticket_loses() {
        let mut slot = FetchSlot::default();
        let first = slot.issue();
        let second = slot.issue();
        assert!(slot.accept(second));
        assert!(!slot.accept(first));
    }

    #[test]
    fn invalidate_drops_outstanding() {
        let mut slot = FetchSlot::default();
        let t = slot.issue();
        slot.invalidate();
        assert!(!slot.accept(t));
        assert!(!slot.is_loading());
    }

    #[test]
    fn ticket_is_accepted_once() {
        let mut slot = FetchSlot::default();
        let t = slot.issue();
        assert!(slot.accept(t));
        assert!(!slot.accept(t));
    }
}
