/// Identifies one outstanding request on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Monotonic request counter. Only the most recently issued ticket is current,
/// so a response that arrives after a newer request was started gets dropped.
#[derive(Debug, Default)]
pub struct RequestGeneration {
    current: u64,
}

impl RequestGeneration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> Ticket {
        self.current += 1;
        Ticket(self.current)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.current
    }

    /// Make every outstanding ticket stale.
    pub fn invalidate(&mut self) {
        self.current += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newer_request_supersedes_older() {
        let mut generation = RequestGeneration::new();
        let first = generation.begin();
        let second = generation.begin();

        assert!(!generation.is_current(first));
        assert!(generation.is_current(second));
    }

    #[test]
    fn test_invalidate() {
        let mut generation = RequestGeneration::new();
        let ticket = generation.begin();
        generation.invalidate();
        assert!(!generation.is_current(ticket));
    }
}
