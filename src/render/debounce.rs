use crate::element::ElementId;

/// A property edit waiting for the input to go quiet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub id: ElementId,
    pub property: String,
    pub value: String,
    pub due_ms: u64,
}

/// Debounced property edits, one slot per element and property.
///
/// Times are caller-supplied milliseconds so the queue works the same under
/// a browser clock and in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdits {
    delay_ms: u64,
    edits: Vec<PendingEdit>,
}

impl PendingEdits {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            edits: Vec::new(),
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    /// Queues `value`, replacing an earlier value for the same slot and
    /// restarting its timer.
    pub fn schedule(&mut self, id: ElementId, property: &str, value: String, now_ms: u64) {
        let due_ms = now_ms + self.delay_ms;
        match self
            .edits
            .iter_mut()
            .find(|e| e.id == id && e.property == property)
        {
            Some(edit) => {
                edit.value = value;
                edit.due_ms = due_ms;
            }
            None => self.edits.push(PendingEdit {
                id,
                property: property.to_string(),
                value,
                due_ms,
            }),
        }
    }

    /// Removes and returns edits whose timer has expired, oldest first.
    pub fn due(&mut self, now_ms: u64) -> Vec<PendingEdit> {
        let (ready, waiting): (Vec<_>, Vec<_>) =
            self.edits.drain(..).partition(|e| e.due_ms <= now_ms);
        self.edits = waiting;
        ready
    }

    /// Takes one slot regardless of its timer, as on focus loss.
    pub fn take(&mut self, id: ElementId, property: &str) -> Option<PendingEdit> {
        let index = self
            .edits
            .iter()
            .position(|e| e.id == id && e.property == property)?;
        Some(self.edits.remove(index))
    }

    pub fn drain_all(&mut self) -> Vec<PendingEdit> {
        std::mem::take(&mut self.edits)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.edits.iter().map(|e| e.due_ms).min()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }
}
