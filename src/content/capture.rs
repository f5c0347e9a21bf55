/// Text capture, dedup and batching for one page load

/// What the caller should do after recording a mutation batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushSchedule {
    /// Arm a single-shot timer for this many milliseconds
    Arm(u32),
    /// A flush is already pending
    AlreadyArmed,
}

/// All-time and since-last-flush text seen on the page.
#[derive(Debug, Default, Clone)]
pub struct SessionBuffer {
    all_seen: Vec<String>,
    pending: Vec<String>,
}

impl SessionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one candidate. Returns true if it had never been seen on this page.
    pub fn observe(&mut self, raw: &str) -> bool {
        let text = raw.trim();
        if text.is_empty() || self.all_seen.iter().any(|seen| seen == text) {
            return false;
        }
        self.all_seen.push(text.to_string());
        self.pending.push(text.to_string());
        true
    }

    /// Take everything pending, leaving the buffer empty.
    pub fn drain_pending(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending)
    }

    /// Forget pending text without sending it. Seen history is kept.
    pub fn mark_prompt_submitted(&mut self) {
        self.pending.clear();
    }

    pub fn pending(&self) -> &[String] {
        &self.pending
    }

    pub fn all_seen(&self) -> &[String] {
        &self.all_seen
    }
}

/// Session buffer plus the single-shot flush timer state.
///
/// At most one flush is outstanding; bursts of mutations inside the flush
/// delay go out together as one batch.
#[derive(Debug, Clone)]
pub struct CaptureSession {
    buffer: SessionBuffer,
    flush_delay_ms: u32,
    flush_due_at: Option<f64>,
}

impl CaptureSession {
    pub fn new(flush_delay_ms: u32) -> Self {
        CaptureSession {
            buffer: SessionBuffer::new(),
            flush_delay_ms,
            flush_due_at: None,
        }
    }

    /// Record the candidate texts of one mutation batch observed at `now_ms`.
    pub fn record<I, S>(&mut self, candidates: I, now_ms: f64) -> FlushSchedule
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for candidate in candidates {
            self.buffer.observe(candidate.as_ref());
        }
        match self.flush_due_at {
            Some(_) => FlushSchedule::AlreadyArmed,
            None => {
                self.flush_due_at = Some(now_ms + f64::from(self.flush_delay_ms));
                FlushSchedule::Arm(self.flush_delay_ms)
            }
        }
    }

    /// Timer fired: clear the timer and return the batch to send, if any.
    pub fn flush(&mut self) -> Option<Vec<String>> {
        self.flush_due_at = None;
        let batch = self.buffer.drain_pending();
        if batch.is_empty() { None } else { Some(batch) }
    }

    pub fn mark_prompt_submitted(&mut self) {
        self.buffer.mark_prompt_submitted();
    }

    pub fn flush_due_at(&self) -> Option<f64> {
        self.flush_due_at
    }

    pub fn buffer(&self) -> &SessionBuffer {
        &self.buffer
    }
}
