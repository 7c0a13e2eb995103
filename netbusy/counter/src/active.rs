use crate::activity::ActivityCounter;

/// A handle that decrements the activity count on drop.
#[derive(Debug)]
pub struct Active(Option<ActivityCounter>);

// ===== impl Active =====

impl Active {
    pub(crate) fn new(counter: ActivityCounter) -> Self {
        counter.increment();
        Active(Some(counter))
    }

    /// Ends the activity now. Returns `false` if it had already ended.
    pub fn release(&mut self) -> bool {
        match self.0.take() {
            Some(counter) => {
                counter.decrement();
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.0.is_none()
    }
}

impl Drop for Active {
    fn drop(&mut self) {
        self.release();
    }
}
