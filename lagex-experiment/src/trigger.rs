/// Rising-edge detector over a polled button.
#[derive(Debug, Clone, Default)]
pub struct EdgeTrigger {
    previous: bool,
}

impl EdgeTrigger {
    pub fn new() -> Self {
        Self { previous: false }
    }

    /// True only on the tick where `raw` goes from released to pressed.
    pub fn update(&mut self, raw: bool) -> bool {
        let fired = raw && !self.previous;
        self.previous = raw;
        fired
    }

    /// Level of the last raw value, without edge semantics.
    pub fn is_held(&self) -> bool {
        self.previous
    }

    pub fn reset(&mut self) {
        self.previous = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn holding_fires_once() {
        let mut trigger = EdgeTrigger::new();
        let fired: Vec<bool> = [true; 10].iter().map(|&raw| trigger.update(raw)).collect();
        assert_eq!(fired.iter().filter(|&&f| f).count(), 1);
        assert!(fired[0]);
        assert!(trigger.is_held());
    }

    #[test]
    fn fires_again_after_release() {
        let mut trigger = EdgeTrigger::new();
        let pattern = [false, true, true, false, false, true, false, true];
        let fired: Vec<bool> = pattern.iter().map(|&raw| trigger.update(raw)).collect();
        assert_eq!(
            fired,
            vec![false, true, false, false, false, true, false, true]
        );
    }

    #[test]
    fn reset_primes_released_state() {
        let mut trigger = EdgeTrigger::new();
        trigger.update(true);
        trigger.reset();
        assert!(!trigger.is_held());
        assert!(trigger.update(true));
    }
}
