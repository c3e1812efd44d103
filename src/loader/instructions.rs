pub const INSTRUCTION_INTERVAL_MS: f32 = 2500.0;

/// Which instruction line is showing
/// - starts on the first line, moves to the next every interval and wraps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstructionCycle {
    index: usize,
    len: usize,
    elapsed_ms: f32,
}

impl InstructionCycle {
    pub fn new(len: usize) -> Self {
        InstructionCycle {
            index: 0,
            len,
            elapsed_ms: 0.0,
        }
    }

    /// Returns true when the visible line changed
    pub fn advance(&mut self, delta_ms: f32) -> bool {
        if self.len < 2 {
            return false;
        }
        self.elapsed_ms += delta_ms.max(0.0);
        let mut changed = false;
        while self.elapsed_ms >= INSTRUCTION_INTERVAL_MS {
            self.elapsed_ms -= INSTRUCTION_INTERVAL_MS;
            self.index = (self.index + 1) % self.len;
            changed = true;
        }
        changed
    }

    pub fn current<'a>(&self, lines: &'a [String]) -> Option<&'a str> {
        lines.get(self.index).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines() -> Vec<String> {
        ["one", "two", "three"].into_iter().map(String::from).collect()
    }

    #[test]
    fn shows_first_line_immediately() {
        let cycle = InstructionCycle::new(3);
        assert_eq!(cycle.current(&lines()), Some("one"));
    }

    #[test]
    fn moves_on_each_interval_and_wraps() {
        let lines = lines();
        let mut cycle = InstructionCycle::new(lines.len());
        assert!(!cycle.advance(INSTRUCTION_INTERVAL_MS - 1.0));
        assert!(cycle.advance(1.0));
        assert_eq!(cycle.current(&lines), Some("two"));
        assert!(cycle.advance(INSTRUCTION_INTERVAL_MS));
        assert!(cycle.advance(INSTRUCTION_INTERVAL_MS));
        assert_eq!(cycle.current(&lines), Some("one"));
    }

    #[test]
    fn long_frames_skip_lines() {
        let lines = lines();
        let mut cycle = InstructionCycle::new(lines.len());
        assert!(cycle.advance(INSTRUCTION_INTERVAL_MS * 2.0));
        assert_eq!(cycle.current(&lines), Some("three"));
    }

    #[test]
    fn single_or_empty_lists_never_change() {
        let mut single = InstructionCycle::new(1);
        let mut empty = InstructionCycle::new(0);
        assert!(!single.advance(INSTRUCTION_INTERVAL_MS * 4.0));
        assert!(!empty.advance(INSTRUCTION_INTERVAL_MS * 4.0));
        assert_eq!(empty.current(&[]), None);
    }
}
