//! Staged reveal and count-up animations
//!
//! Both are plain state machines. The page owns one per animated element and
//! a scheduler task steps it; nothing here knows about time except the
//! delays each step hands back.

use std::time::Duration;

use crate::dom::{Document, NodeId};

/// Offset an element starts from before sliding into place
pub const HIDDEN_OFFSET: &str = "translateY(20px)";
pub const RESTING_OFFSET: &str = "translateY(0)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Pending,   // Untouched, waiting for its stagger slot
    Hidden,    // Transparent and offset, transition armed
    Revealing, // Target style applied, transition running
    Visible,   // Transition finished
}

/// Fade-and-slide entrance for one element
#[derive(Debug, Clone)]
pub struct Reveal {
    pub target: NodeId,
    phase: RevealPhase,
    settle: Duration,     // Gap between hiding and revealing so the transition is observed
    transition: Duration, // CSS transition length
}

impl Reveal {
    pub fn new(target: NodeId, settle: Duration, transition: Duration) -> Self {
        Self {
            target,
            phase: RevealPhase::Pending,
            settle,
            transition,
        }
    }

    pub fn phase(&self) -> RevealPhase {
        self.phase
    }

    /// Move to the next phase and write its style.
    ///
    /// Returns how long until the following step, or `None` once visible.
    pub fn step(&mut self, doc: &mut Document) -> Option<Duration> {
        match self.phase {
            RevealPhase::Pending => {
                doc.set_style(self.target, "opacity", "0");
                doc.set_style(self.target, "transform", HIDDEN_OFFSET);
                doc.set_style(self.target, "transition", transition_css(self.transition));
                self.phase = RevealPhase::Hidden;
                Some(self.settle)
            }
            RevealPhase::Hidden => {
                doc.set_style(self.target, "opacity", "1");
                doc.set_style(self.target, "transform", RESTING_OFFSET);
                self.phase = RevealPhase::Revealing;
                Some(self.transition)
            }
            RevealPhase::Revealing => {
                self.phase = RevealPhase::Visible;
                None
            }
            RevealPhase::Visible => None,
        }
    }
}

fn transition_css(duration: Duration) -> String {
    format!("all {}s ease", duration.as_millis() as f64 / 1000.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStep {
    Running(i64),
    Finished(i64),
}

/// Counts a number display up from zero to the value it was rendered with
#[derive(Debug, Clone)]
pub struct CountUp {
    pub target: NodeId,
    goal: i64,
    current: i64,
    increment: i64,
    ticks: u32,
    finished: bool,
}

impl CountUp {
    /// `steps` is clamped to at least one
    pub fn new(target: NodeId, goal: i64, steps: u32) -> Self {
        let steps = i64::from(steps.max(1));
        // Integer division truncates toward zero, which is already the ceiling for negatives
        let increment = goal / steps + i64::from(goal % steps > 0);
        Self {
            target,
            goal,
            current: 0,
            increment,
            ticks: 0,
            finished: false,
        }
    }

    /// Build a counter from the element's rendered text; `None` when it holds no number
    pub fn from_text(target: NodeId, text: &str, steps: u32) -> Option<Self> {
        parse_leading_int(text).map(|goal| Self::new(target, goal, steps))
    }

    pub fn goal(&self) -> i64 {
        self.goal
    }

    pub fn increment(&self) -> i64 {
        self.increment
    }

    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn tick(&mut self) -> CountStep {
        if self.finished {
            return CountStep::Finished(self.goal);
        }
        self.ticks += 1;
        self.current = self.current.saturating_add(self.increment);
        if self.current >= self.goal {
            self.finished = true;
            CountStep::Finished(self.goal)
        } else {
            CountStep::Running(self.current)
        }
    }
}

/// Integer prefix of `text`: leading whitespace, optional sign, then digits
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits_len == 0 {
        return None;
    }
    let magnitude: i64 = rest[..digits_len].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_to_end(counter: &mut CountUp) -> (Vec<i64>, i64) {
        let mut shown = Vec::new();
        loop {
            match counter.tick() {
                CountStep::Running(v) => shown.push(v),
                CountStep::Finished(v) => return (shown, v),
            }
        }
    }

    #[test]
    fn test_count_up_lands_exactly_on_goal() {
        let node = Document::new().root();
        for goal in [0, 1, 7, 19, 20, 21, 99, 137, 1000, 123_457] {
            let mut counter = CountUp::new(node, goal, 20);
            let (shown, last) = run_to_end(&mut counter);
            assert_eq!(last, goal);
            assert!(counter.ticks() <= 20, "goal {} took {} ticks", goal, counter.ticks());
            assert!(shown.windows(2).all(|w| w[0] < w[1]));
            assert!(shown.iter().all(|&v| v < goal));
        }
    }

    #[test]
    fn test_count_up_increment_is_ceiling() {
        let node = Document::new().root();
        assert_eq!(CountUp::new(node, 137, 20).increment(), 7);
        assert_eq!(CountUp::new(node, 40, 20).increment(), 2);
        assert_eq!(CountUp::new(node, -50, 20).increment(), -2);
    }

    #[test]
    fn test_zero_and_negative_goals_finish_on_first_tick() {
        let node = Document::new().root();
        let mut zero = CountUp::new(node, 0, 20);
        assert_eq!(zero.tick(), CountStep::Finished(0));

        let mut negative = CountUp::new(node, -50, 20);
        assert_eq!(negative.tick(), CountStep::Finished(-50));
        assert_eq!(negative.ticks(), 1);
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  128 users"), Some(128));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("1,234"), Some(1));
        assert_eq!(parse_leading_int("n/a"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
    }

    #[test]
    fn test_reveal_phases_and_styles() {
        let mut doc = Document::new();
        let card = doc.create_element("div");
        doc.append_child(doc.root(), card);
        let mut reveal = Reveal::new(card, Duration::from_millis(100), Duration::from_millis(600));

        assert_eq!(reveal.step(&mut doc), Some(Duration::from_millis(100)));
        assert_eq!(reveal.phase(), RevealPhase::Hidden);
        assert_eq!(doc.style(card, "opacity"), Some("0"));
        assert_eq!(doc.style(card, "transform"), Some(HIDDEN_OFFSET));
        assert_eq!(doc.style(card, "transition"), Some("all 0.6s ease"));

        assert_eq!(reveal.step(&mut doc), Some(Duration::from_millis(600)));
        assert_eq!(reveal.phase(), RevealPhase::Revealing);
        assert_eq!(doc.style(card, "opacity"), Some("1"));
        assert_eq!(doc.style(card, "transform"), Some(RESTING_OFFSET));

        assert_eq!(reveal.step(&mut doc), None);
        assert_eq!(reveal.phase(), RevealPhase::Visible);
        assert_eq!(reveal.step(&mut doc), None);
    }
}
