use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollState {
    Idle,
    ScrollingForward,
    PausedAtEnd,
    ScrollingBackward,
    PausedAtStart,
}

impl ScrollState {
    pub fn is_active(self) -> bool {
        self != Self::Idle
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Distance moved per tick.
    pub step: u32,
    pub tick: Duration,
    /// How long each end is held before reversing.
    pub dwell: Duration,
    /// How close to an end counts as reaching it.
    pub epsilon: u32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            step: 1,
            tick: Duration::from_millis(50),
            dwell: Duration::from_secs(2),
            epsilon: 5,
        }
    }
}

/// Scroll position over a single region, advanced one tick at a time.
///
/// Runs only while kiosk mode is on and the content is taller than the viewport.
#[derive(Debug, Clone)]
pub struct AutoScroller {
    config: ScrollConfig,
    state: ScrollState,
    position: u32,
    content: u32,
    viewport: u32,
    kiosk: bool,
    paused_for: Duration,
}

impl AutoScroller {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            config,
            state: ScrollState::Idle,
            position: 0,
            content: 0,
            viewport: 0,
            kiosk: false,
            paused_for: Duration::ZERO,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn state(&self) -> ScrollState {
        self.state
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn overflows(&self) -> bool {
        self.content > self.viewport
    }

    pub fn max_position(&self) -> u32 {
        self.content.saturating_sub(self.viewport)
    }

    pub fn set_kiosk(&mut self, enabled: bool) {
        self.kiosk = enabled;
        self.reevaluate();
    }

    /// New content or viewport extent, e.g. after an edit or a window resize.
    pub fn resize(&mut self, content: u32, viewport: u32) {
        self.content = content;
        self.viewport = viewport;
        self.reevaluate();
    }

    /// Advances by one configured tick.
    pub fn tick(&mut self) {
        let max = self.max_position();
        let epsilon = self.config.epsilon;
        match self.state {
            ScrollState::Idle => {}
            ScrollState::ScrollingForward => {
                self.position = self.position.saturating_add(self.config.step).min(max);
                if self.position >= max.saturating_sub(epsilon) {
                    self.enter(ScrollState::PausedAtEnd);
                }
            }
            ScrollState::ScrollingBackward => {
                self.position = self.position.saturating_sub(self.config.step);
                if self.position <= epsilon {
                    self.enter(ScrollState::PausedAtStart);
                }
            }
            ScrollState::PausedAtEnd | ScrollState::PausedAtStart => {
                self.paused_for += self.config.tick;
                if self.paused_for >= self.config.dwell {
                    let next = if self.state == ScrollState::PausedAtEnd {
                        ScrollState::ScrollingBackward
                    } else {
                        ScrollState::ScrollingForward
                    };
                    self.enter(next);
                }
            }
        }
    }

    fn reevaluate(&mut self) {
        if !(self.kiosk && self.overflows()) {
            self.position = 0;
            self.enter(ScrollState::Idle);
            return;
        }
        self.position = self.position.min(self.max_position());
        if self.state == ScrollState::Idle {
            self.enter(ScrollState::ScrollingForward);
        }
    }

    fn enter(&mut self, state: ScrollState) {
        self.state = state;
        self.paused_for = Duration::ZERO;
    }
}

impl Default for AutoScroller {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kiosk(content: u32, viewport: u32) -> AutoScroller {
        let mut scroller = AutoScroller::default();
        scroller.resize(content, viewport);
        scroller.set_kiosk(true);
        scroller
    }

    fn dwell_ticks(scroller: &AutoScroller) -> u32 {
        let config = scroller.config();
        (config.dwell.as_millis() / config.tick.as_millis()) as u32
    }

    #[test]
    fn stays_idle_without_overflow_or_kiosk() {
        let mut scroller = AutoScroller::default();
        scroller.resize(1000, 400);
        assert_eq!(scroller.state(), ScrollState::Idle);

        let mut fits = kiosk(300, 400);
        fits.tick();
        assert_eq!(fits.state(), ScrollState::Idle);
        assert_eq!(fits.position(), 0);
    }

    #[test]
    fn reverses_at_the_end_after_dwelling() {
        let mut scroller = kiosk(1000, 400);
        assert_eq!(scroller.state(), ScrollState::ScrollingForward);

        let mut ticks = 0;
        while scroller.state() == ScrollState::ScrollingForward {
            scroller.tick();
            ticks += 1;
        }
        assert_eq!(scroller.state(), ScrollState::PausedAtEnd);
        assert_eq!(scroller.position(), 595);
        assert_eq!(ticks, 595);

        for _ in 0..dwell_ticks(&scroller) - 1 {
            scroller.tick();
            assert_eq!(scroller.state(), ScrollState::PausedAtEnd);
            assert_eq!(scroller.position(), 595);
        }
        scroller.tick();
        assert_eq!(scroller.state(), ScrollState::ScrollingBackward);
        assert_eq!(scroller.position(), 595);

        scroller.tick();
        assert_eq!(scroller.position(), 594);
    }

    #[test]
    fn reverses_at_the_start_after_dwelling() {
        let mut scroller = kiosk(1000, 400);
        while scroller.state() != ScrollState::ScrollingBackward {
            scroller.tick();
        }
        while scroller.state() == ScrollState::ScrollingBackward {
            scroller.tick();
        }
        assert_eq!(scroller.state(), ScrollState::PausedAtStart);
        assert_eq!(scroller.position(), 5);

        for _ in 0..dwell_ticks(&scroller) {
            scroller.tick();
        }
        assert_eq!(scroller.state(), ScrollState::ScrollingForward);
        scroller.tick();
        assert_eq!(scroller.position(), 6);
    }

    #[test]
    fn shrinking_content_cancels_to_idle_at_top() {
        let mut scroller = kiosk(1000, 400);
        for _ in 0..250 {
            scroller.tick();
        }
        assert_eq!(scroller.position(), 250);

        scroller.resize(350, 400);
        assert_eq!(scroller.state(), ScrollState::Idle);
        assert_eq!(scroller.position(), 0);

        scroller.resize(1000, 400);
        assert_eq!(scroller.state(), ScrollState::ScrollingForward);
        assert_eq!(scroller.position(), 0);
    }

    #[test]
    fn leaving_kiosk_mode_halts() {
        let mut scroller = kiosk(1000, 400);
        for _ in 0..10 {
            scroller.tick();
        }
        scroller.set_kiosk(false);
        assert_eq!(scroller.state(), ScrollState::Idle);
        scroller.tick();
        assert_eq!(scroller.position(), 0);
    }

    #[test]
    fn growing_viewport_clamps_position() {
        let mut scroller = kiosk(1000, 400);
        for _ in 0..500 {
            scroller.tick();
        }
        scroller.resize(1000, 700);
        assert_eq!(scroller.position(), 300);
        assert_eq!(scroller.state(), ScrollState::ScrollingForward);
        scroller.tick();
        assert_eq!(scroller.state(), ScrollState::PausedAtEnd);
    }

    #[test]
    fn tiny_overflow_alternates_pauses() {
        let mut scroller = kiosk(403, 400);
        scroller.tick();
        assert_eq!(scroller.state(), ScrollState::PausedAtEnd);
        for _ in 0..dwell_ticks(&scroller) {
            scroller.tick();
        }
        scroller.tick();
        assert_eq!(scroller.state(), ScrollState::PausedAtStart);
    }
}
