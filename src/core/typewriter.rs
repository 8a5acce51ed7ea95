/// Typewriter text reveal — a pure timing model for the dialogue box.
///
/// The shell feeds it the current time and reads back the visible
/// prefix; no threads, no callbacks. Reveal progress is counted in
/// characters, never bytes, so multibyte text cannot be split
/// mid-character.

/// How dialogue text appears. `Fade` is revealed all at once like
/// `Instant`; the shell owns the opacity animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealMode {
    #[default]
    Typewriter,
    Instant,
    Fade,
}

/// Default per-character reveal interval in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Typewriter {
    text: String,
    chars_total: usize,
    chars_shown: usize,
    mode: RevealMode,
    interval_ms: u64,
    last_reveal_at: u64,
}

impl Typewriter {
    pub fn new(mode: RevealMode) -> Self {
        Self {
            text: String::new(),
            chars_total: 0,
            chars_shown: 0,
            mode,
            interval_ms: DEFAULT_INTERVAL_MS,
            last_reveal_at: 0,
        }
    }

    pub fn with_interval(mode: RevealMode, interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            ..Self::new(mode)
        }
    }

    pub fn mode(&self) -> RevealMode {
        self.mode
    }

    /// Begin revealing a new line. Any reveal in progress is dropped;
    /// only one line animates at a time.
    pub fn set_text(&mut self, text: &str, now_ms: u64) {
        self.text = text.to_string();
        self.chars_total = text.chars().count();
        self.chars_shown = match self.mode {
            RevealMode::Typewriter => 0,
            RevealMode::Instant | RevealMode::Fade => self.chars_total,
        };
        self.last_reveal_at = now_ms;
    }

    /// Advance the reveal to `now_ms`. Returns true if more characters
    /// became visible.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        if !self.is_revealing() {
            return false;
        }
        let elapsed = now_ms.saturating_sub(self.last_reveal_at);
        let steps = (elapsed / self.interval_ms) as usize;
        if steps == 0 {
            return false;
        }
        self.chars_shown = (self.chars_shown + steps).min(self.chars_total);
        self.last_reveal_at += steps as u64 * self.interval_ms;
        true
    }

    /// Jump to the fully revealed text (the skip button).
    pub fn skip(&mut self) {
        self.chars_shown = self.chars_total;
    }

    pub fn is_revealing(&self) -> bool {
        self.chars_shown < self.chars_total
    }

    /// The currently visible prefix of the line.
    pub fn visible(&self) -> &str {
        if self.chars_shown >= self.chars_total {
            return &self.text;
        }
        let end = self
            .text
            .char_indices()
            .nth(self.chars_shown)
            .map_or(self.text.len(), |(i, _)| i);
        &self.text[..end]
    }

    pub fn full_text(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typewriter_reveals_one_char_per_interval() {
        let mut tw = Typewriter::new(RevealMode::Typewriter);
        tw.set_text("abcd", 0);
        assert_eq!(tw.visible(), "");
        assert!(tw.is_revealing());

        assert!(tw.tick(30));
        assert_eq!(tw.visible(), "a");
        assert!(!tw.tick(45), "partial interval reveals nothing");
        assert!(tw.tick(90));
        assert_eq!(tw.visible(), "abc");
        assert!(tw.tick(10_000));
        assert_eq!(tw.visible(), "abcd");
        assert!(!tw.is_revealing());
        assert!(!tw.tick(20_000));
    }

    #[test]
    fn instant_and_fade_reveal_everything_immediately() {
        for mode in [RevealMode::Instant, RevealMode::Fade] {
            let mut tw = Typewriter::new(mode);
            tw.set_text("hello", 0);
            assert_eq!(tw.visible(), "hello");
            assert!(!tw.is_revealing());
        }
    }

    #[test]
    fn skip_jumps_to_full_text() {
        let mut tw = Typewriter::new(RevealMode::Typewriter);
        tw.set_text("a long line of dialogue", 0);
        tw.tick(60);
        tw.skip();
        assert_eq!(tw.visible(), "a long line of dialogue");
        assert!(!tw.is_revealing());
    }

    #[test]
    fn set_text_drops_reveal_in_progress() {
        let mut tw = Typewriter::new(RevealMode::Typewriter);
        tw.set_text("first", 0);
        tw.tick(90);
        tw.set_text("second", 100);
        assert_eq!(tw.visible(), "");
        assert!(!tw.tick(100), "clock restarts from the new line");
        assert!(tw.tick(130));
        assert_eq!(tw.visible(), "s");
    }

    #[test]
    fn reveal_respects_char_boundaries() {
        let mut tw = Typewriter::new(RevealMode::Typewriter);
        tw.set_text("灯台へ", 0);
        tw.tick(30);
        assert_eq!(tw.visible(), "灯");
        tw.tick(60);
        assert_eq!(tw.visible(), "灯台");
        tw.tick(90);
        assert_eq!(tw.visible(), "灯台へ");
    }

    #[test]
    fn custom_interval() {
        let mut tw = Typewriter::with_interval(RevealMode::Typewriter, 10);
        tw.set_text("abc", 0);
        tw.tick(25);
        assert_eq!(tw.visible(), "ab");
    }
}
