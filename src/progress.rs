//! Terminal "working" indicator shown while a request is outstanding.
//!
//! The spinner is an indicatif bar with a steady tick, owned by an [`IndicatorGuard`].
//! Dropping the guard (or calling [`IndicatorGuard::stop`]) stops the ticker thread and
//! clears the line, so no frame is drawn after the guard is gone.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle, TermLike};

/// Spinner frames. The last entry is the finished glyph, which is never shown because the
/// bar is cleared on stop.
const DOTS_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];
const DEFAULT_TICK: Duration = Duration::from_millis(100);
const WRITER_WIDTH: u16 = 80;

/// Produces the draw target an indicator renders to. Called once per indicator start.
pub type SinkFactory = Arc<dyn Fn() -> ProgressDrawTarget + Send + Sync>;

/// Sink factory that draws to standard error; hidden when stderr is not a terminal.
pub fn stderr_sink() -> SinkFactory {
    Arc::new(ProgressDrawTarget::stderr)
}

/// Sink factory that draws into arbitrary writers, e.g. a log file or a test buffer.
pub fn writer_sink<F>(make_writer: F) -> SinkFactory
where
    F: Fn() -> Box<dyn Write + Send> + Send + Sync + 'static,
{
    Arc::new(move || ProgressDrawTarget::term_like(Box::new(WriterTerm::new(make_writer()))))
}

/// Adapts a plain writer to indicatif's terminal interface using ANSI cursor codes.
struct WriterTerm {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterTerm {
    fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    fn with_writer<T>(&self, f: impl FnOnce(&mut dyn Write) -> io::Result<T>) -> io::Result<T> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("indicator writer poisoned"))?;
        f(writer.as_mut())
    }

    fn cursor(&self, n: usize, code: char) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.write_str(&format!("\x1b[{n}{code}"))
    }
}

impl fmt::Debug for WriterTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterTerm").finish_non_exhaustive()
    }
}

impl TermLike for WriterTerm {
    fn width(&self) -> u16 {
        WRITER_WIDTH
    }

    fn move_cursor_up(&self, n: usize) -> io::Result<()> {
        self.cursor(n, 'A')
    }

    fn move_cursor_down(&self, n: usize) -> io::Result<()> {
        self.cursor(n, 'B')
    }

    fn move_cursor_right(&self, n: usize) -> io::Result<()> {
        self.cursor(n, 'C')
    }

    fn move_cursor_left(&self, n: usize) -> io::Result<()> {
        self.cursor(n, 'D')
    }

    fn write_line(&self, s: &str) -> io::Result<()> {
        self.with_writer(|writer| writeln!(writer, "{s}"))
    }

    fn write_str(&self, s: &str) -> io::Result<()> {
        self.with_writer(|writer| writer.write_all(s.as_bytes()))
    }

    fn clear_line(&self) -> io::Result<()> {
        self.write_str("\r\x1b[2K")
    }

    fn flush(&self) -> io::Result<()> {
        self.with_writer(|writer| writer.flush())
    }
}

/// Configuration for a spinner line such as `⠙ Thinking...`.
#[derive(Debug, Clone)]
pub struct LoadingIndicator {
    message: String,
    tick: Duration,
}

impl LoadingIndicator {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            tick: DEFAULT_TICK,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Starts animating into `target` and returns the guard that owns the spinner.
    pub fn start(self, target: ProgressDrawTarget) -> IndicatorGuard {
        let bar = ProgressBar::with_draw_target(None, target);
        bar.set_style(ProgressStyle::default_spinner().tick_strings(DOTS_FRAMES));
        bar.set_message(format!("{}...", self.message));
        bar.tick();
        bar.enable_steady_tick(self.tick);
        IndicatorGuard { bar: Some(bar) }
    }
}

/// Owns a running indicator. Stops the ticker and clears the line on drop.
#[derive(Debug)]
pub struct IndicatorGuard {
    bar: Option<ProgressBar>,
}

impl IndicatorGuard {
    /// Returns `true` until the indicator has been stopped.
    pub fn is_running(&self) -> bool {
        self.bar.as_ref().is_some_and(|bar| !bar.is_finished())
    }

    /// Stops the animation and waits for the ticker thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(bar) = self.bar.take() {
            // Joins the ticker before the final clear.
            bar.disable_steady_tick();
            bar.finish_and_clear();
        }
    }
}

impl Drop for IndicatorGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Cloneable in-memory writer for observing indicator output.
    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        fn len(&self) -> usize {
            self.0.lock().map(|buf| buf.len()).unwrap_or_default()
        }

        fn contents(&self) -> String {
            self.0
                .lock()
                .map(|buf| String::from_utf8_lossy(&buf).into_owned())
                .unwrap_or_default()
        }

        fn target(&self) -> ProgressDrawTarget {
            let buffer = self.clone();
            (writer_sink(move || Box::new(buffer.clone()) as Box<dyn Write + Send>))()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("poisoned"))?
                .extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stop_halts_output_immediately() {
        let buffer = SharedBuffer::default();
        let guard = LoadingIndicator::new("Thinking")
            .with_tick(Duration::from_millis(5))
            .start(buffer.target());
        thread::sleep(Duration::from_millis(40));
        assert!(guard.is_running());
        guard.stop();

        let after_stop = buffer.len();
        thread::sleep(Duration::from_millis(40));
        assert_eq!(buffer.len(), after_stop, "indicator wrote after stop");

        let output = buffer.contents();
        assert!(output.contains("Thinking..."), "output: {output:?}");
        assert!(output.contains("\r\x1b[2K"), "line should be cleared: {output:?}");
    }

    #[test]
    fn dropping_the_guard_stops_the_ticker() {
        let buffer = SharedBuffer::default();
        {
            let _guard = LoadingIndicator::new("Loading")
                .with_tick(Duration::from_millis(5))
                .start(buffer.target());
            thread::sleep(Duration::from_millis(15));
        }
        let after_drop = buffer.len();
        assert!(after_drop > 0);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(buffer.len(), after_drop);
    }

    #[test]
    fn long_tick_does_not_delay_stop() {
        let buffer = SharedBuffer::default();
        let guard = LoadingIndicator::new("Slow")
            .with_tick(Duration::from_secs(30))
            .start(buffer.target());
        let started = std::time::Instant::now();
        guard.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn writer_term_emits_cursor_codes() {
        let buffer = SharedBuffer::default();
        let term = WriterTerm::new(Box::new(buffer.clone()));
        term.move_cursor_up(0).expect("noop");
        term.move_cursor_up(2).expect("up");
        term.write_line("frame").expect("line");
        term.clear_line().expect("clear");
        assert_eq!(buffer.contents(), "\x1b[2Aframe\n\r\x1b[2K");
    }
}
