use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::MoveTo;
use crossterm::style::Print;
use crossterm::terminal::{Clear, ClearType};
use crossterm::QueueableCommand;
use pc_core::frame::Looping;

/// Durée d'un centième de seconde, unité des délais GIF.
const DELAY_UNIT: Duration = Duration::from_millis(10);

/// Destination de l'animation : une frame à la fois, poussée avec son délai.
pub trait FrameSink {
    /// Replace whatever is displayed with `text`.
    ///
    /// # Errors
    /// Returns an error if the output can't be written.
    fn show(&mut self, text: &str) -> Result<()>;

    /// Block for `delay`.
    fn wait(&mut self, delay: Duration);
}

/// Terminal : effacement puis impression, via crossterm.
pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    /// Wrap a writer, usually `stdout().lock()`.
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> FrameSink for TerminalSink<W> {
    fn show(&mut self, text: &str) -> Result<()> {
        self.out
            .queue(Clear(ClearType::All))?
            .queue(MoveTo(0, 0))?
            .queue(Print(text.replace('\n', "\r\n")))?
            .queue(Print("\r\n"))?;
        self.out.flush().context("Écriture terminal")?;
        Ok(())
    }

    fn wait(&mut self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Joue les frames dans l'ordre, `delays[i] * 10 ms` après chacune.
///
/// [`Looping::Forever`] only ends when the sink fails.
///
/// # Errors
/// Returns the sink's first error.
pub fn play(
    sink: &mut impl FrameSink,
    frames: &[String],
    delays: &[u16],
    looping: Looping,
) -> Result<()> {
    if frames.is_empty() {
        return Ok(());
    }
    let mut pass: u32 = 0;
    loop {
        for (text, &delay) in frames.iter().zip(delays) {
            sink.show(text)?;
            sink.wait(DELAY_UNIT * u32::from(delay));
        }
        pass += 1;
        if looping.passes().is_some_and(|n| pass >= n) {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        shown: Vec<String>,
        waited: Vec<Duration>,
        fail_after: Option<usize>,
    }

    impl FrameSink for Recorder {
        fn show(&mut self, text: &str) -> Result<()> {
            if self.fail_after.is_some_and(|n| self.shown.len() >= n) {
                bail!("sink closed");
            }
            self.shown.push(text.to_string());
            Ok(())
        }

        fn wait(&mut self, delay: Duration) {
            self.waited.push(delay);
        }
    }

    fn frames() -> (Vec<String>, Vec<u16>) {
        (vec!["a".into(), "b".into(), "c".into()], vec![5, 0, 12])
    }

    #[test]
    fn finite_loop_plays_full_passes() {
        let (f, d) = frames();
        let mut sink = Recorder::default();
        play(&mut sink, &f, &d, Looping::Times(2)).unwrap();
        assert_eq!(sink.shown, vec!["a", "b", "c", "a", "b", "c"]);
    }

    #[test]
    fn delays_are_hundredths_of_a_second() {
        let (f, d) = frames();
        let mut sink = Recorder::default();
        play(&mut sink, &f, &d, Looping::Times(1)).unwrap();
        assert_eq!(
            sink.waited,
            vec![
                Duration::from_millis(50),
                Duration::ZERO,
                Duration::from_millis(120)
            ]
        );
    }

    #[test]
    fn missing_loop_count_plays_once() {
        let (f, d) = frames();
        let mut sink = Recorder::default();
        play(&mut sink, &f, &d, Looping::Once).unwrap();
        assert_eq!(sink.shown, vec!["a", "b", "c"]);
    }

    #[test]
    fn forever_runs_until_sink_fails() {
        let (f, d) = frames();
        let mut sink = Recorder {
            fail_after: Some(10),
            ..Recorder::default()
        };
        assert!(play(&mut sink, &f, &d, Looping::Forever).is_err());
        assert_eq!(sink.shown.len(), 10);
        assert_eq!(sink.shown[9], "a");
    }

    #[test]
    fn terminal_sink_writes_text() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.show("ab\ncd").unwrap();
        let out = String::from_utf8(sink.out).unwrap();
        assert!(out.contains("ab\r\ncd"));
    }
}
