//! Destination for `System.out` output.
//!
//! Hosts embedding the shell usually want script output on stdout; tests
//! capture it in a buffer instead. Enum dispatch keeps the hot
//! `println` path free of vtables.

use std::sync::Arc;

use parking_lot::Mutex;

/// Where `System.out.print`/`println` text goes.
#[derive(Debug)]
pub enum OutputSink {
    Stdout,
    /// Captures everything printed since the last [`OutputSink::take`].
    Buffer(Mutex<String>),
    Silent,
}

impl OutputSink {
    pub fn println(&self, text: &str) {
        match self {
            OutputSink::Stdout => println!("{text}"),
            OutputSink::Buffer(buffer) => {
                let mut buffer = buffer.lock();
                buffer.push_str(text);
                buffer.push('\n');
            }
            OutputSink::Silent => {}
        }
    }

    pub fn print(&self, text: &str) {
        match self {
            OutputSink::Stdout => print!("{text}"),
            OutputSink::Buffer(buffer) => buffer.lock().push_str(text),
            OutputSink::Silent => {}
        }
    }

    /// Captured text so far; empty for sinks that do not capture.
    pub fn output(&self) -> String {
        match self {
            OutputSink::Buffer(buffer) => buffer.lock().clone(),
            OutputSink::Stdout | OutputSink::Silent => String::new(),
        }
    }

    /// Drain the captured text.
    pub fn take(&self) -> String {
        match self {
            OutputSink::Buffer(buffer) => std::mem::take(&mut *buffer.lock()),
            OutputSink::Stdout | OutputSink::Silent => String::new(),
        }
    }
}

/// Output sink shared by a backend and all of its sessions.
pub type SharedOutput = Arc<OutputSink>;

pub fn stdout_output() -> SharedOutput {
    Arc::new(OutputSink::Stdout)
}

pub fn buffer_output() -> SharedOutput {
    Arc::new(OutputSink::Buffer(Mutex::new(String::new())))
}

pub fn silent_output() -> SharedOutput {
    Arc::new(OutputSink::Silent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn buffer_keeps_print_and_println_order() {
        let sink = buffer_output();
        sink.print("a");
        sink.println("b");
        sink.print("c");
        assert_eq!(sink.output(), "ab\nc");
    }

    #[test]
    fn take_drains_buffer() {
        let sink = buffer_output();
        sink.println("once");
        assert_eq!(sink.take(), "once\n");
        assert_eq!(sink.output(), "");
    }

    #[test]
    fn silent_and_stdout_capture_nothing() {
        let silent = silent_output();
        silent.println("gone");
        assert_eq!(silent.take(), "");
        assert_eq!(stdout_output().output(), "");
    }

    #[test]
    fn buffer_is_shared_across_threads() {
        let sink = buffer_output();
        std::thread::scope(|scope| {
            for _ in 0..4 {
                let sink = Arc::clone(&sink);
                scope.spawn(move || {
                    for _ in 0..25 {
                        sink.println("x");
                    }
                });
            }
        });
        assert_eq!(sink.output().lines().count(), 100);
    }
}
