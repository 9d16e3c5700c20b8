use std::sync::Mutex;
use std::time::Duration;

use procpump::exec::StreamConsumer;

/// Records lines like `LineCollector`, but stalls for `pause` every
/// `every` lines to simulate a consumer slower than the child.
pub struct SlowConsumer {
    every: usize,
    pause: Duration,
    lines: Mutex<Vec<String>>,
}

impl SlowConsumer {
    pub fn new(every: usize, pause: Duration) -> Self {
        Self {
            every: every.max(1),
            pause,
            lines: Mutex::new(Vec::new()),
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }
}

impl StreamConsumer for SlowConsumer {
    fn consume_line(&self, line: &str) {
        let count = {
            let mut lines = self.lines.lock().unwrap();
            lines.push(line.to_string());
            lines.len()
        };
        if count % self.every == 0 {
            std::thread::sleep(self.pause);
        }
    }
}
