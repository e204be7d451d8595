// Copyright 2025 Google LLC
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::{self, Stderr, Write};

use spin::{Once, mutex::SpinMutex};

static CONSOLE: Once<SharedConsole<Stderr>> = Once::new();

/// A writer guarded by a spin mutex so that it may be shared between threads.
#[derive(Debug)]
pub struct SharedConsole<T: Send> {
    pub(crate) console: SpinMutex<T>,
}

impl<T: Send> SharedConsole<T> {
    /// Wraps `console` for shared use.
    pub fn new(console: T) -> Self {
        Self {
            console: SpinMutex::new(console),
        }
    }
}

impl<T: Send + Write> Write for &SharedConsole<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.console.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.console.lock().flush()
    }
}

/// Initialises the shared console over standard error.
pub fn init() -> &'static SharedConsole<Stderr> {
    CONSOLE.call_once(|| SharedConsole::new(io::stderr()))
}
