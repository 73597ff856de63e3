use std::io::{self, Stdout, stdout};
use std::panic;

use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
};

/// The console's terminal. Raw mode and the alternate screen are held from
/// `new` until `restore` or drop, whichever comes first.
pub struct Tui<B: Backend = CrosstermBackend<Stdout>> {
    terminal: Terminal<B>,
    raw: bool,
}

impl Tui {
    pub fn new() -> io::Result<Self> {
        install_panic_hook();
        enable_raw_mode()?;
        execute!(stdout(), EnterAlternateScreen)?;

        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok(Self {
            terminal,
            raw: true,
        })
    }
}

impl<B: Backend> Tui<B> {
    /// Wrap a terminal that is not in raw mode (tests, headless backends)
    pub fn headless(terminal: Terminal<B>) -> Self {
        Self {
            terminal,
            raw: false,
        }
    }

    /// Draw one frame of the console
    pub fn draw<F>(&mut self, render: F) -> io::Result<()>
    where
        F: FnOnce(&mut Frame),
    {
        self.terminal.draw(render)?;
        Ok(())
    }

    pub fn backend(&self) -> &B {
        self.terminal.backend()
    }

    /// Give the terminal back to the shell. Safe to call more than once.
    pub fn restore(&mut self) -> io::Result<()> {
        if !self.raw {
            return Ok(());
        }
        self.raw = false;
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl<B: Backend> Drop for Tui<B> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Leave raw mode before the default hook prints, so a panic message is readable
fn install_panic_hook() {
    let hook = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(stdout(), LeaveAlternateScreen);
        hook(info);
    }));
}
