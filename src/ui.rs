use colored::{ColoredString, Colorize};
use devgraph::{Error, Reporter};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

// ============================================================================
// Device Status
// ============================================================================

/// What happened to a device, as shown on the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceStatus {
    /// Found mounted, nothing done
    IsMounted,
    /// Found unmounted, nothing done
    IsUmounted,
    /// Mounted just now
    Mounted,
    /// Unmounted just now
    Umounted,
}

impl DeviceStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::IsMounted | Self::Mounted => "mounted",
            Self::IsUmounted | Self::Umounted => "umounted",
        }
    }

    /// Render `name label`; fresh transitions are blue, settled states green or red
    pub fn render(self, name: &str) -> ColoredString {
        let line = format!("{} {}", name, self.label());
        match self {
            Self::IsMounted => line.green(),
            Self::IsUmounted => line.red(),
            Self::Mounted | Self::Umounted => line.blue(),
        }
    }
}

/// Render a failure line; devices skipped because a dependency failed are
/// shown in yellow with the device that actually failed
pub fn render_failure(name: &str, err: &Error) -> ColoredString {
    if err.is_dependency_failure() {
        let cause = err.root_cause_device().unwrap_or("dependency");
        format!("{name} skipped: {cause} failed").yellow()
    } else {
        format!("{name}: {err}").red()
    }
}

/// Prints one line per device transition as tasks complete
pub struct TerminalReporter {
    quiet: bool,
}

impl TerminalReporter {
    /// A quiet reporter only prints failures
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn status(&self, name: &str, status: DeviceStatus) {
        if !self.quiet {
            println!("{}", status.render(name));
        }
    }
}

impl Reporter for TerminalReporter {
    fn on_is_mounted(&self, name: &str) {
        self.status(name, DeviceStatus::IsMounted);
    }

    fn on_is_umounted(&self, name: &str) {
        self.status(name, DeviceStatus::IsUmounted);
    }

    fn on_mounted(&self, name: &str) {
        self.status(name, DeviceStatus::Mounted);
    }

    fn on_umounted(&self, name: &str) {
        self.status(name, DeviceStatus::Umounted);
    }

    fn on_error(&self, name: &str, err: &Error) {
        eprintln!("{}", render_failure(name, err));
    }
}
