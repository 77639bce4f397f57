//! Command builders
//!
//! Every external invocation Carbon produces is assembled from [`Segment`]s.
//! A segment carries a priority, and segments are rendered in ascending
//! priority order so that flags, action verbs and positional arguments land
//! where the container tool expects them, no matter the order in which the
//! builder methods were called.
//!
//! Priority bands shared by the builders:
//!
//! | band                    | priority | examples                         |
//! |-------------------------|----------|----------------------------------|
//! | structural flags        | 10-30    | `-f`, `--env-file`, `-t`         |
//! | targets                 | 100      | the container in `docker logs`   |
//! | action / final argument | 999      | `up`, `stop`, the shell, a path  |
//! | detached flag           | 1000     | `-d`                             |
//! | service names           | 1001     | `web db`                         |

pub mod build;
pub mod compose;
pub mod logs;
pub mod shell;

pub use build::DockerBuildCommand;
pub use compose::DockerComposeCommand;
pub use logs::DockerLogsCommand;
pub use shell::DockerShellCommand;

/// Structural flags such as `-f`
pub const PRIORITY_FILE: u16 = 10;
/// Image tag flag
pub const PRIORITY_TAG: u16 = 20;
/// Build argument flag
pub const PRIORITY_BUILD_ARG: u16 = 30;
/// Target container of a single-container command
pub const PRIORITY_TARGET: u16 = 100;
/// Action verbs and the final positional argument
pub const PRIORITY_ACTION: u16 = 999;
/// Detached / background flag
pub const PRIORITY_BACKGROUND: u16 = 1000;
/// Service name list
pub const PRIORITY_SERVICE: u16 = 1001;

/// An ordered token of a command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Render position, lower renders first
    pub priority: u16,
    /// Flag or bare word, may be empty
    pub key: String,
    /// Flag value, may be empty
    pub value: String,
}

impl Segment {
    /// Create a new segment
    pub fn new(priority: u16, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            priority,
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Mutually exclusive positions of a command.
///
/// Setting a slot twice keeps only the last segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueSlot {
    /// `up`, `down`, `stop`, `restart`
    Action,
    /// The shell of an exec command
    Shell,
}

impl UniqueSlot {
    const COUNT: usize = 2;

    fn index(self) -> usize {
        match self {
            UniqueSlot::Action => 0,
            UniqueSlot::Shell => 1,
        }
    }

    /// Priority the slot renders at
    pub fn priority(self) -> u16 {
        match self {
            UniqueSlot::Action | UniqueSlot::Shell => PRIORITY_ACTION,
        }
    }
}

/// Segment storage shared by all builders
#[derive(Debug, Clone, Default)]
pub struct Segments {
    list: Vec<Segment>,
    unique: [Option<Segment>; UniqueSlot::COUNT],
}

impl Segments {
    /// Create an empty segment list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment. Content is not validated.
    pub fn add(&mut self, priority: u16, key: impl Into<String>, value: impl Into<String>) {
        self.list.push(Segment::new(priority, key, value));
    }

    /// Overwrite a unique slot
    pub fn set_unique(&mut self, slot: UniqueSlot, key: impl Into<String>) {
        self.unique[slot.index()] = Some(Segment::new(slot.priority(), key, ""));
    }

    fn ordered(&self) -> Vec<&Segment> {
        let mut segments: Vec<&Segment> = self.unique.iter().flatten().collect();
        segments.extend(self.list.iter());

        // `sort_by_key` is stable, ties keep insertion order
        segments.sort_by_key(|segment| segment.priority);
        segments
    }

    /// Render the segments after `command`
    pub fn render(&self, command: &str) -> String {
        let mut rendered = command.to_string();
        for segment in self.ordered() {
            if !segment.key.is_empty() {
                rendered.push(' ');
                rendered.push_str(&segment.key);
            }

            if !segment.value.is_empty() {
                rendered.push(' ');
                rendered.push_str(&segment.value);
            }
        }

        rendered
    }

    /// Argument vector of the rendered command. The program, keys and values
    /// stay whole even when they contain spaces.
    pub fn args(&self, program: &str, command: &str) -> Vec<String> {
        let mut args = vec![program.to_string()];
        args.extend(command.split_whitespace().map(str::to_string));

        for segment in self.ordered() {
            for part in [&segment.key, &segment.value] {
                if !part.is_empty() {
                    args.push(part.clone());
                }
            }
        }

        args
    }
}

/// Something that renders to one command line
pub trait CommandBuilder {
    /// Render the full command line
    fn build(&self) -> String;

    /// The same command as program and arguments
    fn args(&self) -> Vec<String>;
}
