//! External command execution.
//!
//! Every process the pipeline starts (git, an external generator) goes
//! through `exec!`, so failures carry the command name, exit status and the
//! filtered stderr.

use crate::log;
use anyhow::{Context, Result};
use regex::Regex;
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, Output},
    sync::OnceLock,
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(["git"]; "status", "-s")?;
///
/// // With working directory
/// exec!(root; ["git"]; "push", "origin", branch)?;
///
/// // With a custom output filter
/// exec!(filter=&SILENT_FILTER; root; ["git"]; "fetch", "origin")?;
/// ```
#[macro_export]
macro_rules! exec {
    (filter=$filter:expr; $($rest:tt)*) => {
        $crate::exec_internal!(@parse_root $filter; $($rest)*)
    };
    ($($rest:tt)*) => {
        $crate::exec_internal!(@parse_root &$crate::utils::exec::EMPTY_FILTER; $($rest)*)
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! exec_internal {
    (@parse_root $filter:expr; $root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            Some($root),
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
        )
    };
    (@parse_root $filter:expr; $cmd:expr; $($arg:expr),* $(,)?) => {
        $crate::utils::exec::exec(
            None,
            &$crate::utils::exec::internal::to_cmd_vec($cmd),
            &$crate::utils::exec::internal::filter_args(&[$($crate::utils::exec::internal::to_os($arg)),*]),
            $filter,
        )
    };
}

#[doc(hidden)]
pub mod internal {
    use std::ffi::OsString;

    #[inline]
    pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
        s.into()
    }

    pub trait ToCmd {
        fn to_cmd(self) -> Vec<OsString>;
    }

    impl<const N: usize> ToCmd for [&str; N] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.into_iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &[String] {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    impl ToCmd for &Vec<String> {
        #[inline]
        fn to_cmd(self) -> Vec<OsString> {
            self.iter().map(OsString::from).collect()
        }
    }

    #[inline]
    pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
        cmd.to_cmd()
    }

    /// Drop empty args so optional flags can be passed as `""`.
    #[inline]
    pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
        args.iter().filter(|a| !a.is_empty()).cloned().collect()
    }
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if the command cannot start or exits non-zero.
pub fn exec(
    root: Option<&Path>,
    cmd: &[OsString],
    args: &[OsString],
    filter: &'static FilterRule,
) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output, filter)?;
    Ok(output)
}

fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let program = cmd.first().context("Empty command")?;
    let name = program
        .to_str()
        .context("Command name is not valid UTF-8")?
        .to_owned();

    let mut command = Command::new(program);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Output Filtering
// ============================================================================

fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").expect("valid ansi regex"));
    re.replace_all(s, "")
}

/// Lines starting with one of `skip_prefixes` (after trimming) are dropped from logged output.
pub struct FilterRule {
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, output: &str) -> bool {
        output.is_empty() || self.skip_prefixes.iter().any(|p| output.starts_with(p))
    }

    fn log(&self, name: &str, output: &str) {
        let lines: Vec<&str> = output
            .lines()
            .filter(|line| !self.should_skip(strip_ansi(line).trim()))
            .collect();

        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

/// Stdout of a failed command is appended to the error unless it is markup.
const STDOUT_FILTER: FilterRule = FilterRule::new(&["<!DOCTYPE", "<?xml", "{"]);

/// No skipping.
pub const EMPTY_FILTER: FilterRule = FilterRule::new(&[]);

/// Skip all output on success.
pub const SILENT_FILTER: FilterRule = FilterRule::new(&[""]);

/// git writes progress to stderr even on success.
pub const GIT_FILTER: FilterRule = FilterRule::new(&[
    "Cloning into",
    "Enumerating",
    "Counting",
    "Compressing",
    "Writing objects",
    "Total",
    "remote:",
    "From ",
    "To ",
    "* ",
    "+ ",
    "= ",
]);

/// On success only stderr is logged (warnings); on failure the command errors.
fn log_output(name: &str, output: &Output, filter: &'static FilterRule) -> Result<()> {
    if !output.status.success() {
        anyhow::bail!(format_error(name, output, filter));
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    filter.log(name, stderr.trim());
    Ok(())
}

fn format_error(name: &str, output: &Output, filter: &'static FilterRule) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let error_msg = filter
        .skip_prefixes
        .iter()
        .filter(|p| !p.is_empty())
        .fold(stderr.trim(), |s, p| s.trim_start_matches(p).trim_start());

    let mut msg = format!("Command `{name}` failed with {}\n", output.status);
    msg.push_str(error_msg);

    let stdout = stdout.trim();
    if !STDOUT_FILTER.should_skip(stdout) {
        msg.push_str("\nStdout:\n");
        msg.push_str(stdout);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::internal::*;
    use super::*;

    #[test]
    fn test_to_cmd_vec() {
        let cmd = to_cmd_vec(["git", "status"]);
        assert_eq!(cmd, vec![OsString::from("git"), OsString::from("status")]);

        let v = vec!["hugo".to_string(), "--minify".to_string()];
        assert_eq!(to_cmd_vec(&v).len(), 2);
    }

    #[test]
    fn test_filter_args_drops_empty() {
        let args = [OsString::from("-f"), OsString::from(""), OsString::from("main")];
        assert_eq!(filter_args(&args), vec![OsString::from("-f"), OsString::from("main")]);
    }

    #[test]
    fn test_prepare_empty_command() {
        assert!(prepare(None, &[], &[]).is_err());
    }

    #[test]
    fn test_prepare_sets_name() {
        let (name, _) = prepare(None, &to_cmd_vec(["echo"]), &[OsString::from("hi")]).unwrap();
        assert_eq!(name, "echo");
    }

    #[test]
    fn test_filter_rule_should_skip() {
        assert!(GIT_FILTER.should_skip("Cloning into 'site'..."));
        assert!(GIT_FILTER.should_skip(""));
        assert!(!GIT_FILTER.should_skip("fatal: repository not found"));
        assert!(SILENT_FILTER.should_skip("anything"));
    }

    #[test]
    fn test_git_filter_skips_ref_update_lines() {
        let stderr = "From file:///srv/pages\n * branch            gh-pages   -> FETCH_HEAD\n + 1a2b3c...4d5e6f HEAD -> gh-pages (forced update)\n = [up to date]      HEAD -> gh-pages";
        let kept: Vec<&str> = stderr
            .lines()
            .filter(|line| !GIT_FILTER.should_skip(strip_ansi(line).trim()))
            .collect();
        assert!(kept.is_empty(), "{kept:?}");
        assert!(!GIT_FILTER.should_skip("warning: redirecting to https://example.com/"));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[31mRed\x1b[0m"), "Red");
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[0m done"), "ok done");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_success_and_failure() {
        let out = crate::exec!(["sh"]; "-c", "printf hello").unwrap();
        assert_eq!(out.stdout, b"hello");

        let err = crate::exec!(["sh"]; "-c", "echo broken >&2; exit 3").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Command `sh` failed"));
        assert!(msg.contains("broken"));
    }

    #[cfg(unix)]
    #[test]
    fn test_exec_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();
        let out = crate::exec!(dir.path(); ["ls"];).unwrap();
        assert!(String::from_utf8_lossy(&out.stdout).contains("marker"));
    }
}
