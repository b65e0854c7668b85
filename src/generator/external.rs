//! External static-site generator (`generator = "command"`).

use super::Input;
use crate::{
    artifact::tree_files,
    log,
    utils::exec::{EMPTY_FILTER, exec},
};
use anyhow::{Context, Result, bail};
use std::{ffi::OsString, path::Path};
use walkdir::WalkDir;

/// Run `[build.command] argv` and count the HTML pages it produced.
pub fn generate(input: &Input<'_>, out: &Path) -> Result<usize> {
    let argv = expand_argv(
        &input.config.build.command.argv,
        input.source_root,
        &input.source_root.join(&input.config.build.content),
        out,
    );
    let Some((program, args)) = argv.split_first() else {
        bail!("[build.command.argv] is empty");
    };

    log!("generate"; "running `{}`", program.to_string_lossy());
    exec(
        Some(input.source_root),
        std::slice::from_ref(program),
        args,
        &EMPTY_FILTER,
    )?;

    if !out.is_dir() || tree_files(out)?.is_empty() {
        bail!(
            "`{}` exited successfully but produced no output in {}",
            program.to_string_lossy(),
            out.display()
        );
    }
    count_pages(out)
}

/// Substitute `{root}`, `{content}` and `{output}` in every argument.
fn expand_argv(argv: &[String], root: &Path, content: &Path, out: &Path) -> Vec<OsString> {
    argv.iter()
        .map(|arg| {
            arg.replace("{root}", &root.to_string_lossy())
                .replace("{content}", &content.to_string_lossy())
                .replace("{output}", &out.to_string_lossy())
                .into()
        })
        .collect()
}

fn count_pages(out: &Path) -> Result<usize> {
    let mut pages = 0;
    for entry in WalkDir::new(out) {
        let entry = entry.with_context(|| format!("Failed to scan {}", out.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "html") {
            pages += 1;
        }
    }
    Ok(pages)
}
