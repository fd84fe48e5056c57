mod binary;
mod classical;
mod config;
mod cstate;
mod diffmodel;
mod directive;
mod engine;
mod error;
mod ifdef;
mod linestore;
mod mask;
mod multicolumn;
mod patience;
mod slider;
mod unified;

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;
use std::time::SystemTime;

use anstyle::{AnsiColor, Style};
use clap::Parser;

use config::ColorPolicy;
use diffmodel::Diff;
use error::{exit_code, NdiffError, Result};
use ifdef::MacroName;
use linestore::LineStore;
use mask::MAX_FILES;

/// Maximum bytes accepted from a single input. Inputs larger than this are rejected.
const MAX_INPUT_BYTES: usize = 64 * 1024 * 1024; // 64 MiB

#[derive(Parser, Debug)]
#[command(
    name = "ndiff",
    version,
    about = "Compare or merge multiple files",
    long_about = "Compare or merge up to 32 files at once: a greppable raw multicolumn \
                  format by default, a GNU-compatible unified diff for exactly two files, \
                  or a single #ifdef-guarded source reconstructed from all of them."
)]
struct Args {
    /// Input files (1 to 32), or directories in --recursive mode. Use "-" for stdin.
    #[arg(value_name = "FILE")]
    files: Vec<String>,

    /// Merge using #if/#ifdef syntax, one -D per file. NAME or NAME=EXPR (expression macro).
    #[arg(short = 'D', long = "ifdef", value_name = "NAME")]
    ifdef: Vec<String>,

    /// Output a unified diff (exactly two files). Optional context line count, default 3.
    #[arg(
        short = 'u',
        long = "unified",
        value_name = "NUM",
        num_args = 0..=1,
        default_missing_value = "3"
    )]
    unified: Option<usize>,

    /// Recursively walk matching files across input directories.
    #[arg(short = 'r', long = "recursive")]
    recursive: bool,

    /// Write output to FILE (or, in recursive mode, mirror it under directory OUTDIR).
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<String>,

    /// Skip the cosmetic window-sliding pass before #ifdef reconstruction.
    #[arg(long)]
    no_slide: bool,

    /// Path to config file. Defaults to ./ndiff.toml if present.
    #[arg(long, value_name = "FILE")]
    config: Option<String>,

    /// Colorize unified-diff output. Auto-detects a TTY when set to 'auto'.
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorArg,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Raw,
    Unified { context: usize },
    Ifdef,
}

fn main() {
    let args = Args::parse();
    match run(args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("ERROR: {e}");
            process::exit(exit_code(&e));
        }
    }
}

fn run(args: Args) -> Result<()> {
    let cfg = match &args.config {
        Some(path) => Some(config::Config::load(Path::new(path))?),
        None => config::Config::load_from_cwd()?,
    };

    let mode = resolve_mode(&args)?;
    validate_args(&args, mode)?;

    let use_color = match args.color {
        ColorArg::Always => true,
        ColorArg::Never => false,
        ColorArg::Auto => io::stdout().is_terminal(),
    };
    let color = match cfg.as_ref().map(|c| c.color) {
        Some(ColorPolicy::Always) => true,
        Some(ColorPolicy::Never) => false,
        _ => use_color,
    };

    if args.recursive {
        run_recursive(&args, mode, cfg.as_ref())
    } else {
        run_flat(&args, mode, color)
    }
}

fn resolve_mode(args: &Args) -> Result<Mode> {
    if args.unified.is_some() && !args.ifdef.is_empty() {
        return Err(NdiffError::InvalidArgs(
            "options --unified and --ifdef are mutually exclusive".to_string(),
        ));
    }
    if let Some(context) = args.unified {
        Ok(Mode::Unified { context })
    } else if !args.ifdef.is_empty() {
        Ok(Mode::Ifdef)
    } else {
        Ok(Mode::Raw)
    }
}

fn validate_args(args: &Args, mode: Mode) -> Result<()> {
    let n = args.files.len();
    if n == 0 {
        return Err(NdiffError::InvalidArgs("no files provided".to_string()));
    }
    if n > MAX_FILES {
        return Err(NdiffError::InvalidArgs(format!(
            "{n} files provided, but at most {MAX_FILES} are supported"
        )));
    }
    match mode {
        Mode::Unified { .. } if n != 2 => {
            return Err(NdiffError::InvalidArgs(
                "unified diff requires exactly two files".to_string(),
            ));
        }
        Mode::Ifdef if args.ifdef.len() != n => {
            let (macros, files) = (args.ifdef.len(), n);
            return Err(NdiffError::InvalidArgs(if macros > files {
                format!("{macros} macro name(s) were provided via -D, but only {files} file(s)")
            } else {
                format!("{files} file(s) were provided, but only {macros} -D option(s)")
            }));
        }
        _ => {}
    }
    if args.recursive {
        match mode {
            Mode::Ifdef if args.output.is_none() => {
                return Err(NdiffError::InvalidArgs(
                    "recursive #ifdef merge requires an output directory".to_string(),
                ));
            }
            Mode::Ifdef if args.output.as_deref() == Some("-") => {
                return Err(NdiffError::InvalidArgs(
                    "output path '-' is not a directory".to_string(),
                ));
            }
            Mode::Raw => {
                return Err(NdiffError::InvalidArgs(
                    "recursive diff requires either --ifdef or --unified".to_string(),
                ));
            }
            _ => {}
        }
        if args.files.iter().any(|f| f.as_str() == "-") {
            return Err(NdiffError::InvalidArgs(
                "cannot compare '-' recursively".to_string(),
            ));
        }
    }
    Ok(())
}

// --- flat (non-recursive) mode -------------------------------------------

struct LoadedFile {
    name: String,
    timestamp: String,
    lines: Vec<String>,
}

fn load_file(path: &str) -> Result<LoadedFile> {
    if path == "-" {
        let mut buf = Vec::new();
        io::stdin()
            .take(MAX_INPUT_BYTES as u64 + 1)
            .read_to_end(&mut buf)
            .map_err(|source| NdiffError::StdinRead { source })?;
        if buf.len() > MAX_INPUT_BYTES {
            return Err(NdiffError::StdinRead {
                source: io::Error::new(io::ErrorKind::InvalidData, "stdin exceeds 64 MiB limit"),
            });
        }
        let content = String::from_utf8(buf).map_err(|_| NdiffError::NotUtf8 { path: "-".into() })?;
        let timestamp = format_timestamp(SystemTime::now());
        return Ok(LoadedFile {
            name: "-".to_string(),
            timestamp,
            lines: split_lines(&content),
        });
    }

    let meta = fs::metadata(path).map_err(|source| NdiffError::FileRead { path: path.into(), source })?;
    if meta.is_dir() {
        return Err(NdiffError::InvalidArgs(format!("input file '{path}' is a directory")));
    }
    if meta.len() > MAX_INPUT_BYTES as u64 {
        return Err(NdiffError::FileRead {
            path: path.into(),
            source: io::Error::new(io::ErrorKind::InvalidData, "file exceeds 64 MiB limit"),
        });
    }
    let bytes = fs::read(path).map_err(|source| NdiffError::FileRead { path: path.into(), source })?;
    if binary::looks_binary(&bytes) {
        return Err(NdiffError::BinaryFile { path: path.into() });
    }
    let content = String::from_utf8(bytes).map_err(|_| NdiffError::NotUtf8 { path: path.into() })?;
    let timestamp = format_timestamp(meta.modified().unwrap_or_else(|_| SystemTime::now()));
    Ok(LoadedFile {
        name: path.to_string(),
        timestamp,
        lines: split_lines(&content),
    })
}

fn split_lines(content: &str) -> Vec<String> {
    content.lines().map(str::to_string).collect()
}

fn format_timestamp(t: SystemTime) -> String {
    let secs = t
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    humantime_like(secs)
}

/// Minimal `%Y-%m-%d %H:%M:%S` formatter over a UNIX timestamp so the unified
/// diff header doesn't need an extra time-formatting dependency (the teacher
/// doesn't carry one and the original C++ tool relies on libc's `strftime`).
fn humantime_like(secs: u64) -> String {
    const DAYS_IN_MONTH: [i64; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];
    let mut days = (secs / 86400) as i64;
    let rem = secs % 86400;
    let (h, m, s) = (rem / 3600, (rem % 3600) / 60, rem % 60);

    let mut year = 1970i64;
    loop {
        let leap = is_leap_year(year);
        let year_days = if leap { 366 } else { 365 };
        if days < year_days {
            break;
        }
        days -= year_days;
        year += 1;
    }
    let leap = is_leap_year(year);
    let mut month = 0usize;
    for (i, &len) in DAYS_IN_MONTH.iter().enumerate() {
        let len = if i == 1 && leap { len + 1 } else { len };
        if days < len {
            month = i;
            break;
        }
        days -= len;
    }
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}.000000000 +0000",
        year,
        month + 1,
        days + 1,
        h,
        m,
        s
    )
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn run_flat(args: &Args, mode: Mode, color: bool) -> Result<()> {
    let loaded: Vec<LoadedFile> = args.files.iter().map(|p| load_file(p)).collect::<Result<_>>()?;
    let output = render(&loaded, mode, args.no_slide, &args.ifdef, color)?;
    write_output(&output, args.output.as_deref())
}

fn render(loaded: &[LoadedFile], mode: Mode, no_slide: bool, macro_specs: &[String], color: bool) -> Result<String> {
    let dimension = loaded.len();
    let mut store = LineStore::new(dimension);
    let files: Vec<Vec<linestore::LineRef>> = loaded
        .iter()
        .enumerate()
        .map(|(id, f)| {
            let refs: Vec<&str> = f.lines.iter().map(String::as_str).collect();
            store.intern_file(id, &refs)
        })
        .collect();
    let diff: Diff = engine::merge_all(&store, &files);

    match mode {
        Mode::Raw => Ok(multicolumn::render(&store, &diff)),
        Mode::Unified { context } => {
            let out = unified::render(
                &store,
                &diff,
                &loaded[0].name,
                &loaded[0].timestamp,
                &loaded[1].name,
                &loaded[1].timestamp,
                context,
            );
            Ok(colorize_unified(&out, color))
        }
        Mode::Ifdef => {
            let file_names: Vec<String> = loaded.iter().map(|f| f.name.clone()).collect();
            directive::verify_properly_nested_directives(&store, &diff, &file_names)?;
            let merged = if no_slide { diff } else { slider::slide_windows(&store, &diff) };
            let macros: Vec<MacroName> = macro_specs.iter().map(|s| MacroName::parse(s)).collect();
            Ok(ifdef::reconstruct(&store, &merged, &macros))
        }
    }
}

fn colorize_unified(text: &str, color: bool) -> String {
    if !color {
        return text.to_string();
    }
    let add = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Green)));
    let del = Style::new().fg_color(Some(anstyle::Color::Ansi(AnsiColor::Red)));
    let reset = "\x1b[0m";
    let mut out = String::with_capacity(text.len());
    for line in text.split_inclusive('\n') {
        if line.starts_with('+') && !line.starts_with("+++") {
            out.push_str(&add.render().to_string());
            out.push_str(line.trim_end_matches('\n'));
            out.push_str(reset);
            out.push('\n');
        } else if line.starts_with('-') && !line.starts_with("---") {
            out.push_str(&del.render().to_string());
            out.push_str(line.trim_end_matches('\n'));
            out.push_str(reset);
            out.push('\n');
        } else {
            out.push_str(line);
        }
    }
    out
}

fn write_output(content: &str, output_path: Option<&str>) -> Result<()> {
    match output_path {
        Some("-") | None => {
            print!("{content}");
            Ok(())
        }
        Some(path) => {
            if let Ok(meta) = fs::symlink_metadata(path) {
                if meta.file_type().is_symlink() {
                    return Err(NdiffError::FileWrite {
                        path: path.into(),
                        source: io::Error::new(
                            io::ErrorKind::InvalidInput,
                            "output path is a symlink; refusing to follow",
                        ),
                    });
                }
            }
            fs::write(path, content).map_err(|source| NdiffError::FileWrite { path: path.into(), source })
        }
    }
}

// --- recursive mode --------------------------------------------------------

fn run_recursive(args: &Args, mode: Mode, cfg: Option<&config::Config>) -> Result<()> {
    let roots: Vec<&Path> = args.files.iter().map(Path::new).collect();
    for root in &roots {
        let meta = fs::metadata(root).map_err(|source| NdiffError::FileRead { path: (*root).into(), source })?;
        if !meta.is_dir() {
            return Err(NdiffError::InvalidArgs(format!(
                "input path '{}' is not a directory",
                root.display()
            )));
        }
    }
    let ignore_paths: Vec<String> = cfg.map(|c| c.ignore.paths.clone()).unwrap_or_default();

    let mut relative_paths: BTreeSet<PathBuf> = BTreeSet::new();
    for root in &roots {
        walk_directory(root, root, &ignore_paths, &mut relative_paths)?;
    }

    let outdir = args.output.as_deref().expect("validated by validate_args");
    let mut any_failed = false;

    for rel in &relative_paths {
        let mut loaded = Vec::with_capacity(roots.len());
        for root in &roots {
            let candidate = root.join(rel);
            if candidate.is_file() {
                loaded.push(load_file(candidate.to_str().expect("path was built from UTF-8 components"))?);
            } else {
                // Absent from this tree: treated as an empty file, not an error.
                loaded.push(LoadedFile {
                    name: candidate.to_string_lossy().to_string(),
                    timestamp: format_timestamp(SystemTime::now()),
                    lines: Vec::new(),
                });
            }
        }

        match render(&loaded, mode, args.no_slide, &args.ifdef, false) {
            Ok(rendered) => {
                let dest = Path::new(outdir).join(rel);
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent).map_err(|source| NdiffError::FileWrite {
                        path: parent.into(),
                        source,
                    })?;
                }
                write_output(&rendered, Some(dest.to_str().expect("path was built from UTF-8 components")))?;
            }
            Err(e) => {
                eprintln!("ERROR: {}: {e}", rel.display());
                any_failed = true;
            }
        }
    }

    if any_failed {
        Err(NdiffError::InvalidArgs(
            "one or more files failed to merge; see above".to_string(),
        ))
    } else {
        Ok(())
    }
}

fn walk_directory(root: &Path, dir: &Path, ignore_paths: &[String], out: &mut BTreeSet<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|source| NdiffError::FileRead { path: dir.into(), source })?;
    for entry in entries {
        let entry = entry.map_err(|source| NdiffError::FileRead { path: dir.into(), source })?;
        let path = entry.path();
        let rel = path.strip_prefix(root).expect("walked path is under root").to_path_buf();
        let rel_str = rel.to_string_lossy();
        if ignore_paths.iter().any(|p| rel_str.contains(p.as_str())) {
            continue;
        }
        if path.is_dir() {
            walk_directory(root, &path, ignore_paths, out)?;
        } else {
            out.insert(rel);
        }
    }
    Ok(())
}
