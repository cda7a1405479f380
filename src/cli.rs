// ============================================================================
// texnorm CLI — headless batch processing via command-line arguments
// ============================================================================
//
// Usage examples:
//   texnorm --input brick.png --command blurry-texture-process --output out.png
//   texnorm -i *.jpg -c crunchy-texture-process --output-dir processed/
//   texnorm -i tile.png -c crunchy-texture-process --seed 7 -o tile.gif
//   texnorm --list
//
// All processing runs synchronously on the current thread; the registered
// command is dispatched once per input file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::host::Registry;
use crate::io::{SaveFormat, encode_and_write, load_image_sync};
use crate::processor::CpuProcessor;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// texnorm headless texture normalizer.
///
/// Run a registered texture-normalizer command on image files — no GUI host
/// required.
#[derive(Parser, Debug)]
#[command(
    name = "texnorm",
    about = "Headless batch texture normalizer",
    long_about = "Run a registered texture-normalizer command on image files.\n\
                  Supports PNG, JPEG, WEBP, BMP, TGA, TIFF and GIF output.\n\n\
                  Example:\n  \
                  texnorm --input brick.png --command blurry-texture-process --output out.png\n  \
                  texnorm -i *.jpg -c crunchy-texture-process --output-dir out/ --format gif"
)]
pub struct CliArgs {
    /// Input file(s). Glob patterns accepted (e.g. "*.png", "textures/*.jpg").
    #[arg(short, long, required_unless_present = "list", num_args = 1..)]
    pub input: Vec<String>,

    /// Registered command to dispatch on each input image
    /// (see --list for the available commands).
    #[arg(short, long, value_name = "NAME", required_unless_present = "list")]
    pub command: Option<String>,

    /// Output file path. Only valid for single-file input.
    /// For batch input use --output-dir instead.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing.
    /// Files are written here with the original stem and the target format's extension.
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Output format: png, jpeg, webp, bmp, tga, tiff, gif.
    /// When omitted, the format is inferred from --output's extension, defaulting to png.
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// JPEG quality (1-100, default 90).
    #[arg(short, long, default_value_t = 90, value_name = "1-100")]
    pub quality: u8,

    /// Seed for the noise stages. Omit for a clock-derived seed;
    /// pass a value to make batch runs reproducible.
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u32>,

    /// List the registered commands and exit.
    #[arg(long)]
    pub list: bool,

    /// Print per-file timing information.
    #[arg(short, long)]
    pub verbose: bool,
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run all CLI processing and return an OS exit code.
/// `0` = all files succeeded, `1` = one or more files failed.
pub fn run(args: CliArgs) -> ExitCode {
    let registry = Registry::with_builtins();

    if args.list {
        for plugin in registry.iter() {
            println!("{:<28} {}", plugin.spec.name, plugin.spec.menu_path);
            println!("{:<28} {}", "", plugin.spec.blurb);
        }
        return ExitCode::SUCCESS;
    }

    // clap guarantees a command when --list is absent
    let command = args.command.as_deref().unwrap_or_default();
    if registry.get(command).is_none() {
        eprintln!(
            "error: unknown command '{}'. Use --list to see registered commands.",
            command
        );
        return ExitCode::FAILURE;
    }

    // Resolve glob patterns / literal paths → concrete PathBufs
    let inputs = resolve_inputs(&args.input);
    if inputs.is_empty() {
        eprintln!("error: no input files matched the given pattern(s).");
        return ExitCode::FAILURE;
    }

    // Multiple inputs require --output-dir, not --output
    if inputs.len() > 1 && args.output.is_some() && args.output_dir.is_none() {
        eprintln!(
            "error: {} input files given but --output only accepts a single file path.\n\
             Use --output-dir to specify a destination directory for batch processing.",
            inputs.len()
        );
        return ExitCode::FAILURE;
    }

    let save_format = parse_format(args.format.as_deref(), args.output.as_deref());

    // Create output directory if specified
    if let Some(dir) = &args.output_dir
        && let Err(e) = std::fs::create_dir_all(dir)
    {
        eprintln!(
            "error: could not create output directory '{}': {}",
            dir.display(),
            e
        );
        return ExitCode::FAILURE;
    }

    let total = inputs.len();
    let multi = total > 1;
    let mut any_failure = false;

    for (idx, input_path) in inputs.iter().enumerate() {
        if multi || args.verbose {
            println!("[{}/{}] {}", idx + 1, total, input_path.display());
        }

        let file_start = Instant::now();

        let output_path = match build_output_path(
            input_path,
            args.output.as_deref(),
            args.output_dir.as_deref(),
            save_format,
        ) {
            Some(p) => p,
            None => {
                eprintln!(
                    "  error: cannot determine output path for '{}'.",
                    input_path.display()
                );
                any_failure = true;
                continue;
            }
        };

        match run_one(
            &registry,
            command,
            input_path,
            &output_path,
            save_format,
            args.quality,
            args.seed,
        ) {
            Ok(()) => {
                if args.verbose || multi {
                    println!(
                        "  → {} ({:.0}ms)",
                        output_path.display(),
                        file_start.elapsed().as_secs_f64() * 1000.0
                    );
                }
            }
            Err(e) => {
                eprintln!("  error: {}", e);
                any_failure = true;
            }
        }
    }

    if any_failure { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

// ============================================================================
// Per-file processing pipeline
// ============================================================================

fn run_one(
    registry: &Registry,
    command: &str,
    input: &Path,
    output: &Path,
    format: SaveFormat,
    quality: u8,
    seed: Option<u32>,
) -> Result<(), String> {
    // -- Step 1: Load ------------------------------------------------------
    let mut canvas = load_image_sync(input).map_err(|e| format!("load failed: {}", e))?;

    // -- Step 2: Dispatch the command --------------------------------------
    let mut processor = match seed {
        Some(s) => CpuProcessor::with_seed(s),
        None => CpuProcessor::new(),
    };
    registry
        .dispatch(command, &mut canvas, &mut processor)
        .map_err(|e| format!("'{}' failed: {}", command, e))?;

    // -- Step 3: Save ------------------------------------------------------
    encode_and_write(&canvas, output, format, quality)
        .map_err(|e| format!("save failed: {}", e))?;

    Ok(())
}

// ============================================================================
// Helpers
// ============================================================================

/// Expand glob patterns and literal paths into a deduplicated, ordered list.
fn resolve_inputs(patterns: &[String]) -> Vec<PathBuf> {
    let mut result: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let as_path = Path::new(pattern);

        if as_path.exists() {
            // Literal path — use directly
            if !result.iter().any(|p| p.as_path() == as_path) {
                result.push(as_path.to_path_buf());
            }
            continue;
        }

        // Treat as glob pattern
        match glob::glob(pattern) {
            Ok(entries) => {
                let mut matched = false;
                for entry in entries.flatten() {
                    if !result.contains(&entry) {
                        result.push(entry);
                    }
                    matched = true;
                }
                if !matched {
                    eprintln!("warning: pattern '{}' matched no files.", pattern);
                }
            }
            Err(e) => {
                eprintln!("warning: invalid glob '{}': {}", pattern, e);
            }
        }
    }

    result
}

/// Choose the [`SaveFormat`] from the `--format` string or infer it from the
/// output file extension. Defaults to PNG when neither is known.
fn parse_format(format_arg: Option<&str>, output: Option<&Path>) -> SaveFormat {
    if let Some(f) = format_arg {
        return match f.to_lowercase().as_str() {
            "jpeg" | "jpg" => SaveFormat::Jpeg,
            "webp"         => SaveFormat::Webp,
            "bmp"          => SaveFormat::Bmp,
            "tga"          => SaveFormat::Tga,
            "tiff" | "tif" => SaveFormat::Tiff,
            "gif"          => SaveFormat::Gif,
            _              => SaveFormat::Png,
        };
    }

    if let Some(out) = output {
        return match out
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
            .as_str()
        {
            "jpg" | "jpeg" => SaveFormat::Jpeg,
            "webp"         => SaveFormat::Webp,
            "bmp"          => SaveFormat::Bmp,
            "tga"          => SaveFormat::Tga,
            "tiff" | "tif" => SaveFormat::Tiff,
            "gif"          => SaveFormat::Gif,
            _              => SaveFormat::Png,
        };
    }

    SaveFormat::Png
}

/// Compute the output path for a single input file.
///
/// Priority:
/// 1. `--output` (explicit path, used for single-file input)
/// 2. `--output-dir` (batch directory, derives filename from input stem)
/// 3. Fallback: same directory as input, same stem, new extension
///    (appends `_out` to stem if it would collide with the input path)
fn build_output_path(
    input: &Path,
    output: Option<&Path>,
    output_dir: Option<&Path>,
    format: SaveFormat,
) -> Option<PathBuf> {
    // Explicit output path
    if let Some(out) = output {
        return Some(out.to_path_buf());
    }

    let ext = format.extension();
    let stem = input.file_stem()?.to_string_lossy().into_owned();

    if let Some(dir) = output_dir {
        return Some(dir.join(format!("{}.{}", stem, ext)));
    }

    // Write next to the input file
    let parent = input.parent().unwrap_or(Path::new("."));
    let candidate = parent.join(format!("{}.{}", stem, ext));

    // Avoid silent overwrite of the input
    if candidate == input {
        Some(parent.join(format!("{}_out.{}", stem, ext)))
    } else {
        Some(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing_prefers_the_explicit_flag() {
        assert_eq!(
            parse_format(Some("gif"), Some(Path::new("out.png"))),
            SaveFormat::Gif
        );
        assert_eq!(parse_format(None, Some(Path::new("out.jpeg"))), SaveFormat::Jpeg);
        assert_eq!(parse_format(None, None), SaveFormat::Png);
        assert_eq!(parse_format(Some("nonsense"), None), SaveFormat::Png);
    }

    #[test]
    fn output_path_avoids_clobbering_the_input() {
        let p = build_output_path(Path::new("dir/tile.png"), None, None, SaveFormat::Png);
        assert_eq!(p, Some(PathBuf::from("dir/tile_out.png")));

        let p = build_output_path(Path::new("dir/tile.jpg"), None, None, SaveFormat::Png);
        assert_eq!(p, Some(PathBuf::from("dir/tile.png")));
    }

    #[test]
    fn output_dir_takes_the_input_stem() {
        let p = build_output_path(
            Path::new("a/b/tile.jpg"),
            None,
            Some(Path::new("out")),
            SaveFormat::Gif,
        );
        assert_eq!(p, Some(PathBuf::from("out/tile.gif")));
    }
}
