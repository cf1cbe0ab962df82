//! arabic-pdf – command-line front end.
//!
//! Usage:
//!   arabic-pdf check-requirements
//!   arabic-pdf install-fonts [--force] [--source DIR] [--dest DIR]
//!   arabic-pdf render <input.html> [output.pdf] [--engine E] [--landscape]
//!                     [--title T] [--config FILE] [--layout FILE]
//!   arabic-pdf simple <title> <content> [output.pdf]
//!   arabic-pdf quran <surah> <ayah> <text> [output.pdf]
//!
//! Configuration is read from the `ARABIC_PDF_*` environment variables, then
//! from `--config`, then from the command-line flags.

use std::error::Error as StdError;
use std::path::{Path, PathBuf};
use std::{env, fs, process};

use arabic_pdf::config::{Config, ConfigOverrides, Orientation};
use arabic_pdf::install::{install_fonts, DEFAULT_FONT_DESTINATION};
use arabic_pdf::service::DEFAULT_DOWNLOAD_NAME;
use arabic_pdf::{ArabicPdfService, GenerateOptions, RenderedDocument};

type CliResult = Result<i32, Box<dyn StdError>>;

/// Parsed command line: positionals plus every recognised flag.
#[derive(Debug, Default)]
struct Args {
    positional: Vec<String>,
    engine: Option<String>,
    title: Option<String>,
    config: Option<PathBuf>,
    layout: Option<PathBuf>,
    source: Option<PathBuf>,
    dest: Option<PathBuf>,
    landscape: bool,
    force: bool,
}

fn main() {
    env_logger::init();

    let argv: Vec<String> = env::args().collect();
    let prog = argv.first().map_or("arabic-pdf", String::as_str);

    let args = match parse_args(&argv[1.min(argv.len())..]) {
        Ok(Some(a)) => a,
        Ok(None) => {
            print_usage(prog);
            process::exit(0);
        }
        Err(msg) => {
            eprintln!("{msg}");
            print_usage(prog);
            process::exit(1);
        }
    };

    let Some((command, rest)) = args.positional.split_first() else {
        print_usage(prog);
        process::exit(1);
    };

    let result = match command.as_str() {
        "check-requirements" => check_requirements(&args),
        "install-fonts" => install(&args),
        "render" => render(rest, &args),
        "simple" => simple(rest, &args),
        "quran" => quran(rest, &args),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage(prog);
            process::exit(1);
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// `Ok(None)` means help was requested.
fn parse_args(raw: &[String]) -> Result<Option<Args>, String> {
    let mut args = Args::default();
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("Missing value for {flag}"))
        };
        match arg.as_str() {
            "--landscape" | "-l" => args.landscape = true,
            "--force" | "-f" => args.force = true,
            "--engine" | "-e" => args.engine = Some(value(arg.as_str())?),
            "--title" | "-t" => args.title = Some(value(arg.as_str())?),
            "--config" | "-c" => args.config = Some(value(arg.as_str())?.into()),
            "--layout" => args.layout = Some(value(arg.as_str())?.into()),
            "--source" => args.source = Some(value(arg.as_str())?.into()),
            "--dest" => args.dest = Some(value(arg.as_str())?.into()),
            "--help" | "-h" => return Ok(None),
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("Unknown flag: {other}"));
            }
            _ => args.positional.push(arg.clone()),
        }
    }
    Ok(Some(args))
}

/// Environment, then `--config`, then flags.
fn overrides(args: &Args) -> Result<ConfigOverrides, Box<dyn StdError>> {
    let mut o = ConfigOverrides::from_env()?;
    if let Some(path) = &args.config {
        o = o.merge(ConfigOverrides::from_json_file(path)?);
    }
    let flags = ConfigOverrides {
        engine: args.engine.as_deref().map(str::parse).transpose()?,
        orientation: args.landscape.then_some(Orientation::Landscape),
        ..ConfigOverrides::default()
    };
    Ok(o.merge(flags))
}

fn service(args: &Args) -> Result<ArabicPdfService, Box<dyn StdError>> {
    Ok(ArabicPdfService::new(overrides(args)?)?)
}

fn check_requirements(args: &Args) -> CliResult {
    let svc = service(args)?;
    let report = svc.check_requirements();

    println!("arabic-pdf {}", report.version);
    println!("Font directory: {}", report.font_directory.display());
    println!(
        "Fonts: {} present, {} missing",
        report.fonts_present.len(),
        report.fonts_missing.len()
    );
    for name in &report.fonts_missing {
        println!("   missing: {name}");
    }

    if report.engines.is_empty() {
        println!("No PDF engines found");
        for line in svc.installation_instructions() {
            println!("{line}");
        }
    } else {
        println!("PDF engines available:");
        for (id, description) in &report.engines {
            println!("   • {id}: {description}");
        }
    }

    if !report.status {
        println!("Some requirements are missing.");
        return Ok(1);
    }
    if let Some(id) = svc.recommended_engine() {
        println!("Recommended engine: {id}");
    }
    Ok(0)
}

fn install(args: &Args) -> CliResult {
    let source = match &args.source {
        Some(s) => s.clone(),
        None => Config::with_overrides(&overrides(args)?)?.font_path,
    };
    let dest = args
        .dest
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FONT_DESTINATION));

    let report = install_fonts(&source, &dest, args.force)?;
    for name in &report.skipped {
        eprintln!("Font already exists: {name} (use --force to overwrite)");
    }
    println!(
        "Installed {} font file(s) to {}",
        report.copied.len(),
        report.destination.display()
    );
    Ok(0)
}

fn render(rest: &[String], args: &Args) -> CliResult {
    let (input, output) = match rest {
        [input] => (PathBuf::from(input), None),
        [input, output] => (PathBuf::from(input), Some(PathBuf::from(output))),
        _ => return Err("render takes <input.html> [output.pdf]".into()),
    };
    // Default output: same directory + same stem as input, but with .pdf
    let output = output.unwrap_or_else(|| input.with_extension("pdf"));

    let html = fs::read_to_string(&input)
        .map_err(|e| format!("cannot read '{}': {e}", input.display()))?;
    let title = args.title.clone().or_else(|| {
        input
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_string)
    });

    let svc = service(args)?;
    let doc = svc.generate(&html, &GenerateOptions { title })?;
    if let Some(path) = &args.layout {
        dump_layout(&doc, path)?;
    }
    write_document(doc, &output)
}

fn simple(rest: &[String], args: &Args) -> CliResult {
    let [title, content, tail @ ..] = rest else {
        return Err("simple takes <title> <content> [output.pdf]".into());
    };
    let output = output_path(tail)?;
    let options = GenerateOptions {
        title: args.title.clone().or_else(|| Some(title.clone())),
    };
    let doc = service(args)?.create_simple_document(title, content, &options)?;
    write_document(doc, &output)
}

fn quran(rest: &[String], args: &Args) -> CliResult {
    let [surah, ayah, text, tail @ ..] = rest else {
        return Err("quran takes <surah> <ayah> <text> [output.pdf]".into());
    };
    let output = output_path(tail)?;
    let options = GenerateOptions {
        title: args.title.clone(),
    };
    let doc = service(args)?.create_quran_document(surah, ayah, text, &options)?;
    write_document(doc, &output)
}

fn output_path(tail: &[String]) -> Result<PathBuf, Box<dyn StdError>> {
    match tail {
        [] => Ok(PathBuf::from(DEFAULT_DOWNLOAD_NAME)),
        [out] => Ok(PathBuf::from(out)),
        _ => Err(format!("unexpected argument: {}", tail[1]).into()),
    }
}

fn dump_layout(doc: &RenderedDocument, path: &Path) -> Result<(), Box<dyn StdError>> {
    match doc {
        #[cfg(feature = "forge")]
        RenderedDocument::Forge(d) => {
            fs::write(path, d.layout().to_json()?)?;
            eprintln!("Wrote layout '{}'", path.display());
        }
        other => eprintln!(
            "--layout is only supported by the forge engine, not {}",
            other.engine()
        ),
    }
    Ok(())
}

fn write_document(doc: RenderedDocument, output: &Path) -> CliResult {
    // Create output directory if necessary.
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let engine = doc.engine();
    let pages = doc.page_count();
    let bytes = doc.into_bytes();
    fs::write(output, &bytes).map_err(|e| format!("cannot write '{}': {e}", output.display()))?;
    eprintln!(
        "Wrote '{}' with {engine} ({} bytes, {} page{})",
        output.display(),
        bytes.len(),
        pages,
        if pages == 1 { "" } else { "s" }
    );
    Ok(0)
}

fn print_usage(prog: &str) {
    eprintln!("arabic-pdf – Arabic PDF generator");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} check-requirements");
    eprintln!("  {prog} install-fonts [--force] [--source DIR] [--dest DIR]");
    eprintln!("  {prog} render <input.html> [output.pdf] [--engine E] [--landscape] [--title T]");
    eprintln!("                [--config FILE] [--layout FILE]");
    eprintln!("  {prog} simple <title> <content> [output.pdf]");
    eprintln!("  {prog} quran <surah> <ayah> <text> [output.pdf]");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --engine, -e   forge, chromium or wkhtmltopdf (default: recommended engine)");
    eprintln!("  --landscape    Use landscape page orientation");
    eprintln!("  --title, -t    Document title in PDF metadata (default: input filename stem)");
    eprintln!("  --config, -c   JSON configuration file");
    eprintln!("  --layout       Also write the forge page layout as JSON");
    eprintln!("  --force, -f    Overwrite fonts that are already installed");
    eprintln!("  --source DIR   Font source directory (default: configured font_path)");
    eprintln!("  --dest DIR     Font destination (default: {DEFAULT_FONT_DESTINATION})");
    eprintln!("  --help         Print this message");
    eprintln!();
    eprintln!("Configuration is also read from ARABIC_PDF_* environment variables; RUST_LOG");
    eprintln!("controls logging.");
}
