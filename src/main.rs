use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::{fs, io};

use clap::Parser;
use rayon::prelude::*;
use serde::Deserialize;

use cursus_pdf::pdf::PageStyle;
use cursus_pdf::snapshot::SnapshotStore;
use cursus_pdf::{Error, generate_booklet, generate_module_sheet, generate_unit_sheet};

/// Render a generated study-programme site into PDF booklets and sheets.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Root of the generated site (snapshot directories below it).
    site: PathBuf,
    /// Output directory; the site's tree is mirrored underneath.
    out: PathBuf,
    /// Run configuration.
    #[arg(long, default_value = "cursus.toml")]
    config: PathBuf,
}

#[derive(Deserialize)]
struct Config {
    /// Public base URL the site is served from; link targets join it.
    base_url: String,
    /// Directory names that hold a formation's per-mode booklet page.
    mode_folders: Vec<String>,
    #[serde(default)]
    concurrency: Concurrency,
    #[serde(default)]
    style: StyleOverrides,
}

#[derive(Deserialize)]
struct Concurrency {
    #[serde(default = "default_booklets")]
    booklets: usize,
    #[serde(default = "default_modules")]
    modules: usize,
    #[serde(default = "default_units")]
    units: usize,
}

fn default_booklets() -> usize {
    3
}
fn default_modules() -> usize {
    6
}
fn default_units() -> usize {
    7
}

impl Default for Concurrency {
    fn default() -> Self {
        Self {
            booklets: default_booklets(),
            modules: default_modules(),
            units: default_units(),
        }
    }
}

#[derive(Default, Deserialize)]
struct StyleOverrides {
    footer_text: Option<String>,
    epsilon: Option<f32>,
    link_nudge_x: Option<f32>,
    link_nudge_y: Option<f32>,
    anchor_shift_x: Option<f32>,
    header_logo: Option<PathBuf>,
    footer_logo: Option<PathBuf>,
}

impl Config {
    fn load(path: &Path) -> Result<Self, Error> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid {}: {e}", path.display())))
    }

    fn page_style(&self) -> PageStyle {
        let mut style = PageStyle::default();
        let o = &self.style;
        if let Some(footer) = &o.footer_text {
            style.footer_text = footer.clone();
        }
        if let Some(v) = o.epsilon {
            style.epsilon = v;
        }
        if let Some(v) = o.link_nudge_x {
            style.link_nudge_x = v;
        }
        if let Some(v) = o.link_nudge_y {
            style.link_nudge_y = v;
        }
        if let Some(v) = o.anchor_shift_x {
            style.anchor_shift_x = v;
        }
        style.header_logo = o.header_logo.clone();
        style.footer_logo = o.footer_logo.clone();
        style
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Kind {
    Booklet,
    Module,
    Unit,
}

/// Relative paths of every directory under `dir` that carries a layout
/// snapshot.
fn discover(dir: &Path, rel: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let sub_rel = rel.join(entry.file_name());
        let sub = entry.path();
        if sub.join("layout.json").exists() {
            out.push(sub_rel.clone());
        }
        discover(&sub, &sub_rel, out)?;
    }
    Ok(())
}

/// Page kind from the site's nesting convention: a mode folder holds a
/// formation's booklet page, its children are modules, grandchildren are
/// units. Anything else (index pages and the like) gets no PDF.
fn classify(rel: &Path, mode_folders: &[String]) -> Option<Kind> {
    let is_mode = |p: &Path| {
        p.file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| mode_folders.iter().any(|m| m == name))
    };
    if is_mode(rel) {
        return Some(Kind::Booklet);
    }
    let parent = rel.parent()?;
    if is_mode(parent) {
        return Some(Kind::Module);
    }
    if is_mode(parent.parent()?) {
        return Some(Kind::Unit);
    }
    None
}

fn output_path(out_dir: &Path, rel: &Path, kind: Kind) -> Option<PathBuf> {
    match kind {
        // "<formation>-<mode>.pdf", next to the formation's other files.
        Kind::Booklet => {
            let mode = rel.file_name()?.to_str()?;
            let parent = rel.parent()?;
            let formation = parent.file_name()?.to_str()?;
            Some(out_dir.join(parent).join(format!("{formation}-{mode}.pdf")))
        }
        Kind::Module | Kind::Unit => Some(out_dir.join(rel).with_extension("pdf")),
    }
}

fn page_path(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

/// Run one generation wave on its own sized thread pool.
fn wave<F>(label: &str, threads: usize, pages: &[PathBuf], failures: &AtomicUsize, f: F)
where
    F: Fn(&Path) -> Result<(), Error> + Sync,
{
    if pages.is_empty() {
        return;
    }
    let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("cannot build {label} pool: {e}");
            failures.fetch_add(pages.len(), Ordering::Relaxed);
            return;
        }
    };
    log::info!("rendering {} {label} on {threads} threads", pages.len());
    pool.install(|| {
        pages.par_iter().for_each(|rel| {
            if let Err(e) = f(rel) {
                log::error!("{}: {e}", rel.display());
                failures.fetch_add(1, Ordering::Relaxed);
            }
        });
    });
}

fn run(args: &Args) -> Result<usize, Error> {
    let config = Config::load(&args.config)?;
    let style = config.page_style();
    let source = SnapshotStore::new(&args.site);

    let mut pages = Vec::new();
    discover(&args.site, Path::new(""), &mut pages)?;
    pages.sort();

    let mut booklets = Vec::new();
    let mut modules = Vec::new();
    let mut units = Vec::new();
    for rel in pages {
        match classify(&rel, &config.mode_folders) {
            Some(Kind::Booklet) => booklets.push(rel),
            Some(Kind::Module) => modules.push(rel),
            Some(Kind::Unit) => units.push(rel),
            None => {}
        }
    }
    log::info!(
        "found {} booklets, {} modules, {} units",
        booklets.len(),
        modules.len(),
        units.len()
    );

    let failures = AtomicUsize::new(0);
    let generate = |rel: &Path, kind: Kind| -> Result<(), Error> {
        let Some(output) = output_path(&args.out, rel, kind) else {
            return Err(Error::Config(format!("unmappable page {}", rel.display())));
        };
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }
        let path = page_path(rel);
        match kind {
            Kind::Booklet => generate_booklet(&source, &path, &config.base_url, &style, &output),
            Kind::Module => {
                generate_module_sheet(&source, &path, &config.base_url, &style, &output)
            }
            Kind::Unit => generate_unit_sheet(&source, &path, &config.base_url, &style, &output),
        }
        .map(|_| ())
    };

    let c = &config.concurrency;
    wave("booklets", c.booklets, &booklets, &failures, |rel| {
        generate(rel, Kind::Booklet)
    });
    wave("modules", c.modules, &modules, &failures, |rel| {
        generate(rel, Kind::Module)
    });
    wave("units", c.units, &units, &failures, |rel| {
        generate(rel, Kind::Unit)
    });

    Ok(failures.into_inner())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            log::error!("{failed} documents failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
