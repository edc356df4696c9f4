//! Shared integration test helpers for vdiff.
//!
//! Include with `mod common;` at the top of a test file. The
//! `#![allow(dead_code)]` keeps files that use only a subset quiet.

#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use parking_lot::{Condvar, Mutex};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use vdiff::{Backend, CacheError, ProcessError, ProcessRunner, RenderCache};

/// Colour of the reference image written by [`TestSuiteDir::add_document`].
pub const REFERENCE_COLOR: Rgba<u8> = Rgba([40, 120, 200, 255]);

/// What a [`FakeRasterizer`] writes to its output path.
#[derive(Debug, Clone, Copy)]
pub enum FakeOutput {
    /// Every pixel the same colour.
    Solid(Rgba<u8>),
    /// Row `y` is painted `[0, y, 0, 255]`, so crops can be located.
    RowIndex,
    /// Write nothing at all.
    Nothing,
    /// Write bytes that are not an image.
    Garbage,
    /// Fail as if the program exited with status 1.
    ExitFailure,
}

/// Stand-in for the Java runtime.
///
/// Understands the rasterizer argument layout
/// `... -jar <jar> <width> <height> <input> <output>` and writes a PNG of the
/// requested size to `<output>`.
pub struct FakeRasterizer {
    output: FakeOutput,
    stdout: String,
    calls: AtomicUsize,
    gate: Option<Gate>,
    delay: Option<Duration>,
}

impl FakeRasterizer {
    pub fn new(output: FakeOutput) -> Self {
        Self {
            output,
            stdout: String::new(),
            calls: AtomicUsize::new(0),
            gate: None,
            delay: None,
        }
    }

    /// Text returned as the program's combined output.
    pub fn with_stdout(mut self, stdout: &str) -> Self {
        self.stdout = stdout.to_string();
        self
    }

    /// Block every run until `gate` is opened.
    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Sleep for `delay` after writing the output, before exiting.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ProcessRunner for FakeRasterizer {
    fn run(&self, program: &str, args: &[String]) -> Result<String, ProcessError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.wait();
        }

        let n = args.len();
        assert!(n >= 4, "unexpected arguments: {args:?}");
        let width: u32 = args[n - 4].parse().unwrap();
        let height: u32 = args[n - 3].parse().unwrap();
        let output = PathBuf::from(&args[n - 1]);

        match self.output {
            FakeOutput::Solid(color) => {
                RgbaImage::from_pixel(width, height, color).save(&output).unwrap();
            }
            FakeOutput::RowIndex => {
                RgbaImage::from_fn(width, height, |_, y| Rgba([0, y as u8, 0, 255]))
                    .save(&output)
                    .unwrap();
            }
            FakeOutput::Nothing => {}
            FakeOutput::Garbage => std::fs::write(&output, b"not a png").unwrap(),
            FakeOutput::ExitFailure => {
                return Err(ProcessError::Exit {
                    program: program.to_string(),
                    status: "exit status: 1".to_string(),
                    output: "java.lang.OutOfMemoryError".to_string(),
                });
            }
        }
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.stdout.clone())
    }
}

/// One-shot latch shared between a test and a blocked [`FakeRasterizer`].
#[derive(Clone, Default)]
pub struct Gate {
    inner: std::sync::Arc<(Mutex<bool>, Condvar)>,
}

impl Gate {
    pub fn open(&self) {
        let (open, condvar) = &*self.inner;
        *open.lock() = true;
        condvar.notify_all();
    }

    fn wait(&self) {
        let (open, condvar) = &*self.inner;
        let mut open = open.lock();
        while !*open {
            condvar.wait(&mut open);
        }
    }
}

/// In-memory [`RenderCache`] that counts its calls.
#[derive(Default)]
pub struct CountingCache {
    entries: Mutex<HashMap<(Backend, PathBuf), RgbaImage>>,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl CountingCache {
    pub fn seed(&self, backend: Backend, document: &Path, image: RgbaImage) {
        self.entries
            .lock()
            .insert((backend, document.to_path_buf()), image);
    }

    pub fn contains(&self, backend: Backend, document: &Path) -> bool {
        self.entries
            .lock()
            .contains_key(&(backend, document.to_path_buf()))
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl RenderCache for CountingCache {
    fn get(&self, backend: Backend, document: &Path) -> Option<RgbaImage> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.entries
            .lock()
            .get(&(backend, document.to_path_buf()))
            .cloned()
    }

    fn put(&self, backend: Backend, document: &Path, image: &RgbaImage) -> Result<(), CacheError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.seed(backend, document, image.clone());
        Ok(())
    }
}

/// Temporary test-suite tree with a separate working directory.
pub struct TestSuiteDir {
    pub root: TempDir,
}

impl TestSuiteDir {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.root.path().join("work")
    }

    /// Write `<name>.svg` with the given markup.
    pub fn add_raw_document(&self, name: &str, markup: &str) -> PathBuf {
        let dir = self.root.path().join("structure/svg");
        std::fs::create_dir_all(&dir).unwrap();
        let document = dir.join(format!("{name}.svg"));
        std::fs::write(&document, markup).unwrap();
        document
    }

    /// Write `<name>.svg` of the given nominal size, plus a solid
    /// [`REFERENCE_COLOR`] reference PNG of the same size when `reference`
    /// is set.
    pub fn add_document(&self, name: &str, width: u32, height: u32, reference: bool) -> PathBuf {
        let markup = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" "#,
        ) + &format!(r#"viewBox="0 0 {width} {height}"><rect width="{width}" "#)
            + &format!(r#"height="{height}" fill="rgb(40,120,200)"/></svg>"#);
        let document = self.add_raw_document(name, &markup);
        if reference {
            RgbaImage::from_pixel(width, height, REFERENCE_COLOR)
                .save(document.with_extension("png"))
                .unwrap();
        }
        document
    }
}

/// `true` if not every pixel of `image` is the same.
pub fn is_non_uniform(image: &RgbaImage) -> bool {
    let first = image.get_pixel(0, 0);
    image.pixels().any(|p| p != first)
}

/// Rasterizer output files still sitting directly in `work_dir`.
pub fn leftover_outputs(work_dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(work_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "png"))
                .collect()
        })
        .unwrap_or_default()
}
