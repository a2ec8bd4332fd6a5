use crate::error::{ErrorKind, Result};
use crate::{CaptureBatch, Mode, Page, Prompt};
use exn::ResultExt;
use scandoc_artifact::{Artifact, ArtifactKind, ArtifactStore};
use scandoc_config::ScanParameters;
use scandoc_device::CaptureDevice;
use scandoc_document::{DocumentAssembler, DocumentCompressor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::instrument;

/// Resolution embedded images are downsampled to unless configured otherwise.
pub const DEFAULT_TARGET_DPI: u32 = 150;

const CONTINUE_PROMPT: &str = "Press Enter to scan another page, or type anything and press Enter to finish: ";

/// State of the manual multi-page loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Scanning pages, one per iteration.
    Capturing,
    /// The operator is done; only assembly and compression remain.
    Assembling,
}

impl LoopState {
    /// An empty answer keeps capturing. Anything else, including closed
    /// input, moves on to assembly.
    pub fn next(self, answer: Option<&str>) -> Self {
        match (self, answer) {
            (Self::Capturing, Some("")) => Self::Capturing,
            _ => Self::Assembling,
        }
    }
}

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub mode: Mode,
    pub pages: usize,
    pub output: PathBuf,
}

/// Check that `outfile` names a PDF (case-insensitive `.pdf` suffix).
pub fn validate_outfile(outfile: &Path) -> Result<()> {
    let bytes = outfile.as_os_str().as_encoded_bytes();
    let is_pdf = bytes.len() >= 4 && bytes[bytes.len() - 4..].eq_ignore_ascii_case(b".pdf");
    if !is_pdf {
        exn::bail!(ErrorKind::Usage(outfile.to_path_buf()));
    }
    Ok(())
}

/// Drives one capture run from scanner to output file.
///
/// The collaborators are generic so tests can swap in mocks; references to
/// collaborators work too.
pub struct CapturePipeline<D, A, C> {
    store: ArtifactStore,
    device: D,
    assembler: A,
    compressor: C,
    params: ScanParameters,
    target_dpi: u32,
    interrupted: Arc<AtomicBool>,
}

impl<D, A, C> CapturePipeline<D, A, C>
where
    D: CaptureDevice,
    A: DocumentAssembler,
    C: DocumentCompressor,
{
    pub fn new(store: ArtifactStore, device: D, assembler: A, compressor: C, params: ScanParameters) -> Self {
        Self {
            store,
            device,
            assembler,
            compressor,
            params,
            target_dpi: DEFAULT_TARGET_DPI,
            interrupted: Arc::default(),
        }
    }

    pub fn with_target_dpi(mut self, target_dpi: u32) -> Self {
        self.target_dpi = target_dpi;
        self
    }

    /// Share an interrupt flag with a signal handler. Once set, the run stops
    /// before its next external invocation or prompt and cleans up.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupted = flag;
        self
    }

    /// Run `mode`, writing the result to `outfile`. `prompt` is only consulted
    /// in [`Mode::ManyPages`].
    pub fn run(&self, mode: Mode, outfile: &Path, prompt: &mut dyn Prompt) -> Result<Report> {
        match mode {
            Mode::OnePage => self.one_page(outfile),
            Mode::ManyPages => self.many_pages(outfile, prompt),
            Mode::ManyPagesFed => self.many_pages_fed(outfile),
        }
    }

    /// Scan a single page into `outfile`.
    #[instrument(skip_all, fields(outfile = %outfile.display()))]
    pub fn one_page(&self, outfile: &Path) -> Result<Report> {
        validate_outfile(outfile)?;
        let mut batch = CaptureBatch::new();
        batch.push(Page::Scanned(self.capture_page()?));
        self.finish(Mode::OnePage, &batch, outfile)
    }

    /// Scan pages one at a time, asking the operator after each one whether
    /// to continue.
    ///
    /// Pages acquired so far live in `batch`; any early return drops it and
    /// releases them.
    #[instrument(skip_all, fields(outfile = %outfile.display()))]
    pub fn many_pages(&self, outfile: &Path, prompt: &mut dyn Prompt) -> Result<Report> {
        validate_outfile(outfile)?;
        let mut batch = CaptureBatch::new();
        let mut state = LoopState::Capturing;
        while state == LoopState::Capturing {
            batch.push(Page::Scanned(self.capture_page()?));
            self.check_interrupt()?;
            let message = format!("Page {} scanned. {CONTINUE_PROMPT}", batch.len());
            let answer = prompt.ask(&message).or_raise(|| ErrorKind::Prompt)?;
            state = state.next(answer.as_deref());
            tracing::debug!(pages = batch.len(), ?state, "Operator answered");
        }
        self.finish(Mode::ManyPages, &batch, outfile)
    }

    /// Scan the whole document feeder in one go.
    #[instrument(skip_all, fields(outfile = %outfile.display()))]
    pub fn many_pages_fed(&self, outfile: &Path) -> Result<Report> {
        validate_outfile(outfile)?;
        self.check_interrupt()?;
        let batch_dir = self.store.acquire(ArtifactKind::Batch, "").or_raise(|| ErrorKind::Artifact)?;
        self.device.capture_batch(&self.params, batch_dir.path()).or_raise(|| ErrorKind::Device)?;
        let batch: CaptureBatch = batch_dir
            .visible_files()
            .or_raise(|| ErrorKind::Artifact)?
            .into_iter()
            .map(Page::Fed)
            .collect();
        tracing::info!(pages = batch.len(), "Document feeder finished");
        // `batch_dir` owns the fed pages and must outlive assembly.
        self.finish(Mode::ManyPagesFed, &batch, outfile)
    }

    fn capture_page(&self) -> Result<Artifact> {
        self.check_interrupt()?;
        let page = self
            .store
            .acquire(ArtifactKind::Page, self.params.format.extension())
            .or_raise(|| ErrorKind::Artifact)?;
        self.device.capture_one(&self.params, page.path()).or_raise(|| ErrorKind::Device)?;
        Ok(page)
    }

    /// Assemble, compress, and move the result into place.
    fn finish(&self, mode: Mode, batch: &CaptureBatch, outfile: &Path) -> Result<Report> {
        if batch.is_empty() {
            exn::bail!(ErrorKind::EmptyBatch);
        }
        self.check_interrupt()?;
        let document = self.store.acquire(ArtifactKind::Document, ".pdf").or_raise(|| ErrorKind::Artifact)?;
        self.assembler.assemble(&batch.paths(), document.path()).or_raise(|| ErrorKind::Assembly)?;

        self.check_interrupt()?;
        // Same directory as the destination, so the final rename is atomic.
        let scratch = self
            .store
            .acquire_in(output_dir(outfile), ArtifactKind::Output, ".pdf")
            .or_raise(|| ErrorKind::Artifact)?;
        self.compressor
            .compress(document.path(), scratch.path(), self.target_dpi)
            .or_raise(|| ErrorKind::Compression)?;
        document.release().or_raise(|| ErrorKind::Artifact)?;

        self.check_interrupt()?;
        scratch.persist(outfile).or_raise(|| ErrorKind::Artifact)?;
        tracing::info!(%mode, pages = batch.len(), output = %outfile.display(), "Document written");
        Ok(Report { mode, pages: batch.len(), output: outfile.to_path_buf() })
    }

    fn check_interrupt(&self) -> Result<()> {
        if self.interrupted.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Interrupted);
        }
        Ok(())
    }
}

fn output_dir(outfile: &Path) -> &Path {
    match outfile.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptedPrompt;
    use rstest::rstest;
    use scandoc_artifact::Stats;
    use scandoc_device::MockDevice;
    use scandoc_document::{MockAssembler, MockCompressor};
    use std::ops::Deref;

    type Pipeline<'a> = CapturePipeline<&'a MockDevice, &'a MockAssembler, &'a MockCompressor>;

    struct Fixture {
        dir: tempfile::TempDir,
        store: ArtifactStore,
        device: MockDevice,
        assembler: MockAssembler,
        compressor: MockCompressor,
    }

    impl Fixture {
        fn new(device: MockDevice) -> Self {
            Self::with(device, MockAssembler::new(), MockCompressor::new())
        }

        fn with(device: MockDevice, assembler: MockAssembler, compressor: MockCompressor) -> Self {
            let dir = tempfile::tempdir().unwrap();
            std::fs::create_dir(dir.path().join("tmp")).unwrap();
            let store = ArtifactStore::in_dir(dir.path().join("tmp"));
            Self { dir, store, device, assembler, compressor }
        }

        fn pipeline(&self) -> Pipeline<'_> {
            CapturePipeline::new(
                self.store.clone(),
                &self.device,
                &self.assembler,
                &self.compressor,
                ScanParameters::default(),
            )
        }

        fn outfile(&self) -> PathBuf {
            self.dir.path().join("scan.pdf")
        }

        /// Nothing left behind in the store's directory or beside the output.
        fn assert_clean(&self) {
            let stats = self.store.stats();
            assert_eq!(stats.pending(), 0, "{stats:?}");
            assert_eq!(std::fs::read_dir(self.dir.path().join("tmp")).unwrap().count(), 0);
            let leftovers: Vec<_> = std::fs::read_dir(self.dir.path())
                .unwrap()
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .filter(|name| name.starts_with(".scandoc-"))
                .collect();
            assert!(leftovers.is_empty(), "{leftovers:?}");
        }
    }

    #[rstest]
    #[case(LoopState::Capturing, Some(""), LoopState::Capturing)]
    #[case(LoopState::Capturing, Some("x"), LoopState::Assembling)]
    #[case(LoopState::Capturing, Some(" "), LoopState::Assembling)]
    #[case(LoopState::Capturing, None, LoopState::Assembling)]
    #[case(LoopState::Assembling, Some(""), LoopState::Assembling)]
    fn loop_transitions(#[case] from: LoopState, #[case] answer: Option<&str>, #[case] expected: LoopState) {
        assert_eq!(from.next(answer), expected);
    }

    #[rstest]
    #[case("x.pdf", true)]
    #[case("x.PDF", true)]
    #[case("dir/Scan.Pdf", true)]
    #[case("x.jpg", false)]
    #[case("x.pdf.jpg", false)]
    #[case("pdf", false)]
    #[case("", false)]
    fn outfile_extension(#[case] path: &str, #[case] valid: bool) {
        assert_eq!(validate_outfile(Path::new(path)).is_ok(), valid);
    }

    #[test]
    fn one_page() {
        let fx = Fixture::new(MockDevice::new());
        let outfile = fx.outfile();
        let report = fx.pipeline().one_page(&outfile).unwrap();
        assert_eq!(report, Report { mode: Mode::OnePage, pages: 1, output: outfile.clone() });
        assert_eq!(std::fs::read_to_string(&outfile).unwrap(), "page 1");
        assert_eq!(fx.compressor.calls().len(), 1);
        assert_eq!(fx.compressor.calls()[0].1, DEFAULT_TARGET_DPI);
        assert_eq!(fx.store.stats(), Stats { acquired: 3, released: 3 });
        fx.assert_clean();
    }

    #[test]
    fn one_page_uppercase_extension() {
        let fx = Fixture::new(MockDevice::new());
        let outfile = fx.dir.path().join("x.PDF");
        fx.pipeline().one_page(&outfile).unwrap();
        assert!(outfile.is_file());
    }

    #[rstest]
    #[case(Mode::OnePage)]
    #[case(Mode::ManyPages)]
    #[case(Mode::ManyPagesFed)]
    fn rejects_non_pdf_before_scanning(#[case] mode: Mode) {
        let fx = Fixture::new(MockDevice::new());
        let outfile = fx.dir.path().join("x.jpg");
        let err = fx.pipeline().run(mode, &outfile, &mut ScriptedPrompt::default()).unwrap_err();
        assert_eq!(*err, ErrorKind::Usage(outfile.clone()));
        assert_eq!(fx.device.captures(), 0);
        assert_eq!(fx.device.batches(), 0);
        assert_eq!(fx.store.stats(), Stats::default());
        assert!(!outfile.exists());
    }

    #[test]
    fn target_dpi_is_passed_through() {
        let fx = Fixture::new(MockDevice::new());
        fx.pipeline().with_target_dpi(72).one_page(&fx.outfile()).unwrap();
        assert_eq!(fx.compressor.calls()[0].1, 72);
    }

    #[rstest]
    #[case(&["", "", "x"], 3)]
    #[case(&["x"], 1)]
    #[case(&["done"], 1)]
    #[case(&["", "stop"], 2)]
    #[case(&["", ""], 3)]
    #[case(&[], 1)]
    fn many_pages_stops_on_answer(#[case] answers: &[&str], #[case] expected: usize) {
        let fx = Fixture::new(MockDevice::new());
        let mut prompt = ScriptedPrompt::new(answers.iter().copied());
        let outfile = fx.outfile();
        let report = fx.pipeline().many_pages(&outfile, &mut prompt).unwrap();

        assert_eq!(report.pages, expected);
        assert_eq!(fx.device.captures(), expected);
        assert_eq!(prompt.asked().len(), expected);
        let pages: Vec<String> = (1..=expected).map(|n| format!("page {n}")).collect();
        assert_eq!(fx.assembler.last_pages(), pages);
        assert_eq!(std::fs::read_to_string(&outfile).unwrap(), pages.join("\n"));
        fx.assert_clean();
    }

    #[test]
    fn many_pages_prompt_counts_pages() {
        let fx = Fixture::new(MockDevice::new());
        let mut prompt = ScriptedPrompt::new(["", "x"]);
        fx.pipeline().many_pages(&fx.outfile(), &mut prompt).unwrap();
        assert!(prompt.asked()[0].starts_with("Page 1 scanned."));
        assert!(prompt.asked()[1].starts_with("Page 2 scanned."));
    }

    #[test]
    fn many_pages_device_failure_mid_loop() {
        let fx = Fixture::new(MockDevice::new().fail_on(3));
        let mut prompt = ScriptedPrompt::new(["", "", "", ""]);
        let outfile = fx.outfile();
        let err = fx.pipeline().many_pages(&outfile, &mut prompt).unwrap_err();

        assert_eq!(*err, ErrorKind::Device);
        assert_eq!(fx.device.captures(), 3);
        assert_eq!(fx.assembler.calls(), 0);
        // Two captured pages plus the page file the failed capture was given.
        assert_eq!(fx.store.stats(), Stats { acquired: 3, released: 3 });
        assert!(fx.device.page_paths().iter().all(|p| !p.exists()));
        assert!(!outfile.exists());
        fx.assert_clean();
    }

    #[test]
    fn many_pages_interrupted_at_prompt() {
        struct Interrupting(Arc<AtomicBool>);
        impl Prompt for Interrupting {
            fn ask(&mut self, _message: &str) -> std::io::Result<Option<String>> {
                self.0.store(true, Ordering::SeqCst);
                Ok(Some(String::new()))
            }
        }

        let fx = Fixture::new(MockDevice::new());
        let flag = Arc::new(AtomicBool::new(false));
        let outfile = fx.outfile();
        let pipeline = fx.pipeline().with_interrupt(flag.clone());
        let err = pipeline.many_pages(&outfile, &mut Interrupting(flag)).unwrap_err();

        assert_eq!(*err, ErrorKind::Interrupted);
        assert_eq!(fx.device.captures(), 1);
        assert!(!outfile.exists());
        fx.assert_clean();
    }

    #[test]
    fn many_pages_prompt_failure() {
        struct Broken;
        impl Prompt for Broken {
            fn ask(&mut self, _message: &str) -> std::io::Result<Option<String>> {
                Err(std::io::Error::other("terminal went away"))
            }
        }

        let fx = Fixture::new(MockDevice::new());
        let err = fx.pipeline().many_pages(&fx.outfile(), &mut Broken).unwrap_err();
        assert_eq!(*err, ErrorKind::Prompt);
        fx.assert_clean();
    }

    #[test]
    fn fed_pages_in_file_name_order() {
        let device = MockDevice::new().with_batch([
            ("page-0002.tiff", "second"),
            (".lockfile", "hidden"),
            ("page-0001.tiff", "first"),
        ]);
        let fx = Fixture::new(device);
        let outfile = fx.outfile();
        let report = fx.pipeline().many_pages_fed(&outfile).unwrap();

        assert_eq!(report.pages, 2);
        assert_eq!(fx.device.batches(), 1);
        assert_eq!(fx.device.captures(), 0);
        assert_eq!(fx.assembler.last_pages(), ["first", "second"]);
        assert_eq!(std::fs::read_to_string(&outfile).unwrap(), "first\nsecond");
        // Batch directory, merged document, output scratch.
        assert_eq!(fx.store.stats(), Stats { acquired: 3, released: 3 });
        fx.assert_clean();
    }

    #[test]
    fn fed_pages_beyond_nine() {
        let names: Vec<String> = (1..=12).rev().map(|n| format!("page-{n:04}.tiff")).collect();
        let device = MockDevice::new().with_batch(names.iter().map(|name| (name.clone(), name.clone())));
        let fx = Fixture::new(device);
        fx.pipeline().many_pages_fed(&fx.outfile()).unwrap();
        let mut expected = names.clone();
        expected.reverse();
        assert_eq!(fx.assembler.last_pages(), expected);
    }

    #[test]
    fn fed_empty_batch_never_assembles() {
        let fx = Fixture::new(MockDevice::new().with_batch([(".lockfile", "hidden")]));
        let outfile = fx.outfile();
        let err = fx.pipeline().many_pages_fed(&outfile).unwrap_err();
        assert_eq!(*err, ErrorKind::EmptyBatch);
        assert_eq!(fx.assembler.calls(), 0);
        assert!(!outfile.exists());
        fx.assert_clean();
    }

    #[test]
    fn fed_driver_failure() {
        let fx = Fixture::new(MockDevice::new().with_batch([("page-0001.tiff", "first")]).fail_batch());
        let outfile = fx.outfile();
        let err = fx.pipeline().many_pages_fed(&outfile).unwrap_err();
        assert_eq!(*err, ErrorKind::Device);
        assert_eq!(fx.assembler.calls(), 0);
        assert!(!outfile.exists());
        fx.assert_clean();
    }

    #[rstest]
    #[case(Mode::OnePage)]
    #[case(Mode::ManyPages)]
    #[case(Mode::ManyPagesFed)]
    fn assembly_failure_cleans_up(#[case] mode: Mode) {
        let device = MockDevice::new().with_batch([("page-0001.tiff", "first")]);
        let fx = Fixture::with(device, MockAssembler::failing(), MockCompressor::new());
        let outfile = fx.outfile();
        let mut prompt = ScriptedPrompt::new(["", "x"]);
        let err = fx.pipeline().run(mode, &outfile, &mut prompt).unwrap_err();
        assert_eq!(*err, ErrorKind::Assembly);
        assert!(fx.compressor.calls().is_empty());
        assert!(!outfile.exists());
        fx.assert_clean();
    }

    #[rstest]
    #[case(Mode::OnePage)]
    #[case(Mode::ManyPages)]
    #[case(Mode::ManyPagesFed)]
    fn compression_failure_leaves_no_partial_output(#[case] mode: Mode) {
        let device = MockDevice::new().with_batch([("page-0001.tiff", "first")]);
        let fx = Fixture::with(device, MockAssembler::new(), MockCompressor::failing());
        let outfile = fx.outfile();
        let mut prompt = ScriptedPrompt::new(["x"]);
        let err = fx.pipeline().run(mode, &outfile, &mut prompt).unwrap_err();
        assert_eq!(*err, ErrorKind::Compression);
        // The compressor wrote half a file, but never to the real output path.
        let calls = fx.compressor.calls();
        let (written_to, _) = &calls[0];
        assert_ne!(written_to, &outfile);
        assert!(!written_to.exists());
        assert!(!outfile.exists());
        fx.assert_clean();
    }

    #[test]
    fn compression_failure_keeps_existing_output() {
        let fx = Fixture::with(MockDevice::new(), MockAssembler::new(), MockCompressor::failing());
        let outfile = fx.outfile();
        std::fs::write(&outfile, "previous scan").unwrap();
        fx.pipeline().one_page(&outfile).unwrap_err();
        assert_eq!(std::fs::read_to_string(&outfile).unwrap(), "previous scan");
    }

    #[test]
    fn existing_output_is_replaced() {
        let fx = Fixture::new(MockDevice::new());
        let outfile = fx.outfile();
        std::fs::write(&outfile, "previous scan").unwrap();
        fx.pipeline().one_page(&outfile).unwrap();
        assert_eq!(std::fs::read_to_string(&outfile).unwrap(), "page 1");
    }

    #[cfg(unix)]
    #[test]
    fn output_is_readable_beyond_owner() {
        use std::os::unix::fs::PermissionsExt;
        let fx = Fixture::new(MockDevice::new());
        let outfile = fx.outfile();
        fx.pipeline().one_page(&outfile).unwrap();
        let mode = std::fs::metadata(&outfile).unwrap().permissions().mode() & 0o777;
        assert_ne!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn replaced_output_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let fx = Fixture::new(MockDevice::new());
        let outfile = fx.outfile();
        std::fs::write(&outfile, "previous scan").unwrap();
        std::fs::set_permissions(&outfile, std::fs::Permissions::from_mode(0o644)).unwrap();
        fx.pipeline().one_page(&outfile).unwrap();
        assert_eq!(std::fs::read_to_string(&outfile).unwrap(), "page 1");
        assert_eq!(std::fs::metadata(&outfile).unwrap().permissions().mode() & 0o777, 0o644);
    }

    #[test]
    fn interrupted_before_start() {
        let fx = Fixture::new(MockDevice::new());
        let flag = Arc::new(AtomicBool::new(true));
        let err = fx.pipeline().with_interrupt(flag).one_page(&fx.outfile()).unwrap_err();
        assert!(matches!(err.deref(), ErrorKind::Interrupted));
        assert_eq!(fx.device.captures(), 0);
        fx.assert_clean();
    }

    #[test]
    fn output_directory_must_exist() {
        let fx = Fixture::new(MockDevice::new());
        let outfile = fx.dir.path().join("missing").join("scan.pdf");
        let err = fx.pipeline().one_page(&outfile).unwrap_err();
        assert_eq!(*err, ErrorKind::Artifact);
        assert!(fx.compressor.calls().is_empty());
        fx.assert_clean();
    }

    #[rstest]
    #[case("scan.pdf", ".")]
    #[case("./scan.pdf", ".")]
    #[case("out/scan.pdf", "out")]
    #[case("/tmp/scan.pdf", "/tmp")]
    fn output_directory(#[case] outfile: &str, #[case] expected: &str) {
        assert_eq!(output_dir(Path::new(outfile)), Path::new(expected));
    }
}
