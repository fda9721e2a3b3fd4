use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    CoreError,
    html::{html_fragment, trim_trailing_nuls},
    kind::{ClipboardSnapshot, ContentKind, Payload, PixelBuffer},
    naming::{dated_base_name, history_base_name},
    persist::{write_unique, write_unique_with},
};

/// Read and clear access to the live clipboard. Every call is a
/// self-contained open/read/close; nothing is held between calls.
pub trait ClipboardAccess {
    fn is_available(&self, kind: ContentKind) -> bool;
    /// Full buffer of a registered raw-byte format (`Html` or `Rtf`).
    fn read_raw(&self, kind: ContentKind) -> Option<Vec<u8>>;
    fn read_text(&self) -> Option<String>;
    fn read_image(&self) -> Option<PixelBuffer>;
    fn clear(&self) -> bool;
}

pub trait HistoryEntry {
    fn contains(&self, kind: ContentKind) -> bool;
    fn content(&self, kind: ContentKind) -> Option<Payload>;
}

pub trait ClipboardHistory {
    fn entries(&self) -> Result<Vec<Box<dyn HistoryEntry>>, CoreError>;
    fn clear(&self) -> bool;
}

pub trait ImageEncoder {
    fn encode_png(&self, image: &PixelBuffer, out: &mut dyn Write) -> Result<(), CoreError>;
    fn transcode_png(&self, encoded: &[u8], out: &mut dyn Write) -> Result<(), CoreError>;
}

/// Which kinds the clipboard currently advertises.
pub fn probe(clipboard: &dyn ClipboardAccess) -> ClipboardSnapshot {
    let mut snapshot = ClipboardSnapshot::default();
    for kind in ContentKind::ALL {
        snapshot.set(kind, clipboard.is_available(kind));
    }
    snapshot
}

/// Reads and normalizes one kind. `None` means the read failed, which can
/// happen even right after a positive probe.
pub fn extract(clipboard: &dyn ClipboardAccess, kind: ContentKind) -> Option<Payload> {
    let payload = match kind {
        ContentKind::Text => Payload::Text(clipboard.read_text()?),
        ContentKind::Html | ContentKind::Rtf => Payload::RawBytes(clipboard.read_raw(kind)?),
        ContentKind::Image => Payload::PixelBuffer(clipboard.read_image()?),
    };
    Some(normalize(kind, payload))
}

fn normalize(kind: ContentKind, payload: Payload) -> Payload {
    match (kind, payload) {
        (ContentKind::Html, Payload::RawBytes(raw)) => {
            let raw = trim_trailing_nuls(raw);
            Payload::RawBytes(html_fragment(&raw).to_vec())
        }
        (ContentKind::Html, Payload::Text(text)) => {
            Payload::RawBytes(html_fragment(text.as_bytes()).to_vec())
        }
        (ContentKind::Rtf, Payload::RawBytes(raw)) => Payload::RawBytes(trim_trailing_nuls(raw)),
        (_, payload) => payload,
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    Auto,
    TextTxt,
    TextMd,
    Html,
    Rtf,
    Png,
    All,
    HistoryAll,
    ClearAll,
}

impl Action {
    pub const VALUES: [Action; 9] = [
        Action::Auto,
        Action::TextTxt,
        Action::TextMd,
        Action::Html,
        Action::Rtf,
        Action::Png,
        Action::All,
        Action::HistoryAll,
        Action::ClearAll,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::Auto => "auto",
            Action::TextTxt => "text-txt",
            Action::TextMd => "text-md",
            Action::Html => "html",
            Action::Rtf => "rtf",
            Action::Png => "png",
            Action::All => "all",
            Action::HistoryAll => "history-all",
            Action::ClearAll => "clear-all",
        }
    }

    /// Every action except `clear-all` writes into a target directory.
    pub fn needs_target(self) -> bool {
        self != Action::ClearAll
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Action::VALUES
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| CoreError::UnknownAction(s.to_owned()))
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SavedFile {
    pub kind: ContentKind,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Failure {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ContentKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_index: Option<usize>,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Cleared {
    pub clipboard: bool,
    pub history: bool,
}

/// Outcome of one operation. `success` follows the aggregation rule of the
/// action: at least one (kind) attempted and every attempt saved, except for
/// `clear-all`, which succeeds when either store was cleared.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OperationReport {
    pub action: Action,
    pub attempted: usize,
    pub saved: Vec<SavedFile>,
    pub failures: Vec<Failure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleared: Option<Cleared>,
    pub success: bool,
}

impl OperationReport {
    fn new(action: Action) -> Self {
        Self {
            action,
            attempted: 0,
            saved: Vec::new(),
            failures: Vec::new(),
            cleared: None,
            success: false,
        }
    }

    fn fail(
        &mut self,
        kind: Option<ContentKind>,
        history_index: Option<usize>,
        reason: impl Into<String>,
    ) {
        self.failures.push(Failure {
            kind,
            history_index,
            reason: reason.into(),
        });
    }

    fn finish(mut self) -> Self {
        self.success = self.attempted > 0 && self.failures.is_empty();
        self
    }
}

/// One acquisition request against a target directory.
pub struct Acquisition<'a> {
    clipboard: &'a dyn ClipboardAccess,
    history: &'a dyn ClipboardHistory,
    encoder: &'a dyn ImageEncoder,
    target_dir: PathBuf,
    base_name: String,
}

impl<'a> Acquisition<'a> {
    pub fn new(
        clipboard: &'a dyn ClipboardAccess,
        history: &'a dyn ClipboardHistory,
        encoder: &'a dyn ImageEncoder,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            clipboard,
            history,
            encoder,
            target_dir: target_dir.into(),
            base_name: dated_base_name(),
        }
    }

    /// Overrides the dated base name computed at construction.
    #[must_use]
    pub fn with_base_name(mut self, base_name: impl Into<String>) -> Self {
        self.base_name = base_name.into();
        self
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn run(&self, action: Action) -> OperationReport {
        info!(%action, target = %self.target_dir.display(), "running action");
        let report = match action {
            Action::Auto => self.auto(),
            Action::TextTxt => self.single(action, ContentKind::Text, "txt"),
            Action::TextMd => self.single(action, ContentKind::Text, "md"),
            Action::Html => self.single(action, ContentKind::Html, "html"),
            Action::Rtf => self.single(action, ContentKind::Rtf, "rtf"),
            Action::Png => self.single(action, ContentKind::Image, "png"),
            Action::All => self.save_all(),
            Action::HistoryAll => self.history_all(),
            Action::ClearAll => self.clear_all(),
        };
        info!(
            %action,
            success = report.success,
            saved = report.saved.len(),
            failed = report.failures.len(),
            "action finished"
        );
        report
    }

    /// Saves only the best-ranked kind present. A failed read of that kind is
    /// final; lower-ranked kinds are not tried.
    fn auto(&self) -> OperationReport {
        let mut report = OperationReport::new(Action::Auto);
        let snapshot = probe(self.clipboard);
        debug!(?snapshot, "probed clipboard");

        let Some(kind) = snapshot.best() else {
            report.fail(None, None, "clipboard holds no supported content");
            return report.finish();
        };

        let payload = extract(self.clipboard, kind);
        self.save(&mut report, kind, kind.extension(), &self.base_name, None, payload);
        report.finish()
    }

    fn single(&self, action: Action, kind: ContentKind, extension: &str) -> OperationReport {
        let mut report = OperationReport::new(action);
        let payload = extract(self.clipboard, kind);
        self.save(&mut report, kind, extension, &self.base_name, None, payload);
        report.finish()
    }

    fn save_all(&self) -> OperationReport {
        let mut report = OperationReport::new(Action::All);
        let snapshot = probe(self.clipboard);
        debug!(?snapshot, "probed clipboard");

        for kind in ContentKind::ALL {
            if !snapshot.has(kind) {
                continue;
            }
            let payload = extract(self.clipboard, kind);
            self.save(&mut report, kind, kind.extension(), &self.base_name, None, payload);
        }

        if report.attempted == 0 {
            report.fail(None, None, "clipboard holds no supported content");
        }
        report.finish()
    }

    fn history_all(&self) -> OperationReport {
        let mut report = OperationReport::new(Action::HistoryAll);
        let entries = match self.history.entries() {
            Ok(entries) => entries,
            Err(err) => {
                warn!("clipboard history enumeration failed: {err}");
                report.fail(None, None, err.to_string());
                return report.finish();
            }
        };
        info!(count = entries.len(), "enumerated clipboard history");

        for (offset, entry) in entries.iter().enumerate() {
            let index = offset + 1;
            let base = history_base_name(&self.base_name, index);
            for kind in ContentKind::ALL {
                if !entry.contains(kind) {
                    continue;
                }
                let payload = entry.content(kind).map(|p| normalize(kind, p));
                self.save(&mut report, kind, kind.extension(), &base, Some(index), payload);
            }
        }

        if report.attempted == 0 {
            report.fail(None, None, "clipboard history holds no supported content");
        }
        report.finish()
    }

    fn clear_all(&self) -> OperationReport {
        let mut report = OperationReport::new(Action::ClearAll);
        let clipboard = self.clipboard.clear();
        let history = self.history.clear();
        info!(clipboard, history, "clear requested");

        // A single uncleared store shows only in `cleared`.
        if !clipboard && !history {
            report.fail(None, None, "failed to clear the clipboard");
            report.fail(None, None, "clipboard history was not cleared");
        }
        report.cleared = Some(Cleared { clipboard, history });
        report.success = clipboard || history;
        report
    }

    fn save(
        &self,
        report: &mut OperationReport,
        kind: ContentKind,
        extension: &str,
        base: &str,
        history_index: Option<usize>,
        payload: Option<Payload>,
    ) {
        report.attempted += 1;

        let Some(payload) = payload else {
            warn!(%kind, ?history_index, "clipboard content could not be read");
            report.fail(
                Some(kind),
                history_index,
                format!("{kind} content could not be read"),
            );
            return;
        };

        match self.persist(base, extension, payload) {
            Ok(path) => {
                info!(%kind, path = %path.display(), "saved");
                report.saved.push(SavedFile {
                    kind,
                    path,
                    history_index,
                });
            }
            Err(err) => {
                warn!(%kind, ?history_index, "save failed: {err}");
                report.fail(Some(kind), history_index, err.to_string());
            }
        }
    }

    fn persist(&self, base: &str, extension: &str, payload: Payload) -> Result<PathBuf, CoreError> {
        let dir = self.target_dir.as_path();
        match payload {
            Payload::Text(text) => write_unique(dir, base, extension, text.as_bytes()),
            Payload::RawBytes(bytes) => write_unique(dir, base, extension, &bytes),
            Payload::PixelBuffer(image) => write_unique_with(dir, base, extension, |out| {
                self.encoder.encode_png(&image, out)
            }),
            Payload::EncodedImage(bytes) => write_unique_with(dir, base, extension, |out| {
                self.encoder.transcode_png(&bytes, out)
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, fs};

    use super::*;
    use crate::png::PngEncoder;

    const BASE: &str = "PTF-2024-mar-07";

    #[derive(Default)]
    struct FakeClipboard {
        snapshot: ClipboardSnapshot,
        text: Option<String>,
        html: Option<Vec<u8>>,
        rtf: Option<Vec<u8>>,
        image: Option<PixelBuffer>,
        clears: bool,
        reads: RefCell<Vec<ContentKind>>,
    }

    impl ClipboardAccess for FakeClipboard {
        fn is_available(&self, kind: ContentKind) -> bool {
            self.snapshot.has(kind)
        }

        fn read_raw(&self, kind: ContentKind) -> Option<Vec<u8>> {
            self.reads.borrow_mut().push(kind);
            match kind {
                ContentKind::Html => self.html.clone(),
                ContentKind::Rtf => self.rtf.clone(),
                _ => None,
            }
        }

        fn read_text(&self) -> Option<String> {
            self.reads.borrow_mut().push(ContentKind::Text);
            self.text.clone()
        }

        fn read_image(&self) -> Option<PixelBuffer> {
            self.reads.borrow_mut().push(ContentKind::Image);
            self.image.clone()
        }

        fn clear(&self) -> bool {
            self.clears
        }
    }

    #[derive(Clone, Default)]
    struct FakeEntry {
        contents: Vec<(ContentKind, Option<Payload>)>,
    }

    impl HistoryEntry for FakeEntry {
        fn contains(&self, kind: ContentKind) -> bool {
            self.contents.iter().any(|(k, _)| *k == kind)
        }

        fn content(&self, kind: ContentKind) -> Option<Payload> {
            self.contents
                .iter()
                .find(|(k, _)| *k == kind)
                .and_then(|(_, payload)| payload.clone())
        }
    }

    #[derive(Default)]
    struct FakeHistory {
        entries: Option<Vec<FakeEntry>>,
        clears: bool,
    }

    impl ClipboardHistory for FakeHistory {
        fn entries(&self) -> Result<Vec<Box<dyn HistoryEntry>>, CoreError> {
            match &self.entries {
                Some(entries) => Ok(entries
                    .iter()
                    .cloned()
                    .map(|e| Box::new(e) as Box<dyn HistoryEntry>)
                    .collect()),
                None => Err(CoreError::HistoryUnavailable("disabled by policy".into())),
            }
        }

        fn clear(&self) -> bool {
            self.clears
        }
    }

    struct FailingEncoder;

    impl ImageEncoder for FailingEncoder {
        fn encode_png(&self, _: &PixelBuffer, out: &mut dyn Write) -> Result<(), CoreError> {
            out.write_all(b"\x89PNG partial")?;
            Err(CoreError::Io(std::io::Error::other("codec failure")))
        }

        fn transcode_png(&self, _: &[u8], _: &mut dyn Write) -> Result<(), CoreError> {
            Err(CoreError::Io(std::io::Error::other("codec failure")))
        }
    }

    fn red_pixel() -> PixelBuffer {
        PixelBuffer::from_rgba(1, 1, &[255, 0, 0, 255]).unwrap()
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    fn run(
        clipboard: &FakeClipboard,
        history: &FakeHistory,
        dir: &Path,
        action: Action,
    ) -> OperationReport {
        Acquisition::new(clipboard, history, &PngEncoder, dir)
            .with_base_name(BASE)
            .run(action)
    }

    #[test]
    fn auto_saves_image_and_never_touches_text() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            snapshot: ClipboardSnapshot {
                text: true,
                image: true,
                ..Default::default()
            },
            text: Some("caption".into()),
            image: Some(red_pixel()),
            ..Default::default()
        };

        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::Auto);
        assert!(report.success);
        assert_eq!(report.attempted, 1);
        assert_eq!(names(dir.path()), [format!("{BASE}.png")]);
        assert_eq!(*clipboard.reads.borrow(), vec![ContentKind::Image]);

        let png = image::open(dir.path().join(format!("{BASE}.png"))).unwrap().to_rgba8();
        assert_eq!(png.get_pixel(0, 0).0, [255, 0, 0, 255]);
    }

    #[test]
    fn auto_does_not_fall_back_when_best_kind_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            snapshot: ClipboardSnapshot {
                text: true,
                html: true,
                ..Default::default()
            },
            text: Some("still here".into()),
            html: None,
            ..Default::default()
        };

        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::Auto);
        assert!(!report.success);
        assert_eq!(report.failures[0].kind, Some(ContentKind::Html));
        assert!(names(dir.path()).is_empty());
        assert_eq!(*clipboard.reads.borrow(), vec![ContentKind::Html]);
    }

    #[test]
    fn auto_with_empty_clipboard_fails_without_reading() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard::default();
        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::Auto);
        assert!(!report.success);
        assert_eq!(report.attempted, 0);
        assert!(clipboard.reads.borrow().is_empty());
    }

    #[test]
    fn auto_html_writes_only_the_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let mut record = b"StartHTML:0000000042\r\nEndHTML:0000000063\r\n".to_vec();
        assert_eq!(record.len(), 42);
        record.extend_from_slice(b"<html>FRAGMENT</html>trailer\0\0\0");
        let clipboard = FakeClipboard {
            snapshot: ClipboardSnapshot {
                html: true,
                rtf: true,
                ..Default::default()
            },
            html: Some(record),
            ..Default::default()
        };

        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::Auto);
        assert!(report.success);
        let written = fs::read(dir.path().join(format!("{BASE}.html"))).unwrap();
        assert_eq!(written, b"<html>FRAGMENT</html>");
    }

    #[test]
    fn rtf_trailing_nuls_are_stripped() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            rtf: Some(b"{\\rtf1 hi}\0\0\0\0".to_vec()),
            ..Default::default()
        };
        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::Rtf);
        assert!(report.success);
        let written = fs::read(&report.saved[0].path).unwrap();
        assert_eq!(written, b"{\\rtf1 hi}");
    }

    #[test]
    fn single_kind_ignores_probe_result() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            text: Some("# notes".into()),
            ..Default::default()
        };

        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::TextMd);
        assert!(report.success);
        assert_eq!(names(dir.path()), [format!("{BASE}.md")]);
        assert_eq!(
            fs::read_to_string(dir.path().join(format!("{BASE}.md"))).unwrap(),
            "# notes"
        );
    }

    #[test]
    fn single_kind_fails_when_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard::default();
        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::Png);
        assert!(!report.success);
        assert_eq!(report.attempted, 1);
        assert_eq!(report.failures[0].kind, Some(ContentKind::Image));
    }

    #[test]
    fn save_all_partial_failure_keeps_text_and_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            snapshot: ClipboardSnapshot {
                text: true,
                html: true,
                ..Default::default()
            },
            text: Some("hello".into()),
            html: None,
            ..Default::default()
        };

        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::All);
        assert!(!report.success);
        assert_eq!(report.attempted, 2);
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.saved[0].kind, ContentKind::Text);
        assert_eq!(names(dir.path()), [format!("{BASE}.txt")]);
    }

    #[test]
    fn save_all_writes_every_present_kind() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            snapshot: ClipboardSnapshot {
                text: true,
                html: true,
                rtf: true,
                image: true,
            },
            text: Some("t".into()),
            html: Some(b"<b>h</b>".to_vec()),
            rtf: Some(b"{\\rtf1}".to_vec()),
            image: Some(red_pixel()),
            ..Default::default()
        };

        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::All);
        assert!(report.success);
        assert_eq!(
            names(dir.path()),
            [
                format!("{BASE}.html"),
                format!("{BASE}.png"),
                format!("{BASE}.rtf"),
                format!("{BASE}.txt"),
            ]
        );
    }

    #[test]
    fn save_all_skips_absent_kinds_and_fails_when_nothing_present() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            text: Some("not advertised".into()),
            ..Default::default()
        };
        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::All);
        assert!(!report.success);
        assert_eq!(report.attempted, 0);
        assert!(clipboard.reads.borrow().is_empty());
    }

    #[test]
    fn image_encode_failure_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            image: Some(red_pixel()),
            ..Default::default()
        };
        let history = FakeHistory::default();
        let report = Acquisition::new(&clipboard, &history, &FailingEncoder, dir.path())
            .with_base_name(BASE)
            .run(Action::Png);

        assert!(!report.success);
        assert!(names(dir.path()).is_empty());
    }

    #[test]
    fn history_export_names_entries_and_aggregates() {
        let dir = tempfile::tempdir().unwrap();
        let history = FakeHistory {
            entries: Some(vec![
                FakeEntry {
                    contents: vec![
                        (ContentKind::Text, Some(Payload::Text("first".into()))),
                        (
                            ContentKind::Html,
                            Some(Payload::Text("<i>first</i>".into())),
                        ),
                    ],
                },
                FakeEntry::default(),
                FakeEntry {
                    contents: vec![(ContentKind::Rtf, Some(Payload::RawBytes(b"{\\rtf1}".to_vec())))],
                },
            ]),
            clears: false,
        };

        let report = run(&FakeClipboard::default(), &history, dir.path(), Action::HistoryAll);
        assert!(report.success, "failures: {:?}", report.failures);
        assert_eq!(report.attempted, 3);
        assert_eq!(
            names(dir.path()),
            [
                format!("{BASE}-HIST-0001.html"),
                format!("{BASE}-HIST-0001.txt"),
                format!("{BASE}-HIST-0003.rtf"),
            ]
        );
        assert!(report.saved.iter().all(|s| s.history_index.is_some()));
    }

    #[test]
    fn history_entry_read_failure_fails_aggregate() {
        let dir = tempfile::tempdir().unwrap();
        let history = FakeHistory {
            entries: Some(vec![FakeEntry {
                contents: vec![
                    (ContentKind::Text, Some(Payload::Text("ok".into()))),
                    (ContentKind::Image, None),
                ],
            }]),
            clears: false,
        };

        let report = run(&FakeClipboard::default(), &history, dir.path(), Action::HistoryAll);
        assert!(!report.success);
        assert_eq!(report.saved.len(), 1);
        assert_eq!(report.failures[0].kind, Some(ContentKind::Image));
        assert_eq!(report.failures[0].history_index, Some(1));
    }

    #[test]
    fn history_unavailable_is_reported_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let report = run(
            &FakeClipboard::default(),
            &FakeHistory::default(),
            dir.path(),
            Action::HistoryAll,
        );
        assert!(!report.success);
        assert!(report.failures[0].reason.contains("disabled by policy"));
    }

    #[test]
    fn empty_history_fails() {
        let dir = tempfile::tempdir().unwrap();
        let history = FakeHistory {
            entries: Some(Vec::new()),
            clears: false,
        };
        let report = run(&FakeClipboard::default(), &history, dir.path(), Action::HistoryAll);
        assert!(!report.success);
    }

    #[test]
    fn clear_succeeds_when_either_store_clears() {
        let dir = tempfile::tempdir().unwrap();
        let clipboard = FakeClipboard {
            clears: true,
            ..Default::default()
        };
        let report = run(&clipboard, &FakeHistory::default(), dir.path(), Action::ClearAll);
        assert!(report.success);
        assert!(report.failures.is_empty());
        assert_eq!(
            report.cleared,
            Some(Cleared {
                clipboard: true,
                history: false
            })
        );

        let history = FakeHistory {
            clears: true,
            ..Default::default()
        };
        let report = run(&FakeClipboard::default(), &history, dir.path(), Action::ClearAll);
        assert!(report.success);
        assert!(report.failures.is_empty());

        let report = run(
            &FakeClipboard::default(),
            &FakeHistory::default(),
            dir.path(),
            Action::ClearAll,
        );
        assert!(!report.success);
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn action_parsing_is_case_insensitive_and_strict() {
        assert_eq!("AUTO".parse::<Action>().unwrap(), Action::Auto);
        assert_eq!("History-All".parse::<Action>().unwrap(), Action::HistoryAll);
        for action in Action::VALUES {
            assert_eq!(action.as_str().parse::<Action>().unwrap(), action);
        }
        assert!(matches!(
            "jpeg".parse::<Action>(),
            Err(CoreError::UnknownAction(_))
        ));
        assert!(!Action::ClearAll.needs_target());
        assert!(Action::Png.needs_target());
    }
}
