use std::sync::LazyLock;

use chrono::Datelike;
use ecow::EcoVec;
use shared_types::AppError;
use typst::diag::{FileError, FileResult, SourceDiagnostic};
use typst::foundations::{Bytes, Datetime};
use typst::layout::PagedDocument;
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};

/// Parameters for laying out a notice as PDF.
pub struct NoticePdfParams {
    pub case_id: String,
    /// Heading printed above the subject line, e.g. `Demand Notice`.
    pub notice_title: String,
    pub subject: String,
    /// Rendered notice text. Blank lines separate paragraphs.
    pub content_body: String,
    pub issued_on: String,
    /// Signing advocate. Empty when the case has no allocation.
    pub lawyer_name: String,
}

/// Escape text for use inside a Typst string literal.
///
/// Newlines become `\n` escapes so multi-line bodies stay inside one
/// string literal. `#` needs no escaping inside strings.
pub fn escape_typst(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "")
        .replace('\n', "\\n")
}

/// Human heading for a notice type: `section_138_notice` -> `Section 138 Notice`.
pub fn notice_title(notice_type: &str) -> String {
    notice_type
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the Typst source by prepending `#let` bindings to `notice.typ`.
pub fn build_notice_source(params: &NoticePdfParams) -> String {
    let bindings = format!(
        r##"#let case_id = "{case_id}"
#let notice_title = "{notice_title}"
#let subject = "{subject}"
#let content_body = "{content_body}"
#let issued_on = "{issued_on}"
#let lawyer_name = "{lawyer_name}"

"##,
        case_id = escape_typst(&params.case_id),
        notice_title = escape_typst(&params.notice_title),
        subject = escape_typst(&params.subject),
        content_body = escape_typst(&params.content_body),
        issued_on = escape_typst(&params.issued_on),
        lawyer_name = escape_typst(&params.lawyer_name),
    );

    let template = include_str!("../../../templates/notice.typ");
    format!("{bindings}{template}")
}

// ---------------------------------------------------------------------------
// Static singletons, initialized once and reused across requests
// ---------------------------------------------------------------------------

static FONTS: LazyLock<Vec<Font>> = LazyLock::new(|| {
    typst_assets::fonts()
        .flat_map(|data| Font::iter(Bytes::new(data)))
        .collect()
});

static FONT_BOOK: LazyLock<LazyHash<FontBook>> =
    LazyLock::new(|| LazyHash::new(FontBook::from_fonts(FONTS.iter())));

static LIBRARY: LazyLock<LazyHash<Library>> = LazyLock::new(|| LazyHash::new(Library::default()));

// ---------------------------------------------------------------------------
// World implementation for in-process Typst compilation
// ---------------------------------------------------------------------------

struct NoticeWorld {
    source: Source,
}

impl NoticeWorld {
    fn new(source_text: &str) -> Self {
        Self {
            source: Source::detached(source_text),
        }
    }
}

impl World for NoticeWorld {
    fn library(&self) -> &LazyHash<Library> {
        &LIBRARY
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &FONT_BOOK
    }

    fn main(&self) -> FileId {
        self.source.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.source.id() {
            Ok(self.source.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rooted_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rooted_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        FONTS.get(index).cloned()
    }

    fn today(&self, offset: Option<i64>) -> Option<Datetime> {
        let now = chrono::Utc::now();
        let naive = if let Some(hours) = offset {
            let tz = chrono::FixedOffset::east_opt((hours as i32) * 3600)?;
            now.with_timezone(&tz).naive_local()
        } else {
            now.naive_utc()
        };
        Datetime::from_ymd(
            naive.year(),
            (naive.month0() + 1) as u8,
            (naive.day0() + 1) as u8,
        )
    }
}

// ---------------------------------------------------------------------------
// Public compilation entry point
// ---------------------------------------------------------------------------

/// Compile a Typst source string into PDF bytes.
///
/// Compilation is CPU-bound and runs on a blocking thread.
pub async fn compile_typst(source: &str) -> Result<Vec<u8>, AppError> {
    let source = source.to_owned();

    tokio::task::spawn_blocking(move || compile_typst_sync(&source))
        .await
        .map_err(|e| AppError::internal(format!("Typst task panicked: {e}")))?
}

/// Lay out a notice and compile it to PDF.
pub async fn render_notice_pdf(params: &NoticePdfParams) -> Result<Vec<u8>, AppError> {
    compile_typst(&build_notice_source(params)).await
}

fn compile_typst_sync(source: &str) -> Result<Vec<u8>, AppError> {
    let world = NoticeWorld::new(source);

    let warned = typst::compile::<PagedDocument>(&world);
    let document = warned
        .output
        .map_err(|diagnostics| format_diagnostics("Typst compilation failed", &diagnostics))?;

    typst_pdf::pdf(&document, &typst_pdf::PdfOptions::default())
        .map_err(|diagnostics| format_diagnostics("PDF export failed", &diagnostics))
}

fn format_diagnostics(prefix: &str, diagnostics: &EcoVec<SourceDiagnostic>) -> AppError {
    let msgs: Vec<String> = diagnostics.iter().map(|d| d.message.to_string()).collect();
    AppError::internal(format!("{prefix}: {}", msgs.join("; ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> NoticePdfParams {
        NoticePdfParams {
            case_id: "LC-20261018-0001".to_string(),
            notice_title: notice_title("demand_notice"),
            subject: "Demand for repayment of \"overdue\" loan".to_string(),
            content_body: "Dear Sir,\n\nPay #now.".to_string(),
            issued_on: "2026-10-18".to_string(),
            lawyer_name: String::new(),
        }
    }

    #[test]
    fn escapes_literals() {
        assert_eq!(escape_typst(r#"a "b" #c \d"#), r#"a \"b\" #c \\d"#);
        assert_eq!(escape_typst("one\r\ntwo"), "one\\ntwo");
    }

    #[test]
    fn titles_from_notice_types() {
        assert_eq!(notice_title("section_138_notice"), "Section 138 Notice");
        assert_eq!(notice_title("sarfaesi_13_2_notice"), "Sarfaesi 13 2 Notice");
    }

    #[test]
    fn source_starts_with_bindings() {
        let src = build_notice_source(&params());
        assert!(src.starts_with("#let case_id = \"LC-20261018-0001\""));
        assert!(src.contains(r#"#let content_body = "Dear Sir,\n\nPay #now.""#));
        assert!(src.contains("#let lawyer_name = \"\""));
    }

    #[tokio::test]
    async fn compiles_to_pdf() {
        let pdf = render_notice_pdf(&params()).await.unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
