//! Diagnostic collection and display.
//!
//! Components report errors through a shared [`Errors`] sink instead of
//! aborting; parsing always continues and yields a best-effort tree. The
//! sink supports nested contexts for speculative parses: errors recorded
//! after [`Errors::save`] are held until the context is committed into its
//! parent or cleared.

use std::cell::RefCell;
use std::rc::Rc;

use annotate_snippets::{Level, Renderer, Snippet};
use colored::Colorize;

use crate::position::{Positions, SourcePos};

/// Implemented by component error enums so the sink can render a titled,
/// source-annotated report for each of them.
pub trait AnnotatedError {
    fn title() -> &'static str;
    fn description(&self) -> &'static str;
    fn details(&self) -> Option<String>;
    fn position(&self) -> SourcePos;
}

/// One recorded diagnostic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Diagnostic {
    pub position: SourcePos,
    pub title: String,
    pub message: String,
}

struct ErrorsInner {
    positions: Positions,
    contexts: Vec<Vec<Diagnostic>>,
    emitted: Vec<Diagnostic>,
    quiet: bool,
}

/// The per-session error sink. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct Errors {
    inner: Rc<RefCell<ErrorsInner>>,
}

impl Errors {
    /// A sink that prints top-level diagnostics to stderr as they arrive.
    pub fn new(positions: Positions) -> Self {
        Errors::build(positions, false)
    }

    /// A sink that only collects, for tests and speculative work.
    pub fn silent(positions: Positions) -> Self {
        Errors::build(positions, true)
    }

    fn build(positions: Positions, quiet: bool) -> Self {
        Errors {
            inner: Rc::new(RefCell::new(ErrorsInner {
                positions,
                contexts: Vec::new(),
                emitted: Vec::new(),
                quiet,
            })),
        }
    }

    /// Record a diagnostic. At top level it is displayed immediately;
    /// inside a saved context it is held for commit or clear.
    pub fn error(&self, position: SourcePos, message: impl Into<String>) {
        self.push(Diagnostic {
            position,
            title: "Error".to_string(),
            message: message.into(),
        });
    }

    /// Record a component error through its [`AnnotatedError`] data.
    pub fn record<E: AnnotatedError>(&self, error: &E) {
        let message = match error.details() {
            Some(details) => format!("{}: {details}", error.description()),
            None => error.description().to_string(),
        };
        self.push(Diagnostic {
            position: error.position(),
            title: E::title().to_string(),
            message,
        });
    }

    fn push(&self, diagnostic: Diagnostic) {
        let mut inner = self.inner.borrow_mut();
        if let Some(context) = inner.contexts.last_mut() {
            context.push(diagnostic);
        } else {
            if !inner.quiet {
                eprintln!("{}", render(&inner.positions, &diagnostic));
            }
            inner.emitted.push(diagnostic);
        }
    }

    /// Open a nested error context for a speculative parse.
    pub fn save(&self) {
        self.inner.borrow_mut().contexts.push(Vec::new());
    }

    /// Close the innermost context, appending its diagnostics to the outer
    /// context, or displaying them at the outermost level.
    pub fn commit(&self) {
        let mut inner = self.inner.borrow_mut();
        let Some(context) = inner.contexts.pop() else {
            return;
        };
        if let Some(outer) = inner.contexts.last_mut() {
            outer.extend(context);
            return;
        }
        for diagnostic in context {
            if !inner.quiet {
                eprintln!("{}", render(&inner.positions, &diagnostic));
            }
            inner.emitted.push(diagnostic);
        }
    }

    /// Close the innermost context and discard its diagnostics.
    pub fn clear(&self) {
        self.inner.borrow_mut().contexts.pop();
    }

    /// Number of diagnostics recorded and not cleared.
    pub fn count(&self) -> usize {
        let inner = self.inner.borrow();
        inner.emitted.len() + inner.contexts.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Render every top-level diagnostic recorded so far.
    pub fn reports(&self) -> Vec<String> {
        let inner = self.inner.borrow();
        inner
            .emitted
            .iter()
            .map(|diagnostic| render(&inner.positions, diagnostic))
            .collect()
    }

    /// The diagnostics themselves, for programmatic inspection.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.inner.borrow().emitted.clone()
    }
}

fn render(positions: &Positions, diagnostic: &Diagnostic) -> String {
    let Some(info) = positions.info(diagnostic.position) else {
        return format!("{}: {}", "error".red().bold(), diagnostic.message);
    };
    let line = positions.source_line(diagnostic.position).unwrap_or_default();
    let column = (info.column as usize).min(line.len());
    let end = (column + 1).min(line.len().max(column));
    let label = format!("{}: {}", diagnostic.title, diagnostic.message);
    let message = Level::Error.title(&label).snippet(
        Snippet::source(&line)
            .origin(&info.file)
            .line_start(info.line as usize)
            .fold(false)
            .annotation(Level::Error.span(column..end).label(&diagnostic.message)),
    );

    let rendered = Renderer::styled().render(message).to_string();
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sink() -> Errors {
        let positions = Positions::new();
        positions.open_buffer("test", "first line\nsecond line\n");
        Errors::silent(positions)
    }

    #[test]
    fn top_level_errors_are_counted() {
        let errors = sink();
        errors.error(SourcePos(3), "something odd");

        assert_eq!(errors.count(), 1);
        assert!(errors.reports()[0].contains("something odd"));
    }

    #[test]
    fn cleared_context_discards_errors() {
        let errors = sink();
        errors.save();
        errors.error(SourcePos(0), "speculative");
        assert_eq!(errors.count(), 1);

        errors.clear();

        assert_eq!(errors.count(), 0);
        assert!(errors.diagnostics().is_empty());
    }

    #[test]
    fn committed_context_flows_outward() {
        let errors = sink();
        errors.save();
        errors.save();
        errors.error(SourcePos(12), "inner");
        errors.commit();
        assert!(errors.diagnostics().is_empty());

        errors.commit();

        assert_eq!(errors.count(), 1);
        assert_eq!(errors.diagnostics()[0].message, "inner");
    }

    #[test]
    fn report_names_file_and_line() {
        let errors = sink();
        errors.error(SourcePos(13), "strange token");

        let report = errors.reports().remove(0);

        assert!(report.contains("test"));
        assert!(report.contains("second line"));
    }
}
