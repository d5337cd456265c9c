use std::path::PathBuf;

use thiserror::Error;

use crate::document::Side;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a comparison run did not complete.
///
/// A run that hits the page ceiling is not an error; see
/// [`Truncation`](crate::run::Truncation).
#[derive(Debug, Error)]
pub enum CompareError {
    #[error("{side} document {} could not be opened", .path.display())]
    InputUnavailable {
        side: Side,
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("page {page} of the {side} document failed to render")]
    PageRenderFailure {
        page: u32,
        side: Side,
        #[source]
        source: BoxError,
    },

    #[error(
        "nothing to compare (before has {before_pages} page(s), after has {after_pages}{})",
        ceiling_note(.ceiling)
    )]
    EmptyComparison {
        before_pages: u32,
        after_pages: u32,
        ceiling: Option<u32>,
    },

    #[error("comparison cancelled before page {page}")]
    Cancelled { page: u32 },
}

impl CompareError {
    pub(crate) fn render(page: u32, side: Side, source: anyhow::Error) -> Self {
        Self::PageRenderFailure {
            page,
            side,
            source: source.into(),
        }
    }

    /// The message followed by every source, `": "`-separated.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}

fn ceiling_note(ceiling: &Option<u32>) -> String {
    match ceiling {
        Some(c) => format!(", page ceiling {c}"),
        None => String::new(),
    }
}
